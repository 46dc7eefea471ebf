//! Internal utility types.

/// Marker type used when type-erasing storage allocations.
///
/// This zero-sized type serves as a placeholder pointee once the concrete
/// type of an adopted allocation has been erased. For example,
/// `NonNull<Erased>` represents a heap object whose concrete type is unknown
/// at the current scope.
///
/// Using a distinct marker type (rather than `()`) makes the intent clearer
/// in type signatures and error messages.
pub(crate) struct Erased;
