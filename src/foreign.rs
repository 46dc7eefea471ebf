//! The boundary trait for adoptable foreign buffers.
//!
//! Implementations of [`ForeignArray`] describe buffers that some external
//! allocator owns, typically array objects handed across an FFI boundary.
//! The descriptor reports the buffer's shape and contiguity and hands over
//! its base address; [`ChannelData::from_foreign`] consumes the descriptor,
//! keeps it alive through a type-erased handle, and exposes the buffer as
//! channels without copying it.
//!
//! [`ChannelData::from_foreign`]: crate::ChannelData::from_foreign

use alloc::vec::Vec;

/// A contiguous foreign buffer that can be adopted into a
/// [`ChannelData`](crate::ChannelData).
///
/// A descriptor is a small handle value: it points at a separately allocated
/// buffer and releases that buffer when dropped. Adoption moves the
/// descriptor onto the heap and erases its type, so the buffer stays alive
/// exactly as long as the adopting [`ChannelData`](crate::ChannelData).
///
/// # Safety
///
/// Implementations must guarantee all of the following, which adoption
/// relies on for its pointer arithmetic and for the lifetime of every
/// channel pointer it hands out:
///
/// 1. The shape is truthful: the buffer behind [`as_mut_ptr`] holds exactly
///    the product of the extents of axes `0..rank()` elements of `Elem`
///    (one element when the rank is 0), laid out contiguously in row-major
///    order whenever [`is_c_contiguous`] returns `true`.
/// 2. The buffer does not live inline in the descriptor value: the address
///    returned by [`as_mut_ptr`] stays valid and unchanged when the
///    descriptor is moved, for as long as the descriptor exists.
/// 3. The descriptor holds the only access to the buffer, so handing it
///    over grants exclusive read and write access until the descriptor is
///    dropped.
/// 4. Dropping the descriptor releases the buffer.
///
/// [`as_mut_ptr`]: ForeignArray::as_mut_ptr
/// [`is_c_contiguous`]: ForeignArray::is_c_contiguous
///
/// # Example
///
/// ```
/// use chanbuf::ForeignArray;
///
/// /// A rank-2 array backed by one flat allocation.
/// struct Matrix {
///     data: Vec<f32>,
///     rows: usize,
///     cols: usize,
/// }
///
/// // SAFETY: `data` holds exactly `rows * cols` elements in row-major
/// // order, the `Vec` buffer address does not change when the `Matrix`
/// // value moves, and dropping the `Matrix` frees the buffer.
/// unsafe impl ForeignArray for Matrix {
///     type Elem = f32;
///
///     fn rank(&self) -> usize {
///         2
///     }
///
///     fn extent(&self, axis: usize) -> usize {
///         if axis == 0 { self.rows } else { self.cols }
///     }
///
///     fn is_c_contiguous(&self) -> bool {
///         true
///     }
///
///     fn as_mut_ptr(&mut self) -> *mut f32 {
///         self.data.as_mut_ptr()
///     }
/// }
/// ```
pub unsafe trait ForeignArray {
    /// The element type stored in the buffer.
    type Elem: 'static;

    /// The number of dimensions of the array.
    fn rank(&self) -> usize;

    /// The extent of the given axis.
    ///
    /// Only axes smaller than [`rank`](ForeignArray::rank) are ever queried.
    fn extent(&self, axis: usize) -> usize;

    /// Whether the elements are stored contiguously in row-major order.
    fn is_c_contiguous(&self) -> bool;

    /// The base address of the buffer.
    fn as_mut_ptr(&mut self) -> *mut Self::Elem;
}

// SAFETY: A `Vec` owns exactly `len()` contiguous elements in a separately
// allocated buffer whose address does not change when the `Vec` value moves,
// and dropping the `Vec` frees that buffer.
unsafe impl<T: 'static> ForeignArray for Vec<T> {
    type Elem = T;

    fn rank(&self) -> usize {
        1
    }

    fn extent(&self, _axis: usize) -> usize {
        self.len()
    }

    fn is_c_contiguous(&self) -> bool {
        true
    }

    fn as_mut_ptr(&mut self) -> *mut T {
        self.as_mut_slice().as_mut_ptr()
    }
}
