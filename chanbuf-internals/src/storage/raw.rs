//! Type-erased storage handle.
//!
//! This module encapsulates the `ptr` and `vtable` fields of [`RawStorage`],
//! ensuring they are only visible within this module. This visibility
//! restriction guarantees the safety invariant: **the pointer always comes
//! from `Box<S>` and the vtable is always the vtable for that same `S`**.
//!
//! # Safety Invariant
//!
//! Since the fields can only be set via [`RawStorage::new`] and
//! [`RawStorage::from_box`] (which create both from the same concrete type),
//! and cannot be modified afterward (no `pub` or `pub(crate)` fields), the
//! pointer and vtable can never go out of sync.
//!
//! The [`RawStorage::drop`] implementation relies on this invariant to safely
//! reconstruct the `Box` and deallocate the memory.
//!
//! # Type Erasure
//!
//! The concrete type parameter `S` is erased by casting the pointer to
//! `NonNull<Erased>`. The vtable stored alongside it provides the runtime
//! type information needed to destroy and identify the allocation.

use alloc::boxed::Box;
use core::{any::TypeId, ptr::NonNull};

use crate::{storage::vtable::StorageVtable, util::Erased};

/// An owning handle to a heap allocation whose concrete type has been erased.
///
/// The handle is guaranteed to point to an initialized instance of some
/// specific `S`, though we do not know which actual `S` it is. Dropping the
/// handle destroys the allocation through its original type, exactly once.
///
/// However, the pointer is allowed to transition into a non-initialized state
/// inside the [`RawStorage::drop`] method.
///
/// The pointer is guaranteed to have been created using [`Box::into_raw`].
///
/// We cannot use a [`Box<S>`] directly, because that does not allow us to
/// type-erase the `S`.
pub struct RawStorage {
    /// Pointer to the adopted allocation
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a `Box<S>` for some `S`
    ///    using `Box::into_raw`.
    /// 2. The pointer will point to the same allocation for the entire
    ///    lifetime of this object.
    /// 3. The pointee is properly initialized for the entire lifetime of this
    ///    object, except during the execution of the `Drop` implementation.
    ptr: NonNull<Erased>,

    /// Vtable for the adopted allocation
    ///
    /// # Safety
    ///
    /// The following safety invariant is guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The vtable was created by [`StorageVtable::new::<S>`] for the same
    ///    `S` that `ptr` was created from.
    ///
    /// [`StorageVtable::new::<S>`]: StorageVtable::new
    vtable: &'static StorageVtable,
}

impl RawStorage {
    /// Creates a new [`RawStorage`] by moving the given object onto the heap
    /// and erasing its type.
    ///
    /// The returned handle owns the heap allocation and will destroy it
    /// through the type `S` when dropped.
    #[inline]
    pub fn new<S: 'static>(object: S) -> Self {
        Self::from_box(Box::new(object))
    }

    /// Creates a new [`RawStorage`] that adopts an existing heap allocation,
    /// erasing its type.
    ///
    /// The returned handle owns the allocation and will destroy it through
    /// the type `S` when dropped.
    #[inline]
    pub fn from_box<S: 'static>(object: Box<S>) -> Self {
        let ptr: *mut S = Box::into_raw(object);
        let ptr: *mut Erased = ptr.cast::<Erased>();

        // SAFETY: `Box::into_raw` returns a non-null pointer
        let ptr: NonNull<Erased> = unsafe { NonNull::new_unchecked(ptr) };

        Self {
            ptr,
            vtable: StorageVtable::new::<S>(),
        }
    }

    /// Returns the address of the adopted allocation.
    ///
    /// The pointer stays stable for the lifetime of this handle, including
    /// across moves of the handle itself. It must not be used to access the
    /// allocation after the handle has been dropped.
    #[inline]
    pub fn as_ptr(&self) -> *const () {
        self.ptr.as_ptr().cast::<()>()
    }

    /// Returns the [`TypeId`] of the type that was used to create this
    /// handle.
    #[inline]
    pub fn object_type_id(&self) -> TypeId {
        self.vtable.type_id()
    }

    /// Returns the [`core::any::type_name`] of the type that was used to
    /// create this handle.
    #[inline]
    pub fn object_type_name(&self) -> &'static str {
        self.vtable.type_name()
    }
}

impl core::ops::Drop for RawStorage {
    #[inline]
    fn drop(&mut self) {
        // SAFETY:
        // 1. The pointer comes from `Box::into_raw` (guaranteed by
        //    `RawStorage::from_box`)
        // 2. The vtable is guaranteed to match the allocation behind `self.ptr`, as
        //    both were created from the same `S` in `RawStorage::from_box`.
        // 3. The pointer is initialized and has not been previously freed as
        //    guaranteed by the invariants on this type. We are correctly transferring
        //    ownership here and the pointer is not used afterwards, as we are in the
        //    drop function.
        unsafe {
            self.vtable.drop(self.ptr);
        }
    }
}

impl core::fmt::Debug for RawStorage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawStorage")
            .field("object_type_name", &self.object_type_name())
            .finish_non_exhaustive()
    }
}
