//! Vtable for type-erased storage operations.
//!
//! This module contains the [`StorageVtable`] which enables destroying and
//! identifying an adopted heap allocation when its concrete type `S` has been
//! erased. The vtable stores function pointers that dispatch to the correct
//! typed implementations.
//!
//! This module encapsulates the fields of [`StorageVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the actual type of the
//! allocation it is paired with**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`StorageVtable::new`], which pairs the function pointers
//! with a specific type `S` at compile time.

use alloc::boxed::Box;
use core::{any::TypeId, ptr::NonNull};

use crate::util::Erased;

/// Vtable for type-erased storage operations.
///
/// Contains function pointers for performing operations on an adopted heap
/// allocation without knowing its concrete type at compile time.
///
/// # Safety Invariant
///
/// The field `drop` is guaranteed to point to the function defined below
/// instantiated with the storage type `S` that was used to create this
/// [`StorageVtable`].
pub(crate) struct StorageVtable {
    /// Gets the [`TypeId`] of the storage type that was used to create this
    /// [`StorageVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the storage type that was used to
    /// create this [`StorageVtable`].
    type_name: fn() -> &'static str,
    /// Drops the [`Box<S>`] instance pointed to by this pointer.
    drop: unsafe fn(NonNull<Erased>),
}

impl StorageVtable {
    /// Creates a new [`StorageVtable`] for the storage type `S`.
    pub(super) const fn new<S: 'static>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<S>,
                type_name: core::any::type_name::<S>,
                drop: drop::<S>,
            }
        }
    }

    /// Gets the [`TypeId`] of the storage type that was used to create this
    /// [`StorageVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the storage type that was used to
    /// create this [`StorageVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Drops the `Box<S>` instance pointed to by this pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from a [`Box<S>`] via [`Box::into_raw`]
    /// 2. This [`StorageVtable`] must be a vtable for the storage type
    ///    behind the pointer.
    /// 3. This method drops the [`Box<S>`], so the caller must ensure that
    ///    the pointer has not previously been dropped, that it is able to
    ///    transfer ownership of the pointer, and that it will not use the
    ///    pointer after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.drop` points to the function `drop::<S>` below.
        // That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.drop)(ptr);
        }
    }
}

/// Drops the [`Box<S>`] instance pointed to by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from a [`Box<S>`] via [`Box::into_raw`]
/// 2. The storage type `S` matches the actual type of the allocation behind
///    the pointer
/// 3. This method drops the [`Box<S>`], so the caller must ensure that the
///    pointer has not previously been dropped, that it is able to transfer
///    ownership of the pointer, and that it will not use the pointer after
///    calling this method.
unsafe fn drop<S: 'static>(ptr: NonNull<Erased>) {
    let ptr: NonNull<S> = ptr.cast();
    let ptr = ptr.as_ptr();
    // SAFETY: Our pointer has the correct type as guaranteed by the caller, and it
    // came from a call to `Box::into_raw` as also guaranteed by our caller.
    let boxed = unsafe { Box::from_raw(ptr) };
    core::mem::drop(boxed);
}
