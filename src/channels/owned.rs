use alloc::{boxed::Box, vec::Vec};
use core::any::TypeId;

use chanbuf_internals::RawStorage;

use crate::{
    channels::{view::ChannelView, view_mut::ChannelViewMut},
    error::{Error, Result},
    foreign::ForeignArray,
};

/// FIXME: Once unsafe fields land (rust-lang/rust#132922), the fields can be
/// marked `unsafe` and this module removed.
mod limit_field_access {
    use alloc::boxed::Box;

    use chanbuf_internals::RawStorage;

    /// An owned set of equal-length channels backed by a single type-erased
    /// allocation.
    ///
    /// A `ChannelData` is produced by adopting a foreign contiguous buffer
    /// ([`from_foreign`]) or a nested channel list ([`from_vecs`]). It owns
    /// the backing storage through a [`RawStorage`] handle, plus a table of
    /// per-channel base pointers aliasing into that storage. No element data
    /// is copied at any point; dropping the `ChannelData` destroys the
    /// backing allocation through its original type, exactly once.
    ///
    /// The value is move-only: there is no way to duplicate it, because two
    /// owners would alias the same buffer. An empty value (produced by
    /// [`Default`] and left behind by [`take`]) owns nothing and has no
    /// channels.
    ///
    /// [`from_foreign`]: ChannelData::from_foreign
    /// [`from_vecs`]: ChannelData::from_vecs
    /// [`take`]: ChannelData::take
    pub struct ChannelData<T> {
        /// Per-channel base pointer table
        ///
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as
        /// long as this struct exists:
        ///
        /// 1. If `storage` is `Some`, every pointer in `channels` is valid
        ///    for reads and writes of `channel_len` consecutive elements of
        ///    `T` for as long as the storage handle is alive.
        /// 2. The element ranges addressed by distinct entries of `channels`
        ///    do not overlap.
        /// 3. The pointers in `channels` point into heap allocations owned by
        ///    `storage`, never into this struct itself, so they stay valid
        ///    when this struct or its storage handle is moved.
        /// 4. If `storage` is `None`, then `channels` is empty and
        ///    `channel_len` is 0.
        channels: Box<[*mut T]>,

        /// Number of elements in every channel
        ///
        /// See the safety invariants on `channels`.
        channel_len: usize,

        /// Handle owning the backing allocation, or `None` for the empty
        /// value
        ///
        /// See the safety invariants on `channels`. The field is declared
        /// last so the pointer table is gone by the time the backing
        /// allocation is destroyed.
        storage: Option<RawStorage>,
    }

    impl<T> ChannelData<T> {
        /// Creates a [`ChannelData`] from already-erased storage and a
        /// precomputed channel table.
        ///
        /// This is the primitive that all construction paths go through.
        /// Prefer [`from_foreign`] and [`from_vecs`] unless you are adopting
        /// storage this crate does not know how to describe.
        ///
        /// [`from_foreign`]: ChannelData::from_foreign
        /// [`from_vecs`]: ChannelData::from_vecs
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. Every pointer in `channels` is valid for reads and writes of
        ///    `channel_len` consecutive elements of `T` for as long as
        ///    `storage` is alive.
        /// 2. The element ranges addressed by distinct entries of `channels`
        ///    do not overlap.
        /// 3. The pointers in `channels` point into heap allocations owned by
        ///    `storage`, so they stay valid when `storage` or the returned
        ///    value is moved.
        #[must_use]
        pub unsafe fn from_raw_parts(
            storage: RawStorage,
            channel_len: usize,
            channels: Box<[*mut T]>,
        ) -> Self {
            // SAFETY: We must uphold the safety invariants of the fields:
            // 1. Guaranteed by caller
            // 2. Guaranteed by caller
            // 3. Guaranteed by caller
            // 4. Upheld, as `storage` is `Some` here
            ChannelData {
                channels,
                channel_len,
                storage: Some(storage),
            }
        }

        /// Creates the empty value: no storage, no channels, zero length.
        pub(crate) fn empty() -> Self {
            // Invariant 4 is upheld, and the others hold vacuously
            ChannelData {
                channels: Box::default(),
                channel_len: 0,
                storage: None,
            }
        }

        /// Returns the per-channel base pointer table.
        pub(crate) fn channel_table(&self) -> &[*mut T] {
            &self.channels
        }

        /// Returns the number of elements in every channel.
        pub(crate) fn raw_channel_len(&self) -> usize {
            self.channel_len
        }

        /// Returns the owning storage handle, or `None` for the empty value.
        pub(crate) fn raw_storage(&self) -> Option<&RawStorage> {
            self.storage.as_ref()
        }
    }
}
pub use limit_field_access::ChannelData;

impl<T: 'static> ChannelData<T> {
    /// Adopts a foreign contiguous buffer as channel data, without copying
    /// it.
    ///
    /// The descriptor's shape decides the channel layout: a rank-0 array
    /// becomes 1 channel of length 1, a rank-1 array of N elements becomes 1
    /// channel of length N, and a rank-2 array of shape `(C, L)` becomes C
    /// channels of length L, each aliasing one row of the buffer.
    ///
    /// The descriptor itself is moved onto the heap and kept alive behind a
    /// type-erased handle until the returned value is dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::NotCContiguous`] if the descriptor does not report C
    ///   contiguity. This is checked before anything else.
    /// - [`Error::UnsupportedRank`] if the rank is greater than 2.
    /// - [`Error::CapacityOverflow`] if the total element count would not be
    ///   addressable.
    ///
    /// On any error the descriptor is dropped, releasing the foreign buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanbuf::ChannelData;
    ///
    /// let data = ChannelData::from_foreign(vec![1.0f32, 2.0, 3.0])?;
    /// assert_eq!(data.channel_count(), 1);
    /// assert_eq!(data.channel(0), &[1.0, 2.0, 3.0]);
    /// # Ok::<(), chanbuf::Error>(())
    /// ```
    pub fn from_foreign<A>(mut array: A) -> Result<Self>
    where
        A: ForeignArray<Elem = T> + 'static,
    {
        if !array.is_c_contiguous() {
            return Err(Error::NotCContiguous);
        }
        let rank = array.rank();
        if rank > 2 {
            return Err(Error::UnsupportedRank { rank });
        }
        let (channel_count, channel_len) = match rank {
            0 => (1, 1),
            1 => (1, array.extent(0)),
            _ => (array.extent(0), array.extent(1)),
        };
        let total = channel_count
            .checked_mul(channel_len)
            .ok_or(Error::CapacityOverflow {
                channel_count,
                channel_len,
            })?;
        if size_of::<T>() != 0 && total > isize::MAX as usize / size_of::<T>() {
            return Err(Error::CapacityOverflow {
                channel_count,
                channel_len,
            });
        }

        let base = array.as_mut_ptr();
        let channels: Box<[*mut T]> = (0..channel_count)
            .map(|channel| {
                // SAFETY: the `ForeignArray` contract guarantees `base` points at
                // `channel_count * channel_len` contiguous elements, and the capacity
                // check above bounds the byte offset by `isize::MAX`
                unsafe { base.add(channel * channel_len) }
            })
            .collect();
        let storage = RawStorage::new(array);

        // SAFETY:
        // 1. The `ForeignArray` contract guarantees the buffer holds
        //    `channel_count * channel_len` elements and grants exclusive access for
        //    the lifetime of the descriptor, which `storage` now owns, so every
        //    table entry is valid for `channel_len` elements.
        // 2. The entries are spaced exactly `channel_len` elements apart, so the
        //    channel ranges cannot overlap.
        // 3. The contract guarantees the buffer address is stable across moves of
        //    the descriptor, which now lives on the heap inside `storage`.
        Ok(unsafe { Self::from_raw_parts(storage, channel_len, channels) })
    }

    /// Moves a nested channel list into channel data, without copying the
    /// elements.
    ///
    /// The whole nested structure is moved onto the heap behind a
    /// type-erased handle; each channel aliases the buffer of the
    /// corresponding inner `Vec`. The channels are separate allocations, so
    /// no cross-channel pointer arithmetic is possible on the result.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyChannels`] if `channels` contains no channels.
    /// - [`Error::RaggedChannels`] if the inner lengths are not all equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanbuf::ChannelData;
    ///
    /// let data = ChannelData::from_vecs(vec![vec![1, 2, 3], vec![4, 5, 6]])?;
    /// assert_eq!(data.channel_count(), 2);
    /// assert_eq!(data.channel(1), &[4, 5, 6]);
    /// # Ok::<(), chanbuf::Error>(())
    /// ```
    pub fn from_vecs(channels: Vec<Vec<T>>) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::EmptyChannels);
        }
        let channel_len = channels[0].len();
        for (channel, values) in channels.iter().enumerate() {
            if values.len() != channel_len {
                return Err(Error::RaggedChannels {
                    channel,
                    expected: channel_len,
                    found: values.len(),
                });
            }
        }

        let mut boxed = Box::new(channels);
        let table: Box<[*mut T]> = boxed.iter_mut().map(|values| values.as_mut_ptr()).collect();
        let storage = RawStorage::from_box(boxed);

        // SAFETY:
        // 1. Each table entry is the buffer pointer of one inner `Vec` holding
        //    exactly `channel_len` elements, and those buffers live until the
        //    nested structure owned by `storage` is dropped.
        // 2. Distinct inner `Vec`s own distinct heap buffers.
        // 3. The inner buffers are separate heap allocations, so their addresses
        //    are unaffected by moves of the nested structure or of the returned
        //    value.
        Ok(unsafe { Self::from_raw_parts(storage, channel_len, table) })
    }
}

impl<T> ChannelData<T> {
    /// Returns the number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channel_table().len()
    }

    /// Returns the number of elements in every channel.
    #[must_use]
    pub fn channel_len(&self) -> usize {
        self.raw_channel_len()
    }

    /// Returns `true` if this value owns no backing storage.
    ///
    /// This is the state produced by [`Default`] and left behind by
    /// [`ChannelData::take`]. An empty value has no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_storage().is_none()
    }

    /// Returns the channel as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channel_count()`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &[T] {
        let len = self.raw_channel_len();
        let ptr = self.channel_table()[channel];
        // SAFETY: the field invariants guarantee `ptr` is valid for reads of
        // `len` elements while the storage handle is alive, and the returned
        // slice cannot outlive our borrow of `self`
        unsafe { core::slice::from_raw_parts(ptr, len) }
    }

    /// Returns the channel as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channel_count()`.
    #[must_use]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [T] {
        let len = self.raw_channel_len();
        let ptr = self.channel_table()[channel];
        // SAFETY: the field invariants guarantee `ptr` is valid for writes of
        // `len` elements, distinct channels do not overlap, and the exclusive
        // borrow of `self` prevents any other access for the slice's lifetime
        unsafe { core::slice::from_raw_parts_mut(ptr, len) }
    }

    /// Returns a read pointer to the start of the channel, without bounds
    /// checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `channel < self.channel_count()`
    #[must_use]
    pub unsafe fn channel_ptr_unchecked(&self, channel: usize) -> *const T {
        // SAFETY:
        // 1. Guaranteed by the caller
        let ptr: *mut T = unsafe { *self.channel_table().get_unchecked(channel) };
        ptr.cast_const()
    }

    /// Returns a write pointer to the start of the channel, without bounds
    /// checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `channel < self.channel_count()`
    #[must_use]
    pub unsafe fn channel_ptr_mut_unchecked(&mut self, channel: usize) -> *mut T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { *self.channel_table().get_unchecked(channel) }
    }

    /// Returns the per-channel read pointer table.
    ///
    /// The table has one entry per channel, each pointing at the first
    /// element of that channel. This is the shape expected by C-style
    /// kernels that take a pointer table.
    #[must_use]
    pub fn read_ptrs(&self) -> &[*const T] {
        let table = self.channel_table();
        // SAFETY: `*const T` and `*mut T` are guaranteed to have the same
        // layout, and the returned slice covers the same table for the same
        // lifetime
        unsafe { core::slice::from_raw_parts(table.as_ptr().cast::<*const T>(), table.len()) }
    }

    /// Returns the per-channel write pointer table.
    #[must_use]
    pub fn write_ptrs(&mut self) -> &[*mut T] {
        self.channel_table()
    }

    /// Returns the handle owning the backing allocation, or `None` for the
    /// empty value.
    #[must_use]
    pub fn storage(&self) -> Option<&RawStorage> {
        self.raw_storage()
    }

    /// Returns the [`TypeId`] of the adopted backing object, or `None` for
    /// the empty value.
    #[must_use]
    pub fn storage_type_id(&self) -> Option<TypeId> {
        self.raw_storage().map(RawStorage::object_type_id)
    }

    /// Returns the [`core::any::type_name`] of the adopted backing object,
    /// or `None` for the empty value.
    #[must_use]
    pub fn storage_type_name(&self) -> Option<&'static str> {
        self.raw_storage().map(RawStorage::object_type_name)
    }

    /// Moves the channel data out, leaving the empty value behind.
    ///
    /// The returned value owns the storage and the channel table; the
    /// channel pointers themselves are unchanged.
    #[must_use]
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Borrows the channels as a shared, windowed view.
    #[must_use]
    pub fn view(&self) -> ChannelView<'_, T> {
        // SAFETY:
        // 1. The field invariants guarantee every table entry is valid for reads
        //    of `channel_len` elements while the storage handle is alive, and the
        //    borrow of `self` keeps the handle alive for the view's lifetime.
        unsafe { ChannelView::new(self.channel_table(), self.raw_channel_len()) }
    }

    /// Borrows the channels as a mutable, windowed view.
    #[must_use]
    pub fn view_mut(&mut self) -> ChannelViewMut<'_, T> {
        // SAFETY:
        // 1. The field invariants guarantee every table entry is valid for reads
        //    and writes of `channel_len` elements while the storage handle is
        //    alive, the channels do not overlap, and the exclusive borrow of
        //    `self` hands the view exclusive access for its lifetime.
        unsafe { ChannelViewMut::new(self.channel_table(), self.raw_channel_len()) }
    }
}

impl<T> Default for ChannelData<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> core::fmt::Debug for ChannelData<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelData")
            .field("channel_count", &self.channel_count())
            .field("channel_len", &self.channel_len())
            .field("storage_type", &self.storage_type_name())
            .finish_non_exhaustive()
    }
}
