use core::marker::PhantomData;

use crate::{
    channels::view::{ChannelView, MAX_WINDOW_DEPTH, Window},
    error::{Error, Result},
};

/// An exclusive, windowed view over the channels of a
/// [`ChannelData`](crate::ChannelData).
///
/// Unlike [`ChannelView`], this view hands out mutable channel slices, so it
/// is neither `Copy` nor `Clone`. Narrowing with [`sub_view`] reborrows the
/// view, keeping at most one exclusive window alive at a time; use
/// [`into_view`] or [`as_view`] to fan out into shared views instead.
///
/// [`sub_view`]: ChannelViewMut::sub_view
/// [`into_view`]: ChannelViewMut::into_view
/// [`as_view`]: ChannelViewMut::as_view
pub struct ChannelViewMut<'a, T> {
    /// Per-channel base pointer table, borrowed from the owner
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long
    /// as this struct exists:
    ///
    /// 1. Every pointer in `channels` is valid for reads and writes of
    ///    `start + len` consecutive elements of `T` for the whole lifetime
    ///    `'a`.
    /// 2. The element ranges of distinct channels do not overlap.
    /// 3. For the lifetime `'a`, no access to those elements exists other
    ///    than through this view.
    channels: &'a [*mut T],

    /// First element of the current window, relative to the channel bases
    ///
    /// See the safety invariants on `channels`.
    start: usize,

    /// Number of elements in the current window
    ///
    /// See the safety invariants on `channels`.
    len: usize,

    /// Trail of recorded narrowing steps, filled up to `window_count`
    windows: [Window; MAX_WINDOW_DEPTH],

    /// Number of valid entries in `windows`, at most [`MAX_WINDOW_DEPTH`]
    window_count: usize,

    /// Marks the view as an exclusive borrow of the elements
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> ChannelViewMut<'a, T> {
    /// Creates a root view covering all of every channel.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. Every pointer in `channels` is valid for reads and writes of
    ///    `channel_len` consecutive elements of `T` for the whole lifetime
    ///    `'a`.
    /// 2. The element ranges of distinct channels do not overlap.
    /// 3. For the lifetime `'a`, no access to those elements exists other
    ///    than through the returned view.
    #[must_use]
    pub(crate) unsafe fn new(channels: &'a [*mut T], channel_len: usize) -> Self {
        // SAFETY: We must uphold the safety invariants of the fields:
        // 1. Guaranteed by caller, as `start` is 0 here
        // 2. Guaranteed by caller
        // 3. Guaranteed by caller
        Self {
            channels,
            start: 0,
            len: channel_len,
            windows: [Window { start: 0, len: 0 }; MAX_WINDOW_DEPTH],
            window_count: 0,
            _marker: PhantomData,
        }
    }

    /// Creates a view from an existing window state.
    ///
    /// `window_count` must be at most [`MAX_WINDOW_DEPTH`], and
    /// `windows[..window_count]` should be the narrowing steps that produced
    /// the `start`/`len` window.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. Every pointer in `channels` is valid for reads and writes of
    ///    `start + len` consecutive elements of `T` for the whole lifetime
    ///    `'a`.
    /// 2. The element ranges of distinct channels do not overlap.
    /// 3. For the lifetime `'a`, no access to those elements exists other
    ///    than through the returned view.
    #[must_use]
    unsafe fn from_parts(
        channels: &'a [*mut T],
        start: usize,
        len: usize,
        windows: [Window; MAX_WINDOW_DEPTH],
        window_count: usize,
    ) -> Self {
        // SAFETY: We must uphold the safety invariants of the fields:
        // 1. Guaranteed by caller
        // 2. Guaranteed by caller
        // 3. Guaranteed by caller
        Self {
            channels,
            start,
            len,
            windows,
            window_count,
            _marker: PhantomData,
        }
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the number of elements of every channel inside the current
    /// window.
    #[must_use]
    pub fn channel_len(&self) -> usize {
        self.len
    }

    /// Returns the window start, relative to the beginning of the root
    /// view's channels.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns `true` if the view contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() || self.len == 0
    }

    /// Returns the narrowing steps that produced this view, outermost first.
    #[must_use]
    pub fn windows(&self) -> &[Window] {
        &self.windows[..self.window_count]
    }

    /// Returns the windowed channel as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channel_count()`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &[T] {
        let ptr = self.channels[channel];
        // SAFETY: the type invariants guarantee `ptr` is valid for reads of
        // `start + len` elements, so the offset stays in range
        let base = unsafe { ptr.add(self.start) };
        // SAFETY: as above, `base` is valid for reads of `len` elements, and
        // the elements stay borrowed through `self` for the returned lifetime
        unsafe { core::slice::from_raw_parts(base, self.len) }
    }

    /// Returns the windowed channel as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channel_count()`.
    #[must_use]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [T] {
        let ptr = self.channels[channel];
        // SAFETY: the type invariants guarantee `ptr` is valid for writes of
        // `start + len` elements, so the offset stays in range
        let base = unsafe { ptr.add(self.start) };
        // SAFETY: as above, `base` is valid for writes of `len` elements, the
        // view holds the only access to them, and `self` stays exclusively
        // borrowed for the returned lifetime
        unsafe { core::slice::from_raw_parts_mut(base, self.len) }
    }

    /// Returns a read pointer to the start of the windowed channel, without
    /// bounds checking.
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
        let ptr: *mut T = unsafe { *self.channels.get_unchecked(channel) };
        // SAFETY: the type invariants guarantee the offset stays within the
        // channel's accessible range
        let base = unsafe { ptr.add(self.start) };
        base.cast_const()
    }

    /// Returns a write pointer to the start of the windowed channel, without
    /// bounds checking.
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
        let ptr: *mut T = unsafe { *self.channels.get_unchecked(channel) };
        // SAFETY: the type invariants guarantee the offset stays within the
        // channel's accessible range
        unsafe { ptr.add(self.start) }
    }

    /// Narrows the view to `[start, start + len)` of the current window,
    /// recording the step in the window trail.
    ///
    /// The returned view reborrows `self`, so the parent view becomes usable
    /// again once the narrowed view is dropped. On error the parent is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowOutOfRange`] if `start + len` exceeds the current
    ///   window.
    /// - [`Error::WindowDepthExceeded`] if the trail already holds
    ///   [`MAX_WINDOW_DEPTH`] windows.
    pub fn sub_view(&mut self, start: usize, len: usize) -> Result<ChannelViewMut<'_, T>> {
        let parent_len = self.len;
        let end = start.checked_add(len).ok_or(Error::WindowOutOfRange {
            start,
            len,
            parent_len,
        })?;
        if end > parent_len {
            return Err(Error::WindowOutOfRange {
                start,
                len,
                parent_len,
            });
        }
        if self.window_count == MAX_WINDOW_DEPTH {
            return Err(Error::WindowDepthExceeded {
                max: MAX_WINDOW_DEPTH,
            });
        }

        let window = Window {
            start: self.start + start,
            len,
        };
        let mut windows = self.windows;
        windows[self.window_count] = window;

        // SAFETY:
        // 1. The new window lies inside the current one, so the type invariants
        //    of `self` cover `window.start + len` elements of every channel.
        // 2. Guaranteed by the type invariants of `self`.
        // 3. `self` stays exclusively borrowed for the returned lifetime, so
        //    the narrowed view holds the only access.
        Ok(unsafe {
            ChannelViewMut::from_parts(
                self.channels,
                window.start,
                len,
                windows,
                self.window_count + 1,
            )
        })
    }

    /// Reborrows the view as a shorter-lived exclusive view.
    ///
    /// This is useful for passing the view to a function without giving it
    /// away.
    ///
    /// # Example
    ///
    /// ```
    /// use chanbuf::ChannelData;
    ///
    /// let mut data = ChannelData::from_vecs(vec![vec![1.0f32, 2.0, 3.0]])?;
    /// let mut view = data.view_mut();
    /// {
    ///     let mut narrowed = view.as_mut();
    ///     narrowed.channel_mut(0)[0] = 10.0;
    /// }
    /// // The original view is usable again afterwards
    /// view.channel_mut(0)[1] = 20.0;
    /// assert_eq!(data.channel(0), &[10.0, 20.0, 3.0]);
    /// # Ok::<(), chanbuf::Error>(())
    /// ```
    #[must_use]
    pub fn as_mut(&mut self) -> ChannelViewMut<'_, T> {
        // SAFETY:
        // 1. Guaranteed by the type invariants of `self`.
        // 2. Guaranteed by the type invariants of `self`.
        // 3. `self` stays exclusively borrowed for the returned lifetime, so
        //    the reborrowed view holds the only access.
        unsafe {
            ChannelViewMut::from_parts(
                self.channels,
                self.start,
                self.len,
                self.windows,
                self.window_count,
            )
        }
    }

    /// Reborrows the view as a shorter-lived shared view.
    ///
    /// The window trail carries over unchanged.
    #[must_use]
    pub fn as_view(&self) -> ChannelView<'_, T> {
        // SAFETY:
        // 1. Guaranteed by the type invariants of `self`.
        // 2. `self` holds the only access to the elements and stays borrowed
        //    for the returned lifetime, so no exclusive access remains.
        unsafe {
            ChannelView::from_parts(
                self.channels,
                self.start,
                self.len,
                self.windows,
                self.window_count,
            )
        }
    }

    /// Converts the view into a shared view with the full lifetime.
    ///
    /// Giving up exclusivity allows the result to be copied freely.
    #[must_use]
    pub fn into_view(self) -> ChannelView<'a, T> {
        // SAFETY:
        // 1. Guaranteed by the type invariants of `self`.
        // 2. `self` held the only access to the elements and is consumed
        //    here, so no exclusive access remains for `'a`.
        unsafe {
            ChannelView::from_parts(
                self.channels,
                self.start,
                self.len,
                self.windows,
                self.window_count,
            )
        }
    }
}

impl<T> core::fmt::Debug for ChannelViewMut<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelViewMut")
            .field("channel_count", &self.channel_count())
            .field("start", &self.start)
            .field("len", &self.len)
            .field("windows", &self.windows())
            .finish()
    }
}
