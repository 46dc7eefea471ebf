use crate::error::{Error, Result};

/// Maximum number of narrowing steps tracked per view.
///
/// Taking a [`sub_view`](ChannelView::sub_view) past this depth fails with
/// [`Error::WindowDepthExceeded`].
pub const MAX_WINDOW_DEPTH: usize = 6;

/// One recorded narrowing step of a view, in absolute element coordinates.
///
/// `start` is measured from the beginning of the root view's channels, so a
/// window trail stays meaningful without replaying the chain of views that
/// produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// First element of the window, relative to the root view
    pub start: usize,
    /// Number of elements in the window
    pub len: usize,
}

/// A shared, windowed view over the channels of a
/// [`ChannelData`](crate::ChannelData).
///
/// A view borrows the owner's channel pointer table; it owns nothing and
/// copies nothing, so it is `Copy` like any other shared borrow. Narrowing
/// with [`sub_view`] produces a new view covering `[start, start + len)` of
/// every channel and records the step in a fixed trail of up to
/// [`MAX_WINDOW_DEPTH`] windows.
///
/// [`sub_view`]: ChannelView::sub_view
pub struct ChannelView<'a, T> {
    /// Per-channel base pointer table, borrowed from the owner
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long
    /// as this struct exists:
    ///
    /// 1. Every pointer in `channels` is valid for reads of `start + len`
    ///    consecutive elements of `T` for the whole lifetime `'a`.
    /// 2. No exclusive access to those elements exists for the lifetime
    ///    `'a`, so shared reads cannot race with writes.
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
}

impl<'a, T> ChannelView<'a, T> {
    /// Creates a root view covering all of every channel.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. Every pointer in `channels` is valid for reads of `channel_len`
    ///    consecutive elements of `T` for the whole lifetime `'a`.
    /// 2. No exclusive access to those elements exists for the lifetime
    ///    `'a`.
    #[must_use]
    pub(crate) unsafe fn new(channels: &'a [*mut T], channel_len: usize) -> Self {
        // SAFETY: We must uphold the safety invariants of the fields:
        // 1. Guaranteed by caller, as `start` is 0 here
        // 2. Guaranteed by caller
        Self {
            channels,
            start: 0,
            len: channel_len,
            windows: [Window { start: 0, len: 0 }; MAX_WINDOW_DEPTH],
            window_count: 0,
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
    /// 1. Every pointer in `channels` is valid for reads of `start + len`
    ///    consecutive elements of `T` for the whole lifetime `'a`.
    /// 2. No exclusive access to those elements exists for the lifetime
    ///    `'a`.
    #[must_use]
    pub(crate) unsafe fn from_parts(
        channels: &'a [*mut T],
        start: usize,
        len: usize,
        windows: [Window; MAX_WINDOW_DEPTH],
        window_count: usize,
    ) -> Self {
        // SAFETY: We must uphold the safety invariants of the fields:
        // 1. Guaranteed by caller
        // 2. Guaranteed by caller
        Self {
            channels,
            start,
            len,
            windows,
            window_count,
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
    ///
    /// The root view has an empty trail; each [`sub_view`] appends one
    /// entry, in absolute coordinates.
    ///
    /// [`sub_view`]: ChannelView::sub_view
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
    pub fn channel(&self, channel: usize) -> &'a [T] {
        let ptr = self.channels[channel];
        // SAFETY: the type invariants guarantee `ptr` is valid for reads of
        // `start + len` elements, so the offset stays in range
        let base = unsafe { ptr.add(self.start) };
        // SAFETY: as above, `base` is valid for reads of `len` elements for
        // the lifetime `'a`, and no exclusive access to them exists
        unsafe { core::slice::from_raw_parts(base, self.len) }
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
        // channel's readable range
        let base = unsafe { ptr.add(self.start) };
        base.cast_const()
    }

    /// Narrows the view to `[start, start + len)` of the current window,
    /// recording the step in the window trail.
    ///
    /// The returned view keeps the full lifetime `'a`, so views can be
    /// narrowed independently and kept side by side.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowOutOfRange`] if `start + len` exceeds the current
    ///   window.
    /// - [`Error::WindowDepthExceeded`] if the trail already holds
    ///   [`MAX_WINDOW_DEPTH`] windows.
    pub fn sub_view(&self, start: usize, len: usize) -> Result<ChannelView<'a, T>> {
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
        Ok(unsafe {
            ChannelView::from_parts(
                self.channels,
                window.start,
                len,
                windows,
                self.window_count + 1,
            )
        })
    }
}

impl<T> Clone for ChannelView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ChannelView<'_, T> {}

impl<T> core::fmt::Debug for ChannelView<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelView")
            .field("channel_count", &self.channel_count())
            .field("start", &self.start)
            .field("len", &self.len)
            .field("windows", &self.windows())
            .finish()
    }
}
