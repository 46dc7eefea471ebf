//! Error types for buffer adoption and view operations.
//!
//! All fallible operations in this crate report failures through the
//! [`Error`] enum. Errors are only produced while constructing a
//! [`ChannelData`] or narrowing a view; the pointer accessors themselves
//! perform no validation.
//!
//! [`ChannelData`]: crate::ChannelData

use thiserror::Error;

/// A [`Result`](core::result::Result) type alias where the error is [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// The reasons buffer adoption or view narrowing can fail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The foreign array does not store its elements C-contiguously.
    ///
    /// Channel pointers are computed as fixed offsets from a single base
    /// address, which is only meaningful for row-major contiguous storage.
    /// This is always the first check performed during adoption.
    #[error("foreign array is not C-contiguous")]
    NotCContiguous,

    /// The foreign array has more dimensions than the channel model supports.
    #[error("unsupported array rank {rank}, expected at most 2")]
    UnsupportedRank {
        /// The rank reported by the foreign array
        rank: usize,
    },

    /// The requested channel layout exceeds the addressable capacity.
    ///
    /// The total element count, in bytes, must not exceed [`isize::MAX`], or
    /// channel pointer arithmetic would be undefined.
    #[error("channel layout {channel_count}x{channel_len} exceeds addressable capacity")]
    CapacityOverflow {
        /// The number of channels in the rejected layout
        channel_count: usize,
        /// The per-channel length in the rejected layout
        channel_len: usize,
    },

    /// A nested channel list contained no channels at all.
    #[error("channel list is empty")]
    EmptyChannels,

    /// A nested channel list contained channels of unequal lengths.
    #[error("channel {channel} has length {found}, expected {expected}")]
    RaggedChannels {
        /// The index of the first channel with a mismatched length
        channel: usize,
        /// The length of channel 0, which all channels must match
        expected: usize,
        /// The length actually found at `channel`
        found: usize,
    },

    /// A requested window does not fit inside its parent view.
    #[error("window {start}+{len} is out of range for a view of length {parent_len}")]
    WindowOutOfRange {
        /// The requested window start, relative to the parent view
        start: usize,
        /// The requested window length
        len: usize,
        /// The length of the parent view
        parent_len: usize,
    },

    /// Narrowing a view would exceed the fixed window-tracking capacity.
    #[error("window depth limit of {max} exceeded")]
    WindowDepthExceeded {
        /// The maximum number of tracked windows per view
        max: usize,
    },
}
