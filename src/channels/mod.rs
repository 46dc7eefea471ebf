//! Owned multi-channel buffers and the views into them.
//!
//! This module provides the container produced by adopting a foreign buffer
//! or a nested channel list, together with the borrowed views used to work
//! on windows of it.
//!
//! # Core Types
//!
//! - [`ChannelData`]: An owned set of equal-length channels backed by a
//!   single type-erased allocation
//! - [`ChannelView`] / [`ChannelViewMut`]: Borrowed, windowed views over the
//!   channels of a [`ChannelData`]
//! - [`Window`]: One recorded narrowing step of a view
//!
//! # Constructing channel data
//!
//! ```
//! use chanbuf::ChannelData;
//!
//! let mut data = ChannelData::from_vecs(vec![vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?;
//! assert_eq!(data.channel_count(), 2);
//! assert_eq!(data.channel_len(), 3);
//!
//! data.channel_mut(0)[1] = 9.0;
//! assert_eq!(data.channel(0), &[1.0, 9.0, 3.0]);
//! assert_eq!(data.channel(1), &[4.0, 5.0, 6.0]);
//! # Ok::<(), chanbuf::Error>(())
//! ```

mod owned;
mod view;
mod view_mut;

pub use self::{
    owned::ChannelData,
    view::{ChannelView, MAX_WINDOW_DEPTH, Window},
    view_mut::ChannelViewMut,
};
