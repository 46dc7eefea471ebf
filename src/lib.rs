#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Zero-copy adoption of foreign multi-channel buffers with type-erased
//! ownership.
//!
//! ## Overview
//!
//! This crate takes buffers that were allocated somewhere else, such as
//! arrays handed over an FFI boundary or sample blocks produced by another
//! library, and turns them into safely owned multi-channel data without
//! copying a single element. The adopted buffer is viewed as `channel_count`
//! channels of `channel_len` elements each, and the original allocation is
//! released through a type-erased handle when the owner is dropped.
//!
//! The alternative this crate exists to avoid is the eager copy: flattening
//! a foreign array into a fresh `Vec` on every boundary crossing. For audio
//! and signal processing workloads, where the same block of samples crosses
//! the boundary many times per second, adopting the allocation instead of
//! copying it is the difference between a pointer exchange and a memcpy per
//! block.
//!
//! ## Quick Example
//!
//! ```
//! use chanbuf::ChannelData;
//!
//! // Adopt two channels of samples, one allocation per channel
//! let mut data = ChannelData::from_vecs(vec![
//!     vec![0.0f32, 1.0, 2.0, 3.0],
//!     vec![4.0, 5.0, 6.0, 7.0],
//! ])?;
//!
//! // Mutate the samples in place
//! for channel in 0..data.channel_count() {
//!     for sample in data.channel_mut(channel) {
//!         *sample *= 2.0;
//!     }
//! }
//!
//! // Inspect a window without copying
//! let view = data.view().sub_view(1, 2)?;
//! assert_eq!(view.channel(0), &[2.0, 4.0]);
//! assert_eq!(view.channel(1), &[10.0, 12.0]);
//! # Ok::<(), chanbuf::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! On a mechanical level, the crate is built from three pieces:
//!
//! - [`ChannelData<T>`] is the **owner**. It holds a table of per-channel
//!   pointers into the adopted allocation, plus a [`RawStorage`] handle that
//!   knows how to destroy the allocation exactly once, whatever its concrete
//!   type was.
//! - [`ChannelView`] is a **shared view**: `Copy`, read-only, and freely
//!   narrowable into sub-windows.
//! - [`ChannelViewMut`] is an **exclusive view**: it hands out mutable
//!   channel slices and reborrows instead of copying, so at most one
//!   exclusive window is live at a time.
//!
//! The owner is move-only. Moving it transfers the allocation; taking it with
//! [`ChannelData::take`] leaves an empty owner behind, and dropping the final
//! owner releases the allocation through the erased handle. Cloning is
//! deliberately not offered, since a clone would either copy the elements or
//! double-free the adopted buffer.
//!
//! ## Adopting Foreign Buffers
//!
//! Buffers enter the crate through two doors:
//!
//! - [`ChannelData::from_vecs`] adopts a `Vec<Vec<T>>`, one inner vector per
//!   channel. All inner vectors must have the same length.
//! - [`ChannelData::from_foreign`] adopts any descriptor implementing the
//!   [`ForeignArray`] trait. The descriptor reports a rank, per-axis extents,
//!   and a base pointer; the crate maps rank 0 to a single one-element
//!   channel, rank 1 to a single channel, and rank 2 to one channel per row.
//!   The buffer must be C-contiguous, and ranks above 2 are rejected.
//!
//! In both cases construction is where all checking happens: contiguity,
//! rank, addressable size, and channel-length agreement are verified up
//! front, and a descriptive [`Error`] comes back if anything is off. The
//! accessors on the resulting [`ChannelData<T>`] then trust those invariants,
//! so per-sample access costs what a slice index costs. For hot loops that
//! have already validated their indices there are `unsafe` pointer accessors
//! with no checks at all.
//!
//! For implementation details of the erased handle, see the
//! [`chanbuf-internals`] crate.
//!
//! [`chanbuf-internals`]: chanbuf_internals
//!
//! ## Project Goals
//!
//! - **Zero-copy**: Adoption never touches the elements. The channel table
//!   points into the original allocation, verifiably so via
//!   [`ChannelData::read_ptrs`].
//! - **Exactly-once release**: However the owner is moved around, the adopted
//!   allocation is destroyed exactly once, with its real type.
//! - **Checked at the boundary**: Every way to build an owner validates its
//!   input; every accessor afterwards is as cheap as the invariants allow.
//! - **`no_std`**: The crate only needs `alloc`, so it fits embedded and
//!   plugin environments where the host owns the runtime.

extern crate alloc;

pub mod channels;

mod error;
mod foreign;

pub use chanbuf_internals::RawStorage;

pub use self::{
    channels::{ChannelData, ChannelView, ChannelViewMut, MAX_WINDOW_DEPTH, Window},
    error::{Error, Result},
    foreign::ForeignArray,
};
