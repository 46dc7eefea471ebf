#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`chanbuf`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased ownership handle that powers
//! the [`chanbuf`] buffer adoption library. It provides the foundation for
//! keeping a foreign allocation alive, and eventually destroying it through
//! its original type, after the rest of the program has forgotten that type.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`chanbuf`] crate, not this one.
//!
//! # Architecture
//!
//! The crate is organized around a single type-erased handle:
//!
//! - **[`storage`]**: Type-erased storage ownership
//!   - [`RawStorage`]: Owned handle with [`Box`]-based allocation
//!   - [`StorageVtable`]: Function pointers for type-erased dispatch
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. When we erase an allocation like `Box<MyArray>` to a
//! `NonNull<Erased>`, we must ensure that the vtable function pointers still
//! match the actual concrete type stored in memory.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **Paired creation**: The pointer and its vtable are only ever produced
//!   together, from the same concrete type, by the same constructor
//! - **Documented vtable contracts**: Each vtable method specifies exactly when
//!   it can be safely called
//!
//! See the [`storage`] module documentation for a detailed explanation of how
//! these patterns are applied.
//!
//! [`chanbuf`]: https://docs.rs/chanbuf/latest/chanbuf/
//! [`StorageVtable`]: storage::vtable::StorageVtable
//! [`Box`]: alloc::boxed::Box

extern crate alloc;

mod storage;
mod util;

pub use storage::RawStorage;
