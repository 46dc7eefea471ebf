//! Module containing the type-erased storage handle

mod raw;
mod vtable;

pub use self::raw::RawStorage;
