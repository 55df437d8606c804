//! # Domain Layer
//!
//! Pure index computation. No I/O; the global index in `crate::global`
//! is the only part that consults state.

pub mod entries;
pub mod local;

pub use entries::*;
pub use local::local_index;
