//! Core traits, types, constants and errors.
//!
//! Everything here is free of I/O; the rest of the crate builds on it.

pub mod constants;
mod error;
mod resettable;
mod traits;
mod version;

pub use error::*;
pub use resettable::*;
pub use traits::*;
pub use version::*;
