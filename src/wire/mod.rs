//! Binary wire layer.
//!
//! Implements:
//! - Version-aware stream primitives
//! - Table-driven version gates for optional fields

mod gate;
mod stream;

pub use gate::*;
pub use stream::*;
