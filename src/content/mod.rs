//! Structured content adapter.
//!
//! Bridges templates to their structured-text (JSON) form and holds the
//! compressed blob type used for mapping and filter fragments.

mod compressed;
mod mapping;
mod params;

pub use compressed::*;
pub use mapping::*;
pub use params::*;
