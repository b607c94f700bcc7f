//! Collaborator types held by a template.
//!
//! Each type owns its own structured-text and wire forms; the template
//! only decides where and at which version they appear.

mod alias;
mod lifecycle;
mod options;
mod settings;

pub use alias::*;
pub use lifecycle::*;
pub use options::*;
pub use settings::*;
