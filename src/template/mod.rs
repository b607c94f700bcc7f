//! The template aggregate and its codecs.
//!
//! - [`Template`]: immutable value with semantic mapping equality
//! - [`TemplateBuilder`]: staging builder
//! - wire codec gated by transport version ([`Template::encode`])
//! - structured-text parser ([`Template::from_content`])
//! - [`TemplateDiff`]: field-wise diffs for replication

mod builder;
mod codec;
mod diff;
mod parse;
#[allow(clippy::module_inception)]
mod template;

pub use builder::TemplateBuilder;
pub use diff::{FieldDiff, TemplateDiff};
pub use template::Template;
