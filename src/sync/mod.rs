//! Template replication between peers.
//!
//! Implements:
//! - Update framing with sender/acked/base state numbers
//! - Full-or-diff publication at the peer's transport version
//! - Base-checked application of incoming diffs

mod message;
mod replica;
mod tracker;

pub use message::*;
pub use replica::*;
pub use tracker::*;
