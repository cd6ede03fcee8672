//! Pipeline module
//!
//! Wires the components into the two halves of the system.
//!
//! # Overview
//!
//! - `produce_once` - fetch → normalize → publish, once per tick
//! - `Subscription` - consume → decode → persist, with checkpointing and
//!   an error channel for rejected messages

mod produce;
mod subscription;
mod types;

pub use produce::produce_once;
pub use subscription::Subscription;
pub use types::{MessageOutcome, SubscriptionStats};
