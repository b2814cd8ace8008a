//! Storyloom Publication Gate
//!
//! The pure decision function that determines whether an extracted item
//! may move to published status right now. The decision is recomputed at
//! every publish attempt and never cached: a Protocol can expire, and a
//! later Consultation can reverse an earlier approval.

#![warn(missing_docs)]

mod gate;

pub use gate::{HoldReason, PublicationGate, PublishDecision};
