//! Sender/receiver state machines for the three reliable-data-transfer variants:
//! a naive pass-through, alternating-bit stop-and-wait, and Go-Back-N.

pub mod alternating;
pub mod gbn;
pub mod naive;
pub mod registry;
pub mod window;

#[cfg(test)]
mod test_support;

pub use rdt_lab_abstract::{Endpoint, Payload, Receiver, Segment, Sender, SystemContext};
pub use registry::{ProtocolPair, build_pair};
pub use rdt_lab_abstract::ProtocolKind;

/// Metric name senders use to report how many segments are unacknowledged.
pub const OUTSTANDING_METRIC: &str = "outstanding";
