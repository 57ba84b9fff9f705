pub mod config;
pub mod error;
pub mod interface;
pub mod scenario;
pub mod segment;

pub use interface::{Receiver, Sender, SystemContext};
pub use segment::{CORRUPTION_MARKER, Endpoint, Payload, Segment, flip, is_corrupt};

pub use config::{ProtocolConfig, ProtocolKind, SimConfig};
pub use error::ConfigError;
pub use scenario::{SimConfigOverride, TestAction, TestAssertion, TestScenario};
