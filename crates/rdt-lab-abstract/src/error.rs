use thiserror::Error;

/// Rejected simulation or protocol settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown protocol '{0}' (expected one of: naive, alt, gbn)")]
    UnknownProtocol(String),

    #[error("window size must be at least 1")]
    ZeroWindow,

    #[error("retransmission timeout must be at least 1 step")]
    ZeroTimeout,

    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("min_latency {min} exceeds max_latency {max}")]
    LatencyRange { min: u64, max: u64 },
}
