use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Channel and scheduling parameters for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub loss_rate: f64,
    pub corrupt_rate: f64,
    pub min_latency: u64,
    pub max_latency: u64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            min_latency: 10,
            max_latency: 100,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("loss_rate", self.loss_rate)?;
        check_rate("corrupt_rate", self.corrupt_rate)?;
        if self.min_latency > self.max_latency {
            return Err(ConfigError::LatencyRange {
                min: self.min_latency,
                max: self.max_latency,
            });
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

/// The three protocol variants, from no reliability up to a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolKind {
    #[serde(rename = "naive")]
    Naive,
    #[serde(rename = "alt", alias = "abp", alias = "alternating-bit")]
    AlternatingBit,
    #[serde(rename = "gbn", alias = "go-back-n")]
    GoBackN,
}

impl FromStr for ProtocolKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "naive" => Ok(ProtocolKind::Naive),
            "alt" | "abp" | "alternating-bit" => Ok(ProtocolKind::AlternatingBit),
            "gbn" | "go-back-n" => Ok(ProtocolKind::GoBackN),
            other => Err(ConfigError::UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolKind::Naive => f.write_str("naive"),
            ProtocolKind::AlternatingBit => f.write_str("alt"),
            ProtocolKind::GoBackN => f.write_str("gbn"),
        }
    }
}

/// Which protocol pair to build and how to tune it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub kind: ProtocolKind,
    /// Retransmission interval in simulated steps.
    pub timeout: u64,
    /// Go-Back-N window size N. Ignored by the other variants.
    pub window_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            kind: ProtocolKind::GoBackN,
            timeout: 200,
            window_size: 4,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_names_parse() {
        assert_eq!("naive".parse(), Ok(ProtocolKind::Naive));
        assert_eq!("abp".parse(), Ok(ProtocolKind::AlternatingBit));
        assert_eq!("go-back-n".parse(), Ok(ProtocolKind::GoBackN));
        assert_eq!(
            "sr".parse::<ProtocolKind>(),
            Err(ConfigError::UnknownProtocol("sr".into()))
        );
    }

    #[test]
    fn protocol_table_deserializes_with_defaults() {
        let cfg: ProtocolConfig = toml::from_str("kind = \"alt\"").unwrap();
        assert_eq!(cfg.kind, ProtocolKind::AlternatingBit);
        assert_eq!(cfg.timeout, 200);
        assert_eq!(cfg.window_size, 4);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cfg = ProtocolConfig {
            window_size: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroWindow));

        let sim = SimConfig {
            loss_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            sim.validate(),
            Err(ConfigError::InvalidRate { name: "loss_rate", .. })
        ));

        let sim = SimConfig {
            min_latency: 50,
            max_latency: 10,
            ..Default::default()
        };
        assert_eq!(
            sim.validate(),
            Err(ConfigError::LatencyRange { min: 50, max: 10 })
        );
        assert!(SimConfig::default().validate().is_ok());
    }
}
