use crate::config::{ProtocolConfig, SimConfig};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub config: SimConfigOverride,
    pub actions: Vec<TestAction>,
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SimConfigOverride {
    pub loss_rate: Option<f64>,
    pub corrupt_rate: Option<f64>,
    pub min_latency: Option<u64>,
    pub max_latency: Option<u64>,
    pub seed: Option<u64>,
}

impl SimConfigOverride {
    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.loss_rate {
            config.loss_rate = v;
        }
        if let Some(v) = self.corrupt_rate {
            config.corrupt_rate = v;
        }
        if let Some(v) = self.min_latency {
            config.min_latency = v;
        }
        if let Some(v) = self.max_latency {
            config.max_latency = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAction {
    /// Application sends data at a specific time
    AppSend { time: u64, data: String },
    /// Drop the first segment sent by the sender with the given sequence id
    DropNextFromSender { seq: u64 },
    /// Drop the first ACK sent by the receiver with the given sequence id
    DropNextFromReceiver { ack: u64 },
    /// Corrupt the first segment sent by the sender with the given sequence id
    CorruptNextFromSender { seq: u64 },
    /// Corrupt the first ACK sent by the receiver with the given sequence id
    CorruptNextFromReceiver { ack: u64 },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// Assert that specific data was delivered to the application layer
    DataDelivered { data: String },
    /// Assert the application received exactly this list, in this order
    DeliveredExactly { data: Vec<String> },
    /// Assert that the total number of segments sent by the sender is within range
    SenderPacketCount { min: u32, max: Option<u32> },
    /// Assert that outstanding (unacknowledged) segments never exceeded `max`
    MaxOutstanding { max: usize },
    /// Assert that simulation finishes within time
    MaxDuration { ms: u64 },
}
