use serde::Serialize;
use std::collections::HashMap;
use rdt_lab_abstract::SimConfig;

use crate::engine::{LinkEventSummary, Transmission};

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimConfig,
    pub duration: u64,
    /// Messages handed to the receiver's application, in delivery order.
    pub delivered_data: Vec<Vec<u8>>,
    pub sender_packet_count: u32,
    /// Every segment the sender handed to the network, including ones the channel dropped.
    pub transmissions: Vec<Transmission>,
    /// Highest number of unacknowledged segments observed after any sender event.
    pub max_outstanding: usize,
    pub metrics: HashMap<String, Vec<(u64, f64)>>,
    pub link_events: Vec<LinkEventSummary>,
}

impl SimulationReport {
    /// Delivered messages decoded as UTF-8 (lossily), for assertions and display.
    pub fn delivered_strings(&self) -> Vec<String> {
        self.delivered_data
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect()
    }

    /// Times at which the sender transmitted a segment carrying `seq`.
    pub fn transmit_times(&self, seq: u64) -> Vec<u64> {
        self.transmissions
            .iter()
            .filter(|t| t.seq == Some(seq))
            .map(|t| t.time)
            .collect()
    }
}
