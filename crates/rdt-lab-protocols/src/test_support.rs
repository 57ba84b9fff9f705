use rdt_lab_abstract::{Segment, SystemContext};

/// Timer operations in the order a handler issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    Start(u64),
    Cancel,
}

/// A `SystemContext` that records every call for later inspection.
#[derive(Default)]
pub struct RecordingContext {
    pub sent: Vec<Segment>,
    pub delivered: Vec<Vec<u8>>,
    pub timer_ops: Vec<TimerOp>,
    pub logs: Vec<String>,
    pub metrics: Vec<(String, f64)>,
    pub now: u64,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the segments sent so far.
    pub fn take_sent(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.sent)
    }

    pub fn take_timer_ops(&mut self) -> Vec<TimerOp> {
        std::mem::take(&mut self.timer_ops)
    }

    pub fn sent_numbers(&self) -> Vec<u64> {
        self.sent.iter().filter_map(|s| s.sequence_number).collect()
    }
}

impl SystemContext for RecordingContext {
    fn send_to_network(&mut self, segment: Segment) {
        self.sent.push(segment);
    }

    fn start_timer(&mut self, interval: u64) {
        self.timer_ops.push(TimerOp::Start(interval));
    }

    fn cancel_timer(&mut self) {
        self.timer_ops.push(TimerOp::Cancel);
    }

    fn send_to_app(&mut self, message: &[u8]) {
        self.delivered.push(message.to_vec());
    }

    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn now(&self) -> u64 {
        self.now
    }

    fn record_metric(&mut self, name: &str, value: f64) {
        self.metrics.push((name.to_string(), value));
    }
}
