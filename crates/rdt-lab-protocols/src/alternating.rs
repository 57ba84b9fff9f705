//! Alternating-bit (stop-and-wait) ARQ.
//!
//! At most one data segment is in flight. Each new segment carries the
//! sender's current sequence bit; the receiver accepts only the bit it expects
//! and answers every arrival with exactly one ACK.

use std::collections::VecDeque;

use rdt_lab_abstract::{Endpoint, Receiver, Segment, Sender, SystemContext, flip, is_corrupt};

use crate::OUTSTANDING_METRIC;

pub struct AltSender {
    timeout: u64,
    /// Bit stamped on the next new segment, and the ACK bit awaited while one is in flight.
    sequence_bit: u8,
    /// The unacknowledged segment, kept intact as the retransmission source.
    in_flight: Option<Segment>,
    pending: VecDeque<Vec<u8>>,
}

impl AltSender {
    pub fn new(timeout: u64) -> Self {
        Self {
            timeout,
            sequence_bit: 0,
            in_flight: None,
            pending: VecDeque::new(),
        }
    }

    pub fn sequence_bit(&self) -> u8 {
        self.sequence_bit
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn transmit(&mut self, ctx: &mut dyn SystemContext, message: &[u8]) {
        let segment = Segment::data(message, Endpoint::Receiver).with_bit(self.sequence_bit);
        ctx.log(&format!(
            "ABP send bit={} ({} bytes)",
            self.sequence_bit,
            segment.len()
        ));
        ctx.send_to_network(segment.clone());
        ctx.start_timer(self.timeout);
        self.in_flight = Some(segment);
        ctx.record_metric(OUTSTANDING_METRIC, 1.0);
    }

    fn retransmit(&self, ctx: &mut dyn SystemContext) {
        if let Some(segment) = &self.in_flight {
            ctx.send_to_network(segment.clone());
            ctx.start_timer(self.timeout);
        }
    }
}

impl Sender for AltSender {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("ABP sender ready");
    }

    fn receive_from_app(&mut self, ctx: &mut dyn SystemContext, message: &[u8]) {
        if self.is_waiting() {
            self.pending.push_back(message.to_vec());
            ctx.log(&format!(
                "ABP busy, queued message ({} pending)",
                self.pending.len()
            ));
            return;
        }
        self.transmit(ctx, message);
    }

    fn receive_from_network(&mut self, ctx: &mut dyn SystemContext, segment: Segment) {
        if !self.is_waiting() {
            ctx.log("ABP idle, ignoring stray ACK");
            return;
        }

        if is_corrupt(&segment)
            || !segment.is_ack()
            || segment.sequence_bit != Some(self.sequence_bit)
        {
            ctx.log(&format!(
                "ABP corrupted or stale ACK (bit {:?}), retransmitting bit {}",
                segment.sequence_bit, self.sequence_bit
            ));
            self.retransmit(ctx);
            return;
        }

        ctx.log(&format!("ABP received ACK {}", self.sequence_bit));
        ctx.cancel_timer();
        self.in_flight = None;
        self.sequence_bit = flip(self.sequence_bit);

        match self.pending.pop_front() {
            Some(next) => self.transmit(ctx, &next),
            None => ctx.record_metric(OUTSTANDING_METRIC, 0.0),
        }
    }

    fn on_interrupt(&mut self, ctx: &mut dyn SystemContext) {
        if !self.is_waiting() {
            return;
        }
        ctx.log(&format!(
            "ABP timeout, retransmitting bit {}",
            self.sequence_bit
        ));
        self.retransmit(ctx);
    }

    fn outstanding(&self) -> usize {
        usize::from(self.is_waiting())
    }
}

pub struct AltReceiver {
    expected_bit: u8,
}

impl Default for AltReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl AltReceiver {
    pub fn new() -> Self {
        Self { expected_bit: 0 }
    }

    pub fn expected_bit(&self) -> u8 {
        self.expected_bit
    }
}

impl Receiver for AltReceiver {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("ABP receiver ready");
    }

    fn receive_from_client(&mut self, ctx: &mut dyn SystemContext, segment: Segment) {
        let accepted = if is_corrupt(&segment) || segment.sequence_bit != Some(self.expected_bit) {
            None
        } else {
            segment.message()
        };

        let Some(message) = accepted else {
            let stale = flip(self.expected_bit);
            ctx.log(&format!(
                "ABP corrupted or duplicate segment (bit {:?}, expect {}), re-ACK {}",
                segment.sequence_bit, self.expected_bit, stale
            ));
            ctx.send_to_network(Segment::ack_bit(stale));
            return;
        };

        ctx.log(&format!(
            "ABP received bit {} ({} bytes)",
            self.expected_bit,
            message.len()
        ));
        ctx.send_to_app(message);
        let acked = self.expected_bit;
        self.expected_bit = flip(self.expected_bit);
        ctx.send_to_network(Segment::ack_bit(acked));
    }
}
