//! Go-Back-N sliding-window ARQ.
//!
//! Up to `N` data segments may be outstanding. A single timer covers the
//! whole window and is re-armed for the oldest outstanding segment whenever
//! the window slides. On expiry the entire window is resent, oldest first.
//!
//! Sequence numbers start at [`INITIAL_SEQUENCE_NUMBER`] and grow without
//! wrapping; the sender slides only on an ACK that equals `base_number`.

use std::collections::VecDeque;

use rdt_lab_abstract::{Endpoint, Receiver, Segment, Sender, SystemContext, is_corrupt};

use crate::OUTSTANDING_METRIC;
use crate::window::Window;

pub const INITIAL_SEQUENCE_NUMBER: u64 = 1;

/// Go-Back-N send side.
///
/// ```text
///  base_number        next_seq_num
///      │                  │
///  ────┼──────────────────┼──────────────▶ sequence space
///      │ <── window ────▶ │ <── pending queue admits here
/// ```
pub struct GbnSender {
    timeout: u64,
    /// Oldest unacknowledged sequence number.
    base_number: u64,
    /// Sequence number the next admitted message receives.
    next_seq_num: u64,
    window: Window,
    pending: VecDeque<Vec<u8>>,
}

impl GbnSender {
    pub fn new(window_size: usize, timeout: u64) -> Self {
        Self {
            timeout,
            base_number: INITIAL_SEQUENCE_NUMBER,
            next_seq_num: INITIAL_SEQUENCE_NUMBER,
            window: Window::new(window_size),
            pending: VecDeque::new(),
        }
    }

    pub fn base_number(&self) -> u64 {
        self.base_number
    }

    pub fn next_seq_num(&self) -> u64 {
        self.next_seq_num
    }

    pub fn window_size(&self) -> usize {
        self.window.capacity()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn has_capacity(&self) -> bool {
        self.next_seq_num - self.base_number < self.window.capacity() as u64
    }

    /// Number, buffer and transmit one message. Timer handling is the caller's.
    fn admit(&mut self, ctx: &mut dyn SystemContext, message: &[u8]) {
        let segment =
            Segment::data(message, Endpoint::Receiver).with_number(self.next_seq_num);
        ctx.log(&format!(
            "GBN send seq={} ({} bytes)",
            self.next_seq_num,
            segment.len()
        ));
        ctx.send_to_network(segment.clone());
        self.window.push(segment);
        self.next_seq_num += 1;
        ctx.record_metric(OUTSTANDING_METRIC, self.window.len() as f64);
    }
}

impl Sender for GbnSender {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log(&format!(
            "GBN sender ready (N={}, timeout={})",
            self.window.capacity(),
            self.timeout
        ));
    }

    fn receive_from_app(&mut self, ctx: &mut dyn SystemContext, message: &[u8]) {
        if !self.has_capacity() {
            self.pending.push_back(message.to_vec());
            ctx.log(&format!(
                "GBN window full, queued message ({} pending)",
                self.pending.len()
            ));
            return;
        }

        let was_empty = self.window.is_empty();
        self.admit(ctx, message);
        if was_empty {
            ctx.start_timer(self.timeout);
        }
    }

    fn receive_from_network(&mut self, ctx: &mut dyn SystemContext, segment: Segment) {
        if is_corrupt(&segment) {
            ctx.log("GBN corrupted ACK ignored");
            return;
        }
        let Some(ack) = segment.sequence_number.filter(|_| segment.is_ack()) else {
            ctx.log("GBN non-ACK segment ignored");
            return;
        };
        if ack != self.base_number {
            ctx.log(&format!(
                "GBN ACK {} ignored (base={})",
                ack, self.base_number
            ));
            return;
        }

        ctx.log(&format!("GBN received ACK {}", ack));
        self.window.pop();
        self.base_number += 1;

        if let Some(next) = self.pending.pop_front() {
            self.admit(ctx, &next);
        } else {
            ctx.record_metric(OUTSTANDING_METRIC, self.window.len() as f64);
        }

        if self.base_number == self.next_seq_num {
            ctx.cancel_timer();
        } else {
            ctx.start_timer(self.timeout);
        }
    }

    fn on_interrupt(&mut self, ctx: &mut dyn SystemContext) {
        if self.window.is_empty() {
            return;
        }
        ctx.log(&format!(
            "GBN timeout, resending seq {}..{}",
            self.base_number, self.next_seq_num
        ));
        for segment in self.window.iter() {
            ctx.send_to_network(segment.clone());
        }
        ctx.start_timer(self.timeout);
    }

    fn outstanding(&self) -> usize {
        self.window.len()
    }
}

/// Go-Back-N receive side: accepts strictly in order.
pub struct GbnReceiver {
    expected_sequence_number: u64,
}

impl Default for GbnReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl GbnReceiver {
    pub fn new() -> Self {
        Self {
            expected_sequence_number: INITIAL_SEQUENCE_NUMBER,
        }
    }

    pub fn expected_sequence_number(&self) -> u64 {
        self.expected_sequence_number
    }

    fn last_accepted(&self) -> u64 {
        self.expected_sequence_number.saturating_sub(1)
    }
}

impl Receiver for GbnReceiver {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("GBN receiver ready");
    }

    fn receive_from_client(&mut self, ctx: &mut dyn SystemContext, segment: Segment) {
        let corrupt = is_corrupt(&segment);
        if !corrupt
            && segment.sequence_number == Some(self.expected_sequence_number)
            && let Some(message) = segment.message()
        {
            ctx.log(&format!(
                "GBN received seq {} ({} bytes)",
                self.expected_sequence_number,
                message.len()
            ));
            ctx.send_to_app(message);
            ctx.send_to_network(Segment::ack_number(self.expected_sequence_number));
            self.expected_sequence_number += 1;
            return;
        }

        // Only numbers that were already delivered are ever acknowledged. A
        // duplicate is answered with its own number so a sender stuck on a lost
        // ACK can still slide; anything else re-ACKs the last accepted number.
        let ack = match segment.sequence_number {
            Some(n) if !corrupt && n < self.expected_sequence_number => n,
            _ => self.last_accepted(),
        };
        ctx.log(&format!(
            "GBN discarded seq {:?} (expect {}), re-ACK {}",
            segment.sequence_number, self.expected_sequence_number, ack
        ));
        ctx.send_to_network(Segment::ack_number(ack));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingContext, TimerOp};
    use rdt_lab_abstract::Payload;

    const TIMEOUT: u64 = 100;

    fn data(n: u64, msg: &str) -> Segment {
        Segment::data(msg.as_bytes(), Endpoint::Receiver).with_number(n)
    }

    fn corrupted(mut segment: Segment) -> Segment {
        segment.payload = Payload::Corrupted;
        segment
    }

    #[test]
    fn window_fills_then_backpressure_queues() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(3, TIMEOUT);
        for msg in ["m1", "m2", "m3", "m4", "m5"] {
            sender.receive_from_app(&mut ctx, msg.as_bytes());
        }

        assert_eq!(ctx.sent_numbers(), vec![1, 2, 3]);
        assert_eq!(sender.pending_len(), 2);
        assert_eq!(sender.outstanding(), 3);
        assert_eq!(sender.next_seq_num() - sender.base_number(), 3);
        // Only the first segment into an empty window arms the timer.
        assert_eq!(ctx.timer_ops, vec![TimerOp::Start(TIMEOUT)]);
    }

    #[test]
    fn acks_admit_pending_messages_in_order() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(3, TIMEOUT);
        for msg in ["m1", "m2", "m3", "m4", "m5"] {
            sender.receive_from_app(&mut ctx, msg.as_bytes());
        }
        ctx.take_sent();
        ctx.take_timer_ops();

        sender.receive_from_network(&mut ctx, Segment::ack_number(1));
        let sent = ctx.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sequence_number, Some(4));
        assert_eq!(sent[0].message(), Some(&b"m4"[..]));
        assert_eq!(ctx.take_timer_ops(), vec![TimerOp::Start(TIMEOUT)]);

        sender.receive_from_network(&mut ctx, Segment::ack_number(2));
        let sent = ctx.take_sent();
        assert_eq!(sent[0].sequence_number, Some(5));
        assert_eq!(sent[0].message(), Some(&b"m5"[..]));
        assert_eq!(sender.pending_len(), 0);
        assert_eq!(sender.base_number(), 3);
    }

    #[test]
    fn last_ack_cancels_timer() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(3, TIMEOUT);
        sender.receive_from_app(&mut ctx, b"m1");
        sender.receive_from_app(&mut ctx, b"m2");
        ctx.take_timer_ops();

        sender.receive_from_network(&mut ctx, Segment::ack_number(1));
        sender.receive_from_network(&mut ctx, Segment::ack_number(2));
        assert_eq!(
            ctx.take_timer_ops(),
            vec![TimerOp::Start(TIMEOUT), TimerOp::Cancel]
        );
        assert_eq!(sender.outstanding(), 0);

        // A new message into the now-empty window re-arms the timer.
        sender.receive_from_app(&mut ctx, b"m3");
        assert_eq!(ctx.take_timer_ops(), vec![TimerOp::Start(TIMEOUT)]);
    }

    #[test]
    fn out_of_order_and_corrupt_acks_are_ignored() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(3, TIMEOUT);
        for msg in ["m1", "m2", "m3"] {
            sender.receive_from_app(&mut ctx, msg.as_bytes());
        }
        ctx.take_sent();
        ctx.take_timer_ops();

        sender.receive_from_network(&mut ctx, Segment::ack_number(2));
        sender.receive_from_network(&mut ctx, Segment::ack_number(0));
        sender.receive_from_network(&mut ctx, corrupted(Segment::ack_number(1)));

        assert!(ctx.sent.is_empty());
        assert!(ctx.timer_ops.is_empty());
        assert_eq!(sender.base_number(), 1);
    }

    #[test]
    fn timeout_resends_whole_window_oldest_first() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(3, TIMEOUT);
        for msg in ["m1", "m2", "m3", "m4"] {
            sender.receive_from_app(&mut ctx, msg.as_bytes());
        }
        let first = ctx.take_sent();
        ctx.take_timer_ops();

        // ACK 1 lost; ACKs 2 and 3 arrive and are ignored.
        sender.receive_from_network(&mut ctx, Segment::ack_number(2));
        sender.receive_from_network(&mut ctx, Segment::ack_number(3));
        sender.on_interrupt(&mut ctx);

        assert_eq!(ctx.sent, first);
        assert_eq!(ctx.sent_numbers(), vec![1, 2, 3]);
        assert_eq!(ctx.take_timer_ops(), vec![TimerOp::Start(TIMEOUT)]);
    }

    #[test]
    fn timeout_with_empty_window_does_nothing() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(2, TIMEOUT);
        sender.on_interrupt(&mut ctx);
        assert!(ctx.sent.is_empty());
        assert!(ctx.timer_ops.is_empty());
    }

    #[test]
    fn outstanding_metric_tracks_window() {
        let mut ctx = RecordingContext::new();
        let mut sender = GbnSender::new(2, TIMEOUT);
        sender.receive_from_app(&mut ctx, b"m1");
        sender.receive_from_app(&mut ctx, b"m2");
        sender.receive_from_network(&mut ctx, Segment::ack_number(1));

        let values: Vec<f64> = ctx
            .metrics
            .iter()
            .filter(|(name, _)| name == OUTSTANDING_METRIC)
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn receiver_delivers_in_order_only() {
        let mut ctx = RecordingContext::new();
        let mut receiver = GbnReceiver::new();

        receiver.receive_from_client(&mut ctx, data(1, "a"));
        receiver.receive_from_client(&mut ctx, data(3, "c"));
        receiver.receive_from_client(&mut ctx, data(2, "b"));
        receiver.receive_from_client(&mut ctx, data(3, "c"));

        assert_eq!(
            ctx.delivered,
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
        assert_eq!(ctx.sent_numbers(), vec![1, 1, 2, 3]);
        assert_eq!(receiver.expected_sequence_number(), 4);
    }

    #[test]
    fn receiver_reacks_last_accepted_on_corruption() {
        let mut ctx = RecordingContext::new();
        let mut receiver = GbnReceiver::new();

        receiver.receive_from_client(&mut ctx, corrupted(data(1, "a")));
        receiver.receive_from_client(&mut ctx, data(1, "a"));
        receiver.receive_from_client(&mut ctx, corrupted(data(2, "b")));

        assert_eq!(ctx.delivered, vec![b"a".to_vec()]);
        assert_eq!(ctx.sent_numbers(), vec![0, 1, 1]);
    }

    #[test]
    fn duplicates_are_acked_with_their_own_number() {
        let mut ctx = RecordingContext::new();
        let mut receiver = GbnReceiver::new();
        for n in 1..=3 {
            receiver.receive_from_client(&mut ctx, data(n, "x"));
        }
        ctx.take_sent();

        for n in 1..=3 {
            receiver.receive_from_client(&mut ctx, data(n, "x"));
        }
        assert_eq!(ctx.delivered.len(), 3);
        assert_eq!(ctx.sent_numbers(), vec![1, 2, 3]);
    }

    #[test]
    fn lost_first_ack_recovers_after_full_window_resend() {
        let mut tx = RecordingContext::new();
        let mut rx = RecordingContext::new();
        let mut sender = GbnSender::new(3, TIMEOUT);
        let mut receiver = GbnReceiver::new();

        for msg in ["m1", "m2", "m3"] {
            sender.receive_from_app(&mut tx, msg.as_bytes());
        }
        for segment in tx.take_sent() {
            receiver.receive_from_client(&mut rx, segment);
        }
        // ACK 1 is lost in the network.
        let mut acks = rx.take_sent();
        acks.remove(0);
        for ack in acks {
            sender.receive_from_network(&mut tx, ack);
        }
        assert_eq!(sender.base_number(), 1);

        sender.on_interrupt(&mut tx);
        let resent = tx.take_sent();
        assert_eq!(resent.len(), 3);
        for segment in resent {
            receiver.receive_from_client(&mut rx, segment);
        }
        for ack in rx.take_sent() {
            sender.receive_from_network(&mut tx, ack);
        }

        assert_eq!(sender.outstanding(), 0);
        assert_eq!(sender.base_number(), 4);
        assert_eq!(rx.delivered.len(), 3);
        assert_eq!(tx.timer_ops.last(), Some(&TimerOp::Cancel));
    }
}
