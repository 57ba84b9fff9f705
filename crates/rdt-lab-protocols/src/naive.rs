use rdt_lab_abstract::{Endpoint, Receiver, Segment, Sender, SystemContext};

/// Pass-through sender: frames and transmits, never retransmits.
#[derive(Default)]
pub struct NaiveSender;

impl Sender for NaiveSender {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("naive sender ready (no reliability)");
    }

    fn receive_from_app(&mut self, ctx: &mut dyn SystemContext, message: &[u8]) {
        let segment = Segment::data(message, Endpoint::Receiver);
        ctx.log(&format!(
            "naive sender pushing {} bytes to channel",
            segment.len()
        ));
        ctx.send_to_network(segment);
    }

    fn receive_from_network(&mut self, _ctx: &mut dyn SystemContext, _segment: Segment) {
        // Nothing to do; no ACKs are expected.
    }

    fn on_interrupt(&mut self, _ctx: &mut dyn SystemContext) {}
}

/// Pass-through receiver: hands whatever arrives to the application, no ACK.
#[derive(Default)]
pub struct NaiveReceiver;

impl Receiver for NaiveReceiver {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("naive receiver ready (no reliability)");
    }

    fn receive_from_client(&mut self, ctx: &mut dyn SystemContext, segment: Segment) {
        let bytes = segment.payload.as_bytes();
        ctx.log(&format!("naive receiver delivering {} bytes", bytes.len()));
        ctx.send_to_app(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingContext;
    use rdt_lab_abstract::{CORRUPTION_MARKER, Payload};

    #[test]
    fn sender_transmits_immediately_without_timer() {
        let mut ctx = RecordingContext::new();
        let mut sender = NaiveSender;
        sender.receive_from_app(&mut ctx, b"one");
        sender.receive_from_app(&mut ctx, b"two");

        assert_eq!(ctx.sent.len(), 2);
        assert_eq!(ctx.sent[0].destination, Endpoint::Receiver);
        assert_eq!(ctx.sent[1].message(), Some(&b"two"[..]));
        assert!(ctx.timer_ops.is_empty());

        sender.receive_from_network(&mut ctx, Segment::ack_bit(0));
        sender.on_interrupt(&mut ctx);
        assert_eq!(ctx.sent.len(), 2);
    }

    #[test]
    fn receiver_delivers_unconditionally_and_never_acks() {
        let mut ctx = RecordingContext::new();
        let mut receiver = NaiveReceiver;
        receiver.receive_from_client(&mut ctx, Segment::data(b"hi", Endpoint::Receiver));
        receiver.receive_from_client(&mut ctx, Segment::data(b"hi", Endpoint::Receiver));

        let mut damaged = Segment::data(b"lost", Endpoint::Receiver);
        damaged.payload = Payload::Corrupted;
        receiver.receive_from_client(&mut ctx, damaged);

        assert_eq!(
            ctx.delivered,
            vec![b"hi".to_vec(), b"hi".to_vec(), CORRUPTION_MARKER.to_vec()]
        );
        assert!(ctx.sent.is_empty());
    }
}
