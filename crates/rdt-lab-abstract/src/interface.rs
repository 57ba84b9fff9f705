use crate::segment::Segment;

/// The primitives the simulator offers to a protocol endpoint.
/// Protocols call these to reach the network, their timer, and the application layer.
pub trait SystemContext {
    /// Hand a segment to the unreliable channel. It may be lost, corrupted or reordered.
    fn send_to_network(&mut self, segment: Segment);

    /// Arm the endpoint's one-shot timer for `interval` simulated steps.
    /// Each endpoint owns a single timer: starting it again replaces the pending expiry.
    fn start_timer(&mut self, interval: u64);

    /// Disarm the endpoint's timer. No-op if none is armed.
    fn cancel_timer(&mut self);

    /// Deliver a message to the local application layer.
    fn send_to_app(&mut self, message: &[u8]);

    /// Log a message to the simulator's debug output.
    fn log(&mut self, message: &str);

    /// Current simulation time in steps.
    fn now(&self) -> u64;

    /// Record a numeric metric (e.g. outstanding segments) for the report.
    fn record_metric(&mut self, _name: &str, _value: f64) {
        // Default no-op so non-recording environments don't need to care.
    }
}

/// Sending half of a protocol pair.
pub trait Sender {
    /// Called once when the simulation starts.
    fn init(&mut self, _ctx: &mut dyn SystemContext) {}

    /// The application hands over a new outbound message.
    fn receive_from_app(&mut self, ctx: &mut dyn SystemContext, message: &[u8]);

    /// The network delivers a segment addressed to the sender (normally an ACK).
    fn receive_from_network(&mut self, ctx: &mut dyn SystemContext, segment: Segment);

    /// The retransmission timer fired.
    fn on_interrupt(&mut self, ctx: &mut dyn SystemContext);

    /// Number of transmitted segments still awaiting acknowledgment.
    fn outstanding(&self) -> usize {
        0
    }
}

/// Receiving half of a protocol pair.
pub trait Receiver {
    /// Called once when the simulation starts.
    fn init(&mut self, _ctx: &mut dyn SystemContext) {}

    /// The network delivers a data segment addressed to the receiver.
    fn receive_from_client(&mut self, ctx: &mut dyn SystemContext, segment: Segment);
}
