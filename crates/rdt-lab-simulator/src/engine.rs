use crate::trace::SimulationReport;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use rdt_lab_abstract::{Endpoint, Payload, Receiver, Segment, Sender, SimConfig, SystemContext};
use tracing::{debug, info};

#[derive(Debug)]
pub enum EventType {
    SegmentArrival {
        to: Endpoint,
        segment: Segment,
    },
    TimerExpiry {
        node: Endpoint,
        generation: u64,
    },
    AppSend {
        data: Vec<u8>,
    },
}

#[derive(Debug)]
struct Event {
    time: u64,
    event_type: EventType,
    id: u64, // Unique ID to differentiate events at same time
}

// Custom Ord for Min-Heap (smallest time pops first)
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison for time: smallest time is Greater in BinaryHeap
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// A compact textual summary of important link-layer events.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEventSummary {
    pub time: u64,
    pub description: String,
}

/// One segment handed to the network by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transmission {
    pub time: u64,
    pub seq: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Drop,
    Corrupt,
}

/// One-shot deterministic fault: applies to the next segment from `from` carrying `seq`.
#[derive(Debug, Clone, Copy)]
struct FaultRule {
    from: Endpoint,
    seq: u64,
    kind: FaultKind,
}

#[derive(Debug, Clone, Copy)]
enum TimerCommand {
    Start(u64),
    Cancel,
}

/// Actions buffered during a protocol handler call
#[derive(Default)]
struct ActionBuffer {
    outgoing_segments: Vec<Segment>,
    timer_commands: Vec<TimerCommand>,
    logs: Vec<String>,
    delivered_data: Vec<Vec<u8>>,
    metrics: Vec<(String, f64)>,
}

/// Context implementation passed to the protocol
struct ScopedContext<'a> {
    buffer: &'a mut ActionBuffer,
    now: u64,
}

impl SystemContext for ScopedContext<'_> {
    fn send_to_network(&mut self, segment: Segment) {
        self.buffer.outgoing_segments.push(segment);
    }

    fn start_timer(&mut self, interval: u64) {
        self.buffer.timer_commands.push(TimerCommand::Start(interval));
    }

    fn cancel_timer(&mut self) {
        self.buffer.timer_commands.push(TimerCommand::Cancel);
    }

    fn send_to_app(&mut self, message: &[u8]) {
        self.buffer.delivered_data.push(message.to_vec());
    }

    fn log(&mut self, message: &str) {
        self.buffer.logs.push(message.to_string());
    }

    fn now(&self) -> u64 {
        self.now
    }

    fn record_metric(&mut self, name: &str, value: f64) {
        self.buffer.metrics.push((name.to_string(), value));
    }
}

/// Discrete-event simulation of one sender/receiver pair over a lossy,
/// corrupting, reordering channel.
pub struct Simulator {
    time: u64,
    event_queue: BinaryHeap<Event>,
    event_id_counter: u64,

    config: SimConfig,
    rng: rand::rngs::StdRng,

    pub sender: Box<dyn Sender>,
    pub receiver: Box<dyn Receiver>,

    pub delivered_data: Vec<Vec<u8>>,
    pub transmissions: Vec<Transmission>,
    pub max_outstanding: usize,

    /// Arbitrary time-series metrics recorded via `SystemContext::record_metric`
    /// Key: metric name (e.g., "outstanding"), Value: Vec<(time, value)>
    pub metrics: HashMap<String, Vec<(u64, f64)>>,

    faults: Vec<FaultRule>,

    /// Timeline of link events (drops, corruptions, sends, deliveries).
    pub link_events: Vec<LinkEventSummary>,

    /// Each endpoint owns one timer. Starting or cancelling bumps the
    /// generation, which invalidates any expiry already in the queue.
    timer_generations: HashMap<Endpoint, u64>,
}

impl Simulator {
    pub fn new(config: SimConfig, sender: Box<dyn Sender>, receiver: Box<dyn Receiver>) -> Self {
        use rand::SeedableRng;
        let rng = rand::rngs::StdRng::seed_from_u64(config.seed);

        Self {
            time: 0,
            event_queue: BinaryHeap::new(),
            event_id_counter: 0,
            config,
            rng,
            sender,
            receiver,
            delivered_data: Vec::new(),
            transmissions: Vec::new(),
            max_outstanding: 0,
            metrics: HashMap::new(),
            faults: Vec::new(),
            link_events: Vec::new(),
            timer_generations: HashMap::new(),
        }
    }

    /// Register a deterministic fault: drop the next segment from `from` whose sequence id equals `seq`.
    pub fn add_drop_once(&mut self, from: Endpoint, seq: u64) {
        self.add_fault(from, seq, FaultKind::Drop);
    }

    /// Register a deterministic fault: corrupt the next segment from `from` whose sequence id equals `seq`.
    pub fn add_corrupt_once(&mut self, from: Endpoint, seq: u64) {
        self.add_fault(from, seq, FaultKind::Corrupt);
    }

    fn add_fault(&mut self, from: Endpoint, seq: u64, kind: FaultKind) {
        self.faults.push(FaultRule { from, seq, kind });
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Return a slice of (time, value) samples for a named metric, if present.
    pub fn metric_series(&self, name: &str) -> Option<&[(u64, f64)]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn sender_packet_count(&self) -> u32 {
        self.transmissions.len() as u32
    }

    fn push_event(&mut self, time: u64, event_type: EventType) {
        self.event_queue.push(Event {
            time,
            event_type,
            id: self.event_id_counter,
        });
        self.event_id_counter += 1;
    }

    pub fn schedule_app_send(&mut self, time: u64, data: Vec<u8>) {
        self.push_event(time, EventType::AppSend { data });
    }

    pub fn init(&mut self) {
        let mut buffer = ActionBuffer::default();
        self.sender.init(&mut ScopedContext {
            buffer: &mut buffer,
            now: self.time,
        });
        self.process_actions(Endpoint::Sender, buffer);

        let mut buffer = ActionBuffer::default();
        self.receiver.init(&mut ScopedContext {
            buffer: &mut buffer,
            now: self.time,
        });
        self.process_actions(Endpoint::Receiver, buffer);
    }

    pub fn peek_next_event_time(&self) -> Option<u64> {
        self.event_queue.peek().map(|e| e.time)
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    pub fn remaining_events(&self) -> usize {
        self.event_queue.len()
    }

    /// Process the next event. Returns true if an event was processed, false if queue is empty.
    pub fn step(&mut self) -> bool {
        let event = match self.event_queue.pop() {
            Some(e) => e,
            None => return false,
        };

        self.time = event.time;
        debug!("Processing event at {}: {:?}", self.time, event.event_type);

        let mut buffer = ActionBuffer::default();
        let mut ctx = ScopedContext {
            buffer: &mut buffer,
            now: self.time,
        };
        let node = match event.event_type {
            EventType::SegmentArrival { to, segment } => {
                match to {
                    Endpoint::Sender => self.sender.receive_from_network(&mut ctx, segment),
                    Endpoint::Receiver => self.receiver.receive_from_client(&mut ctx, segment),
                }
                to
            }
            EventType::TimerExpiry { node, generation } => {
                if self.timer_generations.get(&node) != Some(&generation) {
                    debug!("Skipping stale timer event for {}", node);
                    return true; // Event processed (by being ignored)
                }
                match node {
                    Endpoint::Sender => self.sender.on_interrupt(&mut ctx),
                    Endpoint::Receiver => debug!("Receiver timer fired with no handler"),
                }
                node
            }
            EventType::AppSend { data } => {
                self.sender.receive_from_app(&mut ctx, &data);
                Endpoint::Sender
            }
        };
        self.process_actions(node, buffer);

        if node == Endpoint::Sender {
            self.max_outstanding = self.max_outstanding.max(self.sender.outstanding());
        }
        true
    }

    /// Produce a serializable snapshot of the current simulation state.
    pub fn export_report(&self) -> SimulationReport {
        SimulationReport {
            config: self.config.clone(),
            duration: self.time,
            delivered_data: self.delivered_data.clone(),
            sender_packet_count: self.sender_packet_count(),
            transmissions: self.transmissions.clone(),
            max_outstanding: self.max_outstanding,
            metrics: self.metrics.clone(),
            link_events: self.link_events.clone(),
        }
    }

    pub fn run_until_complete(&mut self) {
        self.init();
        while self.step() {}
    }

    /// Run until the queue drains or the next event lies beyond `max_time`.
    /// Returns true if the queue drained.
    pub fn run_until(&mut self, max_time: u64) -> bool {
        self.init();
        while let Some(next) = self.peek_next_event_time() {
            if next > max_time {
                return false;
            }
            self.step();
        }
        true
    }

    fn take_fault(&mut self, from: Endpoint, segment: &Segment) -> Option<FaultKind> {
        let seq = segment.sequence_id()?;
        let pos = self
            .faults
            .iter()
            .position(|f| f.from == from && f.seq == seq)?;
        Some(self.faults.remove(pos).kind)
    }

    fn process_actions(&mut self, source_node: Endpoint, buffer: ActionBuffer) {
        // First, fold metrics into simulator-wide store
        for (name, value) in buffer.metrics {
            self.metrics
                .entry(name)
                .or_default()
                .push((self.time, value));
        }

        for log in buffer.logs {
            info!("[{}] {}", source_node, log);
        }

        for data in buffer.delivered_data {
            info!("[{}] DELIVERED DATA: {} bytes", source_node, data.len());
            self.link_events.push(LinkEventSummary {
                time: self.time,
                description: format!(
                    "[{}] DELIVERED {} bytes to application",
                    source_node,
                    data.len()
                ),
            });
            self.delivered_data.push(data);
        }

        for command in buffer.timer_commands {
            let generation = self.timer_generations.entry(source_node).or_insert(0);
            *generation += 1;
            let generation = *generation;
            if let TimerCommand::Start(interval) = command {
                self.push_event(
                    self.time + interval,
                    EventType::TimerExpiry {
                        node: source_node,
                        generation,
                    },
                );
            }
        }

        // Channel
        for mut segment in buffer.outgoing_segments {
            let target_node = source_node.peer();
            let seq = segment.sequence_id();

            if source_node == Endpoint::Sender {
                self.transmissions.push(Transmission {
                    time: self.time,
                    seq,
                });
            }

            // 1. Deterministic faults registered by scenario
            let mut forced_corrupt = false;
            match self.take_fault(source_node, &segment) {
                Some(FaultKind::Drop) => {
                    self.link_events.push(LinkEventSummary {
                        time: self.time,
                        description: format!(
                            "[{}->{}] DROP (deterministic) seq={:?}",
                            source_node, target_node, seq
                        ),
                    });
                    debug!("Deterministically dropping segment seq={:?}", seq);
                    continue;
                }
                Some(FaultKind::Corrupt) => forced_corrupt = true,
                None => {}
            }

            // 2. Check Loss
            if !forced_corrupt && self.rng.random::<f64>() < self.config.loss_rate {
                self.link_events.push(LinkEventSummary {
                    time: self.time,
                    description: format!(
                        "[{}->{}] DROP (random loss) seq={:?}",
                        source_node, target_node, seq
                    ),
                });
                debug!("Segment lost in channel");
                continue;
            }

            // 3. Check Corruption
            if forced_corrupt || self.rng.random::<f64>() < self.config.corrupt_rate {
                self.link_events.push(LinkEventSummary {
                    time: self.time,
                    description: format!(
                        "[{}->{}] CORRUPT seq={:?}",
                        source_node, target_node, seq
                    ),
                });
                debug!("Segment corrupted in channel");
                segment.payload = Payload::Corrupted;
            }

            // 4. Calculate Latency
            let latency = self
                .rng
                .random_range(self.config.min_latency..=self.config.max_latency);
            let arrival_time = self.time + latency;

            self.link_events.push(LinkEventSummary {
                time: self.time,
                description: format!(
                    "[{}->{}] SEND seq={:?} (latency={})",
                    source_node, target_node, seq, latency
                ),
            });

            self.push_event(
                arrival_time,
                EventType::SegmentArrival {
                    to: target_node,
                    segment,
                },
            );
        }
    }
}
