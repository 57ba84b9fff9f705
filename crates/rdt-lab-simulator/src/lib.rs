pub mod engine;
pub mod scenario_runner;
pub mod trace;

pub use engine::{FaultKind, LinkEventSummary, Simulator, Transmission};
pub use trace::SimulationReport;
