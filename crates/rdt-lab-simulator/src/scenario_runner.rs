use anyhow::{Context, anyhow};
use std::fs;
use std::path::Path;
use rdt_lab_abstract::{Endpoint, SimConfig, TestAction, TestAssertion, TestScenario};
use rdt_lab_protocols::build_pair;
use tracing::info;

use crate::engine::Simulator;
use crate::trace::SimulationReport;

/// Simulated-time budget when a scenario does not assert `max_duration`.
pub const DEFAULT_MAX_DURATION: u64 = 100_000;

pub fn load_scenario(path: impl AsRef<Path>) -> anyhow::Result<TestScenario> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    parse_scenario(&content)
}

pub fn parse_scenario(content: &str) -> anyhow::Result<TestScenario> {
    toml::from_str(content).context("Failed to parse scenario")
}

pub fn run_scenario(scenario_path: impl AsRef<Path>) -> anyhow::Result<SimulationReport> {
    let scenario = load_scenario(scenario_path)?;
    run(&scenario)
}

/// Build the simulator a scenario describes, with its actions scheduled but not yet run.
pub fn build_simulator(scenario: &TestScenario) -> anyhow::Result<Simulator> {
    let mut config = SimConfig::default();
    scenario.config.apply_to(&mut config);
    config.validate().context("Invalid simulation config")?;

    let (sender, receiver) = build_pair(&scenario.protocol).context("Invalid protocol config")?;
    let mut sim = Simulator::new(config, sender, receiver);
    configure_actions(&mut sim, &scenario.actions);
    Ok(sim)
}

pub fn configure_actions(sim: &mut Simulator, actions: &[TestAction]) {
    for action in actions {
        match action {
            TestAction::AppSend { time, data } => {
                sim.schedule_app_send(*time, data.as_bytes().to_vec());
            }
            TestAction::DropNextFromSender { seq } => {
                sim.add_drop_once(Endpoint::Sender, *seq);
            }
            TestAction::DropNextFromReceiver { ack } => {
                sim.add_drop_once(Endpoint::Receiver, *ack);
            }
            TestAction::CorruptNextFromSender { seq } => {
                sim.add_corrupt_once(Endpoint::Sender, *seq);
            }
            TestAction::CorruptNextFromReceiver { ack } => {
                sim.add_corrupt_once(Endpoint::Receiver, *ack);
            }
        }
    }
}

/// Run a scenario to completion and check its assertions.
pub fn run(scenario: &TestScenario) -> anyhow::Result<SimulationReport> {
    info!("Running Scenario: {}", scenario.name);
    info!("Description: {}", scenario.description);

    let mut sim = build_simulator(scenario)?;

    let max_duration = scenario
        .assertions
        .iter()
        .find_map(|a| {
            if let TestAssertion::MaxDuration { ms } = a {
                Some(*ms)
            } else {
                None
            }
        })
        .unwrap_or(DEFAULT_MAX_DURATION);

    if !sim.run_until(max_duration) {
        return Err(anyhow!("Test timed out after {} steps", max_duration));
    }

    let report = sim.export_report();
    check_assertions(&report, &scenario.assertions)?;
    info!("Test Scenario Passed!");
    Ok(report)
}

pub fn check_assertions(
    report: &SimulationReport,
    assertions: &[TestAssertion],
) -> anyhow::Result<()> {
    for assertion in assertions {
        match assertion {
            TestAssertion::DataDelivered { data } => {
                let found = report.delivered_data.iter().any(|d| d == data.as_bytes());
                if !found {
                    return Err(anyhow!(
                        "Assertion Failed: Data {:?} was not delivered",
                        data
                    ));
                }
            }
            TestAssertion::DeliveredExactly { data } => {
                let delivered = report.delivered_strings();
                if &delivered != data {
                    return Err(anyhow!(
                        "Assertion Failed: delivered {:?}, expected exactly {:?}",
                        delivered,
                        data
                    ));
                }
            }
            TestAssertion::SenderPacketCount { min, max } => {
                let count = report.sender_packet_count;
                if count < *min {
                    return Err(anyhow!(
                        "Assertion Failed: Sender sent {} segments, expected min {}",
                        count,
                        min
                    ));
                }
                if let Some(max) = max
                    && count > *max
                {
                    return Err(anyhow!(
                        "Assertion Failed: Sender sent {} segments, expected max {}",
                        count,
                        max
                    ));
                }
            }
            TestAssertion::MaxOutstanding { max } => {
                if report.max_outstanding > *max {
                    return Err(anyhow!(
                        "Assertion Failed: {} segments outstanding, expected at most {}",
                        report.max_outstanding,
                        max
                    ));
                }
            }
            TestAssertion::MaxDuration { .. } => {} // Already checked
        }
    }
    Ok(())
}
