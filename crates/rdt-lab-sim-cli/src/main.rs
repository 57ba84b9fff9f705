use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rdt_lab_abstract::{ProtocolConfig, ProtocolKind, SimConfig};
use rdt_lab_protocols::build_pair;
use rdt_lab_simulator::{SimulationReport, Simulator, scenario_runner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reliable data transfer protocol simulator")]
struct Args {
    /// Run a scenario file; the ad-hoc options below are ignored.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Protocol variant: naive, alt or gbn.
    #[arg(long, default_value = "gbn")]
    protocol: ProtocolKind,

    /// Go-Back-N window size.
    #[arg(long, default_value_t = 4)]
    window_size: usize,

    /// Retransmission timeout in simulated steps.
    #[arg(long, default_value_t = 200)]
    timeout: u64,

    #[arg(long, default_value_t = 0.1)]
    loss_rate: f64,
    #[arg(long, default_value_t = 0.1)]
    corrupt_rate: f64,
    #[arg(long, default_value_t = 10)]
    min_latency: u64,
    #[arg(long, default_value_t = 100)]
    max_latency: u64,
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of application messages to send.
    #[arg(long, default_value_t = 10)]
    messages: usize,

    /// Steps between consecutive application messages.
    #[arg(long, default_value_t = 50)]
    interval: u64,

    /// Stop the run if events remain past this simulated time.
    #[arg(long, default_value_t = 1_000_000)]
    max_time: u64,

    /// Write a JSON trace of the finished simulation.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    info!("rdt-lab-sim-cli starting…");

    let report = match &args.scenario {
        Some(path) => scenario_runner::run_scenario(path)?,
        None => run_adhoc(&args)?,
    };
    log_summary(&report);

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    Ok(())
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            loss_rate: self.loss_rate,
            corrupt_rate: self.corrupt_rate,
            min_latency: self.min_latency,
            max_latency: self.max_latency,
            seed: self.seed,
        }
    }

    fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            kind: self.protocol,
            timeout: self.timeout,
            window_size: self.window_size,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_adhoc(args: &Args) -> Result<SimulationReport> {
    let config = args.sim_config();
    config.validate().context("Invalid simulation options")?;
    let (sender, receiver) =
        build_pair(&args.protocol_config()).context("Invalid protocol options")?;

    let mut sim = Simulator::new(config, sender, receiver);
    for i in 0..args.messages {
        let time = i as u64 * args.interval;
        sim.schedule_app_send(time, format!("Message {}", i + 1).into_bytes());
    }

    info!("Starting {} simulation…", args.protocol);
    if !sim.run_until(args.max_time) {
        warn!(
            "Stopped at step {} with {} events pending",
            sim.current_time(),
            sim.remaining_events()
        );
    }
    info!("Simulation complete.");
    Ok(sim.export_report())
}

fn log_summary(report: &SimulationReport) {
    info!(
        "Simulation duration: {} steps | segments sent: {} | deliveries: {} | max outstanding: {}",
        report.duration,
        report.sender_packet_count,
        report.delivered_data.len(),
        report.max_outstanding
    );
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}
