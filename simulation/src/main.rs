//! NetSim - Network Topology Simulator
//!
//! Generate bus, ring, star and mesh networks, break nodes or cables, and
//! watch whether a transmission still gets through.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use netsim_logging::{LogConfig, SubscriberBuilder};
use netsim_simulation::explain::{UnavailableExplainer, explain_with_fallback};
use netsim_simulation::pacing::{Playback, play};
use netsim_simulation::{
    DeliveryStatus, LinkId, NodeId, SimConfig, SimulationResult, Session, TopologyKind, generate, scenarios,
};

#[derive(Parser)]
#[command(
    name = "netsim",
    about = "Network topology simulator with failure-aware packet delivery",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSONL run logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and print a topology
    Topology {
        /// Type of topology: bus, ring, star, mesh
        #[arg(short, long, default_value = "bus")]
        kind: TopologyKind,
    },

    /// Send one transmission between two devices
    Send {
        /// Type of topology: bus, ring, star, mesh
        #[arg(short, long, default_value = "bus")]
        kind: TopologyKind,

        /// Sending device id
        #[arg(long, default_value = "n0")]
        from: String,

        /// Receiving device id
        #[arg(long, default_value = "n1")]
        to: String,

        /// Node to break before sending (repeatable)
        #[arg(long = "break-node")]
        break_nodes: Vec<String>,

        /// Cable to cut before sending (repeatable)
        #[arg(long = "break-link")]
        break_links: Vec<String>,

        /// Play ticks on a timer instead of all at once
        #[arg(long)]
        animate: bool,

        /// Milliseconds between animation ticks (defaults to the config value)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Ask for a plain-language explanation of the outcome
        #[arg(long)]
        explain: bool,
    },

    /// Run a pre-built failure scenario
    Scenario {
        #[arg(value_enum)]
        name: ScenarioName,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioName {
    BusBroadcast,
    StarSwitchDown,
    RingSingleCut,
    RingDoubleCut,
    MeshRedundancy,
}

/// What `send --json` prints
#[derive(Serialize)]
struct SendReport<'a> {
    kind: TopologyKind,
    sender: &'a str,
    receiver: &'a str,
    ticks: usize,
    result: &'a SimulationResult,
    statuses: &'a BTreeMap<NodeId, DeliveryStatus>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };

    // Command-line flags take precedence over the config file's [log] table
    let log_config = match (&cli.log_dir, cli.verbose) {
        (Some(dir), verbose) => {
            let mut log = LogConfig::run_log(dir.clone());
            if verbose {
                log.default_level = LogConfig::verbose().default_level;
            }
            log
        }
        (None, true) => LogConfig::verbose(),
        (None, false) => config.log.clone(),
    };
    let _guard = SubscriberBuilder::new().with_config(log_config).init();

    match cli.command {
        Commands::Topology { kind } => {
            let topology = generate(kind, config.layout);
            println!("{}", topology.visualize());
        }
        Commands::Send {
            kind,
            from,
            to,
            break_nodes,
            break_links,
            animate,
            interval_ms,
            json,
            explain,
        } => {
            let broken: Vec<NodeId> = break_nodes.iter().map(|id| NodeId::from(id.as_str())).collect();
            let cut: Vec<LinkId> = break_links.iter().map(|id| LinkId::from(id.as_str())).collect();
            let mut session = Session::prepare(kind, &config, &NodeId::from(from.as_str()), &NodeId::from(to.as_str()), &broken, &cut)?;

            let ticks = if animate {
                let period = interval_ms.map(Duration::from_millis).unwrap_or_else(|| config.tick_interval());
                animate_send(&mut session, period).await?
            } else {
                let (frames, _) = session.run_to_completion()?;
                frames.len()
            };

            let Some(result) = session.last_result() else {
                println!("Transmission cancelled");
                return Ok(());
            };

            if json {
                let report = SendReport {
                    kind,
                    sender: &from,
                    receiver: &to,
                    ticks,
                    result,
                    statuses: session.statuses(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_outcome(&session, result, ticks);
            }

            if explain {
                if let Some(request) = session.explanation_request() {
                    let text = explain_with_fallback(&UnavailableExplainer, &request, config.explain_timeout()).await;
                    println!("\n{}", text);
                }
            }
        }
        Commands::Scenario { name } => {
            match name {
                ScenarioName::BusBroadcast => scenarios::run_bus_broadcast_scenario(),
                ScenarioName::StarSwitchDown => scenarios::run_star_switch_down_scenario(),
                ScenarioName::RingSingleCut => scenarios::run_ring_single_cut_scenario(),
                ScenarioName::RingDoubleCut => scenarios::run_ring_double_cut_scenario(),
                ScenarioName::MeshRedundancy => scenarios::run_mesh_redundancy_scenario(),
            };
        }
    }

    Ok(())
}

/// Play the run on a timer, printing packet positions; Ctrl-C cancels
async fn animate_send(session: &mut Session, period: Duration) -> anyhow::Result<usize> {
    session.start_run()?;

    let token = CancellationToken::new();
    let canceller = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let mut ticks = 0;
    let playback = play(session, period, &token, |frame| {
        ticks += 1;
        let packets: Vec<String> = frame
            .packets
            .iter()
            .map(|p| format!("{}@({:.0},{:.0})", p.id, p.position.x, p.position.y))
            .collect();
        println!("  tick {:>2}: {}", frame.tick, packets.join(" "));
    })
    .await;
    watcher.abort();

    if let Playback::Cancelled { at_tick } = playback {
        info!(at_tick, "Animation interrupted");
    }
    Ok(ticks)
}

fn print_outcome(session: &Session, result: &SimulationResult, ticks: usize) {
    println!("{}", session.topology().visualize());
    println!("=== Outcome ===");
    println!("  {}", result.log);
    println!("  Ticks: {}", ticks);
    if !result.path.is_empty() {
        let hops: Vec<String> = result.path.iter().map(|n| n.to_string()).collect();
        println!("  Path: {}", hops.join(" -> "));
    }
    for (node, status) in session.statuses() {
        println!("  {} {}", node, status);
    }
}
