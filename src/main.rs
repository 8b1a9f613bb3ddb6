use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bpsim_core::config::AppConfig;
use bpsim_core::event::SimulationEvent;
use bpsim_core::types::NodeKind;
use bpsim_engine::{demo, Simulation, FAN_IN_MARK, FAN_OUT_MARK};

const DEFAULT_CONFIG: &str = "bpsim.toml";

#[derive(Parser)]
#[command(name = "bpsim", version, about = "Concurrent business-process simulator")]
struct Cli {
    /// Path to config file (defaults to ./bpsim.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the reference business process
    Run {
        /// Seed for the simulated work delays (overrides config)
        #[arg(long)]
        seed: Option<u64>,
        /// Skip all simulated delays
        #[arg(long)]
        fast: bool,
        /// Value produced by the active activity feeding the gateway
        #[arg(long, default_value_t = demo::DEFAULT_ACTIVE_VALUE, allow_hyphen_values = true)]
        value: i64,
        /// Print every simulation event as a JSON line instead of the trace
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "bpsim", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            seed,
            fast,
            value,
            json,
        } => run(config, seed, fast, value, json).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load_or_default(Path::new(DEFAULT_CONFIG))?,
    };
    Ok(config)
}

async fn run(
    mut config: AppConfig,
    seed: Option<u64>,
    fast: bool,
    value: i64,
    json: bool,
) -> anyhow::Result<()> {
    if fast {
        let seed = config.simulation.seed;
        config.simulation = bpsim_core::config::SimulationConfig::instant();
        config.simulation.seed = seed;
    }
    if seed.is_some() {
        config.simulation.seed = seed;
    }
    config.simulation.validate()?;

    let sim = Simulation::from_config(&config.simulation);
    let rx = sim.events().subscribe();
    let printer = tokio::spawn(print_events(rx, json));

    let root = demo::business_process(value);
    info!(value, seed = ?config.simulation.seed, "Running reference process");
    let report = sim.run(&root).await;

    // Closing the bus lets the printer drain and exit.
    drop(sim);
    printer.await.context("event printer task failed")??;

    if !json {
        println!();
        println!(
            "Finished in {} ms (run {})",
            report.elapsed.as_millis(),
            report.run_id
        );
    }
    Ok(())
}

/// Stream the simulation to stdout as it happens.
async fn print_events(mut rx: Receiver<SimulationEvent>, json: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    let mut live = LiveTrace::default();
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Trace printer fell behind, events dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if json {
            let line = serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "event": event,
            });
            writeln!(stdout, "{line}")?;
            continue;
        }

        if let Some(text) = live.render(&event) {
            write!(stdout, "{text}")?;
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Renders the event stream as the plain-text trace.
///
/// A gateway opens its section on the first routing decision and closes it
/// on join. A gateway that never evaluated its branches prints nothing.
#[derive(Default)]
struct LiveTrace {
    open: HashSet<String>,
}

impl LiveTrace {
    fn render(&mut self, event: &SimulationEvent) -> Option<String> {
        match event {
            SimulationEvent::NodeCompleted { kind, trace, .. }
                if !matches!(kind, NodeKind::Process) && !kind.is_gateway() =>
            {
                Some(trace.clone())
            }
            SimulationEvent::BranchLaunched { gateway, .. }
            | SimulationEvent::BranchSkipped { gateway, .. } => self
                .open
                .insert(gateway.clone())
                .then(|| FAN_OUT_MARK.to_string()),
            SimulationEvent::GatewayJoined { gateway, .. } => self
                .open
                .remove(gateway)
                .then(|| FAN_IN_MARK.to_string()),
            _ => None,
        }
    }
}
