//! Command-line campaign runner.
//!
//! ```text
//! sett-campaign [CONFIG] [--seed N] [--iterations N] [--ticks N] [--users N]
//! ```
//!
//! Runs with default settings when no config is given; flags override the
//! config file. Logging is controlled with `RUST_LOG` (default `warn`).
//! Exits with status 1 if any iteration failed.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use sett_sim::{CampaignConfig, SimulationBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "sett-campaign")]
#[command(about = "Randomized deposit/withdraw campaign against the in-memory vault", long_about = None)]
struct Args {
    /// JSON campaign config (defaults apply to missing fields)
    config: Option<PathBuf>,

    /// Replay a single seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Ticks per iteration
    #[arg(long)]
    ticks: Option<u64>,

    /// Actors per iteration
    #[arg(long)]
    users: Option<usize>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match args.config {
        Some(ref path) => match CampaignConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: cannot load {}: {}", path.display(), e);
                process::exit(2);
            }
        },
        None => CampaignConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seeds = vec![seed];
        config.iterations = 1;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }
    if let Some(users) = args.users {
        config.users = users;
    }
    if let Err(e) = config.validate() {
        eprintln!("ERROR: {}", e);
        process::exit(2);
    }

    let report = SimulationBuilder::from_config(&config).run();

    eprintln!("{report}");

    if !report.is_success() {
        process::exit(1);
    }
}
