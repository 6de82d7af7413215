//! Scacco UCI chess engine main entry point.

use clap::Parser;
use scacco::search::Difficulty;
use scacco::uci::{run_uci_loop, UciEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Strength preset used until a GUI sets the Difficulty option
    #[arg(short, long, default_value_t = Difficulty::Intermediate)]
    difficulty: Difficulty,

    /// Log filter directive, e.g. `scacco=debug`. Falls back to RUST_LOG.
    #[arg(long)]
    log: Option<String>,

    /// Seed for move perturbation
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // stdout belongs to the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    scacco::init();

    let mut engine = UciEngine::new().with_difficulty(args.difficulty);
    if let Some(seed) = args.seed {
        engine = engine.with_seed(seed);
    }

    // Run UCI main loop
    if let Err(e) = run_uci_loop(engine) {
        eprintln!("UCI loop failed: {:?}", e);
    }
}
