//! Headless front end for an M/M/c simulation.
//!
//! Starts a session with the parameters given on the command line, prints the latest snapshot every 100 ms of wall
//! clock time, and prints the final snapshot once the run converges. Runs that have not converged after
//! `--max-wall-secs` are cancelled.
//!
//! ```bash
//! cargo run --example mmc_console -- --arrival-mean 100 --service-mean 50 --servers 1 --decimals 3
//!
//! # show every processed timestamp
//! RUST_LOG=mmc_sim=trace cargo run --example mmc_console -- --arrival-mean 100 --service-mean 50
//! ```

use clap::Parser;
use mmc_sim::{precision_from_exponent, Metric, SimulationConfig, SimulationSession, Snapshot};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mmc-console")]
#[command(version, about, long_about = None)]
struct Args {
    /// Mean time between arrivals
    #[arg(short = 'a', long)]
    arrival_mean: u64,

    /// Mean service duration
    #[arg(short = 's', long)]
    service_mean: u64,

    /// Number of servers, 0 for unbounded
    #[arg(short = 'c', long, default_value = "1")]
    servers: u32,

    /// Convergence precision as a number of decimal places
    #[arg(short = 'd', long, default_value = "3")]
    decimals: u32,

    /// Interval between measurement events; measurements are disabled when omitted
    #[arg(short = 'm', long)]
    measurement_interval: Option<u64>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Samples every metric must collect before the run may stop
    #[arg(long, default_value = "0")]
    min_samples: u64,

    /// Wall clock budget before the run is cancelled
    #[arg(long, default_value = "60")]
    max_wall_secs: u64,
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("{snapshot}");
    for metric in Metric::ALL {
        let value = snapshot.metric(metric);
        println!(
            "  {:<3} mean {:>12.4}  current {:>8}  samples {:>10}  progress {:>5.1}%",
            metric,
            value.mean,
            value.current,
            value.samples,
            value.progress(snapshot.precision)
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,mmc_sim=info")))
        .init();

    let args = Args::parse();

    let mut builder = SimulationConfig::builder(args.arrival_mean, args.service_mean)
        .servers(args.servers)
        .precision(precision_from_exponent(args.decimals))
        .min_samples(args.min_samples);
    if let Some(interval) = args.measurement_interval {
        builder = builder.measurement_interval(interval);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let config = builder.build()?;

    let mut session = SimulationSession::new(config)?;
    let finished = session.subscribe();
    session.start()?;

    let deadline = Instant::now() + Duration::from_secs(args.max_wall_secs);
    let snapshot = loop {
        match finished.recv_timeout(Duration::from_millis(100)) {
            Ok(snapshot) => break snapshot,
            Err(RecvTimeoutError::Timeout) if Instant::now() < deadline => print_snapshot(&session.snapshot()),
            Err(_) => {
                info!(budget_secs = args.max_wall_secs, "wall clock budget exhausted, cancelling");
                break session.cancel()?;
            },
        }
    };

    println!();
    print_snapshot(&snapshot);
    session.wait()?;
    Ok(())
}
