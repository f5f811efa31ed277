use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};

mod encode;
mod kind;
mod loader;
mod maps;
mod populate;
mod report;
mod rng;

use encode::Encoder;
use maps::LoadedMaps;
use populate::{DEFAULT_ENTRIES, PopulationPlan, Populator};
use rng::ValueSource;

#[derive(Parser)]
#[command(name = "map-populator")]
#[command(about = "Fill eBPF maps with random values at startup", long_about = None)]
struct Cli {
    /// Entries written into each map; must stay below the map's capacity
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_ENTRIES)]
    entries: u32,
    /// Seed for the value generator; defaults to the wall clock
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Load this eBPF object instead of the embedded one
    #[arg(long, value_name = "PATH")]
    object: Option<PathBuf>,
    /// Print a JSON summary of what was written to stdout
    #[arg(long)]
    report_json: bool,
    /// Log verbosity; RUST_LOG takes precedence
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(cli.log_level.into())
        .parse_default_env()
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("map-populator error: {err:?}");
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let plan = PopulationPlan::uniform(cli.entries);
    plan.validate()?;

    loader::remove_memlock_limit()?;
    let mut bpf = loader::load_object(cli.object.as_deref())?;
    let mut maps = LoadedMaps::take_all(&mut bpf)?;

    let encoder = Encoder::new(loader::possible_cpus()?);
    let mut source = match cli.seed {
        Some(seed) => ValueSource::from_seed(seed),
        None => ValueSource::from_clock(),
    };
    info!(
        "populating {} map kinds, {} entries each, {} cpus, seed {}",
        plan.steps().len(),
        cli.entries,
        encoder.nr_cpus(),
        source.seed()
    );

    let mut populator = Populator::new(encoder);
    let report = populator
        .run(&plan, &mut maps, &mut source)
        .context("failed to populate eBPF maps")?;
    debug!("population {:?}", populator.state());
    report.log();
    if cli.report_json {
        println!("{}", report.to_json());
    }

    info!("Random values loaded into eBPF maps. Press Ctrl-C to exit.");
    loader::wait_for_shutdown().await?;

    info!("shutting down, closing maps");
    drop(maps);
    drop(bpf);
    Ok(())
}
