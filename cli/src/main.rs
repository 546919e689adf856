//! mutual-sim: drive a mutual risk pool from the command line.

mod report;
mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mutual_nullables::{NullClock, SystemClock};
use mutual_pool::persist::open_store;
use mutual_pool::{init_logging, Pool, PoolConfig};

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "mutual-sim", about = "Mutual risk pool simulator")]
struct Cli {
    /// Data directory for the pool store.
    /// Defaults to the config file's value, or "./mutual_data".
    #[arg(long, env = "MUTUAL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MUTUAL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MUTUAL_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MUTUAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,

    /// Replay a JSON scenario against a pool.
    Replay {
        /// Scenario file.
        scenario: PathBuf,

        /// Continue past failing steps instead of aborting.
        #[arg(long)]
        keep_going: bool,

        /// Start from the stored pool and save the result back.
        #[arg(long)]
        persist: bool,

        /// Print amounts in raw units.
        #[arg(long)]
        raw: bool,
    },

    /// Print the stored pool state.
    Report {
        /// Print amounts in raw units.
        #[arg(long)]
        raw: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<PoolConfig> {
    let mut config = match &cli.config {
        Some(path) => PoolConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PoolConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Replay {
            scenario,
            keep_going,
            persist,
            raw,
        } => {
            let scenario = Scenario::from_file(&scenario)?;
            let store = if persist {
                Some(open_store(&config)?)
            } else {
                None
            };
            let mut pool = match &store {
                Some(store) => {
                    let pool =
                        Pool::load_from_store(store, config.params.clone(), NullClock::new(0))?;
                    pool.clock().set(pool.last_activity().as_secs());
                    pool
                }
                None => Pool::new(config.params.clone(), NullClock::new(0))?,
            };
            tracing::info!(
                name = scenario.name.as_deref().unwrap_or("unnamed"),
                steps = scenario.steps.len(),
                "replaying scenario"
            );

            let records = scenario::replay(&mut pool, &scenario, keep_going)?;
            let failed = records.iter().filter(|r| r.result.is_err()).count();
            for record in &records {
                match &record.result {
                    Ok(summary) => println!("[{:>3}] day {:>4}  {summary}", record.index, record.day),
                    Err(e) => println!("[{:>3}] day {:>4}  FAILED: {e}", record.index, record.day),
                }
            }
            println!();
            print!("{}", report::render(&pool, raw));

            if let Some(store) = &store {
                pool.save_to_store(store)?;
                tracing::info!(data_dir = %config.data_dir.display(), "pool saved");
            }
            if failed > 0 {
                tracing::warn!(failed, "scenario finished with failing steps");
            }
        }
        Command::Report { raw } => {
            let store = open_store(&config)?;
            let pool = Pool::load_from_store(&store, config.params.clone(), SystemClock)?;
            print!("{}", report::render(&pool, raw));
        }
    }

    Ok(())
}
