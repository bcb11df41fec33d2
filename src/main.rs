mod collectors;
mod config;
mod stats;
mod writer;

use clap::Parser;
use collectors::system::SysinfoProvider;
use collectors::{collect, MetricsProvider, ProviderError};
use config::Config;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use writer::{write_snapshot, WriteError};

const DEFAULT_CONFIG_PATH: &str = "./sysnap.yaml";

#[derive(Parser, Debug)]
#[command(name = "sysnap")]
#[command(version)]
struct Cli {
    /// YAML config; without it ./sysnap.yaml is used when present.
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    output: Option<String>,
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Debug, Error)]
enum RunError {
    #[error("Error getting system info: {0}")]
    Collect(#[from] ProviderError),
    #[error("Error writing system info to file: {0}")]
    Write(#[from] WriteError),
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let loaded = match &cli.config {
        Some(path) => Config::load_from_file(path),
        None => Config::load_or_default(DEFAULT_CONFIG_PATH),
    };
    let mut cfg = match loaded {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load config");
            println!("Error loading config: {err}");
            std::process::exit(1);
        }
    };
    if let Some(output) = cli.output {
        cfg.output_path = output;
    }

    let mut provider = SysinfoProvider::new();
    match run(&mut provider, &cfg) {
        Ok(()) => println!("System information written to {}", cfg.output_path),
        Err(err) => {
            error!(error = %err, "snapshot failed");
            println!("{err}");
            std::process::exit(1);
        }
    }
}

fn run<P: MetricsProvider>(provider: &mut P, cfg: &Config) -> Result<(), RunError> {
    let snapshot = collect(provider)?;
    write_snapshot(&snapshot, &cfg.output_path, cfg.indent)?;
    info!(path = %cfg.output_path, "snapshot written");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
