use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::debug;

use drainkit_core::{DrainConfig, OutputFormat};

mod commands;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "drainkit.toml";

#[derive(Parser)]
#[command(
    name = "drainkit",
    about = "Drain admission — which queued jobs may still run, and which nodes may retire",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to drainkit.toml (default: ./drainkit.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Output format: text or json (overrides [output].format)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queued jobs permitted to run during drain
    Permitted {
        /// Cluster snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Only jobs no other node can take. Omit for the cluster-wide set.
        #[arg(short, long)]
        node: Option<String>,
    },
    /// Projects with a build in progress
    Running {
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Restrict to one node; an empty name selects the built-in node.
        #[arg(short, long)]
        node: Option<String>,
    },
    /// Whether a node holds queued work only it can run
    Exclusive {
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Node to probe; an empty name selects the built-in node.
        #[arg(short, long)]
        node: String,
    },
    /// Full drain report for the cluster or one node
    Report {
        #[arg(short, long)]
        snapshot: PathBuf,
        #[arg(short, long)]
        node: Option<String>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DrainConfig> {
    match path {
        Some(path) => DrainConfig::from_file(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            DrainConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))
        }
        None => Ok(DrainConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log.filter))?,
        )
        .init();
    debug!(config = ?cli.config, "configuration loaded");

    let format = cli.format.unwrap_or(config.output.format);
    let policy = drainkit_admission::DrainPolicy::from_config(&config.policy);

    let output = match cli.command {
        Commands::Permitted { snapshot, node } => {
            let ctx = commands::Context::load(&snapshot, policy, format)?;
            commands::query::permitted(&ctx, node.as_deref())
        }
        Commands::Running { snapshot, node } => {
            let ctx = commands::Context::load(&snapshot, policy, format)?;
            commands::query::running(&ctx, node.as_deref())
        }
        Commands::Exclusive { snapshot, node } => {
            let ctx = commands::Context::load(&snapshot, policy, format)?;
            commands::query::exclusive(&ctx, &node)
        }
        Commands::Report { snapshot, node } => {
            let ctx = commands::Context::load(&snapshot, policy, format)?;
            commands::report::report(&ctx, node.as_deref())
        }
    }?;

    print!("{output}");
    Ok(())
}
