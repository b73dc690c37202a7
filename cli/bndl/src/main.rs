//! bndl CLI: resolve bundles, bundle configurations and versions through
//! the resolver chain.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use commands::Context;

#[derive(Parser)]
#[command(name = "bndl", version, about = "Resolve bundles through a chain of resolvers")]
struct Cli {
    /// Use the offline resolver chain
    #[arg(long, global = true)]
    offline: bool,
    /// Cache directory (default: ~/.bndl/cache)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Settings file (default: ~/.bndl/settings.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a bundle and print its file name and location
    Bundle {
        /// Bundle URI, reference or `-` for stdin
        uri: String,
    },
    /// Resolve a bundle configuration
    Config {
        uri: String,
    },
    /// Resolve a bundle version and print it as JSON
    Version {
        uri: String,
    },
    /// Resolve a bundle version and derive its continuous delivery URI
    CdUri {
        uri: String,
    },
    /// Print the active resolver chain
    Chain,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json, level(cli.verbose));

    if let Err(e) = run(cli) {
        eprint!("{}", commands::report(&e));
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(cli.settings.as_deref(), cli.cache_dir, cli.offline)?;

    match cli.command {
        Commands::Bundle { uri } => commands::resolve::bundle(&ctx, &uri),
        Commands::Config { uri } => commands::resolve::config(&ctx, &uri),
        Commands::Version { uri } => commands::resolve::version(&ctx, &uri),
        Commands::CdUri { uri } => commands::resolve::cd_uri(&ctx, &uri),
        Commands::Chain => commands::chain::run(&ctx),
    }
}

fn level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
