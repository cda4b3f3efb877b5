//! Tessera CLI - Command-line interface
//!
//! Tile selection, HTTP prefetch and point clustering on top of the
//! `tessera` library.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tessera::logging::{init_console_logging, init_logging, LoggingGuard};
use tracing::info;

use commands::cluster::ClusterArgs;
use commands::common::{load_config, ViewArgs};
use commands::config::ConfigCommands;
use commands::prefetch::PrefetchArgs;
use commands::tiles::TilesArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(version)]
#[command(about = "Tiled map layers and point clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: <config dir>/tessera/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tiles covering a view, in load order
    Tiles {
        #[command(flatten)]
        view: ViewArgs,

        /// Tile URL template (overrides the config file)
        #[arg(long)]
        url: Option<String>,

        /// Keep selection order instead of load order
        #[arg(long)]
        unsorted: bool,
    },

    /// Fetch a view and every lower level around it over HTTP
    Prefetch {
        #[command(flatten)]
        view: ViewArgs,

        /// Tile URL template (overrides the config file)
        #[arg(long)]
        url: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Tile cache capacity
        #[arg(long)]
        cache_size: Option<usize>,
    },

    /// Cluster points read from a CSV file of x,y pairs
    Cluster {
        /// Input CSV file
        input: PathBuf,

        /// Show clusters and points at this level instead of a summary
        #[arg(long, short = 'z')]
        level: Option<u8>,

        /// Merge radius at level 0
        #[arg(long)]
        radius: Option<f64>,

        /// Finest clustering level
        #[arg(long)]
        max_level: Option<u8>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Options shared by every command.
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub json: bool,
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        config: cli.config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Tiles {
            view,
            url,
            unsorted,
        } => {
            init_console_logging(cli.verbose);
            commands::tiles::run(
                TilesArgs {
                    view,
                    url,
                    unsorted,
                },
                &global,
            )
        }
        Commands::Prefetch {
            view,
            url,
            timeout,
            cache_size,
        } => run_prefetch(
            PrefetchArgs {
                view,
                url,
                timeout,
                cache_size,
            },
            &global,
            cli.verbose,
        ),
        Commands::Cluster {
            input,
            level,
            radius,
            max_level,
        } => {
            init_console_logging(cli.verbose);
            commands::cluster::run(
                ClusterArgs {
                    input,
                    level,
                    radius,
                    max_level,
                },
                &global,
            )
        }
        Commands::Config { command } => {
            init_console_logging(cli.verbose);
            commands::config::run(command, &global)
        }
    };

    if let Err(e) = result {
        e.exit();
    }
}

/// Run prefetch with file and stdout logging, or stderr-only logging in
/// JSON mode.
fn run_prefetch(args: PrefetchArgs, global: &GlobalArgs, verbose: bool) -> Result<(), CliError> {
    let _guard: Option<LoggingGuard> = if global.json {
        init_console_logging(verbose);
        None
    } else {
        let config = load_config(global.config.as_deref())?;
        let guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;
        info!("Tessera v{}", tessera::VERSION);
        Some(guard)
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(commands::prefetch::run(args, global))
}
