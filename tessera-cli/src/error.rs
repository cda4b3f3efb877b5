//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tessera::cluster::ClusterError;
use tessera::config::ConfigError;
use tessera::layer::LayerError;
use tessera::tile::FetchError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be loaded or saved
    Config(ConfigError),
    /// Layer settings rejected
    Layer(LayerError),
    /// Cluster settings or input rejected
    Cluster(ClusterError),
    /// HTTP client setup failed
    Fetch(FetchError),
    /// No tile URL configured for a command that fetches
    MissingSource,
    /// A command-line argument is out of range
    InvalidArgument(String),
    /// Failed to read an input file
    Input { path: PathBuf, error: std::io::Error },
    /// An input line could not be parsed
    InvalidInput {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// Refused to overwrite an existing file
    AlreadyExists(PathBuf),
    /// Failed to render JSON output
    Output(serde_json::Error),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::MissingSource => {
                eprintln!();
                eprintln!("Set a tile URL template in the config file:");
                eprintln!("  [source]");
                eprintln!("  url = https://{{s}}.tile.example.org/{{z}}/{{x}}/{{y}}.png");
                eprintln!("or pass one with --url.");
            }
            CliError::AlreadyExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Layer(e) => write!(f, "Layer error: {}", e),
            CliError::Cluster(e) => write!(f, "Clustering error: {}", e),
            CliError::Fetch(e) => write!(f, "Failed to create tile fetcher: {}", e),
            CliError::MissingSource => write!(f, "No tile source URL configured"),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Input { path, error } => {
                write!(f, "Failed to read '{}': {}", path.display(), error)
            }
            CliError::InvalidInput { path, line, reason } => {
                write!(f, "{}:{}: {}", path.display(), line, reason)
            }
            CliError::AlreadyExists(path) => {
                write!(f, "File already exists: {}", path.display())
            }
            CliError::Output(e) => write!(f, "Failed to write JSON output: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Layer(e) => Some(e),
            CliError::Cluster(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Input { error, .. } => Some(error),
            CliError::Output(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LayerError> for CliError {
    fn from(e: LayerError) -> Self {
        CliError::Layer(e)
    }
}

impl From<ClusterError> for CliError {
    fn from(e: ClusterError) -> Self {
        CliError::Cluster(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
