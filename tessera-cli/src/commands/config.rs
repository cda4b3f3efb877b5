//! Configuration management CLI commands.
//!
//! Provides `config show`, `config path` and `config init`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tessera::config::{config_file_path, ConfigFile};

use super::common::{load_config, print_json};
use crate::error::CliError;
use crate::GlobalArgs;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (file values over defaults)
    Show,

    /// Show the configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, global: &GlobalArgs) -> Result<(), CliError> {
    let path = global.config.clone().unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Show => run_show(&path, global.json),
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

fn run_show(path: &Path, json: bool) -> Result<(), CliError> {
    let config = load_config(Some(path))?;
    if json {
        return print_json(&config);
    }
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_path(path: &Path) -> Result<(), CliError> {
    let state = if path.exists() { "" } else { " (not created)" };
    println!("{}{}", path.display(), state);
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(PathBuf::from(path)));
    }
    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tessera").join("config.ini");

        run_init(&path, false).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[layer]\ncache_size = 9\n").unwrap();

        assert!(matches!(
            run_init(&path, false),
            Err(CliError::AlreadyExists(_))
        ));
        assert_eq!(ConfigFile::load_from(&path).unwrap().layer.cache_size, 9);

        run_init(&path, true).unwrap();
        assert_eq!(
            ConfigFile::load_from(&path).unwrap(),
            ConfigFile::default()
        );
    }
}
