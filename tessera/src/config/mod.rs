//! User configuration
//!
//! An INI file with `[layer]`, `[cluster]`, `[source]` and `[logging]`
//! sections. Every key is optional:
//!
//! ```ini
//! [layer]
//! max_level = 18
//! cache_size = 200
//! wrap_x = true
//!
//! [cluster]
//! radius = 5
//!
//! [source]
//! url = https://{s}.tile.example.org/{z}/{x}/{y}.png
//! subdomains = a, b, c
//! timeout_secs = 30
//!
//! [logging]
//! file = tessera.log
//! ```

mod file;
mod parser;
mod writer;

pub use file::{
    config_directory, config_file_path, ConfigError, ConfigFile, LoggingSettings, SourceSettings,
};
