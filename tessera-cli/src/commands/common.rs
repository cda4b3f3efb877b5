//! Common types and utilities shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tessera::config::ConfigFile;
use tessera::coord::{Point, Size};
use tessera::layer::{LayerConfig, LevelScales, Viewport};
use tessera::tile::{TileSource, UrlTemplateSource};

use crate::error::CliError;

/// Viewport arguments shared by tile commands.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Zoom level of the view
    #[arg(long, short = 'z')]
    pub level: u8,

    /// Horizontal center of the view
    #[arg(long, allow_negative_numbers = true)]
    pub x: f64,

    /// Vertical center of the view
    #[arg(long, allow_negative_numbers = true)]
    pub y: f64,

    /// View width in pixels at the given level
    #[arg(long, default_value = "1024")]
    pub width: f64,

    /// View height in pixels at the given level
    #[arg(long, default_value = "768")]
    pub height: f64,

    /// Read --x/--y as map units (per the layer bounds) instead of pixels
    #[arg(long)]
    pub map_units: bool,
}

impl ViewArgs {
    /// Build the viewport, converting map units to pixels at the view level
    /// when requested.
    pub fn viewport(&self, layer: &LayerConfig) -> Result<Viewport, CliError> {
        let size = Size::new(self.width, self.height);
        if !size.is_finite() || size.width < 0.0 || size.height < 0.0 {
            return Err(CliError::InvalidArgument(format!(
                "view size {}x{} must be finite and non-negative",
                self.width, self.height
            )));
        }

        let mut center = Point::new(self.x, self.y);
        if self.map_units {
            let scales = LevelScales::new(layer.max_level);
            center = layer.to_local(center).scale(scales.ratio(0, self.level));
        }
        if !center.is_finite() {
            return Err(CliError::InvalidArgument(format!(
                "view center ({}, {}) is not finite",
                self.x, self.y
            )));
        }

        Ok(Viewport::new(self.level, center, size))
    }
}

/// Load the config from an explicit path or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Resolve the tile source: CLI URL first, then the config file.
pub fn resolve_source(url: Option<&str>, config: &ConfigFile) -> Option<UrlTemplateSource> {
    match url {
        Some(url) => Some(
            UrlTemplateSource::new(url).with_subdomains(config.source.subdomains.iter().cloned()),
        ),
        None => config.source.url_source(),
    }
}

/// The configured URL source, or a source that echoes tile keys.
pub fn source_or_keys(url: Option<&str>, config: &ConfigFile) -> Arc<dyn TileSource> {
    match resolve_source(url, config) {
        Some(source) => Arc::new(source),
        None => Arc::new(|index: &tessera::coord::TileIndex| index.key()),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
