//! INI parsing: `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to settings.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::{ConfigError, ConfigFile};
use crate::cluster::ClusterConfig;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigError> {
    let mut config = ConfigFile::default();

    // [layer] section
    if let Some(section) = ini.section(Some("layer")) {
        let reader = SectionReader::new("layer", section);
        let layer = &mut config.layer;
        reader.read("min_level", "must be an integer 0-30", &mut layer.min_level)?;
        reader.read("max_level", "must be an integer 0-30", &mut layer.max_level)?;
        reader.read("tile_width", "must be a positive integer", &mut layer.tile_width)?;
        reader.read("tile_height", "must be a positive integer", &mut layer.tile_height)?;
        reader.read("tile_overlap", "must be a non-negative integer", &mut layer.tile_overlap)?;
        reader.read("cache_size", "must be a positive integer (tiles)", &mut layer.cache_size)?;
        reader.read_bool("wrap_x", &mut layer.wrap_x)?;
        reader.read_bool("wrap_y", &mut layer.wrap_y)?;
        reader.read("min_x", "must be a number", &mut layer.min_x)?;
        reader.read("max_x", "must be a number", &mut layer.max_x)?;
        reader.read("min_y", "must be a number", &mut layer.min_y)?;
        reader.read("max_y", "must be a number", &mut layer.max_y)?;
    }
    config.layer.validate()?;

    // [cluster] section
    if let Some(section) = ini.section(Some("cluster")) {
        let reader = SectionReader::new("cluster", section);
        if let Some(v) = section.get("thresholds") {
            let thresholds = split_list(v)
                .map(|t| t.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| reader.invalid("thresholds", v, "must be a comma-separated list of numbers"))?;
            config.cluster = ClusterConfig::with_thresholds(thresholds)?;
        } else {
            let mut max_level = config.cluster.max_level();
            let mut radius = config.cluster.radius();
            reader.read("max_level", "must be an integer 0-30", &mut max_level)?;
            reader.read("radius", "must be a non-negative number", &mut radius)?;
            config.cluster = ClusterConfig::new(max_level, radius)?;
        }
    }

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        let reader = SectionReader::new("source", section);
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                config.source.url = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("subdomains") {
            config.source.subdomains = split_list(v).map(str::to_string).collect();
        }
        reader.read(
            "timeout_secs",
            "must be a positive integer (seconds)",
            &mut config.source.timeout_secs,
        )?;
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// Typed access to one section's keys.
struct SectionReader<'a> {
    name: &'a str,
    section: &'a Properties,
}

impl<'a> SectionReader<'a> {
    fn new(name: &'a str, section: &'a Properties) -> Self {
        Self { name, section }
    }

    /// Overwrite `target` if `key` is present.
    fn read<T: FromStr>(&self, key: &str, reason: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(v) = self.section.get(key) {
            *target = v
                .trim()
                .parse()
                .map_err(|_| self.invalid(key, v, reason))?;
        }
        Ok(())
    }

    fn read_bool(&self, key: &str, target: &mut bool) -> Result<(), ConfigError> {
        if let Some(v) = self.section.get(key) {
            *target = match v.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => return Err(self.invalid(key, v, "must be true or false")),
            };
        }
        Ok(())
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
