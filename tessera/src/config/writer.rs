//! Serialization: `ConfigFile` → INI text.

use ini::Ini;

use super::file::ConfigFile;
use crate::cluster::ClusterConfig;

/// Render a config as INI text that [`super::parser::parse_ini`] reads back
/// to an equal value.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mut ini = Ini::new();
    let layer = &config.layer;

    ini.with_section(Some("layer"))
        .set("min_level", layer.min_level.to_string())
        .set("max_level", layer.max_level.to_string())
        .set("tile_width", layer.tile_width.to_string())
        .set("tile_height", layer.tile_height.to_string())
        .set("tile_overlap", layer.tile_overlap.to_string())
        .set("cache_size", layer.cache_size.to_string())
        .set("wrap_x", layer.wrap_x.to_string())
        .set("wrap_y", layer.wrap_y.to_string())
        .set("min_x", layer.min_x.to_string())
        .set("max_x", layer.max_x.to_string())
        .set("min_y", layer.min_y.to_string())
        .set("max_y", layer.max_y.to_string());

    let cluster = &config.cluster;
    let halving = ClusterConfig::new(cluster.max_level(), cluster.radius()).ok();
    if halving.as_ref() == Some(cluster) {
        ini.with_section(Some("cluster"))
            .set("max_level", cluster.max_level().to_string())
            .set("radius", cluster.radius().to_string());
    } else {
        let thresholds: Vec<String> = cluster.thresholds().iter().map(f64::to_string).collect();
        ini.with_section(Some("cluster"))
            .set("thresholds", thresholds.join(", "));
    }

    let mut source = ini.with_section(Some("source"));
    if let Some(url) = &config.source.url {
        source.set("url", url.as_str());
    }
    source
        .set("subdomains", config.source.subdomains.join(", "))
        .set("timeout_secs", config.source.timeout_secs.to_string());

    ini.with_section(Some("logging"))
        .set("directory", config.logging.directory.to_string_lossy())
        .set("file", config.logging.file.as_str());

    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail
    let _ = ini.write_to(&mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}
