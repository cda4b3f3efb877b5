//! Tiles command - list the tiles covering a viewport.

use std::sync::Arc;

use serde::Serialize;
use tessera::coord::TileIndex;
use tessera::layer::TileLayer;
use tessera::tile::{HttpTileFetcher, TileSize};
use tracing::debug;

use super::common::{load_config, print_json, source_or_keys, ViewArgs};
use crate::error::CliError;
use crate::GlobalArgs;

/// Arguments for the tiles command.
pub struct TilesArgs {
    pub view: ViewArgs,
    pub url: Option<String>,
    pub unsorted: bool,
}

/// One listed tile.
#[derive(Debug, Serialize)]
struct TileRow {
    index: TileIndex,
    key: String,
    source_key: String,
    size: TileSize,
    distance: f64,
}

/// Run the tiles command.
pub fn run(args: TilesArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let config = load_config(global.config.as_deref())?;
    let source = source_or_keys(args.url.as_deref(), &config);
    // Nothing is fetched; the fetcher only completes the layer
    let fetcher = HttpTileFetcher::with_timeout(config.source.timeout())?;
    let mut layer = TileLayer::new(config.layer.clone(), source, Arc::new(fetcher))?;

    let viewport = args.view.viewport(layer.config())?;
    debug!(level = viewport.level, center = %viewport.center, "Selecting tiles");

    let tiles = layer.get_tiles(&viewport, !args.unsorted);
    let metric = layer.load_metric(&viewport);
    let rows: Vec<TileRow> = tiles
        .iter()
        .map(|tile| TileRow {
            index: tile.index(),
            key: tile.key(),
            source_key: tile.source_key().to_string(),
            size: tile.size(),
            distance: metric.distance_sq(&tile.index()).sqrt(),
        })
        .collect();

    if global.json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No tiles cover this view at level {}", viewport.level);
        return Ok(());
    }

    println!(
        "{} tiles at level {} ({}x{} px)",
        rows.len(),
        viewport.level,
        rows[0].size.width,
        rows[0].size.height
    );
    for row in &rows {
        println!("  {:<16} {:>8.2}  {}", row.key, row.distance, row.source_key);
    }
    Ok(())
}
