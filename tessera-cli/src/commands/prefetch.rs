//! Prefetch command - fetch a view and the levels below it over HTTP.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tessera::cache::CacheStats;
use tessera::layer::{FetchSummary, TileLayer};
use tessera::tile::HttpTileFetcher;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::{load_config, print_json, resolve_source, ViewArgs};
use crate::error::CliError;
use crate::GlobalArgs;

/// Arguments for the prefetch command.
pub struct PrefetchArgs {
    pub view: ViewArgs,
    pub url: Option<String>,
    pub timeout: Option<u64>,
    pub cache_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct PrefetchReport {
    summary: FetchSummary,
    cache: CacheStats,
    cached_tiles: usize,
    elapsed_ms: u128,
}

/// Run the prefetch command.
pub async fn run(args: PrefetchArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let mut config = load_config(global.config.as_deref())?;
    if let Some(timeout) = args.timeout {
        config.source.timeout_secs = timeout;
    }
    if let Some(cache_size) = args.cache_size {
        config.layer = config.layer.with_cache_size(cache_size);
    }

    let source = resolve_source(args.url.as_deref(), &config).ok_or(CliError::MissingSource)?;
    let fetcher = HttpTileFetcher::with_timeout(Duration::from_secs(config.source.timeout_secs))?;
    let mut layer = TileLayer::new(config.layer.clone(), Arc::new(source), Arc::new(fetcher))?;
    let viewport = args.view.viewport(layer.config())?;

    let cancellation = CancellationToken::new();
    let ctrl_c = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight fetches");
            ctrl_c.cancel();
        }
    });

    info!(
        level = viewport.level,
        center = %viewport.center,
        timeout_secs = config.source.timeout_secs,
        "Starting prefetch"
    );
    let started = Instant::now();
    let summary = layer.prefetch(&viewport, cancellation).await;

    let report = PrefetchReport {
        summary,
        cache: layer.cache().stats(),
        cached_tiles: layer.cache().len(),
        elapsed_ms: started.elapsed().as_millis(),
    };

    if global.json {
        return print_json(&report);
    }

    println!("Prefetch: {}", report.summary);
    println!(
        "Cache: {} tiles ({})",
        report.cached_tiles, report.cache
    );
    println!("Elapsed: {:.2}s", report.elapsed_ms as f64 / 1000.0);
    Ok(())
}
