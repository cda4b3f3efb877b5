//! The tile layer: selection, fetching and the active set.
//!
//! A [`TileLayer`] owns its cache and active set outright. Every mutation goes
//! through `&mut self`, including fetch completions: fetch futures run
//! concurrently inside [`TileLayer::load`], but their results are applied
//! one at a time by the layer itself, so out-of-order arrival never races
//! with cache bookkeeping.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    FetchSummary, LayerConfig, LayerError, LayerEvent, LevelScales, LoadMetric, TileRange,
    ViewUpdate, Viewport, EVENT_CHANNEL_CAPACITY,
};
use crate::cache::TileCache;
use crate::coord::{tile_at_point, Point, TileIndex};
use crate::tile::{FetchError, Tile, TileFetcher, TileSource, TileState};

/// How a fetch completion was applied.
enum Completion {
    Ready,
    Failed,
    Discarded,
}

/// A layer of tiles over one data source.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tessera::coord::{Point, Size};
/// use tessera::layer::{LayerConfig, TileLayer, Viewport};
/// use tessera::tile::{HttpTileFetcher, UrlTemplateSource};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let source = UrlTemplateSource::new("https://tile.example.org/{z}/{x}/{y}.png");
/// let mut layer = TileLayer::new(
///     LayerConfig::default(),
///     Arc::new(source),
///     Arc::new(HttpTileFetcher::new()?),
/// )?;
///
/// let view = Viewport::new(3, Point::new(1024.0, 1024.0), Size::new(800.0, 600.0));
/// let update = layer.update_view(&view, CancellationToken::new()).await;
/// println!("{}", update);
/// # Ok(())
/// # }
/// ```
pub struct TileLayer {
    config: LayerConfig,
    scales: LevelScales,
    source: Arc<dyn TileSource>,
    fetcher: Arc<dyn TileFetcher>,
    cache: TileCache,
    active: HashMap<String, TileIndex>,
    events: broadcast::Sender<LayerEvent>,
}

impl TileLayer {
    /// Create a layer.
    ///
    /// # Arguments
    ///
    /// * `config` - Layer configuration, validated here
    /// * `source` - Maps tile indices to source keys
    /// * `fetcher` - Retrieves payloads by source key
    pub fn new(
        config: LayerConfig,
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Result<Self, LayerError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            min_level = config.min_level,
            max_level = config.max_level,
            cache_size = config.cache_size,
            source = source.name(),
            "Tile layer created"
        );

        Ok(Self {
            scales: LevelScales::new(config.max_level),
            cache: TileCache::new(config.cache_size),
            config,
            source,
            fetcher,
            active: HashMap::new(),
            events,
        })
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn scales(&self) -> &LevelScales {
        &self.scales
    }

    /// Read-only view of the tile cache.
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Subscribe to layer notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LayerEvent> {
        self.events.subscribe()
    }

    /// Column and row of the tile containing `point` (pixels at any level).
    pub fn tile_at_point(&self, point: Point) -> (i64, i64) {
        tile_at_point(point, self.config.tile_width, self.config.tile_height)
    }

    /// Load ordering around a viewport center.
    pub fn load_metric(&self, viewport: &Viewport) -> LoadMetric<'_> {
        LoadMetric::new(
            viewport,
            self.config.tile_width,
            self.config.tile_height,
            &self.scales,
        )
        .with_wrap(self.config.wrap_x, self.config.wrap_y)
    }

    /// Indices of the existing tiles covering a viewport, without touching
    /// the cache.
    ///
    /// Levels outside the configured range select nothing.
    pub fn select(&self, viewport: &Viewport) -> Vec<TileIndex> {
        if viewport.level < self.config.min_level || viewport.level > self.config.max_level {
            return Vec::new();
        }
        TileRange::covering(
            viewport.level,
            viewport.center,
            viewport.size,
            self.config.tile_width,
            self.config.tile_height,
        )
        .indices(self.config.wrap_x, self.config.wrap_y)
    }

    /// Tiles covering a viewport.
    ///
    /// Each tile comes from the cache, or is created in the pending state
    /// and cached. Nothing is fetched. The returned tiles are snapshots.
    ///
    /// # Arguments
    ///
    /// * `viewport` - The view to cover
    /// * `sorted` - Order the tiles by the [`LoadMetric`]
    pub fn get_tiles(&mut self, viewport: &Viewport, sorted: bool) -> Vec<Tile> {
        let mut indices = self.select(viewport);
        if sorted {
            self.load_metric(viewport).sort(&mut indices);
        }

        let mut tiles = Vec::with_capacity(indices.len());
        for index in indices {
            let key = self.ensure_cached(index);
            if let Some(tile) = self.cache.peek(&key) {
                tiles.push(tile.clone());
            }
        }
        tiles
    }

    /// Fetch the pending tiles among `indices`.
    ///
    /// Fetches are issued in the given order and run concurrently.
    /// Completions are applied as they arrive, in any order. Tiles that are
    /// already ready or failed are skipped. The returned future settles once
    /// every issued fetch has settled; a failed tile never cuts the run
    /// short.
    ///
    /// Cancelling `cancellation` drops the fetches still in flight and
    /// leaves their tiles pending.
    ///
    /// # Returns
    ///
    /// `FetchSummary` with per-outcome counts.
    pub async fn load(
        &mut self,
        indices: &[TileIndex],
        cancellation: CancellationToken,
    ) -> FetchSummary {
        let mut summary = FetchSummary::default();
        let mut seen = HashSet::new();
        let mut in_flight = FuturesUnordered::new();

        for index in indices {
            if !seen.insert(*index) {
                continue;
            }
            let key = self.ensure_cached(*index);
            let Some(tile) = self.cache.peek(&key) else {
                continue;
            };
            if tile.state() != TileState::Pending {
                summary.skipped += 1;
                continue;
            }

            let serial = tile.serial();
            let fetch = self.fetcher.fetch(tile.source_key().to_string());
            in_flight.push(async move { (key, serial, fetch.await) });
            summary.requested += 1;
        }

        debug!(
            requested = summary.requested,
            skipped = summary.skipped,
            "Tile fetches issued"
        );

        while !in_flight.is_empty() {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    summary.was_cancelled = true;
                    break;
                }

                Some((key, serial, result)) = in_flight.next() => {
                    match self.apply_completion(&key, serial, result) {
                        Completion::Ready => summary.ready += 1,
                        Completion::Failed => summary.failed += 1,
                        Completion::Discarded => summary.discarded += 1,
                    }
                }
            }
        }

        if summary.was_cancelled {
            summary.cancelled = in_flight.len();
            info!(
                ready = summary.ready,
                failed = summary.failed,
                in_flight = summary.cancelled,
                "Tile load cancelled"
            );
        } else if summary.requested > 0 {
            info!(
                requested = summary.requested,
                ready = summary.ready,
                failed = summary.failed,
                discarded = summary.discarded,
                "Tile load complete"
            );
        }

        summary
    }

    /// Fetch every tile from the minimum level up to the viewport's level
    /// around the same area.
    ///
    /// The viewport is rescaled to each level, the selections are merged
    /// without duplicates and loaded in [`LoadMetric`] order relative to the
    /// original viewport. Nothing is drawn.
    pub async fn prefetch(
        &mut self,
        viewport: &Viewport,
        cancellation: CancellationToken,
    ) -> FetchSummary {
        let top = viewport.level.min(self.config.max_level);
        let mut seen = HashSet::new();
        let mut indices = Vec::new();

        for level in self.config.min_level..=top {
            let view = viewport.at_level(level, &self.scales);
            for index in self.select(&view) {
                if seen.insert(index) {
                    indices.push(index);
                }
            }
        }
        self.load_metric(viewport).sort(&mut indices);

        info!(
            level = viewport.level,
            min_level = self.config.min_level,
            tiles = indices.len(),
            "Prefetching tiles"
        );

        self.load(&indices, cancellation).await
    }

    /// Bring the active set in line with a viewport.
    ///
    /// Selects the covering tiles in load order, fetches the pending ones,
    /// draws every covering tile that is ready and removes active tiles that
    /// no longer cover the view.
    pub async fn update_view(
        &mut self,
        viewport: &Viewport,
        cancellation: CancellationToken,
    ) -> ViewUpdate {
        let indices: Vec<TileIndex> = self
            .get_tiles(viewport, true)
            .iter()
            .map(Tile::index)
            .collect();
        let fetch = self.load(&indices, cancellation).await;

        let mut drawn = 0;
        for index in &indices {
            let ready = self
                .cache
                .peek(&index.key())
                .is_some_and(|tile| tile.state() == TileState::Ready);
            if ready && matches!(self.draw(index), Ok(true)) {
                drawn += 1;
            }
        }

        let wanted: HashSet<&TileIndex> = indices.iter().collect();
        let stale: Vec<TileIndex> = self
            .active
            .values()
            .filter(|index| !wanted.contains(index))
            .copied()
            .collect();
        let mut removed = 0;
        for index in &stale {
            if self.remove(index).is_some() {
                removed += 1;
            }
        }

        let update = ViewUpdate {
            selected: indices.len(),
            drawn,
            removed,
            fetch,
        };
        debug!(level = viewport.level, %update, "View updated");
        update
    }

    /// Re-request a failed tile.
    ///
    /// Moves the tile back to pending and fetches it again. Tiles that are
    /// pending or ready are left alone (the summary reports them skipped
    /// or re-fetched accordingly).
    pub async fn retry(
        &mut self,
        index: &TileIndex,
        cancellation: CancellationToken,
    ) -> Result<FetchSummary, LayerError> {
        let key = index.key();
        let tile = self
            .cache
            .peek_mut(&key)
            .ok_or_else(|| LayerError::NotCached(key.clone()))?;
        if tile.retry() {
            debug!(key = %key, "Retrying failed tile");
        }
        Ok(self.load(&[*index], cancellation).await)
    }

    /// Add a cached tile to the active set.
    ///
    /// Drawing an already active tile changes nothing.
    ///
    /// # Returns
    ///
    /// `true` if the tile was newly added.
    pub fn draw(&mut self, index: &TileIndex) -> Result<bool, LayerError> {
        let key = index.key();
        if self.cache.get(&key).is_none() {
            return Err(LayerError::NotCached(key));
        }
        if self.active.contains_key(&key) {
            return Ok(false);
        }

        self.cache.set_active(&key, true);
        self.active.insert(key, *index);
        debug!(tile = %index, "Tile drawn");
        self.emit(LayerEvent::TileDrawn { index: *index });
        Ok(true)
    }

    /// Remove a tile from the active set.
    ///
    /// The tile stays cached but becomes eligible for eviction.
    ///
    /// # Returns
    ///
    /// A snapshot of the removed tile, or `None` if it was not active.
    pub fn remove(&mut self, index: &TileIndex) -> Option<Tile> {
        let key = index.key();
        self.active.remove(&key)?;
        self.cache.set_active(&key, false);
        let tile = self.cache.peek(&key).cloned();

        debug!(tile = %index, "Tile removed");
        self.emit(LayerEvent::TileRemoved { index: *index });
        self.shrink_cache();
        tile
    }

    /// Empty the active set.
    ///
    /// # Returns
    ///
    /// Snapshots of every removed tile, ordered by index.
    pub fn clear(&mut self) -> Vec<Tile> {
        let mut drained: Vec<(String, TileIndex)> = self.active.drain().collect();
        drained.sort_by_key(|(_, index)| *index);

        let mut removed = Vec::with_capacity(drained.len());
        for (key, index) in drained {
            self.cache.set_active(&key, false);
            if let Some(tile) = self.cache.peek(&key) {
                removed.push(tile.clone());
            }
            self.emit(LayerEvent::TileRemoved { index });
        }

        self.shrink_cache();
        removed
    }

    /// Clear the active set, then drop every cached tile.
    ///
    /// # Returns
    ///
    /// Snapshots of the tiles that were active.
    pub fn reset(&mut self) -> Vec<Tile> {
        let removed = self.clear();
        let dropped = self.cache.len();
        self.cache.clear();

        info!(removed = removed.len(), dropped, "Tile layer reset");
        self.emit(LayerEvent::Reset);
        removed
    }

    /// Switch to a new data source.
    ///
    /// Cached tiles belong to the old source, so the layer is reset.
    pub fn set_source(&mut self, source: Arc<dyn TileSource>) -> Vec<Tile> {
        info!(
            from = self.source.name(),
            to = source.name(),
            "Tile source changed"
        );
        self.source = source;
        self.reset()
    }

    /// Snapshots of the active tiles, ordered by index.
    pub fn active(&self) -> Vec<Tile> {
        let mut indices: Vec<&TileIndex> = self.active.values().collect();
        indices.sort();
        indices
            .into_iter()
            .filter_map(|index| self.cache.peek(&index.key()).cloned())
            .collect()
    }

    pub fn is_active(&self, index: &TileIndex) -> bool {
        self.active.contains_key(&index.key())
    }

    /// Cached tile for an index, without affecting recency.
    pub fn tile(&self, index: &TileIndex) -> Option<&Tile> {
        self.cache.peek(&index.key())
    }

    /// Make sure a tile for `index` is cached and return its key.
    fn ensure_cached(&mut self, index: TileIndex) -> String {
        let key = TileCache::hash(&index);
        if self.cache.get(&key).is_some() {
            return key;
        }

        let tile = Tile::new(
            index,
            self.config.tile_size(),
            self.source.source_key(&index),
        );
        debug!(key = %key, source_key = tile.source_key(), "Creating tile");

        let overflows = self.cache.stats().overflows;
        let evicted = self.cache.add(tile);
        self.report_evictions(evicted);
        if self.cache.stats().overflows > overflows {
            self.emit(LayerEvent::CacheOverflow {
                len: self.cache.len(),
                capacity: self.cache.capacity(),
            });
        }
        key
    }

    fn apply_completion(
        &mut self,
        key: &str,
        serial: u64,
        result: Result<Bytes, FetchError>,
    ) -> Completion {
        let Some(tile) = self.cache.peek_mut(key) else {
            debug!(key = %key, "Discarding completion for evicted tile");
            return Completion::Discarded;
        };
        if tile.serial() != serial || tile.state() != TileState::Pending {
            debug!(key = %key, "Discarding stale completion");
            return Completion::Discarded;
        }

        let index = tile.index();
        let (event, outcome) = match result {
            Ok(payload) => {
                debug!(key = %key, bytes = payload.len(), "Tile ready");
                tile.complete(Ok(payload));
                (LayerEvent::TileReady { index }, Completion::Ready)
            }
            Err(error) => {
                warn!(
                    key = %key,
                    source_key = tile.source_key(),
                    error = %error,
                    "Tile fetch failed"
                );
                tile.complete(Err(error.clone()));
                (LayerEvent::TileFailed { index, error }, Completion::Failed)
            }
        };
        self.emit(event);
        outcome
    }

    fn shrink_cache(&mut self) {
        let evicted = self.cache.shrink_to_capacity();
        self.report_evictions(evicted);
    }

    fn report_evictions(&self, evicted: Vec<Tile>) {
        for tile in evicted {
            self.emit(LayerEvent::TileEvicted {
                index: tile.index(),
            });
        }
    }

    fn emit(&self, event: LayerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Size;
    use crate::tile::{BoxFuture, MockTileFetcher};

    fn key_source() -> Arc<dyn TileSource> {
        Arc::new(|index: &TileIndex| index.key())
    }

    fn make_layer(config: LayerConfig, fetcher: MockTileFetcher) -> TileLayer {
        TileLayer::new(config, key_source(), Arc::new(fetcher)).unwrap()
    }

    fn unwrapped() -> LayerConfig {
        LayerConfig::default().with_wrap(false, false)
    }

    fn view(level: u8, cx: f64, cy: f64, w: f64, h: f64) -> Viewport {
        Viewport::new(level, Point::new(cx, cy), Size::new(w, h))
    }

    /// Fetcher whose fetches never complete.
    struct StalledFetcher;

    impl TileFetcher for StalledFetcher {
        fn fetch(&self, _source_key: String) -> BoxFuture<'static, Result<Bytes, FetchError>> {
            Box::pin(futures::future::pending())
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = TileLayer::new(
            LayerConfig::default().with_cache_size(0),
            key_source(),
            Arc::new(MockTileFetcher::default()),
        );
        assert!(matches!(result, Err(LayerError::Config(_))));
    }

    #[test]
    fn test_viewport_inside_origin_tile() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        let tiles = layer.get_tiles(&view(0, 128.0, 128.0, 100.0, 100.0), false);

        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].index(), TileIndex::new(0, 0, 0));
        assert_eq!(tiles[0].state(), TileState::Pending);
        assert_eq!(tiles[0].source_key(), "0-0-0");
        assert!(layer.cache().contains("0-0-0"));
    }

    #[test]
    fn test_get_tiles_reuses_cached_tiles() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        let v = view(2, 512.0, 512.0, 512.0, 512.0);
        let first = layer.get_tiles(&v, false);
        let second = layer.get_tiles(&v, false);

        assert_eq!(first.len(), second.len());
        assert_eq!(layer.cache().len(), first.len());
        assert_eq!(first[0].serial(), second[0].serial());
    }

    #[test]
    fn test_sorted_tiles_start_at_center() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        // Centered on tile (2, 2) at level 3, covering a 3x3 block
        let tiles = layer.get_tiles(&view(3, 640.0, 640.0, 768.0, 768.0), true);

        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0].index(), TileIndex::new(2, 2, 3));
        // Corners are the farthest tiles
        let corners = [(1, 1), (3, 1), (1, 3), (3, 3)];
        for tile in &tiles[5..] {
            let index = tile.index();
            assert!(corners.contains(&(index.x, index.y)));
        }
    }

    #[test]
    fn test_level_outside_range_selects_nothing() {
        let config = unwrapped().with_levels(2, 4);
        let mut layer = make_layer(config, MockTileFetcher::default());
        assert!(layer.get_tiles(&view(1, 0.0, 0.0, 512.0, 512.0), false).is_empty());
        assert!(layer.get_tiles(&view(5, 0.0, 0.0, 512.0, 512.0), false).is_empty());
    }

    #[tokio::test]
    async fn test_load_makes_tiles_ready() {
        let fetcher = MockTileFetcher::default();
        let mut layer = make_layer(unwrapped(), fetcher.clone());
        let mut events = layer.subscribe();

        let indices = [TileIndex::new(0, 0, 1), TileIndex::new(1, 0, 1)];
        let summary = layer.load(&indices, CancellationToken::new()).await;

        assert_eq!(summary.requested, 2);
        assert_eq!(summary.ready, 2);
        assert!(!summary.was_cancelled);
        assert_eq!(fetcher.requested(), vec!["1-0-0", "1-1-0"]);

        let tile = layer.tile(&indices[0]).unwrap();
        assert_eq!(tile.state(), TileState::Ready);
        assert_eq!(tile.payload().unwrap().as_ref(), b"1-0-0");

        let mut ready = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, LayerEvent::TileReady { .. }) {
                ready += 1;
            }
        }
        assert_eq!(ready, 2);
    }

    #[tokio::test]
    async fn test_failed_tile_is_retained_until_retry() {
        let fetcher = MockTileFetcher::failing(&["1-0-0"]);
        let mut layer = make_layer(unwrapped(), fetcher.clone());
        let index = TileIndex::new(0, 0, 1);

        let summary = layer.load(&[index], CancellationToken::new()).await;
        assert_eq!(summary.failed, 1);
        assert_eq!(layer.tile(&index).unwrap().state(), TileState::Failed);

        // Not retried automatically
        let summary = layer.load(&[index], CancellationToken::new()).await;
        assert_eq!(summary.requested, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fetcher.requested().len(), 1);

        // Explicit retry re-issues the fetch
        let summary = layer.retry(&index, CancellationToken::new()).await.unwrap();
        assert_eq!(summary.requested, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_uncached_tile() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        let result = layer
            .retry(&TileIndex::new(0, 0, 3), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(LayerError::NotCached(_))));
    }

    #[tokio::test]
    async fn test_prefetch_covers_every_level() {
        let fetcher = MockTileFetcher::default();
        let mut layer = make_layer(unwrapped(), fetcher.clone());

        let summary = layer
            .prefetch(&view(2, 512.0, 512.0, 256.0, 256.0), CancellationToken::new())
            .await;

        // 4 tiles at level 2, 4 at level 1, 1 at level 0
        assert_eq!(summary.requested, 9);
        assert_eq!(summary.ready, 9);

        let requested = fetcher.requested();
        assert!(requested[..4].iter().all(|k| k.starts_with("2-")));
        assert!(requested[4..8].iter().all(|k| k.starts_with("1-")));
        assert_eq!(requested[8], "0-0-0");
        assert!(layer.active().is_empty());
    }

    #[tokio::test]
    async fn test_update_view_draws_and_removes() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());

        let first = view(2, 128.0, 128.0, 100.0, 100.0);
        let update = layer.update_view(&first, CancellationToken::new()).await;
        assert_eq!(update.selected, 1);
        assert_eq!(update.drawn, 1);
        assert!(layer.is_active(&TileIndex::new(0, 0, 2)));

        let second = view(2, 384.0, 128.0, 100.0, 100.0);
        let update = layer.update_view(&second, CancellationToken::new()).await;
        assert_eq!(update.drawn, 1);
        assert_eq!(update.removed, 1);
        assert!(!layer.is_active(&TileIndex::new(0, 0, 2)));
        assert!(layer.is_active(&TileIndex::new(1, 0, 2)));
        assert_eq!(layer.active().len(), 1);
    }

    #[tokio::test]
    async fn test_update_view_skips_failed_tiles() {
        let fetcher = MockTileFetcher::failing(&["0-0-0"]);
        let mut layer = make_layer(unwrapped(), fetcher);

        let update = layer
            .update_view(&view(0, 128.0, 128.0, 10.0, 10.0), CancellationToken::new())
            .await;
        assert_eq!(update.fetch.failed, 1);
        assert_eq!(update.drawn, 0);
        assert!(layer.active().is_empty());
    }

    #[test]
    fn test_draw_requires_cached_tile() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        let result = layer.draw(&TileIndex::new(0, 0, 0));
        assert!(matches!(result, Err(LayerError::NotCached(key)) if key == "0-0-0"));
    }

    #[test]
    fn test_draw_twice_keeps_single_entry() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        layer.get_tiles(&view(0, 128.0, 128.0, 10.0, 10.0), false);
        let index = TileIndex::new(0, 0, 0);

        assert_eq!(layer.draw(&index), Ok(true));
        assert_eq!(layer.draw(&index), Ok(false));
        assert_eq!(layer.active().len(), 1);
        assert!(layer.cache().is_active("0-0-0"));
    }

    #[test]
    fn test_active_tile_survives_eviction() {
        let config = unwrapped().with_cache_size(2);
        let mut layer = make_layer(config, MockTileFetcher::default());
        let mut events = layer.subscribe();

        layer.get_tiles(&view(0, 128.0, 128.0, 10.0, 10.0), false);
        layer.draw(&TileIndex::new(0, 0, 0)).unwrap();

        // Fill the cache well past capacity with level-3 tiles
        layer.get_tiles(&view(3, 1024.0, 1024.0, 2048.0, 256.0), false);

        assert!(layer.cache().contains("0-0-0"));
        assert_eq!(layer.cache().len(), 2);

        let evicted = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|event| matches!(event, LayerEvent::TileEvicted { .. }))
            .count();
        assert!(evicted > 0);
    }

    #[test]
    fn test_remove_releases_tile() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        layer.get_tiles(&view(0, 128.0, 128.0, 10.0, 10.0), false);
        let index = TileIndex::new(0, 0, 0);
        layer.draw(&index).unwrap();

        let removed = layer.remove(&index).unwrap();
        assert_eq!(removed.index(), index);
        assert!(!layer.is_active(&index));
        assert!(!layer.cache().is_active("0-0-0"));
        assert!(layer.remove(&index).is_none());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        let mut events = layer.subscribe();
        let tiles = layer.get_tiles(&view(1, 256.0, 256.0, 512.0, 512.0), false);
        for tile in &tiles {
            layer.draw(&tile.index()).unwrap();
        }

        let removed = layer.clear();
        assert_eq!(removed.len(), 4);
        assert!(layer.active().is_empty());
        assert_eq!(layer.cache().len(), 4);

        layer.draw(&tiles[0].index()).unwrap();
        let removed = layer.reset();
        assert_eq!(removed.len(), 1);
        assert!(layer.cache().is_empty());

        let saw_reset = std::iter::from_fn(|| events.try_recv().ok())
            .any(|event| event == LayerEvent::Reset);
        assert!(saw_reset);
    }

    #[test]
    fn test_set_source_resets_cache() {
        let mut layer = make_layer(unwrapped(), MockTileFetcher::default());
        layer.get_tiles(&view(0, 128.0, 128.0, 10.0, 10.0), false);
        assert_eq!(layer.cache().len(), 1);

        layer.set_source(Arc::new(|index: &TileIndex| format!("other/{}", index)));
        assert!(layer.cache().is_empty());

        let tiles = layer.get_tiles(&view(0, 128.0, 128.0, 10.0, 10.0), false);
        assert_eq!(tiles[0].source_key(), "other/0-0-0");
    }

    #[tokio::test]
    async fn test_evicted_completion_is_discarded() {
        let config = unwrapped().with_cache_size(1);
        let mut layer = make_layer(config, MockTileFetcher::default());

        // The second tile evicts the first while its fetch is in flight
        let indices = [TileIndex::new(0, 0, 1), TileIndex::new(1, 0, 1)];
        let summary = layer.load(&indices, CancellationToken::new()).await;

        assert_eq!(summary.requested, 2);
        assert_eq!(summary.ready, 1);
        assert_eq!(summary.discarded, 1);
        assert!(layer.tile(&indices[0]).is_none());
        assert_eq!(layer.tile(&indices[1]).unwrap().state(), TileState::Ready);
    }

    #[tokio::test]
    async fn test_cancelled_load_leaves_tiles_pending() {
        let mut layer =
            TileLayer::new(unwrapped(), key_source(), Arc::new(StalledFetcher)).unwrap();
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let indices = [TileIndex::new(0, 0, 1), TileIndex::new(1, 1, 1)];
        let summary = layer.load(&indices, cancellation).await;

        assert!(summary.was_cancelled);
        assert_eq!(summary.requested, 2);
        assert_eq!(summary.cancelled, 2);
        assert_eq!(layer.tile(&indices[0]).unwrap().state(), TileState::Pending);
    }

    #[tokio::test]
    async fn test_cancel_during_load() {
        let mut layer =
            TileLayer::new(unwrapped(), key_source(), Arc::new(StalledFetcher)).unwrap();
        let cancellation = CancellationToken::new();
        let trigger = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let summary = layer
            .load(&[TileIndex::new(0, 0, 0)], cancellation)
            .await;
        assert!(summary.was_cancelled);
        assert_eq!(summary.cancelled, 1);
    }
}
