//! Tiles, tile sources and tile fetchers
//!
//! A [`Tile`] is the unit of fetchable map data: an index, a pixel size, the
//! source key resolved through a [`TileSource`], and a fetch state. Payloads
//! arrive asynchronously through a [`TileFetcher`].

mod error;
mod fetcher;
mod source;
mod state;

pub use error::FetchError;
pub use fetcher::{BoxFuture, HttpTileFetcher, TileFetcher, DEFAULT_FETCH_TIMEOUT_SECS};
pub use source::{TileSource, UrlTemplateSource};
pub use state::{Tile, TileSize, TileState};

#[cfg(test)]
pub use fetcher::tests::MockTileFetcher;
