//! Tessera - tiled map layers and hierarchical point clustering
//!
//! The crate has two independent halves:
//!
//! - **Tiles**: [`layer::TileLayer`] selects the tiles of a quad pyramid that
//!   cover a viewport, fetches them concurrently through a
//!   [`tile::TileFetcher`] in centre-out order, caches them in a bounded
//!   [`cache::TileCache`] and tracks which ones are drawn.
//! - **Clustering**: [`cluster::ClusterGroup`] groups points incrementally so
//!   that every zoom level has a consistent set of clusters and lone points.
//!
//! Settings for both come from an INI file handled by [`config`], and
//! [`logging`] wires up `tracing` output.

pub mod cache;
pub mod cluster;
pub mod config;
pub mod coord;
pub mod layer;
pub mod logging;
pub mod tile;

/// Crate version, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
