//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`tiles`] - List the tiles covering a viewport in load order
//! - [`prefetch`] - Fetch a viewport and the levels below it over HTTP
//! - [`cluster`] - Cluster points from a CSV file
//! - [`config`] - Configuration management (show, path, init)

pub mod cluster;
pub mod common;
pub mod config;
pub mod prefetch;
pub mod tiles;
