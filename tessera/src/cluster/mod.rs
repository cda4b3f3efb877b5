//! Hierarchical point clustering
//!
//! [`ClusterGroup`] ingests points incrementally and answers, for any zoom
//! level, which multi-point clusters and which lone points are visible. The
//! per-level merge radius comes from a [`ClusterConfig`] threshold table.
//!
//! Clustering is greedy and online: a point joins the first cluster (in
//! creation order) within range, not necessarily the nearest one, so the
//! tree shape depends on insertion order.

mod config;
mod error;
mod group;
mod node;

pub use config::{ClusterConfig, DEFAULT_CLUSTER_MAX_LEVEL, DEFAULT_CLUSTER_RADIUS};
pub use error::ClusterError;
pub use group::{ClusterEvent, ClusterGroup};
pub use node::{ClusterNode, NodeId, PointId};
