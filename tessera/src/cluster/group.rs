//! Incremental hierarchical point clustering.
//!
//! Points are inserted one at a time. Each insertion walks from the finest
//! level to the coarsest and stops at the first level where the point can
//! join something:
//!
//! 1. an existing cluster at that level whose centroid is within the
//!    level's threshold (the first such cluster in creation order), or
//! 2. a point that is still unclustered at that level (again first-fit),
//!    which pairs up with the new point into a fresh two-point cluster.
//!
//! At every finer level passed on the way, the point is recorded as
//! unclustered. A point that joins nothing is owned by the top aggregate.
//!
//! The result is one consistent tree: a point clustered at level `z` is
//! clustered at every coarser level, and at each level every point is
//! counted exactly once, either in a cluster or as an unclustered point.

use tokio::sync::broadcast;
use tracing::debug;

use super::{ClusterConfig, ClusterError, ClusterNode, NodeId, PointId};
use crate::coord::Point;

/// Capacity of the cluster event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

const TOP: NodeId = NodeId(0);

/// Notification emitted after every accepted point.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterEvent {
    PointAdded {
        id: PointId,
        /// Total number of points after the insertion.
        total: usize,
        /// Finest level at which the point is clustered, if any.
        clustered_at: Option<u8>,
    },
}

/// A zoom-dependent cluster tree over a growing point set.
///
/// # Example
///
/// ```
/// use tessera::cluster::ClusterGroup;
/// use tessera::coord::Point;
///
/// let mut group = ClusterGroup::default();
/// group.add_point(Point::new(0.0, 0.0)).unwrap();
/// group.add_point(Point::new(50.0, 50.0)).unwrap();
/// group.add_point(Point::new(1.0, 0.0)).unwrap();
///
/// assert_eq!(group.count(), 3);
/// assert_eq!(group.clusters(0).len(), 1);
/// assert_eq!(group.points(0), vec![Point::new(50.0, 50.0)]);
/// ```
pub struct ClusterGroup {
    config: ClusterConfig,
    nodes: Vec<ClusterNode>,
    points: Vec<Point>,
    owners: Vec<NodeId>,
    /// Cluster nodes per level, in creation order.
    clusters: Vec<Vec<NodeId>>,
    /// Unclustered points per level, in insertion order.
    singles: Vec<Vec<PointId>>,
    events: broadcast::Sender<ClusterEvent>,
}

impl Default for ClusterGroup {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}

impl ClusterGroup {
    pub fn new(config: ClusterConfig) -> Self {
        let levels = config.max_level() as usize + 1;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            nodes: vec![ClusterNode::new(TOP, None)],
            points: Vec::new(),
            owners: Vec::new(),
            clusters: vec![Vec::new(); levels],
            singles: vec![Vec::new(); levels],
            events,
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Subscribe to insertion notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.events.subscribe()
    }

    /// Insert a point.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NonFinite`] for NaN or infinite coordinates;
    /// the group is left unchanged.
    pub fn add_point(&mut self, point: Point) -> Result<PointId, ClusterError> {
        if !point.is_finite() {
            return Err(ClusterError::NonFinite {
                x: point.x,
                y: point.y,
            });
        }

        let id = PointId(self.points.len());
        self.points.push(point);
        self.owners.push(TOP);

        let mut clustered_at = None;
        for level in (0..=self.config.max_level()).rev() {
            let z = level as usize;
            let limit = self.config.threshold(level).powi(2);

            if let Some(cluster) = self.first_cluster_within(z, point, limit) {
                self.nodes[cluster.0].points.push(id);
                self.owners[id.0] = cluster;
                self.absorb_upwards(cluster, point);
                clustered_at = Some(level);
                break;
            }

            if let Some(single) = self.first_single_within(z, point, limit) {
                self.pair(single, id, level);
                clustered_at = Some(level);
                break;
            }

            self.singles[z].push(id);
        }

        if clustered_at.is_none() {
            self.nodes[TOP.0].points.push(id);
            self.absorb_upwards(TOP, point);
        }

        debug!(point = %point, ?clustered_at, total = self.count(), "Point added");
        let _ = self.events.send(ClusterEvent::PointAdded {
            id,
            total: self.count(),
            clustered_at,
        });
        Ok(id)
    }

    /// Insert many points, stopping at the first rejected one.
    pub fn extend<I>(&mut self, points: I) -> Result<usize, ClusterError>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut added = 0;
        for point in points {
            self.add_point(point)?;
            added += 1;
        }
        Ok(added)
    }

    /// Multi-point clusters visible at `level`.
    ///
    /// Levels past the configured maximum are clamped to it.
    pub fn clusters(&self, level: u8) -> Vec<&ClusterNode> {
        self.clusters[self.clamp(level)]
            .iter()
            .map(|id| &self.nodes[id.0])
            .filter(|node| node.count > 1)
            .collect()
    }

    /// Points that are not part of any cluster at `level`.
    pub fn points(&self, level: u8) -> Vec<Point> {
        self.singles[self.clamp(level)]
            .iter()
            .map(|id| self.points[id.0])
            .collect()
    }

    /// Total number of inserted points.
    pub fn count(&self) -> usize {
        self.nodes[TOP.0].count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The aggregate owning every coarsest-level cluster and every point
    /// that never clustered.
    pub fn top_level(&self) -> &ClusterNode {
        &self.nodes[TOP.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&ClusterNode> {
        self.nodes.get(id.0)
    }

    pub fn point(&self, id: PointId) -> Option<Point> {
        self.points.get(id.0).copied()
    }

    /// Every raw point beneath a node.
    pub fn members(&self, id: NodeId) -> Vec<Point> {
        let mut members = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.0) else {
                continue;
            };
            members.extend(node.points.iter().map(|p| self.points[p.0]));
            stack.extend(node.children.iter().copied());
        }
        members
    }

    /// Merge threshold at `level`.
    pub fn threshold(&self, level: u8) -> f64 {
        self.config.threshold(level)
    }

    fn clamp(&self, level: u8) -> usize {
        level.min(self.config.max_level()) as usize
    }

    fn first_cluster_within(&self, level: usize, point: Point, limit: f64) -> Option<NodeId> {
        self.clusters[level]
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].center.distance_sq(&point) <= limit)
    }

    fn first_single_within(&self, level: usize, point: Point, limit: f64) -> Option<PointId> {
        self.singles[level]
            .iter()
            .copied()
            .find(|id| self.points[id.0].distance_sq(&point) <= limit)
    }

    /// Pair an unclustered point with a new one into a cluster at `level`.
    ///
    /// The partner leaves its owner and the unclustered lists between the
    /// owner's level and `level`. Single-child nodes bridge the new cluster
    /// to the owner so every level in between has a node covering both.
    fn pair(&mut self, partner: PointId, new: PointId, level: u8) {
        let owner = self.owners[partner.0];
        let first = self.nodes[owner.0].level.map_or(0, |l| l as usize + 1);

        self.nodes[owner.0].points.retain(|p| *p != partner);
        for z in first..=level as usize {
            self.singles[z].retain(|p| *p != partner);
        }

        let cluster = self.push_node(level as usize);
        self.nodes[cluster.0].points = vec![partner, new];
        self.nodes[cluster.0].absorb(self.points[partner.0]);
        self.nodes[cluster.0].absorb(self.points[new.0]);
        self.owners[partner.0] = cluster;
        self.owners[new.0] = cluster;

        let mut child = cluster;
        for z in (first..level as usize).rev() {
            let bridge = self.push_node(z);
            self.nodes[bridge.0].center = self.nodes[child.0].center;
            self.nodes[bridge.0].count = self.nodes[child.0].count;
            self.nodes[bridge.0].children.push(child);
            self.nodes[child.0].parent = Some(bridge);
            child = bridge;
        }

        self.nodes[child.0].parent = Some(owner);
        self.nodes[owner.0].children.push(child);
        self.absorb_upwards(owner, self.points[new.0]);
    }

    fn push_node(&mut self, level: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ClusterNode::new(id, Some(level as u8)));
        self.clusters[level].push(id);
        id
    }

    /// Add a point to a node's statistics and those of all its ancestors.
    fn absorb_upwards(&mut self, start: NodeId, point: Point) {
        let mut current = Some(start);
        while let Some(id) = current {
            let node = &mut self.nodes[id.0];
            node.absorb(point);
            current = node.parent;
        }
    }
}
