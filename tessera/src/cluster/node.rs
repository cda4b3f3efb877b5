//! Cluster tree nodes.

use std::fmt;

use serde::Serialize;

use crate::coord::Point;

/// Handle to a node inside a [`ClusterGroup`](super::ClusterGroup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

/// Handle to a point inside a [`ClusterGroup`](super::ClusterGroup), in
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PointId(pub(crate) usize);

impl PointId {
    /// Zero-based insertion position.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A cluster at one level of the tree.
///
/// A node owns raw points directly and child nodes one level finer. Its
/// `count` is the total number of raw points beneath it and `center` their
/// running mean. The top aggregate has no level.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterNode {
    pub(crate) id: NodeId,
    pub(crate) level: Option<u8>,
    pub(crate) center: Point,
    pub(crate) count: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) points: Vec<PointId>,
}

impl ClusterNode {
    pub(crate) fn new(id: NodeId, level: Option<u8>) -> Self {
        Self {
            id,
            level,
            center: Point::default(),
            count: 0,
            parent: None,
            children: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Level of this node, `None` for the top aggregate.
    pub fn level(&self) -> Option<u8> {
        self.level
    }

    /// Mean position of every point beneath this node.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Number of raw points beneath this node.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child clusters one level finer.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Points owned directly by this node.
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    pub fn is_top(&self) -> bool {
        self.level.is_none()
    }

    /// Fold one more point into the running centroid.
    pub(crate) fn absorb(&mut self, point: Point) {
        let n = self.count as f64;
        self.center = Point::new(
            (self.center.x * n + point.x) / (n + 1.0),
            (self.center.y * n + point.y) / (n + 1.0),
        );
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_running_mean() {
        let mut node = ClusterNode::new(NodeId(0), Some(3));
        node.absorb(Point::new(0.0, 0.0));
        node.absorb(Point::new(2.0, 0.0));
        node.absorb(Point::new(1.0, 3.0));

        assert_eq!(node.count(), 3);
        assert!((node.center().x - 1.0).abs() < 1e-12);
        assert!((node.center().y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_node_has_no_level() {
        let node = ClusterNode::new(NodeId(0), None);
        assert!(node.is_top());
        assert_eq!(node.count(), 0);
        assert_eq!(NodeId(4).to_string(), "node#4");
    }
}
