// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector (edge) definitions for the graph.

use crate::emphasis::Emphasis;
use crate::geometry::Point;
use crate::node::NodeId;
use crate::port::PortKey;
use crate::router::{Endpoint, RoutedPath, Router};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(pub Uuid);

impl ConnectorId {
    /// Create a new random connector ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Visible path plus the wider invisible overlay used for hit testing.
///
/// Both always share the same waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPath {
    /// Drawn path
    pub main: RoutedPath,
    /// Hit-test path
    pub overlay: RoutedPath,
    /// Width of the drawn stroke
    pub stroke_width: f32,
    /// Width of the hit-test stroke
    pub overlay_width: f32,
}

impl ConnectorPath {
    /// A path that starts at `start` and goes nowhere yet
    pub fn new(start: Point, router: &Router) -> Self {
        Self {
            main: RoutedPath::empty(start),
            overlay: RoutedPath::empty(start),
            stroke_width: router.stroke_width,
            overlay_width: router.overlay_width,
        }
    }

    /// Route between two endpoints, replacing any previous geometry
    pub fn redraw(&mut self, router: &Router, start: &Endpoint, end: &Endpoint) {
        let path = router.route(start, end);
        self.overlay = path.clone();
        self.main = path;
        self.stroke_width = router.stroke_width;
        self.overlay_width = router.overlay_width;
    }

    /// Whether `point` falls on the hit-test overlay
    pub fn hit(&self, point: Point) -> bool {
        self.overlay.distance_to(point) <= self.overlay_width / 2.0
    }
}

/// A directed edge from an output port to an input port
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    /// Unique connector ID
    pub id: ConnectorId,
    /// Source (output) port
    pub src: PortKey,
    /// Destination (input) port
    pub dest: PortKey,
    pub(crate) path: ConnectorPath,
    pub(crate) emphasis: Emphasis,
}

impl Connector {
    pub(crate) fn new(id: ConnectorId, src: PortKey, dest: PortKey, path: ConnectorPath) -> Self {
        Self {
            id,
            src,
            dest,
            path,
            emphasis: Emphasis::Normal,
        }
    }

    /// Check if this connector involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.src.node == node_id || self.dest.node == node_id
    }

    /// Check if this connector involves a specific port
    pub fn involves_port(&self, port: &PortKey) -> bool {
        self.src == *port || self.dest == *port
    }

    /// Current geometry
    pub fn path(&self) -> &ConnectorPath {
        &self.path
    }

    /// Current presentation state
    pub fn emphasis(&self) -> Emphasis {
        self.emphasis
    }

    /// Whether selected
    pub fn is_selected(&self) -> bool {
        self.emphasis.is_selected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;

    #[test]
    fn test_main_and_overlay_share_waypoints() {
        let router = CanvasConfig::default().router();
        let mut path = ConnectorPath::new(Point::ZERO, &router);
        path.redraw(
            &router,
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(240.0, 96.0)),
        );
        assert_eq!(path.main.waypoints(), path.overlay.waypoints());
        assert!(path.overlay_width >= path.stroke_width * 6.0);

        // Redrawing replaces the old geometry
        path.redraw(
            &router,
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(48.0, 0.0)),
        );
        assert_eq!(path.main.end(), Point::new(48.0, 0.0));
        assert_eq!(path.main, path.overlay);
    }

    #[test]
    fn test_overlay_widens_hit_area() {
        let router = CanvasConfig::default().router();
        let mut path = ConnectorPath::new(Point::ZERO, &router);
        path.redraw(
            &router,
            &Endpoint::free(Point::new(0.0, 0.0)),
            &Endpoint::free(Point::new(240.0, 0.0)),
        );
        // Well outside the 1px stroke but inside the 13px overlay
        assert!(path.hit(Point::new(100.0, 5.0)));
        assert!(!path.hit(Point::new(100.0, 8.0)));
    }

    #[test]
    fn test_involves() {
        let a = NodeId::new();
        let b = NodeId::new();
        let router = CanvasConfig::default().router();
        let connector = Connector::new(
            ConnectorId::new(),
            PortKey::output(a, "out"),
            PortKey::input(b, "in"),
            ConnectorPath::new(Point::ZERO, &router),
        );
        assert!(connector.involves_node(a));
        assert!(connector.involves_node(b));
        assert!(!connector.involves_node(NodeId::new()));
        assert!(connector.involves_port(&PortKey::input(b, "in")));
        assert!(!connector.involves_port(&PortKey::input(a, "in")));
    }
}
