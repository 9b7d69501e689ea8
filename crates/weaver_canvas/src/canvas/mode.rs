// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interaction state of the canvas.

use crate::connection::{ConnectorId, ConnectorPath};
use crate::geometry::{Point, Rect, Size};
use crate::node::NodeId;
use crate::port::PortKey;

/// What the user is currently doing. Exactly one mode is active at a time.
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    /// Nothing in progress
    #[default]
    Idle,
    /// A marker follows the pointer until a click places a node there
    Placing {
        /// Where the node will be placed
        marker: Rect,
    },
    /// An output port is bound and an unfinished connector follows the pointer
    Connecting(PendingConnection),
    /// A node is being dragged
    Dragging(NodeDrag),
}

impl InteractionMode {
    /// Whether nothing is in progress
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a connection is being drawn
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting(_))
    }

    /// Whether a node is being dragged
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging(_))
    }

    /// Whether a node is waiting to be placed
    pub fn is_placing(&self) -> bool {
        matches!(self, Self::Placing { .. })
    }
}

/// An unfinished connector
#[derive(Debug, Clone)]
pub struct PendingConnection {
    /// The bound output port
    pub source: PortKey,
    /// A hovered input port that would accept the connector
    pub candidate: Option<PortKey>,
    /// Current geometry, ending at the pointer or at the candidate
    pub path: ConnectorPath,
}

/// A node drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDrag {
    /// Dragged node
    pub node: NodeId,
    /// Position before grid adjustment, accumulating pointer deltas
    pub raw: Point,
    /// Whether the node has moved at all
    pub moved: bool,
}

/// The single selected element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected
    #[default]
    None,
    /// A node, with every connector attached to it
    Node(NodeId),
    /// A connector, with its two endpoint ports
    Connector(ConnectorId),
}

impl Selection {
    /// Selected node, if any
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    /// Selected connector, if any
    pub fn connector(self) -> Option<ConnectorId> {
        match self {
            Self::Connector(id) => Some(id),
            _ => None,
        }
    }
}

/// What lies under the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// Empty canvas
    Background,
    /// A node body
    Node(NodeId),
    /// A port
    Port(PortKey),
    /// A connector (its wide overlay)
    Connector(ConnectorId),
}

/// Keys the canvas reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasKey {
    /// Cancel placement or the pending connection
    Escape,
    /// Remove the selection
    Delete,
    /// Same as [`CanvasKey::Delete`]
    Backspace,
}

/// The visible window into the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Offset of the window's top-left corner
    pub scroll: Point,
    /// Window size
    pub size: Size,
}

impl Viewport {
    /// Visible area in canvas coordinates
    pub fn rect(&self) -> Rect {
        Rect::new(self.scroll, self.size)
    }
}
