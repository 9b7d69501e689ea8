// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::emphasis::Emphasis;
use crate::geometry::Point;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port, drawn on the left edge of a node
    Input,
    /// Output port, drawn on the right edge of a node
    Output,
}

/// Identity of a port: owning node, direction and a name unique per node and direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortKey {
    /// Owning node
    pub node: NodeId,
    /// Input or output side
    pub direction: PortDirection,
    /// Port name
    pub name: String,
}

impl PortKey {
    /// Key of an input port
    pub fn input(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            direction: PortDirection::Input,
            name: name.into(),
        }
    }

    /// Key of an output port
    pub fn output(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            direction: PortDirection::Output,
            name: name.into(),
        }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        write!(f, "{}:{}:{}", self.node, side, self.name)
    }
}

/// Vertical distance from a port's anchor to the top/bottom edge of its node's body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clearance {
    /// Anchor to body top
    pub above: f32,
    /// Anchor to body bottom
    pub below: f32,
}

/// A port on a node
#[derive(Debug, Clone)]
pub struct Port {
    /// Owning node
    pub node: NodeId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Slot index among same-direction ports
    pub(crate) slot: usize,
    pub(crate) anchor: Point,
    pub(crate) clearance: Clearance,
    pub(crate) emphasis: Emphasis,
}

impl Port {
    pub(crate) fn new(node: NodeId, name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            node,
            name: name.into(),
            direction,
            slot: 0,
            anchor: Point::ZERO,
            clearance: Clearance::default(),
            emphasis: Emphasis::Normal,
        }
    }

    /// Identity of this port
    pub fn key(&self) -> PortKey {
        PortKey {
            node: self.node,
            direction: self.direction,
            name: self.name.clone(),
        }
    }

    /// Whether `key` names this port
    pub fn matches(&self, key: &PortKey) -> bool {
        self.node == key.node && self.direction == key.direction && self.name == key.name
    }

    /// Slot index among same-direction ports of the node
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Where a connector terminates: left-edge centre for inputs, right-edge centre for outputs
    pub fn anchor_point(&self) -> Point {
        self.anchor
    }

    /// Distance from the anchor up to the node body's top edge
    pub fn vertical_clearance_above(&self) -> f32 {
        self.clearance.above
    }

    /// Distance from the anchor down to the node body's bottom edge
    pub fn vertical_clearance_below(&self) -> f32 {
        self.clearance.below
    }

    /// Both clearances
    pub fn clearance(&self) -> Clearance {
        self.clearance
    }

    /// Current presentation state
    pub fn emphasis(&self) -> Emphasis {
        self.emphasis
    }

    /// Whether selected
    pub fn is_selected(&self) -> bool {
        self.emphasis.is_selected()
    }

    /// Mark as selected
    pub fn select(&mut self) {
        self.emphasis.select();
    }

    /// Drop selection
    pub fn unselect(&mut self) {
        self.emphasis.unselect();
    }

    /// Highlight, unless selected
    pub fn highlight(&mut self) {
        self.emphasis.highlight();
    }

    /// Remove highlight, unless selected
    pub fn unhighlight(&mut self) {
        self.emphasis.unhighlight();
    }
}
