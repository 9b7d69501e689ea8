// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the canvas.

use crate::emphasis::Emphasis;
use crate::geometry::{Overhang, Point, Rect, Size};
use crate::graph::GraphError;
use crate::port::{Clearance, Port, PortDirection, PortKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Node geometry, derived from the canvas config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLayout {
    /// Side of one grid cell
    pub cell_size: f32,
    /// Body width
    pub body_width: f32,
    /// Body height with at most one port per side
    pub min_body_height: f32,
    /// How far ports stick out of the body
    pub port_overhang: f32,
    /// Width of a port box including its label
    pub port_width: f32,
}

impl NodeLayout {
    /// Vertical gap between consecutive port slots (two cells)
    pub fn slot_gap(&self) -> f32 {
        self.cell_size * 2.0
    }

    /// Offset of slot `index` from the body top
    pub fn slot_offset(&self, index: usize) -> f32 {
        self.slot_gap() * (index as f32 + 1.0)
    }

    /// Body height needed for `ports` ports on the taller side
    pub fn body_height(&self, ports: usize) -> f32 {
        self.min_body_height.max(self.slot_offset(ports))
    }
}

/// A placed node: a body with ordered input and output ports
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Display title
    pub title: String,
    /// Opaque payload owned by the embedding application
    pub attributes: serde_json::Value,
    position: Point,
    height: f32,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    emphasis: Emphasis,
    ready: bool,
    layout: NodeLayout,
}

impl Node {
    /// Create a node with its body's top-left corner at `position`
    pub fn new(id: NodeId, position: Point, layout: NodeLayout) -> Self {
        Self {
            id,
            title: String::new(),
            attributes: serde_json::Value::Null,
            position,
            height: layout.min_body_height,
            inputs: Vec::new(),
            outputs: Vec::new(),
            emphasis: Emphasis::Normal,
            ready: true,
            layout,
        }
    }

    /// Top-left corner of the body
    pub fn position(&self) -> Point {
        self.position
    }

    /// Body size
    pub fn size(&self) -> Size {
        Size::new(self.layout.body_width, self.height)
    }

    /// Body rectangle
    pub fn body(&self) -> Rect {
        Rect::new(self.position, self.size())
    }

    /// Sides on which ports stick out of the body
    pub fn overhang(&self) -> Overhang {
        Overhang {
            left: !self.inputs.is_empty(),
            right: !self.outputs.is_empty(),
        }
    }

    /// Geometry this node was laid out with
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Input ports in slot order
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// Output ports in slot order
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Get all ports, inputs first
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    fn side(&self, direction: PortDirection) -> &Vec<Port> {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    fn side_mut(&mut self, direction: PortDirection) -> &mut Vec<Port> {
        match direction {
            PortDirection::Input => &mut self.inputs,
            PortDirection::Output => &mut self.outputs,
        }
    }

    /// Find a port by direction and name
    pub fn find_port(&self, direction: PortDirection, name: &str) -> Option<&Port> {
        self.side(direction).iter().find(|p| p.name == name)
    }

    /// Get a port by key
    pub fn port(&self, key: &PortKey) -> Option<&Port> {
        if key.node != self.id {
            return None;
        }
        self.find_port(key.direction, &key.name)
    }

    pub(crate) fn port_mut(&mut self, key: &PortKey) -> Option<&mut Port> {
        if key.node != self.id {
            return None;
        }
        self.side_mut(key.direction)
            .iter_mut()
            .find(|p| p.name == key.name)
    }

    pub(crate) fn ports_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }

    /// Append an input port at the next free slot
    pub fn add_input(&mut self, name: impl Into<String>) -> Result<PortKey, GraphError> {
        self.add_port(PortDirection::Input, name)
    }

    /// Append an output port at the next free slot
    pub fn add_output(&mut self, name: impl Into<String>) -> Result<PortKey, GraphError> {
        self.add_port(PortDirection::Output, name)
    }

    /// Append a port; names are unique per direction
    pub fn add_port(
        &mut self,
        direction: PortDirection,
        name: impl Into<String>,
    ) -> Result<PortKey, GraphError> {
        let name = name.into();
        if self.find_port(direction, &name).is_some() {
            return Err(GraphError::DuplicatePortName {
                node: self.id,
                direction,
                name,
            });
        }

        let port = Port::new(self.id, name, direction);
        let key = port.key();
        self.side_mut(direction).push(port);
        self.relayout();
        Ok(key)
    }

    /// Remove an input port, closing the gap it leaves
    pub fn remove_input(&mut self, name: &str) -> Option<Port> {
        self.remove_port(PortDirection::Input, name)
    }

    /// Remove an output port, closing the gap it leaves
    pub fn remove_output(&mut self, name: &str) -> Option<Port> {
        self.remove_port(PortDirection::Output, name)
    }

    /// Remove a port and re-pack the remaining same-direction ports
    pub fn remove_port(&mut self, direction: PortDirection, name: &str) -> Option<Port> {
        let side = self.side_mut(direction);
        let index = side.iter().position(|p| p.name == name)?;
        let port = side.remove(index);
        self.relayout();
        Some(port)
    }

    /// Move the body's top-left corner; port anchors follow
    pub fn move_to(&mut self, position: Point) {
        self.position = position;
        self.relayout();
    }

    /// Bounding box of a port (label included)
    pub fn port_rect(&self, port: &Port) -> Rect {
        let layout = &self.layout;
        let y = self.position.y + layout.slot_offset(port.slot);
        let x = match port.direction {
            PortDirection::Input => self.position.x - layout.port_overhang,
            PortDirection::Output => {
                self.position.x + layout.body_width + layout.port_overhang - layout.port_width
            }
        };
        Rect::new(Point::new(x, y), Size::new(layout.port_width, layout.cell_size))
    }

    /// Recompute body height, port slots, anchors and clearances
    fn relayout(&mut self) {
        let layout = self.layout;
        self.height = layout.body_height(self.inputs.len().max(self.outputs.len()));

        let top = self.position.y;
        let bottom = top + self.height;
        let left = self.position.x - layout.port_overhang;
        let right = self.position.x + layout.body_width + layout.port_overhang;

        for (direction, x) in [(PortDirection::Input, left), (PortDirection::Output, right)] {
            for (slot, port) in self.side_mut(direction).iter_mut().enumerate() {
                let y = top + layout.slot_offset(slot) + layout.cell_size / 2.0;
                port.slot = slot;
                port.anchor = Point::new(x, y);
                port.clearance = Clearance {
                    above: y - top,
                    below: bottom - y,
                };
            }
        }
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

    /// Whether the node accepts pointer input (false until its creation callback settles)
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}
