// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer and keyboard handling.

use super::{
    Canvas, CanvasKey, HitTarget, InteractionMode, NodeDrag, Notification, PendingConnection,
    Selection,
};
use crate::connection::ConnectorPath;
use crate::geometry::{Overhang, Point, Size};
use crate::node::NodeId;
use crate::port::{Port, PortDirection, PortKey};
use crate::router::Endpoint;

/// Horizontal gap kept between the pointer and the tip of an unfinished connector
const POINTER_GAP: f32 = 2.0;

impl Canvas {
    /// Find the element at a canvas point: ports, then node bodies, then connectors
    pub fn hit_test(&self, point: Point) -> HitTarget {
        // Later nodes are drawn on top
        for node in self.graph.nodes().rev() {
            if let Some(port) = node.ports().find(|p| node.port_rect(p).contains(point)) {
                return HitTarget::Port(port.key());
            }
        }
        if let Some(node) = self.graph.nodes().rev().find(|n| n.body().contains(point)) {
            return HitTarget::Node(node.id);
        }
        if let Some(connector) = self.graph.connectors().find(|c| c.path().hit(point)) {
            return HitTarget::Connector(connector.id);
        }
        HitTarget::Background
    }

    /// The pointer moved to a canvas point
    pub fn pointer_moved(&mut self, point: Point) {
        self.pointer = point;
        if let InteractionMode::Placing { marker } = &mut self.mode {
            let centred = point.translate(-marker.size.width / 2.0, -marker.size.height / 2.0);
            marker.min = self
                .grid
                .adjust_position(centred, marker.size, Overhang::default());
            return;
        }
        self.redraw_pending();
    }

    /// The pointer entered an element (or left every element, with `None`)
    pub fn hover(&mut self, target: Option<HitTarget>) {
        if self.hovered == target {
            return;
        }
        self.hovered = target;

        let candidate = match (&self.mode, &self.hovered) {
            (InteractionMode::Connecting(pending), Some(HitTarget::Port(key)))
                if self.accepts_connection(&pending.source, key) =>
            {
                Some(key.clone())
            }
            _ => None,
        };
        if let InteractionMode::Connecting(pending) = &mut self.mode {
            pending.candidate = candidate;
        }
        self.redraw_pending();
        self.refresh_emphasis();
    }

    /// A click on an element. Any click gives the canvas keyboard focus.
    pub fn click(&mut self, target: HitTarget) {
        self.focused = true;
        match self.mode {
            InteractionMode::Placing { marker } => {
                self.mode = InteractionMode::Idle;
                if let Err(err) = self.add_node(marker.min) {
                    tracing::warn!("Failed to place node: {}", err);
                }
            }
            InteractionMode::Connecting(_) => self.click_while_connecting(target),
            InteractionMode::Dragging(_) => {}
            InteractionMode::Idle => self.click_idle(target),
        }
        self.refresh_emphasis();
    }

    fn click_idle(&mut self, target: HitTarget) {
        match target {
            HitTarget::Background => self.selection = Selection::None,
            HitTarget::Node(id) => {
                if self.is_ready(id) {
                    self.select_node(id);
                } else {
                    tracing::debug!("Ignoring click on node {} until it is ready", id);
                }
            }
            HitTarget::Port(key) => {
                if key.direction == PortDirection::Output && self.is_ready(key.node) {
                    self.begin_connection(key);
                }
            }
            HitTarget::Connector(id) => {
                if self.graph.connector(id).is_some() {
                    self.selection = Selection::Connector(id);
                }
            }
        }
    }

    fn click_while_connecting(&mut self, target: HitTarget) {
        match target {
            HitTarget::Port(key) if key.direction == PortDirection::Input => {
                self.complete_connection(key);
            }
            // The pending source stays selected through the mode
            HitTarget::Background => self.selection = Selection::None,
            _ => tracing::debug!("Ignoring click while a connection is in progress"),
        }
    }

    /// A double click; requests editing of a ready node
    pub fn double_click(&mut self, target: HitTarget) {
        let HitTarget::Node(id) = target else {
            return;
        };
        let (Some(handler), Some(node)) = (
            self.handlers.node_edit_requested.as_mut(),
            self.graph.node(id),
        ) else {
            return;
        };
        if node.is_ready() {
            tracing::debug!("Edit requested for node {}", id);
            handler(node);
        }
    }

    fn select_node(&mut self, id: NodeId) {
        self.selection = Selection::Node(id);
        if let (Some(handler), Some(node)) =
            (self.handlers.node_selected.as_mut(), self.graph.node(id))
        {
            handler(node);
        }
    }

    fn begin_connection(&mut self, source: PortKey) {
        let Some(anchor) = self.graph.port(&source).map(Port::anchor_point) else {
            return;
        };
        tracing::debug!("Connection started at {}", source);
        self.selection = Selection::None;
        self.mode = InteractionMode::Connecting(PendingConnection {
            source,
            candidate: None,
            path: ConnectorPath::new(anchor, self.graph.router()),
        });
        self.redraw_pending();
    }

    fn complete_connection(&mut self, dest: PortKey) {
        let InteractionMode::Connecting(pending) = &self.mode else {
            return;
        };
        let source = pending.source.clone();
        if !self.is_ready(dest.node) {
            tracing::debug!("Ignoring connection to node {} until it is ready", dest.node);
            return;
        }
        match self.connect(&source, &dest) {
            Ok(id) => {
                self.mode = InteractionMode::Idle;
                self.selection = Selection::Connector(id);
            }
            Err(err) => tracing::debug!("Connection refused: {}", err),
        }
    }

    /// Whether the pending connection could end at `dest`
    fn accepts_connection(&self, source: &PortKey, dest: &PortKey) -> bool {
        self.is_ready(dest.node) && self.check_connection(source, dest).is_ok()
    }

    /// Re-route the unfinished connector to the candidate port or the pointer
    pub(super) fn redraw_pending(&mut self) {
        let InteractionMode::Connecting(pending) = &mut self.mode else {
            return;
        };
        let Some(start) = self.graph.port(&pending.source).map(Endpoint::from) else {
            return;
        };
        let end = pending
            .candidate
            .as_ref()
            .and_then(|key| self.graph.port(key))
            .map(Endpoint::from)
            .unwrap_or_else(|| Endpoint::free(self.pointer.translate(-POINTER_GAP, 0.0)));
        pending.path.redraw(self.graph.router(), &start, &end);
    }

    /// Cancel placement or the pending connection. Returns whether anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.mode {
            InteractionMode::Placing { .. } => tracing::debug!("Placement cancelled"),
            InteractionMode::Connecting(_) => tracing::debug!("Connection cancelled"),
            InteractionMode::Idle | InteractionMode::Dragging(_) => return false,
        }
        self.mode = InteractionMode::Idle;
        self.refresh_emphasis();
        true
    }

    /// A key press. Ignored unless the canvas has focus; returns whether it was handled.
    pub fn handle_key(&mut self, key: CanvasKey) -> bool {
        if !self.focused {
            return false;
        }
        match key {
            CanvasKey::Escape => self.cancel(),
            CanvasKey::Delete | CanvasKey::Backspace => self.delete_selected(),
        }
    }

    /// Start dragging a node. Refused unless idle and the node is ready.
    pub fn begin_drag(&mut self, id: NodeId) -> bool {
        if !self.mode.is_idle() {
            tracing::debug!("Ignoring drag of node {} during another gesture", id);
            return false;
        }
        let Some(node) = self.graph.node(id) else {
            return false;
        };
        if !node.is_ready() {
            return false;
        }
        self.mode = InteractionMode::Dragging(NodeDrag {
            node: id,
            raw: node.position(),
            moved: false,
        });
        true
    }

    /// Move the dragged node by a pointer delta
    pub fn drag_by(&mut self, dx: f32, dy: f32) {
        let InteractionMode::Dragging(drag) = &mut self.mode else {
            return;
        };
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        drag.raw = drag.raw.translate(dx, dy);
        drag.moved = true;
        let (id, raw) = (drag.node, drag.raw);

        let Some(node) = self.graph.node(id) else {
            return;
        };
        let size = node.size();
        let position = self.grid.adjust_position(raw, size, node.overhang());

        if self.selection != Selection::Node(id) {
            self.select_node(id);
        }
        if let Err(err) = self.graph.move_node(id, position) {
            tracing::warn!("Failed to move node: {}", err);
            return;
        }
        self.auto_scroll(position, size);
        self.refresh_emphasis();
    }

    /// Finish the drag and report the move
    pub fn end_drag(&mut self) {
        let InteractionMode::Dragging(drag) = self.mode else {
            return;
        };
        self.mode = InteractionMode::Idle;
        if drag.moved {
            tracing::info!("Node {} moved", drag.node);
            self.notify_node(Notification::NodeMoved(drag.node));
        }
        self.refresh_emphasis();
    }

    /// Nudge the viewport one step toward any edge the box at `position` comes near
    fn auto_scroll(&mut self, position: Point, size: Size) {
        let step = self.config.auto_scroll_step();
        let view = self.viewport.rect();

        let dx = if position.x - step < view.left() {
            -step
        } else if position.x + size.width + step > view.right() {
            step
        } else {
            0.0
        };
        let dy = if position.y - step < view.top() {
            -step
        } else if position.y + size.height + step > view.bottom() {
            step
        } else {
            0.0
        };

        if dx != 0.0 || dy != 0.0 {
            self.scroll_to(self.viewport.scroll.translate(dx, dy));
        }
    }
}
