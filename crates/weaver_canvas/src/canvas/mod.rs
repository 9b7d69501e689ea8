// SPDX-License-Identifier: MIT OR Apache-2.0
//! The canvas controller.
//!
//! [`Canvas`] owns the graph, the interaction mode and the selection. Every gesture and
//! every public mutation goes through it, and after each one the presentation state of
//! nodes, ports and connectors is recomputed from the selection, the mode and the hovered
//! element. Pointer handling lives in `input`, callback plumbing in `notify`.

mod input;
mod mode;
mod notify;

pub use mode::{
    CanvasKey, HitTarget, InteractionMode, NodeDrag, PendingConnection, Selection, Viewport,
};
pub use notify::{
    CallbackError, CallbackFuture, ConnectorCallback, NodeCallback, NodeEventCallback,
    NodeRemovedCallback, Notification,
};

use crate::config::CanvasConfig;
use crate::connection::{Connector, ConnectorId};
use crate::document::{
    ConnectorDocument, DocumentError, GraphDocument, NodeDocument, PortDocument, ScrollPosition,
    WindowDocument,
};
use crate::emphasis::Emphasis;
use crate::geometry::{clamp, Grid, Overhang, Point, Rect, Size};
use crate::graph::{ConnectionError, Graph, GraphError};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortDirection, PortKey};
use notify::{CanvasHandlers, NotificationQueue};
use std::collections::{HashMap, HashSet};

/// Interactive node-graph editing surface
pub struct Canvas {
    config: CanvasConfig,
    grid: Grid,
    graph: Graph,
    mode: InteractionMode,
    selection: Selection,
    hovered: Option<HitTarget>,
    pointer: Point,
    viewport: Viewport,
    focused: bool,
    /// Source node -> destination nodes it may connect to. `None` allows every pair.
    valid_connections: Option<HashMap<NodeId, HashSet<NodeId>>>,
    handlers: CanvasHandlers,
    notifications: NotificationQueue,
}

impl Canvas {
    /// Create an empty canvas
    pub fn new(config: CanvasConfig) -> Self {
        let grid = config.grid();
        let graph = Graph::new(&config);
        let viewport = Viewport {
            scroll: Point::ZERO,
            size: Size::new(config.width, config.height),
        };
        Self {
            config,
            grid,
            graph,
            mode: InteractionMode::Idle,
            selection: Selection::None,
            hovered: None,
            pointer: Point::ZERO,
            viewport,
            focused: false,
            valid_connections: None,
            handlers: CanvasHandlers::default(),
            notifications: NotificationQueue::default(),
        }
    }

    /// Canvas settings
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// The placement grid
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Nodes and connectors
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Current interaction mode
    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    /// Current selection
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The selected node, if a node is selected
    pub fn selected_node(&self) -> Option<&Node> {
        self.graph.node(self.selection.node()?)
    }

    /// Element under the pointer, as last reported by [`Canvas::hover`]
    pub fn hovered(&self) -> Option<&HitTarget> {
        self.hovered.as_ref()
    }

    /// Last reported pointer position
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// The visible window
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Resize the visible window
    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport.size = size;
        self.scroll_to(self.viewport.scroll);
    }

    /// Scroll the window, keeping it inside the canvas
    pub fn scroll_to(&mut self, scroll: Point) {
        let max_x = (self.config.width - self.viewport.size.width).max(0.0);
        let max_y = (self.config.height - self.viewport.size.height).max(0.0);
        self.viewport.scroll = Point::new(clamp(scroll.x, 0.0, max_x), clamp(scroll.y, 0.0, max_y));
    }

    /// Whether keyboard input is routed to this canvas
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Route keyboard input to this canvas
    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Stop routing keyboard input to this canvas
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Restrict connections to the given source -> destinations pairs
    pub fn set_valid_connections(&mut self, valid: HashMap<NodeId, HashSet<NodeId>>) {
        self.valid_connections = Some(valid);
    }

    /// Allow connections from `src` to `dest`, starting an allow-list if there is none
    pub fn allow_connection(&mut self, src: NodeId, dest: NodeId) {
        self.valid_connections
            .get_or_insert_with(HashMap::new)
            .entry(src)
            .or_default()
            .insert(dest);
    }

    /// Allow connections between any two nodes again
    pub fn clear_valid_connections(&mut self) {
        self.valid_connections = None;
    }

    /// Whether the allow-list accepts a connector from `src` to `dest`
    pub fn is_connection_allowed(&self, src: NodeId, dest: NodeId) -> bool {
        match &self.valid_connections {
            None => true,
            Some(valid) => valid.get(&src).is_some_and(|dests| dests.contains(&dest)),
        }
    }

    /// Check every rule a new connector must satisfy
    pub fn check_connection(&self, src: &PortKey, dest: &PortKey) -> Result<(), ConnectionError> {
        self.graph.validate_connection(src, dest)?;
        if !self.is_connection_allowed(src.node, dest.node) {
            return Err(ConnectionError::NotAllowed {
                src: src.node,
                dest: dest.node,
            });
        }
        Ok(())
    }

    /// Called after a node is placed; the node stays inert until the returned future settles
    pub fn set_node_added_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Node) -> CallbackFuture + 'static,
    {
        self.handlers.node_added = Some(Box::new(handler));
    }

    /// Called after a node is removed
    pub fn set_node_deleted_handler<F>(&mut self, handler: F)
    where
        F: FnMut(NodeId) -> CallbackFuture + 'static,
    {
        self.handlers.node_deleted = Some(Box::new(handler));
    }

    /// Called when a node drag ends
    pub fn set_node_moved_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Node) -> CallbackFuture + 'static,
    {
        self.handlers.node_moved = Some(Box::new(handler));
    }

    /// Called after a port is added to or removed from a node
    pub fn set_node_io_changed_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Node) -> CallbackFuture + 'static,
    {
        self.handlers.node_io_changed = Some(Box::new(handler));
    }

    /// Called when a node is double-clicked
    pub fn set_node_edit_requested_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Node) + 'static,
    {
        self.handlers.node_edit_requested = Some(Box::new(handler));
    }

    /// Called when a node becomes selected
    pub fn set_node_selected_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Node) + 'static,
    {
        self.handlers.node_selected = Some(Box::new(handler));
    }

    /// Called after a connector is created
    pub fn set_connector_added_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&PortKey, &PortKey, ConnectorId) -> CallbackFuture + 'static,
    {
        self.handlers.connector_added = Some(Box::new(handler));
    }

    /// Called after a connector is removed on its own (not as part of a node removal)
    pub fn set_connector_deleted_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&PortKey, &PortKey, ConnectorId) -> CallbackFuture + 'static,
    {
        self.handlers.connector_deleted = Some(Box::new(handler));
    }

    /// Process callback futures that have completed, without waiting. Returns how many settled.
    pub fn pump(&mut self) -> usize {
        let mut settled = 0;
        while let Some((notification, result)) = self.notifications.poll_ready() {
            self.on_settled(notification, result);
            settled += 1;
        }
        settled
    }

    /// Wait for every queued callback future to complete
    pub async fn settle(&mut self) {
        while let Some((notification, result)) = self.notifications.next().await {
            self.on_settled(notification, result);
        }
    }

    /// Number of callback futures still running
    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    fn on_settled(&mut self, notification: Notification, result: Result<(), CallbackError>) {
        if let Err(err) = result {
            tracing::warn!("{:?} notification failed: {}", notification, err);
        }
        if let Notification::NodeAdded(id) = notification {
            if let Some(node) = self.graph.node_mut(id) {
                node.set_ready(true);
                tracing::debug!("Node {} is ready", id);
            }
        }
    }

    /// Queue a node notification; returns whether a handler was registered
    fn notify_node(&mut self, notification: Notification) -> bool {
        let (handler, id) = match notification {
            Notification::NodeAdded(id) => (self.handlers.node_added.as_mut(), id),
            Notification::NodeMoved(id) => (self.handlers.node_moved.as_mut(), id),
            Notification::NodeIoChanged(id) => (self.handlers.node_io_changed.as_mut(), id),
            _ => return false,
        };
        let (Some(handler), Some(node)) = (handler, self.graph.node(id)) else {
            return false;
        };
        let future = handler(node);
        self.notifications.push(notification, future);
        true
    }

    fn notify_node_deleted(&mut self, id: NodeId) {
        if let Some(handler) = self.handlers.node_deleted.as_mut() {
            let future = handler(id);
            self.notifications.push(Notification::NodeDeleted(id), future);
        }
    }

    fn notify_connector_added(&mut self, id: ConnectorId) {
        let (Some(handler), Some(connector)) =
            (self.handlers.connector_added.as_mut(), self.graph.connector(id))
        else {
            return;
        };
        let future = handler(&connector.src, &connector.dest, id);
        self.notifications.push(Notification::ConnectorAdded(id), future);
    }

    fn notify_connector_deleted(&mut self, connector: &Connector) {
        if let Some(handler) = self.handlers.connector_deleted.as_mut() {
            let future = handler(&connector.src, &connector.dest, connector.id);
            self.notifications
                .push(Notification::ConnectorDeleted(connector.id), future);
        }
    }

    /// Enter placement mode. Refused while connecting or dragging.
    pub fn place_new_node(&mut self) -> bool {
        self.focused = true;
        match self.mode {
            InteractionMode::Idle => {
                let layout = self.graph.layout();
                let size = Size::new(layout.body_width, layout.min_body_height);
                let min = self.marker_position(size);
                self.mode = InteractionMode::Placing {
                    marker: Rect::new(min, size),
                };
                true
            }
            InteractionMode::Placing { .. } => true,
            _ => {
                tracing::debug!("Placement refused while another gesture is in progress");
                false
            }
        }
    }

    /// Grid-adjusted top-left corner of a box of `size` centred on the pointer
    fn marker_position(&self, size: Size) -> Point {
        let centred = self
            .pointer
            .translate(-size.width / 2.0, -size.height / 2.0);
        self.grid
            .adjust_position(centred, size, Overhang::default())
    }

    /// Add an empty node near `position`, snapped into the grid.
    ///
    /// If a node-added handler is registered the node ignores pointer input until the
    /// handler's future settles.
    pub fn add_node(&mut self, position: Point) -> Result<NodeId, CanvasError> {
        let layout = self.graph.layout();
        let size = Size::new(layout.body_width, layout.min_body_height);
        let position = self
            .grid
            .adjust_position(position, size, Overhang::default());
        let id = self.graph.create_node(NodeId::new(), position)?;
        tracing::info!("Node {} placed at ({}, {})", id, position.x, position.y);

        let waiting = self.notify_node(Notification::NodeAdded(id));
        if let Some(node) = self.graph.node_mut(id) {
            node.set_ready(!waiting);
        }
        self.refresh_emphasis();
        Ok(id)
    }

    /// Set a node's title
    pub fn set_node_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<(), CanvasError> {
        self.graph
            .node_mut(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .title = title.into();
        Ok(())
    }

    /// Replace a node's opaque attributes
    pub fn set_node_attributes(
        &mut self,
        id: NodeId,
        attributes: serde_json::Value,
    ) -> Result<(), CanvasError> {
        self.graph
            .node_mut(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .attributes = attributes;
        Ok(())
    }

    /// Remove a node and every connector attached to it
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let (node, connectors) = self.graph.remove_node(id)?;
        tracing::info!("Node {} removed with {} connectors", id, connectors.len());
        self.notify_node_deleted(id);
        self.selection = Selection::None;
        self.drop_stale_state();
        self.refresh_emphasis();
        Some(node)
    }

    /// Remove a connector
    pub fn remove_connector(&mut self, id: ConnectorId) -> Option<Connector> {
        let connector = self.graph.disconnect(id)?;
        tracing::info!("Connector {} removed ({} -> {})", id, connector.src, connector.dest);
        self.notify_connector_deleted(&connector);
        self.drop_stale_state();
        self.refresh_emphasis();
        Some(connector)
    }

    /// Remove the selected node or connector. Returns false when nothing is selected.
    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Selection::Node(id) => self.remove_node(id).is_some(),
            Selection::Connector(id) => self.remove_connector(id).is_some(),
            Selection::None => {
                tracing::debug!("Nothing selected to delete");
                false
            }
        }
    }

    /// Create a connector between two ports
    pub fn connect(&mut self, src: &PortKey, dest: &PortKey) -> Result<ConnectorId, ConnectionError> {
        self.check_connection(src, dest)?;
        let id = self.graph.connect(src, dest)?;
        tracing::info!("Connector {} added ({} -> {})", id, src, dest);
        self.notify_connector_added(id);
        self.refresh_emphasis();
        Ok(id)
    }

    /// Add a port to a node
    pub fn add_port(
        &mut self,
        node: NodeId,
        direction: PortDirection,
        name: impl Into<String>,
    ) -> Result<PortKey, CanvasError> {
        let key = self.graph.add_port(node, direction, name)?;
        tracing::info!("Port {} added", key);
        // The node may have grown under a pending connector's source
        self.redraw_pending();
        self.notify_node(Notification::NodeIoChanged(node));
        self.refresh_emphasis();
        Ok(key)
    }

    /// Remove a port; its connectors are removed first, one by one
    pub fn remove_port(&mut self, key: &PortKey) -> Result<(), CanvasError> {
        let removed = self.graph.remove_port(key)?;
        for connector in &removed {
            tracing::info!("Connector {} removed with port {}", connector.id, key);
            self.notify_connector_deleted(connector);
        }
        tracing::info!("Port {} removed", key);
        self.notify_node(Notification::NodeIoChanged(key.node));
        self.drop_stale_state();
        self.refresh_emphasis();
        Ok(())
    }

    fn selected_node_id(&self) -> Result<NodeId, CanvasError> {
        self.selection.node().ok_or(CanvasError::NoNodeSelected)
    }

    /// Add an input port to the selected node
    pub fn add_input(&mut self, name: impl Into<String>) -> Result<PortKey, CanvasError> {
        let node = self.selected_node_id()?;
        self.add_port(node, PortDirection::Input, name)
    }

    /// Add an output port to the selected node
    pub fn add_output(&mut self, name: impl Into<String>) -> Result<PortKey, CanvasError> {
        let node = self.selected_node_id()?;
        self.add_port(node, PortDirection::Output, name)
    }

    /// Remove an input port from the selected node
    pub fn remove_input(&mut self, name: &str) -> Result<(), CanvasError> {
        let node = self.selected_node_id()?;
        self.remove_port(&PortKey::input(node, name))
    }

    /// Remove an output port from the selected node
    pub fn remove_output(&mut self, name: &str) -> Result<(), CanvasError> {
        let node = self.selected_node_id()?;
        self.remove_port(&PortKey::output(node, name))
    }

    /// Export nodes, connectors and the scroll offset
    pub fn to_graph(&self) -> GraphDocument {
        let ports = |ports: &[Port]| -> Vec<PortDocument> {
            ports.iter().map(|port| port.key().into()).collect()
        };
        let nodes = self
            .graph
            .nodes()
            .map(|node| NodeDocument {
                id: node.id,
                position: node.position(),
                input_ports: ports(node.inputs()),
                output_ports: ports(node.outputs()),
                title: node.title.clone(),
                attributes: node.attributes.clone(),
            })
            .collect();
        let connectors = self
            .graph
            .connectors()
            .map(|connector| ConnectorDocument {
                id: Some(connector.id),
                src: connector.src.clone().into(),
                dest: connector.dest.clone().into(),
            })
            .collect();

        GraphDocument {
            nodes,
            connectors,
            window: WindowDocument {
                scroll_position: ScrollPosition {
                    left: self.viewport.scroll.x,
                    top: self.viewport.scroll.y,
                },
            },
        }
    }

    /// Replace the canvas contents with a document.
    ///
    /// Existing nodes are dropped without notifications. A document whose port entries
    /// contradict their place is rejected before anything is cleared; later errors leave
    /// whatever was rebuilt before the failure.
    pub fn from_graph(&mut self, doc: &GraphDocument) -> Result<(), DocumentError> {
        doc.validate()?;
        self.mode = InteractionMode::Idle;
        self.selection = Selection::None;
        self.hovered = None;
        self.graph.clear();

        for node_doc in &doc.nodes {
            let id = self.graph.create_node(node_doc.id, node_doc.position)?;
            if let Some(node) = self.graph.node_mut(id) {
                node.title = node_doc.title.clone();
                node.attributes = node_doc.attributes.clone();
            }
            for port in &node_doc.input_ports {
                self.graph
                    .add_port(id, PortDirection::Input, port.port_name.clone())?;
            }
            for port in &node_doc.output_ports {
                self.graph
                    .add_port(id, PortDirection::Output, port.port_name.clone())?;
            }
        }

        for connector in &doc.connectors {
            let src = connector.src.key();
            let dest = connector.dest.key();
            for key in [&src, &dest] {
                if self.graph.port(key).is_none() {
                    return Err(DocumentError::DanglingReference {
                        node: key.node,
                        port: key.name.clone(),
                    });
                }
            }
            self.graph
                .connect_with_id(connector.id.unwrap_or_default(), &src, &dest)?;
        }

        let scroll = doc.window.scroll_position;
        self.scroll_to(Point::new(scroll.left, scroll.top));
        tracing::info!(
            "Loaded {} nodes and {} connectors",
            self.graph.node_count(),
            self.graph.connector_count()
        );
        self.refresh_emphasis();
        Ok(())
    }

    /// Forget selection, hover and gesture state that points at removed elements, then
    /// re-route the unfinished connector against what is left
    fn drop_stale_state(&mut self) {
        let stale_selection = match self.selection {
            Selection::None => false,
            Selection::Node(id) => !self.graph.contains_node(id),
            Selection::Connector(id) => self.graph.connector(id).is_none(),
        };
        if stale_selection {
            self.selection = Selection::None;
        }

        let stale_hover = match &self.hovered {
            Some(HitTarget::Node(id)) => !self.graph.contains_node(*id),
            Some(HitTarget::Port(key)) => self.graph.port(key).is_none(),
            Some(HitTarget::Connector(id)) => self.graph.connector(*id).is_none(),
            Some(HitTarget::Background) | None => false,
        };
        if stale_hover {
            self.hovered = None;
        }

        let stale_gesture = match &mut self.mode {
            InteractionMode::Connecting(pending) => {
                if pending
                    .candidate
                    .as_ref()
                    .is_some_and(|key| self.graph.port(key).is_none())
                {
                    pending.candidate = None;
                }
                self.graph.port(&pending.source).is_none()
            }
            InteractionMode::Dragging(drag) => !self.graph.contains_node(drag.node),
            InteractionMode::Idle | InteractionMode::Placing { .. } => false,
        };
        if stale_gesture {
            tracing::debug!("Gesture cancelled, its target was removed");
            self.mode = InteractionMode::Idle;
        }
        self.redraw_pending();
    }

    /// Recompute select/highlight state of every node, port and connector
    fn refresh_emphasis(&mut self) {
        for node in self.graph.nodes_mut() {
            node.unselect();
            for port in node.ports_mut() {
                port.unselect();
            }
        }
        for connector in self.graph.connectors_mut() {
            connector.emphasis.unselect();
        }

        match self.selection {
            Selection::None => {}
            Selection::Node(id) => {
                if let Some(node) = self.graph.node_mut(id) {
                    node.select();
                }
                for connector in self.graph.connectors_for_node(id) {
                    self.mark_connector(connector, Emphasis::select);
                }
            }
            Selection::Connector(id) => self.mark_connector(id, Emphasis::select),
        }

        if let InteractionMode::Connecting(pending) = &self.mode {
            if let Some(port) = self.graph.port_mut(&pending.source) {
                port.select();
            }
            if let Some(port) = pending
                .candidate
                .as_ref()
                .and_then(|key| self.graph.port_mut(key))
            {
                port.highlight();
            }
        }

        if self.mode.is_connecting() || self.mode.is_dragging() {
            return;
        }
        if let Some(target) = self.hovered.clone() {
            self.apply_hover(&target);
        }
    }

    fn apply_hover(&mut self, target: &HitTarget) {
        match target {
            HitTarget::Node(id) => {
                let Some(node) = self.graph.node_mut(*id) else {
                    return;
                };
                if node.is_selected() || !node.is_ready() {
                    return;
                }
                node.highlight();
                for connector in self.graph.connectors_for_node(*id) {
                    self.mark_connector(connector, Emphasis::highlight);
                }
            }
            HitTarget::Port(key) if key.direction == PortDirection::Output => {
                if !self.is_ready(key.node) {
                    return;
                }
                if let Some(port) = self.graph.port_mut(key) {
                    port.highlight();
                }
            }
            HitTarget::Connector(id) => {
                if self.graph.connector(*id).is_some_and(Connector::is_selected) {
                    return;
                }
                self.mark_connector(*id, Emphasis::highlight);
            }
            HitTarget::Port(_) | HitTarget::Background => {}
        }
    }

    /// Apply `mark` to a connector and both of its endpoint ports
    fn mark_connector(&mut self, id: ConnectorId, mark: fn(&mut Emphasis)) {
        let Some(connector) = self.graph.connector_mut(id) else {
            return;
        };
        mark(&mut connector.emphasis);
        let ends = [connector.src.clone(), connector.dest.clone()];
        for key in &ends {
            if let Some(port) = self.graph.port_mut(key) {
                mark(&mut port.emphasis);
            }
        }
    }

    fn is_ready(&self, id: NodeId) -> bool {
        self.graph.node(id).is_some_and(Node::is_ready)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

/// Error from an editing operation on the canvas
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    /// The operation needs a selected node
    #[error("No node is selected")]
    NoNodeSelected,

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}
