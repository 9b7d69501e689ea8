// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connectors.
//!
//! Connectors live in one authoritative list. Two lookup indices (source port to
//! destinations, destination port to its single source) are derived from it and only
//! ever touched by [`Graph::insert_edge`] and [`Graph::remove_edge`], so they cannot
//! drift apart.

use crate::config::CanvasConfig;
use crate::connection::{Connector, ConnectorId, ConnectorPath};
use crate::geometry::Point;
use crate::node::{Node, NodeId, NodeLayout};
use crate::port::{Port, PortDirection, PortKey};
use crate::router::{Endpoint, Router};
use indexmap::IndexMap;
use std::collections::HashMap;

/// A graph of nodes and the connectors between their ports
#[derive(Debug, Clone)]
pub struct Graph {
    /// Nodes in placement order
    nodes: IndexMap<NodeId, Node>,
    /// Connectors in creation order
    connectors: IndexMap<ConnectorId, Connector>,
    /// Output port -> (input port -> connector)
    by_src: HashMap<PortKey, IndexMap<PortKey, ConnectorId>>,
    /// Input port -> (output port, connector)
    by_dest: HashMap<PortKey, (PortKey, ConnectorId)>,
    layout: NodeLayout,
    router: Router,
}

impl Graph {
    /// Create an empty graph using the geometry from `config`
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            nodes: IndexMap::new(),
            connectors: IndexMap::new(),
            by_src: HashMap::new(),
            by_dest: HashMap::new(),
            layout: config.node_layout(),
            router: config.router(),
        }
    }

    /// Node geometry
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Connector router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Add an empty node with its body at `position`
    pub fn create_node(&mut self, id: NodeId, position: Point) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, Node::new(id, position, self.layout));
        Ok(id)
    }

    /// Remove a node together with every connector touching its ports
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<(Node, Vec<Connector>)> {
        if !self.nodes.contains_key(&node_id) {
            return None;
        }
        let removed = self
            .connectors_for_node(node_id)
            .into_iter()
            .filter_map(|id| self.remove_edge(id))
            .collect();
        let node = self.nodes.shift_remove(&node_id)?;
        Some((node, removed))
    }

    /// Remove every node and connector
    pub fn clear(&mut self) {
        self.connectors.clear();
        self.by_src.clear();
        self.by_dest.clear();
        self.nodes.clear();
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Whether a node exists
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move a node and reroute its connectors
    pub fn move_node(&mut self, node_id: NodeId, position: Point) -> Result<(), GraphError> {
        self.nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?
            .move_to(position);
        self.reroute_node(node_id);
        Ok(())
    }

    /// Get a port by key
    pub fn port(&self, key: &PortKey) -> Option<&Port> {
        self.nodes.get(&key.node)?.port(key)
    }

    pub(crate) fn port_mut(&mut self, key: &PortKey) -> Option<&mut Port> {
        self.nodes.get_mut(&key.node)?.port_mut(key)
    }

    /// Add a port to a node
    pub fn add_port(
        &mut self,
        node_id: NodeId,
        direction: PortDirection,
        name: impl Into<String>,
    ) -> Result<PortKey, GraphError> {
        let key = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?
            .add_port(direction, name)?;
        // The body may have grown, which changes every port's clearance
        self.reroute_node(node_id);
        Ok(key)
    }

    /// Remove a port and every connector attached to it
    pub fn remove_port(&mut self, key: &PortKey) -> Result<Vec<Connector>, GraphError> {
        if self.port(key).is_none() {
            return Err(GraphError::PortNotFound(key.clone()));
        }

        let attached: Vec<ConnectorId> = self
            .connectors
            .values()
            .filter(|c| c.involves_port(key))
            .map(|c| c.id)
            .collect();
        let removed = attached
            .into_iter()
            .filter_map(|id| self.remove_edge(id))
            .collect();

        if let Some(node) = self.nodes.get_mut(&key.node) {
            node.remove_port(key.direction, &key.name);
        }
        self.reroute_node(key.node);
        Ok(removed)
    }

    /// Check the structural rules for a new connector from `src` to `dest`
    pub fn validate_connection(&self, src: &PortKey, dest: &PortKey) -> Result<(), ConnectionError> {
        let src_port = self
            .port(src)
            .ok_or_else(|| ConnectionError::PortNotFound(src.clone()))?;
        let dest_port = self
            .port(dest)
            .ok_or_else(|| ConnectionError::PortNotFound(dest.clone()))?;

        if src_port.direction != PortDirection::Output {
            return Err(ConnectionError::SourceNotOutput(src.clone()));
        }
        if dest_port.direction != PortDirection::Input {
            return Err(ConnectionError::DestinationNotInput(dest.clone()));
        }
        if src.node == dest.node {
            return Err(ConnectionError::SameNode(src.node));
        }
        if self.by_dest.contains_key(dest) {
            return Err(ConnectionError::DestinationOccupied(dest.clone()));
        }
        Ok(())
    }

    /// Add a connector between ports
    pub fn connect(&mut self, src: &PortKey, dest: &PortKey) -> Result<ConnectorId, ConnectionError> {
        self.connect_with_id(ConnectorId::new(), src, dest)
    }

    /// Add a connector with a known ID (used when loading documents)
    pub fn connect_with_id(
        &mut self,
        id: ConnectorId,
        src: &PortKey,
        dest: &PortKey,
    ) -> Result<ConnectorId, ConnectionError> {
        if self.connectors.contains_key(&id) {
            return Err(ConnectionError::DuplicateConnector(id));
        }
        self.validate_connection(src, dest)?;

        let start = self.port(src).map(|p| p.anchor_point()).unwrap_or_default();
        let path = ConnectorPath::new(start, &self.router);
        let id = self.insert_edge(Connector::new(id, src.clone(), dest.clone(), path));
        self.route(id);
        Ok(id)
    }

    /// Remove a connector
    pub fn disconnect(&mut self, connector_id: ConnectorId) -> Option<Connector> {
        self.remove_edge(connector_id)
    }

    /// Get a connector by ID
    pub fn connector(&self, connector_id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&connector_id)
    }

    pub(crate) fn connector_mut(&mut self, connector_id: ConnectorId) -> Option<&mut Connector> {
        self.connectors.get_mut(&connector_id)
    }

    /// Get all connectors
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub(crate) fn connectors_mut(&mut self) -> impl Iterator<Item = &mut Connector> {
        self.connectors.values_mut()
    }

    /// Get the number of connectors
    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// The connector ending at an input port, if any
    pub fn incoming(&self, dest: &PortKey) -> Option<&Connector> {
        let (_, id) = self.by_dest.get(dest)?;
        self.connectors.get(id)
    }

    /// Connectors leaving an output port
    pub fn outgoing(&self, src: &PortKey) -> impl Iterator<Item = &Connector> {
        self.by_src
            .get(src)
            .into_iter()
            .flat_map(|dests| dests.values())
            .filter_map(|id| self.connectors.get(id))
    }

    /// Connectors touching any port of a node: incoming ones first, in input slot order
    pub fn connectors_for_node(&self, node_id: NodeId) -> Vec<ConnectorId> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };

        let incoming = node
            .inputs()
            .iter()
            .filter_map(|port| self.by_dest.get(&port.key()).map(|(_, id)| *id));
        let outgoing = node
            .outputs()
            .iter()
            .filter_map(|port| self.by_src.get(&port.key()))
            .flat_map(|dests| dests.values().copied());
        incoming.chain(outgoing).collect()
    }

    /// Recompute the path of every connector touching a node
    pub fn reroute_node(&mut self, node_id: NodeId) {
        for id in self.connectors_for_node(node_id) {
            self.route(id);
        }
    }

    fn route(&mut self, connector_id: ConnectorId) {
        let Some(connector) = self.connectors.get(&connector_id) else {
            return;
        };
        let (Some(src), Some(dest)) = (self.port(&connector.src), self.port(&connector.dest)) else {
            return;
        };
        let (start, end) = (Endpoint::from(src), Endpoint::from(dest));
        let router = self.router;
        if let Some(connector) = self.connectors.get_mut(&connector_id) {
            connector.path.redraw(&router, &start, &end);
        }
    }

    /// The only place connectors enter the graph
    fn insert_edge(&mut self, connector: Connector) -> ConnectorId {
        let id = connector.id;
        self.by_src
            .entry(connector.src.clone())
            .or_default()
            .insert(connector.dest.clone(), id);
        self.by_dest
            .insert(connector.dest.clone(), (connector.src.clone(), id));
        self.connectors.insert(id, connector);
        id
    }

    /// The only place connectors leave the graph
    fn remove_edge(&mut self, connector_id: ConnectorId) -> Option<Connector> {
        let connector = self.connectors.shift_remove(&connector_id)?;
        if let Some(dests) = self.by_src.get_mut(&connector.src) {
            dests.shift_remove(&connector.dest);
            if dests.is_empty() {
                self.by_src.remove(&connector.src);
            }
        }
        self.by_dest.remove(&connector.dest);
        Some(connector)
    }

    /// Panic if the indices disagree with the connector list or reference missing ports
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for connector in self.connectors.values() {
            let src = self.port(&connector.src).expect("source port exists");
            let dest = self.port(&connector.dest).expect("destination port exists");
            assert_eq!(src.direction, PortDirection::Output);
            assert_eq!(dest.direction, PortDirection::Input);
            assert_eq!(
                self.by_dest.get(&connector.dest),
                Some(&(connector.src.clone(), connector.id))
            );
            assert_eq!(
                self.by_src.get(&connector.src).and_then(|d| d.get(&connector.dest)),
                Some(&connector.id)
            );
        }
        let forward: usize = self.by_src.values().map(IndexMap::len).sum();
        assert_eq!(forward, self.connectors.len());
        assert_eq!(self.by_dest.len(), self.connectors.len());
        assert!(self.by_src.values().all(|d| !d.is_empty()));
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

/// Error from a structural graph operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with this ID already exists
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(PortKey),

    /// A port with this name already exists on that side of the node
    #[error("Port {name:?} already exists on the {direction:?} side of node {node}")]
    DuplicatePortName {
        /// Owning node
        node: NodeId,
        /// Side of the node
        direction: PortDirection,
        /// Rejected name
        name: String,
    },

    /// Connector not found
    #[error("Connector not found: {0}")]
    ConnectorNotFound(ConnectorId),
}

/// Error when creating a connector
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(PortKey),

    /// Connectors start at output ports
    #[error("Source is not an output port: {0}")]
    SourceNotOutput(PortKey),

    /// Connectors end at input ports
    #[error("Destination is not an input port: {0}")]
    DestinationNotInput(PortKey),

    /// Both ends on the same node
    #[error("Cannot connect node {0} to itself")]
    SameNode(NodeId),

    /// The input port already has a connector
    #[error("Input port already connected: {0}")]
    DestinationOccupied(PortKey),

    /// Rejected by the configured allow-list
    #[error("Connection from node {src} to node {dest} is not allowed")]
    NotAllowed {
        /// Source node
        src: NodeId,
        /// Destination node
        dest: NodeId,
    },

    /// A connector with this ID already exists
    #[error("Connector already exists: {0}")]
    DuplicateConnector(ConnectorId),
}
