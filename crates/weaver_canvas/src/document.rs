// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted canvas document.
//!
//! This is the durable exchange shape: nodes with their ordered port names, connectors
//! as port-to-port pairs and the viewport scroll offset. Renderer-only state (emphasis,
//! routed paths, readiness) is not stored.

use crate::connection::ConnectorId;
use crate::geometry::Point;
use crate::graph::{ConnectionError, GraphError};
use crate::node::NodeId;
use crate::port::{PortDirection, PortKey};
use serde::{Deserialize, Serialize};

/// A whole canvas
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes in placement order
    pub nodes: Vec<NodeDocument>,
    /// Connectors
    pub connectors: Vec<ConnectorDocument>,
    /// Viewport state
    #[serde(default)]
    pub window: WindowDocument,
}

/// One node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Node ID
    pub id: NodeId,
    /// Body top-left corner
    pub position: Point,
    /// Input ports in slot order
    #[serde(default)]
    pub input_ports: Vec<PortDocument>,
    /// Output ports in slot order
    #[serde(default)]
    pub output_ports: Vec<PortDocument>,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Opaque application payload
    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// A port reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDocument {
    /// Owning node
    pub node_id: NodeId,
    /// Input or output
    pub port_type: PortDirection,
    /// Port name
    pub port_name: String,
}

impl PortDocument {
    /// Key of the referenced port
    pub fn key(&self) -> PortKey {
        PortKey {
            node: self.node_id,
            direction: self.port_type,
            name: self.port_name.clone(),
        }
    }
}

impl From<PortKey> for PortDocument {
    fn from(key: PortKey) -> Self {
        Self {
            node_id: key.node,
            port_type: key.direction,
            port_name: key.name,
        }
    }
}

/// One connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorDocument {
    /// Connector ID; a fresh one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConnectorId>,
    /// Output port
    pub src: PortDocument,
    /// Input port
    pub dest: PortDocument,
}

/// Viewport state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowDocument {
    /// Scroll offset of the viewport into the canvas
    pub scroll_position: ScrollPosition,
}

/// Scroll offset in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    /// Horizontal offset
    pub left: f32,
    /// Vertical offset
    pub top: f32,
}

impl GraphDocument {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(s: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON
    pub fn from_ron(s: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(s)?)
    }

    /// Find a node by ID
    pub fn node(&self, id: NodeId) -> Option<&NodeDocument> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Check that every port entry agrees with where it is listed: node port lists hold
    /// ports of that node in that direction, connectors run from an output to an input
    pub fn validate(&self) -> Result<(), DocumentError> {
        for node in &self.nodes {
            let sides = [
                (PortDirection::Input, &node.input_ports),
                (PortDirection::Output, &node.output_ports),
            ];
            for (expected, ports) in sides {
                for port in ports {
                    check_port(port, node.id, expected)?;
                }
            }
        }
        for connector in &self.connectors {
            check_port(&connector.src, connector.src.node_id, PortDirection::Output)?;
            check_port(&connector.dest, connector.dest.node_id, PortDirection::Input)?;
        }
        Ok(())
    }
}

fn check_port(
    port: &PortDocument,
    node: NodeId,
    expected: PortDirection,
) -> Result<(), DocumentError> {
    if port.node_id == node && port.port_type == expected {
        Ok(())
    } else {
        Err(DocumentError::MismatchedPort {
            node,
            port: port.port_name.clone(),
            expected,
        })
    }
}

/// Error loading or saving a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// A connector names a node or port the document does not define
    #[error("Connector references missing port {port:?} on node {node}")]
    DanglingReference {
        /// Referenced node
        node: NodeId,
        /// Referenced port name
        port: String,
    },

    /// A port entry contradicts where the document lists it
    #[error("Port {port:?} should be an {expected:?} port of node {node}")]
    MismatchedPort {
        /// Node the entry belongs to
        node: NodeId,
        /// Port name
        port: String,
        /// Direction implied by the entry's place
        expected: PortDirection,
    },

    /// Node or port could not be rebuilt
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Connector could not be rebuilt
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON serialization error
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphDocument {
        let a = NodeId::new();
        let b = NodeId::new();
        let src = PortDocument::from(PortKey::output(a, "out"));
        let dest = PortDocument::from(PortKey::input(b, "in"));
        GraphDocument {
            nodes: vec![
                NodeDocument {
                    id: a,
                    position: Point::new(24.0, 24.0),
                    input_ports: Vec::new(),
                    output_ports: vec![src.clone()],
                    title: "Load".to_string(),
                    attributes: serde_json::Value::Null,
                },
                NodeDocument {
                    id: b,
                    position: Point::new(480.0, 24.0),
                    input_ports: vec![dest.clone()],
                    output_ports: Vec::new(),
                    title: "Train".to_string(),
                    attributes: serde_json::Value::Null,
                },
            ],
            connectors: vec![ConnectorDocument {
                id: Some(ConnectorId::new()),
                src,
                dest,
            }],
            window: WindowDocument {
                scroll_position: ScrollPosition {
                    left: 48.0,
                    top: 0.0,
                },
            },
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["window"]["scroll_position"]["left"], 48.0);
        assert_eq!(value["nodes"][0]["output_ports"][0]["port_name"], "out");
        assert_eq!(value["nodes"][0]["output_ports"][0]["port_type"], "Output");
        assert_eq!(value["nodes"][1]["position"]["x"], 480.0);
        assert!(value["connectors"][0]["src"]["node_id"].is_string());
    }

    #[test]
    fn test_json_roundtrip() {
        let doc = sample();
        let loaded = GraphDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_ron_roundtrip() {
        let doc = sample();
        let loaded = GraphDocument::from_ron(&doc.to_ron().unwrap()).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_optional_fields() {
        let a = NodeId::new();
        let json = format!(
            r#"{{
                "nodes": [{{ "id": "{a}", "position": {{ "x": 24.0, "y": 48.0 }} }}],
                "connectors": []
            }}"#
        );
        let doc = GraphDocument::from_json(&json).unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.nodes[0].input_ports.is_empty());
        assert_eq!(doc.nodes[0].attributes, serde_json::Value::Null);
        assert_eq!(doc.window, WindowDocument::default());
        assert!(doc.node(a).is_some());
    }

    #[test]
    fn test_connector_id_is_optional() {
        let mut doc = sample();
        doc.connectors[0].id = None;
        let json = doc.to_json().unwrap();
        assert!(!json.contains("\"id\": null"));
        let loaded = GraphDocument::from_json(&json).unwrap();
        assert_eq!(loaded.connectors[0].id, None);
    }

    #[test]
    fn test_sample_is_consistent() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_direction_in_port_list() {
        let mut doc = sample();
        doc.nodes[0].output_ports[0].port_type = PortDirection::Input;
        let a = doc.nodes[0].id;
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::MismatchedPort { node, port, expected: PortDirection::Output })
                if node == a && port == "out"
        ));
    }

    #[test]
    fn test_validate_rejects_port_of_another_node() {
        let mut doc = sample();
        let b = doc.nodes[1].id;
        doc.nodes[0].output_ports[0].node_id = b;
        let a = doc.nodes[0].id;
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::MismatchedPort { node, .. }) if node == a
        ));
    }

    #[test]
    fn test_validate_rejects_reversed_connector_ends() {
        let mut doc = sample();
        doc.connectors[0].src.port_type = PortDirection::Input;
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::MismatchedPort { expected: PortDirection::Output, .. })
        ));

        let mut doc = sample();
        doc.connectors[0].dest.port_type = PortDirection::Output;
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::MismatchedPort { expected: PortDirection::Input, .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            GraphDocument::from_json("{ not json"),
            Err(DocumentError::Json(_))
        ));
    }
}
