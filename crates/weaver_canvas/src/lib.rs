// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive workflow canvas for Weaver.
//!
//! This crate provides the editing core behind the workflow designer:
//! - Nodes with ordered, named input and output ports
//! - Connectors between ports, routed orthogonally with rounded corners
//! - Selection and hover highlighting that spreads across related elements
//! - An interaction state machine for placing, connecting and dragging
//! - Graph documents in JSON or RON
//!
//! ## Architecture
//!
//! [`Graph`] owns nodes and connectors and keeps its indices consistent. [`Canvas`] wraps a
//! graph with the interaction mode, selection and lifecycle callbacks; every gesture goes
//! through it. [`ui::CanvasView`] draws a canvas with egui and feeds it input.

pub mod canvas;
pub mod config;
pub mod connection;
pub mod document;
pub mod emphasis;
pub mod geometry;
pub mod graph;
pub mod node;
pub mod port;
pub mod router;
pub mod ui;

pub use canvas::{
    CallbackError, CallbackFuture, Canvas, CanvasError, CanvasKey, HitTarget, InteractionMode,
    Notification, Selection, Viewport,
};
pub use config::CanvasConfig;
pub use connection::{Connector, ConnectorId, ConnectorPath};
pub use document::{DocumentError, GraphDocument};
pub use emphasis::Emphasis;
pub use geometry::{Grid, Point, Rect, Size};
pub use graph::{ConnectionError, Graph, GraphError};
pub use node::{Node, NodeId, NodeLayout};
pub use port::{Port, PortDirection, PortKey};
pub use router::{Regime, RoutedPath, Router};
pub use ui::CanvasView;
