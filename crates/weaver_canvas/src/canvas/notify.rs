// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lifecycle callbacks and the futures they return.
//!
//! The canvas never waits on a callback. Returned futures are parked in a queue that the
//! host drives with [`Canvas::pump`](super::Canvas::pump) once per frame, or drains with
//! [`Canvas::settle`](super::Canvas::settle).

use crate::connection::ConnectorId;
use crate::node::{Node, NodeId};
use crate::port::PortKey;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};

/// Future returned by an asynchronous lifecycle callback
pub type CallbackFuture = LocalBoxFuture<'static, Result<(), CallbackError>>;

/// Called with a node after it is placed, moved or its ports change
pub type NodeCallback = Box<dyn FnMut(&Node) -> CallbackFuture>;

/// Called with the ID of a removed node
pub type NodeRemovedCallback = Box<dyn FnMut(NodeId) -> CallbackFuture>;

/// Called with a connector's source and destination ports
pub type ConnectorCallback = Box<dyn FnMut(&PortKey, &PortKey, ConnectorId) -> CallbackFuture>;

/// Synchronous node event (selection, edit request)
pub type NodeEventCallback = Box<dyn FnMut(&Node)>;

/// A lifecycle callback rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Callback failed: {0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    /// Create an error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// What a queued callback future reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A node was placed
    NodeAdded(NodeId),
    /// A node was removed
    NodeDeleted(NodeId),
    /// A node drag finished
    NodeMoved(NodeId),
    /// A node gained or lost a port
    NodeIoChanged(NodeId),
    /// A connector was created
    ConnectorAdded(ConnectorId),
    /// A connector was removed
    ConnectorDeleted(ConnectorId),
}

/// Registered callbacks
#[derive(Default)]
pub(crate) struct CanvasHandlers {
    pub node_added: Option<NodeCallback>,
    pub node_deleted: Option<NodeRemovedCallback>,
    pub node_moved: Option<NodeCallback>,
    pub node_io_changed: Option<NodeCallback>,
    pub node_edit_requested: Option<NodeEventCallback>,
    pub node_selected: Option<NodeEventCallback>,
    pub connector_added: Option<ConnectorCallback>,
    pub connector_deleted: Option<ConnectorCallback>,
}

type Settled = (Notification, Result<(), CallbackError>);

/// Callback futures that have not completed yet
#[derive(Default)]
pub(crate) struct NotificationQueue {
    pending: FuturesUnordered<LocalBoxFuture<'static, Settled>>,
}

impl NotificationQueue {
    pub fn push(&mut self, notification: Notification, future: CallbackFuture) {
        self.pending
            .push(future.map(move |result| (notification, result)).boxed_local());
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// The next completed future, without waiting
    pub fn poll_ready(&mut self) -> Option<Settled> {
        self.pending.next().now_or_never().flatten()
    }

    /// The next completed future; `None` once the queue is empty
    pub async fn next(&mut self) -> Option<Settled> {
        self.pending.next().await
    }
}
