// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for graph editing and execution.

use crate::types::TypeError;
use crate::uid::{EdgeId, NodeId, PinId};
use thiserror::Error;

/// Why an edit was refused. The graph is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditRejection {
    /// Both endpoints are the same pin
    #[error("Cannot link a pin to itself.")]
    SelfLink,

    /// Both endpoints live on one node
    #[error("Cannot connect a pin to another pin on the same node!")]
    SameNode,

    /// Two inputs or two outputs
    #[error("Cannot link a pin to one of the same direction.")]
    SameDirection,

    /// The target node already reaches the source node
    #[error("This connection would result in a cyclic graph loop!")]
    Cyclic,

    /// One endpoint is an exec pin and the other carries data
    #[error("Cannot connect an Exec pin to a Data pin.")]
    ExecDataMismatch,

    /// Data types differ
    #[error("{source_type} is not compatible with {target_type}")]
    IncompatibleTypes {
        /// Friendly name of the source pin's type
        source_type: String,
        /// Friendly name of the target pin's type
        target_type: String,
    },

    /// Variable pin with no bound type
    #[error("Pin {0} has no data type")]
    UntypedPin(String),

    /// Per-graph instance cap reached for a node class
    #[error("The graph already holds the maximum of {max} {class} node(s)")]
    InstanceCap {
        /// Node class ID
        class: String,
        /// Cap
        max: usize,
    },

    /// Entry handle already bound to another node
    #[error("Entry handle {0} is already in use")]
    EntryHandleTaken(String),
}

/// Errors raised by graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Pin not found
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    /// No pin with this label on the node
    #[error("Node {node} has no pin labelled {label:?}")]
    PinLabelNotFound {
        /// Node searched
        node: NodeId,
        /// Missing label
        label: String,
    },

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// No node class registered under this ID
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// No graph variable with this name
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Variable name already taken
    #[error("Variable already exists: {0}")]
    VariableExists(String),

    /// Second pin with the same label on one node
    #[error("Node {node} already has a pin labelled {label:?}")]
    DuplicatePinLabel {
        /// Node being edited
        node: NodeId,
        /// Duplicate label
        label: String,
    },

    /// Node class ID registered twice
    #[error("Node class already registered: {0}")]
    DuplicateNodeClass(String),

    /// No entry node bound to this handle
    #[error("No entry point registered for {0:?}")]
    UnknownEntryPoint(String),

    /// Class is not flagged as an entry node
    #[error("Node type {0} is not an entry node")]
    NotEntryNode(String),

    /// Operation needs an exec pin
    #[error("Pin {0} is not an exec pin")]
    NotExecPin(String),

    /// Operation needs a variable node
    #[error("Node {0} is not bound to a variable")]
    NotVariableNode(NodeId),

    /// A pure node feeding a data input exited with an error
    #[error("Upstream node {node} failed: {message}")]
    UpstreamFailed {
        /// Failing node
        node: NodeId,
        /// Its error message
        message: String,
    },

    /// Serialized graph refers to things that do not exist
    #[error("Invalid graph document: {0}")]
    InvalidDocument(String),

    /// Value type error
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Edit refused
    #[error(transparent)]
    Rejected(#[from] EditRejection),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// The edit rejection, if this error is one
    pub fn rejection(&self) -> Option<&EditRejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
