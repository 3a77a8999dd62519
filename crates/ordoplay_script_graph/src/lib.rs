// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual scripting runtime for `OrdoPlay`.
//!
//! A script is a graph of nodes. Nodes carry typed pins; edges link an output
//! pin to an input pin. Exec pins carry control flow and data pins carry
//! values.
//!
//! ## Architecture
//!
//! - [`types`] and [`data_object`]: the type registry and type-erased values
//! - [`node`], [`pin`], [`edge`]: graph elements and the node class registry
//! - [`graph`] and [`schema`]: the arena owning everything, and its checked
//!   editing interface
//! - [`execution`] and [`scheduler`]: push-style control flow, pull-style data,
//!   timed continuations and the cross-thread mailbox
//! - [`serialization`]: JSON graph documents
//! - [`nodes`]: the built-in node library
//!
//! ```no_run
//! use ordoplay_script_graph::{bootstrap, ScriptGraph};
//!
//! # fn main() -> ordoplay_script_graph::Result<()> {
//! let registry = bootstrap()?;
//! let mut graph = ScriptGraph::with_default_entries(registry)?;
//! graph.run("BeginPlay")?;
//! graph.tick(1.0 / 60.0)?;
//! # Ok(())
//! # }
//! ```

pub mod data_object;
pub mod edge;
pub mod error;
pub mod execution;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod pin;
pub mod registry;
pub mod scheduler;
pub mod schema;
pub mod serialization;
pub mod types;
pub mod uid;
pub mod value;
pub mod variable;

pub use data_object::DataObject;
pub use edge::Edge;
pub use error::{EditRejection, GraphError, Result};
pub use execution::{ExecContext, Flow, Payload};
pub use graph::ScriptGraph;
pub use node::{operation, Node, NodeCategory, NodeClass, NodeFlags, NodeOperation, NodeRegistry};
pub use pin::{Pin, PinDirection, PinKind, PinSpec};
pub use registry::ScriptRegistry;
pub use scheduler::{GraphMailbox, MailboxRequest};
pub use schema::Schema;
pub use serialization::GraphDocument;
pub use types::{GraphColor, TypeDescriptor, TypeError, TypeKey, TypeRegistry};
pub use uid::{EdgeId, GraphId, NodeId, PinId};
pub use value::{ScriptType, Value, Vector3};
pub use variable::Variable;

use std::sync::Arc;

/// Build a shared registry holding the built-in types and node classes
pub fn bootstrap() -> Result<Arc<ScriptRegistry>> {
    Ok(ScriptRegistry::with_builtins()?.into_shared())
}
