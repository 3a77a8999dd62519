// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure owning nodes, pins, edges and variables.
//!
//! The graph is an arena: everything is stored by ID and cross-references are
//! IDs. Reads are public; structural edits go through [`Schema`] and running
//! goes through the methods in [`crate::execution`].

use crate::edge::Edge;
use crate::error::{GraphError, Result};
use crate::nodes::events;
use crate::node::Node;
use crate::pin::{Pin, PinDirection};
use crate::registry::ScriptRegistry;
use crate::scheduler::{GraphMailbox, Scheduler};
use crate::schema::Schema;
use crate::uid::{EdgeId, GraphId, NodeId, PinId};
use crate::value::ScriptType;
use crate::variable::Variable;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Called when a node exits with an error: graph, failing node, message
pub type ErrorHandler = Box<dyn FnMut(&ScriptGraph, NodeId, &str) + Send>;

/// Called whenever execution flows across an exec edge
pub type EdgeFlowHandler = Box<dyn FnMut(&ScriptGraph, EdgeId) + Send>;

/// A script graph
pub struct ScriptGraph {
    id: GraphId,
    /// Graph name
    pub name: String,
    registry: Arc<ScriptRegistry>,
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) pins: HashMap<PinId, NodeId>,
    pub(crate) edges: IndexMap<EdgeId, Edge>,
    pub(crate) next_edge_id: u64,
    pub(crate) variables: IndexMap<String, Variable>,
    pub(crate) entry_points: IndexMap<String, NodeId>,
    pub(crate) class_counts: HashMap<String, usize>,
    pub(crate) scheduler: Scheduler,
    pub(crate) mailbox: GraphMailbox,
    pub(crate) time: f64,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) edge_flow_handler: Option<EdgeFlowHandler>,
}

impl ScriptGraph {
    /// Create a new empty graph
    pub fn new(registry: Arc<ScriptRegistry>) -> Self {
        Self {
            id: GraphId::new(),
            name: "ScriptGraph".to_string(),
            registry,
            nodes: IndexMap::new(),
            pins: HashMap::new(),
            edges: IndexMap::new(),
            next_edge_id: 1,
            variables: IndexMap::new(),
            entry_points: IndexMap::new(),
            class_counts: HashMap::new(),
            scheduler: Scheduler::new(),
            mailbox: GraphMailbox::new(),
            time: 0.0,
            error_handler: None,
            edge_flow_handler: None,
        }
    }

    /// Create a graph with `BeginPlay` and `Tick` entry nodes already in place
    pub fn with_default_entries(registry: Arc<ScriptRegistry>) -> Result<Self> {
        let mut graph = Self::new(registry);
        {
            let mut schema = graph.schema();
            schema.add_entry_node(events::BEGIN_PLAY_CLASS, events::BEGIN_PLAY)?;
            schema.add_entry_node(events::TICK_CLASS, events::TICK)?;
        }
        Ok(graph)
    }

    /// Editing interface
    pub fn schema(&mut self) -> Schema<'_> {
        Schema::new(self)
    }

    /// Graph instance ID
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Registry this graph instantiates from
    pub fn registry(&self) -> &Arc<ScriptRegistry> {
        &self.registry
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node owning a pin
    pub fn pin_owner(&self, pin: PinId) -> Result<NodeId> {
        self.pins.get(&pin).copied().ok_or(GraphError::PinNotFound(pin))
    }

    /// Get a pin by ID
    pub fn pin(&self, pin: PinId) -> Result<&Pin> {
        let owner = self.pin_owner(pin)?;
        self.node(owner)?.pin(pin).ok_or(GraphError::PinNotFound(pin))
    }

    pub(crate) fn pin_mut(&mut self, pin: PinId) -> Result<&mut Pin> {
        let owner = self.pin_owner(pin)?;
        self.node_mut(owner)?
            .pin_mut(pin)
            .ok_or(GraphError::PinNotFound(pin))
    }

    /// Find a pin by node and label
    pub fn pin_by_label(&self, node: NodeId, label: &str) -> Result<&Pin> {
        self.node(node)?.pin_by_label(label)
    }

    /// Get an edge by ID
    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges.get(&id).ok_or(GraphError::EdgeNotFound(id))
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get edges touching a node
    pub fn edges_for_node(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| {
            self.pins.get(&e.from) == Some(&node) || self.pins.get(&e.to) == Some(&node)
        })
    }

    /// The pin a data input reads from: the upstream output when connected,
    /// otherwise the pin itself
    pub fn data_source_pin(&self, pin: PinId) -> Result<PinId> {
        let target = self.pin(pin)?;
        if target.direction() == PinDirection::Output {
            return Ok(pin);
        }
        match target.edges().first() {
            Some(edge) => Ok(self.edge(*edge)?.from),
            None => Ok(pin),
        }
    }

    /// Get a variable by name
    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| GraphError::UnknownVariable(name.to_string()))
    }

    pub(crate) fn variable_mut(&mut self, name: &str) -> Result<&mut Variable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownVariable(name.to_string()))
    }

    /// Get all variables
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Read a variable's current value
    pub fn variable_value<T: ScriptType>(&self, name: &str) -> Result<T> {
        Ok(self.variable(name)?.get()?)
    }

    /// Overwrite a variable's current value
    pub fn set_variable<T: ScriptType>(&mut self, name: &str, value: T) -> Result<()> {
        self.variable_mut(name)?.set(value)?;
        Ok(())
    }

    /// Restore every variable to its default
    pub fn reset_variables(&mut self) {
        for variable in self.variables.values_mut() {
            variable.reset();
        }
    }

    /// Node bound to an entry handle
    pub fn entry_point(&self, handle: &str) -> Result<NodeId> {
        self.entry_points
            .get(handle)
            .copied()
            .ok_or_else(|| GraphError::UnknownEntryPoint(handle.to_string()))
    }

    /// Registered entry handles in registration order
    pub fn entry_handles(&self) -> impl Iterator<Item = &str> {
        self.entry_points.keys().map(String::as_str)
    }

    /// Entry handle bound to a node
    pub fn entry_handle_of(&self, node: NodeId) -> Option<&str> {
        self.entry_points
            .iter()
            .find(|(_, id)| **id == node)
            .map(|(handle, _)| handle.as_str())
    }

    /// Number of live instances of a node class
    pub fn class_count(&self, class: &str) -> usize {
        self.class_counts.get(class).copied().unwrap_or(0)
    }

    /// Seconds accumulated by [`tick`](Self::tick)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Continuations waiting for a future tick
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle for posting requests from other threads
    pub fn mailbox(&self) -> GraphMailbox {
        self.mailbox.clone()
    }

    /// Install the runtime error callback, replacing any previous one
    pub fn bind_error_handler(
        &mut self,
        handler: impl FnMut(&ScriptGraph, NodeId, &str) + Send + 'static,
    ) {
        self.error_handler = Some(Box::new(handler));
    }

    /// Remove the runtime error callback
    pub fn unbind_error_handler(&mut self) {
        self.error_handler = None;
    }

    /// Install the exec edge traversal callback
    pub fn bind_edge_flow_handler(&mut self, handler: impl FnMut(&ScriptGraph, EdgeId) + Send + 'static) {
        self.edge_flow_handler = Some(Box::new(handler));
    }

    /// Remove the exec edge traversal callback
    pub fn unbind_edge_flow_handler(&mut self) {
        self.edge_flow_handler = None;
    }

    pub(crate) fn report_flow_error(&mut self, node: NodeId, message: &str) {
        tracing::error!(graph = %self.id, %node, error = message, "Script node failed");
        if let Some(mut handler) = self.error_handler.take() {
            handler(self, node, message);
            self.error_handler = Some(handler);
        }
    }

    pub(crate) fn report_edge_flow(&mut self, edge: EdgeId) {
        if let Some(mut handler) = self.edge_flow_handler.take() {
            handler(self, edge);
            self.edge_flow_handler = Some(handler);
        }
    }
}

impl fmt::Debug for ScriptGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptGraph")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .field("entry_points", &self.entry_points)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::math;

    fn registry() -> Arc<ScriptRegistry> {
        Arc::new(ScriptRegistry::with_builtins().unwrap())
    }

    #[test]
    fn test_default_entries() {
        let graph = ScriptGraph::with_default_entries(registry()).unwrap();
        assert_eq!(graph.node_count(), 2);
        let handles: Vec<_> = graph.entry_handles().collect();
        assert_eq!(handles, [events::BEGIN_PLAY, events::TICK]);
        let tick = graph.entry_point(events::TICK).unwrap();
        assert_eq!(graph.entry_handle_of(tick), Some(events::TICK));
        assert!(graph.entry_point("EndPlay").is_err());
    }

    #[test]
    fn test_pin_index_tracks_nodes() {
        let mut graph = ScriptGraph::new(registry());
        let add = graph.schema().add_node(math::ADD).unwrap();
        let result = graph.pin_by_label(add, "Result").unwrap().id();
        assert_eq!(graph.pin_owner(result).unwrap(), add);
        assert_eq!(graph.data_source_pin(result).unwrap(), result);

        graph.schema().remove_node(add).unwrap();
        assert!(graph.pin(result).is_err());
        assert!(graph.pins.is_empty());
    }
}
