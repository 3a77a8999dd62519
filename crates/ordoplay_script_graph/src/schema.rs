// SPDX-License-Identifier: MIT OR Apache-2.0
//! The editing interface of a graph.
//!
//! [`Schema`] is the only way to change a graph's structure. Every edit is
//! checked first; a rejected edit returns [`GraphError::Rejected`] and leaves
//! the graph exactly as it was.

use crate::data_object::DataObject;
use crate::edge::{Edge, DATA_EDGE_THICKNESS, EXEC_EDGE_THICKNESS};
use crate::error::{EditRejection, GraphError, Result};
use crate::graph::ScriptGraph;
use crate::node::Node;
use crate::nodes::variables;
use crate::pin::{PinDirection, PinKind};
use crate::types::{GraphColor, TypeError};
use crate::uid::{EdgeId, NodeId, PinId};
use crate::value::ScriptType;
use crate::variable::Variable;
use std::collections::HashSet;
use std::sync::Arc;

/// Mutation interface borrowed from a [`ScriptGraph`]
pub struct Schema<'g> {
    graph: &'g mut ScriptGraph,
}

impl<'g> Schema<'g> {
    pub(crate) fn new(graph: &'g mut ScriptGraph) -> Self {
        Self { graph }
    }

    /// The graph being edited
    pub fn graph(&self) -> &ScriptGraph {
        self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ScriptGraph {
        self.graph
    }

    /// Instantiate a node class and add it to the graph
    pub fn add_node(&mut self, class: &str) -> Result<NodeId> {
        let registry = Arc::clone(self.graph.registry());
        let node = registry.nodes.create_node(class, &registry.types)?;
        self.register_node(node)
    }

    /// Add an entry node and bind it to `handle`
    pub fn add_entry_node(&mut self, class: &str, handle: &str) -> Result<NodeId> {
        let registry = Arc::clone(self.graph.registry());
        let class_def = registry.nodes.get(class)?;
        if !class_def.flags.entry {
            return Err(GraphError::NotEntryNode(class.to_string()));
        }
        if self.graph.entry_points.contains_key(handle) {
            return Err(reject(EditRejection::EntryHandleTaken(handle.to_string())));
        }
        let id = self.add_node(class)?;
        self.register_entry_point(id, handle)?;
        Ok(id)
    }

    /// Take ownership of a node, enforcing the class's instance cap
    pub fn register_node(&mut self, node: Node) -> Result<NodeId> {
        let class = node.class_id().to_string();
        let max = node.flags().max_instances;
        let count = self.graph.class_count(&class);
        if max > 0 && count + 1 > max {
            return Err(reject(EditRejection::InstanceCap { class, max }));
        }

        let id = node.id();
        for pin in node.pins() {
            self.graph.pins.insert(pin.id(), id);
        }
        self.graph.nodes.insert(id, node);
        *self.graph.class_counts.entry(class.clone()).or_insert(0) += 1;

        tracing::debug!(graph = %self.graph.id(), node = %id, %class, "Added node");
        Ok(id)
    }

    /// Bind an entry node to a handle
    pub fn register_entry_point(&mut self, node: NodeId, handle: &str) -> Result<()> {
        let entry = self.graph.node(node)?;
        if !entry.is_entry() {
            return Err(GraphError::NotEntryNode(entry.class_id().to_string()));
        }
        if self.graph.entry_points.contains_key(handle) {
            return Err(reject(EditRejection::EntryHandleTaken(handle.to_string())));
        }
        self.graph.entry_points.insert(handle.to_string(), node);
        Ok(())
    }

    /// Remove a node, every edge touching its pins and its entry binding
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.graph.node(id)?;
        let class = node.class_id().to_string();
        let pins: Vec<(PinId, Vec<EdgeId>)> = node
            .pins()
            .map(|p| (p.id(), p.edges().to_vec()))
            .collect();

        for (pin, edges) in pins {
            for edge in edges {
                self.remove_edge(edge)?;
            }
            self.graph.pins.remove(&pin);
        }

        self.graph.entry_points.retain(|_, node| *node != id);
        if let Some(count) = self.graph.class_counts.get_mut(&class) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.graph.class_counts.remove(&class);
            }
        }
        self.graph.scheduler.cancel_node(id);
        self.graph.nodes.shift_remove(&id);

        tracing::debug!(graph = %self.graph.id(), node = %id, %class, "Removed node");
        Ok(())
    }

    /// Check whether two pins may be linked, in either argument order
    pub fn can_create_edge(&self, a: PinId, b: PinId) -> Result<()> {
        if a == b {
            return Err(reject(EditRejection::SelfLink));
        }
        let pin_a = self.graph.pin(a)?;
        let pin_b = self.graph.pin(b)?;
        let (source, target) = if pin_a.direction() == PinDirection::Output {
            (pin_a, pin_b)
        } else {
            (pin_b, pin_a)
        };

        if source.owner() == target.owner() {
            return Err(reject(EditRejection::SameNode));
        }
        if source.direction() == target.direction() {
            return Err(reject(EditRejection::SameDirection));
        }
        if self.reaches(target.owner(), source.owner())? {
            return Err(reject(EditRejection::Cyclic));
        }

        match (source.is_exec(), target.is_exec()) {
            (true, true) => Ok(()),
            (false, false) => {
                let types = &self.graph.registry().types;
                match (source.data_type(), target.data_type()) {
                    (Some(from), Some(to)) if from == to => Ok(()),
                    (Some(from), Some(to)) => Err(reject(EditRejection::IncompatibleTypes {
                        source_type: friendly_name(types.get(from).ok().map(|d| d.friendly_name())),
                        target_type: friendly_name(types.get(to).ok().map(|d| d.friendly_name())),
                    })),
                    (None, _) => Err(reject(EditRejection::UntypedPin(source.label().to_string()))),
                    (_, None) => Err(reject(EditRejection::UntypedPin(target.label().to_string()))),
                }
            }
            _ => Err(reject(EditRejection::ExecDataMismatch)),
        }
    }

    /// Whether following output edges from `start` leads to `goal`
    fn reaches(&self, start: NodeId, goal: NodeId) -> Result<bool> {
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let node = self.graph.node(current)?;
            for pin in node.pins().filter(|p| p.direction() == PinDirection::Output) {
                for edge in pin.edges() {
                    let next = self.graph.pin_owner(self.graph.edge(*edge)?.to)?;
                    if next == goal {
                        return Ok(true);
                    }
                    stack.push(next);
                }
            }
        }
        Ok(false)
    }

    /// Link two pins, in either argument order.
    ///
    /// An exec output keeps a single edge and an input always does, so an
    /// existing edge on either end is replaced.
    pub fn create_edge(&mut self, a: PinId, b: PinId) -> Result<EdgeId> {
        if let Err(err) = self.can_create_edge(a, b) {
            if let Some(reason) = err.rejection() {
                tracing::warn!(graph = %self.graph.id(), %reason, "Edge rejected");
            }
            return Err(err);
        }

        let (source, target) = if self.graph.pin(a)?.direction() == PinDirection::Output {
            (a, b)
        } else {
            (b, a)
        };

        let source_pin = self.graph.pin(source)?;
        let is_exec = source_pin.is_exec();
        if is_exec && source_pin.is_connected() {
            self.disconnect_pin(source)?;
        }
        if self.graph.pin(target)?.is_connected() {
            self.disconnect_pin(target)?;
        }

        let color = match self.graph.pin(source)?.data_type() {
            Some(key) => self.graph.registry().types.color(key),
            None => GraphColor::WHITE,
        };
        let thickness = if is_exec {
            EXEC_EDGE_THICKNESS
        } else {
            DATA_EDGE_THICKNESS
        };

        let id = EdgeId(self.graph.next_edge_id);
        self.graph.next_edge_id += 1;
        self.graph.pin_mut(source)?.add_edge(id);
        self.graph.pin_mut(target)?.add_edge(id);
        self.graph
            .edges
            .insert(id, Edge::new(id, source, target, color, thickness));

        tracing::debug!(graph = %self.graph.id(), edge = %id, %source, %target, "Created edge");
        Ok(id)
    }

    /// Remove an edge; fails if it is already gone
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        let edge = self
            .graph
            .edges
            .shift_remove(&id)
            .ok_or(GraphError::EdgeNotFound(id))?;
        for pin in [edge.from, edge.to] {
            if let Ok(pin) = self.graph.pin_mut(pin) {
                pin.remove_edge(id);
            }
        }
        Ok(())
    }

    /// Remove every edge attached to a pin
    pub fn disconnect_pin(&mut self, pin: PinId) -> Result<()> {
        let edges = self.graph.pin(pin)?.edges().to_vec();
        for edge in edges {
            self.remove_edge(edge)?;
        }
        Ok(())
    }

    /// Add a variable with a typed default value
    pub fn add_variable<T: ScriptType>(&mut self, name: &str, default: T) -> Result<()> {
        let mut data = DataObject::create::<T>(&self.graph.registry().types)?;
        data.set(default)?;
        self.add_variable_data(name, data)
    }

    /// Add a variable from an existing default value
    pub fn add_variable_data(&mut self, name: &str, default: DataObject) -> Result<()> {
        if self.graph.variables.contains_key(name) {
            return Err(GraphError::VariableExists(name.to_string()));
        }
        if !default.is_live() {
            return Err(TypeError::Empty.into());
        }
        self.graph
            .variables
            .insert(name.to_string(), Variable::new(name, default));
        Ok(())
    }

    /// Remove a variable and every node bound to it
    pub fn remove_variable(&mut self, name: &str) -> Result<()> {
        if !self.graph.variables.contains_key(name) {
            return Err(GraphError::UnknownVariable(name.to_string()));
        }
        let bound: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|n| n.variable() == Some(name))
            .map(Node::id)
            .collect();
        for node in bound {
            self.remove_node(node)?;
        }
        self.graph.variables.shift_remove(name);
        Ok(())
    }

    /// Add a node that reads a variable
    pub fn add_get_variable_node(&mut self, name: &str) -> Result<NodeId> {
        self.add_variable_node(variables::GET_VARIABLE, name)
    }

    /// Add a node that writes a variable
    pub fn add_set_variable_node(&mut self, name: &str) -> Result<NodeId> {
        self.add_variable_node(variables::SET_VARIABLE, name)
    }

    fn add_variable_node(&mut self, class: &str, name: &str) -> Result<NodeId> {
        let registry = Arc::clone(self.graph.registry());
        let mut node = registry.nodes.create_node(class, &registry.types)?;
        self.bind_variable(&mut node, name)?;
        self.register_node(node)
    }

    /// Bind a node's variable pins to a graph variable
    pub(crate) fn bind_variable(&self, node: &mut Node, name: &str) -> Result<()> {
        let variable = self.graph.variable(name)?;
        node.set_variable(name);
        for pin in node.pins_mut().filter(|p| p.kind() == PinKind::Variable) {
            pin.bind_variable_type(variable.data());
        }
        Ok(())
    }

    /// Set the local value of a pin
    pub fn set_pin_value<T: ScriptType>(&mut self, node: NodeId, label: &str, value: T) -> Result<()> {
        self.graph
            .node_mut(node)?
            .pin_by_label_mut(label)?
            .data_mut()
            .set(value)?;
        Ok(())
    }

    /// Rename a pin by label
    pub fn rename_pin(&mut self, node: NodeId, label: &str, new_label: &str) -> Result<()> {
        self.graph.node_mut(node)?.rename_pin(label, new_label)
    }

    /// Rename a pin by ID
    pub fn rename_pin_by_id(&mut self, pin: PinId, new_label: &str) -> Result<()> {
        let owner = self.graph.pin_owner(pin)?;
        self.graph.node_mut(owner)?.rename_pin_by_id(pin, new_label)
    }

    /// Update a node's cached editor position
    pub fn set_node_position(&mut self, node: NodeId, x: f32, y: f32, z: f32) -> Result<()> {
        self.graph.node_mut(node)?.set_position([x, y, z]);
        Ok(())
    }

    /// A node's cached editor position
    pub fn node_position(&self, node: NodeId) -> Result<[f32; 3]> {
        Ok(self.graph.node(node)?.position())
    }
}

fn reject(reason: EditRejection) -> GraphError {
    GraphError::Rejected(reason)
}

fn friendly_name(name: Option<&str>) -> String {
    name.unwrap_or("<unregistered>").to_string()
}
