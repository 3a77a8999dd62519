// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution.
//!
//! Control flow is pushed: a node's operation runs, then leaves through an
//! exec output, which runs whatever node sits at the far end of that pin's
//! edge. Data is pulled: a connected input reads the upstream output at the
//! moment it is asked, running the upstream node first when it is pure.

use crate::data_object::DataObject;
use crate::error::{GraphError, Result};
use crate::graph::ScriptGraph;
use crate::node::Node;
use crate::nodes::events;
use crate::pin::PinDirection;
use crate::scheduler::{Continuation, MailboxRequest};
use crate::types::{TypeError, TypeRegistry};
use crate::uid::{NodeId, PinId};
use crate::value::{ScriptType, Value};
use crate::variable::Variable;
use indexmap::IndexMap;
use std::sync::Arc;

/// How a node operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The chain stopped without reaching an exec output
    Halt,
    /// The chain ended at this unconnected exec output
    Exit(PinId),
}

impl Flow {
    /// The exec output the chain ended at, if any
    pub fn terminal_pin(&self) -> Option<PinId> {
        match self {
            Self::Halt => None,
            Self::Exit(pin) => Some(*pin),
        }
    }
}

/// Values pushed into a node from outside, keyed by pin label
#[derive(Debug, Clone, Default)]
pub struct Payload {
    data: IndexMap<String, DataObject>,
}

impl Payload {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value object under a pin label
    pub fn insert(&mut self, label: impl Into<String>, data: DataObject) {
        self.data.insert(label.into(), data);
    }

    /// Add a typed value under a pin label
    pub fn set<T: ScriptType>(
        &mut self,
        types: &TypeRegistry,
        label: impl Into<String>,
        value: T,
    ) -> std::result::Result<(), TypeError> {
        let mut data = DataObject::create::<T>(types)?;
        data.set(value)?;
        self.insert(label, data);
        Ok(())
    }

    /// Value object for a label
    pub fn get(&self, label: &str) -> Option<&DataObject> {
        self.data.get(label)
    }

    /// Typed value for a label
    pub fn try_get<T: ScriptType>(&self, label: &str) -> Option<T> {
        self.data.get(label).and_then(|d| d.get().ok())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataObject)> {
        self.data.iter().map(|(label, data)| (label.as_str(), data))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What a node operation sees while it runs
pub struct ExecContext<'g> {
    graph: &'g mut ScriptGraph,
    node: NodeId,
    entry_pin: Option<PinId>,
}

impl<'g> ExecContext<'g> {
    /// The graph being run
    pub fn graph(&self) -> &ScriptGraph {
        self.graph
    }

    /// The running node's ID
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The running node
    pub fn node(&self) -> Result<&Node> {
        self.graph.node(self.node)
    }

    /// Exec input the node was entered through, `None` for entry points
    pub fn entry_pin(&self) -> Option<PinId> {
        self.entry_pin
    }

    /// Read an input as `T`, following its edge when connected
    pub fn input<T: ScriptType>(&mut self, label: &str) -> Result<T> {
        self.graph.pin_data(self.node, label)
    }

    /// Read an input as a type-erased value
    pub fn input_value(&mut self, label: &str) -> Result<Value> {
        let pin = self.graph.node(self.node)?.pin_id(label)?;
        self.graph.pin_value(pin)
    }

    /// Write a pin's local value
    pub fn set_output<T: ScriptType>(&mut self, label: &str, value: T) -> Result<()> {
        self.set_output_value(label, value.into_value())
    }

    /// Write a pin's local value from a type-erased value
    pub fn set_output_value(&mut self, label: &str, value: Value) -> Result<()> {
        self.graph
            .node_mut(self.node)?
            .pin_by_label_mut(label)?
            .data_mut()
            .set_value(value)?;
        Ok(())
    }

    /// Finish without following any exec output
    pub fn exit(&mut self) -> Result<Flow> {
        self.graph.node_mut(self.node)?.clear_error();
        Ok(Flow::Halt)
    }

    /// Continue through an exec output
    pub fn exit_via_pin(&mut self, label: &str) -> Result<Flow> {
        self.graph.exit_via_pin(self.node, label)
    }

    /// Flag the node, report to the error handler and stop the chain
    pub fn exit_with_error(&mut self, message: impl Into<String>) -> Result<Flow> {
        self.graph.fail_node(self.node, &message.into())?;
        Ok(Flow::Halt)
    }

    /// The graph variable this node is bound to
    pub fn variable(&self) -> Result<&Variable> {
        let name = self
            .node()?
            .variable()
            .ok_or(GraphError::NotVariableNode(self.node))?;
        self.graph.variable(name)
    }

    /// Overwrite the bound variable's current value
    pub fn set_variable_value(&mut self, value: Value) -> Result<()> {
        let name = self
            .node()?
            .variable()
            .ok_or(GraphError::NotVariableNode(self.node))?
            .to_string();
        self.graph.variable_mut(&name)?.data_mut().set_value(value)?;
        Ok(())
    }

    /// Leave through an exec output after `delay` seconds of graph time
    pub fn schedule(&mut self, delay: f64, label: &str) -> Result<()> {
        let pin = self.graph.node(self.node)?.pin_by_label(label)?;
        if !pin.is_exec() || pin.direction() != PinDirection::Output {
            return Err(GraphError::NotExecPin(label.to_string()));
        }
        let due = self.graph.time + delay.max(0.0);
        self.graph.scheduler.schedule(Continuation {
            due,
            node: self.node,
            pin_label: label.to_string(),
        });
        Ok(())
    }
}

impl ScriptGraph {
    /// Run a node's operation.
    ///
    /// Clears the node's error state first. A failed pure-node input stops
    /// the chain and flags this node too.
    pub fn exec(&mut self, node: NodeId, entry_pin: Option<PinId>) -> Result<Flow> {
        let operation = {
            let target = self.node_mut(node)?;
            target.clear_error();
            Arc::clone(&target.class().operation)
        };

        let mut ctx = ExecContext {
            graph: self,
            node,
            entry_pin,
        };
        match operation(&mut ctx) {
            Err(GraphError::UpstreamFailed { node: failed, message }) => {
                self.fail_node(node, &format!("Input from node {failed} failed: {message}"))?;
                Ok(Flow::Halt)
            }
            other => other,
        }
    }

    /// Run the node bound to an entry handle
    pub fn run(&mut self, handle: &str) -> Result<Flow> {
        let node = self.entry_point(handle)?;
        tracing::debug!(graph = %self.id(), handle, "Running entry point");
        self.exec(node, None)
    }

    /// Follow an exec output of `node`, running the node at the other end
    pub fn exit_via_pin(&mut self, node: NodeId, label: &str) -> Result<Flow> {
        let pin = self.node(node)?.pin_by_label(label)?;
        if !pin.is_exec() || pin.direction() != PinDirection::Output {
            return Err(GraphError::NotExecPin(label.to_string()));
        }
        let Some(&edge) = pin.edges().first() else {
            return Ok(Flow::Exit(pin.id()));
        };

        let target = self.edge(edge)?.to;
        let target_node = self.pin_owner(target)?;
        self.report_edge_flow(edge);
        tracing::trace!(graph = %self.id(), %edge, from = %node, to = %target_node, "Exec flow");
        self.exec(target_node, Some(target))
    }

    pub(crate) fn fail_node(&mut self, node: NodeId, message: &str) -> Result<()> {
        self.node_mut(node)?.set_error(message);
        self.report_flow_error(node, message);
        Ok(())
    }

    /// Current value seen by a pin.
    ///
    /// Connected inputs read their upstream output; a pure upstream node is
    /// run first and its failure is returned as [`GraphError::UpstreamFailed`].
    pub fn pin_value(&mut self, pin: PinId) -> Result<Value> {
        let source = self.data_source_pin(pin)?;
        if source != pin {
            let owner = self.pin_owner(source)?;
            if self.node(owner)?.is_pure() {
                self.exec(owner, None)?;
                if let Some(message) = self.node(owner)?.error_message() {
                    return Err(GraphError::UpstreamFailed {
                        node: owner,
                        message: message.to_string(),
                    });
                }
            }
        }
        self.pin(source)?
            .data()
            .value()
            .cloned()
            .ok_or(GraphError::Type(TypeError::Empty))
    }

    /// Current value seen by a node's pin, as `T`
    pub fn pin_data<T: ScriptType>(&mut self, node: NodeId, label: &str) -> Result<T> {
        let pin = self.node(node)?.pin_id(label)?;
        let value = self.pin_value(pin)?;
        T::from_value(&value).ok_or_else(|| {
            GraphError::Type(TypeError::Mismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: value.type_name().to_string(),
            })
        })
    }

    /// Overwrite pin values on a node from a payload.
    ///
    /// Labels with no matching pin are ignored. Every entry is type-checked
    /// before any pin is written, so a wrong type delivers nothing.
    pub fn deliver_payload(&mut self, node: NodeId, payload: &Payload) -> Result<()> {
        let target = self.node(node)?;
        let mut updates = Vec::new();
        for (label, data) in payload.iter() {
            if !target.is_pin_label(label) {
                continue;
            }
            let value = data.value().cloned().ok_or(TypeError::Empty)?;
            target
                .pin_by_label(label)?
                .data()
                .descriptor()
                .ok_or(TypeError::Empty)?
                .check(&value)?;
            updates.push((label, value));
        }

        let target = self.node_mut(node)?;
        for (label, value) in updates {
            target.pin_by_label_mut(label)?.data_mut().set_value(value)?;
        }
        Ok(())
    }

    /// Advance the graph clock and run the `Tick` entry point
    pub fn tick(&mut self, delta: f32) -> Result<()> {
        self.tick_entry(events::TICK, delta)
    }

    /// Advance the graph clock by `delta` seconds and do the frame's work:
    /// mailbox requests first, then due continuations, then the entry point
    /// bound to `handle` with its `Delta Time` output set.
    pub fn tick_entry(&mut self, handle: &str, delta: f32) -> Result<()> {
        self.time += f64::from(delta);

        for request in self.mailbox.drain() {
            let outcome = match &request {
                MailboxRequest::Run(handle) => self.run(handle).map(drop),
                MailboxRequest::Payload { node, payload } => self.deliver_payload(*node, payload),
            };
            if let Err(err) = outcome {
                tracing::warn!(graph = %self.id(), ?request, %err, "Mailbox request failed");
            }
        }

        // Every drained continuation runs; the first failure is returned after
        let mut first_error = None;
        for continuation in self.scheduler.take_due(self.time) {
            if !self.nodes.contains_key(&continuation.node) {
                continue;
            }
            if let Err(err) = self.exit_via_pin(continuation.node, &continuation.pin_label) {
                tracing::warn!(
                    graph = %self.id(),
                    node = %continuation.node,
                    pin = %continuation.pin_label,
                    %err,
                    "Continuation failed"
                );
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let Ok(entry) = self.entry_point(handle) else {
            return Ok(());
        };
        let node = self.node_mut(entry)?;
        if node.is_pin_label(events::DELTA_TIME) {
            node.pin_by_label_mut(events::DELTA_TIME)?
                .data_mut()
                .set(delta)?;
        }
        self.exec(entry, None)?;
        Ok(())
    }
}
