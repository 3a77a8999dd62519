// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::data_object::DataObject;
use crate::types::{TypeError, TypeKey, TypeRegistry};
use crate::uid::{EdgeId, NodeId, PinId};
use crate::value::{ScriptType, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

/// What a pin carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// Execution flow, no payload
    Exec,
    /// Typed data
    Data,
    /// Typed data bound to a graph variable
    Variable,
}

/// Declaration of a pin on a node class
#[derive(Debug, Clone)]
pub struct PinSpec {
    /// Label, unique within the node
    pub label: String,
    /// Direction
    pub direction: PinDirection,
    /// Kind
    pub kind: PinKind,
    /// Value type; `None` for exec pins and unbound variable pins
    pub data_type: Option<TypeKey>,
    /// Initial value, overriding the type's default
    pub default: Option<Value>,
    /// Whether editors should draw the label
    pub label_visible: bool,
}

impl PinSpec {
    fn new(label: impl Into<String>, direction: PinDirection, kind: PinKind) -> Self {
        Self {
            label: label.into(),
            direction,
            kind,
            data_type: None,
            default: None,
            label_visible: true,
        }
    }

    /// Exec input
    pub fn exec_input(label: impl Into<String>) -> Self {
        Self::new(label, PinDirection::Input, PinKind::Exec)
    }

    /// Exec output
    pub fn exec_output(label: impl Into<String>) -> Self {
        Self::new(label, PinDirection::Output, PinKind::Exec)
    }

    /// Data input of type `T`
    pub fn data_input<T: ScriptType>(label: impl Into<String>) -> Self {
        Self {
            data_type: Some(TypeKey::of::<T>()),
            ..Self::new(label, PinDirection::Input, PinKind::Data)
        }
    }

    /// Data output of type `T`
    pub fn data_output<T: ScriptType>(label: impl Into<String>) -> Self {
        Self {
            data_type: Some(TypeKey::of::<T>()),
            ..Self::new(label, PinDirection::Output, PinKind::Data)
        }
    }

    /// Variable input, typed when bound to a variable
    pub fn variable_input(label: impl Into<String>) -> Self {
        Self::new(label, PinDirection::Input, PinKind::Variable)
    }

    /// Variable output, typed when bound to a variable
    pub fn variable_output(label: impl Into<String>) -> Self {
        Self::new(label, PinDirection::Output, PinKind::Variable)
    }

    /// Set the initial value
    pub fn with_default<T: ScriptType>(mut self, value: T) -> Self {
        self.default = Some(value.into_value());
        self
    }

    /// Hide the label in editors
    pub fn hide_label(mut self) -> Self {
        self.label_visible = false;
        self
    }
}

/// A pin on a node instance
#[derive(Debug)]
pub struct Pin {
    id: PinId,
    owner: NodeId,
    label: String,
    direction: PinDirection,
    kind: PinKind,
    edges: Vec<EdgeId>,
    data: DataObject,
    label_visible: bool,
}

impl Pin {
    /// Instantiate a pin from its declaration
    pub fn from_spec(spec: &PinSpec, owner: NodeId, types: &TypeRegistry) -> Result<Self, TypeError> {
        let mut data = match spec.data_type {
            Some(key) => DataObject::from_descriptor(Arc::clone(types.get(key)?)),
            None => DataObject::null(),
        };
        if let Some(default) = &spec.default {
            data.set_value(default.clone())?;
        }
        Ok(Self {
            id: PinId::mint(),
            owner,
            label: spec.label.clone(),
            direction: spec.direction,
            kind: spec.kind,
            edges: Vec::new(),
            data,
            label_visible: spec.label_visible,
        })
    }

    /// Pin ID
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Owning node
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Direction
    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    /// Kind
    pub fn kind(&self) -> PinKind {
        self.kind
    }

    /// Whether this is an exec pin
    pub fn is_exec(&self) -> bool {
        self.kind == PinKind::Exec
    }

    /// Whether editors draw the label
    pub fn is_label_visible(&self) -> bool {
        self.label_visible
    }

    /// Connected edges; inputs have at most one
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Whether any edge is attached
    pub fn is_connected(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Type of the carried value
    pub fn data_type(&self) -> Option<TypeKey> {
        self.data.type_key()
    }

    /// Local value storage
    pub fn data(&self) -> &DataObject {
        &self.data
    }

    /// Read the local value as `T`
    pub fn get_data<T: ScriptType>(&self) -> Result<T, TypeError> {
        self.data.get()
    }

    pub(crate) fn data_mut(&mut self) -> &mut DataObject {
        &mut self.data
    }

    pub(crate) fn add_edge(&mut self, edge: EdgeId) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| *e != edge);
        self.edges.len() != before
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Give a variable pin the variable's type
    pub(crate) fn bind_variable_type(&mut self, data: &DataObject) {
        self.data.assign_from(data);
    }
}
