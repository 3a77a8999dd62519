// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node classes and node instances.

use crate::error::{GraphError, Result};
use crate::execution::{ExecContext, Flow};
use crate::pin::{Pin, PinKind, PinSpec};
use crate::types::{GraphColor, TypeRegistry};
use crate::uid::{NodeId, PinId};
use crate::value::ScriptType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Node class category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Entry points (begin play, tick)
    Events,
    /// Math operations
    Math,
    /// Branching and timing
    Flow,
    /// Text formatting and output
    Text,
    /// Variable access
    Variables,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    Custom,
}

/// Behavior flags for a node class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Can be bound to an entry handle and run directly
    pub entry: bool,
    /// Hidden from editor palettes
    pub internal_only: bool,
    /// Only meaningful in debug builds
    pub debug_only: bool,
    /// Maximum instances per graph, 0 for unlimited
    pub max_instances: usize,
}

impl NodeFlags {
    /// Flags for an event node: entry, at most one per graph
    pub fn event() -> Self {
        Self {
            entry: true,
            max_instances: 1,
            ..Self::default()
        }
    }
}

/// Operation run when a node executes
pub type NodeOperation = Arc<dyn Fn(&mut ExecContext<'_>) -> Result<Flow> + Send + Sync>;

/// Wrap a function or closure as a [`NodeOperation`]
pub fn operation<F>(f: F) -> NodeOperation
where
    F: Fn(&mut ExecContext<'_>) -> Result<Flow> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Node class definition
#[derive(Clone)]
pub struct NodeClass {
    /// Unique class identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Pins every instance starts with
    pub pins: Vec<PinSpec>,
    /// Behavior flags
    pub flags: NodeFlags,
    /// Header color for editors
    pub header_color: GraphColor,
    /// Operation
    pub operation: NodeOperation,
}

impl fmt::Debug for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeClass")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("category", &self.category)
            .field("pins", &self.pins)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A node instance in a graph
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    class: Arc<NodeClass>,
    pins: IndexMap<PinId, Pin>,
    labels: HashMap<String, PinId>,
    position: [f32; 3],
    variable: Option<String>,
    error: Option<String>,
}

impl Node {
    /// Create a new node from a class definition
    pub fn new(class: Arc<NodeClass>, types: &TypeRegistry) -> Result<Self> {
        let mut node = Self {
            id: NodeId::mint(),
            class: Arc::clone(&class),
            pins: IndexMap::new(),
            labels: HashMap::new(),
            position: [0.0; 3],
            variable: None,
            error: None,
        };
        for spec in &class.pins {
            node.add_pin(spec, types)?;
        }
        Ok(node)
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Class definition
    pub fn class(&self) -> &Arc<NodeClass> {
        &self.class
    }

    /// Class identifier
    pub fn class_id(&self) -> &str {
        &self.class.id
    }

    /// Display title
    pub fn title(&self) -> &str {
        &self.class.title
    }

    /// Behavior flags
    pub fn flags(&self) -> NodeFlags {
        self.class.flags
    }

    /// Whether the class is an entry node
    pub fn is_entry(&self) -> bool {
        self.class.flags.entry
    }

    /// Whether the node has exec pins
    pub fn is_exec(&self) -> bool {
        self.pins.values().any(Pin::is_exec)
    }

    /// A node without exec pins, evaluated on demand when its outputs are read
    pub fn is_pure(&self) -> bool {
        !self.is_exec()
    }

    /// Cached editor position
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    /// Name of the bound graph variable, for variable nodes
    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    pub(crate) fn set_variable(&mut self, name: impl Into<String>) {
        self.variable = Some(name.into());
    }

    /// Whether the last execution ended in an error
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Message of the last execution error
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }

    /// Add a pin from a declaration; labels are unique per node
    pub(crate) fn add_pin(&mut self, spec: &PinSpec, types: &TypeRegistry) -> Result<PinId> {
        if self.labels.contains_key(&spec.label) {
            return Err(GraphError::DuplicatePinLabel {
                node: self.id,
                label: spec.label.clone(),
            });
        }
        let pin = Pin::from_spec(spec, self.id, types)?;
        let id = pin.id();
        self.labels.insert(spec.label.clone(), id);
        self.pins.insert(id, pin);
        Ok(id)
    }

    /// All pins in declaration order
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub(crate) fn pins_mut(&mut self) -> impl Iterator<Item = &mut Pin> {
        self.pins.values_mut()
    }

    /// Get a pin by ID
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(&id)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.get_mut(&id)
    }

    /// Whether a label names a pin on this node
    pub fn is_pin_label(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    /// Pin ID for a label
    pub fn pin_id(&self, label: &str) -> Result<PinId> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| GraphError::PinLabelNotFound {
                node: self.id,
                label: label.to_string(),
            })
    }

    /// Get a pin by label
    pub fn pin_by_label(&self, label: &str) -> Result<&Pin> {
        let id = self.pin_id(label)?;
        self.pins.get(&id).ok_or(GraphError::PinNotFound(id))
    }

    pub(crate) fn pin_by_label_mut(&mut self, label: &str) -> Result<&mut Pin> {
        let id = self.pin_id(label)?;
        self.pins.get_mut(&id).ok_or(GraphError::PinNotFound(id))
    }

    /// First pin of a kind, in declaration order
    pub fn first_pin_of_kind(&self, kind: PinKind) -> Option<&Pin> {
        self.pins.values().find(|p| p.kind() == kind)
    }

    /// Read a pin's local value. Connected inputs are resolved by the graph.
    pub fn local_pin_data<T: ScriptType>(&self, label: &str) -> Result<T> {
        Ok(self.pin_by_label(label)?.get_data()?)
    }

    /// Encode a pin's local value
    pub fn raw_pin_data(&self, label: &str) -> Result<Vec<u8>> {
        Ok(self.pin_by_label(label)?.data().to_bytes()?)
    }

    pub(crate) fn set_raw_pin_data(&mut self, label: &str, bytes: &[u8]) -> Result<()> {
        self.pin_by_label_mut(label)?.data_mut().set_from_bytes(bytes)?;
        Ok(())
    }

    /// Rename a pin by label. Both indices change together or not at all.
    pub(crate) fn rename_pin(&mut self, label: &str, new_label: &str) -> Result<()> {
        let id = self.pin_id(label)?;
        self.rename_pin_by_id(id, new_label)
    }

    /// Rename a pin by ID. Both indices change together or not at all.
    pub(crate) fn rename_pin_by_id(&mut self, id: PinId, new_label: &str) -> Result<()> {
        let old_label = self
            .pins
            .get(&id)
            .map(|p| p.label().to_string())
            .ok_or(GraphError::PinNotFound(id))?;
        if old_label == new_label {
            return Ok(());
        }
        if self.labels.contains_key(new_label) {
            return Err(GraphError::DuplicatePinLabel {
                node: self.id,
                label: new_label.to_string(),
            });
        }
        self.labels.remove(&old_label);
        self.labels.insert(new_label.to_string(), id);
        if let Some(pin) = self.pins.get_mut(&id) {
            pin.set_label(new_label);
        }
        Ok(())
    }
}

/// Registry of available node classes
#[derive(Debug)]
pub struct NodeRegistry {
    /// Registered node classes by ID
    classes: IndexMap<String, Arc<NodeClass>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            classes: IndexMap::new(),
        }
    }

    /// Register a node class
    pub fn register(&mut self, class: NodeClass) -> Result<()> {
        if self.classes.contains_key(&class.id) {
            return Err(GraphError::DuplicateNodeClass(class.id));
        }
        tracing::debug!(class = %class.id, "Registered node class");
        self.classes.insert(class.id.clone(), Arc::new(class));
        Ok(())
    }

    /// Get a node class by ID
    pub fn get(&self, id: &str) -> Result<&Arc<NodeClass>> {
        self.classes
            .get(id)
            .ok_or_else(|| GraphError::UnknownNodeType(id.to_string()))
    }

    /// Get all registered classes
    pub fn classes(&self) -> impl Iterator<Item = &Arc<NodeClass>> {
        self.classes.values()
    }

    /// Get classes by category
    pub fn classes_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &Arc<NodeClass>> {
        self.classes.values().filter(move |c| c.category == category)
    }

    /// Title to class ID for every class an editor may offer
    pub fn node_names(&self) -> BTreeMap<String, String> {
        self.classes
            .values()
            .filter(|c| !c.flags.internal_only)
            .map(|c| (c.title.clone(), c.id.clone()))
            .collect()
    }

    /// Create a node from a class ID
    pub fn create_node(&self, id: &str, types: &TypeRegistry) -> Result<Node> {
        Node::new(Arc::clone(self.get(id)?), types)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes are registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
