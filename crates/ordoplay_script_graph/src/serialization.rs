// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON graph documents.
//!
//! A document stores variables with their default values, nodes with the
//! encoded values of their data and variable pins, and edges by node UID and
//! pin label. Node UIDs are only meaningful inside one document.
//!
//! Loading happens in three passes: variables, then nodes (variable binding,
//! pin values, position, entry handle), then edges. Edges go through the
//! normal legality checks, so a document can never produce an illegal graph.

use crate::data_object::DataObject;
use crate::error::{GraphError, Result};
use crate::graph::ScriptGraph;
use crate::node::Node;
use crate::pin::PinKind;
use crate::registry::ScriptRegistry;
use crate::schema::Schema;
use crate::types::TypeError;
use crate::uid::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Serialized graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Graph name
    pub name: String,
    /// Variables in declaration order
    #[serde(default)]
    pub variables: Vec<VariableDocument>,
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    /// Edges in creation order
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

/// Serialized variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDocument {
    /// Variable name
    pub name: String,
    /// Friendly name of the value type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Encoded default value
    pub value: Vec<u8>,
}

/// Serialized node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Node class ID
    #[serde(rename = "type")]
    pub class: String,
    /// Document-scoped node ID
    #[serde(rename = "UID")]
    pub uid: u64,
    /// Entry handle, empty when the node is not an entry point
    #[serde(rename = "entryHandle", default)]
    pub entry_handle: String,
    /// Editor X position
    #[serde(default)]
    pub x: f32,
    /// Editor Y position
    #[serde(default)]
    pub y: f32,
    /// Editor Z position
    #[serde(default)]
    pub z: f32,
    /// Bound variable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// Pin values by label
    #[serde(default)]
    pub pins: Vec<PinDocument>,
}

/// Serialized pin value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDocument {
    /// Pin label
    pub name: String,
    /// Encoded value
    pub value: Vec<u8>,
}

/// Serialized edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDocument {
    /// UID of the node owning the output pin
    #[serde(rename = "sourceUID")]
    pub source_uid: u64,
    /// Output pin label
    #[serde(rename = "sourcePin")]
    pub source_pin: String,
    /// UID of the node owning the input pin
    #[serde(rename = "targetUID")]
    pub target_uid: u64,
    /// Input pin label
    #[serde(rename = "targetPin")]
    pub target_pin: String,
}

impl GraphDocument {
    /// Parse a document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn node_document(graph: &ScriptGraph, node: &Node) -> Result<NodeDocument> {
    let mut pins = Vec::new();
    for pin in node.pins().filter(|p| p.kind() != PinKind::Exec) {
        if !pin.data().is_live() {
            continue;
        }
        pins.push(PinDocument {
            name: pin.label().to_string(),
            value: pin.data().to_bytes()?,
        });
    }
    let [x, y, z] = node.position();
    Ok(NodeDocument {
        class: node.class_id().to_string(),
        uid: node.id().value(),
        entry_handle: graph.entry_handle_of(node.id()).unwrap_or_default().to_string(),
        x,
        y,
        z,
        variable: node.variable().map(str::to_string),
        pins,
    })
}

impl ScriptGraph {
    /// Capture the graph as a document
    pub fn to_document(&self) -> Result<GraphDocument> {
        let mut variables = Vec::new();
        for variable in self.variables() {
            let default = variable.default_data();
            let descriptor = default.descriptor().ok_or(TypeError::Empty)?;
            variables.push(VariableDocument {
                name: variable.name().to_string(),
                type_name: descriptor.friendly_name().to_string(),
                value: default.to_bytes()?,
            });
        }

        let nodes = self
            .nodes()
            .map(|node| node_document(self, node))
            .collect::<Result<Vec<_>>>()?;

        let mut edges = Vec::new();
        for edge in self.edges() {
            let source = self.pin(edge.from)?;
            let target = self.pin(edge.to)?;
            edges.push(EdgeDocument {
                source_uid: source.owner().value(),
                source_pin: source.label().to_string(),
                target_uid: target.owner().value(),
                target_pin: target.label().to_string(),
            });
        }

        Ok(GraphDocument {
            name: self.name.clone(),
            variables,
            nodes,
            edges,
        })
    }

    /// Serialize the graph to JSON
    pub fn to_json(&self) -> Result<String> {
        self.to_document()?.to_json()
    }

    /// Build a graph from a document
    pub fn from_document(registry: Arc<ScriptRegistry>, document: &GraphDocument) -> Result<Self> {
        let mut graph = Self::new(registry);
        graph.schema().load_document(document)?;
        Ok(graph)
    }

    /// Build a graph from JSON
    pub fn from_json(registry: Arc<ScriptRegistry>, json: &str) -> Result<Self> {
        Self::from_document(registry, &GraphDocument::from_json(json)?)
    }

    /// Independent copy with fresh IDs everywhere, made by a save and load
    /// round trip
    pub fn bake(&self) -> Result<Self> {
        let document = self.to_document()?;
        Self::from_document(Arc::clone(self.registry()), &document)
    }
}

/// What a document load has added so far, for rolling it back
#[derive(Default)]
struct LoadedParts {
    variables: Vec<String>,
    nodes: Vec<NodeId>,
}

impl Schema<'_> {
    /// Add everything a document describes to the graph.
    ///
    /// Loading is all-or-nothing: on error every variable, node and edge the
    /// document added is removed again and the graph name is restored.
    pub fn load_document(&mut self, document: &GraphDocument) -> Result<()> {
        let previous_name = self.graph().name.clone();
        let mut loaded = LoadedParts::default();
        let outcome = self.apply_document(document, &mut loaded);
        if outcome.is_err() {
            self.roll_back(&loaded)?;
            self.graph_mut().name = previous_name;
        }
        outcome
    }

    fn roll_back(&mut self, loaded: &LoadedParts) -> Result<()> {
        for &node in loaded.nodes.iter().rev() {
            if self.graph().node(node).is_ok() {
                self.remove_node(node)?;
            }
        }
        for name in loaded.variables.iter().rev() {
            self.remove_variable(name)?;
        }
        Ok(())
    }

    fn apply_document(&mut self, document: &GraphDocument, loaded: &mut LoadedParts) -> Result<()> {
        let registry = Arc::clone(self.graph().registry());
        self.graph_mut().name.clone_from(&document.name);

        for variable in &document.variables {
            let descriptor = registry.types.by_name(&variable.type_name)?;
            let value = descriptor.deserialize(&variable.value)?;
            let data = DataObject::with_value(Arc::clone(descriptor), value)?;
            self.add_variable_data(&variable.name, data)?;
            loaded.variables.push(variable.name.clone());
        }

        let mut uids: HashMap<u64, NodeId> = HashMap::new();
        for entry in &document.nodes {
            let mut node = registry.nodes.create_node(&entry.class, &registry.types)?;
            if let Some(name) = &entry.variable {
                self.bind_variable(&mut node, name)?;
            }
            for pin in &entry.pins {
                if node.is_pin_label(&pin.name) {
                    node.set_raw_pin_data(&pin.name, &pin.value)?;
                } else {
                    tracing::warn!(class = %entry.class, pin = %pin.name, "Skipping unknown pin in document");
                }
            }
            node.set_position([entry.x, entry.y, entry.z]);

            let id = self.register_node(node)?;
            loaded.nodes.push(id);
            if !entry.entry_handle.is_empty() {
                self.register_entry_point(id, &entry.entry_handle)?;
            }
            if uids.insert(entry.uid, id).is_some() {
                return Err(GraphError::InvalidDocument(format!("duplicate node UID {}", entry.uid)));
            }
        }

        let lookup = |uid: u64| {
            uids.get(&uid)
                .copied()
                .ok_or_else(|| GraphError::InvalidDocument(format!("edge references unknown node UID {uid}")))
        };
        for edge in &document.edges {
            let source = self.graph().node(lookup(edge.source_uid)?)?.pin_id(&edge.source_pin)?;
            let target = self.graph().node(lookup(edge.target_uid)?)?.pin_id(&edge.target_pin)?;
            self.create_edge(source, target)?;
        }

        tracing::debug!(
            graph = %self.graph().id(),
            nodes = document.nodes.len(),
            edges = document.edges.len(),
            "Loaded graph document"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{events, math, text};
    use crate::uid::PinId;

    fn registry() -> Arc<ScriptRegistry> {
        Arc::new(ScriptRegistry::with_builtins().unwrap())
    }

    fn pin(graph: &ScriptGraph, node: NodeId, label: &str) -> PinId {
        graph.pin_by_label(node, label).unwrap().id()
    }

    #[test]
    fn test_document_field_names() {
        let mut graph = ScriptGraph::new(registry());
        graph.schema().add_variable("Health", 100).unwrap();
        let get = graph.schema().add_get_variable_node("Health").unwrap();
        let convert = graph.schema().add_node(text::INT_TO_STRING).unwrap();
        let (source, target) = (pin(&graph, get, "Value"), pin(&graph, convert, "Value"));
        graph.schema().create_edge(source, target).unwrap();

        let json: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "ScriptGraph");
        assert_eq!(json["variables"][0]["type"], "Integer");
        assert_eq!(json["variables"][0]["value"], serde_json::json!([100, 0, 0, 0]));
        assert_eq!(json["nodes"][0]["type"], "get_variable");
        assert_eq!(json["nodes"][0]["variable"], "Health");
        assert!(json["nodes"][1].get("variable").is_none());
        assert_eq!(json["nodes"][0]["entryHandle"], "");
        assert_eq!(json["edges"][0]["sourcePin"], "Value");
        assert_eq!(json["edges"][0]["targetUID"], serde_json::json!(convert.value()));
    }

    #[test]
    fn test_exec_pins_not_persisted() {
        let mut graph = ScriptGraph::new(registry());
        graph.schema().add_node(math::ADD).unwrap();
        let document = graph.to_document().unwrap();
        let labels: Vec<_> = document.nodes[0].pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(labels, ["A", "B", "Result"]);
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let mut graph = ScriptGraph::with_default_entries(registry()).unwrap();
        graph.name = "Door".to_string();
        let add = graph.schema().add_node(math::ADD).unwrap();
        graph.schema().set_pin_value(add, "A", 2.0f32).unwrap();
        graph.schema().set_node_position(add, 10.0, -4.0, 0.5).unwrap();
        let begin = graph.entry_point(events::BEGIN_PLAY).unwrap();
        let (out, input) = (pin(&graph, begin, "Out"), pin(&graph, add, "In"));
        graph.schema().create_edge(out, input).unwrap();

        let loaded = ScriptGraph::from_json(registry(), &graph.to_json().unwrap()).unwrap();
        assert_eq!(loaded.name, "Door");
        assert_eq!(loaded.node_count(), 3);
        assert_eq!(loaded.edge_count(), 1);
        assert_eq!(loaded.entry_handles().collect::<Vec<_>>(), [events::BEGIN_PLAY, events::TICK]);

        let add = loaded
            .nodes()
            .find(|n| n.class_id() == math::ADD)
            .unwrap();
        assert_eq!(add.local_pin_data::<f32>("A").unwrap(), 2.0);
        assert_eq!(add.position(), [10.0, -4.0, 0.5]);
        assert!(add.pin_by_label("In").unwrap().is_connected());

        let edge = loaded.edges().next().unwrap();
        assert_eq!(loaded.pin_owner(edge.from).unwrap(), loaded.entry_point(events::BEGIN_PLAY).unwrap());
        assert_eq!(loaded.pin_owner(edge.to).unwrap(), add.id());
    }

    #[test]
    fn test_bake_mints_fresh_ids() {
        let graph = ScriptGraph::with_default_entries(registry()).unwrap();
        let baked = graph.bake().unwrap();
        assert_ne!(baked.id(), graph.id());
        assert_eq!(baked.node_count(), graph.node_count());
        let tick = graph.entry_point(events::TICK).unwrap();
        assert_ne!(baked.entry_point(events::TICK).unwrap(), tick);
    }

    #[test]
    fn test_illegal_edge_in_document_is_rejected() {
        let mut graph = ScriptGraph::new(registry());
        let first = graph.schema().add_node(math::ADD).unwrap();
        let second = graph.schema().add_node(math::ADD).unwrap();
        let (out, input) = (pin(&graph, first, "Out"), pin(&graph, second, "In"));
        graph.schema().create_edge(out, input).unwrap();

        let mut document = graph.to_document().unwrap();
        document.edges.push(EdgeDocument {
            source_uid: second.value(),
            source_pin: "Out".to_string(),
            target_uid: first.value(),
            target_pin: "In".to_string(),
        });
        let err = ScriptGraph::from_document(registry(), &document).unwrap_err();
        assert!(err.rejection().is_some());
    }

    fn counts(graph: &ScriptGraph) -> (usize, usize, usize) {
        (graph.node_count(), graph.edge_count(), graph.variables().count())
    }

    #[test]
    fn test_failed_load_leaves_graph_unchanged() {
        let mut source = ScriptGraph::new(registry());
        source.schema().add_variable("Speed", 2.0f32).unwrap();
        source.schema().add_get_variable_node("Speed").unwrap();
        let first = source.schema().add_node(math::ADD).unwrap();
        let second = source.schema().add_node(math::ADD).unwrap();
        let (out, input) = (pin(&source, first, "Out"), pin(&source, second, "In"));
        source.schema().create_edge(out, input).unwrap();
        let mut document = source.to_document().unwrap();
        document.edges.push(EdgeDocument {
            source_uid: second.value(),
            source_pin: "Out".to_string(),
            target_uid: first.value(),
            target_pin: "In".to_string(),
        });

        let mut graph = ScriptGraph::new(registry());
        graph.name = "Live".to_string();
        let kept = graph.schema().add_node(math::MUL).unwrap();
        let before = counts(&graph);

        let err = graph.schema().load_document(&document).unwrap_err();
        assert!(err.rejection().is_some());
        assert_eq!(counts(&graph), before);
        assert_eq!(graph.name, "Live");
        assert!(graph.node(kept).is_ok());
        assert_eq!(graph.class_count(math::ADD), 0);

        // A clashing variable name also rolls back the variables added before it
        graph.schema().add_variable("Speed", 1.0f32).unwrap();
        let mut document = source.to_document().unwrap();
        document.variables.insert(
            0,
            VariableDocument {
                name: "Lives".to_string(),
                type_name: "Integer".to_string(),
                value: vec![3, 0, 0, 0],
            },
        );
        let before = counts(&graph);
        assert!(matches!(
            graph.schema().load_document(&document),
            Err(GraphError::VariableExists(_))
        ));
        assert_eq!(counts(&graph), before);
        assert!(graph.variable("Lives").is_err());
        assert_eq!(graph.variable_value::<f32>("Speed").unwrap(), 1.0);
    }

    #[test]
    fn test_unknown_references_are_errors() {
        let mut document = GraphDocument {
            name: "Broken".to_string(),
            ..GraphDocument::default()
        };
        document.edges.push(EdgeDocument {
            source_uid: 1,
            source_pin: "Out".to_string(),
            target_uid: 2,
            target_pin: "In".to_string(),
        });
        assert!(matches!(
            ScriptGraph::from_document(registry(), &document),
            Err(GraphError::InvalidDocument(_))
        ));

        let document = GraphDocument::from_json(
            r#"{"name":"Bad","variables":[{"name":"X","type":"Quaternion","value":[]}]}"#,
        )
        .unwrap();
        assert!(ScriptGraph::from_document(registry(), &document).is_err());
        assert!(GraphDocument::from_json("{ not json").is_err());
    }
}
