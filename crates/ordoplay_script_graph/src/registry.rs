// SPDX-License-Identifier: MIT OR Apache-2.0
//! Combined type and node class registry shared by graphs.

use crate::error::Result;
use crate::node::NodeRegistry;
use crate::nodes::register_builtin_nodes;
use crate::types::{register_builtin_types, TypeRegistry};
use std::sync::Arc;

/// Everything a graph needs to instantiate nodes and values.
///
/// Built once at startup, then shared read-only between graphs.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    /// Value types
    pub types: TypeRegistry,
    /// Node classes
    pub nodes: NodeRegistry,
}

impl ScriptRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in value types and node library
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        register_builtin_types(&mut registry.types)?;
        register_builtin_nodes(&mut registry.nodes)?;
        tracing::debug!(
            types = registry.types.len(),
            nodes = registry.nodes.len(),
            "Script registry ready"
        );
        Ok(registry)
    }

    /// Freeze for sharing
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
