// SPDX-License-Identifier: MIT OR Apache-2.0
//! Variable access nodes.
//!
//! These classes are internal: they are created through
//! [`Schema::add_get_variable_node`](crate::schema::Schema::add_get_variable_node)
//! and its setter twin, which bind the `Value` pin to the variable's type.

use crate::error::Result;
use crate::execution::{ExecContext, Flow};
use crate::node::{operation, NodeCategory, NodeClass, NodeFlags, NodeRegistry};
use crate::nodes::{exec_pair, OUT};
use crate::pin::PinSpec;
use crate::types::GraphColor;

/// Class ID of the variable getter
pub const GET_VARIABLE: &str = "get_variable";
/// Class ID of the variable setter
pub const SET_VARIABLE: &str = "set_variable";

/// Variable pin on both classes
pub const VALUE: &str = "Value";

const VARIABLE_COLOR: GraphColor = GraphColor::new(40, 90, 160, 255);

fn internal() -> NodeFlags {
    NodeFlags {
        internal_only: true,
        ..NodeFlags::default()
    }
}

fn get_variable(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let value = ctx.variable().map(|variable| variable.data().value().cloned());
    match value {
        Ok(Some(value)) => {
            ctx.set_output_value(VALUE, value)?;
            ctx.exit()
        }
        Ok(None) => ctx.exit_with_error("Variable has no value"),
        Err(err) => ctx.exit_with_error(err.to_string()),
    }
}

fn set_variable(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let value = ctx.input_value(VALUE)?;
    ctx.set_variable_value(value)?;
    ctx.exit_via_pin(OUT)
}

/// Register the variable node classes
pub fn register(registry: &mut NodeRegistry) -> Result<()> {
    registry.register(NodeClass {
        id: GET_VARIABLE.to_string(),
        title: "Get".to_string(),
        category: NodeCategory::Variables,
        description: "Reads a graph variable.".to_string(),
        pins: vec![PinSpec::variable_output(VALUE)],
        flags: internal(),
        header_color: VARIABLE_COLOR,
        operation: operation(get_variable),
    })?;

    let mut pins = exec_pair().to_vec();
    pins.push(PinSpec::variable_input(VALUE));
    registry.register(NodeClass {
        id: SET_VARIABLE.to_string(),
        title: "Set".to_string(),
        category: NodeCategory::Variables,
        description: "Writes a graph variable.".to_string(),
        pins,
        flags: internal(),
        header_color: VARIABLE_COLOR,
        operation: operation(set_variable),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ScriptGraph;
    use crate::registry::ScriptRegistry;
    use crate::types::TypeKey;
    use std::sync::Arc;

    fn graph() -> ScriptGraph {
        ScriptGraph::new(Arc::new(ScriptRegistry::with_builtins().unwrap()))
    }

    #[test]
    fn test_get_reads_current_value() {
        let mut graph = graph();
        graph.schema().add_variable("Speed", 2.5f32).unwrap();
        let get = graph.schema().add_get_variable_node("Speed").unwrap();
        assert_eq!(
            graph.pin_by_label(get, VALUE).unwrap().data_type(),
            Some(TypeKey::of::<f32>())
        );

        graph.exec(get, None).unwrap();
        assert_eq!(graph.pin_data::<f32>(get, VALUE).unwrap(), 2.5);

        graph.set_variable("Speed", 4.0f32).unwrap();
        graph.exec(get, None).unwrap();
        assert_eq!(graph.pin_data::<f32>(get, VALUE).unwrap(), 4.0);
    }

    #[test]
    fn test_set_writes_variable() {
        let mut graph = graph();
        graph.schema().add_variable("Count", 0).unwrap();
        let set = graph.schema().add_set_variable_node("Count").unwrap();
        graph.schema().set_pin_value(set, VALUE, 9).unwrap();

        let out = graph.pin_by_label(set, OUT).unwrap().id();
        assert_eq!(graph.exec(set, None).unwrap(), Flow::Exit(out));
        assert_eq!(graph.variable_value::<i32>("Count").unwrap(), 9);

        graph.reset_variables();
        assert_eq!(graph.variable_value::<i32>("Count").unwrap(), 0);
    }

    #[test]
    fn test_unbound_getter_fails() {
        let mut graph = graph();
        let get = graph.schema().add_node(GET_VARIABLE).unwrap();
        assert_eq!(graph.exec(get, None).unwrap(), Flow::Halt);
        assert!(graph.node(get).unwrap().has_error());
    }

    #[test]
    fn test_internal_classes_hidden_from_palette() {
        let registry = ScriptRegistry::with_builtins().unwrap();
        let names = registry.nodes.node_names();
        assert!(!names.values().any(|id| id == GET_VARIABLE || id == SET_VARIABLE));
    }
}
