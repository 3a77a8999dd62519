// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text conversion and debug output nodes.

use crate::error::Result;
use crate::execution::{ExecContext, Flow};
use crate::node::{operation, NodeCategory, NodeClass, NodeFlags, NodeRegistry};
use crate::nodes::{exec_pair, OUT};
use crate::pin::PinSpec;
use crate::types::GraphColor;
use crate::value::ScriptType;

/// Class ID of the debug text node
pub const DEBUG_TEXT: &str = "debug_text";
/// Class ID of the integer formatting node
pub const INT_TO_STRING: &str = "int_to_string";
/// Class ID of the float formatting node
pub const FLOAT_TO_STRING: &str = "float_to_string";

/// Number input on the conversion nodes
pub const VALUE: &str = "Value";
/// Text pin on every text node
pub const TEXT: &str = "Text";

const DEBUG_TEXT_DEFAULT: &str = "123456789012345678901234567890";
const DEBUG_COLOR: GraphColor = GraphColor::new(200, 150, 0, 255);
const TEXT_COLOR: GraphColor = GraphColor::new(160, 40, 140, 255);

fn debug_text(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let text: String = ctx.input(TEXT)?;
    tracing::info!(graph = %ctx.graph().id(), node = %ctx.node_id(), "{}", text);
    ctx.exit_via_pin(OUT)
}

fn int_to_string(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let value: i32 = ctx.input(VALUE)?;
    ctx.set_output(TEXT, value.to_string())?;
    ctx.exit()
}

fn float_to_string(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let value: f32 = ctx.input(VALUE)?;
    ctx.set_output(TEXT, format!("{value:.6}"))?;
    ctx.exit()
}

fn conversion<T: ScriptType>(
    id: &str,
    title: &str,
    description: &str,
    op: fn(&mut ExecContext<'_>) -> Result<Flow>,
) -> NodeClass {
    NodeClass {
        id: id.to_string(),
        title: title.to_string(),
        category: NodeCategory::Text,
        description: description.to_string(),
        pins: vec![
            PinSpec::data_input::<T>(VALUE),
            PinSpec::data_output::<String>(TEXT),
        ],
        flags: NodeFlags::default(),
        header_color: TEXT_COLOR,
        operation: operation(op),
    }
}

/// Register the text node classes
pub fn register(registry: &mut NodeRegistry) -> Result<()> {
    let mut pins = exec_pair().to_vec();
    pins.push(PinSpec::data_input::<String>(TEXT).with_default(DEBUG_TEXT_DEFAULT.to_string()));
    registry.register(NodeClass {
        id: DEBUG_TEXT.to_string(),
        title: "Debug Text".to_string(),
        category: NodeCategory::Text,
        description: "Writes Text to the log.".to_string(),
        pins,
        flags: NodeFlags {
            debug_only: true,
            ..NodeFlags::default()
        },
        header_color: DEBUG_COLOR,
        operation: operation(debug_text),
    })?;

    registry.register(conversion::<i32>(
        INT_TO_STRING,
        "Int To String",
        "Formats an integer as text.",
        int_to_string,
    ))?;
    registry.register(conversion::<f32>(
        FLOAT_TO_STRING,
        "Float To String",
        "Formats a float as text with six decimals.",
        float_to_string,
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ScriptGraph;
    use crate::registry::ScriptRegistry;
    use std::sync::Arc;

    fn graph() -> ScriptGraph {
        ScriptGraph::new(Arc::new(ScriptRegistry::with_builtins().unwrap()))
    }

    #[test]
    fn test_debug_text_defaults() {
        let mut graph = graph();
        let node = graph.schema().add_node(DEBUG_TEXT).unwrap();
        let text: String = graph.node(node).unwrap().local_pin_data(TEXT).unwrap();
        assert_eq!(text, DEBUG_TEXT_DEFAULT);
        assert!(graph.node(node).unwrap().flags().debug_only);
        let out = graph.pin_by_label(node, OUT).unwrap().id();
        assert_eq!(graph.exec(node, None).unwrap(), Flow::Exit(out));
    }

    #[test]
    fn test_conversions() {
        let mut graph = graph();
        let int = graph.schema().add_node(INT_TO_STRING).unwrap();
        let float = graph.schema().add_node(FLOAT_TO_STRING).unwrap();
        graph.schema().set_pin_value(int, VALUE, 17).unwrap();
        graph.schema().set_pin_value(float, VALUE, 0.5f32).unwrap();

        assert_eq!(graph.exec(int, None).unwrap(), Flow::Halt);
        graph.exec(float, None).unwrap();
        assert_eq!(graph.pin_data::<String>(int, TEXT).unwrap(), "17");
        assert_eq!(graph.pin_data::<String>(float, TEXT).unwrap(), "0.500000");
        assert!(graph.node(int).unwrap().is_pure());
    }
}
