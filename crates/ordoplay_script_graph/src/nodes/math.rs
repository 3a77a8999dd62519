// SPDX-License-Identifier: MIT OR Apache-2.0
//! Float math nodes.
//!
//! Each node reads its inputs when run, writes `Result` and leaves through
//! `Out`.

use crate::error::Result;
use crate::execution::{ExecContext, Flow};
use crate::node::{operation, NodeCategory, NodeClass, NodeFlags, NodeOperation, NodeRegistry};
use crate::nodes::{exec_pair, OUT};
use crate::pin::PinSpec;
use crate::types::GraphColor;

/// A + B
pub const ADD: &str = "math_add";
/// A - B
pub const SUB: &str = "math_sub";
/// A * B
pub const MUL: &str = "math_mul";
/// sin(A)
pub const SIN: &str = "math_sin";
/// cos(A)
pub const COS: &str = "math_cos";
/// atan2(A, B)
pub const TAN: &str = "math_tan";
/// X² + Y²
pub const LENGTH: &str = "math_length";
/// Distance between two points
pub const DISTANCE: &str = "math_distance";

const RESULT: &str = "Result";
const MATH_COLOR: GraphColor = GraphColor::new(60, 110, 60, 255);

fn binary(op: fn(f32, f32) -> f32) -> NodeOperation {
    operation(move |ctx| {
        let a: f32 = ctx.input("A")?;
        let b: f32 = ctx.input("B")?;
        ctx.set_output(RESULT, op(a, b))?;
        ctx.exit_via_pin(OUT)
    })
}

fn unary(op: fn(f32) -> f32) -> NodeOperation {
    operation(move |ctx| {
        let a: f32 = ctx.input("A")?;
        ctx.set_output(RESULT, op(a))?;
        ctx.exit_via_pin(OUT)
    })
}

fn length(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let x: f32 = ctx.input("X")?;
    let y: f32 = ctx.input("Y")?;
    ctx.set_output(RESULT, x * x + y * y)?;
    ctx.exit_via_pin(OUT)
}

fn distance(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let x1: f32 = ctx.input("X 1")?;
    let y1: f32 = ctx.input("Y 1")?;
    let x2: f32 = ctx.input("X 2")?;
    let y2: f32 = ctx.input("Y 2")?;
    ctx.set_output(RESULT, (x2 - x1).hypot(y2 - y1))?;
    ctx.exit_via_pin(OUT)
}

fn math_class(
    id: &str,
    title: &str,
    description: &str,
    inputs: &[&str],
    operation: NodeOperation,
) -> NodeClass {
    let mut pins = exec_pair().to_vec();
    pins.extend(inputs.iter().map(|label| PinSpec::data_input::<f32>(*label)));
    pins.push(PinSpec::data_output::<f32>(RESULT));
    NodeClass {
        id: id.to_string(),
        title: title.to_string(),
        category: NodeCategory::Math,
        description: description.to_string(),
        pins,
        flags: NodeFlags::default(),
        header_color: MATH_COLOR,
        operation,
    }
}

/// Register the math node classes
pub fn register(registry: &mut NodeRegistry) -> Result<()> {
    registry.register(math_class(ADD, "Add", "Adds B to A.", &["A", "B"], binary(|a, b| a + b)))?;
    registry.register(math_class(SUB, "Sub", "Subtracts B from A.", &["A", "B"], binary(|a, b| a - b)))?;
    registry.register(math_class(MUL, "Mul", "Multiplies A by B.", &["A", "B"], binary(|a, b| a * b)))?;
    registry.register(math_class(SIN, "Sin", "Sine of A in radians.", &["A"], unary(f32::sin)))?;
    registry.register(math_class(COS, "Cos", "Cosine of A in radians.", &["A"], unary(f32::cos)))?;
    registry.register(math_class(
        TAN,
        "Tan",
        "Angle of the vector (B, A), atan2(A, B).",
        &["A", "B"],
        binary(f32::atan2),
    ))?;
    registry.register(math_class(
        LENGTH,
        "Length",
        "Squared length of the vector (X, Y).",
        &["X", "Y"],
        operation(length),
    ))?;
    registry.register(math_class(
        DISTANCE,
        "Distance",
        "Distance between (X 1, Y 1) and (X 2, Y 2).",
        &["X 1", "Y 1", "X 2", "Y 2"],
        operation(distance),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ScriptGraph;
    use crate::registry::ScriptRegistry;
    use crate::uid::NodeId;
    use std::sync::Arc;

    fn run(class: &str, inputs: &[(&str, f32)]) -> f32 {
        let mut graph = ScriptGraph::new(Arc::new(ScriptRegistry::with_builtins().unwrap()));
        let node: NodeId = graph.schema().add_node(class).unwrap();
        for (label, value) in inputs {
            graph.schema().set_pin_value(node, label, *value).unwrap();
        }
        graph.exec(node, None).unwrap();
        graph.pin_data(node, RESULT).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run(ADD, &[("A", 2.0), ("B", 3.0)]), 5.0);
        assert_eq!(run(SUB, &[("A", 2.0), ("B", 3.0)]), -1.0);
        assert_eq!(run(MUL, &[("A", 2.0), ("B", 3.0)]), 6.0);
    }

    #[test]
    fn test_trigonometry() {
        assert!((run(SIN, &[("A", std::f32::consts::FRAC_PI_2)]) - 1.0).abs() < 1e-6);
        assert!((run(COS, &[("A", 0.0)]) - 1.0).abs() < 1e-6);
        assert!((run(TAN, &[("A", 1.0), ("B", 1.0)]) - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn test_length_is_squared() {
        assert_eq!(run(LENGTH, &[("X", 3.0), ("Y", 4.0)]), 25.0);
    }

    #[test]
    fn test_distance() {
        let d = run(DISTANCE, &[("X 1", 1.0), ("Y 1", 1.0), ("X 2", 4.0), ("Y 2", 5.0)]);
        assert!((d - 5.0).abs() < 1e-6);
    }
}
