// SPDX-License-Identifier: MIT OR Apache-2.0
//! Control flow nodes.

use crate::error::Result;
use crate::execution::{ExecContext, Flow};
use crate::node::{operation, NodeCategory, NodeClass, NodeFlags, NodeRegistry};
use crate::nodes::{exec_pair, IN, OUT};
use crate::pin::PinSpec;
use crate::types::GraphColor;

/// Class ID of the branch node
pub const BRANCH: &str = "branch";
/// Class ID of the timer node
pub const TIMER: &str = "timer";

/// Branch condition input
pub const CONDITION: &str = "Condition";
/// Branch output taken when the condition holds
pub const TRUE: &str = "True";
/// Branch output taken otherwise
pub const FALSE: &str = "False";
/// Timer output fired once the duration has passed
pub const ON_TIMER: &str = "On Timer";
/// Timer duration in whole seconds
pub const DURATION: &str = "Duration";

const FLOW_COLOR: GraphColor = GraphColor::new(90, 90, 90, 255);

fn branch(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let condition: bool = ctx.input(CONDITION)?;
    ctx.exit_via_pin(if condition { TRUE } else { FALSE })
}

fn timer(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    let seconds: i32 = ctx.input(DURATION)?;
    ctx.schedule(f64::from(seconds), ON_TIMER)?;
    ctx.exit_via_pin(OUT)
}

/// Register the flow node classes
pub fn register(registry: &mut NodeRegistry) -> Result<()> {
    registry.register(NodeClass {
        id: BRANCH.to_string(),
        title: "Branch".to_string(),
        category: NodeCategory::Flow,
        description: "Continues through True or False depending on Condition.".to_string(),
        pins: vec![
            PinSpec::exec_input(IN).hide_label(),
            PinSpec::exec_output(TRUE),
            PinSpec::exec_output(FALSE),
            PinSpec::data_input::<bool>(CONDITION),
        ],
        flags: NodeFlags::default(),
        header_color: FLOW_COLOR,
        operation: operation(branch),
    })?;

    let mut pins = exec_pair().to_vec();
    pins.push(PinSpec::exec_output(ON_TIMER));
    pins.push(PinSpec::data_input::<i32>(DURATION));
    registry.register(NodeClass {
        id: TIMER.to_string(),
        title: "Timer".to_string(),
        category: NodeCategory::Flow,
        description: "Continues immediately, then fires On Timer after Duration seconds."
            .to_string(),
        pins,
        flags: NodeFlags::default(),
        header_color: FLOW_COLOR,
        operation: operation(timer),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::ScriptGraph;
    use crate::nodes::variables;
    use crate::registry::ScriptRegistry;
    use crate::uid::{NodeId, PinId};
    use std::sync::Arc;

    fn graph() -> ScriptGraph {
        ScriptGraph::new(Arc::new(ScriptRegistry::with_builtins().unwrap()))
    }

    fn pin(graph: &ScriptGraph, node: NodeId, label: &str) -> PinId {
        graph.pin_by_label(node, label).unwrap().id()
    }

    #[test]
    fn test_branch_picks_output() {
        let mut graph = graph();
        let node = graph.schema().add_node(BRANCH).unwrap();
        assert_eq!(graph.exec(node, None).unwrap(), Flow::Exit(pin(&graph, node, FALSE)));

        graph.schema().set_pin_value(node, CONDITION, true).unwrap();
        assert_eq!(graph.exec(node, None).unwrap(), Flow::Exit(pin(&graph, node, TRUE)));
    }

    #[test]
    fn test_branch_labels_visible() {
        let mut graph = graph();
        let node = graph.schema().add_node(BRANCH).unwrap();
        let node = graph.node(node).unwrap();
        assert!(!node.pin_by_label(IN).unwrap().is_label_visible());
        assert!(node.pin_by_label(TRUE).unwrap().is_label_visible());
        assert!(node.pin_by_label(FALSE).unwrap().is_label_visible());
    }

    #[test]
    fn test_timer_schedules_continuation() {
        let mut graph = graph();
        let node = graph.schema().add_node(TIMER).unwrap();
        graph.schema().set_pin_value(node, DURATION, 2).unwrap();

        assert_eq!(graph.exec(node, None).unwrap(), Flow::Exit(pin(&graph, node, OUT)));
        assert_eq!(graph.scheduler().pending().len(), 1);

        graph.tick(1.0).unwrap();
        assert_eq!(graph.scheduler().pending().len(), 1);
        graph.tick(1.0).unwrap();
        assert!(graph.scheduler().is_empty());
    }

    #[test]
    fn test_failed_continuation_does_not_drop_the_others() {
        let mut graph = graph();
        graph.schema().add_variable("Fired", false).unwrap();
        let set = graph.schema().add_set_variable_node("Fired").unwrap();
        graph.schema().set_pin_value(set, variables::VALUE, true).unwrap();

        let broken = graph.schema().add_node(TIMER).unwrap();
        let working = graph.schema().add_node(TIMER).unwrap();
        for timer in [broken, working] {
            graph.schema().set_pin_value(timer, DURATION, 1).unwrap();
        }
        let (on_timer, set_in) = (pin(&graph, working, ON_TIMER), pin(&graph, set, IN));
        graph.schema().create_edge(on_timer, set_in).unwrap();

        graph.exec(broken, None).unwrap();
        graph.exec(working, None).unwrap();
        graph.schema().rename_pin(broken, ON_TIMER, "Later").unwrap();

        assert!(matches!(
            graph.tick(1.0),
            Err(GraphError::PinLabelNotFound { .. })
        ));
        assert!(graph.variable_value::<bool>("Fired").unwrap());
        assert!(graph.scheduler().is_empty());
    }

    #[test]
    fn test_removed_timer_is_cancelled() {
        let mut graph = graph();
        let node = graph.schema().add_node(TIMER).unwrap();
        graph.schema().set_pin_value(node, DURATION, 5).unwrap();
        graph.exec(node, None).unwrap();
        graph.schema().remove_node(node).unwrap();
        assert!(graph.scheduler().is_empty());
    }
}
