// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event nodes: the entry points hosts run.

use crate::error::Result;
use crate::execution::{ExecContext, Flow};
use crate::node::{operation, NodeCategory, NodeClass, NodeFlags, NodeRegistry};
use crate::nodes::OUT;
use crate::pin::PinSpec;
use crate::types::GraphColor;

/// Entry handle fired once when the owner starts
pub const BEGIN_PLAY: &str = "BeginPlay";
/// Entry handle fired every frame
pub const TICK: &str = "Tick";

/// Class ID of the begin play event
pub const BEGIN_PLAY_CLASS: &str = "event_begin_play";
/// Class ID of the tick event
pub const TICK_CLASS: &str = "event_tick";

/// Frame time output on the tick event
pub const DELTA_TIME: &str = "Delta Time";

const EVENT_COLOR: GraphColor = GraphColor::new(150, 30, 30, 255);

fn fire(ctx: &mut ExecContext<'_>) -> Result<Flow> {
    ctx.exit_via_pin(OUT)
}

/// Register the event node classes
pub fn register(registry: &mut NodeRegistry) -> Result<()> {
    registry.register(NodeClass {
        id: BEGIN_PLAY_CLASS.to_string(),
        title: "Begin Play".to_string(),
        category: NodeCategory::Events,
        description: "An event node that fires when the object is created.".to_string(),
        pins: vec![PinSpec::exec_output(OUT).hide_label()],
        flags: NodeFlags::event(),
        header_color: EVENT_COLOR,
        operation: operation(fire),
    })?;

    registry.register(NodeClass {
        id: TICK_CLASS.to_string(),
        title: "Tick".to_string(),
        category: NodeCategory::Events,
        description: "An event node that fires every frame.".to_string(),
        pins: vec![
            PinSpec::exec_output(OUT).hide_label(),
            PinSpec::data_output::<f32>(DELTA_TIME),
        ],
        flags: NodeFlags::event(),
        header_color: EVENT_COLOR,
        operation: operation(fire),
    })?;

    Ok(())
}
