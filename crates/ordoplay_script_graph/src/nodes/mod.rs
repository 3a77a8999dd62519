// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library.

pub mod events;
pub mod flow;
pub mod math;
pub mod text;
pub mod variables;

use crate::error::Result;
use crate::node::NodeRegistry;
use crate::pin::PinSpec;

/// Exec label for entering a node
pub const IN: &str = "In";
/// Exec label for leaving a node
pub const OUT: &str = "Out";

/// Register every built-in node class
pub fn register_builtin_nodes(registry: &mut NodeRegistry) -> Result<()> {
    events::register(registry)?;
    math::register(registry)?;
    flow::register(registry)?;
    text::register(registry)?;
    variables::register(registry)?;
    Ok(())
}

/// The `In`/`Out` exec pair most nodes carry, labels hidden
pub(crate) fn exec_pair() -> [PinSpec; 2] {
    [
        PinSpec::exec_input(IN).hide_label(),
        PinSpec::exec_output(OUT).hide_label(),
    ]
}
