// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::types::GraphColor;
use crate::uid::{EdgeId, PinId};

/// Line thickness used for exec edges
pub const EXEC_EDGE_THICKNESS: f32 = 3.0;
/// Line thickness used for data edges
pub const DATA_EDGE_THICKNESS: f32 = 1.0;

/// A directed edge from an output pin to an input pin
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Edge ID, unique within the graph
    pub id: EdgeId,
    /// Source output pin
    pub from: PinId,
    /// Target input pin
    pub to: PinId,
    /// Display color, taken from the source pin's type
    pub color: GraphColor,
    /// Display thickness
    pub thickness: f32,
}

impl Edge {
    /// Create a new edge
    pub fn new(id: EdgeId, from: PinId, to: PinId, color: GraphColor, thickness: f32) -> Self {
        Self {
            id,
            from,
            to,
            color,
            thickness,
        }
    }

    /// Check if this edge touches a specific pin
    pub fn involves_pin(&self, pin: PinId) -> bool {
        self.from == pin || self.to == pin
    }

    /// The pin at the other end, if `pin` is one of the endpoints
    pub fn other_end(&self, pin: PinId) -> Option<PinId> {
        if self.from == pin {
            Some(self.to)
        } else if self.to == pin {
            Some(self.from)
        } else {
            None
        }
    }
}
