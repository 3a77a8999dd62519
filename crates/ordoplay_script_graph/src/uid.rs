// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-unique identifiers for graph entities.
//!
//! Nodes, pins, variables and data objects all draw from one monotonically
//! increasing counter, so an ID is never handed out twice while the process
//! lives. Edge IDs are different: each graph numbers its own edges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

fn next_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! process_uid {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Mint a fresh identifier
            pub(crate) fn mint() -> Self {
                Self(next_uid())
            }

            /// Get the raw ID value
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

process_uid!(
    /// Unique identifier for a node
    NodeId
);

process_uid!(
    /// Unique identifier for a pin
    PinId
);

process_uid!(
    /// Unique identifier for a graph variable
    VariableId
);

process_uid!(
    /// Unique identifier for a data object
    DataObjectId
);

/// Identifier for an edge, unique within its graph.
///
/// Edge IDs come from a per-graph counter starting at 1 and are never reused,
/// even after the edge is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a graph instance, reported to handlers and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_across_kinds() {
        let node = NodeId::mint();
        let pin = PinId::mint();
        let variable = VariableId::mint();
        assert!(pin.value() > node.value());
        assert!(variable.value() > pin.value());
    }

    #[test]
    fn test_graph_ids_differ() {
        assert_ne!(GraphId::new(), GraphId::new());
    }
}
