// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred work for a graph: timed continuations and cross-thread requests.
//!
//! Both queues are drained by [`ScriptGraph::tick`](crate::graph::ScriptGraph::tick)
//! on the thread that owns the graph, so node operations never run concurrently.

use crate::execution::Payload;
use crate::uid::NodeId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// An exec output to follow once the graph clock reaches `due`
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    /// Graph time in seconds at which to fire
    pub due: f64,
    /// Node that scheduled it
    pub node: NodeId,
    /// Exec output label to leave through
    pub pin_label: String,
}

/// Cooperative queue of continuations ordered by due time
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Continuation>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a continuation. Equal due times fire in scheduling order.
    pub fn schedule(&mut self, continuation: Continuation) {
        let index = self
            .pending
            .partition_point(|c| c.due <= continuation.due);
        self.pending.insert(index, continuation);
    }

    /// Remove and return every continuation due at or before `now`
    pub fn take_due(&mut self, now: f64) -> Vec<Continuation> {
        let split = self.pending.partition_point(|c| c.due <= now);
        self.pending.drain(..split).collect()
    }

    /// Drop everything scheduled by a node
    pub fn cancel_node(&mut self, node: NodeId) {
        self.pending.retain(|c| c.node != node);
    }

    /// Pending continuations in firing order
    pub fn pending(&self) -> &[Continuation] {
        &self.pending
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Work another thread asks the graph to do on its next tick
#[derive(Debug)]
pub enum MailboxRequest {
    /// Run an entry point
    Run(String),
    /// Deliver a payload to a node
    Payload {
        /// Receiving node
        node: NodeId,
        /// Values keyed by pin label
        payload: Payload,
    },
}

/// Thread-safe handle for posting requests to a graph.
///
/// Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct GraphMailbox {
    queue: Arc<Mutex<VecDeque<MailboxRequest>>>,
}

impl GraphMailbox {
    /// Create an empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a request
    pub fn post(&self, request: MailboxRequest) {
        self.queue.lock().push_back(request);
    }

    /// Post a request to run an entry point
    pub fn post_run(&self, handle: impl Into<String>) {
        self.post(MailboxRequest::Run(handle.into()));
    }

    /// Take all queued requests in posting order
    pub fn drain(&self) -> Vec<MailboxRequest> {
        self.queue.lock().drain(..).collect()
    }

    /// Number of queued requests
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn continuation(due: f64, node: NodeId, label: &str) -> Continuation {
        Continuation {
            due,
            node,
            pin_label: label.to_string(),
        }
    }

    #[test]
    fn test_take_due_in_order() {
        let node = NodeId::mint();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(continuation(2.0, node, "late"));
        scheduler.schedule(continuation(1.0, node, "first"));
        scheduler.schedule(continuation(1.0, node, "second"));

        let due = scheduler.take_due(1.5);
        let labels: Vec<_> = due.iter().map(|c| c.pin_label.as_str()).collect();
        assert_eq!(labels, ["first", "second"]);
        assert_eq!(scheduler.pending().len(), 1);
        assert!(scheduler.take_due(1.9).is_empty());
        assert_eq!(scheduler.take_due(2.0).len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel_node() {
        let a = NodeId::mint();
        let b = NodeId::mint();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(continuation(1.0, a, "Out"));
        scheduler.schedule(continuation(1.0, b, "Out"));
        scheduler.cancel_node(a);
        assert_eq!(scheduler.pending()[0].node, b);
    }

    #[test]
    fn test_mailbox_accepts_posts_from_other_threads() {
        let mailbox = GraphMailbox::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mailbox = mailbox.clone();
                thread::spawn(move || mailbox.post_run(format!("Event{i}")))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(mailbox.len(), 4);
        assert_eq!(mailbox.drain().len(), 4);
        assert!(mailbox.is_empty());
    }
}
