// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-rate graph driver.

use crate::error::{Result, RunnerError};
use crate::settings::RunnerSettings;
use ordoplay_script_graph::{ScriptGraph, ScriptRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a run did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Frames ticked
    pub frames: u32,
    /// Node errors reported while running
    pub errors: usize,
    /// Graph time at the end of the run, in seconds
    pub graph_time: f64,
}

/// Owns a loaded graph and drives it
pub struct Runner {
    graph: ScriptGraph,
    settings: RunnerSettings,
    errors: Arc<AtomicUsize>,
}

impl Runner {
    /// Load the graph named by the settings
    pub fn load(registry: Arc<ScriptRegistry>, settings: RunnerSettings) -> Result<Self> {
        let json = std::fs::read_to_string(&settings.graph)
            .map_err(|e| RunnerError::io(&settings.graph, e))?;
        let graph = ScriptGraph::from_json(registry, &json)?;
        tracing::info!(
            graph = %graph.name,
            path = %settings.graph.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded script graph"
        );
        Ok(Self::new(graph, settings))
    }

    /// Wrap an already built graph
    pub fn new(mut graph: ScriptGraph, settings: RunnerSettings) -> Self {
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&errors);
        graph.bind_error_handler(move |graph, node, message| {
            counter.fetch_add(1, Ordering::Relaxed);
            let title = graph.node(node).map(|n| n.title().to_string()).unwrap_or_default();
            tracing::warn!(%node, %title, "Node reported: {}", message);
        });
        Self {
            graph,
            settings,
            errors,
        }
    }

    /// The driven graph
    pub fn graph(&self) -> &ScriptGraph {
        &self.graph
    }

    /// Run begin play once, then tick the configured number of frames
    pub fn run(&mut self) -> Result<RunSummary> {
        match self.graph.entry_point(&self.settings.begin_play) {
            Ok(_) => {
                self.graph.run(&self.settings.begin_play)?;
            }
            Err(_) => {
                tracing::warn!(handle = %self.settings.begin_play, "Graph has no begin play entry");
            }
        }

        let delta = self.settings.delta_time();
        let frame_time = Duration::from_secs_f32(delta);
        for frame in 0..self.settings.frames {
            let started = Instant::now();
            self.graph.tick_entry(&self.settings.tick, delta)?;
            tracing::trace!(frame, time = self.graph.time(), "Frame done");

            if self.settings.realtime {
                if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }

        Ok(RunSummary {
            frames: self.settings.frames,
            errors: self.errors.load(Ordering::Relaxed),
            graph_time: self.graph.time(),
        })
    }
}
