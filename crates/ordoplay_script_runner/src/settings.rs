// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner settings, stored as RON.

use crate::error::{Result, RunnerError};
use ordoplay_script_graph::nodes::events;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const FORMAT_VERSION: u32 = 1;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "runner.ron";

/// How the runner loads and drives a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Format version
    pub version: u32,
    /// Graph document to load
    pub graph: PathBuf,
    /// Fixed tick rate in Hz
    pub tick_rate: u32,
    /// Frames to tick after begin play
    pub frames: u32,
    /// Sleep between frames to match wall-clock time
    pub realtime: bool,
    /// Entry handle run once at startup
    pub begin_play: String,
    /// Entry handle run every frame
    pub tick: String,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            graph: PathBuf::from("graph.json"),
            tick_rate: 60,
            frames: 60,
            realtime: false,
            begin_play: events::BEGIN_PLAY.to_string(),
            tick: events::TICK.to_string(),
            log_filter: "info,ordoplay_script_graph=info".to_string(),
        }
    }
}

impl RunnerSettings {
    /// Seconds per frame
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Parse settings from RON
    pub fn from_ron(content: &str) -> Result<Self> {
        let settings: RunnerSettings = ron::from_str(content)?;
        if settings.version > FORMAT_VERSION {
            return Err(RunnerError::UnsupportedVersion {
                found: settings.version,
                supported: FORMAT_VERSION,
            });
        }
        if settings.tick_rate == 0 {
            return Err(RunnerError::InvalidTickRate);
        }
        Ok(settings)
    }

    /// Write settings as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        let mut settings = Self::from_ron(&content)?;

        // Graph paths are relative to the settings file
        if settings.graph.is_relative() {
            if let Some(dir) = path.parent() {
                settings.graph = dir.join(&settings.graph);
            }
        }
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?).map_err(|e| RunnerError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RunnerSettings::default();
        assert_eq!(settings.version, FORMAT_VERSION);
        assert_eq!(settings.begin_play, "BeginPlay");
        assert_eq!(settings.tick, "Tick");
        assert!((settings.delta_time() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let settings = RunnerSettings {
            graph: PathBuf::from("scripts/door.json"),
            frames: 10,
            ..RunnerSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = RunnerSettings::load(&path).unwrap();
        assert_eq!(loaded.frames, 10);
        assert_eq!(loaded.graph, dir.path().join("scripts/door.json"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = RunnerSettings::from_ron("(tick_rate: 30)").unwrap();
        assert_eq!(settings.tick_rate, 30);
        assert_eq!(settings.frames, 60);
    }

    #[test]
    fn test_rejects_newer_version_and_zero_rate() {
        assert!(matches!(
            RunnerSettings::from_ron("(version: 99)"),
            Err(RunnerError::UnsupportedVersion { found: 99, .. })
        ));
        assert!(matches!(
            RunnerSettings::from_ron("(tick_rate: 0)"),
            Err(RunnerError::InvalidTickRate)
        ));
        assert!(RunnerSettings::from_ron("(frames: \"many\")").is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunnerSettings::load(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }
}
