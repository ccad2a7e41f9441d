//! Configuration management for the mixer
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling tuning without recompilation. Tick rate, fade defaults,
//! exclusion filters and the initial set of buses can all be adjusted
//! via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dsp::FadeCurve;
use crate::mixer::BusDecl;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "assets/mixer.json";

/// Complete mixer configuration
///
/// Missing sections fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MixerConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub fade: FadeConfig,
    #[serde(default)]
    pub filtering: FilterConfig,
    /// Sound class buses registered at startup
    #[serde(default)]
    pub classes: Vec<BusDecl>,
    /// Submix buses registered at startup
    #[serde(default)]
    pub submixes: Vec<BusDecl>,
}

/// Ticker and queue parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Update rate of the ticker thread in Hz
    pub tick_hz: f32,
    /// Capacity of the queued-command channel
    pub command_queue_capacity: usize,
    /// Number of events retained for snapshot reporting
    pub event_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            command_queue_capacity: 64,
            event_history: 64,
        }
    }
}

/// Fade parameters used when a request leaves them unspecified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadeConfig {
    /// Fade length in seconds
    pub default_duration: f32,
    /// Curve shape
    pub default_curve: FadeCurve,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            default_duration: 1.0,
            default_curve: FadeCurve::Linear,
        }
    }
}

/// Exclusion filters applied while registering buses from config
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilterConfig {
    /// Bus names skipped during registration
    #[serde(default)]
    pub excluded_class_names: Vec<String>,
    /// Asset paths skipped during registration
    #[serde(default)]
    pub excluded_class_paths: Vec<String>,
}

impl MixerConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing
    /// or fails to parse.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MixerConfig::default();
        assert_eq!(config.engine.tick_hz, 60.0);
        assert_eq!(config.engine.command_queue_capacity, 64);
        assert_eq!(config.engine.event_history, 64);
        assert_eq!(config.fade.default_duration, 1.0);
        assert_eq!(config.fade.default_curve, FadeCurve::Linear);
        assert!(config.filtering.excluded_class_names.is_empty());
        assert!(config.classes.is_empty());
        assert!(config.submixes.is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = MixerConfig::default();
        config.classes.push(BusDecl {
            name: "Music".to_string(),
            path: Some("game/audio/classes/music".to_string()),
            volume: 0.8,
        });
        config.fade.default_curve = FadeCurve::Logarithmic;

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: MixerConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.fade.default_curve, config.fade.default_curve);
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].name, "Music");
        assert_eq!(parsed.classes[0].volume, 0.8);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "fade": { "default_duration": 0.5, "default_curve": "s_curve" },
            "classes": [
                { "name": "Dialogue" },
                { "name": "Weapons", "volume": 0.9 }
            ]
        }"#;
        let config: MixerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.fade.default_duration, 0.5);
        assert_eq!(config.fade.default_curve, FadeCurve::SCurve);
        assert_eq!(config.engine.tick_hz, 60.0);
        assert_eq!(config.classes[0].volume, 1.0);
        assert_eq!(config.classes[0].path, None);
        assert_eq!(config.classes[1].volume, 0.9);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = MixerConfig::load_from_file("definitely/not/a/real/path.json");
        assert_eq!(config.engine.tick_hz, 60.0);
    }
}
