use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{graph::BAND_COUNT, Result, WidgetError};

/// Top-level configuration structure for the widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub visualizer: VisualizerConfig,
    pub transport: TransportConfig,
    pub assets: AssetConfig,
}

impl AppConfig {
    /// Parses a configuration from JSON text. Missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON configuration file. Missing fields fall back to their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|err| WidgetError::resource(path, err))?;
        Self::from_json_str(&text)
    }
}

/// Configuration of the audio processing graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub sample_rate: u32,
    /// Analyser transform window. Produces `fft_size / 2` frequency bins.
    pub fft_size: usize,
    /// Peaking filter centre frequencies in Hz, ascending.
    pub band_frequencies: [f32; BAND_COUNT],
    pub band_q: f32,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            fft_size: 256,
            band_frequencies: [60.0, 170.0, 350.0, 1_000.0, 3_500.0, 10_000.0],
            band_q: 1.0,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Size and frame rate of the spectrum visualizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub width: u32,
    pub height: u32,
    pub frames_per_second: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 100,
            frames_per_second: 60,
        }
    }
}

/// What `pause` does to the audio context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PauseBehavior {
    /// Resume the context on pause, as the shipped player always did.
    #[default]
    ResumeContext,
    /// Suspend audio processing while paused.
    SuspendContext,
}

/// Behaviour of the playback controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Step used by the forward/backward buttons.
    pub skip_seconds: f64,
    pub pause_behavior: PauseBehavior,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            skip_seconds: 10.0,
            pause_behavior: PauseBehavior::default(),
        }
    }
}

/// Location of the widget templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding one sub-directory of markup and style per widget.
    pub root: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_player_graph() {
        let config = AppConfig::default();
        assert_eq!(config.graph.fft_size, 256);
        assert_eq!(config.graph.band_frequencies.len(), 6);
        assert_eq!(config.transport.skip_seconds, 10.0);
        assert_eq!(config.transport.pause_behavior, PauseBehavior::ResumeContext);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "visualizer": { "width": 64 }, "transport": { "pause_behavior": "suspend-context" } }"#,
        )
        .unwrap();

        assert_eq!(config.visualizer.width, 64);
        assert_eq!(config.visualizer.height, 100);
        assert_eq!(config.transport.pause_behavior, PauseBehavior::SuspendContext);
        assert_eq!(config.graph, GraphConfig::default());
    }

    #[test]
    fn band_list_must_have_six_entries() {
        let seven = r#"{ "graph": { "band_frequencies": [60, 170, 350, 1000, 3500, 10000, 16000] } }"#;
        assert!(matches!(
            AppConfig::from_json_str(seven).unwrap_err(),
            WidgetError::Config(_)
        ));

        let six = r#"{ "graph": { "band_frequencies": [50, 150, 400, 1200, 4000, 9000] } }"#;
        let config = AppConfig::from_json_str(six).unwrap();
        assert_eq!(config.graph.band_frequencies[5], 9_000.0);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = AppConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, WidgetError::Config(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err}").contains("here.json"));
    }
}
