//! # Playback Configuration
//!
//! Timing, naming and synthesizer settings, read from YAML. Every field has a
//! default, so an empty document is a valid configuration.
//!
//! ```yaml
//! note-delay-ms: 500
//! progress-step-ms: 500
//! tempo-bpm: 120
//! download-name: chess-music
//! synth:
//!   sample-rate: 44100
//!   release-ms: 1000
//!   echo-feedback: 0.5
//!   reverb-decay: 1.5
//!   backing: true
//! ```
//!
//! ## Example
//! ```rust
//! use chess_music::PlaybackConfig;
//!
//! let config = PlaybackConfig::from_yaml("note-delay-ms: 250").unwrap();
//! assert_eq!(config.note_delay_ms, 250);
//! assert_eq!(config.progress_step_ms, 500);
//! ```

use crate::error::ChessMusicError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted note delay or progress step, one hour
const MAX_STEP_MS: u64 = 3_600_000;

/// Settings for the offline synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SynthConfig {
    pub sample_rate: u32,
    pub attack_ms: u32,
    pub release_ms: u32,
    /// Echo delay in seconds, an eighth note at 120 BPM by default
    pub echo_delay: f32,
    pub echo_feedback: f32,
    pub echo_mix: f32,
    /// Reverb tail length in seconds (time to fall by 60 dB)
    pub reverb_decay: f32,
    /// Reverb level until the transport changes it
    pub reverb_wet: f32,
    /// Upper bound of the level picked on every quarter note
    pub reverb_wet_max: f32,
    /// Seed for the reverb level changes; a fresh seed each run when unset
    pub seed: Option<u64>,
    /// Bass loop played on every quarter note while the transport runs
    pub backing: bool,
    pub backing_velocity: f32,
    pub gain: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            attack_ms: 5,
            release_ms: 1000,
            echo_delay: 0.25,
            echo_feedback: 0.5,
            echo_mix: 0.3,
            reverb_decay: 1.5,
            reverb_wet: 0.4,
            reverb_wet_max: 0.5,
            seed: None,
            backing: true,
            backing_velocity: 0.5,
            gain: 0.8,
        }
    }
}

/// Playback session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlaybackConfig {
    /// Gap between consecutive moves
    pub note_delay_ms: u64,
    /// Granularity of the progress counter
    pub progress_step_ms: u64,
    /// Tempo used to turn note lengths ("4n", "1m") into time
    pub tempo_bpm: f64,
    /// Download file name without extension
    pub download_name: String,
    pub synth: SynthConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            note_delay_ms: 500,
            progress_step_ms: 500,
            tempo_bpm: 120.0,
            download_name: "chess-music".to_string(),
            synth: SynthConfig::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ChessMusicError> {
        // serde_yaml reads an empty document as null rather than an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: PlaybackConfig = serde_yaml::from_str(content)
            .map_err(|e| ChessMusicError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChessMusicError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChessMusicError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), ChessMusicError> {
        if self.note_delay_ms == 0 {
            return Err(ChessMusicError::ConfigError(
                "note-delay-ms must be greater than 0".to_string(),
            ));
        }
        if self.note_delay_ms > MAX_STEP_MS {
            return Err(ChessMusicError::ConfigError(format!(
                "note-delay-ms must be at most {}",
                MAX_STEP_MS
            )));
        }
        if self.progress_step_ms == 0 {
            return Err(ChessMusicError::ConfigError(
                "progress-step-ms must be greater than 0".to_string(),
            ));
        }
        if self.progress_step_ms > MAX_STEP_MS {
            return Err(ChessMusicError::ConfigError(format!(
                "progress-step-ms must be at most {}",
                MAX_STEP_MS
            )));
        }
        if !(self.tempo_bpm > 0.0) {
            return Err(ChessMusicError::ConfigError(
                "tempo-bpm must be greater than 0".to_string(),
            ));
        }
        if self.download_name.trim().is_empty() {
            return Err(ChessMusicError::ConfigError(
                "download-name must not be empty".to_string(),
            ));
        }
        if self.synth.sample_rate == 0 {
            return Err(ChessMusicError::ConfigError(
                "synth.sample-rate must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.synth.echo_feedback) {
            return Err(ChessMusicError::ConfigError(format!(
                "synth.echo-feedback must be in [0, 1), got {}",
                self.synth.echo_feedback
            )));
        }
        if !(self.synth.reverb_decay > 0.0) {
            return Err(ChessMusicError::ConfigError(
                "synth.reverb-decay must be greater than 0".to_string(),
            ));
        }
        for (name, level) in [
            ("reverb-wet", self.synth.reverb_wet),
            ("reverb-wet-max", self.synth.reverb_wet_max),
            ("backing-velocity", self.synth.backing_velocity),
        ] {
            if !(0.0..=1.0).contains(&level) {
                return Err(ChessMusicError::ConfigError(format!(
                    "synth.{} must be in [0, 1], got {}",
                    name, level
                )));
            }
        }
        Ok(())
    }
}
