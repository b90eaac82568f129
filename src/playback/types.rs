//! Playback session type definitions

use crate::audio::AudioClip;
use serde::Serialize;

/// Transport state of a [`crate::Player`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing scheduled yet, or reset after the PGN changed
    #[default]
    Idle,
    Playing,
    /// Stopped by the user; may be resumed
    Stopped,
    /// Progress reached the total duration
    Completed,
}

/// What a scheduled timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    /// Sound the move at this position of the plan
    PlayMove(usize),
    /// Advance the progress counter by one step
    ProgressTick,
}

/// Elapsed and total time of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub elapsed_ms: u64,
    pub total_ms: u64,
}

impl Progress {
    /// Share of the session played, 0.0 to 1.0
    pub fn fraction(&self) -> f64 {
        if self.total_ms == 0 {
            0.0
        } else {
            self.elapsed_ms as f64 / self.total_ms as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_ms > 0 && self.elapsed_ms >= self.total_ms
    }
}

/// A captured clip, named for saving
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn from_clip(base_name: &str, clip: &AudioClip) -> Self {
        Self {
            file_name: format!("{}.{}", base_name, clip.format.extension()),
            mime_type: clip.format.mime_type(),
            bytes: clip.bytes.clone(),
        }
    }
}
