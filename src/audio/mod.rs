//! # Audio Module
//!
//! The audio engine the playback controller drives, and the clips it captures.
//!
//! ## Sub-modules
//! - `synth` - [`SynthEngine`], an offline synthesizer with WAV capture
//! - `reverb` - Schroeder reverb used by the synthesizer
//! - `wav` - 16-bit PCM WAV encoding of captured samples
//!
//! ## Engine Lifecycle
//! A [`crate::Player`] owns exactly one engine. The player calls, in order:
//! 1. `load_samples` once per session with every pitch the game needs
//! 2. `start_transport` and `start_capture`
//! 3. `trigger` for each move as its time comes
//! 4. `release_all`, `stop_transport` and `finish_capture` when the session
//!    stops, completes or is torn down
//!
//! All times are milliseconds on the player's clock.

mod reverb;
mod synth;
mod wav;

use crate::error::ChessMusicError;
use crate::mapper::{NoteDuration, Pitch};

pub use synth::SynthEngine;
pub use wav::encode_wav;

/// Encoding of a captured clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipFormat {
    /// 16-bit PCM WAV
    Wav,
}

impl ClipFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ClipFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ClipFormat::Wav => "audio/wav",
        }
    }
}

/// A finished, encoded capture
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub format: ClipFormat,
    pub bytes: Vec<u8>,
    pub duration_ms: u64,
}

/// Sound output and capture, as seen by the playback controller
pub trait AudioEngine {
    /// Prepare the instrument for these pitches. Engines without sample
    /// assets may treat this as a hint.
    fn load_samples(&mut self, pitches: &[Pitch]) -> Result<(), ChessMusicError>;

    /// Start a note now (`at_ms`) with the given length and velocity
    fn trigger(&mut self, pitch: Pitch, duration: NoteDuration, at_ms: u64, velocity: f32);

    /// Silence every sounding note
    fn release_all(&mut self, at_ms: u64);

    /// Start the beat clock that drives accompaniment and effect changes
    fn start_transport(&mut self, at_ms: u64);

    /// Stop the beat clock; notes already sounding ring out
    fn stop_transport(&mut self, at_ms: u64);

    /// Begin capturing output. Fails if a capture is already running.
    fn start_capture(&mut self, at_ms: u64) -> Result<(), ChessMusicError>;

    /// Stop the running capture, encode it and release its resources.
    /// Returns `Ok(None)` when nothing was being captured.
    fn finish_capture(&mut self, at_ms: u64) -> Result<Option<AudioClip>, ChessMusicError>;

    fn is_capturing(&self) -> bool;
}
