//! # Playback Module
//!
//! Play a parsed chess game as a timed sequence of notes, track progress and
//! capture the result for download.
//!
//! ## Purpose
//! A [`Player`] turns PGN text into sound:
//! 1. **Scheduling** - one note per move, `note-delay-ms` apart
//! 2. **Progress** - elapsed time advanced in `progress-step-ms` steps
//! 3. **Capture** - the engine records everything played into a clip
//!
//! ## Sub-modules
//! - `types` - PlaybackState, PlaybackAction, Progress, Download
//! - `engine` - The [`Player`] state machine
//! - `clock` - [`SystemClock`] and [`VirtualClock`] time sources
//! - `scheduler` - Ordered, cancellable timers
//! - `render` - Whole-game offline rendering
//!
//! ## Driving a Player
//! The player never blocks. Callers poll it as time passes; every timer that
//! is due fires on the next [`Player::poll`], in due order.
//!
//! ## Example
//! ```rust
//! use chess_music::audio::SynthEngine;
//! use chess_music::playback::{Player, PlaybackState, VirtualClock};
//! use chess_music::PlaybackConfig;
//!
//! let config = PlaybackConfig::default();
//! let clock = VirtualClock::new();
//! let engine = SynthEngine::new(config.synth.clone(), config.tempo_bpm);
//! let mut player = Player::new(engine, clock.clone(), config).unwrap();
//!
//! let total = player.start("1. e4 e5 2. Nf3 Nc6").unwrap();
//! assert_eq!(total, Some(2000));
//!
//! clock.advance(2000);
//! let progress = player.poll().unwrap();
//! assert_eq!(progress.elapsed_ms, 2000);
//! assert_eq!(player.state(), PlaybackState::Completed);
//! ```

mod clock;
mod engine;
mod render;
mod scheduler;
mod types;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use engine::Player;
pub use render::render;
pub use scheduler::{Scheduler, TimerHandle};
pub use types::{Download, PlaybackAction, PlaybackState, Progress};
