//! Playback controller
//!
//! [`Player`] owns the audio engine, the clock and the scheduler of one
//! session and moves between [`PlaybackState`]s on explicit commands.
//!
//! # Session Lifecycle
//! ```text
//!            start                 stop
//!   Idle ──────────▶ Playing ─────────────▶ Stopped
//!     ▲                │  ▲                   │
//!     │ reset/set_pgn  │  └───── resume ──────┘
//!     │                │ last progress tick
//!     │                ▼
//!     └──────────── Completed
//! ```
//! `restart` is `stop` followed by `start` with progress back at zero.
//!
//! # Timers
//! A run schedules one `PlayMove` per remaining move plus one repeating
//! `ProgressTick`. Every transition that leaves `Playing` cancels all of
//! them before anything new is scheduled, and finishes the capture, so two
//! runs never overlap.

use super::clock::Clock;
use super::scheduler::Scheduler;
use super::types::{Download, PlaybackAction, PlaybackState, Progress};
use crate::audio::{AudioClip, AudioEngine};
use crate::config::PlaybackConfig;
use crate::error::ChessMusicError;
use crate::mapper::{map_game, Pitch, SoundEvent};
use crate::parser::parse;
use tracing::{debug, info, warn};

/// Plays a chess game as music against an [`AudioEngine`]
pub struct Player<E: AudioEngine, C: Clock> {
    engine: E,
    clock: C,
    config: PlaybackConfig,
    scheduler: Scheduler<PlaybackAction>,
    state: PlaybackState,
    pgn: String,
    plan: Vec<SoundEvent>,
    /// Moves already sounded in this session
    fired: usize,
    elapsed_ms: u64,
    total_ms: u64,
    clip: Option<AudioClip>,
}

impl<E: AudioEngine, C: Clock> Player<E, C> {
    /// Fails with `ConfigError` when `config` does not validate
    pub fn new(engine: E, clock: C, config: PlaybackConfig) -> Result<Self, ChessMusicError> {
        config.validate()?;
        Ok(Self {
            engine,
            clock,
            config,
            scheduler: Scheduler::new(),
            state: PlaybackState::Idle,
            pgn: String::new(),
            plan: Vec::new(),
            fired: 0,
            elapsed_ms: 0,
            total_ms: 0,
            clip: None,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn progress(&self) -> Progress {
        Progress {
            elapsed_ms: self.elapsed_ms,
            total_ms: self.total_ms,
        }
    }

    /// Sound events of the current session, in move order
    pub fn plan(&self) -> &[SoundEvent] {
        &self.plan
    }

    pub fn pgn(&self) -> &str {
        &self.pgn
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// All pending timers, note triggers and the progress tick
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Pending note triggers only
    pub fn pending_notes(&self) -> usize {
        self.scheduler
            .actions()
            .filter(|a| matches!(a, PlaybackAction::PlayMove(_)))
            .count()
    }

    /// Due time of the next timer, if any
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn can_start(&self) -> bool {
        !self.is_playing()
    }

    pub fn can_stop(&self) -> bool {
        self.is_playing()
    }

    pub fn can_resume(&self) -> bool {
        self.state == PlaybackState::Stopped && self.elapsed_ms > 0
    }

    pub fn can_restart(&self) -> bool {
        !self.pgn.trim().is_empty() && (self.is_playing() || self.elapsed_ms > 0)
    }

    pub fn can_download(&self) -> bool {
        self.clip.is_some() || self.engine.is_capturing()
    }

    /// Parse `pgn` and play it from the beginning.
    ///
    /// Returns the total duration in ms, or `None` when `pgn` is blank. A
    /// parse error leaves the player exactly as it was.
    pub fn start(&mut self, pgn: &str) -> Result<Option<u64>, ChessMusicError> {
        if pgn.trim().is_empty() {
            debug!("start ignored: empty PGN");
            return Ok(None);
        }

        let game = parse(pgn)?;
        self.stop()?;

        self.pgn = pgn.to_string();
        self.plan = map_game(&game, self.config.note_delay_ms);
        self.fired = 0;
        self.elapsed_ms = 0;
        self.total_ms = (self.plan.len() as u64).saturating_mul(self.config.note_delay_ms);
        self.clip = None;

        let mut pitches: Vec<Pitch> = self.plan.iter().filter_map(|e| e.note).collect();
        pitches.sort_by_key(|p| p.midi_note());
        pitches.dedup();
        self.engine.load_samples(&pitches)?;

        self.begin_run()?;
        info!(
            moves = self.plan.len(),
            total_ms = self.total_ms,
            "playback started"
        );
        Ok(Some(self.total_ms))
    }

    /// Cancel all timers, silence the engine and finish the capture.
    /// Does nothing when there is no running session.
    pub fn stop(&mut self) -> Result<(), ChessMusicError> {
        if !self.is_playing() && self.scheduler.is_empty() && !self.engine.is_capturing() {
            return Ok(());
        }

        let now = self.clock.now_ms();
        let cancelled = self.scheduler.cancel_all();
        self.engine.release_all(now);
        self.engine.stop_transport(now);
        if self.is_playing() {
            self.state = PlaybackState::Stopped;
        }
        debug!(cancelled, elapsed_ms = self.elapsed_ms, "playback stopped");
        self.finish_capture(now)
    }

    /// Continue a stopped session from its current progress, playing only the
    /// moves that have not sounded yet. Returns the total duration, or `None`
    /// when there is nothing to resume.
    pub fn resume(&mut self) -> Result<Option<u64>, ChessMusicError> {
        if !self.can_resume() {
            debug!(state = ?self.state, "resume ignored");
            return Ok(None);
        }
        self.begin_run()?;
        info!(
            elapsed_ms = self.elapsed_ms,
            remaining = self.plan.len() - self.fired,
            "playback resumed"
        );
        Ok(Some(self.total_ms))
    }

    /// Stop and start the current PGN again from zero
    pub fn restart(&mut self) -> Result<Option<u64>, ChessMusicError> {
        if self.pgn.trim().is_empty() {
            return Ok(None);
        }
        self.stop()?;
        self.elapsed_ms = 0;
        let pgn = self.pgn.clone();
        self.start(&pgn)
    }

    /// The captured audio, named for saving.
    ///
    /// A running capture is finished first; while playing, a new capture
    /// starts right away. Returns `None` when nothing was ever captured.
    pub fn download(&mut self) -> Result<Option<Download>, ChessMusicError> {
        if self.engine.is_capturing() {
            let now = self.clock.now_ms();
            self.finish_capture(now)?;
            if self.is_playing() {
                self.engine.start_capture(now)?;
            }
        }
        Ok(self
            .clip
            .as_ref()
            .map(|clip| Download::from_clip(&self.config.download_name, clip)))
    }

    /// Stop and forget the session: progress, total and captured audio
    pub fn reset(&mut self) -> Result<(), ChessMusicError> {
        self.stop()?;
        self.plan.clear();
        self.fired = 0;
        self.elapsed_ms = 0;
        self.total_ms = 0;
        self.clip = None;
        self.state = PlaybackState::Idle;
        Ok(())
    }

    /// The PGN text was edited. A non-empty change resets the session.
    pub fn set_pgn(&mut self, text: &str) -> Result<(), ChessMusicError> {
        if text == self.pgn {
            return Ok(());
        }
        self.pgn = text.to_string();
        if !text.trim().is_empty() {
            self.reset()?;
        }
        Ok(())
    }

    /// Run every timer that is due by now and report progress
    pub fn poll(&mut self) -> Result<Progress, ChessMusicError> {
        let now = self.clock.now_ms();
        while let Some((due, action)) = self.scheduler.pop_due(now) {
            match action {
                PlaybackAction::PlayMove(index) => self.play_move(index, due),
                PlaybackAction::ProgressTick => {
                    self.elapsed_ms = self
                        .elapsed_ms
                        .saturating_add(self.config.progress_step_ms)
                        .min(self.total_ms);
                    if self.elapsed_ms >= self.total_ms {
                        self.complete(due)?;
                    }
                }
            }
        }
        Ok(self.progress())
    }

    fn begin_run(&mut self) -> Result<(), ChessMusicError> {
        let now = self.clock.now_ms();
        if self.elapsed_ms >= self.total_ms {
            // Nothing to play, e.g. a PGN with tags only
            self.state = PlaybackState::Completed;
            return Ok(());
        }

        self.engine.start_capture(now)?;
        self.engine.start_transport(now);

        for (index, event) in self.plan.iter().enumerate().skip(self.fired) {
            let due = now.saturating_add(event.offset_ms.saturating_sub(self.elapsed_ms));
            self.scheduler.schedule_at(due, PlaybackAction::PlayMove(index));
        }
        let step = self.config.progress_step_ms;
        self.scheduler
            .schedule_repeating(now.saturating_add(step), step, PlaybackAction::ProgressTick);

        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn play_move(&mut self, index: usize, at_ms: u64) {
        let Some(event) = self.plan.get(index) else {
            return;
        };
        self.fired = self.fired.max(index + 1);
        match event.note {
            Some(pitch) => {
                debug!(
                    notation = %event.notation,
                    %pitch,
                    duration = %event.duration,
                    velocity = event.velocity,
                    at_ms,
                    "note"
                );
                self.engine
                    .trigger(pitch, event.duration, at_ms, event.velocity);
            }
            None => warn!(notation = %event.notation, "no destination square, move is silent"),
        }
    }

    fn complete(&mut self, at_ms: u64) -> Result<(), ChessMusicError> {
        self.scheduler.cancel_all();
        self.engine.stop_transport(at_ms);
        self.state = PlaybackState::Completed;
        info!(total_ms = self.total_ms, "playback complete");
        self.finish_capture(at_ms)
    }

    fn finish_capture(&mut self, at_ms: u64) -> Result<(), ChessMusicError> {
        if let Some(clip) = self.engine.finish_capture(at_ms)? {
            debug!(duration_ms = clip.duration_ms, "capture saved");
            self.clip = Some(clip);
        }
        Ok(())
    }
}

impl<E: AudioEngine, C: Clock> Drop for Player<E, C> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "failed to stop playback on teardown");
        }
    }
}
