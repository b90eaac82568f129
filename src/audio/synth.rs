//! Offline synthesizer engine
//!
//! Notes are kept as voices on an absolute sample timeline and only rendered
//! when a capture is finished, so `release_all` can still shorten notes that
//! were triggered earlier.
//!
//! Each move note is a sine with a quieter second harmonic, shaped by a linear
//! attack, an exponential decay while held and a linear release. Move notes
//! pass through a feedback echo and a reverb.
//!
//! While the transport runs it drives two things on every quarter note:
//! - a bass loop cycling C2 D2 E2 A2 as eighth notes (triangle wave, dry)
//! - a new reverb level, picked at random up to `reverb-wet-max`
//!
//! Transport events are laid out lazily up to the latest time the engine has
//! been told about.

use super::reverb::Reverb;
use super::{encode_wav, AudioClip, AudioEngine, ClipFormat};
use crate::config::SynthConfig;
use crate::error::ChessMusicError;
use crate::mapper::{NoteDuration, NoteName, Pitch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::f32::consts::TAU;
use tracing::debug;

const SECOND_HARMONIC: f32 = 0.3;
/// Decay rate while a note is held (per second)
const HOLD_DECAY: f32 = 1.5;

const BACKING_LOOP: [Pitch; 4] = [
    Pitch::new(NoteName::C, 2),
    Pitch::new(NoteName::D, 2),
    Pitch::new(NoteName::E, 2),
    Pitch::new(NoteName::A, 2),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceKind {
    Move,
    Backing,
}

#[derive(Debug, Clone)]
struct Voice {
    kind: VoiceKind,
    frequency: f32,
    velocity: f32,
    start: usize,
    /// Sample at which the release phase begins
    release_at: usize,
}

impl Voice {
    fn end(&self, release_samples: usize) -> usize {
        self.release_at + release_samples
    }

    fn tone(&self, t: f32) -> f32 {
        let phase = self.frequency * t;
        match self.kind {
            VoiceKind::Move => {
                let phase = TAU * phase;
                (phase.sin() + SECOND_HARMONIC * (2.0 * phase).sin()) / (1.0 + SECOND_HARMONIC)
            }
            VoiceKind::Backing => {
                // triangle
                4.0 * (phase - (phase + 0.5).floor()).abs() - 1.0
            }
        }
    }
}

/// Position of the running transport
#[derive(Debug, Clone, Copy)]
struct Transport {
    /// Sample of the next quarter note not laid out yet
    next_beat: usize,
    beat: usize,
}

/// Offline synthesizer with in-memory WAV capture
pub struct SynthEngine {
    config: SynthConfig,
    tempo_bpm: f64,
    voices: Vec<Voice>,
    /// `(sample, level)` reverb changes in time order
    wet_changes: Vec<(usize, f32)>,
    loaded: HashSet<Pitch>,
    transport: Option<Transport>,
    capture_start: Option<usize>,
    rng: StdRng,
}

impl SynthEngine {
    pub fn new(config: SynthConfig, tempo_bpm: f64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            tempo_bpm,
            voices: Vec::new(),
            wet_changes: Vec::new(),
            loaded: HashSet::new(),
            transport: None,
            capture_start: None,
            rng,
        }
    }

    pub fn is_transport_running(&self) -> bool {
        self.transport.is_some()
    }

    /// Number of notes, move and backing, that have not finished sounding at `at_ms`
    pub fn sounding_voices(&self, at_ms: u64) -> usize {
        let now = self.ms_to_samples(at_ms);
        let release = self.release_samples();
        self.voices
            .iter()
            .filter(|v| v.start <= now && v.end(release) > now)
            .count()
    }

    /// Backing loop notes laid out so far and not yet discarded by a capture
    pub fn backing_notes(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.kind == VoiceKind::Backing)
            .count()
    }

    fn ms_to_samples(&self, ms: u64) -> usize {
        (ms as u128 * self.config.sample_rate as u128 / 1000) as usize
    }

    fn release_samples(&self) -> usize {
        self.ms_to_samples(self.config.release_ms as u64).max(1)
    }

    fn attack_samples(&self) -> usize {
        self.ms_to_samples(self.config.attack_ms as u64).max(1)
    }

    fn beat_samples(&self) -> usize {
        let seconds = NoteDuration::Quarter.seconds(self.tempo_bpm);
        ((seconds * self.config.sample_rate as f64) as usize).max(1)
    }

    /// Lay out every quarter-note event of the running transport before `until`
    fn advance_transport(&mut self, until: usize) {
        let Some(mut transport) = self.transport else {
            return;
        };
        let beat = self.beat_samples();
        let eighth = ((NoteDuration::Eighth.seconds(self.tempo_bpm)
            * self.config.sample_rate as f64) as usize)
            .max(1);

        while transport.next_beat <= until {
            let at = transport.next_beat;
            if self.config.backing {
                let pitch = BACKING_LOOP[transport.beat % BACKING_LOOP.len()];
                self.voices.push(Voice {
                    kind: VoiceKind::Backing,
                    frequency: pitch.frequency(),
                    velocity: self.config.backing_velocity,
                    start: at,
                    release_at: at + eighth,
                });
            }
            // the first beat keeps the configured level
            if transport.beat > 0 {
                let level = self.rng.gen_range(0.0..=self.config.reverb_wet_max);
                self.wet_changes.push((at, level));
            }
            transport.beat += 1;
            transport.next_beat += beat;
        }
        self.transport = Some(transport);
    }

    fn envelope(&self, voice: &Voice, position: usize) -> f32 {
        let rate = self.config.sample_rate as f32;
        let attack = self.attack_samples();
        let release = self.release_samples();

        let held = |pos: usize| {
            let at = pos - voice.start;
            let rise = (at as f32 / attack as f32).min(1.0);
            rise * (-HOLD_DECAY * at as f32 / rate).exp()
        };

        if position < voice.release_at {
            held(position)
        } else {
            let fade = 1.0 - (position - voice.release_at) as f32 / release as f32;
            held(voice.release_at) * fade.max(0.0)
        }
    }

    /// Reverb level in effect at `position`
    #[cfg(test)]
    fn wet_at(&self, position: usize) -> f32 {
        self.wet_changes
            .iter()
            .take_while(|(at, _)| *at <= position)
            .last()
            .map_or(self.config.reverb_wet, |&(_, level)| level)
    }

    fn render(&self, from: usize, to: usize) -> Vec<f32> {
        let rate = self.config.sample_rate as f32;
        let release = self.release_samples();
        let len = to.saturating_sub(from);
        let mut moves = vec![0.0f32; len];
        let mut backing = vec![0.0f32; len];

        for voice in &self.voices {
            let target = match voice.kind {
                VoiceKind::Move => &mut moves,
                VoiceKind::Backing => &mut backing,
            };
            let start = voice.start.max(from);
            let end = voice.end(release).min(to);
            for position in start..end {
                let t = (position - voice.start) as f32 / rate;
                target[position - from] +=
                    voice.velocity * self.envelope(voice, position) * voice.tone(t);
            }
        }

        let reverb = Reverb::new(self.config.sample_rate, self.config.reverb_decay).process(&moves);
        self.apply_echo(&mut moves);

        let mut changes = self.wet_changes.iter().peekable();
        let mut level = self.config.reverb_wet;
        moves
            .iter()
            .zip(&reverb)
            .zip(&backing)
            .enumerate()
            .map(|(i, ((dry, wet), bass))| {
                while let Some(&&(at, next)) = changes.peek() {
                    if at > from + i {
                        break;
                    }
                    level = next;
                    changes.next();
                }
                let mixed = dry * (1.0 - level) + wet * level + bass;
                (mixed * self.config.gain).clamp(-1.0, 1.0)
            })
            .collect()
    }

    /// Feedback delay mixed into the dry signal
    fn apply_echo(&self, samples: &mut [f32]) {
        let delay = (self.config.echo_delay * self.config.sample_rate as f32) as usize;
        if delay == 0 || self.config.echo_mix <= 0.0 {
            return;
        }
        let mut wet = vec![0.0f32; samples.len()];
        for n in delay..samples.len() {
            wet[n] = samples[n - delay] + self.config.echo_feedback * wet[n - delay];
        }
        for (sample, echo) in samples.iter_mut().zip(wet) {
            *sample += self.config.echo_mix * echo;
        }
    }
}

impl AudioEngine for SynthEngine {
    fn load_samples(&mut self, pitches: &[Pitch]) -> Result<(), ChessMusicError> {
        self.loaded.extend(pitches.iter().copied());
        debug!(count = self.loaded.len(), "instrument ready");
        Ok(())
    }

    fn trigger(&mut self, pitch: Pitch, duration: NoteDuration, at_ms: u64, velocity: f32) {
        if !self.loaded.contains(&pitch) {
            debug!(%pitch, "pitch was not preloaded");
        }
        let start = self.ms_to_samples(at_ms);
        self.advance_transport(start);
        let hold = (duration.seconds(self.tempo_bpm) * self.config.sample_rate as f64) as usize;
        self.voices.push(Voice {
            kind: VoiceKind::Move,
            frequency: pitch.frequency(),
            velocity: velocity.clamp(0.0, 1.0),
            start,
            release_at: start + hold.max(1),
        });
    }

    fn release_all(&mut self, at_ms: u64) {
        let now = self.ms_to_samples(at_ms);
        self.advance_transport(now);
        for voice in &mut self.voices {
            if voice.release_at > now {
                voice.release_at = now.max(voice.start);
            }
        }
    }

    fn start_transport(&mut self, at_ms: u64) {
        if self.transport.is_some() {
            return;
        }
        self.transport = Some(Transport {
            next_beat: self.ms_to_samples(at_ms),
            beat: 0,
        });
        debug!(at_ms, backing = self.config.backing, "transport started");
    }

    fn stop_transport(&mut self, at_ms: u64) {
        let now = self.ms_to_samples(at_ms);
        // a beat landing exactly on the stop time does not sound
        self.advance_transport(now.saturating_sub(1));
        if self.transport.take().is_some() {
            debug!(at_ms, "transport stopped");
        }
    }

    fn start_capture(&mut self, at_ms: u64) -> Result<(), ChessMusicError> {
        if self.capture_start.is_some() {
            return Err(ChessMusicError::EngineError(
                "a capture is already running".to_string(),
            ));
        }
        self.capture_start = Some(self.ms_to_samples(at_ms));
        Ok(())
    }

    fn finish_capture(&mut self, at_ms: u64) -> Result<Option<AudioClip>, ChessMusicError> {
        let Some(from) = self.capture_start.take() else {
            return Ok(None);
        };
        let release = self.release_samples();
        let stop = self.ms_to_samples(at_ms).max(from);
        self.advance_transport(stop.saturating_sub(1));

        // Let notes started inside the capture ring out, up to one release length
        let to = self
            .voices
            .iter()
            .filter(|v| v.start < stop)
            .map(|v| v.end(release))
            .max()
            .unwrap_or(stop)
            .clamp(stop, stop + release);

        let samples = self.render(from, to);
        let bytes = encode_wav(&samples, self.config.sample_rate)?;
        let duration_ms = samples.len() as u64 * 1000 / self.config.sample_rate as u64;

        self.voices.retain(|v| v.end(release) > stop);
        let current = self.wet_changes.iter().rposition(|(at, _)| *at <= stop);
        if let Some(index) = current {
            self.wet_changes.drain(..index);
        }
        debug!(duration_ms, bytes = bytes.len(), "capture finished");

        Ok(Some(AudioClip {
            format: ClipFormat::Wav,
            bytes,
            duration_ms,
        }))
    }

    fn is_capturing(&self) -> bool {
        self.capture_start.is_some()
    }
}
