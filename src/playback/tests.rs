use super::*;
use crate::audio::{AudioClip, AudioEngine, ClipFormat};
use crate::config::PlaybackConfig;
use crate::error::ChessMusicError;
use crate::mapper::{NoteDuration, NoteName, Pitch};
use std::cell::RefCell;
use std::rc::Rc;

const GAME: &str = "1. e4 e5 2. Nf3 Nc6";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(Vec<Pitch>),
    Trigger(Pitch, NoteDuration, u64, f32),
    ReleaseAll(u64),
    StartTransport(u64),
    StopTransport(u64),
    StartCapture(u64),
    FinishCapture(u64),
}

/// Records every engine call; clones share the log
#[derive(Debug, Clone, Default)]
struct MockEngine {
    calls: Rc<RefCell<Vec<Call>>>,
    capture_start: Option<u64>,
}

impl MockEngine {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn triggers(&self) -> Vec<(Pitch, u64)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Trigger(pitch, _, at, _) => Some((*pitch, *at)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl AudioEngine for MockEngine {
    fn load_samples(&mut self, pitches: &[Pitch]) -> Result<(), ChessMusicError> {
        self.record(Call::Load(pitches.to_vec()));
        Ok(())
    }

    fn trigger(&mut self, pitch: Pitch, duration: NoteDuration, at_ms: u64, velocity: f32) {
        self.record(Call::Trigger(pitch, duration, at_ms, velocity));
    }

    fn release_all(&mut self, at_ms: u64) {
        self.record(Call::ReleaseAll(at_ms));
    }

    fn start_transport(&mut self, at_ms: u64) {
        self.record(Call::StartTransport(at_ms));
    }

    fn stop_transport(&mut self, at_ms: u64) {
        self.record(Call::StopTransport(at_ms));
    }

    fn start_capture(&mut self, at_ms: u64) -> Result<(), ChessMusicError> {
        if self.capture_start.is_some() {
            return Err(ChessMusicError::EngineError("already capturing".to_string()));
        }
        self.record(Call::StartCapture(at_ms));
        self.capture_start = Some(at_ms);
        Ok(())
    }

    fn finish_capture(&mut self, at_ms: u64) -> Result<Option<AudioClip>, ChessMusicError> {
        let Some(start) = self.capture_start.take() else {
            return Ok(None);
        };
        self.record(Call::FinishCapture(at_ms));
        Ok(Some(AudioClip {
            format: ClipFormat::Wav,
            bytes: vec![0; 4],
            duration_ms: at_ms - start,
        }))
    }

    fn is_capturing(&self) -> bool {
        self.capture_start.is_some()
    }
}

fn player() -> (Player<MockEngine, VirtualClock>, MockEngine, VirtualClock) {
    let engine = MockEngine::default();
    let clock = VirtualClock::new();
    let player = Player::new(engine.clone(), clock.clone(), PlaybackConfig::default()).unwrap();
    (player, engine, clock)
}

#[test]
fn test_start_schedules_every_move() {
    let (mut player, _, _) = player();
    assert_eq!(player.start(GAME).unwrap(), Some(2000));

    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.progress().total_ms, 2000);
    assert_eq!(player.progress().elapsed_ms, 0);
    assert_eq!(player.pending_notes(), 4);
    // one progress tick on top of the notes
    assert_eq!(player.pending_timers(), 5);
    assert_eq!(player.plan().len(), 4);
}

#[test]
fn test_start_loads_each_pitch_once() {
    let (mut player, engine, _) = player();
    player.start("1. e4 e5 2. d4 d5").unwrap();
    // e4/d4 share F4, e5/d5 share G4
    assert_eq!(
        engine.calls()[0],
        Call::Load(vec![Pitch::new(NoteName::F, 4), Pitch::new(NoteName::G, 4)])
    );
}

#[test]
fn test_notes_fire_at_their_offsets() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();

    player.poll().unwrap();
    assert_eq!(engine.triggers(), vec![(Pitch::new(NoteName::F, 4), 0)]);

    clock.advance(500);
    let progress = player.poll().unwrap();
    assert_eq!(progress.elapsed_ms, 500);
    assert_eq!(
        engine.triggers(),
        vec![
            (Pitch::new(NoteName::F, 4), 0),
            (Pitch::new(NoteName::G, 4), 500),
        ]
    );
}

#[test]
fn test_trigger_carries_piece_duration_and_velocity() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(1000);
    player.poll().unwrap();

    let knight = engine
        .calls()
        .into_iter()
        .find(|c| matches!(c, Call::Trigger(_, NoteDuration::Quarter, _, _)));
    assert_eq!(
        knight,
        Some(Call::Trigger(
            Pitch::new(NoteName::E, 4),
            NoteDuration::Quarter,
            1000,
            0.5
        ))
    );
}

#[test]
fn test_late_poll_fires_in_order() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(10_000);
    player.poll().unwrap();

    let times: Vec<u64> = engine.triggers().iter().map(|(_, at)| *at).collect();
    assert_eq!(times, vec![0, 500, 1000, 1500]);
    assert_eq!(player.state(), PlaybackState::Completed);
}

#[test]
fn test_completion() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    for _ in 0..4 {
        clock.advance(500);
        player.poll().unwrap();
    }

    assert_eq!(player.state(), PlaybackState::Completed);
    assert_eq!(player.progress().elapsed_ms, 2000);
    assert!(player.progress().is_complete());
    assert_eq!(player.pending_timers(), 0);
    assert!(!player.engine().is_capturing());
    assert_eq!(engine.count(|c| matches!(c, Call::StopTransport(2000))), 1);
    assert!(player.can_download());
    assert!(!player.can_stop());
}

#[test]
fn test_progress_never_exceeds_total() {
    let (mut player, _, clock) = player();
    player.start("1. e4").unwrap();
    clock.advance(5000);
    let progress = player.poll().unwrap();
    assert_eq!(progress.elapsed_ms, 500);
    assert_eq!(progress.total_ms, 500);
}

#[test]
fn test_stop_is_idempotent() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(500);
    player.poll().unwrap();

    player.stop().unwrap();
    let after_first = engine.calls().len();
    player.stop().unwrap();

    assert_eq!(engine.calls().len(), after_first);
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(player.pending_timers(), 0);
    assert_eq!(player.progress().elapsed_ms, 500);
}

#[test]
fn test_stop_without_session_does_nothing() {
    let (mut player, engine, _) = player();
    player.stop().unwrap();
    assert!(engine.calls().is_empty());
    assert_eq!(player.state(), PlaybackState::Idle);
}

#[test]
fn test_stop_then_start_does_not_double_schedule() {
    let (mut player, _, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(700);
    player.poll().unwrap();
    player.stop().unwrap();
    player.start(GAME).unwrap();

    assert_eq!(player.pending_notes(), 4);
    assert_eq!(player.pending_timers(), 5);
    assert_eq!(player.progress().elapsed_ms, 0);
}

#[test]
fn test_start_while_playing_replaces_session() {
    let (mut player, engine, _) = player();
    player.start(GAME).unwrap();
    player.start("1. d4 d5").unwrap();

    assert_eq!(player.pending_notes(), 2);
    assert_eq!(player.progress().total_ms, 1000);
    assert_eq!(engine.count(|c| matches!(c, Call::FinishCapture(_))), 1);
    assert_eq!(engine.count(|c| matches!(c, Call::StartCapture(_))), 2);
}

#[test]
fn test_blank_start_is_ignored() {
    let (mut player, engine, _) = player();
    assert_eq!(player.start("  \n ").unwrap(), None);
    assert!(engine.calls().is_empty());
    assert_eq!(player.state(), PlaybackState::Idle);
}

#[test]
fn test_parse_error_schedules_nothing() {
    let (mut player, engine, _) = player();
    let err = player.start("1. e4 Zz9").unwrap_err();
    assert!(matches!(err, ChessMusicError::ParseError { .. }));
    assert_eq!(player.pending_timers(), 0);
    assert!(engine.calls().is_empty());
    assert!(!player.can_download());
    assert_eq!(player.state(), PlaybackState::Idle);
}

#[test]
fn test_parse_error_keeps_running_session() {
    let (mut player, _, _) = player();
    player.start(GAME).unwrap();
    assert!(player.start("1. e4 (").is_err());
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.pending_notes(), 4);
    assert_eq!(player.pgn(), GAME);
}

#[test]
fn test_game_without_moves_completes_at_once() {
    let (mut player, engine, _) = player();
    assert_eq!(player.start("[Event \"Empty\"]\n\n*").unwrap(), Some(0));
    assert_eq!(player.state(), PlaybackState::Completed);
    assert_eq!(player.pending_timers(), 0);
    assert_eq!(engine.count(|c| matches!(c, Call::StartCapture(_))), 0);
    assert_eq!(player.download().unwrap(), None);
}

#[test]
fn test_resume_plays_only_remaining_moves() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(1000);
    player.poll().unwrap();
    assert_eq!(engine.triggers().len(), 3);
    player.stop().unwrap();
    assert!(player.can_resume());

    clock.advance(5000);
    assert_eq!(player.resume().unwrap(), Some(2000));
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.pending_notes(), 1);
    // the last move was due 500 ms after the stop point
    assert_eq!(player.next_due(), Some(6500));

    clock.advance(1000);
    let progress = player.poll().unwrap();
    assert_eq!(engine.triggers().len(), 4);
    assert_eq!(engine.triggers()[3].1, 6500);
    assert_eq!(progress.elapsed_ms, 2000);
    assert_eq!(player.state(), PlaybackState::Completed);
}

#[test]
fn test_resume_requires_stopped_session() {
    let (mut player, engine, _) = player();
    assert_eq!(player.resume().unwrap(), None);
    player.start(GAME).unwrap();
    assert_eq!(player.resume().unwrap(), None);
    assert_eq!(engine.count(|c| matches!(c, Call::StartCapture(_))), 1);
}

#[test]
fn test_restart_begins_from_zero() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(1200);
    player.poll().unwrap();
    assert!(player.can_restart());

    assert_eq!(player.restart().unwrap(), Some(2000));
    assert_eq!(player.progress().elapsed_ms, 0);
    assert_eq!(player.pending_notes(), 4);
    assert_eq!(player.next_due(), Some(1200));
    assert_eq!(engine.count(|c| matches!(c, Call::ReleaseAll(1200))), 1);
}

#[test]
fn test_restart_without_pgn() {
    let (mut player, engine, _) = player();
    assert!(!player.can_restart());
    assert_eq!(player.restart().unwrap(), None);
    assert!(engine.calls().is_empty());
}

#[test]
fn test_download_without_capture() {
    let (mut player, _, _) = player();
    assert!(!player.can_download());
    assert_eq!(player.download().unwrap(), None);
}

#[test]
fn test_download_after_stop() {
    let (mut player, _, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(800);
    player.poll().unwrap();
    player.stop().unwrap();

    let download = player.download().unwrap().unwrap();
    assert_eq!(download.file_name, "chess-music.wav");
    assert_eq!(download.mime_type, "audio/wav");
    // stays available
    assert!(player.download().unwrap().is_some());
}

#[test]
fn test_download_while_playing_keeps_capturing() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(600);
    player.poll().unwrap();

    assert!(player.download().unwrap().is_some());
    assert!(player.engine().is_capturing());
    assert_eq!(engine.count(|c| matches!(c, Call::StartCapture(600))), 1);
    assert_eq!(player.state(), PlaybackState::Playing);
}

#[test]
fn test_set_pgn_resets_session() {
    let (mut player, _, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(2000);
    player.poll().unwrap();
    assert!(player.can_download());

    player.set_pgn("1. d4").unwrap();
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.progress(), Progress::default());
    assert!(!player.can_download());
    assert!(player.plan().is_empty());
    assert_eq!(player.pgn(), "1. d4");
}

#[test]
fn test_set_pgn_same_or_empty_keeps_session() {
    let (mut player, _, _) = player();
    player.start(GAME).unwrap();
    player.set_pgn(GAME).unwrap();
    assert_eq!(player.state(), PlaybackState::Playing);

    player.set_pgn("").unwrap();
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.pending_notes(), 4);
}

#[test]
fn test_button_predicates() {
    let (mut player, _, clock) = player();
    assert!(player.can_start());
    assert!(!player.can_stop());
    assert!(!player.can_resume());

    player.start(GAME).unwrap();
    assert!(!player.can_start());
    assert!(player.can_stop());
    assert!(player.can_restart());

    clock.advance(500);
    player.poll().unwrap();
    player.stop().unwrap();
    assert!(player.can_start());
    assert!(player.can_resume());
    assert!(player.can_download());
}

#[test]
fn test_drop_releases_everything() {
    let (mut player, engine, clock) = player();
    player.start(GAME).unwrap();
    clock.advance(700);
    player.poll().unwrap();
    drop(player);

    let calls = engine.calls();
    let tail = &calls[calls.len() - 3..];
    assert_eq!(
        tail,
        &[
            Call::ReleaseAll(700),
            Call::StopTransport(700),
            Call::FinishCapture(700),
        ]
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    for config in [
        PlaybackConfig {
            progress_step_ms: 0,
            ..Default::default()
        },
        PlaybackConfig {
            note_delay_ms: 0,
            ..Default::default()
        },
    ] {
        let result = Player::new(MockEngine::default(), VirtualClock::new(), config);
        assert!(matches!(result, Err(ChessMusicError::ConfigError(_))));
    }
}

#[test]
fn test_coarse_progress_step_still_completes() {
    let config = PlaybackConfig {
        progress_step_ms: 1500,
        ..Default::default()
    };
    let clock = VirtualClock::new();
    let mut player = Player::new(MockEngine::default(), clock.clone(), config).unwrap();
    player.start(GAME).unwrap();

    clock.advance(3000);
    let progress = player.poll().unwrap();
    assert_eq!(progress.elapsed_ms, 2000);
    assert_eq!(player.state(), PlaybackState::Completed);
}

#[test]
fn test_longest_note_delay_does_not_overflow() {
    let config = PlaybackConfig {
        note_delay_ms: 3_600_000,
        progress_step_ms: 3_600_000,
        ..Default::default()
    };
    let clock = VirtualClock::new();
    let mut player = Player::new(MockEngine::default(), clock.clone(), config).unwrap();
    assert_eq!(player.start(GAME).unwrap(), Some(4 * 3_600_000));

    clock.advance(4 * 3_600_000);
    player.poll().unwrap();
    assert_eq!(player.state(), PlaybackState::Completed);
}
