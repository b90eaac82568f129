use super::clock::VirtualClock;
use super::engine::Player;
use super::types::{Download, PlaybackState};
use crate::audio::SynthEngine;
use crate::config::PlaybackConfig;
use crate::error::ChessMusicError;
use tracing::info;

/// Play a whole game on a virtual clock and return the captured audio.
///
/// Returns `None` when the PGN is blank or has no moves.
pub fn render(pgn: &str, config: &PlaybackConfig) -> Result<Option<Download>, ChessMusicError> {
    let clock = VirtualClock::new();
    let engine = SynthEngine::new(config.synth.clone(), config.tempo_bpm);
    let mut player = Player::new(engine, clock.clone(), config.clone())?;

    if player.start(pgn)?.is_none() {
        return Ok(None);
    }
    player.poll()?;
    while player.state() == PlaybackState::Playing {
        clock.advance(config.progress_step_ms);
        player.poll()?;
    }

    let download = player.download()?;
    if let Some(download) = &download {
        info!(
            file = %download.file_name,
            bytes = download.bytes.len(),
            "render finished"
        );
    }
    Ok(download)
}
