pub mod ast;
pub mod audio;
pub mod config;
pub mod error;
pub mod lexer;
pub mod mapper;
pub mod parser;
pub mod playback;

pub use ast::*;
pub use config::{PlaybackConfig, SynthConfig};
pub use error::*;
pub use mapper::{map_game, map_move, move_to_note, piece_to_duration, piece_to_volume, SoundEvent};
pub use parser::parse;
pub use playback::{render, Player, PlaybackState, Progress};

/// Parse a PGN game and map every move to its sound.
/// This is the main entry point for the library.
pub fn plan(pgn: &str, note_delay_ms: u64) -> Result<Vec<SoundEvent>, ChessMusicError> {
    let game = parse(pgn)?;
    Ok(map_game(&game, note_delay_ms))
}
