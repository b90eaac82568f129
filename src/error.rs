//! # Error Types
//!
//! All fallible operations in the crate return [`ChessMusicError`].
//!
//! ## Error Types
//! - `ParseError` - Malformed PGN, with line and column information
//! - `ConfigError` - Invalid YAML playback configuration
//! - `EngineError` - The audio engine failed to start, stop or encode a capture
//!
//! Stopping or downloading without an active session is never an error; those
//! operations are no-ops.
//!
//! ## Usage
//! ```rust
//! use chess_music::{parse, ChessMusicError};
//!
//! match parse("1. e4 {unterminated") {
//!     Ok(game) => println!("{} moves", game.moves.len()),
//!     Err(ChessMusicError::ParseError { line, column, message }) => {
//!         eprintln!("PGN error at {}:{}: {}", line, column, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessMusicError {
    /// Malformed PGN text.
    ///
    /// # Example
    /// ```
    /// # use chess_music::ChessMusicError;
    /// let err = ChessMusicError::ParseError {
    ///     line: 3,
    ///     column: 7,
    ///     message: "Invalid move 'Zz9'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "PGN parse error at line 3, column 7: Invalid move 'Zz9'");
    /// ```
    #[error("PGN parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Invalid playback configuration.
    #[error("Invalid config: {0}")]
    ConfigError(String),

    /// Failure reported by the audio engine (capture, encoding).
    #[error("Audio engine error: {0}")]
    EngineError(String),
}

impl ChessMusicError {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        ChessMusicError::ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}
