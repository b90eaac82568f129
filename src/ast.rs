//! # Game Types
//!
//! The structured form of a PGN game, as produced by [`crate::parser::parse`].
//!
//! ## Type Hierarchy
//! ```text
//! Game
//!   ├── tags: Vec<Tag> (seven tag roster and any extra tags, in source order)
//!   ├── moves: Vec<Move>
//!   │     ├── ply: usize (0-based position in the game)
//!   │     ├── number: u32 (full-move number, 1-based)
//!   │     ├── side: Side (White | Black)
//!   │     ├── notation: String (SAN, e.g. "Nf3", "O-O", "e8=Q#")
//!   │     ├── annotation: Option<String> ("!", "?!", ...)
//!   │     ├── nags: Vec<u16> ($1, $14, ...)
//!   │     └── comment: Option<String>
//!   └── result: Option<GameResult>
//! ```
//!
//! Only the main line is kept. Variations in parentheses are skipped and a
//! PGN file with several games yields the first one.

use serde::Serialize;

/// Side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Game termination marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
    #[serde(rename = "*")]
    Ongoing,
}

impl GameResult {
    /// Parse a PGN result token
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "1-0" => Some(GameResult::WhiteWins),
            "0-1" => Some(GameResult::BlackWins),
            "1/2-1/2" => Some(GameResult::Draw),
            "*" => Some(GameResult::Ongoing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Ongoing => "*",
        }
    }
}

/// A tag pair such as `[White "Kasparov"]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// One ply of the game
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub ply: usize,
    pub number: u32,
    pub side: Side,
    pub notation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nags: Vec<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Move {
    pub fn new(ply: usize, number: u32, side: Side, notation: impl Into<String>) -> Self {
        Self {
            ply,
            number,
            side,
            notation: notation.into(),
            annotation: None,
            nags: Vec::new(),
            comment: None,
        }
    }
}

/// A parsed game: tags, main-line moves and result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Game {
    pub tags: Vec<Tag>,
    pub moves: Vec<Move>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
}

impl Game {
    /// Look up a tag value by name (case-sensitive, as PGN tags are)
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }
}
