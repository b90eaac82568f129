//! # Move Mapper
//!
//! Pure functions turning one chess move into one sound.
//!
//! ## Mapping Rules
//!
//! ### Pitch ([`move_to_note`])
//! 1. Special moves win over everything else, most specific token first:
//!    `O-O-O` → D4, `O-O` → C4, `#` → F4, `+` → E4, `e.p.` → G4
//!    (castling may also be written with zeros, `0-0-0` and `0-0`)
//! 2. A promotion (`e8=Q`) is cut at the `=`; the new piece is not heard
//! 3. The destination square is the last two characters; only its rank counts
//! 4. Rank `r` maps onto the C major scale starting at C4:
//!    letter = `C D E F G A B`\[(r-1) % 7\], octave = (r-1) / 7 + 4
//!
//! | Rank | 1  | 2  | 3  | 4  | 5  | 6  | 7  | 8  |
//! |------|----|----|----|----|----|----|----|----|
//! | Note | C4 | D4 | E4 | F4 | G4 | A4 | B4 | C5 |
//!
//! ### Duration ([`piece_to_duration`]) and velocity ([`piece_to_volume`])
//! Chosen by the piece letter that starts the move:
//!
//! | Piece  | Duration      | Velocity |
//! |--------|---------------|----------|
//! | Knight | quarter (4n)  | 0.5      |
//! | Bishop | eighth (8n)   | 0.6      |
//! | Rook   | half (2n)     | 0.7      |
//! | Queen  | 1 measure     | 0.8      |
//! | King   | 2 measures    | 0.9      |
//! | Pawn   | sixteenth     | 0.4      |
//!
//! Malformed notation never panics: it maps to a silent event.
//!
//! ## Example
//! ```rust
//! use chess_music::mapper::{move_to_note, piece_to_duration, piece_to_volume, NoteDuration};
//!
//! assert_eq!(move_to_note("Nf3").unwrap().to_string(), "E4");
//! assert_eq!(move_to_note("O-O-O").unwrap().to_string(), "D4");
//! assert_eq!(piece_to_duration("Qd1"), NoteDuration::Measure);
//! assert_eq!(piece_to_volume("Qd1"), 0.8);
//! ```

use crate::ast::{Game, Move};
use serde::{Serialize, Serializer};
use std::fmt;

/// Note letters of the C major scale, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub const SCALE: [NoteName; 7] = [
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
        NoteName::A,
        NoteName::B,
    ];

    /// Semitones above C
    pub fn semitone(&self) -> u8 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            NoteName::C => 'C',
            NoteName::D => 'D',
            NoteName::E => 'E',
            NoteName::F => 'F',
            NoteName::G => 'G',
            NoteName::A => 'A',
            NoteName::B => 'B',
        }
    }
}

/// A pitch in scientific pitch notation (C4 = middle C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub name: NoteName,
    pub octave: u8,
}

impl Pitch {
    pub const fn new(name: NoteName, octave: u8) -> Self {
        Self { name, octave }
    }

    /// MIDI note number (C4 = 60). Octaves above 9 fall outside the MIDI
    /// range but still yield a well-defined number.
    pub fn midi_note(&self) -> u16 {
        (u16::from(self.octave) + 1) * 12 + u16::from(self.name.semitone())
    }

    /// Equal-tempered frequency with A4 = 440 Hz
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi_note() as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name.letter(), self.octave)
    }
}

impl Serialize for Pitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Symbolic note length, in the transport notation of web audio toolkits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteDuration {
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Measure,
    TwoMeasures,
}

impl NoteDuration {
    /// Transport token: "16n", "8n", "4n", "2n", "1m", "2m"
    pub fn token(&self) -> &'static str {
        match self {
            NoteDuration::Sixteenth => "16n",
            NoteDuration::Eighth => "8n",
            NoteDuration::Quarter => "4n",
            NoteDuration::Half => "2n",
            NoteDuration::Measure => "1m",
            NoteDuration::TwoMeasures => "2m",
        }
    }

    /// Length in quarter-note beats, assuming 4/4 time
    pub fn beats(&self) -> f64 {
        match self {
            NoteDuration::Sixteenth => 0.25,
            NoteDuration::Eighth => 0.5,
            NoteDuration::Quarter => 1.0,
            NoteDuration::Half => 2.0,
            NoteDuration::Measure => 4.0,
            NoteDuration::TwoMeasures => 8.0,
        }
    }

    /// Length in seconds at the given tempo (quarter notes per minute)
    pub fn seconds(&self, tempo_bpm: f64) -> f64 {
        self.beats() * 60.0 / tempo_bpm
    }
}

impl fmt::Display for NoteDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for NoteDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// Special moves and their fixed notes, most specific token first so that
/// `O-O-O` is never mistaken for `O-O`.
const SPECIAL_MOVES: [(&str, Pitch); 7] = [
    ("O-O-O", Pitch::new(NoteName::D, 4)), // queenside castling
    ("0-0-0", Pitch::new(NoteName::D, 4)),
    ("O-O", Pitch::new(NoteName::C, 4)), // kingside castling
    ("0-0", Pitch::new(NoteName::C, 4)),
    ("#", Pitch::new(NoteName::F, 4)),     // checkmate
    ("+", Pitch::new(NoteName::E, 4)),     // check
    ("e.p.", Pitch::new(NoteName::G, 4)),  // en passant
];

const BASE_OCTAVE: u8 = 4;

/// Pitch for a move, or `None` when the destination square can't be read
pub fn move_to_note(notation: &str) -> Option<Pitch> {
    if let Some((_, pitch)) = SPECIAL_MOVES
        .iter()
        .find(|(token, _)| notation.contains(*token))
    {
        return Some(*pitch);
    }

    let square = match notation.find('=') {
        Some(idx) => &notation[..idx],
        None => notation,
    };
    let square = square.trim_end_matches(&['!', '?'][..]);

    let rank = square.chars().last()?.to_digit(10)?;
    if square.chars().count() < 2 || !(1..=8).contains(&rank) {
        return None;
    }

    let index = (rank - 1) as usize;
    let scale = NoteName::SCALE;
    Some(Pitch {
        name: scale[index % scale.len()],
        octave: (index / scale.len()) as u8 + BASE_OCTAVE,
    })
}

/// Note length chosen by the moving piece
pub fn piece_to_duration(notation: &str) -> NoteDuration {
    match notation.chars().next() {
        Some('N') => NoteDuration::Quarter,
        Some('B') => NoteDuration::Eighth,
        Some('R') => NoteDuration::Half,
        Some('Q') => NoteDuration::Measure,
        Some('K') => NoteDuration::TwoMeasures,
        _ => NoteDuration::Sixteenth,
    }
}

/// Velocity (0.0 - 1.0) chosen by the moving piece
pub fn piece_to_volume(notation: &str) -> f32 {
    match notation.chars().next() {
        Some('N') => 0.5,
        Some('B') => 0.6,
        Some('R') => 0.7,
        Some('Q') => 0.8,
        Some('K') => 0.9,
        _ => 0.4,
    }
}

/// Everything needed to play one move
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundEvent {
    pub index: usize,
    pub notation: String,
    /// `None` for notation whose square can't be read; the slot stays silent
    pub note: Option<Pitch>,
    pub duration: NoteDuration,
    pub velocity: f32,
    /// Milliseconds from the start of playback
    pub offset_ms: u64,
}

impl SoundEvent {
    pub fn from_move(index: usize, notation: &str, note_delay_ms: u64) -> Self {
        Self {
            index,
            notation: notation.to_string(),
            note: move_to_note(notation),
            duration: piece_to_duration(notation),
            velocity: piece_to_volume(notation),
            offset_ms: (index as u64).saturating_mul(note_delay_ms),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.note.is_none()
    }
}

/// Map a single move at position `index`
pub fn map_move(mv: &Move, note_delay_ms: u64) -> SoundEvent {
    SoundEvent::from_move(mv.ply, &mv.notation, note_delay_ms)
}

/// Map every main-line move of a game, in order
pub fn map_game(game: &Game, note_delay_ms: u64) -> Vec<SoundEvent> {
    game.moves
        .iter()
        .map(|mv| map_move(mv, note_delay_ms))
        .collect()
}
