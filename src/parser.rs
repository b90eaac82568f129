//! # PGN Parser
//!
//! Turns PGN text into a [`Game`]: tag pairs, main-line moves and the result.
//!
//! ## Accepted Input
//! - Tag pairs: `[Name "Value"]`, any number, before the movetext
//! - Move numbers: `12.` for White, `12...` for Black (optional)
//! - SAN moves: `e4`, `Nbd7`, `R1e2`, `exd5`, `e8=Q+`, `O-O`, `O-O-O#`, `exd6 e.p.`
//! - Suffix annotations (`!`, `?!`) and NAGs (`$3`), attached to the previous move
//! - Comments (`{...}`, `; ...`), attached to the previous move
//! - Variations `( ... )`, skipped including nested ones
//! - Result tokens `1-0`, `0-1`, `1/2-1/2`, `*`
//!
//! Only the first game is read. Moves are checked for SAN shape, never for
//! legality.
//!
//! ## Example
//! ```rust
//! use chess_music::parse;
//!
//! let game = parse(r#"[White "Anderssen"]
//! 1. e4 e5 2. Nf3 Nc6 1-0"#).unwrap();
//!
//! assert_eq!(game.tag("White"), Some("Anderssen"));
//! assert_eq!(game.moves.len(), 4);
//! assert_eq!(game.moves[2].notation, "Nf3");
//! ```

use crate::ast::*;
use crate::error::ChessMusicError;
use crate::lexer::{Lexer, LocatedToken, Token};

/// Parser for tokenized PGN
pub struct Parser {
    tokens: Vec<LocatedToken>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<LocatedToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> Option<&LocatedToken> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<LocatedToken> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    /// Position used for errors at end of input
    fn end_position(&self) -> (usize, usize) {
        self.tokens
            .last()
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1))
    }

    fn unexpected(&self, what: &str, found: Option<LocatedToken>) -> ChessMusicError {
        match found {
            Some(t) => ChessMusicError::parse(
                t.line,
                t.column,
                format!("Expected {}, found {:?}", what, t.token),
            ),
            None => {
                let (line, column) = self.end_position();
                ChessMusicError::parse(line, column, format!("Expected {}, found end of input", what))
            }
        }
    }

    fn parse_tags(&mut self) -> Result<Vec<Tag>, ChessMusicError> {
        let mut tags = Vec::new();
        while let Some(LocatedToken {
            token: Token::LeftBracket,
            ..
        }) = self.current()
        {
            self.advance();
            let name = match self.advance() {
                Some(LocatedToken {
                    token: Token::Symbol(name),
                    ..
                }) => name,
                other => return Err(self.unexpected("tag name", other)),
            };
            let value = match self.advance() {
                Some(LocatedToken {
                    token: Token::Str(value),
                    ..
                }) => value,
                other => return Err(self.unexpected("tag value", other)),
            };
            match self.advance() {
                Some(LocatedToken {
                    token: Token::RightBracket,
                    ..
                }) => {}
                other => return Err(self.unexpected("']'", other)),
            }
            tags.push(Tag { name, value });
        }
        Ok(tags)
    }

    /// Skip a variation; the opening '(' has already been consumed
    fn skip_variation(&mut self, line: usize, column: usize) -> Result<(), ChessMusicError> {
        let mut depth = 1usize;
        while let Some(t) = self.advance() {
            match t.token {
                Token::LeftParen => depth += 1,
                Token::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(ChessMusicError::parse(line, column, "Unterminated variation: missing ')'"))
    }

    /// Parse the first game in the token stream
    pub fn parse_game(&mut self) -> Result<Game, ChessMusicError> {
        let tags = self.parse_tags()?;

        let mut moves: Vec<Move> = Vec::new();
        let mut result = None;
        let mut number: u32 = 1;
        let mut side = Side::White;

        while let Some(located) = self.advance() {
            let LocatedToken { token, line, column } = located;
            match token {
                Token::Symbol(symbol) => {
                    if let Some(r) = GameResult::from_token(&symbol) {
                        result = Some(r);
                        break;
                    }

                    if symbol.chars().all(|c| c.is_ascii_digit()) {
                        // Move number indication, followed by one or three periods
                        number = symbol.parse().map_err(|_| {
                            ChessMusicError::parse(line, column, format!("Invalid move number '{}'", symbol))
                        })?;
                        let mut periods = 0;
                        while let Some(LocatedToken {
                            token: Token::Period,
                            ..
                        }) = self.current()
                        {
                            self.advance();
                            periods += 1;
                        }
                        side = if periods >= 3 { Side::Black } else { Side::White };
                        continue;
                    }

                    if !is_san(&symbol) {
                        return Err(ChessMusicError::parse(
                            line,
                            column,
                            format!("Invalid move '{}'", symbol),
                        ));
                    }

                    moves.push(Move::new(moves.len(), number, side, symbol));
                    if side == Side::Black {
                        number += 1;
                    }
                    side = side.opponent();
                }
                Token::Asterisk => {
                    result = Some(GameResult::Ongoing);
                    break;
                }
                Token::Suffix(suffix) => match moves.last_mut() {
                    Some(last) => last.annotation = Some(suffix),
                    None => {
                        return Err(ChessMusicError::parse(
                            line,
                            column,
                            format!("Annotation '{}' without a move", suffix),
                        ));
                    }
                },
                Token::Nag(nag) => {
                    if let Some(last) = moves.last_mut() {
                        last.nags.push(nag);
                    }
                }
                Token::Comment(text) => match moves.last_mut() {
                    Some(last) => {
                        last.comment = Some(match last.comment.take() {
                            Some(existing) => format!("{} {}", existing, text),
                            None => text,
                        });
                    }
                    // A comment before the first move describes the game
                    None => tracing::debug!(comment = %text, "skipping game comment"),
                },
                Token::LeftParen => self.skip_variation(line, column)?,
                Token::RightParen => {
                    return Err(ChessMusicError::parse(line, column, "Unmatched ')'"));
                }
                Token::LeftBracket => {
                    // Tag section of the next game; only the first game is read
                    break;
                }
                Token::Period => {
                    return Err(ChessMusicError::parse(line, column, "Unexpected '.'"));
                }
                Token::RightBracket | Token::Str(_) => {
                    return Err(ChessMusicError::parse(
                        line,
                        column,
                        "Tag pairs must come before the moves",
                    ));
                }
            }
        }

        Ok(Game { tags, moves, result })
    }
}

/// Check that a token has the shape of a SAN move.
///
/// Accepts castling (`O-O`, `O-O-O`, also with zeros), piece moves with
/// optional disambiguation and capture, pawn moves with optional promotion,
/// an optional check or mate marker and an optional en passant marker.
pub fn is_san(token: &str) -> bool {
    let core = token.strip_suffix(" e.p.").unwrap_or(token);
    let core = core
        .strip_suffix('+')
        .or_else(|| core.strip_suffix('#'))
        .unwrap_or(core);

    if matches!(core, "O-O" | "O-O-O" | "0-0" | "0-0-0") {
        return true;
    }

    let bytes = core.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    let (piece, rest) = match bytes[0] {
        b'K' | b'Q' | b'R' | b'B' | b'N' => (true, &bytes[1..]),
        _ => (false, bytes),
    };

    // Promotion suffix, pawns only
    let rest = match rest {
        [head @ .., b'=', b'Q' | b'R' | b'B' | b'N'] if !piece => head,
        _ => rest,
    };

    let (prefix, dest) = match rest.len() {
        n if n >= 2 => rest.split_at(n - 2),
        _ => return false,
    };
    if !is_file(dest[0]) || !is_rank(dest[1]) {
        return false;
    }

    // prefix: [file][rank][x]
    let mut i = 0;
    if i < prefix.len() && is_file(prefix[i]) {
        i += 1;
    }
    if i < prefix.len() && is_rank(prefix[i]) {
        i += 1;
    }
    if i < prefix.len() && prefix[i] == b'x' {
        i += 1;
    }
    i == prefix.len()
}

fn is_file(b: u8) -> bool {
    (b'a'..=b'h').contains(&b)
}

fn is_rank(b: u8) -> bool {
    (b'1'..=b'8').contains(&b)
}

/// Parse PGN text into the first game it contains
pub fn parse(source: &str) -> Result<Game, ChessMusicError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse_game()
}
