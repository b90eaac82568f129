use crate::error::ChessMusicError;

/// Token types for PGN text
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Tag pairs
    LeftBracket,    // [
    RightBracket,   // ]
    Str(String),    // "quoted value"

    // Movetext
    Symbol(String), // move numbers, SAN moves, results, tag names
    Period,         // .
    Asterisk,       // * (game in progress)
    Nag(u16),       // $14
    Suffix(String), // !, ?, !!, ??, !?, ?!

    // Variations
    LeftParen,      // (
    RightParen,     // )

    Comment(String), // {brace comment} or ; rest-of-line comment
}

/// A token with its position in the source
#[derive(Debug, Clone)]
pub struct LocatedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Characters that may continue a PGN symbol token
fn is_symbol_continuation(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '=' | ':' | '-' | '/')
}

/// Lexer for tokenizing PGN text
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn remaining(&self) -> &str {
        &self.input[self.position..]
    }

    fn skip_line(&mut self) -> String {
        let mut text = String::new();
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<String, ChessMusicError> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(value),
                Some('\\') => match self.advance() {
                    Some(c) => value.push(c),
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(ChessMusicError::parse(line, column, "Unterminated string in tag pair"))
    }

    fn read_brace_comment(&mut self, line: usize, column: usize) -> Result<String, ChessMusicError> {
        self.advance(); // {
        let mut text = String::new();
        while let Some(c) = self.advance() {
            if c == '}' {
                return Ok(text.trim().to_string());
            }
            text.push(c);
        }
        Err(ChessMusicError::parse(line, column, "Unterminated comment: missing '}'"))
    }

    fn read_symbol(&mut self) -> String {
        let mut symbol = String::new();
        while let Some(&c) = self.peek() {
            if !is_symbol_continuation(c)
                || (!symbol.is_empty() && self.remaining().starts_with("e.p."))
            {
                break;
            }
            symbol.push(c);
            self.advance();
        }

        // "exd6 e.p." is one move; the en passant marker contains periods
        // that would otherwise split it into separate tokens.
        let rest = self.remaining();
        let marker_len = if rest.starts_with("e.p.") {
            Some(4)
        } else if rest.starts_with(" e.p.") {
            Some(5)
        } else {
            None
        };
        if let Some(len) = marker_len {
            for _ in 0..len {
                self.advance();
            }
            symbol.push_str(" e.p.");
        }

        symbol
    }

    pub fn tokenize(&mut self) -> Result<Vec<LocatedToken>, ChessMusicError> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.peek() {
            let line = self.line;
            let column = self.column;

            // Escape mechanism: a '%' in the first column hides the whole line
            if c == '%' && column == 1 {
                self.skip_line();
                continue;
            }

            let token = match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                    continue;
                }
                '[' => {
                    self.advance();
                    Token::LeftBracket
                }
                ']' => {
                    self.advance();
                    Token::RightBracket
                }
                '"' => Token::Str(self.read_string(line, column)?),
                '{' => Token::Comment(self.read_brace_comment(line, column)?),
                ';' => {
                    self.advance();
                    Token::Comment(self.skip_line().trim().to_string())
                }
                '(' => {
                    self.advance();
                    Token::LeftParen
                }
                ')' => {
                    self.advance();
                    Token::RightParen
                }
                '.' => {
                    self.advance();
                    Token::Period
                }
                '*' => {
                    self.advance();
                    Token::Asterisk
                }
                '$' => {
                    self.advance();
                    let mut digits = String::new();
                    while let Some(&d) = self.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        digits.push(d);
                        self.advance();
                    }
                    let value = digits.parse::<u16>().map_err(|_| {
                        ChessMusicError::parse(line, column, "Expected a number after '$'")
                    })?;
                    Token::Nag(value)
                }
                '!' | '?' => {
                    let mut suffix = String::new();
                    while let Some(&s) = self.peek() {
                        if s != '!' && s != '?' {
                            break;
                        }
                        suffix.push(s);
                        self.advance();
                    }
                    Token::Suffix(suffix)
                }
                c if c.is_ascii_alphanumeric() => Token::Symbol(self.read_symbol()),
                other => {
                    return Err(ChessMusicError::parse(
                        line,
                        column,
                        format!("Unexpected character '{}'", other),
                    ));
                }
            };

            tokens.push(LocatedToken { token, line, column });
        }

        Ok(tokens)
    }
}
