/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tokenizer for configuration text.
//!
//! Tokens are produced on demand. Whitespace and comments (`#`, `//` and
//! `/* */`) are skipped. Every token carries the range of text it came from,
//! so the parser can attach locations to settings and errors.

use crate::error::{Error, Result};
use crate::value::Format;
use hconf_source_map::{FileId, Location, Range, SourceInfo};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Name(String),
    Int(i32, Format),
    Int64(i64, Format),
    Float(f64),
    Str(String),
    Bool(bool),
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Equals,
    Colon,
    At,
    Eof,
}

impl TokenKind {
    /// Short description used in parse error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Name(name) => format!("name `{}`", name),
            TokenKind::Int(..) | TokenKind::Int64(..) => "integer".to_string(),
            TokenKind::Float(_) => "float".to_string(),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Bool(_) => "boolean".to_string(),
            TokenKind::LeftBrace => "'{'".to_string(),
            TokenKind::RightBrace => "'}'".to_string(),
            TokenKind::LeftParen => "'('".to_string(),
            TokenKind::RightParen => "')'".to_string(),
            TokenKind::LeftBracket => "'['".to_string(),
            TokenKind::RightBracket => "']'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Equals => "'='".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::At => "'@'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub range: Range,
}

pub(crate) struct Lexer<'s> {
    src: &'s str,
    file: String,
    file_id: FileId,
    location: Location,
    finished: bool,
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(src: &'s str, file: impl Into<String>, file_id: FileId) -> Self {
        Lexer {
            src,
            file: file.into(),
            file_id,
            location: Location::default(),
            finished: false,
        }
    }

    pub(crate) fn file(&self) -> &str {
        &self.file
    }

    pub(crate) fn file_id(&self) -> FileId {
        self.file_id
    }

    /// The text a token was read from.
    pub(crate) fn text(&self, range: &Range) -> &'s str {
        self.src
            .get(range.start.offset..range.end.offset)
            .unwrap_or_default()
    }

    fn rest(&self) -> &'s str {
        &self.src[self.location.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.location.offset += ch.len_utf8();
        if ch == '\n' {
            self.location.row += 1;
            self.location.column = 0;
        } else {
            self.location.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl Into<String>, start: Location) -> Error {
        Error::Lexical {
            file: self.file.clone(),
            line: start.row + 1,
            message: message.into(),
            location: Some(SourceInfo::new(
                self.file_id,
                Range {
                    start,
                    end: self.location,
                },
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            match (self.peek(), self.peek_ahead(1)) {
                (Some('#'), _) | (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.location;
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(self.error("unterminated comment", start)),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let start = self.location;

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some('"') => TokenKind::Str(self.read_strings()?),
            Some(ch) if self.starts_number(ch) => self.read_number()?,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '*' => {
                let name = self.read_name();
                if name.eq_ignore_ascii_case("true") {
                    TokenKind::Bool(true)
                } else if name.eq_ignore_ascii_case("false") {
                    TokenKind::Bool(false)
                } else {
                    TokenKind::Name(name)
                }
            }
            Some(ch) => {
                self.advance();
                match ch {
                    '{' => TokenKind::LeftBrace,
                    '}' => TokenKind::RightBrace,
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '[' => TokenKind::LeftBracket,
                    ']' => TokenKind::RightBracket,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    '=' => TokenKind::Equals,
                    ':' => TokenKind::Colon,
                    '@' => TokenKind::At,
                    other => {
                        return Err(self.error(format!("unexpected character '{}'", other), start));
                    }
                }
            }
        };

        Ok(Token {
            kind,
            range: Range {
                start,
                end: self.location,
            },
        })
    }

    fn starts_number(&self, ch: char) -> bool {
        let digit_at = |n| self.peek_ahead(n).is_some_and(|c: char| c.is_ascii_digit());
        match ch {
            '0'..='9' => true,
            '.' => digit_at(1),
            '+' | '-' => digit_at(1) || (self.peek_ahead(1) == Some('.') && digit_at(2)),
            _ => false,
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '*') {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    /// Read one string literal plus any literals that follow it separated
    /// only by whitespace.
    ///
    /// `\xNN` escapes are raw bytes, so the concatenated contents are decoded
    /// as UTF-8 only once every literal has been read.
    fn read_strings(&mut self) -> Result<String> {
        let start = self.location;
        let mut bytes = Vec::new();
        loop {
            self.read_string_into(&mut bytes)?;

            let checkpoint = self.location;
            self.skip_whitespace();
            if self.peek() != Some('"') {
                self.location = checkpoint;
                return String::from_utf8(bytes)
                    .map_err(|_| self.error("invalid UTF-8 sequence in string", start));
            }
        }
    }

    fn read_string_into(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let start = self.location;
        self.advance();

        loop {
            let ch = match self.advance() {
                None => return Err(self.error("unterminated string", start)),
                Some('"') => return Ok(()),
                Some('\\') => {
                    let escape_start = self.location;
                    match self.advance() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('f') => '\u{c}',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('x') => {
                            let mut byte = 0u8;
                            for _ in 0..2 {
                                let digit = self
                                    .peek()
                                    .and_then(|c| c.to_digit(16))
                                    .ok_or_else(|| {
                                        self.error("invalid \\x escape in string", escape_start)
                                    })?;
                                self.advance();
                                byte = byte * 16 + digit as u8;
                            }
                            out.push(byte);
                            continue;
                        }
                        Some(other) => {
                            return Err(self.error(
                                format!("invalid escape sequence '\\{}' in string", other),
                                escape_start,
                            ));
                        }
                        None => return Err(self.error("unterminated string", start)),
                    }
                }
                Some(ch) => ch,
            };
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    fn take_digits(&mut self, radix: u32) -> &'s str {
        let begin = self.location.offset;
        while self.peek().is_some_and(|c| c.is_digit(radix)) {
            self.advance();
        }
        &self.src[begin..self.location.offset]
    }

    fn read_number(&mut self) -> Result<TokenKind> {
        let start = self.location;
        let signed = matches!(self.peek(), Some('+' | '-'));
        if signed {
            self.advance();
        }

        let radix = match (self.peek(), self.peek_ahead(1)) {
            (Some('0'), Some('x' | 'X')) => Some((16, Format::Hex)),
            (Some('0'), Some('b' | 'B')) => Some((2, Format::Binary)),
            _ => None,
        };

        if let Some((radix, format)) = radix {
            if signed {
                return Err(self.error("sign not allowed on a hexadecimal or binary literal", start));
            }
            self.advance();
            self.advance();
            let digits = self.take_digits(radix);
            if digits.is_empty() {
                return Err(self.error("malformed numeric literal", start));
            }
            let value = u64::from_str_radix(digits, radix)
                .map_err(|_| self.error("integer literal out of range", start))?;
            let long = self.read_long_suffix();
            self.reject_trailing(start)?;
            return Ok(unsigned_token(value, format, long));
        }

        let int_digits = self.take_digits(10);
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            let frac = self.take_digits(10);
            if int_digits.is_empty() && frac.is_empty() {
                return Err(self.error("malformed numeric literal", start));
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            if self.take_digits(10).is_empty() {
                return Err(self.error("malformed numeric literal", start));
            }
        }

        if is_float {
            self.reject_trailing(start)?;
            let text = &self.src[start.offset..self.location.offset];
            let value: f64 = text
                .parse()
                .map_err(|_| self.error("malformed numeric literal", start))?;
            if !value.is_finite() {
                return Err(self.error("float literal out of range", start));
            }
            return Ok(TokenKind::Float(value));
        }

        if int_digits.len() > 1 && int_digits.starts_with('0') {
            if int_digits.bytes().any(|b| b == b'8' || b == b'9') {
                return Err(self.error("invalid digit in octal literal", start));
            }
            let magnitude = u64::from_str_radix(&int_digits[1..], 8)
                .map_err(|_| self.error("integer literal out of range", start))?;
            let long = self.read_long_suffix();
            self.reject_trailing(start)?;
            if !self.src[start.offset..].starts_with('-') {
                return Ok(unsigned_token(magnitude, Format::Octal, long));
            }
            let value = 0i64
                .checked_sub_unsigned(magnitude)
                .ok_or_else(|| self.error("integer literal out of range", start))?;
            return Ok(match i32::try_from(value) {
                Ok(v) if !long => TokenKind::Int(v, Format::Octal),
                _ => TokenKind::Int64(value, Format::Octal),
            });
        }

        let text = &self.src[start.offset..self.location.offset];
        let value: i64 = text
            .trim_start_matches('+')
            .parse()
            .map_err(|_| self.error("integer literal out of range", start))?;
        let long = self.read_long_suffix();
        self.reject_trailing(start)?;

        Ok(match i32::try_from(value) {
            Ok(v) if !long => TokenKind::Int(v, Format::Decimal),
            _ => TokenKind::Int64(value, Format::Decimal),
        })
    }

    /// Consume an `L` or `LL` suffix.
    fn read_long_suffix(&mut self) -> bool {
        if self.peek() != Some('L') {
            return false;
        }
        self.advance();
        if self.peek() == Some('L') {
            self.advance();
        }
        true
    }

    fn reject_trailing(&mut self, start: Location) -> Result<()> {
        if self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
        {
            self.advance();
            return Err(self.error("malformed numeric literal", start));
        }
        Ok(())
    }
}

/// Hex, octal and binary literals denote bit patterns: without a suffix,
/// anything that fits in 32 bits is an `int`.
fn unsigned_token(value: u64, format: Format, long: bool) -> TokenKind {
    match u32::try_from(value) {
        Ok(v) if !long => TokenKind::Int(v as i32, format),
        _ => TokenKind::Int64(value as i64, format),
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
