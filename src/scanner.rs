//! Module `scanner` implements a one‑pass, streaming lexer.
//!
//! It transforms a source `&str` into a sequence of [`Token`]s, skipping
//! whitespace and comments, and emitting exactly one `EOF` token at the end.
//! Designed as a `FusedIterator`, it can be chained safely with other
//! iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LexError>` on each `.next()`.  Errors are
//!   interleaved with tokens and never stop the scan: the offending input is
//!   skipped and no token is produced for it.
//!
//! - `scan_tokens(src, reporter) -> Vec<Token>`
//!   Drains a scanner, forwarding every error to the lex‑error callback.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`,
//!   `*`, `%`, `?`, `:`.
//! - Two‑character operators by maximal munch: `!=`, `==`, `<=`, `>=`.
//! - Comments: `//` to end of line and non‑nesting `/* … */`.
//! - String literals: `"` … `"`, multi‑line, with `\` escapes.
//! - Numeric literals: digits with an optional `.` followed by at least one
//!   digit.
//! - Identifiers/keywords: resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Comment skipping uses `memchr` for the newline / terminator search.

use crate::error::LexError;
use crate::report::Reporter;
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

type Result<T> = std::result::Result<T, LexError>;

// ─────────────────────────────────────────────────────────────────────────────
// Reserved words, looked up by exact byte slice.
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"break"  => TokenType::BREAK,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"func"   => TokenType::FUNC,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    source: &'a str,
    src: &'a [u8],              // `source` as bytes; every boundary we slice at is ASCII
    start: usize,               // first byte of the lexeme being scanned
    curr: usize,                // next byte to read
    line: usize,
    pending: Option<TokenType>, // kind recognised by the last scan_token call
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Consume the next byte only when it is `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `single` unless the next byte is `=`, in which case `double`.
    #[inline(always)]
    fn either(&mut self, double: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(b'=') {
            double
        } else {
            single
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`.  If it produces a
    /// token the kind is stored in `self.pending`; whitespace and comments
    /// leave `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt: TokenType = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'%' => TokenType::PERCENT,
            b'?' => TokenType::QUESTION,
            b':' => TokenType::COLON,

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => self.either(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(TokenType::GREATER_EQUAL, TokenType::GREATER),

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments or slash ────────────────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to the next newline; the newline itself is
                    // left for the main loop so the line counter advances.
                    match memchr(b'\n', &self.src[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.len(),
                    }

                    return Ok(());
                }

                if self.match_byte(b'*') {
                    return self.skip_block_comment();
                }

                TokenType::SLASH
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => return self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Report the whole character, not each byte of its encoding.
                let c: char = self.source[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + c.len_utf8();

                return Err(LexError::new(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Skip a `/* … */` comment.  `self.curr` points just past the opener.
    fn skip_block_comment(&mut self) -> Result<()> {
        let rest: &[u8] = &self.src[self.curr..];

        match memmem::find(rest, b"*/") {
            Some(pos) => {
                self.line += memchr_iter(b'\n', &rest[..pos]).count();
                self.curr += pos + 2;

                Ok(())
            }

            None => {
                self.line += memchr_iter(b'\n', rest).count();
                self.curr = self.len();

                Err(LexError::new(self.line, "Unterminated block comment."))
            }
        }
    }

    /// String literal body; escapes are decoded into the payload.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * On success `self.curr` points **past** the closing `"`.
    /// * If the input ends first, the error is returned with `self.curr` at
    ///   end of input so the scan stops.
    fn parse_string(&mut self) -> Result<()> {
        let mut value: Vec<u8> = Vec::new();

        while !self.is_at_end() && self.peek() != b'"' {
            match self.advance() {
                b'\n' => {
                    self.line += 1;
                    value.push(b'\n');
                }

                b'\\' if !self.is_at_end() => {
                    let escaped: u8 = self.advance();

                    match escaped {
                        b'"' => value.push(b'"'),
                        b'\\' => value.push(b'\\'),
                        b'n' => value.push(b'\n'),
                        b't' => value.push(b'\t'),
                        b'r' => value.push(b'\r'),
                        other => {
                            if other == b'\n' {
                                self.line += 1;
                            }

                            value.push(b'\\');
                            value.push(other);
                        }
                    }
                }

                other => value.push(other),
            }
        }

        if self.is_at_end() {
            return Err(LexError::new(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        // Only ASCII bytes were rewritten, so the buffer stays valid UTF‑8.
        let s: String = String::from_utf8_lossy(&value).into_owned();

        self.pending = Some(TokenType::STRING(s));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  A trailing `.` with no digit
    /// after it is left for the next token.
    fn parse_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: &str = &self.source[self.start..self.curr];

        match text.parse::<f64>() {
            Ok(n) => {
                self.pending = Some(TokenType::NUMBER(n));

                Ok(())
            }

            Err(_) => Err(LexError::new(
                self.line,
                format!("Invalid numeric literal: {}", text),
            )),
        }
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // whitespace and comments produce nothing, so keep scanning
        while self.curr <= self.len() {
            // one EOF, then the iterator is exhausted
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // fresh lexeme
            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lexeme: &str = &self.source[self.start..self.curr];

                return Some(Ok(Token::new(tt, lexeme, self.line)));
            }
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `source`, forwarding lex errors to `reporter`.  The returned
/// tokens always end with `EOF`.
pub fn scan_tokens(source: &str, reporter: &mut dyn Reporter) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),

            Err(LexError { message, line }) => reporter.lex_error(line, &message),
        }
    }

    debug!("Scanned {} token(s)", tokens.len());

    tokens
}
