//! Error callbacks supplied by whoever drives the pipeline.
//!
//! The core never prints.  Lex errors are attributed to a line; parse,
//! resolve and runtime errors to the offending token.  [`Diagnostics`] is a
//! collecting implementation for embedders and tests.

use std::fmt;

use log::debug;

use crate::error::location;
use crate::token::Token;

/// The two error‑reporting callbacks.
pub trait Reporter {
    /// A lexical problem on `line`.
    fn lex_error(&mut self, line: usize, message: &str);

    /// A parse, resolve or runtime problem attributed to `token`.
    fn token_error(&mut self, token: &Token, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn lex_error(&mut self, line: usize, message: &str) {
        (**self).lex_error(line, message);
    }

    fn token_error(&mut self, token: &Token, message: &str) {
        (**self).token_error(token, message);
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,

    /// Empty for lex errors, otherwise ` at end` / ` at 'lexeme'`.
    pub location: String,

    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] Error{}: {}",
            self.line, self.location, self.message
        )
    }
}

/// Collects every reported problem in order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Reporter for Diagnostics {
    fn lex_error(&mut self, line: usize, message: &str) {
        debug!("Collected lex error on line {}: {}", line, message);

        self.entries.push(Diagnostic {
            line,
            location: String::new(),
            message: message.to_string(),
        });
    }

    fn token_error(&mut self, token: &Token, message: &str) {
        debug!("Collected error at {:?}: {}", token.lexeme, message);

        self.entries.push(Diagnostic {
            line: token.line,
            location: location(token),
            message: message.to_string(),
        });
    }
}

/// Wraps another reporter and counts what passes through it.
pub(crate) struct Tally<'r> {
    inner: &'r mut dyn Reporter,
    pub(crate) errors: usize,
}

impl<'r> Tally<'r> {
    pub(crate) fn new(inner: &'r mut dyn Reporter) -> Self {
        Self { inner, errors: 0 }
    }
}

impl Reporter for Tally<'_> {
    fn lex_error(&mut self, line: usize, message: &str) {
        self.errors += 1;
        self.inner.lex_error(line, message);
    }

    fn token_error(&mut self, token: &Token, message: &str) {
        self.errors += 1;
        self.inner.token_error(token, message);
    }
}
