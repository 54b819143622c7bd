//! Centralised error hierarchy for the interpreter.
//!
//! The scanner yields [`LexError`] and the parser `Parse` values for their
//! own failure paths.  A whole submission that was rejected before execution
//! surfaces as `Static`, and an aborted execution as `Runtime`.  Callers can therefore
//! tell a malformed program apart from one that ran and failed.
//!
//! The module **does not** print diagnostics itself; see [`crate::report`].

use thiserror::Error;

use log::debug;

use crate::interpreter::RuntimeError;
use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Syntactic (parser) error.  `location` is either ` at end` or
    /// ` at '<lexeme>'`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Lex, parse or resolve errors were reported and the submission was not
    /// executed.
    #[error("{errors} error(s) reported, program not executed")]
    Static { errors: usize },

    /// Uncaught runtime error; execution of the submission stopped.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// The only failure the scanner produces.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("[line {line}] Error: {message}")]
pub struct LexError {
    /// Human‑readable description.
    pub message: String,

    /// 1‑based line where the error occurred.
    pub line: usize,
}

impl LexError {
    pub fn new<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LexError { message, line }
    }
}

impl LoxError {
    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }
}

/// Render where a token‑attributed error happened: ` at end` for the EOF
/// token, ` at 'lexeme'` otherwise.
pub fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
