//! Pipeline driver: lex → parse → resolve → interpret.
//!
//! A [`Session`] owns one interpreter (and therefore one global frame) for
//! its whole life.  Each call to [`Session::run`] is one submission: a file
//! in batch mode, one line in interactive mode.  Lex, parse and resolve
//! errors keep the submission from executing; a runtime error aborts it.
//! The two outcomes are tracked as separate flags.

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::report::{Reporter, Tally};
use crate::resolver::{Resolution, Resolver};
use crate::scanner::scan_tokens;
use crate::stmt::Stmt;
use crate::token::Token;
use crate::value::Value;

/// How submissions are parsed.  Interactive mode lets the last expression
/// omit its `;` and hands its value back.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Batch,
    Interactive,
}

pub struct Session {
    interpreter: Interpreter,
    mode: Mode,
    next_id: usize,
    had_error: bool,
    had_runtime_error: bool,
}

impl Session {
    /// A session over an interpreter wired to stdin/stdout.
    pub fn new(mode: Mode) -> Self {
        Self::with_interpreter(mode, Interpreter::new())
    }

    pub fn with_interpreter(mode: Mode, interpreter: Interpreter) -> Self {
        info!("Session started in {:?} mode", mode);

        Self {
            interpreter,
            mode,
            next_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Scan `source` only.  Lex errors go to `reporter` and set the error
    /// flag; the tokens that did scan are returned either way.
    pub fn tokenize(&mut self, source: &str, reporter: &mut dyn Reporter) -> Vec<Token> {
        let mut tally: Tally<'_> = Tally::new(reporter);
        let tokens: Vec<Token> = scan_tokens(source, &mut tally);

        self.had_error |= tally.errors > 0;
        tokens
    }

    /// Scan and parse `source` without resolving or running it.
    pub fn parse(&mut self, source: &str, reporter: &mut dyn Reporter) -> Vec<Stmt> {
        let mut tally: Tally<'_> = Tally::new(reporter);

        let tokens: Vec<Token> = scan_tokens(source, &mut tally);
        let statements: Vec<Stmt> = self.parse_tokens(tokens, &mut tally);

        self.had_error |= tally.errors > 0;
        statements
    }

    /// Run one submission.  `Ok(Some(value))` carries the value of a trailing
    /// interactive expression.
    pub fn run(&mut self, source: &str, reporter: &mut dyn Reporter) -> Result<Option<Value>> {
        let mut tally: Tally<'_> = Tally::new(reporter);

        let tokens: Vec<Token> = scan_tokens(source, &mut tally);
        let statements: Vec<Stmt> = self.parse_tokens(tokens, &mut tally);

        // resolving a partial tree only adds noise on top of syntax errors
        if tally.errors == 0 {
            let resolution: Resolution = Resolver::new(&mut tally).resolve(&statements);
            self.interpreter.resolve(resolution);
        }

        if tally.errors > 0 {
            debug!("{} static error(s); not executing", tally.errors);

            self.had_error = true;
            return Err(LoxError::Static {
                errors: tally.errors,
            });
        }

        match self.interpreter.interpret(&statements) {
            Ok(value) => Ok(value),

            Err(error) => {
                tally.token_error(&error.token, &error.message);

                self.had_runtime_error = true;
                Err(LoxError::Runtime(error))
            }
        }
    }

    fn parse_tokens(&mut self, tokens: Vec<Token>, reporter: &mut dyn Reporter) -> Vec<Stmt> {
        let mut parser: Parser<'_> = Parser::new(tokens, reporter)
            .interactive(self.mode == Mode::Interactive)
            .first_id(self.next_id);

        let statements: Vec<Stmt> = parser.parse();
        self.next_id = parser.next_id();

        statements
    }

    /// Lex, parse or resolve errors were reported since the last reset.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// A runtime error aborted a submission since the last reset.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear both error flags.  Globals survive.
    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
