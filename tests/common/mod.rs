#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use tree_lox as lox;

use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::report::Diagnostics;
use lox::session::{Mode, Session};
use lox::value::Value;

/// An in-memory writer the test keeps a handle to after giving a clone to
/// the interpreter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session with captured output and collected diagnostics.
pub struct Harness {
    pub session: Session,
    pub output: SharedBuffer,
    pub diagnostics: Diagnostics,
}

impl Harness {
    pub fn new(mode: Mode) -> Self {
        Self::with_input(mode, "")
    }

    pub fn with_input(mode: Mode, input: &str) -> Self {
        let output = SharedBuffer::default();
        let interpreter = Interpreter::with_io(
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(output.clone()),
        );

        Self {
            session: Session::with_interpreter(mode, interpreter),
            output,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn run(&mut self, source: &str) -> Result<Option<Value>, LoxError> {
        self.session.run(source, &mut self.diagnostics)
    }

    pub fn output(&self) -> String {
        self.output.contents()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.messages().map(str::to_string).collect()
    }
}

/// Run `source` as a batch program; returns what it printed, how it ended
/// and every reported message.
pub fn run(source: &str) -> (String, Result<Option<Value>, LoxError>, Vec<String>) {
    let mut harness = Harness::new(Mode::Batch);
    let result = harness.run(source);
    (harness.output(), result, harness.messages())
}

/// Run `source` and return its output, failing the test on any error.
pub fn run_ok(source: &str) -> String {
    let (output, result, messages) = run(source);
    assert!(
        result.is_ok(),
        "program failed: {:?}, messages: {:?}",
        result.err(),
        messages
    );
    output
}
