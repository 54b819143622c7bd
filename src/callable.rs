//! Callable values: native bindings and user functions/closures.
//! Classes implement [`Callable`] too, see [`crate::class`].

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::interpreter::{Flow, IResult, Interpreter, RuntimeError};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

pub trait Callable {
    /// Declared parameter count.  Not enforced at call sites.
    fn arity(&self) -> usize;

    /// Invoke with already evaluated arguments.  `paren` is the closing
    /// parenthesis of the call, used to attribute errors.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value>;
}

// ───────────────────────────── natives ─────────────────────────────

pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &arguments).map_err(|message| RuntimeError::new(paren, message))
    }
}

/// The bindings every interpreter starts with.
pub const NATIVES: [(&str, usize, NativeFn); 3] = [
    ("clock", 0, native_clock),
    ("input", 0, native_input),
    ("print", 1, native_print),
];

/// Seconds since the Unix epoch, with millisecond fraction.
fn native_clock(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    let millis: i64 = Utc::now().timestamp_millis();

    Ok(Value::Number(millis as f64 / 1000.0))
}

/// One line of external input without its terminator; `""` at end of input.
fn native_input(interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    let line: Option<String> = interpreter
        .read_input_line()
        .map_err(|e| format!("Failed to read input: {}", e))?;

    Ok(Value::String(line.unwrap_or_default()))
}

/// Writes the display form of its argument; nil prints as `Nil`.
fn native_print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let text: String = args.first().unwrap_or(&Value::Nil).printed();

    writeln!(interpreter.output(), "{}", text).map_err(|e| format!("Failed to print: {}", e))?;

    Ok(Value::Nil)
}

// ───────────────────────────── user functions ─────────────────────────────

/// A function or lambda paired with the frame that was active where it was
/// defined.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        self.declaration.display_name()
    }

    /// A copy of this method whose closure has one more frame binding
    /// `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> IResult<LoxFunction> {
        let environment: EnvRef = Environment::child_of(&self.closure);

        environment
            .borrow_mut()
            .define(&self.this_token(), Some(Value::Instance(instance)))?;

        Ok(LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        })
    }

    fn this_token(&self) -> Token {
        Token::synthetic("this", self.declaration.keyword.line)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value> {
        debug!(
            "Calling '{}' with {} argument(s) at line {}",
            self.name(),
            arguments.len(),
            paren.line
        );

        let environment: EnvRef = Environment::child_of(&self.closure);

        // Zip: surplus arguments are dropped, missing parameters stay unbound.
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(param, Some(argument))?;
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return self.closure.borrow().get(&self.this_token());
        }

        let value: Value = match flow {
            Flow::Return(value) => value,
            Flow::Normal | Flow::Break => Value::Nil,
        };

        info!("Function '{}' returned: {}", self.name(), value);

        Ok(value)
    }
}
