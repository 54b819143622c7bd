use crate::interpreter::{IResult, RuntimeError};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.  Closures and the active call stack keep frames
/// alive by holding one of these.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical frame: name → value, where `None` marks a variable that was
/// declared but never assigned.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh child frame of `parent`, already wrapped for sharing.
    pub fn child_of(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Declare `name` in this frame.  A name can be declared once per frame.
    pub fn define(&mut self, name: &Token, value: Option<Value>) -> IResult<()> {
        if self.values.contains_key(&name.lexeme) {
            return Err(RuntimeError::new(
                name,
                format!("Variable '{}' is already defined in this scope.", name.lexeme),
            ));
        }

        debug!("Defining '{}'", name.lexeme);
        self.values.insert(name.lexeme.clone(), value);

        Ok(())
    }

    /// Bind `name` unconditionally, replacing any previous binding.  Used
    /// for the interpreter's own globals.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), Some(value));
    }

    /// Read `name` from this frame only.
    pub fn get(&self, name: &Token) -> IResult<Value> {
        match self.values.get(&name.lexeme) {
            Some(Some(value)) => Ok(value.clone()),

            Some(None) => Err(RuntimeError::new(
                name,
                format!("Variable '{}' is not initialized.", name.lexeme),
            )),

            None => Err(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    /// Overwrite an existing binding in this frame only.
    pub fn assign(&mut self, name: &Token, value: Value) -> IResult<()> {
        match self.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }

            None => Err(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }
}

/// Walk exactly `distance` parent links from `env`.
pub fn ancestor(env: &EnvRef, distance: usize, name: &Token) -> IResult<EnvRef> {
    let mut frame: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let parent: Option<EnvRef> = frame.borrow().enclosing();

        frame = parent.ok_or_else(|| {
            RuntimeError::new(
                name,
                format!("No enclosing scope holds '{}'.", name.lexeme),
            )
        })?;
    }

    Ok(frame)
}

pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> IResult<Value> {
    ancestor(env, distance, name)?.borrow().get(name)
}

pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> IResult<()> {
    ancestor(env, distance, name)?.borrow_mut().assign(name, value)
}
