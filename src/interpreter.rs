use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::callable::{LoxFunction, NativeFunction, NATIVES};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{assign_at, get_at, EnvRef, Environment};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// An error raised while executing; aborts the current submission.
#[derive(Error, Debug, Clone)]
#[error("{message}\n[line {line}]", line = .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, message: S) -> Self {
        let message: String = message.into();

        debug!("Runtime error at line {}: {}", token.line, message);

        Self {
            token: token.clone(),
            message,
        }
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished.  `Break` and `Return` unwind to the nearest
/// loop or call.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

enum Input {
    Stdin,
    Reader(Box<dyn BufRead>),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    input: Input,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter wired to the process's stdin and stdout.
    pub fn new() -> Self {
        Self::build(Input::Stdin, Box::new(io::stdout()))
    }

    /// An interpreter reading `input` lines from `input` and printing to
    /// `output`.
    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self::build(Input::Reader(input), output)
    }

    fn build(input: Input, output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        for (name, arity, func) in NATIVES {
            debug!("Defining native function '{}'", name);

            globals.borrow_mut().insert(
                name,
                Value::Native(Rc::new(NativeFunction { name, arity, func })),
            );
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            input,
            output,
        }
    }

    /// Record resolver output.  Expressions without an entry are globals.
    pub fn resolve<I>(&mut self, locals: I)
    where
        I: IntoIterator<Item = (ExprId, usize)>,
    {
        self.locals.extend(locals);
    }

    pub(crate) fn read_input_line(&mut self) -> io::Result<Option<String>> {
        let mut line: String = String::new();

        let read: usize = match &mut self.input {
            Input::Stdin => io::stdin().read_line(&mut line)?,
            Input::Reader(reader) => reader.read_line(&mut line)?,
        };

        if read == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Execute a resolved program.  Returns the value of a trailing
    /// interactive expression, if the program ends with one.
    ///
    /// On error the interpreter drops back to the global frame, so the next
    /// submission starts clean with every global defined so far intact.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<Option<Value>> {
        debug!("Interpreting {} statements", statements.len());

        let result: IResult<Option<Value>> = self.run_program(statements);

        if result.is_err() {
            self.environment = Rc::clone(&self.globals);
        }

        if let Err(e) = self.output.flush() {
            debug!("Failed to flush output: {}", e);
        }

        info!("Interpretation finished, ok = {}", result.is_ok());

        result
    }

    fn run_program(&mut self, statements: &[Stmt]) -> IResult<Option<Value>> {
        let mut last: Option<Value> = None;

        for stmt in statements {
            if let Stmt::Value(expr) = stmt {
                last = Some(self.evaluate(expr)?);
                continue;
            }

            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => debug!("Ignoring {:?} at top level", flow),
            }
        }

        Ok(last)
    }

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) | Stmt::Value(expr) => {
                debug!("Evaluating expression statement");
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                debug!("Defining variable '{}'", name.lexeme);

                let value: Option<Value> = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };

                self.environment.borrow_mut().define(name, value)?;
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                let env: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    debug!("Condition is truthy; executing then branch");
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    debug!("Condition is falsy; executing else branch");
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }

                info!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Break { keyword } => {
                debug!("Break at line {}", keyword.line);
                Ok(Flow::Break)
            }

            Stmt::Function(decl) => {
                let function: LoxFunction =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                let name: Token = match &decl.name {
                    Some(name) => name.clone(),
                    None => decl.keyword.clone(),
                };

                info!(
                    "Function '{}' defined with {} parameters",
                    name.lexeme,
                    decl.params.len()
                );

                self.environment
                    .borrow_mut()
                    .define(&name, Some(Value::Function(Rc::new(function))))?;
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `statements` with `env` as the current frame, restoring the
    /// previous frame afterwards however the block ends.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> IResult<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, env);

        let result: IResult<Flow> = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<Flow> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(RuntimeError::new(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(name, None)?;

        let method_env: EnvRef = match &superclass {
            Some(parent) => {
                let env: EnvRef = Environment::child_of(&self.environment);
                env.borrow_mut().define(
                    &Token::synthetic("super", name.line),
                    Some(Value::Class(Rc::clone(parent))),
                )?;
                env
            }
            None => Rc::clone(&self.environment),
        };

        let table: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|decl| {
                let method_name: String = decl.display_name().to_string();
                let is_initializer: bool = method_name == "init";
                let method = LoxFunction::new(Rc::clone(decl), Rc::clone(&method_env), is_initializer);
                (method_name, Rc::new(method))
            })
            .collect();

        let class: LoxClass = LoxClass::new(name.lexeme.clone(), superclass, table);

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined", name.lexeme);
        Ok(Flow::Normal)
    }

    // ───────────────────────────── expressions ─────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(evaluate_literal(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    return Ok(left_val);
                }
                self.evaluate(right)
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => assign_at(&self.environment, distance, name, value.clone())?,
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::Lambda(decl) => Ok(Value::Function(Rc::new(LoxFunction::new(
                Rc::clone(decl),
                Rc::clone(&self.environment),
                false,
            )))),

            Expr::This { id, keyword } => self.look_up(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(RuntimeError::new(
                operator,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!(
            "Binary {}: left = {}, right = {}",
            operator.lexeme, left_val, right_val
        );

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => {
                let (a, b): (f64, f64) = number_operands(operator, &left_val, &right_val)?;

                let value: Value = match operator.token_type {
                    TokenType::MINUS => Value::Number(a - b),
                    TokenType::STAR => Value::Number(a * b),
                    // IEEE semantics: x / 0 is ±inf or NaN, never an error.
                    TokenType::SLASH => Value::Number(a / b),
                    TokenType::PERCENT => Value::Number(a % b),
                    TokenType::GREATER => Value::Bool(a > b),
                    TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                    TokenType::LESS => Value::Bool(a < b),
                    TokenType::LESS_EQUAL => Value::Bool(a <= b),
                    _ => {
                        return Err(RuntimeError::new(
                            operator,
                            format!("Invalid binary operator '{}'.", operator.lexeme),
                        ))
                    }
                };

                Ok(value)
            }
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> IResult<Value> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let Some(callable) = callee_val.as_callable() else {
            return Err(RuntimeError::new(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if callable.arity() != args.len() {
            debug!(
                "Calling {} with {} argument(s), declared {}",
                callee_val,
                args.len(),
                callable.arity()
            );
        }

        callable.call(self, paren, args)
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let Some(&distance) = self.locals.get(&id) else {
            return Err(RuntimeError::new(
                keyword,
                "Can't use 'super' outside of a class.",
            ));
        };

        let Value::Class(superclass) = get_at(&self.environment, distance, keyword)? else {
            return Err(RuntimeError::new(keyword, "Superclass must be a class."));
        };

        let this: Token = Token::synthetic("this", keyword.line);
        let Value::Instance(instance) = get_at(&self.environment, distance.saturating_sub(1), &this)?
        else {
            return Err(RuntimeError::new(keyword, "'this' is not an instance."));
        };

        let Some(found) = superclass.find_method(&method.lexeme) else {
            return Err(RuntimeError::new(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            ));
        };

        Ok(Value::Function(Rc::new(found.bind(instance)?)))
    }

    fn look_up(&self, id: ExprId, name: &Token) -> IResult<Value> {
        let value: Value = match self.locals.get(&id) {
            Some(&distance) => get_at(&self.environment, distance, name)?,
            None => self.globals.borrow().get(name)?,
        };

        debug!("Variable '{}' evaluated to: {}", name.lexeme, value);
        Ok(value)
    }
}

fn evaluate_literal(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}
