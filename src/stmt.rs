use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A function, method or lambda.  Closures share the declaration through an
/// `Rc`, so the body outlives the parse that produced it.
#[derive(Debug)]
pub struct FunctionDecl {
    /// `None` for lambdas.
    pub name: Option<Token>,

    /// The `func` keyword (or the method name for methods), used for lines.
    pub keyword: Token,

    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map_or("lambda", |t| t.lexeme.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),

    // Trailing expression without `;`, only produced in interactive mode;
    // its value is handed back to the caller.
    Value(Expr),

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Break {
        keyword: Token,
    },

    Function(Rc<FunctionDecl>),

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },

    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}
