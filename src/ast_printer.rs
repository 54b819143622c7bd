//! Renders syntax trees as an indented outline for `parse` traces.
//!
//! ```text
//! ExpressionStatement
//! └─ Binary +
//!    ├─ Literal 1
//!    └─ Binary *
//!       ├─ Literal 2
//!       └─ Literal 3
//! ```
//!
//! Children appear in source order, so the literals of a tree read left to
//! right exactly as they were written.

use crate::expr::{Expr, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{format_number, Token};

/// A child slot of a rendered node.
enum Node<'t> {
    Stmt(&'t Stmt),
    Expr(&'t Expr),
    Method(&'t FunctionDecl),
}

#[derive(Default)]
pub struct AstPrinter {
    out: String,
}

impl AstPrinter {
    /// Render a whole program, one root per top‑level declaration.
    pub fn print(statements: &[Stmt]) -> String {
        let mut printer = AstPrinter::default();

        for stmt in statements {
            printer.visit(Node::Stmt(stmt), "", true, true);
        }

        printer.out
    }

    fn visit(&mut self, node: Node<'_>, prefix: &str, last: bool, root: bool) {
        let (label, children): (String, Vec<Node<'_>>) = match node {
            Node::Stmt(stmt) => describe_stmt(stmt),
            Node::Expr(expr) => describe_expr(expr),
            Node::Method(decl) => (
                format!("Method {}", signature(decl)),
                decl.body.iter().map(Node::Stmt).collect(),
            ),
        };

        let child_prefix: String = if root {
            self.out.push_str(&label);
            String::new()
        } else {
            self.out.push_str(prefix);
            self.out.push_str(if last { "└─ " } else { "├─ " });
            self.out.push_str(&label);
            format!("{}{}", prefix, if last { "   " } else { "│  " })
        };
        self.out.push('\n');

        let count: usize = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.visit(child, &child_prefix, i + 1 == count, false);
        }
    }
}

fn describe_stmt(stmt: &Stmt) -> (String, Vec<Node<'_>>) {
    match stmt {
        Stmt::Expression(expr) => ("ExpressionStatement".into(), vec![Node::Expr(expr)]),

        Stmt::Value(expr) => ("Value".into(), vec![Node::Expr(expr)]),

        Stmt::Var { name, initializer } => (
            format!("Var {}", name.lexeme),
            initializer.iter().map(Node::Expr).collect(),
        ),

        Stmt::Block(statements) => ("Block".into(), statements.iter().map(Node::Stmt).collect()),

        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut children = vec![Node::Expr(condition), Node::Stmt(then_branch)];
            if let Some(else_branch) = else_branch {
                children.push(Node::Stmt(else_branch));
            }
            ("If".into(), children)
        }

        Stmt::While { condition, body } => {
            ("While".into(), vec![Node::Expr(condition), Node::Stmt(body)])
        }

        Stmt::Break { .. } => ("Break".into(), Vec::new()),

        Stmt::Function(decl) => (
            format!("Function {}", signature(decl)),
            decl.body.iter().map(Node::Stmt).collect(),
        ),

        Stmt::Class {
            name,
            superclass,
            methods,
        } => {
            let label = match superclass {
                Some(Expr::Variable { name: parent, .. }) => {
                    format!("Class {} < {}", name.lexeme, parent.lexeme)
                }
                _ => format!("Class {}", name.lexeme),
            };

            (label, methods.iter().map(|m| Node::Method(m)).collect())
        }

        Stmt::Return { value, .. } => ("Return".into(), value.iter().map(Node::Expr).collect()),
    }
}

fn describe_expr(expr: &Expr) -> (String, Vec<Node<'_>>) {
    match expr {
        Expr::Literal(lit) => (format!("Literal {}", literal(lit)), Vec::new()),

        Expr::Grouping(inner) => ("Grouping".into(), vec![Node::Expr(inner)]),

        Expr::Unary { operator, right } => (
            format!("Unary {}", operator.lexeme),
            vec![Node::Expr(right)],
        ),

        Expr::Binary {
            left,
            operator,
            right,
        } => (
            format!("Binary {}", operator.lexeme),
            vec![Node::Expr(left), Node::Expr(right)],
        ),

        Expr::Logical {
            left,
            operator,
            right,
        } => (
            format!("Logical {}", operator.lexeme),
            vec![Node::Expr(left), Node::Expr(right)],
        ),

        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
            ..
        } => (
            "Ternary".into(),
            vec![
                Node::Expr(condition),
                Node::Expr(then_branch),
                Node::Expr(else_branch),
            ],
        ),

        Expr::Variable { name, .. } => (format!("Variable {}", name.lexeme), Vec::new()),

        Expr::Assign { name, value, .. } => {
            (format!("Assign {}", name.lexeme), vec![Node::Expr(value)])
        }

        Expr::Call {
            callee, arguments, ..
        } => {
            let mut children = vec![Node::Expr(callee)];
            children.extend(arguments.iter().map(Node::Expr));
            ("Call".into(), children)
        }

        Expr::Get { object, name } => (format!("Get {}", name.lexeme), vec![Node::Expr(object)]),

        Expr::Set {
            object,
            name,
            value,
        } => (
            format!("Set {}", name.lexeme),
            vec![Node::Expr(object), Node::Expr(value)],
        ),

        Expr::Lambda(decl) => (
            format!("Lambda {}", signature(decl)),
            decl.body.iter().map(Node::Stmt).collect(),
        ),

        Expr::This { .. } => ("This".into(), Vec::new()),

        Expr::Super { method, .. } => (format!("Super {}", method.lexeme), Vec::new()),
    }
}

fn signature(decl: &FunctionDecl) -> String {
    let params: Vec<&str> = decl.params.iter().map(|t: &Token| t.lexeme.as_str()).collect();

    match &decl.name {
        Some(name) => format!("{}({})", name.lexeme, params.join(", ")),
        None => format!("({})", params.join(", ")),
    }
}

fn literal(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::Number(n) => format_number(*n),
        LiteralValue::Str(s) => format!("\"{}\"", s),
        LiteralValue::True => "true".into(),
        LiteralValue::False => "false".into(),
        LiteralValue::Nil => "nil".into(),
    }
}
