#[cfg(test)]
mod resolver_tests {
    use tree_lox as lox;

    use lox::expr::{Expr, ExprId};
    use lox::parser::Parser;
    use lox::report::Diagnostics;
    use lox::resolver::{Resolution, Resolver};
    use lox::scanner::scan_tokens;
    use lox::stmt::Stmt;

    fn resolve(source: &str) -> (Vec<Stmt>, Resolution, Vec<String>) {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        assert!(
            diagnostics.is_empty(),
            "source should parse cleanly: {:?}",
            diagnostics.entries()
        );

        let resolution = Resolver::new(&mut diagnostics).resolve(&statements);
        let messages = diagnostics.entries().iter().map(|d| d.to_string()).collect();

        (statements, resolution, messages)
    }

    /// Every `Variable`/`This`/`Super` id with the given name, in source order.
    fn ids_named(statements: &[Stmt], wanted: &str) -> Vec<ExprId> {
        fn stmt(s: &Stmt, wanted: &str, out: &mut Vec<ExprId>) {
            match s {
                Stmt::Expression(e) | Stmt::Value(e) => expr(e, wanted, out),
                Stmt::Var { initializer, .. } => {
                    if let Some(e) = initializer {
                        expr(e, wanted, out);
                    }
                }
                Stmt::Block(body) => body.iter().for_each(|s| stmt(s, wanted, out)),
                Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    expr(condition, wanted, out);
                    stmt(then_branch, wanted, out);
                    if let Some(e) = else_branch {
                        stmt(e, wanted, out);
                    }
                }
                Stmt::While { condition, body } => {
                    expr(condition, wanted, out);
                    stmt(body, wanted, out);
                }
                Stmt::Function(decl) => decl.body.iter().for_each(|s| stmt(s, wanted, out)),
                Stmt::Class { methods, .. } => methods
                    .iter()
                    .flat_map(|m| m.body.iter())
                    .for_each(|s| stmt(s, wanted, out)),
                Stmt::Return { value, .. } => {
                    if let Some(e) = value {
                        expr(e, wanted, out);
                    }
                }
                Stmt::Break { .. } => {}
            }
        }

        fn expr(e: &Expr, wanted: &str, out: &mut Vec<ExprId>) {
            match e {
                Expr::Variable { id, name } if name.lexeme == wanted => out.push(*id),
                Expr::Assign { id, name, value } => {
                    if name.lexeme == wanted {
                        out.push(*id);
                    }
                    expr(value, wanted, out);
                }
                Expr::This { id, .. } if wanted == "this" => out.push(*id),
                Expr::Super { id, .. } if wanted == "super" => out.push(*id),
                Expr::Grouping(inner) | Expr::Unary { right: inner, .. } => expr(inner, wanted, out),
                Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                    expr(left, wanted, out);
                    expr(right, wanted, out);
                }
                Expr::Call {
                    callee, arguments, ..
                } => {
                    expr(callee, wanted, out);
                    arguments.iter().for_each(|a| expr(a, wanted, out));
                }
                Expr::Get { object, .. } => expr(object, wanted, out),
                Expr::Set { object, value, .. } => {
                    expr(object, wanted, out);
                    expr(value, wanted, out);
                }
                Expr::Lambda(decl) => decl.body.iter().for_each(|s| stmt(s, wanted, out)),
                _ => {}
            }
        }

        let mut out = Vec::new();
        statements.iter().for_each(|s| stmt(s, wanted, &mut out));
        out
    }

    #[test]
    fn test_globals_are_left_unrecorded() {
        let (statements, resolution, messages) = resolve("var a = 1; a; a = 2;");

        assert!(messages.is_empty());
        for id in ids_named(&statements, "a") {
            assert!(!resolution.contains_key(&id));
        }
    }

    #[test]
    fn test_local_distances_count_scopes_outward() {
        let (statements, resolution, messages) = resolve("{ var a = 1; { { a; } a; } a; }");
        assert!(messages.is_empty());

        let distances: Vec<usize> = ids_named(&statements, "a")
            .iter()
            .map(|id| resolution[id])
            .collect();
        assert_eq!(distances, vec![2, 1, 0]);
    }

    #[test]
    fn test_closure_binding_is_fixed_at_definition() {
        // the inner `a` must resolve to the outer local, not a later shadow
        let (statements, resolution, messages) = resolve(
            "{ var a = 1; func show() { return a; } { var a = 2; show(); } }",
        );
        assert!(messages.is_empty());

        let ids = ids_named(&statements, "a");
        assert_eq!(resolution[&ids[0]], 1);
    }

    #[test]
    fn test_this_and_super_distances() {
        let (statements, resolution, messages) = resolve(
            "class A { func f() { return 1; } }\n\
             class B < A { func f() { return super.f() + this.g; } }",
        );
        assert!(messages.is_empty());

        let supers = ids_named(&statements, "super");
        let this = ids_named(&statements, "this");
        assert_eq!(resolution[&supers[0]], 2);
        assert_eq!(resolution[&this[0]], 1);
    }

    #[test]
    fn test_own_initializer_read_is_reported() {
        let (_, _, messages) = resolve("{ var a = a; }");
        assert_eq!(
            messages,
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_global_self_reference_is_not_a_static_error() {
        let (_, _, messages) = resolve("var a = a;");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_redeclaration_in_local_scope_is_reported() {
        let (_, _, messages) = resolve("func f(a, a) { var b; var b; }");
        assert_eq!(
            messages,
            vec![
                "[line 1] Error at 'a': Already a variable with this name in this scope.",
                "[line 1] Error at 'b': Already a variable with this name in this scope.",
            ]
        );
    }

    #[test]
    fn test_return_rules() {
        let (_, _, messages) = resolve("return 1;");
        assert_eq!(
            messages,
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );

        let (_, _, messages) = resolve("class A { func init() { return 1; } }");
        assert_eq!(
            messages,
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );

        let (_, _, messages) = resolve("class A { func init() { return; } }");
        assert!(messages.is_empty());

        // a lambda inside an initializer is an ordinary function
        let (_, _, messages) = resolve("class A { func init() { var f = func() { return 1; }; } }");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_this_and_super_misuse() {
        let (_, _, messages) = resolve("this; super.f; class A { func f() { super.f(); } }");
        assert_eq!(
            messages,
            vec![
                "[line 1] Error at 'this': Can't use 'this' outside of a class.",
                "[line 1] Error at 'super': Can't use 'super' outside of a class.",
                "[line 1] Error at 'super': Can't use 'super' in a class with no superclass.",
            ]
        );
    }

    #[test]
    fn test_self_inheritance_is_reported() {
        let (_, _, messages) = resolve("class A < A {}");
        assert_eq!(
            messages,
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_errors_do_not_halt_resolution() {
        let (statements, resolution, messages) =
            resolve("return 1;\n{ var x = 1; { x; } }\nthis;");

        assert_eq!(messages.len(), 2);

        // the block between the two errors was still resolved
        let ids = ids_named(&statements, "x");
        assert_eq!(resolution[&ids[0]], 1);
    }
}
