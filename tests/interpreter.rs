mod common;

#[cfg(test)]
mod interpreter_tests {
    use tree_lox as lox;

    use lox::error::LoxError;
    use lox::session::Mode;
    use lox::value::Value;

    use crate::common::{run, run_ok, Harness};

    /// The runtime error message a program stopped with.
    fn runtime_error(source: &str) -> (String, usize) {
        match run(source).1 {
            Err(LoxError::Runtime(e)) => (e.message, e.token.line),
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    fn eval(source: &str) -> Value {
        let mut harness = Harness::new(Mode::Interactive);
        match harness.run(source) {
            Ok(Some(value)) => value,
            other => panic!(
                "expected a value, got {:?} ({:?})",
                other,
                harness.messages()
            ),
        }
    }

    // ───────────────────────────── expressions ─────────────────────────────

    #[test]
    fn test_arithmetic_and_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
        assert_eq!(eval("7 % 4"), Value::Number(3.0));
        assert_eq!(eval("-(2 + 1)"), Value::Number(-3.0));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("\"a\" + \"b\""), Value::String("ab".into()));
    }

    #[test]
    fn test_mixed_plus_is_a_runtime_error() {
        let (message, line) = runtime_error("print(1 + \"b\");");
        assert_eq!(message, "Operands must be two numbers or two strings.");
        assert_eq!(line, 1);
    }

    #[test]
    fn test_numeric_operators_require_numbers() {
        assert_eq!(runtime_error("1 < \"2\";").0, "Operands must be numbers.");
        assert_eq!(runtime_error("nil * 2;").0, "Operands must be numbers.");
        assert_eq!(runtime_error("-\"x\";").0, "Operand must be a number.");
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
        assert!(matches!(eval("0 / 0"), Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_equality_never_raises() {
        assert_eq!(eval("nil == nil"), Value::Bool(true));
        assert_eq!(eval("nil == false"), Value::Bool(false));
        assert_eq!(eval("1 == \"1\""), Value::Bool(false));
        assert_eq!(eval("\"a\" != \"b\""), Value::Bool(true));
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(eval("!nil"), Value::Bool(true));
        assert_eq!(eval("!false"), Value::Bool(true));
        assert_eq!(eval("!0"), Value::Bool(false));
        assert_eq!(eval("!\"\""), Value::Bool(false));
    }

    #[test]
    fn test_logical_operators_short_circuit_and_yield_operands() {
        assert_eq!(eval("nil or \"yes\""), Value::String("yes".into()));
        assert_eq!(eval("0 and 2"), Value::Number(2.0));
        assert_eq!(eval("false and undefined_name"), Value::Bool(false));
        assert_eq!(eval("1 or undefined_name"), Value::Number(1.0));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(eval("true ? 1 : 2"), Value::Number(1.0));
        assert_eq!(eval("nil ? 1 : false ? 2 : 3"), Value::Number(3.0));
    }

    // ───────────────────────────── variables ─────────────────────────────

    #[test]
    fn test_uninitialized_variable_read_is_an_error() {
        let (message, _) = runtime_error("var x; print(x);");
        assert_eq!(message, "Variable 'x' is not initialized.");

        assert_eq!(run_ok("var x = 1; print(x);"), "1\n");
        assert_eq!(run_ok("var x; x = 2; print(x);"), "2\n");
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(runtime_error("print(y);").0, "Undefined variable 'y'.");
        assert_eq!(runtime_error("y = 1;").0, "Undefined variable 'y'.");
    }

    #[test]
    fn test_redeclaration_in_same_block_is_an_error() {
        let (_, result, messages) = run("{ var x = 1; var x = 2; }");
        assert!(matches!(result, Err(LoxError::Static { errors: 1 })));
        assert_eq!(
            messages,
            vec!["Already a variable with this name in this scope."]
        );

        let (message, _) = runtime_error("var x = 1; var x = 2;");
        assert_eq!(message, "Variable 'x' is already defined in this scope.");
    }

    #[test]
    fn test_nested_block_shadows() {
        assert_eq!(
            run_ok("var x = \"outer\"; { var x = \"inner\"; print(x); } print(x);"),
            "inner\nouter\n"
        );
    }

    #[test]
    fn test_natives_cannot_be_redeclared() {
        let (message, _) = runtime_error("var print = 1;");
        assert_eq!(message, "Variable 'print' is already defined in this scope.");
    }

    // ───────────────────────────── control flow ─────────────────────────────

    #[test]
    fn test_if_else_chain() {
        let source = "func sign(n) {
            if n < 0 { return -1; } else if n == 0 { return 0; } else { return 1; }
        }
        print(sign(-5)); print(sign(0)); print(sign(9));";
        assert_eq!(run_ok(source), "-1\n0\n1\n");
    }

    #[test]
    fn test_while_and_for_loops() {
        assert_eq!(
            run_ok("var i = 0; while i < 3 { print(i); i = i + 1; }"),
            "0\n1\n2\n"
        );
        assert_eq!(
            run_ok("for var i = 0; i < 3; i = i + 1 { print(i); }"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_break_leaves_only_the_innermost_loop() {
        let source = "
            for var i = 0; i < 3; i = i + 1 {
                var j = 0;
                while true {
                    if j == 2 { break; }
                    print(i * 10 + j);
                    j = j + 1;
                }
            }";
        assert_eq!(run_ok(source), "0\n1\n10\n11\n20\n21\n");
    }

    #[test]
    fn test_break_skips_rest_of_nested_blocks() {
        let source = "
            while true {
                { { break; } print(\"unreachable\"); }
                print(\"also unreachable\");
            }
            print(\"after\");";
        assert_eq!(run_ok(source), "after\n");
    }

    #[test]
    fn test_break_outside_loop_prevents_execution() {
        let (output, result, messages) = run("print(1); break;");
        assert_eq!(output, "");
        assert!(matches!(result, Err(LoxError::Static { .. })));
        assert_eq!(
            messages,
            vec!["A break statement is not allowed outside of a loop."]
        );
    }

    #[test]
    fn test_return_unwinds_through_loops() {
        let source = "
            func first_over(limit) {
                for var i = 0; ; i = i + 1 {
                    while true { if i * i > limit { return i; } break; }
                }
            }
            print(first_over(10));";
        assert_eq!(run_ok(source), "4\n");
    }

    // ───────────────────────────── functions ─────────────────────────────

    #[test]
    fn test_recursion() {
        let source = "func fib(n) { if n < 2 { return n; } return fib(n - 1) + fib(n - 2); }
                      print(fib(15));";
        assert_eq!(run_ok(source), "610\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("func f() { } print(f());"), "Nil\n");
    }

    #[test]
    fn test_counter_closures_do_not_share_state() {
        let source = "
            func make_counter() {
                var count = 0;
                func increment() { count = count + 1; return count; }
                return increment;
            }
            var a = make_counter();
            var b = make_counter();
            print(a()); print(a()); print(b()); print(a());";
        assert_eq!(run_ok(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_closure_sees_binding_visible_at_definition() {
        let source = "
            var a = \"global\";
            {
                func show() { print(a); }
                show();
                var a = \"block\";
                show();
            }";
        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_lambdas_capture_parameters() {
        let source = "
            func adder(n) { return func(x) { return x + n; }; }
            var add2 = adder(2);
            print(add2(40));
            var square = func(a) { return a * a; };
            print(square(5));";
        assert_eq!(run_ok(source), "42\n25\n");
    }

    #[test]
    fn test_arity_is_not_checked_at_call_sites() {
        // surplus arguments are dropped
        assert_eq!(run_ok("func f(a) { return a; } print(f(1, 2, 3));"), "1\n");

        // missing parameters stay unbound
        let (message, _) = runtime_error("func g(a, b) { return b; } g(1);");
        assert_eq!(message, "Undefined variable 'b'.");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (message, _) = runtime_error("var x = 1; x();");
        assert_eq!(message, "Can only call functions and classes.");
    }

    #[test]
    fn test_display_forms() {
        let source = "
            func named() {}
            class Point {}
            print(named);
            print(func() {});
            print(clock);
            print(Point);
            print(Point());
            print(3.5);
            print(true);
            print(nil);";
        assert_eq!(
            run_ok(source),
            "<fn named>\n<fn lambda>\n<native fn clock>\nPoint\nPoint instance\n3.5\ntrue\nNil\n"
        );
    }

    // ───────────────────────────── natives ─────────────────────────────

    #[test]
    fn test_clock_returns_epoch_seconds() {
        match eval("clock()") {
            Value::Number(n) => assert!(n > 1_600_000_000.0, "clock() = {}", n),
            other => panic!("clock() returned {:?}", other),
        }
    }

    #[test]
    fn test_input_reads_lines_without_terminator() {
        let mut harness = Harness::with_input(Mode::Batch, "first\r\nsecond\n");
        harness
            .run("print(input()); print(input() + \"!\"); print(input() == \"\");")
            .unwrap();
        assert_eq!(harness.output(), "first\nsecond!\ntrue\n");
    }

    // ───────────────────────────── classes ─────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = "
            class Counter {
                func init(start) { this.count = start; }
                func bump() { this.count = this.count + 1; return this; }
            }
            var c = Counter(5);
            print(c.bump().bump().count);";
        assert_eq!(run_ok(source), "7\n");
    }

    #[test]
    fn test_init_yields_instance_even_with_bare_return() {
        let source = "
            class Thing {
                func init() { this.ready = true; return; this.ready = false; }
            }
            var t = Thing();
            print(t);
            print(t.ready);
            print(t.init);";
        let (output, result, _) = run(source);
        assert_eq!(output, "Thing instance\ntrue\n");

        match result {
            Err(LoxError::Runtime(e)) => assert_eq!(e.message, "Can't call an initializer directly."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = "
            class A { func name() { return \"method\"; } }
            var a = A();
            print(a.name());
            a.name = \"field\";
            print(a.name);";
        assert_eq!(run_ok(source), "method\nfield\n");
    }

    #[test]
    fn test_bound_methods_remember_their_instance() {
        let source = "
            class Greeter {
                func init(name) { this.name = name; }
                func greet() { return \"hi \" + this.name; }
            }
            var greet = Greeter(\"ada\").greet;
            print(greet());";
        assert_eq!(run_ok(source), "hi ada\n");
    }

    #[test]
    fn test_super_dispatch_uses_subclass_instance() {
        let source = "
            class Base {
                func describe() { return \"base sees \" + this.tag + \" and \" + this.kind(); }
                func kind() { return \"base\"; }
            }
            class Derived < Base {
                func init() { this.tag = \"derived-field\"; }
                func describe() { return \"derived / \" + super.describe(); }
                func kind() { return \"derived\"; }
            }
            print(Derived().describe());";
        assert_eq!(
            run_ok(source),
            "derived / base sees derived-field and derived\n"
        );
    }

    #[test]
    fn test_methods_are_inherited() {
        let source = "
            class A { func hello() { return \"hello from A\"; } }
            class B < A {}
            class C < B {}
            print(C().hello());";
        assert_eq!(run_ok(source), "hello from A\n");
    }

    #[test]
    fn test_inherited_initializer_runs() {
        let source = "
            class A { func init(x) { this.x = x; } }
            class B < A {}
            print(B(4).x);";
        assert_eq!(run_ok(source), "4\n");
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("class A {} A().missing;").0,
            "Undefined property 'missing'."
        );
        assert_eq!(runtime_error("var x = 1; x.y;").0, "Only instances have properties.");
        assert_eq!(runtime_error("\"s\".y = 1;").0, "Only instances have fields.");
        assert_eq!(
            runtime_error("class A {} class B < A { func f() { return super.nope(); } } B().f();").0,
            "Undefined property 'nope'."
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (message, line) = runtime_error("var NotClass = 1;\nclass A < NotClass {}");
        assert_eq!(message, "Superclass must be a class.");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_instances_compare_by_identity() {
        let source = "
            class A {}
            var a = A();
            var b = a;
            print(a == b);
            print(a == A());";
        assert_eq!(run_ok(source), "true\nfalse\n");
    }

    // ───────────────────────────── sessions ─────────────────────────────

    #[test]
    fn test_runtime_error_aborts_submission_and_is_reported() {
        let (output, result, messages) = run("print(1);\nprint(-nil);\nprint(2);");

        assert_eq!(output, "1\n");
        assert!(matches!(result, Err(LoxError::Runtime(_))));
        assert_eq!(messages, vec!["Operand must be a number."]);
    }

    #[test]
    fn test_runtime_error_display() {
        match run("\n\nnil();").1 {
            Err(e) => assert_eq!(e.to_string(), "Can only call functions and classes.\n[line 3]"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_error_flags_are_independent() {
        let mut harness = Harness::new(Mode::Interactive);

        let _ = harness.run("var = ;");
        assert!(harness.session.had_error());
        assert!(!harness.session.had_runtime_error());

        harness.session.reset_errors();

        let _ = harness.run("nil();");
        assert!(!harness.session.had_error());
        assert!(harness.session.had_runtime_error());
    }

    #[test]
    fn test_interactive_submissions_share_globals() {
        let mut harness = Harness::new(Mode::Interactive);

        harness.run("var count = 1;").unwrap();
        harness.run("func bump() { count = count + 1; return count; }").unwrap();

        assert_eq!(harness.run("bump()").unwrap(), Some(Value::Number(2.0)));
        assert_eq!(harness.run("bump()").unwrap(), Some(Value::Number(3.0)));
        assert_eq!(harness.run("count").unwrap(), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_closures_from_earlier_submissions_keep_their_scopes() {
        let mut harness = Harness::new(Mode::Interactive);

        harness
            .run("func outer() { var x = \"captured\"; return func() { return x; }; }")
            .unwrap();
        harness.run("var f = outer();").unwrap();

        // more ids are handed out here, none may collide with `x` above
        harness.run("{ var a = 1; var b = 2; var c = a + b; }").unwrap();

        assert_eq!(
            harness.run("f()").unwrap(),
            Some(Value::String("captured".into()))
        );
    }

    #[test]
    fn test_rejected_submission_leaves_globals_untouched() {
        let mut harness = Harness::new(Mode::Interactive);

        harness.run("var a = 1;").unwrap();

        // the syntax error at the end keeps the earlier statements from running
        let result = harness.run("print(9); a = 2; var = ;");
        assert!(matches!(result, Err(LoxError::Static { .. })));
        assert_eq!(harness.output(), "");

        assert_eq!(harness.run("a").unwrap(), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_echoed_values_match_print_output() {
        let mut harness = Harness::new(Mode::Interactive);

        let value = harness.run("print(nil)").unwrap().unwrap();
        assert_eq!(value, Value::Nil);
        assert_eq!(harness.output(), format!("{}\n", value.printed()));
        assert_eq!(value.printed(), "Nil");

        assert_eq!(Value::Number(2.0).printed(), "2");
        assert_eq!(Value::String("hi".into()).printed(), "hi");
    }

    #[test]
    fn test_global_redeclaration_within_one_submission_fails() {
        let mut harness = Harness::new(Mode::Interactive);

        let result = harness.run("var x = 1; var x = 2;");
        assert!(matches!(result, Err(LoxError::Runtime(_))));
    }

    #[test]
    fn test_global_redeclaration_across_submissions_fails() {
        let mut harness = Harness::new(Mode::Interactive);

        harness.run("var x = 1;").unwrap();
        let result = harness.run("var x = 2;");

        match result {
            Err(LoxError::Runtime(e)) => {
                assert_eq!(e.message, "Variable 'x' is already defined in this scope.")
            }
            other => panic!("expected redeclaration error, got {:?}", other),
        }

        // the original binding survives the failed submission
        assert_eq!(harness.run("x").unwrap(), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_session_recovers_after_runtime_error_inside_call() {
        let mut harness = Harness::new(Mode::Interactive);

        harness.run("func boom() { { var local = 1; nil(); } }").unwrap();
        assert!(harness.run("boom();").is_err());

        // back at global scope: a new global is visible to the next submission
        harness.run("var after = 5;").unwrap();
        assert_eq!(harness.run("after").unwrap(), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_batch_mode_returns_no_value() {
        let (_, result, _) = run("1 + 2;");
        assert!(matches!(result, Ok(None)));
    }
}
