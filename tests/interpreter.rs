use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox::expr::IdGen;
use treelox::interpreter::Interpreter;
use treelox::lox::Lox;
use treelox::parser::Parser;
use treelox::resolver::Resolver;
use treelox::scanner::Scanner;

/// A `Write` sink the test keeps a handle on after handing it to the
/// interpreter.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output was not UTF-8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run a whole program through a fresh session, returning its print output
/// and the session (for flag inspection).
fn run(source: &str) -> (String, Lox) {
    let buf = SharedBuf::default();
    let mut lox = Lox::with_output(Box::new(buf.clone()));

    lox.run(source);

    (buf.contents(), lox)
}

fn run_ok(source: &str) -> String {
    let (output, lox) = run(source);

    assert!(!lox.had_error, "unexpected static error");
    assert!(!lox.had_runtime_error, "unexpected runtime error");

    output
}

/// Run a program directly against an interpreter, surfacing the runtime
/// error value (the session reports it to stderr and only sets a flag).
fn run_for_runtime_error(source: &str) -> treelox::error::LoxError {
    let tokens = Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .expect("scan failed");
    let mut ids = IdGen::new();
    let mut parser = Parser::new(tokens, &mut ids);
    let program = parser.parse().expect("parse failed");
    let bindings = Resolver::new().resolve(&program).expect("resolve failed");

    let mut interpreter = Interpreter::with_output(Box::new(SharedBuf::default()));
    interpreter.add_bindings(bindings);

    interpreter
        .interpret(&program)
        .expect_err("expected a runtime error")
}

// ── printing and arithmetic ─────────────────────────────────────────────

#[test]
fn test_print_stringification() {
    assert_eq!(run_ok("print nil;"), "nil\n");
    assert_eq!(run_ok("print 3;"), "3\n");
    assert_eq!(run_ok("print 3.25;"), "3.25\n");
    assert_eq!(run_ok("print \"hi\";"), "hi\n");
    assert_eq!(run_ok("print true;"), "true\n");
}

#[test]
fn test_plus_is_overloaded() {
    assert_eq!(run_ok("print 1 + 2;"), "3\n");
    assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");

    let err = run_for_runtime_error("print 1 + \"bar\";");
    assert!(err
        .to_string()
        .contains("Operands must be both numbers or both strings."));
}

#[test]
fn test_division_by_zero_is_not_special_cased() {
    assert_eq!(run_ok("print 1 / 0;"), "inf\n");
}

#[test]
fn test_comparison_requires_numbers() {
    let err = run_for_runtime_error("print 1 < \"two\";");
    assert!(err.to_string().contains("Operands must be numbers."));
}

#[test]
fn test_unary_minus_requires_a_number() {
    let err = run_for_runtime_error("print -\"oops\";");
    assert!(err.to_string().contains("Operand must be a number."));
}

#[test]
fn test_equality_has_no_coercion() {
    assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
    assert_eq!(run_ok("print nil == nil;"), "true\n");
    assert_eq!(run_ok("print nil == false;"), "false\n");
}

#[test]
fn test_truthiness_is_ruby_like() {
    // 0 and "" are truthy; only nil and false are falsy.
    assert_eq!(run_ok("if (0) print \"yes\"; else print \"no\";"), "yes\n");
    assert_eq!(run_ok("if (\"\") print \"yes\"; else print \"no\";"), "yes\n");
    assert_eq!(run_ok("if (nil) print \"yes\"; else print \"no\";"), "no\n");
}

// ── short-circuit evaluation ────────────────────────────────────────────

#[test]
fn test_and_short_circuits_past_division() {
    assert_eq!(run_ok("print false and (1/0);"), "false\n");
}

#[test]
fn test_or_short_circuits_past_division() {
    assert_eq!(run_ok("print true or (1/0);"), "true\n");
}

#[test]
fn test_logical_operators_return_the_deciding_operand() {
    assert_eq!(run_ok("print nil or \"fallback\";"), "fallback\n");
    assert_eq!(run_ok("print 1 and 2;"), "2\n");
    assert_eq!(run_ok("print nil and 2;"), "nil\n");
}

// ── variables and scoping ───────────────────────────────────────────────

#[test]
fn test_shadowing_initializer_sees_outer_value() {
    assert_eq!(
        run_ok("var a = \"outer\"; { var a = a; print a; }"),
        "outer\n"
    );
}

#[test]
fn test_undeclared_read_is_nil_but_assignment_errors() {
    assert_eq!(run_ok("print ghost;"), "nil\n");

    let err = run_for_runtime_error("ghost = 1;");
    assert!(err.to_string().contains("Undeclared variable 'ghost'."));
}

#[test]
fn test_block_scopes_restore_on_exit() {
    assert_eq!(
        run_ok("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

// ── loops and desugaring ────────────────────────────────────────────────

#[test]
fn test_for_loop_matches_manual_desugaring() {
    let for_output = run_ok("for (var i = 0; i < 3; i = i + 1) print i;");
    let while_output = run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }");

    assert_eq!(for_output, "0\n1\n2\n");
    assert_eq!(for_output, while_output);
}

#[test]
fn test_break_exits_loop_without_running_increment() {
    assert_eq!(
        run_ok("for (var i = 0; i < 5; i = i + 1) { if (i == 2) break; print i; } "),
        "0\n1\n"
    );
}

#[test]
fn test_continue_still_runs_the_increment() {
    assert_eq!(
        run_ok("for (var i = 0; i < 3; i = i + 1) { if (i == 1) continue; print i; }"),
        "0\n2\n"
    );
}

#[test]
fn test_return_propagates_through_a_loop() {
    assert_eq!(
        run_ok("fun f() { while (true) { return 7; } } print f();"),
        "7\n"
    );
}

// ── functions and closures ──────────────────────────────────────────────

#[test]
fn test_function_call_and_implicit_nil_return() {
    assert_eq!(
        run_ok("fun add(a, b) { print a + b; } print add(1, 2);"),
        "3\nnil\n"
    );
}

#[test]
fn test_recursion_uses_own_name() {
    assert_eq!(
        run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"),
        "55\n"
    );
}

#[test]
fn test_closures_capture_their_defining_frame() {
    assert_eq!(
        run_ok(
            "fun makeCounter() {\n\
             var n = 0;\n\
             fun tick() { n = n + 1; return n; }\n\
             return tick;\n\
             }\n\
             var a = makeCounter();\n\
             var b = makeCounter();\n\
             print a(); print a(); print b();"
        ),
        "1\n2\n1\n"
    );
}

#[test]
fn test_function_values_stringify_with_their_name() {
    assert_eq!(run_ok("fun f() {} print f;"), "<fn 'f'>\n");
    assert_eq!(run_ok("print clock;"), "<native fn clock>\n");
}

#[test]
fn test_str_native_stringifies_values() {
    assert_eq!(run_ok("print str(1) + str(2);"), "12\n");
    assert_eq!(run_ok("print str(nil);"), "nil\n");
}

#[test]
fn test_native_arity_mismatch_message() {
    let err = run_for_runtime_error("clock(1);");
    assert!(err.to_string().contains("Expected 0 arguments but got 1."));
}

#[test]
fn test_user_function_arity_mismatch() {
    let err = run_for_runtime_error("fun f(a) {} f(1, 2);");
    assert!(err.to_string().contains("Expected 1 arguments but got 2."));
}

#[test]
fn test_calling_a_non_callable_value() {
    let err = run_for_runtime_error("var x = 1; x();");
    assert!(err.to_string().contains("Can only call functions."));
}

// ── errors and the session ──────────────────────────────────────────────

#[test]
fn test_static_error_prevents_execution() {
    let (output, lox) = run("print \"before\"; return 1;");

    assert!(lox.had_error);
    assert!(!lox.had_runtime_error);
    assert_eq!(output, "", "nothing may execute after a static error");
}

#[test]
fn test_runtime_error_stops_the_current_run() {
    let (output, lox) = run("print 1; ghost = 2; print 3;");

    assert!(lox.had_runtime_error);
    assert_eq!(output, "1\n", "statements after the failure must not run");
}

#[test]
fn test_runtime_errors_carry_the_source_line() {
    let err = run_for_runtime_error("var a = 1;\n\na = a + \"x\";");
    assert_eq!(
        err.to_string(),
        "[line 3] RuntimeError: Operands must be both numbers or both strings."
    );
}

#[test]
fn test_repl_session_keeps_state_across_lines() {
    let buf = SharedBuf::default();
    let mut lox = Lox::with_output(Box::new(buf.clone()));

    lox.run("var count = 0;");
    lox.clear_error();

    lox.run("fun bump() { count = count + 1; return count; }");
    lox.clear_error();

    // A closure built on an earlier line still resolves on later lines.
    lox.run("print bump(); print bump();");

    assert!(!lox.had_error);
    assert!(!lox.had_runtime_error);
    assert_eq!(buf.contents(), "1\n2\n");
}

#[test]
fn test_repl_recovers_after_static_error() {
    let buf = SharedBuf::default();
    let mut lox = Lox::with_output(Box::new(buf.clone()));

    lox.run("var a = ;");
    assert!(lox.had_error);
    lox.clear_error();

    lox.run("var a = 42; print a;");

    assert!(!lox.had_error);
    assert_eq!(buf.contents(), "42\n");
}

#[test]
fn test_rerunning_a_program_is_deterministic() {
    let source = "var total = 0; for (var i = 1; i < 4; i = i + 1) total = total + i; print total;";

    assert_eq!(run_ok(source), run_ok(source));
    assert_eq!(run_ok(source), "6\n");
}
