use treelox::expr::{Expr, IdGen};
use treelox::parser::Parser;
use treelox::resolver::Resolver;
use treelox::scanner::Scanner;
use treelox::stmt::Stmt;

fn parse(source: &str) -> Vec<Stmt> {
    let tokens = Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .expect("scan failed");
    let mut ids = IdGen::new();
    let mut parser = Parser::new(tokens, &mut ids);
    parser.parse().expect("parse failed")
}

#[test]
fn test_valid_program_has_no_static_errors() {
    let program = parse(
        "fun counter() { var n = 0; fun tick() { n = n + 1; return n; } return tick; }\n\
         var c = counter();\n\
         while (c() < 3) { print c; }",
    );

    let mut resolver = Resolver::new();
    assert!(resolver.resolve(&program).is_ok());
}

#[test]
fn test_globals_are_left_unresolved() {
    let program = parse("var a = 1; print a;");

    let bindings = Resolver::new().resolve(&program).unwrap();

    // Top-level names live in the global frame: no local entries at all.
    assert!(bindings.is_empty());
}

#[test]
fn test_local_distance_counts_scopes_outward() {
    let program = parse("{ var b = 2; { print b; } }");

    let bindings = Resolver::new().resolve(&program).unwrap();

    // The single resolved reference is `b`, one scope out from its use.
    let Stmt::Block(outer) = &program[0] else {
        panic!("expected a Block");
    };
    let Stmt::Block(inner) = &outer[1] else {
        panic!("expected a nested Block");
    };
    let Stmt::Print(Expr::Variable { id, .. }) = &inner[0] else {
        panic!("expected print of a variable");
    };

    assert_eq!(bindings.distance(*id), Some(1));
    assert_eq!(bindings.len(), 1);
}

#[test]
fn test_shadowing_initializer_reads_outer_binding() {
    let program = parse("var a = \"outer\"; { var a = a; print a; }");

    let bindings = Resolver::new().resolve(&program).unwrap();

    let Stmt::Block(block) = &program[1] else {
        panic!("expected a Block");
    };
    let Stmt::Var {
        initializer: Some(Expr::Variable { id: init_id, .. }),
        ..
    } = &block[0]
    else {
        panic!("expected var with variable initializer");
    };
    let Stmt::Print(Expr::Variable { id: print_id, .. }) = &block[1] else {
        panic!("expected print of a variable");
    };

    // The initializer resolves before the inner `a` is declared: it sees
    // the global `a` (unresolved), while the later print sees the local.
    assert_eq!(bindings.distance(*init_id), None);
    assert_eq!(bindings.distance(*print_id), Some(0));
}

#[test]
fn test_redeclaration_in_same_scope_is_allowed() {
    let program = parse("{ var a = 1; var a = 2; print a; }");

    assert!(Resolver::new().resolve(&program).is_ok());
}

#[test]
fn test_function_params_resolve_at_distance_zero() {
    let program = parse("fun id(x) { return x; }");

    let bindings = Resolver::new().resolve(&program).unwrap();

    let Stmt::Function { body, .. } = &program[0] else {
        panic!("expected a Function");
    };
    let Stmt::Control {
        value: Some(Expr::Variable { id, .. }),
        ..
    } = &body[0]
    else {
        panic!("expected return of a variable");
    };

    // The body shares the parameter scope.
    assert_eq!(bindings.distance(*id), Some(0));
}

#[test]
fn test_return_at_top_level_is_a_static_error() {
    let program = parse("return 1;");

    let errors = Resolver::new().resolve(&program).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("top-level"));
}

#[test]
fn test_resolution_continues_after_a_static_error() {
    let program = parse("return 1;\nreturn 2;");

    let errors = Resolver::new().resolve(&program).unwrap_err();

    assert_eq!(errors.len(), 2);
}

#[test]
fn test_resolving_twice_is_idempotent() {
    let program = parse("{ var a = 1; { var b = a; fun f() { return b; } } }");

    let first = Resolver::new().resolve(&program).unwrap();
    let second = Resolver::new().resolve(&program).unwrap();

    assert_eq!(first, second);
}
