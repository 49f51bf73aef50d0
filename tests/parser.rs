use treelox::ast_printer::AstPrinter;
use treelox::expr::IdGen;
use treelox::parser::Parser;
use treelox::scanner::Scanner;
use treelox::stmt::Stmt;
use treelox::token::Token;

fn scan(source: &str) -> Vec<Token> {
    Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .expect("scan failed")
}

fn parse_program(source: &str) -> Result<Vec<Stmt>, Vec<treelox::error::LoxError>> {
    let mut ids = IdGen::new();
    let mut parser = Parser::new(scan(source), &mut ids);
    parser.parse()
}

fn parse_expr_to_string(source: &str) -> String {
    let mut ids = IdGen::new();
    let mut parser = Parser::new(scan(source), &mut ids);
    let expr = parser.parse_expression().expect("parse failed");
    AstPrinter::print(&expr)
}

#[test]
fn test_precedence_term_vs_factor() {
    assert_eq!(parse_expr_to_string("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
}

#[test]
fn test_left_associative_folding() {
    assert_eq!(parse_expr_to_string("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
}

#[test]
fn test_grouping_and_unary() {
    assert_eq!(parse_expr_to_string("-(1 + 2)"), "(- (group (+ 1.0 2.0)))");
    assert_eq!(parse_expr_to_string("!!true"), "(! (! true))");
}

#[test]
fn test_logical_operators_are_binary_nodes() {
    assert_eq!(
        parse_expr_to_string("a or b and c"),
        "(or a (and b c))"
    );
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(parse_expr_to_string("a = b = 1"), "(= a (= b 1.0))");
}

#[test]
fn test_call_with_arguments() {
    assert_eq!(
        parse_expr_to_string("add(1, 2)"),
        "(call add 1.0 2.0)"
    );
}

#[test]
fn test_invalid_assignment_target_is_reported_but_parsing_continues() {
    let errors = parse_program("1 = 2;\nvar a = ;\n").unwrap_err();

    // Both the bad target and the bad initializer are reported in one pass.
    assert_eq!(errors.len(), 2);
    assert!(errors[0].to_string().contains("Invalid assignment target"));
}

#[test]
fn test_synchronization_recovers_at_statement_boundary() {
    let errors = parse_program("var = 1;\nprint 1 +;\n").unwrap_err();

    assert_eq!(errors.len(), 2);
}

#[test]
fn test_break_outside_loop_is_a_parse_error() {
    let errors = parse_program("break;").unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("'break' outside of a loop"));
}

#[test]
fn test_continue_outside_loop_is_a_parse_error() {
    let errors = parse_program("continue;").unwrap_err();

    assert!(errors[0].to_string().contains("'continue' outside of a loop"));
}

#[test]
fn test_break_inside_loop_parses() {
    let program = parse_program("while (true) { break; }").expect("should parse");

    assert_eq!(program.len(), 1);
}

#[test]
fn test_break_inside_function_inside_loop_is_rejected() {
    // The function body gets a fresh loop depth: its break cannot bind to
    // the loop outside the call.
    let errors = parse_program("while (true) { fun f() { break; } }").unwrap_err();

    assert!(errors[0].to_string().contains("'break' outside of a loop"));
}

#[test]
fn test_for_desugars_to_block_and_while() {
    let program = parse_program("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();

    assert_eq!(program.len(), 1);

    let Stmt::Block(stmts) = &program[0] else {
        panic!("expected a Block wrapping the desugared for, got {:?}", program[0]);
    };
    assert_eq!(stmts.len(), 2);

    assert!(matches!(stmts[0], Stmt::Var { .. }));
    let Stmt::While { increment, .. } = &stmts[1] else {
        panic!("expected a While, got {:?}", stmts[1]);
    };
    assert!(increment.is_some());
}

#[test]
fn test_for_without_initializer_has_no_extra_block() {
    let program = parse_program("for (; false;) print 1;").unwrap();

    assert!(matches!(program[0], Stmt::While { .. }));
}

#[test]
fn test_else_binds_to_nearest_if() {
    let program = parse_program("if (a) if (b) print 1; else print 2;").unwrap();

    let Stmt::If { else_branch, then_branch, .. } = &program[0] else {
        panic!("expected an If");
    };
    assert!(else_branch.is_none());
    assert!(matches!(
        **then_branch,
        Stmt::If { else_branch: Some(_), .. }
    ));
}

#[test]
fn test_function_declaration_shape() {
    let program = parse_program("fun add(a, b) { return a + b; }").unwrap();

    let Stmt::Function { name, params, body } = &program[0] else {
        panic!("expected a Function");
    };
    assert_eq!(name.lexeme, "add");
    assert_eq!(params.len(), 2);
    assert_eq!(body.len(), 1);
    assert!(matches!(body[0], Stmt::Control { .. }));
}
