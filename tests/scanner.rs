use treelox::scanner::Scanner;
use treelox::token::TokenType;

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source.as_bytes());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn test_scanner_symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_two_char_operators() {
    assert_token_sequence(
        "! != = == < <= > >=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_keywords_and_identifiers() {
    assert_token_sequence(
        "var x = nil; while break continue fun return",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::EQUAL, "="),
            (TokenType::NIL, "nil"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::WHILE, "while"),
            (TokenType::BREAK, "break"),
            (TokenType::CONTINUE, "continue"),
            (TokenType::FUN, "fun"),
            (TokenType::RETURN, "return"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_literals() {
    let scanner = Scanner::new(b"123 3.14 \"hello\"");
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 4);

    match &tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 123.0),
        other => panic!("expected NUMBER, got {:?}", other),
    }

    match &tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 3.14),
        other => panic!("expected NUMBER, got {:?}", other),
    }

    match &tokens[2].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello"),
        other => panic!("expected STRING, got {:?}", other),
    }

    assert_eq!(tokens[3].token_type, TokenType::EOF);
}

#[test]
fn test_scanner_skips_comments_and_tracks_lines() {
    let source = "var a; // trailing comment\nvar b;";
    let scanner = Scanner::new(source.as_bytes());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    // var a ; var b ; EOF
    assert_eq!(tokens.len(), 7);
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[3].line, 2);
}

#[test]
fn test_scanner_unexpected_chars_interleaved_with_tokens() {
    let source = ",.$(#";
    let results: Vec<_> = Scanner::new(source.as_bytes()).collect();

    // COMMA, DOT, error($), LEFT_PAREN, error(#), EOF
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            err
        );
    }

    assert!(matches!(
        results[5].as_ref().map(|t| t.token_type.clone()),
        Ok(TokenType::EOF)
    ));
}

#[test]
fn test_scanner_unterminated_string() {
    let results: Vec<_> = Scanner::new(b"\"oops").collect();

    assert!(results
        .iter()
        .any(|r| matches!(r, Err(e) if e.to_string().contains("Unterminated string"))));
}
