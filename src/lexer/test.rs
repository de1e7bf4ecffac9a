// 导入父模块（也就是 lexer 模块）的所有内容
use super::*;
use crate::utils::Position;

/// 只返回 Token 种类，去掉末尾的 `EndOfInput`。
fn kinds(source: &str) -> Vec<TokenKind> {
    let mut tokens = Lexer::new(source).tokenize();
    assert_eq!(tokens.pop().map(|t| t.kind), Some(TokenKind::EndOfInput));
    tokens.into_iter().map(|t| t.kind).collect()
}

// --- 成功案例 (Happy Path) ---

#[test]
fn test_simple_program() {
    use TokenKind::*;
    assert_eq!(
        kinds("{int a a=5 print(a)}$"),
        vec![
            OpenBlock,
            Type(DataType::Int),
            Identifier,
            Identifier,
            Assign,
            Number,
            Print,
            LParen,
            Identifier,
            RParen,
            CloseBlock,
            EndOfProgram,
        ]
    );
}

#[test]
fn test_keywords_and_types() {
    use TokenKind::*;
    assert_eq!(
        kinds("while if print string boolean true false"),
        vec![
            While,
            If,
            Print,
            Type(DataType::String),
            Type(DataType::Boolean),
            BoolVal(true),
            BoolVal(false),
        ]
    );
}

#[test]
fn test_operators_prefer_longest_match() {
    use TokenKind::*;
    assert_eq!(kinds("= == != +"), vec![Assign, Equals, NotEquals, Plus]);
    assert_eq!(kinds("a==b"), vec![Identifier, Equals, Identifier]);
}

#[test]
fn test_number_keeps_all_digits() {
    let tokens = Lexer::new("123").tokenize();
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].lexeme, "123");
}

#[test]
fn test_comments_are_skipped() {
    use TokenKind::*;
    assert_eq!(kinds("{ /* a comment\n over lines */ }$"), vec![OpenBlock, CloseBlock, EndOfProgram]);
}

#[test]
fn test_string_mode_emits_chars_and_spaces() {
    use TokenKind::*;
    assert_eq!(kinds("\"a b\""), vec![Quote, Char, Space, Char, Quote]);
}

#[test]
fn test_string_mode_is_entered_and_left_by_quotes() {
    let mut lexer = Lexer::new("\"aB\" a");
    assert!(!lexer.in_string());
    assert_eq!(lexer.next_token().kind, TokenKind::Quote);
    assert!(lexer.in_string());
    assert_eq!(lexer.next_token().kind, TokenKind::Char);

    let upper = lexer.next_token();
    assert!(upper.is_error());
    assert!(lexer.in_string(), "an invalid character must not leave string mode");

    assert_eq!(lexer.next_token().kind, TokenKind::Quote);
    assert!(!lexer.in_string());
    assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
}

#[test]
fn test_comment_syntax_is_literal_inside_strings() {
    // `/` is not a string character, so each one is reported on its own.
    use TokenKind::*;
    let error = Error(LexicalError::InvalidStringCharacter);
    assert_eq!(
        kinds("\"/*\""),
        vec![Quote, error.clone(), error, Quote]
    );
}

#[test]
fn test_end_of_input_repeats() {
    let mut lexer = Lexer::new("{");
    assert_eq!(lexer.next_token().kind, TokenKind::OpenBlock);
    for _ in 0..3 {
        assert_eq!(lexer.next_token().kind, TokenKind::EndOfInput);
    }
}

// --- 位置追踪 (Positions) ---

#[test]
fn test_positions_track_lines_and_columns() {
    let tokens = Lexer::new("{\n  int a\n}$").tokenize();
    let positions: Vec<_> = tokens.iter().map(|t| (t.line(), t.column())).collect();
    assert_eq!(positions, vec![(1, 1), (2, 3), (2, 7), (3, 1), (3, 2), (3, 3)]);
}

#[test]
fn test_positions_never_go_backwards() {
    let sources = [
        "{int a a=5 print(a)}$ {print(\"hi there\")}$",
        "{\"ab\n}$",
        "/* open\n\n comment",
        "{ s = \"aB1 c\" }$ 12x $",
    ];
    for source in sources {
        let tokens = Lexer::new(source).tokenize();
        for pair in tokens.windows(2) {
            assert!(
                pair[0].position <= pair[1].position,
                "positions went backwards in {:?}: {} then {}",
                source,
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn test_unit_lexer_reports_absolute_positions() {
    let source = "{}$\n{print(1)}$";
    let second = source.find('\n').unwrap() + 1;
    let tokens = Lexer::for_unit(source, second..source.len()).tokenize();
    assert_eq!(tokens[0].position, Position::new(2, 1));
    assert_eq!(tokens[0].span, Span::new(second, second + 1));
    assert_eq!(tokens[1].kind, TokenKind::Print);
    assert_eq!(tokens[1].position, Position::new(2, 2));
}

// --- 失败案例 (Sad Path) ---

#[test]
fn test_multi_letter_identifier_is_one_error() {
    let tokens = Lexer::new("abc").tokenize();
    assert_eq!(tokens[0].kind, TokenKind::Error(LexicalError::InvalidIdentifier));
    assert_eq!(tokens[0].lexeme, "abc");
    assert_eq!(tokens[1].kind, TokenKind::EndOfInput);
}

#[test]
fn test_keyword_prefix_is_not_split() {
    assert_eq!(kinds("printa"), vec![TokenKind::Error(LexicalError::InvalidIdentifier)]);
}

#[test]
fn test_digits_followed_by_letter() {
    let tokens = Lexer::new("12ab = 3").tokenize();
    assert_eq!(tokens[0].kind, TokenKind::Error(LexicalError::MalformedNumber));
    assert_eq!(tokens[0].lexeme, "12ab");
    assert_eq!(tokens[1].kind, TokenKind::Assign);
    assert_eq!(tokens[2].kind, TokenKind::Number);
}

#[test]
fn test_unrecognized_character() {
    use TokenKind::*;
    assert_eq!(
        kinds("{ # }"),
        vec![OpenBlock, Error(LexicalError::UnrecognizedCharacter), CloseBlock]
    );
}

#[test]
fn test_unterminated_comment_is_a_warning() {
    let tokens = Lexer::new("{ /* never closed\n }$").tokenize();
    assert_eq!(tokens[0].kind, TokenKind::OpenBlock);
    assert_eq!(tokens[1].kind, TokenKind::Warning(LexicalWarning::UnterminatedComment));
    assert_eq!(tokens[2].kind, TokenKind::EndOfInput);
}

#[test]
fn test_invalid_string_characters_recover_per_character() {
    use TokenKind::*;
    let error = Error(LexicalError::InvalidStringCharacter);
    assert_eq!(
        kinds("\"aB1 c\""),
        vec![Quote, Char, error.clone(), error, Space, Char, Quote]
    );
}

#[test]
fn test_whitespace_other_than_space_is_not_skipped_in_strings() {
    use TokenKind::*;
    assert_eq!(
        kinds("\"a\tb\""),
        vec![Quote, Char, Error(LexicalError::InvalidStringCharacter), Char, Quote]
    );
}

#[test]
fn test_string_terminated_by_newline() {
    let tokens = Lexer::new("{\"ab\n}$").tokenize();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::OpenBlock,
            TokenKind::Quote,
            TokenKind::Char,
            TokenKind::Char,
            TokenKind::Error(LexicalError::UnterminatedString { opened: Position::new(1, 2) }),
            TokenKind::CloseBlock,
            TokenKind::EndOfProgram,
            TokenKind::EndOfInput,
        ]
    );
    // 字符串模式已退出，`}` 和 `$` 由主模式识别。
    assert_eq!(tokens[5].position, Position::new(2, 1));
}

#[test]
fn test_string_terminated_by_brace_and_separator() {
    use TokenKind::*;
    let unterminated = Error(LexicalError::UnterminatedString { opened: Position::new(1, 1) });
    assert_eq!(kinds("\"ab}"), vec![Quote, Char, Char, unterminated.clone(), CloseBlock]);
    assert_eq!(kinds("\"a$"), vec![Quote, Char, unterminated.clone(), EndOfProgram]);
    assert_eq!(kinds("\"a"), vec![Quote, Char, unterminated]);
}

#[test]
fn test_error_tokens_become_diagnostics() {
    let tokens = Lexer::new("{ 1a \"X\" /* }").tokenize();
    let codes: Vec<String> = tokens
        .iter()
        .filter_map(token_diagnostic)
        .map(|d| d.code().to_string())
        .collect();
    assert_eq!(codes, vec!["E0002", "E0003", "W0000"]);
    assert!(token_diagnostic(&tokens[0]).is_none());
}
