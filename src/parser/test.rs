use super::*;
use crate::diagnostics::{DiagnosticBag, Stage};
use crate::lexer::Lexer;

/// 辅助函数，用于测试成功解析的场景。出现任何语法错误就 panic，否则返回 CST。
fn parse_source_ok(source: &str) -> CstNode {
    let mut diagnostics = DiagnosticBag::new();
    let outcome = parse(Lexer::new(source), &mut diagnostics);
    assert!(
        outcome.succeeded() && diagnostics.is_empty(),
        "Parser failed unexpectedly for source: {}\n{:?}",
        source,
        diagnostics
    );
    outcome.cst
}

/// 辅助函数，用于测试解析失败的场景，返回错误计数和诊断背包。
fn parse_source_fail(source: &str) -> (usize, DiagnosticBag) {
    let mut diagnostics = DiagnosticBag::new();
    let outcome = parse(Lexer::new(source), &mut diagnostics);
    assert!(!outcome.succeeded(), "Parser unexpectedly succeeded for source: {}", source);
    (outcome.error_count, diagnostics)
}

/// 沿着右递归的 `StatementList` 链收集每个 `<Statement>`。
fn statements(cst: &CstNode) -> Vec<&CstNode> {
    let block = cst.child(0).expect("program has a block");
    let mut list = block.child(1).expect("block has a statement list");
    let mut found = Vec::new();
    while let Some(statement) = list.child(0) {
        found.push(statement);
        match list.child(1) {
            Some(rest) => list = rest,
            None => break,
        }
    }
    found
}

// --- 成功路径测试 (Happy Path) ---

#[test]
fn test_empty_program_tree_dump() {
    let cst = parse_source_ok("{}$");
    let expected = "<Program>\n-<Block>\n--[{]\n--<Statement List>\n--[}]\n-[$]\n";
    assert_eq!(cst.to_string(), expected);
}

#[test]
fn test_statement_list_is_right_recursive() {
    let cst = parse_source_ok("{ int a a = 1 print(a) }$");
    let block = cst.child(0).unwrap();

    // <Statement List> → <Statement> <Statement List>，最后一层为空
    let mut list = block.child(1).unwrap();
    for _ in 0..3 {
        assert_eq!(list.rule(), Some(Rule::StatementList));
        assert_eq!(list.children().len(), 2);
        assert_eq!(list.child(0).and_then(CstNode::rule), Some(Rule::Statement));
        list = list.child(1).unwrap();
    }
    assert_eq!(list.rule(), Some(Rule::StatementList));
    assert!(list.children().is_empty());

    let list = statements(&cst);
    assert_eq!(list.len(), 3);
    assert!(list.iter().all(|s| s.rule() == Some(Rule::Statement)));

    assert_eq!(list[0].child(0).and_then(CstNode::rule), Some(Rule::VariableDeclaration));
    assert_eq!(list[1].child(0).and_then(CstNode::rule), Some(Rule::AssignmentStatement));
    assert_eq!(list[2].child(0).and_then(CstNode::rule), Some(Rule::PrintStatement));
}

#[test]
fn test_addition_nests_to_the_right() {
    let cst = parse_source_ok("{ a = 1 + 2 + 3 }$");
    let assignment = statements(&cst)[0].child(0).unwrap();
    // Assignment Statement: <Identifier> [=] <Expression>
    let expr = assignment.child(2).unwrap();
    let outer = expr.child(0).unwrap();
    assert_eq!(outer.rule(), Some(Rule::IntegerExpression));
    assert_eq!(outer.children().len(), 3);
    assert_eq!(outer.child(0).unwrap().name(), "1");
    assert_eq!(outer.child(1).unwrap().name(), "+");

    let inner = outer.child(2).unwrap().child(0).unwrap();
    assert_eq!(inner.rule(), Some(Rule::IntegerExpression));
    assert_eq!(inner.child(0).unwrap().name(), "2");
    let innermost = inner.child(2).unwrap().child(0).unwrap();
    assert_eq!(innermost.children().len(), 1);
    assert_eq!(innermost.child(0).unwrap().name(), "3");
}

#[test]
fn test_string_expression_keeps_every_character() {
    let cst = parse_source_ok("{ print(\"hi there\") }$");
    let print = statements(&cst)[0].child(0).unwrap();
    let string = print.child(2).unwrap().child(0).unwrap();
    assert_eq!(string.rule(), Some(Rule::StringExpression));

    let chars = string.child(1).unwrap();
    assert_eq!(chars.rule(), Some(Rule::CharList));
    assert!(chars.children().iter().all(CstNode::is_terminal));
    let text: String = chars.children().iter().map(CstNode::name).collect();
    assert_eq!(text, "hi there");
}

#[test]
fn test_if_and_while_conditions() {
    let cst = parse_source_ok("{ if (a == 1) { } while true { print(b) } }$");
    let list = statements(&cst);

    let if_stmt = list[0].child(0).unwrap();
    assert_eq!(if_stmt.rule(), Some(Rule::IfStatement));
    let condition = if_stmt.child(1).unwrap();
    assert_eq!(condition.rule(), Some(Rule::BooleanExpression));
    // ( Expr == Expr )
    assert_eq!(condition.children().len(), 5);
    assert_eq!(condition.child(2).unwrap().name(), "==");
    assert_eq!(if_stmt.child(2).unwrap().rule(), Some(Rule::Block));

    let while_stmt = list[1].child(0).unwrap();
    assert_eq!(while_stmt.rule(), Some(Rule::WhileStatement));
    assert_eq!(while_stmt.child(1).unwrap().child(0).unwrap().name(), "true");
}

#[test]
fn test_nested_blocks() {
    let cst = parse_source_ok("{ { { } } }$");
    let inner = statements(&cst)[0].child(0).unwrap();
    assert_eq!(inner.rule(), Some(Rule::Block));
    let innermost = inner.child(1).unwrap().child(0).unwrap().child(0).unwrap();
    assert_eq!(innermost.rule(), Some(Rule::Block));
}

#[test]
fn test_missing_end_marker_is_not_a_syntax_error() {
    let cst = parse_source_ok("{ }");
    assert_eq!(cst.children().len(), 1);
}

#[test]
fn test_lexical_warnings_are_skipped() {
    // 未闭合的注释只产生词法警告。
    parse_source_ok("{ } /* never closed");
}

#[test]
fn test_first_token_of_block() {
    let cst = parse_source_ok("\n  { }$");
    let open = cst.child(0).unwrap().first_token().unwrap();
    assert_eq!(open.lexeme, "{");
    assert_eq!((open.line(), open.column()), (2, 3));
}

// --- 失败路径测试 (Sad Path) ---

#[test]
fn test_missing_identifier_in_declaration() {
    let (errors, diagnostics) = parse_source_fail("{ int }$");
    assert_eq!(errors, 1);
    let diag = diagnostics.iter().next().unwrap();
    assert_eq!(diag.code(), "E0100");
    assert_eq!(diag.stage(), Stage::Syntax);
    assert_eq!(
        diag.message(),
        "Expected an identifier got [CLOSE_BLOCK] with value '}' on line 1"
    );
}

#[test]
fn test_missing_closing_paren() {
    let (errors, diagnostics) = parse_source_fail("{ print(a }$");
    assert_eq!(errors, 1);
    assert!(diagnostics.iter().next().unwrap().message().starts_with("Expected closing parenthesis ')'"));
}

#[test]
fn test_empty_expression_is_reported() {
    let (errors, diagnostics) = parse_source_fail("{ a = }$");
    assert_eq!(errors, 1);
    assert!(diagnostics.iter().next().unwrap().message().starts_with("Expected an expression got [CLOSE_BLOCK]"));
}

#[test]
fn test_condition_must_be_boolean_shaped() {
    let (errors, diagnostics) = parse_source_fail("{ if 1 { } }$");
    assert!(errors >= 1);
    assert!(diagnostics.iter().next().unwrap().message().starts_with("Expected a boolean expression got [NUMBER]"));
}

#[test]
fn test_missing_comparison_operator() {
    let (_, diagnostics) = parse_source_fail("{ if (a) { } }$");
    assert!(diagnostics.iter().next().unwrap().message().starts_with("Expected boolean operator (== or !=)"));
}

#[test]
fn test_missing_open_brace() {
    let (errors, diagnostics) = parse_source_fail("int a $");
    assert!(errors >= 1);
    let diag = diagnostics.iter().next().unwrap();
    assert!(diag.message().starts_with("Expected opening brace ({) got [TYPE]"));
    assert_eq!(diag.position().column, 1);
}

#[test]
fn test_error_count_matches_diagnostics() {
    let (errors, diagnostics) = parse_source_fail("{ int print( }$");
    assert_eq!(errors, diagnostics.errors(Stage::Syntax));
}
