// src/analyzer/test.rs

use super::*;
use crate::ast::build_ast;
use crate::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticLevel, Stage};
use crate::lexer::Lexer;
use crate::parser;
use crate::utils::{Position, Span};

/// 通用的设置函数：词法与语法分析必须成功，然后进行语义分析。
fn analyze_source(src: &str) -> (AnalysisOutcome, Vec<Diagnostic>) {
    let mut diagnostics = DiagnosticBag::new();
    let parsed = parser::parse(Lexer::new(src), &mut diagnostics);
    assert!(parsed.succeeded(), "Test setup failed (parsing errors): {:?}", diagnostics);

    let ast = build_ast(&parsed.cst);
    let outcome = analyze(&ast, &mut diagnostics);
    (outcome, diagnostics.iter().cloned().collect())
}

/// 辅助函数：分析必须没有错误（允许警告）。
fn analyze_ok(src: &str) -> (AnalysisOutcome, Vec<Diagnostic>) {
    let (outcome, diagnostics) = analyze_source(src);
    assert!(outcome.succeeded(), "Analysis failed unexpectedly for {}: {:?}", src, diagnostics);
    (outcome, diagnostics)
}

fn error_codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics
        .iter()
        .filter(|d| d.level() == DiagnosticLevel::Error)
        .map(Diagnostic::code)
        .collect()
}

fn warning_codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics
        .iter()
        .filter(|d| d.level() == DiagnosticLevel::Warning)
        .map(Diagnostic::code)
        .collect()
}

mod symbol_table {
    use super::*;

    fn symbol(name: &str, scope: usize) -> Symbol {
        Symbol::new(name, DataType::Int, scope, Position::default(), Span::new(scope, scope + 1))
    }

    #[test]
    fn test_add_rejects_same_depth_only() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        assert!(table.add(symbol("a", 1)).is_ok());
        assert_eq!(table.add(symbol("a", 1)), Err(Span::new(1, 2)));

        table.enter_scope();
        assert!(table.add(symbol("a", 2)).is_ok());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lookup_prefers_innermost() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.add(symbol("a", 1)).unwrap();
        table.enter_scope();
        table.enter_scope();
        table.add(symbol("a", 3)).unwrap();

        assert_eq!(table.lookup("a").map(|s| s.scope), Some(3));
        table.exit_scope();
        assert_eq!(table.lookup("a").map(|s| s.scope), Some(1));
        assert!(table.lookup("b").is_none());
    }

    #[test]
    fn test_exit_scope_keeps_symbols_for_the_dump() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.enter_scope();
        table.add(symbol("x", 2)).unwrap();
        table.exit_scope();

        assert!(table.lookup("x").is_none());
        assert_eq!(table.symbols().len(), 1);
        assert!(!table.symbols()[0].is_live());
    }

    #[test]
    fn test_exit_scope_at_zero_is_a_no_op() {
        let mut table = SymbolTable::new();
        table.exit_scope();
        assert_eq!(table.current_scope(), 0);
    }

    #[test]
    fn test_display_is_sorted_by_scope_then_name() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.add(symbol("b", 1)).unwrap();
        table.add(symbol("a", 1)).unwrap();
        table.enter_scope();
        table.add(symbol("a", 2)).unwrap();

        let dump = table.to_string();
        let rows: Vec<&str> = dump.lines().skip(4).take(3).collect();
        assert_eq!(rows, vec!["a\tint\t1\t1", "b\tint\t1\t1", "a\tint\t2\t1"]);
    }
}

// --- 成功路径测试 ---

#[test]
fn test_declaration_assignment_and_print() {
    let (outcome, diagnostics) = analyze_ok("{ int a a = 5 print(a) }$");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let symbols = outcome.symbol_table.symbols();
    assert_eq!(symbols.len(), 1);
    let a = symbols[0];
    assert_eq!((a.name.as_str(), a.data_type, a.scope), ("a", DataType::Int, 1));
    assert!(a.initialized && a.used);
    assert_eq!(a.position, Position::new(1, 7));
}

#[test]
fn test_nested_block_sees_outer_variable() {
    let (outcome, diagnostics) = analyze_ok("{ string s { s = \"hi\" print(s) } }$");
    assert!(error_codes(&diagnostics).is_empty());
    assert!(warning_codes(&diagnostics).is_empty());
    assert_eq!(outcome.symbol_table.symbols()[0].scope, 1);
}

#[test]
fn test_shadowing_in_nested_block() {
    let (outcome, _) = analyze_ok("{ int a { string a a = \"x\" print(a) } a = 1 print(a) }$");
    let scopes: Vec<usize> = outcome.symbol_table.symbols().iter().map(|s| s.scope).collect();
    assert_eq!(scopes, vec![1, 2]);
}

#[test]
fn test_boolean_conditions() {
    let (_, diagnostics) = analyze_ok("{ boolean b b = true if (true == false) { print(b) } while (b == true) { b = false } }$");
    assert!(error_codes(&diagnostics).is_empty());
}

#[test]
fn test_addition_infers_int() {
    let (_, diagnostics) = analyze_ok("{ int a int b b = 1 a = 2 + b print(a) }$");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_redeclaration_after_sibling_block_exits() {
    let (_, diagnostics) = analyze_ok("{ { int a a = 1 print(a) } { int a a = 2 print(a) } }$");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

// --- 失败路径测试 ---

#[test]
fn test_string_assigned_to_int_is_exactly_one_mismatch() {
    let (outcome, diagnostics) = analyze_source("{int a a=\"x\"}$");
    assert_eq!(outcome.error_count, 1);
    assert_eq!(error_codes(&diagnostics), vec!["E0202"]);
    let mismatch = diagnostics.iter().find(|d| d.code() == "E0202").unwrap();
    assert_eq!(
        mismatch.message(),
        "Type mismatch: cannot assign string to variable 'a' of type int"
    );
    assert_eq!(mismatch.stage(), Stage::Semantic);
}

#[test]
fn test_undeclared_variable() {
    let (outcome, diagnostics) = analyze_source("{ print(a) }$");
    assert_eq!(outcome.error_count, 1);
    assert_eq!(error_codes(&diagnostics), vec!["E0200"]);
    assert_eq!(diagnostics[0].position(), Position::new(1, 9));
}

#[test]
fn test_undeclared_assignment_target() {
    let (_, diagnostics) = analyze_source("{ a = 1 }$");
    assert_eq!(error_codes(&diagnostics), vec!["E0200"]);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let (outcome, diagnostics) = analyze_source("{ int a string a }$");
    assert_eq!(outcome.error_count, 1);
    assert_eq!(error_codes(&diagnostics), vec!["E0201"]);
}

#[test]
fn test_variable_not_visible_after_its_block() {
    let (_, diagnostics) = analyze_source("{ { int a a = 1 } print(a) }$");
    assert_eq!(error_codes(&diagnostics), vec!["E0200"]);
}

#[test]
fn test_non_boolean_condition() {
    let (_, diagnostics) = analyze_source("{ int a a = 1 while (a == 2) { } }$");
    // 浅层推断：比较的类型取左操作数的类型。
    assert_eq!(error_codes(&diagnostics), vec!["E0203"]);
    let error = diagnostics.iter().find(|d| d.code() == "E0203").unwrap();
    assert!(error.message().starts_with("Condition in while statement"));
}

#[test]
fn test_analysis_continues_after_errors() {
    let (outcome, diagnostics) = analyze_source("{ print(x) int a a = \"s\" print(y) }$");
    assert_eq!(outcome.error_count, 3);
    assert_eq!(error_codes(&diagnostics), vec!["E0200", "E0202", "E0200"]);
}

// --- 警告 ---

#[test]
fn test_unused_variable_warning() {
    let (outcome, diagnostics) = analyze_ok("{ int a a = 1 }$");
    assert_eq!(outcome.warning_count, 1);
    assert_eq!(warning_codes(&diagnostics), vec!["W0200"]);
}

#[test]
fn test_used_but_uninitialized_warning() {
    let (outcome, diagnostics) = analyze_ok("{boolean b if (true==false) {print(b)}}$");
    assert_eq!(outcome.error_count, 0);
    assert_eq!(warning_codes(&diagnostics), vec!["W0201"]);
    let b = outcome.symbol_table.symbols()[0];
    assert!(b.used && !b.initialized);
}
