//! src/driver/mod.rs
//!
//! 编译驱动：把源文件切分为程序单元，逐个单元运行各阶段，并汇总统计信息。


use crate::analyzer::{self, SymbolTable};
use crate::ast::{self, AstNode};
use crate::codegen::{self, CodeGenOutcome};
use crate::diagnostics::{
    codes::W0001_MISSING_END_OF_PROGRAM, Diagnostic, DiagnosticBag, Label, Stage,
};
use crate::lexer::{token_diagnostic, Lexer, TokenKind};
use crate::parser::{self, CstNode};
use crate::utils::Span;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// 唯一的致命错误：源文件无法读取。
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read source file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// 在报告中保留 CST 与 AST，供打印树使用。
    pub keep_trees: bool,
}

/// 一个程序单元的编译结果。后续阶段被跳过时对应字段为 `None`。
#[derive(Debug, Clone)]
pub struct UnitReport {
    /// 从 1 开始编号。
    pub index: usize,
    /// 单元在整个文件中的字节范围（包括结尾的 `$`）。
    pub range: Range<usize>,
    pub diagnostics: DiagnosticBag,
    pub cst: Option<CstNode>,
    pub ast: Option<AstNode>,
    pub symbol_table: Option<SymbolTable>,
    pub code: Option<CodeGenOutcome>,
    /// 第一个报告错误的阶段。
    pub failed_stage: Option<Stage>,
}

impl UnitReport {
    fn new(index: usize, range: Range<usize>) -> Self {
        Self {
            index,
            range,
            diagnostics: DiagnosticBag::new(),
            cst: None,
            ast: None,
            symbol_table: None,
            code: None,
            failed_stage: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failed_stage.is_none() && self.code.is_some()
    }
}

/// 各阶段的错误/警告总数。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub programs: usize,
    pub lexer_errors: usize,
    pub lexer_warnings: usize,
    pub parser_errors: usize,
    pub semantic_errors: usize,
    pub semantic_warnings: usize,
    pub codegen_errors: usize,
}

impl CompileStats {
    fn record(&mut self, diagnostics: &DiagnosticBag) {
        self.lexer_errors += diagnostics.errors(Stage::Lexical);
        self.lexer_warnings += diagnostics.warnings(Stage::Lexical);
        self.parser_errors += diagnostics.errors(Stage::Syntax);
        self.semantic_errors += diagnostics.errors(Stage::Semantic);
        self.semantic_warnings += diagnostics.warnings(Stage::Semantic);
        self.codegen_errors += diagnostics.errors(Stage::CodeGen);
    }

    pub fn total_errors(&self) -> usize {
        self.lexer_errors + self.parser_errors + self.semantic_errors + self.codegen_errors
    }

    pub fn total_warnings(&self) -> usize {
        self.lexer_warnings + self.semantic_warnings
    }
}

impl fmt::Display for CompileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Summary")?;
        writeln!(f, "Programs compiled: {}", self.programs)?;
        writeln!(f, "Lexer:     {} error(s), {} warning(s)", self.lexer_errors, self.lexer_warnings)?;
        writeln!(f, "Parser:    {} error(s)", self.parser_errors)?;
        writeln!(f, "Semantic:  {} error(s), {} warning(s)", self.semantic_errors, self.semantic_warnings)?;
        writeln!(f, "Code gen:  {} error(s)", self.codegen_errors)?;
        write!(f, "Total:     {} error(s), {} warning(s)", self.total_errors(), self.total_warnings())
    }
}

/// 整个源文件的编译结果。
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    pub units: Vec<UnitReport>,
    /// 不属于任何程序单元的诊断，例如最后一个 `$` 之后未闭合的注释。
    pub trailing: DiagnosticBag,
    pub stats: CompileStats,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.stats.total_errors() > 0
    }
}

// --- 1. 切分程序单元 ---

/// 整个文件的一次词法扫描：找出每个单元的范围，并收集每个单元的词法诊断。
struct UnitSplit {
    units: Vec<(Range<usize>, Vec<Diagnostic>)>,
    trailing: Vec<Diagnostic>,
}

fn split_units(source: &str) -> UnitSplit {
    let mut units = Vec::new();
    let mut start = 0;
    let mut pending = Vec::new();
    let mut has_content = false;

    let mut lexer = Lexer::new(source);
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::EndOfProgram => {
                units.push((start..token.span.end, std::mem::take(&mut pending)));
                start = token.span.end;
                has_content = false;
            }
            TokenKind::EndOfInput => {
                if has_content {
                    pending.push(
                        Diagnostic::new(
                            &W0001_MISSING_END_OF_PROGRAM,
                            token.position,
                            Label::new(Span::new(source.len(), source.len()), "expected `$` here"),
                        )
                        .with_note("the end of the file was treated as the end of the program"),
                    );
                    units.push((start..source.len(), std::mem::take(&mut pending)));
                }
                break;
            }
            _ => {
                if let Some(diagnostic) = token_diagnostic(&token) {
                    pending.push(diagnostic);
                }
                has_content |= !token.is_warning();
            }
        }
    }
    debug!(target: "driver", units = units.len(), "split source into program units");

    UnitSplit {
        units,
        trailing: pending,
    }
}

// --- 2. 单个程序单元 ---

fn compile_unit(
    source: &str,
    index: usize,
    range: Range<usize>,
    lexical: Vec<Diagnostic>,
    options: &CompileOptions,
) -> UnitReport {
    info!(target: "driver", "Compiling program {}", index);
    let mut report = UnitReport::new(index, range.clone());
    lexical.into_iter().for_each(|d| report.diagnostics.report(d));

    if report.diagnostics.errors(Stage::Lexical) > 0 {
        warn!(target: "driver", "program {}: lexing failed, skipping parse", index);
        report.failed_stage = Some(Stage::Lexical);
        return report;
    }

    let parsed = parser::parse(Lexer::for_unit(source, range), &mut report.diagnostics);
    if !parsed.succeeded() {
        warn!(target: "driver", "program {}: parsing failed with {} error(s)", index, parsed.error_count);
        report.failed_stage = Some(Stage::Syntax);
        report.cst = options.keep_trees.then_some(parsed.cst);
        return report;
    }

    let tree = ast::build_ast(&parsed.cst);
    let analysis = analyzer::analyze(&tree, &mut report.diagnostics);
    if options.keep_trees {
        report.cst = Some(parsed.cst);
    }

    if !analysis.succeeded() {
        warn!(target: "driver", "program {}: semantic analysis failed, skipping code generation", index);
        report.failed_stage = Some(Stage::Semantic);
    } else {
        let code = codegen::generate(&tree, &mut report.diagnostics);
        if !code.succeeded() {
            report.failed_stage = Some(Stage::CodeGen);
        }
        report.code = Some(code);
    }

    report.symbol_table = Some(analysis.symbol_table);
    if options.keep_trees {
        report.ast = Some(tree);
    }
    report
}

// --- 3. 公共入口 ---

/// 编译一个源文件中的全部程序单元。每个单元独立编译，互不影响。
pub fn compile(source: &str, options: &CompileOptions) -> Compilation {
    let split = split_units(source);
    let mut compilation = Compilation::default();

    for (offset, (range, lexical)) in split.units.into_iter().enumerate() {
        let report = compile_unit(source, offset + 1, range, lexical, options);
        compilation.stats.programs += 1;
        compilation.stats.record(&report.diagnostics);
        compilation.units.push(report);
    }

    split.trailing.into_iter().for_each(|d| compilation.trailing.report(d));
    compilation.stats.record(&compilation.trailing);

    info!(
        target: "driver",
        programs = compilation.stats.programs,
        errors = compilation.stats.total_errors(),
        warnings = compilation.stats.total_warnings(),
        "compilation finished"
    );
    compilation
}

/// 读取并编译一个文件，返回源码与编译结果。
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<(String, Compilation), DriverError> {
    let source = std::fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let compilation = compile(&source, options);
    Ok((source, compilation))
}
