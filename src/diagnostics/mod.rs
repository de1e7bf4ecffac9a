pub mod codes;

use crate::utils::{Position, Span};
use ariadne::{Color, Label as AriadneLabel, Report, ReportKind, Source};
use codes::ErrorCode;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// The compiler stage that produced a diagnostic. Statistics are kept per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Lexical,
    Syntax,
    Semantic,
    CodeGen,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexical => "lexer",
            Stage::Syntax => "parser",
            Stage::Semantic => "semantic analysis",
            Stage::CodeGen => "code generation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

// --- Diagnostic ---

#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: &'static str,
    level: DiagnosticLevel,
    stage: Stage,
    message: String,
    /// 错误码表中的详细解释，渲染为 ariadne 的 help 行。
    explanation: &'static str,
    position: Position,
    labels: Vec<Label>,
    notes: Vec<String>,
}

impl Diagnostic {
    /// 主构造函数接收一个 ErrorCode 引用作为其核心输入。
    pub fn new(error_code: &'static ErrorCode, position: Position, primary_label: Label) -> Self {
        Self {
            code: error_code.code,
            level: error_code.level,
            stage: error_code.stage,
            message: error_code.message.to_string(),
            explanation: error_code.explanation,
            position,
            labels: vec![primary_label],
            notes: Vec::new(),
        }
    }

    /// 用于覆盖默认消息，以包含动态信息（如具体的类型名）。
    #[must_use]
    pub fn with_dynamic_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_secondary_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn code(&self) -> &str {
        self.code
    }

    pub fn level(&self) -> DiagnosticLevel {
        self.level
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn explanation(&self) -> &str {
        self.explanation
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
        };
        write!(
            f,
            "{} {}[{}] at line {}, column {}: {}",
            self.stage, level, self.code, self.position.line, self.position.column, self.message
        )
    }
}

// --- DiagnosticBag ---

/// 诊断背包：一个程序单元在所有阶段中报告的诊断信息。
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn count(&self, stage: Stage, level: DiagnosticLevel) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.stage == stage && d.level == level)
            .count()
    }

    pub fn errors(&self, stage: Stage) -> usize {
        self.count(stage, DiagnosticLevel::Error)
    }

    pub fn warnings(&self, stage: Stage) -> usize {
        self.count(stage, DiagnosticLevel::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Renders every diagnostic with ariadne against the whole source file.
    pub fn print(&self, file_name: &str, source: &str) -> io::Result<()> {
        print_all(file_name, source, &self.diagnostics)
    }
}

impl<'a> IntoIterator for &'a DiagnosticBag {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

// --- Printer ---

fn print_all(file_name: &str, source_code: &str, diagnostics: &[Diagnostic]) -> io::Result<()> {
    let cache = (file_name, Source::from(source_code));

    for diag in diagnostics {
        let Some((primary_label_info, secondary_labels)) = diag.labels.split_first() else {
            continue;
        };

        let (kind, color) = match diag.level {
            DiagnosticLevel::Error => (ReportKind::Error, Color::Red),
            DiagnosticLevel::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut report = Report::build(kind, (file_name, primary_label_info.span.into_range()))
            .with_message(&diag.message)
            .with_code(diag.code);

        report.add_label(
            AriadneLabel::new((file_name, primary_label_info.span.into_range()))
                .with_message(&primary_label_info.message)
                .with_color(color),
        );

        for label_info in secondary_labels {
            report.add_label(
                AriadneLabel::new((file_name, label_info.span.into_range()))
                    .with_message(&label_info.message)
                    .with_color(Color::Blue),
            );
        }

        for note in &diag.notes {
            report = report.with_note(note);
        }
        if !diag.explanation.is_empty() {
            report = report.with_help(diag.explanation);
        }

        report.finish().eprint(cache.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codes::*;

    fn diagnostic(code: &'static ErrorCode, span: Span) -> Diagnostic {
        Diagnostic::new(code, Position::default(), Label::new(span, code.message))
    }

    #[test]
    fn bag_counts_by_stage_and_level() {
        let mut bag = DiagnosticBag::new();
        bag.report(diagnostic(&E0000_UNRECOGNIZED_CHAR, Span::new(0, 1)));
        bag.report(diagnostic(&W0000_UNTERMINATED_COMMENT, Span::new(0, 2)));
        bag.report(diagnostic(&E0202_TYPE_MISMATCH, Span::new(3, 4)));

        assert_eq!(bag.errors(Stage::Lexical), 1);
        assert_eq!(bag.warnings(Stage::Lexical), 1);
        assert_eq!(bag.errors(Stage::Semantic), 1);
        assert_eq!(bag.errors(Stage::Syntax), 0);
        assert!(bag.has_errors());
    }

    #[test]
    fn display_names_stage_code_and_position() {
        let diag = Diagnostic::new(
            &E0201_REDECLARED_VARIABLE,
            Position::new(2, 7),
            Label::new(Span::new(5, 6), "again"),
        );
        assert_eq!(
            diag.to_string(),
            "semantic analysis error[E0201] at line 2, column 7: Variable is already declared in this scope"
        );
    }

    #[test]
    fn explanation_comes_from_the_error_code() {
        let diag = diagnostic(&E0301_BRANCH_OUT_OF_RANGE, Span::new(0, 1)).with_dynamic_message("too far");
        assert_eq!(diag.message(), "too far");
        assert_eq!(diag.explanation(), E0301_BRANCH_OUT_OF_RANGE.explanation);
        assert!(diag.explanation().contains("127 forward"));
    }
}
