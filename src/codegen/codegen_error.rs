use crate::diagnostics::{codes::*, Diagnostic, Label};
use crate::utils::{Position, Span};

/// 代码生成阶段的错误。`position`/`span` 指向引发问题的源代码结构。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeGenError {
    UndefinedVariable {
        name: String,
        position: Position,
        span: Span,
    },
    BranchOutOfRange {
        label: String,
        offset: isize,
        position: Position,
        span: Span,
    },
    UnresolvedLabel {
        label: String,
        position: Position,
        span: Span,
    },
    StringMemoryExhausted {
        literal: String,
        position: Position,
        span: Span,
    },
    IntegerOutOfRange {
        literal: String,
        position: Position,
        span: Span,
    },
    ExpressionTooDeep {
        position: Position,
        span: Span,
    },
}

impl From<CodeGenError> for Diagnostic {
    fn from(error: CodeGenError) -> Self {
        match error {
            CodeGenError::UndefinedVariable { name, position, span } => Diagnostic::new(
                &E0300_UNDEFINED_VARIABLE,
                position,
                Label::new(span, format!("no address was allocated for '{}'", name)),
            )
            .with_dynamic_message(format!("Undefined variable '{}'", name)),

            CodeGenError::BranchOutOfRange {
                label,
                offset,
                position,
                span,
            } => Diagnostic::new(
                &E0301_BRANCH_OUT_OF_RANGE,
                position,
                Label::new(span, "the body of this statement is too large"),
            )
            .with_dynamic_message(format!(
                "Branch offset to {} out of range: {} is not within [-128, 127]",
                label, offset
            )),

            CodeGenError::UnresolvedLabel { label, position, span } => Diagnostic::new(
                &E0302_UNRESOLVED_LABEL,
                position,
                Label::new(span, "branch generated for this statement"),
            )
            .with_dynamic_message(format!("Label {} was never defined", label)),

            CodeGenError::StringMemoryExhausted { literal, position, span } => Diagnostic::new(
                &E0303_STRING_MEMORY_EXHAUSTED,
                position,
                Label::new(span, "this literal does not fit"),
            )
            .with_dynamic_message(format!("No room left in string memory for {}", literal)),

            CodeGenError::IntegerOutOfRange { literal, position, span } => Diagnostic::new(
                &E0304_INTEGER_OUT_OF_RANGE,
                position,
                Label::new(span, "must be between 0 and 255"),
            )
            .with_dynamic_message(format!("Integer literal {} does not fit in one byte", literal)),

            CodeGenError::ExpressionTooDeep { position, span } => Diagnostic::new(
                &E0305_EXPRESSION_TOO_DEEP,
                position,
                Label::new(span, "too many pending operands here"),
            ),
        }
    }
}
