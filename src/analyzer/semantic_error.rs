use crate::diagnostics::{codes::*, Diagnostic, Label};
use crate::types::DataType;
use crate::utils::{Position, Span};

/// 语义错误与警告。每个变体携带报告所需的位置与范围。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    UndeclaredVariable {
        name: String,
        position: Position,
        span: Span,
    },
    RedeclaredVariable {
        name: String,
        position: Position,
        span: Span,
        previous: Span,
    },
    TypeMismatch {
        name: String,
        declared: DataType,
        found: DataType,
        position: Position,
        span: Span,
    },
    NonBooleanCondition {
        statement: &'static str,
        found: DataType,
        position: Position,
        span: Span,
    },
    // --- 警告 ---
    UnusedVariable {
        name: String,
        position: Position,
        span: Span,
    },
    UninitializedVariable {
        name: String,
        position: Position,
        span: Span,
    },
}

impl SemanticError {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SemanticError::UnusedVariable { .. } | SemanticError::UninitializedVariable { .. }
        )
    }
}

impl From<SemanticError> for Diagnostic {
    fn from(error: SemanticError) -> Self {
        match error {
            SemanticError::UndeclaredVariable { name, position, span } => {
                let message = format!("Variable '{}' used before declaration", name);
                Diagnostic::new(
                    &E0200_UNDECLARED_VARIABLE,
                    position,
                    Label::new(span, format!("'{}' is not declared in this scope", name)),
                )
                .with_dynamic_message(message)
            }

            SemanticError::RedeclaredVariable {
                name,
                position,
                span,
                previous,
            } => Diagnostic::new(
                &E0201_REDECLARED_VARIABLE,
                position,
                Label::new(span, "declared again here"),
            )
            .with_dynamic_message(format!("Variable '{}' is already declared in this scope", name))
            .with_secondary_label(Label::new(previous, format!("'{}' first declared here", name))),

            SemanticError::TypeMismatch {
                name,
                declared,
                found,
                position,
                span,
            } => Diagnostic::new(
                &E0202_TYPE_MISMATCH,
                position,
                Label::new(span, format!("expected `{}`, found `{}`", declared, found)),
            )
            .with_dynamic_message(format!(
                "Type mismatch: cannot assign {} to variable '{}' of type {}",
                found, name, declared
            )),

            SemanticError::NonBooleanCondition {
                statement,
                found,
                position,
                span,
            } => Diagnostic::new(
                &E0203_NON_BOOLEAN_CONDITION,
                position,
                Label::new(span, format!("this condition has type `{}`", found)),
            )
            .with_dynamic_message(format!(
                "Condition in {} statement must be a boolean expression, found {}",
                statement, found
            )),

            SemanticError::UnusedVariable { name, position, span } => Diagnostic::new(
                &W0200_UNUSED_VARIABLE,
                position,
                Label::new(span, "declared here"),
            )
            .with_dynamic_message(format!("Variable '{}' is declared but never used", name)),

            SemanticError::UninitializedVariable { name, position, span } => Diagnostic::new(
                &W0201_UNINITIALIZED_VARIABLE,
                position,
                Label::new(span, "declared here"),
            )
            .with_dynamic_message(format!("Variable '{}' is used but never initialized", name))
            .with_note("uninitialized variables hold 0 at run time"),
        }
    }
}
