// src/analyzer/mod.rs
//
// 语义分析：作用域深度 + 符号表，声明、引用解析与类型检查。

mod semantic_error;
mod symbols;

#[cfg(test)]
mod test;

pub use semantic_error::SemanticError;
pub use symbols::{Symbol, SymbolTable};

use crate::ast::{AstKind, AstNode};
use crate::diagnostics::DiagnosticBag;
use crate::types::DataType;
use tracing::{debug, info};

/// 一个程序单元的分析结果。
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub symbol_table: SymbolTable,
    pub error_count: usize,
    pub warning_count: usize,
}

impl AnalysisOutcome {
    /// 警告不会阻止代码生成。
    pub fn succeeded(&self) -> bool {
        self.error_count == 0
    }
}

// --- Analyzer 结构体与实现 ---
pub struct Analyzer<'d> {
    symbol_table: SymbolTable,
    diagnostics: &'d mut DiagnosticBag,
    error_count: usize,
    warning_count: usize,
}

impl<'d> Analyzer<'d> {
    pub fn new(diagnostics: &'d mut DiagnosticBag) -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            diagnostics,
            error_count: 0,
            warning_count: 0,
        }
    }

    /// 主入口。根节点本身就是一个代码块；所有节点都会被访问，不会因错误提前终止。
    pub fn analyze(mut self, root: &AstNode) -> AnalysisOutcome {
        debug!(target: "semantic", "starting semantic analysis");
        self.analyze_block(root);
        self.report_unused_and_uninitialized();

        if self.error_count == 0 {
            info!(target: "semantic", warnings = self.warning_count, "analysis completed successfully");
        } else {
            info!(
                target: "semantic",
                errors = self.error_count,
                warnings = self.warning_count,
                "analysis completed with errors"
            );
        }

        AnalysisOutcome {
            symbol_table: self.symbol_table,
            error_count: self.error_count,
            warning_count: self.warning_count,
        }
    }

    fn report(&mut self, error: SemanticError) {
        if error.is_warning() {
            self.warning_count += 1;
        } else {
            self.error_count += 1;
        }
        debug!(target: "semantic", "{:?}", error);
        self.diagnostics.report(error.into());
    }

    // --- 1. 代码块与语句分发 ---

    fn analyze_block(&mut self, block: &AstNode) {
        self.symbol_table.enter_scope();
        debug!(target: "semantic", scope = self.symbol_table.current_scope(), "entering block");
        for child in &block.children {
            self.analyze_node(child);
        }
        self.symbol_table.exit_scope();
    }

    fn analyze_node(&mut self, node: &AstNode) {
        match node.kind {
            AstKind::Block => self.analyze_block(node),
            AstKind::VariableDeclaration => self.analyze_declaration(node),
            AstKind::AssignmentStatement => self.analyze_assignment(node),
            AstKind::PrintStatement => node.children.iter().for_each(|expr| self.mark_usage(expr)),
            AstKind::IfStatement => self.analyze_conditional(node, "if"),
            AstKind::WhileStatement => self.analyze_conditional(node, "while"),
            AstKind::Identifier => self.resolve_use(node),
            AstKind::Type | AstKind::Value | AstKind::BooleanExpression | AstKind::Addition => {}
        }
    }

    fn analyze_declaration(&mut self, node: &AstNode) {
        let (Some(type_node), Some(id)) = (node.child(0), node.child(1)) else {
            return;
        };
        let (Some(data_type), Some(name)) = (type_node.value().and_then(DataType::lookup), id.value()) else {
            return;
        };

        let scope = self.symbol_table.current_scope();
        let symbol = Symbol::new(name, data_type, scope, id.position, id.span);
        match self.symbol_table.add(symbol) {
            Ok(()) => debug!(target: "semantic", "added variable '{}' of type '{}' to scope {}", name, data_type, scope),
            Err(previous) => self.report(SemanticError::RedeclaredVariable {
                name: name.to_string(),
                position: id.position,
                span: id.span,
                previous,
            }),
        }
    }

    fn analyze_assignment(&mut self, node: &AstNode) {
        let (Some(id), Some(expr)) = (node.child(0), node.child(1)) else {
            return;
        };

        if let (AstKind::Identifier, Some(name)) = (id.kind, id.value()) {
            let found = self.expression_type(expr);
            match self.symbol_table.lookup_mut(name) {
                None => self.report(SemanticError::UndeclaredVariable {
                    name: name.to_string(),
                    position: id.position,
                    span: id.span,
                }),
                Some(symbol) => {
                    symbol.initialized = true;
                    let declared = symbol.data_type;
                    if let Some(found) = found.filter(|found| *found != declared) {
                        self.report(SemanticError::TypeMismatch {
                            name: name.to_string(),
                            declared,
                            found,
                            position: id.position,
                            span: expr.span,
                        });
                    }
                }
            }
        }

        self.mark_usage(expr);
    }

    /// `if`/`while`：先标记条件中的变量引用，再要求条件类型为 boolean，最后分析代码块。
    fn analyze_conditional(&mut self, node: &AstNode, statement: &'static str) {
        let Some(condition) = node.child(0) else {
            return;
        };
        self.mark_usage(condition);

        if let Some(found) = self.expression_type(condition).filter(|t| *t != DataType::Boolean) {
            self.report(SemanticError::NonBooleanCondition {
                statement,
                found,
                position: condition.position,
                span: condition.span,
            });
        }

        for child in node.children.iter().skip(1) {
            self.analyze_node(child);
        }
    }

    // --- 2. 表达式 ---

    /// 变量作为值被引用：必须已声明，命中后标记为已使用。
    fn resolve_use(&mut self, id: &AstNode) {
        let Some(name) = id.value() else {
            return;
        };
        match self.symbol_table.lookup_mut(name) {
            Some(symbol) => symbol.used = true,
            None => self.report(SemanticError::UndeclaredVariable {
                name: name.to_string(),
                position: id.position,
                span: id.span,
            }),
        }
    }

    fn mark_usage(&mut self, expr: &AstNode) {
        if expr.kind == AstKind::Identifier {
            self.resolve_use(expr);
        }
        for child in &expr.children {
            self.mark_usage(child);
        }
    }

    /// 浅层类型推断：返回第一个能确定类型的子表达式的类型。
    ///
    /// A comparison therefore reports the type of its left operand, not
    /// `boolean`. `None` means the type could not be determined.
    fn expression_type(&self, expr: &AstNode) -> Option<DataType> {
        match (expr.kind, expr.value()) {
            (AstKind::Identifier, Some(name)) => {
                return self.symbol_table.lookup(name).map(|symbol| symbol.data_type);
            }
            (AstKind::Value, Some(literal)) => {
                if literal == "true" || literal == "false" {
                    return Some(DataType::Boolean);
                }
                if literal.starts_with('"') {
                    return Some(DataType::String);
                }
                if literal.parse::<i32>().is_ok() {
                    return Some(DataType::Int);
                }
            }
            _ => {}
        }
        expr.children.iter().find_map(|child| self.expression_type(child))
    }

    // --- 3. 分析结束后的警告 ---

    fn report_unused_and_uninitialized(&mut self) {
        let warnings: Vec<SemanticError> = self
            .symbol_table
            .symbols()
            .into_iter()
            .filter_map(|symbol| {
                let (name, position, span) = (symbol.name.clone(), symbol.position, symbol.span);
                if !symbol.used {
                    Some(SemanticError::UnusedVariable { name, position, span })
                } else if !symbol.initialized {
                    Some(SemanticError::UninitializedVariable { name, position, span })
                } else {
                    None
                }
            })
            .collect();
        warnings.into_iter().for_each(|warning| self.report(warning));
    }
}

/// 便捷函数：分析一个程序单元的 AST。
pub fn analyze(root: &AstNode, diagnostics: &mut DiagnosticBag) -> AnalysisOutcome {
    Analyzer::new(diagnostics).analyze(root)
}
