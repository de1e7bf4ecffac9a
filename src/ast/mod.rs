//! src/ast/mod.rs
//!
//! 抽象语法树：去掉括号、花括号和包装产生式之后的精简树。

mod builder;


pub use builder::build_ast;

use crate::utils::{Position, Span};
use std::fmt;

/// AST 节点的语义标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstKind {
    Block,
    PrintStatement,
    VariableDeclaration,
    AssignmentStatement,
    IfStatement,
    WhileStatement,
    /// 声明中的类型名，`value` 是关键字本身。
    Type,
    Identifier,
    /// 字面量。字符串字面量的 `value` 保留两侧引号，例如 `"ab"`。
    Value,
    /// 一个子节点（字面量）或两个子节点（比较），比较运算符存放在 `value` 中。
    BooleanExpression,
    /// `digits + Expr`，左操作数是 `Value`，右操作数是任意表达式。
    Addition,
}

impl AstKind {
    pub fn label(self) -> &'static str {
        match self {
            AstKind::Block => "BLOCK",
            AstKind::PrintStatement => "Print_Statement",
            AstKind::VariableDeclaration => "Variable_Declaration",
            AstKind::AssignmentStatement => "Assignment_Statement",
            AstKind::IfStatement => "If_Statement",
            AstKind::WhileStatement => "While_Statement",
            AstKind::Type => "Type",
            AstKind::Identifier => "Identifier",
            AstKind::Value => "Value",
            AstKind::BooleanExpression => "Boolean_Expression",
            AstKind::Addition => "Addition",
        }
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    pub value: Option<String>,
    pub position: Position,
    pub span: Span,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: AstKind, position: Position, span: Span) -> Self {
        Self {
            kind,
            value: None,
            position,
            span,
            children: Vec::new(),
        }
    }

    pub fn leaf(kind: AstKind, value: impl Into<String>, position: Position, span: Span) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(kind, position, span)
        }
    }

    pub fn push(&mut self, child: AstNode) {
        self.children.push(child);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn child(&self, index: usize) -> Option<&AstNode> {
        self.children.get(index)
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{}<{}", "-".repeat(depth), self.kind)?;
        if let Some(value) = &self.value {
            write!(f, " {}", value)?;
        }
        writeln!(f, ">")?;
        self.children.iter().try_for_each(|child| child.write_tree(f, depth + 1))
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
