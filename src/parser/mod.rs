//! src/parser/mod.rs
//!
//! 语法分析阶段的公共接口：把 Token 流变成一棵具体语法树 (CST)。

pub mod cst;
mod parsers;

#[cfg(test)]
mod test;

pub use cst::{CstNode, Rule};
pub use parsers::{Parse, ParseOutcome, Parser};

use crate::diagnostics::DiagnosticBag;
use crate::lexer::Lexer;

/// Parses one program unit, reporting syntax errors into `diagnostics`.
pub fn parse(lexer: Lexer<'_>, diagnostics: &mut DiagnosticBag) -> ParseOutcome {
    Parser::new(lexer, diagnostics).parse()
}
