//! 递归下降解析器：每个非终结符一个解析函数，只向前看一个 Token。
//!
//! There is no error recovery. A mismatch is reported and counted, the
//! function returns whatever it has built so far, and the caller carries on
//! with the current token.

use super::cst::{CstNode, Rule};
use crate::diagnostics::{codes::E0100_SYNTAX_ERROR, Diagnostic, DiagnosticBag, Label};
use crate::lexer::{Lexer, Token, TokenKind};
use tracing::debug;

// --- 1. 主解析器结构体 ---

/// 解析器结构体，持有解析过程所需的全部状态。
pub struct Parser<'src, 'd> {
    lexer: Lexer<'src>,
    /// 当前待处理的 Token（唯一的前瞻）。
    current: Token,
    diagnostics: &'d mut DiagnosticBag,
    error_count: usize,
}

/// The CST together with the number of syntax errors found while building it.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub cst: CstNode,
    pub error_count: usize,
}

impl ParseOutcome {
    /// 只有没有任何语法错误时，后续阶段才会运行。
    pub fn succeeded(&self) -> bool {
        self.error_count == 0
    }
}

// --- 2. Trait 定义：用于组织解析逻辑 ---

/// `Parse` Trait 是解析器的总入口。
pub trait Parse {
    fn parse(self) -> ParseOutcome;
}

/// `StatementParser` Trait 负责程序、代码块与各类语句。
trait StatementParser {
    fn parse_program(&mut self) -> CstNode;
    fn parse_block(&mut self) -> CstNode;
    fn parse_statement_list(&mut self) -> CstNode;
    fn parse_statement(&mut self) -> CstNode;
    fn parse_print_statement(&mut self) -> CstNode;
    fn parse_variable_declaration(&mut self) -> CstNode;
    fn parse_assignment_statement(&mut self) -> CstNode;
    fn parse_if_statement(&mut self) -> CstNode;
    fn parse_while_statement(&mut self) -> CstNode;
}

/// `ExpressionParser` Trait 负责表达式。
trait ExpressionParser {
    fn parse_expression(&mut self) -> CstNode;
    fn parse_integer_expression(&mut self) -> CstNode;
    fn parse_string_expression(&mut self) -> CstNode;
    /// `true` / `false`
    fn parse_boolean_literal(&mut self) -> CstNode;
    /// `( Expr (==|!=) Expr )`
    fn parse_comparison(&mut self) -> CstNode;
    /// The condition of `if`/`while`: a boolean literal or a parenthesised comparison.
    fn parse_condition(&mut self, node: &mut CstNode);
    fn parse_identifier(&mut self) -> CstNode;
}

/// `Util` Trait 提供了解析过程中常用的一系列辅助函数。
trait Util {
    /// 检查当前 Token 是否是指定的类型。
    fn check(&self, kind: &TokenKind) -> bool;
    /// 消费当前 Token 并返回它。
    fn advance(&mut self) -> Token;
    /// 如果当前 Token 是指定类型，则把它作为终结符挂到 `node` 下；否则报告错误。
    fn expect(&mut self, node: &mut CstNode, kind: &TokenKind, expected: &str) -> bool;
    /// 记录一个语法错误并计数。
    fn report_error(&mut self, expected: &str);
}

// --- 3. 基础实现 ---

impl<'src, 'd> Parser<'src, 'd> {
    pub fn new(mut lexer: Lexer<'src>, diagnostics: &'d mut DiagnosticBag) -> Self {
        let current = next_significant(&mut lexer);
        Parser {
            lexer,
            current,
            diagnostics,
            error_count: 0,
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

/// Lexical warnings were already reported by the lexing pass; the grammar never sees them.
fn next_significant(lexer: &mut Lexer<'_>) -> Token {
    loop {
        let token = lexer.next_token();
        if !token.is_warning() {
            return token;
        }
    }
}

impl<'src, 'd> Parse for Parser<'src, 'd> {
    fn parse(mut self) -> ParseOutcome {
        debug!(target: "parser", "parse()");
        let cst = self.parse_program();
        if self.error_count == 0 {
            debug!(target: "parser", "parse completed successfully");
        } else {
            debug!(target: "parser", errors = self.error_count, "parse failed");
        }
        ParseOutcome {
            cst,
            error_count: self.error_count,
        }
    }
}

impl<'src, 'd> StatementParser for Parser<'src, 'd> {
    fn parse_program(&mut self) -> CstNode {
        debug!(target: "parser", "parse_program()");
        let mut node = CstNode::production(Rule::Program);
        node.push(self.parse_block());

        // 缺少 `$` 已由词法阶段作为警告报告，这里不再重复计为语法错误。
        if !self.check(&TokenKind::EndOfInput) {
            self.expect(&mut node, &TokenKind::EndOfProgram, "end of program marker ($)");
        }
        node
    }

    fn parse_block(&mut self) -> CstNode {
        debug!(target: "parser", "parse_block()");
        let mut node = CstNode::production(Rule::Block);
        if self.expect(&mut node, &TokenKind::OpenBlock, "opening brace ({)") {
            node.push(self.parse_statement_list());
            self.expect(&mut node, &TokenKind::CloseBlock, "closing brace (})");
        }
        node
    }

    /// `StatementList := Statement StatementList | ε`. The ε alternative is a
    /// list node without children.
    fn parse_statement_list(&mut self) -> CstNode {
        debug!(target: "parser", "parse_statement_list()");
        let mut node = CstNode::production(Rule::StatementList);
        if self.current.kind.starts_statement() {
            node.push(self.parse_statement());
            node.push(self.parse_statement_list());
        }
        node
    }

    fn parse_statement(&mut self) -> CstNode {
        debug!(target: "parser", "parse_statement()");
        let mut node = CstNode::production(Rule::Statement);
        let child = match self.current.kind {
            TokenKind::OpenBlock => self.parse_block(),
            TokenKind::Print => self.parse_print_statement(),
            TokenKind::Type(_) => self.parse_variable_declaration(),
            TokenKind::Identifier => self.parse_assignment_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            _ => {
                self.report_error("a statement");
                return node;
            }
        };
        node.push(child);
        node
    }

    fn parse_print_statement(&mut self) -> CstNode {
        debug!(target: "parser", "parse_print_statement()");
        let mut node = CstNode::production(Rule::PrintStatement);
        if self.expect(&mut node, &TokenKind::Print, "'print' keyword")
            && self.expect(&mut node, &TokenKind::LParen, "opening parenthesis '('")
        {
            node.push(self.parse_expression());
            self.expect(&mut node, &TokenKind::RParen, "closing parenthesis ')'");
        }
        node
    }

    fn parse_variable_declaration(&mut self) -> CstNode {
        debug!(target: "parser", "parse_variable_declaration()");
        let mut node = CstNode::production(Rule::VariableDeclaration);
        if matches!(self.current.kind, TokenKind::Type(_)) {
            node.push(CstNode::Terminal(self.advance()));
            node.push(self.parse_identifier());
        } else {
            self.report_error("a type (int, string, or boolean)");
        }
        node
    }

    fn parse_assignment_statement(&mut self) -> CstNode {
        debug!(target: "parser", "parse_assignment_statement()");
        let mut node = CstNode::production(Rule::AssignmentStatement);
        node.push(self.parse_identifier());
        if self.expect(&mut node, &TokenKind::Assign, "assignment operator (=)") {
            node.push(self.parse_expression());
        }
        node
    }

    fn parse_if_statement(&mut self) -> CstNode {
        debug!(target: "parser", "parse_if_statement()");
        let mut node = CstNode::production(Rule::IfStatement);
        if self.expect(&mut node, &TokenKind::If, "'if' keyword") {
            self.parse_condition(&mut node);
            node.push(self.parse_block());
        }
        node
    }

    fn parse_while_statement(&mut self) -> CstNode {
        debug!(target: "parser", "parse_while_statement()");
        let mut node = CstNode::production(Rule::WhileStatement);
        if self.expect(&mut node, &TokenKind::While, "'while' keyword") {
            self.parse_condition(&mut node);
            node.push(self.parse_block());
        }
        node
    }
}

impl<'src, 'd> ExpressionParser for Parser<'src, 'd> {
    fn parse_expression(&mut self) -> CstNode {
        debug!(target: "parser", "parse_expression()");
        let mut node = CstNode::production(Rule::Expression);
        let child = match self.current.kind {
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Number => self.parse_integer_expression(),
            TokenKind::Quote => self.parse_string_expression(),
            TokenKind::BoolVal(_) => self.parse_boolean_literal(),
            TokenKind::LParen => self.parse_comparison(),
            _ => {
                self.report_error("an expression");
                return node;
            }
        };
        node.push(child);
        node
    }

    /// `IntExpr := digits ('+' Expr)?`. The right operand nests, so chains
    /// associate to the right.
    fn parse_integer_expression(&mut self) -> CstNode {
        debug!(target: "parser", "parse_integer_expression()");
        let mut node = CstNode::production(Rule::IntegerExpression);
        if self.expect(&mut node, &TokenKind::Number, "a number") && self.check(&TokenKind::Plus) {
            node.push(CstNode::Terminal(self.advance()));
            node.push(self.parse_expression());
        }
        node
    }

    fn parse_string_expression(&mut self) -> CstNode {
        debug!(target: "parser", "parse_string_expression()");
        let mut node = CstNode::production(Rule::StringExpression);
        if !self.expect(&mut node, &TokenKind::Quote, "opening quote") {
            return node;
        }

        let mut chars = CstNode::production(Rule::CharList);
        while !self.check(&TokenKind::Quote) && !self.check(&TokenKind::EndOfProgram) {
            if matches!(self.current.kind, TokenKind::Char | TokenKind::Space) {
                chars.push(CstNode::Terminal(self.advance()));
            } else {
                self.report_error("a character or space in string");
                break;
            }
        }
        node.push(chars);

        self.expect(&mut node, &TokenKind::Quote, "closing quote");
        node
    }

    fn parse_boolean_literal(&mut self) -> CstNode {
        debug!(target: "parser", "parse_boolean_literal()");
        let mut node = CstNode::production(Rule::BooleanExpression);
        if matches!(self.current.kind, TokenKind::BoolVal(_)) {
            node.push(CstNode::Terminal(self.advance()));
        } else {
            self.report_error("a boolean value (true or false)");
        }
        node
    }

    fn parse_comparison(&mut self) -> CstNode {
        debug!(target: "parser", "parse_comparison()");
        let mut node = CstNode::production(Rule::BooleanExpression);
        if !self.expect(&mut node, &TokenKind::LParen, "opening parenthesis '('") {
            return node;
        }
        node.push(self.parse_expression());

        if matches!(self.current.kind, TokenKind::Equals | TokenKind::NotEquals) {
            node.push(CstNode::Terminal(self.advance()));
            node.push(self.parse_expression());
            self.expect(&mut node, &TokenKind::RParen, "closing parenthesis ')'");
        } else {
            self.report_error("boolean operator (== or !=)");
        }
        node
    }

    fn parse_condition(&mut self, node: &mut CstNode) {
        match self.current.kind {
            TokenKind::BoolVal(_) => node.push(self.parse_boolean_literal()),
            TokenKind::LParen => node.push(self.parse_comparison()),
            _ => self.report_error("a boolean expression"),
        }
    }

    fn parse_identifier(&mut self) -> CstNode {
        debug!(target: "parser", "parse_identifier()");
        let mut node = CstNode::production(Rule::Identifier);
        self.expect(&mut node, &TokenKind::Identifier, "an identifier");
        node
    }
}

impl<'src, 'd> Util for Parser<'src, 'd> {
    fn check(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    fn advance(&mut self) -> Token {
        let next = next_significant(&mut self.lexer);
        std::mem::replace(&mut self.current, next)
    }

    fn expect(&mut self, node: &mut CstNode, kind: &TokenKind, expected: &str) -> bool {
        if self.check(kind) {
            node.push(CstNode::Terminal(self.advance()));
            true
        } else {
            self.report_error(expected);
            false
        }
    }

    fn report_error(&mut self, expected: &str) {
        self.error_count += 1;
        let token = &self.current;
        let message = format!(
            "Expected {} got [{}] with value '{}' on line {}",
            expected,
            token.kind,
            token.lexeme.escape_debug(),
            token.line()
        );
        debug!(target: "parser", "{}", message);
        self.diagnostics.report(
            Diagnostic::new(
                &E0100_SYNTAX_ERROR,
                token.position,
                Label::new(token.span, format!("expected {} here", expected)),
            )
            .with_dynamic_message(message),
        );
    }
}
