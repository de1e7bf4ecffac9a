use super::{AstKind, AstNode};
use crate::lexer::Token;
use crate::parser::{CstNode, Rule};
use crate::utils::{Position, Span};
use tracing::debug;

/// Builds the AST for one program unit.
///
/// The CST is expected to come from a parse with zero errors, but every access
/// is guarded: a missing child simply drops that part of the output.
pub fn build_ast(program: &CstNode) -> AstNode {
    debug!(target: "ast", "building AST from CST");
    match program.child(0) {
        Some(block) => convert_block(block),
        None => AstNode::new(AstKind::Block, Position::default(), Span::default()),
    }
}

// --- 1. 位置辅助函数 ---

fn last_token(node: &CstNode) -> Option<&Token> {
    match node {
        CstNode::Terminal(token) => Some(token),
        CstNode::Production { children, .. } => children.iter().rev().find_map(last_token),
    }
}

/// 节点的位置取自它的第一个 Token，范围覆盖到最后一个 Token。
fn locate(node: &CstNode) -> (Position, Span) {
    match (node.first_token(), last_token(node)) {
        (Some(first), Some(last)) => (first.position, first.span.to(last.span)),
        _ => (Position::default(), Span::default()),
    }
}

fn token_leaf(kind: AstKind, token: &Token) -> AstNode {
    AstNode::leaf(kind, token.lexeme.clone(), token.position, token.span)
}

/// `<Identifier>` 产生式只有一个终结符子节点。
fn convert_identifier(node: &CstNode) -> Option<AstNode> {
    node.child(0)
        .and_then(CstNode::token)
        .map(|token| token_leaf(AstKind::Identifier, token))
}

// --- 2. 代码块与语句 ---

fn convert_block(block: &CstNode) -> AstNode {
    debug!(target: "ast", "converting Block");
    let (position, span) = locate(block);
    let mut node = AstNode::new(AstKind::Block, position, span);

    if let Some(list) = block.child(1) {
        convert_statement_list(list, &mut node);
    }
    node
}

/// 展开右递归的 `StatementList`，把每条语句依次挂到代码块下。
fn convert_statement_list(list: &CstNode, block: &mut AstNode) {
    if list.rule() != Some(Rule::StatementList) {
        return;
    }
    if let Some(converted) = list.child(0).and_then(|s| s.child(0)).and_then(convert_statement) {
        block.push(converted);
    }
    if let Some(rest) = list.child(1) {
        convert_statement_list(rest, block);
    }
}

fn convert_statement(statement: &CstNode) -> Option<AstNode> {
    let rule = statement.rule()?;
    debug!(target: "ast", "converting {}", rule.label());
    let converted = match rule {
        Rule::Block => convert_block(statement),
        Rule::PrintStatement => convert_print(statement),
        Rule::VariableDeclaration => convert_declaration(statement),
        Rule::AssignmentStatement => convert_assignment(statement),
        Rule::IfStatement => convert_conditional(AstKind::IfStatement, statement),
        Rule::WhileStatement => convert_conditional(AstKind::WhileStatement, statement),
        _ => return None,
    };
    Some(converted)
}

fn convert_print(statement: &CstNode) -> AstNode {
    let (position, span) = locate(statement);
    let mut node = AstNode::new(AstKind::PrintStatement, position, span);
    // print ( Expr )
    if let Some(expr) = statement.child(2).and_then(convert_expression) {
        node.push(expr);
    }
    node
}

fn convert_declaration(statement: &CstNode) -> AstNode {
    let (position, span) = locate(statement);
    let mut node = AstNode::new(AstKind::VariableDeclaration, position, span);
    if statement.children().len() >= 2 {
        if let Some(type_token) = statement.child(0).and_then(CstNode::token) {
            node.push(token_leaf(AstKind::Type, type_token));
        }
        if let Some(id) = statement.child(1).and_then(convert_identifier) {
            node.push(id);
        }
    }
    node
}

fn convert_assignment(statement: &CstNode) -> AstNode {
    let (position, span) = locate(statement);
    let mut node = AstNode::new(AstKind::AssignmentStatement, position, span);
    if statement.children().len() >= 3 {
        if let Some(id) = statement.child(0).and_then(convert_identifier) {
            node.push(id);
        }
        if let Some(expr) = statement.child(2).and_then(convert_expression) {
            node.push(expr);
        }
    }
    node
}

/// `if` 与 `while` 形状相同：关键字、条件、代码块。
fn convert_conditional(kind: AstKind, statement: &CstNode) -> AstNode {
    let (position, span) = locate(statement);
    let mut node = AstNode::new(kind, position, span);
    if let (Some(condition), Some(block)) = (statement.child(1), statement.child(2)) {
        node.push(convert_boolean(condition));
        node.push(convert_block(block));
    }
    node
}

// --- 3. 表达式 ---

/// `<Expression>` 本身是透明的，结果就是它唯一子节点的转换结果。
fn convert_expression(expr: &CstNode) -> Option<AstNode> {
    let inner = expr.child(0)?;
    match inner {
        CstNode::Terminal(token) => Some(token_leaf(AstKind::Value, token)),
        CstNode::Production { rule, .. } => match rule {
            Rule::Identifier => convert_identifier(inner),
            Rule::IntegerExpression => convert_integer(inner),
            Rule::StringExpression => Some(convert_string(inner)),
            Rule::BooleanExpression => Some(convert_boolean(inner)),
            _ => None,
        },
    }
}

fn convert_integer(expr: &CstNode) -> Option<AstNode> {
    let digits = token_leaf(AstKind::Value, expr.child(0)?.token()?);
    if expr.children().len() < 3 {
        return Some(digits);
    }

    let (position, span) = locate(expr);
    let mut addition = AstNode::new(AstKind::Addition, position, span);
    addition.push(digits);
    if let Some(right) = expr.child(2).and_then(convert_expression) {
        addition.push(right);
    }
    Some(addition)
}

fn convert_string(expr: &CstNode) -> AstNode {
    let (position, span) = locate(expr);
    let text: String = expr
        .child(1)
        .map(|chars| chars.children().iter().map(CstNode::name).collect())
        .unwrap_or_default();
    AstNode::leaf(AstKind::Value, format!("\"{}\"", text), position, span)
}

/// 五个子节点 `( Expr op Expr )` 是比较；否则是单个布尔字面量。
fn convert_boolean(expr: &CstNode) -> AstNode {
    let (position, span) = locate(expr);
    let mut node = AstNode::new(AstKind::BooleanExpression, position, span);

    if expr.children().len() >= 5 {
        node.value = expr.child(2).map(|op| op.name().to_string());
        for operand in [expr.child(1), expr.child(3)].into_iter().flatten() {
            if let Some(converted) = convert_expression(operand) {
                node.push(converted);
            }
        }
    } else if let Some(literal) = expr.child(0).and_then(CstNode::token) {
        node.push(token_leaf(AstKind::Value, literal));
    }
    node
}
