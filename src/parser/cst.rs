use crate::lexer::Token;
use std::fmt;

/// 文法产生式。Each variant is one nonterminal of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Program,
    Block,
    StatementList,
    Statement,
    PrintStatement,
    VariableDeclaration,
    AssignmentStatement,
    IfStatement,
    WhileStatement,
    Expression,
    IntegerExpression,
    StringExpression,
    CharList,
    BooleanExpression,
    Identifier,
}

impl Rule {
    pub fn label(self) -> &'static str {
        match self {
            Rule::Program => "Program",
            Rule::Block => "Block",
            Rule::StatementList => "Statement List",
            Rule::Statement => "Statement",
            Rule::PrintStatement => "Print Statement",
            Rule::VariableDeclaration => "Variable Declaration",
            Rule::AssignmentStatement => "Assignment Statement",
            Rule::IfStatement => "If Statement",
            Rule::WhileStatement => "While Statement",
            Rule::Expression => "Expression",
            Rule::IntegerExpression => "Integer Expression",
            Rule::StringExpression => "String Expression",
            Rule::CharList => "Char List",
            Rule::BooleanExpression => "Boolean Expression",
            Rule::Identifier => "Identifier",
        }
    }
}

/// 具体语法树节点。A node is a leaf exactly when it owns a token, so the two
/// shapes are separate variants.
#[derive(Debug, Clone, PartialEq)]
pub enum CstNode {
    Terminal(Token),
    Production { rule: Rule, children: Vec<CstNode> },
}

impl CstNode {
    pub fn production(rule: Rule) -> Self {
        CstNode::Production {
            rule,
            children: Vec::new(),
        }
    }

    /// Terminals are named after their lexeme, productions after their rule.
    pub fn name(&self) -> &str {
        match self {
            CstNode::Terminal(token) => &token.lexeme,
            CstNode::Production { rule, .. } => rule.label(),
        }
    }

    pub fn rule(&self) -> Option<Rule> {
        match self {
            CstNode::Production { rule, .. } => Some(*rule),
            CstNode::Terminal(_) => None,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            CstNode::Terminal(token) => Some(token),
            CstNode::Production { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CstNode::Terminal(_))
    }

    pub fn children(&self) -> &[CstNode] {
        match self {
            CstNode::Production { children, .. } => children,
            CstNode::Terminal(_) => &[],
        }
    }

    pub fn child(&self, index: usize) -> Option<&CstNode> {
        self.children().get(index)
    }

    /// Appends a child. Terminals cannot have children; pushing onto one is ignored.
    pub fn push(&mut self, child: CstNode) {
        if let CstNode::Production { children, .. } = self {
            children.push(child);
        }
    }

    /// The first token anywhere under this node, in source order.
    pub fn first_token(&self) -> Option<&Token> {
        match self {
            CstNode::Terminal(token) => Some(token),
            CstNode::Production { children, .. } => children.iter().find_map(CstNode::first_token),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "-".repeat(depth);
        match self {
            CstNode::Terminal(token) => writeln!(f, "{}[{}]", indent, token.lexeme),
            CstNode::Production { rule, children } => {
                writeln!(f, "{}<{}>", indent, rule.label())?;
                children.iter().try_for_each(|child| child.write_tree(f, depth + 1))
            }
        }
    }
}

/// 以缩进形式打印整棵树。
impl fmt::Display for CstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
