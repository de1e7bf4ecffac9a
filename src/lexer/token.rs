use crate::types::DataType;
use crate::utils::{Position, Span};
use std::fmt::{Display, Formatter, Result};

/// 主体 Token 定义，包含其种类、原始文本和在源代码中的位置。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.kind, TokenKind::Warning(_))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{} [ {} ] found at ({}:{})",
            self.kind.name(),
            self.lexeme,
            self.position.line,
            self.position.column
        )
    }
}

/// 语言中所有可能的词法单元。
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Print,
    While,
    If,
    Type(DataType),
    BoolVal(bool),

    // Operators
    Assign,
    Equals,
    NotEquals,
    Plus,

    // Symbols
    OpenBlock,
    CloseBlock,
    LParen,
    RParen,
    Quote,
    EndOfProgram,

    // Literals and identifiers
    Identifier,
    Number,
    Char,
    Space,

    // Diagnostics
    Warning(LexicalWarning),
    Error(LexicalError),

    EndOfInput,
}

impl TokenKind {
    /// Upper-case tag used in token dumps and syntax-error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Print => "PRINT",
            TokenKind::While => "WHILE",
            TokenKind::If => "IF",
            TokenKind::Type(_) => "TYPE",
            TokenKind::BoolVal(_) => "BOOLVAL",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Equals => "EQUALS",
            TokenKind::NotEquals => "NOT_EQUALS",
            TokenKind::Plus => "PLUS",
            TokenKind::OpenBlock => "OPEN_BLOCK",
            TokenKind::CloseBlock => "CLOSE_BLOCK",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Quote => "QUOTE",
            TokenKind::EndOfProgram => "END_OF_PROGRAM",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::Char => "CHAR",
            TokenKind::Space => "SPACE",
            TokenKind::Warning(_) => "WARNING",
            TokenKind::Error(_) => "ERROR",
            TokenKind::EndOfInput => "END_OF_INPUT",
        }
    }

    /// Whether this token may begin a `Statement`.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::OpenBlock
                | TokenKind::Print
                | TokenKind::Type(_)
                | TokenKind::Identifier
                | TokenKind::If
                | TokenKind::While
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

/// Why the lexer produced an ERROR token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalError {
    UnrecognizedCharacter,
    /// A run of letters that is neither a keyword nor a single lowercase letter.
    InvalidIdentifier,
    /// Digits immediately followed by a letter, e.g. `12ab`.
    MalformedNumber,
    /// A digit, uppercase letter or other symbol inside a string literal.
    InvalidStringCharacter,
    /// The string opened at `opened` hit a newline, `}`, `$` or the end of input.
    UnterminatedString { opened: Position },
}

impl Display for LexicalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LexicalError::UnrecognizedCharacter => f.write_str("unrecognized character"),
            LexicalError::InvalidIdentifier => f.write_str("invalid identifier"),
            LexicalError::MalformedNumber => f.write_str("a number may not be followed directly by a letter"),
            LexicalError::InvalidStringCharacter => {
                f.write_str("only lowercase letters and spaces are allowed in strings")
            }
            LexicalError::UnterminatedString { opened } => write!(
                f,
                "unterminated string starting at line {}, column {}",
                opened.line, opened.column
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalWarning {
    UnterminatedComment,
}

impl Display for LexicalWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LexicalWarning::UnterminatedComment => f.write_str("unterminated comment"),
        }
    }
}
