//! 词法分析器。
//!
//! Outside of string literals the token shapes are matched by a `logos`
//! automaton; inside a string the lexer switches to a hand-rolled,
//! character-at-a-time sub-mode in which whitespace is significant.

mod token;

#[cfg(test)]
mod test;

pub use token::{LexicalError, LexicalWarning, Token, TokenKind};

use crate::diagnostics::{codes::*, Diagnostic, Label};
use crate::types::DataType;
use crate::utils::{SourceMap, Span};
use logos::Logos;
use std::ops::Range;
use tracing::debug;

// logos 解析时需要使用的错误类型
#[derive(Debug, Default, Clone, PartialEq)]
pub enum LexingError {
    #[default]
    InvalidToken,
}

/// Whether a `/*` comment found its `*/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentEnd {
    Closed,
    Unterminated,
}

/// 主模式下的原始词素。Keywords are not listed here: every run of letters is a
/// `Word` and is classified afterwards, so `printx` is one invalid identifier
/// rather than `print` followed by `x`.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(error = LexingError)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[token("{")]
    OpenBlock,
    #[token("}")]
    CloseBlock,
    #[token("$")]
    EndOfProgram,
    #[token("/*", block_comment)]
    Comment(CommentEnd),
    #[token("==")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("\"")]
    Quote,
    #[regex("[a-zA-Z]+")]
    Word,
    #[regex("[0-9][0-9a-zA-Z]*")]
    Digits,
}

/// Consumes a block comment body. Nesting is not supported: the first `*/` closes it.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> CommentEnd {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            CommentEnd::Closed
        }
        None => {
            lex.bump(lex.remainder().len());
            CommentEnd::Unterminated
        }
    }
}

fn classify_word(word: &str) -> TokenKind {
    match word {
        "print" => TokenKind::Print,
        "while" => TokenKind::While,
        "if" => TokenKind::If,
        "true" => TokenKind::BoolVal(true),
        "false" => TokenKind::BoolVal(false),
        _ => match DataType::lookup(word) {
            Some(ty) => TokenKind::Type(ty),
            None if word.len() == 1 && word.bytes().all(|b| b.is_ascii_lowercase()) => {
                TokenKind::Identifier
            }
            None => TokenKind::Error(LexicalError::InvalidIdentifier),
        },
    }
}

fn classify_digits(text: &str) -> TokenKind {
    if text.bytes().all(|b| b.is_ascii_digit()) {
        TokenKind::Number
    } else {
        TokenKind::Error(LexicalError::MalformedNumber)
    }
}

// --- 1. Lexer 定义 ---

/// 词法分析器，按需逐个产生 Token。
pub struct Lexer<'a> {
    raw: logos::Lexer<'a, RawToken>,
    /// Byte offset of the lexed slice within the whole file.
    origin: usize,
    source_map: SourceMap<'a>,
    /// Absolute offset of the opening quote while in string mode.
    string_start: Option<usize>,
}

impl<'a> Lexer<'a> {
    /// Lexes a whole source file.
    pub fn new(source: &'a str) -> Self {
        Self::for_unit(source, 0..source.len())
    }

    /// Lexes one program unit of `source`. Spans and positions stay relative to
    /// the whole file.
    pub fn for_unit(source: &'a str, range: Range<usize>) -> Self {
        let start = range.start;
        Lexer {
            raw: RawToken::lexer(&source[range]),
            origin: start,
            source_map: SourceMap::new(source),
            string_start: None,
        }
    }

    pub fn in_string(&self) -> bool {
        self.string_start.is_some()
    }

    /// 返回下一个 Token。Once the input is exhausted every call returns `EndOfInput`.
    pub fn next_token(&mut self) -> Token {
        let token = match self.string_start {
            Some(opened_at) => self.scan_string_char(opened_at),
            None => self.scan_token(),
        };
        debug!(target: "lexer", "{}", token);
        token
    }

    /// 消费 Lexer 并扫描所有 Token，直到（并包括）`EndOfInput`。
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::EndOfInput;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}

// --- 2. Token 扫描逻辑 ---

trait TokenScanner {
    /// 主模式：跳过空白与注释，识别下一个词素。
    fn scan_token(&mut self) -> Token;
    /// 字符串模式：每次只处理一个字符。
    fn scan_string_char(&mut self, opened_at: usize) -> Token;
    /// Absolute offset of the first unconsumed byte.
    fn cursor(&self) -> usize;
    fn make_token(&self, kind: TokenKind, span: Span) -> Token;
}

impl<'a> TokenScanner for Lexer<'a> {
    fn scan_token(&mut self) -> Token {
        loop {
            let Some(result) = self.raw.next() else {
                let end = self.cursor();
                return self.make_token(TokenKind::EndOfInput, Span::new(end, end));
            };
            let span = Span::from(self.raw.span()).shifted(self.origin);

            let kind = match result {
                Ok(RawToken::Comment(CommentEnd::Closed)) => continue,
                Ok(RawToken::Comment(CommentEnd::Unterminated)) => {
                    TokenKind::Warning(LexicalWarning::UnterminatedComment)
                }
                Ok(RawToken::Quote) => {
                    self.string_start = Some(span.start);
                    TokenKind::Quote
                }
                Ok(RawToken::Word) => classify_word(self.raw.slice()),
                Ok(RawToken::Digits) => classify_digits(self.raw.slice()),
                Ok(RawToken::OpenBlock) => TokenKind::OpenBlock,
                Ok(RawToken::CloseBlock) => TokenKind::CloseBlock,
                Ok(RawToken::EndOfProgram) => TokenKind::EndOfProgram,
                Ok(RawToken::Equals) => TokenKind::Equals,
                Ok(RawToken::NotEquals) => TokenKind::NotEquals,
                Ok(RawToken::Assign) => TokenKind::Assign,
                Ok(RawToken::Plus) => TokenKind::Plus,
                Ok(RawToken::LParen) => TokenKind::LParen,
                Ok(RawToken::RParen) => TokenKind::RParen,
                Err(LexingError::InvalidToken) => TokenKind::Error(LexicalError::UnrecognizedCharacter),
            };
            return self.make_token(kind, span);
        }
    }

    fn scan_string_char(&mut self, opened_at: usize) -> Token {
        let start = self.cursor();
        let Some(c) = self.raw.remainder().chars().next() else {
            return self.unterminated_string(opened_at, start);
        };

        let kind = match c {
            // 不消费终止符：`$` 与 `}` 仍需由主模式识别。
            '$' | '}' | '\n' | '\r' => return self.unterminated_string(opened_at, start),
            '"' => {
                self.string_start = None;
                TokenKind::Quote
            }
            'a'..='z' => TokenKind::Char,
            ' ' => TokenKind::Space,
            _ => TokenKind::Error(LexicalError::InvalidStringCharacter),
        };
        self.raw.bump(c.len_utf8());
        self.make_token(kind, Span::new(start, start + c.len_utf8()))
    }

    fn cursor(&self) -> usize {
        self.origin + self.raw.span().end
    }

    fn make_token(&self, kind: TokenKind, span: Span) -> Token {
        let lexeme = self.source_map_slice(span).unwrap_or_default().to_string();
        Token {
            kind,
            lexeme,
            span,
            position: self.source_map.locate(span.start),
        }
    }
}

impl<'a> Lexer<'a> {
    fn source_map_slice(&self, span: Span) -> Option<&'a str> {
        let source = self.raw.source();
        source.get(span.start - self.origin..span.end - self.origin)
    }

    /// Leaves string mode and reports where the string was opened. The token is
    /// positioned where the problem was found so positions never go backwards.
    fn unterminated_string(&mut self, opened_at: usize, here: usize) -> Token {
        self.string_start = None;
        let opened = self.source_map.locate(opened_at);
        Token {
            kind: TokenKind::Error(LexicalError::UnterminatedString { opened }),
            lexeme: self.source_map_slice(Span::new(opened_at, here)).unwrap_or_default().to_string(),
            span: Span::new(opened_at, here),
            position: self.source_map.locate(here),
        }
    }
}

/// Turns an ERROR or WARNING token into a diagnostic; other tokens yield `None`.
pub fn token_diagnostic(token: &Token) -> Option<Diagnostic> {
    let (code, label) = match &token.kind {
        TokenKind::Error(error) => {
            let code = match error {
                LexicalError::UnrecognizedCharacter => &E0000_UNRECOGNIZED_CHAR,
                LexicalError::InvalidIdentifier => &E0001_INVALID_IDENTIFIER,
                LexicalError::MalformedNumber => &E0002_MALFORMED_NUMBER,
                LexicalError::InvalidStringCharacter => &E0003_INVALID_STRING_CHAR,
                LexicalError::UnterminatedString { .. } => &E0004_UNTERMINATED_STRING,
            };
            (code, error.to_string())
        }
        TokenKind::Warning(warning) => (&W0000_UNTERMINATED_COMMENT, warning.to_string()),
        _ => return None,
    };
    let message = match &token.kind {
        TokenKind::Error(LexicalError::UnterminatedString { .. }) => label.clone(),
        _ => format!("{} '{}'", code.message, token.lexeme.escape_debug()),
    };
    Some(
        Diagnostic::new(code, token.position, Label::new(token.span, label))
            .with_dynamic_message(message),
    )
}
