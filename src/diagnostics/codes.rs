// src/diagnostics/codes.rs

use crate::diagnostics::{DiagnosticLevel, Stage};

/// Represents a specific error code with its associated information.
/// This struct serves as the single source of truth for all compiler diagnostics.
#[derive(Debug, Clone)]
pub struct ErrorCode {
    pub code: &'static str,
    pub level: DiagnosticLevel,
    pub stage: Stage,
    pub message: &'static str,
    pub explanation: &'static str,
}

/*
E00xx / W00xx: 词法分析 (Lexical Analysis)

E01xx: 语法分析 (Parsing / Syntax)

E02xx / W02xx: 语义分析 (Semantic Analysis)

E03xx: 代码生成 (Code Generation)
*/

// --- E00xx: Lexical Analysis ---

pub const E0000_UNRECOGNIZED_CHAR: ErrorCode = ErrorCode {
    code: "E0000",
    level: DiagnosticLevel::Error,
    stage: Stage::Lexical,
    message: "Unrecognized character",
    explanation: "The lexer found a character that cannot start any token of the language.",
};

pub const E0001_INVALID_IDENTIFIER: ErrorCode = ErrorCode {
    code: "E0001",
    level: DiagnosticLevel::Error,
    stage: Stage::Lexical,
    message: "Invalid identifier",
    explanation: "Identifiers are a single lowercase letter. A run of letters must be exactly one of the \
                  keywords `print`, `while`, `if`, `int`, `string`, `boolean`, `true` or `false`.",
};

pub const E0002_MALFORMED_NUMBER: ErrorCode = ErrorCode {
    code: "E0002",
    level: DiagnosticLevel::Error,
    stage: Stage::Lexical,
    message: "Malformed number",
    explanation: "A digit sequence may not be immediately followed by a letter. Separate them with whitespace \
                  or an operator.",
};

pub const E0003_INVALID_STRING_CHAR: ErrorCode = ErrorCode {
    code: "E0003",
    level: DiagnosticLevel::Error,
    stage: Stage::Lexical,
    message: "Invalid character in string",
    explanation: "String literals may only contain lowercase letters and single spaces.",
};

pub const E0004_UNTERMINATED_STRING: ErrorCode = ErrorCode {
    code: "E0004",
    level: DiagnosticLevel::Error,
    stage: Stage::Lexical,
    message: "Unterminated string literal",
    explanation: "A string literal reached a newline, a closing brace, the end-of-program marker or the end \
                  of input before its closing quote.",
};

pub const W0000_UNTERMINATED_COMMENT: ErrorCode = ErrorCode {
    code: "W0000",
    level: DiagnosticLevel::Warning,
    stage: Stage::Lexical,
    message: "Unterminated comment",
    explanation: "A `/*` comment was never closed with `*/`; the rest of the input was treated as comment.",
};

pub const W0001_MISSING_END_OF_PROGRAM: ErrorCode = ErrorCode {
    code: "W0001",
    level: DiagnosticLevel::Warning,
    stage: Stage::Lexical,
    message: "Missing end-of-program marker",
    explanation: "Every program should end with `$`. The last program of the file was compiled as if the \
                  marker were present.",
};

// --- E01xx: Syntax Analysis (Parsing) ---

pub const E0100_SYNTAX_ERROR: ErrorCode = ErrorCode {
    code: "E0100",
    level: DiagnosticLevel::Error,
    stage: Stage::Syntax,
    message: "Syntax error",
    explanation: "The arrangement of tokens does not match the grammar. The parser does not resynchronise, so \
                  one mistake may produce several follow-up errors.",
};

// --- E02xx: Semantic Analysis ---

pub const E0200_UNDECLARED_VARIABLE: ErrorCode = ErrorCode {
    code: "E0200",
    level: DiagnosticLevel::Error,
    stage: Stage::Semantic,
    message: "Variable used before declaration",
    explanation: "No declaration of this variable is visible at the current or any enclosing scope depth.",
};

pub const E0201_REDECLARED_VARIABLE: ErrorCode = ErrorCode {
    code: "E0201",
    level: DiagnosticLevel::Error,
    stage: Stage::Semantic,
    message: "Variable is already declared in this scope",
    explanation: "A variable may be declared only once per scope depth.",
};

pub const E0202_TYPE_MISMATCH: ErrorCode = ErrorCode {
    code: "E0202",
    level: DiagnosticLevel::Error,
    stage: Stage::Semantic,
    message: "Type mismatch",
    explanation: "The value assigned to a variable must have the variable's declared type.",
};

pub const E0203_NON_BOOLEAN_CONDITION: ErrorCode = ErrorCode {
    code: "E0203",
    level: DiagnosticLevel::Error,
    stage: Stage::Semantic,
    message: "Condition is not a boolean expression",
    explanation: "The condition of an `if` or `while` statement must be of type `boolean`.",
};

pub const W0200_UNUSED_VARIABLE: ErrorCode = ErrorCode {
    code: "W0200",
    level: DiagnosticLevel::Warning,
    stage: Stage::Semantic,
    message: "Variable is declared but never used",
    explanation: "The variable is never read. Remove the declaration or use the variable.",
};

pub const W0201_UNINITIALIZED_VARIABLE: ErrorCode = ErrorCode {
    code: "W0201",
    level: DiagnosticLevel::Warning,
    stage: Stage::Semantic,
    message: "Variable is used but never initialized",
    explanation: "The variable is read but never assigned, so it holds whatever its memory cell contains.",
};

// --- E03xx: Code Generation ---

pub const E0300_UNDEFINED_VARIABLE: ErrorCode = ErrorCode {
    code: "E0300",
    level: DiagnosticLevel::Error,
    stage: Stage::CodeGen,
    message: "Reference to a variable without an address",
    explanation: "The code generator found a variable that was never declared, so no memory was allocated for it.",
};

pub const E0301_BRANCH_OUT_OF_RANGE: ErrorCode = ErrorCode {
    code: "E0301",
    level: DiagnosticLevel::Error,
    stage: Stage::CodeGen,
    message: "Branch offset out of range",
    explanation: "A relative branch reaches at most 128 instruction lines backward or 127 forward. The branch \
                  was left unpatched.",
};

pub const E0302_UNRESOLVED_LABEL: ErrorCode = ErrorCode {
    code: "E0302",
    level: DiagnosticLevel::Error,
    stage: Stage::CodeGen,
    message: "Unresolved branch label",
    explanation: "A branch refers to a label that was never defined. This indicates a bug in the code generator.",
};

pub const E0303_STRING_MEMORY_EXHAUSTED: ErrorCode = ErrorCode {
    code: "E0303",
    level: DiagnosticLevel::Error,
    stage: Stage::CodeGen,
    message: "String memory exhausted",
    explanation: "The string literals of this program do not fit in the string region of the 256-byte memory.",
};

pub const E0304_INTEGER_OUT_OF_RANGE: ErrorCode = ErrorCode {
    code: "E0304",
    level: DiagnosticLevel::Error,
    stage: Stage::CodeGen,
    message: "Integer literal does not fit in a byte",
    explanation: "The target machine is 8-bit; integer literals must be between 0 and 255.",
};

pub const E0305_EXPRESSION_TOO_DEEP: ErrorCode = ErrorCode {
    code: "E0305",
    level: DiagnosticLevel::Error,
    stage: Stage::CodeGen,
    message: "Expression nested too deeply",
    explanation: "Every pending operand of an addition or comparison needs its own scratch byte, and there are \
                  only a few of them.",
};
