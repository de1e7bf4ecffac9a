pub mod analyzer;
pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod utils;

pub use driver::{compile, compile_file, Compilation, CompileOptions, CompileStats, DriverError};
