mod span;

pub use span::{Position, SourceMap, Span};
