use std::fmt;
use std::ops::Range;

/// 代表源代码中的一个位置范围，包含起始和结束的字节索引。
/// Byte offsets are always relative to the whole source file, never to a
/// single program unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 合并两个 Span，得到从 `self` 开始到 `other` 结束的范围。
    pub fn to(self, other: Span) -> Self {
        Self::new(self.start, other.end.max(self.start))
    }

    pub fn shifted(self, origin: usize) -> Self {
        Self::new(self.start + origin, self.end + origin)
    }

    pub fn into_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// 1-based line/column pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// 行号索引：把字节偏移量换算成行列号。
#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Columns count characters, so a tab or a multi-byte character is one column.
    pub fn locate(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line_index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_index];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        Position::new(line_index + 1, column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_counts_lines_and_columns() {
        let map = SourceMap::new("{\n  int a\n}$");
        assert_eq!(map.locate(0), Position::new(1, 1));
        assert_eq!(map.locate(2), Position::new(2, 1));
        assert_eq!(map.locate(4), Position::new(2, 3));
        assert_eq!(map.locate(10), Position::new(3, 1));
        assert_eq!(map.locate(11), Position::new(3, 2));
    }

    #[test]
    fn locate_clamps_past_the_end() {
        let map = SourceMap::new("ab");
        assert_eq!(map.locate(99), Position::new(1, 3));
    }
}
