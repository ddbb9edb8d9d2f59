use std::ops::Range;
use std::path::{Path, PathBuf};

/// A resolved position range inside a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offsets into the file contents
    pub start: usize,
    pub end: usize,

    /// 1-based line of `start`
    pub line: usize,

    /// 0-based character column of `start`
    pub column: usize,

    /// 1-based line of `end`
    pub end_line: usize,

    /// 0-based character column of `end`
    pub end_column: usize,
}

impl Span {
    /// Resolve byte offsets against the file contents
    pub fn resolve(contents: &str, range: Range<usize>) -> Self {
        let start = clamp_to_boundary(contents, range.start);
        let end = clamp_to_boundary(contents, range.end.max(start));
        let (line, column) = line_column(contents, start);
        let (end_line, end_column) = line_column(contents, end);
        Self {
            start,
            end,
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn clamp_to_boundary(contents: &str, offset: usize) -> usize {
    let mut offset = offset.min(contents.len());
    while !contents.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn line_column(contents: &str, offset: usize) -> (usize, usize) {
    let before = &contents[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = contents[line_start..offset].chars().count();
    (line, column)
}

/// Where an incident was found, optionally chained to related locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path relative to the project root
    pub file: PathBuf,

    /// `None` for whole-file locations
    pub span: Option<Span>,

    /// Message shown next to a related location, e.g. "Previously defined here"
    pub message: Option<String>,

    pub secondary: Option<Box<Location>>,
}

impl Location {
    pub fn new(file: &Path, contents: &str, range: Range<usize>) -> Self {
        Self {
            file: file.to_path_buf(),
            span: Some(Span::resolve(contents, range)),
            message: None,
            secondary: None,
        }
    }

    pub fn file_only(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            span: None,
            message: None,
            secondary: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_secondary(mut self, secondary: Location) -> Self {
        self.secondary = Some(Box::new(secondary));
        self
    }

    /// 1-based line, or 0 for whole-file locations
    pub fn line(&self) -> usize {
        self.span.as_ref().map(|s| s.line).unwrap_or(0)
    }

    pub fn column(&self) -> usize {
        self.span.as_ref().map(|s| s.column).unwrap_or(0)
    }

    /// Path with forward slashes, as printed in reports
    pub fn display_path(&self) -> String {
        display_path(&self.file)
    }

    /// Iterate over the chain of related locations
    pub fn related(&self) -> impl Iterator<Item = &Location> {
        std::iter::successors(self.secondary.as_deref(), |l| l.secondary.as_deref())
    }
}

pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_resolves_lines_and_columns() {
        let text = "line one\n  line two\nthree";
        let start = text.find("line two").unwrap();
        let span = Span::resolve(text, start..start + 4);
        assert_eq!(span.line, 2);
        assert_eq!(span.column, 2);
        assert_eq!(span.end_line, 2);
        assert_eq!(span.end_column, 6);
    }

    #[test]
    fn test_span_clamps_out_of_range() {
        let span = Span::resolve("abc", 2..10);
        assert_eq!(span.start, 2);
        assert_eq!(span.end, 3);
    }

    #[test]
    fn test_related_chain() {
        let first = Location::file_only(Path::new("a.xml")).with_message("one");
        let second = Location::file_only(Path::new("b.xml")).with_secondary(first);
        let primary = Location::file_only(Path::new("c.xml")).with_secondary(second);
        let files: Vec<_> = primary.related().map(|l| l.display_path()).collect();
        assert_eq!(files, vec!["b.xml", "a.xml"]);
    }
}
