use alloc::string::String;
use core::fmt;
use std::path::PathBuf;

// -----------------------------------------------------------------------------
// TextPosition

/// One-based line and column of a character in the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position of byte `offset` in `text`, counting columns in characters.
    pub fn of_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |index| index + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// -----------------------------------------------------------------------------
// Origin

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(PathBuf),
    Url(String),
    Named(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Url(url) | Origin::Named(url) => f.write_str(url),
        }
    }
}

impl From<&str> for Origin {
    #[inline]
    fn from(name: &str) -> Self {
        Origin::Named(name.into())
    }
}

impl From<String> for Origin {
    #[inline]
    fn from(name: String) -> Self {
        Origin::Named(name)
    }
}

impl From<PathBuf> for Origin {
    #[inline]
    fn from(path: PathBuf) -> Self {
        Origin::File(path)
    }
}

#[cfg(test)]
mod tests {
    use super::TextPosition;

    #[test]
    fn offsets_map_to_lines_and_columns() {
        let text = "<a>\n  <bé/>\n</a>";
        assert_eq!(TextPosition::of_offset(text, 0), TextPosition::new(1, 1));
        assert_eq!(TextPosition::of_offset(text, 6), TextPosition::new(2, 3));
        // Columns count characters, not bytes.
        let after = text.find("/>").unwrap();
        assert_eq!(TextPosition::of_offset(text, after), TextPosition::new(2, 6));
        assert_eq!(TextPosition::of_offset(text, 999).line, 3);
    }
}
