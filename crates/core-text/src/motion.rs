//! Word motion helpers.
//!
//! These operate on a single line and char columns; line crossing is decided
//! by the caller, which knows about the surrounding buffer.

use unicode_segmentation::UnicodeSegmentation;

/// Alphanumeric or underscore.
pub fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Column after skipping whitespace and then one run of word characters.
/// Returns `None` when already at the end of the line.
pub fn next_word_end(line: &str, col: usize) -> Option<usize> {
    let chars: Vec<char> = line.chars().collect();
    if col >= chars.len() {
        return None;
    }
    let mut i = col;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i < chars.len() && !is_word_char(chars[i]) {
        return Some(i + 1);
    }
    while i < chars.len() && is_word_char(chars[i]) {
        i += 1;
    }
    Some(i)
}

/// Column of the start of the word before `col`. `None` at column zero.
pub fn prev_word_start(line: &str, col: usize) -> Option<usize> {
    if col == 0 {
        return None;
    }
    let chars: Vec<char> = line.chars().collect();
    let mut i = col.min(chars.len());
    while i > 0 && chars[i - 1].is_whitespace() {
        i -= 1;
    }
    if i > 0 && !is_word_char(chars[i - 1]) {
        return Some(i - 1);
    }
    while i > 0 && is_word_char(chars[i - 1]) {
        i -= 1;
    }
    Some(i)
}

/// Char range `[start, end)` of the Unicode word segment containing `col`.
///
/// Clicking past the end of a line selects the last segment; an empty line
/// yields an empty range.
pub fn word_bounds_at(line: &str, col: usize) -> (usize, usize) {
    let mut start_char = 0;
    let mut last = (0, 0);
    for segment in line.split_word_bounds() {
        let len = segment.chars().count();
        let end_char = start_char + len;
        if col < end_char {
            return (start_char, end_char);
        }
        last = (start_char, end_char);
        start_char = end_char;
    }
    last
}

/// Leading run of spaces and tabs.
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !(c == &' ' || c == &'\t'))
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_word_skips_space_then_word() {
        let line = "foo  bar.baz";
        assert_eq!(next_word_end(line, 0), Some(3));
        assert_eq!(next_word_end(line, 3), Some(8));
        assert_eq!(next_word_end(line, 8), Some(9));
        assert_eq!(next_word_end(line, 12), None);
    }

    #[test]
    fn prev_word_start_mirrors() {
        let line = "foo  bar.baz";
        assert_eq!(prev_word_start(line, 12), Some(9));
        assert_eq!(prev_word_start(line, 9), Some(8));
        assert_eq!(prev_word_start(line, 8), Some(5));
        assert_eq!(prev_word_start(line, 5), Some(0));
        assert_eq!(prev_word_start(line, 0), None);
    }

    #[test]
    fn word_bounds_use_unicode_segments() {
        let line = "let café = 1;";
        assert_eq!(word_bounds_at(line, 5), (4, 8));
        assert_eq!(word_bounds_at(line, 0), (0, 3));
        assert_eq!(word_bounds_at(line, 99), (12, 13));
        assert_eq!(word_bounds_at("", 3), (0, 0));
    }

    #[test]
    fn leading_whitespace_slice() {
        assert_eq!(leading_whitespace("\t  x y"), "\t  ");
        assert_eq!(leading_whitespace("   "), "   ");
        assert_eq!(leading_whitespace("x"), "");
    }
}
