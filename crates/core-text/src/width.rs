//! Display width helpers.
//!
//! Every width decision for rendering and coordinate mapping flows through
//! [`char_width`]. Zero-width characters are widened to one cell so every
//! buffer column owns at least one screen cell.

use unicode_width::UnicodeWidthChar;

/// Terminal cells occupied by a single non-tab character.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1).max(1)
}

/// Visual column of char column `col` in `line` with tabs expanded to tab stops.
pub fn visual_x(line: &str, col: usize, tabsize: usize) -> usize {
    let tabsize = tabsize.max(1);
    let mut x = 0;
    for ch in line.chars().take(col) {
        if ch == '\t' {
            x += tabsize - (x % tabsize);
        } else {
            x += char_width(ch);
        }
    }
    x
}

/// Width of a whole string with tab stops.
pub fn string_width(s: &str, tabsize: usize) -> usize {
    visual_x(s, usize::MAX, tabsize)
}

/// Inverse of [`visual_x`]: the char column whose cell span contains `vx`.
/// Visual columns past the end of the line map to the line length.
pub fn char_pos_for_visual(line: &str, vx: usize, tabsize: usize) -> usize {
    let tabsize = tabsize.max(1);
    let mut x = 0;
    for (i, ch) in line.chars().enumerate() {
        let w = if ch == '\t' {
            tabsize - (x % tabsize)
        } else {
            char_width(ch)
        };
        if vx < x + w {
            return i;
        }
        x += w;
    }
    line.chars().count()
}
