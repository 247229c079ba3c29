//! Viewport coordinate engine.
//!
//! Maps buffer locations to pane cells and back, with or without soft wrap.
//! Without soft wrap a buffer line is one visual row and tabs expand to tab
//! stops, scrolled horizontally by `left_col`. With soft wrap a line is cut
//! into rows of the usable width (pane width minus gutter); a tab advances by
//! a fixed `tabsize` cells there and `left_col` is pinned to zero.
//!
//! Visual coordinates (`vx`, `vy`) are relative to the pane's text area: `vy`
//! counts visual rows from `topline`, `vx` counts cells right of the gutter.

use core_config::clamp_scroll_margin;
use core_state::BufferState;
use core_text::width::{char_pos_for_visual, char_width, visual_x};
use core_text::Loc;
use tracing::trace;

/// Placement of a pane's text area and its scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Screen column of the pane's left edge (the gutter starts here).
    pub x: u16,
    /// Screen row of the first text row.
    pub y: u16,
    pub width: usize,
    /// Text rows; reserved rows are already excluded.
    pub height: usize,
    pub topline: usize,
    pub left_col: usize,
    /// Gutter cells left of the text: line numbers, message markers, divider.
    pub line_num_offset: usize,
}

/// Whether a character starting at `screen_x` moves to the next row.
fn wraps(ch: char, screen_x: usize, w: usize, usable: usize) -> bool {
    if ch == '\t' {
        screen_x >= usable
    } else {
        screen_x > 0 && screen_x + w > usable
    }
}

fn wrap_width(ch: char, tabsize: usize) -> usize {
    if ch == '\t' { tabsize } else { char_width(ch) }
}

/// Visual rows taken by `line` when wrapped at `usable` cells.
pub fn line_rows(line: &str, usable: usize, tabsize: usize) -> usize {
    let mut screen_x = 0;
    let mut rows = 1;
    for ch in line.chars() {
        let w = wrap_width(ch, tabsize);
        if wraps(ch, screen_x, w, usable) {
            screen_x = 0;
            rows += 1;
        }
        screen_x += w;
    }
    rows
}

/// Row within the line and cell of char column `col` under wrapping.
pub fn wrap_position(line: &str, col: usize, usable: usize, tabsize: usize) -> (usize, usize) {
    let mut screen_x = 0;
    let mut row = 0;
    for (i, ch) in line.chars().enumerate() {
        let w = wrap_width(ch, tabsize);
        if wraps(ch, screen_x, w, usable) {
            screen_x = 0;
            row += 1;
        }
        if i == col {
            return (row, screen_x);
        }
        screen_x += w;
    }
    (row, screen_x)
}

/// Char column under cell (`row`, `x`) of a wrapped line. Cells past the end
/// of a row resolve to the first column of the next row, or to the line
/// length on the last row. `None` when the line has fewer rows.
pub fn wrap_column(line: &str, row: usize, x: usize, usable: usize, tabsize: usize) -> Option<usize> {
    let mut screen_x = 0;
    let mut r = 0;
    let mut len = 0;
    for (i, ch) in line.chars().enumerate() {
        let w = wrap_width(ch, tabsize);
        if wraps(ch, screen_x, w, usable) {
            screen_x = 0;
            r += 1;
        }
        if r > row || (r == row && x < screen_x + w) {
            return Some(i);
        }
        screen_x += w;
        len = i + 1;
    }
    (r == row).then_some(len)
}

/// Row and cell of every char of `line` when wrapped at `usable` cells.
pub fn wrap_layout(line: &str, usable: usize, tabsize: usize) -> Vec<(usize, usize)> {
    let mut screen_x = 0;
    let mut row = 0;
    line.chars()
        .map(|ch| {
            let w = wrap_width(ch, tabsize);
            if wraps(ch, screen_x, w, usable) {
                screen_x = 0;
                row += 1;
            }
            let at = (row, screen_x);
            screen_x += w;
            at
        })
        .collect()
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Text cells per row right of the gutter (never zero).
    pub fn usable_width(&self) -> usize {
        self.width.saturating_sub(self.line_num_offset).max(1)
    }

    fn softwrap(st: &BufferState) -> bool {
        st.settings.get_bool("softwrap")
    }

    /// Visual rows line `n` occupies (1 without soft wrap or past the end).
    pub fn rows_for_line(&self, st: &BufferState, n: usize) -> usize {
        if !Self::softwrap(st) || n >= st.num_lines() {
            return 1;
        }
        line_rows(&st.line(n), self.usable_width(), st.tabsize())
    }

    /// One past the last buffer line that is at least partly visible.
    /// Lines past the end of the buffer count as one row each.
    pub fn bottomline(&self, st: &BufferState) -> usize {
        if !Self::softwrap(st) {
            return self.topline + self.height;
        }
        let mut rows = 0;
        let mut line = self.topline;
        while rows < self.height {
            rows += self.rows_for_line(st, line);
            line += 1;
        }
        line
    }

    /// Pane-relative cell of `loc`, or `None` when it is scrolled out of view.
    pub fn visual_location(&self, st: &BufferState, loc: Loc) -> Option<(usize, usize)> {
        if loc.line < self.topline {
            return None;
        }
        let line = st.line(loc.line);
        let (vx, vy) = if Self::softwrap(st) {
            let rows_above: usize = (self.topline..loc.line)
                .map(|n| self.rows_for_line(st, n))
                .sum();
            let (row, x) = wrap_position(&line, loc.col, self.usable_width(), st.tabsize());
            (x, rows_above + row)
        } else {
            let vx = visual_x(&line, loc.col, st.tabsize()).checked_sub(self.left_col)?;
            (vx, loc.line - self.topline)
        };
        (vy < self.height).then_some((vx, vy))
    }

    /// Buffer location under pane-relative cell (`vx`, `vy`). Cells past the
    /// end of a line resolve to its end; rows past the buffer resolve to the
    /// end of the last line.
    pub fn softwrap_location(&self, st: &BufferState, vx: usize, vy: usize) -> Loc {
        let last = st.num_lines() - 1;
        if !Self::softwrap(st) {
            let line = (self.topline + vy).min(last);
            let col = char_pos_for_visual(&st.line(line), vx + self.left_col, st.tabsize());
            return Loc::new(line, col);
        }
        let usable = self.usable_width();
        let tabsize = st.tabsize();
        let mut row_start = 0;
        for n in self.topline..=last {
            let text = st.line(n);
            let rows = line_rows(&text, usable, tabsize);
            if vy < row_start + rows {
                let col = wrap_column(&text, vy - row_start, vx, usable, tabsize)
                    .unwrap_or_else(|| text.chars().count());
                return Loc::new(n, col);
            }
            row_start += rows;
        }
        Loc::new(last, st.text.line_len(last))
    }

    /// Scroll so the active cursor sits outside the scroll margins. Returns
    /// whether `topline` or `left_col` changed.
    pub fn relocate(&mut self, st: &BufferState) -> bool {
        if self.height == 0 {
            return false;
        }
        let before = (self.topline, self.left_col);
        let n = st.num_lines();
        let cy = st.cursor().loc.line;
        let height = self.height;
        let m = clamp_scroll_margin(st.settings.get_usize("scrollmargin"), height);

        if cy < self.topline + m {
            self.topline = cy.saturating_sub(m);
        }
        if Self::softwrap(st) {
            let lowest = self.lowest_topline_showing(st, (cy + m).min(n - 1)).min(cy);
            if self.topline < lowest {
                self.topline = lowest;
            }
            self.left_col = 0;
        } else {
            if cy + m + 1 > self.topline + height && cy + m < n {
                self.topline = cy + m + 1 - height;
            } else if cy + m >= n && cy >= height {
                self.topline = n - height;
            }

            let usable = self.usable_width();
            let hm = st
                .settings
                .get_usize("hscrollmargin")
                .min(usable.saturating_sub(1) / 2);
            let cx = st.cursor_visual_x();
            if cx < self.left_col + hm {
                self.left_col = cx.saturating_sub(hm);
            }
            if cx + hm + 1 > self.left_col + usable {
                self.left_col = cx + hm + 1 - usable;
            }
        }

        let changed = before != (self.topline, self.left_col);
        if changed {
            trace!(target: "viewport", topline = self.topline, left_col = self.left_col, cursor_line = cy, "relocated");
        }
        changed
    }

    /// Smallest `topline` for which line `target` starts inside the pane,
    /// found by walking wrapped rows upward from `target`.
    fn lowest_topline_showing(&self, st: &BufferState, target: usize) -> usize {
        let mut rows = 0;
        let mut top = target;
        while top > 0 {
            let above = self.rows_for_line(st, top - 1);
            if rows + above >= self.height {
                break;
            }
            rows += above;
            top -= 1;
        }
        top
    }

    /// Relocate twice. Callers run this after edits, which may have changed
    /// both the cursor and the wrapped height of the lines around it.
    pub fn relocate_twice(&mut self, st: &BufferState) -> bool {
        let first = self.relocate(st);
        let second = self.relocate(st);
        first || second
    }

    /// Buffer location under screen cell (`x`, `y`). A click below the last
    /// text row scrolls down one line and lands on the last row.
    pub fn mouse_click_location(&mut self, st: &BufferState, x: u16, y: u16) -> Loc {
        let vx = (x as usize).saturating_sub(self.x as usize + self.line_num_offset);
        let mut vy = (y as usize).saturating_sub(self.y as usize);
        if self.height > 0 && vy > self.height - 1 {
            self.scroll_down(1, st.num_lines());
            vy = self.height - 1;
        }
        let loc = self.softwrap_location(st, vx, vy);
        let len = st.text.line_len(loc.line);
        Loc::new(loc.line, loc.col.min(len))
    }

    /// Scroll up `n` lines, or one line when `n` would pass the top.
    pub fn scroll_up(&mut self, n: usize) {
        if self.topline >= n {
            self.topline -= n;
        } else if self.topline > 0 {
            self.topline -= 1;
        }
    }

    /// Scroll down `n` lines, or one line when `n` would pass the end.
    pub fn scroll_down(&mut self, n: usize, num_lines: usize) {
        if self.topline + n <= num_lines {
            self.topline += n;
        } else if self.topline + 1 < num_lines {
            self.topline += 1;
        }
    }

    /// Put the cursor line in the middle of the pane.
    pub fn center(&mut self, st: &BufferState) {
        self.topline = st.cursor().loc.line.saturating_sub(self.height / 2);
    }

    /// Whether the active cursor line is inside the visible window.
    pub fn cursor_visible(&self, st: &BufferState) -> bool {
        let line = st.cursor().loc.line;
        line >= self.topline && line < self.bottomline(st)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{OptionValue, Settings, default_local};
    use core_text::Buffer;
    use proptest::prelude::*;

    fn state(text: &str, softwrap: bool) -> BufferState {
        let mut settings: Settings = default_local();
        settings.insert("softwrap", OptionValue::Bool(softwrap));
        BufferState::new(Buffer::from_str("t", text), settings)
    }

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn bottom_of_long_buffer_lands_on_last_page() {
        let mut st = state(&numbered(100), false);
        st.settings.insert("scrollmargin", OptionValue::Number(3));
        st.goto(Loc::new(99, 0));
        let mut vp = Viewport::new(80, 20);
        assert!(vp.relocate(&st));
        assert_eq!(vp.topline, 80);
        assert!(!vp.relocate(&st));
        assert!(vp.cursor_visible(&st));
    }

    #[test]
    fn scroll_margin_is_kept_moving_down_and_up() {
        let mut st = state(&numbered(100), false);
        st.settings.insert("scrollmargin", OptionValue::Number(3));
        let mut vp = Viewport::new(80, 20);
        st.goto(Loc::new(17, 0));
        assert!(vp.relocate(&st));
        assert_eq!(vp.topline, 1);
        st.goto(Loc::new(40, 0));
        vp.relocate(&st);
        assert_eq!(vp.topline, 24);
        st.goto(Loc::new(25, 0));
        vp.relocate(&st);
        assert_eq!(vp.topline, 22);
        st.goto(Loc::new(1, 0));
        vp.relocate(&st);
        assert_eq!(vp.topline, 0);
    }

    #[test]
    fn margin_is_clamped_for_small_panes() {
        let mut st = state(&numbered(50), false);
        st.settings.insert("scrollmargin", OptionValue::Number(10));
        let mut vp = Viewport::new(80, 3);
        st.goto(Loc::new(10, 0));
        vp.relocate(&st);
        assert_eq!(vp.topline, 8);
        assert!(vp.cursor_visible(&st));
    }

    #[test]
    fn horizontal_scroll_follows_cursor() {
        let mut st = state(&"x".repeat(200), false);
        let mut vp = Viewport::new(20, 5);
        st.goto(Loc::new(0, 50));
        assert!(vp.relocate(&st));
        assert_eq!(vp.left_col, 31);
        st.goto(Loc::new(0, 10));
        vp.relocate(&st);
        assert_eq!(vp.left_col, 10);
        st.settings.insert("hscrollmargin", OptionValue::Number(4));
        st.goto(Loc::new(0, 12));
        vp.relocate(&st);
        assert_eq!(vp.left_col, 8);
    }

    #[test]
    fn softwrap_pins_left_col() {
        let mut st = state("short", true);
        let mut vp = Viewport::new(10, 5);
        vp.left_col = 7;
        st.goto(Loc::new(0, 3));
        assert!(vp.relocate(&st));
        assert_eq!(vp.left_col, 0);
    }

    #[test]
    fn wrapped_lines_shrink_bottomline() {
        let st = state(&format!("{}\nb\nc\nd", "a".repeat(25)), true);
        let vp = Viewport::new(10, 4);
        // 25 cells at width 10 take three rows, so only one more line fits.
        assert_eq!(vp.rows_for_line(&st, 0), 3);
        assert_eq!(vp.bottomline(&st), 2);
        let unwrapped = state("a\nb", false);
        assert_eq!(vp.bottomline(&unwrapped), 4);
    }

    #[test]
    fn long_wrapped_line_above_the_cursor_scrolls_past_it() {
        let mut lines: Vec<String> = (0..36).map(|i| i.to_string()).collect();
        lines.push("aaa\ta\taaaa\taa\ta\taa".to_string());
        lines.push("end".to_string());
        let mut st = state(&lines.join("\n"), true);
        st.settings.insert("scrollmargin", OptionValue::Number(0));
        st.goto(Loc::new(37, 0));
        let mut vp = Viewport::new(3, 3);
        assert!(vp.rows_for_line(&st, 36) > 3);
        assert!(vp.relocate_twice(&st));
        assert_eq!(vp.topline, 37);
        assert!(!vp.relocate(&st));
        assert!(vp.cursor_visible(&st));
    }

    #[test]
    fn wrap_positions_and_tabs() {
        assert_eq!(wrap_position("abcdef", 5, 4, 4), (1, 1));
        assert_eq!(wrap_position("abcd", 4, 4, 4), (0, 4));
        // A tab wraps only once the row is full.
        assert_eq!(line_rows("abc\tX", 4, 4), 2);
        assert_eq!(wrap_position("abc\tX", 4, 4, 4), (1, 0));
        // Wide chars never straddle a row boundary.
        assert_eq!(wrap_position("abc漢", 3, 4, 4), (1, 0));
    }

    #[test]
    fn click_past_end_of_row_and_buffer() {
        let st = state("abcdefgh\nxy", true);
        let vp = Viewport::new(5, 10);
        assert_eq!(vp.softwrap_location(&st, 4, 0), Loc::new(0, 4));
        assert_eq!(vp.softwrap_location(&st, 9, 1), Loc::new(0, 8));
        assert_eq!(vp.softwrap_location(&st, 9, 2), Loc::new(1, 2));
        assert_eq!(vp.softwrap_location(&st, 0, 9), Loc::new(1, 2));
    }

    #[test]
    fn mouse_click_translates_gutter_and_scrolls_at_bottom() {
        let st = state(&numbered(30), false);
        let mut vp = Viewport::new(40, 10);
        vp.x = 5;
        vp.y = 1;
        vp.line_num_offset = 3;
        vp.topline = 4;
        assert_eq!(vp.mouse_click_location(&st, 10, 3), Loc::new(6, 2));
        // Inside the gutter clamps to column zero.
        assert_eq!(vp.mouse_click_location(&st, 6, 3), Loc::new(6, 0));
        // Past the line end clamps to the line length.
        assert_eq!(vp.mouse_click_location(&st, 39, 2), Loc::new(5, 6));
        // Below the last text row scrolls.
        assert_eq!(vp.mouse_click_location(&st, 8, 15), Loc::new(14, 0));
        assert_eq!(vp.topline, 5);
    }

    #[test]
    fn scroll_helpers() {
        let mut vp = Viewport::new(10, 5);
        vp.scroll_down(3, 10);
        assert_eq!(vp.topline, 3);
        vp.scroll_down(8, 10);
        assert_eq!(vp.topline, 4);
        vp.scroll_up(10);
        assert_eq!(vp.topline, 3);
        vp.scroll_up(3);
        assert_eq!(vp.topline, 0);
        vp.scroll_up(1);
        assert_eq!(vp.topline, 0);

        let mut st = state(&numbered(40), false);
        st.goto(Loc::new(20, 0));
        vp.center(&st);
        assert_eq!(vp.topline, 18);
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            prop_oneof![
                Just('a'),
                Just('Z'),
                Just(' '),
                Just('\t'),
                Just('漢'),
                Just('é'),
            ],
            0..40,
        )
        .prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn visual_and_softwrap_locations_are_inverse(
            lines in proptest::collection::vec(line_strategy(), 1..6),
            width in 3usize..30,
            softwrap in any::<bool>(),
            tabsize in 1usize..9,
        ) {
            let mut st = state(&lines.join("\n"), softwrap);
            st.settings.insert("tabsize", OptionValue::Number(tabsize as i64));
            let vp = Viewport::new(width, 10_000);
            for (n, line) in lines.iter().enumerate() {
                for col in 0..=line.chars().count() {
                    let loc = Loc::new(n, col);
                    let (vx, vy) = vp.visual_location(&st, loc).expect("visible");
                    prop_assert_eq!(vp.softwrap_location(&st, vx, vy), loc);
                }
            }
        }

        #[test]
        fn relocate_is_idempotent(
            n in 1usize..300,
            cursor in 0usize..300,
            height in 1usize..60,
            margin in 0i64..20,
            topline in 0usize..300,
        ) {
            let mut st = state(&numbered(n), false);
            st.settings.insert("scrollmargin", OptionValue::Number(margin));
            st.goto(Loc::new(cursor.min(n - 1), 0));
            let mut vp = Viewport::new(80, height);
            vp.topline = topline.min(n - 1);
            vp.relocate(&st);
            let settled = vp;
            prop_assert!(!vp.relocate(&st));
            prop_assert_eq!(vp, settled);
            prop_assert!(vp.cursor_visible(&st));
        }

        #[test]
        fn wrapped_relocate_settles_with_cursor_visible(
            lines in proptest::collection::vec(line_strategy(), 1..40),
            cursor in 0usize..40,
            width in 3usize..20,
            height in 1usize..12,
            margin in 0i64..6,
            topline in 0usize..40,
        ) {
            let n = lines.len();
            let mut st = state(&lines.join("\n"), true);
            st.settings.insert("scrollmargin", OptionValue::Number(margin));
            st.goto(Loc::new(cursor.min(n - 1), 0));
            let mut vp = Viewport::new(width, height);
            vp.topline = topline.min(n - 1);
            vp.relocate_twice(&st);
            let settled = vp;
            prop_assert!(!vp.relocate(&st));
            prop_assert_eq!(vp, settled);
            prop_assert!(vp.cursor_visible(&st));
        }
    }
}
