//! Buffer state: text, its cursor set and the buffer-local settings.
//!
//! Every mutation goes through [`BufferState`] so that all cursors (not only
//! the active one) are shifted by edits made on behalf of any cursor. Motion
//! helpers act on the active cursor; the multi-cursor executor one layer up
//! switches the active cursor before each action.

use core_config::Settings;
use core_text::motion::{self, word_bounds_at};
use core_text::width::{char_pos_for_visual, visual_x};
use core_text::{Buffer, Loc};

pub mod cursor;

pub use cursor::{Cursor, CursorId, CursorSet, Selection};

#[derive(Debug, Clone)]
pub struct BufferState {
    pub text: Buffer,
    pub cursors: CursorSet,
    pub settings: Settings,
}

impl BufferState {
    pub fn new(text: Buffer, settings: Settings) -> Self {
        Self {
            text,
            cursors: CursorSet::new(),
            settings,
        }
    }

    pub fn num_lines(&self) -> usize {
        self.text.num_lines()
    }

    pub fn line(&self, n: usize) -> String {
        self.text.line(n)
    }

    pub fn modified(&self) -> bool {
        self.text.modified()
    }

    pub fn check_mod_time(&mut self) -> bool {
        self.text.check_mod_time()
    }

    pub fn tabsize(&self) -> usize {
        self.settings.tabsize()
    }

    pub fn cursor(&self) -> &Cursor {
        self.cursors.active()
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        self.cursors.active_mut()
    }

    /// Insert text; every cursor at or after `loc` moves with the text.
    pub fn insert(&mut self, loc: Loc, text: &str) -> Loc {
        let loc = self.text.clamp(loc);
        let end = self.text.insert(loc, text);
        self.cursors.shift_for_insert(loc, end);
        end
    }

    /// Remove `[start, end)`; cursors inside collapse onto `start`.
    pub fn remove(&mut self, start: Loc, end: Loc) -> String {
        let (start, end) = (self.text.clamp(start.min(end)), self.text.clamp(start.max(end)));
        let removed = self.text.remove(start, end);
        self.cursors.shift_for_remove(start, end);
        removed
    }

    pub fn replace(&mut self, start: Loc, end: Loc, text: &str) -> Loc {
        let start = start.min(end);
        self.remove(start, end);
        self.insert(start, text)
    }

    /// Visual column of the active cursor (tab stops expanded).
    pub fn cursor_visual_x(&self) -> usize {
        let loc = self.cursor().loc;
        visual_x(&self.text.line(loc.line), loc.col, self.tabsize())
    }

    fn store_visual_x(&mut self) {
        let vx = self.cursor_visual_x();
        self.cursor_mut().last_visual_x = vx;
    }

    /// Move the active cursor to `loc`, clamped, and refresh its sticky column.
    pub fn goto(&mut self, loc: Loc) {
        let loc = self.text.clamp(loc);
        self.cursor_mut().loc = loc;
        self.store_visual_x();
    }

    pub fn move_left(&mut self) {
        let loc = self.cursor().loc;
        let next = if loc.col > 0 {
            Loc::new(loc.line, loc.col - 1)
        } else if loc.line > 0 {
            Loc::new(loc.line - 1, self.text.line_len(loc.line - 1))
        } else {
            loc
        };
        self.goto(next);
    }

    pub fn move_right(&mut self) {
        let loc = self.cursor().loc;
        let next = if loc.col < self.text.line_len(loc.line) {
            Loc::new(loc.line, loc.col + 1)
        } else if loc.line + 1 < self.num_lines() {
            Loc::new(loc.line + 1, 0)
        } else {
            loc
        };
        self.goto(next);
    }

    /// Vertical motion by `delta` lines keeping the sticky visual column.
    pub fn move_vertical(&mut self, delta: isize) {
        let loc = self.cursor().loc;
        let last = self.num_lines() - 1;
        let line = if delta < 0 {
            loc.line.saturating_sub(delta.unsigned_abs())
        } else {
            (loc.line + delta as usize).min(last)
        };
        if line == loc.line {
            let col = if delta < 0 { 0 } else { self.text.line_len(line) };
            self.goto(Loc::new(line, col));
            return;
        }
        let vx = self.cursor().last_visual_x;
        let col = char_pos_for_visual(&self.text.line(line), vx, self.tabsize());
        self.cursor_mut().loc = Loc::new(line, col);
    }

    pub fn word_right(&mut self) {
        let loc = self.cursor().loc;
        match motion::next_word_end(&self.text.line(loc.line), loc.col) {
            Some(col) => self.goto(Loc::new(loc.line, col)),
            None => self.move_right(),
        }
    }

    pub fn word_left(&mut self) {
        let loc = self.cursor().loc;
        match motion::prev_word_start(&self.text.line(loc.line), loc.col) {
            Some(col) => self.goto(Loc::new(loc.line, col)),
            None => self.move_left(),
        }
    }

    /// Toggle between the first non-blank column and column zero.
    pub fn start_of_line(&mut self) {
        let loc = self.cursor().loc;
        let indent = motion::leading_whitespace(&self.text.line(loc.line))
            .chars()
            .count();
        let col = if loc.col == indent { 0 } else { indent };
        self.goto(Loc::new(loc.line, col));
    }

    pub fn end_of_line(&mut self) {
        let line = self.cursor().loc.line;
        self.goto(Loc::new(line, self.text.line_len(line)));
    }

    /// Select the word under `loc` and remember it as the drag origin.
    pub fn select_word_at(&mut self, loc: Loc) {
        let loc = self.text.clamp(loc);
        let (start, end) = word_bounds_at(&self.text.line(loc.line), loc.col);
        let (a, b) = (Loc::new(loc.line, start), Loc::new(loc.line, end));
        let c = self.cursor_mut();
        c.set_selection(a, b);
        c.orig_selection = Selection::between(a, b);
        self.store_visual_x();
    }

    /// Select the whole line (including its newline when one follows).
    pub fn select_line_at(&mut self, line: usize) {
        let (a, b) = self.line_span(line);
        let c = self.cursor_mut();
        c.set_selection(a, b);
        c.orig_selection = Selection::between(a, b);
        self.store_visual_x();
    }

    fn line_span(&self, line: usize) -> (Loc, Loc) {
        let line = line.min(self.num_lines() - 1);
        let end = if line + 1 < self.num_lines() {
            Loc::new(line + 1, 0)
        } else {
            Loc::new(line, self.text.line_len(line))
        };
        (Loc::new(line, 0), end)
    }

    /// Extend a double/triple click selection to cover `loc` at the same
    /// granularity (word or line).
    pub fn extend_granular(&mut self, loc: Loc, by_line: bool) {
        let loc = self.text.clamp(loc);
        let Some(orig) = self.cursor().orig_selection else {
            return;
        };
        let (a, b) = if by_line {
            self.line_span(loc.line)
        } else {
            let (s, e) = word_bounds_at(&self.text.line(loc.line), loc.col);
            (Loc::new(loc.line, s), Loc::new(loc.line, e))
        };
        let c = self.cursor_mut();
        if loc < orig.start {
            c.anchor = Some(orig.end);
            c.selection = Selection::between(a, orig.end);
            c.loc = a;
        } else {
            c.anchor = Some(orig.start);
            c.selection = Selection::between(orig.start, b.max(orig.end));
            c.loc = b.max(orig.end);
        }
        self.store_visual_x();
    }

    /// Text covered by the active cursor's selection.
    pub fn selected_text(&self) -> Option<String> {
        self.cursor()
            .selection
            .map(|sel| self.text.slice(sel.start, sel.end))
    }

    /// Delete the active selection, leaving the cursor at its start.
    pub fn delete_selection(&mut self) -> Option<String> {
        let sel = self.cursor().selection?;
        let removed = self.remove(sel.start, sel.end);
        let c = self.cursor_mut();
        c.loc = sel.start;
        c.reset_selection();
        self.store_visual_x();
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str) -> BufferState {
        BufferState::new(Buffer::from_str("t", text), core_config::default_local())
    }

    #[test]
    fn edits_shift_other_cursors() {
        let mut st = state("abc\ndef");
        let other = st.cursors.add(Loc::new(1, 1));
        st.insert(Loc::new(0, 0), "X\n");
        st.cursors.set_active(other);
        assert_eq!(st.cursor().loc, Loc::new(2, 1));
        st.remove(Loc::new(0, 0), Loc::new(1, 0));
        assert_eq!(st.cursor().loc, Loc::new(1, 1));
    }

    #[test]
    fn insert_at_cursor_moves_it_past_text() {
        let mut st = state("ab");
        st.goto(Loc::new(0, 1));
        st.insert(Loc::new(0, 1), "XY");
        assert_eq!(st.cursor().loc, Loc::new(0, 3));
        assert_eq!(st.line(0), "aXYb");
    }

    #[test]
    fn vertical_motion_keeps_sticky_column() {
        let mut st = state("abcdef\nab\nabcdef");
        st.goto(Loc::new(0, 5));
        st.move_vertical(1);
        assert_eq!(st.cursor().loc, Loc::new(1, 2));
        st.move_vertical(1);
        assert_eq!(st.cursor().loc, Loc::new(2, 5));
        st.move_vertical(5);
        assert_eq!(st.cursor().loc, Loc::new(2, 6));
    }

    #[test]
    fn left_right_cross_lines() {
        let mut st = state("ab\ncd");
        st.goto(Loc::new(1, 0));
        st.move_left();
        assert_eq!(st.cursor().loc, Loc::new(0, 2));
        st.move_right();
        assert_eq!(st.cursor().loc, Loc::new(1, 0));
    }

    #[test]
    fn word_and_line_selection() {
        let mut st = state("foo bar\nbaz");
        st.select_word_at(Loc::new(0, 5));
        assert_eq!(st.selected_text().as_deref(), Some("bar"));
        st.select_line_at(0);
        assert_eq!(st.selected_text().as_deref(), Some("foo bar\n"));
        st.select_line_at(1);
        assert_eq!(st.selected_text().as_deref(), Some("baz"));
    }

    #[test]
    fn granular_extension_by_word() {
        let mut st = state("one two three");
        st.select_word_at(Loc::new(0, 5));
        st.extend_granular(Loc::new(0, 9), false);
        assert_eq!(st.selected_text().as_deref(), Some("two three"));
        st.extend_granular(Loc::new(0, 1), false);
        assert_eq!(st.selected_text().as_deref(), Some("one two"));
    }

    #[test]
    fn delete_selection_returns_text() {
        let mut st = state("hello world");
        st.cursor_mut().set_selection(Loc::new(0, 5), Loc::new(0, 11));
        assert_eq!(st.delete_selection().as_deref(), Some(" world"));
        assert_eq!(st.cursor().loc, Loc::new(0, 5));
        assert!(!st.cursor().has_selection());
    }

    #[test]
    fn start_of_line_toggles_indent() {
        let mut st = state("    x");
        st.goto(Loc::new(0, 5));
        st.start_of_line();
        assert_eq!(st.cursor().loc.col, 4);
        st.start_of_line();
        assert_eq!(st.cursor().loc.col, 0);
    }
}
