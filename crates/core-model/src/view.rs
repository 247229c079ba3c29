//! A pane showing one buffer.

use core_events::term::{TermHandle, incomplete_utf8_tail};
use core_events::{MouseEvent, ViewId};
use core_state::BufferState;
use core_text::Loc;
use std::time::Instant;
use tracing::debug;

use crate::click::{ClickKind, ClickState};
use crate::gutter::{GutterKind, GutterMessages};
use crate::layout::LayoutRegion;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Default,
    Help,
    Log,
    Scratch,
    /// Inserts a description of every event it receives.
    Raw,
    /// Shows the output of an embedded terminal process.
    Term,
}

impl ViewKind {
    pub fn is_read_only(self) -> bool {
        matches!(self, ViewKind::Help | ViewKind::Log)
    }

    /// Kinds whose buffers are never saved or prompted for.
    pub fn is_scratch(self) -> bool {
        !matches!(self, ViewKind::Default)
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Default => "default",
            ViewKind::Help => "help",
            ViewKind::Log => "log",
            ViewKind::Scratch => "scratch",
            ViewKind::Raw => "raw",
            ViewKind::Term => "term",
        }
    }
}

#[derive(Debug)]
pub struct View {
    pub id: ViewId,
    pub kind: ViewKind,
    pub state: BufferState,
    pub viewport: Viewport,
    pub click: ClickState,
    pub gutter: GutterMessages,
    pub overwrite: bool,
    /// No button is held down; the next left press starts a new click.
    pub mouse_released: bool,
    /// Mouse event being dispatched to mouse actions.
    pub mouse_event: Option<MouseEvent>,
    pub term: Option<TermHandle>,
    /// Start of a UTF-8 sequence split across terminal output chunks.
    term_tail: Vec<u8>,
    region: LayoutRegion,
    tabbar: bool,
    statusline: bool,
}

impl View {
    /// Pane of `width` x `height` cells at the origin. The status line row
    /// is reserved when the buffer's `statusline` option is on.
    pub fn new(id: ViewId, state: BufferState, width: u16, height: u16) -> Self {
        let statusline = state.settings.get_bool("statusline");
        let mut view = Self {
            id,
            kind: ViewKind::Default,
            state,
            viewport: Viewport::default(),
            click: ClickState::new(),
            gutter: GutterMessages::default(),
            overwrite: false,
            mouse_released: true,
            mouse_event: None,
            term: None,
            term_tail: Vec::new(),
            region: LayoutRegion::new(0, 0, width, height),
            tabbar: false,
            statusline,
        };
        view.apply_geometry();
        view
    }

    pub fn with_kind(mut self, kind: ViewKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.kind.is_read_only()
    }

    pub fn region(&self) -> LayoutRegion {
        self.region
    }

    pub fn set_region(&mut self, region: LayoutRegion) {
        self.region = region;
        self.apply_geometry();
    }

    pub fn has_tabbar_row(&self) -> bool {
        self.tabbar && self.region.y == 0
    }

    pub fn has_statusline(&self) -> bool {
        self.statusline
    }

    /// Reserve or release the tab bar row. Only panes touching the top edge
    /// give up a row for it.
    pub fn toggle_tabbar(&mut self, show: bool) {
        if self.tabbar != show {
            self.tabbar = show;
            self.apply_geometry();
        }
    }

    pub fn toggle_statusline(&mut self, show: bool) {
        if self.statusline != show {
            self.statusline = show;
            self.apply_geometry();
        }
    }

    /// Screen row of the status line, when shown.
    pub fn statusline_row(&self) -> Option<u16> {
        self.statusline
            .then(|| self.viewport.y + self.viewport.height as u16)
    }

    fn apply_geometry(&mut self) {
        let top = u16::from(self.has_tabbar_row());
        let bottom = u16::from(self.statusline);
        self.viewport.x = self.region.x;
        self.viewport.y = self.region.y + top.min(self.region.height);
        self.viewport.width = self.region.width as usize;
        self.viewport.height = self.region.height.saturating_sub(top + bottom) as usize;
        self.update_gutter_width();
    }

    /// Recompute the gutter: line numbers, message markers, split divider.
    pub fn update_gutter_width(&mut self) {
        let mut offset = 0;
        if self.state.settings.get_bool("ruler") {
            offset += self.state.num_lines().to_string().len() + 1;
        }
        if !self.gutter.is_empty() {
            offset += 2;
        }
        if self.region.x != 0 {
            offset += 1;
        }
        self.viewport.line_num_offset = offset;
    }

    pub fn add_gutter_message(&mut self, section: &str, line: usize, text: impl Into<String>, kind: GutterKind) {
        if self.gutter.add(section, line, text, kind) {
            self.update_gutter_width();
        }
    }

    pub fn clear_gutter_messages(&mut self, section: &str) {
        self.gutter.clear(section);
        self.update_gutter_width();
    }

    pub fn relocate(&mut self) -> bool {
        self.update_gutter_width();
        self.viewport.relocate(&self.state)
    }

    pub fn relocate_twice(&mut self) -> bool {
        self.update_gutter_width();
        self.viewport.relocate_twice(&self.state)
    }

    pub fn center(&mut self) {
        self.viewport.center(&self.state);
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.viewport.scroll_up(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.viewport.scroll_down(n, self.state.num_lines());
    }

    pub fn bottomline(&self) -> usize {
        self.viewport.bottomline(&self.state)
    }

    pub fn visual_location(&self, loc: Loc) -> Option<(usize, usize)> {
        self.viewport.visual_location(&self.state, loc)
    }

    pub fn softwrap_location(&self, vx: usize, vy: usize) -> Loc {
        self.viewport.softwrap_location(&self.state, vx, vy)
    }

    pub fn mouse_click_location(&mut self, x: u16, y: u16) -> Loc {
        self.viewport.mouse_click_location(&self.state, x, y)
    }

    /// Whether screen cell (`x`, `y`) belongs to this pane.
    pub fn contains(&self, x: u16, y: u16) -> bool {
        self.region.contains(x, y)
    }

    /// Left button pressed at screen cell (`x`, `y`).
    pub fn mouse_press(&mut self, x: u16, y: u16, at: Instant) {
        let loc = self.mouse_click_location(x, y);
        self.state.cursors.clear_secondary();
        if self.click.continues_granular(at, loc) {
            self.state.goto(loc);
        } else {
            self.state.goto(loc);
            let c = self.state.cursor_mut();
            c.reset_selection();
            c.anchor = Some(loc);
        }
        self.click.press(loc);
        self.mouse_released = false;
    }

    /// Pointer moved with the left button held.
    pub fn mouse_drag(&mut self, x: u16, y: u16) {
        let loc = self.mouse_click_location(x, y);
        self.click.drag();
        if (self.click.was_double() || self.click.was_triple())
            && self.state.cursor().orig_selection.is_some()
        {
            self.state.extend_granular(loc, self.click.was_triple());
        } else {
            self.state.goto(loc);
            self.state.cursor_mut().extend_selection();
        }
    }

    /// All buttons released at screen cell (`x`, `y`).
    pub fn mouse_release(&mut self, x: u16, y: u16, at: Instant) -> ClickKind {
        let dragged = self.click.dragged();
        let loc = self.mouse_click_location(x, y);
        let kind = self.click.release(at, loc);
        match kind {
            ClickKind::Single if dragged => {
                self.state.goto(loc);
                self.state.cursor_mut().extend_selection();
            }
            ClickKind::Single => {
                self.state.goto(loc);
                self.state.cursor_mut().reset_selection();
            }
            ClickKind::Double => self.state.select_word_at(loc),
            ClickKind::Triple => self.state.select_line_at(loc.line),
        }
        self.mouse_released = true;
        debug!(target: "viewport", view = %self.id, ?kind, line = loc.line, col = loc.col, "click");
        kind
    }

    /// Append output of the embedded terminal and follow it. A multibyte
    /// character cut at the end of `bytes` is held until the rest arrives.
    pub fn apply_term_output(&mut self, bytes: &[u8]) {
        let mut pending = std::mem::take(&mut self.term_tail);
        pending.extend_from_slice(bytes);
        let keep = incomplete_utf8_tail(&pending);
        self.term_tail = pending.split_off(pending.len() - keep);
        self.append_output(&pending);
    }

    fn append_output(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(bytes);
        let text: String = text.chars().filter(|c| *c == '\n' || *c == '\t' || !c.is_control()).collect();
        let end = self.state.text.end();
        let end = self.state.insert(end, &text);
        self.state.goto(end);
        self.state.text.set_modified(false);
    }

    /// Drop the embedded terminal and turn the pane back into a plain one.
    pub fn close_terminal(&mut self) {
        let tail = std::mem::take(&mut self.term_tail);
        self.append_output(&tail);
        if self.term.take().is_some() {
            debug!(target: "term", view = %self.id, "terminal_closed");
        }
        self.kind = ViewKind::Default;
    }
}
