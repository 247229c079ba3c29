//! Cursor motion, selection and scrolling actions.
//!
//! Plain motions drop the selection. A left/right motion with a selection
//! only collapses it onto the matching edge; up/down first jump to that edge.
//! `Select*` variants anchor at the current location (unless a selection is
//! already being extended) and grow the selection to the new location.

use core_model::{SessionContext, View};
use core_state::BufferState;
use core_text::Loc;

fn selection_edge(st: &mut BufferState, start: bool) -> bool {
    let Some(sel) = st.cursor().selection else {
        return false;
    };
    st.goto(if start { sel.start } else { sel.end });
    st.cursor_mut().reset_selection();
    true
}

fn plain(view: &mut View, f: impl FnOnce(&mut BufferState)) -> bool {
    view.state.cursor_mut().reset_selection();
    f(&mut view.state);
    true
}

fn select(view: &mut View, f: impl FnOnce(&mut BufferState)) -> bool {
    view.state.cursor_mut().begin_selection();
    f(&mut view.state);
    view.state.cursor_mut().extend_selection();
    true
}

fn page(view: &View) -> isize {
    view.viewport.height.max(1) as isize
}

pub(crate) fn cursor_up(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    selection_edge(&mut view.state, true);
    view.state.move_vertical(-1);
    true
}

pub(crate) fn cursor_down(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    selection_edge(&mut view.state, false);
    view.state.move_vertical(1);
    true
}

pub(crate) fn cursor_left(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    if !selection_edge(&mut view.state, true) {
        view.state.move_left();
    }
    true
}

pub(crate) fn cursor_right(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    if !selection_edge(&mut view.state, false) {
        view.state.move_right();
    }
    true
}

pub(crate) fn word_left(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    plain(view, BufferState::word_left)
}

pub(crate) fn word_right(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    plain(view, BufferState::word_right)
}

pub(crate) fn start_of_line(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    plain(view, BufferState::start_of_line)
}

pub(crate) fn end_of_line(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    plain(view, BufferState::end_of_line)
}

pub(crate) fn cursor_start(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    plain(view, |st| st.goto(Loc::origin()))
}

pub(crate) fn cursor_end(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    plain(view, |st| {
        let end = st.text.end();
        st.goto(end);
    })
}

pub(crate) fn page_up(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let n = page(view);
    plain(view, |st| st.move_vertical(-n))
}

pub(crate) fn page_down(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let n = page(view);
    plain(view, |st| st.move_vertical(n))
}

pub(crate) fn select_up(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, |st| st.move_vertical(-1))
}

pub(crate) fn select_down(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, |st| st.move_vertical(1))
}

pub(crate) fn select_left(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, BufferState::move_left)
}

pub(crate) fn select_right(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, BufferState::move_right)
}

pub(crate) fn select_word_left(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, BufferState::word_left)
}

pub(crate) fn select_word_right(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, BufferState::word_right)
}

pub(crate) fn select_to_start_of_line(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, |st| {
        let line = st.cursor().loc.line;
        st.goto(Loc::new(line, 0));
    })
}

pub(crate) fn select_to_end_of_line(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, BufferState::end_of_line)
}

pub(crate) fn select_to_start(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, |st| st.goto(Loc::origin()))
}

pub(crate) fn select_to_end(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    select(view, |st| {
        let end = st.text.end();
        st.goto(end);
    })
}

pub(crate) fn select_all(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let end = view.state.text.end();
    view.state.goto(end);
    view.state.cursor_mut().set_selection(Loc::origin(), end);
    true
}

// Scrolling moves the window, not the cursor, so it never asks for a
// relocation (that would snap the window back).
pub(crate) fn scroll_up(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let n = view.state.settings.get_usize("scrollspeed");
    view.scroll_up(n);
    false
}

pub(crate) fn scroll_down(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let n = view.state.settings.get_usize("scrollspeed");
    view.scroll_down(n);
    false
}

pub(crate) fn center(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    view.center();
    false
}
