//! Adding and removing cursors.

use core_model::{SessionContext, View};
use core_text::Loc;
use core_text::width::{char_pos_for_visual, visual_x};

/// Add a cursor one line above or below the newest cursor, at its sticky
/// visual column.
fn spawn(view: &mut View, down: bool) -> bool {
    let st = &mut view.state;
    let Some(last) = st.cursors.iter().last() else {
        return false;
    };
    let (loc, vx) = (last.loc, last.last_visual_x);
    let target = if down {
        (loc.line + 1 < st.num_lines()).then_some(loc.line + 1)
    } else {
        loc.line.checked_sub(1)
    };
    let Some(line) = target else {
        return false;
    };
    let col = char_pos_for_visual(&st.line(line), vx, st.tabsize());
    let id = st.cursors.add(Loc::new(line, col));
    if let Some(c) = st.cursors.iter_mut().find(|c| c.id() == id) {
        c.last_visual_x = vx;
    }
    true
}

pub(crate) fn spawn_up(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    spawn(view, false)
}

pub(crate) fn spawn_down(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    spawn(view, true)
}

/// Add a cursor where the mouse event being dispatched points.
pub(crate) fn mouse_multi_cursor(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let Some(ev) = view.mouse_event else {
        return false;
    };
    let loc = view.mouse_click_location(ev.x, ev.y);
    if view.state.cursors.iter().any(|c| c.loc == loc) {
        return false;
    }
    let vx = visual_x(&view.state.line(loc.line), loc.col, view.state.tabsize());
    let id = view.state.cursors.add(loc);
    if let Some(c) = view.state.cursors.iter_mut().find(|c| c.id() == id) {
        c.last_visual_x = vx;
    }
    false
}

pub(crate) fn remove_multi_cursor(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    view.state.cursors.remove_last();
    true
}

pub(crate) fn remove_all_multi_cursors(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    view.state.cursors.clear_secondary();
    view.state.cursor_mut().reset_selection();
    true
}
