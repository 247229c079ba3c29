//! Multi-cursor command executor.
//!
//! A binding resolves to an ordered list of [`ActionId`]s. The executor runs
//! that list once per cursor:
//! * `dispatch_binding` snapshots the cursor ids, makes each live cursor the
//!   active one in turn and calls `execute_actions`, then resets to the
//!   primary cursor and merges cursors that collided.
//! * `execute_actions` runs the list for the active cursor. Read-only panes
//!   skip actions that mutate content; pane and session level actions run
//!   only for the primary cursor; the remaining actions are abandoned once
//!   the active cursor is gone.
//!
//! Action bodies live in the submodules, grouped by concern:
//! * `motion`  - cursor movement, selection and scrolling
//! * `edit`    - text mutation, clipboard and rune insertion
//! * `cursors` - spawning and removing cursors
//! * `pane`    - save/quit, tabs and splits, toggles, macros and the mouse
//! * `command` - command prompt execution (`set`, `bind`, `run` ...)

use core_keymap::ActionId;
use core_model::{MacroStep, SessionContext, View};
use tracing::{debug, trace};

pub(crate) mod command;
pub(crate) mod command_parser;
pub(crate) mod cursors;
pub(crate) mod edit;
pub(crate) mod motion;
pub(crate) mod pane;

pub use command::run_command;
pub use command_parser::{CommandParser, ParsedCommand};
pub use edit::{insert_rune, paste_text};

/// An action body: acts on the active cursor of `view`. The flag tells
/// whether the user triggered it (extension hooks fire only then). Returns
/// whether the viewport should be relocated afterwards.
pub type ActionFn = fn(&mut View, &mut SessionContext, bool) -> bool;

/// Implementation of `action`.
pub fn action_fn(action: ActionId) -> ActionFn {
    use ActionId::*;
    match action {
        CursorUp => motion::cursor_up,
        CursorDown => motion::cursor_down,
        CursorLeft => motion::cursor_left,
        CursorRight => motion::cursor_right,
        WordLeft => motion::word_left,
        WordRight => motion::word_right,
        StartOfLine => motion::start_of_line,
        EndOfLine => motion::end_of_line,
        CursorStart => motion::cursor_start,
        CursorEnd => motion::cursor_end,
        PageUp => motion::page_up,
        PageDown => motion::page_down,
        SelectUp => motion::select_up,
        SelectDown => motion::select_down,
        SelectLeft => motion::select_left,
        SelectRight => motion::select_right,
        SelectWordLeft => motion::select_word_left,
        SelectWordRight => motion::select_word_right,
        SelectToStartOfLine => motion::select_to_start_of_line,
        SelectToEndOfLine => motion::select_to_end_of_line,
        SelectToStart => motion::select_to_start,
        SelectToEnd => motion::select_to_end,
        SelectAll => motion::select_all,
        ScrollUp => motion::scroll_up,
        ScrollDown => motion::scroll_down,
        Center => motion::center,
        InsertNewline => edit::insert_newline,
        InsertTab => edit::insert_tab,
        Backspace => edit::backspace,
        Delete => edit::delete,
        Cut => edit::cut,
        CutLine => edit::cut_line,
        Copy => edit::copy,
        Paste => edit::paste,
        DuplicateLine => edit::duplicate_line,
        MoveLinesUp => edit::move_lines_up,
        MoveLinesDown => edit::move_lines_down,
        SpawnMultiCursorUp => cursors::spawn_up,
        SpawnMultiCursorDown => cursors::spawn_down,
        MouseMultiCursor => cursors::mouse_multi_cursor,
        RemoveMultiCursor => cursors::remove_multi_cursor,
        RemoveAllMultiCursors => cursors::remove_all_multi_cursors,
        ToggleMacro => pane::toggle_macro,
        PlayMacro => play_macro,
        Save => pane::save,
        Quit => pane::quit,
        QuitAll => pane::quit_all,
        AddTab => pane::add_tab,
        NextTab => pane::next_tab,
        PreviousTab => pane::previous_tab,
        VSplit => pane::vsplit,
        HSplit => pane::hsplit,
        NextSplit => pane::next_split,
        PreviousSplit => pane::previous_split,
        ToggleOverwriteMode => pane::toggle_overwrite,
        ToggleRuler => pane::toggle_ruler,
        ToggleHelp => pane::toggle_help,
        CommandMode => pane::command_mode,
        Escape => pane::escape,
        MousePress => pane::mouse_press,
    }
}

/// Run `actions` for the active cursor. Returns whether any of them asked
/// for the viewport to be relocated.
pub fn execute_actions(
    view: &mut View,
    ctx: &mut SessionContext,
    actions: &[ActionId],
    user: bool,
) -> bool {
    let active = view.state.cursors.active_id();
    let primary = view.state.cursors.is_primary_active();
    let mut relocate = false;
    for &action in actions {
        if !view.state.cursors.contains(active) || view.state.cursors.active_id() != active {
            debug!(target: "actions.dispatch", view = %view.id, action = action.name(), "active_cursor_gone");
            break;
        }
        if view.is_read_only() && action.mutates_content() {
            trace!(target: "actions.dispatch", view = %view.id, action = action.name(), "read_only_skip");
            continue;
        }
        if !action.per_cursor() && !primary {
            continue;
        }
        if primary {
            ctx.macros.record_action(action);
        }
        relocate |= run_action(view, ctx, action, user);
    }
    relocate
}

fn run_action(view: &mut View, ctx: &mut SessionContext, action: ActionId, user: bool) -> bool {
    let id = view.id;
    let name = action.name();
    if user && !ctx.call_hook(|host| host.pre_action(id, name)) {
        debug!(target: "actions.dispatch", view = %id, action = name, "canceled_by_extension");
        return false;
    }
    let relocate = action_fn(action)(view, ctx, user);
    if user {
        ctx.call_hook(|host| host.post_action(id, name));
    }
    trace!(
        target: "actions.dispatch",
        view = %id,
        action = name,
        cursor = ?view.state.cursors.active_id(),
        relocate,
        "action"
    );
    relocate
}

/// Run a bound action list once per cursor. Returns whether relocation was
/// requested by any run.
pub fn dispatch_binding(view: &mut View, ctx: &mut SessionContext, actions: &[ActionId]) -> bool {
    for_each_cursor(view, ctx, |view, ctx| execute_actions(view, ctx, actions, true))
}

/// Run `f` once per cursor that is still alive when its turn comes, with
/// that cursor active. Afterwards the primary cursor is active again and
/// colliding cursors are merged.
pub(crate) fn for_each_cursor<F>(view: &mut View, ctx: &mut SessionContext, mut f: F) -> bool
where
    F: FnMut(&mut View, &mut SessionContext) -> bool,
{
    let ids = view.state.cursors.ids();
    let mut relocate = false;
    for id in ids {
        if !view.state.cursors.set_active(id) {
            continue;
        }
        relocate |= f(view, ctx);
    }
    view.state.cursors.reset_to_primary();
    let merged = view.state.cursors.merge();
    if merged > 0 {
        trace!(target: "actions.dispatch", view = %view.id, merged, "cursors_merged");
    }
    relocate
}

/// Replay the recorded macro for the active cursor. Playback never records.
fn play_macro(view: &mut View, ctx: &mut SessionContext, _user: bool) -> bool {
    if ctx.macros.is_recording() || ctx.macros.is_playing() {
        return false;
    }
    let steps = ctx.macros.begin_playback();
    debug!(target: "actions.macro", view = %view.id, steps = steps.len(), "play");
    let mut relocate = false;
    for step in steps {
        match step {
            MacroStep::Action(action) => {
                relocate |= execute_actions(view, ctx, &[action], false);
            }
            MacroStep::InsertedRune(rune) => {
                edit::insert_rune(view, ctx, rune);
                relocate = true;
            }
        }
    }
    ctx.macros.end_playback();
    relocate
}
