//! Pane, tab and session level actions. Structural changes are queued as
//! `SessionRequest`s for the loop to apply after the event.

use core_config::OptionValue;
use core_model::{SessionContext, SessionRequest, SplitDir, View, ViewKind};
use std::time::Instant;

pub(crate) fn toggle_macro(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    if ctx.macros.toggle() {
        ctx.messenger.info("Recording");
    } else {
        ctx.messenger.info("Stopped recording");
    }
    false
}

pub(crate) fn save(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.save(view);
    false
}

pub(crate) fn quit(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::CloseView(view.id));
    false
}

pub(crate) fn quit_all(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::QuitAll);
    false
}

pub(crate) fn add_tab(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::NewTab(None));
    false
}

pub(crate) fn next_tab(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::NextTab);
    false
}

pub(crate) fn previous_tab(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::PreviousTab);
    false
}

pub(crate) fn vsplit(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::Split {
        dir: SplitDir::Vertical,
        path: None,
    });
    false
}

pub(crate) fn hsplit(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::Split {
        dir: SplitDir::Horizontal,
        path: None,
    });
    false
}

pub(crate) fn next_split(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::NextSplit);
    false
}

pub(crate) fn previous_split(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.request(SessionRequest::PreviousSplit);
    false
}

pub(crate) fn toggle_overwrite(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    view.overwrite = !view.overwrite;
    false
}

pub(crate) fn toggle_ruler(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    let on = !view.state.settings.get_bool("ruler");
    view.state.settings.insert("ruler", OptionValue::Bool(on));
    view.update_gutter_width();
    ctx.messenger
        .info(if on { "Enabled ruler" } else { "Disabled ruler" });
    true
}

pub(crate) fn toggle_help(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    if view.kind == ViewKind::Help {
        ctx.request(SessionRequest::CloseView(view.id));
    } else {
        ctx.request(SessionRequest::OpenHelp);
    }
    false
}

pub(crate) fn command_mode(_: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    ctx.messenger.open_command("");
    false
}

/// Drop the selection and every secondary cursor, and clear the info bar.
pub(crate) fn escape(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    view.state.cursor_mut().reset_selection();
    view.state.cursors.clear_secondary();
    ctx.messenger.clear();
    false
}

/// Left button held: the first event of a gesture is a press, the rest
/// are drags until the release arrives.
pub(crate) fn mouse_press(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let Some(ev) = view.mouse_event else {
        return false;
    };
    if view.mouse_released {
        view.mouse_press(ev.x, ev.y, Instant::now());
    } else {
        view.mouse_drag(ev.x, ev.y);
    }
    false
}
