#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_config::{ConfigStore, OptionValue};
use core_events::jobs::{JobCompletion, JobSpawner};
use core_events::term::TermSpawner;
use core_events::{Event, JOB_CHANNEL_CAP, KeyCode, KeyEvent, ModMask};
use core_keymap::Bindings;
use core_model::{EditorSession, SessionContext, View, ViewKind};
use core_plugin::NoopExtensionHost;
use core_text::{Buffer, Loc};
use tokio::sync::mpsc;

/// One-tab session over `text` with the ruler off so screen columns match
/// buffer columns.
pub fn session(text: &str) -> EditorSession {
    session_with(SessionContext::detached(ConfigStore::with_defaults()), text)
}

pub fn session_with(ctx: SessionContext, text: &str) -> EditorSession {
    let mut s = EditorSession::new(ctx, 80, 24);
    let mut view = s.create_view(Buffer::from_str("t", text), ViewKind::Default);
    view.state.settings.insert("ruler", OptionValue::Bool(false));
    view.update_gutter_width();
    s.add_tab(view);
    s
}

/// Context whose jobs report on the returned receiver.
pub fn live_context() -> (SessionContext, mpsc::Receiver<JobCompletion>) {
    let (job_tx, job_rx) = mpsc::channel(JOB_CHANNEL_CAP);
    let (update_tx, _) = mpsc::unbounded_channel();
    let (close_tx, _) = mpsc::unbounded_channel();
    let ctx = SessionContext::new(
        ConfigStore::with_defaults(),
        Bindings::defaults(),
        Box::new(NoopExtensionHost::new()),
        JobSpawner::new(job_tx),
        TermSpawner::new(update_tx, close_tx),
    );
    (ctx, job_rx)
}

pub fn view(s: &mut EditorSession) -> &mut View {
    s.cur_view_mut().expect("session has a current view")
}

pub fn locs(s: &EditorSession) -> Vec<Loc> {
    s.cur_view()
        .map(|v| v.state.cursors.iter().map(|c| c.loc).collect())
        .unwrap_or_default()
}

pub fn contents(s: &EditorSession) -> String {
    s.cur_view().map(|v| v.state.text.contents()).unwrap_or_default()
}

pub fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::plain(code))
}

pub fn ch(c: char) -> Event {
    key(KeyCode::Char(c))
}

pub fn ctrl(c: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(c), ModMask::CTRL))
}

pub fn alt(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, ModMask::ALT))
}

/// Feed `event` the way the loop does: prompt first, then the current pane,
/// then the queued structural requests.
pub fn feed(s: &mut EditorSession, event: Event) {
    if !core_actions::handle_prompt_event(s, &event)
        && let Some((view, ctx)) = s.parts()
    {
        core_actions::handle_event(view, &event, ctx);
    }
    s.apply_requests();
}

pub fn type_str(s: &mut EditorSession, text: &str) {
    for c in text.chars() {
        feed(s, ch(c));
    }
}
