//! Per-pane event handling.
//!
//! `handle_event` is what the loop calls for an event aimed at a pane once
//! prompts and screen-level routing (tab bar, info bar, pane under the
//! pointer) have had their turn. Raw panes describe every event instead of
//! acting on it and terminal panes forward keystrokes to their process.

use core_events::{Event, KeyCode, KeyEvent, ModMask, MouseEvent};
use core_keymap::ActionList;
use core_model::{EditorSession, PromptOutcome, SessionContext, SessionRequest, View, ViewKind, display_name};
use std::time::Instant;
use tracing::{debug, trace};

use crate::dispatcher::{dispatch_binding, for_each_cursor, insert_rune, paste_text, run_command};

pub fn handle_event(view: &mut View, event: &Event, ctx: &mut SessionContext) {
    if view.kind == ViewKind::Raw {
        return describe_event(view, event, ctx);
    }
    if view.kind == ViewKind::Term && view.term.is_some() && forward_to_term(view, event, ctx) {
        return;
    }
    if view.state.check_mod_time() {
        let name = display_name(&view.state.text);
        ctx.messenger
            .error(format!("{name} has changed on disk since it was opened"));
    }
    let relocate = match event {
        Event::Key(key) => handle_key(view, key, ctx),
        Event::Raw(esc) => match ctx.bindings.lookup_raw(esc).map(ActionList::from_slice) {
            Some(actions) => dispatch_binding(view, ctx, &actions),
            None => false,
        },
        Event::Paste(text) => handle_paste(view, text, ctx),
        Event::Mouse(mouse) => handle_mouse(view, mouse, ctx),
        Event::Resize(..) => false,
    };
    if relocate {
        view.relocate_twice();
    }
}

fn handle_key(view: &mut View, key: &KeyEvent, ctx: &mut SessionContext) -> bool {
    if let Some(actions) = ctx.bindings.lookup_key(key).map(ActionList::from_slice) {
        return dispatch_binding(view, ctx, &actions);
    }
    let Some(rune) = key.inserted_rune() else {
        trace!(target: "actions.dispatch", view = %view.id, key = %key, "unbound");
        return false;
    };
    if view.is_read_only() {
        return false;
    }
    ctx.macros.record_rune(rune);
    for_each_cursor(view, ctx, |view, ctx| {
        insert_rune(view, ctx, rune);
        true
    })
}

fn handle_paste(view: &mut View, text: &str, ctx: &mut SessionContext) -> bool {
    if view.is_read_only() {
        return false;
    }
    let id = view.id;
    if !ctx.call_hook(|host| host.pre_action(id, "Paste")) {
        return false;
    }
    debug!(target: "actions.dispatch", view = %id, bytes = text.len(), "paste");
    for_each_cursor(view, ctx, |view, ctx| {
        paste_text(view, ctx, text);
        true
    });
    ctx.call_hook(|host| host.post_action(id, "Paste"));
    true
}

/// Button events go through the bindings; an empty button set ends a
/// press/drag gesture and feeds the click classifier.
fn handle_mouse(view: &mut View, mouse: &MouseEvent, ctx: &mut SessionContext) -> bool {
    view.mouse_event = Some(*mouse);
    if mouse.buttons.is_empty() {
        if !view.mouse_released {
            view.mouse_release(mouse.x, mouse.y, Instant::now());
        }
        return false;
    }
    match ctx
        .bindings
        .lookup_mouse(mouse.buttons, mouse.mods)
        .map(ActionList::from_slice)
    {
        Some(actions) => dispatch_binding(view, ctx, &actions),
        None => false,
    }
}

fn describe_event(view: &mut View, event: &Event, ctx: &mut SessionContext) {
    if let Event::Key(key) = event
        && is_ctrl(key, 'q')
    {
        ctx.request(SessionRequest::CloseView(view.id));
        return;
    }
    let end = view.state.text.end();
    let end = view.state.insert(end, &format!("{}\n", event.describe()));
    view.state.goto(end);
    view.state.text.set_modified(false);
    view.relocate_twice();
}

/// Keys and pastes go to the process. Returns false for events the pane
/// handles itself (mouse, resize).
fn forward_to_term(view: &mut View, event: &Event, ctx: &mut SessionContext) -> bool {
    let bytes = match event {
        Event::Key(key) if is_ctrl(key, 'q') => {
            ctx.request(SessionRequest::CloseView(view.id));
            return true;
        }
        Event::Key(key) => match key_bytes(key) {
            Some(bytes) => bytes,
            None => return true,
        },
        Event::Paste(text) => text.as_bytes().to_vec(),
        _ => return false,
    };
    if let Some(term) = &view.term
        && !term.send(bytes)
    {
        ctx.messenger.error("terminal process has exited");
    }
    true
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.mods.contains(ModMask::CTRL) && key.code == KeyCode::Char(c)
}

/// Bytes a terminal would send for `key`.
fn key_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    let seq: &[u8] = match key.code {
        KeyCode::Char(c) if key.mods.contains(ModMask::CTRL) && c.is_ascii_alphabetic() => {
            return Some(vec![(c.to_ascii_lowercase() as u8) & 0x1f]);
        }
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            return Some(c.encode_utf8(&mut buf).as_bytes().to_vec());
        }
        KeyCode::Enter => b"\n",
        KeyCode::Tab => b"\t",
        KeyCode::Backspace => b"\x7f",
        KeyCode::Esc => b"\x1b",
        KeyCode::Up => b"\x1b[A",
        KeyCode::Down => b"\x1b[B",
        KeyCode::Right => b"\x1b[C",
        KeyCode::Left => b"\x1b[D",
        KeyCode::Home => b"\x1b[H",
        KeyCode::End => b"\x1b[F",
        KeyCode::Delete => b"\x1b[3~",
        _ => return None,
    };
    Some(seq.to_vec())
}

/// Give an open prompt first claim on `event`. Returns whether the event was
/// consumed.
pub fn handle_prompt_event(session: &mut EditorSession, event: &Event) -> bool {
    if !session.ctx.messenger.is_prompting() {
        return false;
    }
    match event {
        Event::Key(key) => match session.ctx.messenger.handle_key(key) {
            PromptOutcome::Pending | PromptOutcome::Canceled => {}
            PromptOutcome::Answer { topic, yes } => session.answer(topic, yes),
            PromptOutcome::Command(line) => run_command(session, &line),
        },
        Event::Paste(text) => session.ctx.messenger.paste(text),
        Event::Raw(_) => {}
        Event::Mouse(_) | Event::Resize(..) => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ConfigStore, default_local};
    use core_events::{MouseButtons, ViewId};
    use core_state::BufferState;
    use core_text::{Buffer, Loc};

    fn setup(text: &str) -> (View, SessionContext) {
        let mut settings = default_local();
        settings.insert("ruler", core_config::OptionValue::Bool(false));
        let state = BufferState::new(Buffer::from_str("t", text), settings);
        (
            View::new(ViewId(1), state, 80, 24),
            SessionContext::detached(ConfigStore::with_defaults()),
        )
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::plain(KeyCode::Char(c)))
    }

    #[test]
    fn unbound_runes_insert_at_every_cursor() {
        let (mut view, mut ctx) = setup("ab\ncd");
        view.state.cursors.add(Loc::new(1, 0));
        handle_event(&mut view, &key('x'), &mut ctx);
        assert_eq!(view.state.text.contents(), "xab\nxcd");
        let locs: Vec<_> = view.state.cursors.iter().map(|c| c.loc).collect();
        assert_eq!(locs, vec![Loc::new(0, 1), Loc::new(1, 1)]);
    }

    #[test]
    fn raw_pane_describes_events_and_closes_on_ctrl_q() {
        let (view, mut ctx) = setup("");
        let mut view = view.with_kind(ViewKind::Raw);
        handle_event(&mut view, &key('a'), &mut ctx);
        handle_event(&mut view, &Event::Paste("secret".into()), &mut ctx);
        assert_eq!(view.state.line(1), "EventPaste: 6 bytes");
        assert!(view.state.line(0).starts_with("EventKey:"));
        assert!(!view.state.modified());
        handle_event(
            &mut view,
            &Event::Key(KeyEvent::new(KeyCode::Char('q'), ModMask::CTRL)),
            &mut ctx,
        );
        assert_eq!(ctx.take_requests(), vec![SessionRequest::CloseView(ViewId(1))]);
    }

    #[test]
    fn click_release_classifies() {
        let (mut view, mut ctx) = setup("alpha beta");
        let ev = |buttons| {
            Event::Mouse(MouseEvent {
                buttons,
                mods: ModMask::empty(),
                x: 7,
                y: 0,
            })
        };
        for _ in 0..2 {
            handle_event(&mut view, &ev(MouseButtons::LEFT), &mut ctx);
            handle_event(&mut view, &ev(MouseButtons::empty()), &mut ctx);
        }
        assert_eq!(view.state.selected_text().as_deref(), Some("beta"));
    }

    #[test]
    fn paste_event_reaches_every_cursor() {
        let (mut view, mut ctx) = setup("a\nb");
        view.state.cursors.add(Loc::new(1, 1));
        handle_event(&mut view, &Event::Paste("!".into()), &mut ctx);
        assert_eq!(view.state.text.contents(), "!a\nb!");
    }

    #[test]
    fn key_bytes_cover_controls() {
        assert_eq!(
            key_bytes(&KeyEvent::new(KeyCode::Char('c'), ModMask::CTRL)),
            Some(vec![3])
        );
        assert_eq!(key_bytes(&KeyEvent::plain(KeyCode::Enter)), Some(b"\n".to_vec()));
        assert_eq!(key_bytes(&KeyEvent::plain(KeyCode::F(1))), None);
    }

    #[test]
    fn term_pane_without_a_process_edits_normally() {
        let (mut view, mut ctx) = setup("");
        view.kind = ViewKind::Term;
        handle_event(&mut view, &key('a'), &mut ctx);
        assert_eq!(view.state.text.contents(), "a");
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn term_pane_forwards_keys_to_its_process() {
        use core_events::term::TermSpawner;
        use std::time::Duration;
        use tokio::sync::mpsc;

        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let (close_tx, _closed) = mpsc::unbounded_channel();
        let spawner = TermSpawner::new(update_tx, close_tx);
        let (mut view, mut ctx) = setup("");
        view.kind = ViewKind::Term;
        view.term = Some(spawner.spawn(view.id, "cat", &[]).unwrap());

        handle_event(&mut view, &key('a'), &mut ctx);
        handle_event(&mut view, &Event::Key(KeyEvent::plain(KeyCode::Enter)), &mut ctx);
        assert_eq!(view.state.text.contents(), "");

        let mut echoed = Vec::new();
        while echoed.len() < 2 {
            let update = tokio::time::timeout(Duration::from_secs(5), updates.recv())
                .await
                .unwrap()
                .unwrap();
            echoed.extend(update.bytes);
        }
        assert_eq!(echoed, b"a\n");

        handle_event(&mut view, &Event::Key(KeyEvent::new(KeyCode::Char('q'), ModMask::CTRL)), &mut ctx);
        assert_eq!(ctx.take_requests(), vec![SessionRequest::CloseView(view.id)]);
    }
}
