mod common;

use common::*;
use core_events::{Event, KeyCode, ModMask};
use core_text::Loc;
use pretty_assertions::assert_eq;

fn alt_shift(code: KeyCode) -> Event {
    Event::Key(core_events::KeyEvent::new(code, ModMask::ALT | ModMask::SHIFT))
}

#[test]
fn spawned_cursors_type_together_and_escape_collapses() {
    let mut s = session("one\ntwo\nthree");
    feed(&mut s, alt_shift(KeyCode::Down));
    feed(&mut s, alt_shift(KeyCode::Down));
    assert_eq!(locs(&s), vec![Loc::new(0, 0), Loc::new(1, 0), Loc::new(2, 0)]);

    type_str(&mut s, "> ");
    assert_eq!(contents(&s), "> one\n> two\n> three");
    assert_eq!(locs(&s), vec![Loc::new(0, 2), Loc::new(1, 2), Loc::new(2, 2)]);

    feed(&mut s, key(KeyCode::Esc));
    assert_eq!(locs(&s), vec![Loc::new(0, 2)]);
}

#[test]
fn cursors_that_meet_are_merged() {
    let mut s = session("ab\ncd");
    feed(&mut s, alt_shift(KeyCode::Down));
    feed(&mut s, Event::Key(core_events::KeyEvent::new(KeyCode::Home, ModMask::CTRL)));
    assert_eq!(locs(&s), vec![Loc::new(0, 0)]);
}

#[test]
fn backspace_at_every_cursor_joins_lines() {
    let mut s = session("a\nb\nc");
    feed(&mut s, key(KeyCode::Down));
    feed(&mut s, alt_shift(KeyCode::Down));
    feed(&mut s, key(KeyCode::Backspace));
    assert_eq!(contents(&s), "abc");
    assert_eq!(locs(&s), vec![Loc::new(0, 1), Loc::new(0, 2)]);
}

#[test]
fn macro_replays_actions_and_typed_runes() {
    let mut s = session("x\ny");
    feed(&mut s, ctrl('u'));
    type_str(&mut s, "ab");
    feed(&mut s, key(KeyCode::Down));
    feed(&mut s, ctrl('u'));
    assert_eq!(contents(&s), "abx\ny");
    assert_eq!(
        s.ctx.messenger.message().map(|m| m.text.as_str()),
        Some("Stopped recording")
    );

    feed(&mut s, key(KeyCode::Home));
    feed(&mut s, ctrl('j'));
    assert_eq!(contents(&s), "abx\naby");
}

#[test]
fn paste_event_applies_smartpaste_indent() {
    let mut s = session("    foo");
    feed(&mut s, key(KeyCode::End));
    feed(&mut s, Event::Paste("(a,\nb)".into()));
    assert_eq!(contents(&s), "    foo(a,\n    b)");
    assert_eq!(locs(&s), vec![Loc::new(1, 6)]);
}

#[test]
fn copy_then_paste_at_every_cursor() {
    let mut s = session("word\n\n");
    feed(&mut s, ctrl('a'));
    feed(&mut s, ctrl('c'));
    assert_eq!(s.ctx.clipboard, "word\n\n");
    feed(&mut s, key(KeyCode::Esc));
    feed(&mut s, Event::Key(core_events::KeyEvent::new(KeyCode::Home, ModMask::CTRL)));
    view(&mut s).state.cursors.add(Loc::new(1, 0));
    s.ctx.clipboard = "!".into();
    feed(&mut s, ctrl('v'));
    assert_eq!(contents(&s), "!word\n!\n");
}
