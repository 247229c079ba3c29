//! Input polling task: translates `crossterm` terminal events into
//! [`core_events::Event`] values and pushes them on the bounded input channel.

mod async_service;
pub use async_service::{AsyncInputShutdown, InputSource};

use core_events::{Event, KeyCode, KeyEvent, ModMask, MouseButtons, MouseEvent};
use crossterm::event::{
    Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKind,
    KeyModifiers as CMods, MouseButton as CButton, MouseEvent as CMouseEvent,
    MouseEventKind as CMouseKind,
};

#[inline]
pub(crate) fn log_paste(text: &str) {
    tracing::trace!(target: "input.paste", len = text.len(), "paste_event");
}

pub(crate) fn map_mods(m: CMods) -> ModMask {
    let mut out = ModMask::empty();
    if m.contains(CMods::CONTROL) {
        out |= ModMask::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= ModMask::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= ModMask::SHIFT;
    }
    if m.intersects(CMods::META | CMods::SUPER) {
        out |= ModMask::META;
    }
    out
}

/// Translate one terminal event. `None` means the event is not forwarded.
pub fn map_event(event: CEvent) -> Option<Event> {
    match event {
        CEvent::Key(key) => map_key(&key),
        CEvent::Mouse(mouse) => Some(Event::Mouse(map_mouse(&mouse))),
        CEvent::Paste(text) => Some(Event::Paste(text)),
        CEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        CEvent::FocusGained | CEvent::FocusLost => None,
    }
}

pub(crate) fn map_key(key: &CKeyEvent) -> Option<Event> {
    if !matches!(key.kind, CKind::Press | CKind::Repeat) {
        return None;
    }
    let mut mods = map_mods(key.modifiers);
    let code = match key.code {
        CKeyCode::Char(c) => {
            // Case already reflects shift for printable keys.
            mods.remove(ModMask::SHIFT);
            KeyCode::Char(c)
        }
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab => KeyCode::Tab,
        CKeyCode::BackTab => {
            mods.remove(ModMask::SHIFT);
            KeyCode::BackTab
        }
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        CKeyCode::Home => KeyCode::Home,
        CKeyCode::End => KeyCode::End,
        CKeyCode::PageUp => KeyCode::PageUp,
        CKeyCode::PageDown => KeyCode::PageDown,
        CKeyCode::Insert => KeyCode::Insert,
        CKeyCode::Delete => KeyCode::Delete,
        CKeyCode::F(n) => KeyCode::F(n),
        other => return Some(Event::Raw(format!("{other:?}"))),
    };
    Some(Event::Key(KeyEvent::new(code, mods)))
}

pub(crate) fn map_mouse(mouse: &CMouseEvent) -> MouseEvent {
    let button = |b: CButton| match b {
        CButton::Left => MouseButtons::LEFT,
        CButton::Middle => MouseButtons::MIDDLE,
        CButton::Right => MouseButtons::RIGHT,
    };
    let buttons = match mouse.kind {
        CMouseKind::Down(b) | CMouseKind::Drag(b) => button(b),
        CMouseKind::Up(_) | CMouseKind::Moved => MouseButtons::empty(),
        CMouseKind::ScrollUp => MouseButtons::WHEEL_UP,
        CMouseKind::ScrollDown => MouseButtons::WHEEL_DOWN,
        CMouseKind::ScrollLeft => MouseButtons::WHEEL_LEFT,
        CMouseKind::ScrollRight => MouseButtons::WHEEL_RIGHT,
    };
    MouseEvent {
        buttons,
        mods: map_mods(mouse.modifiers),
        x: mouse.column,
        y: mouse.row,
    }
}
