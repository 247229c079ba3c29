//! Key, mouse and raw-escape chords and their string form.
//!
//! Strings follow the binding file format: optional modifier prefixes
//! (`Ctrl`, `Alt`, `Shift`, `Meta`, each optionally followed by `-`) and a
//! key name. `Ctrl-s`, `CtrlShiftUp`, `Alt-,`, `Ctrl-MouseLeft`,
//! `MouseWheelDown` and `F5` are all valid. A string starting with ESC is a
//! raw escape sequence.

use core_events::{KeyCode, KeyEvent, ModMask, MouseButtons};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Chord {
    Key(KeyEvent),
    Mouse { buttons: MouseButtons, mods: ModMask },
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

const MODIFIERS: [(&str, ModMask); 4] = [
    ("Ctrl", ModMask::CTRL),
    ("Alt", ModMask::ALT),
    ("Shift", ModMask::SHIFT),
    ("Meta", ModMask::META),
];

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("Insert", KeyCode::Insert),
    ("Delete", KeyCode::Delete),
    ("Backspace", KeyCode::Backspace),
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Tab", KeyCode::Tab),
    ("Backtab", KeyCode::BackTab),
];

const MOUSE_BUTTONS: &[(&str, MouseButtons)] = &[
    ("MouseLeft", MouseButtons::LEFT),
    ("MouseMiddle", MouseButtons::MIDDLE),
    ("MouseRight", MouseButtons::RIGHT),
    ("MouseWheelUp", MouseButtons::WHEEL_UP),
    ("MouseWheelDown", MouseButtons::WHEEL_DOWN),
    ("MouseWheelLeft", MouseButtons::WHEEL_LEFT),
    ("MouseWheelRight", MouseButtons::WHEEL_RIGHT),
];

impl Chord {
    /// Key chord normalized the way the input layer reports keys: shift is
    /// folded into printable characters and back-tab.
    pub fn key(code: KeyCode, mut mods: ModMask) -> Self {
        if matches!(code, KeyCode::Char(_) | KeyCode::BackTab) {
            mods.remove(ModMask::SHIFT);
        }
        Chord::Key(KeyEvent::new(code, mods))
    }

    pub fn mouse(buttons: MouseButtons, mods: ModMask) -> Self {
        Chord::Mouse { buttons, mods }
    }
}

fn prefix(mods: ModMask) -> String {
    MODIFIERS
        .iter()
        .filter(|(_, flag)| mods.contains(*flag))
        .map(|(name, _)| *name)
        .collect()
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::Key(key) => {
                let pre = prefix(key.mods);
                match key.code {
                    KeyCode::Char(' ') if pre.is_empty() => f.write_str("Space"),
                    KeyCode::Char(' ') => write!(f, "{pre}Space"),
                    KeyCode::Char(c) if pre.is_empty() => write!(f, "{c}"),
                    KeyCode::Char(c) => write!(f, "{pre}-{c}"),
                    KeyCode::F(n) => write!(f, "{pre}F{n}"),
                    code => {
                        let name = NAMED_KEYS
                            .iter()
                            .find(|(_, k)| *k == code)
                            .map(|(n, _)| *n)
                            .unwrap_or("?");
                        write!(f, "{pre}{name}")
                    }
                }
            }
            Chord::Mouse { buttons, mods } => {
                let name = MOUSE_BUTTONS
                    .iter()
                    .find(|(_, b)| b == buttons)
                    .map(|(n, _)| *n)
                    .unwrap_or("Mouse?");
                let pre = prefix(*mods);
                if pre.is_empty() {
                    f.write_str(name)
                } else {
                    write!(f, "{pre}-{name}")
                }
            }
            Chord::Raw(esc) => f.write_str(esc),
        }
    }
}

impl FromStr for Chord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ChordParseError::Empty);
        }
        if s.starts_with('\u{1b}') {
            return Ok(Chord::Raw(s.to_string()));
        }

        let mut mods = ModMask::empty();
        let mut rest = s;
        'strip: loop {
            for (name, flag) in MODIFIERS {
                if rest.len() > name.len() && rest.starts_with(name) {
                    mods |= flag;
                    rest = &rest[name.len()..];
                    if rest.len() > 1
                        && let Some(stripped) = rest.strip_prefix('-')
                    {
                        rest = stripped;
                    }
                    continue 'strip;
                }
            }
            break;
        }

        if let Some((_, buttons)) = MOUSE_BUTTONS.iter().find(|(n, _)| *n == rest) {
            return Ok(Chord::mouse(*buttons, mods));
        }
        if let Some((_, code)) = NAMED_KEYS.iter().find(|(n, _)| *n == rest) {
            let code = if *code == KeyCode::Tab && mods.contains(ModMask::SHIFT) {
                KeyCode::BackTab
            } else {
                *code
            };
            return Ok(Chord::key(code, mods));
        }
        if rest == "Space" {
            return Ok(Chord::key(KeyCode::Char(' '), mods));
        }
        if let Some(n) = rest.strip_prefix('F')
            && let Ok(n) = n.parse::<u8>()
            && (1..=24).contains(&n)
        {
            return Ok(Chord::key(KeyCode::F(n), mods));
        }
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Chord::key(KeyCode::Char(c), mods)),
            _ => Err(ChordParseError::UnknownKey(s.to_string())),
        }
    }
}

impl Serialize for Chord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Chord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
