//! core-keymap: binding table from chords to ordered action lists.
//!
//! - `ActionId` is a closed enum; binding files and the `bind` command name
//!   actions by their variant name.
//! - `Chord` covers key chords, mouse chords and raw escape sequences.
//! - `Bindings` starts from the built-in defaults; `bindings.toml` entries
//!   override them one chord at a time. Bad entries are reported and skipped,
//!   never fatal.

mod action;
mod chord;

pub use action::{ActionId, UnknownAction};
pub use chord::{Chord, ChordParseError};

use core_events::{KeyEvent, ModMask, MouseButtons};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Actions bound to one chord, run in order.
pub type ActionList = SmallVec<[ActionId; 2]>;

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error(transparent)]
    Chord(#[from] ChordParseError),
    #[error(transparent)]
    Action(#[from] UnknownAction),
    #[error("reading bindings: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing bindings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("writing bindings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("binding for `{0}` must be a string")]
    NotAString(String),
}

/// Parse a comma separated action list such as `"DuplicateLine,CursorDown"`.
/// An empty list is valid and unbinds the chord.
pub fn parse_actions(s: &str) -> Result<ActionList, BindingError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<ActionId>().map_err(BindingError::from))
        .collect()
}

fn join_actions(actions: &[ActionId]) -> String {
    actions
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(",")
}

// -------------------------------------------------------------------------------------------------
// Binding table
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    map: HashMap<Chord, ActionList>,
}

impl Bindings {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        let mut b = Self::empty();
        for (chord, actions) in DEFAULT_BINDINGS {
            match (chord.parse::<Chord>(), parse_actions(actions)) {
                (Ok(chord), Ok(actions)) => {
                    b.map.insert(chord, actions);
                }
                // Built-in table; a failure here is a programming error.
                (c, a) => debug_assert!(false, "bad default binding {chord}: {c:?} {a:?}"),
            }
        }
        b
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, chord: &Chord) -> Option<&[ActionId]> {
        self.map.get(chord).map(|a| a.as_slice())
    }

    pub fn lookup_key(&self, key: &KeyEvent) -> Option<&[ActionId]> {
        self.get(&Chord::key(key.code, key.mods))
    }

    pub fn lookup_mouse(&self, buttons: MouseButtons, mods: ModMask) -> Option<&[ActionId]> {
        self.get(&Chord::mouse(buttons, mods))
    }

    pub fn lookup_raw(&self, esc: &str) -> Option<&[ActionId]> {
        self.get(&Chord::Raw(esc.to_string()))
    }

    /// Bind `chord`; an empty list removes the binding. Returns the previous list.
    pub fn bind(&mut self, chord: Chord, actions: ActionList) -> Option<ActionList> {
        debug!(target: "keymap", %chord, actions = %join_actions(&actions), "bind");
        if actions.is_empty() {
            self.map.remove(&chord)
        } else {
            self.map.insert(chord, actions)
        }
    }

    /// String form used by the `bind` command.
    pub fn bind_str(&mut self, chord: &str, actions: &str) -> Result<(), BindingError> {
        let chord = chord.parse::<Chord>()?;
        let actions = parse_actions(actions)?;
        self.bind(chord, actions);
        Ok(())
    }

    /// Bindings sorted by their string form.
    pub fn iter_sorted(&self) -> Vec<(String, &[ActionId])> {
        let mut out: Vec<_> = self
            .map
            .iter()
            .map(|(c, a)| (c.to_string(), a.as_slice()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Apply `chord = "Action,Action"` overrides from TOML text. Returns the
    /// entries that could not be applied.
    pub fn apply_toml(&mut self, src: &str) -> Vec<BindingError> {
        let table: toml::Table = match toml::from_str(src) {
            Ok(t) => t,
            Err(err) => return vec![BindingError::Parse(err)],
        };
        let mut errors = Vec::new();
        for (chord, value) in table {
            let Some(actions) = value.as_str() else {
                errors.push(BindingError::NotAString(chord));
                continue;
            };
            if let Err(err) = self.bind_str(&chord, actions) {
                warn!(target: "keymap", %chord, error = %err, "binding_rejected");
                errors.push(err);
            }
        }
        errors
    }

    /// Defaults overridden by the bindings file at `path`. A missing file
    /// yields the defaults.
    pub fn load(path: &Path) -> (Self, Vec<BindingError>) {
        let mut bindings = Self::defaults();
        match std::fs::read_to_string(path) {
            Ok(src) => {
                let errors = bindings.apply_toml(&src);
                (bindings, errors)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (bindings, Vec::new()),
            Err(err) => (bindings, vec![BindingError::Io(err)]),
        }
    }

    pub fn to_toml(&self) -> Result<String, BindingError> {
        let table: BTreeMap<String, String> = self
            .map
            .iter()
            .map(|(c, a)| (c.to_string(), join_actions(a)))
            .collect();
        Ok(toml::to_string(&table)?)
    }
}

// -------------------------------------------------------------------------------------------------
// Default bindings
// -------------------------------------------------------------------------------------------------
const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("Up", "CursorUp"),
    ("Down", "CursorDown"),
    ("Left", "CursorLeft"),
    ("Right", "CursorRight"),
    ("ShiftUp", "SelectUp"),
    ("ShiftDown", "SelectDown"),
    ("ShiftLeft", "SelectLeft"),
    ("ShiftRight", "SelectRight"),
    ("CtrlLeft", "WordLeft"),
    ("CtrlRight", "WordRight"),
    ("AltLeft", "WordLeft"),
    ("AltRight", "WordRight"),
    ("CtrlShiftLeft", "SelectWordLeft"),
    ("CtrlShiftRight", "SelectWordRight"),
    ("AltUp", "MoveLinesUp"),
    ("AltDown", "MoveLinesDown"),
    ("AltShiftUp", "SpawnMultiCursorUp"),
    ("AltShiftDown", "SpawnMultiCursorDown"),
    ("Home", "StartOfLine"),
    ("End", "EndOfLine"),
    ("ShiftHome", "SelectToStartOfLine"),
    ("ShiftEnd", "SelectToEndOfLine"),
    ("CtrlHome", "CursorStart"),
    ("CtrlEnd", "CursorEnd"),
    ("CtrlShiftHome", "SelectToStart"),
    ("CtrlShiftEnd", "SelectToEnd"),
    ("PageUp", "PageUp"),
    ("PageDown", "PageDown"),
    ("Enter", "InsertNewline"),
    ("Tab", "InsertTab"),
    ("Backspace", "Backspace"),
    ("Delete", "Delete"),
    ("Insert", "ToggleOverwriteMode"),
    ("Esc", "Escape"),
    ("Ctrl-s", "Save"),
    ("Ctrl-q", "Quit"),
    ("Ctrl-x", "Cut"),
    ("Ctrl-k", "CutLine"),
    ("Ctrl-c", "Copy"),
    ("Ctrl-v", "Paste"),
    ("Ctrl-d", "DuplicateLine"),
    ("Ctrl-a", "SelectAll"),
    ("Ctrl-e", "CommandMode"),
    ("Ctrl-t", "AddTab"),
    ("Alt-,", "PreviousTab"),
    ("Alt-.", "NextTab"),
    ("Ctrl-w", "NextSplit"),
    ("Ctrl-u", "ToggleMacro"),
    ("Ctrl-j", "PlayMacro"),
    ("Ctrl-r", "ToggleRuler"),
    ("Ctrl-g", "ToggleHelp"),
    ("Alt-p", "RemoveMultiCursor"),
    ("Alt-c", "RemoveAllMultiCursors"),
    ("MouseLeft", "MousePress"),
    ("Ctrl-MouseLeft", "MouseMultiCursor"),
    ("MouseWheelUp", "ScrollUp"),
    ("MouseWheelDown", "ScrollDown"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::KeyCode;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    #[test]
    fn defaults_cover_core_chords() {
        let b = Bindings::defaults();
        assert_eq!(b.len(), DEFAULT_BINDINGS.len());
        assert_eq!(
            b.lookup_key(&KeyEvent::new(KeyCode::Char('s'), ModMask::CTRL)),
            Some(&[ActionId::Save][..])
        );
        assert_eq!(
            b.lookup_mouse(MouseButtons::LEFT, ModMask::empty()),
            Some(&[ActionId::MousePress][..])
        );
        assert_eq!(
            b.lookup_mouse(MouseButtons::WHEEL_DOWN, ModMask::empty()),
            Some(&[ActionId::ScrollDown][..])
        );
        assert_eq!(b.lookup_key(&KeyEvent::plain(KeyCode::Char('s'))), None);
    }

    #[test]
    fn toml_overrides_and_reports_bad_entries() {
        let mut b = Bindings::defaults();
        let errors = b.apply_toml(
            r#"
"Alt-d" = "DuplicateLine,CursorDown"
"Ctrl-s" = ""
"Ctrl-Nope" = "Save"
"Ctrl-z" = "Frobnicate"
"Ctrl-y" = 3
"#,
        );
        assert_eq!(errors.len(), 3);
        assert_eq!(
            b.get(&"Alt-d".parse().unwrap()),
            Some(&[ActionId::DuplicateLine, ActionId::CursorDown][..])
        );
        assert_eq!(b.get(&"Ctrl-s".parse().unwrap()), None);
    }

    #[test]
    fn malformed_file_is_one_error() {
        let mut b = Bindings::defaults();
        let errors = b.apply_toml("this is = not = toml");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], BindingError::Parse(_)));
        assert_eq!(b, Bindings::defaults());
    }

    #[test]
    fn load_merges_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.toml");
        assert_eq!(Bindings::load(&path).0, Bindings::defaults());

        std::fs::write(&path, "\"F5\" = \"Save\"\n").unwrap();
        let (b, errors) = Bindings::load(&path);
        assert!(errors.is_empty());
        assert_eq!(b.len(), DEFAULT_BINDINGS.len() + 1);
        assert_eq!(
            b.lookup_key(&KeyEvent::plain(KeyCode::F(5))),
            Some(&[ActionId::Save][..])
        );
    }

    #[test]
    fn serialized_table_loads_back() {
        let mut b = Bindings::defaults();
        b.bind_str("Alt-d", "DuplicateLine,CursorDown").unwrap();
        let text = b.to_toml().unwrap();
        assert!(text.contains("\"DuplicateLine,CursorDown\""));
        let mut reloaded = Bindings::empty();
        assert!(reloaded.apply_toml(&text).is_empty());
        assert_eq!(reloaded, b);
    }

    #[test]
    fn action_list_parsing() {
        let list = parse_actions(" Cut , Paste ").unwrap();
        let expected: ActionList = smallvec![ActionId::Cut, ActionId::Paste];
        assert_eq!(list, expected);
        assert!(parse_actions("").unwrap().is_empty());
        assert!(matches!(parse_actions("Cut,Nope"), Err(BindingError::Action(_))));
    }
}
