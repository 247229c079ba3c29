//! Closed set of bindable actions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! action_ids {
    ($($name:ident),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ActionId {
            $($name),+
        }

        impl ActionId {
            pub const ALL: &'static [ActionId] = &[$(ActionId::$name),+];

            /// Name used in binding files and the `bind` command.
            pub fn name(self) -> &'static str {
                match self {
                    $(ActionId::$name => stringify!($name)),+
                }
            }
        }
    };
}

action_ids! {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    WordLeft,
    WordRight,
    StartOfLine,
    EndOfLine,
    CursorStart,
    CursorEnd,
    PageUp,
    PageDown,
    SelectUp,
    SelectDown,
    SelectLeft,
    SelectRight,
    SelectWordLeft,
    SelectWordRight,
    SelectToStartOfLine,
    SelectToEndOfLine,
    SelectToStart,
    SelectToEnd,
    SelectAll,
    ScrollUp,
    ScrollDown,
    Center,
    InsertNewline,
    InsertTab,
    Backspace,
    Delete,
    Cut,
    CutLine,
    Copy,
    Paste,
    DuplicateLine,
    MoveLinesUp,
    MoveLinesDown,
    SpawnMultiCursorUp,
    SpawnMultiCursorDown,
    MouseMultiCursor,
    RemoveMultiCursor,
    RemoveAllMultiCursors,
    ToggleMacro,
    PlayMacro,
    Save,
    Quit,
    QuitAll,
    AddTab,
    NextTab,
    PreviousTab,
    VSplit,
    HSplit,
    NextSplit,
    PreviousSplit,
    ToggleOverwriteMode,
    ToggleRuler,
    ToggleHelp,
    CommandMode,
    Escape,
    MousePress,
}

impl ActionId {
    /// Whether the action may change buffer contents or the cursor set.
    /// Read-only views skip these.
    pub fn mutates_content(self) -> bool {
        use ActionId::*;
        match self {
            InsertNewline | InsertTab | Backspace | Delete | Cut | CutLine | Paste
            | DuplicateLine | MoveLinesUp | MoveLinesDown | SpawnMultiCursorUp
            | SpawnMultiCursorDown | MouseMultiCursor | PlayMacro => true,
            CursorUp | CursorDown | CursorLeft | CursorRight | WordLeft | WordRight
            | StartOfLine | EndOfLine | CursorStart | CursorEnd | PageUp | PageDown | SelectUp
            | SelectDown | SelectLeft | SelectRight | SelectWordLeft | SelectWordRight
            | SelectToStartOfLine | SelectToEndOfLine | SelectToStart | SelectToEnd
            | SelectAll | ScrollUp | ScrollDown | Center | Copy | RemoveMultiCursor
            | RemoveAllMultiCursors | ToggleMacro | Save | Quit | QuitAll | AddTab | NextTab
            | PreviousTab | VSplit | HSplit | NextSplit | PreviousSplit | ToggleOverwriteMode
            | ToggleRuler | ToggleHelp | CommandMode | Escape | MousePress => false,
        }
    }

    /// Whether the action runs once per cursor. Pane, tab and session level
    /// actions run only while the primary cursor is active.
    pub fn per_cursor(self) -> bool {
        use ActionId::*;
        !matches!(
            self,
            ScrollUp
                | ScrollDown
                | Center
                | SpawnMultiCursorUp
                | SpawnMultiCursorDown
                | MouseMultiCursor
                | RemoveMultiCursor
                | RemoveAllMultiCursors
                | ToggleMacro
                | Save
                | Quit
                | QuitAll
                | AddTab
                | NextTab
                | PreviousTab
                | VSplit
                | HSplit
                | NextSplit
                | PreviousSplit
                | ToggleOverwriteMode
                | ToggleRuler
                | ToggleHelp
                | CommandMode
                | MousePress
        )
    }

    /// Macro control actions are never captured into a macro.
    pub fn is_macro_control(self) -> bool {
        matches!(self, ActionId::ToggleMacro | ActionId::PlayMacro)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for ActionId {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ActionId::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

impl Serialize for ActionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ActionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for action in ActionId::ALL {
            assert_eq!(action.name().parse::<ActionId>(), Ok(*action));
        }
        assert!("Frobnicate".parse::<ActionId>().is_err());
    }

    #[test]
    fn read_only_classification() {
        assert!(ActionId::Backspace.mutates_content());
        assert!(ActionId::SpawnMultiCursorDown.mutates_content());
        assert!(ActionId::PlayMacro.mutates_content());
        assert!(!ActionId::ToggleMacro.mutates_content());
        assert!(!ActionId::Copy.mutates_content());
        assert!(!ActionId::CursorDown.mutates_content());
    }

    #[test]
    fn session_actions_run_once() {
        assert!(ActionId::CursorDown.per_cursor());
        assert!(ActionId::PlayMacro.per_cursor());
        assert!(!ActionId::Save.per_cursor());
        assert!(!ActionId::ToggleMacro.per_cursor());
    }
}
