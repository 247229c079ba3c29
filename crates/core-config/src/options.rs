//! Option values, default tables and validators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ConfigError;

/// A single option value. The set of kinds is closed; parsing a user string
/// always goes through the kind of the option's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(i64),
    Text(String),
    StringList(Vec<String>),
}

impl OptionValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "string",
            OptionValue::StringList(_) => "string list",
        }
    }

    /// Parse `raw` as a value of the same kind as `self`.
    pub fn parse_like(&self, option: &str, raw: &str) -> Result<OptionValue, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            option: option.to_string(),
            value: raw.to_string(),
            expected: self.kind_name(),
        };
        match self {
            OptionValue::Bool(_) => match raw {
                "true" | "on" | "yes" | "1" => Ok(OptionValue::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(OptionValue::Bool(false)),
                _ => Err(invalid()),
            },
            OptionValue::Number(_) => raw
                .trim()
                .parse::<i64>()
                .map(OptionValue::Number)
                .map_err(|_| invalid()),
            OptionValue::Text(_) => Ok(OptionValue::Text(raw.to_string())),
            OptionValue::StringList(_) => Ok(OptionValue::StringList(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }

    fn same_kind(&self, other: &OptionValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::StringList(v) => f.write_str(&v.join(",")),
        }
    }
}

/// A name → value table. Used both for the global table and for the local
/// table attached to every buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, OptionValue>,
}

impl Settings {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.values.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }

    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(OptionValue::Bool(true)))
    }

    pub fn get_number(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(OptionValue::Number(n)) => *n,
            _ => 0,
        }
    }

    /// Non-negative numeric option as `usize`.
    pub fn get_usize(&self, name: &str) -> usize {
        usize::try_from(self.get_number(name)).unwrap_or(0)
    }

    pub fn get_text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(OptionValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn tabsize(&self) -> usize {
        self.get_usize("tabsize").max(1)
    }
}

impl FromIterator<(String, OptionValue)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Options that only exist in the global table.
pub const GLOBAL_ONLY: &[&str] = &[
    "colorscheme",
    "infobar",
    "keymenu",
    "mouse",
    "pluginchannels",
    "pluginrepos",
    "termtitle",
    "useprimary",
];

/// Default global option table.
pub fn default_global() -> Settings {
    use OptionValue::*;
    let text = |s: &str| Text(s.to_string());
    [
        ("autoindent", Bool(true)),
        ("autosave", Bool(false)),
        ("colorcolumn", Number(0)),
        ("colorscheme", text("default")),
        ("cursorline", Bool(true)),
        ("eofnewline", Bool(false)),
        ("fileformat", text("unix")),
        ("hscrollmargin", Number(0)),
        ("ignorecase", Bool(false)),
        ("indentchar", text(" ")),
        ("infobar", Bool(true)),
        ("keepautoindent", Bool(false)),
        ("keymenu", Bool(false)),
        ("mouse", Bool(true)),
        (
            "pluginchannels",
            StringList(vec![
                "https://raw.githubusercontent.com/micro-editor/plugin-channel/master/channel.json"
                    .to_string(),
            ]),
        ),
        ("pluginrepos", StringList(Vec::new())),
        ("rmtrailingws", Bool(false)),
        ("ruler", Bool(true)),
        ("savecursor", Bool(false)),
        ("scrollbar", Bool(false)),
        ("scrollmargin", Number(3)),
        ("scrollspeed", Number(2)),
        ("softwrap", Bool(false)),
        ("smartpaste", Bool(true)),
        ("splitbottom", Bool(true)),
        ("splitright", Bool(true)),
        ("statusline", Bool(true)),
        ("syntax", Bool(true)),
        ("tabmovement", Bool(false)),
        ("tabsize", Number(4)),
        ("tabstospaces", Bool(false)),
        ("termtitle", Bool(false)),
        ("useprimary", Bool(true)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Default local (per-buffer) option table.
pub fn default_local() -> Settings {
    let mut local: Settings = default_global()
        .values
        .into_iter()
        .filter(|(k, _)| !GLOBAL_ONLY.contains(&k.as_str()))
        .collect();
    local.insert("filetype", OptionValue::Text("Unknown".to_string()));
    local
}

/// Reject values that parse but make no sense for the option.
pub fn validate(option: &str, value: &OptionValue) -> Result<(), ConfigError> {
    let fail = |reason: &str| {
        Err(ConfigError::Validation {
            option: option.to_string(),
            reason: reason.to_string(),
        })
    };
    match (option, value) {
        ("tabsize", OptionValue::Number(n)) if *n <= 0 => fail("must be positive"),
        ("scrollmargin" | "scrollspeed" | "colorcolumn" | "hscrollmargin", OptionValue::Number(n))
            if *n < 0 =>
        {
            fail("must be non-negative")
        }
        ("fileformat", OptionValue::Text(s)) if s != "unix" && s != "dos" => {
            fail("must be 'unix' or 'dos'")
        }
        _ => Ok(()),
    }
}

/// Parse a user supplied string for a known option and validate the result.
pub fn parse_option(
    option: &str,
    raw: &str,
    current: &OptionValue,
) -> Result<OptionValue, ConfigError> {
    let value = current.parse_like(option, raw)?;
    validate(option, &value)?;
    Ok(value)
}

/// Accept a value read from a settings file only if its kind matches the
/// option's default.
pub fn check_file_value(option: &str, value: &OptionValue) -> Result<(), ConfigError> {
    let defaults = default_global();
    let local = default_local();
    let known = defaults.get(option).or_else(|| local.get(option));
    match known {
        Some(default) if !default.same_kind(value) => Err(ConfigError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            expected: default.kind_name(),
        }),
        _ => validate(option, value),
    }
}

/// Effective vertical scroll margin for a pane with `text_rows` rows: clamped
/// to `(h - 2) / 2`, and zero for panes of three rows or fewer.
pub fn clamp_scroll_margin(raw: usize, text_rows: usize) -> usize {
    if text_rows <= 3 {
        0
    } else {
        raw.min((text_rows - 2) / 2)
    }
}
