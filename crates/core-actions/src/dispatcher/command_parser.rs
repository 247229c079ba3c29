//! Command prompt parsing.
//!
//! Converts a submitted prompt line into a `ParsedCommand`. Parsing is pure;
//! execution lives in `command`. Arguments are split on whitespace, with
//! double quotes grouping an argument that contains spaces.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Set { option: String, value: String },
    SetLocal { option: String, value: String },
    Show(String),
    Bind { chord: String, actions: String },
    Run(Vec<String>),
    /// Embedded terminal; empty means the user's shell.
    Term(Vec<String>),
    Save(Option<PathBuf>),
    Quit,
    Open(PathBuf),
    Tab(Option<PathBuf>),
    VSplit(Option<PathBuf>),
    HSplit(Option<PathBuf>),
    Raw,
    Help,
    /// Known command with missing arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> ParsedCommand {
        let args = split_args(raw);
        let Some((name, rest)) = args.split_first() else {
            return ParsedCommand::Unknown(String::new());
        };
        let path = || rest.first().map(PathBuf::from);
        match name.as_str() {
            "set" | "setlocal" => {
                let global = name == "set";
                match rest {
                    [option, value @ ..] if !value.is_empty() => {
                        let (option, value) = (option.clone(), value.join(" "));
                        if global {
                            ParsedCommand::Set { option, value }
                        } else {
                            ParsedCommand::SetLocal { option, value }
                        }
                    }
                    _ if global => ParsedCommand::Usage("set option value"),
                    _ => ParsedCommand::Usage("setlocal option value"),
                }
            }
            "show" => match rest {
                [option] => ParsedCommand::Show(option.clone()),
                _ => ParsedCommand::Usage("show option"),
            },
            "bind" => match rest {
                [chord, actions @ ..] if !actions.is_empty() => ParsedCommand::Bind {
                    chord: chord.clone(),
                    actions: actions.join(""),
                },
                _ => ParsedCommand::Usage("bind key action"),
            },
            "run" if rest.is_empty() => ParsedCommand::Usage("run command [args...]"),
            "run" => ParsedCommand::Run(rest.to_vec()),
            "term" => ParsedCommand::Term(rest.to_vec()),
            "save" => ParsedCommand::Save(path()),
            "quit" => ParsedCommand::Quit,
            "open" => match path() {
                Some(p) => ParsedCommand::Open(p),
                None => ParsedCommand::Usage("open filename"),
            },
            "tab" => ParsedCommand::Tab(path()),
            "vsplit" => ParsedCommand::VSplit(path()),
            "hsplit" => ParsedCommand::HSplit(path()),
            "raw" => ParsedCommand::Raw,
            "help" => ParsedCommand::Help,
            other => ParsedCommand::Unknown(other.to_string()),
        }
    }
}

fn split_args(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut pending = false;
    for c in raw.trim().chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut cur));
                    pending = false;
                }
            }
            c => {
                cur.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(cur);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_joins_value() {
        assert_eq!(
            CommandParser::parse("set colorscheme  solarized dark"),
            ParsedCommand::Set {
                option: "colorscheme".into(),
                value: "solarized dark".into()
            }
        );
        assert_eq!(CommandParser::parse("set ruler"), ParsedCommand::Usage("set option value"));
    }

    #[test]
    fn parse_quoted_arguments() {
        assert_eq!(
            CommandParser::parse(r#"run echo "hello world" """#),
            ParsedCommand::Run(vec!["echo".into(), "hello world".into(), String::new()])
        );
    }

    #[test]
    fn parse_optional_paths() {
        assert_eq!(CommandParser::parse("tab"), ParsedCommand::Tab(None));
        assert_eq!(
            CommandParser::parse("vsplit src/main.rs"),
            ParsedCommand::VSplit(Some(PathBuf::from("src/main.rs")))
        );
        assert_eq!(CommandParser::parse("open"), ParsedCommand::Usage("open filename"));
    }

    #[test]
    fn parse_bind() {
        assert_eq!(
            CommandParser::parse("bind Alt-d DuplicateLine,CursorDown"),
            ParsedCommand::Bind {
                chord: "Alt-d".into(),
                actions: "DuplicateLine,CursorDown".into()
            }
        );
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            CommandParser::parse("doesnotexist now"),
            ParsedCommand::Unknown("doesnotexist".into())
        );
        assert_eq!(CommandParser::parse("   "), ParsedCommand::Unknown(String::new()));
    }
}
