//! Command line surface.

use anyhow::{Context, Result, bail};
use clap::Parser;
use core_config::default_global;
use core_text::Loc;
use std::fmt::Write as _;
use std::path::PathBuf;

/// CLI arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "mica", version, about = "A terminal text editor")]
pub struct Args {
    /// Files to open, one tab each. `+LINE` or `+LINE:COL` sets where the
    /// cursor starts.
    pub files: Vec<String>,
    /// Cursor start position as `LINE,COL` (line 1-based, column 0-based).
    #[arg(long = "startpos", value_name = "LINE,COL")]
    pub startpos: Option<String>,
    /// Configuration directory (default: `<config dir>/mica`).
    #[arg(long = "config-dir")]
    pub config_dir: Option<PathBuf>,
    /// Set an option for this session; repeatable.
    #[arg(long = "set", value_name = "OPTION=VALUE")]
    pub set: Vec<String>,
    /// Print every option with its default value and exit.
    #[arg(long)]
    pub options: bool,
}

/// Files to open and the start position after `+LINE:COL` arguments are
/// pulled out. A `+` argument overrides `--startpos`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Inputs {
    pub paths: Vec<PathBuf>,
    pub start: Option<Loc>,
}

impl Args {
    pub fn inputs(&self) -> Result<Inputs> {
        let mut start = self.startpos.as_deref().map(parse_startpos).transpose()?;
        let mut paths = Vec::with_capacity(self.files.len());
        for arg in &self.files {
            match arg.strip_prefix('+') {
                Some(pos) => {
                    let pos = match pos.split_once(':') {
                        Some((line, col)) => format!("{line},{col}"),
                        None => format!("{pos},0"),
                    };
                    start = Some(parse_startpos(&pos)?);
                }
                None => paths.push(PathBuf::from(arg)),
            }
        }
        Ok(Inputs { paths, start })
    }

    /// `--set` pairs, split at the first `=`.
    pub fn overrides(&self) -> Result<Vec<(&str, &str)>> {
        self.set
            .iter()
            .map(|pair| {
                pair.split_once('=')
                    .with_context(|| format!("--set expects OPTION=VALUE, got {pair:?}"))
            })
            .collect()
    }
}

/// `LINE,COL` with a 1-based line and a 0-based column.
pub fn parse_startpos(s: &str) -> Result<Loc> {
    let Some((line, col)) = s.split_once(',') else {
        bail!("start position must look like LINE,COL: {s:?}");
    };
    let line: usize = line
        .trim()
        .parse()
        .with_context(|| format!("invalid start line {line:?}"))?;
    let col: usize = col
        .trim()
        .parse()
        .with_context(|| format!("invalid start column {col:?}"))?;
    Ok(Loc::new(line.saturating_sub(1), col))
}

/// Text printed by `--options`.
pub fn options_listing() -> String {
    let mut out = String::new();
    for (name, value) in default_global().iter() {
        let _ = writeln!(out, "--set {name}=VALUE");
        let _ = writeln!(out, "    \tThe {name} option. Default value: '{value}'");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("mica").chain(argv.iter().copied()))
    }

    #[test]
    fn plus_argument_sets_start_position() {
        let a = args(&["+12:4", "main.rs", "lib.rs"]);
        assert_eq!(
            a.inputs().unwrap(),
            Inputs {
                paths: vec!["main.rs".into(), "lib.rs".into()],
                start: Some(Loc::new(11, 4)),
            }
        );
        assert_eq!(args(&["+3", "x"]).inputs().unwrap().start, Some(Loc::new(2, 0)));
    }

    #[test]
    fn plus_argument_beats_startpos_flag() {
        let a = args(&["--startpos", "5,1", "+2", "x"]);
        assert_eq!(a.inputs().unwrap().start, Some(Loc::new(1, 0)));
        let a = args(&["--startpos", "5,1", "x"]);
        assert_eq!(a.inputs().unwrap().start, Some(Loc::new(4, 1)));
    }

    #[test]
    fn malformed_positions_are_errors() {
        assert!(parse_startpos("5").is_err());
        assert!(parse_startpos("a,1").is_err());
        assert!(args(&["+x:1"]).inputs().is_err());
    }

    #[test]
    fn repeated_set_flags() {
        let a = args(&["--set", "tabsize=2", "--set", "softwrap=true"]);
        assert_eq!(
            a.overrides().unwrap(),
            vec![("tabsize", "2"), ("softwrap", "true")]
        );
        assert!(args(&["--set", "tabsize"]).overrides().is_err());
    }

    #[test]
    fn options_listing_names_defaults() {
        let listing = options_listing();
        assert!(listing.contains("The tabsize option. Default value: '4'"));
        assert!(listing.contains("--set autosave=VALUE"));
    }
}
