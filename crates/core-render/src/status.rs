//! Status line composition.
//!
//! Two stages: `compose_status` produces an ordered list of
//! `StatusSegment`s from a `StatusContext`, and `format_status` lays them out
//! for a given width: left segments from the start, right segments flush
//! against the end. When both halves do not fit the right half is dropped.
//!
//! Left: `name +(line,col) OVR REC | ft:filetype | fileformat | kind`
//! Right: `<chord>: help`

use core_model::{View, display_name};
use core_text::width::string_width;
use std::fmt::Write as _;

/// What the status line needs to know about a pane.
pub struct StatusContext<'a> {
    pub name: String,
    pub modified: bool,
    /// 0-based cursor line and char column.
    pub line: usize,
    pub col: usize,
    pub filetype: &'a str,
    pub fileformat: &'static str,
    pub overwrite: bool,
    pub recording: bool,
    /// Scratch pane kind name, shown instead of the file format details.
    pub kind: Option<&'static str>,
    /// Chord bound to ToggleHelp, if any.
    pub help_chord: Option<&'a str>,
}

impl<'a> StatusContext<'a> {
    pub fn for_view(view: &'a View, recording: bool, help_chord: Option<&'a str>) -> Self {
        let cursor = view.state.cursor().loc;
        Self {
            name: display_name(&view.state.text),
            modified: view.state.modified(),
            line: cursor.line,
            col: cursor.col,
            filetype: view.state.settings.get_text("filetype"),
            fileformat: view.state.text.fileformat.as_str(),
            overwrite: view.overwrite,
            recording,
            kind: view.kind.is_scratch().then(|| view.kind.name()),
            help_chord,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    FileName(String),
    Modified,
    /// 1-based cursor line and column.
    Position { line_1: usize, col_1: usize },
    Overwrite,
    Recording,
    FileType(&'a str),
    FileFormat(&'static str),
    Kind(&'static str),
    /// Right-aligned hint.
    Help(&'a str),
}

impl StatusSegment<'_> {
    fn is_right(&self) -> bool {
        matches!(self, StatusSegment::Help(_))
    }
}

pub fn compose_status<'a>(ctx: &'a StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let mut out = Vec::with_capacity(8);
    out.push(StatusSegment::FileName(ctx.name.clone()));
    if ctx.modified {
        out.push(StatusSegment::Modified);
    }
    out.push(StatusSegment::Position {
        line_1: ctx.line + 1,
        col_1: ctx.col + 1,
    });
    if ctx.overwrite {
        out.push(StatusSegment::Overwrite);
    }
    if ctx.recording {
        out.push(StatusSegment::Recording);
    }
    match ctx.kind {
        Some(kind) => out.push(StatusSegment::Kind(kind)),
        None => {
            out.push(StatusSegment::FileType(ctx.filetype));
            out.push(StatusSegment::FileFormat(ctx.fileformat));
        }
    }
    if let Some(chord) = ctx.help_chord {
        out.push(StatusSegment::Help(chord));
    }
    out
}

fn format_half(segments: &[StatusSegment<'_>]) -> String {
    let mut s = String::with_capacity(48);
    for seg in segments {
        match seg {
            StatusSegment::FileName(name) => s.push_str(name),
            StatusSegment::Modified => s.push_str(" +"),
            StatusSegment::Position { line_1, col_1 } => {
                let _ = write!(s, " ({line_1},{col_1})");
            }
            StatusSegment::Overwrite => s.push_str(" OVR"),
            StatusSegment::Recording => s.push_str(" REC"),
            StatusSegment::FileType(ft) => {
                let _ = write!(s, " | ft:{ft}");
            }
            StatusSegment::FileFormat(ff) => {
                let _ = write!(s, " | {ff}");
            }
            StatusSegment::Kind(kind) => {
                let _ = write!(s, " | {kind}");
            }
            StatusSegment::Help(chord) => {
                let _ = write!(s, "{chord}: help");
            }
        }
    }
    s
}

/// Lay out segments on a line of `width` cells (padded with spaces).
pub fn format_status(segments: &[StatusSegment<'_>], width: usize) -> String {
    let (right, left): (Vec<_>, Vec<_>) = segments.iter().cloned().partition(StatusSegment::is_right);
    let mut line = format_half(&left);
    let right = format_half(&right);
    let used = string_width(&line, 1);
    let right_w = string_width(&right, 1);
    if !right.is_empty() && used + 1 + right_w <= width {
        line.push_str(&" ".repeat(width - used - right_w));
        line.push_str(&right);
    } else if used < width {
        line.push_str(&" ".repeat(width - used));
    }
    line
}

pub fn build_status(ctx: &StatusContext<'_>, width: usize) -> String {
    format_status(&compose_status(ctx), width)
}
