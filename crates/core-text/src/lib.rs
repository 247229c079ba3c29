//! Rope-based text buffer used by every view.
//!
//! Positions are expressed as [`Loc`] values: a line index plus a character
//! column inside that line (trailing newline excluded). The buffer owns only
//! text and file identity; cursors live one layer up in `core-state`.

use anyhow::{Context, Result};
use ropey::Rope;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub mod motion;
pub mod width;

pub use width::{char_width, string_width, visual_x};

/// A position inside a buffer expressed as (line index, char column).
///
/// Field order matters: the derived ordering compares `line` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

impl Loc {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
    pub const fn origin() -> Self {
        Self { line: 0, col: 0 }
    }
}

/// Line terminator used when the buffer is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Unix,
    Dos,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Unix => "unix",
            FileFormat::Dos => "dos",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unix" => Some(FileFormat::Unix),
            "dos" => Some(FileFormat::Dos),
            _ => None,
        }
    }
}

/// Immutable copy of a buffer's contents handed to a save worker.
#[derive(Debug, Clone)]
pub struct SaveSnapshot {
    pub path: PathBuf,
    pub contents: String,
    pub revision: u64,
}

/// Write a snapshot to disk. Blocking; run it on a worker.
pub fn write_snapshot(snapshot: &SaveSnapshot) -> Result<SystemTime> {
    if let Some(parent) = snapshot.path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&snapshot.path, snapshot.contents.as_bytes())
        .with_context(|| format!("writing {}", snapshot.path.display()))?;
    let meta = std::fs::metadata(&snapshot.path)?;
    Ok(meta.modified()?)
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
    path: Option<PathBuf>,
    modified: bool,
    revision: u64,
    mod_time: Option<SystemTime>,
    pub fileformat: FileFormat,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("lines", &self.num_lines())
            .field("modified", &self.modified)
            .field("revision", &self.revision)
            .finish()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice. CRLF input is
    /// normalized and remembered as the dos file format.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        let (text, fileformat) = if content.contains("\r\n") {
            (content.replace("\r\n", "\n"), FileFormat::Dos)
        } else {
            (content.to_string(), FileFormat::Unix)
        };
        Self {
            rope: Rope::from_str(&text),
            name: name.into(),
            path: None,
            modified: false,
            revision: 0,
            mod_time: None,
            fileformat,
        }
    }

    /// Open a file. A missing file yields an empty buffer bound to that path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        if !path.exists() {
            let mut buf = Self::from_str(name, "");
            buf.path = Some(path.to_path_buf());
            return Ok(buf);
        }
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let mut buf = Self::from_str(name, &text);
        buf.path = Some(path.to_path_buf());
        buf.mod_time = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        Ok(buf)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.name = path.display().to_string();
        self.path = Some(path);
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Monotonic edit counter; bumps on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total number of lines (an empty buffer still has one line).
    pub fn num_lines(&self) -> usize {
        let n = self.rope.len_lines();
        // ropey reports a phantom empty line after a trailing newline; keep it
        // so the cursor can rest there, matching how the file is displayed.
        n.max(1)
    }

    /// The requested line without its trailing newline. Out of range yields "".
    pub fn line(&self, idx: usize) -> String {
        if idx >= self.rope.len_lines() {
            return String::new();
        }
        let mut s = self.rope.line(idx).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        s
    }

    /// Length of a line in characters (newline excluded).
    pub fn line_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        let n = line.len_chars();
        if n > 0 && line.char(n - 1) == '\n' {
            n - 1
        } else {
            n
        }
    }

    /// Location one past the final character.
    pub fn end(&self) -> Loc {
        let last = self.num_lines() - 1;
        Loc::new(last, self.line_len(last))
    }

    /// Clamp a location into the buffer.
    pub fn clamp(&self, loc: Loc) -> Loc {
        let line = loc.line.min(self.num_lines() - 1);
        Loc::new(line, loc.col.min(self.line_len(line)))
    }

    fn char_index(&self, loc: Loc) -> usize {
        let loc = self.clamp(loc);
        self.rope.line_to_char(loc.line) + loc.col
    }

    fn loc_of_char(&self, idx: usize) -> Loc {
        let idx = idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(idx);
        Loc::new(line, idx - self.rope.line_to_char(line))
    }

    /// Insert text at `loc`, returning the location just past the inserted text.
    pub fn insert(&mut self, loc: Loc, text: &str) -> Loc {
        let start = self.char_index(loc);
        self.rope.insert(start, text);
        self.touch();
        self.loc_of_char(start + text.chars().count())
    }

    /// Remove `[start, end)` and return the removed text.
    pub fn remove(&mut self, start: Loc, end: Loc) -> String {
        let (a, b) = (self.char_index(start), self.char_index(end));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        if a == b {
            return String::new();
        }
        let removed = self.rope.slice(a..b).to_string();
        self.rope.remove(a..b);
        self.touch();
        removed
    }

    /// Replace `[start, end)` with `text`; returns the end of the new text.
    pub fn replace(&mut self, start: Loc, end: Loc, text: &str) -> Loc {
        let start = start.min(end);
        self.remove(start, end.max(start));
        self.insert(start, text)
    }

    /// Text inside `[start, end)`.
    pub fn slice(&self, start: Loc, end: Loc) -> String {
        let (a, b) = (self.char_index(start), self.char_index(end));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.rope.slice(a..b).to_string()
    }

    /// Whole buffer with `\n` line endings.
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    /// Char at a location, `None` at or past the end of the line.
    pub fn char_at(&self, loc: Loc) -> Option<char> {
        if loc.line >= self.rope.len_lines() || loc.col >= self.line_len(loc.line) {
            return None;
        }
        Some(self.rope.line(loc.line).char(loc.col))
    }

    fn touch(&mut self) {
        self.modified = true;
        self.revision += 1;
    }

    /// Capture the contents for a save worker, converting line endings.
    pub fn snapshot(&self) -> Option<SaveSnapshot> {
        let path = self.path.clone()?;
        let mut contents = self.contents();
        if self.fileformat == FileFormat::Dos {
            contents = contents.replace('\n', "\r\n");
        }
        Some(SaveSnapshot {
            path,
            contents,
            revision: self.revision,
        })
    }

    /// Record a completed save. The modified flag clears only if nothing was
    /// edited while the worker was writing.
    pub fn mark_saved(&mut self, revision: u64, mod_time: Option<SystemTime>) {
        if revision == self.revision {
            self.modified = false;
        }
        if mod_time.is_some() {
            self.mod_time = mod_time;
        }
    }

    /// Returns true once when the file on disk changed since it was loaded or
    /// last saved.
    pub fn check_mod_time(&mut self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let Ok(current) = std::fs::metadata(path).and_then(|m| m.modified()) else {
            return false;
        };
        match self.mod_time {
            Some(known) if known != current => {
                self.mod_time = Some(current);
                true
            }
            None => {
                self.mod_time = Some(current);
                false
            }
            _ => false,
        }
    }

    /// Filetype guessed from the file extension.
    pub fn detect_filetype(&self) -> &'static str {
        let ext = self
            .path
            .as_deref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "rs" => "rust",
            "go" => "go",
            "c" | "h" => "c",
            "cc" | "cpp" | "hpp" | "cxx" => "c++",
            "py" => "python",
            "js" | "mjs" => "javascript",
            "ts" => "typescript",
            "lua" => "lua",
            "md" | "markdown" => "markdown",
            "toml" => "toml",
            "json" => "json",
            "yaml" | "yml" => "yaml",
            "sh" | "bash" => "shell",
            "html" | "htm" => "html",
            "txt" => "text",
            "" if self.name.ends_with("Makefile") => "makefile",
            _ => "Unknown",
        }
    }
}
