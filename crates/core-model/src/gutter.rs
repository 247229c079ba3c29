//! Per-line gutter messages, grouped by the section (owner) that added them.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GutterKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterMessage {
    /// Zero-based buffer line.
    pub line: usize,
    pub text: String,
    pub kind: GutterKind,
}

#[derive(Debug, Clone, Default)]
pub struct GutterMessages {
    sections: BTreeMap<String, Vec<GutterMessage>>,
}

impl GutterMessages {
    /// Add a message unless any section already marks `line`. Returns
    /// whether it was added.
    pub fn add(&mut self, section: &str, line: usize, text: impl Into<String>, kind: GutterKind) -> bool {
        if self.at_line(line).is_some() {
            return false;
        }
        self.sections
            .entry(section.to_string())
            .or_default()
            .push(GutterMessage {
                line,
                text: text.into(),
                kind,
            });
        true
    }

    pub fn clear(&mut self, section: &str) {
        self.sections.remove(section);
    }

    pub fn clear_all(&mut self) {
        self.sections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Vec::is_empty)
    }

    pub fn at_line(&self, line: usize) -> Option<&GutterMessage> {
        self.sections.values().flatten().find(|m| m.line == line)
    }
}
