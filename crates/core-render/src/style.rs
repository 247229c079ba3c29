//! Colorscheme seam.
//!
//! Composition asks for styles by group name and never builds colors
//! itself. Names are dotted; a lookup for `gutter-error` or `tabbar.active`
//! that the scheme does not know falls back to the part before the last
//! separator, then to `default`.
//!
//! Groups used by the compositor:
//! `default`, `line-number`, `current-line-number`, `gutter-info`,
//! `gutter-warning`, `gutter-error`, `divider`, `selection`, `cursor`,
//! `cursor-line`, `color-column`, `statusline`, `tabbar`, `tabbar.active`,
//! `message`, `error-message`.

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use std::collections::HashMap;

pub trait StyleLookup {
    /// Style for `group`, or `None` when the scheme does not define it.
    fn lookup(&self, group: &str) -> Option<ContentStyle>;

    /// Style for `group` with fallback to parent groups and `default`.
    fn style(&self, group: &str) -> ContentStyle {
        let mut name = group;
        loop {
            if let Some(style) = self.lookup(name) {
                return style;
            }
            match name.rfind(['.', '-']) {
                Some(i) => name = &name[..i],
                None => return self.lookup("default").unwrap_or_default(),
            }
        }
    }
}

/// Built-in scheme for 16-color terminals.
#[derive(Debug, Clone)]
pub struct DefaultStyles {
    groups: HashMap<&'static str, ContentStyle>,
}

fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

fn bg(color: Color) -> ContentStyle {
    ContentStyle {
        background_color: Some(color),
        ..ContentStyle::default()
    }
}

fn attr(a: Attribute) -> ContentStyle {
    ContentStyle {
        attributes: Attributes::from(a),
        ..ContentStyle::default()
    }
}

impl Default for DefaultStyles {
    fn default() -> Self {
        let groups = HashMap::from([
            ("default", ContentStyle::default()),
            ("line-number", fg(Color::DarkGrey)),
            ("current-line-number", fg(Color::Yellow)),
            ("gutter-info", fg(Color::Blue)),
            ("gutter-warning", fg(Color::Yellow)),
            ("gutter-error", fg(Color::Red)),
            ("divider", attr(Attribute::Reverse)),
            ("selection", attr(Attribute::Reverse)),
            ("cursor", attr(Attribute::Reverse)),
            ("cursor-line", bg(Color::Black)),
            ("color-column", bg(Color::DarkGrey)),
            ("statusline", attr(Attribute::Reverse)),
            ("tabbar", attr(Attribute::Reverse)),
            ("tabbar.active", ContentStyle::default()),
            ("message", ContentStyle::default()),
            ("error-message", fg(Color::Red)),
        ]);
        Self { groups }
    }
}

impl DefaultStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace or add a group.
    pub fn set(&mut self, group: &'static str, style: ContentStyle) {
        self.groups.insert(group, style);
    }
}

impl StyleLookup for DefaultStyles {
    fn lookup(&self, group: &str) -> Option<ContentStyle> {
        self.groups.get(group).copied()
    }
}
