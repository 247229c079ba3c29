//! Screen composition.
//!
//! Builds the full frame for the current tab: the tab bar when more than
//! one tab is open, every pane (divider, gutter, text, status line) and the
//! info bar. Geometry comes from each pane's viewport; this module only
//! paints what the viewport says is visible.

use core_keymap::ActionId;
use core_model::viewport::wrap_layout;
use core_model::{EditorSession, GutterKind, MessageKind, View};
use core_text::Loc;
use core_text::width::{char_width, string_width};

use crate::Frame;
use crate::status::{StatusContext, build_status};
use crate::style::StyleLookup;

/// Compose the whole screen for `session`.
pub fn compose(session: &EditorSession, styles: &dyn StyleLookup) -> Frame {
    let (width, height) = session.size();
    let mut frame = Frame::new(width, height);
    if session.tabs.len() > 1 {
        draw_tabbar(&mut frame, session, styles);
    }
    let help = help_chord(session);
    let recording = session.ctx.macros.is_recording();
    if let Some(tab) = session.cur_tab() {
        for (i, view) in tab.views().iter().enumerate() {
            let current = i == tab.cur_index();
            draw_view(&mut frame, view, current, styles);
            draw_status(&mut frame, view, recording, help.as_deref(), styles);
            if current {
                frame.cursor = cursor_cell(view);
            }
        }
    }
    if session.has_infobar() && height > 0 {
        draw_infobar(&mut frame, session, styles);
    }
    frame
}

fn help_chord(session: &EditorSession) -> Option<String> {
    session
        .ctx
        .bindings
        .iter_sorted()
        .into_iter()
        .find(|(_, actions)| matches!(*actions, [ActionId::ToggleHelp]))
        .map(|(chord, _)| chord)
}

fn draw_tabbar(frame: &mut Frame, session: &EditorSession, styles: &dyn StyleLookup) {
    let bar = styles.style("tabbar");
    let active = styles.style("tabbar.active");
    let w = frame.width;
    frame.fill(0, 0, w, bar);
    let mut x = 0;
    for (i, label) in session.tab_labels().iter().enumerate() {
        let style = if i == session.cur_tab { active } else { bar };
        x = frame.put_str(x, 0, w, label, style);
        // One separator cell between labels.
        x = x.saturating_add(1);
        if x >= w {
            break;
        }
    }
}

/// A visible char: row within its line, cell right of the gutter, width.
struct Placed {
    col: usize,
    row: usize,
    x: usize,
    w: usize,
    ch: char,
}

/// Lay out `text` for the pane. Without soft wrap chars scrolled off to the
/// left are dropped and `x` is relative to `left_col`.
fn place_line(text: &str, softwrap: bool, usable: usize, tabsize: usize, left_col: usize) -> Vec<Placed> {
    if softwrap {
        return wrap_layout(text, usable, tabsize)
            .into_iter()
            .zip(text.chars())
            .enumerate()
            .map(|(col, ((row, x), ch))| Placed {
                col,
                row,
                x,
                w: if ch == '\t' { tabsize } else { char_width(ch) },
                ch,
            })
            .collect();
    }
    let mut out = Vec::new();
    let mut vx = 0;
    for (col, ch) in text.chars().enumerate() {
        let w = if ch == '\t' {
            tabsize - (vx % tabsize)
        } else {
            char_width(ch)
        };
        if vx >= left_col {
            out.push(Placed {
                col,
                row: 0,
                x: vx - left_col,
                w,
                ch,
            });
        }
        vx += w;
        if vx >= left_col + usable {
            break;
        }
    }
    out
}

fn draw_view(frame: &mut Frame, view: &View, current: bool, styles: &dyn StyleLookup) {
    let vp = &view.viewport;
    let st = &view.state;
    let softwrap = st.settings.get_bool("softwrap");
    let tabsize = st.tabsize().max(1);
    let usable = vp.usable_width();
    let text_x = vp.x as usize + vp.line_num_offset;
    let right = (vp.x as usize + vp.width).min(frame.width as usize) as u16;
    let active = st.cursor();
    let cursorline = current && st.settings.get_bool("cursorline") && !active.has_selection();
    let colorcolumn = st.settings.get_usize("colorcolumn");
    let base = styles.style("default");
    let line_style = styles.style("cursor-line");
    let sel_style = styles.style("selection");
    let cursor_style = styles.style("cursor");
    let cc_style = styles.style("color-column");

    // Cursors painted as cells: all but the one the terminal cursor marks.
    let painted: Vec<Loc> = st
        .cursors
        .iter()
        .filter(|c| !(current && c.id() == active.id()))
        .map(|c| c.loc)
        .collect();
    let selected = |loc: Loc| {
        st.cursors
            .iter()
            .any(|c| c.selection.is_some_and(|s| s.contains(loc)))
    };

    let mut row = 0;
    let mut line = vp.topline;
    while row < vp.height {
        let y = vp.y + row as u16;
        if line >= st.num_lines() {
            draw_gutter(frame, view, None, y, styles);
            row += 1;
            continue;
        }
        let text = st.line(line);
        let placed = place_line(&text, softwrap, usable, tabsize, vp.left_col);
        let rows = if softwrap {
            placed.last().map_or(1, |p| p.row + 1)
        } else {
            1
        };
        for r in 0..rows.min(vp.height - row) {
            let y = y + r as u16;
            draw_gutter(frame, view, (r == 0).then_some(line), y, styles);
            let style = if cursorline && line == active.loc.line {
                line_style
            } else {
                base
            };
            frame.fill(text_x as u16, y, right.saturating_sub(text_x as u16), style);
            if colorcolumn > 0 {
                let vc = if softwrap {
                    Some(colorcolumn)
                } else {
                    colorcolumn.checked_sub(vp.left_col)
                };
                if let Some(vc) = vc.filter(|&c| c < usable) {
                    frame.restyle((text_x + vc) as u16, y, 1, cc_style);
                }
            }
        }
        let mut end_x = (0, 0);
        for p in &placed {
            if p.row >= vp.height - row || p.x >= usable {
                continue;
            }
            let loc = Loc::new(line, p.col);
            let sx = (text_x + p.x) as u16;
            let sy = vp.y + (row + p.row) as u16;
            let mut style = frame.cell(sx, sy).map_or(base, |c| c.style);
            if selected(loc) {
                style = sel_style;
            }
            if painted.contains(&loc) {
                style = cursor_style;
            }
            let w = p.w.min(usable - p.x) as u16;
            if p.ch == '\t' || p.w > usable - p.x {
                frame.fill(sx, sy, w, style);
            } else {
                let mut buf = [0u8; 4];
                frame.set_cluster(sx, sy, p.ch.encode_utf8(&mut buf), w, style);
            }
            end_x = (p.row, p.x + p.w);
        }
        // A cursor at the end of the line owns the cell after the last char.
        let len = st.text.line_len(line);
        let eol_cell = match placed.last() {
            Some(p) if p.col + 1 == len => Some(end_x),
            None if len == 0 && vp.left_col == 0 => Some((0, 0)),
            _ => None,
        };
        if let Some((r, x)) = eol_cell
            && painted.contains(&Loc::new(line, len))
            && r < vp.height - row
            && x < usable
        {
            frame.restyle((text_x + x) as u16, vp.y + (row + r) as u16, 1, cursor_style);
        }
        row += rows;
        line += 1;
    }
}

/// Divider, message marker and line number for one text row. `line` is
/// `None` for continuation rows and rows past the end of the buffer.
fn draw_gutter(frame: &mut Frame, view: &View, line: Option<usize>, y: u16, styles: &dyn StyleLookup) {
    let st = &view.state;
    let mut x = view.viewport.x;
    if view.region().x != 0 {
        frame.set_cluster(x, y, "|", 1, styles.style("divider"));
        x += 1;
    }
    if !view.gutter.is_empty() {
        match line.and_then(|n| view.gutter.at_line(n)) {
            Some(msg) => {
                let group = match msg.kind {
                    GutterKind::Info => "gutter-info",
                    GutterKind::Warning => "gutter-warning",
                    GutterKind::Error => "gutter-error",
                };
                frame.put_str(x, y, x + 2, ">>", styles.style(group));
            }
            None => frame.fill(x, y, 2, styles.style("default")),
        }
        x += 2;
    }
    if st.settings.get_bool("ruler") {
        let digits = st.num_lines().to_string().len();
        let label = match line {
            Some(n) => format!("{:>digits$} ", n + 1),
            None => " ".repeat(digits + 1),
        };
        let group = if line == Some(st.cursor().loc.line) {
            "current-line-number"
        } else {
            "line-number"
        };
        frame.put_str(x, y, x + digits as u16 + 1, &label, styles.style(group));
    }
}

fn draw_status(
    frame: &mut Frame,
    view: &View,
    recording: bool,
    help: Option<&str>,
    styles: &dyn StyleLookup,
) {
    let Some(y) = view.statusline_row() else {
        return;
    };
    let region = view.region();
    let ctx = StatusContext::for_view(view, recording, help);
    let text = build_status(&ctx, region.width as usize);
    let style = styles.style("statusline");
    frame.fill(region.x, y, region.width, style);
    frame.put_str(region.x, y, region.x + region.width, &text, style);
}

fn draw_infobar(frame: &mut Frame, session: &EditorSession, styles: &dyn StyleLookup) {
    let y = frame.height - 1;
    let w = frame.width;
    let messenger = &session.ctx.messenger;
    let (mut text, prompt_cursor) = messenger.line();
    let mut group = "message";
    if !messenger.is_prompting() {
        match messenger.message() {
            Some(m) if m.kind == MessageKind::Error => group = "error-message",
            Some(_) => {}
            None => {
                if let Some(msg) = session
                    .cur_view()
                    .and_then(|v| v.gutter.at_line(v.state.cursor().loc.line))
                {
                    text = msg.text.clone();
                }
            }
        }
    }
    let style = styles.style(group);
    frame.fill(0, y, w, styles.style("default"));
    frame.put_str(0, y, w, &text, style);
    if let Some(col) = prompt_cursor {
        let before: String = text.chars().take(col).collect();
        let x = string_width(&before, 1).min(w.saturating_sub(1) as usize);
        frame.cursor = Some((x as u16, y));
    }
}

/// Terminal cursor cell for the active cursor of `view`, when visible.
fn cursor_cell(view: &View) -> Option<(u16, u16)> {
    let vp = &view.viewport;
    let (vx, vy) = view.visual_location(view.state.cursor().loc)?;
    if vx >= vp.usable_width() {
        return None;
    }
    Some(((vp.x as usize + vp.line_num_offset + vx) as u16, vp.y + vy as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefaultStyles;
    use core_config::{ConfigStore, OptionValue};
    use core_model::{SessionContext, SplitDir, ViewKind};
    use core_text::Buffer;
    use pretty_assertions::assert_eq;

    fn session(text: &str, w: u16, h: u16) -> EditorSession {
        let mut s = EditorSession::new(SessionContext::detached(ConfigStore::with_defaults()), w, h);
        let view = s.create_view(Buffer::from_str("a.txt", text), ViewKind::Default);
        s.add_tab(view);
        s
    }

    fn set(s: &mut EditorSession, option: &str, value: OptionValue) {
        if let Some(v) = s.cur_view_mut() {
            v.state.settings.insert(option, value);
            v.update_gutter_width();
        }
    }

    #[test]
    fn pane_with_ruler_status_and_infobar() {
        let mut s = session("fn main() {\n\tbody\n}", 30, 6);
        s.ctx.messenger.info("hello");
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(0), "1 fn main() {");
        assert_eq!(f.row_text(1), "2     body");
        assert_eq!(f.row_text(2), "3 }");
        assert_eq!(f.row_text(3), "");
        assert!(f.row_text(4).starts_with("a.txt (1,1) | ft:"));
        assert_eq!(f.row_text(5), "hello");
        assert_eq!(f.cursor, Some((2, 0)));
    }

    #[test]
    fn softwrap_continues_rows_without_numbers() {
        let mut s = session("abcdefgh\nxy", 7, 5);
        set(&mut s, "softwrap", OptionValue::Bool(true));
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(0), "1 abcde");
        assert_eq!(f.row_text(1), "  fgh");
        assert_eq!(f.row_text(2), "2 xy");
    }

    #[test]
    fn horizontal_scroll_hides_left_columns() {
        let mut s = session("0123456789", 20, 4);
        set(&mut s, "ruler", OptionValue::Bool(false));
        if let Some(v) = s.cur_view_mut() {
            v.viewport.left_col = 4;
        }
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(0), "456789");
        assert_eq!(f.cursor, None);
    }

    #[test]
    fn tab_bar_and_split_divider() {
        let mut s = session("left", 20, 6);
        let second = s.create_view(Buffer::from_str("b.txt", "two"), ViewKind::Default);
        s.add_tab(second);
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(0), " a.txt  [b.txt]");

        let right = s.create_view(Buffer::from_str("c.txt", "three"), ViewKind::Default);
        if let Some(tab) = s.cur_tab_mut() {
            tab.add_split(right, SplitDir::Vertical, true).expect("split");
        }
        s.relayout();
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(1), "1 two     |1 three");
    }

    #[test]
    fn prompt_places_the_cursor_on_the_infobar() {
        let mut s = session("x", 20, 4);
        s.ctx.messenger.open_command("set");
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(3), "> set");
        assert_eq!(f.cursor, Some((5, 3)));
    }

    #[test]
    fn selection_and_secondary_cursors_are_styled() {
        let mut s = session("abc\ndef", 20, 4);
        set(&mut s, "ruler", OptionValue::Bool(false));
        set(&mut s, "cursorline", OptionValue::Bool(false));
        if let Some(v) = s.cur_view_mut() {
            v.state.cursor_mut().set_selection(Loc::new(0, 0), Loc::new(0, 2));
            v.state.cursors.add(Loc::new(1, 3));
        }
        let styles = DefaultStyles::new();
        let f = compose(&s, &styles);
        assert_eq!(f.cell(0, 0).map(|c| c.style), Some(styles.style("selection")));
        assert_eq!(f.cell(2, 0).map(|c| c.style), Some(styles.style("default")));
        assert_eq!(f.cell(3, 1).map(|c| c.style), Some(styles.style("cursor")));
    }

    #[test]
    fn gutter_message_marker_and_infobar_text() {
        let mut s = session("a\nb", 20, 5);
        if let Some(v) = s.cur_view_mut() {
            v.add_gutter_message("lint", 0, "unused thing", GutterKind::Warning);
        }
        let f = compose(&s, &DefaultStyles::new());
        assert_eq!(f.row_text(0), ">>1 a");
        assert_eq!(f.row_text(1), "  2 b");
        assert_eq!(f.row_text(4), "unused thing");
    }
}
