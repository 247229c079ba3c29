//! Text mutation: rune insertion, newline/tab, deletion, clipboard and
//! line moves. Each body acts for the active cursor; edits go through
//! `BufferState` so the other cursors follow the text.

use core_model::{SessionContext, View};
use core_state::{BufferState, Selection};
use core_text::Loc;
use core_text::motion::leading_whitespace;

/// Insert `rune` at the active cursor, replacing the selection. In
/// overwrite mode the character under the cursor is replaced instead.
pub fn insert_rune(view: &mut View, ctx: &mut SessionContext, rune: char) {
    let overwrite = view.overwrite;
    let st = &mut view.state;
    st.delete_selection();
    let loc = st.cursor().loc;
    let mut buf = [0u8; 4];
    let text = rune.encode_utf8(&mut buf);
    if overwrite && loc.col < st.text.line_len(loc.line) {
        st.replace(loc, Loc::new(loc.line, loc.col + 1), text);
    } else {
        st.insert(loc, text);
    }
    let at = st.cursor().loc;
    st.goto(at);
    let id = view.id;
    ctx.call_hook(|host| host.on_rune(id, rune));
}

/// Paste `clip` at the active cursor. With `smartpaste` a clip without its
/// own indentation picks up the cursor line's indentation on every line.
pub fn paste_text(view: &mut View, ctx: &mut SessionContext, clip: &str) {
    let st = &mut view.state;
    let loc = st.cursor().loc;
    let mut clip = clip.to_string();
    if st.settings.get_bool("smartpaste")
        && loc.col > 0
        && leading_whitespace(clip.trim_start_matches(['\r', '\n'])).is_empty()
    {
        let line = st.line(loc.line);
        let indent = leading_whitespace(&line);
        clip = clip.replace('\n', &format!("\n{indent}"));
    }
    st.delete_selection();
    let at = st.cursor().loc;
    st.insert(at, &clip);
    let end = st.cursor().loc;
    st.goto(end);
    ctx.messenger.info("Pasted clipboard");
}

pub(crate) fn insert_newline(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    st.delete_selection();
    let loc = st.cursor().loc;
    let autoindent = st.settings.get_bool("autoindent");
    let indent: String = if autoindent {
        leading_whitespace(&st.line(loc.line)).chars().take(loc.col).collect()
    } else {
        String::new()
    };
    st.insert(loc, &format!("\n{indent}"));
    // A line left holding only indentation is emptied.
    let prev = st.line(loc.line);
    if autoindent
        && !st.settings.get_bool("keepautoindent")
        && !prev.is_empty()
        && leading_whitespace(&prev).len() == prev.len()
    {
        let len = st.text.line_len(loc.line);
        st.remove(Loc::new(loc.line, 0), Loc::new(loc.line, len));
    }
    let at = st.cursor().loc;
    st.goto(at);
    true
}

pub(crate) fn insert_tab(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    st.delete_selection();
    let text = if st.settings.get_bool("tabstospaces") {
        let ts = st.tabsize();
        " ".repeat(ts - st.cursor_visual_x() % ts)
    } else {
        "\t".to_string()
    };
    let loc = st.cursor().loc;
    st.insert(loc, &text);
    let at = st.cursor().loc;
    st.goto(at);
    true
}

pub(crate) fn backspace(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    if st.delete_selection().is_some() {
        return true;
    }
    let loc = st.cursor().loc;
    let start = if loc.col == 0 {
        if loc.line == 0 {
            return true;
        }
        Loc::new(loc.line - 1, st.text.line_len(loc.line - 1))
    } else {
        // Indentation made of spaces is removed one tab stop at a time.
        let ts = st.tabsize();
        let before: String = st.line(loc.line).chars().take(loc.col).collect();
        let n = if st.settings.get_bool("tabstospaces")
            && loc.col % ts == 0
            && before.chars().all(|c| c == ' ')
        {
            ts
        } else {
            1
        };
        Loc::new(loc.line, loc.col - n)
    };
    st.remove(start, loc);
    st.goto(start);
    true
}

pub(crate) fn delete(view: &mut View, _: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    if st.delete_selection().is_some() {
        return true;
    }
    let loc = st.cursor().loc;
    let end = if loc.col < st.text.line_len(loc.line) {
        Loc::new(loc.line, loc.col + 1)
    } else if loc.line + 1 < st.num_lines() {
        Loc::new(loc.line + 1, 0)
    } else {
        return true;
    };
    st.remove(loc, end);
    st.goto(loc);
    true
}

pub(crate) fn copy(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    if let Some(text) = view.state.selected_text() {
        ctx.clipboard = text;
        ctx.messenger.info("Copied selection");
    }
    true
}

/// Cut the selection, or the whole line when nothing is selected.
pub(crate) fn cut(view: &mut View, ctx: &mut SessionContext, user: bool) -> bool {
    match view.state.delete_selection() {
        Some(text) => {
            ctx.clipboard = text;
            ctx.messenger.info("Cut selection");
            true
        }
        None => cut_line(view, ctx, user),
    }
}

pub(crate) fn cut_line(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    let line = view.state.cursor().loc.line;
    view.state.select_line_at(line);
    if let Some(text) = view.state.delete_selection() {
        ctx.clipboard = text;
        ctx.messenger.info("Cut line");
    }
    true
}

pub(crate) fn paste(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    let clip = ctx.clipboard.clone();
    paste_text(view, ctx, &clip);
    true
}

pub(crate) fn duplicate_line(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    match st.cursor().selection {
        Some(sel) => {
            let text = st.text.slice(sel.start, sel.end);
            st.cursor_mut().reset_selection();
            st.goto(sel.end);
            st.insert(sel.end, &text);
            ctx.messenger.info("Duplicated selection");
        }
        None => {
            st.end_of_line();
            let loc = st.cursor().loc;
            let line = st.line(loc.line);
            st.insert(loc, &format!("\n{line}"));
            let at = st.cursor().loc;
            st.goto(at);
            ctx.messenger.info("Duplicated line");
        }
    }
    true
}

/// Lines covered by the active cursor: its selection (an exclusive end at
/// column zero does not count) or its own line.
fn line_block(st: &BufferState) -> (usize, usize) {
    let c = st.cursor();
    match c.selection {
        Some(sel) if sel.end.col == 0 && sel.end.line > sel.start.line => (sel.start.line, sel.end.line - 1),
        Some(sel) => (sel.start.line, sel.end.line),
        None => (c.loc.line, c.loc.line),
    }
}

/// Rewrite lines `first..=last` with `lines` and carry every cursor in that
/// range to the line `map` gives. Columns are kept; lines move whole.
fn rewrite_lines(st: &mut BufferState, first: usize, last: usize, lines: &[String], map: impl Fn(usize) -> usize) {
    let saved = st.cursors.clone();
    let len = st.text.line_len(last);
    st.replace(Loc::new(first, 0), Loc::new(last, len), &lines.join("\n"));
    st.cursors = saved;
    let in_range = |line: usize| (first..=last).contains(&line);
    let map_loc = |p: Loc| {
        if in_range(p.line) {
            Loc::new(map(p.line), p.col)
        } else {
            p
        }
    };
    let num_lines = st.text.num_lines();
    // An exclusive selection end at column zero travels with the line above
    // it. When that line lands last, the end moves to its end instead.
    let map_end = |p: Loc| {
        if p.col == 0 && p.line > 0 && in_range(p.line - 1) {
            let line = map(p.line - 1);
            if line + 1 < num_lines {
                Loc::new(line + 1, 0)
            } else {
                Loc::new(line, usize::MAX)
            }
        } else {
            map_loc(p)
        }
    };
    let text = &st.text;
    for c in st.cursors.iter_mut() {
        let sel = c.selection;
        let at = |p: Loc| {
            text.clamp(if sel.is_some_and(|s| s.end == p) {
                map_end(p)
            } else {
                map_loc(p)
            })
        };
        c.loc = at(c.loc);
        c.anchor = c.anchor.map(at);
        c.selection = sel.and_then(|s| Selection::between(at(s.start), at(s.end)));
        c.orig_selection = None;
    }
}

pub(crate) fn move_lines_up(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    let (start, end) = line_block(st);
    if start == 0 {
        ctx.messenger.info("Can not move further up");
        return true;
    }
    let mut lines: Vec<String> = (start..=end).map(|l| st.line(l)).collect();
    lines.push(st.line(start - 1));
    rewrite_lines(st, start - 1, end, &lines, |l| if l == start - 1 { end } else { l - 1 });
    true
}

pub(crate) fn move_lines_down(view: &mut View, ctx: &mut SessionContext, _: bool) -> bool {
    let st = &mut view.state;
    let (start, end) = line_block(st);
    if end + 1 >= st.num_lines() {
        ctx.messenger.info("Can not move further down");
        return true;
    }
    let mut lines = vec![st.line(end + 1)];
    lines.extend((start..=end).map(|l| st.line(l)));
    rewrite_lines(st, start, end + 1, &lines, |l| if l == end + 1 { start } else { l + 1 });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{ConfigStore, OptionValue, default_local};
    use core_events::ViewId;
    use core_text::Buffer;

    fn setup(text: &str) -> (View, SessionContext) {
        let state = BufferState::new(Buffer::from_str("t", text), default_local());
        (
            View::new(ViewId(1), state, 80, 24),
            SessionContext::detached(ConfigStore::with_defaults()),
        )
    }

    #[test]
    fn runes_replace_selection_and_overwrite() {
        let (mut view, mut ctx) = setup("abcd");
        view.state.cursor_mut().set_selection(Loc::new(0, 1), Loc::new(0, 3));
        insert_rune(&mut view, &mut ctx, 'X');
        assert_eq!(view.state.text.contents(), "aXd");
        assert_eq!(view.state.cursor().loc, Loc::new(0, 2));

        view.overwrite = true;
        insert_rune(&mut view, &mut ctx, 'Y');
        insert_rune(&mut view, &mut ctx, 'Z');
        assert_eq!(view.state.text.contents(), "aXYZ");
    }

    #[test]
    fn newline_copies_indent_and_clears_blank_lines() {
        let (mut view, mut ctx) = setup("    foo");
        view.state.goto(Loc::new(0, 7));
        insert_newline(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "    foo\n    ");
        assert_eq!(view.state.cursor().loc, Loc::new(1, 4));

        insert_newline(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "    foo\n\n    ");
        assert_eq!(view.state.cursor().loc, Loc::new(2, 4));
    }

    #[test]
    fn tab_inserts_spaces_to_next_stop() {
        let (mut view, mut ctx) = setup("ab");
        view.state.settings.insert("tabstospaces", OptionValue::Bool(true));
        view.state.goto(Loc::new(0, 2));
        insert_tab(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "ab  ");

        let (mut view, mut ctx) = setup("ab");
        insert_tab(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "\tab");
    }

    #[test]
    fn backspace_joins_lines_and_eats_space_indent() {
        let (mut view, mut ctx) = setup("ab\n        c");
        view.state.settings.insert("tabstospaces", OptionValue::Bool(true));
        view.state.goto(Loc::new(1, 8));
        backspace(&mut view, &mut ctx, true);
        assert_eq!(view.state.line(1), "    c");
        view.state.goto(Loc::new(1, 0));
        backspace(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "ab    c");
        assert_eq!(view.state.cursor().loc, Loc::new(0, 2));
    }

    #[test]
    fn delete_at_line_end_joins() {
        let (mut view, mut ctx) = setup("ab\ncd");
        view.state.goto(Loc::new(0, 2));
        delete(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "abcd");
        view.state.goto(Loc::new(0, 4));
        delete(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "abcd");
    }

    #[test]
    fn cut_without_selection_takes_the_line() {
        let (mut view, mut ctx) = setup("one\ntwo\nthree");
        view.state.goto(Loc::new(1, 1));
        cut(&mut view, &mut ctx, true);
        assert_eq!(ctx.clipboard, "two\n");
        assert_eq!(view.state.text.contents(), "one\nthree");
        paste(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "one\ntwo\nthree");
        assert_eq!(ctx.messenger.message().map(|m| m.text.as_str()), Some("Pasted clipboard"));
    }

    #[test]
    fn smartpaste_reindents_unindented_clips() {
        let (mut view, mut ctx) = setup("  x = 1;");
        view.state.goto(Loc::new(0, 8));
        paste_text(&mut view, &mut ctx, "\ny = 2;\nz = 3;");
        assert_eq!(view.state.text.contents(), "  x = 1;\n  y = 2;\n  z = 3;");

        view.state.settings.insert("smartpaste", OptionValue::Bool(false));
        let end = view.state.text.end();
        view.state.goto(end);
        paste_text(&mut view, &mut ctx, "\nw");
        assert_eq!(view.state.line(3), "w");
    }

    #[test]
    fn duplicate_line_and_selection() {
        let (mut view, mut ctx) = setup("ab\ncd");
        duplicate_line(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "ab\nab\ncd");
        assert_eq!(view.state.cursor().loc, Loc::new(1, 2));

        view.state.cursor_mut().set_selection(Loc::new(2, 0), Loc::new(2, 1));
        duplicate_line(&mut view, &mut ctx, true);
        assert_eq!(view.state.line(2), "ccd");
    }

    #[test]
    fn move_lines_carries_cursor_and_selection() {
        let (mut view, mut ctx) = setup("a\nb\nc\nd");
        view.state.goto(Loc::new(2, 1));
        move_lines_up(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "a\nc\nb\nd");
        assert_eq!(view.state.cursor().loc, Loc::new(1, 1));

        view.state.cursor_mut().set_selection(Loc::new(1, 0), Loc::new(3, 0));
        move_lines_down(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "a\nd\nc\nb");
        assert_eq!(view.state.selected_text().as_deref(), Some("c\nb"));

        move_lines_down(&mut view, &mut ctx, true);
        assert_eq!(
            ctx.messenger.message().map(|m| m.text.as_str()),
            Some("Can not move further down")
        );
    }

    #[test]
    fn block_moved_onto_last_line_keeps_whole_selection() {
        let (mut view, mut ctx) = setup("a\nb\nc");
        view.state.cursor_mut().set_selection(Loc::new(0, 0), Loc::new(2, 0));
        move_lines_down(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "c\na\nb");
        assert_eq!(view.state.selected_text().as_deref(), Some("a\nb"));

        move_lines_up(&mut view, &mut ctx, true);
        assert_eq!(view.state.text.contents(), "a\nb\nc");
        assert_eq!(view.state.selected_text().as_deref(), Some("a\nb"));
    }
}
