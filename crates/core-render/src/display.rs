//! The redraw seam between the event loop and the screen.

use anyhow::Result;
use core_model::EditorSession;
use std::io::Write;
use std::time::Instant;
use tracing::trace;

use crate::compose::compose;
use crate::style::StyleLookup;
use crate::writer::TermWriter;

/// Something that can show the session. The loop calls `redraw` once per
/// iteration, after the event drain.
pub trait Display {
    fn redraw(&mut self, session: &EditorSession) -> Result<()>;

    /// The next redraw must repaint everything (terminal resized or
    /// scribbled on by another program).
    fn invalidate(&mut self) {}
}

/// Display that composes frames and writes them to a terminal.
pub struct TerminalDisplay<W: Write, S: StyleLookup> {
    writer: TermWriter<W>,
    styles: S,
}

impl<W: Write, S: StyleLookup> TerminalDisplay<W, S> {
    pub fn new(out: W, styles: S) -> Self {
        Self {
            writer: TermWriter::new(out),
            styles,
        }
    }

    pub fn writer(&self) -> &TermWriter<W> {
        &self.writer
    }
}

impl<W: Write, S: StyleLookup> Display for TerminalDisplay<W, S> {
    fn redraw(&mut self, session: &EditorSession) -> Result<()> {
        let started = Instant::now();
        let frame = compose(session, &self.styles);
        let stats = self.writer.paint(frame)?;
        trace!(
            target: "render",
            rows = stats.rows_painted,
            prints = stats.print_commands,
            full = stats.full,
            micros = started.elapsed().as_micros() as u64,
            "frame"
        );
        Ok(())
    }

    fn invalidate(&mut self) {
        self.writer.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefaultStyles;
    use core_config::ConfigStore;
    use core_model::{SessionContext, ViewKind};
    use core_text::Buffer;

    #[test]
    fn typing_repaints_few_rows() {
        let mut s = EditorSession::new(SessionContext::detached(ConfigStore::with_defaults()), 40, 10);
        let view = s.create_view(Buffer::from_str("a", "one\ntwo\nthree"), ViewKind::Default);
        s.add_tab(view);
        let mut d = TerminalDisplay::new(Vec::new(), DefaultStyles::new());
        d.redraw(&s).unwrap();
        assert!(d.writer().last_stats().full);

        if let Some(v) = s.cur_view_mut() {
            v.state.insert(core_text::Loc::new(2, 0), "x");
        }
        d.redraw(&s).unwrap();
        let stats = d.writer().last_stats();
        assert!(!stats.full);
        // The edited row and the status line (modified flag).
        assert_eq!(stats.rows_painted, 2);
    }
}
