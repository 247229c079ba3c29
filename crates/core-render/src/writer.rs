//! Terminal writer.
//!
//! Paints frames through crossterm, repainting only rows that differ from
//! the previously painted frame. A size change (or the first frame) clears
//! the screen and paints every row.
//!
//! Within a row, consecutive leader cells sharing a style are batched into
//! one styled print. Commands are queued and flushed once per frame.

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::{ContentStyle, PrintStyledContent};
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;

use crate::Frame;

/// Counters for the last painted frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PaintStats {
    pub rows_painted: u16,
    pub print_commands: u64,
    pub full: bool,
}

pub struct TermWriter<W: Write> {
    out: W,
    prev: Option<Frame>,
    last: PaintStats,
}

impl<W: Write> TermWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prev: None,
            last: PaintStats::default(),
        }
    }

    /// Forget the previous frame so the next paint is a full repaint.
    pub fn invalidate(&mut self) {
        self.prev = None;
    }

    pub fn last_stats(&self) -> PaintStats {
        self.last
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn paint(&mut self, frame: Frame) -> Result<PaintStats> {
        let full = self
            .prev
            .as_ref()
            .is_none_or(|p| p.width != frame.width || p.height != frame.height);
        let mut stats = PaintStats {
            full,
            ..PaintStats::default()
        };
        queue!(self.out, Hide)?;
        if full {
            queue!(self.out, Clear(ClearType::All))?;
        }
        for y in 0..frame.height {
            let changed = full || self.prev.as_ref().is_none_or(|p| p.row(y) != frame.row(y));
            if changed {
                stats.print_commands += self.paint_row(&frame, y)?;
                stats.rows_painted += 1;
            }
        }
        if let Some((x, y)) = frame.cursor {
            queue!(self.out, MoveTo(x, y), Show)?;
        }
        self.out.flush()?;
        self.last = stats;
        self.prev = Some(frame);
        Ok(stats)
    }

    fn paint_row(&mut self, frame: &Frame, y: u16) -> Result<u64> {
        queue!(self.out, MoveTo(0, y))?;
        let mut prints = 0;
        let mut pending = String::new();
        let mut pending_style: Option<ContentStyle> = None;
        for (cluster, _, style, _) in frame.row_leaders(y) {
            if pending_style.is_some_and(|s| s != style) {
                self.print(&mut pending, pending_style)?;
                prints += 1;
            }
            pending.push_str(cluster);
            pending_style = Some(style);
        }
        if !pending.is_empty() {
            self.print(&mut pending, pending_style)?;
            prints += 1;
        }
        Ok(prints)
    }

    fn print(&mut self, text: &mut String, style: Option<ContentStyle>) -> Result<()> {
        let text = std::mem::take(text);
        queue!(self.out, PrintStyledContent(style.unwrap_or_default().apply(text)))?;
        Ok(())
    }
}
