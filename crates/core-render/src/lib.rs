//! Frame composition and terminal output.
//!
//! A redraw composes the whole screen into a [`Frame`] (a grid of styled
//! cells) and hands it to the writer, which repaints only the rows that
//! differ from the previous frame.
//!
//! Cell invariants:
//! - Leader: width >= 1, `cluster` non-empty.
//! - Continuation: width == 0, `cluster` empty. Continuations immediately
//!   follow their leader horizontally and never print text.
//!
//! Components:
//! - `compose`: screen layout (tab bar, panes with gutter and status line,
//!   info bar) and the hardware cursor position.
//! - `status`: status line segments and formatting.
//! - `style`: the colorscheme seam (`StyleLookup`) and the built-in scheme.
//! - `writer`: row diffing and crossterm emission.
//! - `display`: the `Display` trait driven by the event loop.

use crossterm::style::ContentStyle;

pub mod compose;
pub mod display;
pub mod status;
pub mod style;
pub mod writer;

pub use compose::compose;
pub use display::{Display, TerminalDisplay};
pub use style::{DefaultStyles, StyleLookup};
pub use writer::TermWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Printed text (leader cells only). Empty for continuation cells.
    pub cluster: String,
    /// Visual width in terminal columns. `0` designates a continuation cell.
    pub width: u8,
    pub style: ContentStyle,
}

impl Cell {
    #[inline]
    pub fn leader(cluster: &str, width: u16, style: ContentStyle) -> Self {
        Self {
            cluster: cluster.to_string(),
            width: width.clamp(1, u8::MAX as u16) as u8,
            style,
        }
    }

    #[inline]
    pub fn continuation(style: ContentStyle) -> Self {
        Self {
            cluster: String::new(),
            width: 0,
            style,
        }
    }

    #[inline]
    pub fn is_leader(&self) -> bool {
        self.width > 0
    }

    #[inline]
    pub fn visual_width(&self) -> u16 {
        self.width as u16
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            cluster: " ".to_string(),
            width: 1,
            style: ContentStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
    /// Where the terminal cursor goes once the frame is painted; hidden
    /// when `None`.
    pub cursor: Option<(u16, u16)>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
            cursor: None,
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Set a cluster at (x,y) and populate continuation cells for its width.
    /// A cluster that would straddle the right edge is replaced by blanks.
    pub fn set_cluster(&mut self, x: u16, y: u16, cluster: &str, width: u16, style: ContentStyle) {
        if x >= self.width || y >= self.height {
            return;
        }
        let width = width.max(1);
        if x + width > self.width {
            for dx in x..self.width {
                self.set_cluster(dx, y, " ", 1, style);
            }
            return;
        }
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell::leader(cluster, width, style);
        }
        for dx in 1..width {
            if let Some(idx) = self.index(x + dx, y) {
                self.cells[idx] = Cell::continuation(style);
            }
        }
    }

    /// Write `text` from (x,y), one cell per column, clipped at `max_x`.
    /// Returns the column after the last written cell.
    pub fn put_str(&mut self, x: u16, y: u16, max_x: u16, text: &str, style: ContentStyle) -> u16 {
        let mut cx = x;
        for ch in text.chars() {
            let w = core_text::width::char_width(ch) as u16;
            if cx + w > max_x {
                break;
            }
            let mut buf = [0u8; 4];
            self.set_cluster(cx, y, ch.encode_utf8(&mut buf), w, style);
            cx += w;
        }
        cx
    }

    /// Paint `len` blank cells from (x,y).
    pub fn fill(&mut self, x: u16, y: u16, len: u16, style: ContentStyle) {
        for dx in 0..len {
            self.set_cluster(x + dx, y, " ", 1, style);
        }
    }

    /// Override the style of an existing span (leader and continuations).
    pub fn restyle(&mut self, x: u16, y: u16, len: u16, style: ContentStyle) {
        for dx in 0..len {
            if let Some(idx) = self.index(x + dx, y) {
                self.cells[idx].style = style;
            }
        }
    }

    /// Iterate leader cells of a row, yielding (&str, width, style, start_x).
    pub fn row_leaders(&self, y: u16) -> impl Iterator<Item = (&str, u16, ContentStyle, u16)> + '_ {
        let width = self.width;
        let start = y as usize * width as usize;
        let mut x = 0u16;
        std::iter::from_fn(move || {
            while x < width {
                let cell = &self.cells[start + x as usize];
                if cell.is_leader() {
                    let w = cell.visual_width();
                    let out = (cell.cluster.as_str(), w, cell.style, x);
                    x = x.saturating_add(w);
                    return Some(out);
                }
                x += 1;
            }
            None
        })
    }

    /// Cells of row `y`.
    pub fn row(&self, y: u16) -> &[Cell] {
        let w = self.width as usize;
        let start = y as usize * w;
        self.cells.get(start..start + w).unwrap_or(&[])
    }

    /// Text of row `y` with trailing blanks trimmed (tests and diagnostics).
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let s: String = self.row_leaders(y).map(|(c, ..)| c).collect();
        s.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_clusters_get_continuations() {
        let mut f = Frame::new(4, 1);
        f.set_cluster(1, 0, "界", 2, ContentStyle::default());
        assert!(f.cells[1].is_leader());
        assert!(!f.cells[2].is_leader());
        assert_eq!(f.row_text(0), " 界");
        let leaders: Vec<u16> = f.row_leaders(0).map(|(.., x)| x).collect();
        assert_eq!(leaders, vec![0, 1, 3]);
    }

    #[test]
    fn straddling_cluster_becomes_blank() {
        let mut f = Frame::new(3, 1);
        f.put_str(0, 0, 3, "ab界", ContentStyle::default());
        assert_eq!(f.row_text(0), "ab");
        assert_eq!(f.put_str(0, 0, 3, "xyz!", ContentStyle::default()), 3);
        assert_eq!(f.row_text(0), "xyz");
    }
}
