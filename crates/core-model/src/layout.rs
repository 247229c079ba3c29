//! Pane geometry.
//!
//! A tab's area is divided among its panes in a single direction with equal
//! shares; the last pane absorbs the rounding remainder. Regions are in
//! terminal cells. A pane that does not start at column 0 draws its divider
//! in its own first gutter column.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl LayoutRegion {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && (x - self.x) < self.width
            && (y - self.y) < self.height
    }
}

/// Direction panes of a tab are stacked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDir {
    /// Panes side by side (`vsplit`).
    Vertical,
    /// Panes stacked top to bottom (`hsplit`).
    Horizontal,
}

#[derive(Debug, Clone)]
pub struct Layout {
    regions: Vec<LayoutRegion>,
}

impl Layout {
    /// One region covering the whole area.
    pub fn single(width: u16, height: u16) -> Self {
        Self {
            regions: vec![LayoutRegion::new(0, 0, width, height)],
        }
    }

    /// Divide `area` into `n` equal regions along `dir`.
    pub fn split(area: LayoutRegion, n: usize, dir: SplitDir) -> Self {
        let n = n.max(1) as u16;
        let total = match dir {
            SplitDir::Vertical => area.width,
            SplitDir::Horizontal => area.height,
        };
        let share = total / n;
        let regions = (0..n)
            .map(|i| {
                let start = share * i;
                let len = if i + 1 == n { total - start } else { share };
                match dir {
                    SplitDir::Vertical => LayoutRegion::new(area.x + start, area.y, len, area.height),
                    SplitDir::Horizontal => LayoutRegion::new(area.x, area.y + start, area.width, len),
                }
            })
            .collect();
        Self { regions }
    }

    pub fn regions(&self) -> &[LayoutRegion] {
        &self.regions
    }
}
