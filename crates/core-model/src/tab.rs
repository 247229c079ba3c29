//! A tab: one or more panes split in a single direction.

use core_events::ViewId;
use tracing::debug;

use crate::layout::{Layout, LayoutRegion, SplitDir};
use crate::view::View;

/// Panes of one tab. Never empty; the session drops a tab when its last
/// pane closes.
#[derive(Debug)]
pub struct Tab {
    views: Vec<View>,
    cur: usize,
    dir: Option<SplitDir>,
    area: LayoutRegion,
    tabbar: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("tab is already split {existing:?}")]
pub struct SplitConflict {
    pub existing: SplitDir,
    /// The pane that could not be placed.
    pub view: Box<View>,
}

impl Tab {
    pub fn new(view: View) -> Self {
        let area = view.region();
        Self {
            views: vec![view],
            cur: 0,
            dir: None,
            area,
            tabbar: false,
        }
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut [View] {
        &mut self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn cur_index(&self) -> usize {
        self.cur
    }

    pub fn cur(&self) -> &View {
        &self.views[self.cur]
    }

    pub fn cur_mut(&mut self) -> &mut View {
        &mut self.views[self.cur]
    }

    pub fn split_dir(&self) -> Option<SplitDir> {
        self.dir
    }

    pub fn set_cur(&mut self, idx: usize) {
        if idx < self.views.len() {
            self.cur = idx;
        }
    }

    pub fn position(&self, id: ViewId) -> Option<usize> {
        self.views.iter().position(|v| v.id == id)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.iter_mut().find(|v| v.id == id)
    }

    /// Index of the pane under screen cell (`x`, `y`).
    pub fn view_at(&self, x: u16, y: u16) -> Option<usize> {
        self.views.iter().position(|v| v.contains(x, y))
    }

    /// Lay the panes out over `area`; `tabbar` says whether the tab bar row
    /// is shown (more than one tab).
    pub fn resize(&mut self, area: LayoutRegion, tabbar: bool) {
        self.area = area;
        self.tabbar = tabbar;
        self.relayout();
    }

    fn relayout(&mut self) {
        let layout = Layout::split(
            self.area,
            self.views.len(),
            self.dir.unwrap_or(SplitDir::Vertical),
        );
        for (view, region) in self.views.iter_mut().zip(layout.regions()) {
            view.toggle_tabbar(self.tabbar);
            view.set_region(*region);
            view.relocate();
        }
    }

    /// Add `view` next to the current pane, after it when `after` is set.
    /// The new pane becomes current. A tab keeps a single split direction.
    pub fn add_split(&mut self, view: View, dir: SplitDir, after: bool) -> Result<(), SplitConflict> {
        if let Some(existing) = self.dir
            && existing != dir
            && self.views.len() > 1
        {
            return Err(SplitConflict {
                existing,
                view: Box::new(view),
            });
        }
        self.dir = Some(dir);
        let at = if after { self.cur + 1 } else { self.cur };
        debug!(target: "layout", view = %view.id, ?dir, at, "split");
        self.views.insert(at, view);
        self.cur = at;
        self.relayout();
        Ok(())
    }

    /// Remove a pane; the remaining panes share its space.
    pub fn remove(&mut self, id: ViewId) -> Option<View> {
        let idx = self.position(id)?;
        let view = self.views.remove(idx);
        if self.cur > idx || self.cur >= self.views.len() {
            self.cur = self.cur.saturating_sub(1);
        }
        if self.views.len() <= 1 {
            self.dir = None;
        }
        if !self.views.is_empty() {
            self.relayout();
        }
        Some(view)
    }

    pub fn next_split(&mut self) {
        self.cur = (self.cur + 1) % self.views.len();
    }

    pub fn previous_split(&mut self) {
        self.cur = (self.cur + self.views.len() - 1) % self.views.len();
    }
}
