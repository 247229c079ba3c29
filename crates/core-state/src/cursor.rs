//! Cursor model: stable ids, selections and the ordered cursor set.

use core_text::Loc;

/// Identity of a cursor that survives reordering and removal of its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(u64);

/// Half-open selection range; `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Loc,
    pub end: Loc,
}

impl Selection {
    /// Ordered selection between two locations; `None` when they coincide.
    pub fn between(a: Loc, b: Loc) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { start: a, end: b }),
            std::cmp::Ordering::Greater => Some(Self { start: b, end: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, loc: Loc) -> bool {
        self.start <= loc && loc < self.end
    }

    fn overlaps(&self, other: &Selection) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn union(&self, other: &Selection) -> Selection {
        Selection {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    id: CursorId,
    pub loc: Loc,
    /// Sticky visual column for vertical motion.
    pub last_visual_x: usize,
    /// Fixed end of a selection being extended by shift motions or drags.
    pub anchor: Option<Loc>,
    pub selection: Option<Selection>,
    /// Word or line picked by a double/triple click; drags extend from it.
    pub orig_selection: Option<Selection>,
}

impl Cursor {
    fn new(id: CursorId, loc: Loc) -> Self {
        Self {
            id,
            loc,
            last_visual_x: 0,
            anchor: None,
            selection: None,
            orig_selection: None,
        }
    }

    pub fn id(&self) -> CursorId {
        self.id
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn reset_selection(&mut self) {
        self.anchor = None;
        self.selection = None;
        self.orig_selection = None;
    }

    /// Select `[a, b)` and place the cursor at `b`.
    pub fn set_selection(&mut self, a: Loc, b: Loc) {
        self.anchor = Some(a);
        self.selection = Selection::between(a, b);
        self.loc = b;
    }

    /// Anchor at the current location if no anchor exists yet.
    pub fn begin_selection(&mut self) {
        if self.anchor.is_none() {
            self.anchor = Some(match self.selection {
                Some(sel) if sel.start == self.loc => sel.end,
                Some(sel) => sel.start,
                None => self.loc,
            });
        }
    }

    /// Recompute the selection from the anchor to the current location.
    pub fn extend_selection(&mut self) {
        if let Some(anchor) = self.anchor {
            self.selection = Selection::between(anchor, self.loc);
        }
    }

    pub(crate) fn shift_for_insert(&mut self, start: Loc, end: Loc) {
        let f = |p: Loc| shift_insert(p, start, end);
        self.apply(f);
    }

    pub(crate) fn shift_for_remove(&mut self, start: Loc, end: Loc) {
        let f = |p: Loc| shift_remove(p, start, end);
        self.apply(f);
    }

    fn apply(&mut self, f: impl Fn(Loc) -> Loc) {
        self.loc = f(self.loc);
        self.anchor = self.anchor.map(&f);
        self.selection = self
            .selection
            .and_then(|s| Selection::between(f(s.start), f(s.end)));
        self.orig_selection = self
            .orig_selection
            .and_then(|s| Selection::between(f(s.start), f(s.end)));
    }
}

fn shift_insert(p: Loc, start: Loc, end: Loc) -> Loc {
    if p < start {
        return p;
    }
    if p.line == start.line {
        Loc::new(end.line, end.col + (p.col - start.col))
    } else {
        Loc::new(p.line + (end.line - start.line), p.col)
    }
}

fn shift_remove(p: Loc, start: Loc, end: Loc) -> Loc {
    if p <= start {
        p
    } else if p < end {
        start
    } else if p.line == end.line {
        Loc::new(start.line, start.col + (p.col - end.col))
    } else {
        Loc::new(p.line - (end.line - start.line), p.col)
    }
}

/// All cursors of one buffer in stable insertion order. Index 0 is the
/// primary cursor and is never removed.
#[derive(Debug, Clone)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
    active: usize,
    next_id: u64,
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorSet {
    pub fn new() -> Self {
        Self {
            cursors: vec![Cursor::new(CursorId(0), Loc::origin())],
            active: 0,
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cursor> {
        self.cursors.iter_mut()
    }

    /// Ids in iteration order; a snapshot for fan-out loops.
    pub fn ids(&self) -> Vec<CursorId> {
        self.cursors.iter().map(|c| c.id).collect()
    }

    pub fn contains(&self, id: CursorId) -> bool {
        self.cursors.iter().any(|c| c.id == id)
    }

    pub fn primary(&self) -> &Cursor {
        &self.cursors[0]
    }

    pub fn active(&self) -> &Cursor {
        &self.cursors[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Cursor {
        &mut self.cursors[self.active]
    }

    pub fn active_id(&self) -> CursorId {
        self.cursors[self.active].id
    }

    pub fn is_primary_active(&self) -> bool {
        self.active == 0
    }

    /// Make `id` the active cursor. False when it no longer exists.
    pub fn set_active(&mut self, id: CursorId) -> bool {
        match self.cursors.iter().position(|c| c.id == id) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => false,
        }
    }

    pub fn reset_to_primary(&mut self) {
        self.active = 0;
    }

    /// Append a cursor at `loc`; returns its id.
    pub fn add(&mut self, loc: Loc) -> CursorId {
        let id = CursorId(self.next_id);
        self.next_id += 1;
        let mut cursor = Cursor::new(id, loc);
        cursor.last_visual_x = self.active().last_visual_x;
        self.cursors.push(cursor);
        id
    }

    /// Remove a secondary cursor. The primary cursor cannot be removed.
    pub fn remove(&mut self, id: CursorId) -> bool {
        match self.cursors.iter().position(|c| c.id == id) {
            Some(0) | None => false,
            Some(idx) => {
                self.cursors.remove(idx);
                if self.active == idx {
                    self.active = 0;
                } else if self.active > idx {
                    self.active -= 1;
                }
                true
            }
        }
    }

    /// Remove the most recently added secondary cursor.
    pub fn remove_last(&mut self) -> bool {
        match self.cursors.last() {
            Some(c) if self.cursors.len() > 1 => {
                let id = c.id;
                self.remove(id)
            }
            _ => false,
        }
    }

    /// Drop every cursor except the primary.
    pub fn clear_secondary(&mut self) {
        self.cursors.truncate(1);
        self.active = 0;
    }

    /// Collapse cursors at the same location or with overlapping selections.
    /// The earlier cursor survives with the union of both selections.
    /// Returns the number of cursors removed.
    pub fn merge(&mut self) -> usize {
        let before = self.cursors.len();
        let mut i = 0;
        while i < self.cursors.len() {
            let mut j = i + 1;
            while j < self.cursors.len() {
                let (a, b) = (&self.cursors[i], &self.cursors[j]);
                let collide = a.loc == b.loc
                    || matches!((a.selection, b.selection), (Some(x), Some(y)) if x.overlaps(&y));
                if collide {
                    let removed = self.cursors.remove(j);
                    let keep = &mut self.cursors[i];
                    if let (Some(x), Some(y)) = (keep.selection, removed.selection) {
                        let merged = x.union(&y);
                        keep.selection = Some(merged);
                        keep.loc = if keep.loc == x.start { merged.start } else { merged.end };
                        keep.anchor = Some(if keep.loc == merged.start {
                            merged.end
                        } else {
                            merged.start
                        });
                    }
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        self.active = 0;
        before - self.cursors.len()
    }

    pub(crate) fn shift_for_insert(&mut self, start: Loc, end: Loc) {
        for c in &mut self.cursors {
            c.shift_for_insert(start, end);
        }
    }

    pub(crate) fn shift_for_remove(&mut self, start: Loc, end: Loc) {
        for c in &mut self.cursors {
            c.shift_for_remove(start, end);
        }
    }
}
