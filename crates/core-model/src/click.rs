//! Mouse click classification.
//!
//! Releases are classified against the previous release: a release within
//! [`DOUBLE_CLICK_THRESHOLD`] at the same location climbs the ladder
//! Single → Double → Triple, and a quick release after a Triple starts over
//! at Double. A release that ends a drag is always Single and resets the
//! ladder.

use core_text::Loc;
use std::time::{Duration, Instant};

pub const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
    Triple,
}

#[derive(Debug, Clone, Default)]
pub struct ClickState {
    pressed_at: Option<Loc>,
    last_release: Option<(Instant, Loc)>,
    dragged: bool,
    double: bool,
    triple: bool,
}

impl ClickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a press at `loc` continues a word or line selection made by
    /// the previous release.
    pub fn continues_granular(&self, at: Instant, loc: Loc) -> bool {
        (self.double || self.triple) && self.is_quick(at, loc)
    }

    fn is_quick(&self, at: Instant, loc: Loc) -> bool {
        self.last_release.is_some_and(|(t, l)| {
            l == loc && at.saturating_duration_since(t) < DOUBLE_CLICK_THRESHOLD
        })
    }

    pub fn press(&mut self, loc: Loc) {
        self.pressed_at = Some(loc);
        self.dragged = false;
    }

    pub fn drag(&mut self) {
        if self.pressed_at.is_some() {
            self.dragged = true;
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn dragged(&self) -> bool {
        self.dragged
    }

    pub fn was_double(&self) -> bool {
        self.double
    }

    pub fn was_triple(&self) -> bool {
        self.triple
    }

    pub fn release(&mut self, at: Instant, loc: Loc) -> ClickKind {
        let kind = if self.dragged || !self.is_quick(at, loc) {
            ClickKind::Single
        } else if self.double {
            ClickKind::Triple
        } else {
            ClickKind::Double
        };
        self.double = kind == ClickKind::Double;
        self.triple = kind == ClickKind::Triple;
        self.pressed_at = None;
        self.dragged = false;
        self.last_release = Some((at, loc));
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clicks(gaps_ms: &[u64]) -> Vec<ClickKind> {
        let mut state = ClickState::new();
        let loc = Loc::new(2, 3);
        let mut at = Instant::now();
        let mut out = vec![];
        for gap in std::iter::once(&0).chain(gaps_ms) {
            at += Duration::from_millis(*gap);
            state.press(loc);
            out.push(state.release(at, loc));
        }
        out
    }

    #[test]
    fn quick_clicks_climb_the_ladder() {
        use ClickKind::*;
        assert_eq!(clicks(&[100, 100]), vec![Single, Double, Triple]);
        assert_eq!(clicks(&[100, 500]), vec![Single, Double, Single]);
        assert_eq!(clicks(&[100, 100, 100]), vec![Single, Double, Triple, Double]);
        assert_eq!(clicks(&[400]), vec![Single, Single]);
    }

    #[test]
    fn moving_between_clicks_resets() {
        let mut state = ClickState::new();
        let at = Instant::now();
        state.press(Loc::new(0, 0));
        assert_eq!(state.release(at, Loc::new(0, 0)), ClickKind::Single);
        state.press(Loc::new(0, 1));
        let at = at + Duration::from_millis(50);
        assert_eq!(state.release(at, Loc::new(0, 1)), ClickKind::Single);
    }

    #[test]
    fn drag_release_is_single() {
        let mut state = ClickState::new();
        let at = Instant::now();
        let loc = Loc::new(1, 1);
        state.press(loc);
        state.release(at, loc);
        state.press(loc);
        state.drag();
        assert!(state.dragged());
        assert_eq!(state.release(at + Duration::from_millis(10), loc), ClickKind::Single);
        assert!(!state.was_double());
    }

    #[test]
    fn granular_continuation_needs_a_double() {
        let mut state = ClickState::new();
        let at = Instant::now();
        let loc = Loc::new(0, 4);
        state.press(loc);
        state.release(at, loc);
        assert!(!state.continues_granular(at, loc));
        state.press(loc);
        state.release(at + Duration::from_millis(100), loc);
        assert!(state.was_double());
        assert!(state.continues_granular(at + Duration::from_millis(200), loc));
        assert!(!state.continues_granular(at + Duration::from_millis(900), loc));
    }
}
