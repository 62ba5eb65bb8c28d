//! Attraction anchors fed by the page layer.
//!
//! The page pushes positional state in whenever layout changes (hovered
//! element, visible section, element centres); the engine flattens it into
//! a plain anchor list at the top of every frame. Anchors live for exactly
//! one frame and are never persisted.

use glam::Vec2;
use smallvec::SmallVec;

use crate::constants::{
    ANCHOR_HOT_STRENGTH, ANCHOR_NAV_STRENGTH, ANCHOR_SECTION_STRENGTH, MAX_ELEMENT_ANCHORS,
};

/// One attraction target for the cohesion force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pos: Vec2,
    pub strength: f32,
}

/// Hovered or focused element rectangle, device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl HotRect {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

pub type AnchorList = SmallVec<[Anchor; 32]>;

/// Latest layout state pushed in by the page. Element anchors arrive with
/// their own strengths and are capped; the hot element, active section and
/// navigation band carry fixed engine-side strengths.
#[derive(Debug, Default)]
pub struct AnchorSources {
    elements: SmallVec<[Anchor; MAX_ELEMENT_ANCHORS]>,
    hot: Option<HotRect>,
    section: Option<(String, Vec2)>,
    nav: Option<Vec2>,
}

impl AnchorSources {
    /// Replaces the interactive-element anchor set, keeping at most
    /// [`MAX_ELEMENT_ANCHORS`] of them.
    pub fn set_elements(&mut self, anchors: &[Anchor]) {
        self.elements.clear();
        self.elements
            .extend(anchors.iter().copied().take(MAX_ELEMENT_ANCHORS));
    }

    pub fn set_hot(&mut self, rect: Option<HotRect>) {
        self.hot = rect;
    }

    /// Tracks the section currently scrolled into view. Re-announcing the
    /// same identifier just refreshes its position.
    pub fn set_active_section(&mut self, id: &str, pos: Vec2) {
        match &mut self.section {
            Some((current, slot)) if current == id => *slot = pos,
            _ => {
                log::debug!("[anchors] active section -> {id}");
                self.section = Some((id.to_owned(), pos));
            }
        }
    }

    pub fn clear_active_section(&mut self) {
        self.section = None;
    }

    pub fn set_nav(&mut self, pos: Option<Vec2>) {
        self.nav = pos;
    }

    /// Flattens the current sources into this frame's anchor list.
    pub fn collect(&self, out: &mut AnchorList) {
        out.clear();
        if let Some(rect) = &self.hot {
            out.push(Anchor {
                pos: rect.center(),
                strength: ANCHOR_HOT_STRENGTH,
            });
        }
        if let Some((_, pos)) = &self.section {
            out.push(Anchor {
                pos: *pos,
                strength: ANCHOR_SECTION_STRENGTH,
            });
        }
        if let Some(pos) = self.nav {
            out.push(Anchor {
                pos,
                strength: ANCHOR_NAV_STRENGTH,
            });
        }
        out.extend(self.elements.iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(x: f32) -> Anchor {
        Anchor {
            pos: Vec2::new(x, 0.0),
            strength: 0.2,
        }
    }

    #[test]
    fn element_anchors_are_capped() {
        let mut sources = AnchorSources::default();
        let many: Vec<Anchor> = (0..100).map(|i| element(i as f32)).collect();
        sources.set_elements(&many);
        let mut out = AnchorList::new();
        sources.collect(&mut out);
        assert_eq!(out.len(), MAX_ELEMENT_ANCHORS);
    }

    #[test]
    fn collect_orders_hot_section_nav_then_elements() {
        let mut sources = AnchorSources::default();
        sources.set_elements(&[element(5.0)]);
        sources.set_hot(Some(HotRect {
            x: 10.0,
            y: 20.0,
            width: 4.0,
            height: 8.0,
        }));
        sources.set_active_section("about", Vec2::new(1.0, 2.0));
        sources.set_nav(Some(Vec2::new(3.0, 4.0)));

        let mut out = AnchorList::new();
        sources.collect(&mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].pos, Vec2::new(12.0, 24.0), "hot rect centre leads");
        assert_eq!(out[0].strength, ANCHOR_HOT_STRENGTH);
        assert_eq!(out[1].strength, ANCHOR_SECTION_STRENGTH);
        assert_eq!(out[2].strength, ANCHOR_NAV_STRENGTH);
        assert_eq!(out[3].pos.x, 5.0);
    }

    #[test]
    fn reannouncing_a_section_updates_its_position_in_place() {
        let mut sources = AnchorSources::default();
        sources.set_active_section("work", Vec2::new(0.0, 100.0));
        sources.set_active_section("work", Vec2::new(0.0, 140.0));
        let mut out = AnchorList::new();
        sources.collect(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pos.y, 140.0);

        sources.clear_active_section();
        sources.collect(&mut out);
        assert!(out.is_empty());
    }
}
