//! Scroll-linked reveal binding
//!
//! The main block is translated upward by the reveal panel's height over a
//! scroll range of the same length, starting when the trigger container's
//! bottom edge meets the viewport bottom.

use vitrine_core::{Document, ElementId, Error, Position, Rect, Result, Style, Viewport};

use crate::plugins::{TriggerRegistry, TriggerToken};
use crate::scroll::timing::{lerp, scrub_progress};

/// The mandatory `[main, reveal]` input plus the container acting as trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealPair {
    pub main: ElementId,
    pub reveal: ElementId,
    pub trigger: ElementId,
}

impl RevealPair {
    pub fn from_children(trigger: ElementId, children: &[ElementId]) -> Result<Self> {
        match children {
            [main, reveal] => Ok(Self {
                main: *main,
                reveal: *reveal,
                trigger,
            }),
            _ => Err(Error::InvalidRevealPair {
                found: children.len(),
            }),
        }
    }

    /// Static layout roles: the reveal panel sits sticky at the bottom below
    /// the main block, the container clips both.
    pub fn apply_roles<D: Document + ?Sized>(&self, doc: &D) -> Result<()> {
        doc.set_style(self.reveal, Style::Position(Position::Sticky))?;
        doc.set_style(self.reveal, Style::Bottom(0.0))?;
        doc.set_style(self.reveal, Style::ZIndex(0))?;
        doc.set_style(self.main, Style::Position(Position::Relative))?;
        doc.set_style(self.main, Style::ZIndex(1))?;
        doc.set_style(self.trigger, Style::OverflowHidden(true))?;
        Ok(())
    }
}

/// Scroll range a binding is scrubbed over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubRange {
    /// Scroll offset where the trigger's bottom meets the viewport bottom
    pub start: f64,
    /// Scroll distance, equal to the reveal panel height
    pub distance: f64,
}

impl ScrubRange {
    pub fn from_trigger(trigger: Rect, viewport: Viewport, reveal_height: f64) -> Self {
        Self {
            start: trigger.bottom() - viewport.height,
            distance: reveal_height,
        }
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.distance
    }

    #[inline]
    pub fn progress_at(&self, scroll_y: f64) -> f64 {
        scrub_progress(scroll_y, self.start, self.distance)
    }

    /// Linear, no easing: 0 at the start, -distance at the end
    #[inline]
    pub fn translate_at(&self, scroll_y: f64) -> f64 {
        lerp(0.0, -self.distance, self.progress_at(scroll_y))
    }

    #[inline]
    pub fn contains(&self, scroll_y: f64) -> bool {
        scroll_y >= self.start && scroll_y <= self.end()
    }
}

/// Live binding between scroll offset and the main block's translation
#[derive(Debug)]
pub struct RevealBinding {
    pair: RevealPair,
    range: ScrubRange,
    _token: TriggerToken,
}

impl RevealBinding {
    pub fn build(pair: RevealPair, range: ScrubRange, registry: &'static TriggerRegistry) -> Self {
        Self {
            pair,
            range,
            _token: registry.claim(pair.main),
        }
    }

    pub fn range(&self) -> ScrubRange {
        self.range
    }

    /// Update the main block for the given scroll offset
    pub fn apply<D: Document + ?Sized>(&self, doc: &D, scroll_y: f64) -> Result<()> {
        doc.set_style(self.pair.main, Style::TranslateY(self.range.translate_at(scroll_y)))?;
        doc.set_style(self.pair.main, Style::Pinned(self.range.contains(scroll_y)))?;
        Ok(())
    }

    /// Reset the main block and release the registry claim
    pub fn destroy<D: Document + ?Sized>(self, doc: &D) {
        let _ = doc.set_style(self.pair.main, Style::TranslateY(0.0));
        let _ = doc.set_style(self.pair.main, Style::Pinned(false));
    }
}
