//! Viewport and section-position helpers shared by the controllers

use vitrine_core::Viewport;

/// Wheel direction between sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Positive delta scrolls forward, negative backward. A zero delta carries
    /// no direction.
    pub fn from_delta(delta_y: f64) -> Option<Self> {
        if delta_y > 0.0 {
            Some(Self::Forward)
        } else if delta_y < 0.0 {
            Some(Self::Backward)
        } else {
            None
        }
    }

    #[inline]
    pub fn step(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

#[inline]
pub fn is_desktop(viewport: Viewport, min_width: f64) -> bool {
    viewport.width >= min_width
}

/// Section the scroll offset currently sits on: round(offset / height)
pub fn section_index(scroll_y: f64, viewport_height: f64) -> usize {
    if viewport_height <= 0.0 || !scroll_y.is_finite() {
        return 0;
    }
    (scroll_y / viewport_height).round().max(0.0) as usize
}

/// Neighbouring section in `direction`, clamped to `[0, count - 1]`.
/// `None` when the clamped target is the current section.
pub fn step_target(current: usize, direction: Direction, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let last = (count - 1) as i64;
    let target = (current as i64 + direction.step()).clamp(0, last) as usize;
    (target != current).then_some(target)
}
