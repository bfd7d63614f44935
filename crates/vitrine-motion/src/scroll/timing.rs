//! Progress and interpolation helpers
//!
//! Two kinds of progress exist: time-based (smooth scroll-into-view) and
//! scroll-based (scrubbed bindings, driven directly by scroll offset).

use std::time::Duration;

use tokio::time::Instant;

/// Time-based progress in [0, 1]
#[inline]
pub fn progress(start: Instant, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let ratio = start.elapsed().as_secs_f64() / duration.as_secs_f64();
    ratio.clamp(0.0, 1.0)
}

#[inline]
pub fn is_complete(start: Instant, duration: Duration) -> bool {
    start.elapsed() >= duration
}

/// Scroll-based progress through `[start, start + distance]`, clamped to [0, 1].
/// A non-positive distance counts as complete once `start` is reached.
#[inline]
pub fn scrub_progress(position: f64, start: f64, distance: f64) -> f64 {
    if distance <= 0.0 {
        return if position >= start { 1.0 } else { 0.0 };
    }
    ((position - start) / distance).clamp(0.0, 1.0)
}

#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
