//! Pixel scroll animator
//!
//! Interpolates a document scroll offset toward a target. Hosts call
//! `scroll_to()` to start an animation and `update()` every tick.

use std::time::Duration;

use tokio::time::Instant;

use super::easing::EasingCurve;
use super::timing::{is_complete, lerp, progress};
use vitrine_core::{EasingType, ScrollConfig};

/// Utility methods on ScrollConfig
pub trait ScrollConfigExt {
    fn animation_duration(&self) -> Duration;

    /// Tick interval for the configured frame rate
    fn animation_tick_duration(&self) -> Duration;

    fn is_smooth(&self) -> bool;
}

impl ScrollConfigExt for ScrollConfig {
    #[inline]
    fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    #[inline]
    fn animation_tick_duration(&self) -> Duration {
        if self.animation_fps == 0 {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(1000 / self.animation_fps as u64)
        }
    }

    #[inline]
    fn is_smooth(&self) -> bool {
        self.smooth_enabled && self.animation_duration_ms > 0
    }
}

#[derive(Debug, Clone)]
struct ActiveAnimation {
    start: Instant,
    from: f64,
    to: f64,
    duration: Duration,
    easing: EasingType,
}

#[derive(Debug, Clone)]
pub struct ScrollAnimator {
    animation: Option<ActiveAnimation>,
    config: ScrollConfig,
    current: f64,
}

impl ScrollAnimator {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            animation: None,
            config,
            current: 0.0,
        }
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Final offset once the running animation completes
    pub fn target(&self) -> f64 {
        self.animation.as_ref().map(|a| a.to).unwrap_or(self.current)
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Jump immediately, dropping any running animation
    pub fn set_scroll(&mut self, offset: f64) {
        self.animation = None;
        self.current = offset;
    }

    /// Start animating toward `target`, clamped to `[0, max_scroll]`.
    ///
    /// A new target replaces the running animation and starts from the
    /// currently visible offset. Without smoothing the offset jumps.
    pub fn scroll_to(&mut self, target: f64, max_scroll: f64) {
        let target = target.clamp(0.0, max_scroll.max(0.0));

        if !self.config.is_smooth() || (target - self.current).abs() < f64::EPSILON {
            self.set_scroll(target);
            return;
        }

        self.animation = Some(ActiveAnimation {
            start: Instant::now(),
            from: self.current,
            to: target,
            duration: self.config.animation_duration(),
            easing: self.config.easing,
        });
    }

    /// Advance the animation and return the current offset
    pub fn update(&mut self) -> f64 {
        if let Some(anim) = &self.animation {
            if is_complete(anim.start, anim.duration) {
                self.current = anim.to;
                self.animation = None;
            } else {
                let t = anim.easing.sample(progress(anim.start, anim.duration));
                self.current = lerp(anim.from, anim.to, t);
            }
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(duration_ms: u64) -> ScrollConfig {
        ScrollConfig {
            smooth_enabled: true,
            animation_duration_ms: duration_ms,
            easing: EasingType::Linear,
            animation_fps: 60,
        }
    }

    #[test]
    fn test_tick_duration() {
        let mut config = ScrollConfig::default();
        assert_eq!(config.animation_tick_duration(), Duration::from_millis(16));
        config.animation_fps = 0;
        assert_eq!(config.animation_tick_duration(), Duration::from_millis(16));
        config.animation_fps = 20;
        assert_eq!(config.animation_tick_duration(), Duration::from_millis(50));
    }

    #[test]
    fn test_is_smooth() {
        let mut config = ScrollConfig::default();
        assert!(config.is_smooth());
        config.animation_duration_ms = 0;
        assert!(!config.is_smooth());
        config.animation_duration_ms = 600;
        config.smooth_enabled = false;
        assert!(!config.is_smooth());
    }

    #[test]
    fn test_instant_jump_when_disabled() {
        let mut animator = ScrollAnimator::new(ScrollConfig {
            smooth_enabled: false,
            ..Default::default()
        });
        animator.scroll_to(1600.0, 2400.0);
        assert_eq!(animator.current(), 1600.0);
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_target_is_clamped() {
        let mut animator = ScrollAnimator::new(linear(100));
        animator.scroll_to(5000.0, 2400.0);
        assert_eq!(animator.target(), 2400.0);
        animator.scroll_to(-10.0, 2400.0);
        assert!(!animator.is_animating());
        assert_eq!(animator.current(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_animation_reaches_target() {
        let mut animator = ScrollAnimator::new(linear(400));
        animator.set_scroll(800.0);
        animator.scroll_to(1600.0, 2400.0);
        assert!(animator.is_animating());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!((animator.update() - 1200.0).abs() < 1e-6);

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(animator.update(), 1600.0);
        assert!(!animator.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_starts_from_visible_offset() {
        let mut animator = ScrollAnimator::new(linear(400));
        animator.scroll_to(800.0, 2400.0);
        tokio::time::advance(Duration::from_millis(200)).await;
        let mid = animator.update();
        assert!((mid - 400.0).abs() < 1e-6);

        animator.scroll_to(0.0, 2400.0);
        assert_eq!(animator.target(), 0.0);
        assert_eq!(animator.current(), mid);
        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(animator.update(), 0.0);
    }
}
