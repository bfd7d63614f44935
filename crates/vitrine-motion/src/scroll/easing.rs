//! Easing curves for smooth scroll animations
//!
//! Scroll-scrubbed bindings are linear and never go through this module; only
//! time-based scroll-into-view animations are eased.

use vitrine_core::EasingType;

pub trait EasingCurve {
    /// Map linear progress to eased progress, both clamped to [0, 1]
    fn sample(&self, t: f64) -> f64;
}

impl EasingCurve for EasingType {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::None => step(t),
            EasingType::Linear => t,
            EasingType::Cubic => ease_out_pow(t, 3),
            EasingType::Quintic => ease_out_pow(t, 5),
            EasingType::EaseOut => ease_out_expo(t),
        }
    }
}

/// Jump to the end only once complete
#[inline]
fn step(t: f64) -> f64 {
    if t < 1.0 {
        0.0
    } else {
        1.0
    }
}

/// f(t) = 1 - (1-t)^n
#[inline]
fn ease_out_pow(t: f64, n: i32) -> f64 {
    1.0 - (1.0 - t).powi(n)
}

/// f(t) = 1 - 2^(-10t)
#[inline]
fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f64.powf(-10.0 * t)
    }
}
