//! Scroll motion primitives
//!
//! ## Atomic layer
//! - `easing` - Curves mapping progress [0, 1] to eased progress
//! - `timing` - Time-based and scroll-based progress, interpolation
//!
//! ## Molecular layer
//! - `animation` - Pixel scroll animator used for smooth scroll-into-view
//!
//! Time is read from `tokio::time::Instant` so animations follow a paused
//! test clock.

pub mod easing;
pub mod timing;

pub mod animation;

pub use animation::{ScrollAnimator, ScrollConfigExt};
pub use easing::EasingCurve;
pub use vitrine_core::{EasingType, ScrollConfig};
