//! Scroll choreography for the Vitrine storefront
//!
//! Two independent controllers attach to a [`vitrine_core::Document`]:
//! - [`DiscreteScrollNavigator`] turns wheel input into one-section jumps
//! - [`PinnedRevealSequencer`] pins content and scrubs it away to uncover a
//!   reveal panel
//!
//! Call [`init`] once at startup to register the scroll-trigger plugin.

pub mod host;
pub mod navigator;
pub mod plugins;
pub mod reveal;
pub mod scroll;
pub mod viewport;

pub use host::MemoryDocument;
pub use navigator::{DiscreteScrollNavigator, WheelOutcome};
pub use plugins::init;
pub use reveal::{PinnedRevealSequencer, RevealBinding, RevealPair, RevealStatus, ScrubRange};
