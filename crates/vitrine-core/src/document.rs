//! Host document contract
//!
//! The controllers never touch a concrete page. Everything they read (viewport,
//! scroll offset, element geometry) and everything they change (inline styles,
//! scroll position, wheel listeners) goes through [`Document`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};

use crate::Result;

/// Opaque handle of a region in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visible area in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Vertical extent of an element in document coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Sticky,
}

/// A single inline style property
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Style {
    Position(Position),
    Bottom(f64),
    ZIndex(i32),
    OverflowHidden(bool),
    TranslateY(f64),
    Pinned(bool),
}

/// Accumulated inline style of one element
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InlineStyle {
    pub position: Position,
    pub bottom: Option<f64>,
    pub z_index: Option<i32>,
    pub overflow_hidden: bool,
    pub translate_y: f64,
    pub pinned: bool,
}

impl InlineStyle {
    pub fn apply(&mut self, style: Style) {
        match style {
            Style::Position(position) => self.position = position,
            Style::Bottom(bottom) => self.bottom = Some(bottom),
            Style::ZIndex(z) => self.z_index = Some(z),
            Style::OverflowHidden(hidden) => self.overflow_hidden = hidden,
            Style::TranslateY(y) => self.translate_y = y,
            Style::Pinned(pinned) => self.pinned = pinned,
        }
    }

    /// True when nothing has been applied yet
    pub fn is_untouched(&self) -> bool {
        *self == Self::default()
    }
}

/// Wheel input delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct WheelEvent {
    pub delta_y: f64,
    default_prevented: bool,
}

impl WheelEvent {
    pub fn new(delta_y: f64) -> Self {
        Self {
            delta_y,
            default_prevented: false,
        }
    }

    /// Suppress the host's native scrolling for this event
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Registered wheel callback
pub type WheelListener = Arc<dyn Fn(&mut WheelEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Fires once a programmatic scroll animation has finished.
/// `None` when the host does not expose such a signal.
pub type ScrollCompletion = Option<oneshot::Receiver<()>>;

/// Live document the controllers attach to
pub trait Document: Send + Sync + 'static {
    fn viewport(&self) -> Viewport;

    /// Current vertical scroll offset
    fn scroll_y(&self) -> f64;

    /// All elements carrying `marker`, in document order. Callers re-query
    /// instead of caching so inserted/removed regions are honored.
    fn query_all(&self, marker: &str) -> Vec<ElementId>;

    fn measure(&self, element: ElementId) -> Result<Rect>;

    fn set_style(&self, element: ElementId, style: Style) -> Result<()>;

    fn scroll_into_view(&self, element: ElementId, behavior: ScrollBehavior) -> Result<ScrollCompletion>;

    fn add_wheel_listener(&self, listener: WheelListener) -> ListenerId;

    /// Returns false when the id was not registered
    fn remove_wheel_listener(&self, id: ListenerId) -> bool;

    fn subscribe_scroll(&self) -> watch::Receiver<f64>;

    fn subscribe_viewport(&self) -> watch::Receiver<Viewport>;

    /// Layout generation, bumped on every invalidation (resize, reflow)
    fn subscribe_layout(&self) -> watch::Receiver<u64>;
}
