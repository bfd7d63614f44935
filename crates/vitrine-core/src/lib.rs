pub mod config;
pub mod document;
pub mod error;

pub use config::{AppConfig, EasingType, GeneralConfig, NavigatorConfig, RevealConfig, ScrollConfig};
pub use document::{
    Document, ElementId, InlineStyle, ListenerId, Position, Rect, ScrollBehavior, ScrollCompletion,
    Style, Viewport, WheelEvent, WheelListener,
};
pub use error::{Error, Result};
