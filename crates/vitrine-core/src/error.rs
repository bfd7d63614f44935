use thiserror::Error;

use crate::document::ElementId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),

    #[error("Reveal content must contain exactly 2 elements, found {found}")]
    InvalidRevealPair { found: usize },

    #[error("No tokio runtime available to drive timers")]
    NoRuntime,

    #[error("Scenario error: {0}")]
    Scenario(String),
}

pub type Result<T> = std::result::Result<T, Error>;
