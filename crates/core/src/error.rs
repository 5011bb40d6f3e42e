use std::path::PathBuf;

use crate::widget::Phase;

/// Result alias that carries the custom [`WidgetError`] type.
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// A template, style sheet or manifest could not be read.
    #[error("failed to load resource `{}`: {source}", path.display())]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An index addressed an element outside of a fixed-size collection.
    #[error("index {index} is out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A widget was asked to move to a lifecycle phase it cannot reach from
    /// the phase it is in.
    #[error("cannot move widget from {from:?} to {to:?}")]
    InvalidTransition { from: Phase, to: Phase },
    #[error("audio context has been closed")]
    ContextClosed,
    #[error("filter design failed: {0}")]
    Filter(String),
    #[error(transparent)]
    Fft(#[from] realfft::FftError),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl WidgetError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceLoad {
            path: path.into(),
            source,
        }
    }
}

impl From<&str> for WidgetError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for WidgetError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
