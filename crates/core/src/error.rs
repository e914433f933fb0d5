/// Result alias that carries the custom [`RhythmError`] type.
pub type Result<T> = std::result::Result<T, RhythmError>;

/// Common error type for the core crate.
///
/// Only level loading, configuration and persistence can fail. Scheduling
/// conflicts are resolved silently and the per-frame simulation is total.
#[derive(Debug, thiserror::Error)]
pub enum RhythmError {
    /// A level's pattern was rejected at load time.
    #[error("invalid pattern in level `{level}`: {reason}")]
    InvalidPattern { level: String, reason: String },
    /// Engine tunables that would break scheduling or simulation invariants.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown level index {0}")]
    UnknownLevel(usize),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl RhythmError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn pattern(level: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            level: level.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for RhythmError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for RhythmError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
