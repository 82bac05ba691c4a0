use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metric not found: {0}")]
    NotFound(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Unknown operation: {0}")]
    UnknownOp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Channel send error: {actor} mailbox is closed")]
    ChannelSend { actor: &'static str },

    #[error("Channel receive error: {actor} dropped the reply")]
    ChannelReceive { actor: &'static str },

    #[error("Mailbox full: {actor} cannot accept more messages")]
    MailboxFull { actor: &'static str },
}

/// Result type alias for Pulse operations
pub type Result<T> = std::result::Result<T, PulseError>;

impl PulseError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound(name.into())
    }

    /// Creates a new invalid range error
    pub fn invalid_range<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Returns true if retrying the same call may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MailboxFull { .. })
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidRange(_) | Self::UnknownOp(_) => "validation",
            Self::Io(_) => "io",
            Self::Yaml(_) => "serialization",
            Self::Join(_) => "async",
            Self::ChannelSend { .. } | Self::ChannelReceive { .. } => "channel",
            Self::MailboxFull { .. } => "backpressure",
        }
    }
}
