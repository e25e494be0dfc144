//! Error taxonomy for a notifier run.
//!
//! Only [`NotifierError::NotFound`] is recoverable (the orchestrator skips
//! the topic). Everything else aborts the run and is surfaced to `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config file is not valid JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("no feed available for topic {topic}")]
    NotFound { topic: String },

    #[error("failed to fetch feed for topic {topic}: {reason}")]
    Fetch { topic: String, reason: String },

    #[error("corrupt watermark for topic {topic}: {reason}")]
    Persistence { topic: String, reason: String },

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("relay rejected handshake with code {code}")]
    Protocol { code: u16 },

    #[error("unexpected handshake line: {0}")]
    UnexpectedLine(String),

    #[error("status line addressed to {got}, expected {expected}")]
    CrossTalk { expected: String, got: String },

    #[error("server disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifierError {
    pub fn fetch(topic: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            topic: topic.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(topic: &str, reason: impl ToString) -> Self {
        Self::Persistence {
            topic: topic.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;
