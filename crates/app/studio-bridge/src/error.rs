use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge not ready: the host has not completed the handshake")]
    NotReady,

    #[error("invalid generateContent options: {0}")]
    Validation(String),

    #[error("a generateContent call is already in progress")]
    CallInProgress,

    #[error("init has already been called for this session")]
    AlreadyInitialized,

    #[error("function `{0}` is declared more than once")]
    DuplicateFunction(String),

    #[error("no reply for request {0} before the timeout")]
    Timeout(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("pending call was dropped before it completed")]
    Closed,

    #[error("no screenshot provider was registered at init")]
    NoScreenshotProvider,

    #[error("screenshot provider failed: {0}")]
    Screenshot(anyhow::Error),

    #[error("handshake from untrusted origin {0}")]
    UntrustedOrigin(String),
}

impl BridgeError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport channel closed")]
    Closed,

    #[error("transport error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read bridge config from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse bridge config from {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json_lenient::Error,
    },
}
