use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the recorder may fall back to a local dump instead of failing.
    pub fn is_transport_selection(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedTransport(_) | Error::Configuration(_)
        )
    }
}
