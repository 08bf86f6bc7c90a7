//! Error types for yuyu client operations.

use thiserror::Error;

/// Result type alias for yuyu operations.
pub type Result<T> = std::result::Result<T, YuyuError>;

/// Main error type for yuyu operations.
#[derive(Error, Debug)]
pub enum YuyuError {
    /// Remote failure: transport error, non-2xx status, or `ok:false` body.
    #[error("API error{}: {message}", status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Api {
        /// HTTP status, absent when the request never got a response.
        status: Option<u16>,
        /// Best available failure message.
        message: String,
    },

    /// Client-side input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image type or size rejected before upload
    #[error("Media error: {0}")]
    Media(String),

    /// The action needs a logged-in session
    #[error("Not logged in")]
    NotAuthenticated,

    /// A mutation for the same target is still awaiting the server
    #[error("Request already in flight: {0}")]
    InFlight(String),

    /// Referenced item is not present locally
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session persistence errors
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl YuyuError {
    /// Creates a new API error.
    pub fn api<T: ToString>(status: Option<u16>, msg: T) -> Self {
        Self::Api {
            status,
            message: msg.to_string(),
        }
    }

    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Creates a new media error.
    pub fn media<T: ToString>(msg: T) -> Self {
        Self::Media(msg.to_string())
    }

    /// Creates a new in-flight error.
    pub fn in_flight<T: ToString>(msg: T) -> Self {
        Self::InFlight(msg.to_string())
    }

    /// Creates a new not found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Creates a new session error.
    pub fn session<T: ToString>(msg: T) -> Self {
        Self::Session(msg.to_string())
    }

    /// Creates a new configuration error.
    pub fn config<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Returns true if the error came from the remote API.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

impl From<serde_json::Error> for YuyuError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
