/// Error taxonomy for the viewer
///
/// Every error here is recoverable: the window stays interactive and the
/// engine leaves its state untouched when one is reported. Errors are `Clone`
/// so they can travel inside iced messages.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// The request never produced a response (connection refused, timeout...)
    #[error("network request failed: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A response body or image could not be decoded
    #[error("could not decode {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ViewerError {
    /// Short text for the status line
    pub fn summary(&self) -> String {
        match self {
            ViewerError::Network(_) => "Server unreachable".to_string(),
            ViewerError::Status { status, .. } => format!("Server error ({})", status),
            ViewerError::Decode(_) => "Unreadable response".to_string(),
            ViewerError::InvalidUrl(_) => "Bad server address".to_string(),
            ViewerError::Config(_) => "Bad configuration".to_string(),
        }
    }
}

impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ViewerError::Decode(format!("response: {}", err))
        } else if let Some(status) = err.status() {
            ViewerError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ViewerError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ViewerError {
    fn from(err: url::ParseError) -> Self {
        ViewerError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Config(err.to_string())
    }
}
