//! Error taxonomy for the news board client.
//!
//! Every flow catches its own [`ClientError`] at the call site and stores a
//! single user-visible string in the feed state (see
//! [`ClientError::user_message`]). Nothing is retried.

use reqwest::StatusCode;

/// Errors raised by the API client and the three client flows.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never reached the server or no response came back.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}{}", fmt_detail(.message))]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    /// A client-side check failed before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// The server refused to issue an upload credential.
    #[error("could not obtain upload credential ({status}){}", fmt_detail(.message))]
    Credential {
        status: StatusCode,
        message: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The thumbnail file could not be read.
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    /// The configured API base URL cannot be joined with an endpoint path.
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

fn fmt_detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

impl ClientError {
    /// Convert the error into the string shown to the user.
    ///
    /// Validation messages are already phrased for the user and are returned
    /// as-is; everything else is prefixed with `action`, e.g.
    /// `"Failed to fetch news items: server returned 500 Internal Server Error"`.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            other => format!("{}: {}", action, other),
        }
    }

    /// `true` for errors raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
