use std::fmt;

/// Result type for cognis-transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy entries 1 and 2 from the error-handling design: transport
/// failures and protocol failures. Both surface to the caller; neither is
/// retried automatically (retries apply to log operations only).
#[derive(Debug)]
pub enum Error {
    /// HTTP status != 2xx, including the status and response body.
    Http { status: u16, body: String },

    /// The underlying request failed at the network layer.
    Network(reqwest::Error),

    /// A JSON-RPC error object was present in the response.
    Rpc { code: i64, message: String },

    /// The response didn't match any of the known result shapes.
    UnexpectedResponseFormat,

    /// An SSE stream ended without a final event.
    MissingFinalEvent,

    /// JSON (de)serialization failure.
    Serde(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http { status, body } => write!(f, "http error {status}: {body}"),
            Error::Network(err) => write!(f, "network error: {err}"),
            Error::Rpc { code, message } => write!(f, "RPC error {code}: {message}"),
            Error::UnexpectedResponseFormat => write!(f, "unexpected response format"),
            Error::MissingFinalEvent => write!(f, "stream ended without a final event"),
            Error::Serde(err) => write!(f, "serialization error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Network(err) => Some(err),
            Error::Serde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}
