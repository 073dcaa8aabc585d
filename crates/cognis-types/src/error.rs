use std::fmt;

/// Result type for cognis-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// A value failed to serialize/deserialize to the expected wire shape
    Serde(serde_json::Error),

    /// A structurally invalid value was constructed (e.g. non-flat schema)
    Invalid(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serde(err) => write!(f, "serialization error: {}", err),
            Error::Invalid(msg) => write!(f, "invalid value: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serde(err) => Some(err),
            Error::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}
