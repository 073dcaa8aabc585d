use std::fmt;

/// Result type for cognis-index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the index layer.
#[derive(Debug)]
pub enum Error {
    /// A SQLite operation failed.
    Database(rusqlite::Error),

    /// A record failed to serialize/deserialize to its wire shape.
    Serde(serde_json::Error),

    /// Query-specific error (not found, invalid input, etc.).
    Query(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "database error: {}", err),
            Error::Serde(err) => write!(f, "serialization error: {}", err),
            Error::Query(msg) => write!(f, "query error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Serde(err) => Some(err),
            Error::Query(_) => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}
