use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Ran out of retry attempts; carries the last attempt's error.
    RetriesExhausted(String),

    /// A template body failed to parse.
    TemplateSyntax(String),

    /// A schema is not flat (nested objects or arrays of objects).
    NonFlatSchema(String),

    /// Reference to an unknown rendering helper.
    UnknownHelper(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RetriesExhausted(msg) => write!(f, "retries exhausted: {}", msg),
            Error::TemplateSyntax(msg) => write!(f, "template syntax error: {}", msg),
            Error::NonFlatSchema(msg) => write!(f, "schema is not flat: {}", msg),
            Error::UnknownHelper(name) => write!(f, "unknown rendering helper: {}", name),
        }
    }
}

impl std::error::Error for Error {}
