use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The teacher/grader model call itself failed (network, provider error).
    Model(String),

    /// The teacher's response didn't contain all four required sections.
    MalformedResponse(String),

    Core(cognis_core::Error),
    Index(cognis_index::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Model(msg) => write!(f, "model call failed: {msg}"),
            Error::MalformedResponse(msg) => write!(f, "malformed teacher response: {msg}"),
            Error::Core(err) => write!(f, "{err}"),
            Error::Index(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Core(err) => Some(err),
            Error::Index(err) => Some(err),
            _ => None,
        }
    }
}

impl From<cognis_core::Error> for Error {
    fn from(err: cognis_core::Error) -> Self {
        Error::Core(err)
    }
}

impl From<cognis_index::Error> for Error {
    fn from(err: cognis_index::Error) -> Self {
        Error::Index(err)
    }
}
