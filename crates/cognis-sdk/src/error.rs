use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Engine(cognis_engine::Error),
    Index(cognis_index::Error),
    Transport(cognis_transport::Error),

    /// No template and no teacher model configured — nothing can answer
    /// this request.
    NoResponder,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Engine(err) => write!(f, "{err}"),
            Error::Index(err) => write!(f, "{err}"),
            Error::Transport(err) => write!(f, "{err}"),
            Error::NoResponder => write!(f, "no promoted template and no teacher model configured"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Engine(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Transport(err) => Some(err),
            Error::NoResponder => None,
        }
    }
}

impl From<cognis_engine::Error> for Error {
    fn from(err: cognis_engine::Error) -> Self {
        Error::Engine(err)
    }
}

impl From<cognis_index::Error> for Error {
    fn from(err: cognis_index::Error) -> Self {
        Error::Index(err)
    }
}

impl From<cognis_transport::Error> for Error {
    fn from(err: cognis_transport::Error) -> Self {
        Error::Transport(err)
    }
}
