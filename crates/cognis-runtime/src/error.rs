use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Index(cognis_index::Error),

    /// A worker's channel counterpart was dropped.
    ChannelClosed(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Index(err) => write!(f, "{err}"),
            Error::ChannelClosed(what) => write!(f, "{what} channel closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Index(err) => Some(err),
            Error::ChannelClosed(_) => None,
        }
    }
}

impl From<cognis_index::Error> for Error {
    fn from(err: cognis_index::Error) -> Self {
        Error::Index(err)
    }
}
