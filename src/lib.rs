pub mod api;
pub mod model;
pub mod poller;
pub mod settings;
pub mod storage;

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Reasons a poll run ends without a reading.
#[derive(Debug)]
pub enum Error {
    Api(api::Error),
    Io(PathBuf, io::Error),
    /// Telemetry still refused after re-authenticating.
    NoReading(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api(e) => fmt::Display::fmt(e, f),
            Error::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            Error::NoReading(s) => write!(f, "No power reading obtained: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Api(e) => Some(e),
            Error::Io(_, e) => Some(e),
            Error::NoReading(_) => None,
        }
    }
}

impl From<api::Error> for Error {
    fn from(error: api::Error) -> Self {
        Error::Api(error)
    }
}
