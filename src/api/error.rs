use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    LoginError(String),
    ApiError(String),
    /// Response body and the reason it could not be understood.
    InvalidResponse(String, String),
    RateExceeded(String),
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LoginError(s) => write!(f, "Error while authenticating to Solarman API: {}", s),
            Error::ApiError(s) => write!(f, "Solarman API error: {}", s),
            Error::InvalidResponse(body, reason) => {
                write!(f, "Invalid Solarman API response ({}): {}", reason, body)
            }
            Error::RateExceeded(s) => write!(f, "Solarman API rate exceeded: {}", s),
            Error::InternalError => write!(f, "Internal error while building HTTP client"),
        }
    }
}

impl std::error::Error for Error {}
