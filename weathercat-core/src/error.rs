use thiserror::Error;

/// Errors raised by the forecast pipeline and its data sources.
#[derive(Debug, Error)]
pub enum Error {
    /// A WMO weather code outside the documented table.
    #[error("Unsupported WMO Weather interpretation code: {0}")]
    UnsupportedCode(u8),

    /// A payload that does not have the expected shape.
    #[error("Unsupported forecast data: {0}")]
    UnsupportedData(String),

    /// The remote service could not be reached or refused the request.
    #[error("Connection to {service} failed: {reason}")]
    ServiceUnavailable {
        service: &'static str,
        reason: String,
    },

    /// The query was understood but matched nothing.
    #[error("Unknown location: {0}")]
    NotFound(String),

    #[error("Ephemeris error: {0}")]
    Ephemeris(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn unavailable(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ServiceUnavailable {
            service,
            reason: err.to_string(),
        }
    }

    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::UnsupportedData(message.into())
    }
}
