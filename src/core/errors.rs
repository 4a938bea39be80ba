/*-------------------------------------------------------------------------------------------------
  Errors and Results
-------------------------------------------------------------------------------------------------*/

/// Boxed source error carried by [Error::FetchFailed].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the lookup engine. Neither kind is fatal; a failed lookup may simply be
/// retried by the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not an IPv4 or IPv6 address literal.
    #[error("invalid IP address: {0:?}")]
    InvalidAddress(String),

    /// Retrieving or deserializing the AWS IP Ranges JSON failed.
    #[error("failed to fetch AWS IP Ranges: {0}")]
    FetchFailed(#[source] BoxError),
}

// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_invalid_address(&self) -> bool {
        matches!(self, Error::InvalidAddress(_))
    }

    pub fn is_fetch_failed(&self) -> bool {
        matches!(self, Error::FetchFailed(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::FetchFailed(Box::new(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::FetchFailed(Box::new(error))
    }
}

/*--------------------------------------------------------------------------------------
  Log Error Function
--------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) fn log_error(error: &Error) {
    log::error!("{}", error);
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
