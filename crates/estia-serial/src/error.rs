//! Request errors.

use estia_frame::{FrameError, ERR_NOT_EXIST, ERR_TIMEOUT};
use thiserror::Error;

/// Errors from a synchronous data request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// No response byte arrived within the request timeout.
    #[error("no response within {0} ms")]
    Timeout(u64),

    /// The sensor name is not in the sensor table.
    #[error("unknown sensor: {0}")]
    UnknownSensor(String),

    /// A response arrived but did not decode.
    #[error("invalid response: {0}")]
    Decode(#[from] FrameError),
}

impl RequestError {
    /// The signed sentinel code recorded in place of a value.
    pub fn code(&self) -> i16 {
        match self {
            RequestError::Timeout(_) => ERR_TIMEOUT,
            RequestError::UnknownSensor(_) => ERR_NOT_EXIST,
            RequestError::Decode(err) => err.code(),
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        self.code() <= ERR_TIMEOUT
    }
}
