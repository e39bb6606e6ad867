use thiserror::Error;

use crate::browser::DriverError;
use crate::manager::SessionError;

/// Errors raised inside an action handler before it is folded into an
/// [`ActionResult`](crate::ActionResult).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Browser error: {0}")]
    Driver(#[from] DriverError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument(message.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
