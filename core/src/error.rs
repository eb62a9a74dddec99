use thiserror::Error;

use crate::controller::ControllerError;
use crate::transport::TransportError;

/// Failure of a controller method.
///
/// Transport failures and backend-reported failures stay distinct so callers
/// can react differently, e.g. show "backend offline" versus the backend's own
/// message.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// The backend reported success but `data` did not match the expected record shape.
    #[error("Unexpected data returned by '{command}': {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_controller(&self) -> Option<&ControllerError> {
        match self {
            Error::Controller(e) => Some(e),
            _ => None,
        }
    }
}
