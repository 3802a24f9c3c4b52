use thiserror::Error;

use tether_shared::PayloadError;

#[derive(Debug, Error)]
pub enum ApplyError {
    /// The payload addresses a holder this client has no replica of
    #[error("no replica of {holder} to apply the payload to")]
    HolderNotFound { holder: String },
    /// The payload bytes could not be read
    #[error("unreadable payload: {0}")]
    Payload(#[from] PayloadError),
}
