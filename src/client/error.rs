use std::error::Error;
use std::fmt;

use crate::marshal::MarshalError;
use crate::transport::TransportError;

/// Error type for emitting and subscribing through the [`EventClient`](super::EventClient).
#[derive(Debug)]
pub enum ClientError {
    /// The payload could not be encoded.
    Marshal(MarshalError),
    /// The transport refused the publish or subscription.
    Transport(TransportError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Marshal(e) => write!(f, "marshal error: {}", e),
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Marshal(e) => Some(e),
            ClientError::Transport(e) => Some(e),
        }
    }
}

impl From<MarshalError> for ClientError {
    fn from(err: MarshalError) -> Self {
        ClientError::Marshal(err)
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}
