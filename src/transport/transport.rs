//! Core transport trait.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::config::ConnectOptions;

/// Callback invoked with the raw bytes of each inbound message.
pub type MessageCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Error type for transport operations.
#[derive(Debug)]
pub enum TransportError {
    /// Publish attempted before `connect`.
    NotConnected,
    /// Connection to the broker failed
    ConnectionFailed(String),
    /// The broker rejected a subscription or publish
    Rejected(String),
    /// Internal state lock was poisoned
    LockPoisoned(&'static str),
    /// Other error
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => write!(f, "transport is not connected"),
            TransportError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Rejected(msg) => write!(f, "rejected by broker: {}", msg),
            TransportError::LockPoisoned(operation) => {
                write!(f, "transport lock poisoned during {}", operation)
            }
            TransportError::Other(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// A publish/subscribe transport client.
///
/// Implementations own reconnection: a subscription registered once must
/// keep receiving messages across reconnects.
pub trait Transport: Send + Sync {
    fn connect(&self, options: &ConnectOptions) -> Result<(), TransportError>;

    /// Register `on_message` for every message arriving on `topic`.
    ///
    /// The callback runs on a thread owned by the transport.
    fn subscribe(&self, topic: &str, on_message: MessageCallback) -> Result<(), TransportError>;

    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn connect(&self, options: &ConnectOptions) -> Result<(), TransportError> {
        (**self).connect(options)
    }

    fn subscribe(&self, topic: &str, on_message: MessageCallback) -> Result<(), TransportError> {
        (**self).subscribe(topic, on_message)
    }

    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        (**self).publish(topic, payload)
    }
}
