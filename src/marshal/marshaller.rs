//! Core marshaller trait.

use std::error::Error;
use std::fmt;

use serde_json::Value;

/// Error type for encoding and decoding payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// A value could not be turned into bytes.
    Encode(String),
    /// Bytes could not be read, or did not match the target type.
    Decode {
        target: &'static str,
        message: String,
    },
}

impl MarshalError {
    pub fn encode(err: impl fmt::Display) -> Self {
        MarshalError::Encode(err.to_string())
    }

    pub fn decode(target: &'static str, err: impl fmt::Display) -> Self {
        MarshalError::Decode {
            target,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalError::Encode(msg) => write!(f, "encode failed: {}", msg),
            MarshalError::Decode { target, message } => {
                write!(f, "decode as {} failed: {}", target, message)
            }
        }
    }
}

impl Error for MarshalError {}

/// Converts structured payload values to bytes and back.
///
/// Typed conversion (`T` to and from [`Value`]) is done by serde; the
/// marshaller only owns the byte format.
pub trait Marshaller: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, MarshalError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, MarshalError>;
}
