use std::error::Error;
use std::fmt;

use crate::metadata::TypeKey;

/// Error type for scanning component metadata. Fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A consumer method marks more than one parameter as the message body.
    AmbiguousPayload {
        component: TypeKey,
        method: &'static str,
        params: Vec<&'static str>,
    },
    /// A consumer or producer marker with an empty topic.
    EmptyTopic {
        component: TypeKey,
        method: &'static str,
    },
    /// A consumer method with no way to call it.
    NotInvocable {
        component: TypeKey,
        method: &'static str,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::AmbiguousPayload {
                component,
                method,
                params,
            } => write!(
                f,
                "{}::{} marks more than one body parameter: {}",
                component,
                method,
                params.join(", ")
            ),
            ScanError::EmptyTopic { component, method } => {
                write!(f, "{}::{} declares an empty topic", component, method)
            }
            ScanError::NotInvocable { component, method } => {
                write!(f, "{}::{} consumes a topic but has no invoker", component, method)
            }
        }
    }
}

impl Error for ScanError {}
