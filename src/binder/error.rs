//! Error types for binding subscriptions and invoking handlers.

use std::error::Error;
use std::fmt;

use crate::metadata::TypeKey;
use crate::resolver::ResolveError;
use crate::transport::TransportError;

/// Error type for a single handler invocation.
///
/// Never leaves the dispatch boundary: it is counted and logged with the
/// topic and handler that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The decoded payload is not of the handler's body type.
    PayloadMismatch { expected: &'static str },
    /// The handler takes a body but the delivery carried none.
    MissingPayload { expected: &'static str },
    /// The resolved instance is not of the controller's type.
    InstanceMismatch {
        expected: &'static str,
        method: &'static str,
    },
    /// The return value could not be turned into a structured value.
    Output(String),
    /// The handler returned an error.
    Failed(String),
    /// The handler panicked.
    Panicked(String),
}

impl HandlerError {
    /// Wrap an error returned by handler code.
    pub fn failed(err: impl fmt::Display) -> Self {
        HandlerError::Failed(err.to_string())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::PayloadMismatch { expected } => {
                write!(f, "payload is not a {}", expected)
            }
            HandlerError::MissingPayload { expected } => {
                write!(f, "missing payload of type {}", expected)
            }
            HandlerError::InstanceMismatch { expected, method } => {
                write!(f, "cannot call {} on an instance that is not a {}", method, expected)
            }
            HandlerError::Output(msg) => write!(f, "handler output not serialisable: {}", msg),
            HandlerError::Failed(msg) => write!(f, "handler failed: {}", msg),
            HandlerError::Panicked(msg) => write!(f, "handler panicked: {}", msg),
        }
    }
}

impl Error for HandlerError {}

/// Error type for the wrap and bind phases. Fatal to startup.
#[derive(Debug)]
pub enum BindError {
    /// A publisher type offers no way to build an intercepting proxy.
    NonInterceptable { component: TypeKey },
    /// The interceptor did not accept the resolved instance.
    InterceptorMismatch { component: TypeKey },
    /// A component instance could not be resolved.
    Unresolved(ResolveError),
    /// The transport refused a subscription.
    Subscribe {
        topic: String,
        source: TransportError,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::NonInterceptable { component } => {
                write!(f, "publisher {} cannot be intercepted", component.name())
            }
            BindError::InterceptorMismatch { component } => {
                write!(
                    f,
                    "interceptor for {} rejected the resolved instance",
                    component.name()
                )
            }
            BindError::Unresolved(e) => write!(f, "unresolved component: {}", e),
            BindError::Subscribe { topic, source } => {
                write!(f, "failed to subscribe to '{}': {}", topic, source)
            }
        }
    }
}

impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BindError::Unresolved(e) => Some(e),
            BindError::Subscribe { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ResolveError> for BindError {
    fn from(err: ResolveError) -> Self {
        BindError::Unresolved(err)
    }
}
