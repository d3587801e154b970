use std::error::Error;
use std::fmt;

use crate::metadata::TypeKey;

/// Error type for resolving component instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing is bound for the type.
    NotBound(TypeKey),
    /// The bound instance is not of the requested type.
    TypeMismatch { requested: TypeKey },
    /// A singleton factory failed.
    Factory { ty: TypeKey, message: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotBound(ty) => write!(f, "no binding for {}", ty.name()),
            ResolveError::TypeMismatch { requested } => {
                write!(f, "binding for {} holds a different type", requested.name())
            }
            ResolveError::Factory { ty, message } => {
                write!(f, "factory for {} failed: {}", ty.name(), message)
            }
        }
    }
}

impl Error for ResolveError {}
