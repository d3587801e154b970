//! Component resolution.
//!
//! The engine never owns component instances; it asks a [`Resolver`] for
//! them. [`Container`] is the included resolver: an explicit context passed
//! to the scanner, interceptor and binder instead of a process-wide lookup.

mod container;
mod error;
mod instance;

pub use container::Container;
pub use error::ResolveError;
pub use instance::Instance;

use crate::metadata::TypeKey;

/// Resolves a type to its single shared instance.
pub trait Resolver: Send + Sync {
    fn resolve_instance(&self, ty: &TypeKey) -> Result<Instance, ResolveError>;
}
