//! Pub/sub transport seam.
//!
//! The engine only needs `connect`, `subscribe` and `publish`; reconnects,
//! QoS and redelivery belong to the transport implementation.
//!
//! ```text
//! EventClient ──► Transport ──► InMemoryTransport (included)
//!                           └─► broker clients (external)
//! ```

mod in_memory;
mod transport;

pub use in_memory::{topic_matches, InMemoryTransport, Message, DEFAULT_LOG_LIMIT};
pub use transport::{MessageCallback, Transport, TransportError};
