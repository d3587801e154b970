//! Producer interception for event publishers.
//!
//! Publisher traits expose producer methods as typed emission points. The
//! interceptor swaps each resolved publisher for a proxy that publishes the
//! call argument instead of running the method body, and hands the proxies
//! out through a derived container.

mod producer;

pub use producer::ProducerInterceptor;
