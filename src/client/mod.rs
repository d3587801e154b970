//! Event client: the typed façade over transport and marshaller.

mod client;
mod error;

pub use client::EventClient;
pub use error::ClientError;
