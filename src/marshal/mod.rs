//! Payload marshalling between structured values and wire bytes.

mod json;
mod marshaller;

pub use json::JsonMarshaller;
pub use marshaller::{MarshalError, Marshaller};
