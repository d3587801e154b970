//! Typed emit and subscribe over a transport.
//!
//! The client holds no routing knowledge. The subscription binder builds on
//! [`EventClient::subscribe_decoded`], and application code may use the
//! typed [`emit`](EventClient::emit) / [`subscribe`](EventClient::subscribe)
//! directly.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, trace, warn};

use super::error::ClientError;
use crate::marshal::{JsonMarshaller, MarshalError, Marshaller};
use crate::metadata::{Payload, PayloadType};
use crate::transport::{MessageCallback, Transport, TransportError};

/// Typed layer over a [`Transport`] and a [`Marshaller`].
///
/// Cheap to clone; clones share the same transport.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use serde::{Deserialize, Serialize};
/// use smooth_events::{ConnectOptions, EventClient, InMemoryTransport, Transport};
///
/// #[derive(Serialize, Deserialize)]
/// struct Greeting { msg: String }
///
/// let transport = InMemoryTransport::new();
/// transport.connect(&ConnectOptions::default()).unwrap();
/// let client = EventClient::json(Arc::new(transport.clone()));
///
/// client.emit("greetings", &Greeting { msg: "Hello".into() }).unwrap();
/// let sent = transport.find_all_by_topic("greetings");
/// assert_eq!(sent[0].payload_str(), Some(r#"{"msg":"Hello"}"#));
/// ```
#[derive(Clone)]
pub struct EventClient {
    transport: Arc<dyn Transport>,
    marshaller: Arc<dyn Marshaller>,
}

impl EventClient {
    pub fn new(transport: Arc<dyn Transport>, marshaller: Arc<dyn Marshaller>) -> Self {
        Self {
            transport,
            marshaller,
        }
    }

    /// Client using the JSON wire format.
    pub fn json(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, Arc::new(JsonMarshaller))
    }

    /// Encode `payload` and publish it to `topic`.
    pub fn emit<T: Serialize + ?Sized>(&self, topic: &str, payload: &T) -> Result<(), ClientError> {
        let value = serde_json::to_value(payload).map_err(MarshalError::encode)?;
        self.emit_value(topic, &value)
    }

    /// Publish an already structured value to `topic`.
    pub fn emit_value(&self, topic: &str, value: &Value) -> Result<(), ClientError> {
        let bytes = self.marshaller.encode(value)?;
        self.transport.publish(topic, bytes)?;
        trace!(topic, "event emitted");
        Ok(())
    }

    /// Fire-and-forget [`emit`](Self::emit); failures are logged.
    pub fn emit_or_log<T: Serialize + ?Sized>(&self, topic: &str, payload: &T) {
        if let Err(err) = self.emit(topic, payload) {
            error!(topic, error = %err, "failed to emit event");
        }
    }

    /// Call `handler` with every message on `topic` decoded as `T`.
    ///
    /// Messages that fail to decode are logged and dropped; the
    /// subscription stays active. Whatever `handler` returns is discarded:
    /// only bound controller methods publish their results.
    pub fn subscribe<T, R, F>(&self, topic: &str, handler: F) -> Result<(), TransportError>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let owned_topic = topic.to_string();
        self.subscribe_decoded(topic, Some(PayloadType::of::<T>()), move |decoded| {
            let payload = match decoded {
                Ok(Some(payload)) => payload,
                Ok(None) => return,
                Err(err) => {
                    warn!(topic = %owned_topic, error = %err, "dropping message that failed to decode");
                    return;
                }
            };
            match payload.downcast::<T>() {
                Ok(value) => {
                    let _ = handler(value);
                }
                Err(_) => warn!(topic = %owned_topic, "decoded payload has unexpected type"),
            }
        })
    }

    /// Register `handler` for `topic`, decoding each message as `payload_type`.
    ///
    /// With no payload type the message body is ignored and the handler
    /// receives `Ok(None)`. Decode failures are passed to the handler so the
    /// caller decides how to report them.
    pub fn subscribe_decoded<F>(
        &self,
        topic: &str,
        payload_type: Option<PayloadType>,
        handler: F,
    ) -> Result<(), TransportError>
    where
        F: Fn(Result<Option<Payload>, MarshalError>) + Send + Sync + 'static,
    {
        let marshaller = Arc::clone(&self.marshaller);
        let callback: MessageCallback = Arc::new(move |bytes: &[u8]| {
            let decoded = match payload_type {
                None => Ok(None),
                Some(ty) => marshaller
                    .decode(bytes)
                    .and_then(|value| ty.decode(value))
                    .map(Some),
            };
            handler(decoded);
        });
        self.transport.subscribe(topic, callback)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl fmt::Debug for EventClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventClient(..)")
    }
}
