//! Per-message dispatch for a bound controller method.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::error::HandlerError;
use crate::client::EventClient;
use crate::marshal::MarshalError;
use crate::metadata::{Invoker, MethodRef, Payload};
use crate::resolver::Instance;

/// Snapshot of delivery counters across all bound handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryStats {
    /// Handler invocations that completed.
    pub delivered: u64,
    /// Handler invocations that returned an error or panicked.
    pub failed: u64,
    /// Messages dropped because they did not decode.
    pub rejected: u64,
    /// Handler results published to a producer topic.
    pub produced: u64,
    /// Handler results whose publish failed.
    pub dropped_outputs: u64,
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    produced: AtomicU64,
    dropped_outputs: AtomicU64,
}

impl DeliveryCounters {
    pub(crate) fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            produced: self.produced.load(Ordering::Relaxed),
            dropped_outputs: self.dropped_outputs.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything one subscription callback needs. Immutable once built.
pub(crate) struct Route {
    pub(crate) topic: String,
    pub(crate) output_topic: String,
    pub(crate) handler: MethodRef,
    pub(crate) instance: Instance,
    pub(crate) invoker: Invoker,
    pub(crate) client: EventClient,
    pub(crate) counters: Arc<DeliveryCounters>,
}

impl Route {
    /// Handle one inbound message. Never panics and never returns an error:
    /// every failure is isolated to this delivery.
    pub(crate) fn deliver(&self, decoded: Result<Option<Payload>, MarshalError>) {
        let payload = match decoded {
            Ok(payload) => payload,
            Err(err) => {
                DeliveryCounters::bump(&self.counters.rejected);
                warn!(
                    topic = %self.topic,
                    handler = %self.handler,
                    error = %err,
                    "dropping message that failed to decode"
                );
                return;
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.invoker)(&self.instance, payload)
        }));
        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return self.record_failure(err),
            Err(panic) => return self.record_failure(HandlerError::Panicked(panic_message(&*panic))),
        };
        DeliveryCounters::bump(&self.counters.delivered);

        if self.output_topic.is_empty() {
            return;
        }
        let Some(value) = output else {
            debug!(topic = %self.topic, handler = %self.handler, "handler produced nothing");
            return;
        };
        match self.client.emit_value(&self.output_topic, &value) {
            Ok(()) => DeliveryCounters::bump(&self.counters.produced),
            Err(err) => {
                DeliveryCounters::bump(&self.counters.dropped_outputs);
                error!(
                    topic = %self.topic,
                    output_topic = %self.output_topic,
                    handler = %self.handler,
                    error = %err,
                    "failed to publish handler result"
                );
            }
        }
    }

    fn record_failure(&self, err: HandlerError) {
        DeliveryCounters::bump(&self.counters.failed);
        error!(
            topic = %self.topic,
            handler = %self.handler,
            error = %err,
            "handler failed"
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
