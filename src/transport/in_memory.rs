//! In-memory transport for testing and single-process scenarios.
//!
//! This module provides a thread-safe broker stand-in that implements
//! [`Transport`], useful for:
//! - Unit and integration testing without a running broker
//! - Single-process applications
//! - Exercising connection loss without network tooling

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread;

use tracing::{debug, error, trace, warn};

use super::transport::{MessageCallback, Transport, TransportError};
use crate::config::ConnectOptions;

/// A message accepted by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Message {
    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// In-memory pub/sub broker.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - One delivery thread per subscription, so messages on a subscription
///   arrive in publish order and handlers never run on the publisher's thread
/// - MQTT-style topic filters (`+` for one level, `#` for the rest)
/// - Accepted publishes are kept in a bounded log for inspection (the
///   newest [`DEFAULT_LOG_LIMIT`] by default, see [`with_log_limit`](Self::with_log_limit))
/// - A panicking callback loses only the message it was handling
/// - Connection loss can be simulated; publishes made while the connection
///   is cut are delivered once it is restored
///
/// ## Example
///
/// ```
/// use std::sync::{mpsc, Arc};
/// use smooth_events::{ConnectOptions, InMemoryTransport, Transport};
///
/// let transport = InMemoryTransport::new();
/// transport.connect(&ConnectOptions::default()).unwrap();
///
/// let (tx, rx) = mpsc::channel();
/// let tx = std::sync::Mutex::new(tx);
/// transport
///     .subscribe("sensors/+", Arc::new(move |bytes: &[u8]| {
///         let _ = tx.lock().unwrap().send(bytes.to_vec());
///     }))
///     .unwrap();
///
/// transport.publish("sensors/kitchen", b"21.5".to_vec()).unwrap();
/// assert_eq!(rx.recv().unwrap(), b"21.5".to_vec());
/// ```
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<State>>,
    /// Accepted publishes, oldest first
    log: Arc<RwLock<VecDeque<Message>>>,
    log_limit: usize,
}

/// Number of publishes kept by [`InMemoryTransport::new`].
pub const DEFAULT_LOG_LIMIT: usize = 10_000;

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            log: Arc::default(),
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

#[derive(Default)]
struct State {
    connected: bool,
    cut: bool,
    client_id: Option<String>,
    subscriptions: Vec<Subscription>,
    /// Publishes held back while the connection is cut
    pending: Vec<Message>,
}

struct Subscription {
    filter: String,
    sender: mpsc::Sender<Message>,
}

impl State {
    /// Queue `message` on every matching subscription. A subscription whose
    /// delivery thread is gone is dropped.
    fn deliver(&mut self, message: &Message) {
        self.subscriptions.retain(|subscription| {
            if !topic_matches(&subscription.filter, &message.topic) {
                return true;
            }
            match subscription.sender.send(message.clone()) {
                Ok(()) => true,
                Err(_) => {
                    warn!(filter = %subscription.filter, "delivery thread gone, dropping subscription");
                    false
                }
            }
        });
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` publishes in the log, dropping the oldest.
    /// `0` disables the log.
    pub fn with_log_limit(mut self, limit: usize) -> Self {
        self.log_limit = limit;
        self
    }

    fn state(&self, operation: &'static str) -> Result<MutexGuard<'_, State>, TransportError> {
        self.state
            .lock()
            .map_err(|_| TransportError::LockPoisoned(operation))
    }

    /// Simulate losing (`true`) or regaining (`false`) the broker connection.
    ///
    /// Subscriptions are kept across the outage. Messages published while
    /// cut are flushed, in order, when the connection comes back.
    pub fn set_connection_cut(&self, cut: bool) -> Result<(), TransportError> {
        let mut state = self.state("set_connection_cut")?;
        state.cut = cut;
        if !cut {
            let pending = std::mem::take(&mut state.pending);
            debug!(count = pending.len(), "connection restored, flushing pending messages");
            for message in &pending {
                state.deliver(message);
            }
        }
        Ok(())
    }

    /// Drop all subscriptions and mark the transport disconnected.
    ///
    /// Delivery threads exit once their queues drain.
    pub fn disconnect(&self) -> Result<(), TransportError> {
        let mut state = self.state("disconnect")?;
        state.connected = false;
        state.subscriptions.clear();
        state.pending.clear();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.connected)
            .unwrap_or(false)
    }

    /// Client id passed to the last `connect`.
    pub fn client_id(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.client_id.clone())
    }

    /// Number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.subscriptions.len())
            .unwrap_or(0)
    }

    /// Get all accepted messages in publish order.
    pub fn published(&self) -> Vec<Message> {
        self.log
            .read()
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Find all accepted messages published to exactly `topic`.
    pub fn find_all_by_topic(&self, topic: &str) -> Vec<Message> {
        self.log
            .read()
            .map(|log| log.iter().filter(|m| m.topic == topic).cloned().collect())
            .unwrap_or_default()
    }

    /// Clear the publish log (useful for test cleanup).
    pub fn clear_log(&self) {
        if let Ok(mut log) = self.log.write() {
            log.clear();
        }
    }
}

impl Transport for InMemoryTransport {
    fn connect(&self, options: &ConnectOptions) -> Result<(), TransportError> {
        let mut state = self.state("connect")?;
        state.connected = true;
        state.client_id = Some(options.client_id.clone());
        debug!(client_id = %options.client_id, address = %options.address(), "in-memory transport connected");
        Ok(())
    }

    fn subscribe(&self, topic: &str, on_message: MessageCallback) -> Result<(), TransportError> {
        let (sender, receiver) = mpsc::channel::<Message>();
        thread::Builder::new()
            .name(format!("deliver:{}", topic))
            .spawn(move || {
                for message in receiver {
                    trace!(topic = %message.topic, "delivering message");
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        on_message(message.payload.as_slice())
                    }));
                    if outcome.is_err() {
                        error!(topic = %message.topic, "subscriber callback panicked");
                    }
                }
            })
            .map_err(|e| TransportError::Other(Box::new(e)))?;

        let mut state = self.state("subscribe")?;
        state.subscriptions.push(Subscription {
            filter: topic.to_string(),
            sender,
        });
        Ok(())
    }

    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let message = Message {
            topic: topic.to_string(),
            payload,
        };

        let mut state = self.state("publish")?;
        if !state.connected {
            return Err(TransportError::NotConnected);
        }

        if self.log_limit > 0 {
            let mut log = self
                .log
                .write()
                .map_err(|_| TransportError::LockPoisoned("publish"))?;
            while log.len() >= self.log_limit {
                log.pop_front();
            }
            log.push_back(message.clone());
        }

        if state.cut {
            state.pending.push(message);
        } else {
            state.deliver(&message);
        }
        Ok(())
    }
}

/// Match a topic against an MQTT-style filter.
///
/// `+` matches exactly one level; `#` matches the remaining levels,
/// including none.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn connected() -> InMemoryTransport {
        let transport = InMemoryTransport::new();
        transport.connect(&ConnectOptions::default()).unwrap();
        transport
    }

    fn collector() -> (MessageCallback, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let callback: MessageCallback = Arc::new(move |bytes: &[u8]| {
            let _ = tx.lock().unwrap().send(bytes.to_vec());
        });
        (callback, rx)
    }

    #[test]
    fn publish_requires_connect() {
        let transport = InMemoryTransport::new();
        let err = transport.publish("a", b"x".to_vec()).unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[test]
    fn delivers_in_publish_order() {
        let transport = connected();
        let (callback, rx) = collector();
        transport.subscribe("orders", callback).unwrap();

        for i in 0..20u8 {
            transport.publish("orders", vec![i]).unwrap();
        }

        let received: Vec<u8> = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(1)).unwrap()[0])
            .collect();
        assert_eq!(received, (0..20u8).collect::<Vec<_>>());
    }

    #[test]
    fn only_matching_subscriptions_receive() {
        let transport = connected();
        let (callback, rx) = collector();
        transport.subscribe("orders/created", callback).unwrap();

        transport.publish("orders/deleted", b"no".to_vec()).unwrap();
        transport.publish("orders/created", b"yes".to_vec()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), b"yes");
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn cut_connection_buffers_until_restored() {
        let transport = connected();
        let (callback, rx) = collector();
        transport.subscribe("t", callback).unwrap();

        transport.set_connection_cut(true).unwrap();
        transport.publish("t", b"1".to_vec()).unwrap();
        transport.publish("t", b"2".to_vec()).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        transport.set_connection_cut(false).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), b"1");
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), b"2");
        assert_eq!(transport.subscription_count(), 1);
    }

    #[test]
    fn log_records_accepted_publishes() {
        let transport = connected();
        transport.publish("a", b"1".to_vec()).unwrap();
        transport.publish("b", b"2".to_vec()).unwrap();
        transport.publish("a", b"3".to_vec()).unwrap();

        assert_eq!(transport.published().len(), 3);
        let on_a = transport.find_all_by_topic("a");
        assert_eq!(on_a.len(), 2);
        assert_eq!(on_a[1].payload_str(), Some("3"));

        transport.clear_log();
        assert!(transport.published().is_empty());
    }

    #[test]
    fn log_keeps_only_the_newest_publishes() {
        let transport = InMemoryTransport::new().with_log_limit(2);
        transport.connect(&ConnectOptions::default()).unwrap();
        for payload in ["1", "2", "3"] {
            transport.publish("a", payload.as_bytes().to_vec()).unwrap();
        }

        let kept: Vec<_> = transport
            .published()
            .iter()
            .map(|m| m.payload_str().unwrap().to_string())
            .collect();
        assert_eq!(kept, vec!["2", "3"]);

        let silent = InMemoryTransport::new().with_log_limit(0);
        silent.connect(&ConnectOptions::default()).unwrap();
        silent.publish("a", b"1".to_vec()).unwrap();
        assert!(silent.published().is_empty());
    }

    #[test]
    fn panicking_callback_keeps_the_subscription_alive() {
        let transport = connected();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let callback: MessageCallback = Arc::new(move |bytes: &[u8]| {
            if bytes == b"boom" {
                panic!("callback failed");
            }
            let _ = tx.lock().unwrap().send(bytes.to_vec());
        });
        transport.subscribe("t", callback).unwrap();

        transport.publish("t", b"boom".to_vec()).unwrap();
        transport.publish("t", b"after".to_vec()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), b"after");
        assert_eq!(transport.subscription_count(), 1);
    }

    #[test]
    fn subscription_without_delivery_thread_is_pruned() {
        let transport = connected();
        let (sender, receiver) = mpsc::channel::<Message>();
        drop(receiver);
        transport.state("test").unwrap().subscriptions.push(Subscription {
            filter: "t".into(),
            sender,
        });

        transport.publish("t", b"x".to_vec()).unwrap();
        assert_eq!(transport.subscription_count(), 0);
    }

    #[test]
    fn disconnect_drops_subscriptions() {
        let transport = connected();
        let (callback, _rx) = collector();
        transport.subscribe("t", callback).unwrap();

        transport.disconnect().unwrap();
        assert_eq!(transport.subscription_count(), 0);
        assert!(!transport.is_connected());
    }

    #[test]
    fn wildcard_filters() {
        assert!(topic_matches("a/b", "a/b"));
        assert!(!topic_matches("a/b", "a/c"));
        assert!(topic_matches("a/+/c", "a/b/c"));
        assert!(!topic_matches("a/+", "a/b/c"));
        assert!(topic_matches("a/#", "a/b/c"));
        assert!(topic_matches("a/#", "a"));
        assert!(topic_matches("#", "anything/at/all"));
        assert!(!topic_matches("a/b/c", "a/b"));
    }
}
