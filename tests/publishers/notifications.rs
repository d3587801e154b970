//! Publisher traits and the components that use them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smooth_events::{event_controller, event_publisher};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub item: String,
}

#[event_publisher]
pub trait Notifications {
    #[event_producer("orders/notified")]
    fn notify(&self, order: &Order);

    #[event_producer(topic = "alerts")]
    fn alert(&self, text: &str);

    fn channel(&self) -> String;
}

/// Real implementation; its producer bodies must never run once intercepted.
#[derive(Default)]
pub struct RecordingNotifications {
    pub body_calls: AtomicUsize,
}

impl Notifications for RecordingNotifications {
    fn notify(&self, _order: &Order) {
        self.body_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn alert(&self, _text: &str) {
        self.body_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn channel(&self) -> String {
        "email".to_string()
    }
}

/// Controller that turns incoming orders into notifications.
pub struct OrderIntake {
    pub notifications: Arc<dyn Notifications>,
}

#[event_controller]
impl OrderIntake {
    #[event_consumer("orders/place")]
    fn place(&self, #[event_body] order: Order) {
        self.notifications.notify(&order);
    }
}

/// A publisher trait registered without an interceptor.
pub trait Plain: Send + Sync {
    fn send(&self, value: u32);
}

pub struct PlainSender;

impl Plain for PlainSender {
    fn send(&self, _value: u32) {}
}
