//! Subscription binding and per-message dispatch for event controllers.

mod binder;
mod dispatch;
mod error;

pub use binder::SubscriptionBinder;
pub use dispatch::DeliveryStats;
pub use error::{BindError, HandlerError};

pub(crate) use dispatch::DeliveryCounters;
