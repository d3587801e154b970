//! Declarative event routing over publish/subscribe transports.
//!
//! Components declare which topics their methods consume and produce.
//! At startup the application scans that metadata into a routing table,
//! subscribes every consumer method and swaps publisher components for
//! proxies that publish instead of running method bodies.

extern crate self as smooth_events;

mod application;
mod config;
mod error;

pub mod binder;
pub mod client;
pub mod interceptor;
pub mod marshal;
pub mod metadata;
pub mod resolver;
pub mod scanner;
pub mod transport;

pub use application::{EventApplication, EventApplicationBuilder, EventContext};
pub use binder::{BindError, DeliveryStats, HandlerError, SubscriptionBinder};
pub use client::{ClientError, EventClient};
pub use config::{ConfigError, ConnectOptions, EventConfig};
pub use error::Error;
pub use interceptor::ProducerInterceptor;
pub use marshal::{JsonMarshaller, MarshalError, Marshaller};
pub use metadata::{
    handler_output, Component, ComponentMetadata, ConsumerDescriptor, ControllerBinding,
    MethodMetadata, MethodRef, ParamMetadata, Payload, PayloadType, ProducerDescriptor,
    PublisherBinding, RoutingTable, TypeKey,
};
pub use resolver::{Container, Instance, ResolveError, Resolver};
pub use scanner::{scan, ScanError};
pub use transport::{
    topic_matches, InMemoryTransport, Message, MessageCallback, Transport, TransportError,
};

// Structured value every payload passes through; used by generated code.
pub use serde_json::Value;

#[cfg(feature = "macros")]
pub use smooth_events_macros::{event_controller, event_publisher};
