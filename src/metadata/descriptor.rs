//! Routing descriptors produced by the scanner.
//!
//! Plain values: they are built once at startup and only read afterwards.
//! The call paths attached to bindings (invokers, interceptors) are ignored
//! by equality so two scans of the same components compare equal.

use std::fmt;

use super::component::{Interceptor, Invoker};
use super::type_key::{PayloadType, TypeKey};

/// "Invoke the handler when a message arrives on `topic`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerDescriptor {
    pub topic: String,
    /// `None` when the handler takes no body parameter.
    pub payload_type: Option<PayloadType>,
}

/// Output topic of a handler. Empty for pure consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProducerDescriptor {
    pub topic: String,
}

impl ProducerDescriptor {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    /// A descriptor for a method with no output topic.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.topic.is_empty()
    }
}

/// A method on a component type, used as handler identity in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: TypeKey,
    pub name: &'static str,
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.name)
    }
}

/// One consuming method on an event controller.
#[derive(Clone)]
pub struct ControllerBinding {
    pub owner_type: TypeKey,
    pub handler_method: MethodRef,
    pub consumer: ConsumerDescriptor,
    pub producer: ProducerDescriptor,
    pub(crate) invoker: Invoker,
}

impl PartialEq for ControllerBinding {
    fn eq(&self, other: &Self) -> bool {
        self.owner_type == other.owner_type
            && self.handler_method == other.handler_method
            && self.consumer == other.consumer
            && self.producer == other.producer
    }
}

impl fmt::Debug for ControllerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBinding")
            .field("owner_type", &self.owner_type)
            .field("handler_method", &self.handler_method)
            .field("consumer", &self.consumer)
            .field("producer", &self.producer)
            .finish()
    }
}

/// One producer-only method on an event publisher.
#[derive(Clone)]
pub struct PublisherBinding {
    pub owner_type: TypeKey,
    pub emit_method: MethodRef,
    pub topic: String,
    pub(crate) interceptor: Option<Interceptor>,
}

impl PublisherBinding {
    /// Whether the owner type provided a way to build a proxy.
    pub fn is_interceptable(&self) -> bool {
        self.interceptor.is_some()
    }
}

impl PartialEq for PublisherBinding {
    fn eq(&self, other: &Self) -> bool {
        self.owner_type == other.owner_type
            && self.emit_method == other.emit_method
            && self.topic == other.topic
    }
}

impl fmt::Debug for PublisherBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherBinding")
            .field("owner_type", &self.owner_type)
            .field("emit_method", &self.emit_method)
            .field("topic", &self.topic)
            .finish()
    }
}

/// All bindings discovered by a scan, in discovery order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutingTable {
    pub controllers: Vec<ControllerBinding>,
    pub publishers: Vec<PublisherBinding>,
}

impl RoutingTable {
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty() && self.publishers.is_empty()
    }

    /// Controller bindings consuming `topic`.
    pub fn consumers_of<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a ControllerBinding> {
        self.controllers
            .iter()
            .filter(move |binding| binding.consumer.topic == topic)
    }

    /// Publisher types in first-seen order, without duplicates.
    pub fn publisher_types(&self) -> Vec<TypeKey> {
        let mut types: Vec<TypeKey> = Vec::new();
        for binding in &self.publishers {
            if !types.contains(&binding.owner_type) {
                types.push(binding.owner_type);
            }
        }
        types
    }
}
