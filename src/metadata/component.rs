//! The declarative metadata surface read by the scanner.
//!
//! `#[event_controller]` and `#[event_publisher]` expand into a
//! [`Component`] impl that builds a [`ComponentMetadata`]. The same builders
//! can be used by hand to register components without the macros.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::type_key::{Payload, PayloadType, TypeKey};
use crate::binder::HandlerError;
use crate::client::EventClient;
use crate::resolver::Instance;

/// Calls a consumer method on a resolved instance.
pub type Invoker =
    Arc<dyn Fn(&Instance, Option<Payload>) -> Result<Option<Value>, HandlerError> + Send + Sync>;

/// Builds an intercepting proxy around a resolved publisher instance.
///
/// Returns `None` when the instance is not of the publisher's type.
pub type Interceptor = Arc<dyn Fn(&Instance, &EventClient) -> Option<Instance> + Send + Sync>;

/// A type that carries event routing metadata.
pub trait Component: 'static {
    fn metadata() -> ComponentMetadata;
}

/// Type-level markers plus the marked methods of one component type.
#[derive(Clone)]
pub struct ComponentMetadata {
    component: TypeKey,
    controller: bool,
    publisher: bool,
    methods: Vec<MethodMetadata>,
    interceptor: Option<Interceptor>,
}

impl ComponentMetadata {
    /// Metadata for a type marked "is an event controller".
    pub fn controller<T: ?Sized + 'static>() -> Self {
        Self::unmarked::<T>().mark_controller()
    }

    /// Metadata for a type marked "is an event publisher".
    pub fn publisher<T: ?Sized + 'static>() -> Self {
        Self::unmarked::<T>().mark_publisher()
    }

    /// Metadata without any type-level marker. Scanning ignores it.
    pub fn unmarked<T: ?Sized + 'static>() -> Self {
        Self {
            component: TypeKey::of::<T>(),
            controller: false,
            publisher: false,
            methods: Vec::new(),
            interceptor: None,
        }
    }

    pub fn mark_controller(mut self) -> Self {
        self.controller = true;
        self
    }

    pub fn mark_publisher(mut self) -> Self {
        self.publisher = true;
        self
    }

    /// Add a marked method. Declaration order is kept.
    pub fn method(mut self, method: MethodMetadata) -> Self {
        self.methods.push(method);
        self
    }

    /// Make the publisher interceptable.
    ///
    /// `wrap` receives the raw instance and returns the proxy that will be
    /// handed out in its place.
    pub fn interceptor<P, F>(mut self, wrap: F) -> Self
    where
        P: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<P>, EventClient) -> Arc<P> + Send + Sync + 'static,
    {
        self.interceptor = Some(Arc::new(
            move |instance: &Instance, client: &EventClient| -> Option<Instance> {
                let raw = instance.downcast::<P>()?;
                Some(Instance::new(wrap(raw, client.clone())))
            },
        ));
        self
    }

    pub fn component(&self) -> TypeKey {
        self.component
    }

    pub fn is_controller(&self) -> bool {
        self.controller
    }

    pub fn is_publisher(&self) -> bool {
        self.publisher
    }

    pub fn methods(&self) -> &[MethodMetadata] {
        &self.methods
    }

    pub(crate) fn interceptor_fn(&self) -> Option<&Interceptor> {
        self.interceptor.as_ref()
    }
}

impl fmt::Debug for ComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentMetadata")
            .field("component", &self.component)
            .field("controller", &self.controller)
            .field("publisher", &self.publisher)
            .field("methods", &self.methods)
            .field("interceptable", &self.interceptor.is_some())
            .finish()
    }
}

/// One method carrying a consumer and/or producer marker.
#[derive(Clone)]
pub struct MethodMetadata {
    name: &'static str,
    consumes: Option<String>,
    produces: Option<String>,
    params: Vec<ParamMetadata>,
    invoker: Option<Invoker>,
}

impl MethodMetadata {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            consumes: None,
            produces: None,
            params: Vec::new(),
            invoker: None,
        }
    }

    /// Mark the method as consuming `topic`.
    pub fn consumes(mut self, topic: impl Into<String>) -> Self {
        self.consumes = Some(topic.into());
        self
    }

    /// Mark the method as producing to `topic`.
    pub fn produces(mut self, topic: impl Into<String>) -> Self {
        self.produces = Some(topic.into());
        self
    }

    pub fn param(mut self, param: ParamMetadata) -> Self {
        self.params.push(param);
        self
    }

    /// Attach the call path used when a message arrives.
    pub fn invoker<T, F>(mut self, invoke: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, Option<Payload>) -> Result<Option<Value>, HandlerError> + Send + Sync + 'static,
    {
        let name = self.name;
        self.invoker = Some(Arc::new(
            move |instance: &Instance,
                  payload: Option<Payload>|
                  -> Result<Option<Value>, HandlerError> {
                let target = instance
                    .downcast_ref::<T>()
                    .ok_or_else(|| HandlerError::InstanceMismatch {
                        expected: std::any::type_name::<T>(),
                        method: name,
                    })?;
                invoke(target, payload)
            },
        ));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn consumed_topic(&self) -> Option<&str> {
        self.consumes.as_deref()
    }

    pub fn produced_topic(&self) -> Option<&str> {
        self.produces.as_deref()
    }

    pub fn params(&self) -> &[ParamMetadata] {
        &self.params
    }

    pub(crate) fn invoker_fn(&self) -> Option<&Invoker> {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for MethodMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodMetadata")
            .field("name", &self.name)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("params", &self.params)
            .finish()
    }
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMetadata {
    name: &'static str,
    ty: TypeKey,
    body: Option<PayloadType>,
}

impl ParamMetadata {
    /// A parameter marked as the message body.
    pub fn body<T: DeserializeOwned + Send + 'static>(name: &'static str) -> Self {
        Self {
            name,
            ty: TypeKey::of::<T>(),
            body: Some(PayloadType::of::<T>()),
        }
    }

    /// An ordinary parameter.
    pub fn value<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            ty: TypeKey::of::<T>(),
            body: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    pub fn is_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn payload_type(&self) -> Option<PayloadType> {
        self.body
    }
}

/// Encode a value a handler returned for publishing.
///
/// Every value is published, including ones that encode as `null`. Callers
/// decide absence from the return type before calling this.
pub fn handler_output<T: Serialize + ?Sized>(value: &T) -> Result<Option<Value>, HandlerError> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|err| HandlerError::Output(err.to_string()))
}
