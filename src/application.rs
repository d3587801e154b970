//! Application composition root.
//!
//! Collects components and their instances, then runs the startup
//! sequence: scan, connect, wrap publishers, bind controllers.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use smooth_events::{
//!     ComponentMetadata, EventApplication, InMemoryTransport, MethodMetadata, ParamMetadata,
//!     Payload, handler_output,
//! };
//!
//! #[derive(Serialize, Deserialize)]
//! struct Order { msg: String }
//!
//! struct Orders;
//!
//! let metadata = ComponentMetadata::controller::<Orders>().method(
//!     MethodMetadata::new("create")
//!         .consumes("orders/create")
//!         .produces("orders/created")
//!         .param(ParamMetadata::body::<Order>("order"))
//!         .invoker(|_: &Orders, payload| {
//!             let order: Order = Payload::require(payload)?;
//!             handler_output(&Order { msg: format!("{} Next", order.msg) })
//!         }),
//! );
//!
//! let transport = InMemoryTransport::new();
//! let context = EventApplication::builder(transport.clone())
//!     .register(metadata, |_| Ok(smooth_events::Instance::new(Arc::new(Orders))))
//!     .build()
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(context.routes().controllers.len(), 1);
//! ```

use std::sync::Arc;

use tracing::info;

use crate::binder::{DeliveryCounters, DeliveryStats, SubscriptionBinder};
use crate::client::EventClient;
use crate::config::EventConfig;
use crate::error::Error;
use crate::interceptor::ProducerInterceptor;
use crate::marshal::{JsonMarshaller, Marshaller};
use crate::metadata::{Component, ComponentMetadata, RoutingTable};
use crate::resolver::{Container, Instance, ResolveError};
use crate::scanner;
use crate::transport::Transport;

/// Builder for [`EventApplication`].
pub struct EventApplicationBuilder {
    transport: Arc<dyn Transport>,
    marshaller: Arc<dyn Marshaller>,
    config: EventConfig,
    components: Vec<ComponentMetadata>,
    container: Container,
}

impl EventApplicationBuilder {
    pub fn config(mut self, config: EventConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default JSON marshaller.
    pub fn marshaller<M: Marshaller + 'static>(mut self, marshaller: M) -> Self {
        self.marshaller = Arc::new(marshaller);
        self
    }

    /// Register a component with an existing instance.
    ///
    /// For publishers `T` is the publisher trait object, e.g.
    /// `.component::<dyn Notifications>(Arc::new(LogNotifications))`.
    pub fn component<T>(mut self, instance: Arc<T>) -> Self
    where
        T: Component + ?Sized + Send + Sync,
    {
        self.components.push(T::metadata());
        self.container.bind(instance);
        self
    }

    /// Register a component built lazily from the running container.
    ///
    /// The factory sees publisher proxies, so a controller can depend on an
    /// intercepted publisher.
    pub fn component_with<T, F>(mut self, factory: F) -> Self
    where
        T: Component + ?Sized + Send + Sync,
        F: Fn(&Container) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.components.push(T::metadata());
        self.container.singleton(factory);
        self
    }

    /// Bind a plain dependency that carries no routing metadata.
    pub fn dependency<T: ?Sized + Send + Sync + 'static>(mut self, instance: Arc<T>) -> Self {
        self.container.bind(instance);
        self
    }

    /// Register hand-built metadata with a factory for its instance.
    ///
    /// The instance is bound under `metadata.component()`.
    pub fn register<F>(mut self, metadata: ComponentMetadata, factory: F) -> Self
    where
        F: Fn(&Container) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    {
        self.container.singleton_instance(metadata.component(), factory);
        self.components.push(metadata);
        self
    }

    pub fn build(self) -> EventApplication {
        EventApplication {
            transport: self.transport,
            marshaller: self.marshaller,
            config: self.config,
            components: self.components,
            container: self.container,
        }
    }
}

/// A set of components ready to be wired to a transport.
pub struct EventApplication {
    transport: Arc<dyn Transport>,
    marshaller: Arc<dyn Marshaller>,
    config: EventConfig,
    components: Vec<ComponentMetadata>,
    container: Container,
}

impl EventApplication {
    pub fn builder<T: Transport + 'static>(transport: T) -> EventApplicationBuilder {
        EventApplicationBuilder {
            transport: Arc::new(transport),
            marshaller: Arc::new(JsonMarshaller),
            config: EventConfig::default(),
            components: Vec::new(),
            container: Container::new(),
        }
    }

    /// Scan, connect, wrap publishers and bind controllers.
    ///
    /// Any failure aborts startup. On success the returned context hands
    /// out the proxied instances.
    pub fn run(self) -> Result<EventContext, Error> {
        let routes = scanner::scan(&self.components)?;

        let options = self.config.connect_options();
        self.transport.connect(&options)?;
        info!(address = %options.address(), client_id = %options.client_id, "connected");

        let client = EventClient::new(Arc::clone(&self.transport), Arc::clone(&self.marshaller));
        let mut container = self.container;
        container.bind(Arc::new(client.clone()));

        let proxied = ProducerInterceptor::new(client.clone()).wrap_all(&routes, &container)?;

        let binder = SubscriptionBinder::new(client.clone());
        binder.bind(&routes, &proxied)?;

        info!(
            controllers = routes.controllers.len(),
            publishers = routes.publishers.len(),
            "event application running"
        );
        Ok(EventContext {
            container: proxied,
            client,
            routes,
            counters: binder.counters(),
        })
    }
}

/// A running event application.
pub struct EventContext {
    container: Container,
    client: EventClient,
    routes: RoutingTable,
    counters: Arc<DeliveryCounters>,
}

impl EventContext {
    /// Resolve an instance; publishers resolve to their proxies.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        self.container.resolve::<T>()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn client(&self) -> &EventClient {
        &self.client
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn stats(&self) -> DeliveryStats {
        self.counters.snapshot()
    }
}
