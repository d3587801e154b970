//! Subscription binder: one transport subscription per controller binding.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::dispatch::{DeliveryCounters, DeliveryStats, Route};
use super::error::BindError;
use crate::client::EventClient;
use crate::metadata::{RoutingTable, TypeKey};
use crate::resolver::{Instance, Resolver};

/// Registers a subscription for every controller binding in a routing table.
///
/// Binding is a one-time logical registration. Reconnects are the
/// transport's concern and do not require binding again.
pub struct SubscriptionBinder {
    client: EventClient,
    counters: Arc<DeliveryCounters>,
}

impl SubscriptionBinder {
    pub fn new(client: EventClient) -> Self {
        Self {
            client,
            counters: Arc::new(DeliveryCounters::default()),
        }
    }

    /// Subscribe every controller binding in `routes`.
    ///
    /// Each owner type is resolved once and shared by all of its bindings.
    /// The first resolution or subscription failure aborts the bind.
    pub fn bind(&self, routes: &RoutingTable, resolver: &dyn Resolver) -> Result<(), BindError> {
        let mut instances: HashMap<TypeKey, Instance> = HashMap::new();

        for binding in &routes.controllers {
            let instance = match instances.get(&binding.owner_type) {
                Some(instance) => instance.clone(),
                None => {
                    let instance = resolver.resolve_instance(&binding.owner_type)?;
                    debug!(component = %binding.owner_type, "resolved controller");
                    instances.insert(binding.owner_type, instance.clone());
                    instance
                }
            };

            let route = Route {
                topic: binding.consumer.topic.clone(),
                output_topic: binding.producer.topic.clone(),
                handler: binding.handler_method,
                instance,
                invoker: Arc::clone(&binding.invoker),
                client: self.client.clone(),
                counters: Arc::clone(&self.counters),
            };

            self.client
                .subscribe_decoded(
                    &binding.consumer.topic,
                    binding.consumer.payload_type,
                    move |decoded| route.deliver(decoded),
                )
                .map_err(|source| BindError::Subscribe {
                    topic: binding.consumer.topic.clone(),
                    source,
                })?;

            info!(
                topic = %binding.consumer.topic,
                handler = %binding.handler_method,
                "subscribed"
            );
        }

        Ok(())
    }

    /// Delivery counters across every binding made by this binder.
    pub fn stats(&self) -> DeliveryStats {
        self.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> Arc<DeliveryCounters> {
        Arc::clone(&self.counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectOptions;
    use crate::binder::HandlerError;
    use crate::metadata::{
        ConsumerDescriptor, ControllerBinding, MethodRef, Payload, PayloadType,
        ProducerDescriptor,
    };
    use crate::resolver::{Container, ResolveError};
    use crate::transport::{InMemoryTransport, Transport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct Counter {
        seen: AtomicUsize,
    }

    fn binding(topic: &str, output: &str) -> ControllerBinding {
        ControllerBinding {
            owner_type: TypeKey::of::<Counter>(),
            handler_method: MethodRef {
                owner: TypeKey::of::<Counter>(),
                name: "count",
            },
            consumer: ConsumerDescriptor {
                topic: topic.into(),
                payload_type: Some(PayloadType::of::<u32>()),
            },
            producer: ProducerDescriptor::new(output),
            invoker: Arc::new(
                |instance: &Instance,
                 payload: Option<Payload>|
                 -> Result<Option<serde_json::Value>, HandlerError> {
                    let counter = instance.downcast_ref::<Counter>().unwrap();
                    let n: u32 = Payload::require(payload)?;
                    counter.seen.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(serde_json::json!(n + 1)))
                },
            ),
        }
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn bindings_share_one_resolved_instance() {
        let transport = InMemoryTransport::new();
        transport.connect(&ConnectOptions::default()).unwrap();
        let client = EventClient::json(Arc::new(transport.clone()));

        let resolutions = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&resolutions);
        let mut container = Container::new();
        container.singleton(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Counter {
                seen: AtomicUsize::new(0),
            }))
        });

        let routes = RoutingTable {
            controllers: vec![binding("a", "a/next"), binding("b", "")],
            publishers: Vec::new(),
        };
        let binder = SubscriptionBinder::new(client.clone());
        binder.bind(&routes, &container).unwrap();

        client.emit("a", &1u32).unwrap();
        client.emit("b", &2u32).unwrap();

        let counter = container.resolve::<Counter>().unwrap();
        assert!(wait_for(|| counter.seen.load(Ordering::SeqCst) == 2));
        assert!(wait_for(|| transport.find_all_by_topic("a/next").len() == 1));
        assert_eq!(transport.find_all_by_topic("a/next")[0].payload_str(), Some("2"));
        assert_eq!(resolutions.load(Ordering::SeqCst), 1);
        assert!(wait_for(|| binder.stats().delivered == 2));
    }

    #[test]
    fn unresolvable_owner_fails_the_bind() {
        let transport = InMemoryTransport::new();
        let client = EventClient::json(Arc::new(transport));
        let routes = RoutingTable {
            controllers: vec![binding("a", "")],
            publishers: Vec::new(),
        };

        let err = SubscriptionBinder::new(client)
            .bind(&routes, &Container::new())
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::Unresolved(ResolveError::NotBound(ty)) if ty == TypeKey::of::<Counter>()
        ));
    }

    #[test]
    fn empty_table_binds_nothing() {
        let transport = InMemoryTransport::new();
        let client = EventClient::json(Arc::new(transport.clone()));
        let routes = RoutingTable::default();
        SubscriptionBinder::new(client)
            .bind(&routes, &Container::new())
            .unwrap();
        assert_eq!(transport.subscription_count(), 0);
    }
}
