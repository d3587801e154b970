//! Builds the routing table from component metadata.

use std::sync::Arc;

use tracing::{debug, info};

use super::error::ScanError;
use crate::metadata::{
    ComponentMetadata, ConsumerDescriptor, ControllerBinding, MethodMetadata, MethodRef,
    ProducerDescriptor, PublisherBinding, RoutingTable,
};

/// Scan components into a [`RoutingTable`].
///
/// Controller methods with a consumer marker become controller bindings;
/// publisher methods with a producer marker become publisher bindings. A
/// component carrying both markers goes through both passes. Bindings keep
/// the order of `components` and of their methods.
///
/// Pure and repeatable: scanning the same input twice yields equal tables.
pub fn scan(components: &[ComponentMetadata]) -> Result<RoutingTable, ScanError> {
    let mut routes = RoutingTable::default();

    for component in components {
        if component.is_controller() {
            scan_controller(component, &mut routes)?;
        }
        if component.is_publisher() {
            scan_publisher(component, &mut routes)?;
        }
        if !component.is_controller() && !component.is_publisher() {
            debug!(component = %component.component(), "skipping unmarked component");
        }
    }

    info!(
        controllers = routes.controllers.len(),
        publishers = routes.publishers.len(),
        "scan complete"
    );
    Ok(routes)
}

fn scan_controller(
    component: &ComponentMetadata,
    routes: &mut RoutingTable,
) -> Result<(), ScanError> {
    let owner = component.component();

    for method in component.methods() {
        let Some(topic) = method.consumed_topic() else {
            continue;
        };
        require_topic(component, method, topic)?;

        let mut bodies = method.params().iter().filter(|param| param.is_body());
        let payload_type = match (bodies.next(), bodies.next()) {
            (None, _) => None,
            (Some(body), None) => body.payload_type(),
            (Some(_), Some(_)) => {
                return Err(ScanError::AmbiguousPayload {
                    component: owner,
                    method: method.name(),
                    params: method
                        .params()
                        .iter()
                        .filter(|param| param.is_body())
                        .map(|param| param.name())
                        .collect(),
                });
            }
        };

        let producer = match method.produced_topic() {
            Some(output) => {
                require_topic(component, method, output)?;
                ProducerDescriptor::new(output)
            }
            None => ProducerDescriptor::none(),
        };

        let invoker = method.invoker_fn().ok_or(ScanError::NotInvocable {
            component: owner,
            method: method.name(),
        })?;

        let binding = ControllerBinding {
            owner_type: owner,
            handler_method: MethodRef {
                owner,
                name: method.name(),
            },
            consumer: ConsumerDescriptor {
                topic: topic.to_string(),
                payload_type,
            },
            producer,
            invoker: Arc::clone(invoker),
        };
        info!(
            handler = %binding.handler_method,
            consumes = %binding.consumer.topic,
            produces = %binding.producer.topic,
            payload = binding.consumer.payload_type.map(|ty| ty.name()).unwrap_or("-"),
            "event controller method"
        );
        routes.controllers.push(binding);
    }
    Ok(())
}

fn scan_publisher(
    component: &ComponentMetadata,
    routes: &mut RoutingTable,
) -> Result<(), ScanError> {
    let owner = component.component();

    for method in component.methods() {
        let Some(topic) = method.produced_topic() else {
            continue;
        };
        require_topic(component, method, topic)?;

        let binding = PublisherBinding {
            owner_type: owner,
            emit_method: MethodRef {
                owner,
                name: method.name(),
            },
            topic: topic.to_string(),
            interceptor: component.interceptor_fn().cloned(),
        };
        info!(
            method = %binding.emit_method,
            produces = %binding.topic,
            "event publisher method"
        );
        routes.publishers.push(binding);
    }
    Ok(())
}

fn require_topic(
    component: &ComponentMetadata,
    method: &MethodMetadata,
    topic: &str,
) -> Result<(), ScanError> {
    if topic.is_empty() {
        return Err(ScanError::EmptyTopic {
            component: component.component(),
            method: method.name(),
        });
    }
    Ok(())
}
