use tracing::info;

use crate::binder::BindError;
use crate::client::EventClient;
use crate::metadata::{PublisherBinding, RoutingTable};
use crate::resolver::{Container, Instance, Resolver};

/// Builds intercepting proxies for publisher bindings.
#[derive(Debug, Clone)]
pub struct ProducerInterceptor {
    client: EventClient,
}

impl ProducerInterceptor {
    pub fn new(client: EventClient) -> Self {
        Self { client }
    }

    /// Wrap `raw` in the proxy for `binding`'s owner type.
    ///
    /// Fails with [`BindError::NonInterceptable`] when the owner type
    /// registered no interceptor.
    pub fn wrap(&self, binding: &PublisherBinding, raw: &Instance) -> Result<Instance, BindError> {
        let interceptor = binding
            .interceptor
            .as_ref()
            .ok_or(BindError::NonInterceptable {
                component: binding.owner_type,
            })?;
        interceptor(raw, &self.client).ok_or(BindError::InterceptorMismatch {
            component: binding.owner_type,
        })
    }

    /// Derive a container in which every publisher type resolves to its
    /// proxy. `container` itself is left untouched.
    ///
    /// Raw instances are resolved from `container`, once per publisher type.
    pub fn wrap_all(&self, routes: &RoutingTable, container: &Container) -> Result<Container, BindError> {
        let mut proxied = container.clone();

        for owner in routes.publisher_types() {
            let Some(binding) = routes.publishers.iter().find(|b| b.owner_type == owner) else {
                continue;
            };
            let raw = container.resolve_instance(&owner)?;
            let proxy = self.wrap(binding, &raw)?;
            proxied.rebind(owner, proxy);

            let topics: Vec<&str> = routes
                .publishers
                .iter()
                .filter(|b| b.owner_type == owner)
                .map(|b| b.topic.as_str())
                .collect();
            info!(publisher = %owner, topics = ?topics, "publisher intercepted");
        }

        Ok(proxied)
    }
}
