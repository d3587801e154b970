//! Explicit dependency container with single-instance-per-type semantics.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::error::ResolveError;
use super::instance::Instance;
use super::Resolver;
use crate::metadata::TypeKey;

type Factory = Arc<dyn Fn(&Container) -> Result<Instance, ResolveError> + Send + Sync>;

enum Binding {
    Instance(Instance),
    Singleton {
        factory: Factory,
        cell: OnceLock<Instance>,
    },
}

/// Maps types to their shared instances.
///
/// Cloning a container shares its bindings, including singletons that have
/// not been built yet. [`rebind`](Self::rebind) on a clone replaces a
/// binding in that clone only, which is how the interceptor hands out
/// proxies without touching the original container.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use smooth_events::Container;
///
/// struct Config { name: String }
/// struct Service { config: Arc<Config> }
///
/// let mut container = Container::new();
/// container.bind(Arc::new(Config { name: "orders".into() }));
/// container.singleton(|c| Ok(Arc::new(Service { config: c.resolve::<Config>()? })));
///
/// let first = container.resolve::<Service>().unwrap();
/// let second = container.resolve::<Service>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.config.name, "orders");
/// ```
#[derive(Clone, Default)]
pub struct Container {
    bindings: HashMap<TypeKey, Arc<Binding>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an existing instance.
    pub fn bind<T: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<T>) -> &mut Self {
        self.bind_instance(TypeKey::of::<T>(), Instance::new(instance))
    }

    /// Bind a type-erased instance under `ty`.
    pub fn bind_instance(&mut self, ty: TypeKey, instance: Instance) -> &mut Self {
        self.bindings.insert(ty, Arc::new(Binding::Instance(instance)));
        self
    }

    /// Bind a lazily built singleton.
    ///
    /// The factory runs on first resolution, against the container that
    /// resolves it. Every caller then receives the same instance.
    pub fn singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.singleton_instance(TypeKey::of::<T>(), move |container: &Container| {
            factory(container).map(Instance::new)
        })
    }

    /// Bind a lazily built, type-erased singleton under `ty`.
    pub fn singleton_instance<F>(&mut self, ty: TypeKey, factory: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    {
        self.bindings.insert(
            ty,
            Arc::new(Binding::Singleton {
                factory: Arc::new(factory),
                cell: OnceLock::new(),
            }),
        );
        self
    }

    /// Replace the binding for `ty` in this container only.
    pub fn rebind(&mut self, ty: TypeKey, instance: Instance) -> &mut Self {
        self.bind_instance(ty, instance)
    }

    pub fn contains(&self, ty: &TypeKey) -> bool {
        self.bindings.contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolve the shared instance of `T`.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let ty = TypeKey::of::<T>();
        self.resolve_instance(&ty)?
            .downcast::<T>()
            .ok_or(ResolveError::TypeMismatch { requested: ty })
    }
}

impl Resolver for Container {
    fn resolve_instance(&self, ty: &TypeKey) -> Result<Instance, ResolveError> {
        let binding = self.bindings.get(ty).ok_or(ResolveError::NotBound(*ty))?;
        match binding.as_ref() {
            Binding::Instance(instance) => Ok(instance.clone()),
            Binding::Singleton { factory, cell } => {
                if let Some(instance) = cell.get() {
                    return Ok(instance.clone());
                }
                let built = factory(self).map_err(|err| match err {
                    ResolveError::Factory { .. } => err,
                    other => ResolveError::Factory {
                        ty: *ty,
                        message: other.to_string(),
                    },
                })?;
                // A concurrent first resolution may have won; hand out its instance.
                Ok(cell.get_or_init(|| built).clone())
            }
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bindings.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    struct Loud;

    impl Greeter for Loud {
        fn greet(&self) -> String {
            "HELLO".into()
        }
    }

    #[test]
    fn resolves_bound_trait_objects() {
        let mut container = Container::new();
        container.bind::<dyn Greeter>(Arc::new(English));

        let greeter = container.resolve::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn unbound_type_is_an_error() {
        let container = Container::new();
        let err = container.resolve::<dyn Greeter>().err().unwrap();
        assert_eq!(err, ResolveError::NotBound(TypeKey::of::<dyn Greeter>()));
    }

    #[test]
    fn singleton_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut container = Container::new();
        container.singleton(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(String::from("built")))
        });

        let a = container.resolve::<String>().unwrap();
        let b = container.clone().resolve::<String>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rebind_only_affects_the_clone() {
        let mut original = Container::new();
        original.bind::<dyn Greeter>(Arc::new(English));

        let mut proxied = original.clone();
        proxied.rebind(
            TypeKey::of::<dyn Greeter>(),
            Instance::new::<dyn Greeter>(Arc::new(Loud)),
        );

        assert_eq!(original.resolve::<dyn Greeter>().unwrap().greet(), "hello");
        assert_eq!(proxied.resolve::<dyn Greeter>().unwrap().greet(), "HELLO");
    }

    #[test]
    fn singletons_see_the_resolving_container() {
        struct Holder(Arc<dyn Greeter>);

        let mut original = Container::new();
        original.bind::<dyn Greeter>(Arc::new(English));
        original.singleton(|c| Ok(Arc::new(Holder(c.resolve::<dyn Greeter>()?))));

        let mut proxied = original.clone();
        proxied.rebind(
            TypeKey::of::<dyn Greeter>(),
            Instance::new::<dyn Greeter>(Arc::new(Loud)),
        );

        let holder = proxied.resolve::<Holder>().unwrap();
        assert_eq!(holder.0.greet(), "HELLO");
    }

    #[test]
    fn failing_factory_reports_the_type() {
        let mut container = Container::new();
        container.singleton::<String, _>(|c| {
            c.resolve::<dyn Greeter>()?;
            Ok(Arc::new(String::new()))
        });

        let err = container.resolve::<String>().unwrap_err();
        assert!(matches!(err, ResolveError::Factory { ty, .. } if ty == TypeKey::of::<String>()));
    }
}
