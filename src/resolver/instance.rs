use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased component instance.
///
/// Wraps an `Arc<T>` for any `T`, including trait objects, so proxies for
/// publisher traits and plain controller structs travel the same way.
#[derive(Clone)]
pub struct Instance(Arc<dyn Any + Send + Sync>);

impl Instance {
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Instance(Arc::new(value))
    }

    /// Recover the typed handle, if this instance holds a `T`.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.0.downcast_ref::<Arc<T>>().cloned()
    }

    pub fn downcast_ref<T: ?Sized + Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<Arc<T>>().map(|value| value.as_ref())
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Instance(..)")
    }
}
