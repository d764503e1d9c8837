//! Capability registry used by the bootstrapper and its collaborators.
//!
//! Values are registered under a [`CapabilityKey`] and handed out as
//! type-erased [`Instance`]s. The container does not know about lifetimes
//! beyond "a value" and "a lazily created singleton"; child scopes belong to
//! the composition engine.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, Weak};

use tracing::debug;

use crate::error::ContainerError;

/// Stable key a capability is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityKey(&'static str);

impl CapabilityKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Key a capability by its Rust type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(type_name::<T>())
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Keys of the capabilities the bootstrapper itself reads or writes.
pub mod keys {
    use super::CapabilityKey;

    pub const AURELIA: CapabilityKey = CapabilityKey::new("Aurelia");
    pub const LOADER: CapabilityKey = CapabilityKey::new("Loader");
    pub const RESOURCE_REGISTRY: CapabilityKey = CapabilityKey::new("ResourceRegistry");
    pub const BINDING_LANGUAGE: CapabilityKey = CapabilityKey::new("BindingLanguage");
    pub const RESOURCE_COORDINATOR: CapabilityKey = CapabilityKey::new("ResourceCoordinator");
    pub const COMPOSITION_ENGINE: CapabilityKey = CapabilityKey::new("CompositionEngine");
    pub const ELEMENT: CapabilityKey = CapabilityKey::new("Element");
}

/// A shared, type-erased value.
///
/// Trait objects are stored by wrapping their `Arc`, e.g.
/// `Instance::new(engine as Arc<dyn CompositionEngine>)`, and read back with
/// `downcast::<Arc<dyn CompositionEngine>>()`.
#[derive(Clone)]
pub struct Instance(Arc<dyn Any + Send + Sync>);

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an existing allocation without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.0).is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Recover the original `Arc` when the instance was built with [`Instance::from_arc`].
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast::<T>().ok()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Arc::downgrade(&self.0))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Non-owning counterpart of [`Instance`].
#[derive(Clone)]
pub struct WeakInstance(Weak<dyn Any + Send + Sync>);

impl WeakInstance {
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakInstance(..)")
    }
}

pub type Factory = Arc<dyn Fn(&dyn DependencyContainer) -> Instance + Send + Sync>;

/// What a singleton registration resolves to.
#[derive(Clone)]
pub enum Provider {
    Value(Instance),
    /// Invoked at most once, on first resolution.
    Factory(Factory),
}

impl Provider {
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&dyn DependencyContainer) -> Instance + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }
}

impl From<Instance> for Provider {
    fn from(instance: Instance) -> Self {
        Self::Value(instance)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Value(instance) => f.debug_tuple("Value").field(instance).finish(),
            Provider::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Dependency container surface consumed by the bootstrapper.
pub trait DependencyContainer: Send + Sync {
    /// Register a value; replaces any earlier registration under `key`.
    fn register_instance(&self, key: CapabilityKey, instance: Instance);

    /// Register a singleton; replaces any earlier registration under `key`.
    fn register_singleton(&self, key: CapabilityKey, provider: Provider);

    fn has_handler(&self, key: CapabilityKey) -> bool;

    fn get(&self, key: CapabilityKey) -> Result<Instance, ContainerError>;
}

/// Typed lookups on top of [`DependencyContainer::get`].
pub trait ContainerExt: DependencyContainer {
    fn resolve<T: Any + Clone>(&self, key: CapabilityKey) -> Result<T, ContainerError> {
        self.get(key)?
            .downcast::<T>()
            .ok_or(ContainerError::TypeMismatch {
                key,
                expected: type_name::<T>(),
            })
    }
}

impl<C: DependencyContainer + ?Sized> ContainerExt for C {}

enum Handler {
    Instance(Instance),
    Singleton {
        factory: Factory,
        cached: Arc<OnceLock<Instance>>,
    },
}

/// Default in-memory container.
#[derive(Default)]
pub struct Container {
    handlers: RwLock<HashMap<CapabilityKey, Handler>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, key: CapabilityKey, handler: Handler) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        if handlers.insert(key, handler).is_some() {
            debug!(key = %key, "Replaced existing registration");
        }
    }
}

impl DependencyContainer for Container {
    fn register_instance(&self, key: CapabilityKey, instance: Instance) {
        self.insert(key, Handler::Instance(instance));
    }

    fn register_singleton(&self, key: CapabilityKey, provider: Provider) {
        let handler = match provider {
            Provider::Value(instance) => Handler::Instance(instance),
            Provider::Factory(factory) => Handler::Singleton {
                factory,
                cached: Arc::new(OnceLock::new()),
            },
        };
        self.insert(key, handler);
    }

    fn has_handler(&self, key: CapabilityKey) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&key)
    }

    fn get(&self, key: CapabilityKey) -> Result<Instance, ContainerError> {
        // The factory runs without the lock held so it may resolve its own
        // dependencies from this container.
        let (factory, cached) = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            match handlers.get(&key) {
                None => return Err(ContainerError::NoHandler(key)),
                Some(Handler::Instance(instance)) => return Ok(instance.clone()),
                Some(Handler::Singleton { factory, cached }) => {
                    (Arc::clone(factory), Arc::clone(cached))
                }
            }
        };

        if let Some(instance) = cached.get() {
            return Ok(instance.clone());
        }

        let created = factory(self);
        Ok(cached.get_or_init(|| created).clone())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = handlers.keys().collect();
        keys.sort();
        f.debug_struct("Container").field("keys", &keys).finish()
    }
}
