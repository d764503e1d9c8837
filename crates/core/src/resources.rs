//! View resources and the collaborators that import and hold them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::container::Instance;
use crate::error::ResourceError;

/// Target resources install themselves into.
pub trait ResourceRegistry: Send + Sync {
    /// Register `resource` under `name`. A later registration under the same
    /// name replaces the earlier one.
    fn register_resource(&self, name: &str, resource: Instance);

    fn lookup(&self, name: &str) -> Option<Instance>;

    /// Registered names, sorted.
    fn names(&self) -> Vec<String>;
}

/// A loaded unit of template or behavior registration.
pub trait Resource: Send + Sync {
    fn register(&self, registry: &Arc<dyn ResourceRegistry>);
}

/// Turns module ids into loaded resources.
#[async_trait]
pub trait ResourceCoordinator: Send + Sync {
    /// Import every module in `module_ids`, returning the resources in
    /// declaration order. `manifest_url` identifies the plugin that declared
    /// the batch, if any.
    async fn import_resources(
        &self,
        module_ids: &[String],
        manifest_url: Option<&str>,
    ) -> Result<Vec<Arc<dyn Resource>>, ResourceError>;
}

/// Default registry keyed by resource name.
#[derive(Default)]
pub struct NamedResourceRegistry {
    entries: RwLock<HashMap<String, Instance>>,
}

impl NamedResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceRegistry for NamedResourceRegistry {
    fn register_resource(&self, name: &str, resource: Instance) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.insert(name.to_string(), resource).is_some() {
            debug!(name = %name, "Resource replaced by later registration");
        }
    }

    fn lookup(&self, name: &str) -> Option<Instance> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for NamedResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedResourceRegistry")
            .field("names", &self.names())
            .finish()
    }
}
