//! Module loading for plugins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use aurelia_core::{LoadError, PluginError};
use serde_json::Value;

use crate::aurelia::Aurelia;

/// An extension unit installed during startup.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Install the plugin. Registrations made through `aurelia` while this
    /// runs are attributed to the plugin.
    async fn configure(&self, aurelia: &Aurelia, config: Option<&Value>) -> Result<(), PluginError>;
}

/// Resolves module ids to loaded plugins.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    fn name(&self) -> &str;

    async fn load_plugin(&self, module_id: &str) -> Result<Arc<dyn Plugin>, LoadError>;
}

/// Loader backed by an in-memory table of defined modules.
#[derive(Default)]
pub struct ModuleMap {
    modules: RwLock<HashMap<String, Arc<dyn Plugin>>>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) the plugin exported by `module_id`.
    pub fn define(&self, module_id: impl Into<String>, plugin: Arc<dyn Plugin>) -> &Self {
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(module_id.into(), plugin);
        self
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(module_id)
    }
}

#[async_trait]
impl ModuleLoader for ModuleMap {
    fn name(&self) -> &str {
        "module-map"
    }

    async fn load_plugin(&self, module_id: &str) -> Result<Arc<dyn Plugin>, LoadError> {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(module_id)
            .cloned()
            .ok_or_else(|| LoadError::ModuleNotFound(module_id.to_string()))
    }
}

impl fmt::Debug for ModuleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<_> = modules.keys().collect();
        ids.sort();
        f.debug_struct("ModuleMap").field("modules", &ids).finish()
    }
}

/// The loader used when none is supplied.
pub fn create_default_loader() -> Arc<dyn ModuleLoader> {
    Arc::new(ModuleMap::new())
}
