//! Plugin pipeline run at the start of the bootstrap sequence.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;
use aurelia_core::PluginError;
use serde_json::Value;
use tracing::debug;

use crate::aurelia::Aurelia;
use crate::loader::ModuleLoader;

const BINDING_LANGUAGE_MODULE: &str = "aurelia-templating-binding";
const DEFAULT_RESOURCES_MODULE: &str = "aurelia-templating-resources";

/// The pipeline `Aurelia::start` runs before anything else.
#[async_trait]
pub trait PluginPipeline: Send + Sync {
    /// Run every pending plugin, in registration order, stopping at the first
    /// failure.
    async fn process(&self, aurelia: &Aurelia) -> Result<(), PluginError>;
}

/// A plugin registration: which module to load and what to configure it with.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub module_id: String,
    pub config: Option<Value>,
}

impl PluginDescriptor {
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            config: None,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }
}

/// Default pipeline: loads each registered module through the orchestrator's
/// loader and configures it.
#[derive(Default)]
pub struct Plugins {
    pending: Mutex<VecDeque<PluginDescriptor>>,
    /// Held while `process` runs.
    running: AsyncMutex<()>,
}

impl Plugins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plugin(&self, module_id: impl Into<String>, config: Option<Value>) -> &Self {
        let descriptor = PluginDescriptor {
            module_id: module_id.into(),
            config,
        };
        self.add(descriptor)
    }

    pub fn add(&self, descriptor: PluginDescriptor) -> &Self {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(descriptor);
        self
    }

    pub fn default_binding_language(&self) -> &Self {
        self.plugin(BINDING_LANGUAGE_MODULE, None)
    }

    pub fn default_resources(&self) -> &Self {
        self.plugin(DEFAULT_RESOURCES_MODULE, None)
    }

    pub fn standard_configuration(&self) -> &Self {
        self.default_binding_language().default_resources()
    }

    /// Plugins not yet configured, in the order they will run.
    pub fn pending(&self) -> Vec<PluginDescriptor> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_processed(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    fn front(&self) -> Option<PluginDescriptor> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .front()
            .cloned()
    }

    fn pop_front(&self) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
    }
}

async fn install(
    loader: &dyn ModuleLoader,
    aurelia: &Aurelia,
    descriptor: &PluginDescriptor,
) -> Result<(), PluginError> {
    let plugin = loader
        .load_plugin(&descriptor.module_id)
        .await
        .map_err(|source| PluginError::Load {
            module_id: descriptor.module_id.clone(),
            source,
        })?;
    plugin.configure(aurelia, descriptor.config.as_ref()).await
}

#[async_trait]
impl PluginPipeline for Plugins {
    async fn process(&self, aurelia: &Aurelia) -> Result<(), PluginError> {
        let _running = self.running.lock().await;
        let loader = aurelia.loader();

        // A descriptor leaves the queue only once configured, so a retry
        // resumes at the plugin that failed.
        while let Some(descriptor) = self.front() {
            debug!(module_id = %descriptor.module_id, "Configuring plugin");

            let queued = aurelia.pending_resource_count();
            aurelia.set_current_plugin_id(Some(descriptor.module_id.clone()));
            let result = install(loader.as_ref(), aurelia, &descriptor).await;
            aurelia.set_current_plugin_id(None);

            if let Err(e) = result {
                // The retry declares these resources again
                aurelia.discard_resources_from(queued);
                return Err(e);
            }
            self.pop_front();
        }

        Ok(())
    }
}

impl fmt::Debug for Plugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugins")
            .field("pending", &self.pending())
            .finish()
    }
}
