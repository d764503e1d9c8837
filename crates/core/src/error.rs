use thiserror::Error;

use crate::container::CapabilityKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("No handler registered for {0}")]
    NoHandler(CapabilityKey),

    #[error("Handler for {key} does not provide a {expected}")]
    TypeMismatch {
        key: CapabilityKey,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Failed to load module {module_id}: {reason}")]
    Failed { module_id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("Failed to load plugin {module_id}: {source}")]
    Load {
        module_id: String,
        #[source]
        source: LoadError,
    },

    #[error("Plugin {module_id} failed to configure: {reason}")]
    Configure { module_id: String, reason: String },

    #[error("Plugin pipeline failed: {0}")]
    Pipeline(String),
}

impl PluginError {
    /// Create a configure failure for the given plugin.
    pub fn configure(module_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configure {
            module_id: module_id.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("Failed to import resources {module_ids:?}: {reason}")]
    Import {
        module_ids: Vec<String>,
        reason: String,
    },

    #[error("Resource manifest not found: {0}")]
    ManifestNotFound(String),
}

impl ResourceError {
    /// Create an import failure for a batch of module ids.
    pub fn import(module_ids: &[String], reason: impl Into<String>) -> Self {
        Self::Import {
            module_ids: module_ids.to_vec(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("Composition failed: {0}")]
    Failed(String),

    #[error("View model could not be created: {0}")]
    ViewModel(String),

    #[error(transparent)]
    Container(#[from] ContainerError),
}
