use aurelia_core::{CompositionError, ContainerError, PluginError, ResourceError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// Raised by the plugin pipeline; carried through unchanged.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("You must configure Aurelia with a BindingLanguage implementation.")]
    MissingBindingLanguage,

    #[error(transparent)]
    ResourceImport(#[from] ResourceError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// A capability the bootstrapper needs could not be resolved.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl BootstrapError {
    /// Short name of the failing stage, used in log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Plugin(_) => "plugins",
            Self::MissingBindingLanguage => "binding_language",
            Self::ResourceImport(_) => "resources",
            Self::Composition(_) => "composition",
            Self::Container(_) => "container",
        }
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
