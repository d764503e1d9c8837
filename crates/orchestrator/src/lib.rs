pub mod aurelia;
pub mod config;
pub mod error;
pub mod loader;
pub mod plugins;
pub mod resource_loader;
pub mod root;

pub use aurelia::{Aurelia, AureliaBuilder, AureliaRef};
pub use config::{BootstrapConfig, DEFAULT_HOST_ID};
pub use error::{BootstrapError, Result};
pub use loader::{create_default_loader, ModuleLoader, ModuleMap, Plugin};
pub use plugins::{PluginDescriptor, PluginPipeline, Plugins};
pub use resource_loader::{load_resources, ResourceRequest};
pub use root::{build_instruction, resolve_host, HostRef};
