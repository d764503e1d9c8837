//! Collaborator contracts for the application bootstrapper.
//!
//! The bootstrapper in the `orchestrator` crate only sequences calls; the
//! capability container, resource registry, resource coordinator, host
//! document and composition engine it talks to are defined here, together
//! with simple in-memory defaults.

pub mod composition;
pub mod container;
pub mod dom;
pub mod error;
pub mod resources;

pub use composition::{AnchorPolicy, CompositionEngine, CompositionInstruction, ViewSlot};
pub use container::{
    keys, CapabilityKey, Container, ContainerExt, DependencyContainer, Factory, Instance, Provider,
    WeakInstance,
};
pub use dom::{Document, Element, MemoryDocument};
pub use error::{CompositionError, ContainerError, LoadError, PluginError, ResourceError};
pub use resources::{NamedResourceRegistry, Resource, ResourceCoordinator, ResourceRegistry};
