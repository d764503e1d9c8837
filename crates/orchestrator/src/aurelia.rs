//! The application bootstrapper.
//!
//! [`Aurelia`] owns the plugin pipeline and the queue of resources to load,
//! and drives the startup sequence:
//!
//! 1. run the plugin pipeline
//! 2. require a binding language in the container
//! 3. import and register queued resources, in the order they were queued
//! 4. mark the application started and announce it on the event bus
//!
//! [`Aurelia::set_root`] then composes a root view model into a host element.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use aurelia_core::{
    keys, CapabilityKey, CompositionEngine, Container, ContainerExt, DependencyContainer, Document,
    Element, Instance, MemoryDocument, NamedResourceRegistry, Provider, ResourceCoordinator,
    ResourceRegistry,
};
use events::{Event, EventBus};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::loader::{create_default_loader, ModuleLoader};
use crate::plugins::{PluginPipeline, Plugins};
use crate::resource_loader::{load_resources, ResourceRequest};
use crate::root::{build_instruction, resolve_host, HostRef};

struct State {
    started: bool,
    host: Option<Element>,
    root: Option<Instance>,
    plugins: Arc<Plugins>,
    pipeline: Arc<dyn PluginPipeline>,
    resources_to_load: VecDeque<ResourceRequest>,
    current_plugin_id: Option<String>,
}

struct Shared {
    loader: Arc<dyn ModuleLoader>,
    container: Arc<dyn DependencyContainer>,
    resources: Arc<dyn ResourceRegistry>,
    document: Arc<dyn Document>,
    events: EventBus,
    config: BootstrapConfig,
    state: RwLock<State>,
    /// Held for the whole startup sequence.
    startup: Mutex<()>,
}

/// Handle to the bootstrapper. Clones share the same state.
#[derive(Clone)]
pub struct Aurelia {
    shared: Arc<Shared>,
}

/// Non-owning handle, registered in the container under [`keys::AURELIA`].
#[derive(Clone)]
pub struct AureliaRef(Weak<Shared>);

impl AureliaRef {
    pub fn upgrade(&self) -> Option<Aurelia> {
        self.0.upgrade().map(|shared| Aurelia { shared })
    }
}

impl fmt::Debug for AureliaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AureliaRef(..)")
    }
}

/// Collects collaborators for an [`Aurelia`]; anything left unset gets a default.
#[derive(Default)]
pub struct AureliaBuilder {
    loader: Option<Arc<dyn ModuleLoader>>,
    container: Option<Arc<dyn DependencyContainer>>,
    resources: Option<Arc<dyn ResourceRegistry>>,
    document: Option<Arc<dyn Document>>,
    event_bus: Option<EventBus>,
    config: Option<BootstrapConfig>,
}

impl AureliaBuilder {
    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_container(mut self, container: Arc<dyn DependencyContainer>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceRegistry>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_config(mut self, config: BootstrapConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Aurelia {
        let config = self.config.unwrap_or_default();
        let events = match (self.event_bus, config.event_capacity) {
            (Some(bus), _) => bus,
            (None, Some(capacity)) => EventBus::with_capacity(capacity),
            (None, None) => EventBus::global().clone(),
        };

        let loader: Arc<dyn ModuleLoader> = match self.loader {
            Some(loader) => loader,
            None => create_default_loader(),
        };
        let container: Arc<dyn DependencyContainer> = match self.container {
            Some(container) => container,
            None => Arc::new(Container::new()),
        };
        let resources: Arc<dyn ResourceRegistry> = match self.resources {
            Some(resources) => resources,
            None => Arc::new(NamedResourceRegistry::new()),
        };
        let document: Arc<dyn Document> = match self.document {
            Some(document) => document,
            None => Arc::new(MemoryDocument::new()),
        };

        let plugins = Arc::new(Plugins::new());
        let aurelia = Aurelia {
            shared: Arc::new(Shared {
                loader,
                container,
                resources,
                document,
                events,
                config,
                state: RwLock::new(State {
                    started: false,
                    host: None,
                    root: None,
                    pipeline: plugins.clone(),
                    plugins,
                    resources_to_load: VecDeque::new(),
                    current_plugin_id: None,
                }),
                startup: Mutex::new(()),
            }),
        };

        let shared = &aurelia.shared;
        shared
            .container
            .register_instance(keys::AURELIA, Instance::new(aurelia.downgrade()));
        shared
            .container
            .register_instance(keys::LOADER, Instance::new(Arc::clone(&shared.loader)));
        shared.container.register_instance(
            keys::RESOURCE_REGISTRY,
            Instance::new(Arc::clone(&shared.resources)),
        );

        aurelia
    }
}

impl Aurelia {
    /// Create a bootstrapper with default collaborators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AureliaBuilder {
        AureliaBuilder::default()
    }

    /// Create a bootstrapper from optional collaborators, defaulting the rest.
    pub fn with_collaborators(
        loader: Option<Arc<dyn ModuleLoader>>,
        container: Option<Arc<dyn DependencyContainer>>,
        resources: Option<Arc<dyn ResourceRegistry>>,
    ) -> Self {
        let mut builder = Self::builder();
        builder.loader = loader;
        builder.container = container;
        builder.resources = resources;
        builder.build()
    }

    /// The bootstrapper that claimed `host` in [`Aurelia::set_root`], if it is
    /// still alive.
    pub fn from_host(host: &Element) -> Option<Aurelia> {
        host.owner()?
            .downcast_arc::<Shared>()
            .map(|shared| Aurelia { shared })
    }

    pub fn downgrade(&self) -> AureliaRef {
        AureliaRef(Arc::downgrade(&self.shared))
    }

    pub fn ptr_eq(&self, other: &Aurelia) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn loader(&self) -> Arc<dyn ModuleLoader> {
        Arc::clone(&self.shared.loader)
    }

    pub fn container(&self) -> Arc<dyn DependencyContainer> {
        Arc::clone(&self.shared.container)
    }

    pub fn resources(&self) -> Arc<dyn ResourceRegistry> {
        Arc::clone(&self.shared.resources)
    }

    pub fn document(&self) -> Arc<dyn Document> {
        Arc::clone(&self.shared.document)
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.shared.config
    }

    pub fn is_started(&self) -> bool {
        self.state().started
    }

    pub fn host(&self) -> Option<Element> {
        self.state().host.clone()
    }

    /// View model returned by the last successful composition.
    pub fn root(&self) -> Option<Instance> {
        self.state().root.clone()
    }

    /// The built-in pipeline. Plugins registered here run on [`Aurelia::start`]
    /// unless [`Aurelia::use_pipeline`] swapped in another one.
    pub fn plugins(&self) -> Arc<Plugins> {
        Arc::clone(&self.state().plugins)
    }

    /// Pipeline run by [`Aurelia::start`].
    pub fn pipeline(&self) -> Arc<dyn PluginPipeline> {
        Arc::clone(&self.state().pipeline)
    }

    /// Replace the plugin pipeline run by [`Aurelia::start`].
    pub fn use_pipeline(&self, pipeline: Arc<dyn PluginPipeline>) -> &Self {
        self.state_mut().pipeline = pipeline;
        self
    }

    /// Resource requests waiting for the next [`Aurelia::start`].
    pub fn pending_resources(&self) -> Vec<ResourceRequest> {
        self.state().resources_to_load.iter().cloned().collect()
    }

    pub fn current_plugin_id(&self) -> Option<String> {
        self.state().current_plugin_id.clone()
    }

    /// Attribute resources declared from now on to `plugin_id`. Pipelines set
    /// this while a plugin is configuring and clear it afterwards.
    pub fn set_current_plugin_id(&self, plugin_id: Option<String>) {
        self.state_mut().current_plugin_id = plugin_id;
    }

    pub fn with_instance(&self, key: CapabilityKey, instance: Instance) -> &Self {
        self.shared.container.register_instance(key, instance);
        self
    }

    pub fn with_singleton(&self, key: CapabilityKey, provider: impl Into<Provider>) -> &Self {
        self.shared.container.register_singleton(key, provider.into());
        self
    }

    /// Queue one resource request for the given module ids.
    pub fn with_resources<I, S>(&self, module_ids: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request = ResourceRequest::new(module_ids);
        let mut state = self.state_mut();
        request.resource_manifest_url = state.current_plugin_id.clone();
        state.resources_to_load.push_back(request);
        self
    }

    /// Run the startup sequence. Does nothing once startup has succeeded.
    ///
    /// Overlapping calls run one after another; a call that waited for a
    /// successful one returns without doing anything.
    pub async fn start(&self) -> Result<Aurelia> {
        let _startup = self.shared.startup.lock().await;
        if self.is_started() {
            debug!("Aurelia already started");
            return Ok(self.clone());
        }

        info!("Aurelia starting");

        let pipeline = self.pipeline();
        if let Err(e) = pipeline.process(self).await {
            debug!(error = %e, "Plugin pipeline failed");
            return Err(e.into());
        }

        if !self.shared.container.has_handler(keys::BINDING_LANGUAGE) {
            let error = BootstrapError::MissingBindingLanguage;
            error!("{}", error);
            return Err(error);
        }

        let coordinator = self
            .shared
            .container
            .resolve::<Arc<dyn ResourceCoordinator>>(keys::RESOURCE_COORDINATOR)?;

        let mut queue = std::mem::take(&mut self.state_mut().resources_to_load);
        let loaded = load_resources(coordinator.as_ref(), &mut queue, &self.shared.resources).await;
        let registered = match loaded {
            Ok(count) => count,
            Err(e) => {
                self.requeue(queue);
                debug!(error = %e, "Resource import failed");
                return Err(e.into());
            }
        };

        self.state_mut().started = true;
        info!(resources = registered, "Aurelia started");
        self.shared.events.emit(Event::Started);

        Ok(self.clone())
    }

    /// Compose `view_model` into the host. `host` defaults to the configured
    /// host id; an id with no matching element resolves to the document body.
    pub async fn set_root(&self, view_model: Instance, host: Option<HostRef>) -> Result<Aurelia> {
        let host = resolve_host(
            self.shared.document.as_ref(),
            host,
            &self.shared.config.default_host_id,
        );

        self.state_mut().host = Some(host.clone());
        host.set_owner(&Instance::from_arc(Arc::clone(&self.shared)));
        self.shared
            .container
            .register_instance(keys::ELEMENT, Instance::new(host.clone()));

        let engine = self
            .shared
            .container
            .resolve::<Arc<dyn CompositionEngine>>(keys::COMPOSITION_ENGINE)?;

        let instruction = build_instruction(view_model, &self.shared.container, host.clone());
        let view_slot = instruction.view_slot.clone();

        let root = engine.compose(instruction).await.map_err(|e| {
            debug!(error = %e, "Root composition failed");
            BootstrapError::from(e)
        })?;

        view_slot.attached();
        self.state_mut().root = Some(root);
        info!(host = ?host, "Root composed");
        self.shared.events.emit(Event::Composed);

        Ok(self.clone())
    }

    pub(crate) fn pending_resource_count(&self) -> usize {
        self.state().resources_to_load.len()
    }

    /// Drop requests queued after the first `len`.
    pub(crate) fn discard_resources_from(&self, len: usize) {
        self.state_mut().resources_to_load.truncate(len);
    }

    /// Put requests that were not loaded back at the front of the queue.
    fn requeue(&self, mut unloaded: VecDeque<ResourceRequest>) {
        let mut state = self.state_mut();
        unloaded.append(&mut state.resources_to_load);
        state.resources_to_load = unloaded;
    }

    fn state(&self) -> RwLockReadGuard<'_, State> {
        self.shared.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.shared.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Aurelia {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Aurelia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Aurelia")
            .field("started", &state.started)
            .field("host", &state.host)
            .field("resources_to_load", &state.resources_to_load.len())
            .field("current_plugin_id", &state.current_plugin_id)
            .finish_non_exhaustive()
    }
}
