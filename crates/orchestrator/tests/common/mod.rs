#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aurelia_core::{
    keys, CapabilityKey, CompositionEngine, CompositionError, CompositionInstruction, Container,
    ContainerError, DependencyContainer, Document, Element, Instance, MemoryDocument,
    PluginError, Provider, Resource, ResourceCoordinator, ResourceError, ResourceRegistry,
};
use orchestrator::{Aurelia, PluginPipeline};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Formatted output of a scoped subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture WARN and above on this thread until the guard drops.
pub fn capture_warnings() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Container that records every call before delegating to a real one.
#[derive(Default)]
pub struct RecordingContainer {
    inner: Container,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingContainer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, method: &str, key: CapabilityKey) {
        self.calls.lock().unwrap().push(format!("{method}:{key}"));
    }
}

impl DependencyContainer for RecordingContainer {
    fn register_instance(&self, key: CapabilityKey, instance: Instance) {
        self.record("register_instance", key);
        self.inner.register_instance(key, instance);
    }

    fn register_singleton(&self, key: CapabilityKey, provider: Provider) {
        self.record("register_singleton", key);
        self.inner.register_singleton(key, provider);
    }

    fn has_handler(&self, key: CapabilityKey) -> bool {
        self.record("has_handler", key);
        self.inner.has_handler(key)
    }

    fn get(&self, key: CapabilityKey) -> Result<Instance, ContainerError> {
        self.record("get", key);
        self.inner.get(key)
    }
}

/// Pipeline that counts runs and can be told to fail the next one.
#[derive(Default)]
pub struct CountingPipeline {
    pub calls: AtomicUsize,
    pub next_failure: Mutex<Option<PluginError>>,
}

impl CountingPipeline {
    pub fn failing_once(error: PluginError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            next_failure: Mutex::new(Some(error)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginPipeline for CountingPipeline {
    async fn process(&self, _aurelia: &Aurelia) -> Result<(), PluginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_failure.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Resource that logs its registration and installs itself under its name.
pub struct LoggedResource {
    pub name: String,
    pub log: Log,
}

impl Resource for LoggedResource {
    fn register(&self, registry: &Arc<dyn ResourceRegistry>) {
        self.log
            .lock()
            .unwrap()
            .push(format!("register:{}", self.name));
        registry.register_resource(&self.name, Instance::new(self.name.clone()));
    }
}

/// Coordinator producing one `LoggedResource` per module id. Module ids in
/// `fail_once` fail the first time they are imported.
pub struct RecordingCoordinator {
    pub log: Log,
    pub imports: Mutex<Vec<(Vec<String>, Option<String>)>>,
    pub fail_once: Mutex<HashSet<String>>,
}

impl RecordingCoordinator {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            imports: Mutex::new(Vec::new()),
            fail_once: Mutex::new(HashSet::new()),
        }
    }

    pub fn failing_once(self, module_id: &str) -> Self {
        self.fail_once.lock().unwrap().insert(module_id.to_string());
        self
    }

    pub fn imports(&self) -> Vec<(Vec<String>, Option<String>)> {
        self.imports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceCoordinator for RecordingCoordinator {
    async fn import_resources(
        &self,
        module_ids: &[String],
        manifest_url: Option<&str>,
    ) -> Result<Vec<Arc<dyn Resource>>, ResourceError> {
        self.imports
            .lock()
            .unwrap()
            .push((module_ids.to_vec(), manifest_url.map(str::to_string)));
        self.log
            .lock()
            .unwrap()
            .push(format!("import:{}", module_ids.join(",")));

        // Give overlapping callers a chance to run
        tokio::task::yield_now().await;

        {
            let mut fail_once = self.fail_once.lock().unwrap();
            if let Some(id) = module_ids.iter().find(|id| fail_once.contains(*id)).cloned() {
                fail_once.remove(&id);
                return Err(ResourceError::import(module_ids, format!("{id} unavailable")));
            }
        }

        Ok(module_ids
            .iter()
            .map(|id| {
                Arc::new(LoggedResource {
                    name: id.clone(),
                    log: Arc::clone(&self.log),
                }) as Arc<dyn Resource>
            })
            .collect())
    }
}

/// Engine that keeps every instruction it was given.
#[derive(Default)]
pub struct RecordingEngine {
    pub instructions: Mutex<Vec<CompositionInstruction>>,
    pub failure: Mutex<Option<CompositionError>>,
}

impl RecordingEngine {
    pub fn failing(error: CompositionError) -> Self {
        Self {
            instructions: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(error)),
        }
    }

    pub fn last_instruction(&self) -> Option<CompositionInstruction> {
        self.instructions.lock().unwrap().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.instructions.lock().unwrap().len()
    }
}

#[async_trait]
impl CompositionEngine for RecordingEngine {
    async fn compose(
        &self,
        instruction: CompositionInstruction,
    ) -> Result<Instance, CompositionError> {
        // The slot is only attached once composition has finished
        assert!(!instruction.view_slot.is_attached());

        self.instructions.lock().unwrap().push(instruction.clone());
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        instruction.view_slot.add(instruction.view_model.clone());
        Ok(instruction.view_model)
    }
}

/// Document that records the ids it was asked for.
#[derive(Default)]
pub struct RecordingDocument {
    pub inner: MemoryDocument,
    pub lookups: Mutex<Vec<String>>,
}

impl RecordingDocument {
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Document for RecordingDocument {
    fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.lookups.lock().unwrap().push(id.to_string());
        self.inner.get_element_by_id(id)
    }

    fn body(&self) -> Element {
        self.inner.body()
    }
}

/// Register a binding language and the given coordinator.
pub fn install_startup_capabilities(aurelia: &Aurelia, coordinator: Arc<RecordingCoordinator>) {
    let coordinator: Arc<dyn ResourceCoordinator> = coordinator;
    aurelia
        .with_instance(keys::BINDING_LANGUAGE, Instance::new("binding-language"))
        .with_instance(keys::RESOURCE_COORDINATOR, Instance::new(coordinator));
}

pub fn install_engine(aurelia: &Aurelia, engine: Arc<RecordingEngine>) {
    let engine: Arc<dyn CompositionEngine> = engine;
    aurelia.with_instance(keys::COMPOSITION_ENGINE, Instance::new(engine));
}
