//! Imports queued resource requests and registers what they produce.

use std::collections::VecDeque;
use std::sync::Arc;

use aurelia_core::{ResourceCoordinator, ResourceError, ResourceRegistry};
use tracing::debug;

/// Module ids queued by `Aurelia::with_resources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub module_ids: Vec<String>,
    /// Module id of the plugin that declared these resources, if any.
    pub resource_manifest_url: Option<String>,
}

impl ResourceRequest {
    pub fn new<I, S>(module_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module_ids: module_ids.into_iter().map(Into::into).collect(),
            resource_manifest_url: None,
        }
    }

    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.resource_manifest_url = Some(url.into());
        self
    }
}

/// Import and register every queued request, front to back.
///
/// A request is popped only after all of its resources are registered, so on
/// failure `queue` still holds the failing request and everything after it.
/// Returns the number of resources registered.
pub async fn load_resources(
    coordinator: &dyn ResourceCoordinator,
    queue: &mut VecDeque<ResourceRequest>,
    registry: &Arc<dyn ResourceRegistry>,
) -> Result<usize, ResourceError> {
    let mut registered = 0;

    while let Some(request) = queue.front() {
        debug!(
            module_ids = ?request.module_ids,
            manifest_url = ?request.resource_manifest_url,
            "Importing resources"
        );

        let resources = coordinator
            .import_resources(
                &request.module_ids,
                request.resource_manifest_url.as_deref(),
            )
            .await?;

        for resource in &resources {
            resource.register(registry);
        }
        registered += resources.len();

        queue.pop_front();
    }

    Ok(registered)
}
