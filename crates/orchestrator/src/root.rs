//! Host resolution and the composition request for the root view model.

use std::sync::Arc;

use aurelia_core::{
    AnchorPolicy, CompositionInstruction, DependencyContainer, Document, Element, Instance,
    ViewSlot,
};
use tracing::debug;

/// Where the root view model should be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRef {
    /// Look the host up by element id.
    ById(String),
    /// Use this element as-is.
    Direct(Element),
}

impl From<Element> for HostRef {
    fn from(element: Element) -> Self {
        Self::Direct(element)
    }
}

impl From<&str> for HostRef {
    fn from(id: &str) -> Self {
        Self::ById(id.to_string())
    }
}

impl From<String> for HostRef {
    fn from(id: String) -> Self {
        Self::ById(id)
    }
}

/// Resolve the host element. Missing hosts default to `default_id`; ids with
/// no matching element fall back to the document body.
pub fn resolve_host(document: &dyn Document, host: Option<HostRef>, default_id: &str) -> Element {
    let host = host.unwrap_or_else(|| HostRef::ById(default_id.to_string()));

    match host {
        HostRef::Direct(element) => element,
        HostRef::ById(id) => document.get_element_by_id(&id).unwrap_or_else(|| {
            debug!(id = %id, "No element with host id, using document body");
            document.body()
        }),
    }
}

/// Build the instruction composing `view_model` into `host`, replacing its
/// contents. Both container fields refer to `container`.
pub fn build_instruction(
    view_model: Instance,
    container: &Arc<dyn DependencyContainer>,
    host: Element,
) -> CompositionInstruction {
    CompositionInstruction {
        view_model,
        container: Arc::clone(container),
        child_container: Arc::clone(container),
        view_slot: ViewSlot::new(host.clone(), AnchorPolicy::ReplaceContents),
        host,
    }
}
