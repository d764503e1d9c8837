//! View slots and the composition request handed to the composition engine.

use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::container::{DependencyContainer, Instance};
use crate::dom::Element;
use crate::error::CompositionError;

/// How a view slot places views relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPolicy {
    /// The anchor is the container; its contents are replaced.
    ReplaceContents,
    /// Views are inserted before the anchor.
    InsertBefore,
}

#[derive(Default)]
struct SlotState {
    views: Vec<Instance>,
    attached: bool,
}

/// Where rendered views are inserted into a host element.
///
/// Clones share the same slot.
#[derive(Clone)]
pub struct ViewSlot {
    anchor: Element,
    policy: AnchorPolicy,
    state: Arc<RwLock<SlotState>>,
}

impl ViewSlot {
    pub fn new(anchor: Element, policy: AnchorPolicy) -> Self {
        Self {
            anchor,
            policy,
            state: Arc::new(RwLock::new(SlotState::default())),
        }
    }

    pub fn anchor(&self) -> &Element {
        &self.anchor
    }

    pub fn policy(&self) -> AnchorPolicy {
        self.policy
    }

    pub fn add(&self, view: Instance) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if self.policy == AnchorPolicy::ReplaceContents {
            state.views.clear();
        }
        state.views.push(view);
    }

    pub fn remove_all(&self) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .views
            .clear();
    }

    pub fn views(&self) -> Vec<Instance> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .views
            .clone()
    }

    pub fn attached(&self) {
        self.state.write().unwrap_or_else(|e| e.into_inner()).attached = true;
    }

    pub fn detached(&self) {
        self.state.write().unwrap_or_else(|e| e.into_inner()).attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).attached
    }

    pub fn ptr_eq(&self, other: &ViewSlot) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for ViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ViewSlot")
            .field("anchor", &self.anchor)
            .field("policy", &self.policy)
            .field("views", &state.views.len())
            .field("attached", &state.attached)
            .finish()
    }
}

/// What to render, in which container scope, and through which slot.
#[derive(Clone)]
pub struct CompositionInstruction {
    pub view_model: Instance,
    pub container: Arc<dyn DependencyContainer>,
    /// Scope the composed view resolves from. Creating a child scope is the
    /// engine's business.
    pub child_container: Arc<dyn DependencyContainer>,
    pub view_slot: ViewSlot,
    pub host: Element,
}

impl fmt::Debug for CompositionInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionInstruction")
            .field("view_model", &self.view_model)
            .field("view_slot", &self.view_slot)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Renders a view model into a view slot.
#[async_trait]
pub trait CompositionEngine: Send + Sync {
    /// Returns the composed view model.
    async fn compose(&self, instruction: CompositionInstruction)
        -> Result<Instance, CompositionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    struct SlotEngine;

    #[async_trait]
    impl CompositionEngine for SlotEngine {
        async fn compose(
            &self,
            instruction: CompositionInstruction,
        ) -> Result<Instance, CompositionError> {
            instruction.view_slot.add(instruction.view_model.clone());
            Ok(instruction.view_model)
        }
    }

    #[test]
    fn test_view_slot_replace_contents() {
        let slot = ViewSlot::new(Element::new("body"), AnchorPolicy::ReplaceContents);
        slot.add(Instance::new(1u8));
        slot.add(Instance::new(2u8));

        let views = slot.views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].downcast::<u8>(), Some(2));
    }

    #[test]
    fn test_view_slot_insert_before() {
        let slot = ViewSlot::new(Element::new("div"), AnchorPolicy::InsertBefore);
        slot.add(Instance::new(1u8));
        slot.add(Instance::new(2u8));
        assert_eq!(slot.views().len(), 2);

        slot.remove_all();
        assert!(slot.views().is_empty());
    }

    #[test]
    fn test_view_slot_attach_state_is_shared() {
        let slot = ViewSlot::new(Element::new("body"), AnchorPolicy::ReplaceContents);
        let handed_out = slot.clone();
        assert!(!slot.is_attached());

        handed_out.attached();
        assert!(slot.is_attached());
        assert!(slot.ptr_eq(&handed_out));

        slot.detached();
        assert!(!handed_out.is_attached());
    }

    #[tokio::test]
    async fn test_engine_receives_instruction() {
        let container: Arc<dyn DependencyContainer> = Arc::new(Container::new());
        let host = Element::new("body");
        let slot = ViewSlot::new(host.clone(), AnchorPolicy::ReplaceContents);
        let model = Instance::new("app".to_string());

        let instruction = CompositionInstruction {
            view_model: model.clone(),
            container: Arc::clone(&container),
            child_container: Arc::clone(&container),
            view_slot: slot.clone(),
            host,
        };

        let composed = SlotEngine.compose(instruction).await.unwrap();
        assert!(composed.ptr_eq(&model));
        assert!(slot.views()[0].ptr_eq(&model));
    }
}
