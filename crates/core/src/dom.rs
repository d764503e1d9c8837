//! Minimal host document model: elements that can be looked up by id and
//! claimed by an owner.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::container::{Instance, WeakInstance};

struct ElementInner {
    tag_name: String,
    id: Option<String>,
    owner: RwLock<Option<WeakInstance>>,
}

/// Handle to a host element. Clones refer to the same element.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl Element {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self::build(tag_name.into(), None)
    }

    pub fn with_id(tag_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::build(tag_name.into(), Some(id.into()))
    }

    fn build(tag_name: String, id: Option<String>) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                tag_name,
                id,
                owner: RwLock::new(None),
            }),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.inner.tag_name
    }

    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    /// Record `owner` on the element without keeping it alive.
    pub fn set_owner(&self, owner: &Instance) {
        *self.inner.owner.write().unwrap_or_else(|e| e.into_inner()) = Some(owner.downgrade());
    }

    /// The owner recorded by [`Element::set_owner`], if it is still alive.
    pub fn owner(&self) -> Option<Instance> {
        self.inner
            .owner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(WeakInstance::upgrade)
    }

    pub fn clear_owner(&self) {
        *self.inner.owner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag_name", &self.inner.tag_name)
            .field("id", &self.inner.id)
            .finish()
    }
}

/// The ambient document hosts are resolved against.
pub trait Document: Send + Sync {
    fn get_element_by_id(&self, id: &str) -> Option<Element>;

    /// Root element used when no host can be found.
    fn body(&self) -> Element;
}

/// In-memory document holding a body and an id index.
pub struct MemoryDocument {
    body: Element,
    elements: RwLock<HashMap<String, Element>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            body: Element::new("body"),
            elements: RwLock::new(HashMap::new()),
        }
    }

    /// Index `element` by its id. Elements without an id are not addressable
    /// and are ignored; returns whether the element was indexed.
    pub fn insert(&self, element: Element) -> bool {
        let Some(id) = element.id().map(str::to_string) else {
            return false;
        };
        self.elements
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, element);
        true
    }

    pub fn remove(&self, id: &str) -> Option<Element> {
        self.elements
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.elements
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn body(&self) -> Element {
        self.body.clone()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.elements.read().unwrap_or_else(|e| e.into_inner()).len();
        f.debug_struct("MemoryDocument")
            .field("body", &self.body)
            .field("elements", &count)
            .finish()
    }
}
