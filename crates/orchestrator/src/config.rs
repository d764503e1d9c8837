use serde::{Deserialize, Serialize};

/// Element id looked up when `set_root` is given no host.
pub const DEFAULT_HOST_ID: &str = "applicationHost";

/// Bootstrap settings. Missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Host element id used when `set_root` is called without a host
    pub default_host_id: String,
    /// Capacity of a private event bus. When unset, notifications go to the
    /// process-wide bus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_capacity: Option<usize>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            default_host_id: DEFAULT_HOST_ID.to_string(),
            event_capacity: None,
        }
    }
}

impl BootstrapConfig {
    pub fn with_default_host_id(mut self, id: impl Into<String>) -> Self {
        self.default_host_id = id.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }
}
