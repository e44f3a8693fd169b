use std::fmt;

use super::clock::Millis;

/// Opaque identifier of a registry-tracked shader instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wrap an arbitrary string. Empty strings are legal identifiers.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Canonical priority tiers. Any `i32` is a legal priority; these are the
/// values themes map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPriority {
    /// Hero sections and anything that must stay animated.
    High,
    /// Default tier.
    Medium,
    /// Decorative overlays that are first to go.
    Low,
}

impl ShaderPriority {
    /// Numeric value used by the registry.
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Self::High => 100,
            Self::Medium => 50,
            Self::Low => 10,
        }
    }
}

impl From<ShaderPriority> for i32 {
    fn from(priority: ShaderPriority) -> Self {
        priority.value()
    }
}

/// A unit of GPU capacity tracked by the
/// [`ResourceRegistry`](super::ResourceRegistry).
pub struct ShaderInstance {
    /// Stable identifier for the instance's lifetime.
    pub id: InstanceId,
    /// Higher is more important.
    pub priority: i32,
    /// Last time (monotonic ms) the instance was known to be on screen.
    pub last_visible: Millis,
    on_evict: Option<Box<dyn FnOnce()>>,
}

impl ShaderInstance {
    /// Create an instance with no eviction callback.
    pub fn new(
        id: impl Into<InstanceId>,
        priority: impl Into<i32>,
        last_visible: Millis,
    ) -> Self {
        Self {
            id: id.into(),
            priority: priority.into(),
            last_visible,
            on_evict: None,
        }
    }

    /// Attach the callback fired if the registry evicts this instance.
    ///
    /// The callback runs after the registry has dropped its bookkeeping and
    /// must not call back into the registry.
    #[must_use]
    pub fn on_evict(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_evict = Some(Box::new(callback));
        self
    }

    pub(super) fn fire_evicted(mut self) {
        if let Some(callback) = self.on_evict.take() {
            callback();
        }
    }
}

impl fmt::Debug for ShaderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderInstance")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("last_visible", &self.last_visible)
            .field("has_on_evict", &self.on_evict.is_some())
            .finish()
    }
}
