//! Admission control over a bounded pool of live GPU contexts.
//!
//! Every render surface that wants a GPU context registers a
//! [`ShaderInstance`] with a priority and a last-visible timestamp. When the
//! pool is full, the registry evicts the weakest occupant (lowest priority,
//! then least recently visible) or rejects the newcomer if it does not
//! outrank that occupant.
//!
//! The registry is an explicit object rather than hidden module state.
//! Surfaces share it as a [`SharedRegistry`] and hold their slot through an
//! [`Admission`](crate::surface::Admission).

mod clock;
mod instance;
mod visibility;

use std::cell::RefCell;
use std::rc::Rc;

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use instance::{InstanceId, ShaderInstance, ShaderPriority};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
pub use visibility::VisibilityTracker;

/// Registry handle shared by all surfaces on a page.
pub type SharedRegistry = Rc<RefCell<ResourceRegistry>>;

/// Default cap on concurrently live instances.
pub const DEFAULT_MAX_INSTANCES: usize = 4;
/// Default time an instance stays protected after being seen.
pub const DEFAULT_GRACE_PERIOD_MS: Millis = 2000;

/// Construction parameters for a [`ResourceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of concurrently registered instances.
    pub max_instances: usize,
    /// Instances seen within this window are only evicted as a last resort.
    pub grace_period_ms: Millis,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_instances: DEFAULT_MAX_INSTANCES,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
        }
    }
}

struct Entry {
    instance: ShaderInstance,
    /// Registration order, used as the final eviction tie-break.
    seq: u64,
}

/// Priority + recency admission control. See the module docs.
pub struct ResourceRegistry {
    config: RegistryConfig,
    instances: FxHashMap<InstanceId, Entry>,
    max_instances: usize,
    clock: Box<dyn Clock>,
    tracker: Option<Box<dyn VisibilityTracker>>,
    next_seq: u64,
    next_id: u64,
}

impl ResourceRegistry {
    /// Create a registry reading time from a [`MonotonicClock`].
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }

    /// Create a registry with an explicit time source.
    pub fn with_clock(
        config: RegistryConfig,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            config,
            instances: FxHashMap::default(),
            max_instances: config.max_instances,
            clock: Box::new(clock),
            tracker: None,
            next_seq: 0,
            next_id: 0,
        }
    }

    /// Wrap the registry for sharing between surfaces.
    #[must_use]
    pub fn into_shared(self) -> SharedRegistry {
        Rc::new(RefCell::new(self))
    }

    /// Install the visibility tracker. Already registered ids are handed to
    /// it immediately.
    pub fn set_visibility_tracker(
        &mut self,
        mut tracker: Box<dyn VisibilityTracker>,
    ) {
        for id in self.instances.keys() {
            tracker.observe(id);
        }
        if let Some(mut old) = self.tracker.replace(tracker) {
            old.disconnect();
        }
    }

    /// Current reading of the registry clock.
    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Hand out a fresh identifier, unique for this registry's lifetime.
    pub fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId::new(format!("shader-{}", self.next_id));
        self.next_id += 1;
        id
    }

    /// Try to admit `instance`.
    ///
    /// Re-registering a known id replaces its record and succeeds. At
    /// capacity, the eviction candidate is evicted unless the newcomer's
    /// priority is strictly lower than the candidate's, in which case the
    /// call returns `false` and nothing changes.
    pub fn register(&mut self, instance: ShaderInstance) -> bool {
        if let Some(entry) = self.instances.get_mut(&instance.id) {
            log::debug!("refreshing shader instance {}", instance.id);
            entry.instance = instance;
            return true;
        }

        if self.instances.len() < self.max_instances {
            self.insert(instance);
            return true;
        }

        let Some(candidate) = self.eviction_candidate() else {
            log::debug!(
                "rejecting shader instance {}: no capacity",
                instance.id
            );
            return false;
        };
        let candidate_priority = self.instances[&candidate].instance.priority;
        if instance.priority < candidate_priority {
            log::debug!(
                "rejecting shader instance {} (priority {} < {})",
                instance.id,
                instance.priority,
                candidate_priority
            );
            return false;
        }

        self.evict(&candidate);
        self.insert(instance);
        true
    }

    /// Drop bookkeeping for `id`. Unknown ids are ignored.
    pub fn unregister(&mut self, id: &InstanceId) {
        if self.instances.remove(id).is_some() {
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.unobserve(id);
            }
        }
    }

    /// Whether an instance of `priority` would be admitted right now.
    pub fn can_register(&self, priority: i32) -> bool {
        if self.instances.len() < self.max_instances {
            return true;
        }
        self.eviction_candidate().is_some_and(|candidate| {
            priority >= self.instances[&candidate].instance.priority
        })
    }

    /// Change the cap, evicting the weakest instances until the active count
    /// fits.
    pub fn set_max_instances(&mut self, max_instances: usize) {
        self.max_instances = max_instances;
        while self.instances.len() > self.max_instances {
            let Some(candidate) = self.eviction_candidate() else {
                break;
            };
            self.evict(&candidate);
        }
    }

    /// Current cap.
    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// Grace period in milliseconds.
    pub fn grace_period_ms(&self) -> Millis {
        self.config.grace_period_ms
    }

    /// Mark `id` as visible now. Unknown ids are ignored.
    pub fn update_visibility(&mut self, id: &InstanceId) {
        let now = self.clock.now_ms();
        if let Some(entry) = self.instances.get_mut(id) {
            entry.instance.last_visible = now;
        }
    }

    /// Number of registered instances.
    pub fn active_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether `id` currently holds a slot.
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    /// Forget everything and detach the visibility tracker.
    ///
    /// Eviction callbacks are not fired. The cap returns to the value the
    /// registry was constructed with.
    pub fn reset(&mut self) {
        self.instances.clear();
        if let Some(mut tracker) = self.tracker.take() {
            tracker.disconnect();
        }
        self.max_instances = self.config.max_instances;
        self.next_seq = 0;
    }

    fn insert(&mut self, instance: ShaderInstance) {
        log::debug!(
            "admitted shader instance {} (priority {})",
            instance.id,
            instance.priority
        );
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.observe(&instance.id);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let _ = self
            .instances
            .insert(instance.id.clone(), Entry { instance, seq });
    }

    fn evict(&mut self, id: &InstanceId) {
        let Some(entry) = self.instances.remove(id) else {
            return;
        };
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.unobserve(id);
        }
        log::info!(
            "evicting shader instance {} (priority {})",
            id,
            entry.instance.priority
        );
        entry.instance.fire_evicted();
    }

    /// Lowest priority, then oldest `last_visible`, then oldest
    /// registration. Instances outside the grace period are preferred; if
    /// none are, every instance is considered.
    fn eviction_candidate(&self) -> Option<InstanceId> {
        let now = self.clock.now_ms();
        let grace = self.config.grace_period_ms;
        let weakest = |stale_only: bool| {
            self.instances
                .values()
                .filter(|entry| {
                    !stale_only
                        || now.saturating_sub(entry.instance.last_visible)
                            >= grace
                })
                .min_by_key(|entry| {
                    (entry.instance.priority, entry.instance.last_visible, entry.seq)
                })
                .map(|entry| entry.instance.id.clone())
        };
        weakest(true).or_else(|| weakest(false))
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("active", &self.instances.len())
            .field("max_instances", &self.max_instances)
            .field("grace_period_ms", &self.config.grace_period_ms)
            .field("tracked", &self.tracker.is_some())
            .finish_non_exhaustive()
    }
}
