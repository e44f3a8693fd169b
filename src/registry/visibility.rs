use super::instance::InstanceId;

/// Best-effort on-screen tracking feeding
/// [`ResourceRegistry::update_visibility`](super::ResourceRegistry::update_visibility).
///
/// The registry tells the tracker which ids it currently holds. A tracker
/// that never reports anything only makes recency tie-breaks less accurate.
pub trait VisibilityTracker {
    /// Start watching `id`. Called once when an instance is first admitted.
    fn observe(&mut self, id: &InstanceId);

    /// Stop watching `id`. Called on unregister and on eviction.
    fn unobserve(&mut self, id: &InstanceId);

    /// Drop every observation. Called when the registry is reset.
    fn disconnect(&mut self);
}
