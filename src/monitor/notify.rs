use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Event name used when a downgrade is forwarded to page-level listeners.
pub const DOWNGRADE_EVENT: &str = "shader:performance-downgrade";

/// Payload of a performance downgrade.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DowngradeEvent {
    /// Average FPS over the window that triggered, rounded to one decimal.
    pub avg_fps: f64,
}

type Listener = Box<dyn FnMut(&DowngradeEvent)>;

#[derive(Default)]
struct BusInner {
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
    emitting: bool,
    /// Ids unsubscribed while their listener was detached for delivery.
    dropped_during_emit: Vec<u64>,
}

/// Subscription list for downgrade notifications.
///
/// Cloning yields another handle onto the same list, so one bus can be
/// shared by several monitors when page-wide broadcast is wanted.
#[derive(Clone, Default)]
pub struct DowngradeBus {
    inner: Rc<RefCell<BusInner>>,
}

impl DowngradeBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. It stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        listener: impl FnMut(&DowngradeEvent) + 'static,
    ) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Box::new(listener)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Deliver `event` to every listener.
    ///
    /// Listeners are detached while they run, so a listener may subscribe
    /// or drop subscriptions on this bus without deadlocking.
    pub fn emit(&self, event: &DowngradeEvent) {
        let mut running = {
            let mut inner = self.inner.borrow_mut();
            inner.emitting = true;
            std::mem::take(&mut inner.listeners)
        };
        for (_, listener) in &mut running {
            listener(event);
        }
        let mut inner = self.inner.borrow_mut();
        inner.emitting = false;
        let dropped = std::mem::take(&mut inner.dropped_during_emit);
        running.retain(|(id, _)| !dropped.contains(id));
        // Subscriptions added during delivery go after the originals.
        running.append(&mut inner.listeners);
        inner.listeners = running;
    }

    fn unsubscribe(inner: &RefCell<BusInner>, id: u64) {
        if let Ok(mut inner) = inner.try_borrow_mut() {
            inner.listeners.retain(|(existing, _)| *existing != id);
            if inner.emitting {
                inner.dropped_during_emit.push(id);
            }
        }
    }
}

impl fmt::Debug for DowngradeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DowngradeBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Unsubscribes its listener when dropped.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            DowngradeBus::unsubscribe(&inner, self.id);
        }
    }
}
