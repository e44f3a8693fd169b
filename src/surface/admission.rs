use std::cell::Cell;
use std::rc::Rc;

use crate::registry::{InstanceId, ShaderInstance, SharedRegistry};

/// A slot in the resource registry, held for as long as this value lives.
///
/// Dropping an admission unregisters it unless the registry already evicted
/// it. Eviction only flips a flag; the owning surface notices on its next
/// frame, or before rebuilding after a context loss, and falls back.
#[derive(Debug)]
pub struct Admission {
    registry: SharedRegistry,
    id: InstanceId,
    evicted: Rc<Cell<bool>>,
}

impl Admission {
    /// Ask `registry` for a slot at `priority`. `None` if rejected.
    pub fn request(registry: &SharedRegistry, priority: i32) -> Option<Self> {
        let evicted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&evicted);
        let Ok(mut reg) = registry.try_borrow_mut() else {
            log::debug!("registry busy, admission at priority {priority} refused");
            return None;
        };
        let id = reg.allocate_id();
        let instance = ShaderInstance::new(id.clone(), priority, reg.now())
            .on_evict(move || flag.set(true));
        if !reg.register(instance) {
            log::warn!("registry rejected {id} at priority {priority}");
            return None;
        }
        drop(reg);
        Some(Self {
            registry: Rc::clone(registry),
            id,
            evicted,
        })
    }

    /// Registry id of this slot.
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    /// Whether the registry evicted this slot.
    pub fn is_evicted(&self) -> bool {
        self.evicted.get()
    }

    /// Refresh the slot's last-visible time.
    pub fn mark_visible(&self) {
        if let Ok(mut reg) = self.registry.try_borrow_mut() {
            reg.update_visibility(&self.id);
        }
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        if self.evicted.get() {
            return;
        }
        if let Ok(mut reg) = self.registry.try_borrow_mut() {
            reg.unregister(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{
        ManualClock, RegistryConfig, ResourceRegistry, ShaderPriority,
    };

    fn shared(max_instances: usize, clock: &ManualClock) -> SharedRegistry {
        ResourceRegistry::with_clock(
            RegistryConfig {
                max_instances,
                ..RegistryConfig::default()
            },
            clock.clone(),
        )
        .into_shared()
    }

    #[test]
    fn drop_releases_the_slot() {
        let clock = ManualClock::starting_at(10_000);
        let registry = shared(2, &clock);
        let a = Admission::request(&registry, ShaderPriority::Medium.value());
        assert!(a.is_some());
        assert_eq!(registry.borrow().active_count(), 1);
        drop(a);
        assert_eq!(registry.borrow().active_count(), 0);
    }

    #[test]
    fn busy_registry_refuses_without_registering() {
        let clock = ManualClock::starting_at(10_000);
        let registry = shared(2, &clock);
        {
            let _held = registry.borrow_mut();
            assert!(
                Admission::request(&registry, ShaderPriority::High.value())
                    .is_none()
            );
        }
        assert_eq!(registry.borrow().active_count(), 0);
        assert!(registry.borrow().can_register(ShaderPriority::High.value()));
    }

    #[test]
    fn eviction_sets_flag_and_drop_is_quiet() {
        let clock = ManualClock::starting_at(10_000);
        let registry = shared(1, &clock);
        let low = Admission::request(&registry, ShaderPriority::Low.value())
            .unwrap();
        clock.advance(5_000);
        let high = Admission::request(&registry, ShaderPriority::High.value())
            .unwrap();
        assert!(low.is_evicted());
        assert!(!high.is_evicted());
        drop(low);
        assert!(registry.borrow().contains(high.id()));
        assert_eq!(registry.borrow().active_count(), 1);
    }

    #[test]
    fn rejection_returns_none() {
        let clock = ManualClock::starting_at(10_000);
        let registry = shared(1, &clock);
        let _high = Admission::request(&registry, ShaderPriority::High.value())
            .unwrap();
        assert!(
            Admission::request(&registry, ShaderPriority::Low.value()).is_none()
        );
        assert_eq!(registry.borrow().active_count(), 1);
    }
}
