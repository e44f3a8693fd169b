use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::registry::{InstanceId, ResourceRegistry, VisibilityTracker};

/// Fraction of an element that must be on screen to count as visible.
const VISIBLE_THRESHOLD: f64 = 0.1;

/// Attribute carrying the instance id on observed elements.
pub const INSTANCE_ATTRIBUTE: &str = "data-shader-id";

#[derive(Default)]
struct TrackerState {
    observer: Option<IntersectionObserver>,
    /// Ids the registry holds, with their element once attached.
    watched: FxHashMap<InstanceId, Option<Element>>,
}

/// `IntersectionObserver`-backed [`VisibilityTracker`].
///
/// The registry announces ids; the page side attaches elements to them.
/// An element is observed once both halves are known. Clones share state,
/// so one clone is installed in the registry and another kept for
/// [`attach`](Self::attach).
#[derive(Clone)]
pub struct IntersectionTracker {
    state: Rc<RefCell<TrackerState>>,
    _callback: Rc<Closure<dyn FnMut(js_sys::Array)>>,
}

impl IntersectionTracker {
    /// Tracker that refreshes `registry` when observed elements scroll
    /// into view.
    pub fn new(registry: Weak<RefCell<ResourceRegistry>>) -> Self {
        let callback =
            Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                let Ok(mut registry) = registry.try_borrow_mut() else {
                    return;
                };
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>()
                    else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    if let Some(id) = entry.target().get_attribute(INSTANCE_ATTRIBUTE) {
                        registry.update_visibility(&InstanceId::new(id));
                    }
                }
            });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(VISIBLE_THRESHOLD));
        let observer = IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref(),
            &init,
        )
        .map_err(|e| log::warn!("IntersectionObserver unavailable: {e:?}"))
        .ok();

        Self {
            state: Rc::new(RefCell::new(TrackerState {
                observer,
                watched: FxHashMap::default(),
            })),
            _callback: Rc::new(callback),
        }
    }

    /// Associate `element` with `id` and start observing it if the
    /// registry still holds `id`.
    pub fn attach(&self, id: &InstanceId, element: &Element) {
        let _ = element.set_attribute(INSTANCE_ATTRIBUTE, id.as_str());
        let mut state = self.state.borrow_mut();
        let TrackerState { observer, watched } = &mut *state;
        let Some(slot) = watched.get_mut(id) else {
            return;
        };
        *slot = Some(element.clone());
        if let Some(observer) = observer {
            observer.observe(element);
        }
    }
}

impl VisibilityTracker for IntersectionTracker {
    fn observe(&mut self, id: &InstanceId) {
        let _ = self
            .state
            .borrow_mut()
            .watched
            .entry(id.clone())
            .or_insert(None);
    }

    fn unobserve(&mut self, id: &InstanceId) {
        let mut state = self.state.borrow_mut();
        let Some(Some(element)) = state.watched.remove(id) else {
            return;
        };
        if let Some(observer) = &state.observer {
            observer.unobserve(&element);
        }
        let _ = element.remove_attribute(INSTANCE_ATTRIBUTE);
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.watched.clear();
        if let Some(observer) = &state.observer {
            observer.disconnect();
        }
    }
}
