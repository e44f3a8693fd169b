use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlCanvasElement};

use super::host::{paint_fallback, BrowserHost, SharedSurface};
use super::visibility::IntersectionTracker;
use crate::effects;
use crate::monitor::DowngradeBus;
use crate::registry::{SharedRegistry, ShaderPriority};
use crate::surface::{EpochCounter, RenderSurface, SurfaceConfig, SurfaceState};
use crate::theme::SectionConfig;

thread_local! {
    /// One mount counter per canvas element, so a quick remount onto the
    /// same canvas invalidates the previous mount's pending release.
    static EPOCHS: RefCell<Vec<(HtmlCanvasElement, EpochCounter)>> =
        const { RefCell::new(Vec::new()) };
}

fn epoch_for(canvas: &HtmlCanvasElement) -> EpochCounter {
    EPOCHS.with_borrow_mut(|epochs| {
        epochs.retain(|(c, _)| c.is_connected() || c == canvas);
        if let Some((_, epoch)) = epochs.iter().find(|(c, _)| c == canvas) {
            return epoch.clone();
        }
        let epoch = EpochCounter::new();
        epochs.push((canvas.clone(), epoch.clone()));
        epoch
    })
}

/// How a [`ShaderCanvas`] takes part in the page-wide budget.
#[derive(Clone)]
pub struct MountOptions {
    /// Registry to request a slot from. Unbudgeted when `None`.
    pub registry: Option<SharedRegistry>,
    /// Priority of the slot.
    pub priority: i32,
    /// Tracker to attach the canvas to once admitted.
    pub tracker: Option<IntersectionTracker>,
    /// Bus for downgrade reports, unless the config brings its own.
    pub downgrade_bus: Option<DowngradeBus>,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            registry: None,
            priority: ShaderPriority::Medium.value(),
            tracker: None,
            downgrade_bus: None,
        }
    }
}

/// A shader effect running on a page canvas.
///
/// The canvas is sized after its parent element. Dropping the handle
/// unmounts the surface.
pub struct ShaderCanvas {
    surface: SharedSurface,
}

impl ShaderCanvas {
    /// Mount `config` on `canvas`. `None` outside a browser window.
    pub fn mount(
        canvas: HtmlCanvasElement,
        mut config: SurfaceConfig,
        options: &MountOptions,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        if config.downgrade_bus.is_none() {
            config.downgrade_bus.clone_from(&options.downgrade_bus);
        }
        let container = canvas
            .parent_element()
            .unwrap_or_else(|| canvas.clone().unchecked_into::<Element>());
        let epoch = epoch_for(&canvas);
        let track_pointer = config.track_pointer;

        let surface: SharedSurface = Rc::new_cyclic(|weak| {
            let host = BrowserHost::new(
                window,
                canvas,
                container,
                epoch,
                weak,
                track_pointer,
            );
            RefCell::new(RenderSurface::new(host, config))
        });

        {
            let mut s = surface.borrow_mut();
            let (width, height, dpr) = s.host().measure();
            s.resize(width, height, dpr);
            let state = match &options.registry {
                Some(registry) => s.mount_admitted(registry, options.priority),
                None => s.mount(),
            };
            log::debug!("shader canvas mounted: {state}");
            if let (Some(tracker), Some(admission)) =
                (&options.tracker, s.admission())
            {
                tracker.attach(admission.id(), s.host().canvas());
            }
        }

        Some(Self { surface })
    }

    /// Mount the effect a theme section asks for. Sections without a
    /// shader get their fallback painted on the container and no surface.
    pub fn mount_section(
        canvas: HtmlCanvasElement,
        section: &SectionConfig,
        options: &MountOptions,
    ) -> Option<Self> {
        let Some(config) = effects::surface_config(section) else {
            let container = canvas
                .parent_element()
                .unwrap_or_else(|| canvas.clone().unchecked_into::<Element>());
            paint_fallback(&canvas, &container, &effects::section_fallback(section));
            return None;
        };
        let options = MountOptions {
            priority: section.registry_priority(),
            ..options.clone()
        };
        Self::mount(canvas, config, &options)
    }

    /// Current surface state. `None` while the surface is borrowed, e.g.
    /// from inside one of its own callbacks.
    pub fn state(&self) -> Option<SurfaceState> {
        self.surface.try_borrow().ok().map(|s| s.state())
    }

    /// The underlying surface.
    pub const fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    /// Stop the effect and free its GPU resources.
    pub fn unmount(&self) {
        match self.surface.try_borrow_mut() {
            Ok(mut s) => s.unmount(),
            Err(_) => log::warn!("shader canvas busy during unmount"),
        }
    }
}

impl Drop for ShaderCanvas {
    fn drop(&mut self) {
        self.unmount();
    }
}
