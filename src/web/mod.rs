//! Browser bindings (feature `web`).
//!
//! Everything here is a thin adapter between DOM/WebGL APIs and the
//! platform-neutral pieces of the crate: [`WebGlContext`] implements the GPU
//! trait, [`BrowserHost`] implements the surface host, and [`ThemePage`]
//! mounts a whole theme onto the page's canvases.

mod canvas;
mod host;
mod visibility;
mod webgl;

use std::rc::Rc;

pub use canvas::{MountOptions, ShaderCanvas};
pub use host::{BrowserHost, SharedSurface};
pub use visibility::{IntersectionTracker, INSTANCE_ATTRIBUTE};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, CustomEventInit, Document, HtmlCanvasElement, Window};
pub use webgl::WebGlContext;

use crate::gpu::{
    classify_gpu, ContextAttributes, DeviceCapabilities, GraphicsContext,
};
use crate::monitor::{DowngradeBus, Subscription, DOWNGRADE_EVENT};
use crate::registry::{ResourceRegistry, SharedRegistry};
use crate::theme::ThemeConfig;

/// Attribute naming the theme section a canvas renders.
pub const SECTION_ATTRIBUTE: &str = "data-section";

/// Route `log` to the browser console and panics to `console.error`.
/// Safe to call more than once.
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("console logger already installed");
    }
}

fn media_matches(window: &Window, query: &str) -> bool {
    window
        .match_media(query)
        .ok()
        .flatten()
        .is_some_and(|mq| mq.matches())
}

/// Probe the GPU with a throwaway context, then release it.
pub fn detect_device() -> DeviceCapabilities {
    let Some(window) = web_sys::window() else {
        return DeviceCapabilities::unsupported("server", false);
    };
    let reduced_motion =
        media_matches(&window, "(prefers-reduced-motion: reduce)");
    let canvas = window
        .document()
        .and_then(|d| d.create_element("canvas").ok())
        .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok());
    let Some(mut gl) = canvas
        .and_then(|c| WebGlContext::acquire(&c, &ContextAttributes::default()))
    else {
        return DeviceCapabilities::unsupported("no-webgl", reduced_motion);
    };

    let webgl2 = gl.api().is_webgl2();
    let max_texture_size = gl.max_texture_size();
    let renderer = gl
        .unmasked_renderer()
        .unwrap_or_else(|| "unknown".to_owned());
    gl.release();

    let tier = classify_gpu(&renderer, max_texture_size, webgl2);
    log::info!("GPU {renderer:?} classified as {tier:?}");
    DeviceCapabilities {
        tier,
        renderer,
        webgl2,
        max_texture_size,
        prefers_reduced_motion: reduced_motion,
    }
}

/// Whether the primary pointer is coarse (touch-first devices).
pub fn is_coarse_pointer() -> bool {
    web_sys::window().is_some_and(|w| media_matches(&w, "(pointer: coarse)"))
}

/// Re-dispatch every downgrade on `bus` as a `window` [`DOWNGRADE_EVENT`]
/// `CustomEvent` with `{ avgFps }` detail. Forwarding stops when the
/// subscription is dropped.
#[must_use = "dropping the subscription stops forwarding"]
pub fn forward_downgrades(bus: &DowngradeBus) -> Subscription {
    bus.subscribe(|event| {
        let Some(window) = web_sys::window() else {
            return;
        };
        let detail = serde_json::to_string(event)
            .ok()
            .and_then(|json| js_sys::JSON::parse(&json).ok())
            .unwrap_or(JsValue::NULL);
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(DOWNGRADE_EVENT, &init) {
            Ok(custom) => {
                let _ = window.dispatch_event(&custom);
            }
            Err(e) => log::warn!("could not build {DOWNGRADE_EVENT}: {e:?}"),
        }
    })
}

/// A theme mounted onto the page.
///
/// Each section is matched to `canvas[data-section="<name>"]`. All
/// surfaces share one registry sized for the detected device, one
/// visibility tracker, and one downgrade bus forwarded to `window`.
pub struct ThemePage {
    registry: SharedRegistry,
    device: DeviceCapabilities,
    canvases: Vec<(String, ShaderCanvas)>,
    _downgrades: Subscription,
}

impl ThemePage {
    /// Mount `theme` onto `document`. Sections without a matching canvas
    /// are skipped.
    pub fn mount(theme: &ThemeConfig, document: &Document) -> Self {
        let device = detect_device();
        let config = theme.registry_config(device.tier, is_coarse_pointer());
        log::info!(
            "mounting theme {:?} with {} shader slots",
            theme.name,
            config.max_instances
        );
        let registry = ResourceRegistry::new(config).into_shared();
        let tracker = IntersectionTracker::new(Rc::downgrade(&registry));
        registry
            .borrow_mut()
            .set_visibility_tracker(Box::new(tracker.clone()));
        let bus = DowngradeBus::new();
        let downgrades = forward_downgrades(&bus);

        let options = MountOptions {
            registry: Some(Rc::clone(&registry)),
            tracker: Some(tracker),
            downgrade_bus: Some(bus),
            ..MountOptions::default()
        };
        // Highest priority first.
        let mut sections: Vec<_> = theme.sections.iter().collect();
        sections.sort_by_key(|(_, s)| std::cmp::Reverse(s.registry_priority()));

        let mut canvases = Vec::new();
        for (name, section) in sections {
            let selector = format!("canvas[{SECTION_ATTRIBUTE}=\"{name}\"]");
            let canvas = document
                .query_selector(&selector)
                .ok()
                .flatten()
                .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok());
            let Some(canvas) = canvas else {
                log::debug!("no canvas for section {name}");
                continue;
            };
            if let Some(mounted) =
                ShaderCanvas::mount_section(canvas, section, &options)
            {
                canvases.push((name.clone(), mounted));
            }
        }

        Self {
            registry,
            device,
            canvases,
            _downgrades: downgrades,
        }
    }

    /// The shared registry.
    pub const fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// What the device probe found.
    pub const fn device(&self) -> &DeviceCapabilities {
        &self.device
    }

    /// Mounted section by name.
    pub fn section(&self, name: &str) -> Option<&ShaderCanvas> {
        self.canvases
            .iter()
            .find_map(|(n, c)| (n == name).then_some(c))
    }

    /// Unmount every section.
    pub fn unmount(&mut self) {
        for (_, canvas) in self.canvases.drain(..) {
            canvas.unmount();
        }
    }
}

impl Drop for ThemePage {
    fn drop(&mut self) {
        self.unmount();
    }
}
