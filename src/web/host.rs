use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, HtmlCanvasElement,
    HtmlElement, MediaQueryList, MouseEvent, ResizeObserver, TouchEvent,
    Window,
};

use super::webgl::WebGlContext;
use crate::gpu::ContextAttributes;
use crate::surface::{
    DeferredRelease, EpochCounter, Fallback, RenderSurface, SurfaceHost,
};

/// A render surface living in the page.
pub type SharedSurface = Rc<RefCell<RenderSurface<BrowserHost>>>;

type SurfaceRef = Weak<RefCell<RenderSurface<BrowserHost>>>;

/// Run `f` on the surface unless it is gone or already borrowed.
fn with_surface(
    surface: &SurfaceRef,
    f: impl FnOnce(&mut RenderSurface<BrowserHost>),
) {
    let Some(surface) = surface.upgrade() else {
        return;
    };
    let Ok(mut surface) = surface.try_borrow_mut() else {
        log::debug!("render surface busy, dropping event");
        return;
    };
    f(&mut surface);
}

/// [`SurfaceHost`] backed by a canvas inside a container element.
///
/// Frames come from `requestAnimationFrame`, recovery from `setTimeout`.
/// Context loss, container resizes, and (optionally) pointer movement are
/// forwarded to the surface until [`detach`](SurfaceHost::detach).
pub struct BrowserHost {
    window: Window,
    canvas: HtmlCanvasElement,
    container: Element,
    epoch: EpochCounter,
    reduced_motion: Option<MediaQueryList>,
    frame_id: Option<i32>,
    recovery_id: Option<i32>,
    on_frame: Closure<dyn FnMut(f64)>,
    on_recover: Closure<dyn FnMut()>,
    events: Option<EventWiring>,
}

impl BrowserHost {
    /// Host for `canvas`, sized after `container`. `surface` is the cell
    /// the host will live in (see [`Rc::new_cyclic`]).
    pub fn new(
        window: Window,
        canvas: HtmlCanvasElement,
        container: Element,
        epoch: EpochCounter,
        surface: &SurfaceRef,
        track_pointer: bool,
    ) -> Self {
        let reduced_motion = window
            .match_media("(prefers-reduced-motion: reduce)")
            .ok()
            .flatten();

        let frame_target = surface.clone();
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            with_surface(&frame_target, |s| {
                s.host_mut().frame_id = None;
                s.tick(timestamp);
            });
        });
        let recover_target = surface.clone();
        let on_recover = Closure::<dyn FnMut()>::new(move || {
            with_surface(&recover_target, |s| {
                s.host_mut().recovery_id = None;
                let _ = s.recover();
            });
        });

        let events =
            EventWiring::attach(&window, &canvas, &container, surface, track_pointer);

        Self {
            window,
            canvas,
            container,
            epoch,
            reduced_motion,
            frame_id: None,
            recovery_id: None,
            on_frame,
            on_recover,
            events: Some(events),
        }
    }

    /// Container size in CSS pixels and the current device pixel ratio.
    pub fn measure(&self) -> (f32, f32, f32) {
        let rect = self.container.get_bounding_client_rect();
        (
            rect.width() as f32,
            rect.height() as f32,
            device_pixel_ratio(&self.window),
        )
    }

    /// The canvas element.
    pub const fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

/// Hide `canvas` and paint `content` as the container background.
pub(super) fn paint_fallback(
    canvas: &HtmlCanvasElement,
    container: &Element,
    content: &Fallback,
) {
    let _ = canvas.style().set_property("display", "none");
    let Fallback::Css(background) = content else {
        return;
    };
    if let Some(container) = container.dyn_ref::<HtmlElement>() {
        let _ = container.style().set_property("background", background);
    }
}

fn device_pixel_ratio(window: &Window) -> f32 {
    let dpr = window.device_pixel_ratio();
    if dpr > 0.0 {
        dpr as f32
    } else {
        1.0
    }
}

impl SurfaceHost for BrowserHost {
    type Context = WebGlContext;

    fn acquire_context(
        &mut self,
        attributes: &ContextAttributes,
    ) -> Option<WebGlContext> {
        WebGlContext::acquire(&self.canvas, attributes)
    }

    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map_or_else(js_sys::Date::now, |p| p.now())
    }

    fn request_frame(&mut self) {
        if self.frame_id.is_some() {
            return;
        }
        self.frame_id = self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
            .ok();
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.frame_id.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
            .as_ref()
            .is_some_and(MediaQueryList::matches)
    }

    fn schedule_recovery(&mut self, delay_ms: u32) {
        self.cancel_recovery();
        self.recovery_id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                self.on_recover.as_ref().unchecked_ref(),
                i32::try_from(delay_ms).unwrap_or(i32::MAX),
            )
            .ok();
    }

    fn cancel_recovery(&mut self) {
        if let Some(id) = self.recovery_id.take() {
            self.window.clear_timeout_with_handle(id);
        }
    }

    fn defer_release(&mut self, release: DeferredRelease<WebGlContext>) {
        let callback = Closure::once_into_js(move || {
            if !release.run() {
                log::debug!("canvas remounted, keeping its context");
            }
        });
        if self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                0,
            )
            .is_err()
        {
            log::warn!("could not schedule context release");
        }
    }

    fn epoch(&self) -> &EpochCounter {
        &self.epoch
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn show_fallback(&mut self, content: &Fallback) {
        paint_fallback(&self.canvas, &self.container, content);
    }

    fn detach(&mut self) {
        self.events = None;
    }
}

/// Platform listeners feeding one surface. Dropping removes them.
struct EventWiring {
    listeners: Vec<Listener>,
    resize: Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>,
}

impl EventWiring {
    fn attach(
        window: &Window,
        canvas: &HtmlCanvasElement,
        container: &Element,
        surface: &SurfaceRef,
        track_pointer: bool,
    ) -> Self {
        let mut listeners = Vec::new();

        let target = surface.clone();
        listeners.extend(Listener::add(
            canvas,
            "webglcontextlost",
            false,
            move |event| {
                // Without this the browser never restores the context.
                event.prevent_default();
                with_surface(&target, RenderSurface::context_lost);
            },
        ));
        let target = surface.clone();
        listeners.extend(Listener::add(
            canvas,
            "webglcontextrestored",
            false,
            move |_| with_surface(&target, RenderSurface::context_restored),
        ));

        if track_pointer {
            let (target, element) = (surface.clone(), container.clone());
            listeners.extend(Listener::add(window, "mousemove", true, move |event| {
                if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                    pointer_moved(&target, &element, mouse.client_x(), mouse.client_y());
                }
            }));
            let (target, element) = (surface.clone(), container.clone());
            listeners.extend(Listener::add(window, "touchmove", true, move |event| {
                let touch = event
                    .dyn_ref::<TouchEvent>()
                    .and_then(|touch| touch.touches().get(0));
                if let Some(touch) = touch {
                    pointer_moved(&target, &element, touch.client_x(), touch.client_y());
                }
            }));
        }

        Self {
            listeners,
            resize: observe_resize(window, container, surface),
        }
    }
}

impl Drop for EventWiring {
    fn drop(&mut self) {
        if let Some((observer, _)) = &self.resize {
            observer.disconnect();
        }
        self.listeners.clear();
    }
}

fn pointer_moved(surface: &SurfaceRef, container: &Element, x: i32, y: i32) {
    let rect = container.get_bounding_client_rect();
    with_surface(surface, |s| {
        s.set_pointer(
            (f64::from(x) - rect.left()) as f32,
            (f64::from(y) - rect.top()) as f32,
        );
    });
}

fn observe_resize(
    window: &Window,
    container: &Element,
    surface: &SurfaceRef,
) -> Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)> {
    let (window, element, target) =
        (window.clone(), container.clone(), surface.clone());
    let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |_| {
        let rect = element.get_bounding_client_rect();
        let dpr = device_pixel_ratio(&window);
        with_surface(&target, |s| {
            s.resize(rect.width() as f32, rect.height() as f32, dpr);
        });
    });
    let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => observer,
        Err(e) => {
            log::warn!("ResizeObserver unavailable: {e:?}");
            return None;
        }
    };
    observer.observe(container);
    Some((observer, callback))
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn add(
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Option<Self> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        if let Err(e) = target
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                callback.as_ref().unchecked_ref(),
                &options,
            )
        {
            log::warn!("could not listen for {kind}: {e:?}");
            return None;
        }
        Some(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}
