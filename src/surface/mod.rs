//! One fullscreen-quad shader bound to one render target.
//!
//! A [`RenderSurface`] is a state machine driven by its [`SurfaceHost`]:
//!
//! ```text
//! Uninitialized -> Initializing -> Running <-> (ContextLost -> Recovering)
//!                        |            |
//!                        +-> Fallback <+            any -> Disposed
//! ```
//!
//! GPU errors never escape a surface. They are logged and turned into a
//! [`FallbackReason`], after which the host shows [`Fallback`] content.

mod admission;
mod config;
mod epoch;
mod host;
mod state;

pub use admission::Admission;
pub use config::{
    Fallback, FrameContext, FrameHook, InitContext, InitHook, SurfaceConfig,
};
pub use epoch::{DeferredRelease, EpochCounter, EpochToken};
use glam::Vec2;
pub use host::SurfaceHost;
pub use state::{FallbackReason, SurfaceState};

use crate::gpu::{
    sources_for_api, uniform_names, ContextAttributes, GpuSession,
    GraphicsContext, GraphicsError, QUAD_VERTEX_COUNT,
};
use crate::monitor::PerformanceMonitor;
use crate::registry::SharedRegistry;

/// Delay between the platform's restore signal and the rebuild, giving
/// concurrent teardown and remount sequences time to settle.
pub const RECOVERY_DELAY_MS: u32 = 100;

/// Lifecycle of one GPU effect. See the module docs.
pub struct RenderSurface<H: SurfaceHost> {
    host: H,
    config: SurfaceConfig,
    state: SurfaceState,
    fallback_reason: Option<FallbackReason>,
    context: Option<H::Context>,
    session: GpuSession,
    monitor: PerformanceMonitor,
    admission: Option<Admission>,
    uniform_names: Vec<String>,
    start_ms: f64,
    last_frame_ms: f64,
    backing_size: (u32, u32),
    css_size: Vec2,
    device_pixel_ratio: f32,
    pointer: Vec2,
}

impl<H: SurfaceHost> RenderSurface<H> {
    /// Create an unmounted surface.
    pub fn new(host: H, config: SurfaceConfig) -> Self {
        let monitor = match config.downgrade_bus.clone() {
            Some(bus) => PerformanceMonitor::with_bus(config.monitor, bus),
            None => PerformanceMonitor::new(config.monitor),
        };
        let uniform_names = uniform_names(&config.uniform_names);
        Self {
            host,
            config,
            state: SurfaceState::Uninitialized,
            fallback_reason: None,
            context: None,
            session: GpuSession::default(),
            monitor,
            admission: None,
            uniform_names,
            start_ms: 0.0,
            last_frame_ms: 0.0,
            backing_size: (0, 0),
            css_size: Vec2::ZERO,
            device_pixel_ratio: 1.0,
            pointer: Vec2::ZERO,
        }
    }

    /// Acquire a context, build the program, run the init hook, and
    /// request the first frame. Only acts on an unmounted surface.
    pub fn mount(&mut self) -> SurfaceState {
        if self.state != SurfaceState::Uninitialized {
            return self.state;
        }
        let _ = self.host.epoch().advance();
        self.state = SurfaceState::Initializing;

        let Some(gl) = self
            .host
            .acquire_context(&ContextAttributes::conservative())
        else {
            self.enter_fallback(FallbackReason::Unsupported);
            return self.state;
        };
        let gl = self.context.insert(gl);
        match build_session(
            gl,
            &mut self.config,
            &self.uniform_names,
            self.backing_size,
        ) {
            Ok(session) => self.session = session,
            Err(e) => {
                log::error!("render surface setup failed: {e}");
                self.enter_fallback(FallbackReason::ShaderFailed(e));
                return self.state;
            }
        }

        self.start_clock();
        self.state = SurfaceState::Running;
        self.host.request_frame();
        log::debug!(
            "render surface running ({} uniforms resolved)",
            self.session.uniforms.len()
        );
        self.state
    }

    /// Ask `registry` for a slot at `priority`, then [`mount`](Self::mount).
    /// A refused slot sends the surface straight to fallback.
    pub fn mount_admitted(
        &mut self,
        registry: &SharedRegistry,
        priority: i32,
    ) -> SurfaceState {
        if self.state != SurfaceState::Uninitialized {
            return self.state;
        }
        match Admission::request(registry, priority) {
            Some(admission) => {
                self.admission = Some(admission);
                self.mount()
            }
            None => {
                self.enter_fallback(FallbackReason::Rejected);
                self.state
            }
        }
    }

    /// Draw one frame. Called by the host for each granted frame request.
    pub fn tick(&mut self, now_ms: f64) {
        if self.state != SurfaceState::Running {
            return;
        }
        if self.fall_back_if_evicted() {
            return;
        }

        let delta_ms = now_ms - self.last_frame_ms;
        self.last_frame_ms = now_ms;
        if !self.monitor.record_frame(delta_ms) {
            let avg_fps = self.monitor.last_average_fps().unwrap_or(0.0);
            self.enter_fallback(FallbackReason::PerformanceDowngrade {
                avg_fps,
            });
            return;
        }

        let speed = if self.host.prefers_reduced_motion() {
            0.0
        } else {
            self.config.speed
        };
        let time = ((now_ms - self.start_ms) * 0.001) as f32 * speed;
        let resolution =
            Vec2::new(self.backing_size.0 as f32, self.backing_size.1 as f32);

        let Some(gl) = self.context.as_mut() else {
            return;
        };
        let uniforms = &self.session.uniforms;
        uniforms.set(gl, "u_time", time);
        uniforms.set(gl, "u_resolution", resolution);
        if let Some(hook) = self.config.on_frame.as_mut() {
            let mut frame = FrameContext {
                gl: &mut *gl,
                uniforms,
                time,
                delta_time: (delta_ms.max(0.0) * 0.001) as f32,
                resolution,
                pointer: self.pointer,
            };
            hook(&mut frame);
        }
        gl.draw_triangles(QUAD_VERTEX_COUNT);
        self.host.request_frame();
    }

    /// The platform took the context away. Stops drawing until restored.
    /// The host is expected to have suppressed the platform default.
    pub fn context_lost(&mut self) {
        if !matches!(
            self.state,
            SurfaceState::Running | SurfaceState::Recovering
        ) {
            return;
        }
        log::warn!("GPU context lost");
        self.host.cancel_frame();
        self.host.cancel_recovery();
        // Handles died with the context; nothing to delete.
        self.session = GpuSession::default();
        self.state = SurfaceState::ContextLost;
    }

    /// The platform restored the context. Schedules [`recover`](Self::recover)
    /// after [`RECOVERY_DELAY_MS`].
    pub fn context_restored(&mut self) {
        if self.state != SurfaceState::ContextLost || self.fall_back_if_evicted()
        {
            return;
        }
        log::info!("GPU context restored, rebuilding in {RECOVERY_DELAY_MS} ms");
        self.state = SurfaceState::Recovering;
        self.host.schedule_recovery(RECOVERY_DELAY_MS);
    }

    /// Rebuild everything in a fresh context and resume drawing with a
    /// reset monitor and clock. The init hook runs again.
    pub fn recover(&mut self) -> SurfaceState {
        if self.state != SurfaceState::Recovering || self.fall_back_if_evicted()
        {
            return self.state;
        }
        let Some(gl) = self
            .host
            .acquire_context(&ContextAttributes::conservative())
        else {
            self.enter_fallback(FallbackReason::RecoveryFailed(None));
            return self.state;
        };
        // The previous context belongs to the same target; replacing it
        // must not release the target.
        let gl = self.context.insert(gl);
        match build_session(
            gl,
            &mut self.config,
            &self.uniform_names,
            self.backing_size,
        ) {
            Ok(session) => self.session = session,
            Err(e) => {
                log::error!("render surface recovery failed: {e}");
                self.enter_fallback(FallbackReason::RecoveryFailed(Some(e)));
                return self.state;
            }
        }
        self.monitor.reset();
        self.start_clock();
        self.state = SurfaceState::Running;
        self.host.request_frame();
        log::info!("render surface recovered");
        self.state
    }

    /// Track the container size. The drawing buffer follows at
    /// `css * device_pixel_ratio`, rounded.
    pub fn resize(
        &mut self,
        css_width: f32,
        css_height: f32,
        device_pixel_ratio: f32,
    ) {
        if self.state == SurfaceState::Disposed {
            return;
        }
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0
        {
            device_pixel_ratio
        } else {
            1.0
        };
        self.css_size = Vec2::new(css_width.max(0.0), css_height.max(0.0));
        self.device_pixel_ratio = dpr;

        let size = (
            to_physical(self.css_size.x, dpr),
            to_physical(self.css_size.y, dpr),
        );
        if size == self.backing_size {
            return;
        }
        self.backing_size = size;
        self.host.set_backing_size(size.0, size.1);
        if let Some(gl) = self.context.as_mut().filter(|gl| !gl.is_lost()) {
            gl.viewport(size.0, size.1);
        }
    }

    /// Pointer position in CSS pixels relative to the container's top-left.
    /// Ignored unless pointer tracking is on.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        if !self.config.track_pointer {
            return;
        }
        let dpr = self.device_pixel_ratio;
        self.pointer = Vec2::new(x * dpr, (self.css_size.y - y) * dpr);
    }

    /// Refresh this surface's registry slot, if it holds one.
    pub fn mark_visible(&self) {
        if let Some(admission) = &self.admission {
            admission.mark_visible();
        }
    }

    /// Tear down: cancel scheduled work, detach platform listeners, free
    /// GPU objects, and hand the context over for deferred release.
    /// Calling it again does nothing.
    pub fn unmount(&mut self) {
        if self.state == SurfaceState::Disposed {
            return;
        }
        self.host.cancel_frame();
        self.host.cancel_recovery();
        self.host.detach();
        self.teardown_gpu();
        self.admission = None;
        self.state = SurfaceState::Disposed;
        log::debug!("render surface disposed");
    }

    /// Current state.
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Why the surface fell back, if it did.
    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        self.fallback_reason.as_ref()
    }

    /// Content to show while in [`SurfaceState::Fallback`].
    pub fn fallback_content(&self) -> Option<&Fallback> {
        (self.state == SurfaceState::Fallback).then_some(&self.config.fallback)
    }

    /// The frame-rate monitor.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// The registry slot, if mounted through
    /// [`mount_admitted`](Self::mount_admitted) and still held.
    pub fn admission(&self) -> Option<&Admission> {
        self.admission.as_ref()
    }

    /// Drawing-buffer size in physical pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing_size
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn start_clock(&mut self) {
        let now = self.host.now_ms();
        self.start_ms = now;
        self.last_frame_ms = now;
    }

    /// Gives up the surface once its registry slot has been taken away.
    fn fall_back_if_evicted(&mut self) -> bool {
        let evicted = self.admission.as_ref().is_some_and(Admission::is_evicted);
        if evicted {
            self.enter_fallback(FallbackReason::Evicted);
        }
        evicted
    }

    fn enter_fallback(&mut self, reason: FallbackReason) {
        log::warn!("render surface falling back: {reason}");
        self.host.cancel_frame();
        self.host.cancel_recovery();
        self.teardown_gpu();
        self.admission = None;
        self.fallback_reason = Some(reason);
        self.state = SurfaceState::Fallback;
        self.host.show_fallback(&self.config.fallback);
    }

    fn teardown_gpu(&mut self) {
        match self.context.take() {
            Some(mut gl) => {
                self.session.dispose(&mut gl);
                let release = DeferredRelease::new(self.host.epoch(), gl);
                self.host.defer_release(release);
            }
            None => self.session = GpuSession::default(),
        }
    }
}

impl<H: SurfaceHost> Drop for RenderSurface<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<H: SurfaceHost> std::fmt::Debug for RenderSurface<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("state", &self.state)
            .field("fallback_reason", &self.fallback_reason)
            .field("backing_size", &self.backing_size)
            .field("admission", &self.admission.as_ref().map(Admission::id))
            .finish_non_exhaustive()
    }
}

fn build_session(
    gl: &mut dyn GraphicsContext,
    config: &mut SurfaceConfig,
    uniform_names: &[String],
    backing_size: (u32, u32),
) -> Result<GpuSession, GraphicsError> {
    let (vertex, fragment) = sources_for_api(
        gl.api(),
        &config.fragment_shader,
        config.vertex_shader.as_deref(),
    );
    let mut session = GpuSession::build(gl, vertex, fragment, uniform_names)?;
    if backing_size.0 > 0 && backing_size.1 > 0 {
        gl.viewport(backing_size.0, backing_size.1);
    }
    let (Some(hook), Some(program)) = (config.on_init.as_mut(), session.program)
    else {
        return Ok(session);
    };
    let mut init = InitContext {
        gl: &mut *gl,
        program,
        session: &mut session,
    };
    if let Err(e) = hook(&mut init) {
        session.dispose(gl);
        return Err(e);
    }
    Ok(session)
}

fn to_physical(css: f32, dpr: f32) -> u32 {
    let px = (css * dpr).round();
    if px.is_finite() && px > 0.0 {
        px as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::gpu::{
        HeadlessContext, HeadlessOptions, HeadlessProbe, ShaderStage,
        TextureDesc, UniformValue,
    };
    use crate::monitor::{DowngradeBus, PerformanceOptions};
    use crate::registry::{
        ManualClock, RegistryConfig, ResourceRegistry, ShaderPriority,
    };

    const FRAG: &str = "#version 300 es
precision highp float;
uniform float u_time;
uniform vec2 u_resolution;
uniform vec2 u_mouse;
uniform sampler2D u_noise;
out vec4 fragColor;
void main() { fragColor = vec4(u_time); }";

    #[derive(Default)]
    struct TestHost {
        options: HeadlessOptions,
        unsupported: bool,
        now: f64,
        frame_pending: bool,
        recovery_delay: Option<u32>,
        deferred: Vec<DeferredRelease<HeadlessContext>>,
        epoch: EpochCounter,
        probes: Vec<HeadlessProbe>,
        backing: Option<(u32, u32)>,
        detached: bool,
        reduced_motion: bool,
        shown_fallback: Option<Fallback>,
    }

    impl TestHost {
        fn sharing_target(other: &Self) -> Self {
            Self {
                epoch: other.epoch.clone(),
                ..Self::default()
            }
        }

        fn probe(&self) -> &HeadlessProbe {
            self.probes.last().expect("no context acquired")
        }

        fn run_deferred(&mut self) -> usize {
            self.deferred
                .drain(..)
                .map(DeferredRelease::run)
                .filter(|released| *released)
                .count()
        }
    }

    impl SurfaceHost for TestHost {
        type Context = HeadlessContext;

        fn acquire_context(
            &mut self,
            attributes: &ContextAttributes,
        ) -> Option<HeadlessContext> {
            assert!(!attributes.antialias && !attributes.depth);
            if self.unsupported {
                return None;
            }
            let gl = HeadlessContext::new(self.options);
            self.probes.push(gl.probe());
            Some(gl)
        }

        fn now_ms(&self) -> f64 {
            self.now
        }

        fn request_frame(&mut self) {
            assert!(!self.frame_pending, "frame requested twice");
            self.frame_pending = true;
        }

        fn cancel_frame(&mut self) {
            self.frame_pending = false;
        }

        fn prefers_reduced_motion(&self) -> bool {
            self.reduced_motion
        }

        fn schedule_recovery(&mut self, delay_ms: u32) {
            self.recovery_delay = Some(delay_ms);
        }

        fn cancel_recovery(&mut self) {
            self.recovery_delay = None;
        }

        fn defer_release(&mut self, release: DeferredRelease<HeadlessContext>) {
            self.deferred.push(release);
        }

        fn epoch(&self) -> &EpochCounter {
            &self.epoch
        }

        fn set_backing_size(&mut self, width: u32, height: u32) {
            self.backing = Some((width, height));
        }

        fn show_fallback(&mut self, content: &Fallback) {
            self.shown_fallback = Some(content.clone());
        }

        fn detach(&mut self) {
            self.detached = true;
        }
    }

    /// Grant pending frame requests `count` times, `step_ms` apart.
    fn run_frames(
        surface: &mut RenderSurface<TestHost>,
        count: usize,
        step_ms: f64,
    ) -> usize {
        let mut ran = 0;
        for _ in 0..count {
            let host = surface.host_mut();
            if !host.frame_pending {
                break;
            }
            host.frame_pending = false;
            host.now += step_ms;
            let now = host.now;
            surface.tick(now);
            ran += 1;
        }
        ran
    }

    fn float(value: Option<UniformValue>) -> f32 {
        match value {
            Some(UniformValue::Float(v)) => v,
            other => panic!("expected a float uniform, got {other:?}"),
        }
    }

    #[test]
    fn mount_draws_and_writes_builtin_uniforms() {
        let mut surface = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        surface.resize(100.0, 50.0, 2.0);
        assert_eq!(surface.mount(), SurfaceState::Running);
        assert_eq!(surface.host().backing, Some((200, 100)));
        assert_eq!(surface.host().probe().viewport(), Some((200, 100)));

        assert_eq!(run_frames(&mut surface, 3, 16.0), 3);
        let probe = surface.host().probe().clone();
        assert_eq!(probe.draw_calls(), 3);
        assert!((float(probe.uniform("u_time")) - 0.048).abs() < 1e-4);
        assert_eq!(
            probe.uniform("u_resolution"),
            Some(UniformValue::Vec2(Vec2::new(200.0, 100.0)))
        );
        assert!(surface.host().frame_pending);
    }

    #[test]
    fn missing_gpu_falls_back() {
        let host = TestHost {
            unsupported: true,
            ..TestHost::default()
        };
        let config = SurfaceConfig::new(FRAG)
            .fallback(Fallback::Css("linear-gradient(red, blue)".to_owned()));
        let mut surface = RenderSurface::new(host, config);
        assert_eq!(surface.mount(), SurfaceState::Fallback);
        assert_eq!(surface.fallback_reason(), Some(&FallbackReason::Unsupported));
        assert_eq!(
            surface.fallback_content(),
            Some(&Fallback::Css("linear-gradient(red, blue)".to_owned()))
        );
        assert_eq!(
            surface.host().shown_fallback.as_ref(),
            surface.fallback_content()
        );
        assert!(!surface.host().frame_pending);
    }

    #[test]
    fn compile_failure_falls_back_and_releases_everything() {
        let host = TestHost {
            options: HeadlessOptions {
                fail_compile: Some(ShaderStage::Fragment),
                ..HeadlessOptions::default()
            },
            ..TestHost::default()
        };
        let mut surface = RenderSurface::new(host, SurfaceConfig::new(FRAG));
        assert_eq!(surface.mount(), SurfaceState::Fallback);
        assert!(matches!(
            surface.fallback_reason(),
            Some(FallbackReason::ShaderFailed(GraphicsError::ShaderCompile { .. }))
        ));
        let probe = surface.host().probe().clone();
        assert_eq!(probe.live_objects(), 0);
        assert_eq!(surface.host_mut().run_deferred(), 1);
        assert!(probe.is_released());
    }

    #[test]
    fn init_hook_error_falls_back() {
        let config = SurfaceConfig::new(FRAG).on_init(|_| {
            Err(GraphicsError::ResourceCreation(crate::gpu::ResourceKind::Texture))
        });
        let mut surface = RenderSurface::new(TestHost::default(), config);
        assert_eq!(surface.mount(), SurfaceState::Fallback);
        assert_eq!(surface.host().probe().live_objects(), 0);
    }

    #[test]
    fn sustained_slow_frames_downgrade_once() {
        let bus = DowngradeBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _subscription = bus.subscribe(move |event| sink.borrow_mut().push(event.avg_fps));

        let config = SurfaceConfig::new(FRAG)
            .monitor(PerformanceOptions {
                fps_threshold: 55.0,
                sample_size: 10,
            })
            .downgrade_bus(bus);
        let mut surface = RenderSurface::new(TestHost::default(), config);
        let _ = surface.mount();
        assert_eq!(run_frames(&mut surface, 50, 50.0), 10);

        assert_eq!(surface.state(), SurfaceState::Fallback);
        assert_eq!(
            surface.fallback_reason(),
            Some(&FallbackReason::PerformanceDowngrade { avg_fps: 20.0 })
        );
        assert_eq!(*seen.borrow(), vec![20.0]);
        // The triggering frame is not drawn.
        assert_eq!(surface.host().probe().draw_calls(), 9);
        assert!(!surface.host().frame_pending);
    }

    #[test]
    fn context_loss_and_recovery_rebuild_everything() {
        let inits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&inits);
        let config = SurfaceConfig::new(FRAG).uniforms(["u_noise"]).on_init(move |ctx| {
            counter.set(counter.get() + 1);
            let desc = TextureDesc { width: 2, height: 2 };
            let _ = ctx.upload_texture(desc, &[255; 16], 0, "u_noise")?;
            Ok(())
        });
        let mut surface = RenderSurface::new(TestHost::default(), config);
        let _ = surface.mount();
        let _ = run_frames(&mut surface, 5, 16.0);
        assert_eq!(surface.monitor().window_len(), 5);

        surface.host().probe().lose();
        surface.context_lost();
        assert_eq!(surface.state(), SurfaceState::ContextLost);
        assert!(!surface.host().frame_pending);
        surface.tick(1_000.0);

        surface.context_restored();
        assert_eq!(surface.state(), SurfaceState::Recovering);
        assert_eq!(surface.host().recovery_delay, Some(RECOVERY_DELAY_MS));

        surface.host_mut().now = 5_000.0;
        assert_eq!(surface.recover(), SurfaceState::Running);
        assert_eq!(inits.get(), 2);
        assert_eq!(surface.monitor().window_len(), 0);
        assert_eq!(surface.host().probes.len(), 2);
        let fresh = surface.host().probe().clone();
        assert_eq!(fresh.live_textures(), 1);
        assert_eq!(fresh.uniform("u_noise"), Some(UniformValue::Int(0)));

        assert_eq!(run_frames(&mut surface, 1, 16.0), 1);
        assert!((float(fresh.uniform("u_time")) - 0.016).abs() < 1e-4);
    }

    #[test]
    fn failed_recovery_falls_back() {
        let mut surface = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        let _ = surface.mount();
        surface.context_lost();
        surface.context_restored();
        surface.host_mut().unsupported = true;
        assert_eq!(surface.recover(), SurfaceState::Fallback);
        assert_eq!(
            surface.fallback_reason(),
            Some(&FallbackReason::RecoveryFailed(None))
        );
    }

    #[test]
    fn unmount_is_idempotent_and_stops_frames() {
        let mut surface = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        let _ = surface.mount();
        let _ = run_frames(&mut surface, 2, 16.0);
        let probe = surface.host().probe().clone();

        surface.unmount();
        surface.unmount();
        assert_eq!(surface.state(), SurfaceState::Disposed);
        assert!(surface.host().detached);
        assert!(!surface.host().frame_pending);
        assert_eq!(probe.live_objects(), 0);
        assert!(!probe.is_released());

        surface.tick(10_000.0);
        assert_eq!(probe.draw_calls(), 2);
        assert_eq!(surface.host_mut().run_deferred(), 1);
        assert!(probe.is_released());
    }

    #[test]
    fn immediate_remount_keeps_the_target_alive() {
        let mut first = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        let _ = first.mount();
        let old_probe = first.host().probe().clone();
        first.unmount();

        let host = TestHost::sharing_target(first.host());
        let mut second = RenderSurface::new(host, SurfaceConfig::new(FRAG));
        assert_eq!(second.mount(), SurfaceState::Running);

        assert_eq!(first.host_mut().run_deferred(), 0);
        assert!(!old_probe.is_released());
    }

    #[test]
    fn eviction_and_rejection_through_the_registry() {
        let clock = ManualClock::starting_at(10_000);
        let registry = ResourceRegistry::with_clock(
            RegistryConfig {
                max_instances: 1,
                ..RegistryConfig::default()
            },
            clock.clone(),
        )
        .into_shared();

        let mut low = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            low.mount_admitted(&registry, ShaderPriority::Low.value()),
            SurfaceState::Running
        );
        clock.advance(5_000);

        let mut high = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            high.mount_admitted(&registry, ShaderPriority::High.value()),
            SurfaceState::Running
        );
        assert!(low.admission().is_some_and(Admission::is_evicted));
        let _ = run_frames(&mut low, 1, 16.0);
        assert_eq!(low.fallback_reason(), Some(&FallbackReason::Evicted));
        assert_eq!(low.host().probe().live_objects(), 0);
        assert_eq!(registry.borrow().active_count(), 1);

        let mut late = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            late.mount_admitted(&registry, ShaderPriority::Medium.value()),
            SurfaceState::Fallback
        );
        assert_eq!(late.fallback_reason(), Some(&FallbackReason::Rejected));
        assert!(late.host().probes.is_empty());

        high.unmount();
        assert_eq!(registry.borrow().active_count(), 0);
    }

    #[test]
    fn eviction_during_context_loss_skips_recovery() {
        let clock = ManualClock::starting_at(10_000);
        let registry = ResourceRegistry::with_clock(
            RegistryConfig {
                max_instances: 1,
                ..RegistryConfig::default()
            },
            clock.clone(),
        )
        .into_shared();

        // Evicted while lost: the restore never schedules a rebuild.
        let mut lost = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            lost.mount_admitted(&registry, ShaderPriority::Low.value()),
            SurfaceState::Running
        );
        lost.context_lost();
        clock.advance(5_000);
        let mut high = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            high.mount_admitted(&registry, ShaderPriority::High.value()),
            SurfaceState::Running
        );
        lost.context_restored();
        assert_eq!(lost.state(), SurfaceState::Fallback);
        assert_eq!(lost.fallback_reason(), Some(&FallbackReason::Evicted));
        assert_eq!(lost.host().recovery_delay, None);
        assert_eq!(lost.host().probes.len(), 1);
        high.unmount();

        // Evicted while the rebuild is pending: no fresh context is acquired.
        let mut pending = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            pending.mount_admitted(&registry, ShaderPriority::Low.value()),
            SurfaceState::Running
        );
        pending.context_lost();
        pending.context_restored();
        assert_eq!(pending.state(), SurfaceState::Recovering);
        clock.advance(5_000);
        let mut high = RenderSurface::new(TestHost::default(), SurfaceConfig::new(FRAG));
        assert_eq!(
            high.mount_admitted(&registry, ShaderPriority::High.value()),
            SurfaceState::Running
        );
        assert_eq!(pending.recover(), SurfaceState::Fallback);
        assert_eq!(pending.fallback_reason(), Some(&FallbackReason::Evicted));
        assert_eq!(pending.host().probes.len(), 1);
        assert_eq!(pending.host().recovery_delay, None);
        assert_eq!(registry.borrow().active_count(), 1);
    }

    #[test]
    fn pointer_reaches_frame_hook_in_backing_pixels() {
        let seen = Rc::new(Cell::new(Vec2::ZERO));
        let sink = Rc::clone(&seen);
        let config = SurfaceConfig::new(FRAG)
            .track_pointer(true)
            .on_frame(move |frame| {
                sink.set(frame.pointer);
                frame.set_uniform("u_mouse", frame.pointer);
            });
        let mut surface = RenderSurface::new(TestHost::default(), config);
        surface.resize(100.0, 50.0, 2.0);
        let _ = surface.mount();
        surface.set_pointer(10.0, 10.0);
        let _ = run_frames(&mut surface, 1, 16.0);
        assert_eq!(seen.get(), Vec2::new(20.0, 80.0));
        assert_eq!(
            surface.host().probe().uniform("u_mouse"),
            Some(UniformValue::Vec2(Vec2::new(20.0, 80.0)))
        );
    }

    #[test]
    fn pointer_ignored_without_tracking() {
        let seen = Rc::new(Cell::new(Vec2::ONE));
        let sink = Rc::clone(&seen);
        let config = SurfaceConfig::new(FRAG).on_frame(move |frame| sink.set(frame.pointer));
        let mut surface = RenderSurface::new(TestHost::default(), config);
        let _ = surface.mount();
        surface.set_pointer(10.0, 10.0);
        let _ = run_frames(&mut surface, 1, 16.0);
        assert_eq!(seen.get(), Vec2::ZERO);
    }

    #[test]
    fn reduced_motion_freezes_time() {
        let host = TestHost {
            reduced_motion: true,
            ..TestHost::default()
        };
        let mut surface = RenderSurface::new(host, SurfaceConfig::new(FRAG).speed(3.0));
        let _ = surface.mount();
        let _ = run_frames(&mut surface, 4, 16.0);
        assert_eq!(float(surface.host().probe().uniform("u_time")), 0.0);
        assert_eq!(surface.host().probe().draw_calls(), 4);
    }

    #[test]
    fn resize_works_in_fallback_but_not_after_disposal() {
        let host = TestHost {
            unsupported: true,
            ..TestHost::default()
        };
        let mut surface = RenderSurface::new(host, SurfaceConfig::new(FRAG));
        let _ = surface.mount();
        surface.resize(10.0, 10.0, 1.5);
        assert_eq!(surface.backing_size(), (15, 15));
        surface.unmount();
        surface.resize(20.0, 20.0, 1.0);
        assert_eq!(surface.backing_size(), (15, 15));
    }
}
