//! Built-in effects.
//!
//! Each effect turns its typed theme parameters into a [`SurfaceConfig`]:
//! fragment shader, extra uniforms, per-frame uniform writes, and a static
//! CSS fallback where one makes sense.

/// Floating light source, optionally pointer-driven.
pub mod glow_orb;
/// Noise-warped three-colour gradient.
pub mod mesh_gradient;
/// Animated film grain.
pub mod noise_grain;

use crate::surface::{Fallback, SurfaceConfig};
use crate::theme::{SectionConfig, SectionFallback, ShaderParams};

/// Surface configuration for a theme section, or `None` when the section
/// runs no shader. A CSS fallback on the section replaces the effect's own.
pub fn surface_config(section: &SectionConfig) -> Option<SurfaceConfig> {
    let config = match section.params {
        ShaderParams::MeshGradient(params) => mesh_gradient::config(params),
        ShaderParams::NoiseGrain(params) => noise_grain::config(params),
        ShaderParams::GlowOrb(params) => glow_orb::config(params),
        ShaderParams::None => return None,
    };
    Some(match &section.fallback {
        SectionFallback::Css { value } => {
            config.fallback(Fallback::Css(value.clone()))
        }
        SectionFallback::None => config,
    })
}

/// Static content for a section that cannot run its effect, including
/// sections with shader `none`.
pub fn section_fallback(section: &SectionConfig) -> Fallback {
    if let SectionFallback::Css { value } = &section.fallback {
        return Fallback::Css(value.clone());
    }
    match section.params {
        ShaderParams::MeshGradient(p) => {
            Fallback::Css(mesh_gradient::css_fallback(&p))
        }
        ShaderParams::GlowOrb(p) => Fallback::Css(glow_orb::css_fallback(&p)),
        ShaderParams::NoiseGrain(_) | ShaderParams::None => Fallback::None,
    }
}

#[cfg(test)]
pub(crate) mod harness {
    use crate::gpu::{
        ContextAttributes, HeadlessContext, HeadlessOptions, HeadlessProbe,
    };
    use crate::surface::{
        DeferredRelease, EpochCounter, Fallback, RenderSurface, SurfaceConfig,
        SurfaceHost,
    };

    const FRAME_MS: f64 = 16.0;

    #[derive(Default)]
    pub struct Host {
        now: f64,
        frame_pending: bool,
        epoch: EpochCounter,
        probe: Option<HeadlessProbe>,
    }

    impl SurfaceHost for Host {
        type Context = HeadlessContext;

        fn acquire_context(
            &mut self,
            _attributes: &ContextAttributes,
        ) -> Option<HeadlessContext> {
            let gl = HeadlessContext::new(HeadlessOptions::default());
            self.probe = Some(gl.probe());
            Some(gl)
        }

        fn now_ms(&self) -> f64 {
            self.now
        }

        fn request_frame(&mut self) {
            self.frame_pending = true;
        }

        fn cancel_frame(&mut self) {
            self.frame_pending = false;
        }

        fn prefers_reduced_motion(&self) -> bool {
            false
        }

        fn schedule_recovery(&mut self, _delay_ms: u32) {}

        fn cancel_recovery(&mut self) {}

        fn defer_release(&mut self, release: DeferredRelease<HeadlessContext>) {
            let _ = release.run();
        }

        fn epoch(&self) -> &EpochCounter {
            &self.epoch
        }

        fn set_backing_size(&mut self, _width: u32, _height: u32) {}

        fn show_fallback(&mut self, _content: &Fallback) {}

        fn detach(&mut self) {}
    }

    /// Mount `config` on a fresh headless context.
    pub fn mount(
        config: SurfaceConfig,
    ) -> (RenderSurface<Host>, HeadlessProbe) {
        let mut surface = RenderSurface::new(Host::default(), config);
        let _ = surface.mount();
        let probe = surface.host().probe.clone().unwrap();
        (surface, probe)
    }

    /// Grant up to `count` pending frames.
    pub fn run_frames(surface: &mut RenderSurface<Host>, count: usize) -> usize {
        let mut ran = 0;
        while ran < count && surface.host().frame_pending {
            let host = surface.host_mut();
            host.frame_pending = false;
            host.now += FRAME_MS;
            let now = host.now;
            surface.tick(now);
            ran += 1;
        }
        ran
    }
}
