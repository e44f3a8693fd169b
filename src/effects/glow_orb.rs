use crate::surface::{Fallback, SurfaceConfig};
use crate::theme::{css_rgb, GlowOrbParams};

/// Fragment shader source.
pub const FRAGMENT_SHADER: &str =
    include_str!("../../assets/shaders/glow_orb.frag");

const UNIFORMS: [&str; 4] = ["u_glowColor", "u_intensity", "u_radius", "u_speed"];

/// Soft orb that drifts around the centre or follows the pointer.
///
/// `u_mouse` stays at the origin while tracking is off or before the first
/// pointer event; the shader reads that as "use the centre".
pub fn config(params: GlowOrbParams) -> SurfaceConfig {
    SurfaceConfig::new(FRAGMENT_SHADER)
        .uniforms(UNIFORMS)
        .speed(params.speed)
        .track_pointer(params.track_mouse)
        .fallback(Fallback::Css(css_fallback(&params)))
        .on_frame(move |frame| {
            frame.set_uniform("u_glowColor", params.glow_color);
            frame.set_uniform("u_intensity", params.intensity);
            frame.set_uniform("u_radius", params.radius);
            frame.set_uniform("u_speed", params.speed);
            let pointer = frame.pointer;
            frame.set_uniform("u_mouse", pointer);
        })
}

/// Static radial glow at the centre.
pub fn css_fallback(params: &GlowOrbParams) -> String {
    format!(
        "radial-gradient(circle at 50% 50%, rgba({},{}), transparent 70%)",
        css_rgb(params.glow_color),
        params.intensity
    )
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::effects::harness;
    use crate::gpu::UniformValue;

    #[test]
    fn follows_the_pointer() {
        let (mut surface, probe) = harness::mount(config(GlowOrbParams::default()));
        surface.resize(100.0, 50.0, 2.0);
        surface.set_pointer(10.0, 20.0);
        let _ = harness::run_frames(&mut surface, 1);
        assert_eq!(
            probe.uniform("u_mouse"),
            Some(UniformValue::Vec2(Vec2::new(20.0, 60.0)))
        );
        assert_eq!(probe.uniform("u_radius"), Some(UniformValue::Float(300.0)));
    }

    #[test]
    fn centred_when_tracking_is_off() {
        let params = GlowOrbParams {
            track_mouse: false,
            ..GlowOrbParams::default()
        };
        let (mut surface, probe) = harness::mount(config(params));
        surface.resize(100.0, 50.0, 1.0);
        surface.set_pointer(10.0, 20.0);
        let _ = harness::run_frames(&mut surface, 1);
        assert_eq!(probe.uniform("u_mouse"), Some(UniformValue::Vec2(Vec2::ZERO)));
    }

    #[test]
    fn fallback_uses_intensity_as_alpha() {
        let params = GlowOrbParams {
            glow_color: [1.0, 0.0, 0.0],
            intensity: 0.4,
            ..GlowOrbParams::default()
        };
        assert_eq!(
            css_fallback(&params),
            "radial-gradient(circle at 50% 50%, rgba(255,0,0,0.4), transparent 70%)"
        );
    }
}
