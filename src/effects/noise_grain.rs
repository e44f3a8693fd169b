use crate::surface::SurfaceConfig;
use crate::theme::NoiseGrainParams;

/// Fragment shader source.
pub const FRAGMENT_SHADER: &str =
    include_str!("../../assets/shaders/noise_grain.frag");

const UNIFORMS: [&str; 4] = ["u_color", "u_density", "u_speed", "u_opacity"];

/// Film-grain overlay. Has no fallback of its own; a static page without
/// grain is the natural degradation.
pub fn config(params: NoiseGrainParams) -> SurfaceConfig {
    SurfaceConfig::new(FRAGMENT_SHADER)
        .uniforms(UNIFORMS)
        .speed(params.speed)
        .on_frame(move |frame| {
            frame.set_uniform("u_color", params.color);
            frame.set_uniform("u_density", params.density);
            frame.set_uniform("u_speed", params.speed);
            frame.set_uniform("u_opacity", params.opacity);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::harness;
    use crate::gpu::UniformValue;
    use crate::surface::Fallback;

    #[test]
    fn static_grain_keeps_time_at_zero() {
        let (mut surface, probe) = harness::mount(config(NoiseGrainParams::default()));
        assert_eq!(harness::run_frames(&mut surface, 3), 3);
        assert_eq!(probe.uniform("u_time"), Some(UniformValue::Float(0.0)));
        assert_eq!(probe.uniform("u_opacity"), Some(UniformValue::Float(0.15)));
        assert_eq!(probe.uniform("u_density"), Some(UniformValue::Float(0.05)));
        assert_eq!(probe.live_textures(), 0);
    }

    #[test]
    fn moving_grain_advances_time() {
        let params = NoiseGrainParams {
            speed: 2.0,
            ..NoiseGrainParams::default()
        };
        let (mut surface, probe) = harness::mount(config(params));
        let _ = harness::run_frames(&mut surface, 2);
        let Some(UniformValue::Float(time)) = probe.uniform("u_time") else {
            panic!("u_time not written");
        };
        assert!(time > 0.0);
    }

    #[test]
    fn no_default_fallback() {
        assert_eq!(config(NoiseGrainParams::default()).fallback, Fallback::None);
    }
}
