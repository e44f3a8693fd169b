use crate::gpu::{GraphicsError, TextureDesc};
use crate::noise::{self, NoiseOptions};
use crate::surface::{Fallback, InitContext, SurfaceConfig};
use crate::theme::{css_rgb, MeshGradientParams};

/// Fragment shader source.
pub const FRAGMENT_SHADER: &str =
    include_str!("../../assets/shaders/mesh_gradient.frag");

/// Texture unit holding the noise field.
pub const NOISE_UNIT: u32 = 0;

/// Side length of the generated noise texture.
pub const NOISE_SIZE: u32 = 512;

const UNIFORMS: [&str; 6] = [
    "u_color1",
    "u_color2",
    "u_color3",
    "u_speed",
    "u_distortion",
    "u_noise",
];

/// Three-colour gradient warped by a baked noise texture.
pub fn config(params: MeshGradientParams) -> SurfaceConfig {
    SurfaceConfig::new(FRAGMENT_SHADER)
        .uniforms(UNIFORMS)
        .speed(params.speed)
        .fallback(Fallback::Css(css_fallback(&params)))
        .on_init(move |init| upload_noise(init, params.seed))
        .on_frame(move |frame| {
            frame.set_uniform("u_color1", params.color1);
            frame.set_uniform("u_color2", params.color2);
            frame.set_uniform("u_color3", params.color3);
            frame.set_uniform("u_speed", params.speed);
            frame.set_uniform("u_distortion", params.distortion);
        })
}

/// Static 135° gradient through the three colours.
pub fn css_fallback(params: &MeshGradientParams) -> String {
    let [a, b, c] =
        [params.color1, params.color2, params.color3].map(css_rgb);
    format!("linear-gradient(135deg, rgb({a}), rgb({b}), rgb({c}))")
}

fn upload_noise(
    init: &mut InitContext<'_>,
    seed: u32,
) -> Result<(), GraphicsError> {
    let texture = noise::generate(&NoiseOptions {
        width: NOISE_SIZE,
        height: NOISE_SIZE,
        seed,
        ..NoiseOptions::default()
    });
    let desc = TextureDesc {
        width: texture.width,
        height: texture.height,
    };
    let _ = init.upload_texture(desc, &texture.data, NOISE_UNIT, "u_noise")?;
    log::debug!("mesh gradient noise uploaded (seed {seed})");
    Ok(())
}
