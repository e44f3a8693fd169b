use std::fmt;

use glam::Vec2;

use crate::gpu::{
    GpuSession, GraphicsApi, GraphicsContext, GraphicsError, ProgramHandle,
    TextureDesc, TextureHandle, UniformTable, UniformValue,
};
use crate::monitor::{DowngradeBus, PerformanceOptions};

/// One-time setup hook, re-run after every context restoration.
pub type InitHook =
    Box<dyn FnMut(&mut InitContext<'_>) -> Result<(), GraphicsError>>;

/// Per-frame hook for effect-specific uniforms.
pub type FrameHook = Box<dyn FnMut(&mut FrameContext<'_>)>;

/// What the host shows instead of the canvas in fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Fallback {
    /// A CSS `background` value.
    Css(String),
    /// Nothing.
    #[default]
    None,
}

/// Everything a [`RenderSurface`](super::RenderSurface) needs to draw.
pub struct SurfaceConfig {
    /// Fragment shader source (GLSL ES 3.00; downgraded for WebGL 1).
    pub fragment_shader: String,
    /// Custom vertex shader. The fullscreen-quad shader when `None`.
    pub vertex_shader: Option<String>,
    /// Uniforms to resolve besides `u_time`, `u_resolution`, `u_mouse`.
    pub uniform_names: Vec<String>,
    /// Static content shown in fallback.
    pub fallback: Fallback,
    /// Animation speed multiplier; `0` pauses.
    pub speed: f32,
    /// Frame-rate monitor settings.
    pub monitor: PerformanceOptions,
    /// Shared downgrade bus; each surface gets a private one otherwise.
    pub downgrade_bus: Option<DowngradeBus>,
    /// Whether pointer input reaches frame hooks.
    pub track_pointer: bool,
    pub(super) on_init: Option<InitHook>,
    pub(super) on_frame: Option<FrameHook>,
}

impl SurfaceConfig {
    /// Config for `fragment_shader` with defaults everywhere else.
    pub fn new(fragment_shader: impl Into<String>) -> Self {
        Self {
            fragment_shader: fragment_shader.into(),
            vertex_shader: None,
            uniform_names: Vec::new(),
            fallback: Fallback::None,
            speed: 1.0,
            monitor: PerformanceOptions::default(),
            downgrade_bus: None,
            track_pointer: false,
            on_init: None,
            on_frame: None,
        }
    }

    /// Use a custom vertex shader.
    #[must_use]
    pub fn vertex_shader(mut self, source: impl Into<String>) -> Self {
        self.vertex_shader = Some(source.into());
        self
    }

    /// Resolve these uniforms in addition to the built-ins.
    #[must_use]
    pub fn uniforms<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.uniform_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the fallback content.
    #[must_use]
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the animation speed multiplier.
    #[must_use]
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the frame-rate monitor options.
    #[must_use]
    pub fn monitor(mut self, options: PerformanceOptions) -> Self {
        self.monitor = options;
        self
    }

    /// Report downgrades on `bus`.
    #[must_use]
    pub fn downgrade_bus(mut self, bus: DowngradeBus) -> Self {
        self.downgrade_bus = Some(bus);
        self
    }

    /// Forward pointer positions to frame hooks.
    #[must_use]
    pub fn track_pointer(mut self, enabled: bool) -> Self {
        self.track_pointer = enabled;
        self
    }

    /// Install the one-time setup hook.
    #[must_use]
    pub fn on_init(
        mut self,
        hook: impl FnMut(&mut InitContext<'_>) -> Result<(), GraphicsError> + 'static,
    ) -> Self {
        self.on_init = Some(Box::new(hook));
        self
    }

    /// Install the per-frame hook.
    #[must_use]
    pub fn on_frame(
        mut self,
        hook: impl FnMut(&mut FrameContext<'_>) + 'static,
    ) -> Self {
        self.on_frame = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for SurfaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceConfig")
            .field("fragment_shader_len", &self.fragment_shader.len())
            .field("custom_vertex_shader", &self.vertex_shader.is_some())
            .field("uniform_names", &self.uniform_names)
            .field("fallback", &self.fallback)
            .field("speed", &self.speed)
            .field("monitor", &self.monitor)
            .field("track_pointer", &self.track_pointer)
            .field("on_init", &self.on_init.is_some())
            .field("on_frame", &self.on_frame.is_some())
            .finish_non_exhaustive()
    }
}

/// Handed to the init hook right after the program is built.
pub struct InitContext<'a> {
    pub(super) gl: &'a mut dyn GraphicsContext,
    pub(super) program: ProgramHandle,
    pub(super) session: &'a mut GpuSession,
}

impl InitContext<'_> {
    /// The raw context.
    pub fn gl(&mut self) -> &mut dyn GraphicsContext {
        &mut *self.gl
    }

    /// API family of the context.
    pub fn api(&self) -> GraphicsApi {
        self.gl.api()
    }

    /// The linked program, already current.
    pub const fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Resolved uniforms.
    pub fn uniforms(&self) -> &UniformTable {
        &self.session.uniforms
    }

    /// Write a uniform. Unknown names are ignored.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.session.uniforms.set(&mut *self.gl, name, value);
    }

    /// Upload an RGBA8 texture, bind it to `unit`, and point the sampler
    /// uniform `sampler` at that unit. The texture is released with the
    /// rest of the session.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ResourceCreation`] if the upload fails.
    pub fn upload_texture(
        &mut self,
        desc: TextureDesc,
        rgba: &[u8],
        unit: u32,
        sampler: &str,
    ) -> Result<TextureHandle, GraphicsError> {
        let texture = self.gl.create_texture(desc, rgba)?;
        self.session.textures.push(texture);
        self.gl.bind_texture(unit, texture);
        let unit = i32::try_from(unit).unwrap_or(i32::MAX);
        self.session.uniforms.set(&mut *self.gl, sampler, unit);
        Ok(texture)
    }
}

/// Handed to the frame hook once per drawn frame.
pub struct FrameContext<'a> {
    pub(super) gl: &'a mut dyn GraphicsContext,
    pub(super) uniforms: &'a UniformTable,
    /// Animation time in seconds, already scaled by speed.
    pub time: f32,
    /// Time since the previous frame in seconds.
    pub delta_time: f32,
    /// Drawing-buffer size in physical pixels.
    pub resolution: Vec2,
    /// Pointer in physical pixels with Y pointing up, or zero when pointer
    /// tracking is off or no pointer was seen yet.
    pub pointer: Vec2,
}

impl FrameContext<'_> {
    /// The raw context.
    pub fn gl(&mut self) -> &mut dyn GraphicsContext {
        &mut *self.gl
    }

    /// Resolved uniforms.
    pub const fn uniforms(&self) -> &UniformTable {
        self.uniforms
    }

    /// Write a uniform. Unknown names are ignored.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.uniforms.set(&mut *self.gl, name, value);
    }
}
