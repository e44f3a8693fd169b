use std::fmt;

use super::uniform::UniformValue;

/// Which API family a context speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsApi {
    /// WebGL 2 / GLSL ES 3.00.
    WebGl2,
    /// WebGL 1 / GLSL ES 1.00.
    WebGl1,
}

impl GraphicsApi {
    /// Whether shaders must be written in GLSL ES 3.00.
    pub fn is_webgl2(self) -> bool {
        matches!(self, Self::WebGl2)
    }
}

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Kind of GPU object whose allocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Shader object.
    Shader,
    /// Program object.
    Program,
    /// Vertex buffer.
    Buffer,
    /// Texture.
    Texture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shader => f.write_str("shader"),
            Self::Program => f.write_str("program"),
            Self::Buffer => f.write_str("buffer"),
            Self::Texture => f.write_str("texture"),
        }
    }
}

/// Errors raised by a [`GraphicsContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Shader source failed to compile; `log` is the driver's info log.
    ShaderCompile {
        /// Stage that failed.
        stage: ShaderStage,
        /// Driver diagnostic text.
        log: String,
    },
    /// Program failed to link; `log` is the driver's info log.
    ProgramLink {
        /// Driver diagnostic text.
        log: String,
    },
    /// The driver returned a null handle.
    ResourceCreation(ResourceKind),
    /// The context was lost mid-operation.
    ContextLost,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShaderCompile { stage, log } => {
                write!(f, "{stage} shader compile error:\n{log}")
            }
            Self::ProgramLink { log } => {
                write!(f, "program link error:\n{log}")
            }
            Self::ResourceCreation(kind) => {
                write!(f, "failed to create {kind}")
            }
            Self::ContextLost => f.write_str("graphics context lost"),
        }
    }
}

impl std::error::Error for GraphicsError {}

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);
    };
}

handle!(
    /// Opaque compiled-shader handle.
    ShaderHandle
);
handle!(
    /// Opaque linked-program handle.
    ProgramHandle
);
handle!(
    /// Opaque vertex-buffer handle.
    BufferHandle
);
handle!(
    /// Opaque texture handle.
    TextureHandle
);
handle!(
    /// Opaque uniform-location handle, valid for the program it came from.
    UniformLocation
);

/// Power preference hint for context creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    /// Let the platform decide.
    Default,
    /// Prefer the discrete GPU.
    #[default]
    HighPerformance,
    /// Prefer the integrated GPU.
    LowPower,
}

/// Attributes requested when acquiring a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAttributes {
    /// Keep an alpha channel so effects can overlay page content.
    pub alpha: bool,
    /// Multisampling.
    pub antialias: bool,
    /// Depth buffer.
    pub depth: bool,
    /// Stencil buffer.
    pub stencil: bool,
    /// Keep the back buffer between frames.
    pub preserve_drawing_buffer: bool,
    /// GPU selection hint.
    pub power_preference: PowerPreference,
}

impl ContextAttributes {
    /// Smallest footprint: no AA, no depth/stencil, no preserved buffer.
    /// Many of these contexts may be alive at once.
    #[must_use]
    pub const fn conservative() -> Self {
        Self {
            alpha: true,
            antialias: false,
            depth: false,
            stencil: false,
            preserve_drawing_buffer: false,
            power_preference: PowerPreference::HighPerformance,
        }
    }
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Pixel layout of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Capability surface of a fullscreen-quad GPU context.
///
/// Implementations own the platform objects and hand out opaque handles.
/// Deleting an unknown or already deleted handle is a no-op.
pub trait GraphicsContext {
    /// API family of this context.
    fn api(&self) -> GraphicsApi;

    /// Compile `source` for `stage`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ShaderCompile`] with the info log, or
    /// [`GraphicsError::ResourceCreation`] if no shader object could be made.
    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, GraphicsError>;

    /// Link a vertex and fragment shader into a program. The shaders are
    /// detached afterwards; deleting them stays the caller's job.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ProgramLink`] with the info log, or
    /// [`GraphicsError::ResourceCreation`].
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GraphicsError>;

    /// Make `program` current.
    fn use_program(&mut self, program: ProgramHandle);

    /// Upload `data` as a static vertex buffer and bind it to `attribute`
    /// of `program` with `components` floats per vertex.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ResourceCreation`] if no buffer could be made.
    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
        components: u32,
    ) -> Result<BufferHandle, GraphicsError>;

    /// Look up a uniform. `None` if the program does not expose it.
    fn uniform_location(
        &mut self,
        program: ProgramHandle,
        name: &str,
    ) -> Option<UniformLocation>;

    /// Write a uniform on the current program.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Upload an RGBA8 texture with repeat wrapping and linear filtering.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ResourceCreation`] if no texture could be made.
    fn create_texture(
        &mut self,
        desc: TextureDesc,
        rgba: &[u8],
    ) -> Result<TextureHandle, GraphicsError>;

    /// Bind `texture` to texture unit `unit`.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Set the viewport to `(0, 0, width, height)`.
    fn viewport(&mut self, width: u32, height: u32);

    /// Draw `vertex_count` vertices as triangles from the bound buffer.
    fn draw_triangles(&mut self, vertex_count: u32);

    /// Delete a shader object.
    fn delete_shader(&mut self, shader: ShaderHandle);
    /// Delete a program object.
    fn delete_program(&mut self, program: ProgramHandle);
    /// Delete a buffer object.
    fn delete_buffer(&mut self, buffer: BufferHandle);
    /// Delete a texture object.
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Ask the platform to release the underlying context now.
    fn release(&mut self);

    /// Whether the context is currently lost.
    fn is_lost(&self) -> bool;
}
