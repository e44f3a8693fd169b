//! Program linkage, the fullscreen quad, and guarded disposal.

use super::context::{
    BufferHandle, GraphicsApi, GraphicsContext, GraphicsError, ProgramHandle,
    ShaderStage, TextureHandle,
};
use super::uniform::UniformTable;

/// Fullscreen-quad vertex shader for GLSL ES 3.00.
pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../../assets/shaders/fullscreen.vert");

/// Fullscreen-quad vertex shader for GLSL ES 1.00.
pub const DEFAULT_VERTEX_SHADER_V1: &str =
    include_str!("../../assets/shaders/fullscreen_v1.vert");

/// Attribute the quad buffer feeds.
pub const POSITION_ATTRIBUTE: &str = "a_position";

/// Two clip-space triangles covering `[-1, 1]²`.
pub const FULLSCREEN_QUAD: [f32; 12] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    -1.0, 1.0, //
    -1.0, 1.0, //
    1.0, -1.0, //
    1.0, 1.0, //
];

/// Vertices in [`FULLSCREEN_QUAD`].
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Pick the vertex/fragment pair to compile for `api`.
///
/// A custom vertex shader is used verbatim. On WebGL 1 the default vertex
/// shader is the GLSL ES 1.00 one and a leading `#version 300 es` directive
/// is stripped from the fragment source.
pub fn sources_for_api<'a>(
    api: GraphicsApi,
    fragment: &'a str,
    custom_vertex: Option<&'a str>,
) -> (&'a str, &'a str) {
    match api {
        GraphicsApi::WebGl2 => {
            (custom_vertex.unwrap_or(DEFAULT_VERTEX_SHADER), fragment)
        }
        GraphicsApi::WebGl1 => (
            custom_vertex.unwrap_or(DEFAULT_VERTEX_SHADER_V1),
            strip_version_directive(fragment),
        ),
    }
}

/// Remove a `#version 300 es` line (and the whitespace after it) if it is
/// the first non-blank line of `source`.
pub fn strip_version_directive(source: &str) -> &str {
    let trimmed = source.trim_start();
    let Some(rest) = trimmed.strip_prefix("#version") else {
        return source;
    };
    let mut words = rest.split_whitespace();
    if words.next() != Some("300") || words.next() != Some("es") {
        return source;
    }
    let after_es = rest
        .find("es")
        .map_or(rest, |at| &rest[at + "es".len()..]);
    after_es.trim_start()
}

/// Compile both stages and link them. The intermediate shader objects are
/// deleted whether or not linking succeeds.
///
/// # Errors
///
/// Propagates compile, link, and allocation failures.
pub fn create_program(
    gl: &mut dyn GraphicsContext,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<ProgramHandle, GraphicsError> {
    let vs = gl.compile_shader(ShaderStage::Vertex, vertex_source)?;
    let fs = match gl.compile_shader(ShaderStage::Fragment, fragment_source) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(e);
        }
    };
    let linked = gl.link_program(vs, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);
    linked
}

/// Upload [`FULLSCREEN_QUAD`] and bind it to [`POSITION_ATTRIBUTE`].
///
/// # Errors
///
/// [`GraphicsError::ResourceCreation`] if the buffer cannot be allocated.
pub fn create_fullscreen_quad(
    gl: &mut dyn GraphicsContext,
    program: ProgramHandle,
) -> Result<BufferHandle, GraphicsError> {
    gl.create_vertex_buffer(program, POSITION_ATTRIBUTE, &FULLSCREEN_QUAD, 2)
}

/// Everything one surface allocated in one context.
#[derive(Debug, Default)]
pub struct GpuSession {
    /// Linked program.
    pub program: Option<ProgramHandle>,
    /// Quad buffer.
    pub buffer: Option<BufferHandle>,
    /// Textures uploaded by init hooks.
    pub textures: Vec<TextureHandle>,
    /// Resolved uniforms.
    pub uniforms: UniformTable,
}

impl GpuSession {
    /// Link the program, build the quad, and resolve `uniform_names`.
    /// Anything allocated before a failure is released again.
    ///
    /// # Errors
    ///
    /// The first compile, link, or allocation failure.
    pub fn build(
        gl: &mut dyn GraphicsContext,
        vertex_source: &str,
        fragment_source: &str,
        uniform_names: &[String],
    ) -> Result<Self, GraphicsError> {
        let program = create_program(gl, vertex_source, fragment_source)?;
        gl.use_program(program);
        let buffer = match create_fullscreen_quad(gl, program) {
            Ok(buffer) => buffer,
            Err(e) => {
                gl.delete_program(program);
                return Err(e);
            }
        };
        let uniforms = UniformTable::resolve(
            gl,
            program,
            uniform_names.iter().map(String::as_str),
        );
        Ok(Self {
            program: Some(program),
            buffer: Some(buffer),
            textures: Vec::new(),
            uniforms,
        })
    }

    /// Release every handle still held. Safe to call repeatedly.
    pub fn dispose(&mut self, gl: &mut dyn GraphicsContext) {
        if let Some(program) = self.program.take() {
            gl.delete_program(program);
        }
        if let Some(buffer) = self.buffer.take() {
            gl.delete_buffer(buffer);
        }
        for texture in self.textures.drain(..) {
            gl.delete_texture(texture);
        }
    }

    /// Whether nothing is held.
    pub fn is_released(&self) -> bool {
        self.program.is_none() && self.buffer.is_none() && self.textures.is_empty()
    }
}
