//! GPU abstraction for fullscreen-quad effects.
//!
//! Surfaces talk to the GPU only through the [`GraphicsContext`] capability
//! trait. The browser build implements it over WebGL 2 and WebGL 1; native
//! tooling and tests use [`HeadlessContext`].

/// Capability trait, opaque handles, and context attributes.
pub mod context;
/// GPU tier classification and per-tier budgets.
pub mod device;
/// Recording context with failure injection.
pub mod headless;
/// Program linkage, the fullscreen quad, and session disposal.
pub mod program;
/// Uniform values and resolved location tables.
pub mod uniform;

pub use context::{
    BufferHandle, ContextAttributes, GraphicsApi, GraphicsContext,
    GraphicsError, PowerPreference, ProgramHandle, ResourceKind, ShaderHandle,
    ShaderStage, TextureDesc, TextureHandle, UniformLocation,
};
pub use device::{
    classify_gpu, recommended_max_shaders, DeviceCapabilities, GpuTier,
};
pub use headless::{HeadlessContext, HeadlessOptions, HeadlessProbe};
pub use program::{
    create_fullscreen_quad, create_program, sources_for_api, GpuSession,
    DEFAULT_VERTEX_SHADER, DEFAULT_VERTEX_SHADER_V1, FULLSCREEN_QUAD,
    POSITION_ATTRIBUTE, QUAD_VERTEX_COUNT,
};
pub use uniform::{uniform_names, UniformTable, UniformValue, BUILTIN_UNIFORMS};

/// Resolve `names` on `program`. Names the program does not expose are
/// left out of the table.
pub fn resolve_uniforms<S: AsRef<str>>(
    gl: &mut dyn GraphicsContext,
    program: ProgramHandle,
    names: &[S],
) -> UniformTable {
    UniformTable::resolve(gl, program, names.iter().map(AsRef::as_ref))
}
