//! A [`GraphicsContext`] that records calls instead of touching a GPU.
//!
//! Used by native tooling and by tests. Uniform lookups only succeed for
//! names declared with `uniform` in the linked sources, so it behaves like a
//! driver that strips unknown names. Failures can be injected per resource.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::context::{
    BufferHandle, GraphicsApi, GraphicsContext, GraphicsError, ProgramHandle,
    ResourceKind, ShaderHandle, ShaderStage, TextureDesc, TextureHandle,
    UniformLocation,
};
use super::uniform::UniformValue;

/// Behaviour switches for a [`HeadlessContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessOptions {
    /// API family to report.
    pub api: GraphicsApi,
    /// Make every compile of this stage fail.
    pub fail_compile: Option<ShaderStage>,
    /// Make linking fail.
    pub fail_link: bool,
    /// Make buffer allocation fail.
    pub fail_buffer: bool,
    /// Make texture allocation fail.
    pub fail_texture: bool,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            api: GraphicsApi::WebGl2,
            fail_compile: None,
            fail_link: false,
            fail_buffer: false,
            fail_texture: false,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    next_handle: u32,
    shaders: FxHashMap<u32, (ShaderStage, String)>,
    programs: FxHashMap<u32, Vec<String>>,
    buffers: FxHashMap<u32, usize>,
    textures: FxHashMap<u32, TextureDesc>,
    locations: FxHashMap<u32, String>,
    values: FxHashMap<String, UniformValue>,
    last_sources: FxHashMap<&'static str, String>,
    current_program: Option<u32>,
    bound_textures: FxHashMap<u32, u32>,
    viewport: Option<(u32, u32)>,
    draw_calls: u64,
    released: bool,
    lost: bool,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Recording context. See the module docs.
#[derive(Debug)]
pub struct HeadlessContext {
    options: HeadlessOptions,
    state: Rc<RefCell<State>>,
}

/// Read-only view onto a [`HeadlessContext`] that outlives moves of the
/// context itself.
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<State>>,
}

impl HeadlessContext {
    /// Create a context with the given behaviour.
    #[must_use]
    pub fn new(options: HeadlessOptions) -> Self {
        Self {
            options,
            state: Rc::new(RefCell::new(State::default())),
        }
    }

    /// A probe sharing this context's recorded state.
    #[must_use]
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Rc::clone(&self.state),
        }
    }

    fn check_lost(&self) -> Result<(), GraphicsError> {
        if self.state.borrow().lost {
            Err(GraphicsError::ContextLost)
        } else {
            Ok(())
        }
    }
}

fn stage_key(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
    }
}

/// Names declared as `uniform <type> <name>;` in `source`.
fn declared_uniforms(source: &str) -> impl Iterator<Item = &str> {
    source.lines().filter_map(|line| {
        let line = line.trim();
        if !line.starts_with("uniform ") {
            return None;
        }
        line.split_whitespace()
            .last()
            .map(|name| name.trim_end_matches(';'))
    })
}

impl GraphicsContext for HeadlessContext {
    fn api(&self) -> GraphicsApi {
        self.options.api
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, GraphicsError> {
        self.check_lost()?;
        let mut state = self.state.borrow_mut();
        let _ = state
            .last_sources
            .insert(stage_key(stage), source.to_owned());
        if self.options.fail_compile == Some(stage) {
            return Err(GraphicsError::ShaderCompile {
                stage,
                log: format!("ERROR: 0:1: injected {stage} failure"),
            });
        }
        let id = state.next();
        let _ = state.shaders.insert(id, (stage, source.to_owned()));
        Ok(ShaderHandle(id))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GraphicsError> {
        self.check_lost()?;
        if self.options.fail_link {
            return Err(GraphicsError::ProgramLink {
                log: "injected link failure".to_owned(),
            });
        }
        let mut state = self.state.borrow_mut();
        let sources: Vec<String> = [vertex.0, fragment.0]
            .iter()
            .filter_map(|id| state.shaders.get(id).map(|(_, s)| s.clone()))
            .collect();
        if sources.len() != 2 {
            return Err(GraphicsError::ProgramLink {
                log: "attached shader is not compiled".to_owned(),
            });
        }
        let id = state.next();
        let _ = state.programs.insert(id, sources);
        Ok(ProgramHandle(id))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.state.borrow_mut().current_program = Some(program.0);
    }

    fn create_vertex_buffer(
        &mut self,
        _program: ProgramHandle,
        _attribute: &str,
        data: &[f32],
        _components: u32,
    ) -> Result<BufferHandle, GraphicsError> {
        self.check_lost()?;
        if self.options.fail_buffer {
            return Err(GraphicsError::ResourceCreation(ResourceKind::Buffer));
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut state = self.state.borrow_mut();
        let id = state.next();
        let _ = state.buffers.insert(id, bytes.len());
        Ok(BufferHandle(id))
    }

    fn uniform_location(
        &mut self,
        program: ProgramHandle,
        name: &str,
    ) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        let declared = state
            .programs
            .get(&program.0)?
            .iter()
            .any(|src| declared_uniforms(src).any(|n| n == name));
        if !declared {
            return None;
        }
        let id = state.next();
        let _ = state.locations.insert(id, name.to_owned());
        Some(UniformLocation(id))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        if let Some(name) = state.locations.get(&location.0).cloned() {
            let _ = state.values.insert(name, value);
        }
    }

    fn create_texture(
        &mut self,
        desc: TextureDesc,
        rgba: &[u8],
    ) -> Result<TextureHandle, GraphicsError> {
        self.check_lost()?;
        let expected = desc.width as usize * desc.height as usize * 4;
        if self.options.fail_texture || rgba.len() != expected {
            return Err(GraphicsError::ResourceCreation(ResourceKind::Texture));
        }
        let mut state = self.state.borrow_mut();
        let id = state.next();
        let _ = state.textures.insert(id, desc);
        Ok(TextureHandle(id))
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        let _ = self.state.borrow_mut().bound_textures.insert(unit, texture.0);
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn draw_triangles(&mut self, _vertex_count: u32) {
        let mut state = self.state.borrow_mut();
        if !state.lost && state.current_program.is_some() {
            state.draw_calls += 1;
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        let _ = self.state.borrow_mut().shaders.remove(&shader.0);
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        let _ = state.programs.remove(&program.0);
        if state.current_program == Some(program.0) {
            state.current_program = None;
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        let _ = self.state.borrow_mut().buffers.remove(&buffer.0);
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        let _ = self.state.borrow_mut().textures.remove(&texture.0);
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        state.released = true;
        state.lost = true;
    }

    fn is_lost(&self) -> bool {
        self.state.borrow().lost
    }
}

impl HeadlessProbe {
    /// Shaders, programs, buffers, and textures not yet deleted.
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.len()
            + state.programs.len()
            + state.buffers.len()
            + state.textures.len()
    }

    /// Live textures.
    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Draw calls issued while a program was current.
    pub fn draw_calls(&self) -> u64 {
        self.state.borrow().draw_calls
    }

    /// Latest value written to the uniform called `name`.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.state.borrow().values.get(name).copied()
    }

    /// Last viewport set.
    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.state.borrow().viewport
    }

    /// Texture bound to `unit`, if any.
    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.state
            .borrow()
            .bound_textures
            .get(&unit)
            .copied()
            .map(TextureHandle)
    }

    /// Source most recently submitted for `stage`.
    pub fn last_source(&self, stage: ShaderStage) -> Option<String> {
        self.state
            .borrow()
            .last_sources
            .get(stage_key(stage))
            .cloned()
    }

    /// Whether [`GraphicsContext::release`] was called.
    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }

    /// Simulate a platform context loss.
    pub fn lose(&self) {
        self.state.borrow_mut().lost = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_lookup_follows_declarations() {
        let mut gl = HeadlessContext::new(HeadlessOptions::default());
        let vs = gl.compile_shader(ShaderStage::Vertex, "void main() {}").unwrap();
        let fs = gl
            .compile_shader(
                ShaderStage::Fragment,
                "uniform vec3 u_color1;\nuniform float u_speed;\nvoid main() {}",
            )
            .unwrap();
        let program = gl.link_program(vs, fs).unwrap();
        assert!(gl.uniform_location(program, "u_color1").is_some());
        assert!(gl.uniform_location(program, "u_color").is_none());
        assert!(gl.uniform_location(program, "u_speed").is_some());
    }

    #[test]
    fn texture_size_must_match_data() {
        let mut gl = HeadlessContext::new(HeadlessOptions::default());
        let desc = TextureDesc {
            width: 2,
            height: 2,
        };
        assert!(gl.create_texture(desc, &[0; 16]).is_ok());
        assert!(gl.create_texture(desc, &[0; 12]).is_err());
    }

    #[test]
    fn lost_context_refuses_new_objects() {
        let mut gl = HeadlessContext::new(HeadlessOptions::default());
        gl.probe().lose();
        assert!(gl.is_lost());
        assert_eq!(
            gl.compile_shader(ShaderStage::Vertex, "").unwrap_err(),
            GraphicsError::ContextLost
        );
    }
}
