//! [`GraphicsContext`] over the browser's WebGL 2 and WebGL 1 APIs.

use rustc_hash::FxHashMap;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext, WebGlBuffer,
    WebGlContextAttributes, WebGlPowerPreference, WebGlProgram,
    WebGlRenderingContext as Gl1, WebGlShader, WebGlTexture,
    WebGlUniformLocation, WebglDebugRendererInfo, WebglLoseContext,
};

use crate::gpu::{
    BufferHandle, ContextAttributes, GraphicsApi, GraphicsContext,
    GraphicsError, PowerPreference, ProgramHandle, ResourceKind, ShaderHandle,
    ShaderStage, TextureDesc, TextureHandle, UniformLocation, UniformValue,
};

enum Gl {
    V2(WebGl2RenderingContext),
    V1(Gl1),
}

/// Call the same-named method on whichever API version is live. Both
/// versions share enum values, so `Gl1` constants are used throughout.
macro_rules! gl {
    ($gl:expr, $method:ident($($arg:expr),* $(,)?)) => {
        match $gl {
            Gl::V2(g) => g.$method($($arg),*),
            Gl::V1(g) => g.$method($($arg),*),
        }
    };
}

/// A WebGL context plus the objects created through it.
pub struct WebGlContext {
    gl: Gl,
    next_id: u32,
    shaders: FxHashMap<u32, WebGlShader>,
    programs: FxHashMap<u32, WebGlProgram>,
    buffers: FxHashMap<u32, WebGlBuffer>,
    textures: FxHashMap<u32, WebGlTexture>,
    uniforms: FxHashMap<u32, WebGlUniformLocation>,
    released: bool,
}

impl WebGlContext {
    /// Acquire WebGL 2 on `canvas`, falling back to WebGL 1.
    pub fn acquire(
        canvas: &HtmlCanvasElement,
        attributes: &ContextAttributes,
    ) -> Option<Self> {
        let options = context_options(attributes);
        if let Some(gl) =
            get_context::<WebGl2RenderingContext>(canvas, "webgl2", &options)
        {
            return Some(Self::wrap(Gl::V2(gl)));
        }
        let gl = get_context::<Gl1>(canvas, "webgl", &options)?;
        log::info!("WebGL 2 unavailable, using WebGL 1");
        Some(Self::wrap(Gl::V1(gl)))
    }

    fn wrap(gl: Gl) -> Self {
        Self {
            gl,
            next_id: 1,
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            uniforms: FxHashMap::default(),
            released: false,
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// `MAX_TEXTURE_SIZE`, or 0 if the query fails.
    pub fn max_texture_size(&self) -> u32 {
        gl!(&self.gl, get_parameter(Gl1::MAX_TEXTURE_SIZE))
            .ok()
            .and_then(|v| v.as_f64())
            .map_or(0, |v| v as u32)
    }

    /// Unmasked renderer string, when the debug extension is exposed.
    pub fn unmasked_renderer(&self) -> Option<String> {
        let _ext = gl!(&self.gl, get_extension("WEBGL_debug_renderer_info"))
            .ok()
            .flatten()?;
        gl!(
            &self.gl,
            get_parameter(WebglDebugRendererInfo::UNMASKED_RENDERER_WEBGL)
        )
        .ok()?
        .as_string()
    }
}

fn context_options(attributes: &ContextAttributes) -> WebGlContextAttributes {
    let options = WebGlContextAttributes::new();
    options.set_alpha(attributes.alpha);
    options.set_antialias(attributes.antialias);
    options.set_depth(attributes.depth);
    options.set_stencil(attributes.stencil);
    options.set_preserve_drawing_buffer(attributes.preserve_drawing_buffer);
    options.set_power_preference(match attributes.power_preference {
        PowerPreference::Default => WebGlPowerPreference::Default,
        PowerPreference::HighPerformance => {
            WebGlPowerPreference::HighPerformance
        }
        PowerPreference::LowPower => WebGlPowerPreference::LowPower,
    });
    options
}

fn get_context<T: JsCast>(
    canvas: &HtmlCanvasElement,
    kind: &str,
    options: &WebGlContextAttributes,
) -> Option<T> {
    canvas
        .get_context_with_context_options(kind, options)
        .ok()
        .flatten()?
        .dyn_into::<T>()
        .ok()
}

impl GraphicsContext for WebGlContext {
    fn api(&self) -> GraphicsApi {
        match self.gl {
            Gl::V2(_) => GraphicsApi::WebGl2,
            Gl::V1(_) => GraphicsApi::WebGl1,
        }
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, GraphicsError> {
        if self.is_lost() {
            return Err(GraphicsError::ContextLost);
        }
        let kind = match stage {
            ShaderStage::Vertex => Gl1::VERTEX_SHADER,
            ShaderStage::Fragment => Gl1::FRAGMENT_SHADER,
        };
        let shader = gl!(&self.gl, create_shader(kind))
            .ok_or(GraphicsError::ResourceCreation(ResourceKind::Shader))?;
        gl!(&self.gl, shader_source(&shader, source));
        gl!(&self.gl, compile_shader(&shader));
        let ok = gl!(&self.gl, get_shader_parameter(&shader, Gl1::COMPILE_STATUS))
            .as_bool()
            .unwrap_or(false);
        if !ok {
            let log = gl!(&self.gl, get_shader_info_log(&shader))
                .unwrap_or_default();
            gl!(&self.gl, delete_shader(Some(&shader)));
            return Err(GraphicsError::ShaderCompile { stage, log });
        }
        let id = self.allocate();
        let _ = self.shaders.insert(id, shader);
        Ok(ShaderHandle(id))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GraphicsError> {
        let (Some(vs), Some(fs)) =
            (self.shaders.get(&vertex.0), self.shaders.get(&fragment.0))
        else {
            return Err(GraphicsError::ResourceCreation(ResourceKind::Shader));
        };
        let program = gl!(&self.gl, create_program())
            .ok_or(GraphicsError::ResourceCreation(ResourceKind::Program))?;
        gl!(&self.gl, attach_shader(&program, vs));
        gl!(&self.gl, attach_shader(&program, fs));
        gl!(&self.gl, link_program(&program));
        gl!(&self.gl, detach_shader(&program, vs));
        gl!(&self.gl, detach_shader(&program, fs));
        let ok = gl!(&self.gl, get_program_parameter(&program, Gl1::LINK_STATUS))
            .as_bool()
            .unwrap_or(false);
        if !ok {
            let log = gl!(&self.gl, get_program_info_log(&program))
                .unwrap_or_default();
            gl!(&self.gl, delete_program(Some(&program)));
            return Err(GraphicsError::ProgramLink { log });
        }
        let id = self.allocate();
        let _ = self.programs.insert(id, program);
        Ok(ProgramHandle(id))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        gl!(&self.gl, use_program(self.programs.get(&program.0)));
    }

    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
        components: u32,
    ) -> Result<BufferHandle, GraphicsError> {
        let buffer = gl!(&self.gl, create_buffer())
            .ok_or(GraphicsError::ResourceCreation(ResourceKind::Buffer))?;
        gl!(&self.gl, bind_buffer(Gl1::ARRAY_BUFFER, Some(&buffer)));
        gl!(
            &self.gl,
            buffer_data_with_u8_array(
                Gl1::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                Gl1::STATIC_DRAW,
            )
        );
        if let Some(p) = self.programs.get(&program.0) {
            let location = gl!(&self.gl, get_attrib_location(p, attribute));
            if let Ok(index) = u32::try_from(location) {
                gl!(&self.gl, enable_vertex_attrib_array(index));
                gl!(
                    &self.gl,
                    vertex_attrib_pointer_with_i32(
                        index,
                        components as i32,
                        Gl1::FLOAT,
                        false,
                        0,
                        0,
                    )
                );
            } else {
                log::warn!("attribute {attribute} not found in program");
            }
        }
        let id = self.allocate();
        let _ = self.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn uniform_location(
        &mut self,
        program: ProgramHandle,
        name: &str,
    ) -> Option<UniformLocation> {
        let p = self.programs.get(&program.0)?;
        let location = gl!(&self.gl, get_uniform_location(p, name))?;
        let id = self.allocate();
        let _ = self.uniforms.insert(id, location);
        Some(UniformLocation(id))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let loc = self.uniforms.get(&location.0);
        if loc.is_none() {
            return;
        }
        match value {
            UniformValue::Float(v) => gl!(&self.gl, uniform1f(loc, v)),
            UniformValue::Vec2(v) => gl!(&self.gl, uniform2f(loc, v.x, v.y)),
            UniformValue::Vec3(v) => {
                gl!(&self.gl, uniform3f(loc, v.x, v.y, v.z));
            }
            UniformValue::Vec4(v) => {
                gl!(&self.gl, uniform4f(loc, v.x, v.y, v.z, v.w));
            }
            UniformValue::Int(v) => gl!(&self.gl, uniform1i(loc, v)),
        }
    }

    fn create_texture(
        &mut self,
        desc: TextureDesc,
        rgba: &[u8],
    ) -> Result<TextureHandle, GraphicsError> {
        let texture = gl!(&self.gl, create_texture())
            .ok_or(GraphicsError::ResourceCreation(ResourceKind::Texture))?;
        gl!(&self.gl, bind_texture(Gl1::TEXTURE_2D, Some(&texture)));
        let upload = gl!(
            &self.gl,
            tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                Gl1::TEXTURE_2D,
                0,
                Gl1::RGBA as i32,
                desc.width as i32,
                desc.height as i32,
                0,
                Gl1::RGBA,
                Gl1::UNSIGNED_BYTE,
                Some(rgba),
            )
        );
        if let Err(e) = upload {
            log::error!("texture upload failed: {e:?}");
            gl!(&self.gl, delete_texture(Some(&texture)));
            return Err(GraphicsError::ResourceCreation(ResourceKind::Texture));
        }
        for (pname, param) in [
            (Gl1::TEXTURE_WRAP_S, Gl1::REPEAT),
            (Gl1::TEXTURE_WRAP_T, Gl1::REPEAT),
            (Gl1::TEXTURE_MIN_FILTER, Gl1::LINEAR),
            (Gl1::TEXTURE_MAG_FILTER, Gl1::LINEAR),
        ] {
            gl!(&self.gl, tex_parameteri(Gl1::TEXTURE_2D, pname, param as i32));
        }
        let id = self.allocate();
        let _ = self.textures.insert(id, texture);
        Ok(TextureHandle(id))
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        gl!(&self.gl, active_texture(Gl1::TEXTURE0 + unit));
        gl!(
            &self.gl,
            bind_texture(Gl1::TEXTURE_2D, self.textures.get(&texture.0))
        );
    }

    fn viewport(&mut self, width: u32, height: u32) {
        gl!(&self.gl, viewport(0, 0, width as i32, height as i32));
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        gl!(&self.gl, draw_arrays(Gl1::TRIANGLES, 0, vertex_count as i32));
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if let Some(s) = self.shaders.remove(&shader.0) {
            gl!(&self.gl, delete_shader(Some(&s)));
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(p) = self.programs.remove(&program.0) {
            gl!(&self.gl, delete_program(Some(&p)));
        }
        // Locations die with their program.
        self.uniforms.clear();
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(b) = self.buffers.remove(&buffer.0) {
            gl!(&self.gl, delete_buffer(Some(&b)));
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(t) = self.textures.remove(&texture.0) {
            gl!(&self.gl, delete_texture(Some(&t)));
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let extension = gl!(&self.gl, get_extension("WEBGL_lose_context"))
            .ok()
            .flatten()
            .and_then(|ext| ext.dyn_into::<WebglLoseContext>().ok());
        match extension {
            Some(ext) => ext.lose_context(),
            None => log::debug!("WEBGL_lose_context unavailable"),
        }
    }

    fn is_lost(&self) -> bool {
        self.released || gl!(&self.gl, is_context_lost())
    }
}
