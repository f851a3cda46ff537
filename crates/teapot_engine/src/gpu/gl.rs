//! OpenGL device built on `glow`
//!
//! Handles are engine-side ids mapped to glow objects, so the same sentinel
//! rules apply as for the recording device. A single vertex array object is
//! created up front and stays bound; core profiles refuse attribute setup
//! without one.

use std::collections::HashMap;

use glow::HasContext;

use super::{
    AttributeBinding, BufferId, BufferKind, ClearFlags, CubeFace, CubemapDesc, GpuDevice, GpuError, GpuResult,
    PrimitiveTopology, ProgramId, RenderState, ShaderSource, ShaderStage, TextureFilter, TextureId,
    UniformLocation, UniformValue, VertexLayout, Viewport,
};
use crate::assets::ImageData;

fn face_target(face: CubeFace) -> u32 {
    glow::TEXTURE_CUBE_MAP_POSITIVE_X + face.index()
}

fn filter_enum(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Linear => glow::LINEAR as i32,
        TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR as i32,
    }
}

fn topology_enum(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::Triangles => glow::TRIANGLES,
        PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

/// [`GpuDevice`] over a current OpenGL 3.3 core / GLES 3 context
pub struct GlowDevice {
    gl: glow::Context,
    vao: Option<glow::VertexArray>,
    next_id: u32,
    buffers: HashMap<u32, glow::Buffer>,
    textures: HashMap<u32, glow::Texture>,
    programs: HashMap<u32, glow::Program>,
    uniforms: HashMap<u32, glow::UniformLocation>,
    // Uniform ids resolved against each program, dropped with the program
    program_uniforms: HashMap<u32, Vec<u32>>,
    enabled_attributes: Vec<u32>,
    viewport: Viewport,
}

impl GlowDevice {
    /// Wrap a loaded context
    ///
    /// # Safety
    ///
    /// The context must be current on this thread for the device's lifetime.
    pub unsafe fn new(gl: glow::Context) -> GpuResult<Self> {
        let vao = gl.create_vertex_array().map_err(GpuError::ResourceCreation)?;
        gl.bind_vertex_array(Some(vao));
        log::info!(
            "OpenGL device ready: {} / {}",
            gl.get_parameter_string(glow::RENDERER),
            gl.get_parameter_string(glow::VERSION)
        );

        Ok(Self {
            gl,
            vao: Some(vao),
            next_id: 0,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            uniforms: HashMap::new(),
            program_uniforms: HashMap::new(),
            enabled_attributes: Vec::new(),
            viewport: Viewport::default(),
        })
    }

    /// The underlying context
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    unsafe fn compile(&self, stage: ShaderStage, source: &str) -> GpuResult<glow::Shader> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let shader = self.gl.create_shader(kind).map_err(GpuError::ResourceCreation)?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);
        if !self.gl.get_shader_compile_status(shader) {
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            return Err(GpuError::ShaderCompile { stage, log });
        }
        Ok(shader)
    }

    fn disable_attributes(&mut self) {
        for location in self.enabled_attributes.drain(..) {
            unsafe { self.gl.disable_vertex_attrib_array(location) };
        }
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        let leaked = self.buffers.len() + self.textures.len() + self.programs.len();
        if leaked > 0 {
            log::warn!("GlowDevice dropped with {} live objects", leaked);
        }
        unsafe {
            for (_, buffer) in self.buffers.drain() {
                self.gl.delete_buffer(buffer);
            }
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            for (_, program) in self.programs.drain() {
                self.gl.delete_program(program);
            }
            if let Some(vao) = self.vao.take() {
                self.gl.delete_vertex_array(vao);
            }
        }
    }
}

impl GpuDevice for GlowDevice {
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> GpuResult<BufferId> {
        if data.is_empty() {
            return Err(GpuError::ResourceCreation("buffer data is empty".to_string()));
        }
        let target = match kind {
            BufferKind::Vertex => glow::ARRAY_BUFFER,
            BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
        };
        let buffer = unsafe {
            let buffer = self.gl.create_buffer().map_err(GpuError::ResourceCreation)?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            self.gl.bind_buffer(target, None);
            buffer
        };
        let id = self.allocate();
        self.buffers.insert(id, buffer);
        Ok(BufferId(id))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(raw) = self.buffers.remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(raw) };
        }
    }

    fn create_cubemap(&mut self, desc: &CubemapDesc) -> GpuResult<TextureId> {
        let texture = unsafe {
            let texture = self.gl.create_texture().map_err(GpuError::ResourceCreation)?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            let target = glow::TEXTURE_CUBE_MAP;
            self.gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter_enum(desc.min_filter));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter_enum(desc.mag_filter));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_MAX_LEVEL, desc.mip_levels.saturating_sub(1) as i32);
            texture
        };
        let id = self.allocate();
        self.textures.insert(id, texture);
        Ok(TextureId(id))
    }

    fn upload_cubemap_face(
        &mut self,
        texture: TextureId,
        face: CubeFace,
        level: u32,
        image: &ImageData,
        srgb: bool,
    ) -> GpuResult<()> {
        let raw = *self.textures.get(&texture.0).ok_or(GpuError::InvalidHandle("texture"))?;
        let internal = if srgb { glow::SRGB8_ALPHA8 } else { glow::RGBA8 };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(raw));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                face_target(face),
                level as i32,
                internal as i32,
                image.width as i32,
                image.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(&image.data),
            );
        }
        Ok(())
    }

    fn generate_cubemap_mipmaps(&mut self, texture: TextureId) {
        if let Some(&raw) = self.textures.get(&texture.0) {
            unsafe {
                self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(raw));
                self.gl.generate_mipmap(glow::TEXTURE_CUBE_MAP);
            }
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(raw) = self.textures.remove(&texture.0) {
            unsafe { self.gl.delete_texture(raw) };
        }
    }

    fn create_program(&mut self, source: &ShaderSource, attributes: &[AttributeBinding]) -> GpuResult<ProgramId> {
        let program = unsafe {
            let vertex = self.compile(ShaderStage::Vertex, &source.vertex)?;
            let fragment = match self.compile(ShaderStage::Fragment, &source.fragment) {
                Ok(shader) => shader,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    return Err(e);
                }
            };

            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(GpuError::ResourceCreation(e));
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            for binding in attributes {
                self.gl.bind_attrib_location(program, binding.location, binding.name);
            }
            self.gl.link_program(program);

            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GpuError::ShaderLink { log });
            }
            program
        };
        let id = self.allocate();
        self.programs.insert(id, program);
        Ok(ProgramId(id))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let raw = *self.programs.get(&program.0)?;
        let location = unsafe { self.gl.get_uniform_location(raw, name) }?;
        let id = self.allocate();
        self.uniforms.insert(id, location);
        self.program_uniforms.entry(program.0).or_default().push(id);
        Some(UniformLocation(id))
    }

    fn delete_program(&mut self, program: ProgramId) {
        for id in self.program_uniforms.remove(&program.0).unwrap_or_default() {
            self.uniforms.remove(&id);
        }
        if let Some(raw) = self.programs.remove(&program.0) {
            unsafe { self.gl.delete_program(raw) };
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        unsafe { self.gl.viewport(viewport.x, viewport.y, viewport.width, viewport.height) };
    }

    fn apply_render_state(&mut self, state: &RenderState) {
        unsafe {
            if state.cull_back_faces {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(glow::BACK);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
            if state.depth_test_less_equal {
                self.gl.enable(glow::DEPTH_TEST);
                self.gl.depth_func(glow::LEQUAL);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
            self.gl.front_face(if state.front_face_ccw { glow::CCW } else { glow::CW });
        }
    }

    fn clear(&mut self, color: [f32; 4], flags: ClearFlags) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(mask);
        }
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId, layout: &VertexLayout) {
        let Some(&raw) = self.buffers.get(&buffer.0) else {
            log::warn!("Binding unknown vertex buffer {}", buffer.0);
            return;
        };
        self.disable_attributes();
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
            for attribute in layout.attributes {
                self.gl.enable_vertex_attrib_array(attribute.location);
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    attribute.offset,
                );
            }
        }
        self.enabled_attributes.extend(layout.attributes.iter().map(|a| a.location));
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        if let Some(&raw) = self.buffers.get(&buffer.0) {
            unsafe { self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(raw)) };
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        let raw = self.programs.get(&program.0).copied();
        unsafe { self.gl.use_program(raw) };
    }

    fn bind_cubemap(&mut self, unit: u32, texture: TextureId) {
        let raw = self.textures.get(&texture.0).copied();
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, raw);
        }
    }

    fn set_uniform(&mut self, location: Option<UniformLocation>, value: UniformValue) {
        let Some(raw) = location.and_then(|l| self.uniforms.get(&l.0)) else {
            return;
        };
        unsafe {
            match value {
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(Some(raw), false, &m),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(Some(raw), x, y),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(Some(raw), x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(Some(raw), x, y, z, w),
                UniformValue::Int(v) => self.gl.uniform_1_i32(Some(raw), v),
            }
        }
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: i32) {
        unsafe {
            self.gl.draw_elements(topology_enum(topology), index_count, glow::UNSIGNED_SHORT, 0);
        }
    }

    fn unbind_buffers(&mut self) {
        self.disable_attributes();
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }
    }
}
