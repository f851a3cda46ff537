//! Headless recording device
//!
//! Implements [`GpuDevice`] without a GPU: handles are handed out from a
//! counter, live objects are tracked in sets, and every command is appended to
//! a log that tests (and the demo's headless mode) can inspect. Failure modes
//! that a real driver would produce, such as shader compile and link errors,
//! can be switched on to exercise the renderers' error paths.

use std::collections::{HashMap, HashSet};

use super::{
    AttributeBinding, BufferId, BufferKind, ClearFlags, CubeFace, CubemapDesc, GpuDevice, GpuError,
    GpuResult, PrimitiveTopology, ProgramId, RenderState, ShaderSource, ShaderStage, TextureId,
    UniformLocation, UniformValue, VertexLayout, Viewport,
};
use crate::assets::ImageData;

/// A command observed by the [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    /// Buffer created with the given contents size
    CreateBuffer {
        /// New handle
        id: BufferId,
        /// Vertex or index
        kind: BufferKind,
        /// Size in bytes
        bytes: usize,
    },
    /// Buffer deleted
    DeleteBuffer(BufferId),
    /// Cube map created
    CreateCubemap {
        /// New handle
        id: TextureId,
        /// Sampling parameters
        desc: CubemapDesc,
    },
    /// Face uploaded
    UploadCubemapFace {
        /// Target texture
        texture: TextureId,
        /// Face
        face: CubeFace,
        /// Mip level
        level: u32,
        /// Face width in pixels
        width: u32,
        /// Uploaded as sRGB
        srgb: bool,
    },
    /// Mip chain generated
    GenerateMipmaps(TextureId),
    /// Texture deleted
    DeleteTexture(TextureId),
    /// Program linked
    CreateProgram(ProgramId),
    /// Program deleted
    DeleteProgram(ProgramId),
    /// Viewport changed
    SetViewport(Viewport),
    /// Render state applied
    ApplyRenderState(RenderState),
    /// Frame buffer cleared
    Clear {
        /// Clear colour
        color: [f32; 4],
        /// Attachments cleared
        flags: ClearFlags,
    },
    /// Vertex buffer bound
    BindVertexBuffer {
        /// Buffer
        buffer: BufferId,
        /// Record stride in bytes
        stride: i32,
        /// Enabled attribute locations
        locations: Vec<u32>,
    },
    /// Index buffer bound
    BindIndexBuffer(BufferId),
    /// Program made current
    UseProgram(ProgramId),
    /// Cube map bound to a unit
    BindCubemap {
        /// Texture unit
        unit: u32,
        /// Texture
        texture: TextureId,
    },
    /// Uniform uploaded to a resolved location
    SetUniform {
        /// Uniform name the location was resolved from
        name: String,
        /// Value
        value: UniformValue,
    },
    /// Indexed draw
    DrawIndexed {
        /// Primitive assembly
        topology: PrimitiveTopology,
        /// Index count
        count: i32,
    },
    /// Buffers unbound
    UnbindBuffers,
}

/// Number of successful allocations per object type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationCounts {
    /// Buffers created
    pub buffers: usize,
    /// Textures created
    pub textures: usize,
    /// Programs linked
    pub programs: usize,
}

/// Headless [`GpuDevice`] that records every command
#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: u32,
    viewport: Viewport,
    live_buffers: HashSet<BufferId>,
    live_textures: HashSet<TextureId>,
    live_programs: HashSet<ProgramId>,
    uniforms: HashMap<UniformLocation, (ProgramId, String)>,
    allocations: AllocationCounts,
    invalid_deletes: usize,
    fail_compile: Option<ShaderStage>,
    fail_link: bool,
    buffer_budget: Option<usize>,
    commands: Vec<GpuCommand>,
}

impl RecordingDevice {
    /// Create a device whose viewport covers a `width` x `height` surface
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            viewport: Viewport::from_size(width, height),
            ..Self::default()
        }
    }

    /// Make the next program creations fail compiling `stage` (`None` clears)
    pub fn fail_shader_compile(&mut self, stage: Option<ShaderStage>) {
        self.fail_compile = stage;
    }

    /// Make the next program creations fail linking
    pub fn fail_program_link(&mut self, fail: bool) {
        self.fail_link = fail;
    }

    /// Let `successes` more buffer creations through, then fail the rest (`None` clears)
    pub fn fail_buffers_after(&mut self, successes: Option<usize>) {
        self.buffer_budget = successes;
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Successful allocations since creation
    pub fn allocations(&self) -> AllocationCounts {
        self.allocations
    }

    /// Buffers currently alive
    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    /// Textures currently alive
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    /// Programs currently alive
    pub fn live_program_count(&self) -> usize {
        self.live_programs.len()
    }

    /// Uniform locations resolved against live programs
    pub fn live_uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Whether `texture` is alive
    pub fn is_texture_live(&self, texture: TextureId) -> bool {
        self.live_textures.contains(&texture)
    }

    /// Deletes of non-zero handles that were not alive (double frees)
    pub fn invalid_deletes(&self) -> usize {
        self.invalid_deletes
    }

    /// Draw calls in recording order
    pub fn draw_calls(&self) -> Vec<(PrimitiveTopology, i32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawIndexed { topology, count } => Some((*topology, *count)),
                _ => None,
            })
            .collect()
    }

    /// Most recent value uploaded to the uniform called `name`
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.commands.iter().rev().find_map(|c| match c {
            GpuCommand::SetUniform { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn note_invalid_delete(&mut self, what: &str, id: u32) {
        log::warn!("Deleting {} {} that is not alive", what, id);
        self.invalid_deletes += 1;
    }
}

impl GpuDevice for RecordingDevice {
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> GpuResult<BufferId> {
        if data.is_empty() {
            return Err(GpuError::ResourceCreation("buffer data is empty".to_string()));
        }
        match self.buffer_budget.as_mut() {
            Some(0) => return Err(GpuError::ResourceCreation("out of buffer memory".to_string())),
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        let id = BufferId(self.allocate());
        self.live_buffers.insert(id);
        self.allocations.buffers += 1;
        self.commands.push(GpuCommand::CreateBuffer { id, kind, bytes: data.len() });
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if !buffer.is_allocated() {
            return;
        }
        if !self.live_buffers.remove(&buffer) {
            self.note_invalid_delete("buffer", buffer.0);
        }
        self.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn create_cubemap(&mut self, desc: &CubemapDesc) -> GpuResult<TextureId> {
        if desc.mip_levels == 0 {
            return Err(GpuError::ResourceCreation("cube map needs at least one mip level".to_string()));
        }
        let id = TextureId(self.allocate());
        self.live_textures.insert(id);
        self.allocations.textures += 1;
        self.commands.push(GpuCommand::CreateCubemap { id, desc: *desc });
        Ok(id)
    }

    fn upload_cubemap_face(
        &mut self,
        texture: TextureId,
        face: CubeFace,
        level: u32,
        image: &ImageData,
        srgb: bool,
    ) -> GpuResult<()> {
        if !self.live_textures.contains(&texture) {
            return Err(GpuError::InvalidHandle("cube map"));
        }
        self.commands.push(GpuCommand::UploadCubemapFace {
            texture,
            face,
            level,
            width: image.width,
            srgb,
        });
        Ok(())
    }

    fn generate_cubemap_mipmaps(&mut self, texture: TextureId) {
        self.commands.push(GpuCommand::GenerateMipmaps(texture));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if !texture.is_allocated() {
            return;
        }
        if !self.live_textures.remove(&texture) {
            self.note_invalid_delete("texture", texture.0);
        }
        self.commands.push(GpuCommand::DeleteTexture(texture));
    }

    fn create_program(&mut self, source: &ShaderSource, _attributes: &[AttributeBinding]) -> GpuResult<ProgramId> {
        if let Some(stage) = self.fail_compile {
            return Err(GpuError::ShaderCompile { stage, log: "forced compile failure".to_string() });
        }
        for (stage, text) in [(ShaderStage::Vertex, &source.vertex), (ShaderStage::Fragment, &source.fragment)] {
            if text.trim().is_empty() {
                return Err(GpuError::ShaderCompile { stage, log: "empty source".to_string() });
            }
        }
        if self.fail_link {
            return Err(GpuError::ShaderLink { log: "forced link failure".to_string() });
        }

        let id = ProgramId(self.allocate());
        self.live_programs.insert(id);
        self.allocations.programs += 1;
        self.commands.push(GpuCommand::CreateProgram(id));
        Ok(id)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if !self.live_programs.contains(&program) {
            return None;
        }
        let location = UniformLocation(self.allocate());
        self.uniforms.insert(location, (program, name.to_string()));
        Some(location)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if !program.is_allocated() {
            return;
        }
        if !self.live_programs.remove(&program) {
            self.note_invalid_delete("program", program.0);
        }
        self.uniforms.retain(|_, (owner, _)| *owner != program);
        self.commands.push(GpuCommand::DeleteProgram(program));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(GpuCommand::SetViewport(viewport));
    }

    fn apply_render_state(&mut self, state: &RenderState) {
        self.commands.push(GpuCommand::ApplyRenderState(*state));
    }

    fn clear(&mut self, color: [f32; 4], flags: ClearFlags) {
        self.commands.push(GpuCommand::Clear { color, flags });
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId, layout: &VertexLayout) {
        self.commands.push(GpuCommand::BindVertexBuffer {
            buffer,
            stride: layout.stride,
            locations: layout.attributes.iter().map(|a| a.location).collect(),
        });
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        self.commands.push(GpuCommand::BindIndexBuffer(buffer));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn bind_cubemap(&mut self, unit: u32, texture: TextureId) {
        self.commands.push(GpuCommand::BindCubemap { unit, texture });
    }

    fn set_uniform(&mut self, location: Option<UniformLocation>, value: UniformValue) {
        let Some(location) = location else {
            return;
        };
        if let Some((_, name)) = self.uniforms.get(&location) {
            self.commands.push(GpuCommand::SetUniform { name: name.clone(), value });
        }
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: i32) {
        self.commands.push(GpuCommand::DrawIndexed { topology, count: index_count });
    }

    fn unbind_buffers(&mut self) {
        self.commands.push(GpuCommand::UnbindBuffers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ShaderSource {
        ShaderSource { vertex: "void main() {}".into(), fragment: "void main() {}".into() }
    }

    #[test]
    fn test_ids_are_non_zero_and_unique() {
        let mut device = RecordingDevice::new(100, 100);
        let a = device.create_buffer(BufferKind::Vertex, &[0; 12]).unwrap();
        let b = device.create_buffer(BufferKind::Index, &[0; 6]).unwrap();
        assert!(a.is_allocated() && b.is_allocated());
        assert_ne!(a, b);
        assert_eq!(device.live_buffer_count(), 2);
    }

    #[test]
    fn test_double_delete_is_counted() {
        let mut device = RecordingDevice::new(100, 100);
        let buffer = device.create_buffer(BufferKind::Vertex, &[0; 12]).unwrap();
        device.delete_buffer(buffer);
        device.delete_buffer(buffer);
        device.delete_buffer(BufferId::NONE);
        assert_eq!(device.invalid_deletes(), 1);
        assert_eq!(device.live_buffer_count(), 0);
    }

    #[test]
    fn test_forced_shader_failures() {
        let mut device = RecordingDevice::new(100, 100);
        device.fail_shader_compile(Some(ShaderStage::Vertex));
        assert!(matches!(
            device.create_program(&source(), &[]),
            Err(GpuError::ShaderCompile { stage: ShaderStage::Vertex, .. })
        ));

        device.fail_shader_compile(None);
        device.fail_program_link(true);
        assert!(matches!(device.create_program(&source(), &[]), Err(GpuError::ShaderLink { .. })));
        assert_eq!(device.live_program_count(), 0);
    }

    #[test]
    fn test_uniforms_resolve_to_names() {
        let mut device = RecordingDevice::new(100, 100);
        let program = device.create_program(&source(), &[]).unwrap();
        let location = device.uniform_location(program, "uPMatrix");
        device.set_uniform(location, UniformValue::Int(3));
        device.set_uniform(None, UniformValue::Int(4));
        assert_eq!(device.last_uniform("uPMatrix"), Some(UniformValue::Int(3)));
        assert_eq!(device.uniform_location(ProgramId(999), "uPMatrix"), None);
    }
}
