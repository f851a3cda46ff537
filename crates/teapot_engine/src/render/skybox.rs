//! Environment box drawn around the teapot

use std::path::PathBuf;

use crate::assets::{CubemapLoader, FaceLoadFlags};
use crate::camera::SharedCamera;
use crate::core::{RendererConfig, ShaderConfig};
use crate::foundation::math::to_column_major;
use crate::gpu::{
    BufferId, BufferKind, CubemapDesc, GpuDevice, PrimitiveTopology, ProgramId, TextureFilter, TextureId,
    UniformLocation, UniformValue,
};

use super::shader::{BuiltinProgram, load_shader_source};
use super::vertex::{SKYBOX_ATTRIBUTES, SkyboxVertex};
use super::{
    EnvironmentReport, RenderError, RenderResult, Renderable, ResourceHandles, SceneTransforms, load_environment,
};

/// Half the edge length of the box
const HALF_EXTENT: f32 = 200.0;

/// Box corners, bit 0 = +X, bit 1 = +Y, bit 2 = +Z
const CORNERS: [SkyboxVertex; 8] = {
    let m = HALF_EXTENT;
    [
        SkyboxVertex { position: [-m, -m, -m] },
        SkyboxVertex { position: [m, -m, -m] },
        SkyboxVertex { position: [-m, m, -m] },
        SkyboxVertex { position: [m, m, -m] },
        SkyboxVertex { position: [-m, -m, m] },
        SkyboxVertex { position: [m, -m, m] },
        SkyboxVertex { position: [-m, m, m] },
        SkyboxVertex { position: [m, m, m] },
    ]
};

/// Single strip covering all six sides
const STRIP: [u16; 14] = [0, 1, 2, 3, 7, 1, 5, 4, 7, 6, 2, 4, 0, 1];

#[derive(Debug, Clone, Copy, Default)]
struct SkyboxUniforms {
    projection: Option<UniformLocation>,
    view: Option<UniformLocation>,
    sampler0: Option<UniformLocation>,
}

/// Cube-map skybox with a single mip level
#[derive(Debug)]
pub struct Skybox {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    program: ProgramId,
    cubemap: TextureId,
    uniforms: SkyboxUniforms,
    index_count: i32,
    transforms: SceneTransforms,
    shaders: ShaderConfig,
    assets_dir: PathBuf,
}

impl Default for Skybox {
    fn default() -> Self {
        Self::new(&RendererConfig::default(), "assets")
    }
}

impl Skybox {
    /// Create an uninitialised skybox
    pub fn new(config: &RendererConfig, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            vertex_buffer: BufferId::NONE,
            index_buffer: BufferId::NONE,
            program: ProgramId::NONE,
            cubemap: TextureId::NONE,
            uniforms: SkyboxUniforms::default(),
            index_count: 0,
            transforms: SceneTransforms::default(),
            shaders: config.skybox_shaders.clone(),
            assets_dir: assets_dir.into(),
        }
    }

    /// Indices in the strip (zero before `init`)
    pub fn index_count(&self) -> i32 {
        self.index_count
    }

    /// Current transforms
    pub fn transforms(&self) -> &SceneTransforms {
        &self.transforms
    }
}

impl Skybox {
    fn create_buffers(&mut self, gpu: &mut dyn GpuDevice) -> RenderResult<()> {
        self.index_buffer = gpu.create_buffer(BufferKind::Index, bytemuck::cast_slice(&STRIP))?;
        self.vertex_buffer = gpu.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&CORNERS))?;
        Ok(())
    }
}

impl Renderable for Skybox {
    fn name(&self) -> &'static str {
        "skybox"
    }

    fn init(&mut self, gpu: &mut dyn GpuDevice) -> RenderResult<()> {
        if !self.handles().none_allocated() {
            self.unload(gpu);
        }

        let source = load_shader_source(&self.shaders, &self.assets_dir, BuiltinProgram::Skybox);
        let program = gpu.create_program(&source, SKYBOX_ATTRIBUTES).map_err(|e| {
            log::error!("Skybox shader program failed: {}", e);
            e
        })?;
        self.uniforms = SkyboxUniforms {
            projection: gpu.uniform_location(program, "uPMatrix"),
            view: gpu.uniform_location(program, "uMVMatrix"),
            sampler0: gpu.uniform_location(program, "sCubemapTexture"),
        };
        self.program = program;

        if let Err(e) = self.create_buffers(gpu) {
            log::error!("Skybox buffers failed: {}", e);
            self.unload(gpu);
            return Err(e);
        }
        self.index_count = STRIP.len() as i32;

        self.transforms.reset_model();
        self.update_viewport(gpu);

        log::info!("Skybox initialized: program {}", self.program.0);
        Ok(())
    }

    fn update_viewport(&mut self, gpu: &dyn GpuDevice) {
        self.transforms.update_viewport(gpu.viewport());
    }

    fn update(&mut self, _time: f64) {
        self.transforms.update();
    }

    fn render(&mut self, gpu: &mut dyn GpuDevice) {
        if !self.program.is_allocated() {
            log::trace!("Skybox has no program, skipping draw");
            return;
        }

        gpu.bind_vertex_buffer(self.vertex_buffer, &SkyboxVertex::LAYOUT);
        gpu.bind_index_buffer(self.index_buffer);
        gpu.use_program(self.program);

        gpu.set_uniform(self.uniforms.projection, UniformValue::Mat4(to_column_major(&self.transforms.view_projection())));
        gpu.set_uniform(self.uniforms.view, UniformValue::Mat4(to_column_major(self.transforms.view())));

        if self.cubemap.is_allocated() {
            gpu.bind_cubemap(0, self.cubemap);
        }
        gpu.set_uniform(self.uniforms.sampler0, UniformValue::Int(0));

        gpu.draw_indexed(PrimitiveTopology::TriangleStrip, self.index_count);
        gpu.unbind_buffers();
    }

    fn unload(&mut self, gpu: &mut dyn GpuDevice) {
        if self.handles().none_allocated() {
            return;
        }
        gpu.delete_buffer(self.vertex_buffer.take());
        gpu.delete_buffer(self.index_buffer.take());
        gpu.delete_texture(self.cubemap.take());
        gpu.delete_program(self.program.take());
        self.uniforms = SkyboxUniforms::default();
        log::debug!("Skybox unloaded");
    }

    fn switch_environment(
        &mut self,
        gpu: &mut dyn GpuDevice,
        loader: &mut dyn CubemapLoader,
        pattern: &str,
    ) -> RenderResult<EnvironmentReport> {
        if !self.is_initialized() {
            return Err(RenderError::NotInitialized("skybox"));
        }
        log::info!("Skybox loading cube-map textures: {}", pattern);
        let desc = CubemapDesc {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            mip_levels: 1,
        };
        load_environment(gpu, loader, &mut self.cubemap, pattern, &desc, FaceLoadFlags::empty())
    }

    fn bind(&mut self, camera: &SharedCamera) {
        self.transforms.bind(camera);
    }

    fn handles(&self) -> ResourceHandles {
        ResourceHandles {
            vertex_buffer: self.vertex_buffer,
            index_buffer: self.index_buffer,
            program: self.program,
            cubemap: self.cubemap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::gpu::{CubeFace, GpuCommand, RecordingDevice};

    struct FailingLoader;

    impl CubemapLoader for FailingLoader {
        fn load_cubemap_face(
            &mut self,
            _device: &mut dyn GpuDevice,
            _texture: TextureId,
            resource_name: &str,
            _face: CubeFace,
            _mip_level: u32,
            _flags: FaceLoadFlags,
        ) -> Result<(), AssetError> {
            Err(AssetError::NotFound(resource_name.to_string()))
        }
    }

    #[test]
    fn test_strip_indices_reference_corners() {
        assert!(STRIP.iter().all(|&i| usize::from(i) < CORNERS.len()));
    }

    #[test]
    fn test_draws_strip_over_fourteen_indices() {
        let mut gpu = RecordingDevice::new(600, 800);
        let mut skybox = Skybox::default();
        skybox.init(&mut gpu).expect("init");
        skybox.update(0.0);
        skybox.render(&mut gpu);

        assert_eq!(gpu.draw_calls(), vec![(PrimitiveTopology::TriangleStrip, 14)]);
        let bound = gpu.commands().iter().find_map(|c| match c {
            GpuCommand::BindVertexBuffer { stride, locations, .. } => Some((*stride, locations.clone())),
            _ => None,
        });
        assert_eq!(bound, Some((12, vec![0])));
    }

    #[test]
    fn test_failed_faces_still_generate_mipmaps() {
        let mut gpu = RecordingDevice::new(600, 800);
        let mut skybox = Skybox::default();
        skybox.init(&mut gpu).expect("init");

        let report = skybox.switch_environment(&mut gpu, &mut FailingLoader, "none").expect("switch");
        assert_eq!(report, EnvironmentReport { requested: 6, failed: 6 });
        assert!(skybox.handles().cubemap.is_allocated());
        assert!(matches!(gpu.commands().last(), Some(GpuCommand::GenerateMipmaps(_))));
    }

    #[test]
    fn test_environment_needs_init() {
        let mut gpu = RecordingDevice::new(600, 800);
        let mut skybox = Skybox::default();

        let err = skybox.switch_environment(&mut gpu, &mut FailingLoader, "none").unwrap_err();
        assert!(matches!(err, RenderError::NotInitialized("skybox")));
        assert_eq!(gpu.live_texture_count(), 0);
    }

    #[test]
    fn test_vertex_buffer_failure_leaves_nothing_allocated() {
        let mut gpu = RecordingDevice::new(600, 800);
        gpu.fail_buffers_after(Some(1));
        let mut skybox = Skybox::default();

        assert!(skybox.init(&mut gpu).is_err());
        assert!(!skybox.is_initialized());
        assert!(skybox.handles().none_allocated());
        assert_eq!(gpu.live_program_count(), 0);
        assert_eq!(gpu.invalid_deletes(), 0);
    }

    #[test]
    fn test_reinit_replaces_resources_without_leaks() {
        let mut gpu = RecordingDevice::new(600, 800);
        let mut skybox = Skybox::default();
        skybox.init(&mut gpu).expect("init");
        skybox.switch_environment(&mut gpu, &mut FailingLoader, "none").expect("switch");
        skybox.init(&mut gpu).expect("second init");

        assert_eq!(gpu.live_buffer_count(), 2);
        assert_eq!(gpu.live_program_count(), 1);
        assert_eq!(gpu.live_texture_count(), 0);
        assert_eq!(gpu.invalid_deletes(), 0);
    }
}
