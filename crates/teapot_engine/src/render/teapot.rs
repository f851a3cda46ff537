//! # Teapot Renderer
//!
//! Draws the reflective teapot. The shading is image based: the fragment
//! stage reflects the view vector about the surface normal and samples the
//! environment cube map at a mip level chosen by the roughness, then adds the
//! current material's diffuse and ambient terms.
//!
//! ## Uniforms
//!
//! | Name                | Value                                 |
//! |---------------------|---------------------------------------|
//! | `uPMatrix`          | projection * model-view               |
//! | `uMVMatrix`         | model-view                            |
//! | `vLight0`           | light position                        |
//! | `vCamera`           | fixed eye position                    |
//! | `vMaterialDiffuse`  | material diffuse (vec3)               |
//! | `vMaterialSpecular` | material specular + exponent (vec4)   |
//! | `vMaterialAmbient`  | material ambient (vec3)               |
//! | `sCubemapTexture`   | texture unit 0                        |
//! | `vRoughness`        | (roughness, mip_levels - 1)           |

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
use super::teapot_mesh::{TeapotMesh, teapot_mesh};
use super::vertex::{MESH_ATTRIBUTES, MeshVertex};
use super::{
    EYE_POSITION, EnvironmentReport, MaterialLibrary, RenderError, RenderResult, Renderable, ResourceHandles,
    SceneTransforms, load_environment,
};

#[derive(Debug, Clone, Copy, Default)]
struct TeapotUniforms {
    projection: Option<UniformLocation>,
    view: Option<UniformLocation>,
    light0: Option<UniformLocation>,
    camera_pos: Option<UniformLocation>,
    material_diffuse: Option<UniformLocation>,
    material_specular: Option<UniformLocation>,
    material_ambient: Option<UniformLocation>,
    sampler0: Option<UniformLocation>,
    roughness: Option<UniformLocation>,
}

impl TeapotUniforms {
    fn resolve(gpu: &mut dyn GpuDevice, program: ProgramId) -> Self {
        Self {
            projection: gpu.uniform_location(program, "uPMatrix"),
            view: gpu.uniform_location(program, "uMVMatrix"),
            light0: gpu.uniform_location(program, "vLight0"),
            camera_pos: gpu.uniform_location(program, "vCamera"),
            material_diffuse: gpu.uniform_location(program, "vMaterialDiffuse"),
            material_specular: gpu.uniform_location(program, "vMaterialSpecular"),
            material_ambient: gpu.uniform_location(program, "vMaterialAmbient"),
            sampler0: gpu.uniform_location(program, "sCubemapTexture"),
            roughness: gpu.uniform_location(program, "vRoughness"),
        }
    }
}

/// Cube-map-lit teapot
#[derive(Debug)]
pub struct Teapot {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    program: ProgramId,
    cubemap: TextureId,
    uniforms: TeapotUniforms,
    index_count: i32,
    transforms: SceneTransforms,
    materials: MaterialLibrary,
    roughness: f32,
    mip_levels: u32,
    light_position: [f32; 3],
    shaders: ShaderConfig,
    assets_dir: PathBuf,
}

impl Default for Teapot {
    fn default() -> Self {
        Self::new(&RendererConfig::default(), "assets")
    }
}

impl Teapot {
    /// Create an uninitialised teapot; no GPU work happens until `init`
    pub fn new(config: &RendererConfig, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            vertex_buffer: BufferId::NONE,
            index_buffer: BufferId::NONE,
            program: ProgramId::NONE,
            cubemap: TextureId::NONE,
            uniforms: TeapotUniforms::default(),
            index_count: 0,
            transforms: SceneTransforms::default(),
            materials: MaterialLibrary::default(),
            roughness: config.initial_roughness.clamp(0.0, 1.0),
            mip_levels: config.teapot_mip_levels.max(1),
            light_position: config.light_position,
            shaders: config.teapot_shaders.clone(),
            assets_dir: assets_dir.into(),
        }
    }

    /// Advance to the next material and return its index
    pub fn switch_material(&mut self) -> usize {
        let index = self.materials.advance();
        log::info!("Teapot material: {}", self.materials.current().name);
        index
    }

    /// Select a material by index (wrapped into range)
    pub fn set_material(&mut self, index: usize) -> usize {
        let index = self.materials.select(index);
        log::info!("Teapot material: {}", self.materials.current().name);
        index
    }

    /// Name of the current material
    pub fn material_name(&self) -> &str {
        &self.materials.current().name
    }

    /// The material table
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Set the roughness, clamped to 0..=1
    pub fn set_roughness(&mut self, roughness: f32) {
        self.roughness = if roughness.is_nan() { 0.0 } else { roughness.clamp(0.0, 1.0) };
    }

    /// Current roughness
    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    /// Mip levels loaded into the environment cube map
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Indices drawn per frame (zero before `init`)
    pub fn index_count(&self) -> i32 {
        self.index_count
    }

    /// Current transforms
    pub fn transforms(&self) -> &SceneTransforms {
        &self.transforms
    }

    fn create_buffers(&mut self, gpu: &mut dyn GpuDevice, mesh: &TeapotMesh) -> RenderResult<()> {
        self.index_buffer = gpu.create_buffer(BufferKind::Index, bytemuck::cast_slice(&mesh.indices))?;
        self.vertex_buffer = gpu.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&mesh.vertices))?;
        Ok(())
    }

    fn cubemap_desc(&self) -> CubemapDesc {
        CubemapDesc {
            min_filter: TextureFilter::LinearMipmapLinear,
            mag_filter: TextureFilter::Linear,
            mip_levels: self.mip_levels,
        }
    }
}

impl Renderable for Teapot {
    fn name(&self) -> &'static str {
        "teapot"
    }

    fn init(&mut self, gpu: &mut dyn GpuDevice) -> RenderResult<()> {
        if !self.handles().none_allocated() {
            log::debug!("Teapot re-initialised, releasing previous resources");
            self.unload(gpu);
        }

        let source = load_shader_source(&self.shaders, &self.assets_dir, BuiltinProgram::Teapot);
        let program = gpu.create_program(&source, MESH_ATTRIBUTES).map_err(|e| {
            log::error!("Teapot shader program failed: {}", e);
            e
        })?;
        self.uniforms = TeapotUniforms::resolve(gpu, program);
        self.program = program;

        let mesh = teapot_mesh();
        if let Err(e) = self.create_buffers(gpu, mesh) {
            log::error!("Teapot buffers failed: {}", e);
            self.unload(gpu);
            return Err(e);
        }
        self.index_count = mesh.index_count();

        self.transforms.reset_model();
        self.update_viewport(gpu);

        log::info!(
            "Teapot initialized: {} vertices, {} indices, program {}",
            mesh.vertices.len(),
            self.index_count,
            self.program.0
        );
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
            log::trace!("Teapot has no program, skipping draw");
            return;
        }

        let u = self.uniforms;
        let material = self.materials.current();

        gpu.bind_vertex_buffer(self.vertex_buffer, &MeshVertex::LAYOUT);
        gpu.bind_index_buffer(self.index_buffer);
        gpu.use_program(self.program);

        gpu.set_uniform(u.material_diffuse, UniformValue::Vec3(material.diffuse));
        gpu.set_uniform(u.material_specular, UniformValue::Vec4(material.specular));
        gpu.set_uniform(u.material_ambient, UniformValue::Vec3(material.ambient));

        gpu.set_uniform(u.projection, UniformValue::Mat4(to_column_major(&self.transforms.view_projection())));
        gpu.set_uniform(u.view, UniformValue::Mat4(to_column_major(self.transforms.view())));

        gpu.set_uniform(u.light0, UniformValue::Vec3(self.light_position));
        gpu.set_uniform(u.camera_pos, UniformValue::Vec3(EYE_POSITION));

        if self.cubemap.is_allocated() {
            gpu.bind_cubemap(0, self.cubemap);
        }
        gpu.set_uniform(u.sampler0, UniformValue::Int(0));
        gpu.set_uniform(u.roughness, UniformValue::Vec2([self.roughness, (self.mip_levels - 1) as f32]));

        gpu.draw_indexed(PrimitiveTopology::Triangles, self.index_count);
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
        self.uniforms = TeapotUniforms::default();
        log::debug!("Teapot unloaded");
    }

    fn switch_environment(
        &mut self,
        gpu: &mut dyn GpuDevice,
        loader: &mut dyn CubemapLoader,
        pattern: &str,
    ) -> RenderResult<EnvironmentReport> {
        if !self.is_initialized() {
            return Err(RenderError::NotInitialized("teapot"));
        }
        log::info!("Teapot loading cube-map textures: {}", pattern);
        let desc = self.cubemap_desc();
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
    use crate::gpu::{CubeFace, GpuCommand, RecordingDevice, ShaderStage};
    use crate::render::ProjectionBranch;

    #[derive(Default)]
    struct LoggingLoader {
        requests: Vec<(u32, CubeFace)>,
    }

    impl CubemapLoader for LoggingLoader {
        fn load_cubemap_face(
            &mut self,
            _device: &mut dyn GpuDevice,
            _texture: TextureId,
            _resource_name: &str,
            face: CubeFace,
            mip_level: u32,
            _flags: FaceLoadFlags,
        ) -> Result<(), AssetError> {
            self.requests.push((mip_level, face));
            Ok(())
        }
    }

    #[test]
    fn test_init_allocates_core_resources() {
        let mut gpu = RecordingDevice::new(800, 600);
        let mut teapot = Teapot::default();
        teapot.init(&mut gpu).expect("init");

        assert!(teapot.handles().core_allocated());
        assert!(!teapot.handles().cubemap.is_allocated());
        assert_eq!(teapot.index_count(), teapot_mesh().index_count());
        assert_eq!(teapot.transforms().projection_branch(), ProjectionBranch::Landscape);
    }

    #[test]
    fn test_unload_is_idempotent() {
        let mut gpu = RecordingDevice::new(800, 600);
        let mut teapot = Teapot::default();
        teapot.unload(&mut gpu);
        assert!(gpu.commands().is_empty());

        teapot.init(&mut gpu).expect("init");
        teapot.unload(&mut gpu);
        teapot.unload(&mut gpu);
        assert!(teapot.handles().none_allocated());
        assert_eq!(gpu.invalid_deletes(), 0);
        assert_eq!(gpu.live_buffer_count(), 0);
    }

    #[test]
    fn test_shader_failure_leaves_program_unallocated() {
        let mut gpu = RecordingDevice::new(800, 600);
        gpu.fail_shader_compile(Some(ShaderStage::Fragment));
        let mut teapot = Teapot::default();

        let err = teapot.init(&mut gpu).unwrap_err();
        assert!(matches!(err, crate::render::RenderError::ShaderCompileFailure(_)));
        assert!(!teapot.is_initialized());

        teapot.render(&mut gpu);
        assert!(gpu.draw_calls().is_empty());
    }

    #[test]
    fn test_buffer_failure_releases_program() {
        let mut gpu = RecordingDevice::new(800, 600);
        gpu.fail_buffers_after(Some(1));
        let mut teapot = Teapot::default();

        assert!(teapot.init(&mut gpu).is_err());
        assert!(!teapot.is_initialized());
        assert!(teapot.handles().none_allocated());
        assert_eq!(gpu.live_program_count(), 0);
        assert_eq!(gpu.live_buffer_count(), 0);

        teapot.render(&mut gpu);
        assert!(gpu.draw_calls().is_empty());
    }

    #[test]
    fn test_environment_requests_every_mip_and_face() {
        let mut gpu = RecordingDevice::new(800, 600);
        let mut teapot = Teapot::default();
        teapot.init(&mut gpu).expect("init");

        let mut loader = LoggingLoader::default();
        let report = teapot.switch_environment(&mut gpu, &mut loader, "m%02d_c%02d.bmp").expect("switch");

        assert_eq!(report, EnvironmentReport { requested: 48, failed: 0 });
        let expected: Vec<(u32, CubeFace)> =
            (0..8).flat_map(|level| CubeFace::ALL.into_iter().map(move |face| (level, face))).collect();
        assert_eq!(loader.requests, expected);
    }

    #[test]
    fn test_switch_environment_replaces_only_cubemap() {
        let mut gpu = RecordingDevice::new(800, 600);
        let mut teapot = Teapot::default();
        teapot.init(&mut gpu).expect("init");

        let mut loader = LoggingLoader::default();
        teapot.switch_environment(&mut gpu, &mut loader, "a").expect("first");
        let first = teapot.handles();
        teapot.switch_environment(&mut gpu, &mut loader, "b").expect("second");
        let second = teapot.handles();

        assert_ne!(first.cubemap, second.cubemap);
        assert_eq!(first.program, second.program);
        assert_eq!(first.vertex_buffer, second.vertex_buffer);
        assert!(!gpu.is_texture_live(first.cubemap));
        assert_eq!(gpu.live_texture_count(), 1);
    }

    #[test]
    fn test_render_uploads_material_and_roughness() {
        let mut gpu = RecordingDevice::new(800, 600);
        let mut teapot = Teapot::default();
        teapot.init(&mut gpu).expect("init");
        teapot.switch_material();
        teapot.switch_material();
        teapot.set_roughness(0.5);
        teapot.update(0.0);
        teapot.render(&mut gpu);

        assert_eq!(teapot.material_name(), "Plastic");
        assert_eq!(gpu.last_uniform("vMaterialDiffuse"), Some(UniformValue::Vec3([0.9, 0.0, 0.0])));
        assert_eq!(gpu.last_uniform("vRoughness"), Some(UniformValue::Vec2([0.5, 7.0])));
        assert_eq!(gpu.last_uniform("vLight0"), Some(UniformValue::Vec3([200.0, -200.0, -200.0])));
        assert_eq!(gpu.draw_calls(), vec![(PrimitiveTopology::Triangles, teapot.index_count())]);
        assert!(!gpu.commands().iter().any(|c| matches!(c, GpuCommand::BindCubemap { .. })));
    }

    #[test]
    fn test_roughness_is_clamped() {
        let mut teapot = Teapot::default();
        teapot.set_roughness(2.0);
        assert_eq!(teapot.roughness(), 1.0);
        teapot.set_roughness(-1.0);
        assert_eq!(teapot.roughness(), 0.0);
    }
}
