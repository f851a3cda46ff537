//! The renderable capability set and the state its implementations share

use std::rc::Rc;

use crate::assets::{CubemapLoader, FaceLoadFlags, format_face_name};
use crate::camera::{CameraLink, SharedCamera};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3, constants::THIRD_PI};
use crate::gpu::{BufferId, CubeFace, CubemapDesc, GpuDevice, ProgramId, TextureId, Viewport};

use super::{EYE_POSITION, FAR_PLANE, NEAR_PLANE, RenderResult};

/// Operations every scene renderer provides
///
/// Call order within a frame is `update` then `render`. `init` must precede
/// the first `render` and follow every `unload`.
pub trait Renderable {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Create the program, static buffers and transforms
    ///
    /// Anything still allocated is released first. On shader failure the
    /// program handle stays zero and the renderer is skipped by `render`.
    fn init(&mut self, gpu: &mut dyn GpuDevice) -> RenderResult<()>;

    /// Recompute the projection from the device's current viewport
    fn update_viewport(&mut self, gpu: &dyn GpuDevice);

    /// Recompute the view transform; no GPU calls
    fn update(&mut self, time: f64);

    /// Issue the draw for this frame
    fn render(&mut self, gpu: &mut dyn GpuDevice);

    /// Release every GPU handle; repeated calls are no-ops
    fn unload(&mut self, gpu: &mut dyn GpuDevice);

    /// Replace the cube map with the environment named by `pattern`
    ///
    /// Fails with [`RenderError::NotInitialized`](super::RenderError::NotInitialized)
    /// until `init` has succeeded.
    fn switch_environment(
        &mut self,
        gpu: &mut dyn GpuDevice,
        loader: &mut dyn CubemapLoader,
        pattern: &str,
    ) -> RenderResult<EnvironmentReport>;

    /// Associate a camera without taking ownership
    fn bind(&mut self, camera: &SharedCamera);

    /// Current GPU handles
    fn handles(&self) -> ResourceHandles;

    /// Whether the program linked and the renderer can draw
    fn is_initialized(&self) -> bool {
        self.handles().program.is_allocated()
    }
}

/// Snapshot of a renderer's GPU handles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceHandles {
    /// Vertex buffer
    pub vertex_buffer: BufferId,
    /// Index buffer
    pub index_buffer: BufferId,
    /// Shader program
    pub program: ProgramId,
    /// Environment cube map
    pub cubemap: TextureId,
}

impl ResourceHandles {
    /// Buffers and program are allocated (the cube map is loaded separately)
    pub fn core_allocated(&self) -> bool {
        self.vertex_buffer.is_allocated() && self.index_buffer.is_allocated() && self.program.is_allocated()
    }

    /// Every handle is zero
    pub fn none_allocated(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of loading one environment into one cube map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentReport {
    /// Face loads requested (6 per mip level)
    pub requested: usize,
    /// Face loads the loader reported as failed
    pub failed: usize,
}

impl EnvironmentReport {
    /// Every requested face loaded
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Sum two reports
    pub fn merge(self, other: Self) -> Self {
        Self {
            requested: self.requested + other.requested,
            failed: self.failed + other.failed,
        }
    }
}

/// Which axis was held at unit extent when the projection was built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionBranch {
    /// Width < height: horizontal extent scaled by `w / h`
    Portrait,
    /// Width >= height: vertical extent scaled by `h / w`
    Landscape,
}

impl ProjectionBranch {
    /// Branch for a viewport of the given size
    pub fn for_size(width: i32, height: i32) -> Self {
        if width < height {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

/// Perspective projection for a viewport, wider axis mapped onto -1..1
pub fn viewport_projection(width: i32, height: i32) -> (Mat4, ProjectionBranch) {
    let branch = ProjectionBranch::for_size(width, height);
    let (w, h) = (width as f32, height as f32);
    let projection = match branch {
        ProjectionBranch::Portrait => Mat4::frustum_perspective(w / h, 1.0, NEAR_PLANE, FAR_PLANE),
        ProjectionBranch::Landscape => Mat4::frustum_perspective(1.0, h / w, NEAR_PLANE, FAR_PLANE),
    };
    (projection, branch)
}

/// Look-at from the fixed eye toward the origin, +Y up
pub fn base_view() -> Mat4 {
    let [x, y, z] = EYE_POSITION;
    Mat4::look_at(Vec3::new(x, y, z), Vec3::zeros(), Vec3::y())
}

/// Fixed model placement: pushed back 15 units, then tilted a third of pi about X
pub fn model_placement() -> Mat4 {
    Mat4::rotation_x(THIRD_PI) * Mat4::new_translation(&Vec3::new(0.0, 0.0, -15.0))
}

/// Model, view and projection matrices plus the bound camera
#[derive(Debug, Clone)]
pub struct SceneTransforms {
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    branch: ProjectionBranch,
    camera: Option<CameraLink>,
}

impl Default for SceneTransforms {
    fn default() -> Self {
        Self {
            model: model_placement(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            branch: ProjectionBranch::Landscape,
            camera: None,
        }
    }
}

impl SceneTransforms {
    /// Restore the fixed model placement
    pub fn reset_model(&mut self) {
        self.model = model_placement();
    }

    /// Rebuild the projection for `viewport`; degenerate sizes keep the previous one
    pub fn update_viewport(&mut self, viewport: Viewport) {
        if viewport.width <= 0 || viewport.height <= 0 {
            log::debug!("Ignoring degenerate viewport {}x{}", viewport.width, viewport.height);
            return;
        }
        let (projection, branch) = viewport_projection(viewport.width, viewport.height);
        self.projection = projection;
        self.branch = branch;
    }

    /// Compose the view from the base look-at, the camera (if bound) and the model
    pub fn update(&mut self) {
        let base = base_view();
        let camera = self.camera.as_ref().and_then(std::rc::Weak::upgrade);

        self.view = match camera.as_ref().map(|c| c.try_borrow()) {
            Some(Ok(camera)) => camera.transform_matrix() * base * camera.rotation_matrix() * self.model,
            Some(Err(_)) => {
                log::warn!("Camera busy during update, using the unbound view");
                base * self.model
            }
            None => base * self.model,
        };
    }

    /// Store a weak association to `camera`
    pub fn bind(&mut self, camera: &SharedCamera) {
        self.camera = Some(Rc::downgrade(camera));
    }

    /// Whether a live camera is bound
    pub fn has_camera(&self) -> bool {
        self.camera.as_ref().is_some_and(|c| c.strong_count() > 0)
    }

    /// Model placement
    pub fn model(&self) -> &Mat4 {
        &self.model
    }

    /// Model-view matrix from the last update
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Projection from the last viewport update
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Projection branch from the last viewport update
    pub fn projection_branch(&self) -> ProjectionBranch {
        self.branch
    }

    /// `projection * view`
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Replace `texture` with a new cube map populated from `pattern`
///
/// Faces are requested for every mip level in increasing order and, within a
/// level, in [`CubeFace::ALL`] order. Individual failures are counted, not
/// rolled back, and the mip chain is generated regardless.
pub fn load_environment(
    gpu: &mut dyn GpuDevice,
    loader: &mut dyn CubemapLoader,
    texture: &mut TextureId,
    pattern: &str,
    desc: &CubemapDesc,
    flags: FaceLoadFlags,
) -> RenderResult<EnvironmentReport> {
    gpu.delete_texture(texture.take());
    *texture = gpu.create_cubemap(desc)?;

    let mut report = EnvironmentReport::default();
    for level in 0..desc.mip_levels {
        for face in CubeFace::ALL {
            let name = format_face_name(pattern, level, face);
            report.requested += 1;
            if let Err(e) = loader.load_cubemap_face(gpu, *texture, &name, face, level, flags) {
                log::debug!("Cube-map face {} ({:?}, mip {}) failed: {}", name, face, level, e);
                report.failed += 1;
            }
        }
    }

    if report.failed > 0 {
        log::warn!(
            "Environment '{}': {} of {} cube-map faces failed to load",
            pattern,
            report.failed,
            report.requested
        );
    }

    gpu.generate_cubemap_mipmaps(*texture);
    Ok(report)
}
