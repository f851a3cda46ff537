//! Graphics device abstraction
//!
//! This module defines the GL-like command surface the renderables drive: the
//! buffer, cube-map, program, uniform and draw operations of the teapot and
//! skybox. Two implementations ship with the crate:
//!
//! - [`RecordingDevice`]: headless, allocates sequential ids and records every
//!   command. Used by the test suite and the demo's headless mode.
//! - `GlowDevice` (feature `gl`): issues the commands against a live OpenGL or
//!   OpenGL ES context through `glow`.
//!
//! ## Handle Semantics
//!
//! Every handle is a `u32` newtype where `0` means "unallocated". Renderables
//! rely on this sentinel to make `unload` idempotent: a handle is released only
//! if it is non-zero, and is reset to zero immediately afterwards.

pub mod recording;
#[cfg(feature = "gl")]
pub mod gl;

pub use recording::{GpuCommand, RecordingDevice, AllocationCounts};
#[cfg(feature = "gl")]
pub use gl::GlowDevice;

use crate::assets::ImageData;
use bitflags::bitflags;
use thiserror::Error;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// The unallocated sentinel
            pub const NONE: Self = Self(0);

            /// Whether this handle refers to a live GPU object
            pub const fn is_allocated(self) -> bool {
                self.0 != 0
            }

            /// Return the handle and reset `self` to the unallocated sentinel
            pub fn take(&mut self) -> Self {
                std::mem::take(self)
            }
        }
    };
}

gpu_handle!(
    /// Handle to a vertex or index buffer
    BufferId
);
gpu_handle!(
    /// Handle to a cube-map texture
    TextureId
);
gpu_handle!(
    /// Handle to a linked shader program
    ProgramId
);

/// Resolved uniform location within a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex attribute data
    Vertex,
    /// 16-bit element indices
    Index,
}

/// The six faces of a cube map, in upload order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubeFace {
    /// All faces in the fixed upload order
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Zero-based position in [`CubeFace::ALL`]
    pub const fn index(self) -> u32 {
        match self {
            Self::PositiveX => 0,
            Self::NegativeX => 1,
            Self::PositiveY => 2,
            Self::NegativeY => 3,
            Self::PositiveZ => 4,
            Self::NegativeZ => 5,
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    /// Bilinear, base level only
    Linear,
    /// Trilinear across the mip chain
    LinearMipmapLinear,
}

/// Creation parameters for a cube-map texture
///
/// Wrapping is always clamp-to-edge on all three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubemapDesc {
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Magnification filter
    pub mag_filter: TextureFilter,
    /// Number of mip levels the texture will hold (base level 0 .. mip_levels - 1)
    pub mip_levels: u32,
}

/// Primitive assembly for an indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Independent triangles
    Triangles,
    /// A single triangle strip
    TriangleStrip,
}

/// Shader stage, used in compile diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Vertex + fragment source for one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

/// Attribute name bound to a fixed location before linking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Attribute location
    pub location: u32,
    /// Attribute name in the vertex shader
    pub name: &'static str,
}

/// One float attribute inside an interleaved vertex record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location
    pub location: u32,
    /// Number of f32 components
    pub components: i32,
    /// Byte offset within the record
    pub offset: i32,
}

/// Layout of an interleaved vertex record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Record size in bytes
    pub stride: i32,
    /// Attributes enabled for the draw
    pub attributes: &'static [VertexAttribute],
}

/// A uniform value upload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
    /// vec2
    Vec2([f32; 2]),
    /// vec3
    Vec3([f32; 3]),
    /// vec4
    Vec4([f32; 4]),
    /// int / sampler unit
    Int(i32),
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// Left edge
    pub x: i32,
    /// Bottom edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Viewport {
    /// Viewport covering a `width` x `height` surface from the origin
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Fixed-function state applied when a display becomes active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    /// Cull back faces
    pub cull_back_faces: bool,
    /// Enable depth testing with a less-or-equal comparison
    pub depth_test_less_equal: bool,
    /// Counter-clockwise winding is front-facing
    pub front_face_ccw: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            cull_back_faces: true,
            depth_test_less_equal: true,
            front_face_ccw: true,
        }
    }
}

bitflags! {
    /// Buffers cleared at the start of a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Colour attachment
        const COLOR = 0b01;
        /// Depth attachment
        const DEPTH = 0b10;
    }
}

/// GPU-side errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// A shader stage failed to compile
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompile {
        /// Stage that failed
        stage: ShaderStage,
        /// Driver info log
        log: String,
    },

    /// The program failed to link
    #[error("Failed to link program: {log}")]
    ShaderLink {
        /// Driver info log
        log: String,
    },

    /// An object could not be created
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// A command referenced an unallocated handle
    #[error("Invalid handle: {0}")]
    InvalidHandle(&'static str),
}

/// Result type for device operations
pub type GpuResult<T> = Result<T, GpuError>;

/// GL-like command surface used by the renderables
///
/// Every method corresponds to a small group of GL calls. Implementations are
/// single-threaded and must be driven from the thread that owns the context.
pub trait GpuDevice {
    /// Create a static (immutable, GPU-resident) buffer filled with `data`
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> GpuResult<BufferId>;

    /// Delete a buffer; unallocated handles are ignored
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Create an empty cube-map texture with the given sampling parameters
    fn create_cubemap(&mut self, desc: &CubemapDesc) -> GpuResult<TextureId>;

    /// Upload one face of one mip level
    fn upload_cubemap_face(
        &mut self,
        texture: TextureId,
        face: CubeFace,
        level: u32,
        image: &ImageData,
        srgb: bool,
    ) -> GpuResult<()>;

    /// Generate (or validate) the full mip chain of a cube map
    fn generate_cubemap_mipmaps(&mut self, texture: TextureId);

    /// Delete a texture; unallocated handles are ignored
    fn delete_texture(&mut self, texture: TextureId);

    /// Compile both stages, bind attribute locations, and link
    ///
    /// On failure no program object survives.
    fn create_program(&mut self, source: &ShaderSource, attributes: &[AttributeBinding]) -> GpuResult<ProgramId>;

    /// Look up a uniform in a linked program
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Delete a program; unallocated handles are ignored
    fn delete_program(&mut self, program: ProgramId);

    /// Current viewport
    fn viewport(&self) -> Viewport;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Apply culling, depth and winding state
    fn apply_render_state(&mut self, state: &RenderState);

    /// Clear the selected attachments
    fn clear(&mut self, color: [f32; 4], flags: ClearFlags);

    /// Bind a vertex buffer and enable the layout's attributes
    fn bind_vertex_buffer(&mut self, buffer: BufferId, layout: &VertexLayout);

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: BufferId);

    /// Make a program current
    fn use_program(&mut self, program: ProgramId);

    /// Bind a cube map to a texture unit
    fn bind_cubemap(&mut self, unit: u32, texture: TextureId);

    /// Upload a uniform; `None` locations are ignored as GL ignores -1
    fn set_uniform(&mut self, location: Option<UniformLocation>, value: UniformValue);

    /// Draw `index_count` 16-bit indices from the bound index buffer
    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: i32);

    /// Unbind vertex and index buffers
    fn unbind_buffers(&mut self);
}
