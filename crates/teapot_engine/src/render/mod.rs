//! # Rendering
//!
//! The two scene renderers and everything they share.
//!
//! ## Architecture
//!
//! Both [`Teapot`] and [`Skybox`] implement the [`Renderable`] capability set.
//! There is no shared base object: each renderer owns its GPU handles and a
//! [`SceneTransforms`] value that carries the model, view and projection
//! matrices plus the weak camera association.
//!
//! ## Resource Lifecycle
//!
//! ```text
//! init ──► update_viewport ──► switch_environment ──► (update ─► render)* ──► unload
//!   ▲                                                                          │
//!   └──────────────────────────── recovery / reload ──────────────────────────┘
//! ```
//!
//! `init` replaces resources wholesale (it unloads first if anything is still
//! allocated) and `unload` drives every handle back to zero, so the cycle can
//! repeat any number of times. The cube map has its own, narrower lifecycle:
//! `switch_environment` replaces it without touching buffers or the program.

pub mod material;
pub mod renderable;
pub mod shader;
pub mod skybox;
pub mod teapot;
pub mod teapot_mesh;
pub mod vertex;

pub use material::{Material, MaterialLibrary};
pub use renderable::{
    EnvironmentReport, ProjectionBranch, Renderable, ResourceHandles, SceneTransforms, load_environment,
};
pub use skybox::Skybox;
pub use teapot::Teapot;

use thiserror::Error;

use crate::gpu::GpuError;

/// Near clip plane distance
pub const NEAR_PLANE: f32 = 5.0;

/// Far clip plane distance
pub const FAR_PLANE: f32 = 10_000.0;

/// Fixed eye position of the base view
pub const EYE_POSITION: [f32; 3] = [0.0, 0.0, 700.0];

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A shader stage failed to compile; the program stays unallocated
    #[error("Shader compile failure: {0}")]
    ShaderCompileFailure(String),

    /// The program failed to link; the program stays unallocated
    #[error("Shader link failure: {0}")]
    ShaderLinkFailure(String),

    /// A buffer or texture could not be created
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// An operation needed resources that `init` has not created
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),
}

impl From<GpuError> for RenderError {
    fn from(err: GpuError) -> Self {
        match err {
            GpuError::ShaderCompile { .. } => Self::ShaderCompileFailure(err.to_string()),
            GpuError::ShaderLink { .. } => Self::ShaderLinkFailure(err.to_string()),
            GpuError::ResourceCreation(_) | GpuError::InvalidHandle(_) => Self::ResourceCreationFailed(err.to_string()),
        }
    }
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::ShaderStage;

    #[test]
    fn test_gpu_error_mapping() {
        let compile = GpuError::ShaderCompile { stage: ShaderStage::Vertex, log: "bad".into() };
        assert!(matches!(RenderError::from(compile), RenderError::ShaderCompileFailure(_)));

        let link = GpuError::ShaderLink { log: "bad".into() };
        assert!(matches!(RenderError::from(link), RenderError::ShaderLinkFailure(_)));

        let invalid = GpuError::InvalidHandle("buffer");
        assert!(matches!(RenderError::from(invalid), RenderError::ResourceCreationFailed(_)));
    }
}
