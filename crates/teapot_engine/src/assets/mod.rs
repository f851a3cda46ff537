//! Asset loading
//!
//! Image decoding for cube-map faces and the loader collaborator that resolves
//! face names against an asset root and uploads them to the device.

pub mod image_loader;
pub mod cubemap_loader;

pub use image_loader::ImageData;
pub use cubemap_loader::{CubemapLoader, FaceLoadFlags, FileCubemapLoader, format_face_name};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The resolved file does not exist
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The file exists but could not be decoded or uploaded
    #[error("Asset load failed: {0}")]
    LoadFailed(String),

    /// The file extension is not a supported image format
    #[error("Unsupported asset format: {0}")]
    UnsupportedFormat(String),

    /// Underlying IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
