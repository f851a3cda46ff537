//! Cube-map face loading
//!
//! Stages name their cube maps with a printf-style pattern such as
//! `cubemaps/stpeters_phong_m%02d_c%02d.bmp`, where the first placeholder is
//! the mip level and the second the face index. [`format_face_name`] expands
//! the pattern; a [`CubemapLoader`] turns the resulting name into pixels on the
//! currently allocated cube-map texture.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use bitflags::bitflags;

use crate::assets::{AssetError, ImageData};
use crate::core::AssetConfig;
use crate::gpu::{CubeFace, GpuDevice, TextureId};

bitflags! {
    /// Per-face upload options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaceLoadFlags: u32 {
        /// Treat the image as sRGB-encoded
        const SRGB = 0b1;
    }
}

/// Loads a single cube-map face into an existing texture
///
/// Failure is reported to the caller but never rolled back: faces uploaded
/// before a failure stay in the texture.
pub trait CubemapLoader {
    /// Resolve `resource_name` and upload it as `face` of `mip_level`
    fn load_cubemap_face(
        &mut self,
        device: &mut dyn GpuDevice,
        texture: TextureId,
        resource_name: &str,
        face: CubeFace,
        mip_level: u32,
        flags: FaceLoadFlags,
    ) -> Result<(), AssetError>;
}

/// Expand a face-name pattern for one mip level and face
///
/// Supports `%d`, `%Nd`, `%0Nd` and `%%`. Placeholders consume the arguments
/// `mip_level` then `face` from left to right; placeholders beyond the second
/// and unknown conversions are copied through unchanged. Patterns without
/// placeholders (such as `none`) expand to themselves.
pub fn format_face_name(pattern: &str, mip_level: u32, face: CubeFace) -> String {
    let args = [mip_level, face.index()];
    let mut next_arg = args.iter();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut spec = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_ascii_digit() {
                spec.push(d);
                chars.next();
            } else {
                break;
            }
        }

        if chars.peek() == Some(&'d') {
            if let Some(value) = next_arg.next() {
                chars.next();
                let zero_pad = spec.starts_with('0');
                let width: usize = spec.parse().unwrap_or(0);
                // Writing to a String cannot fail.
                let _ = if zero_pad {
                    write!(out, "{value:0width$}")
                } else {
                    write!(out, "{value:width$}")
                };
                continue;
            }
        }

        out.push('%');
        out.push_str(&spec);
    }

    out
}

/// Loads faces from image files under an asset root
#[derive(Debug, Clone)]
pub struct FileCubemapLoader {
    root: PathBuf,
    force_srgb: bool,
}

impl FileCubemapLoader {
    /// Create a loader resolving names against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            force_srgb: false,
        }
    }

    /// Loader for the asset section of the application config
    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(&config.assets_dir).with_srgb(config.srgb_cubemaps)
    }

    /// Upload every face as sRGB regardless of the per-call flags
    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.force_srgb = srgb;
        self
    }

    /// Asset root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CubemapLoader for FileCubemapLoader {
    fn load_cubemap_face(
        &mut self,
        device: &mut dyn GpuDevice,
        texture: TextureId,
        resource_name: &str,
        face: CubeFace,
        mip_level: u32,
        flags: FaceLoadFlags,
    ) -> Result<(), AssetError> {
        let path = self.root.join(resource_name);
        let image = ImageData::from_file(&path)?;

        if !image.is_square() {
            return Err(AssetError::LoadFailed(format!(
                "Cube-map face {} is {}x{}, faces must be square",
                path.display(),
                image.width,
                image.height
            )));
        }

        let srgb = self.force_srgb || flags.contains(FaceLoadFlags::SRGB);
        device
            .upload_cubemap_face(texture, face, mip_level, &image, srgb)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))
    }
}
