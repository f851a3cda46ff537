//! Shader source resolution
//!
//! Programs are compiled from GLSL text. A configured path is tried first
//! relative to the asset root, then as given; if neither exists the source
//! compiled into the crate is used so the renderers work out of the box.

use std::path::{Path, PathBuf};

use crate::core::ShaderConfig;
use crate::gpu::ShaderSource;

/// Built-in teapot vertex stage
pub const TEAPOT_VERTEX: &str = include_str!("../../shaders/teapot.vert");
/// Built-in teapot fragment stage
pub const TEAPOT_FRAGMENT: &str = include_str!("../../shaders/teapot.frag");
/// Built-in skybox vertex stage
pub const SKYBOX_VERTEX: &str = include_str!("../../shaders/skybox.vert");
/// Built-in skybox fragment stage
pub const SKYBOX_FRAGMENT: &str = include_str!("../../shaders/skybox.frag");

/// Which built-in program to fall back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProgram {
    /// Reflective teapot
    Teapot,
    /// Environment box
    Skybox,
}

impl BuiltinProgram {
    /// The compiled-in source pair
    pub fn source(self) -> ShaderSource {
        let (vertex, fragment) = match self {
            Self::Teapot => (TEAPOT_VERTEX, TEAPOT_FRAGMENT),
            Self::Skybox => (SKYBOX_VERTEX, SKYBOX_FRAGMENT),
        };
        ShaderSource {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        }
    }
}

fn resolve_shader_path(assets_dir: &Path, path: &str) -> Option<PathBuf> {
    [assets_dir.join(path), PathBuf::from(path)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn read_stage(assets_dir: &Path, path: &str, builtin: String) -> String {
    let Some(resolved) = resolve_shader_path(assets_dir, path) else {
        log::debug!("Shader {} not found, using built-in source", path);
        return builtin;
    };

    match std::fs::read_to_string(&resolved) {
        Ok(text) => {
            log::debug!("Loaded shader {}", resolved.display());
            text
        }
        Err(e) => {
            log::warn!("Failed to read shader {}: {}, using built-in source", resolved.display(), e);
            builtin
        }
    }
}

/// Load the source pair named by `config`, stage by stage
pub fn load_shader_source(config: &ShaderConfig, assets_dir: &Path, builtin: BuiltinProgram) -> ShaderSource {
    let fallback = builtin.source();
    ShaderSource {
        vertex: read_stage(assets_dir, &config.vertex_shader_path, fallback.vertex),
        fragment: read_stage(assets_dir, &config.fragment_shader_path, fallback.fragment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sources_declare_attributes() {
        let teapot = BuiltinProgram::Teapot.source();
        assert!(teapot.vertex.contains("myVertex"));
        assert!(teapot.vertex.contains("myNormal"));
        assert!(teapot.fragment.contains("vRoughness"));

        let skybox = BuiltinProgram::Skybox.source();
        assert!(!skybox.vertex.contains("myNormal"));
        assert!(skybox.fragment.contains("sCubemapTexture"));
    }

    #[test]
    fn test_missing_files_fall_back() {
        let config = ShaderConfig::new("does/not/exist.vert", "does/not/exist.frag");
        let source = load_shader_source(&config, Path::new("/nonexistent"), BuiltinProgram::Skybox);
        assert_eq!(source, BuiltinProgram::Skybox.source());
    }

    #[test]
    fn test_file_overrides_single_stage() {
        let dir = std::env::temp_dir().join(format!("teapot_engine_shader_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("shaders")).expect("create dir");
        std::fs::write(dir.join("shaders/custom.frag"), "// custom").expect("write shader");

        let config = ShaderConfig::new("shaders/missing.vert", "shaders/custom.frag");
        let source = load_shader_source(&config, &dir, BuiltinProgram::Teapot);
        std::fs::remove_dir_all(&dir).expect("remove dir");
        assert_eq!(source.vertex, TEAPOT_VERTEX);
        assert_eq!(source.fragment, "// custom");
        assert!(!dir.exists());
    }
}
