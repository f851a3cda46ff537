//! Vertex records uploaded to static GPU buffers
//!
//! Both records are `#[repr(C)]` and `Pod`, so a geometry slice can be handed
//! to the device as raw bytes with `bytemuck::cast_slice`.

use bytemuck::{Pod, Zeroable};

use crate::gpu::{AttributeBinding, VertexAttribute, VertexLayout};

/// Attribute location of the position input
pub const ATTRIB_VERTEX: u32 = 0;
/// Attribute location of the normal input
pub const ATTRIB_NORMAL: u32 = 1;
/// Attribute location reserved for texture coordinates
pub const ATTRIB_UV: u32 = 2;

/// Attribute names bound before linking the teapot program
pub const MESH_ATTRIBUTES: &[AttributeBinding] = &[
    AttributeBinding { location: ATTRIB_VERTEX, name: "myVertex" },
    AttributeBinding { location: ATTRIB_NORMAL, name: "myNormal" },
    AttributeBinding { location: ATTRIB_UV, name: "myUV" },
];

/// Attribute names bound before linking the skybox program
pub const SKYBOX_ATTRIBUTES: &[AttributeBinding] = &[
    AttributeBinding { location: ATTRIB_VERTEX, name: "myVertex" },
];

/// Position + normal vertex used by the teapot
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Unit normal
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// Interleaved layout: position at 0, normal at 12, 24-byte stride
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<Self>() as i32,
        attributes: &[
            VertexAttribute { location: ATTRIB_VERTEX, components: 3, offset: 0 },
            VertexAttribute { location: ATTRIB_NORMAL, components: 3, offset: 12 },
        ],
    };

    /// Create a vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Position-only vertex used by the skybox
///
/// The skybox samples its cube map with the interpolated position, so no
/// normal slot is carried and none is enabled at draw time.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyboxVertex {
    /// Object-space position
    pub position: [f32; 3],
}

impl SkyboxVertex {
    /// Tightly packed positions, 12-byte stride
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<Self>() as i32,
        attributes: &[VertexAttribute { location: ATTRIB_VERTEX, components: 3, offset: 0 }],
    };
}
