//! Geometry streams for ribbons and quads

use bytemuck::{Pod, Zeroable};
use drizzle_core::{Quat, Transform, Vec3};
use serde::{Deserialize, Serialize};

/// A ribbon/quad vertex with position and UV
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TrailVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl TrailVertex {
    pub fn new(position: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            uv,
        }
    }
}

/// How ribbon UVs advance along the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMode {
    /// U runs 0..1 over the whole ribbon
    #[default]
    Stretch,
    /// U advances by one per path node
    Tile,
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<TrailVertex>,
    pub indices: Vec<u32>,
}

const QUAD_VERTICES: [TrailVertex; 4] = [
    TrailVertex { position: [1.0, 1.0, 0.0], uv: [1.0, 1.0] },
    TrailVertex { position: [1.0, -1.0, 0.0], uv: [1.0, 0.0] },
    TrailVertex { position: [-1.0, 1.0, 0.0], uv: [0.0, 1.0] },
    TrailVertex { position: [-1.0, -1.0, 0.0], uv: [0.0, 0.0] },
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

impl Mesh {
    /// The 2x2 unit quad every quad drawer instances
    pub fn quad() -> Self {
        Self {
            vertices: QUAD_VERTICES.to_vec(),
            indices: QUAD_INDICES.to_vec(),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for buffer upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for buffer upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Placement of a quad drawer in emitter-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadPlacement {
    pub position: Vec3,
    /// Roll around the view axis, in degrees
    pub roll_degrees: f32,
    pub scale: Vec3,
}

impl Default for QuadPlacement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            roll_degrees: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl QuadPlacement {
    pub fn to_transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: Quat::from_rotation_z(self.roll_degrees.to_radians()),
            scale: self.scale,
        }
    }

    /// Quad corners in emitter-local space
    pub fn corners(&self) -> [Vec3; 4] {
        let t = self.to_transform();
        QUAD_VERTICES.map(|v| t.transform_point(Vec3::from_array(v.position)))
    }
}
