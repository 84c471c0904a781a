//! Core identifier and entity types for the half-edge store.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a vertex slot. Slots are never reused or compacted, so an id
/// stays valid (possibly dead) for the lifetime of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Index of a half-edge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HalfEdgeId(pub u32);

/// Index of a face slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl HalfEdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FaceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A mesh vertex. `half_edge` anchors one outgoing half-edge; `None` marks
/// a dead (collapsed or isolated) vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec3,
    pub half_edge: Option<HalfEdgeId>,
}

/// A directed half-edge. `twin: None` marks a boundary edge. `face: None`
/// marks a dead half-edge; `next`/`prev` of dead slots are stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalfEdge {
    pub id: HalfEdgeId,
    pub origin: VertexId,
    pub twin: Option<HalfEdgeId>,
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
    pub face: Option<FaceId>,
}

/// A triangular face, anchored by one of its three half-edges. A face is
/// live iff its anchor half-edge still points back at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub id: FaceId,
    pub half_edge: HalfEdgeId,
}

/// Indexed triangle soup, the interchange format at the crate boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Mean length over all triangle edges (interior edges count twice,
    /// once per incident triangle).
    pub fn mean_edge_length(&self) -> f32 {
        if self.triangles.is_empty() {
            return 0.0;
        }
        let mut total = 0.0f32;
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| self.positions[i as usize]);
            total += a.distance(b) + b.distance(c) + c.distance(a);
        }
        total / (3.0 * self.triangles.len() as f32)
    }

    pub fn surface_area(&self) -> f32 {
        self.triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.map(|i| self.positions[i as usize]);
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    /// Diagonal length of the axis-aligned bounding box.
    pub fn bounding_box_size(&self) -> f32 {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in &self.positions {
            min = min.min(*p);
            max = max.max(*p);
        }
        if self.positions.is_empty() {
            0.0
        } else {
            (max - min).length()
        }
    }
}

/// Errors raised by mesh import and topology mutation.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("triangle {index} repeats vertex {vertex}")]
    DegenerateTriangle { index: usize, vertex: u32 },

    #[error("triangle {index} references vertex {vertex} but only {count} vertices exist")]
    VertexOutOfRange {
        index: usize,
        vertex: u32,
        count: usize,
    },

    #[error("directed edge {from:?} -> {to:?} appears in more than one triangle")]
    NonManifoldEdge { from: VertexId, to: VertexId },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("operation record does not match the current mesh state: {0}")]
    ReplayOrderViolation(String),
}
