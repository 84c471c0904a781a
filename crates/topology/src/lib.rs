//! Half-edge topology store for progressive mesh simplification.
//!
//! The store keeps vertices, half-edges and faces in append-only slot
//! arrays. Mutations never move or reuse slots: removed entities are marked
//! dead in place (`HalfEdge::face == None`, `Vertex::half_edge == None`, a
//! face whose anchor no longer points back at it). This keeps every index
//! in a recorded operation valid forever, which is what makes collapse
//! records replayable in LIFO order by [`HalfEdgeMesh::split_vertex`].

mod construction;
mod mutators;
pub mod shapes;
mod traversal;
mod types;
mod validation;

pub use mutators::{CollapseRecord, NORMAL_FLIP_TOLERANCE};
pub use types::{Face, FaceId, HalfEdge, HalfEdgeId, TopologyError, TriMesh, Vertex, VertexId};

use std::collections::HashMap;

/// Editable triangle mesh over slot arrays plus a directed edge lookup map.
///
/// The `edge_map` keys every *live* directed edge `(origin, dest)` to its
/// half-edge and is maintained through every mutation, so `find_half_edge`
/// stays O(1) during simplification.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) half_edges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
    pub(crate) edge_map: HashMap<(VertexId, VertexId), HalfEdgeId>,
    pub(crate) live_vertices: usize,
    pub(crate) live_faces: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use glam::Vec3;

    #[test]
    fn import_single_triangle() {
        let tri = TriMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        );
        let mesh = HalfEdgeMesh::from_tri_mesh(&tri).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        // All three edges are boundary.
        for he in mesh.half_edges() {
            assert!(he.twin.is_none());
        }
        mesh.validate().unwrap();
    }

    #[test]
    fn import_cube_is_closed() {
        let cube = shapes::unit_cube();
        let mesh = HalfEdgeMesh::from_tri_mesh(&cube).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 12);
        for he in mesh.half_edges() {
            assert!(he.twin.is_some(), "closed mesh has no boundary edges");
        }
        mesh.validate().unwrap();
    }

    #[test]
    fn round_trip_preserves_geometry() {
        let cube = shapes::unit_cube();
        let mesh = HalfEdgeMesh::from_tri_mesh(&cube).unwrap();
        let out = mesh.to_tri_mesh();
        assert_eq!(out.face_count(), cube.face_count());
        assert_eq!(out.vertex_count(), cube.vertex_count());
        assert!((out.surface_area() - cube.surface_area()).abs() < 1e-5);
    }

    #[test]
    fn import_rejects_degenerate_triangle() {
        let tri = TriMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 1]]);
        assert!(matches!(
            HalfEdgeMesh::from_tri_mesh(&tri),
            Err(TopologyError::DegenerateTriangle { index: 0, vertex: 1 })
        ));
    }

    #[test]
    fn import_rejects_out_of_range_index() {
        let tri = TriMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 7]]);
        assert!(matches!(
            HalfEdgeMesh::from_tri_mesh(&tri),
            Err(TopologyError::VertexOutOfRange { vertex: 7, .. })
        ));
    }

    #[test]
    fn import_rejects_non_manifold_fan() {
        // Three triangles sharing the edge 0 -> 1 with the same direction.
        let tri = TriMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, Vec3::NEG_Z],
            vec![[0, 1, 2], [0, 1, 3], [0, 1, 4]],
        );
        assert!(matches!(
            HalfEdgeMesh::from_tri_mesh(&tri),
            Err(TopologyError::NonManifoldEdge { .. })
        ));
    }
}
