//! Accessors, liveness predicates and one-ring traversal.

use glam::Vec3;

use crate::types::{Face, FaceId, HalfEdge, HalfEdgeId, Vertex, VertexId};
use crate::HalfEdgeMesh;

impl HalfEdgeMesh {
    #[inline]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    #[inline]
    pub fn half_edge(&self, id: HalfEdgeId) -> Option<&HalfEdge> {
        self.half_edges.get(id.index())
    }

    #[inline]
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    /// Number of live faces.
    pub fn face_count(&self) -> usize {
        self.live_faces
    }

    /// Number of vertex slots, live or dead.
    pub fn vertex_slots(&self) -> usize {
        self.vertices.len()
    }

    /// Number of half-edge slots, live or dead.
    pub fn half_edge_slots(&self) -> usize {
        self.half_edges.len()
    }

    /// Number of face slots, live or dead.
    pub fn face_slots(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_vertex_live(&self, id: VertexId) -> bool {
        self.vertex(id).is_some_and(|v| v.half_edge.is_some())
    }

    #[inline]
    pub fn is_half_edge_live(&self, id: HalfEdgeId) -> bool {
        self.half_edge(id).is_some_and(|h| h.face.is_some())
    }

    #[inline]
    pub fn is_face_live(&self, id: FaceId) -> bool {
        self.face(id)
            .is_some_and(|f| self.half_edges[f.half_edge.index()].face == Some(id))
    }

    /// Head vertex of a half-edge (the origin of its `next`).
    #[inline]
    pub fn dest(&self, id: HalfEdgeId) -> Option<VertexId> {
        let he = self.half_edge(id)?;
        Some(self.half_edges[he.next.index()].origin)
    }

    /// Live half-edge for the directed edge `from -> to`, if present.
    pub fn find_half_edge(&self, from: VertexId, to: VertexId) -> Option<HalfEdgeId> {
        self.edge_map.get(&(from, to)).copied()
    }

    /// True when the edge carried by `id` has no twin.
    pub fn is_boundary_edge(&self, id: HalfEdgeId) -> bool {
        self.half_edge(id).is_some_and(|h| h.twin.is_none())
    }

    /// The three half-edges of a live face, in cycle order from its anchor.
    pub fn face_half_edges(&self, id: FaceId) -> Option<[HalfEdgeId; 3]> {
        if !self.is_face_live(id) {
            return None;
        }
        let h0 = self.faces[id.index()].half_edge;
        let h1 = self.half_edges[h0.index()].next;
        let h2 = self.half_edges[h1.index()].next;
        Some([h0, h1, h2])
    }

    /// The three corner vertices of a live face.
    pub fn face_vertices(&self, id: FaceId) -> Option<[VertexId; 3]> {
        self.face_half_edges(id)
            .map(|hs| hs.map(|h| self.half_edges[h.index()].origin))
    }

    /// Corner positions of a live face.
    pub fn face_positions(&self, id: FaceId) -> Option<[Vec3; 3]> {
        self.face_vertices(id)
            .map(|vs| vs.map(|v| self.vertices[v.index()].position))
    }

    /// Unit normal of a live face, zero for degenerate geometry.
    pub fn face_normal(&self, id: FaceId) -> Option<Vec3> {
        let [a, b, c] = self.face_positions(id)?;
        Some((b - a).cross(c - a).normalize_or_zero())
    }

    /// Centroid of a live face.
    pub fn face_centroid(&self, id: FaceId) -> Option<Vec3> {
        let [a, b, c] = self.face_positions(id)?;
        Some((a + b + c) / 3.0)
    }

    /// All live outgoing half-edges of a vertex, walking the ring in both
    /// directions so boundary vertices still enumerate their full fan.
    pub fn vertex_half_edges(&self, v: VertexId) -> Vec<HalfEdgeId> {
        let mut out = Vec::new();
        let Some(start) = self.vertex(v).and_then(|vert| vert.half_edge) else {
            return out;
        };

        // Around the vertex one way: twin of the incoming half-edge.
        let mut current = start;
        loop {
            if out.contains(&current) {
                break;
            }
            out.push(current);
            let prev = self.half_edges[current.index()].prev;
            match self.half_edges[prev.index()].twin {
                Some(t) if t != start => current = t,
                Some(_) => break,
                None => {
                    // Hit a boundary: sweep the other way from the anchor.
                    let mut cur = start;
                    while let Some(t) = self.half_edges[cur.index()].twin {
                        let next = self.half_edges[t.index()].next;
                        if out.contains(&next) {
                            break;
                        }
                        out.push(next);
                        cur = next;
                    }
                    break;
                }
            }
        }
        out
    }

    /// All live faces incident to a vertex.
    pub fn vertex_faces(&self, v: VertexId) -> Vec<FaceId> {
        let mut out = Vec::new();
        for he in self.vertex_half_edges(v) {
            if let Some(f) = self.half_edges[he.index()].face {
                if !out.contains(&f) {
                    out.push(f);
                }
            }
        }
        out
    }

    /// One-ring neighbor vertices, including neighbors reached only by an
    /// incoming boundary half-edge.
    pub fn vertex_neighbors(&self, v: VertexId) -> Vec<VertexId> {
        let mut out = Vec::new();
        for he in self.vertex_half_edges(v) {
            if let Some(d) = self.dest(he) {
                if !out.contains(&d) {
                    out.push(d);
                }
            }
            let prev = self.half_edges[he.index()].prev;
            let o = self.half_edges[prev.index()].origin;
            if !out.contains(&o) {
                out.push(o);
            }
        }
        out
    }

    /// True when the vertex touches at least one boundary edge.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertex_half_edges(v).iter().any(|&he| {
            self.half_edges[he.index()].twin.is_none()
                || self
                    .half_edges
                    .get(self.half_edges[he.index()].prev.index())
                    .is_some_and(|p| p.twin.is_none())
        })
    }

    /// The faces sharing the edge carried by `id`: its own face plus the
    /// twin's for an interior edge, `None` in the second slot for a
    /// boundary edge.
    pub fn edge_faces(&self, id: HalfEdgeId) -> Option<(FaceId, Option<FaceId>)> {
        let he = self.half_edge(id)?;
        let face = he.face?;
        let other = he.twin.and_then(|t| self.half_edges[t.index()].face);
        Some((face, other))
    }

    /// Live faces incident to either endpoint of the edge carried by `id`,
    /// deduplicated.
    pub fn edge_ring_faces(&self, id: HalfEdgeId) -> Vec<FaceId> {
        let Some(he) = self.half_edge(id) else {
            return Vec::new();
        };
        let Some(dest) = self.dest(id) else {
            return Vec::new();
        };
        let mut out = self.vertex_faces(he.origin);
        for f in self.vertex_faces(dest) {
            if !out.contains(&f) {
                out.push(f);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use crate::TriMesh;
    use glam::Vec3 as V;

    #[test]
    fn interior_vertex_ring_is_complete() {
        // 3x3 grid: vertex 4 is interior with 6 incident faces.
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::grid_plane(2, 2)).unwrap();
        let ring = mesh.vertex_half_edges(VertexId(4));
        assert_eq!(ring.len(), 6);
        assert!(ring
            .iter()
            .all(|&he| mesh.half_edge(he).unwrap().origin == VertexId(4)));
        assert_eq!(mesh.vertex_faces(VertexId(4)).len(), 6);
        assert_eq!(mesh.vertex_neighbors(VertexId(4)).len(), 6);
        assert!(!mesh.is_boundary_vertex(VertexId(4)));
    }

    #[test]
    fn boundary_vertex_ring_covers_both_sides() {
        // Grid corner and edge vertices sit on the boundary.
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::grid_plane(2, 2)).unwrap();
        // Vertex 1 (mid bottom edge): faces on both sides of its anchor.
        let faces = mesh.vertex_faces(VertexId(1));
        assert_eq!(faces.len(), 3);
        assert!(mesh.is_boundary_vertex(VertexId(1)));
        assert_eq!(mesh.vertex_neighbors(VertexId(1)).len(), 4);
    }

    #[test]
    fn find_half_edge_agrees_with_faces() {
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        for face in mesh.faces() {
            let [a, b, c] = mesh.face_vertices(face.id).unwrap();
            for (from, to) in [(a, b), (b, c), (c, a)] {
                let he = mesh.find_half_edge(from, to).unwrap();
                assert_eq!(mesh.half_edge(he).unwrap().origin, from);
                assert_eq!(mesh.dest(he), Some(to));
            }
        }
    }

    #[test]
    fn face_normal_points_outward_on_cube() {
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        let center = V::splat(0.5);
        for face in mesh.faces() {
            let n = mesh.face_normal(face.id).unwrap();
            let c = mesh.face_centroid(face.id).unwrap();
            assert!(n.dot(c - center) > 0.0);
        }
    }

    #[test]
    fn edge_faces_distinguishes_interior_from_boundary() {
        let cube = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        for he in cube.half_edges() {
            let (own, other) = cube.edge_faces(he.id).unwrap();
            assert_eq!(Some(own), he.face);
            assert!(other.is_some(), "closed mesh has no boundary edges");
            assert_ne!(Some(own), other);
        }

        let tri = TriMesh::new(vec![V::ZERO, V::X, V::Y], vec![[0, 1, 2]]);
        let mesh = HalfEdgeMesh::from_tri_mesh(&tri).unwrap();
        let he = mesh.find_half_edge(VertexId(0), VertexId(1)).unwrap();
        assert_eq!(mesh.edge_faces(he), Some((FaceId(0), None)));
    }

    #[test]
    fn single_triangle_boundary_queries() {
        let tri = TriMesh::new(vec![V::ZERO, V::X, V::Y], vec![[0, 1, 2]]);
        let mesh = HalfEdgeMesh::from_tri_mesh(&tri).unwrap();
        for v in [VertexId(0), VertexId(1), VertexId(2)] {
            assert!(mesh.is_boundary_vertex(v));
            assert_eq!(mesh.vertex_faces(v).len(), 1);
            assert_eq!(mesh.vertex_neighbors(v).len(), 2);
        }
    }
}
