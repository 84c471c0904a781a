//! Building a half-edge store from an indexed triangle mesh and back.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{Face, FaceId, HalfEdge, HalfEdgeId, TopologyError, TriMesh, Vertex, VertexId};
use crate::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Builds the store from an indexed triangle mesh.
    ///
    /// Fails on out-of-range indices, degenerate triangles (a repeated
    /// vertex) and non-manifold configurations (a directed edge shared by
    /// more than one triangle, which also catches inconsistent winding).
    /// Vertices referenced by no triangle are kept as dead slots so the
    /// vertex indexing of the input is preserved.
    pub fn from_tri_mesh(tri: &TriMesh) -> Result<Self, TopologyError> {
        let mut mesh = Self {
            vertices: tri
                .positions
                .iter()
                .enumerate()
                .map(|(i, p)| Vertex {
                    id: VertexId(i as u32),
                    position: *p,
                    half_edge: None,
                })
                .collect(),
            half_edges: Vec::with_capacity(tri.triangles.len() * 3),
            faces: Vec::with_capacity(tri.triangles.len()),
            edge_map: HashMap::with_capacity(tri.triangles.len() * 3),
            live_vertices: 0,
            live_faces: 0,
        };

        for (index, triangle) in tri.triangles.iter().enumerate() {
            let [a, b, c] = *triangle;
            if a == b || b == c || c == a {
                let vertex = if a == b { a } else { c };
                return Err(TopologyError::DegenerateTriangle { index, vertex });
            }
            for v in [a, b, c] {
                if v as usize >= mesh.vertices.len() {
                    return Err(TopologyError::VertexOutOfRange {
                        index,
                        vertex: v,
                        count: mesh.vertices.len(),
                    });
                }
            }

            let face_id = FaceId(mesh.faces.len() as u32);
            let base = mesh.half_edges.len() as u32;
            let ids = [HalfEdgeId(base), HalfEdgeId(base + 1), HalfEdgeId(base + 2)];
            let corners = [VertexId(a), VertexId(b), VertexId(c)];

            for i in 0..3 {
                let origin = corners[i];
                let dest = corners[(i + 1) % 3];
                if mesh.edge_map.insert((origin, dest), ids[i]).is_some() {
                    return Err(TopologyError::NonManifoldEdge {
                        from: origin,
                        to: dest,
                    });
                }
                mesh.half_edges.push(HalfEdge {
                    id: ids[i],
                    origin,
                    twin: mesh.edge_map.get(&(dest, origin)).copied(),
                    next: ids[(i + 1) % 3],
                    prev: ids[(i + 2) % 3],
                    face: Some(face_id),
                });
                if mesh.vertices[origin.index()].half_edge.is_none() {
                    mesh.vertices[origin.index()].half_edge = Some(ids[i]);
                }
            }
            mesh.faces.push(Face {
                id: face_id,
                half_edge: ids[0],
            });
        }

        // Twin links were filled from the edge map as edges appeared; the
        // earlier of each pair still has `None`.
        for i in 0..mesh.half_edges.len() {
            if mesh.half_edges[i].twin.is_none() {
                let origin = mesh.half_edges[i].origin;
                let dest = mesh.half_edges[mesh.half_edges[i].next.index()].origin;
                mesh.half_edges[i].twin = mesh.edge_map.get(&(dest, origin)).copied();
            }
        }

        mesh.live_vertices = mesh
            .vertices
            .iter()
            .filter(|v| v.half_edge.is_some())
            .count();
        mesh.live_faces = mesh.faces.len();

        debug!(
            vertices = mesh.live_vertices,
            faces = mesh.live_faces,
            half_edges = mesh.half_edges.len(),
            "built half-edge mesh"
        );
        Ok(mesh)
    }

    /// Exports the live topology back to an indexed triangle mesh.
    ///
    /// The position array keeps one entry per vertex *slot* (dead slots
    /// retain their last position), so triangle indices in the output line
    /// up with [`VertexId`] values and survive collapse/split replay.
    pub fn to_tri_mesh(&self) -> TriMesh {
        let positions = self.vertices.iter().map(|v| v.position).collect();
        let mut triangles = Vec::with_capacity(self.live_faces);
        for face in &self.faces {
            if !self.is_face_live(face.id) {
                continue;
            }
            if let Some([a, b, c]) = self.face_vertices(face.id) {
                triangles.push([a.0, b.0, c.0]);
            }
        }
        TriMesh {
            positions,
            triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    #[test]
    fn twin_links_are_symmetric() {
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::uv_sphere(8, 5)).unwrap();
        for he in mesh.half_edges() {
            let twin = he.twin.expect("closed mesh");
            assert_eq!(mesh.half_edge(twin).unwrap().twin, Some(he.id));
        }
    }

    #[test]
    fn unreferenced_vertices_stay_as_dead_slots() {
        let mut tri = shapes::unit_cube();
        tri.positions.push(glam::Vec3::splat(9.0));
        let mesh = HalfEdgeMesh::from_tri_mesh(&tri).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert!(!mesh.is_vertex_live(VertexId(8)));
        let out = mesh.to_tri_mesh();
        assert_eq!(out.positions.len(), 9);
    }
}
