//! Structural integrity checks, used by tests and debug assertions.

use crate::types::{TopologyError, VertexId};
use crate::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Checks every structural invariant of the store: triangle cycles,
    /// twin symmetry, face anchoring, vertex anchoring, edge-map
    /// consistency and the live-entity counters.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut live_half_edges = 0usize;
        for he in &self.half_edges {
            let Some(face) = he.face else {
                continue;
            };
            live_half_edges += 1;

            // next/prev form a 3-cycle within one face.
            let n1 = &self.half_edges[he.next.index()];
            let n2 = &self.half_edges[n1.next.index()];
            if n2.next != he.id {
                return Err(TopologyError::InvalidTopology(format!(
                    "half-edge {:?} is not on a triangle cycle",
                    he.id
                )));
            }
            if n1.prev != he.id || he.prev != n2.id {
                return Err(TopologyError::InvalidTopology(format!(
                    "next/prev asymmetry at half-edge {:?}",
                    he.id
                )));
            }
            if n1.face != Some(face) || n2.face != Some(face) {
                return Err(TopologyError::InvalidTopology(format!(
                    "half-edge {:?} cycle crosses faces",
                    he.id
                )));
            }

            if let Some(t) = he.twin {
                let twin = &self.half_edges[t.index()];
                if twin.twin != Some(he.id) {
                    return Err(TopologyError::InvalidTopology(format!(
                        "twin asymmetry between {:?} and {t:?}",
                        he.id
                    )));
                }
                if twin.face.is_none() {
                    return Err(TopologyError::InvalidTopology(format!(
                        "live half-edge {:?} twinned with dead {t:?}",
                        he.id
                    )));
                }
                let he_dest = self.half_edges[he.next.index()].origin;
                let twin_dest = self.half_edges[twin.next.index()].origin;
                if twin.origin != he_dest || he.origin != twin_dest {
                    return Err(TopologyError::InvalidTopology(format!(
                        "twins {:?}/{t:?} do not carry opposite directions",
                        he.id
                    )));
                }
            }

            let dest = self.half_edges[he.next.index()].origin;
            if he.origin == dest {
                return Err(TopologyError::InvalidTopology(format!(
                    "half-edge {:?} is a self-loop at {:?}",
                    he.id, he.origin
                )));
            }
            if self.edge_map.get(&(he.origin, dest)) != Some(&he.id) {
                return Err(TopologyError::InvalidTopology(format!(
                    "edge map does not carry {:?} -> {:?} for {:?}",
                    he.origin, dest, he.id
                )));
            }
        }

        if self.edge_map.len() != live_half_edges {
            return Err(TopologyError::InvalidTopology(format!(
                "edge map holds {} entries for {live_half_edges} live half-edges",
                self.edge_map.len()
            )));
        }

        let mut live_faces = 0usize;
        for face in &self.faces {
            let anchor = &self.half_edges[face.half_edge.index()];
            if anchor.face == Some(face.id) {
                live_faces += 1;
            }
        }
        if live_faces != self.live_faces {
            return Err(TopologyError::InvalidTopology(format!(
                "face counter {} does not match {} live faces",
                self.live_faces, live_faces
            )));
        }
        if live_half_edges != live_faces * 3 {
            return Err(TopologyError::InvalidTopology(format!(
                "{live_half_edges} live half-edges for {live_faces} live faces"
            )));
        }

        let mut live_vertices = 0usize;
        for v in &self.vertices {
            let Some(anchor) = v.half_edge else {
                continue;
            };
            live_vertices += 1;
            let he = &self.half_edges[anchor.index()];
            if he.face.is_none() || he.origin != v.id {
                return Err(TopologyError::InvalidTopology(format!(
                    "vertex {:?} anchored to a dead or foreign half-edge {anchor:?}",
                    v.id
                )));
            }
        }
        if live_vertices != self.live_vertices {
            return Err(TopologyError::InvalidTopology(format!(
                "vertex counter {} does not match {} live vertices",
                self.live_vertices, live_vertices
            )));
        }

        Ok(())
    }

    /// Degree of a vertex, counting every distinct one-ring neighbor.
    pub fn vertex_degree(&self, v: VertexId) -> usize {
        self.vertex_neighbors(v).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    #[test]
    fn pristine_meshes_validate() {
        for tri in [
            shapes::unit_cube(),
            shapes::uv_sphere(12, 9),
            shapes::grid_plane(3, 4),
        ] {
            HalfEdgeMesh::from_tri_mesh(&tri).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn corruption_is_detected() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        mesh.half_edges[0].twin = None;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn cube_corner_degree() {
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        let degrees: Vec<usize> = (0..8)
            .map(|i| mesh.vertex_degree(VertexId(i)))
            .collect();
        // 18 edges (12 quad edges + 6 face diagonals): degree sum is 36.
        assert_eq!(degrees.iter().sum::<usize>(), 36);
    }
}
