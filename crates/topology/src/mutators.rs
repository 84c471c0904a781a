//! Edge collapse, vertex split and the reversible operation record.
//!
//! A collapse removes the head vertex `vt`, one or two faces and their
//! half-edges, and moves the surviving tail vertex `vs` to a target
//! position. Everything removed is cloned into the [`CollapseRecord`]
//! before the rewire, together with the twin and anchor pointers the
//! rewire overwrites. [`HalfEdgeMesh::split_vertex`] undoes the collapse by
//! writing those clones straight back into their original slots, which is
//! exact because slots are never moved or reused.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

use crate::types::{Face, FaceId, HalfEdge, HalfEdgeId, TopologyError, Vertex, VertexId};
use crate::HalfEdgeMesh;

/// A collapse is rejected when a surviving face normal would rotate past
/// this dot-product threshold against its previous normal.
pub const NORMAL_FLIP_TOLERANCE: f32 = -0.5;

/// Everything needed to undo one edge collapse, or to replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapseRecord {
    /// Surviving tail vertex.
    pub vs: VertexId,
    /// Removed head vertex.
    pub vt: VertexId,
    /// The collapsed half-edge `vs -> vt`.
    pub half_edge: HalfEdgeId,
    /// Face on the left of the collapsed half-edge.
    pub left_face: FaceId,
    /// Face on the right, absent for a boundary collapse.
    pub right_face: Option<FaceId>,
    /// Position `vs` was moved to.
    pub target: Vec3,
    /// Position `vs` held before the collapse.
    pub vs_position_before: Vec3,

    removed_vertex: Vertex,
    removed_half_edges: Vec<HalfEdge>,
    removed_faces: Vec<Face>,
    /// Half-edges whose origin was redirected from `vt` to `vs`.
    redirected: Vec<HalfEdgeId>,
    /// Twin pointers overwritten by the boundary stitch.
    twin_restores: Vec<(HalfEdgeId, Option<HalfEdgeId>)>,
    /// Vertex anchors as they were before the collapse.
    anchor_restores: Vec<(VertexId, Option<HalfEdgeId>)>,
    /// Surviving vertices left with no incident face (boundary corners
    /// whose only faces were removed).
    isolated: Vec<VertexId>,
}

impl CollapseRecord {
    /// Ids of the faces this collapse removed.
    pub fn removed_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.removed_faces.iter().map(|f| f.id)
    }
}

impl HalfEdgeMesh {
    /// Collapses the edge carried by `he_id`, merging its head vertex into
    /// its tail vertex and moving the tail to `target`.
    ///
    /// The caller is expected to have vetted the collapse with
    /// [`HalfEdgeMesh::is_collapsible`]; this method only checks that the
    /// half-edge is live. Returns the record that undoes the operation.
    pub fn collapse_edge(
        &mut self,
        he_id: HalfEdgeId,
        target: Vec3,
    ) -> Result<CollapseRecord, TopologyError> {
        // --- Gather ---------------------------------------------------
        let h = self
            .half_edge(he_id)
            .cloned()
            .ok_or_else(|| TopologyError::InvalidTopology(format!("no half-edge {he_id:?}")))?;
        let Some(left_face) = h.face else {
            return Err(TopologyError::InvalidTopology(format!(
                "collapse of dead half-edge {he_id:?}"
            )));
        };
        let hn = self.half_edges[h.next.index()].clone();
        let hp = self.half_edges[h.prev.index()].clone();
        let vs = h.origin;
        let vt = hn.origin;
        let vl = hp.origin;

        let twin = h.twin.map(|t| self.half_edges[t.index()].clone());
        let (tn, tp, right_face) = match &twin {
            Some(t) => {
                let Some(rf) = t.face else {
                    return Err(TopologyError::InvalidTopology(format!(
                        "twin {:?} of {he_id:?} is dead",
                        t.id
                    )));
                };
                (
                    Some(self.half_edges[t.next.index()].clone()),
                    Some(self.half_edges[t.prev.index()].clone()),
                    Some(rf),
                )
            }
            None => (None, None, None),
        };
        let vr = tp.as_ref().map(|tp| tp.origin);

        let mut removed_half_edges = vec![h.clone(), hn.clone(), hp.clone()];
        if let Some(t) = &twin {
            removed_half_edges.push(t.clone());
        }
        if let (Some(tn), Some(tp)) = (&tn, &tp) {
            removed_half_edges.push(tn.clone());
            removed_half_edges.push(tp.clone());
        }
        let removed_ids: HashSet<HalfEdgeId> =
            removed_half_edges.iter().map(|e| e.id).collect();
        // Directed-edge keys of the removed half-edges, resolved while the
        // cycles are still intact.
        let removed_keys: Vec<(VertexId, VertexId)> = removed_half_edges
            .iter()
            .map(|e| (e.origin, self.half_edges[e.next.index()].origin))
            .collect();

        let mut removed_faces = vec![self.faces[left_face.index()].clone()];
        if let Some(rf) = right_face {
            removed_faces.push(self.faces[rf.index()].clone());
        }

        // Outer twins to stitch across the removed faces.
        let hn_t = hn.twin;
        let hp_t = hp.twin;
        let tn_t = tn.as_ref().and_then(|e| e.twin);
        let tp_t = tp.as_ref().and_then(|e| e.twin);

        // Surviving outgoing half-edges of vt, with their heads.
        let redirected: Vec<(HalfEdgeId, VertexId)> = self
            .vertex_half_edges(vt)
            .into_iter()
            .filter(|id| !removed_ids.contains(id))
            .map(|id| {
                let dest = self.half_edges[self.half_edges[id.index()].next.index()].origin;
                (id, dest)
            })
            .collect();

        // Anchor fallbacks for the vertices that may lose their anchor.
        let mut anchored = vec![(vs, self.vertices[vs.index()].half_edge)];
        anchored.push((vt, self.vertices[vt.index()].half_edge));
        for v in [Some(vl), vr].into_iter().flatten() {
            if !anchored.iter().any(|(a, _)| *a == v) {
                anchored.push((v, self.vertices[v.index()].half_edge));
            }
        }
        let fallback = |mesh: &Self, v: VertexId| -> Option<HalfEdgeId> {
            mesh.vertex_half_edges(v)
                .into_iter()
                .find(|id| !removed_ids.contains(id))
        };
        let vs_fallback = fallback(self, vs).or(redirected.first().map(|(id, _)| *id));
        let vl_fallback = fallback(self, vl);
        let vr_fallback = vr.and_then(|v| fallback(self, v));

        let mut twin_restores = Vec::new();
        for outer in [hn_t, hp_t, tn_t, tp_t].into_iter().flatten() {
            twin_restores.push((outer, self.half_edges[outer.index()].twin));
        }

        let vs_position_before = self.vertices[vs.index()].position;

        // --- Rewire ---------------------------------------------------
        for key in &removed_keys {
            self.edge_map.remove(key);
        }
        for id in &removed_ids {
            self.half_edges[id.index()].face = None;
            self.half_edges[id.index()].twin = None;
        }

        // Stitch the outer twins across each removed face pair.
        if let Some(a) = hn_t {
            self.half_edges[a.index()].twin = hp_t;
        }
        if let Some(b) = hp_t {
            self.half_edges[b.index()].twin = hn_t;
        }
        if let Some(a) = tn_t {
            self.half_edges[a.index()].twin = tp_t;
        }
        if let Some(b) = tp_t {
            self.half_edges[b.index()].twin = tn_t;
        }

        // Redirect vt's surviving fan onto vs, rewriting edge-map keys for
        // the outgoing edge and its in-face incoming edge.
        for &(id, dest) in &redirected {
            self.edge_map.remove(&(vt, dest));
            self.half_edges[id.index()].origin = vs;
            self.edge_map.insert((vs, dest), id);

            let inc = self.half_edges[id.index()].prev;
            let inc_origin = self.half_edges[inc.index()].origin;
            self.edge_map.remove(&(inc_origin, vt));
            self.edge_map.insert((inc_origin, vs), inc);
        }

        self.vertices[vs.index()].position = target;
        self.vertices[vt.index()].half_edge = None;

        // Re-anchor survivors whose anchor died. A survivor left with no
        // live fan at all becomes a dead slot too.
        let redirected_first = redirected.first().map(|(id, _)| *id);
        let mut isolated = Vec::new();
        for (v, old) in &anchored {
            if *v == vt {
                continue;
            }
            if old.is_some_and(|a| removed_ids.contains(&a)) {
                let new = if *v == vs {
                    vs_fallback.or(redirected_first)
                } else if *v == vl {
                    vl_fallback
                } else {
                    vr_fallback
                };
                self.vertices[v.index()].half_edge = new;
                if new.is_none() {
                    isolated.push(*v);
                }
            }
        }

        self.live_vertices -= 1 + isolated.len();
        self.live_faces -= removed_faces.len();

        trace!(
            vs = vs.0,
            vt = vt.0,
            half_edge = he_id.0,
            faces_removed = removed_faces.len(),
            "edge collapse"
        );

        Ok(CollapseRecord {
            vs,
            vt,
            half_edge: he_id,
            left_face,
            right_face,
            target,
            vs_position_before,
            removed_vertex: Vertex {
                id: vt,
                position: self.vertices[vt.index()].position,
                half_edge: anchored
                    .iter()
                    .find(|(v, _)| *v == vt)
                    .and_then(|(_, a)| *a),
            },
            removed_half_edges,
            removed_faces,
            redirected: redirected.iter().map(|(id, _)| *id).collect(),
            twin_restores,
            anchor_restores: anchored,
            isolated,
        })
    }

    /// Undoes the collapse described by `record`, restoring the removed
    /// vertex, faces and half-edges into their original slots.
    ///
    /// Records must be unwound in LIFO order; applying one out of order is
    /// detected and rejected as [`TopologyError::ReplayOrderViolation`].
    pub fn split_vertex(&mut self, record: &CollapseRecord) -> Result<(), TopologyError> {
        let vs = record.vs;
        let vt = record.vt;

        // --- Validate against the current state -----------------------
        if vt.index() >= self.vertices.len() || vs.index() >= self.vertices.len() {
            return Err(TopologyError::ReplayOrderViolation(format!(
                "record references vertex slots {vs:?}/{vt:?} beyond the mesh"
            )));
        }
        if !self.is_vertex_live(vs) && !record.isolated.contains(&vs) {
            return Err(TopologyError::ReplayOrderViolation(format!(
                "surviving vertex {vs:?} is not live"
            )));
        }
        if self.vertices[vt.index()].half_edge.is_some() {
            return Err(TopologyError::ReplayOrderViolation(format!(
                "removed vertex {vt:?} is still live"
            )));
        }
        for he in &record.removed_half_edges {
            if he.id.index() >= self.half_edges.len() {
                return Err(TopologyError::ReplayOrderViolation(format!(
                    "record references half-edge slot {:?} beyond the mesh",
                    he.id
                )));
            }
            if self.half_edges[he.id.index()].face.is_some() {
                return Err(TopologyError::ReplayOrderViolation(format!(
                    "removed half-edge {:?} is still live",
                    he.id
                )));
            }
        }
        for f in &record.removed_faces {
            if self.is_face_live(f.id) {
                return Err(TopologyError::ReplayOrderViolation(format!(
                    "removed face {:?} is still live",
                    f.id
                )));
            }
        }
        for &id in &record.redirected {
            let he = &self.half_edges[id.index()];
            if he.face.is_none() || he.origin != vs {
                return Err(TopologyError::ReplayOrderViolation(format!(
                    "half-edge {id:?} is no longer a live edge out of {vs:?}"
                )));
            }
        }
        if self.vertices[vs.index()].position != record.target {
            return Err(TopologyError::ReplayOrderViolation(format!(
                "surviving vertex {vs:?} has moved since the collapse"
            )));
        }

        // --- Restore --------------------------------------------------
        // Send vt's fan back to vt, undoing the key rewrites.
        for &id in &record.redirected {
            let dest = self.half_edges[self.half_edges[id.index()].next.index()].origin;
            self.edge_map.remove(&(vs, dest));
            self.half_edges[id.index()].origin = vt;
            self.edge_map.insert((vt, dest), id);

            let inc = self.half_edges[id.index()].prev;
            let inc_origin = self.half_edges[inc.index()].origin;
            self.edge_map.remove(&(inc_origin, vs));
            self.edge_map.insert((inc_origin, vt), inc);
        }

        for &(id, old_twin) in &record.twin_restores {
            self.half_edges[id.index()].twin = old_twin;
        }
        for he in &record.removed_half_edges {
            self.half_edges[he.id.index()] = he.clone();
        }
        for f in &record.removed_faces {
            self.faces[f.id.index()] = f.clone();
        }
        for he in &record.removed_half_edges {
            let dest = self.half_edges[he.next.index()].origin;
            self.edge_map.insert((he.origin, dest), he.id);
        }

        self.vertices[vt.index()] = record.removed_vertex.clone();
        self.vertices[vs.index()].position = record.vs_position_before;
        for &(v, anchor) in &record.anchor_restores {
            self.vertices[v.index()].half_edge = anchor;
        }

        self.live_vertices += 1 + record.isolated.len();
        self.live_faces += record.removed_faces.len();

        trace!(vs = vs.0, vt = vt.0, "vertex split");
        Ok(())
    }

    /// Re-applies a previously recorded collapse. The mesh must be in the
    /// exact state it was in when the record was produced.
    pub fn replay_collapse(
        &mut self,
        record: &CollapseRecord,
    ) -> Result<CollapseRecord, TopologyError> {
        let live = self
            .half_edge(record.half_edge)
            .is_some_and(|h| h.face.is_some() && h.origin == record.vs)
            && self.dest(record.half_edge) == Some(record.vt);
        if !live {
            return Err(TopologyError::ReplayOrderViolation(format!(
                "half-edge {:?} does not carry {:?} -> {:?}",
                record.half_edge, record.vs, record.vt
            )));
        }
        self.collapse_edge(record.half_edge, record.target)
    }

    /// Collapse admissibility policy.
    ///
    /// Rejects edges whose endpoints share more than two one-ring
    /// neighbors (collapsing would pinch a T-intersection into a
    /// non-manifold edge) and collapses that would rotate any surviving
    /// incident face normal past [`NORMAL_FLIP_TOLERANCE`].
    pub fn is_collapsible(&self, he_id: HalfEdgeId, target: Vec3) -> bool {
        let Some(h) = self.half_edge(he_id) else {
            return false;
        };
        if h.face.is_none() {
            return false;
        }
        let vs = h.origin;
        let Some(vt) = self.dest(he_id) else {
            return false;
        };

        // Two faces sharing all three corners (a pillow or fin) cannot be
        // collapsed further.
        if let Some(t) = h.twin {
            let vl = self.half_edges[h.prev.index()].origin;
            let vr = self.half_edges[self.half_edges[t.index()].prev.index()].origin;
            if vl == vr {
                return false;
            }
        }

        let vs_neighbors: HashSet<VertexId> = self.vertex_neighbors(vs).into_iter().collect();
        let common = self
            .vertex_neighbors(vt)
            .into_iter()
            .filter(|v| *v != vs && *v != vt && vs_neighbors.contains(v))
            .count();
        if common > 2 {
            trace!(vs = vs.0, vt = vt.0, common, "collapse rejected: pinch");
            return false;
        }

        let mut removed = vec![h.face];
        if let Some(t) = h.twin {
            removed.push(self.half_edges[t.index()].face);
        }
        let mut ring = self.vertex_faces(vs);
        for f in self.vertex_faces(vt) {
            if !ring.contains(&f) {
                ring.push(f);
            }
        }
        for f in ring {
            if removed.contains(&Some(f)) {
                continue;
            }
            let Some(vs3) = self.face_vertices(f) else {
                continue;
            };
            let old = vs3.map(|v| self.vertices[v.index()].position);
            let new = vs3.map(|v| {
                if v == vs || v == vt {
                    target
                } else {
                    self.vertices[v.index()].position
                }
            });
            let n_old = (old[1] - old[0]).cross(old[2] - old[0]).normalize_or_zero();
            let n_new = (new[1] - new[0]).cross(new[2] - new[0]).normalize_or_zero();
            if n_old.dot(n_new) < NORMAL_FLIP_TOLERANCE {
                trace!(vs = vs.0, vt = vt.0, face = f.0, "collapse rejected: fold-over");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use crate::TriMesh;
    use glam::Vec3 as V;

    fn tetrahedron() -> TriMesh {
        TriMesh::new(
            vec![
                V::new(0.0, 0.0, 0.0),
                V::new(1.0, 0.0, 0.0),
                V::new(0.5, 1.0, 0.0),
                V::new(0.5, 0.3, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
    }

    #[test]
    fn collapse_removes_two_faces_and_one_vertex() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        let he = mesh.find_half_edge(VertexId(0), VertexId(1)).unwrap();
        let target = (mesh.vertex(VertexId(0)).unwrap().position
            + mesh.vertex(VertexId(1)).unwrap().position)
            / 2.0;
        assert!(mesh.is_collapsible(he, target));
        let record = mesh.collapse_edge(he, target).unwrap();
        assert_eq!(mesh.face_count(), 10);
        assert_eq!(mesh.vertex_count(), 7);
        assert!(!mesh.is_vertex_live(VertexId(1)));
        assert_eq!(record.vs, VertexId(0));
        assert_eq!(record.vt, VertexId(1));
        mesh.validate().unwrap();
    }

    #[test]
    fn collapse_then_split_restores_everything() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        let before = mesh.to_tri_mesh();
        let he = mesh.find_half_edge(VertexId(2), VertexId(6)).unwrap();
        let record = mesh.collapse_edge(he, V::new(0.9, 0.9, 0.4)).unwrap();
        mesh.validate().unwrap();
        mesh.split_vertex(&record).unwrap();
        mesh.validate().unwrap();
        assert_eq!(mesh.to_tri_mesh(), before);
        assert_eq!(mesh.face_count(), 12);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn replay_collapse_reproduces_the_record() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::uv_sphere(8, 5)).unwrap();
        let he = mesh.find_half_edge(VertexId(1), VertexId(2)).unwrap();
        let target = mesh.vertex(VertexId(1)).unwrap().position;
        let record = mesh.collapse_edge(he, target).unwrap();
        let after = mesh.to_tri_mesh();
        mesh.split_vertex(&record).unwrap();
        let replayed = mesh.replay_collapse(&record).unwrap();
        assert_eq!(mesh.to_tri_mesh(), after);
        assert_eq!(replayed.vt, record.vt);
    }

    #[test]
    fn split_out_of_order_is_rejected() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::uv_sphere(8, 5)).unwrap();
        let he1 = mesh.find_half_edge(VertexId(1), VertexId(2)).unwrap();
        let p1 = mesh.vertex(VertexId(1)).unwrap().position;
        let r1 = mesh.collapse_edge(he1, p1).unwrap();

        // Collapse one of the fan edges the first collapse redirected, so
        // the two records overlap.
        let he2 = r1.redirected[0];
        let _r2 = mesh.collapse_edge(he2, p1 + V::X * 0.01).unwrap();

        // r1 must be undone after r2, not before.
        assert!(matches!(
            mesh.split_vertex(&r1),
            Err(TopologyError::ReplayOrderViolation(_))
        ));
    }

    #[test]
    fn lifo_unwind_of_many_collapses() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::uv_sphere(10, 7)).unwrap();
        let before = mesh.to_tri_mesh();
        let mut records = Vec::new();
        for _ in 0..20 {
            let candidate = mesh.half_edges().iter().find_map(|he| {
                if he.face.is_none() {
                    return None;
                }
                let target = mesh.vertex(he.origin).unwrap().position;
                mesh.is_collapsible(he.id, target).then_some((he.id, target))
            });
            let Some((he, target)) = candidate else { break };
            records.push(mesh.collapse_edge(he, target).unwrap());
            mesh.validate().unwrap();
        }
        assert!(records.len() >= 10);
        while let Some(r) = records.pop() {
            mesh.split_vertex(&r).unwrap();
        }
        mesh.validate().unwrap();
        assert_eq!(mesh.to_tri_mesh(), before);
    }

    #[test]
    fn tetrahedron_collapse_leaves_a_pillow() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&tetrahedron()).unwrap();
        let he = mesh.find_half_edge(VertexId(0), VertexId(1)).unwrap();
        let target = V::new(0.5, 0.0, 0.0);
        let record = mesh.collapse_edge(he, target).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 3);
        mesh.validate().unwrap();
        mesh.split_vertex(&record).unwrap();
        mesh.validate().unwrap();
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn boundary_edge_collapse() {
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&shapes::grid_plane(2, 2)).unwrap();
        let before = mesh.to_tri_mesh();
        // Bottom boundary edge 0 -> 1 (or its reverse, depending on
        // which direction the triangulation emitted).
        let he = mesh
            .find_half_edge(VertexId(0), VertexId(1))
            .or_else(|| mesh.find_half_edge(VertexId(1), VertexId(0)))
            .unwrap();
        assert!(mesh.is_boundary_edge(he));
        let faces_before = mesh.face_count();
        let target = V::new(0.5, 0.0, 0.0);
        let record = mesh.collapse_edge(he, target).unwrap();
        assert_eq!(mesh.face_count(), faces_before - 1);
        mesh.validate().unwrap();
        mesh.split_vertex(&record).unwrap();
        mesh.validate().unwrap();
        assert_eq!(mesh.to_tri_mesh(), before);
    }

    #[test]
    fn collapsing_a_lone_triangle_isolates_its_corner() {
        let tri = TriMesh::new(vec![V::ZERO, V::X, V::Y], vec![[0, 1, 2]]);
        let mut mesh = HalfEdgeMesh::from_tri_mesh(&tri).unwrap();
        let he = mesh.find_half_edge(VertexId(0), VertexId(1)).unwrap();
        let record = mesh.collapse_edge(he, V::new(0.5, 0.0, 0.0)).unwrap();
        // The whole face is gone; vertex 2 and the merged vertex have no
        // fan left.
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.vertex_count(), 0);
        mesh.validate().unwrap();
        mesh.split_vertex(&record).unwrap();
        mesh.validate().unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.to_tri_mesh(), tri);
    }

    #[test]
    fn pinch_configuration_is_rejected() {
        // Two tetrahedra sharing the edge 0-1 *and* the apexes 2, 3:
        // collapsing 0-1 would fuse more than two common neighbors.
        let tri = TriMesh::new(
            vec![
                V::new(0.0, 0.0, 0.0),
                V::new(1.0, 0.0, 0.0),
                V::new(0.5, 1.0, 0.0),
                V::new(0.5, -1.0, 0.0),
                V::new(0.5, 0.0, 1.0),
            ],
            vec![
                [0, 1, 2],
                [1, 0, 3],
                [0, 2, 4],
                [1, 4, 2],
                [0, 4, 3],
                [1, 3, 4],
            ],
        );
        let mesh = HalfEdgeMesh::from_tri_mesh(&tri).unwrap();
        let he = mesh.find_half_edge(VertexId(0), VertexId(1)).unwrap();
        // Vertices 2, 3 and 4 are all common neighbors of 0 and 1.
        assert!(!mesh.is_collapsible(he, V::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn fold_over_is_rejected() {
        let mesh = HalfEdgeMesh::from_tri_mesh(&shapes::grid_plane(2, 2)).unwrap();
        let he = mesh
            .find_half_edge(VertexId(4), VertexId(5))
            .or_else(|| mesh.find_half_edge(VertexId(5), VertexId(4)))
            .unwrap();
        // Dragging the merged vertex far past the opposite side of the
        // plane flips the surviving in-plane faces.
        assert!(!mesh.is_collapsible(he, V::new(-10.0, 1.0, 0.0)));
        // A sane midpoint target is fine.
        assert!(mesh.is_collapsible(he, V::new(1.5, 1.0, 0.0)));
    }
}
