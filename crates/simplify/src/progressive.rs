//! Greedy edge-collapse driver over one mesh.
//!
//! The driver owns the half-edge mesh plus three primitive arrays indexed
//! by topology slot (face, vertex, half-edge). Simplification walks a
//! [`CollapseQueue`] of candidates; after each collapse it refreshes the
//! face fits of the merged one-ring, evicts every queue entry touching
//! either endpoint and re-inserts the surviving ring edges with fresh
//! costs. Candidates that fail the collapsibility policy are dropped, not
//! re-queued: a later ring refresh re-creates them if they become viable.

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use topology::{CollapseRecord, FaceId, HalfEdgeId, HalfEdgeMesh, TriMesh, VertexId};

use crate::error::SimplifyError;
use crate::metric::{ErrorMetric, Primitive};
use crate::queue::{CollapseQueue, QueueEntry};

/// Lifecycle of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DriverState {
    Uninitialized,
    QuadricsComputed,
    QueueBuilt,
    Simplifying,
    /// Reached the requested face count.
    Done,
    /// Ran out of collapsible edges first.
    Exhausted,
}

/// Center/radius snapshot of a primitive, kept with each collapse for
/// inspection and debug rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SphereSnapshot {
    pub center: Vec3,
    pub radius: f64,
}

impl SphereSnapshot {
    fn of(q: &Primitive) -> Self {
        Self {
            center: q.center().as_vec3(),
            radius: q.radius(),
        }
    }
}

/// One applied collapse: the reversible topology record plus the cost and
/// primitive snapshots at the moment it was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapseOp {
    pub record: CollapseRecord,
    pub error: f64,
    pub edge_primitive: SphereSnapshot,
    pub source_primitive: SphereSnapshot,
    pub target_primitive: SphereSnapshot,
}

/// Progressive simplification driver, generic over the per-face fit.
pub struct ProgressiveMesh<M: ErrorMetric> {
    mesh: HalfEdgeMesh,
    metric: M,
    mean_edge_length: f32,
    scale: f32,
    state: DriverState,
    face_primitives: Vec<Primitive>,
    vertex_primitives: Vec<Primitive>,
    edge_primitives: Vec<Primitive>,
}

impl<M: ErrorMetric + Sync> ProgressiveMesh<M> {
    pub fn new(tri: &TriMesh, metric: M) -> Result<Self, SimplifyError> {
        let mesh = HalfEdgeMesh::from_tri_mesh(tri)?;
        Ok(Self {
            mesh,
            metric,
            mean_edge_length: tri.mean_edge_length(),
            scale: 0.0,
            state: DriverState::Uninitialized,
            face_primitives: Vec::new(),
            vertex_primitives: Vec::new(),
            edge_primitives: Vec::new(),
        })
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Curvature bias handed to the per-face fit; zero fits planes.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn face_primitives(&self) -> &[Primitive] {
        &self.face_primitives
    }

    pub fn vertex_primitive(&self, v: VertexId) -> Primitive {
        self.vertex_primitives
            .get(v.index())
            .copied()
            .unwrap_or_default()
    }

    pub fn edge_primitive(&self, he: HalfEdgeId) -> Primitive {
        self.edge_primitives
            .get(he.index())
            .copied()
            .unwrap_or_default()
    }

    /// Fits a primitive to every live face, in parallel.
    pub fn compute_faces_quadrics(&mut self) {
        let mesh = &self.mesh;
        let metric = &self.metric;
        let (mean, scale) = (self.mean_edge_length, self.scale);
        self.face_primitives = (0..mesh.face_slots())
            .into_par_iter()
            .map(|i| {
                let face = FaceId(i as u32);
                if mesh.is_face_live(face) {
                    metric.generate_face_primitive(mesh, face, mean, scale)
                } else {
                    Primitive::default()
                }
            })
            .collect();
        if self.state < DriverState::QuadricsComputed {
            self.state = DriverState::QuadricsComputed;
        }
        debug!(faces = self.mesh.face_count(), "face primitives fitted");
    }

    /// Refreshes the face fits of one vertex's ring after its geometry
    /// changed.
    pub fn update_faces_quadrics(&mut self, v: VertexId) {
        for face in self.mesh.vertex_faces(v) {
            self.face_primitives[face.index()] =
                self.metric
                    .generate_face_primitive(&self.mesh, face, self.mean_edge_length, self.scale);
        }
    }

    /// Blends the face fits of a vertex one-ring into one field, with the
    /// equal `1/degree` weighting and a Pratt renormalization after every
    /// pairwise combination.
    pub fn compute_vertex_primitive(&self, v: VertexId) -> Primitive {
        self.blend_faces(&self.mesh.vertex_faces(v))
    }

    /// Blends the face fits of both endpoint rings of an edge.
    pub fn compute_edge_primitive(&self, he: HalfEdgeId) -> Primitive {
        self.blend_faces(&self.mesh.edge_ring_faces(he))
    }

    fn blend_faces(&self, faces: &[FaceId]) -> Primitive {
        let Some((&first, rest)) = faces.split_first() else {
            return Primitive::default();
        };
        let weight = 1.0 / faces.len() as f64;
        let mut q = self.face_primitives[first.index()];
        q.apply_pratt_norm();
        for (i, f) in rest.iter().enumerate() {
            let mut qa = self.face_primitives[f.index()];
            qa.apply_pratt_norm();
            q = if i == 0 {
                self.metric.combine(&qa, weight, &q, weight)
            } else {
                self.metric.combine(&qa, weight, &q, 1.0)
            };
            q.apply_pratt_norm();
        }
        q
    }

    /// Cost of collapsing the edge carried by `he`, the merged position,
    /// and the blended field the cost was measured against.
    pub fn compute_edge_error(&self, he: HalfEdgeId) -> (f64, Vec3, Primitive) {
        let q = self.compute_edge_primitive(he);
        let origin = self.mesh.half_edges()[he.index()].origin;
        let a = self.mesh.vertices()[origin.index()].position;
        let b = match self.mesh.dest(he) {
            Some(d) => self.mesh.vertices()[d.index()].position,
            None => a,
        };
        let (err, p) = self.metric.compute_error(&q, a, b);
        (err, p, q)
    }

    /// Sizes the vertex and edge primitive arrays to the current slot
    /// counts, keeping existing entries.
    pub fn allocate_primitive_slots(&mut self) {
        self.vertex_primitives
            .resize(self.mesh.vertex_slots(), Primitive::default());
        self.edge_primitives
            .resize(self.mesh.half_edge_slots(), Primitive::default());
    }

    pub fn store_edge_primitive(&mut self, he: HalfEdgeId, q: Primitive) {
        self.edge_primitives[he.index()] = q;
    }

    pub fn refresh_vertex_primitive(&mut self, v: VertexId) {
        self.vertex_primitives[v.index()] = self.compute_vertex_primitive(v);
    }

    /// Builds the initial candidate queue: every edge once, visited from
    /// its lower-indexed endpoint. Edge evaluation runs in parallel;
    /// insertion is serialized afterwards in face order so the FIFO
    /// tie-break is deterministic.
    pub fn construct_priority_queue(&mut self) -> CollapseQueue {
        self.allocate_primitive_slots();

        let evals: Vec<(HalfEdgeId, VertexId, VertexId, FaceId, f64, Vec3, Primitive)> = {
            let this: &Self = self;
            (0..this.mesh.face_slots())
                .into_par_iter()
                .flat_map_iter(|i| {
                    let face = FaceId(i as u32);
                    let half_edges = this.mesh.face_half_edges(face);
                    half_edges
                        .into_iter()
                        .flatten()
                        .filter_map(move |he| {
                            let vs = this.mesh.half_edges()[he.index()].origin;
                            let vt = this.mesh.dest(he)?;
                            // Visit each edge once, from its smaller
                            // endpoint.
                            if vs >= vt {
                                return None;
                            }
                            let (err, p, q) = this.compute_edge_error(he);
                            Some((he, vs, vt, face, err, p, q))
                        })
                })
                .collect()
        };

        let mut queue = CollapseQueue::new();
        for (he, vs, vt, face, err, p, q) in evals {
            self.edge_primitives[he.index()] = q;
            queue.insert(QueueEntry::new(vs, vt, he, face, err, p, 0));
        }
        for v in 0..self.mesh.vertex_slots() {
            let v = VertexId(v as u32);
            if self.mesh.is_vertex_live(v) {
                self.vertex_primitives[v.index()] = self.compute_vertex_primitive(v);
            }
        }
        if self.state < DriverState::QueueBuilt {
            self.state = DriverState::QueueBuilt;
        }
        debug!(candidates = queue.len(), "collapse queue built");
        queue
    }

    /// Applies one vetted candidate: policy check, topological collapse,
    /// ring fit refresh. Queue maintenance is the caller's, since the
    /// cost model for re-inserted edges differs between drivers.
    pub fn collapse_entry(&mut self, entry: &QueueEntry) -> Result<CollapseOp, SimplifyError> {
        if !self.mesh.is_collapsible(entry.half_edge, entry.target) {
            return Err(SimplifyError::EdgeNotCollapsible);
        }
        let edge_q = self.edge_primitive(entry.half_edge);
        let source_q = self.vertex_primitive(entry.vs);
        let target_q = self.vertex_primitive(entry.vt);
        let record = self.mesh.collapse_edge(entry.half_edge, entry.target)?;
        self.update_faces_quadrics(entry.vs);
        Ok(CollapseOp {
            record,
            error: entry.error,
            edge_primitive: SphereSnapshot::of(&edge_q),
            source_primitive: SphereSnapshot::of(&source_q),
            target_primitive: SphereSnapshot::of(&target_q),
        })
    }

    /// Evicts both endpoints from the queue and re-inserts the surviving
    /// ring of the merged vertex with freshly computed costs.
    pub fn update_queue(&mut self, queue: &mut CollapseQueue, vs: VertexId, vt: VertexId) {
        queue.remove_edges(vs);
        queue.remove_edges(vt);
        self.refresh_vertex_primitive(vs);
        let ring = self.mesh.vertex_half_edges(vs);
        for he in ring {
            let Some(dest) = self.mesh.dest(he) else {
                continue;
            };
            self.refresh_vertex_primitive(dest);
            // Normalize first so the fresh fit lands on the direction a
            // later collapse snapshot will read it through.
            let (vs_n, vt_n, he_n) = normalize_candidate(&self.mesh, vs, dest, he);
            let (err, p, q) = self.compute_edge_error(he_n);
            self.store_edge_primitive(he_n, q);
            let Some(face) = self.mesh.half_edges()[he_n.index()].face else {
                continue;
            };
            queue.insert(QueueEntry::new(vs_n, vt_n, he_n, face, err, p, 0));
        }
    }

    /// Greedy simplification down to `target_faces` live faces.
    ///
    /// Returns the applied collapses in order. The driver ends in
    /// [`DriverState::Done`], or [`DriverState::Exhausted`] when every
    /// remaining candidate is rejected by the collapse policy first.
    pub fn construct_m0(&mut self, target_faces: usize) -> Result<Vec<CollapseOp>, SimplifyError> {
        self.construct_m0_with(target_faces, || false)
    }

    /// [`ProgressiveMesh::construct_m0`] with a cooperative cancellation
    /// hook, polled once per collapse. On cancellation the collapses
    /// applied so far are returned and the driver stays in
    /// [`DriverState::Simplifying`].
    pub fn construct_m0_with(
        &mut self,
        target_faces: usize,
        mut should_cancel: impl FnMut() -> bool,
    ) -> Result<Vec<CollapseOp>, SimplifyError> {
        if self.state < DriverState::QuadricsComputed {
            self.compute_faces_quadrics();
        }
        let mut queue = self.construct_priority_queue();
        self.state = DriverState::Simplifying;
        info!(
            faces = self.mesh.face_count(),
            target_faces, "simplification started"
        );

        let mut ops = Vec::new();
        while self.mesh.face_count() > target_faces {
            if should_cancel() {
                debug!(applied = ops.len(), "simplification cancelled");
                return Ok(ops);
            }
            let entry = match queue.top() {
                Ok(e) => e,
                Err(SimplifyError::EmptyQueue) => {
                    self.state = DriverState::Exhausted;
                    info!(
                        faces = self.mesh.face_count(),
                        applied = ops.len(),
                        "queue exhausted before reaching the target"
                    );
                    return Ok(ops);
                }
                Err(e) => return Err(e),
            };
            match self.collapse_entry(&entry) {
                Ok(op) => {
                    self.update_queue(&mut queue, entry.vs, entry.vt);
                    ops.push(op);
                }
                Err(SimplifyError::EdgeNotCollapsible) => {
                    trace!(
                        vs = entry.vs.0,
                        vt = entry.vt.0,
                        "candidate dropped by collapse policy"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        self.state = DriverState::Done;
        info!(
            faces = self.mesh.face_count(),
            applied = ops.len(),
            "simplification finished"
        );
        Ok(ops)
    }

    /// Re-applies a recorded collapse (coarsening replay).
    pub fn ecol(&mut self, op: &CollapseOp) -> Result<(), SimplifyError> {
        self.mesh.replay_collapse(&op.record)?;
        Ok(())
    }

    /// Undoes a recorded collapse (refinement replay).
    pub fn vsplit(&mut self, op: &CollapseOp) -> Result<(), SimplifyError> {
        self.mesh.split_vertex(&op.record)?;
        Ok(())
    }
}

/// Orients a candidate so the lower-indexed endpoint is the survivor,
/// switching to the twin half-edge when one exists in that direction.
pub(crate) fn normalize_candidate(
    mesh: &HalfEdgeMesh,
    a: VertexId,
    b: VertexId,
    he: HalfEdgeId,
) -> (VertexId, VertexId, HalfEdgeId) {
    if a <= b {
        (a, b, he)
    } else if let Some(twin) = mesh.half_edges()[he.index()].twin {
        (b, a, twin)
    } else {
        (a, b, he)
    }
}
