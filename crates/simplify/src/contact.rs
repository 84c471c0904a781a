//! Contact-aware simplification across several objects.
//!
//! Each object carries its own driver, candidate queue and a spatial
//! index over its *initial* triangles. A candidate's cost is its local
//! collapse error, inflated where the edge sits near another object:
//! nearby initial faces of the other objects are distance-weighted,
//! averaged into one aggregate field, and the aggregate's deviation at
//! the merged position scales the local error by `1 + lambda * deviation`.
//! Collapses are interleaved by always taking the globally cheapest
//! object head, so contact zones on every object erode last and at a
//! matched rate.

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use topology::{FaceId, HalfEdgeId, TopologyError, TriMesh, VertexId};

use crate::color::VertexColor;
use crate::error::SimplifyError;
use crate::metric::{ErrorMetric, Primitive};
use crate::progressive::{normalize_candidate, CollapseOp, ProgressiveMesh};
use crate::queue::{CollapseQueue, QueueEntry};
use crate::spatial::TriangleOctree;

/// Contact weighting parameters.
///
/// `threshold` is the contact distance; zero means "measure it from the
/// scene" as the smallest inter-object distance. `influence` is the
/// weight a face at the plain threshold should still carry, which fixes
/// the broadened query radius `threshold / (1 - influence^(1/n))^(1/m)`.
/// `lambda` scales the whole contact term; zero disables it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContactParams {
    pub lambda: f64,
    pub m: f64,
    pub n: f64,
    pub influence: f64,
    pub threshold: f64,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            lambda: 0.0,
            m: 2.0,
            n: 2.0,
            influence: 0.9,
            threshold: 0.0,
        }
    }
}

struct ContactObject<M: ErrorMetric> {
    driver: ProgressiveMesh<M>,
    queue: CollapseQueue,
    index: TriangleOctree,
    /// Face fits of the object's initial mesh; contact aggregation always
    /// measures against these, never against simplified geometry.
    init_primitives: Vec<Primitive>,
    ops: Vec<CollapseOp>,
    contact_colors: Vec<VertexColor>,
    contact_distances: Vec<Option<f32>>,
}

struct EdgeEval {
    vs: VertexId,
    vt: VertexId,
    half_edge: HalfEdgeId,
    face: FaceId,
    error: f64,
    target: Vec3,
    q: Primitive,
    contact: bool,
    min_dist: Option<f32>,
}

/// Multi-object simplification driver with contact-aware costs.
pub struct ContactSimplifier<M: ErrorMetric + Clone> {
    metric: M,
    params: ContactParams,
    threshold: f64,
    broader_threshold: f64,
    objects: Vec<ContactObject<M>>,
}

impl<M: ErrorMetric + Clone + Sync> ContactSimplifier<M> {
    pub fn new(metric: M, params: ContactParams) -> Self {
        Self {
            metric,
            params,
            threshold: params.threshold,
            broader_threshold: 0.0,
            objects: Vec::new(),
        }
    }

    /// Registers one object and returns its index. Face fits and the
    /// spatial index are taken from the mesh as handed in.
    pub fn add_object(&mut self, tri: &TriMesh) -> Result<usize, SimplifyError> {
        let mut driver = ProgressiveMesh::new(tri, self.metric.clone())?;
        driver.compute_faces_quadrics();
        let init_primitives = driver.face_primitives().to_vec();
        let object = ContactObject {
            index: TriangleOctree::from_tri_mesh(tri),
            contact_colors: vec![VertexColor::NONE; driver.mesh().vertex_slots()],
            contact_distances: vec![None; driver.mesh().vertex_slots()],
            driver,
            queue: CollapseQueue::new(),
            init_primitives,
            ops: Vec::new(),
        };
        self.objects.push(object);
        debug!(
            object = self.objects.len() - 1,
            faces = tri.face_count(),
            "object registered"
        );
        Ok(self.objects.len() - 1)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn driver(&self, object: usize) -> Result<&ProgressiveMesh<M>, SimplifyError> {
        Ok(&self.object(object)?.driver)
    }

    pub fn ops(&self, object: usize) -> Result<&[CollapseOp], SimplifyError> {
        Ok(&self.object(object)?.ops)
    }

    /// Contact-zone markers assigned while the queues were built, one per
    /// vertex slot.
    pub fn contact_colors(&self, object: usize) -> Result<&[VertexColor], SimplifyError> {
        Ok(&self.object(object)?.contact_colors)
    }

    pub fn total_face_count(&self) -> usize {
        self.objects.iter().map(|o| o.driver.face_count()).sum()
    }

    /// Effective contact threshold, after scene measurement.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Query radius the weighting extends over.
    pub fn broader_threshold(&self) -> f64 {
        self.broader_threshold
    }

    fn object(&self, object: usize) -> Result<&ContactObject<M>, SimplifyError> {
        self.objects
            .get(object)
            .ok_or(SimplifyError::UnknownObject(object))
    }

    /// Smallest distance from any live vertex of one object to another
    /// object's initial surface, over all object pairs.
    pub fn compute_threshold(&self) -> f64 {
        let mut min = f64::INFINITY;
        for (i, a) in self.objects.iter().enumerate() {
            for (j, b) in self.objects.iter().enumerate() {
                if i == j {
                    continue;
                }
                for v in a.driver.mesh().vertices() {
                    if v.half_edge.is_none() {
                        continue;
                    }
                    if let Some((_, d)) = b.index.nearest(v.position) {
                        min = min.min(f64::from(d));
                    }
                }
            }
        }
        if min.is_finite() {
            min
        } else {
            0.0
        }
    }

    fn broaden(&self, threshold: f64) -> f64 {
        if self.params.lambda == 0.0 || threshold <= 0.0 {
            return 0.0;
        }
        let inner = 1.0 - self.params.influence.powf(1.0 / self.params.n);
        threshold / inner.powf(1.0 / self.params.m)
    }

    /// Cost of one candidate edge of `object`, with the contact
    /// augmentation applied when other objects are within reach.
    fn edge_eval(&self, object: usize, he: HalfEdgeId) -> Result<EdgeEval, SimplifyError> {
        let obj = &self.objects[object];
        let mesh = obj.driver.mesh();
        let (qem, target, q) = obj.driver.compute_edge_error(he);
        let vs = mesh.half_edges()[he.index()].origin;
        let vt = mesh.dest(he).ok_or_else(|| {
            TopologyError::InvalidTopology(format!("candidate half-edge {he:?} is dead"))
        })?;
        let face = mesh.half_edges()[he.index()].face.ok_or_else(|| {
            TopologyError::InvalidTopology(format!("candidate half-edge {he:?} has no face"))
        })?;

        let mut aggregate = Primitive::default();
        let mut contacts = 0usize;
        let mut min_dist: Option<f32> = None;

        if self.params.lambda != 0.0 && self.broader_threshold > 0.0 {
            let radius = self.broader_threshold as f32;
            let pa = mesh.vertices()[vs.index()].position;
            let pb = mesh.vertices()[vt.index()].position;
            for (k, other) in self.objects.iter().enumerate() {
                if k == object {
                    continue;
                }
                // Edge-to-face distance, approximated from both endpoints.
                let mut per_face: HashMap<u32, f32> = HashMap::new();
                for (f, d) in other
                    .index
                    .within_radius(pa, radius)
                    .into_iter()
                    .chain(other.index.within_radius(pb, radius))
                {
                    per_face
                        .entry(f)
                        .and_modify(|old| *old = old.min(d))
                        .or_insert(d);
                }
                // Accumulate in face order so the floating-point sum is
                // reproducible across runs.
                let mut near: Vec<(u32, f32)> = per_face.into_iter().collect();
                near.sort_unstable_by_key(|(f, _)| *f);
                for (f, d) in near {
                    let ratio = f64::from(d) / self.broader_threshold;
                    let weight = (ratio.powf(self.params.m) - 1.0).powf(self.params.n);
                    aggregate.add_scaled(&other.init_primitives[f as usize], weight);
                    contacts += 1;
                    min_dist = Some(min_dist.map_or(d, |old| old.min(d)));
                }
            }
        }

        if contacts == 0 {
            return Ok(EdgeEval {
                vs,
                vt,
                half_edge: he,
                face,
                error: qem,
                target,
                q,
                contact: false,
                min_dist: None,
            });
        }

        aggregate.scale(1.0 / contacts as f64);
        let deviation = self.metric.geometric_error(&aggregate, target);
        let error = qem * (1.0 + self.params.lambda * deviation);
        if !(error >= qem) {
            return Err(SimplifyError::ContactMonotonicityViolation {
                local: qem,
                augmented: error,
            });
        }
        trace!(
            object,
            vs = vs.0,
            vt = vt.0,
            contacts,
            local = qem,
            augmented = error,
            "contact-weighted candidate"
        );
        Ok(EdgeEval {
            vs,
            vt,
            half_edge: he,
            face,
            error,
            target,
            q,
            contact: true,
            min_dist,
        })
    }

    /// Builds every object's candidate queue with contact-aware costs.
    /// Evaluation runs in parallel per object; insertion stays in face
    /// order so the FIFO tie-break is deterministic.
    pub fn construct_priority_queues(&mut self) -> Result<(), SimplifyError> {
        self.threshold = if self.params.threshold > 0.0 {
            self.params.threshold
        } else {
            self.compute_threshold()
        };
        self.broader_threshold = self.broaden(self.threshold);
        debug!(
            threshold = self.threshold,
            broader = self.broader_threshold,
            "contact radii fixed"
        );

        for i in 0..self.objects.len() {
            self.objects[i].driver.allocate_primitive_slots();
            let evals: Result<Vec<Vec<EdgeEval>>, SimplifyError> = {
                let this = &*self;
                let mesh = this.objects[i].driver.mesh();
                (0..mesh.face_slots())
                    .into_par_iter()
                    .map(|f| {
                        let face = FaceId(f as u32);
                        let mut out = Vec::new();
                        if let Some(hes) = mesh.face_half_edges(face) {
                            for he in hes {
                                let vs = mesh.half_edges()[he.index()].origin;
                                let Some(vt) = mesh.dest(he) else { continue };
                                if vs >= vt {
                                    continue;
                                }
                                out.push(this.edge_eval(i, he)?);
                            }
                        }
                        Ok(out)
                    })
                    .collect()
            };
            let evals = evals?;

            let obj = &mut self.objects[i];
            let mut queue = CollapseQueue::new();
            for ev in evals.into_iter().flatten() {
                obj.driver.store_edge_primitive(ev.half_edge, ev.q);
                if ev.contact {
                    for v in [ev.vs, ev.vt] {
                        obj.contact_colors[v.index()] = VertexColor::CONTACT;
                        if let Some(d) = ev.min_dist {
                            let slot = &mut obj.contact_distances[v.index()];
                            *slot = Some(slot.map_or(d, |old| old.min(d)));
                        }
                    }
                }
                queue.insert(QueueEntry::new(
                    ev.vs,
                    ev.vt,
                    ev.half_edge,
                    ev.face,
                    ev.error,
                    ev.target,
                    i,
                ));
            }
            obj.queue = queue;
            for v in 0..obj.driver.mesh().vertex_slots() {
                let v = VertexId(v as u32);
                if obj.driver.mesh().is_vertex_live(v) {
                    obj.driver.refresh_vertex_primitive(v);
                }
            }
            debug!(object = i, candidates = self.objects[i].queue.len(), "queue built");
        }
        Ok(())
    }

    /// Pops candidates of one object until a collapse succeeds, then
    /// re-inserts the merged vertex's ring with fresh contact-aware
    /// costs. Returns false when the object's queue drained.
    fn collapse_next(&mut self, object: usize) -> Result<bool, SimplifyError> {
        loop {
            let entry = match self.objects[object].queue.top() {
                Ok(e) => e,
                Err(SimplifyError::EmptyQueue) => return Ok(false),
                Err(e) => return Err(e),
            };
            let op = match self.objects[object].driver.collapse_entry(&entry) {
                Ok(op) => op,
                Err(SimplifyError::EdgeNotCollapsible) => continue,
                Err(e) => return Err(e),
            };

            {
                let obj = &mut self.objects[object];
                obj.queue.remove_edges(entry.vs);
                obj.queue.remove_edges(entry.vt);
            }

            // Ring candidates, re-costed against the moved geometry.
            let ring: Vec<(VertexId, VertexId, HalfEdgeId)> = {
                let mesh = self.objects[object].driver.mesh();
                mesh.vertex_half_edges(entry.vs)
                    .into_iter()
                    .filter_map(|he| {
                        let d = mesh.dest(he)?;
                        Some(normalize_candidate(mesh, entry.vs, d, he))
                    })
                    .collect()
            };
            let mut evals = Vec::with_capacity(ring.len());
            for &(_, _, he) in &ring {
                evals.push(self.edge_eval(object, he)?);
            }

            let obj = &mut self.objects[object];
            obj.driver.refresh_vertex_primitive(entry.vs);
            for ev in evals {
                obj.driver.store_edge_primitive(ev.half_edge, ev.q);
                obj.driver.refresh_vertex_primitive(ev.vt);
                obj.driver.refresh_vertex_primitive(ev.vs);
                queue_insert(&mut obj.queue, &ev, object);
            }
            obj.ops.push(op);
            return Ok(true);
        }
    }

    /// Interleaved greedy simplification down to `target_total_faces`
    /// live faces summed over all objects.
    ///
    /// Each step takes the object whose cheapest candidate is globally
    /// cheapest, collapses there, and re-files that object's new head.
    pub fn simplify(&mut self, target_total_faces: usize) -> Result<(), SimplifyError> {
        self.construct_priority_queues()?;

        let mut heads: BTreeSet<QueueEntry> = BTreeSet::new();
        for obj in &self.objects {
            if let Some(e) = obj.queue.peek() {
                heads.insert(e.clone());
            }
        }
        info!(
            objects = self.objects.len(),
            faces = self.total_face_count(),
            target_total_faces,
            "contact-aware simplification started"
        );

        while self.total_face_count() > target_total_faces {
            let Some(best) = heads.pop_first() else {
                info!(
                    faces = self.total_face_count(),
                    "all queues exhausted before reaching the target"
                );
                return Ok(());
            };
            let object = best.object;
            let progressed = if self.objects[object].driver.face_count() > 2 {
                self.collapse_next(object)?
            } else {
                false
            };
            // An object that can no longer collapse leaves the rotation.
            if progressed {
                if let Some(e) = self.objects[object].queue.peek() {
                    heads.insert(e.clone());
                }
            }
        }
        info!(
            faces = self.total_face_count(),
            "contact-aware simplification finished"
        );
        Ok(())
    }

    /// Distance-band coloring of the contact zones, deterministic for a
    /// given `seed`.
    pub fn cluster_colors(
        &self,
        object: usize,
        bands: usize,
        seed: u64,
    ) -> Result<Vec<VertexColor>, SimplifyError> {
        let obj = self.object(object)?;
        let bands = bands.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let palette: Vec<VertexColor> = (0..bands)
            .map(|_| VertexColor::rgb(rng.random(), rng.random(), rng.random()))
            .collect();

        let mut colors = vec![VertexColor::NONE; obj.contact_distances.len()];
        let radius = self.broader_threshold as f32;
        for (i, d) in obj.contact_distances.iter().enumerate() {
            let Some(d) = d else { continue };
            let t = if radius > 0.0 {
                (d / radius).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let band = ((t * bands as f32) as usize).min(bands - 1);
            colors[i] = palette[band];
        }
        Ok(colors)
    }
}

fn queue_insert(queue: &mut CollapseQueue, ev: &EdgeEval, object: usize) {
    queue.insert(QueueEntry::new(
        ev.vs,
        ev.vt,
        ev.half_edge,
        ev.face,
        ev.error,
        ev.target,
        object,
    ));
}
