//! Collapse candidate queue.
//!
//! An ordered set of candidates keyed by (error, insertion sequence,
//! object): ascending error with FIFO tie-breaking, so equal-error
//! candidates pop in insertion order and two runs over the same input
//! produce the same collapse sequence. A per-vertex index makes
//! [`CollapseQueue::remove_edges`] proportional to the entries actually
//! touching the vertex.

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;
use tracing::trace;
use topology::{FaceId, HalfEdgeId, VertexId};

use crate::error::SimplifyError;

/// One collapse candidate: the directed edge `vs -> vt`, its cost, the
/// position the merged vertex would take and the owning object (always 0
/// for single-object simplification).
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub vs: VertexId,
    pub vt: VertexId,
    pub half_edge: HalfEdgeId,
    pub face: FaceId,
    pub error: f64,
    pub target: Vec3,
    pub object: usize,
    seq: u64,
}

impl QueueEntry {
    pub fn new(
        vs: VertexId,
        vt: VertexId,
        half_edge: HalfEdgeId,
        face: FaceId,
        error: f64,
        target: Vec3,
        object: usize,
    ) -> Self {
        Self {
            vs,
            vt,
            half_edge,
            face,
            error,
            target,
            object,
            seq: 0,
        }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error).is_eq()
            && self.seq == other.seq
            && self.object == other.object
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.error
            .total_cmp(&other.error)
            .then_with(|| self.seq.cmp(&other.seq))
            .then_with(|| self.object.cmp(&other.object))
    }
}

/// Priority queue of collapse candidates with by-vertex removal.
#[derive(Debug, Default)]
pub struct CollapseQueue {
    entries: BTreeSet<QueueEntry>,
    by_vertex: HashMap<VertexId, Vec<QueueEntry>>,
    next_seq: u64,
}

impl CollapseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a candidate; the sequence number assigned here implements
    /// the FIFO tie-break.
    pub fn insert(&mut self, mut entry: QueueEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        self.by_vertex
            .entry(entry.vs)
            .or_default()
            .push(entry.clone());
        self.by_vertex
            .entry(entry.vt)
            .or_default()
            .push(entry.clone());
        self.entries.insert(entry);
    }

    /// Pops the cheapest candidate.
    pub fn top(&mut self) -> Result<QueueEntry, SimplifyError> {
        let entry = self
            .entries
            .pop_first()
            .ok_or(SimplifyError::EmptyQueue)?;
        self.unindex(&entry);
        Ok(entry)
    }

    /// Cheapest candidate without removing it.
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    fn unindex(&mut self, entry: &QueueEntry) {
        for v in [entry.vs, entry.vt] {
            if let Some(list) = self.by_vertex.get_mut(&v) {
                list.retain(|e| e != entry);
                if list.is_empty() {
                    self.by_vertex.remove(&v);
                }
            }
        }
    }

    /// Drops every candidate that references `v` as either endpoint.
    pub fn remove_edges(&mut self, v: VertexId) {
        let Some(touching) = self.by_vertex.remove(&v) else {
            return;
        };
        for entry in touching {
            self.entries.remove(&entry);
            let other = if entry.vs == v { entry.vt } else { entry.vs };
            if let Some(list) = self.by_vertex.get_mut(&other) {
                list.retain(|e| e != &entry);
                if list.is_empty() {
                    self.by_vertex.remove(&other);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Traces the queue contents, cheapest first.
    pub fn display(&self) {
        for e in &self.entries {
            trace!(
                vs = e.vs.0,
                vt = e.vt.0,
                error = e.error,
                object = e.object,
                "queue entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3 as V;

    fn entry(vs: u32, vt: u32, error: f64) -> QueueEntry {
        QueueEntry::new(
            VertexId(vs),
            VertexId(vt),
            HalfEdgeId(vs * 100 + vt),
            FaceId(0),
            error,
            V::ZERO,
            0,
        )
    }

    #[test]
    fn pops_in_ascending_error_order() {
        let mut q = CollapseQueue::new();
        q.insert(entry(0, 1, 3.0));
        q.insert(entry(1, 2, 1.0));
        q.insert(entry(2, 3, 2.0));
        let order: Vec<f64> = (0..3).map(|_| q.top().unwrap().error).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
        assert!(matches!(q.top(), Err(SimplifyError::EmptyQueue)));
    }

    #[test]
    fn equal_errors_pop_in_insertion_order() {
        let mut q = CollapseQueue::new();
        q.insert(entry(0, 1, 1.0));
        q.insert(entry(2, 3, 1.0));
        q.insert(entry(4, 5, 1.0));
        assert_eq!(q.top().unwrap().vs, VertexId(0));
        assert_eq!(q.top().unwrap().vs, VertexId(2));
        assert_eq!(q.top().unwrap().vs, VertexId(4));
    }

    #[test]
    fn remove_edges_clears_every_reference() {
        let mut q = CollapseQueue::new();
        q.insert(entry(0, 1, 1.0));
        q.insert(entry(1, 2, 2.0));
        q.insert(entry(3, 1, 3.0));
        q.insert(entry(4, 5, 4.0));
        q.remove_edges(VertexId(1));
        assert_eq!(q.len(), 1);
        while let Ok(e) = q.top() {
            assert_ne!(e.vs, VertexId(1));
            assert_ne!(e.vt, VertexId(1));
        }
    }

    #[test]
    fn remove_edges_then_reinsert() {
        let mut q = CollapseQueue::new();
        q.insert(entry(0, 1, 1.0));
        q.remove_edges(VertexId(0));
        assert!(q.is_empty());
        q.insert(entry(0, 1, 0.5));
        assert_eq!(q.top().unwrap().error, 0.5);
    }

    #[test]
    fn top_drops_the_popped_entry_from_the_vertex_index() {
        let mut q = CollapseQueue::new();
        q.insert(entry(0, 1, 1.0));
        q.insert(entry(1, 2, 2.0));
        assert_eq!(q.top().unwrap().vs, VertexId(0));
        // The popped entry must not linger in the index, or this would
        // resurrect it through vertex 1's list.
        q.remove_edges(VertexId(1));
        assert!(q.is_empty());
        q.insert(entry(0, 1, 3.0));
        assert_eq!(q.len(), 1);
        assert_eq!(q.top().unwrap().error, 3.0);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut q = CollapseQueue::new();
        q.insert(entry(0, 1, 2.0));
        assert_eq!(q.peek().unwrap().error, 2.0);
        assert_eq!(q.len(), 1);
        assert_eq!(q.top().unwrap().error, 2.0);
    }
}
