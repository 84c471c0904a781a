//! Level-of-detail navigation over a recorded collapse history.
//!
//! After simplification the driver holds the base mesh and the ordered
//! collapse log. [`Lod`] walks that log like an undo stack: `more()`
//! splits vertices back in (toward full detail), `less()` re-collapses
//! them (toward the base mesh). The cursor counts applied collapses, so
//! replay is always LIFO with respect to the log.

use tracing::debug;

use crate::error::SimplifyError;
use crate::metric::ErrorMetric;
use crate::progressive::{CollapseOp, ProgressiveMesh};

pub struct Lod<M: ErrorMetric> {
    driver: ProgressiveMesh<M>,
    ops: Vec<CollapseOp>,
    /// Number of collapses currently applied; `ops.len()` at the base
    /// mesh, 0 at full detail.
    applied: usize,
}

impl<M: ErrorMetric + Sync> Lod<M> {
    /// Takes a driver left at the base mesh together with its collapse
    /// history.
    pub fn new(driver: ProgressiveMesh<M>, ops: Vec<CollapseOp>) -> Self {
        let applied = ops.len();
        Self {
            driver,
            ops,
            applied,
        }
    }

    pub fn driver(&self) -> &ProgressiveMesh<M> {
        &self.driver
    }

    pub fn face_count(&self) -> usize {
        self.driver.face_count()
    }

    pub fn vertex_count(&self) -> usize {
        self.driver.vertex_count()
    }

    /// Applied-collapse cursor position.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn at_base_mesh(&self) -> bool {
        self.applied == self.ops.len()
    }

    pub fn at_full_detail(&self) -> bool {
        self.applied == 0
    }

    /// One step coarser: re-applies the next recorded collapse.
    pub fn less(&mut self) -> Result<(), SimplifyError> {
        if self.at_base_mesh() {
            return Err(SimplifyError::AtBaseMesh);
        }
        self.driver.ecol(&self.ops[self.applied])?;
        self.applied += 1;
        debug!(applied = self.applied, "lod step down");
        Ok(())
    }

    /// One step finer: splits the most recent collapse back out.
    pub fn more(&mut self) -> Result<(), SimplifyError> {
        if self.at_full_detail() {
            return Err(SimplifyError::AtFullDetail);
        }
        self.driver.vsplit(&self.ops[self.applied - 1])?;
        self.applied -= 1;
        debug!(applied = self.applied, "lod step up");
        Ok(())
    }
}
