//! Error type for the simplification drivers.

use thiserror::Error;
use topology::TopologyError;

#[derive(Debug, Error)]
pub enum SimplifyError {
    #[error("collapse queue is empty")]
    EmptyQueue,

    #[error("candidate edge is not collapsible")]
    EdgeNotCollapsible,

    #[error("contact-augmented error {augmented} fell below the local error {local}")]
    ContactMonotonicityViolation { local: f64, augmented: f64 },

    #[error("already at the base mesh")]
    AtBaseMesh,

    #[error("already at full detail")]
    AtFullDetail,

    #[error("object index {0} out of range")]
    UnknownObject(usize),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}
