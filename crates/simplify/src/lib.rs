//! Progressive, contact-aware mesh simplification.
//!
//! Built on the [`topology`] half-edge store, this crate provides:
//!
//! - an algebraic-sphere error metric ([`Primitive`], [`ErrorMetric`]),
//! - a deterministic collapse candidate queue ([`CollapseQueue`]),
//! - the greedy single-mesh driver ([`ProgressiveMesh`]) producing a
//!   replayable collapse history,
//! - level-of-detail navigation over that history ([`Lod`]),
//! - and a multi-object driver ([`ContactSimplifier`]) that inflates
//!   collapse costs near other objects so contact regions survive
//!   aggressive simplification.
//!
//! ```
//! use simplify::{AlgebraicSphereMetric, Lod, ProgressiveMesh};
//! use topology::shapes;
//!
//! let sphere = shapes::uv_sphere(25, 21);
//! let mut driver = ProgressiveMesh::new(&sphere, AlgebraicSphereMetric)?;
//! let ops = driver.construct_m0(100)?;
//! let mut lod = Lod::new(driver, ops);
//! while lod.more().is_ok() {}
//! assert_eq!(lod.face_count(), 1000);
//! # Ok::<(), simplify::SimplifyError>(())
//! ```

mod color;
mod contact;
mod error;
mod lod;
mod metric;
mod progressive;
mod queue;
mod spatial;

pub use color::VertexColor;
pub use contact::{ContactParams, ContactSimplifier};
pub use error::SimplifyError;
pub use lod::Lod;
pub use metric::{AlgebraicSphereMetric, ErrorMetric, PlaneMetric, Primitive};
pub use progressive::{CollapseOp, DriverState, ProgressiveMesh, SphereSnapshot};
pub use queue::{CollapseQueue, QueueEntry};
pub use spatial::{closest_point_on_triangle, OctreeConfig, TriangleOctree};
