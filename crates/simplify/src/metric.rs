//! Algebraic-sphere error metric.
//!
//! A primitive is the scalar field `u(x) = uc + ul·x + uq·(x·x)`. With
//! `uq = 0` the zero set is a plane; otherwise it is a sphere. Fields are
//! kept Pratt-normalized (`|ul·ul − 4·uc·uq| = 1`) so that `u(x)` near the
//! zero set approximates signed distance and fields from different faces
//! combine on a comparable scale. Coefficients are `f64`: the collapse
//! loop feeds differences of nearly equal quantities through these fields
//! thousands of times, and `f32` drift is visible in the ordering.

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};
use topology::{FaceId, HalfEdgeMesh};

const PRATT_EPSILON: f64 = 1e-12;

/// Algebraic sphere `u(x) = uc + ul·x + uq·(x·x)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub uc: f64,
    pub ul: DVec3,
    pub uq: f64,
}

impl Primitive {
    /// Plane through `point` with unit normal `normal`, in algebraic form.
    pub fn plane(normal: DVec3, point: DVec3) -> Self {
        Self {
            uc: -normal.dot(point),
            ul: normal,
            uq: 0.0,
        }
    }

    /// Sphere osculating the surface at `point`: gradient `normal` at the
    /// point, curvature coefficient `uq`, `u(point) = 0`.
    pub fn osculating(normal: DVec3, point: DVec3, uq: f64) -> Self {
        let ul = normal - 2.0 * uq * point;
        Self {
            uc: -(ul.dot(point) + uq * point.length_squared()),
            ul,
            uq,
        }
    }

    /// The Pratt norm `ul·ul − 4·uc·uq` of the coefficient vector.
    pub fn pratt_norm(&self) -> f64 {
        self.ul.length_squared() - 4.0 * self.uc * self.uq
    }

    /// Rescales the coefficients so `|pratt_norm| == 1`. Required after
    /// every combination; a no-op on a degenerate (near-null) field.
    pub fn apply_pratt_norm(&mut self) {
        let norm = self.pratt_norm().abs();
        if norm > PRATT_EPSILON {
            let inv = 1.0 / norm.sqrt();
            self.uc *= inv;
            self.ul *= inv;
            self.uq *= inv;
        }
    }

    /// True when the zero set is (numerically) a plane.
    pub fn is_plane(&self) -> bool {
        self.uq.abs() < PRATT_EPSILON
    }

    /// Evaluates the scalar field at `x`.
    pub fn eval(&self, x: DVec3) -> f64 {
        self.uc + self.ul.dot(x) + self.uq * x.length_squared()
    }

    /// Center of the sphere, or the plane's foot point from the origin.
    pub fn center(&self) -> DVec3 {
        if self.is_plane() {
            let d = self.ul.length_squared();
            if d > PRATT_EPSILON {
                -self.uc * self.ul / d
            } else {
                DVec3::ZERO
            }
        } else {
            -self.ul / (2.0 * self.uq)
        }
    }

    /// Sphere radius; zero for a plane or a null field.
    pub fn radius(&self) -> f64 {
        if self.is_plane() {
            0.0
        } else {
            self.pratt_norm().max(0.0).sqrt() / (2.0 * self.uq.abs())
        }
    }

    /// Projects `x` onto the zero set.
    pub fn project(&self, x: DVec3) -> DVec3 {
        if self.is_plane() {
            let d = self.ul.length_squared();
            if d > PRATT_EPSILON {
                x - self.eval(x) * self.ul / d
            } else {
                x
            }
        } else {
            let center = self.center();
            let dir = x - center;
            let len = dir.length();
            if len > PRATT_EPSILON {
                center + dir * (self.radius() / len)
            } else {
                center + DVec3::Z * self.radius()
            }
        }
    }

    /// Accumulates `weight * other` into this field, without
    /// renormalizing.
    pub fn add_scaled(&mut self, other: &Self, weight: f64) {
        self.uc += weight * other.uc;
        self.ul += weight * other.ul;
        self.uq += weight * other.uq;
    }

    /// Divides the coefficients by `count`, for averaging accumulated
    /// fields.
    pub fn scale(&mut self, factor: f64) {
        self.uc *= factor;
        self.ul *= factor;
        self.uq *= factor;
    }
}

/// Pluggable per-face fit; everything downstream of the fit (combination,
/// evaluation, the collapse position search) is shared.
pub trait ErrorMetric {
    /// Fits a primitive to one face. `mean_edge_length` and `scale`
    /// parameterize the curvature bias of the fit.
    fn generate_face_primitive(
        &self,
        mesh: &HalfEdgeMesh,
        face: FaceId,
        mean_edge_length: f32,
        scale: f32,
    ) -> Primitive;

    /// Weighted coefficient blend of two normalized fields. The result is
    /// *not* renormalized; callers apply the Pratt norm after every
    /// combination.
    fn combine(&self, a: &Primitive, wa: f64, b: &Primitive, wb: f64) -> Primitive {
        let mut out = Primitive::default();
        out.add_scaled(a, wa);
        out.add_scaled(b, wb);
        out
    }

    /// Scalar collapse cost of moving both endpoints of the segment
    /// `a -> b` to one point on the segment, and the minimizing point.
    ///
    /// The cost is the squared field value; for a planar field the
    /// minimizer is analytic, otherwise the segment is sampled.
    fn compute_error(&self, q: &Primitive, a: Vec3, b: Vec3) -> (f64, Vec3) {
        let pa = a.as_dvec3();
        let pb = b.as_dvec3();
        if q.is_plane() {
            // u is affine along the segment: zero crossing if inside,
            // else the nearer endpoint.
            let ua = q.eval(pa);
            let ub = q.eval(pb);
            let t = if (ua - ub).abs() < PRATT_EPSILON {
                0.5
            } else {
                (ua / (ua - ub)).clamp(0.0, 1.0)
            };
            let p = pa.lerp(pb, t);
            (q.eval(p).powi(2), p.as_vec3())
        } else {
            let mut best_err = f64::INFINITY;
            let mut best = pa;
            for i in 0..=8 {
                let p = pa.lerp(pb, f64::from(i) / 8.0);
                let err = q.eval(p).powi(2);
                if err < best_err {
                    best_err = err;
                    best = p;
                }
            }
            (best_err, best.as_vec3())
        }
    }

    /// Unsigned field value at a point, used as a geometric deviation
    /// measure against an aggregated field.
    fn geometric_error(&self, q: &Primitive, p: Vec3) -> f64 {
        q.eval(p.as_dvec3()).abs()
    }
}

/// Face fit as an osculating algebraic sphere. `scale == 0` degenerates
/// to the supporting plane; larger values bend the fit with curvature
/// `scale / (2 * mean_edge_length)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgebraicSphereMetric;

impl ErrorMetric for AlgebraicSphereMetric {
    fn generate_face_primitive(
        &self,
        mesh: &HalfEdgeMesh,
        face: FaceId,
        mean_edge_length: f32,
        scale: f32,
    ) -> Primitive {
        let normal = mesh.face_normal(face).unwrap_or(Vec3::Z).as_dvec3();
        let centroid = mesh
            .face_centroid(face)
            .unwrap_or(Vec3::ZERO)
            .as_dvec3();
        let mut q = if scale > 0.0 && mean_edge_length > 0.0 {
            let uq = f64::from(scale) / (2.0 * f64::from(mean_edge_length));
            Primitive::osculating(normal, centroid, uq)
        } else {
            Primitive::plane(normal, centroid)
        };
        q.apply_pratt_norm();
        q
    }
}

/// Pure plane fit, the classic quadric-style baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneMetric;

impl ErrorMetric for PlaneMetric {
    fn generate_face_primitive(
        &self,
        mesh: &HalfEdgeMesh,
        face: FaceId,
        _mean_edge_length: f32,
        _scale: f32,
    ) -> Primitive {
        let normal = mesh.face_normal(face).unwrap_or(Vec3::Z).as_dvec3();
        let centroid = mesh
            .face_centroid(face)
            .unwrap_or(Vec3::ZERO)
            .as_dvec3();
        let mut q = Primitive::plane(normal, centroid);
        q.apply_pratt_norm();
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3 as D;
    use glam::Vec3 as V;
    use topology::shapes;

    #[test]
    fn plane_field_is_signed_distance() {
        let q = Primitive::plane(D::Z, D::new(3.0, -1.0, 2.0));
        assert!((q.eval(D::new(0.0, 0.0, 5.0)) - 3.0).abs() < 1e-12);
        assert!((q.eval(D::new(9.0, 9.0, 2.0))).abs() < 1e-12);
        assert!(q.is_plane());
        assert!((q.pratt_norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn osculating_sphere_passes_through_the_point() {
        let p = D::new(1.0, 2.0, 3.0);
        let mut q = Primitive::osculating(D::X, p, 0.25);
        assert!(q.eval(p).abs() < 1e-12);
        q.apply_pratt_norm();
        assert!((q.pratt_norm().abs() - 1.0).abs() < 1e-9);
        // The zero set is still a sphere through p.
        assert!(q.eval(p).abs() < 1e-9);
        assert!((q.project(p + D::Y).distance(q.center()) - q.radius()).abs() < 1e-9);
    }

    #[test]
    fn combine_then_normalize_stays_unit() {
        let metric = PlaneMetric;
        let a = Primitive::plane(D::Z, D::ZERO);
        let b = Primitive::plane(D::X, D::ZERO);
        let mut c = metric.combine(&a, 0.5, &b, 0.5);
        c.apply_pratt_norm();
        assert!((c.pratt_norm().abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn planar_error_is_zero_on_the_plane() {
        let metric = PlaneMetric;
        let q = Primitive::plane(D::Z, D::ZERO);
        let (err, p) = metric.compute_error(&q, V::new(0.0, 0.0, -1.0), V::new(0.0, 0.0, 3.0));
        assert!(err < 1e-12);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn planar_error_clamps_to_the_nearer_endpoint() {
        let metric = PlaneMetric;
        let q = Primitive::plane(D::Z, D::ZERO);
        let (err, p) = metric.compute_error(&q, V::new(0.0, 0.0, 1.0), V::new(0.0, 0.0, 4.0));
        assert!((err - 1.0).abs() < 1e-9);
        assert!((p.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn face_fit_vanishes_on_the_face() {
        let mesh = topology::HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        let metric = AlgebraicSphereMetric;
        for face in mesh.faces() {
            let q = metric.generate_face_primitive(&mesh, face.id, 1.0, 0.0);
            let centroid = mesh.face_centroid(face.id).unwrap();
            assert!(metric.geometric_error(&q, centroid) < 1e-6);
        }
    }

    #[test]
    fn curvature_bias_bends_the_fit() {
        let mesh = topology::HalfEdgeMesh::from_tri_mesh(&shapes::unit_cube()).unwrap();
        let metric = AlgebraicSphereMetric;
        let face = mesh.faces()[0].id;
        let q = metric.generate_face_primitive(&mesh, face, 1.0, 1.0);
        assert!(!q.is_plane());
        let centroid = mesh.face_centroid(face).unwrap();
        assert!(metric.geometric_error(&q, centroid) < 1e-9);
    }
}
