use std::cmp::Ordering;

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use super::vector::{compare_lexicographic, is_colinear, normal_weight};
use super::{Point3d, Vec3};

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointStatus {
    /// In front of the plane (on the side the normal points to).
    Above,
    /// Behind the plane, inside the half-space it bounds.
    Below,
    /// On the plane within the classification epsilon.
    Inside,
}

/// An oriented plane: points `p` with `normal · p == distance` lie on it.
///
/// The half-space bounded by the plane is the region behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f64,
}

impl Plane {
    /// Create a plane from a unit normal and a signed distance.
    pub fn new(normal: Vec3, distance: f64) -> Self {
        Self { normal, distance }
    }

    pub fn from_point_normal(point: &Point3d, normal: Vec3) -> Self {
        Self {
            normal,
            distance: normal.dot(&point.coords),
        }
    }

    /// Plane through three points, oriented by `(p3 - p1) × (p2 - p1)`.
    ///
    /// Returns `None` when the points are collinear within `epsilon`
    /// (see [`Tolerance::colinear`](crate::Tolerance::colinear)).
    pub fn from_points(p1: &Point3d, p2: &Point3d, p3: &Point3d, epsilon: f64) -> Option<Self> {
        if is_colinear(p1, p2, p3, epsilon) {
            return None;
        }
        let normal = (p3 - p1).cross(&(p2 - p1));
        let length = normal.norm();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(Self::from_point_normal(p1, normal / length))
    }

    /// Signed distance of `point` from the plane, positive in front.
    pub fn point_distance(&self, point: &Point3d) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    pub fn point_status(&self, point: &Point3d, epsilon: f64) -> PointStatus {
        let distance = self.point_distance(point);
        if distance > epsilon {
            PointStatus::Above
        } else if distance < -epsilon {
            PointStatus::Below
        } else {
            PointStatus::Inside
        }
    }

    /// The same plane bounding the opposite half-space.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Orthogonal projection of `point` onto the plane.
    pub fn project_point(&self, point: &Point3d) -> Point3d {
        point - self.normal * self.point_distance(point)
    }

    /// The point of the plane closest to the origin.
    pub fn anchor(&self) -> Point3d {
        Point3d::from(self.normal * self.distance)
    }

    pub fn translated(&self, delta: &Vec3) -> Self {
        Self {
            normal: self.normal,
            distance: self.distance + self.normal.dot(delta),
        }
    }

    /// Component-wise comparison of normal and distance within `epsilon`.
    pub fn is_equal(&self, other: &Plane, epsilon: f64) -> bool {
        self.normal.abs_diff_eq(&other.normal, epsilon)
            && self.distance.abs_diff_eq(&other.distance, epsilon)
    }

    /// Whether `other` is this plane facing the other way.
    pub fn is_inverted(&self, other: &Plane, epsilon: f64) -> bool {
        self.is_equal(&other.flipped(), epsilon)
    }

    /// Canonical order: normal weight, then distance, then the normal itself.
    ///
    /// Sorting a plane set by this key makes construction independent of
    /// the order the planes were given in.
    pub fn canonical_cmp(&self, other: &Plane) -> Ordering {
        normal_weight(&self.normal)
            .cmp(&normal_weight(&other.normal))
            .then_with(|| self.distance.total_cmp(&other.distance))
            .then_with(|| compare_lexicographic(&self.normal, &other.normal))
    }

    /// A point of the plane and two unit axes spanning it.
    ///
    /// The axes form a right-handed frame with the normal, so angles
    /// measured in it increase counter-clockwise seen from the front.
    pub fn frame(&self) -> (Point3d, Vec3, Vec3) {
        let u = super::vector::any_orthogonal(&self.normal);
        let v = self.normal.cross(&u);
        (self.anchor(), u, v)
    }

    /// 2D coordinates of `point` in [`Plane::frame`].
    pub fn project_2d(&self, point: &Point3d) -> (f64, f64) {
        let (origin, u, v) = self.frame();
        let d = point - origin;
        (d.dot(&u), d.dot(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_orientation() {
        let plane = Plane::from_points(
            &Point3d::new(-32.0, -32.0, -32.0),
            &Point3d::new(-32.0, -31.0, -32.0),
            &Point3d::new(-32.0, -32.0, -31.0),
            1e-5,
        )
        .unwrap();
        assert!((plane.normal - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((plane.distance - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_points_rejects_collinear() {
        let p = Plane::from_points(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 1.0, 1.0),
            &Point3d::new(2.0, 2.0, 2.0),
            1e-5,
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_from_points_epsilon_is_caller_supplied() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(2.0, 0.01, 0.0);
        assert!(Plane::from_points(&a, &c, &b, 1e-5).is_some());
        assert!(Plane::from_points(&a, &c, &b, 1e-2).is_none());
    }

    #[test]
    fn test_point_status() {
        let plane = Plane::new(Vec3::z(), 10.0);
        assert_eq!(plane.point_status(&Point3d::new(0.0, 0.0, 11.0), 1e-4), PointStatus::Above);
        assert_eq!(plane.point_status(&Point3d::new(0.0, 0.0, 9.0), 1e-4), PointStatus::Below);
        assert_eq!(plane.point_status(&Point3d::new(5.0, 5.0, 10.00001), 1e-4), PointStatus::Inside);
    }

    #[test]
    fn test_flipped_and_inverted() {
        let plane = Plane::new(Vec3::x(), 4.0);
        let flipped = plane.flipped();
        assert_eq!(flipped.normal, -Vec3::x());
        assert_eq!(flipped.distance, -4.0);
        assert!(plane.is_inverted(&flipped, 1e-9));
        assert!(!plane.is_equal(&flipped, 1e-9));
    }

    #[test]
    fn test_project_point() {
        let plane = Plane::new(Vec3::y(), 2.0);
        let p = plane.project_point(&Point3d::new(3.0, 7.0, -1.0));
        assert!((p - Point3d::new(3.0, 2.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_translated() {
        let plane = Plane::new(Vec3::z(), 1.0);
        let moved = plane.translated(&Vec3::new(5.0, 5.0, 3.0));
        assert!((moved.distance - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_canonical_order() {
        let mut planes = vec![
            Plane::new(Vec3::z(), 1.0),
            Plane::new(-Vec3::z(), 1.0),
            Plane::new(Vec3::x(), 1.0),
            Plane::new(-Vec3::x(), 1.0),
            Plane::new(Vec3::y(), 1.0),
            Plane::new(-Vec3::y(), 1.0),
        ];
        planes.sort_by(|a, b| a.canonical_cmp(b));
        let normals: Vec<Vec3> = planes.iter().map(|p| p.normal).collect();
        assert_eq!(
            normals,
            vec![Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()]
        );
    }

    #[test]
    fn test_frame_is_right_handed() {
        let plane = Plane::new(Vec3::new(1.0, 2.0, 2.0) / 3.0, 5.0);
        let (origin, u, v) = plane.frame();
        assert!(plane.point_distance(&origin).abs() < 1e-12);
        assert!((u.cross(&v) - plane.normal).norm() < 1e-12);
    }
}
