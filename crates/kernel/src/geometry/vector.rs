//! Scalar and vector helpers shared by the plane math and the solid repair passes.

use std::cmp::Ordering;

use super::{Point3d, Vec3};

/// Weight of one normal component for the canonical face order.
///
/// Components near `+1` sort first, components near `-1` next, everything
/// else last.
pub fn component_weight(value: f64) -> u32 {
    if (value - 1.0).abs() < 0.9 {
        0
    } else if (value + 1.0).abs() < 0.9 {
        1
    } else {
        2
    }
}

/// Combined weight of a normal: `100·wx + 10·wy + wz`.
pub fn normal_weight(normal: &Vec3) -> u32 {
    component_weight(normal.x) * 100 + component_weight(normal.y) * 10 + component_weight(normal.z)
}

/// Lexicographic comparison of two vectors using a total order on `f64`.
pub fn compare_lexicographic(a: &Vec3, b: &Vec3) -> Ordering {
    a.x.total_cmp(&b.x)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.z.total_cmp(&b.z))
}

/// Round `value` to the nearest integer if it is within `epsilon` of it.
pub fn correct(value: f64, epsilon: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < epsilon {
        rounded
    } else {
        value
    }
}

pub fn correct_point(point: &Point3d, epsilon: f64) -> Point3d {
    Point3d::new(
        correct(point.x, epsilon),
        correct(point.y, epsilon),
        correct(point.z, epsilon),
    )
}

/// Whether three points lie on a common line.
///
/// Compares the squared area of the parallelogram spanned by `a`, `b`, `c`
/// against `epsilon`.
pub fn is_colinear(a: &Point3d, b: &Point3d, c: &Point3d, epsilon: f64) -> bool {
    let ac = a - c;
    let ba = b - a;
    let j = ac.dot(&ba);
    let k = ac.norm_squared();
    let l = ba.norm_squared();
    (j * j - k * l).abs() <= epsilon
}

/// Area-weighted normal of a closed polygon (Newell's method).
///
/// Not normalized; the length is twice the polygon area.
pub fn newell_normal(points: &[Point3d]) -> Vec3 {
    let mut normal = Vec3::zeros();
    for (i, cur) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (cur.y - next.y) * (cur.z + next.z);
        normal.y += (cur.z - next.z) * (cur.x + next.x);
        normal.z += (cur.x - next.x) * (cur.y + next.y);
    }
    normal
}

/// Arithmetic mean of a set of points. Returns the origin for an empty slice.
pub fn average(points: &[Point3d]) -> Point3d {
    if points.is_empty() {
        return Point3d::origin();
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Point3d::from(sum / points.len() as f64)
}

/// Any unit vector perpendicular to `v`.
pub fn any_orthogonal(v: &Vec3) -> Vec3 {
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vec3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    v.cross(&axis).normalize()
}
