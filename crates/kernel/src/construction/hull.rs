use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::error::{KernelError, KernelResult};
use crate::geometry::{BoundingBox, Plane, Point3d};
use crate::topology::polyhedron::Polyhedron;
use crate::Tolerance;

impl Polyhedron {
    /// Convex hull of a point cloud.
    ///
    /// Strategy:
    /// 1. Drop points closer than the minimum edge length to an earlier point
    /// 2. Grow a triangulated hull from an initial tetrahedron, one point at a time
    /// 3. Merge coplanar triangles into supporting planes
    /// 4. Build the solid from those planes in canonical order
    ///
    /// Faces carry the index of their plane in that canonical order.
    #[instrument(skip_all, fields(points = points.len()))]
    pub fn from_points(
        world_bounds: &BoundingBox,
        points: &[Point3d],
        tolerance: &Tolerance,
    ) -> KernelResult<Self> {
        let mut unique: Vec<Point3d> = Vec::with_capacity(points.len());
        for p in points {
            if !unique.iter().any(|q| tolerance.points_coincident(p, q)) {
                unique.push(*p);
            }
        }
        if unique.len() < 4 {
            return Err(KernelError::TooFewPoints { count: unique.len() });
        }

        let planes = supporting_planes(&unique, tolerance)?;
        debug!(unique = unique.len(), planes = planes.len(), "found supporting planes");
        Polyhedron::from_planes(world_bounds, &planes, tolerance)
    }
}

/// Hull triangle wound counter-clockwise seen from outside.
#[derive(Debug, Clone, Copy)]
struct Triangle {
    vertices: [usize; 3],
    plane: Plane,
}

impl Triangle {
    fn new(points: &[Point3d], a: usize, b: usize, c: usize) -> KernelResult<Self> {
        let normal = (points[b] - points[a])
            .cross(&(points[c] - points[a]))
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| KernelError::degenerate("hull triangle has no area"))?;
        Ok(Self {
            vertices: [a, b, c],
            plane: Plane::from_point_normal(&points[a], normal),
        })
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Four points spanning a solid, or the reason none exist.
fn initial_simplex(points: &[Point3d], tolerance: &Tolerance) -> KernelResult<[usize; 4]> {
    let eps = tolerance.point_status;
    let farthest = |score: &dyn Fn(&Point3d) -> f64| {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, score(p)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0))
    };

    let a = 0;
    let (b, _) = farthest(&|p| (p - points[a]).norm_squared());
    let axis = (points[b] - points[a]).normalize();
    let (c, off_line) = farthest(&|p| (p - points[a]).cross(&axis).norm());
    if off_line <= eps {
        return Err(KernelError::degenerate("points are collinear"));
    }
    let base = Triangle::new(points, a, b, c)?;
    let (d, off_plane) = farthest(&|p| base.plane.point_distance(p).abs());
    if off_plane <= eps {
        return Err(KernelError::degenerate("points are coplanar"));
    }
    Ok([a, b, c, d])
}

/// Planes of the hull faces, deduplicated and in canonical order.
fn supporting_planes(points: &[Point3d], tolerance: &Tolerance) -> KernelResult<Vec<Plane>> {
    let eps = tolerance.point_status;
    let simplex = initial_simplex(points, tolerance)?;

    let mut triangles: Vec<Triangle> = Vec::with_capacity(2 * points.len());
    for skip in 0..4 {
        let others: Vec<usize> = (0..4).filter(|&i| i != skip).map(|i| simplex[i]).collect();
        let mut tri = Triangle::new(points, others[0], others[1], others[2])?;
        if tri.plane.point_distance(&points[simplex[skip]]) > 0.0 {
            tri = Triangle::new(points, others[0], others[2], others[1])?;
        }
        triangles.push(tri);
    }

    for (index, point) in points.iter().enumerate() {
        if simplex.contains(&index) {
            continue;
        }
        let (visible, hidden): (Vec<Triangle>, Vec<Triangle>) = triangles
            .iter()
            .copied()
            .partition(|t| t.plane.point_distance(point) > eps);
        if visible.is_empty() {
            continue;
        }

        let visible_edges: HashSet<(usize, usize)> =
            visible.iter().flat_map(|t| t.edges()).collect();
        triangles = hidden;
        for (from, to) in visible.iter().flat_map(|t| t.edges()) {
            if !visible_edges.contains(&(to, from)) {
                triangles.push(Triangle::new(points, from, to, index)?);
            }
        }
    }

    let mut planes: Vec<Plane> = Vec::new();
    for tri in &triangles {
        if planes.iter().any(|q| q.is_equal(&tri.plane, tolerance.almost_zero)) {
            continue;
        }
        if points.iter().any(|p| tri.plane.point_distance(p) > tolerance.plane_fit()) {
            debug!(vertices = ?tri.vertices, "dropping hull plane that cuts off points");
            continue;
        }
        planes.push(tri.plane);
    }
    planes.sort_by(|a, b| a.canonical_cmp(b));
    Ok(planes)
}
