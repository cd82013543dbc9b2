use tracing::{debug, instrument};

use crate::error::{KernelError, KernelResult};
use crate::geometry::vector::{average, newell_normal};
use crate::geometry::{BoundingBox, Plane, Point3d, Vec3};
use crate::topology::builder::{FaceLoop, PolygonSoup};
use crate::topology::polyhedron::{Polyhedron, VertexId};
use crate::Tolerance;

impl Polyhedron {
    /// Move one vertex to `position`. See [`Polyhedron::move_vertices`].
    pub fn move_vertex(
        &mut self,
        vertex: VertexId,
        position: Point3d,
        world_bounds: &BoundingBox,
        tolerance: &Tolerance,
    ) -> KernelResult<()> {
        self.relocate(&[(vertex, position)], world_bounds, tolerance)
    }

    /// Translate a set of vertices by `delta`.
    ///
    /// Faces touching a moved vertex get their plane re-derived from the
    /// moved boundary. A face that is no longer planar is split into
    /// triangles, and neighbouring faces that end up coplanar are merged.
    /// Vertices moved onto a neighbour merge with it. The result must pass
    /// full validation; otherwise the solid is left unchanged.
    pub fn move_vertices(
        &mut self,
        vertices: &[VertexId],
        delta: &Vec3,
        world_bounds: &BoundingBox,
        tolerance: &Tolerance,
    ) -> KernelResult<()> {
        let mut moves = Vec::with_capacity(vertices.len());
        for &id in vertices {
            let vertex = self.vertex(id).ok_or(KernelError::UnknownVertex)?;
            moves.push((id, vertex.position + *delta));
        }
        self.relocate(&moves, world_bounds, tolerance)
    }

    #[instrument(skip_all, fields(moves = moves.len()))]
    fn relocate(
        &mut self,
        moves: &[(VertexId, Point3d)],
        world_bounds: &BoundingBox,
        tolerance: &Tolerance,
    ) -> KernelResult<()> {
        let (mut soup, index) = PolygonSoup::from_polyhedron_indexed(self);
        let mut moved = vec![false; soup.positions.len()];

        for &(id, target) in moves {
            let i = *index.get(id).ok_or(KernelError::UnknownVertex)?;
            if !world_bounds.contains_point(&target) {
                return Err(KernelError::OutsideWorldBounds);
            }
            soup.positions[i] = target;
            moved[i] = true;
        }

        // A vertex absorbing a moved one counts as moved itself.
        for _ in 0..soup.positions.len() {
            let Some((keep, remove)) = soup.find_short_edge(tolerance.min_edge_length) else {
                break;
            };
            moved[keep] |= moved[remove];
            soup.collapse_vertex(remove, keep);
        }

        let mut loops = Vec::with_capacity(soup.loops.len());
        for face in std::mem::take(&mut soup.loops) {
            if !face.vertices.iter().any(|&v| moved[v]) {
                loops.push(face);
                continue;
            }
            loops.extend(replan_face(&soup, face, tolerance)?);
        }
        soup.loops = loops;

        soup.merge_coplanar_loops(tolerance.almost_zero);
        soup.remove_degree_two_vertices();

        let (result, _) = soup.assemble()?;
        result.verify(tolerance)?;

        debug!(
            vertices = result.vertex_count(),
            faces = result.face_count(),
            "moved vertices"
        );
        *self = result;
        Ok(())
    }
}

/// Re-derive the plane of a face whose boundary moved, splitting it into a
/// triangle fan if the boundary is no longer planar.
fn replan_face(soup: &PolygonSoup, face: FaceLoop, tolerance: &Tolerance) -> KernelResult<Vec<FaceLoop>> {
    let points = soup.loop_positions(&face);
    let normal = newell_normal(&points)
        .try_normalize(tolerance.angle)
        .ok_or_else(|| KernelError::degenerate("a face collapsed to a line"))?;
    let plane = Plane::from_point_normal(&average(&points), normal);
    if points.iter().all(|p| plane.point_distance(p).abs() <= tolerance.point_status) {
        return Ok(vec![FaceLoop { plane, ..face }]);
    }

    // Try each vertex as the fan apex and keep the first split that folds outward.
    let n = face.vertices.len();
    for apex in 0..n {
        let mut triangles = Vec::with_capacity(n - 2);
        for i in 1..n - 1 {
            let (a, b, c) = (apex, (apex + i) % n, (apex + i + 1) % n);
            let Some(plane) = Plane::from_points(&points[a], &points[c], &points[b], tolerance.colinear) else {
                break;
            };
            triangles.push(FaceLoop {
                vertices: vec![face.vertices[a], face.vertices[b], face.vertices[c]],
                plane,
                payload: face.payload,
            });
        }
        let folds_outward = triangles.len() == n - 2
            && triangles.iter().all(|t| {
                points
                    .iter()
                    .all(|p| t.plane.point_distance(p) <= tolerance.point_status)
            });
        if folds_outward {
            return Ok(triangles);
        }
    }
    Err(KernelError::NonConvex)
}
