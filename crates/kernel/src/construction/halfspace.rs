use tracing::{debug, info, instrument};

use super::clip::ClipOutcome;
use crate::error::{KernelError, KernelResult};
use crate::geometry::{BoundingBox, Plane};
use crate::topology::polyhedron::Polyhedron;
use crate::Tolerance;

impl Polyhedron {
    /// Intersect the half-spaces behind `planes`, in the given order.
    ///
    /// Strategy:
    /// 1. Seed with a cuboid filling `world_bounds`
    /// 2. Clip by each plane; the resulting face carries the plane's index
    /// 3. Reject the result if a seed face survived (the planes do not close the solid)
    /// 4. Snap near-integral vertex coordinates and collapse short edges
    /// 5. Validate
    ///
    /// Planes that cut nothing produce no face. Of two equal planes the first wins.
    #[instrument(skip_all, fields(planes = planes.len()))]
    pub fn from_planes(
        world_bounds: &BoundingBox,
        planes: &[Plane],
        tolerance: &Tolerance,
    ) -> KernelResult<Self> {
        if planes.len() < 4 {
            return Err(KernelError::TooFewPlanes { count: planes.len() });
        }

        let mut poly = Polyhedron::cuboid(world_bounds)?;
        for (index, plane) in planes.iter().enumerate() {
            match poly.clip(plane, Some(index), tolerance)? {
                ClipOutcome::Empty => {
                    debug!(index, "plane leaves nothing behind it");
                    return Err(KernelError::Empty);
                }
                ClipOutcome::Unchanged => {
                    // A plane lying on the world bounds claims the seed face there.
                    let seed_face = poly.faces.values_mut().find(|f| {
                        f.payload.is_none() && f.plane.is_equal(plane, tolerance.point_status)
                    });
                    match seed_face {
                        Some(face) => face.payload = Some(index),
                        None => debug!(index, "redundant plane"),
                    }
                }
                ClipOutcome::Clipped { .. } => {}
            }
        }

        if !poly.is_bounded() {
            return Err(KernelError::Unbounded);
        }

        poly.correct_vertex_positions(tolerance);
        poly.heal(tolerance)?;
        poly.verify(tolerance)?;

        info!(
            vertices = poly.vertex_count(),
            edges = poly.edge_count(),
            faces = poly.face_count(),
            "constructed polyhedron from planes"
        );
        Ok(poly)
    }
}
