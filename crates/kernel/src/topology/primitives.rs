use tracing::{debug, instrument};

use super::builder::PolygonSoup;
use super::polyhedron::Polyhedron;
use crate::error::{KernelError, KernelResult};
use crate::geometry::{BoundingBox, Plane, Vec3};

impl Polyhedron {
    /// Axis-aligned box filling `bbox`. Faces carry no payload.
    #[instrument]
    pub fn cuboid(bbox: &BoundingBox) -> KernelResult<Self> {
        let size = bbox.size();
        if !bbox.is_valid() || size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err(KernelError::degenerate("bounding box has no volume"));
        }
        debug!(min = ?bbox.min, max = ?bbox.max, "creating cuboid");

        let mut soup = PolygonSoup::new();
        for corner in bbox.vertices() {
            soup.add_position(corner);
        }

        // Corner index bits: 1 = max x, 2 = max y, 4 = max z.
        let face_defs: [([usize; 4], Vec3, f64); 6] = [
            ([0, 4, 6, 2], -Vec3::x(), -bbox.min.x),
            ([1, 3, 7, 5], Vec3::x(), bbox.max.x),
            ([0, 1, 5, 4], -Vec3::y(), -bbox.min.y),
            ([2, 6, 7, 3], Vec3::y(), bbox.max.y),
            ([0, 2, 3, 1], -Vec3::z(), -bbox.min.z),
            ([4, 5, 7, 6], Vec3::z(), bbox.max.z),
        ];
        for (vertices, normal, distance) in face_defs {
            soup.add_loop(vertices.to_vec(), Plane::new(normal, distance), None);
        }

        soup.assemble().map(|(poly, _)| poly)
    }
}
