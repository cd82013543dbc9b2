pub mod engine;

use crate::geometry::BoundingBox;
use crate::topology::polyhedron::Polyhedron;
use crate::Tolerance;
use engine::CsgFailure;

/// Trait for CSG operations on convex solids.
///
/// Provides `subtract`, `intersect`, and `convex_merge`. Implement this
/// trait to provide alternative CSG backends or mock implementations.
/// Inputs are never modified.
pub trait CsgEngine {
    /// Decompose `a \ b` into disjoint convex fragments.
    fn subtract(&self, a: &Polyhedron, b: &Polyhedron) -> Result<Vec<Polyhedron>, CsgFailure>;

    /// Compute the intersection of two solids, `None` if they share no volume.
    fn intersect(&self, a: &Polyhedron, b: &Polyhedron) -> Result<Option<Polyhedron>, CsgFailure>;

    /// Convex hull of the vertices of all `solids`.
    fn convex_merge(&self, solids: &[&Polyhedron]) -> Result<Polyhedron, CsgFailure>;
}

/// Default CSG engine built on plane clipping.
#[derive(Debug, Clone)]
pub struct ClipCsg {
    pub tolerance: Tolerance,
    pub world_bounds: BoundingBox,
}

impl ClipCsg {
    pub fn new(world_bounds: BoundingBox) -> Self {
        Self {
            tolerance: Tolerance::default(),
            world_bounds,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl CsgEngine for ClipCsg {
    fn subtract(&self, a: &Polyhedron, b: &Polyhedron) -> Result<Vec<Polyhedron>, CsgFailure> {
        engine::subtract(a, b, &self.tolerance)
    }

    fn intersect(&self, a: &Polyhedron, b: &Polyhedron) -> Result<Option<Polyhedron>, CsgFailure> {
        engine::intersect(a, b, &self.tolerance)
    }

    fn convex_merge(&self, solids: &[&Polyhedron]) -> Result<Polyhedron, CsgFailure> {
        engine::convex_merge(solids, &self.world_bounds, &self.tolerance)
    }
}
