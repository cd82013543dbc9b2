pub mod error;
pub mod geometry;
pub mod topology;
pub mod construction;
pub mod boolean;
pub mod validation;

use serde::{Deserialize, Serialize};

// Re-export the types most callers need at crate root.
pub use boolean::engine::CsgFailure;
pub use boolean::{ClipCsg, CsgEngine};
pub use construction::clip::ClipOutcome;
pub use error::{ErrorKind, KernelError, KernelResult};
pub use geometry::{BoundingBox, Plane, Point3d, PointStatus, Vec3};
pub use topology::polyhedron::{EdgeId, FaceId, HalfEdgeId, Polyhedron, VertexId};

/// Tolerance configuration for plane classification and solid repair.
///
/// The defaults are tuned against real map content; change them only
/// together with the regression corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Points closer than this to a plane are classified as inside it.
    pub point_status: f64,
    /// Squared-area threshold below which three points are collinear.
    pub colinear: f64,
    /// Coordinates within this distance of an integer are snapped to it.
    pub correct: f64,
    /// Generic "close enough to zero" threshold for vector comparisons.
    pub almost_zero: f64,
    /// Angles (and normal deviations) below this are zero.
    pub angle: f64,
    /// Edges shorter than this are collapsed after construction.
    pub min_edge_length: f64,
    /// Solids with a smaller volume are degenerate.
    pub min_volume: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            point_status: 1e-4,
            colinear: 1e-5,
            correct: 1e-3,
            almost_zero: 1e-3,
            angle: 1e-8,
            min_edge_length: 0.01,
            min_volume: 1e-6,
        }
    }
}

impl Tolerance {
    /// Tighter thresholds for inputs known to be well conditioned.
    pub fn strict() -> Self {
        Self {
            point_status: 1e-7,
            colinear: 1e-9,
            correct: 1e-6,
            almost_zero: 1e-6,
            angle: 1e-10,
            min_edge_length: 1e-4,
            min_volume: 1e-9,
        }
    }

    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        (a - b).norm() < self.min_edge_length
    }

    pub fn is_short_edge(&self, length: f64) -> bool {
        length < self.min_edge_length
    }

    /// Maximum distance a vertex of a repaired solid may lie off its face plane.
    pub fn plane_fit(&self) -> f64 {
        self.min_edge_length.max(2.0 * self.correct) + self.point_status
    }

    /// Maximum distance a vertex may lie in front of a face it does not
    /// belong to. Covers coordinate snapping only.
    pub fn convexity_fit(&self) -> f64 {
        2.0 * self.correct + self.point_status
    }
}
