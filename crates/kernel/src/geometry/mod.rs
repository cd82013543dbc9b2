pub mod bbox;
pub mod intersection;
pub mod plane;
pub mod vector;

pub use bbox::BoundingBox;
pub use plane::{Plane, PointStatus};

/// A direction or displacement in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// A position in 3D space.
pub type Point3d = nalgebra::Point3<f64>;
