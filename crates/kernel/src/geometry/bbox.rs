use serde::{Deserialize, Serialize};

use super::{Point3d, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// A cube centered at the origin extending `half_size` along each axis.
    pub fn cube(half_size: f64) -> Self {
        Self {
            min: Point3d::new(-half_size, -half_size, -half_size),
            max: Point3d::new(half_size, half_size, half_size),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3d>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Closed overlap test: boxes sharing only a face still intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersects_eps(other, 0.0)
    }

    pub fn intersects_eps(&self, other: &Self, epsilon: f64) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] + epsilon && self.max[i] >= other.min[i] - epsilon)
    }

    pub fn contains_point(&self, p: &Point3d) -> bool {
        self.contains_point_eps(p, 0.0)
    }

    pub fn contains_point_eps(&self, p: &Point3d, epsilon: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - epsilon && p[i] <= self.max[i] + epsilon)
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    pub fn center(&self) -> Point3d {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// The eight corners; bit 0 of the index selects max x, bit 1 max y, bit 2 max z.
    pub fn vertices(&self) -> [Point3d; 8] {
        std::array::from_fn(|i| {
            Point3d::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}
