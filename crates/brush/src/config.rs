use brush_kernel::{BoundingBox, ClipCsg, Tolerance};
use serde::{Deserialize, Serialize};

use crate::attributes::{MapFormat, NO_MATERIAL};

/// Half-size of the default world volume.
pub const DEFAULT_WORLD_HALF_SIZE: f64 = 128.0 * 1024.0;

/// Settings threaded through every brush operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    /// Brushes must lie inside this box.
    pub world_bounds: BoundingBox,
    pub tolerance: Tolerance,
    /// Material for faces created by a cut that no input face covers.
    pub default_material: String,
    pub format: MapFormat,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            world_bounds: BoundingBox::cube(DEFAULT_WORLD_HALF_SIZE),
            tolerance: Tolerance::default(),
            default_material: NO_MATERIAL.to_string(),
            format: MapFormat::Standard,
        }
    }
}

impl BrushConfig {
    pub fn with_world_bounds(mut self, world_bounds: BoundingBox) -> Self {
        self.world_bounds = world_bounds;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_default_material(mut self, material: impl Into<String>) -> Self {
        self.default_material = material.into();
        self
    }

    pub fn with_format(mut self, format: MapFormat) -> Self {
        self.format = format;
        self
    }

    pub fn csg_engine(&self) -> ClipCsg {
        ClipCsg::new(self.world_bounds).with_tolerance(self.tolerance)
    }
}
