//! Configuration for polyhedron validation.

use super::types::ValidationLevel;
use crate::Tolerance;

/// Which checks run and with which thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ValidationConfig {
    /// The highest level to run.
    pub level: ValidationLevel,
    pub tolerance: Tolerance,
    /// Report collinear consecutive face vertices as warnings.
    pub warn_collinear: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            level: ValidationLevel::Full,
            tolerance: Tolerance::default(),
            warn_collinear: true,
        }
    }
}

impl ValidationConfig {
    /// Topology-only validation (fastest).
    pub fn topology() -> Self {
        Self {
            level: ValidationLevel::Topology,
            warn_collinear: false,
            ..Self::default()
        }
    }

    /// Topology + geometric consistency.
    pub fn geometry() -> Self {
        Self {
            level: ValidationLevel::Geometry,
            ..Self::default()
        }
    }

    /// Every check.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}
