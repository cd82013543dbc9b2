pub mod audit;
pub mod config;
pub mod types;

pub use config::*;
pub use types::*;

use tracing::{debug, instrument};

use crate::error::KernelResult;
use crate::topology::polyhedron::Polyhedron;
use crate::Tolerance;

/// Hierarchical validation of a polyhedron.
///
/// - **Topology**: Euler formula, twin pairing, loop closure, vertex fans.
/// - **Geometry**: planarity, face orientation, convexity.
/// - **Full**: short edges, coincident vertices, vanishing volume.
///
/// Geometry checks are skipped when the topology is broken, since they
/// walk the very loops that failed.
pub struct PolyhedronValidator {
    config: ValidationConfig,
}

impl PolyhedronValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all)]
    pub fn validate(&self, poly: &Polyhedron) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let counts = EntityCounts {
            vertices: poly.vertex_count(),
            edges: poly.edge_count(),
            half_edges: poly.half_edge_count(),
            faces: poly.face_count(),
        };

        audit::check_topology(poly, &mut errors);
        let mut level_completed = ValidationLevel::Topology;

        if errors.is_empty() && self.config.level >= ValidationLevel::Geometry {
            audit::check_geometry(poly, &self.config, &mut errors, &mut warnings);
            level_completed = ValidationLevel::Geometry;
        }

        if errors.is_empty() && self.config.level >= ValidationLevel::Full {
            audit::check_degeneracy(poly, &self.config, &mut errors);
            level_completed = ValidationLevel::Full;
        }

        let valid = errors.is_empty();
        debug_assert!(errors.iter().all(|e| e.code.level() <= level_completed));
        debug!(
            valid,
            level = ?level_completed,
            error_count = errors.len(),
            warning_count = warnings.len(),
            "validation complete"
        );

        ValidationReport {
            valid,
            level_completed,
            errors,
            warnings,
            counts,
        }
    }
}

impl Polyhedron {
    /// Run every check and report the first failure as a kernel error.
    pub fn verify(&self, tolerance: &Tolerance) -> KernelResult<()> {
        PolyhedronValidator::new(ValidationConfig::full().with_tolerance(*tolerance))
            .validate(self)
            .into_result()
    }
}
