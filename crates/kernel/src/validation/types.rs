//! Shared types for polyhedron validation.
//!
//! Defines validation levels, error codes, entity references, findings and
//! the `ValidationReport`.

use std::fmt;

use crate::error::KernelError;
use crate::topology::polyhedron::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// Which checks to run. Each level includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationLevel {
    /// Euler characteristic, twin pairing, loop closure, vertex fans.
    Topology,
    /// Planarity, face orientation, convexity.
    Geometry,
    /// Short edges, coincident vertices, vanishing volume.
    Full,
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The solid is invalid.
    Error,
    /// Worth reporting, does not invalidate the solid.
    Warning,
}

/// A reference to the element a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    Vertex(VertexId),
    HalfEdge(HalfEdgeId),
    Edge(EdgeId),
    Face(FaceId),
    Solid,
}

/// Enumeration of all validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // --- Topology ---
    /// V - E + F != 2.
    EulerPoincareViolation,
    /// Half-edge twin pointer does not point back to this half-edge.
    HalfEdgeTwinMismatch,
    /// A twin does not start where its partner ends.
    InconsistentEdgeOrientation,
    /// Following `next` from a face's boundary does not return to it.
    WireNotClosed,
    /// A face loop has fewer than three half-edges.
    TooFewFaceVertices,
    /// A reference points to a non-existent element.
    DanglingReference,
    /// A vertex joins faces that do not form a single fan.
    NonManifoldVertex,

    // --- Geometry ---
    /// A face vertex lies off the face plane.
    NonPlanarFace,
    /// The boundary winding disagrees with the face plane normal.
    FaceNormalMismatch,
    /// A vertex lies in front of some face plane.
    NonConvexVertex,
    /// A face boundary turns the wrong way at a vertex.
    NonConvexFace,
    /// Three consecutive boundary vertices are collinear.
    CollinearFaceVertices,

    // --- Degeneracy ---
    /// Edge shorter than the minimum edge length.
    ZeroLengthEdge,
    /// Two vertices closer than the minimum edge length.
    DuplicateVertex,
    /// Enclosed volume below the minimum.
    ZeroVolume,
}

impl ErrorCode {
    /// The validation level whose checks report this code.
    pub fn level(self) -> ValidationLevel {
        use ErrorCode::*;
        match self {
            EulerPoincareViolation
            | HalfEdgeTwinMismatch
            | InconsistentEdgeOrientation
            | WireNotClosed
            | TooFewFaceVertices
            | DanglingReference
            | NonManifoldVertex => ValidationLevel::Topology,
            NonPlanarFace | FaceNormalMismatch | NonConvexVertex | NonConvexFace | CollinearFaceVertices => {
                ValidationLevel::Geometry
            }
            ZeroLengthEdge | DuplicateVertex | ZeroVolume => ValidationLevel::Full,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single validation finding (error or warning).
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Which element the finding is about.
    pub entity: EntityId,
    pub code: ErrorCode,
    pub message: String,
    pub severity: Severity,
    /// Measured value, e.g. the distance of a vertex from its face plane.
    pub numeric_value: Option<f64>,
    /// The threshold that was exceeded.
    pub tolerance: Option<f64>,
}

impl ValidationError {
    pub fn error(entity: EntityId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            entity,
            code,
            message: message.into(),
            severity: Severity::Error,
            numeric_value: None,
            tolerance: None,
        }
    }

    pub fn warning(entity: EntityId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(entity, code, message)
        }
    }

    pub fn measured(mut self, value: f64, tolerance: f64) -> Self {
        self.numeric_value = Some(value);
        self.tolerance = Some(tolerance);
        self
    }

    /// The kernel error a failed commit reports for this finding.
    pub fn to_kernel_error(&self) -> KernelError {
        use ErrorCode::*;
        match self.code {
            NonPlanarFace => KernelError::NonPlanarFace,
            FaceNormalMismatch | NonConvexVertex | NonConvexFace => KernelError::NonConvex,
            ZeroLengthEdge | DuplicateVertex | ZeroVolume | CollinearFaceVertices => {
                KernelError::degenerate(self.message.clone())
            }
            EulerPoincareViolation
            | HalfEdgeTwinMismatch
            | InconsistentEdgeOrientation
            | WireNotClosed
            | TooFewFaceVertices
            | DanglingReference
            | NonManifoldVertex => KernelError::non_manifold(self.message.clone()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "[{}] {:?}: {} (code: {})", sev, self.entity, self.message, self.code)?;
        if let Some(val) = self.numeric_value {
            write!(f, " value={val:.2e}")?;
        }
        if let Some(tol) = self.tolerance {
            write!(f, " tol={tol:.2e}")?;
        }
        Ok(())
    }
}

/// Counts of elements in the validated solid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub vertices: usize,
    pub edges: usize,
    pub half_edges: usize,
    pub faces: usize,
}

/// The report produced by `PolyhedronValidator`.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the solid passed all checks at the requested level.
    pub valid: bool,
    /// The highest level that was actually run.
    pub level_completed: ValidationLevel,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
    pub counts: EntityCounts,
}

impl ValidationReport {
    /// Filter errors by a specific error code.
    pub fn errors_of(&self, code: ErrorCode) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.code == code).collect()
    }

    /// Errors reported by the checks of `level`.
    pub fn errors_at(&self, level: ValidationLevel) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.code.level() == level).collect()
    }

    /// Check that no errors of a specific code exist.
    pub fn no_errors_of(&self, code: ErrorCode) -> bool {
        !self.errors.iter().any(|e| e.code == code)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// `Ok` if valid, otherwise the kernel error for the first finding.
    pub fn into_result(self) -> Result<(), KernelError> {
        match self.errors.first() {
            None => Ok(()),
            Some(first) => Err(first.to_kernel_error()),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ValidationReport: valid={}, level={:?}, errors={}, warnings={}",
            self.valid,
            self.level_completed,
            self.errors.len(),
            self.warnings.len()
        )?;
        for e in &self.errors {
            writeln!(f, "  {e}")?;
        }
        for w in &self.warnings {
            writeln!(f, "  {w}")?;
        }
        Ok(())
    }
}
