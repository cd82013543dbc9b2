//! Error taxonomy for the kernel.

use thiserror::Error;

/// Broad classification of a kernel failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input itself is unusable (collinear points, too few planes, empty solid).
    DegenerateInput,
    /// A topological construction step failed (no consistent seam, broken pairing).
    Topological,
    /// A finished solid would break a geometric invariant (convexity, planarity).
    InvariantViolation,
}

/// Failure of a kernel construction, clip or edit.
///
/// None of these leave a polyhedron half-mutated: the operation that
/// returns one has not touched its receiver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("plane points are collinear")]
    CollinearPoints,

    #[error("at least 4 planes are required, got {count}")]
    TooFewPlanes { count: usize },

    #[error("at least 4 distinct points are required, got {count}")]
    TooFewPoints { count: usize },

    #[error("half-space intersection is empty")]
    Empty,

    #[error("solid is not bounded by its planes")]
    Unbounded,

    #[error("degenerate solid: {reason}")]
    Degenerate { reason: String },

    #[error("no consistent seam: {reason}")]
    NoSeam { reason: String },

    #[error("non-manifold topology: {reason}")]
    NonManifold { reason: String },

    #[error("solid is not convex")]
    NonConvex,

    #[error("face is not planar")]
    NonPlanarFace,

    #[error("vertex does not belong to this solid")]
    UnknownVertex,

    #[error("vertex would leave the world bounds")]
    OutsideWorldBounds,
}

impl KernelError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate { reason: reason.into() }
    }

    pub fn no_seam(reason: impl Into<String>) -> Self {
        Self::NoSeam { reason: reason.into() }
    }

    pub fn non_manifold(reason: impl Into<String>) -> Self {
        Self::NonManifold { reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CollinearPoints
            | Self::TooFewPlanes { .. }
            | Self::TooFewPoints { .. }
            | Self::Empty
            | Self::Unbounded
            | Self::Degenerate { .. }
            | Self::UnknownVertex
            | Self::OutsideWorldBounds => ErrorKind::DegenerateInput,
            Self::NoSeam { .. } | Self::NonManifold { .. } => ErrorKind::Topological,
            Self::NonConvex | Self::NonPlanarFace => ErrorKind::InvariantViolation,
        }
    }
}

pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(KernelError::CollinearPoints.kind(), ErrorKind::DegenerateInput);
        assert_eq!(KernelError::TooFewPlanes { count: 3 }.kind(), ErrorKind::DegenerateInput);
        assert_eq!(KernelError::no_seam("open loop").kind(), ErrorKind::Topological);
        assert_eq!(KernelError::NonConvex.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_error_display() {
        let err = KernelError::TooFewPlanes { count: 2 };
        assert_eq!(err.to_string(), "at least 4 planes are required, got 2");
        let err = KernelError::degenerate("zero volume");
        assert_eq!(err.to_string(), "degenerate solid: zero volume");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KernelError>();
    }
}
