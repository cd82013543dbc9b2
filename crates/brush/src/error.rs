use brush_kernel::{CsgFailure, ErrorKind, KernelError};

/// Errors from brush construction and editing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrushError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("CSG failed: {0}")]
    CsgFailed(#[from] CsgFailure),

    #[error("edit would remove face {index}")]
    FaceRemoved { index: usize },

    #[error("face index {index} out of range (brush has {count} faces)")]
    NoSuchFace { index: usize, count: usize },

    #[error("unknown map format: {name}")]
    UnknownFormat { name: String },

    #[error("transformation is singular")]
    SingularTransform,

    #[error("point {x} {y} {z} would not become a vertex")]
    VertexNotAdded { x: f64, y: f64, z: f64 },

    #[error("a moved {element} did not survive the edit")]
    ElementLost { element: &'static str },
}

impl BrushError {
    /// The kernel error class behind this failure, if it came from the kernel.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Kernel(e) => Some(e.kind()),
            Self::CsgFailed(f) => Some(f.kernel_error().kind()),
            _ => None,
        }
    }
}

pub type BrushResult<T> = Result<T, BrushError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_kernel_error() {
        let e: BrushError = KernelError::CollinearPoints.into();
        assert_eq!(e.kind(), Some(ErrorKind::DegenerateInput));
        let e: BrushError = CsgFailure::MergeFailed(KernelError::NonConvex).into();
        assert_eq!(e.kind(), Some(ErrorKind::InvariantViolation));
        assert_eq!(BrushError::FaceRemoved { index: 2 }.kind(), None);
    }

    #[test]
    fn test_display() {
        let e = BrushError::NoSuchFace { index: 9, count: 6 };
        assert_eq!(e.to_string(), "face index 9 out of range (brush has 6 faces)");
    }
}
