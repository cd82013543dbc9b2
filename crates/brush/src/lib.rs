pub mod attributes;
pub mod brush;
pub mod config;
pub mod csg;
pub mod error;
pub mod face;
pub mod loader;

// Re-export the types most callers need at crate root.
pub use attributes::{BrushFaceAttributes, Color, MapFormat, UvCoordSystem, NO_MATERIAL};
pub use brush::Brush;
pub use config::BrushConfig;
pub use csg::{subtract_batch, PairFailure, SubtractBatch};
pub use error::{BrushError, BrushResult};
pub use face::{BrushFace, FilePosition};
pub use loader::{load_brushes, BrushDiagnostic, BrushSpec, FaceSpec};
