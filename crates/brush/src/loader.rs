//! Bulk brush construction from parsed map data.
//!
//! A map parser produces one [`BrushSpec`] per brush. Brushes are built in
//! parallel; a brush that cannot be built is reported and skipped so the rest
//! of the map still loads.

use std::fmt;

use brush_kernel::{Point3d, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::attributes::BrushFaceAttributes;
use crate::brush::Brush;
use crate::config::BrushConfig;
use crate::error::{BrushError, BrushResult};
use crate::face::{BrushFace, FilePosition};

/// A face as read from a map file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSpec {
    pub points: [Point3d; 3],
    pub attributes: BrushFaceAttributes,
    /// Explicit texture axes, present in Valve 220 style formats.
    #[serde(default)]
    pub uv_axes: Option<(Vec3, Vec3)>,
    #[serde(default)]
    pub file_position: Option<FilePosition>,
}

impl FaceSpec {
    pub fn new(points: [Point3d; 3], attributes: BrushFaceAttributes) -> Self {
        Self {
            points,
            attributes,
            uv_axes: None,
            file_position: None,
        }
    }

    fn build(&self, config: &BrushConfig) -> BrushResult<BrushFace> {
        let [p1, p2, p3] = self.points;
        let mut face = match self.uv_axes {
            Some(axes) if config.format.is_parallel() => {
                BrushFace::create_parallel(p1, p2, p3, self.attributes.clone(), axes, config)?
            }
            _ => BrushFace::create(p1, p2, p3, self.attributes.clone(), config)?,
        };
        if let Some(pos) = self.file_position {
            face.set_file_position(pos.line, pos.line_count);
        }
        Ok(face)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrushSpec {
    pub faces: Vec<FaceSpec>,
    #[serde(default)]
    pub location: Option<FilePosition>,
}

impl BrushSpec {
    pub fn new(faces: Vec<FaceSpec>) -> Self {
        Self { faces, location: None }
    }

    pub fn build(&self, config: &BrushConfig) -> BrushResult<Brush> {
        let faces = self
            .faces
            .iter()
            .map(|f| f.build(config))
            .collect::<BrushResult<Vec<_>>>()?;
        Brush::create(config, faces)
    }
}

/// A brush that failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushDiagnostic {
    /// Position of the brush in the input.
    pub index: usize,
    pub location: Option<FilePosition>,
    pub error: BrushError,
}

impl fmt::Display for BrushDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(pos) => write!(f, "brush {} (line {}): {}", self.index, pos.line, self.error),
            None => write!(f, "brush {}: {}", self.index, self.error),
        }
    }
}

/// Build every brush in `specs`.
///
/// Loaded brushes keep input order. Every failure yields a diagnostic.
#[instrument(skip_all, fields(brushes = specs.len()))]
pub fn load_brushes(config: &BrushConfig, specs: &[BrushSpec]) -> (Vec<Brush>, Vec<BrushDiagnostic>) {
    let results: Vec<BrushResult<Brush>> = specs.par_iter().map(|spec| spec.build(config)).collect();

    let mut brushes = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(brush) => brushes.push(brush),
            Err(error) => {
                let diagnostic = BrushDiagnostic {
                    index,
                    location: specs[index].location,
                    error,
                };
                warn!(%diagnostic, "skipping brush");
                diagnostics.push(diagnostic);
            }
        }
    }
    info!(loaded = brushes.len(), failed = diagnostics.len(), "brushes loaded");
    (brushes, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::MapFormat;
    use brush_kernel::KernelError;

    fn cube_spec(min: f64, max: f64) -> BrushSpec {
        let attrs = BrushFaceAttributes::new("stone");
        let face = |p: [[f64; 3]; 3]| FaceSpec::new(p.map(Point3d::from), attrs.clone());
        BrushSpec::new(vec![
            face([[min, min, min], [min, max, min], [min, min, max]]),
            face([[max, min, min], [max, min, max], [max, max, min]]),
            face([[min, min, min], [min, min, max], [max, min, min]]),
            face([[min, max, min], [max, max, min], [min, max, max]]),
            face([[min, min, min], [max, min, min], [min, max, min]]),
            face([[min, min, max], [min, max, max], [max, min, max]]),
        ])
    }

    #[test]
    fn test_cube_spec_faces_point_outward() {
        let brush = cube_spec(0.0, 16.0).build(&BrushConfig::default()).unwrap();
        assert_eq!(brush.face_count(), 6);
        assert_eq!(brush.bounds().min, Point3d::origin());
        assert_eq!(brush.bounds().max, Point3d::new(16.0, 16.0, 16.0));
    }

    #[test]
    fn test_load_keeps_order_and_reports_failures() {
        let mut broken = cube_spec(0.0, 16.0);
        broken.faces[2].points = [Point3d::origin(), Point3d::new(1.0, 0.0, 0.0), Point3d::new(2.0, 0.0, 0.0)];
        broken.location = Some(FilePosition { line: 12, line_count: 8 });

        let specs = vec![cube_spec(0.0, 16.0), broken, cube_spec(32.0, 64.0)];
        let (brushes, diagnostics) = load_brushes(&BrushConfig::default(), &specs);

        assert_eq!(brushes.len(), 2);
        assert_eq!(brushes[1].bounds().min, Point3d::new(32.0, 32.0, 32.0));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].index, 1);
        assert_eq!(diagnostics[0].error, BrushError::Kernel(KernelError::CollinearPoints));
        assert_eq!(
            diagnostics[0].to_string(),
            format!("brush 1 (line 12): {}", BrushError::Kernel(KernelError::CollinearPoints))
        );
    }

    #[test]
    fn test_explicit_axes_used_for_parallel_formats() {
        let config = BrushConfig::default().with_format(MapFormat::Valve);
        let mut spec = cube_spec(0.0, 16.0);
        let axes = (Vec3::y(), -Vec3::z());
        spec.faces[0].uv_axes = Some(axes);
        spec.faces[0].file_position = Some(FilePosition { line: 3, line_count: 1 });
        let brush = spec.build(&config).unwrap();
        let index = brush.find_face_by_normal(&-Vec3::x()).unwrap();
        assert_eq!(brush.faces()[index].uv_axes(), axes);
        assert_eq!(brush.faces()[index].file_position(), Some(FilePosition { line: 3, line_count: 1 }));
    }

    #[test]
    fn test_spec_deserializes_without_optional_fields() {
        let json = r#"{"faces": [{"points": [[0,0,0],[0,0,1],[0,1,0]], "attributes": {
            "material": "m", "offset": [0,0], "scale": [1,1], "rotation": 0,
            "surface_contents": null, "surface_flags": null, "surface_value": null, "color": null}}]}"#;
        let spec: BrushSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.faces.len(), 1);
        assert_eq!(spec.faces[0].uv_axes, None);
        assert_eq!(spec.location, None);
    }
}
