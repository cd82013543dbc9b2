use brush_kernel::{KernelError, Plane, Point3d, Tolerance, Vec3};
use nalgebra::{Matrix4, Vector2};
use serde::{Deserialize, Serialize};

use crate::attributes::{BrushFaceAttributes, UvCoordSystem};
use crate::config::BrushConfig;
use crate::error::{BrushError, BrushResult};

fn plane_through(p1: &Point3d, p2: &Point3d, p3: &Point3d, tolerance: &Tolerance) -> BrushResult<Plane> {
    Ok(Plane::from_points(p1, p2, p3, tolerance.colinear).ok_or(KernelError::CollinearPoints)?)
}

/// Where a face was read from, kept so editors can map faces back to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePosition {
    pub line: usize,
    pub line_count: usize,
}

/// One bounding plane of a brush together with its surface attributes.
///
/// The plane is defined by three points in map order; its normal is
/// `(p3 - p1) × (p2 - p1)`. Faces are immutable; edits produce new faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushFace {
    points: [Point3d; 3],
    plane: Plane,
    attributes: BrushFaceAttributes,
    uv: UvCoordSystem,
    file_position: Option<FilePosition>,
}

impl BrushFace {
    /// Face through three points with axes derived the way the configured
    /// format stores them.
    pub fn create(
        p1: Point3d,
        p2: Point3d,
        p3: Point3d,
        attributes: BrushFaceAttributes,
        config: &BrushConfig,
    ) -> BrushResult<Self> {
        let plane = plane_through(&p1, &p2, &p3, &config.tolerance)?;
        let uv = if config.format.is_parallel() {
            UvCoordSystem::parallel(&plane.normal)
        } else {
            UvCoordSystem::paraxial(&plane.normal)
        };
        Ok(Self {
            points: [p1, p2, p3],
            plane,
            attributes: attributes.restricted_to(config.format),
            uv,
            file_position: None,
        })
    }

    /// Valve 220 face with explicit texture axes.
    pub fn create_parallel(
        p1: Point3d,
        p2: Point3d,
        p3: Point3d,
        attributes: BrushFaceAttributes,
        (u_axis, v_axis): (Vec3, Vec3),
        config: &BrushConfig,
    ) -> BrushResult<Self> {
        let plane = plane_through(&p1, &p2, &p3, &config.tolerance)?;
        Ok(Self {
            points: [p1, p2, p3],
            plane,
            attributes: attributes.restricted_to(config.format),
            uv: UvCoordSystem::Parallel { u_axis, v_axis },
            file_position: None,
        })
    }

    /// Face on `plane`, with three points picked on it.
    pub fn from_plane(plane: &Plane, attributes: BrushFaceAttributes, config: &BrushConfig) -> BrushResult<Self> {
        let (origin, u, v) = plane.frame();
        let size = 64.0;
        Self::create(origin, origin + v * size, origin + u * size, attributes, config)
    }

    pub fn points(&self) -> &[Point3d; 3] {
        &self.points
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn normal(&self) -> &Vec3 {
        &self.plane.normal
    }

    pub fn attributes(&self) -> &BrushFaceAttributes {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: BrushFaceAttributes) {
        self.attributes = attributes;
    }

    pub fn uv_coord_system(&self) -> &UvCoordSystem {
        &self.uv
    }

    pub fn file_position(&self) -> Option<FilePosition> {
        self.file_position
    }

    pub fn set_file_position(&mut self, line: usize, line_count: usize) {
        self.file_position = Some(FilePosition { line, line_count });
    }

    /// Effective texture axes.
    pub fn uv_axes(&self) -> (Vec3, Vec3) {
        self.uv.axes(self.attributes.rotation)
    }

    pub fn uv_coords(&self, point: &Point3d) -> Vector2<f64> {
        self.uv.uv_coords(point, &self.attributes)
    }

    /// Take attributes and texture axes from `source`, keeping this face's plane.
    pub fn copy_attributes_from(&mut self, source: &BrushFace) {
        self.attributes = source.attributes.clone();
        self.uv = source.uv.reoriented(&self.plane.normal, |a| *a);
    }

    /// The same face with Valve 220 axes, equal to the current effective axes.
    /// The rotation is folded into the axes and reset.
    pub fn converted_to_parallel(&self) -> Self {
        if self.uv.is_parallel() {
            return self.clone();
        }
        let mut attributes = self.attributes.clone();
        attributes.rotation = 0.0;
        Self {
            uv: self.uv.to_parallel(&self.plane.normal, self.attributes.rotation),
            attributes,
            ..self.clone()
        }
    }

    /// The same face with axes locked to the nearest world axis.
    pub fn converted_to_paraxial(&self) -> Self {
        Self {
            uv: self.uv.to_paraxial(&self.plane.normal),
            ..self.clone()
        }
    }

    /// The same face through three new points.
    pub fn with_points(&self, p1: Point3d, p2: Point3d, p3: Point3d, tolerance: &Tolerance) -> BrushResult<Self> {
        let plane = plane_through(&p1, &p2, &p3, tolerance)?;
        Ok(Self {
            points: [p1, p2, p3],
            plane,
            attributes: self.attributes.clone(),
            uv: self.uv.reoriented(&plane.normal, |a| *a),
            file_position: self.file_position,
        })
    }

    /// Apply an affine transformation to the face points.
    ///
    /// Mirroring transformations swap two points so the face keeps facing out.
    pub fn transformed(&self, matrix: &Matrix4<f64>, tolerance: &Tolerance) -> BrushResult<Self> {
        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let determinant = linear.determinant();
        if determinant.abs() < 1e-12 {
            return Err(BrushError::SingularTransform);
        }
        let [mut p1, mut p2, p3] = self.points.map(|p| matrix.transform_point(&p));
        if determinant < 0.0 {
            std::mem::swap(&mut p1, &mut p2);
        }
        let plane = plane_through(&p1, &p2, &p3, tolerance)?;
        Ok(Self {
            points: [p1, p2, p3],
            plane,
            attributes: self.attributes.clone(),
            uv: self.uv.reoriented(&plane.normal, |a| linear * a),
            file_position: self.file_position,
        })
    }

    pub fn translated(&self, delta: &Vec3, tolerance: &Tolerance) -> BrushResult<Self> {
        self.transformed(&Matrix4::new_translation(delta), tolerance)
    }
}

/// Sort faces into canonical plane order.
pub fn sort_faces(faces: &mut [BrushFace]) {
    faces.sort_by(|a, b| a.plane.canonical_cmp(&b.plane));
}
