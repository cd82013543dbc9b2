use thiserror::Error;
use tracing::{debug, instrument};

use crate::construction::clip::ClipOutcome;
use crate::error::KernelError;
use crate::geometry::{BoundingBox, Point3d};
use crate::topology::polyhedron::Polyhedron;
use crate::Tolerance;

/// Structured failure information for CSG operations.
///
/// A failure aborts the whole operation; no partial result is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsgFailure {
    #[error("clipping by subtrahend face {face} failed: {source}")]
    SubtractFailed {
        face: usize,
        #[source]
        source: KernelError,
    },

    #[error("clipping by face {face} failed: {source}")]
    IntersectFailed {
        face: usize,
        #[source]
        source: KernelError,
    },

    #[error("convex merge failed: {0}")]
    MergeFailed(#[source] KernelError),
}

impl CsgFailure {
    pub fn kernel_error(&self) -> &KernelError {
        match self {
            Self::SubtractFailed { source, .. } | Self::IntersectFailed { source, .. } => source,
            Self::MergeFailed(source) => source,
        }
    }
}

/// Decompose `minuend \ subtrahend` into disjoint convex fragments.
///
/// Strategy:
/// 1. If the solids do not overlap, return a copy of the minuend
/// 2. For each subtrahend face, the part of the remaining minuend in front of
///    the face becomes a fragment and the part behind it is carried on
/// 3. What is left after the last face lies inside the subtrahend and is dropped
/// 4. Fragments below the minimum volume, or thinner than the minimum edge
///    length, are dropped
///
/// The result has at most one fragment per subtrahend face. Faces created
/// by a cut carry no payload.
#[instrument(skip_all, fields(minuend_faces = minuend.face_count(), subtrahend_faces = subtrahend.face_count()))]
pub fn subtract(
    minuend: &Polyhedron,
    subtrahend: &Polyhedron,
    tolerance: &Tolerance,
) -> Result<Vec<Polyhedron>, CsgFailure> {
    if !minuend.intersects(subtrahend, tolerance) {
        debug!("solids do not overlap");
        return Ok(vec![minuend.clone()]);
    }

    let mut fragments = Vec::new();
    let mut remaining = minuend.clone();
    for (index, (_, face)) in subtrahend.faces().enumerate() {
        let failed = |source| CsgFailure::SubtractFailed { face: index, source };

        let mut outside = remaining.clone();
        match outside.clip(&face.plane.flipped(), None, tolerance).map_err(failed)? {
            ClipOutcome::Unchanged => {
                // Entirely in front of this face, so nothing of it is inside the subtrahend.
                fragments.push(remaining);
                return Ok(keep_solid(fragments, tolerance));
            }
            ClipOutcome::Empty => continue,
            ClipOutcome::Clipped { .. } => fragments.push(outside),
        }

        if remaining.clip(&face.plane, None, tolerance).map_err(failed)? == ClipOutcome::Empty {
            break;
        }
    }

    Ok(keep_solid(fragments, tolerance))
}

/// Whether a CSG result is substantial enough to survive healing.
fn is_solid(solid: &Polyhedron, tolerance: &Tolerance) -> bool {
    solid.volume() > tolerance.min_volume && solid.thickness() >= tolerance.min_edge_length
}

fn keep_solid(fragments: Vec<Polyhedron>, tolerance: &Tolerance) -> Vec<Polyhedron> {
    let before = fragments.len();
    let kept: Vec<Polyhedron> = fragments
        .into_iter()
        .filter(|f| is_solid(f, tolerance))
        .collect();
    debug!(fragments = kept.len(), dropped = before - kept.len(), "subtraction complete");
    kept
}

/// Clip a copy of `a` by every face of `b`.
///
/// Returns `None` if the solids share no volume, or only a sliver thinner
/// than the minimum edge length.
#[instrument(skip_all)]
pub fn intersect(
    a: &Polyhedron,
    b: &Polyhedron,
    tolerance: &Tolerance,
) -> Result<Option<Polyhedron>, CsgFailure> {
    if !a.intersects(b, tolerance) {
        debug!("solids do not overlap");
        return Ok(None);
    }

    let mut result = a.clone();
    for (index, (_, face)) in b.faces().enumerate() {
        let outcome = result
            .clip(&face.plane, None, tolerance)
            .map_err(|source| CsgFailure::IntersectFailed { face: index, source })?;
        if outcome == ClipOutcome::Empty {
            return Ok(None);
        }
    }

    if !is_solid(&result, tolerance) {
        debug!(volume = result.volume(), "intersection is a sliver");
        return Ok(None);
    }
    Ok(Some(result))
}

/// Smallest convex solid containing all vertices of `solids`.
#[instrument(skip_all, fields(solids = solids.len()))]
pub fn convex_merge(
    solids: &[&Polyhedron],
    world_bounds: &BoundingBox,
    tolerance: &Tolerance,
) -> Result<Polyhedron, CsgFailure> {
    let points: Vec<Point3d> = solids.iter().flat_map(|s| s.vertex_positions()).collect();
    Polyhedron::from_points(world_bounds, &points, tolerance).map_err(CsgFailure::MergeFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuboid(min: [f64; 3], max: [f64; 3]) -> Polyhedron {
        Polyhedron::cuboid(&BoundingBox::new(
            Point3d::new(min[0], min[1], min[2]),
            Point3d::new(max[0], max[1], max[2]),
        ))
        .unwrap()
    }

    fn total_volume(parts: &[Polyhedron]) -> f64 {
        parts.iter().map(|p| p.volume()).sum()
    }

    #[test]
    fn test_subtract_inner_cuboid() {
        let tol = Tolerance::default();
        let a = cuboid([-32.0; 3], [32.0; 3]);
        let b = cuboid([-16.0; 3], [16.0; 3]);
        let parts = subtract(&a, &b, &tol).unwrap();
        assert_eq!(parts.len(), 6);
        assert!((total_volume(&parts) - (64f64.powi(3) - 32f64.powi(3))).abs() < 1e-6);
        for p in &parts {
            assert!(p.verify(&tol).is_ok());
        }
    }

    #[test]
    fn test_subtract_disjoint_returns_minuend() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([32.0; 3], [48.0; 3]);
        let parts = subtract(&a, &b, &Tolerance::default()).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].vertex_positions(), a.vertex_positions());
    }

    #[test]
    fn test_subtract_enclosing_is_empty() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([-8.0; 3], [24.0; 3]);
        assert!(subtract(&a, &b, &Tolerance::default()).unwrap().is_empty());
        assert!(subtract(&a, &a, &Tolerance::default()).unwrap().is_empty());
    }

    #[test]
    fn test_subtract_protruding_through() {
        // b pierces a completely along z
        let a = cuboid([-32.0; 3], [32.0; 3]);
        let b = cuboid([-16.0, -16.0, -64.0], [16.0, 16.0, 64.0]);
        let parts = subtract(&a, &b, &Tolerance::default()).unwrap();
        assert_eq!(parts.len(), 4);
        let expected = 64f64.powi(3) - 32.0 * 32.0 * 64.0;
        assert!((total_volume(&parts) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_subtract_protruding_from_side() {
        let a = cuboid([-32.0; 3], [32.0; 3]);
        let b = cuboid([-16.0, -16.0, 0.0], [16.0, 16.0, 64.0]);
        let parts = subtract(&a, &b, &Tolerance::default()).unwrap();
        assert_eq!(parts.len(), 5);
        let expected = 64f64.powi(3) - 32.0 * 32.0 * 32.0;
        assert!((total_volume(&parts) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_subtract_leaves_inputs_untouched() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([8.0; 3], [24.0; 3]);
        let before = (a.vertex_positions(), b.vertex_positions());
        let parts = subtract(&a, &b, &Tolerance::default()).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!((a.vertex_positions(), b.vertex_positions()), before);
    }

    #[test]
    fn test_subtract_drops_thin_sliver() {
        // leaves a slab 0.005 thick, half the minimum edge length
        let tol = Tolerance::default();
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([0.005, -8.0, -8.0], [32.0, 32.0, 32.0]);
        assert!(subtract(&a, &b, &tol).unwrap().is_empty());

        let c = cuboid([0.5, -8.0, -8.0], [32.0, 32.0, 32.0]);
        let parts = subtract(&a, &c, &tol).unwrap();
        assert_eq!(parts.len(), 1);
        assert!((parts[0].thickness() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_intersect_thin_overlap_is_none() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([15.995, 0.0, 0.0], [32.0, 16.0, 16.0]);
        assert!(intersect(&a, &b, &Tolerance::default()).unwrap().is_none());
    }

    #[test]
    fn test_intersect_offset_cubes() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([8.0; 3], [24.0; 3]);
        let result = intersect(&a, &b, &Tolerance::default()).unwrap().unwrap();
        assert_eq!(result.bounds().min, Point3d::new(8.0, 8.0, 8.0));
        assert_eq!(result.bounds().max, Point3d::new(16.0, 16.0, 16.0));
        assert_eq!(result.face_count(), 6);
    }

    #[test]
    fn test_intersect_disjoint_is_none() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([16.0, 0.0, 0.0], [32.0, 16.0, 16.0]);
        assert!(intersect(&a, &b, &Tolerance::default()).unwrap().is_none());
    }

    #[test]
    fn test_convex_merge() {
        let a = cuboid([0.0; 3], [16.0; 3]);
        let b = cuboid([32.0, 0.0, 0.0], [48.0, 16.0, 16.0]);
        let merged = convex_merge(&[&a, &b], &BoundingBox::cube(8192.0), &Tolerance::default()).unwrap();
        assert_eq!(merged.vertex_count(), 8);
        assert_eq!(merged.bounds().max, Point3d::new(48.0, 16.0, 16.0));
        assert!(merged.contains(&a, 1e-4) && merged.contains(&b, 1e-4));
    }

    #[test]
    fn test_failure_exposes_kernel_error() {
        let failure = CsgFailure::MergeFailed(KernelError::TooFewPoints { count: 2 });
        assert_eq!(failure.kernel_error(), &KernelError::TooFewPoints { count: 2 });
        assert!(failure.to_string().starts_with("convex merge failed"));
    }
}
