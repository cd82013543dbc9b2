use brush_kernel::geometry::vector::average;
use brush_kernel::{CsgEngine, ErrorKind, KernelError, Plane, Point3d, Polyhedron};
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::attributes::BrushFaceAttributes;
use crate::brush::{representative_points, Brush};
use crate::config::BrushConfig;
use crate::error::{BrushError, BrushResult};
use crate::face::BrushFace;

impl Brush {
    /// `self \ subtrahend` as disjoint convex brushes.
    ///
    /// Fragment faces lying on a face of `self` keep its attributes, faces on
    /// a cut surface take them from the subtrahend face that made the cut,
    /// and anything else gets the default material.
    ///
    /// A fragment face that lies on a face of `self` and a face of
    /// `subtrahend` at once takes the attributes of `self`.
    ///
    /// Fragments too thin or small to form a valid brush are dropped.
    #[instrument(skip_all, fields(faces = self.face_count(), subtrahend_faces = subtrahend.face_count()))]
    pub fn subtract(&self, config: &BrushConfig, subtrahend: &Brush) -> BrushResult<Vec<Brush>> {
        let fragments = config.csg_engine().subtract(self.geometry(), subtrahend.geometry())?;
        let mut brushes = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            if let Some(brush) = unless_degenerate(rebuild(config, fragment, self, &[subtrahend]))? {
                brushes.push(brush);
            }
        }
        Ok(brushes)
    }

    /// The volume shared with `other`, or `None` if there is none.
    #[instrument(skip_all)]
    pub fn intersect(&self, config: &BrushConfig, other: &Brush) -> BrushResult<Option<Brush>> {
        match config.csg_engine().intersect(self.geometry(), other.geometry())? {
            Some(common) => unless_degenerate(rebuild(config, &common, self, &[other])),
            None => Ok(None),
        }
    }

    /// Smallest convex brush containing all of `brushes`.
    ///
    /// Each face takes its attributes from the largest coplanar input face,
    /// or failing that from the input face whose center lies closest to it.
    #[instrument(skip_all, fields(brushes = brushes.len()))]
    pub fn convex_merge(config: &BrushConfig, brushes: &[&Brush]) -> BrushResult<Brush> {
        if brushes.is_empty() {
            return Err(KernelError::TooFewPoints { count: 0 }.into());
        }
        let geometries: Vec<&Polyhedron> = brushes.iter().map(|b| b.geometry()).collect();
        let merged = config.csg_engine().convex_merge(&geometries)?;
        rebuild_hull(config, &merged, brushes)
    }
}

/// Turn a rebuild failure caused by a degenerate solid into "no brush".
fn unless_degenerate(result: BrushResult<Brush>) -> BrushResult<Option<Brush>> {
    match result {
        Ok(brush) => Ok(Some(brush)),
        Err(error) if error.kind() == Some(ErrorKind::DegenerateInput) => {
            debug!(%error, "dropping degenerate fragment");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

/// Build a brush on a hull computed from `sources`.
///
/// Each face takes its attributes from the largest coplanar source face,
/// or failing that from the source face whose center lies closest to it.
pub(crate) fn rebuild_hull(config: &BrushConfig, hull: &Polyhedron, sources: &[&Brush]) -> BrushResult<Brush> {
    let candidates: Vec<Candidate<'_>> = sources
        .iter()
        .flat_map(|&brush| (0..brush.face_count()).filter_map(move |i| Candidate::new(brush, i)))
        .collect();

    let default = BrushFaceAttributes::new(config.default_material.clone());
    let faces = hull
        .faces()
        .map(|(id, _)| {
            let [p1, p2, p3] = representative_points(hull, id)?;
            let mut face = BrushFace::create(p1, p2, p3, default.clone(), config)?;
            if let Some(best) = best_match(face.plane(), &candidates, config.tolerance.almost_zero) {
                face.copy_attributes_from(best);
            }
            Ok(face)
        })
        .collect::<BrushResult<Vec<_>>>()?;
    Brush::create(config, faces)
}

/// Build a brush on `geometry` with attributes taken from the brushes it came from.
fn rebuild(config: &BrushConfig, geometry: &Polyhedron, base: &Brush, others: &[&Brush]) -> BrushResult<Brush> {
    let default = BrushFaceAttributes::new(config.default_material.clone());
    let faces = geometry
        .faces()
        .map(|(id, _)| {
            let [p1, p2, p3] = representative_points(geometry, id)?;
            let mut face = BrushFace::create(p1, p2, p3, default.clone(), config)?;
            if let Some(source) = source_face(face.plane(), base, others) {
                face.copy_attributes_from(source);
            }
            Ok(face)
        })
        .collect::<BrushResult<Vec<_>>>()?;
    Brush::create(config, faces)
}

/// A face of `base` on the same plane, else a face of `others` facing the
/// other way, else one on the same plane.
fn source_face<'a>(plane: &Plane, base: &'a Brush, others: &[&'a Brush]) -> Option<&'a BrushFace> {
    let on = |brush: &'a Brush, plane: &Plane| brush.find_face_by_plane(plane).and_then(|i| brush.face(i));
    on(base, plane)
        .or_else(|| others.iter().find_map(|&other| on(other, &plane.flipped())))
        .or_else(|| others.iter().find_map(|&other| on(other, plane)))
}

struct Candidate<'a> {
    face: &'a BrushFace,
    center: Point3d,
    area: f64,
}

impl<'a> Candidate<'a> {
    fn new(brush: &'a Brush, index: usize) -> Option<Self> {
        let face = brush.face(index)?;
        let vertices = brush.face_vertices(index)?;
        let area = brush
            .face_triangles(index)?
            .iter()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() / 2.0)
            .sum();
        Some(Self {
            face,
            center: average(&vertices),
            area,
        })
    }
}

fn best_match<'a>(plane: &Plane, candidates: &[Candidate<'a>], epsilon: f64) -> Option<&'a BrushFace> {
    let coplanar = candidates
        .iter()
        .filter(|c| c.face.plane().is_equal(plane, epsilon))
        .max_by(|a, b| a.area.total_cmp(&b.area));
    coplanar
        .or_else(|| {
            candidates.iter().min_by(|a, b| {
                let da = plane.point_distance(&a.center).abs();
                let db = plane.point_distance(&b.center).abs();
                da.total_cmp(&db)
            })
        })
        .map(|c| c.face)
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// A (minuend, subtrahend) pair whose subtraction failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub minuend: usize,
    pub subtrahend: usize,
    pub error: BrushError,
}

/// Result of [`subtract_batch`].
#[derive(Debug, Clone, Default)]
pub struct SubtractBatch {
    /// What remains of each minuend, indexed like the input.
    pub fragments: Vec<Vec<Brush>>,
    pub failures: Vec<PairFailure>,
}

impl SubtractBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_brushes(self) -> Vec<Brush> {
        self.fragments.into_iter().flatten().collect()
    }
}

/// Subtract every subtrahend from every minuend.
///
/// Minuends are processed in parallel. Each pair either applies to all
/// current pieces of its minuend or, if any piece fails, is skipped and
/// reported, leaving those pieces as they were.
#[instrument(skip_all, fields(minuends = minuends.len(), subtrahends = subtrahends.len()))]
pub fn subtract_batch(config: &BrushConfig, minuends: &[Brush], subtrahends: &[&Brush]) -> SubtractBatch {
    let per_minuend: Vec<(Vec<Brush>, Vec<PairFailure>)> = minuends
        .par_iter()
        .enumerate()
        .map(|(m, minuend)| {
            let mut pieces = vec![minuend.clone()];
            let mut failures = Vec::new();
            for (s, subtrahend) in subtrahends.iter().enumerate() {
                let attempt: BrushResult<Vec<Vec<Brush>>> =
                    pieces.iter().map(|piece| piece.subtract(config, subtrahend)).collect();
                match attempt {
                    Ok(next) => pieces = next.into_iter().flatten().collect(),
                    Err(error) => {
                        warn!(minuend = m, subtrahend = s, %error, "subtraction failed, pair skipped");
                        failures.push(PairFailure {
                            minuend: m,
                            subtrahend: s,
                            error,
                        });
                    }
                }
            }
            (pieces, failures)
        })
        .collect();

    let mut batch = SubtractBatch::default();
    for (pieces, failures) in per_minuend {
        batch.fragments.push(pieces);
        batch.failures.extend(failures);
    }
    debug!(
        fragments = batch.fragments.iter().map(Vec::len).sum::<usize>(),
        failures = batch.failures.len(),
        "batch subtraction complete"
    );
    batch
}
