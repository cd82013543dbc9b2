use brush_kernel::{BoundingBox, FaceId, KernelError, Plane, Point3d, Polyhedron, Tolerance, Vec3, VertexId};
use nalgebra::Matrix4;
use tracing::{debug, instrument};

use crate::attributes::BrushFaceAttributes;
use crate::config::BrushConfig;
use crate::csg::rebuild_hull;
use crate::error::{BrushError, BrushResult};
use crate::face::{sort_faces, BrushFace};

/// A convex solid bounded by faces.
///
/// Face `i` of [`Brush::faces`] is the geometry face carrying payload `i`.
/// Faces are kept in canonical plane order. Every edit returns a new brush
/// and leaves `self` untouched, so clones never share state.
#[derive(Debug, Clone)]
pub struct Brush {
    faces: Vec<BrushFace>,
    geometry: Polyhedron,
    tolerance: Tolerance,
}

impl Brush {
    // ── Construction ──

    /// Intersect the half-spaces behind `faces`.
    ///
    /// Faces whose plane cuts nothing are dropped; of two equal planes the
    /// one sorting first is kept.
    #[instrument(skip_all, fields(faces = faces.len()))]
    pub fn create(config: &BrushConfig, mut faces: Vec<BrushFace>) -> BrushResult<Self> {
        sort_faces(&mut faces);
        let planes: Vec<Plane> = faces.iter().map(|f| *f.plane()).collect();
        let geometry = Polyhedron::from_planes(&config.world_bounds, &planes, &config.tolerance)?;
        let brush = Self::link(geometry, faces, config.tolerance)?;
        debug!(faces = brush.face_count(), vertices = brush.vertex_count(), "created brush");
        Ok(brush)
    }

    /// Convex hull of `points`, every face carrying `attributes`.
    pub fn create_from_vertices(
        config: &BrushConfig,
        points: &[Point3d],
        attributes: &BrushFaceAttributes,
    ) -> BrushResult<Self> {
        let hull = Polyhedron::from_points(&config.world_bounds, points, &config.tolerance)?;
        let faces = hull
            .faces()
            .map(|(id, _)| {
                let [p1, p2, p3] = representative_points(&hull, id)?;
                BrushFace::create(p1, p2, p3, attributes.clone(), config)
            })
            .collect::<BrushResult<Vec<_>>>()?;
        Self::create(config, faces)
    }

    /// Axis-aligned box filling `bounds`.
    pub fn cuboid(config: &BrushConfig, bounds: &BoundingBox, attributes: &BrushFaceAttributes) -> BrushResult<Self> {
        let planes = [
            Plane::from_point_normal(&bounds.min, -Vec3::x()),
            Plane::from_point_normal(&bounds.max, Vec3::x()),
            Plane::from_point_normal(&bounds.min, -Vec3::y()),
            Plane::from_point_normal(&bounds.max, Vec3::y()),
            Plane::from_point_normal(&bounds.min, -Vec3::z()),
            Plane::from_point_normal(&bounds.max, Vec3::z()),
        ];
        let faces = planes
            .iter()
            .map(|plane| BrushFace::from_plane(plane, attributes.clone(), config))
            .collect::<BrushResult<Vec<_>>>()?;
        Self::create(config, faces)
    }

    /// Pair geometry faces with the faces whose index they carry, dropping
    /// faces that produced no geometry and renumbering in canonical order.
    fn link(mut geometry: Polyhedron, faces: Vec<BrushFace>, tolerance: Tolerance) -> BrushResult<Self> {
        let mut used = Vec::with_capacity(geometry.face_count());
        for (_, face) in geometry.faces() {
            match face.payload {
                Some(i) if i < faces.len() => used.push(i),
                _ => return Err(KernelError::Unbounded.into()),
            }
        }
        used.sort_by(|&a, &b| faces[a].plane().canonical_cmp(faces[b].plane()).then(a.cmp(&b)));
        used.dedup();
        if used.len() != geometry.face_count() {
            return Err(KernelError::degenerate("two faces share a plane index").into());
        }

        let mut renumber = vec![None; faces.len()];
        for (position, &old) in used.iter().enumerate() {
            renumber[old] = Some(position);
        }
        geometry.remap_payloads(|i| renumber.get(i).copied().flatten());

        let mut slots: Vec<Option<BrushFace>> = faces.into_iter().map(Some).collect();
        let faces = used.iter().filter_map(|&i| slots[i].take()).collect();
        Ok(Self {
            faces,
            geometry,
            tolerance,
        })
    }

    /// Rebuild the face list after the geometry changed shape.
    ///
    /// Each geometry face keeps the attributes of the face its payload
    /// names; faces without one get the default material.
    fn relink(&self, config: &BrushConfig, mut geometry: Polyhedron) -> BrushResult<Self> {
        let ids: Vec<FaceId> = geometry.faces().map(|(id, _)| id).collect();
        let mut faces = Vec::with_capacity(ids.len());
        for (index, &id) in ids.iter().enumerate() {
            let [p1, p2, p3] = representative_points(&geometry, id)?;
            let source = geometry
                .face(id)
                .and_then(|f| f.payload)
                .and_then(|i| self.faces.get(i));
            let face = match source {
                Some(old) => old.with_points(p1, p2, p3, &config.tolerance)?,
                None => BrushFace::create(
                    p1,
                    p2,
                    p3,
                    BrushFaceAttributes::new(config.default_material.clone()),
                    config,
                )?,
            };
            faces.push(face);
            geometry.set_face_payload(id, Some(index));
        }
        Self::link(geometry, faces, config.tolerance)
    }

    // ── Queries ──

    pub fn faces(&self) -> &[BrushFace] {
        &self.faces
    }

    pub fn face(&self, index: usize) -> Option<&BrushFace> {
        self.faces.get(index)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn geometry(&self) -> &Polyhedron {
        &self.geometry
    }

    pub fn bounds(&self) -> &BoundingBox {
        self.geometry.bounds()
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.geometry.edge_count()
    }

    pub fn vertex_positions(&self) -> Vec<Point3d> {
        self.geometry.vertex_positions()
    }

    /// Boundary of face `index`, counter-clockwise seen from outside.
    pub fn face_vertices(&self, index: usize) -> Option<Vec<Point3d>> {
        let id = self.geometry.find_face_by_payload(index)?;
        Some(self.geometry.face_positions(id))
    }

    /// Fan triangulation of face `index`.
    pub fn face_triangles(&self, index: usize) -> Option<Vec<[Point3d; 3]>> {
        let id = self.geometry.find_face_by_payload(index)?;
        Some(self.geometry.face_triangles(id))
    }

    pub fn find_face_by_plane(&self, plane: &Plane) -> Option<usize> {
        self.faces
            .iter()
            .position(|f| f.plane().is_equal(plane, self.tolerance.almost_zero))
    }

    pub fn find_face_by_normal(&self, normal: &Vec3) -> Option<usize> {
        self.faces
            .iter()
            .position(|f| (f.normal() - normal).amax() <= self.tolerance.almost_zero)
    }

    pub fn find_face_by_material(&self, material: &str) -> Option<usize> {
        self.faces.iter().position(|f| f.attributes().material == material)
    }

    /// Whether every geometry face came from one of the brush's faces.
    pub fn fully_specified(&self) -> bool {
        self.geometry.is_bounded() && self.faces.len() == self.geometry.face_count()
    }

    pub fn contains_point(&self, point: &Point3d) -> bool {
        self.bounds().contains_point_eps(point, self.tolerance.point_status)
            && self.geometry.contains_point(point, self.tolerance.point_status)
    }

    pub fn contains_brush(&self, other: &Brush) -> bool {
        self.geometry.contains(&other.geometry, self.tolerance.point_status)
    }

    /// Whether the brushes share volume. Brushes that only touch do not.
    pub fn intersects(&self, other: &Brush) -> bool {
        self.geometry.intersects(&other.geometry, &self.tolerance)
    }

    pub fn intersects_bounds(&self, bounds: &BoundingBox) -> bool {
        self.bounds().intersects(bounds)
    }

    pub fn has_vertex(&self, position: &Point3d, epsilon: f64) -> bool {
        self.geometry.find_vertex(position, epsilon).is_some()
    }

    pub fn has_edge(&self, a: &Point3d, b: &Point3d, epsilon: f64) -> bool {
        let near = |p: &Point3d, q: &Point3d| (p - q).norm() <= epsilon;
        self.geometry.edges().any(|(id, _)| {
            self.geometry
                .edge_endpoints(id)
                .is_some_and(|(s, e)| (near(&s, a) && near(&e, b)) || (near(&s, b) && near(&e, a)))
        })
    }

    /// Whether some face has exactly `polygon` as its boundary, in any rotation.
    pub fn has_polygon(&self, polygon: &[Point3d], epsilon: f64) -> bool {
        (0..self.face_count()).any(|i| {
            self.face_vertices(i).is_some_and(|boundary| {
                boundary.len() == polygon.len()
                    && polygon
                        .iter()
                        .all(|p| boundary.iter().any(|q| (p - q).norm() <= epsilon))
            })
        })
    }

    pub fn find_closest_vertex(&self, position: &Point3d) -> Option<Point3d> {
        let id = self.geometry.find_closest_vertex(position, f64::INFINITY)?;
        self.geometry.vertex(id).map(|v| v.position)
    }

    // ── Editing ──

    /// Move the vertices at `positions` by `delta`.
    ///
    /// Faces around moved vertices are re-planed (and split if they bend);
    /// their attributes carry over. Fails without effect if any position is
    /// not a vertex or the result would not be a valid convex solid.
    #[instrument(skip_all, fields(vertices = positions.len()))]
    pub fn move_vertices(&self, config: &BrushConfig, positions: &[Point3d], delta: &Vec3) -> BrushResult<Self> {
        let ids = positions
            .iter()
            .map(|p| {
                self.geometry
                    .find_vertex(p, config.tolerance.almost_zero)
                    .ok_or(KernelError::UnknownVertex)
            })
            .collect::<Result<Vec<VertexId>, _>>()?;
        let mut geometry = self.geometry.clone();
        geometry.move_vertices(&ids, delta, &config.world_bounds, &config.tolerance)?;
        self.relink(config, geometry)
    }

    /// Move the edges with endpoints `edges` by `delta`.
    ///
    /// Fails if any moved edge is not an edge of the result.
    pub fn move_edges(&self, config: &BrushConfig, edges: &[(Point3d, Point3d)], delta: &Vec3) -> BrushResult<Self> {
        let mut positions: Vec<Point3d> = Vec::with_capacity(edges.len() * 2);
        for &(a, b) in edges {
            push_unique(&mut positions, a, config.tolerance.almost_zero);
            push_unique(&mut positions, b, config.tolerance.almost_zero);
        }
        let moved = self.move_vertices(config, &positions, delta)?;
        let kept = edges
            .iter()
            .all(|(a, b)| moved.has_edge(&(a + delta), &(b + delta), config.tolerance.almost_zero));
        if !kept {
            return Err(BrushError::ElementLost { element: "edge" });
        }
        Ok(moved)
    }

    /// Move the face polygons `polygons` by `delta`.
    ///
    /// Fails if any moved polygon is not a face of the result.
    pub fn move_polygons(&self, config: &BrushConfig, polygons: &[Vec<Point3d>], delta: &Vec3) -> BrushResult<Self> {
        let mut positions: Vec<Point3d> = Vec::new();
        for p in polygons.iter().flatten() {
            push_unique(&mut positions, *p, config.tolerance.almost_zero);
        }
        let moved = self.move_vertices(config, &positions, delta)?;
        let kept = polygons.iter().all(|polygon| {
            let target: Vec<Point3d> = polygon.iter().map(|p| p + delta).collect();
            moved.has_polygon(&target, config.tolerance.almost_zero)
        });
        if !kept {
            return Err(BrushError::ElementLost { element: "face" });
        }
        Ok(moved)
    }

    /// Grow the brush to the hull of its vertices and `point`.
    ///
    /// Fails if `point` lies outside the world or would not end up as a vertex.
    #[instrument(skip(self, config))]
    pub fn add_vertex(&self, config: &BrushConfig, point: &Point3d) -> BrushResult<Self> {
        if !config.world_bounds.contains_point(point) {
            return Err(KernelError::OutsideWorldBounds.into());
        }
        let mut points = self.vertex_positions();
        points.push(*point);
        let hull = Polyhedron::from_points(&config.world_bounds, &points, &config.tolerance)?;
        if hull.find_vertex(point, config.tolerance.almost_zero).is_none() {
            return Err(BrushError::VertexNotAdded {
                x: point.x,
                y: point.y,
                z: point.z,
            });
        }
        rebuild_hull(config, &hull, &[self])
    }

    /// Shrink the brush to the hull of its vertices other than `positions`.
    #[instrument(skip_all, fields(vertices = positions.len()))]
    pub fn remove_vertices(&self, config: &BrushConfig, positions: &[Point3d]) -> BrushResult<Self> {
        let eps = config.tolerance.almost_zero;
        if positions.iter().any(|p| !self.has_vertex(p, eps)) {
            return Err(KernelError::UnknownVertex.into());
        }
        let remaining: Vec<Point3d> = self
            .vertex_positions()
            .into_iter()
            .filter(|v| !positions.iter().any(|p| (p - v).norm() <= eps))
            .collect();
        let hull = Polyhedron::from_points(&config.world_bounds, &remaining, &config.tolerance)?;
        rebuild_hull(config, &hull, &[self])
    }

    /// Round every vertex to the nearest multiple of `grid` and rebuild the
    /// brush as the hull of the snapped positions.
    #[instrument(skip(self, config))]
    pub fn snap_vertices(&self, config: &BrushConfig, grid: f64) -> BrushResult<Self> {
        if grid <= 0.0 || !grid.is_finite() {
            return Err(KernelError::degenerate("snap grid must be positive").into());
        }
        let snapped: Vec<Point3d> = self
            .vertex_positions()
            .iter()
            .map(|p| (p.coords / grid).map(f64::round) * grid)
            .map(Point3d::from)
            .collect();
        let hull = Polyhedron::from_points(&config.world_bounds, &snapped, &config.tolerance)?;
        rebuild_hull(config, &hull, &[self])
    }

    /// Translate face `index` by `delta`.
    ///
    /// Fails with [`BrushError::FaceRemoved`] if the move would make any
    /// face disappear.
    #[instrument(skip(self, config))]
    pub fn move_face(&self, config: &BrushConfig, index: usize, delta: &Vec3) -> BrushResult<Self> {
        let face = self.face(index).ok_or(BrushError::NoSuchFace {
            index,
            count: self.face_count(),
        })?;
        let mut faces = self.faces.clone();
        faces[index] = face.translated(delta, &config.tolerance)?;
        let moved = Self::create(config, faces.clone())?;
        if let Some(lost) = faces.iter().position(|f| moved.find_face_by_plane(f.plane()).is_none()) {
            return Err(BrushError::FaceRemoved { index: lost });
        }
        Ok(moved)
    }

    /// Move every face outward by `delta` (inward if negative).
    pub fn expand(&self, config: &BrushConfig, delta: f64) -> BrushResult<Self> {
        let faces = self
            .faces
            .iter()
            .map(|f| f.translated(&(f.normal() * delta), &config.tolerance))
            .collect::<BrushResult<Vec<_>>>()?;
        Self::create(config, faces)
    }

    /// Cut the brush by `face`, keeping the part behind it.
    pub fn clip(&self, config: &BrushConfig, face: BrushFace) -> BrushResult<Self> {
        let mut faces = self.faces.clone();
        faces.push(face);
        Self::create(config, faces)
    }

    /// Switch every face to Valve 220 texture axes.
    pub fn convert_to_parallel(&self) -> Self {
        Self {
            faces: self.faces.iter().map(BrushFace::converted_to_parallel).collect(),
            ..self.clone()
        }
    }

    /// Switch every face to world-axis texture projection.
    pub fn convert_to_paraxial(&self) -> Self {
        Self {
            faces: self.faces.iter().map(BrushFace::converted_to_paraxial).collect(),
            ..self.clone()
        }
    }

    /// Apply an affine transformation to every face.
    pub fn transform(&self, config: &BrushConfig, matrix: &Matrix4<f64>) -> BrushResult<Self> {
        let faces = self
            .faces
            .iter()
            .map(|f| f.transformed(matrix, &config.tolerance))
            .collect::<BrushResult<Vec<_>>>()?;
        Self::create(config, faces)
    }
}

fn push_unique(positions: &mut Vec<Point3d>, point: Point3d, epsilon: f64) {
    if !positions.iter().any(|p| (p - point).norm() <= epsilon) {
        positions.push(point);
    }
}

pub(crate) fn representative_points(geometry: &Polyhedron, face: FaceId) -> BrushResult<[Point3d; 3]> {
    geometry
        .face_points(face)
        .ok_or_else(|| KernelError::degenerate("face has no area").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BrushConfig {
        BrushConfig::default().with_world_bounds(BoundingBox::cube(8192.0))
    }

    fn cube(min: f64, max: f64) -> Brush {
        Brush::cuboid(
            &config(),
            &BoundingBox::new(Point3d::new(min, min, min), Point3d::new(max, max, max)),
            &BrushFaceAttributes::new("material"),
        )
        .unwrap()
    }

    #[test]
    fn test_cuboid() {
        let brush = cube(-32.0, 32.0);
        assert_eq!(brush.face_count(), 6);
        assert_eq!(brush.vertex_count(), 8);
        assert!(brush.fully_specified());
        let normals: Vec<Vec3> = brush.faces().iter().map(|f| *f.normal()).collect();
        assert_eq!(
            normals,
            vec![Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()]
        );
    }

    #[test]
    fn test_face_payloads_match_indices() {
        let brush = cube(0.0, 16.0);
        for (i, face) in brush.faces().iter().enumerate() {
            let id = brush.geometry().find_face_by_payload(i).unwrap();
            assert!(brush.geometry().face(id).unwrap().plane.is_equal(face.plane(), 1e-9));
        }
    }

    #[test]
    fn test_redundant_face_is_dropped() {
        let brush = cube(0.0, 16.0);
        let outer = BrushFace::from_plane(&Plane::new(Vec3::x(), 32.0), BrushFaceAttributes::new("other"), &config())
            .unwrap();
        let clipped = brush.clip(&config(), outer).unwrap();
        assert_eq!(clipped.face_count(), 6);
        assert_eq!(clipped.find_face_by_material("other"), None);
    }

    #[test]
    fn test_clip() {
        let brush = cube(0.0, 16.0);
        let cut = BrushFace::from_plane(&Plane::new(Vec3::x(), 8.0), BrushFaceAttributes::new("cut"), &config())
            .unwrap();
        let clipped = brush.clip(&config(), cut).unwrap();
        assert_eq!(clipped.face_count(), 6);
        assert_eq!(clipped.bounds().max.x, 8.0);
        let index = clipped.find_face_by_material("cut").unwrap();
        assert_eq!(clipped.faces()[index].normal(), &Vec3::x());
        // the source brush is untouched
        assert_eq!(brush.bounds().max.x, 16.0);
    }

    #[test]
    fn test_clip_away_everything() {
        let brush = cube(0.0, 16.0);
        let cut = BrushFace::from_plane(&Plane::new(Vec3::x(), -8.0), BrushFaceAttributes::default(), &config())
            .unwrap();
        assert_eq!(
            brush.clip(&config(), cut).unwrap_err(),
            BrushError::Kernel(KernelError::Empty)
        );
    }

    #[test]
    fn test_move_face() {
        let brush = cube(0.0, 16.0);
        let top = brush.find_face_by_normal(&Vec3::z()).unwrap();
        let moved = brush.move_face(&config(), top, &Vec3::new(0.0, 0.0, 8.0)).unwrap();
        assert_eq!(moved.bounds().max.z, 24.0);
        assert_eq!(moved.face_count(), 6);
    }

    #[test]
    fn test_move_face_through_opposite_face() {
        let brush = cube(0.0, 16.0);
        let top = brush.find_face_by_normal(&Vec3::z()).unwrap();
        assert!(brush.move_face(&config(), top, &Vec3::new(0.0, 0.0, -32.0)).is_err());
    }

    #[test]
    fn test_move_face_past_world_bounds() {
        let small = BrushConfig::default().with_world_bounds(BoundingBox::cube(32.0));
        let brush = Brush::cuboid(
            &small,
            &BoundingBox::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(16.0, 16.0, 16.0)),
            &BrushFaceAttributes::default(),
        )
        .unwrap();
        let top = brush.find_face_by_normal(&Vec3::z()).unwrap();
        assert_eq!(
            brush.move_face(&small, top, &Vec3::new(0.0, 0.0, 32.0)).unwrap_err(),
            BrushError::Kernel(KernelError::Unbounded)
        );
    }

    #[test]
    fn test_move_face_unknown_index() {
        let brush = cube(0.0, 16.0);
        assert_eq!(
            brush.move_face(&config(), 6, &Vec3::z()).unwrap_err(),
            BrushError::NoSuchFace { index: 6, count: 6 }
        );
    }

    #[test]
    fn test_expand() {
        let brush = cube(0.0, 16.0);
        let grown = brush.expand(&config(), 8.0).unwrap();
        assert_eq!(grown.bounds().min, Point3d::new(-8.0, -8.0, -8.0));
        assert_eq!(grown.bounds().max, Point3d::new(24.0, 24.0, 24.0));
        assert!(brush.expand(&config(), -8.0).is_err());
    }

    #[test]
    fn test_transform_translation() {
        let brush = cube(0.0, 16.0);
        let moved = brush
            .transform(&config(), &Matrix4::new_translation(&Vec3::new(16.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(moved.bounds().min, Point3d::new(16.0, 0.0, 0.0));
        assert_eq!(moved.bounds().max, Point3d::new(32.0, 16.0, 16.0));
    }

    #[test]
    fn test_transform_mirror() {
        let brush = cube(0.0, 16.0);
        let mirror = Matrix4::new_nonuniform_scaling(&Vec3::new(-1.0, 1.0, 1.0));
        let mirrored = brush.transform(&config(), &mirror).unwrap();
        assert_eq!(mirrored.bounds().min, Point3d::new(-16.0, 0.0, 0.0));
        assert_eq!(mirrored.bounds().max, Point3d::new(0.0, 16.0, 16.0));
    }

    #[test]
    fn test_move_vertices_keeps_attributes() {
        let brush = cube(0.0, 16.0);
        let top: Vec<Point3d> = brush.vertex_positions().into_iter().filter(|p| p.z == 16.0).collect();
        let moved = brush.move_vertices(&config(), &top, &Vec3::new(0.0, 0.0, 16.0)).unwrap();
        assert_eq!(moved.bounds().max.z, 32.0);
        assert_eq!(moved.face_count(), 6);
        assert!(moved.faces().iter().all(|f| f.attributes().material == "material"));
        assert!(moved.fully_specified());
    }

    #[test]
    fn test_move_unknown_vertex() {
        let brush = cube(0.0, 16.0);
        let result = brush.move_vertices(&config(), &[Point3d::new(8.0, 8.0, 8.0)], &Vec3::z());
        assert_eq!(result.unwrap_err(), BrushError::Kernel(KernelError::UnknownVertex));
    }

    #[test]
    fn test_move_edges() {
        let brush = cube(0.0, 16.0);
        let edge = (Point3d::new(0.0, 0.0, 16.0), Point3d::new(16.0, 0.0, 16.0));
        let delta = Vec3::new(0.0, 0.0, 8.0);
        let moved = brush.move_edges(&config(), &[edge], &delta).unwrap();
        assert!(moved.has_edge(&Point3d::new(0.0, 0.0, 24.0), &Point3d::new(16.0, 0.0, 24.0), 1e-6));
        assert_eq!(moved.bounds().max.z, 24.0);
        assert!(moved.fully_specified());
    }

    #[test]
    fn test_move_polygons() {
        let brush = cube(0.0, 16.0);
        let top = brush.find_face_by_normal(&Vec3::z()).unwrap();
        let polygon = brush.face_vertices(top).unwrap();
        let delta = Vec3::new(0.0, 0.0, 8.0);
        let moved = brush.move_polygons(&config(), &[polygon.clone()], &delta).unwrap();
        let target: Vec<Point3d> = polygon.iter().map(|p| p + delta).collect();
        assert!(moved.has_polygon(&target, 1e-6));
        assert_eq!(moved.face_count(), 6);
        assert!((moved.geometry().volume() - 16.0 * 16.0 * 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_add_vertex() {
        let brush = cube(0.0, 16.0);
        let apex = Point3d::new(8.0, 8.0, 32.0);
        let roofed = brush.add_vertex(&config(), &apex).unwrap();
        assert_eq!(roofed.vertex_count(), 9);
        assert_eq!(roofed.face_count(), 9);
        assert!(roofed.has_vertex(&apex, 1e-6));
        assert!(roofed.faces().iter().all(|f| f.attributes().material == "material"));

        assert!(matches!(
            brush.add_vertex(&config(), &Point3d::new(8.0, 8.0, 8.0)),
            Err(BrushError::VertexNotAdded { .. })
        ));
        assert_eq!(
            brush.add_vertex(&config(), &Point3d::new(0.0, 0.0, 9000.0)).unwrap_err(),
            BrushError::Kernel(KernelError::OutsideWorldBounds)
        );
    }

    #[test]
    fn test_remove_vertices() {
        let brush = cube(0.0, 16.0);
        let corner = Point3d::new(16.0, 16.0, 16.0);
        let cut = brush.remove_vertices(&config(), &[corner]).unwrap();
        assert_eq!(cut.vertex_count(), 7);
        assert_eq!(cut.face_count(), 7);
        assert!(!cut.has_vertex(&corner, 1e-6));
        // the bottom face is untouched and keeps its attributes
        let bottom = cut.find_face_by_normal(&-Vec3::z()).unwrap();
        assert_eq!(cut.faces()[bottom].attributes().material, "material");

        assert_eq!(
            brush.remove_vertices(&config(), &[Point3d::new(8.0, 8.0, 8.0)]).unwrap_err(),
            BrushError::Kernel(KernelError::UnknownVertex)
        );
    }

    #[test]
    fn test_snap_vertices() {
        let mut points = BoundingBox::new(Point3d::origin(), Point3d::new(16.0, 16.0, 16.0))
            .vertices()
            .to_vec();
        for p in points.iter_mut().filter(|p| p.x == 16.0 && p.y == 16.0 && p.z == 16.0) {
            *p = Point3d::new(16.3, 16.2, 15.8);
        }
        let skewed = Brush::create_from_vertices(&config(), &points, &BrushFaceAttributes::new("stone")).unwrap();
        let snapped = skewed.snap_vertices(&config(), 1.0).unwrap();
        assert_eq!(snapped.face_count(), 6);
        assert_eq!(snapped.vertex_count(), 8);
        assert_eq!(snapped.bounds().max, Point3d::new(16.0, 16.0, 16.0));
        assert!(snapped.faces().iter().all(|f| f.attributes().material == "stone"));
        assert!(skewed.snap_vertices(&config(), 0.0).is_err());
    }

    #[test]
    fn test_convert_uv_coord_systems() {
        let brush = cube(0.0, 16.0);
        assert!(brush.faces().iter().all(|f| !f.uv_coord_system().is_parallel()));
        let parallel = brush.convert_to_parallel();
        assert!(parallel.faces().iter().all(|f| f.uv_coord_system().is_parallel()));
        assert_eq!(parallel.vertex_positions(), brush.vertex_positions());
        let paraxial = parallel.convert_to_paraxial();
        assert!(paraxial.faces().iter().all(|f| !f.uv_coord_system().is_parallel()));
    }

    #[test]
    fn test_queries() {
        let brush = cube(0.0, 16.0);
        assert!(brush.contains_point(&Point3d::new(8.0, 8.0, 8.0)));
        assert!(brush.contains_point(&Point3d::new(16.0, 8.0, 8.0)));
        assert!(!brush.contains_point(&Point3d::new(17.0, 8.0, 8.0)));
        assert!(brush.contains_brush(&cube(4.0, 12.0)));
        assert!(!brush.contains_brush(&cube(4.0, 20.0)));
        assert!(brush.intersects(&cube(8.0, 24.0)));
        assert!(!brush.intersects(&cube(16.0, 32.0)));
        assert!(brush.has_vertex(&Point3d::new(16.0, 16.0, 16.0), 1e-6));
        assert_eq!(
            brush.find_closest_vertex(&Point3d::new(15.0, 14.0, 1.0)),
            Some(Point3d::new(16.0, 16.0, 0.0))
        );
        let top = brush.find_face_by_plane(&Plane::new(Vec3::z(), 16.0)).unwrap();
        assert_eq!(brush.face_vertices(top).unwrap().len(), 4);
        assert_eq!(brush.face_triangles(top).unwrap().len(), 2);
    }

    #[test]
    fn test_create_from_vertices() {
        let points = [
            Point3d::new(-64.0, -64.0, 0.0),
            Point3d::new(64.0, -64.0, 0.0),
            Point3d::new(0.0, 64.0, 0.0),
            Point3d::new(0.0, 0.0, 32.0),
        ];
        let brush = Brush::create_from_vertices(&config(), &points, &BrushFaceAttributes::new("rock")).unwrap();
        assert_eq!(brush.face_count(), 4);
        assert_eq!(brush.vertex_count(), 4);
        for p in &points {
            assert!(brush.has_vertex(p, 1e-6));
        }
        assert_eq!(brush.find_face_by_material("rock"), Some(0));
    }

    #[test]
    fn test_clone_is_independent() {
        let brush = cube(0.0, 16.0);
        let copy = brush.clone();
        let grown = copy.expand(&config(), 4.0).unwrap();
        assert_eq!(brush.bounds().max.x, 16.0);
        assert_eq!(copy.bounds().max.x, 16.0);
        assert_eq!(grown.bounds().max.x, 20.0);
    }
}
