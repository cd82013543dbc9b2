use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::geometry::vector::{average, newell_normal};
use crate::geometry::{BoundingBox, Plane, Point3d, Vec3};
use crate::Tolerance;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexId;
    pub struct HalfEdgeId;
    pub struct EdgeId;
    pub struct FaceId;
}

// ─── Topological Entities ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3d,
    /// One of the half-edges starting at this vertex.
    pub leaving: HalfEdgeId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HalfEdge {
    pub origin: VertexId,
    pub twin: HalfEdgeId,
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
    pub face: FaceId,
    pub edge: EdgeId,
}

/// The pair of half-edges running between two vertices in opposite directions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub first: HalfEdgeId,
    pub second: HalfEdgeId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Face {
    pub plane: Plane,
    /// Any half-edge of the boundary loop. The loop runs counter-clockwise
    /// seen from the front of `plane`.
    pub boundary: HalfEdgeId,
    /// Caller-defined tag, usually the index of the plane that produced the face.
    /// Faces left over from the world-bounds seed carry `None`.
    pub payload: Option<usize>,
}

// ─── Polyhedron ──────────────────────────────────────────────────────────────

/// A closed convex solid stored as a half-edge mesh.
///
/// Instances are only ever produced by the construction functions, which
/// validate before returning, and every mutation builds a fresh arena that
/// replaces the old one on success. Iteration order of all elements is
/// insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyhedron {
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    pub(crate) bounds: BoundingBox,
}

impl Polyhedron {
    // ── Element access ──

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices.iter()
    }

    pub fn half_edges(&self) -> impl Iterator<Item = (HalfEdgeId, &HalfEdge)> + '_ {
        self.half_edges.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.faces.iter()
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn half_edge(&self, id: HalfEdgeId) -> Option<&HalfEdge> {
        self.half_edges.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn vertex_positions(&self) -> Vec<Point3d> {
        self.vertices.values().map(|v| v.position).collect()
    }

    /// The vertex a half-edge points to.
    pub fn destination(&self, id: HalfEdgeId) -> Option<VertexId> {
        let he = self.half_edges.get(id)?;
        self.half_edges.get(he.next).map(|next| next.origin)
    }

    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(Point3d, Point3d)> {
        let edge = self.edges.get(id)?;
        let start = self.half_edges.get(edge.first)?.origin;
        let end = self.half_edges.get(edge.second)?.origin;
        Some((self.vertices.get(start)?.position, self.vertices.get(end)?.position))
    }

    pub fn edge_vector(&self, id: EdgeId) -> Option<Vec3> {
        self.edge_endpoints(id).map(|(a, b)| b - a)
    }

    // ── Traversal ──

    /// Half-edges of a face's boundary loop in winding order.
    ///
    /// The walk stops after returning to the start or after visiting as
    /// many half-edges as the mesh holds.
    pub fn face_boundary(&self, face: FaceId) -> Vec<HalfEdgeId> {
        let Some(f) = self.faces.get(face) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut current = f.boundary;
        for _ in 0..self.half_edges.len() {
            let Some(he) = self.half_edges.get(current) else {
                break;
            };
            result.push(current);
            current = he.next;
            if current == f.boundary {
                break;
            }
        }
        result
    }

    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.face_boundary(face)
            .into_iter()
            .filter_map(|h| self.half_edges.get(h).map(|he| he.origin))
            .collect()
    }

    pub fn face_positions(&self, face: FaceId) -> Vec<Point3d> {
        self.face_vertices(face)
            .into_iter()
            .filter_map(|v| self.vertices.get(v).map(|v| v.position))
            .collect()
    }

    /// Fan triangulation of a face, wound like the face itself.
    pub fn face_triangles(&self, face: FaceId) -> Vec<[Point3d; 3]> {
        let positions = self.face_positions(face);
        if positions.len() < 3 {
            return Vec::new();
        }
        (1..positions.len() - 1)
            .map(|i| [positions[0], positions[i], positions[i + 1]])
            .collect()
    }

    /// Three non-collinear boundary points `[p1, p2, p3]` with
    /// `(p3 - p1) × (p2 - p1)` pointing along the face normal.
    ///
    /// Picks the widest fan triangle so the plane they define is well conditioned.
    pub fn face_points(&self, face: FaceId) -> Option<[Point3d; 3]> {
        let positions = self.face_positions(face);
        if positions.len() < 3 {
            return None;
        }
        let origin = positions[0];
        let (best, area) = (1..positions.len() - 1)
            .map(|i| (i, (positions[i] - origin).cross(&(positions[i + 1] - origin)).norm()))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if area == 0.0 {
            return None;
        }
        Some([origin, positions[best + 1], positions[best]])
    }

    /// Unit normal of a face's boundary polygon.
    pub fn face_normal(&self, face: FaceId) -> Option<Vec3> {
        let normal = newell_normal(&self.face_positions(face));
        normal.try_normalize(0.0)
    }

    /// Outgoing half-edges around a vertex in order.
    pub fn vertex_fan(&self, vertex: VertexId) -> Vec<HalfEdgeId> {
        let Some(v) = self.vertices.get(vertex) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut current = v.leaving;
        for _ in 0..self.half_edges.len() {
            let Some(he) = self.half_edges.get(current) else {
                break;
            };
            result.push(current);
            let Some(twin) = self.half_edges.get(he.prev).map(|prev| prev.twin) else {
                break;
            };
            current = twin;
            if current == v.leaving {
                break;
            }
        }
        result
    }

    // ── Geometric queries ──

    /// Whether `point` is on or behind every face plane.
    pub fn contains_point(&self, point: &Point3d, epsilon: f64) -> bool {
        self.bounds.contains_point_eps(point, epsilon)
            && self.faces.values().all(|f| f.plane.point_distance(point) <= epsilon)
    }

    /// Whether every vertex of `other` lies inside this solid.
    pub fn contains(&self, other: &Polyhedron, epsilon: f64) -> bool {
        self.bounds.expanded(epsilon).contains(&other.bounds)
            && other.vertices.values().all(|v| self.contains_point(&v.position, epsilon))
    }

    /// Whether the solid overlaps `bbox` in a region of positive volume.
    pub fn intersects_bounds(&self, bbox: &BoundingBox, epsilon: f64) -> bool {
        if !self.bounds.intersects(bbox) {
            return false;
        }
        let corners = bbox.vertices();
        let mine = self.vertex_positions();
        let axes = self
            .faces
            .values()
            .map(|f| f.plane.normal)
            .chain([Vec3::x(), Vec3::y(), Vec3::z()]);
        !axes.into_iter().any(|axis| separated_along(&axis, &mine, &corners, epsilon))
    }

    /// Separating-axis overlap test. Solids that only touch do not intersect.
    pub fn intersects(&self, other: &Polyhedron, tolerance: &Tolerance) -> bool {
        let eps = tolerance.point_status;
        if !self.bounds.intersects_eps(&other.bounds, eps) {
            return false;
        }
        let mine = self.vertex_positions();
        let theirs = other.vertex_positions();

        let face_axes = self
            .faces
            .values()
            .chain(other.faces.values())
            .map(|f| f.plane.normal);
        for axis in face_axes {
            if separated_along(&axis, &mine, &theirs, eps) {
                return false;
            }
        }

        let my_edges: Vec<Vec3> = self.edges.keys().filter_map(|e| self.edge_vector(e)).collect();
        let their_edges: Vec<Vec3> = other.edges.keys().filter_map(|e| other.edge_vector(e)).collect();
        for a in &my_edges {
            for b in &their_edges {
                let Some(axis) = a.cross(b).try_normalize(tolerance.angle) else {
                    continue;
                };
                if separated_along(&axis, &mine, &theirs, eps) {
                    return false;
                }
            }
        }
        true
    }

    /// Face whose plane is exactly `plane`.
    pub fn find_face_by_plane(&self, plane: &Plane) -> Option<FaceId> {
        self.faces.iter().find(|(_, f)| f.plane == *plane).map(|(id, _)| id)
    }

    /// First face whose normal matches `normal` within `epsilon`.
    pub fn find_face_by_normal(&self, normal: &Vec3, epsilon: f64) -> Option<FaceId> {
        self.faces
            .iter()
            .find(|(_, f)| (f.plane.normal - *normal).amax() <= epsilon)
            .map(|(id, _)| id)
    }

    pub fn find_face_by_payload(&self, payload: usize) -> Option<FaceId> {
        self.faces
            .iter()
            .find(|(_, f)| f.payload == Some(payload))
            .map(|(id, _)| id)
    }

    pub fn find_vertex(&self, position: &Point3d, epsilon: f64) -> Option<VertexId> {
        self.vertices
            .iter()
            .find(|(_, v)| (v.position - *position).amax() <= epsilon)
            .map(|(id, _)| id)
    }

    /// Nearest vertex to `position` no farther away than `max_distance`.
    pub fn find_closest_vertex(&self, position: &Point3d, max_distance: f64) -> Option<VertexId> {
        self.vertices
            .iter()
            .map(|(id, v)| (id, (v.position - *position).norm()))
            .filter(|(_, d)| *d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Tag one face. Returns false if the face does not exist.
    pub fn set_face_payload(&mut self, face: FaceId, payload: Option<usize>) -> bool {
        match self.faces.get_mut(face) {
            Some(f) => {
                f.payload = payload;
                true
            }
            None => false,
        }
    }

    /// Rewrite every face payload through `map`.
    pub fn remap_payloads(&mut self, mut map: impl FnMut(usize) -> Option<usize>) {
        for face in self.faces.values_mut() {
            face.payload = face.payload.and_then(&mut map);
        }
    }

    /// Whether every face was produced by a caller plane rather than the seed volume.
    pub fn is_bounded(&self) -> bool {
        self.faces.values().all(|f| f.payload.is_some())
    }

    /// Enclosed volume, positive for outward-wound faces.
    pub fn volume(&self) -> f64 {
        let center = self.centroid();
        let mut six_volume = 0.0;
        for face in self.faces.keys() {
            for [a, b, c] in self.face_triangles(face) {
                six_volume += (a - center).dot(&(b - center).cross(&(c - center)));
            }
        }
        six_volume / 6.0
    }

    /// Smallest width of the solid measured along a face normal.
    ///
    /// For each face this is the depth of the farthest vertex behind it.
    pub fn thickness(&self) -> f64 {
        self.faces
            .values()
            .map(|face| {
                self.vertices
                    .values()
                    .map(|v| -face.plane.point_distance(&v.position))
                    .fold(0.0, f64::max)
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Mean of the vertex positions.
    pub fn centroid(&self) -> Point3d {
        average(&self.vertex_positions())
    }

    pub(crate) fn update_bounds(&mut self) {
        self.bounds = BoundingBox::from_points(self.vertices.values().map(|v| &v.position));
    }
}

/// Whether the projections of two point sets onto `axis` are disjoint or only touch.
fn separated_along(axis: &Vec3, a: &[Point3d], b: &[Point3d], epsilon: f64) -> bool {
    let (a_min, a_max) = project(axis, a);
    let (b_min, b_max) = project(axis, b);
    a_max <= b_min + epsilon || b_max <= a_min + epsilon
}

fn project(axis: &Vec3, points: &[Point3d]) -> (f64, f64) {
    points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = axis.dot(&p.coords);
        (lo.min(d), hi.max(d))
    })
}
