//! Polygon-soup form of a polyhedron and the assembler that links it into
//! a half-edge mesh.
//!
//! Every topological edit works on a soup and then calls [`PolygonSoup::assemble`],
//! which either yields a fully linked, closed mesh or an error. The source
//! polyhedron is never touched.

use std::collections::HashMap;

use slotmap::{Key, SecondaryMap, SlotMap};
use tracing::debug;

use super::polyhedron::{Edge, EdgeId, Face, FaceId, HalfEdge, HalfEdgeId, Polyhedron, Vertex, VertexId};
use crate::error::{KernelError, KernelResult};
use crate::geometry::{BoundingBox, Plane, Point3d};

/// One face of a soup: indices into the position list, counter-clockwise
/// seen from the front of `plane`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLoop {
    pub vertices: Vec<usize>,
    pub plane: Plane,
    pub payload: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PolygonSoup {
    pub positions: Vec<Point3d>,
    pub loops: Vec<FaceLoop>,
}

impl PolygonSoup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_polyhedron(poly: &Polyhedron) -> Self {
        Self::from_polyhedron_indexed(poly).0
    }

    /// Soup of `poly` plus the position index assigned to each vertex.
    pub fn from_polyhedron_indexed(poly: &Polyhedron) -> (Self, SecondaryMap<VertexId, usize>) {
        let mut soup = Self::new();
        let mut index = SecondaryMap::new();
        for (id, vertex) in poly.vertices() {
            index.insert(id, soup.add_position(vertex.position));
        }
        for (id, face) in poly.faces() {
            let vertices = poly
                .face_vertices(id)
                .into_iter()
                .filter_map(|v| index.get(v).copied())
                .collect();
            soup.loops.push(FaceLoop {
                vertices,
                plane: face.plane,
                payload: face.payload,
            });
        }
        (soup, index)
    }

    pub fn add_position(&mut self, position: Point3d) -> usize {
        self.positions.push(position);
        self.positions.len() - 1
    }

    pub fn add_loop(&mut self, vertices: Vec<usize>, plane: Plane, payload: Option<usize>) {
        self.loops.push(FaceLoop {
            vertices,
            plane,
            payload,
        });
    }

    pub fn loop_positions(&self, face: &FaceLoop) -> Vec<Point3d> {
        face.vertices
            .iter()
            .filter_map(|&i| self.positions.get(i).copied())
            .collect()
    }

    // ── Repair primitives ──

    /// Replace every use of vertex `from` by `into`.
    pub fn collapse_vertex(&mut self, from: usize, into: usize) {
        for face in &mut self.loops {
            for v in &mut face.vertices {
                if *v == from {
                    *v = into;
                }
            }
        }
        self.cleanup();
    }

    /// Remove repeated vertices and back-and-forth spikes from every loop and
    /// drop loops that collapse below three vertices.
    pub fn cleanup(&mut self) {
        for face in &mut self.loops {
            remove_repeats(&mut face.vertices);
            while let Some(i) = find_spike(&face.vertices) {
                let n = face.vertices.len();
                let (a, b) = ((i + 1) % n, (i + 2) % n);
                face.vertices.remove(a.max(b));
                face.vertices.remove(a.min(b));
                remove_repeats(&mut face.vertices);
            }
        }
        self.loops.retain(|face| face.vertices.len() >= 3);
    }

    /// First edge (in loop order) shorter than `min_length`.
    pub fn find_short_edge(&self, min_length: f64) -> Option<(usize, usize)> {
        self.loops.iter().find_map(|face| {
            let n = face.vertices.len();
            (0..n).find_map(|i| {
                let (a, b) = (face.vertices[i], face.vertices[(i + 1) % n]);
                let (pa, pb) = (self.positions.get(a)?, self.positions.get(b)?);
                ((pa - pb).norm() < min_length).then_some((a, b))
            })
        })
    }

    /// Drop vertices that only two faces share; they sit on the middle of an edge.
    pub fn remove_degree_two_vertices(&mut self) {
        loop {
            let mut uses = vec![0usize; self.positions.len()];
            for face in &self.loops {
                for &v in &face.vertices {
                    if let Some(count) = uses.get_mut(v) {
                        *count += 1;
                    }
                }
            }
            let Some(vertex) = uses.iter().position(|&count| count == 2) else {
                break;
            };
            for face in &mut self.loops {
                face.vertices.retain(|&v| v != vertex);
            }
            self.cleanup();
        }
    }

    /// Merge neighbouring loops whose planes agree within `epsilon`.
    ///
    /// The merged loop keeps the plane and payload of the loop that comes first.
    pub fn merge_coplanar_loops(&mut self, epsilon: f64) -> usize {
        let mut merged = 0;
        while let Some((i, j, a, b)) = self.find_coplanar_neighbours(epsilon) {
            let first = rotate_to_end_with(&self.loops[i].vertices, a, b);
            let second = rotate_to_end_with(&self.loops[j].vertices, b, a);
            // first: b .. a, second: a .. b
            let mut joined = first;
            joined.extend(second.iter().skip(1).take(second.len().saturating_sub(2)));
            self.loops[i].vertices = joined;
            self.loops.remove(j);
            self.cleanup();
            merged += 1;
        }
        merged
    }

    fn find_coplanar_neighbours(&self, epsilon: f64) -> Option<(usize, usize, usize, usize)> {
        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for (index, face) in self.loops.iter().enumerate() {
            for (a, b) in loop_edges(&face.vertices) {
                directed.insert((a, b), index);
            }
        }
        for (i, face) in self.loops.iter().enumerate() {
            for (a, b) in loop_edges(&face.vertices) {
                let Some(&j) = directed.get(&(b, a)) else {
                    continue;
                };
                if j > i && face.plane.is_equal(&self.loops[j].plane, epsilon) {
                    return Some((i, j, a, b));
                }
            }
        }
        None
    }

    // ── Assembly ──

    /// Link the soup into a half-edge mesh.
    ///
    /// Positions no loop references are dropped; the rest keep their
    /// relative order. Returns the new face ids in loop order.
    pub fn assemble(&self) -> KernelResult<(Polyhedron, Vec<FaceId>)> {
        let mut used = vec![false; self.positions.len()];
        for face in &self.loops {
            if face.vertices.len() < 3 {
                return Err(KernelError::non_manifold("face with fewer than 3 vertices"));
            }
            for &v in &face.vertices {
                let slot = used
                    .get_mut(v)
                    .ok_or_else(|| KernelError::non_manifold("face references an unknown vertex"))?;
                *slot = true;
            }
        }

        let mut vertices: SlotMap<VertexId, Vertex> = SlotMap::with_key();
        let mut vertex_ids: Vec<Option<VertexId>> = vec![None; self.positions.len()];
        for (i, position) in self.positions.iter().enumerate() {
            if used[i] {
                vertex_ids[i] = Some(vertices.insert(Vertex {
                    position: *position,
                    leaving: HalfEdgeId::null(),
                }));
            }
        }

        let mut half_edges: SlotMap<HalfEdgeId, HalfEdge> = SlotMap::with_key();
        let mut faces: SlotMap<FaceId, Face> = SlotMap::with_key();
        let mut directed: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();
        let mut created: Vec<(HalfEdgeId, usize, usize)> = Vec::new();
        let mut face_ids = Vec::with_capacity(self.loops.len());

        for face in &self.loops {
            let face_id = faces.insert(Face {
                plane: face.plane,
                boundary: HalfEdgeId::null(),
                payload: face.payload,
            });
            let n = face.vertices.len();
            let mut ids = Vec::with_capacity(n);
            for &v in &face.vertices {
                let origin = vertex_ids[v]
                    .ok_or_else(|| KernelError::non_manifold("face references an unknown vertex"))?;
                ids.push(half_edges.insert(HalfEdge {
                    origin,
                    twin: HalfEdgeId::null(),
                    next: HalfEdgeId::null(),
                    prev: HalfEdgeId::null(),
                    face: face_id,
                    edge: EdgeId::null(),
                }));
            }
            for i in 0..n {
                let (a, b) = (face.vertices[i], face.vertices[(i + 1) % n]);
                if a == b {
                    return Err(KernelError::non_manifold("face loop repeats a vertex"));
                }
                if directed.insert((a, b), ids[i]).is_some() {
                    return Err(KernelError::non_manifold("directed edge used by two faces"));
                }
                let he = &mut half_edges[ids[i]];
                he.next = ids[(i + 1) % n];
                he.prev = ids[(i + n - 1) % n];
                let origin = he.origin;
                if vertices[origin].leaving.is_null() {
                    vertices[origin].leaving = ids[i];
                }
                created.push((ids[i], a, b));
            }
            faces[face_id].boundary = ids[0];
            face_ids.push(face_id);
        }

        let mut edges: SlotMap<EdgeId, Edge> = SlotMap::with_key();
        for &(h, a, b) in &created {
            if !half_edges[h].twin.is_null() {
                continue;
            }
            let twin = *directed
                .get(&(b, a))
                .ok_or_else(|| KernelError::non_manifold("open boundary edge"))?;
            let edge = edges.insert(Edge { first: h, second: twin });
            half_edges[h].twin = twin;
            half_edges[h].edge = edge;
            half_edges[twin].twin = h;
            half_edges[twin].edge = edge;
        }

        check_vertex_fans(&vertices, &half_edges)?;

        let euler = vertices.len() as i64 - edges.len() as i64 + faces.len() as i64;
        if euler != 2 {
            return Err(KernelError::non_manifold(format!("Euler characteristic is {euler}")));
        }

        let bounds = BoundingBox::from_points(vertices.values().map(|v| &v.position));
        debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            faces = faces.len(),
            "assembled polyhedron"
        );
        Ok((
            Polyhedron {
                vertices,
                half_edges,
                edges,
                faces,
                bounds,
            },
            face_ids,
        ))
    }
}

/// Every outgoing half-edge of a vertex must be reachable by walking its fan;
/// otherwise two cones of faces meet in a single point.
fn check_vertex_fans(
    vertices: &SlotMap<VertexId, Vertex>,
    half_edges: &SlotMap<HalfEdgeId, HalfEdge>,
) -> KernelResult<()> {
    let mut outgoing: SecondaryMap<VertexId, usize> = SecondaryMap::new();
    for he in half_edges.values() {
        if let Some(count) = outgoing.get_mut(he.origin) {
            *count += 1;
        } else {
            outgoing.insert(he.origin, 1);
        }
    }
    for (id, vertex) in vertices {
        let mut count = 0;
        let mut current = vertex.leaving;
        loop {
            let he = half_edges
                .get(current)
                .ok_or_else(|| KernelError::non_manifold("vertex fan is broken"))?;
            if he.origin != id {
                return Err(KernelError::non_manifold("vertex fan leaves its vertex"));
            }
            count += 1;
            current = half_edges
                .get(he.prev)
                .map(|prev| prev.twin)
                .ok_or_else(|| KernelError::non_manifold("vertex fan is broken"))?;
            if current == vertex.leaving || count > half_edges.len() {
                break;
            }
        }
        if Some(&count) != outgoing.get(id) {
            return Err(KernelError::non_manifold("vertex is shared by separate face fans"));
        }
    }
    Ok(())
}

fn loop_edges(vertices: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

fn remove_repeats(vertices: &mut Vec<usize>) {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
}

fn find_spike(vertices: &[usize]) -> Option<usize> {
    let n = vertices.len();
    if n < 3 {
        return None;
    }
    (0..n).find(|&i| vertices[i] == vertices[(i + 2) % n])
}

/// Rotate a loop so that it starts with `end` and finishes with `start`,
/// i.e. the directed edge `start -> end` becomes the wrap-around edge.
fn rotate_to_end_with(vertices: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = vertices.len();
    let k = (0..n)
        .find(|&i| vertices[i] == start && vertices[(i + 1) % n] == end)
        .unwrap_or(0);
    (0..n).map(|i| vertices[(k + 1 + i) % n]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    fn unit_cube_soup() -> PolygonSoup {
        let mut soup = PolygonSoup::new();
        for p in BoundingBox::new(Point3d::origin(), Point3d::new(1.0, 1.0, 1.0)).vertices() {
            soup.add_position(p);
        }
        let faces: [([usize; 4], Vec3, f64); 6] = [
            ([0, 4, 6, 2], -Vec3::x(), 0.0),
            ([1, 3, 7, 5], Vec3::x(), 1.0),
            ([0, 1, 5, 4], -Vec3::y(), 0.0),
            ([2, 6, 7, 3], Vec3::y(), 1.0),
            ([0, 2, 3, 1], -Vec3::z(), 0.0),
            ([4, 5, 7, 6], Vec3::z(), 1.0),
        ];
        for (i, (vertices, normal, distance)) in faces.into_iter().enumerate() {
            soup.add_loop(vertices.to_vec(), Plane::new(normal, distance), Some(i));
        }
        soup
    }

    #[test]
    fn test_assemble_cube() {
        let (poly, faces) = unit_cube_soup().assemble().unwrap();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.edge_count(), 12);
        assert_eq!(faces.len(), 6);
        for (id, he) in poly.half_edges() {
            let twin = poly.half_edge(he.twin).unwrap();
            assert_eq!(twin.twin, id);
            assert_eq!(poly.half_edge(he.next).unwrap().prev, id);
        }
    }

    #[test]
    fn test_assemble_rejects_open_mesh() {
        let mut soup = unit_cube_soup();
        soup.loops.pop();
        let err = soup.assemble().unwrap_err();
        assert!(matches!(err, KernelError::NonManifold { .. }));
    }

    #[test]
    fn test_assemble_rejects_flipped_face() {
        let mut soup = unit_cube_soup();
        soup.loops[0].vertices.reverse();
        assert!(soup.assemble().is_err());
    }

    #[test]
    fn test_assemble_drops_unused_positions() {
        let mut soup = unit_cube_soup();
        soup.add_position(Point3d::new(5.0, 5.0, 5.0));
        let (poly, _) = soup.assemble().unwrap();
        assert_eq!(poly.vertex_count(), 8);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let (poly, _) = unit_cube_soup().assemble().unwrap();
        let soup = PolygonSoup::from_polyhedron(&poly);
        assert_eq!(soup.positions, poly.vertex_positions());
        assert_eq!(soup.loops, unit_cube_soup().loops);
    }

    #[test]
    fn test_cleanup_removes_spikes() {
        let mut soup = PolygonSoup::new();
        soup.add_loop(vec![0, 1, 2, 1, 3, 3], Plane::new(Vec3::z(), 0.0), None);
        soup.add_loop(vec![4, 5, 4], Plane::new(Vec3::z(), 0.0), None);
        soup.cleanup();
        assert_eq!(soup.loops.len(), 1);
        assert_eq!(soup.loops[0].vertices, vec![0, 1, 3]);
    }

    #[test]
    fn test_merge_coplanar_loops() {
        let mut soup = unit_cube_soup();
        // split the top face into two triangles
        let top = soup.loops.pop().unwrap();
        soup.add_loop(vec![4, 5, 7], top.plane, Some(5));
        soup.add_loop(vec![4, 7, 6], top.plane, Some(6));
        assert_eq!(soup.merge_coplanar_loops(1e-6), 1);
        let (poly, _) = soup.assemble().unwrap();
        assert_eq!(poly.face_count(), 6);
        assert_eq!(poly.edge_count(), 12);
    }
}
