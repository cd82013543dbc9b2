use std::collections::{HashMap, HashSet};

use slotmap::SecondaryMap;
use tracing::{debug, instrument};

use crate::error::{KernelError, KernelResult};
use crate::geometry::intersection::interpolate_by_distance;
use crate::geometry::vector::newell_normal;
use crate::geometry::{Plane, PointStatus};
use crate::topology::builder::PolygonSoup;
use crate::topology::polyhedron::{EdgeId, FaceId, Polyhedron, VertexId};
use crate::Tolerance;

/// What a clip did to the solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// No vertex lies in front of the plane. The solid is untouched.
    Unchanged,
    /// No vertex lies behind the plane, so nothing would remain. The solid is untouched.
    Empty,
    /// The solid was cut; `face` is the new face lying on the clip plane.
    Clipped { face: FaceId },
}

impl Polyhedron {
    /// Intersect the solid with the half-space behind `plane`.
    ///
    /// The new face on the cut carries `payload`. On error the solid is
    /// left exactly as it was.
    #[instrument(skip(self, tolerance), fields(normal = ?plane.normal, distance = plane.distance))]
    pub fn clip(
        &mut self,
        plane: &Plane,
        payload: Option<usize>,
        tolerance: &Tolerance,
    ) -> KernelResult<ClipOutcome> {
        let mut status: SecondaryMap<VertexId, (PointStatus, f64)> = SecondaryMap::new();
        let (mut above, mut below) = (0usize, 0usize);
        for (id, vertex) in self.vertices() {
            let s = plane.point_status(&vertex.position, tolerance.point_status);
            match s {
                PointStatus::Above => above += 1,
                PointStatus::Below => below += 1,
                PointStatus::Inside => {}
            }
            status.insert(id, (s, plane.point_distance(&vertex.position)));
        }

        if above == 0 {
            debug!("plane does not cut the solid");
            return Ok(ClipOutcome::Unchanged);
        }
        if below == 0 {
            debug!("plane removes the whole solid");
            return Ok(ClipOutcome::Empty);
        }

        let soup = self.clipped_soup(plane, payload, &status)?;
        let (clipped, faces) = soup.assemble()?;
        let face = *faces
            .last()
            .ok_or_else(|| KernelError::no_seam("clip produced no faces"))?;
        debug!(
            above,
            below,
            vertices = clipped.vertex_count(),
            faces = clipped.face_count(),
            "clipped solid"
        );
        *self = clipped;
        Ok(ClipOutcome::Clipped { face })
    }

    /// Soup of the part behind `plane`, closed by the seam face.
    fn clipped_soup(
        &self,
        plane: &Plane,
        payload: Option<usize>,
        status: &SecondaryMap<VertexId, (PointStatus, f64)>,
    ) -> KernelResult<PolygonSoup> {
        let dangling = || KernelError::non_manifold("dangling reference in clipped solid");
        let status_of = |v: VertexId| status.get(v).copied().ok_or_else(dangling);

        let mut soup = PolygonSoup::new();
        let mut kept: SecondaryMap<VertexId, usize> = SecondaryMap::new();
        for (id, vertex) in self.vertices() {
            if status_of(id)?.0 != PointStatus::Above {
                kept.insert(id, soup.add_position(vertex.position));
            }
        }

        // One new vertex per crossed edge, shared by both of its faces.
        let mut crossings: SecondaryMap<EdgeId, usize> = SecondaryMap::new();

        for (face_id, face) in self.faces() {
            let boundary = self.face_boundary(face_id);
            let mut polygon = Vec::with_capacity(boundary.len() + 1);
            let mut has_below = false;

            for h in boundary {
                let he = self.half_edge(h).ok_or_else(dangling)?;
                let dest = self.destination(h).ok_or_else(dangling)?;
                let (from_status, _) = status_of(he.origin)?;
                let (to_status, _) = status_of(dest)?;

                if from_status == PointStatus::Below {
                    has_below = true;
                }
                if from_status != PointStatus::Above {
                    polygon.push(*kept.get(he.origin).ok_or_else(dangling)?);
                }

                let crosses = matches!(
                    (from_status, to_status),
                    (PointStatus::Below, PointStatus::Above) | (PointStatus::Above, PointStatus::Below)
                );
                if crosses {
                    let index = match crossings.get(he.edge) {
                        Some(&index) => index,
                        None => {
                            // Interpolate along the edge's own direction so the
                            // result does not depend on which face sees it first.
                            let edge = self.edge(he.edge).ok_or_else(dangling)?;
                            let a = self.half_edge(edge.first).ok_or_else(dangling)?.origin;
                            let b = self.half_edge(edge.second).ok_or_else(dangling)?.origin;
                            let pa = self.vertex(a).ok_or_else(dangling)?.position;
                            let pb = self.vertex(b).ok_or_else(dangling)?.position;
                            let point = interpolate_by_distance(&pa, status_of(a)?.1, &pb, status_of(b)?.1);
                            let index = soup.add_position(point);
                            crossings.insert(he.edge, index);
                            index
                        }
                    };
                    polygon.push(index);
                }
            }

            if has_below && polygon.len() >= 3 {
                soup.add_loop(polygon, face.plane, face.payload);
            }
        }

        let seam = find_seam(&soup, plane)?;
        soup.add_loop(seam, *plane, payload);
        Ok(soup)
    }
}

/// Order the open boundary of the kept faces into the loop of the cap face.
///
/// The cap uses every boundary edge reversed. Where a vertex has several
/// unused outgoing cap edges the walk takes the one turning least to the
/// left in the clip plane, which keeps to the outer boundary; ties go to
/// the edge found first. The walk is capped at one step per cap edge.
fn find_seam(soup: &PolygonSoup, plane: &Plane) -> KernelResult<Vec<usize>> {
    let mut directed: HashSet<(usize, usize)> = HashSet::new();
    for face in &soup.loops {
        let n = face.vertices.len();
        for i in 0..n {
            directed.insert((face.vertices[i], face.vertices[(i + 1) % n]));
        }
    }

    let mut cap_edges: Vec<(usize, usize)> = Vec::new();
    for face in &soup.loops {
        let n = face.vertices.len();
        for i in 0..n {
            let (a, b) = (face.vertices[i], face.vertices[(i + 1) % n]);
            if !directed.contains(&(b, a)) {
                cap_edges.push((b, a));
            }
        }
    }
    if cap_edges.len() < 3 {
        return Err(KernelError::no_seam(format!(
            "cut boundary has {} edges",
            cap_edges.len()
        )));
    }

    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (index, &(from, _)) in cap_edges.iter().enumerate() {
        outgoing.entry(from).or_default().push(index);
    }

    let position_2d = |i: usize| {
        soup.positions
            .get(i)
            .map(|p| plane.project_2d(p))
            .ok_or_else(|| KernelError::no_seam("seam references an unknown vertex"))
    };

    let start = cap_edges[0].0;
    let mut visited = vec![false; cap_edges.len()];
    let mut seam = Vec::with_capacity(cap_edges.len());
    let mut current = 0;
    let mut closed = false;

    for _ in 0..=cap_edges.len() {
        visited[current] = true;
        let (from, to) = cap_edges[current];
        seam.push(from);
        if to == start {
            closed = true;
            break;
        }

        let candidates: Vec<usize> = outgoing
            .get(&to)
            .map(|c| c.iter().copied().filter(|&e| !visited[e]).collect())
            .unwrap_or_default();

        current = match candidates.as_slice() {
            [] => return Err(KernelError::no_seam("cut boundary is open")),
            [only] => *only,
            _ => {
                let (fx, fy) = position_2d(from)?;
                let (tx, ty) = position_2d(to)?;
                let incoming = (tx - fx, ty - fy);
                let mut best: Option<(usize, f64)> = None;
                for &candidate in &candidates {
                    let (nx, ny) = position_2d(cap_edges[candidate].1)?;
                    let out = (nx - tx, ny - ty);
                    let cross = incoming.0 * out.1 - incoming.1 * out.0;
                    let dot = incoming.0 * out.0 + incoming.1 * out.1;
                    let turn = cross.atan2(dot);
                    if best.map_or(true, |(_, t)| turn < t) {
                        best = Some((candidate, turn));
                    }
                }
                best.map(|(c, _)| c)
                    .ok_or_else(|| KernelError::no_seam("no continuation for seam"))?
            }
        };
    }

    if !closed {
        return Err(KernelError::no_seam("seam walk did not return to its start"));
    }
    if visited.iter().any(|v| !v) {
        return Err(KernelError::no_seam("cut boundary is not a single loop"));
    }
    if seam.len() < 3 {
        return Err(KernelError::no_seam("seam has fewer than 3 vertices"));
    }

    let points: Vec<_> = seam.iter().filter_map(|&i| soup.positions.get(i).copied()).collect();
    if newell_normal(&points).dot(&plane.normal) <= 0.0 {
        return Err(KernelError::no_seam("seam winds against the clip plane"));
    }
    Ok(seam)
}
