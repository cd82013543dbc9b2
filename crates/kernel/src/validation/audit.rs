//! The individual checks run by `PolyhedronValidator`.

use std::collections::HashSet;

use slotmap::SecondaryMap;

use super::config::ValidationConfig;
use super::types::{EntityId, ErrorCode, ValidationError};
use crate::geometry::vector::newell_normal;
use crate::topology::polyhedron::{Polyhedron, VertexId};

/// Topology: Euler, twins, loops, fans.
pub fn check_topology(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    let euler = poly.vertex_count() as i64 - poly.edge_count() as i64 + poly.face_count() as i64;
    if euler != 2 {
        errors.push(ValidationError::error(
            EntityId::Solid,
            ErrorCode::EulerPoincareViolation,
            format!(
                "V - E + F = {} - {} + {} = {euler}",
                poly.vertex_count(),
                poly.edge_count(),
                poly.face_count()
            ),
        ));
    }

    for (id, he) in poly.half_edges() {
        let Some(twin) = poly.half_edge(he.twin) else {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(id),
                ErrorCode::DanglingReference,
                "half-edge has no twin",
            ));
            continue;
        };
        if twin.twin != id {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(id),
                ErrorCode::HalfEdgeTwinMismatch,
                "twin of twin is a different half-edge",
            ));
        }
        if poly.destination(he.twin) != Some(he.origin) {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(id),
                ErrorCode::InconsistentEdgeOrientation,
                "twin does not run opposite to its partner",
            ));
        }
        if poly.face(he.face).is_none() || poly.vertex(he.origin).is_none() || poly.edge(he.edge).is_none() {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(id),
                ErrorCode::DanglingReference,
                "half-edge references a missing element",
            ));
        }
        if poly.half_edge(he.next).map(|n| n.prev) != Some(id) {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(id),
                ErrorCode::WireNotClosed,
                "next and prev pointers disagree",
            ));
        }
    }

    for (id, face) in poly.faces() {
        let boundary = poly.face_boundary(id);
        let closes = boundary
            .last()
            .and_then(|&h| poly.half_edge(h))
            .is_some_and(|he| he.next == face.boundary);
        if !closes {
            errors.push(ValidationError::error(
                EntityId::Face(id),
                ErrorCode::WireNotClosed,
                "face boundary does not close",
            ));
            continue;
        }
        if boundary.len() < 3 {
            errors.push(ValidationError::error(
                EntityId::Face(id),
                ErrorCode::TooFewFaceVertices,
                format!("face has {} vertices", boundary.len()),
            ));
        }
        if boundary.iter().any(|&h| poly.half_edge(h).map(|he| he.face) != Some(id)) {
            errors.push(ValidationError::error(
                EntityId::Face(id),
                ErrorCode::DanglingReference,
                "boundary half-edge belongs to another face",
            ));
        }
    }

    let mut outgoing: SecondaryMap<VertexId, usize> = SecondaryMap::new();
    for (_, he) in poly.half_edges() {
        match outgoing.get_mut(he.origin) {
            Some(count) => *count += 1,
            None => {
                outgoing.insert(he.origin, 1);
            }
        }
    }
    for (id, _) in poly.vertices() {
        let fan = poly.vertex_fan(id);
        if fan.len() < 3 || Some(&fan.len()) != outgoing.get(id) {
            errors.push(ValidationError::error(
                EntityId::Vertex(id),
                ErrorCode::NonManifoldVertex,
                format!("vertex fan has {} of {:?} edges", fan.len(), outgoing.get(id)),
            ));
        }
    }
}

/// Geometry: planarity, orientation, convexity.
pub fn check_geometry(
    poly: &Polyhedron,
    config: &ValidationConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationError>,
) {
    let tol = &config.tolerance;
    let fit = tol.plane_fit();
    let convex_fit = tol.convexity_fit();

    for (id, face) in poly.faces() {
        let positions = poly.face_positions(id);

        let worst = positions
            .iter()
            .map(|p| face.plane.point_distance(p).abs())
            .fold(0.0, f64::max);
        if worst > fit {
            errors.push(
                ValidationError::error(EntityId::Face(id), ErrorCode::NonPlanarFace, "vertex off face plane")
                    .measured(worst, fit),
            );
        }

        let normal = newell_normal(&positions);
        if normal.dot(&face.plane.normal) <= 0.0 {
            errors.push(ValidationError::error(
                EntityId::Face(id),
                ErrorCode::FaceNormalMismatch,
                "boundary winds against the face plane",
            ));
        }

        let n = positions.len();
        for i in 0..n {
            let (a, b, c) = (positions[i], positions[(i + 1) % n], positions[(i + 2) % n]);
            let turn = (b - a).cross(&(c - b));
            let scale = (b - a).norm() * (c - b).norm();
            if scale == 0.0 {
                continue;
            }
            let signed = turn.dot(&face.plane.normal) / scale;
            if signed < -tol.almost_zero {
                errors.push(
                    ValidationError::error(EntityId::Face(id), ErrorCode::NonConvexFace, "face turns inward")
                        .measured(signed, tol.almost_zero),
                );
                break;
            }
            if config.warn_collinear && turn.norm() / scale < tol.angle {
                warnings.push(ValidationError::warning(
                    EntityId::Face(id),
                    ErrorCode::CollinearFaceVertices,
                    "three consecutive face vertices are collinear",
                ));
            }
        }

        // Vertices of the face itself are covered by the planarity check.
        let incident: HashSet<VertexId> = poly.face_vertices(id).into_iter().collect();
        for (vertex_id, vertex) in poly.vertices() {
            if incident.contains(&vertex_id) {
                continue;
            }
            let distance = face.plane.point_distance(&vertex.position);
            if distance > convex_fit {
                errors.push(
                    ValidationError::error(
                        EntityId::Vertex(vertex_id),
                        ErrorCode::NonConvexVertex,
                        "vertex in front of a face plane",
                    )
                    .measured(distance, convex_fit),
                );
            }
        }
    }
}

/// Degeneracy: short edges, coincident vertices, volume.
pub fn check_degeneracy(poly: &Polyhedron, config: &ValidationConfig, errors: &mut Vec<ValidationError>) {
    let tol = &config.tolerance;

    for (id, _) in poly.edges() {
        if let Some(v) = poly.edge_vector(id) {
            let length = v.norm();
            if tol.is_short_edge(length) {
                errors.push(
                    ValidationError::error(EntityId::Edge(id), ErrorCode::ZeroLengthEdge, "edge is too short")
                        .measured(length, tol.min_edge_length),
                );
            }
        }
    }

    let vertices: Vec<_> = poly.vertices().collect();
    for (i, (id, a)) in vertices.iter().enumerate() {
        for (_, b) in &vertices[i + 1..] {
            if tol.points_coincident(&a.position, &b.position) {
                errors.push(ValidationError::error(
                    EntityId::Vertex(*id),
                    ErrorCode::DuplicateVertex,
                    "two vertices coincide",
                ));
            }
        }
    }

    let volume = poly.volume();
    if volume <= tol.min_volume {
        errors.push(
            ValidationError::error(EntityId::Solid, ErrorCode::ZeroVolume, "solid has no volume")
                .measured(volume, tol.min_volume),
        );
    }
}
