use tracing::{debug, instrument};

use crate::error::{KernelError, KernelResult};
use crate::geometry::vector::correct_point;
use crate::topology::builder::PolygonSoup;
use crate::topology::polyhedron::Polyhedron;
use crate::Tolerance;

impl Polyhedron {
    /// Snap every vertex coordinate within `tolerance.correct` of an integer to it.
    pub fn correct_vertex_positions(&mut self, tolerance: &Tolerance) {
        for vertex in self.vertices.values_mut() {
            vertex.position = correct_point(&vertex.position, tolerance.correct);
        }
        self.update_bounds();
    }

    /// Collapse edges shorter than `tolerance.min_edge_length`.
    ///
    /// The first vertex of a short edge absorbs the second; faces that shrink
    /// below three vertices disappear and vertices left between only two
    /// faces are removed. Fails if the result is no longer a closed solid,
    /// in which case `self` is unchanged.
    #[instrument(skip_all)]
    pub fn heal(&mut self, tolerance: &Tolerance) -> KernelResult<()> {
        let mut soup = PolygonSoup::from_polyhedron(self);
        let collapsed = collapse_short_edges(&mut soup, tolerance.min_edge_length);
        if collapsed == 0 {
            return Ok(());
        }
        soup.remove_degree_two_vertices();

        if soup.find_short_edge(tolerance.min_edge_length).is_some() {
            return Err(KernelError::degenerate("short edges remain after healing"));
        }
        if soup.loops.len() < 4 {
            return Err(KernelError::degenerate(format!(
                "{} faces remain after healing",
                soup.loops.len()
            )));
        }
        let (healed, _) = soup
            .assemble()
            .map_err(|e| KernelError::degenerate(format!("healing broke the solid: {e}")))?;

        debug!(
            collapsed,
            vertices = healed.vertex_count(),
            faces = healed.face_count(),
            "healed short edges"
        );
        *self = healed;
        Ok(())
    }
}

/// Collapse short edges until none is left; returns the number collapsed.
fn collapse_short_edges(soup: &mut PolygonSoup, min_length: f64) -> usize {
    let mut collapsed = 0;
    for _ in 0..soup.positions.len() {
        let Some((keep, remove)) = soup.find_short_edge(min_length) else {
            break;
        };
        soup.collapse_vertex(remove, keep);
        collapsed += 1;
    }
    collapsed
}
