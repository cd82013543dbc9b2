//! Building and editing polyhedra: clipping by half-spaces, construction
//! from plane sets and point clouds, repair of near-degenerate results and
//! vertex moves.

pub mod clip;
pub mod halfspace;
pub mod heal;
pub mod hull;
pub mod vertex_move;
