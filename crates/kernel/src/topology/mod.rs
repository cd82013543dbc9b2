pub mod builder;
pub mod polyhedron;
pub mod primitives;

pub use builder::{FaceLoop, PolygonSoup};
pub use polyhedron::{Edge, EdgeId, Face, FaceId, HalfEdge, HalfEdgeId, Polyhedron, Vertex, VertexId};
