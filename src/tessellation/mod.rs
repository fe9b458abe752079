mod triangulate_polygon;

pub use triangulate_polygon::{fan_triangulation, triangulate_polygon};
