pub mod polygon_3d;

/// 2D point type, used for UV coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Tolerance for degeneracy checks on derived geometry (normals, areas).
///
/// Coincidence of stored positions is always exact and never uses this.
pub const TOLERANCE: f64 = 1e-10;

/// Embeds a UV coordinate into the planar UV space (`u` along X, `v` along Z).
#[must_use]
pub fn uv_to_point(uv: &Point2) -> Point3 {
    Point3::new(uv.x, 0.0, uv.y)
}

/// Recovers the UV coordinate of a point embedded with [`uv_to_point`].
#[must_use]
pub fn point_to_uv(point: &Point3) -> Point2 {
    Point2::new(point.x, point.z)
}
