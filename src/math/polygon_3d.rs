use crate::error::{GeometryError, Result};

use super::{Point2, Point3, Vector3, TOLERANCE};

/// Newell normal of a closed polygon, scaled by twice its area.
///
/// Robust for non-convex and slightly non-planar polygons.
#[must_use]
pub fn newell_normal(polygon: &[Point3]) -> Vector3 {
    let n = polygon.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Orthonormal in-plane axes `(u, v)` for a plane with the given normal,
/// chosen so that `u × v` points along `normal`.
///
/// # Errors
///
/// Returns `GeometryError::ZeroVector` if `normal` has zero length.
pub fn plane_axes(normal: &Vector3) -> Result<(Vector3, Vector3)> {
    let len = normal.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    let n = normal / len;
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = helper.cross(&n).normalize();
    let v = n.cross(&u);
    Ok((u, v))
}

/// Projects `points` onto the plane through `origin` spanned by `u` and `v`.
#[must_use]
pub fn project_to_plane(points: &[Point3], origin: &Point3, u: &Vector3, v: &Vector3) -> Vec<Point2> {
    points
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(u), d.dot(v))
        })
        .collect()
}

/// Signed area of a 2D polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns `true` if a counter-clockwise 2D polygon is strictly convex.
#[must_use]
pub fn is_convex_ccw(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        cross_2d(b.x - a.x, b.y - a.y, c.x - b.x, c.y - b.y) > TOLERANCE
    })
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn q(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    // ── newell_normal ──

    #[test]
    fn ccw_square_normal_points_up() {
        let square = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        let n = newell_normal(&square);
        assert_relative_eq!(n, Vector3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn collinear_points_have_zero_normal() {
        let line = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert_relative_eq!(newell_normal(&line).norm(), 0.0);
    }

    // ── plane_axes ──

    #[test]
    fn axes_are_right_handed() {
        let normal = Vector3::new(1.0, 2.0, -0.5);
        let (u, v) = plane_axes(&normal).unwrap();
        assert_relative_eq!(u.dot(&v), 0.0, epsilon = 1e-12);
        assert_relative_eq!(u.cross(&v), normal.normalize(), epsilon = 1e-12);
    }

    #[test]
    fn zero_normal_fails() {
        assert!(plane_axes(&Vector3::zeros()).is_err());
    }

    // ── signed_area_2d / is_convex_ccw ──

    #[test]
    fn signed_area_follows_orientation() {
        let ccw = [q(0.0, 0.0), q(2.0, 0.0), q(2.0, 2.0), q(0.0, 2.0)];
        assert_relative_eq!(signed_area_2d(&ccw), 4.0);
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert_relative_eq!(signed_area_2d(&cw), -4.0);
    }

    #[test]
    fn l_shape_is_not_convex() {
        let l = [
            q(0.0, 0.0),
            q(2.0, 0.0),
            q(2.0, 1.0),
            q(1.0, 1.0),
            q(1.0, 2.0),
            q(0.0, 2.0),
        ];
        assert!(!is_convex_ccw(&l));
        assert!(is_convex_ccw(&[q(0.0, 0.0), q(1.0, 0.0), q(0.0, 1.0)]));
    }
}
