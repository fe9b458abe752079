use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::debug;

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::polygon_3d::{is_convex_ccw, newell_normal, plane_axes, project_to_plane, signed_area_2d};
use crate::math::{Point2, Point3};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Fan triangulation of an `n`-gon around its first corner.
#[must_use]
pub fn fan_triangulation(n: usize) -> Vec<[usize; 3]> {
    (1..n.saturating_sub(1)).map(|i| [0, i, i + 1]).collect()
}

/// Triangulates a simple, possibly non-convex polygon given by its corners.
///
/// Returns `n - 2` triangles of corner indices, wound the same way as the
/// corner order. Convex polygons get a fan; anything else goes through a
/// constrained Delaunay triangulation in the polygon's plane.
///
/// # Errors
///
/// Returns an error if the polygon has fewer than three corners, has no
/// well-defined plane, repeats a corner, or intersects itself.
pub fn triangulate_polygon(corners: &[Point3]) -> Result<Vec<[usize; 3]>> {
    let n = corners.len();
    if n < 3 {
        return Err(TopologyError::InvalidPolygon(format!("{n} corners, need at least 3")).into());
    }

    let normal = newell_normal(corners);
    let (u, v) = plane_axes(&normal)
        .map_err(|_| GeometryError::Degenerate("polygon has zero area".into()))?;
    let projected = project_to_plane(corners, &corners[0], &u, &v);

    if signed_area_2d(&projected) <= 0.0 {
        return Err(GeometryError::Degenerate("polygon has no consistent orientation".into()).into());
    }

    if is_convex_ccw(&projected) {
        return Ok(fan_triangulation(n));
    }

    let triangles = constrained_triangulation(&projected)?;
    debug!(corners = n, triangles = triangles.len(), "triangulated non-convex polygon");
    if triangles.len() != n - 2 {
        return Err(TopologyError::MalformedTriangulation(format!(
            "expected {} triangles, got {}",
            n - 2,
            triangles.len()
        ))
        .into());
    }
    Ok(triangles)
}

/// Runs a CDT over a counter-clockwise loop and keeps the interior faces.
fn constrained_triangulation(points: &[Point2]) -> Result<Vec<[usize; 3]>> {
    let mut cdt = Cdt::new();
    let mut handles = Vec::with_capacity(points.len());
    let mut corner_of: HashMap<usize, usize> = HashMap::with_capacity(points.len());

    for (corner, p) in points.iter().enumerate() {
        let handle = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| GeometryError::Degenerate(format!("CDT insert: {e}")))?;
        if corner_of.insert(handle.index(), corner).is_some() {
            return Err(TopologyError::InvalidPolygon(format!("corner {corner} repeats an earlier corner")).into());
        }
        handles.push(handle);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if !cdt.can_add_constraint(from, to) {
            return Err(TopologyError::InvalidPolygon("polygon boundary intersects itself".into()).into());
        }
        cdt.add_constraint(from, to);
    }

    let interior = interior_faces(&cdt);
    let mut triangles = Vec::with_capacity(points.len() - 2);
    for face in cdt.inner_faces() {
        if !interior.contains(&face.fix().index()) {
            continue;
        }
        let mut tri = [0usize; 3];
        for (slot, vertex) in face.vertices().iter().enumerate() {
            tri[slot] = *corner_of
                .get(&vertex.fix().index())
                .ok_or_else(|| TopologyError::MalformedTriangulation("CDT added a vertex".into()))?;
        }
        triangles.push(tri);
    }
    Ok(triangles)
}

/// Flood-fills from the hull inwards, flipping parity at every constraint
/// edge; faces at odd depth are inside the boundary loop.
fn interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();
    let outer = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth.contains_key(&idx) {
                continue;
            }
            let d = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth.insert(idx, d);
            queue.push_back((inner.fix(), d));
        }
    }

    while let Some((face, d)) = queue.pop_front() {
        if d % 2 == 1 {
            interior.insert(face.index());
        }
        for edge in cdt.face(face).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let idx = neighbor.fix().index();
            if depth.contains_key(&idx) {
                continue;
            }
            let nd = d + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth.insert(idx, nd);
            queue.push_back((neighbor.fix(), nd));
        }
    }

    interior
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    /// Signed area of triangle `t` in the XY plane.
    fn area(corners: &[Point3], t: [usize; 3]) -> f64 {
        let (a, b, c) = (corners[t[0]], corners[t[1]], corners[t[2]]);
        ((b - a).cross(&(c - a))).z * 0.5
    }

    #[test]
    fn convex_polygon_gets_a_fan() {
        let square = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert_eq!(triangulate_polygon(&square).unwrap(), vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn l_shape_is_covered_with_consistent_winding() {
        let l = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        let tris = triangulate_polygon(&l).unwrap();
        assert_eq!(tris.len(), 4);
        let total: f64 = tris.iter().map(|&t| area(&l, t)).sum();
        assert!((total - 3.0).abs() < 1e-9);
        assert!(tris.iter().all(|&t| area(&l, t) > 0.0));
    }

    #[test]
    fn clockwise_input_keeps_its_winding() {
        let l: Vec<Point3> = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ]
        .into_iter()
        .rev()
        .collect();
        let tris = triangulate_polygon(&l).unwrap();
        assert!(tris.iter().all(|&t| area(&l, t) < 0.0));
    }

    #[test]
    fn too_few_corners_fail() {
        assert!(triangulate_polygon(&[p(0.0, 0.0), p(1.0, 0.0)]).is_err());
    }

    #[test]
    fn collinear_corners_fail() {
        assert!(triangulate_polygon(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]).is_err());
    }

    #[test]
    fn fan_sizes() {
        assert!(fan_triangulation(2).is_empty());
        assert_eq!(fan_triangulation(5).len(), 3);
    }
}
