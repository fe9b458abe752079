//! Boundary reconstruction from a polygon's triangulation.
//!
//! Every triangle contributes its three sides, directed along its winding.
//! A side shared by two triangles is an internal diagonal and shows up once
//! in each direction, so the two occurrences cancel. The sides that survive
//! form the boundary, still directed along the polygon's winding, and are
//! chained from endpoint to endpoint.

use std::collections::HashMap;

use crate::error::{Result, TopologyError};

use super::ids::VertexId;

/// Returns the boundary vertices of a triangulated polygon in winding order.
///
/// The loop starts at the first vertex of the first triangle that lies on the
/// boundary, which keeps the result deterministic for a given triangle list.
///
/// # Errors
///
/// Returns `TopologyError::MalformedTriangulation` if the triangle list is
/// empty, holds a degenerate triangle, or repeats a directed side (mixed
/// winding). Returns `TopologyError::WindingNotClosed` if the surviving sides
/// do not chain into exactly one closed loop.
pub fn boundary_loop(triangles: &[[VertexId; 3]]) -> Result<Vec<VertexId>> {
    if triangles.is_empty() {
        return Err(TopologyError::MalformedTriangulation("no triangles".into()).into());
    }

    let mut sides: HashMap<VertexId, Vec<VertexId>> = HashMap::with_capacity(triangles.len() * 3);
    let mut remaining = 0usize;

    for tri in triangles {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
            return Err(TopologyError::MalformedTriangulation(format!(
                "degenerate triangle ({}, {}, {})",
                tri[0], tri[1], tri[2]
            ))
            .into());
        }

        for i in 0..3 {
            let from = tri[i];
            let to = tri[(i + 1) % 3];

            if let Some(reverse) = sides.get_mut(&to) {
                if let Some(pos) = reverse.iter().position(|&v| v == from) {
                    reverse.remove(pos);
                    remaining -= 1;
                    continue;
                }
            }

            let outgoing = sides.entry(from).or_default();
            if outgoing.contains(&to) {
                return Err(TopologyError::MalformedTriangulation(format!(
                    "side {from} -> {to} appears twice with the same direction"
                ))
                .into());
            }
            outgoing.push(to);
            remaining += 1;
        }
    }

    let start = triangles
        .iter()
        .flatten()
        .copied()
        .find(|v| sides.get(v).is_some_and(|out| !out.is_empty()))
        .ok_or_else(|| TopologyError::MalformedTriangulation("every side cancels out".into()))?;

    let mut loop_ids = Vec::with_capacity(remaining);
    let mut current = start;

    while remaining > 0 {
        let next = match sides.get_mut(&current) {
            Some(out) if !out.is_empty() => out.remove(0),
            _ => return Err(TopologyError::WindingNotClosed.into()),
        };
        loop_ids.push(current);
        remaining -= 1;
        current = next;

        // Back at the start with sides left over: more than one loop.
        if current == start && remaining > 0 {
            return Err(TopologyError::WindingNotClosed.into());
        }
    }

    if current != start {
        return Err(TopologyError::WindingNotClosed.into());
    }

    Ok(loop_ids)
}

/// Checks that `triangles` close into a boundary that is a rotation of `expected`.
///
/// # Errors
///
/// Returns a topology error if the boundary cannot be reconstructed or
/// differs from `expected` in membership, order or direction.
pub fn check_boundary(triangles: &[[VertexId; 3]], expected: &[VertexId]) -> Result<()> {
    let found = boundary_loop(triangles)?;
    if is_rotation_of(&found, expected) {
        Ok(())
    } else {
        Err(TopologyError::MalformedTriangulation(format!(
            "triangles bound {} vertices that do not follow the polygon's {} corners",
            found.len(),
            expected.len()
        ))
        .into())
    }
}

/// Returns `true` if `a` is a cyclic rotation of `b` (same direction).
#[must_use]
pub fn is_rotation_of(a: &[VertexId], b: &[VertexId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let Some(first) = b.first() else {
        return true;
    };
    let Some(offset) = a.iter().position(|v| v == first) else {
        return false;
    };
    let n = a.len();
    (0..n).all(|i| a[(offset + i) % n] == b[i])
}
