use std::cell::Cell;

use crate::error::{Result, TopologyError};
use crate::math::{Point3, Vector3};

use super::ids::{EdgeId, PolygonId, Space, VertexId};
use super::winding;

/// A polygon record.
///
/// The polygon is stored as a list of triangles over its own boundary
/// vertices. Its center and normal are derived from vertex positions and
/// cached until a position edit invalidates them.
#[derive(Debug, Clone)]
pub struct Polygon {
    id: PolygonId,
    picking_id: u32,
    triangles: Vec<[VertexId; 3]>,
    vertex_ids: Vec<VertexId>,
    edge_ids: Vec<EdgeId>,
    space: Space,
    creation_time: Option<u64>,
    previous_triangle_time: Option<u64>,
    center: Cell<Option<Point3>>,
    normal: Cell<Option<Vector3>>,
}

impl Polygon {
    /// Creates a polygon from its triangulation and boundary elements.
    #[must_use]
    pub fn new(
        id: PolygonId,
        picking_id: u32,
        triangles: Vec<[VertexId; 3]>,
        vertex_ids: Vec<VertexId>,
        edge_ids: Vec<EdgeId>,
        space: Space,
    ) -> Self {
        Self {
            id,
            picking_id,
            triangles,
            vertex_ids,
            edge_ids,
            space,
            creation_time: None,
            previous_triangle_time: None,
            center: Cell::new(None),
            normal: Cell::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> PolygonId {
        self.id
    }

    #[must_use]
    pub fn picking_id(&self) -> u32 {
        self.picking_id
    }

    #[must_use]
    pub fn triangles(&self) -> &[[VertexId; 3]] {
        &self.triangles
    }

    /// Number of render rows the triangulation occupies (three per triangle).
    ///
    /// This is not the vertex count; see [`Polygon::vertex_count`].
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.triangles.len() * 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_ids.len()
    }

    /// Boundary vertices, in the order they were recorded.
    #[must_use]
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_ids
    }

    /// Boundary vertices in the winding order of the triangulation.
    ///
    /// # Errors
    ///
    /// Returns a topology error if the triangulation does not describe a
    /// single closed boundary.
    pub fn vertex_ids_in_winding_order(&self) -> Result<Vec<VertexId>> {
        winding::boundary_loop(&self.triangles)
    }

    #[must_use]
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_ids
    }

    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    /// Returns a copy of this polygon placed in another space.
    #[must_use]
    pub(crate) fn in_space(&self, space: Space) -> Self {
        let copy = Self {
            space,
            ..self.clone()
        };
        copy.invalidate();
        copy
    }

    /// Replaces the triangulation, keeping the same boundary.
    ///
    /// # Errors
    ///
    /// Returns a topology error unless there are exactly `vertex_count() - 2`
    /// triangles, every triangle uses only this polygon's vertices, and the
    /// triangles close into a boundary over those vertices in their order.
    /// The polygon is left unchanged in that case.
    pub fn set_triangles(&mut self, triangles: Vec<[VertexId; 3]>) -> Result<()> {
        let expected = self.vertex_ids.len().saturating_sub(2);
        if triangles.len() != expected {
            return Err(TopologyError::MalformedTriangulation(format!(
                "{} triangles for {} vertices, expected {expected}",
                triangles.len(),
                self.vertex_ids.len()
            ))
            .into());
        }
        if let Some(stray) = triangles
            .iter()
            .flatten()
            .find(|&&v| !self.vertex_ids.contains(&v))
        {
            return Err(TopologyError::MalformedTriangulation(format!(
                "{stray} is not a vertex of {}",
                self.id
            ))
            .into());
        }
        winding::check_boundary(&triangles, &self.vertex_ids)?;
        self.triangles = triangles;
        self.invalidate();
        Ok(())
    }

    /// Edit time stamp at which this polygon was created.
    #[must_use]
    pub fn creation_time(&self) -> Option<u64> {
        self.creation_time
    }

    pub fn set_creation_time(&mut self, time: u64) {
        self.creation_time = Some(time);
    }

    /// Edit time stamp of the previous triangulation change.
    #[must_use]
    pub fn previous_triangle_time(&self) -> Option<u64> {
        self.previous_triangle_time
    }

    pub fn set_previous_triangle_time(&mut self, time: Option<u64>) {
        self.previous_triangle_time = time;
    }

    pub(crate) fn cached_center(&self) -> Option<Point3> {
        self.center.get()
    }

    pub(crate) fn cache_center(&self, center: Point3) {
        self.center.set(Some(center));
    }

    pub(crate) fn cached_normal(&self) -> Option<Vector3> {
        self.normal.get()
    }

    pub(crate) fn cache_normal(&self, normal: Vector3) {
        self.normal.set(Some(normal));
    }

    /// Drops the cached center and normal.
    pub(crate) fn invalidate(&self) {
        self.center.set(None);
        self.normal.set(None);
    }
}
