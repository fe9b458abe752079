use crate::math::{Point2, Point3};

use super::ids::{EdgeId, PolygonId, Space, VertexId};

/// A vertex record: one polygon corner in one topological space.
///
/// Vertices are never shared between polygons. Corners that coincide are
/// related through merge groups instead.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    picking_id: u32,
    pos: Point3,
    edge_ids: Vec<EdgeId>,
    polygon_id: PolygonId,
    uvs: Vec<Point2>,
    row_index: usize,
    space: Space,
}

impl Vertex {
    /// Creates a vertex at `pos` belonging to `polygon_id`.
    #[must_use]
    pub fn new(id: VertexId, picking_id: u32, pos: Point3, polygon_id: PolygonId, space: Space) -> Self {
        Self {
            id,
            picking_id,
            pos,
            edge_ids: Vec::new(),
            polygon_id,
            uvs: Vec::new(),
            row_index: 0,
            space,
        }
    }

    /// Sets the edges this vertex is an endpoint of.
    #[must_use]
    pub fn with_edges(mut self, edge_ids: Vec<EdgeId>) -> Self {
        self.edge_ids = edge_ids;
        self
    }

    /// Sets the UV coordinates, indexed by UV channel.
    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<Point2>) -> Self {
        self.uvs = uvs;
        self
    }

    #[must_use]
    pub fn id(&self) -> VertexId {
        self.id
    }

    #[must_use]
    pub fn picking_id(&self) -> u32 {
        self.picking_id
    }

    /// Position in this vertex's space. UV vertices carry `(u, 0, v)`.
    #[must_use]
    pub fn pos(&self) -> Point3 {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: Point3) {
        self.pos = pos;
    }

    #[must_use]
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_ids
    }

    /// The polygon this vertex is a corner of.
    #[must_use]
    pub fn polygon_id(&self) -> PolygonId {
        self.polygon_id
    }

    /// UV coordinate for `channel`, if the vertex has one.
    #[must_use]
    pub fn uv(&self, channel: usize) -> Option<Point2> {
        self.uvs.get(channel).copied()
    }

    #[must_use]
    pub fn uvs(&self) -> &[Point2] {
        &self.uvs
    }

    /// Sets the UV coordinate of `channel`, padding missing channels with the origin.
    pub(crate) fn set_uv(&mut self, channel: usize, uv: Point2) {
        if self.uvs.len() <= channel {
            self.uvs.resize(channel + 1, Point2::origin());
        }
        self.uvs[channel] = uv;
    }

    /// Row of this vertex in the render buffer of its space.
    #[must_use]
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub(crate) fn set_row_index(&mut self, row_index: usize) {
        self.row_index = row_index;
    }

    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    /// Returns a copy of this vertex placed in another space.
    #[must_use]
    pub(crate) fn in_space(&self, space: Space) -> Self {
        Self {
            space,
            ..self.clone()
        }
    }
}
