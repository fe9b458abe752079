use super::ids::{EdgeId, PolygonId, Space, VertexId};

/// An edge record: one side of one polygon, directed in winding order.
#[derive(Debug, Clone)]
pub struct Edge {
    id: EdgeId,
    picking_id: u32,
    vertex_ids: [VertexId; 2],
    polygon_id: PolygonId,
    space: Space,
}

impl Edge {
    /// Creates an edge running from `start` to `end`.
    #[must_use]
    pub fn new(
        id: EdgeId,
        picking_id: u32,
        start: VertexId,
        end: VertexId,
        polygon_id: PolygonId,
        space: Space,
    ) -> Self {
        Self {
            id,
            picking_id,
            vertex_ids: [start, end],
            polygon_id,
            space,
        }
    }

    #[must_use]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    #[must_use]
    pub fn picking_id(&self) -> u32 {
        self.picking_id
    }

    /// Start vertex of the edge.
    #[must_use]
    pub fn start(&self) -> VertexId {
        self.vertex_ids[0]
    }

    /// End vertex of the edge.
    #[must_use]
    pub fn end(&self) -> VertexId {
        self.vertex_ids[1]
    }

    #[must_use]
    pub fn vertex_ids(&self) -> [VertexId; 2] {
        self.vertex_ids
    }

    #[must_use]
    pub fn polygon_id(&self) -> PolygonId {
        self.polygon_id
    }

    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    /// Returns a copy of this edge placed in another space.
    #[must_use]
    pub(crate) fn in_space(&self, space: Space) -> Self {
        Self {
            space,
            ..self.clone()
        }
    }
}
