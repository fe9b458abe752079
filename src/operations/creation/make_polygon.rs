use crate::error::{Result, TopologyError};
use crate::geom::GeomData;
use crate::math::{Point2, Point3};
use crate::tessellation::triangulate_polygon;
use crate::topology::winding::check_boundary;
use crate::topology::{
    Category, Edge, EdgeId, ElementKey, Polygon, PolygonId, Vertex, VertexId,
};

/// One polygon corner: a position and its UV coordinates per channel.
#[derive(Debug, Clone)]
pub struct Corner {
    /// The 3D position of the corner.
    pub position: Point3,
    /// UV coordinates, indexed by UV channel.
    pub uvs: Vec<Point2>,
}

impl Corner {
    /// Creates a corner without UV coordinates.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            uvs: Vec::new(),
        }
    }

    /// Appends a UV coordinate for the next channel.
    #[must_use]
    pub fn with_uv(mut self, uv: Point2) -> Self {
        self.uvs.push(uv);
        self
    }
}

/// Creates a polygon in a geometry object from its corners.
///
/// Each corner becomes its own vertex record and each pair of consecutive
/// corners its own edge, directed in corner order. Coincidence with other
/// polygons is recorded in the object's merge groups.
pub struct MakePolygon {
    corners: Vec<Corner>,
    triangles: Option<Vec<[usize; 3]>>,
    creation_time: Option<u64>,
}

impl MakePolygon {
    /// Creates a new `MakePolygon` operation.
    #[must_use]
    pub fn new(corners: Vec<Corner>) -> Self {
        Self {
            corners,
            triangles: None,
            creation_time: None,
        }
    }

    /// Uses the given triangulation (corner indices) instead of computing one.
    #[must_use]
    pub fn with_triangles(mut self, triangles: Vec<[usize; 3]>) -> Self {
        self.triangles = Some(triangles);
        self
    }

    /// Stamps the polygon with an edit time.
    #[must_use]
    pub fn with_creation_time(mut self, time: u64) -> Self {
        self.creation_time = Some(time);
        self
    }

    /// Executes the operation, creating the polygon in the geometry object.
    ///
    /// # Errors
    ///
    /// Returns a topology error if the corners or triangles do not describe
    /// a simple polygon, or an identity error if picking IDs run out. The
    /// geometry object is unchanged on error.
    pub fn execute(&self, geom: &mut GeomData) -> Result<PolygonId> {
        let n = self.corners.len();
        if n < 3 {
            return Err(TopologyError::InvalidPolygon(format!("{n} corners, need at least 3")).into());
        }

        let triangles = match &self.triangles {
            Some(triangles) => triangles.clone(),
            None => {
                let positions: Vec<Point3> = self.corners.iter().map(|c| c.position).collect();
                triangulate_polygon(&positions)?
            }
        };
        validate_triangles(&triangles, n)?;

        let picking_ids = allocate_picking_ids(geom, n)?;
        let space = geom.space();
        let registry = geom.registry_mut();
        let polygon_id: PolygonId = registry.next_element_id();
        let vertex_ids: Vec<VertexId> = (0..n).map(|_| registry.next_element_id()).collect();
        let edge_ids: Vec<EdgeId> = (0..n).map(|_| registry.next_element_id()).collect();

        let vertices = self
            .corners
            .iter()
            .enumerate()
            .map(|(i, corner)| {
                Vertex::new(vertex_ids[i], picking_ids.vertices[i], corner.position, polygon_id, space)
                    .with_edges(vec![edge_ids[(i + n - 1) % n], edge_ids[i]])
                    .with_uvs(corner.uvs.clone())
            })
            .collect();

        let edges = (0..n)
            .map(|i| {
                Edge::new(
                    edge_ids[i],
                    picking_ids.edges[i],
                    vertex_ids[i],
                    vertex_ids[(i + 1) % n],
                    polygon_id,
                    space,
                )
            })
            .collect();

        let tri_vertex_ids = triangles
            .iter()
            .map(|t| t.map(|corner| vertex_ids[corner]))
            .collect();
        let mut polygon = Polygon::new(
            polygon_id,
            picking_ids.polygon,
            tri_vertex_ids,
            vertex_ids,
            edge_ids,
            space,
        );
        if let Some(time) = self.creation_time {
            polygon.set_creation_time(time);
        }

        geom.insert_polygon(vertices, edges, polygon)
    }
}

/// Checks that corner-index triangles tile an `n`-gon along its corner order.
fn validate_triangles(triangles: &[[usize; 3]], n: usize) -> Result<()> {
    if triangles.len() != n - 2 {
        return Err(TopologyError::MalformedTriangulation(format!(
            "{} triangles for {n} corners, expected {}",
            triangles.len(),
            n - 2
        ))
        .into());
    }
    if let Some(bad) = triangles.iter().flatten().find(|&&corner| corner >= n) {
        return Err(TopologyError::MalformedTriangulation(format!(
            "corner index {bad} out of range for {n} corners"
        ))
        .into());
    }
    let as_ids = |i: usize| VertexId::from_raw(i as u64);
    let probe: Vec<[VertexId; 3]> = triangles.iter().map(|t| t.map(as_ids)).collect();
    let order: Vec<VertexId> = (0..n).map(as_ids).collect();
    check_boundary(&probe, &order)
}

struct PickingIds {
    vertices: Vec<u32>,
    edges: Vec<u32>,
    polygon: u32,
}

/// Allocates every picking ID the polygon needs, or none of them.
fn allocate_picking_ids(geom: &mut GeomData, n: usize) -> Result<PickingIds> {
    let registry = geom.registry_mut();
    let vertices = registry.next_picking_ids(Category::Vertex, n)?;
    let edges = match registry.next_picking_ids(Category::Edge, n) {
        Ok(ids) => ids,
        Err(err) => {
            for id in vertices {
                registry.release_picking_id(Category::Vertex, id);
            }
            return Err(err);
        }
    };
    let polygon = match registry.next_picking_id(Category::Polygon) {
        Ok(id) => id,
        Err(err) => {
            for id in vertices {
                registry.release_picking_id(Category::Vertex, id);
            }
            for id in edges {
                registry.release_picking_id(Category::Edge, id);
            }
            return Err(err);
        }
    };
    Ok(PickingIds {
        vertices,
        edges,
        polygon,
    })
}
