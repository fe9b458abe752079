pub mod category;
pub mod edge;
pub mod ids;
pub mod picking;
pub mod polygon;
pub mod vertex;
pub mod winding;

pub use category::{Category, PerCategory};
pub use edge::Edge;
pub use ids::{EdgeId, ElementKey, ObjectId, PolygonId, Space, VertexId};
pub use picking::PickingColor;
pub use polygon::Polygon;
pub use vertex::Vertex;

use std::collections::{HashMap, HashSet};

use crate::error::LookupError;
use crate::math::{Point3, Vector3};

/// Records of one kind, keyed by ID, iterated in insertion order.
///
/// Render rows are assigned by walking the store, so two walks over the same
/// store must visit records in the same order. Removal leaves a vacant slot
/// in the order list; the list is compacted once half of it is vacant.
#[derive(Debug, Clone)]
pub struct ElementMap<K, T> {
    records: HashMap<K, (usize, T)>,
    order: Vec<Option<K>>,
    vacant: usize,
}

impl<K: ElementKey, T> ElementMap<K, T> {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            vacant: 0,
        }
    }

    fn insert(&mut self, id: K, record: T) {
        if let Some(entry) = self.records.get_mut(&id) {
            entry.1 = record;
            return;
        }
        self.records.insert(id, (self.order.len(), record));
        self.order.push(Some(id));
    }

    fn remove(&mut self, id: K) -> Option<T> {
        let (slot, record) = self.records.remove(&id)?;
        if let Some(entry) = self.order.get_mut(slot) {
            *entry = None;
            self.vacant += 1;
        }
        if self.vacant * 2 > self.order.len() {
            self.compact();
        }
        Some(record)
    }

    fn compact(&mut self) {
        self.order.retain(Option::is_some);
        self.vacant = 0;
        for (slot, id) in self.order.iter().flatten().enumerate() {
            if let Some(entry) = self.records.get_mut(id) {
                entry.0 = slot;
            }
        }
    }

    /// Returns the record for `id`, if present.
    #[must_use]
    pub fn get(&self, id: K) -> Option<&T> {
        self.records.get(&id).map(|(_, record)| record)
    }

    fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.records.get_mut(&id).map(|(_, record)| record)
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.records.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// IDs in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().flatten().copied()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order
            .iter()
            .flatten()
            .filter_map(|id| self.records.get(id).map(|(_, record)| record))
    }
}

/// The subobject records of one topological space.
///
/// Holds vertices, edges and polygons of either a 3D geometry object or one
/// of its UV projections, plus the reverse picking-ID lookup for each
/// category.
#[derive(Debug, Clone)]
pub struct SubobjectStore {
    space: Space,
    vertices: ElementMap<VertexId, Vertex>,
    edges: ElementMap<EdgeId, Edge>,
    polygons: ElementMap<PolygonId, Polygon>,
    picking: PerCategory<HashMap<u32, u64>>,
}

impl SubobjectStore {
    /// Creates an empty store for the given space.
    #[must_use]
    pub fn new(space: Space) -> Self {
        Self {
            space,
            vertices: ElementMap::new(),
            edges: ElementMap::new(),
            polygons: ElementMap::new(),
            picking: PerCategory::default(),
        }
    }

    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    /// Copies every record into a new store for `space`, keeping IDs, order
    /// and render rows.
    #[must_use]
    pub fn clone_into_space(&self, space: Space) -> Self {
        let mut copy = Self::new(space);
        for vertex in self.vertices.iter() {
            copy.add_vertex(vertex.in_space(space));
        }
        for edge in self.edges.iter() {
            copy.add_edge(edge.in_space(space));
        }
        for polygon in self.polygons.iter() {
            copy.add_polygon(polygon.in_space(space));
        }
        copy
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = vertex.id();
        self.picking[Category::Vertex].insert(vertex.picking_id(), id.raw());
        self.vertices.insert(id, vertex);
        id
    }

    /// Returns the vertex record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, LookupError> {
        self.vertices.get(id).ok_or_else(|| LookupError::missing(id))
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex, LookupError> {
        self.vertices.get_mut(id).ok_or_else(|| LookupError::missing(id))
    }

    /// Removes a vertex from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not in the store.
    pub(crate) fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, LookupError> {
        let vertex = self.vertices.remove(id).ok_or_else(|| LookupError::missing(id))?;
        self.picking[Category::Vertex].remove(&vertex.picking_id());
        Ok(vertex)
    }

    #[must_use]
    pub fn vertices(&self) -> &ElementMap<VertexId, Vertex> {
        &self.vertices
    }

    /// Moves a vertex, dropping the cached center and normal of its polygon.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not in the store.
    pub(crate) fn set_vertex_pos(&mut self, id: VertexId, pos: Point3) -> Result<(), LookupError> {
        let vertex = self.vertex_mut(id)?;
        vertex.set_pos(pos);
        let polygon_id = vertex.polygon_id();
        if let Some(polygon) = self.polygons.get(polygon_id) {
            polygon.invalidate();
        }
        Ok(())
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = edge.id();
        self.picking[Category::Edge].insert(edge.picking_id(), id.raw());
        self.edges.insert(id, edge);
        id
    }

    /// Returns the edge record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, LookupError> {
        self.edges.get(id).ok_or_else(|| LookupError::missing(id))
    }

    /// Removes an edge from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the store.
    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, LookupError> {
        let edge = self.edges.remove(id).ok_or_else(|| LookupError::missing(id))?;
        self.picking[Category::Edge].remove(&edge.picking_id());
        Ok(edge)
    }

    #[must_use]
    pub fn edges(&self) -> &ElementMap<EdgeId, Edge> {
        &self.edges
    }

    /// Render rows of an edge's start and end vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or one of its vertices is not in the store.
    pub fn edge_rows(&self, id: EdgeId) -> Result<[usize; 2], LookupError> {
        let [start, end] = self.edge(id)?.vertex_ids();
        Ok([self.vertex(start)?.row_index(), self.vertex(end)?.row_index()])
    }

    // --- Polygon operations ---

    /// Inserts a polygon and returns its ID.
    pub fn add_polygon(&mut self, polygon: Polygon) -> PolygonId {
        let id = polygon.id();
        self.picking[Category::Polygon].insert(polygon.picking_id(), id.raw());
        self.polygons.insert(id, polygon);
        id
    }

    /// Returns the polygon record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is not in the store.
    pub fn polygon(&self, id: PolygonId) -> Result<&Polygon, LookupError> {
        self.polygons.get(id).ok_or_else(|| LookupError::missing(id))
    }

    pub(crate) fn polygon_mut(&mut self, id: PolygonId) -> Result<&mut Polygon, LookupError> {
        self.polygons.get_mut(id).ok_or_else(|| LookupError::missing(id))
    }

    /// Removes a polygon record. Its vertices and edges are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is not in the store.
    pub(crate) fn remove_polygon(&mut self, id: PolygonId) -> Result<Polygon, LookupError> {
        let polygon = self.polygons.remove(id).ok_or_else(|| LookupError::missing(id))?;
        self.picking[Category::Polygon].remove(&polygon.picking_id());
        Ok(polygon)
    }

    #[must_use]
    pub fn polygons(&self) -> &ElementMap<PolygonId, Polygon> {
        &self.polygons
    }

    /// Positions of a polygon's boundary vertices, in recorded order.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon or one of its vertices is not in the store.
    pub fn polygon_positions(&self, id: PolygonId) -> Result<Vec<Point3>, LookupError> {
        self.polygon(id)?
            .vertex_ids()
            .iter()
            .map(|&v| self.vertex(v).map(Vertex::pos))
            .collect()
    }

    /// Center of a polygon (mean of its boundary vertices), computed on demand.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon or one of its vertices is not in the store.
    pub fn polygon_center(&self, id: PolygonId) -> Result<Point3, LookupError> {
        let polygon = self.polygon(id)?;
        if let Some(center) = polygon.cached_center() {
            return Ok(center);
        }
        let positions = self.polygon_positions(id)?;
        let sum = positions.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        #[allow(clippy::cast_precision_loss)]
        let center = Point3::from(sum / positions.len().max(1) as f64);
        polygon.cache_center(center);
        Ok(center)
    }

    /// Unnormalized normal of one triangle of a polygon.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon, the triangle or one of its vertices is
    /// not found.
    pub fn triangle_normal(&self, id: PolygonId, triangle: usize) -> Result<Vector3, LookupError> {
        let tri = self
            .polygon(id)?
            .triangles()
            .get(triangle)
            .copied()
            .ok_or_else(|| LookupError::missing(id))?;
        let p1 = self.vertex(tri[0])?.pos();
        let p2 = self.vertex(tri[1])?.pos();
        let p3 = self.vertex(tri[2])?.pos();
        Ok((p2 - p1).cross(&(p3 - p2)))
    }

    /// Face normal of a polygon: the mean of its triangle normals, computed on demand.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon or one of its vertices is not in the store.
    pub fn polygon_normal(&self, id: PolygonId) -> Result<Vector3, LookupError> {
        let polygon = self.polygon(id)?;
        if let Some(normal) = polygon.cached_normal() {
            return Ok(normal);
        }
        let count = polygon.triangles().len();
        let mut sum = Vector3::zeros();
        for i in 0..count {
            sum += self.triangle_normal(id, i)?;
        }
        #[allow(clippy::cast_precision_loss)]
        let normal = sum / count.max(1) as f64;
        polygon.cache_normal(normal);
        Ok(normal)
    }

    // --- Picking ---

    /// Returns the raw ID of the live element with `picking_id` in `category`.
    #[must_use]
    pub fn element_by_picking_id(&self, category: Category, picking_id: u32) -> Option<u64> {
        self.picking[category].get(&picking_id).copied()
    }

    /// Resolves a picked color back to a typed element ID.
    #[must_use]
    pub fn picked<K: ElementKey>(&self, color: PickingColor) -> Option<K> {
        let (picking_id, category) = color.decode()?;
        if category != K::CATEGORY {
            return None;
        }
        self.element_by_picking_id(category, picking_id).map(K::from_raw)
    }

    // --- Render layout ---

    /// Assigns render rows to every vertex and returns the total row count.
    ///
    /// Polygons are walked in insertion order; within a polygon, vertices are
    /// numbered in order of first appearance in its triangles, and each
    /// polygon's block starts after the previous polygon's vertices.
    pub fn assign_row_indices(&mut self) -> usize {
        let mut offset = 0;
        for polygon_id in self.polygons.ids().collect::<Vec<_>>() {
            let Some(polygon) = self.polygons.get(polygon_id) else {
                continue;
            };
            let mut seen = HashSet::with_capacity(polygon.vertex_count());
            let mut local = Vec::with_capacity(polygon.vertex_count());
            for &vertex_id in polygon.triangles().iter().flatten() {
                if seen.insert(vertex_id) {
                    local.push(vertex_id);
                }
            }
            let block = polygon.vertex_count();
            for (i, vertex_id) in local.into_iter().enumerate() {
                if let Some(vertex) = self.vertices.get_mut(vertex_id) {
                    vertex.set_row_index(offset + i);
                }
            }
            offset += block;
        }
        offset
    }

    /// Position of every edge in the line primitive built from this store.
    #[must_use]
    pub fn edge_primitive_order(&self) -> HashMap<EdgeId, usize> {
        self.polygons
            .iter()
            .flat_map(Polygon::edge_ids)
            .copied()
            .enumerate()
            .map(|(i, edge_id)| (edge_id, i))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::identity::IdentityRegistry;

    fn space() -> Space {
        Space::Geometry(ObjectId(1))
    }

    /// Builds a store with one square polygon (fan triangulated) and returns its IDs.
    fn square(store: &mut SubobjectStore, registry: &mut IdentityRegistry, z: f64) -> PolygonId {
        let poly_id: PolygonId = registry.next_element_id();
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let vids: Vec<VertexId> = corners.iter().map(|_| registry.next_element_id()).collect();
        let eids: Vec<EdgeId> = corners.iter().map(|_| registry.next_element_id()).collect();
        for (i, &(x, y)) in corners.iter().enumerate() {
            let pid = registry.next_picking_id(Category::Vertex).unwrap();
            store.add_vertex(Vertex::new(vids[i], pid, Point3::new(x, y, z), poly_id, space()));
            let pid = registry.next_picking_id(Category::Edge).unwrap();
            store.add_edge(Edge::new(eids[i], pid, vids[i], vids[(i + 1) % 4], poly_id, space()));
        }
        let pid = registry.next_picking_id(Category::Polygon).unwrap();
        let tris = vec![[vids[0], vids[1], vids[2]], [vids[0], vids[2], vids[3]]];
        store.add_polygon(Polygon::new(poly_id, pid, tris, vids, eids, space()))
    }

    #[test]
    fn lookup_and_missing_ids() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        let poly = square(&mut store, &mut registry, 0.0);
        assert_eq!(store.polygons().len(), 1);
        assert_eq!(store.vertices().len(), 4);
        assert!(store.polygon(poly).is_ok());
        let missing: VertexId = registry.next_element_id();
        assert!(store.vertex(missing).is_err());
    }

    #[test]
    fn polygon_row_count_is_not_vertex_count() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        let poly = square(&mut store, &mut registry, 0.0);
        let polygon = store.polygon(poly).unwrap();
        assert_eq!(polygon.row_count(), 6);
        assert_eq!(polygon.vertex_count(), 4);
        assert_eq!(polygon.triangles().len(), polygon.vertex_count() - 2);
    }

    #[test]
    fn center_and_normal_follow_position_edits() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        let poly = square(&mut store, &mut registry, 0.0);
        assert_relative_eq!(store.polygon_center(poly).unwrap(), Point3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(store.polygon_normal(poly).unwrap(), Vector3::new(0.0, 0.0, 1.0));

        let corner = store.polygon(poly).unwrap().vertex_ids()[2];
        store.set_vertex_pos(corner, Point3::new(3.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(store.polygon_center(poly).unwrap(), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn row_indices_follow_polygon_order() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        let first = square(&mut store, &mut registry, 0.0);
        let second = square(&mut store, &mut registry, 1.0);
        assert_eq!(store.assign_row_indices(), 8);

        let rows = |poly: PolygonId| -> Vec<usize> {
            store
                .polygon(poly)
                .unwrap()
                .vertex_ids()
                .iter()
                .map(|&v| store.vertex(v).unwrap().row_index())
                .collect()
        };
        assert_eq!(rows(first), vec![0, 1, 2, 3]);
        assert_eq!(rows(second), vec![4, 5, 6, 7]);

        let edge = store.polygon(second).unwrap().edge_ids()[3];
        assert_eq!(store.edge_rows(edge).unwrap(), [7, 4]);
        assert_eq!(store.edge_primitive_order()[&edge], 7);
    }

    #[test]
    fn reassigning_rows_is_stable() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        square(&mut store, &mut registry, 0.0);
        square(&mut store, &mut registry, 1.0);
        store.assign_row_indices();
        let before: Vec<_> = store.vertices().iter().map(Vertex::row_index).collect();
        let mut copy = store.clone();
        copy.assign_row_indices();
        let after: Vec<_> = copy.vertices().iter().map(Vertex::row_index).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn picking_lookup_round_trip() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        let poly = square(&mut store, &mut registry, 0.0);
        let polygon = store.polygon(poly).unwrap();
        let color = PickingColor::encode(polygon.picking_id(), Category::Polygon);
        assert_eq!(store.picked::<PolygonId>(color), Some(poly));
        assert_eq!(store.picked::<EdgeId>(color), None);
    }

    #[test]
    fn removal_clears_picking_lookup() {
        let mut store = SubobjectStore::new(space());
        let mut registry = IdentityRegistry::default();
        let poly = square(&mut store, &mut registry, 0.0);
        let edge_id = store.polygon(poly).unwrap().edge_ids()[0];
        let picking_id = store.edge(edge_id).unwrap().picking_id();
        store.remove_edge(edge_id).unwrap();
        assert_eq!(store.element_by_picking_id(Category::Edge, picking_id), None);
        assert_eq!(store.edges().len(), 3);
        assert!(!store.edges().ids().any(|e| e == edge_id));
    }

    #[test]
    fn removal_keeps_order_across_compaction() {
        let mut map: ElementMap<VertexId, u32> = ElementMap::new();
        for raw in 1..=6 {
            map.insert(VertexId::from_raw(raw), u32::try_from(raw).unwrap() * 10);
        }
        map.remove(VertexId::from_raw(2));
        map.remove(VertexId::from_raw(4));
        assert_eq!(map.order.len(), 6);
        map.remove(VertexId::from_raw(5));
        map.remove(VertexId::from_raw(1));
        assert_eq!(map.order.len(), 2);

        map.insert(VertexId::from_raw(7), 70);
        map.remove(VertexId::from_raw(3));
        let ids: Vec<u64> = map.ids().map(ElementKey::raw).collect();
        assert_eq!(ids, vec![6, 7]);
        assert_eq!(map.iter().copied().collect::<Vec<_>>(), vec![60, 70]);
        assert_eq!(map.get(VertexId::from_raw(7)), Some(&70));
        assert_eq!(map.len(), 2);
        assert!(map.remove(VertexId::from_raw(3)).is_none());
    }
}
