//! The 3D geometry data object.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PickingConfig;
use crate::error::Result;
use crate::identity::{next_object_id, IdentityRegistry};
use crate::math::{Point2, Point3};
use crate::merge::build::{
    edge_key, merge_edges_by_endpoints, merge_vertices_by_position, position_key, EndpointKey,
    KeyedGroups, PositionKey,
};
use crate::merge::{MergeGroup, MergeGroups};
use crate::topology::{
    Category, Edge, EdgeId, ObjectId, Polygon, PolygonId, Space, SubobjectStore, Vertex, VertexId,
};

/// Receiver of per-UV-channel seam edge lists.
///
/// The geometry object persists seam membership so it survives the UV data
/// objects that edit it. Lists are plain edge IDs.
pub trait TexSeamRegistry {
    /// Registers the seam list of a UV channel, replacing any previous one.
    fn create_tex_seams(&mut self, channel: usize, edge_ids: Vec<EdgeId>);

    /// Appends edges to the seam list of a UV channel.
    fn add_tex_seam_edges(&mut self, channel: usize, edge_ids: &[EdgeId]);

    /// Removes edges from the seam list of a UV channel.
    fn remove_tex_seam_edges(&mut self, channel: usize, edge_ids: &[EdgeId]);

    /// Drops the seam list of a UV channel.
    fn destroy_tex_seams(&mut self, channel: usize);
}

/// A 3D geometry object: its subobjects, their 3D merge groups, and the
/// persisted seam lists of its UV channels.
#[derive(Debug)]
pub struct GeomData {
    object_id: ObjectId,
    registry: IdentityRegistry,
    store: SubobjectStore,
    merged_verts: KeyedGroups<VertexId, PositionKey>,
    merged_edges: KeyedGroups<EdgeId, EndpointKey>,
    tex_seams: BTreeMap<usize, Vec<EdgeId>>,
}

impl GeomData {
    /// Creates an empty geometry object with the default picking configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PickingConfig::default())
    }

    /// Creates an empty geometry object with the given picking configuration.
    #[must_use]
    pub fn with_config(config: PickingConfig) -> Self {
        let object_id = next_object_id();
        Self {
            object_id,
            registry: IdentityRegistry::new(config),
            store: SubobjectStore::new(Space::Geometry(object_id)),
            merged_verts: KeyedGroups::new(),
            merged_edges: KeyedGroups::new(),
            tex_seams: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    #[must_use]
    pub fn space(&self) -> Space {
        self.store.space()
    }

    #[must_use]
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut IdentityRegistry {
        &mut self.registry
    }

    /// The 3D subobject records.
    #[must_use]
    pub fn subobjects(&self) -> &SubobjectStore {
        &self.store
    }

    /// Vertices grouped by exactly equal position.
    #[must_use]
    pub fn merged_vertices(&self) -> &MergeGroups<VertexId> {
        self.merged_verts.groups()
    }

    /// Edges grouped by coincident endpoints.
    #[must_use]
    pub fn merged_edges(&self) -> &MergeGroups<EdgeId> {
        self.merged_edges.groups()
    }

    /// The merged vertex containing `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a vertex of this object.
    pub fn merged_vertex(&self, id: VertexId) -> Result<&MergeGroup<VertexId>> {
        Ok(self.merged_verts.groups().group_of(id)?)
    }

    /// The merged edge containing `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not an edge of this object.
    pub fn merged_edge(&self, id: EdgeId) -> Result<&MergeGroup<EdgeId>> {
        Ok(self.merged_edges.groups().group_of(id)?)
    }

    /// Adds the records of a freshly built polygon and merges its elements.
    pub(crate) fn insert_polygon(
        &mut self,
        vertices: Vec<Vertex>,
        edges: Vec<Edge>,
        polygon: Polygon,
    ) -> Result<PolygonId> {
        let vertex_ids: Vec<VertexId> = vertices.iter().map(Vertex::id).collect();
        let edge_ids: Vec<EdgeId> = edges.iter().map(Edge::id).collect();

        for vertex in vertices {
            self.store.add_vertex(vertex);
        }
        for edge in edges {
            self.store.add_edge(edge);
        }
        let polygon_id = self.store.add_polygon(polygon);

        for id in vertex_ids {
            let key = position_key(&self.store.vertex(id)?.pos());
            self.merged_verts.add(id, key)?;
        }
        for id in edge_ids {
            let key = edge_key(&self.store, self.merged_verts.groups(), id)?;
            self.merged_edges.add(id, key)?;
        }
        Ok(polygon_id)
    }

    /// Removes a polygon together with its vertices and edges.
    ///
    /// The removed elements leave their merge groups and seam lists, and
    /// their picking IDs return to the registry.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the polygon or one of its elements is
    /// missing; nothing is removed in that case.
    pub fn remove_polygon(&mut self, id: PolygonId) -> Result<()> {
        let polygon = self.store.polygon(id)?;
        let vertex_ids = polygon.vertex_ids().to_vec();
        let edge_ids = polygon.edge_ids().to_vec();
        for &v in &vertex_ids {
            self.store.vertex(v)?;
        }
        for &e in &edge_ids {
            self.store.edge(e)?;
        }

        for &e in &edge_ids {
            self.merged_edges.remove(e)?;
            let edge = self.store.remove_edge(e)?;
            self.registry.release_picking_id(Category::Edge, edge.picking_id());
        }
        for &v in &vertex_ids {
            self.merged_verts.remove(v)?;
            let vertex = self.store.remove_vertex(v)?;
            self.registry.release_picking_id(Category::Vertex, vertex.picking_id());
        }
        let polygon = self.store.remove_polygon(id)?;
        self.registry.release_picking_id(Category::Polygon, polygon.picking_id());

        self.reindex_edges()?;
        for seams in self.tex_seams.values_mut() {
            seams.retain(|e| !edge_ids.contains(e));
        }
        debug!(polygon = %id, vertices = vertex_ids.len(), "removed polygon");
        Ok(())
    }

    /// Moves a vertex and regroups it and its edges under the new position.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the vertex or one of its edges is missing.
    pub fn set_vertex_pos(&mut self, id: VertexId, pos: Point3) -> Result<()> {
        let edge_ids = self.store.vertex(id)?.edge_ids().to_vec();
        for &e in &edge_ids {
            self.store.edge(e)?;
        }

        for &e in &edge_ids {
            self.merged_edges.remove(e)?;
        }
        self.merged_verts.remove(id)?;
        self.store.set_vertex_pos(id, pos)?;
        self.merged_verts.add(id, position_key(&pos))?;
        self.reindex_edges()?;
        for &e in &edge_ids {
            let key = edge_key(&self.store, self.merged_verts.groups(), e)?;
            self.merged_edges.add(e, key)?;
        }
        Ok(())
    }

    /// Sets the UV coordinate of a vertex for one channel.
    ///
    /// UV data objects built earlier are not updated; rebuild them to pick
    /// up the change.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the vertex is missing.
    pub fn set_vertex_uv(&mut self, id: VertexId, channel: usize, uv: Point2) -> Result<()> {
        self.store.vertex_mut(id)?.set_uv(channel, uv);
        Ok(())
    }

    /// Replaces a polygon's triangulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is missing or the triangles do not
    /// bound it; the polygon is unchanged in that case.
    pub fn set_polygon_triangles(&mut self, id: PolygonId, triangles: Vec<[VertexId; 3]>) -> Result<()> {
        self.store.polygon_mut(id)?.set_triangles(triangles)
    }

    /// Rebuilds both merge-group models from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store is internally inconsistent.
    pub fn rebuild_merges(&mut self) -> Result<()> {
        let merged_verts = merge_vertices_by_position(&self.store)?;
        let merged_edges = merge_edges_by_endpoints(&self.store, merged_verts.groups())?;
        debug!(
            vertices = self.store.vertices().len(),
            merged_vertices = merged_verts.groups().len(),
            edges = self.store.edges().len(),
            merged_edges = merged_edges.groups().len(),
            "rebuilt merge groups"
        );
        self.merged_verts = merged_verts;
        self.merged_edges = merged_edges;
        Ok(())
    }

    /// Assigns render rows to the 3D vertices and returns the row count.
    pub fn assign_row_indices(&mut self) -> usize {
        self.store.assign_row_indices()
    }

    /// The persisted seam list of a UV channel.
    #[must_use]
    pub fn tex_seam_edges(&self, channel: usize) -> Option<&[EdgeId]> {
        self.tex_seams.get(&channel).map(Vec::as_slice)
    }

    /// UV channels that currently have a seam list.
    pub fn tex_seam_channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.tex_seams.keys().copied()
    }

    fn reindex_edges(&mut self) -> Result<()> {
        let store = &self.store;
        let vertices = self.merged_verts.groups();
        self.merged_edges.reindex(|e| edge_key(store, vertices, e))
    }
}

impl Default for GeomData {
    fn default() -> Self {
        Self::new()
    }
}

impl TexSeamRegistry for GeomData {
    fn create_tex_seams(&mut self, channel: usize, edge_ids: Vec<EdgeId>) {
        self.tex_seams.insert(channel, edge_ids);
    }

    fn add_tex_seam_edges(&mut self, channel: usize, edge_ids: &[EdgeId]) {
        self.tex_seams.entry(channel).or_default().extend_from_slice(edge_ids);
    }

    fn remove_tex_seam_edges(&mut self, channel: usize, edge_ids: &[EdgeId]) {
        if let Some(seams) = self.tex_seams.get_mut(&channel) {
            seams.retain(|e| !edge_ids.contains(e));
        }
    }

    fn destroy_tex_seams(&mut self, channel: usize) {
        self.tex_seams.remove(&channel);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{Corner, MakePolygon};

    fn quad(geom: &mut GeomData, x0: f64) -> PolygonId {
        let corners = [(x0, 0.0), (x0 + 1.0, 0.0), (x0 + 1.0, 1.0), (x0, 1.0)]
            .into_iter()
            .map(|(x, y)| Corner::new(Point3::new(x, y, 0.0)))
            .collect();
        MakePolygon::new(corners).execute(geom).unwrap()
    }

    fn group_sizes<K: crate::topology::ElementKey>(groups: &MergeGroups<K>) -> Vec<usize> {
        let mut sizes: Vec<usize> = groups.groups().map(|(_, g)| g.len()).collect();
        sizes.sort_unstable();
        sizes
    }

    #[test]
    fn incremental_merges_match_a_rebuild() {
        let mut geom = GeomData::new();
        quad(&mut geom, 0.0);
        quad(&mut geom, 1.0);
        quad(&mut geom, 2.0);
        let verts = group_sizes(geom.merged_vertices());
        let edges = group_sizes(geom.merged_edges());
        geom.rebuild_merges().unwrap();
        assert_eq!(group_sizes(geom.merged_vertices()), verts);
        assert_eq!(group_sizes(geom.merged_edges()), edges);
        assert_eq!(geom.merged_edges().len(), 10);
    }

    #[test]
    fn remove_polygon_detaches_everything() {
        let mut geom = GeomData::new();
        let left = quad(&mut geom, 0.0);
        let right = quad(&mut geom, 1.0);
        let shared = geom.subobjects().polygon(left).unwrap().edge_ids()[1];
        geom.create_tex_seams(0, vec![shared]);

        geom.remove_polygon(left).unwrap();
        let store = geom.subobjects();
        assert_eq!(store.polygons().ids().collect::<Vec<_>>(), vec![right]);
        assert_eq!(store.vertices().len(), 4);
        assert_eq!(geom.merged_vertices().len(), 4);
        assert_eq!(geom.merged_edges().len(), 4);
        assert!(geom.merged_vertices().partitions(store.vertices().ids()));
        assert_eq!(geom.tex_seam_edges(0), Some(&[][..]));
        assert_eq!(geom.registry().live_picking_ids(Category::Vertex), 4);
        assert_eq!(geom.registry().live_picking_ids(Category::Polygon), 1);

        assert!(geom.remove_polygon(left).is_err());
        let again = quad(&mut geom, 0.0);
        assert_eq!(geom.subobjects().polygon(again).unwrap().picking_id(), 1);
        assert_eq!(geom.merged_vertices().len(), 6);
    }

    #[test]
    fn moving_a_vertex_regroups_it_and_its_edges() {
        let mut geom = GeomData::new();
        let left = quad(&mut geom, 0.0);
        quad(&mut geom, 1.0);
        let corner = geom.subobjects().polygon(left).unwrap().vertex_ids()[1];
        let shared = geom.subobjects().polygon(left).unwrap().edge_ids()[1];
        assert_eq!(geom.merged_vertex(corner).unwrap().len(), 2);
        assert_eq!(geom.merged_edge(shared).unwrap().len(), 2);

        geom.set_vertex_pos(corner, Point3::new(1.0, -0.5, 0.0)).unwrap();
        assert_eq!(geom.merged_vertex(corner).unwrap().len(), 1);
        assert_eq!(geom.merged_edge(shared).unwrap().len(), 1);
        assert_eq!(geom.merged_vertices().len(), 7);

        geom.set_vertex_pos(corner, Point3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(geom.merged_edge(shared).unwrap().len(), 2);
        let edges = group_sizes(geom.merged_edges());
        geom.rebuild_merges().unwrap();
        assert_eq!(group_sizes(geom.merged_edges()), edges);
    }

    #[test]
    fn negative_zero_merges_with_zero() {
        let mut geom = GeomData::new();
        let left = quad(&mut geom, 0.0);
        let corner = geom.subobjects().polygon(left).unwrap().vertex_ids()[0];
        quad(&mut geom, -1.0);
        geom.set_vertex_pos(corner, Point3::new(-0.0, 0.0, -0.0)).unwrap();
        assert_eq!(geom.merged_vertex(corner).unwrap().len(), 2);
    }

    #[test]
    fn seam_registry_tracks_channels() {
        let mut geom = GeomData::new();
        let id = quad(&mut geom, 0.0);
        let edges = geom.subobjects().polygon(id).unwrap().edge_ids().to_vec();
        geom.create_tex_seams(2, vec![edges[0]]);
        geom.add_tex_seam_edges(2, &edges[1..3]);
        geom.remove_tex_seam_edges(2, &[edges[1]]);
        assert_eq!(geom.tex_seam_edges(2), Some(&[edges[0], edges[2]][..]));
        assert_eq!(geom.tex_seam_channels().collect::<Vec<_>>(), vec![2]);
        geom.destroy_tex_seams(2);
        assert_eq!(geom.tex_seam_edges(2), None);
    }

    #[test]
    fn uv_and_triangle_edits() {
        let mut geom = GeomData::new();
        let id = quad(&mut geom, 0.0);
        let v = geom.subobjects().polygon(id).unwrap().vertex_ids().to_vec();
        geom.set_vertex_uv(v[2], 1, Point2::new(0.5, 0.5)).unwrap();
        let vertex = geom.subobjects().vertex(v[2]).unwrap();
        assert_eq!(vertex.uv(1), Some(Point2::new(0.5, 0.5)));
        assert_eq!(vertex.uv(0), Some(Point2::origin()));

        geom.set_polygon_triangles(id, vec![[v[1], v[2], v[3]], [v[1], v[3], v[0]]]).unwrap();
        assert!(geom.set_polygon_triangles(id, vec![[v[0], v[1], v[2]]]).is_err());
        assert_eq!(geom.subobjects().polygon(id).unwrap().triangles()[0], [v[1], v[2], v[3]]);
        assert_eq!(geom.assign_row_indices(), 4);
    }

    #[test]
    fn retriangulation_cannot_borrow_a_neighbour_vertex() {
        let mut geom = GeomData::new();
        let left = quad(&mut geom, 0.0);
        let right = quad(&mut geom, 1.0);
        let l = geom.subobjects().polygon(left).unwrap().vertex_ids().to_vec();
        let x = geom.subobjects().polygon(right).unwrap().vertex_ids()[0];

        let fan = vec![[l[0], l[1], x], [l[1], l[2], x], [l[2], l[3], x], [l[3], l[0], x]];
        let err = geom.set_polygon_triangles(left, fan).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MeshError::Topology(crate::error::TopologyError::MalformedTriangulation(_))
        ));

        let polygon = geom.subobjects().polygon(left).unwrap();
        assert_eq!(polygon.triangles().len(), polygon.vertex_count() - 2);
        assert_eq!(geom.assign_row_indices(), 8);
        let rows = |id: PolygonId| -> Vec<usize> {
            let store = geom.subobjects();
            let mut rows: Vec<usize> = store
                .polygon(id)
                .unwrap()
                .vertex_ids()
                .iter()
                .map(|&v| store.vertex(v).unwrap().row_index())
                .collect();
            rows.sort_unstable();
            rows
        };
        assert_eq!(rows(left), vec![0, 1, 2, 3]);
        assert_eq!(rows(right), vec![4, 5, 6, 7]);
    }
}
