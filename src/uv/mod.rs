//! UV-space projection of a geometry object and its seam edges.
//!
//! A UV data object mirrors the 3D polygons, edges and vertices of one
//! geometry object, reusing their IDs, with each vertex placed at its UV
//! coordinate for one channel. Its merge groups are the 3D groups split
//! further by UV coordinate. An edge whose UV group is smaller than its 3D
//! group is a seam: some neighbour across it was unwrapped elsewhere.
//!
//! After construction the seam list is edited explicitly, so it records the
//! user's intent rather than being recomputed from coordinates.

mod seams;
mod selection;

pub use seams::{SeamBuffer, SeamSegment};
pub use selection::{EdgeHighlight, Selection, SelectionBucket};

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{Result, TopologyError};
use crate::geom::{GeomData, TexSeamRegistry};
use crate::math::{point_to_uv, uv_to_point, Point2};
use crate::merge::build::{merge_edges_by_endpoints, merge_vertices_by_uv};
use crate::merge::{MergeGroup, MergeGroups};
use crate::topology::{
    Category, EdgeId, ElementKey, PolygonId, Space, SubobjectStore, Vertex, VertexId,
};

/// The seam edges of one UV channel as plain IDs, for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeamSnapshot {
    pub channel: Option<usize>,
    pub edge_ids: Vec<EdgeId>,
}

/// UV-space topology of one channel of a geometry object.
#[derive(Debug)]
pub struct UvData {
    channel: Option<usize>,
    store: SubobjectStore,
    merged_verts: MergeGroups<VertexId>,
    merged_edges: MergeGroups<EdgeId>,
    seam_edge_ids: Vec<EdgeId>,
    seam_lookup: HashSet<EdgeId>,
    row_count: usize,
    edge_order: HashMap<EdgeId, usize>,
    selection: Selection,
    seam_buffer: SeamBuffer,
}

impl UvData {
    /// Projects `geom` into UV space for `channel`, derives its seams and
    /// registers them with the geometry object.
    ///
    /// Vertices without a UV coordinate for `channel` are placed at the origin.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the geometry object's records or merge
    /// groups are inconsistent.
    pub fn new(channel: usize, geom: &mut GeomData) -> Result<Self> {
        let space = Space::Uv(geom.object_id(), Some(channel));
        let store = project(geom.subobjects(), channel, space)?;
        let merged_verts = merge_vertices_by_uv(&store, geom.merged_vertices())?.into_groups();
        let merged_edges = merge_edges_by_endpoints(&store, &merged_verts)?.into_groups();

        let mut seam_edge_ids = Vec::new();
        for edge in store.edges().ids() {
            if merged_edges.group_of(edge)?.len() < geom.merged_edge(edge)?.len() {
                seam_edge_ids.push(edge);
            }
        }

        let mut uv = Self {
            channel: Some(channel),
            seam_lookup: seam_edge_ids.iter().copied().collect(),
            seam_edge_ids,
            store,
            merged_verts,
            merged_edges,
            row_count: 0,
            edge_order: HashMap::new(),
            selection: Selection::default(),
            seam_buffer: SeamBuffer::default(),
        };
        uv.row_count = uv.store.assign_row_indices();
        uv.edge_order = uv.store.edge_primitive_order();
        uv.rebuild_seams()?;
        uv.selection.highlight_seams(&uv.seam_edge_ids);

        debug!(
            channel,
            vertices = uv.store.vertices().len(),
            merged_vertices = uv.merged_verts.len(),
            merged_edges = uv.merged_edges.len(),
            seams = uv.seam_edge_ids.len(),
            "built uv data"
        );
        geom.create_tex_seams(channel, uv.seam_edge_ids.clone());
        Ok(uv)
    }

    /// Deep-copies this object, optionally binding the copy to a UV channel.
    ///
    /// Merge groups are copied through [`MergeGroups::clone_remapped`], so
    /// the copy never shares a group with this object. If `channel` is set,
    /// the copy's seams are registered with `seams` under that channel.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::ChannelInUse` if `channel` is this object's own
    /// channel: the copy would overwrite the seam list this object persists,
    /// and destroying either would drop it for both.
    pub fn duplicate(
        &self,
        channel: Option<usize>,
        seams: &mut impl TexSeamRegistry,
    ) -> Result<Self> {
        if let Some(channel) = channel.filter(|&c| Some(c) == self.channel) {
            warn!(channel, "rejected duplicate onto the source channel");
            return Err(TopologyError::ChannelInUse(channel).into());
        }
        let object = self.store.space().object();
        let (merged_verts, _) = self.merged_verts.clone_remapped();
        let (merged_edges, _) = self.merged_edges.clone_remapped();
        let copy = Self {
            channel,
            store: self.store.clone_into_space(Space::Uv(object, channel)),
            merged_verts,
            merged_edges,
            seam_edge_ids: self.seam_edge_ids.clone(),
            seam_lookup: self.seam_lookup.clone(),
            row_count: self.row_count,
            edge_order: self.edge_order.clone(),
            selection: self.selection.clone(),
            seam_buffer: self.seam_buffer.clone(),
        };
        if let Some(channel) = channel {
            seams.create_tex_seams(channel, copy.seam_edge_ids.clone());
        }
        Ok(copy)
    }

    /// Drops this object and its registered seam list.
    pub fn destroy(self, seams: &mut impl TexSeamRegistry) {
        if let Some(channel) = self.channel {
            seams.destroy_tex_seams(channel);
        }
    }

    #[must_use]
    pub fn channel(&self) -> Option<usize> {
        self.channel
    }

    /// The UV-space subobject records.
    #[must_use]
    pub fn subobjects(&self) -> &SubobjectStore {
        &self.store
    }

    /// UV vertices grouped by equal UV coordinate within one 3D group.
    #[must_use]
    pub fn merged_vertices(&self) -> &MergeGroups<VertexId> {
        &self.merged_verts
    }

    /// UV edges grouped by coincident UV endpoints.
    #[must_use]
    pub fn merged_edges(&self) -> &MergeGroups<EdgeId> {
        &self.merged_edges
    }

    /// The merged vertex containing `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a vertex of this object.
    pub fn merged_vertex(&self, id: VertexId) -> Result<&MergeGroup<VertexId>> {
        Ok(self.merged_verts.group_of(id)?)
    }

    /// The merged edge containing `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not an edge of this object.
    pub fn merged_edge(&self, id: EdgeId) -> Result<&MergeGroup<EdgeId>> {
        Ok(self.merged_edges.group_of(id)?)
    }

    /// UV coordinate of a UV vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a vertex of this object.
    pub fn vertex_uv(&self, id: VertexId) -> Result<Point2> {
        let pos = self.store.vertex(id)?.pos();
        Ok(point_to_uv(&pos))
    }

    /// Total number of render rows of the vertex buffer.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// The seam edges, in the order they became seams.
    #[must_use]
    pub fn seam_edge_ids(&self) -> &[EdgeId] {
        &self.seam_edge_ids
    }

    #[must_use]
    pub fn is_seam_edge(&self, id: EdgeId) -> bool {
        self.seam_lookup.contains(&id)
    }

    /// The seam list as plain IDs.
    #[must_use]
    pub fn seam_snapshot(&self) -> SeamSnapshot {
        SeamSnapshot {
            channel: self.channel,
            edge_ids: self.seam_edge_ids.clone(),
        }
    }

    #[must_use]
    pub fn seam_buffer(&self) -> &SeamBuffer {
        &self.seam_buffer
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Regenerates the seam buffer from the seam list.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a seam edge is missing from the store.
    pub fn rebuild_seams(&mut self) -> Result<()> {
        let segments = SeamBuffer::segments_for(&self.store, &self.edge_order, &self.seam_edge_ids)?;
        self.seam_buffer.replace(segments);
        Ok(())
    }

    /// Marks edges as seams.
    ///
    /// The edges keep their selection state but are drawn as seams, their
    /// segments are appended to the seam buffer, and the geometry object is
    /// told to persist them.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::SeamAlreadyPresent` if an edge is already a
    /// seam or listed twice, or a lookup error if an edge is unknown.
    /// Nothing changes on error.
    pub fn add_seam_edges(
        &mut self,
        edge_ids: &[EdgeId],
        seams: &mut impl TexSeamRegistry,
    ) -> Result<()> {
        let mut seen = HashSet::with_capacity(edge_ids.len());
        for &edge in edge_ids {
            self.store.edge(edge)?;
            if self.seam_lookup.contains(&edge) || !seen.insert(edge) {
                warn!(%edge, "rejected seam addition");
                return Err(TopologyError::SeamAlreadyPresent(edge.to_string()).into());
            }
        }
        let segments = SeamBuffer::segments_for(&self.store, &self.edge_order, edge_ids)?;

        self.seam_edge_ids.extend_from_slice(edge_ids);
        self.seam_lookup.extend(edge_ids);
        self.selection.highlight_seams(edge_ids);
        self.seam_buffer.append(segments);
        if let Some(channel) = self.channel {
            seams.add_tex_seam_edges(channel, edge_ids);
        }
        Ok(())
    }

    /// Unmarks seam edges.
    ///
    /// The edges are split into a selected and an unselected temporary group
    /// and routed through the ordinary selection update, so they keep their
    /// selection state but are drawn as plain edges again.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::SeamNotPresent` if an edge is not a seam or is
    /// listed twice. Nothing changes on error.
    pub fn remove_seam_edges(
        &mut self,
        edge_ids: &[EdgeId],
        seams: &mut impl TexSeamRegistry,
    ) -> Result<()> {
        let mut removed = HashSet::with_capacity(edge_ids.len());
        for &edge in edge_ids {
            if !self.seam_lookup.contains(&edge) || !removed.insert(edge) {
                warn!(%edge, "rejected seam removal");
                return Err(TopologyError::SeamNotPresent(edge.to_string()).into());
            }
        }

        self.seam_edge_ids.retain(|e| !removed.contains(e));
        self.seam_lookup.retain(|e| !removed.contains(e));

        let (selected, unselected): (Vec<EdgeId>, Vec<EdgeId>) = edge_ids
            .iter()
            .copied()
            .partition(|&e| self.selection.bucket(e) == SelectionBucket::Selected);
        let selected = MergeGroup::from_members(selected);
        let unselected = MergeGroup::from_members(unselected);
        self.selection.update(&[&selected], &[&unselected], &self.seam_lookup);

        self.seam_buffer.remove(&removed);
        if let Some(channel) = self.channel {
            seams.remove_tex_seam_edges(channel, edge_ids);
        }
        Ok(())
    }

    /// Selects the merged edges of `select` and deselects those of `deselect`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if an edge is unknown. Nothing changes on error.
    pub fn update_edge_selection(&mut self, select: &[EdgeId], deselect: &[EdgeId]) -> Result<()> {
        let to_select = resolve_groups(&self.merged_edges, select)?;
        let to_deselect = resolve_groups(&self.merged_edges, deselect)?;
        self.selection.update(&to_select, &to_deselect, &self.seam_lookup);
        Ok(())
    }

    /// Selects the merged vertices of `select` and deselects those of `deselect`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a vertex is unknown. Nothing changes on error.
    pub fn update_vertex_selection(
        &mut self,
        select: &[VertexId],
        deselect: &[VertexId],
    ) -> Result<()> {
        let to_select = resolve_groups(&self.merged_verts, select)?;
        let to_deselect = resolve_groups(&self.merged_verts, deselect)?;
        self.selection.update(&to_select, &to_deselect, &self.seam_lookup);
        Ok(())
    }

    /// Selects and deselects polygons.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a polygon is unknown. Nothing changes on error.
    pub fn update_polygon_selection(
        &mut self,
        select: &[PolygonId],
        deselect: &[PolygonId],
    ) -> Result<()> {
        for &id in select.iter().chain(deselect) {
            self.store.polygon(id)?;
        }
        let to_select = MergeGroup::from_members(select.to_vec());
        let to_deselect = MergeGroup::from_members(deselect.to_vec());
        self.selection.update(&[&to_select], &[&to_deselect], &self.seam_lookup);
        Ok(())
    }

    /// Deselects everything in `category`.
    pub fn clear_selection(&mut self, category: Category) {
        self.selection.clear(category, &self.seam_lookup);
    }
}

/// Builds the UV store: one UV record per 3D record, same IDs and order.
fn project(source: &SubobjectStore, channel: usize, space: Space) -> Result<SubobjectStore> {
    let mut store = SubobjectStore::new(space);
    for polygon in source.polygons().iter() {
        for &vertex_id in polygon.triangles().iter().flatten() {
            if store.vertices().contains(vertex_id) {
                continue;
            }
            let vertex = source.vertex(vertex_id)?;
            let uv = vertex.uv(channel).unwrap_or_else(Point2::origin);
            let projected = Vertex::new(
                vertex_id,
                vertex.picking_id(),
                uv_to_point(&uv),
                vertex.polygon_id(),
                space,
            );
            store.add_vertex(projected.with_edges(vertex.edge_ids().to_vec()));
        }
        for &edge_id in polygon.edge_ids() {
            store.add_edge(source.edge(edge_id)?.in_space(space));
        }
        store.add_polygon(polygon.in_space(space));
    }
    Ok(store)
}

/// The distinct groups containing `ids`, in order of first appearance.
fn resolve_groups<'a, K: ElementKey>(
    groups: &'a MergeGroups<K>,
    ids: &[K],
) -> Result<Vec<&'a MergeGroup<K>>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut resolved = Vec::with_capacity(ids.len());
    for &id in ids {
        if seen.insert(groups.group_key(id)?) {
            resolved.push(groups.group_of(id)?);
        }
    }
    Ok(resolved)
}
