//! Merge-group construction.
//!
//! Every builder makes one pass over the store in its iteration order and
//! files each element under a hashable coincidence key, so the first element
//! seen for a key becomes its group's representative. Group layout is
//! therefore a pure function of the store's contents and order.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::MeshError;
use crate::math::Point3;
use crate::topology::{EdgeId, ElementKey, SubobjectStore, VertexId};

use super::{GroupKey, MergeGroups};

/// Bit pattern of a position; equal keys mean exactly equal coordinates.
pub type PositionKey = [u64; 3];

/// Unordered pair of vertex-group representatives.
pub type EndpointKey = (VertexId, VertexId);

/// Coincidence key of a UV vertex: its 3D group representative and its UV bits.
pub type UvKey = (VertexId, [u64; 2]);

/// Exact-equality key of a position. `-0.0` and `0.0` compare equal, so they
/// share a key.
#[must_use]
pub fn position_key(pos: &Point3) -> PositionKey {
    [
        (pos.x + 0.0).to_bits(),
        (pos.y + 0.0).to_bits(),
        (pos.z + 0.0).to_bits(),
    ]
}

/// Key of an edge whose endpoints have the given representatives.
#[must_use]
pub fn endpoint_key(a: VertexId, b: VertexId) -> EndpointKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Merge groups together with the key each group was filed under.
///
/// Allows elements to be added one at a time after the initial pass.
#[derive(Debug)]
pub struct KeyedGroups<K: ElementKey, Q> {
    groups: MergeGroups<K>,
    index: HashMap<Q, GroupKey>,
    keys: HashMap<GroupKey, Q>,
}

impl<K: ElementKey, Q: Copy + Eq + Hash> KeyedGroups<K, Q> {
    /// Creates an empty set of keyed groups.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: MergeGroups::new(),
            index: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    /// Files `id` under `key`, joining the group already filed there or
    /// starting a new one.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicateMember` if `id` is already grouped.
    pub fn add(&mut self, id: K, key: Q) -> Result<GroupKey, MeshError> {
        if let Some(&group) = self.index.get(&key) {
            self.groups.insert(group, id)?;
            return Ok(group);
        }
        let group = self.groups.create_group(id)?;
        self.index.insert(key, group);
        self.keys.insert(group, key);
        Ok(group)
    }

    /// Detaches `id`, forgetting the key of its group if the group dissolves.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotGrouped` if `id` is not grouped.
    pub fn remove(&mut self, id: K) -> Result<(), MeshError> {
        let group = self.groups.group_key(id)?;
        if self.groups.remove(id)?.is_none() {
            if let Some(key) = self.keys.remove(&group) {
                self.index.remove(&key);
            }
        }
        Ok(())
    }

    /// Recomputes every group's key from its current representative.
    ///
    /// Needed when the keys depend on data that changed, for example edge
    /// keys after vertex groups lost their representatives.
    ///
    /// # Errors
    ///
    /// Propagates any error from `key_of`.
    pub fn reindex(
        &mut self,
        mut key_of: impl FnMut(K) -> Result<Q, MeshError>,
    ) -> Result<(), MeshError> {
        let mut index = HashMap::with_capacity(self.groups.len());
        let mut keys = HashMap::with_capacity(self.groups.len());
        for (group, members) in self.groups.groups() {
            let Some(rep) = members.representative() else {
                continue;
            };
            let key = key_of(rep)?;
            index.insert(key, group);
            keys.insert(group, key);
        }
        self.index = index;
        self.keys = keys;
        Ok(())
    }

    #[must_use]
    pub fn groups(&self) -> &MergeGroups<K> {
        &self.groups
    }

    #[must_use]
    pub fn into_groups(self) -> MergeGroups<K> {
        self.groups
    }
}

impl<K: ElementKey, Q: Copy + Eq + Hash> Clone for KeyedGroups<K, Q> {
    fn clone(&self) -> Self {
        let (groups, remap) = self.groups.clone_remapped();
        let keys: HashMap<GroupKey, Q> = self
            .keys
            .iter()
            .filter_map(|(group, &key)| remap.get(group).map(|&copied| (copied, key)))
            .collect();
        let index = keys.iter().map(|(&group, &key)| (key, group)).collect();
        Self { groups, index, keys }
    }
}

impl<K: ElementKey, Q: Copy + Eq + Hash> Default for KeyedGroups<K, Q> {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups the vertices of a 3D store by exactly equal position.
///
/// # Errors
///
/// Returns an error only if the store is internally inconsistent.
pub fn merge_vertices_by_position(
    store: &SubobjectStore,
) -> Result<KeyedGroups<VertexId, PositionKey>, MeshError> {
    let mut merged = KeyedGroups::new();
    for vertex in store.vertices().iter() {
        merged.add(vertex.id(), position_key(&vertex.pos()))?;
    }
    Ok(merged)
}

/// Edge key under the given vertex grouping.
///
/// # Errors
///
/// Returns a lookup error if the edge or one of its endpoints is unknown.
pub fn edge_key(
    store: &SubobjectStore,
    vertices: &MergeGroups<VertexId>,
    edge: EdgeId,
) -> Result<EndpointKey, MeshError> {
    let [start, end] = store.edge(edge)?.vertex_ids();
    Ok(endpoint_key(
        vertices.representative(start)?,
        vertices.representative(end)?,
    ))
}

/// Groups edges whose endpoints fall into the same pair of vertex groups.
///
/// One pass over the edges with a lookup keyed by the unordered pair of
/// endpoint representatives.
///
/// # Errors
///
/// Returns a lookup error if an edge endpoint is missing from `vertices`.
pub fn merge_edges_by_endpoints(
    store: &SubobjectStore,
    vertices: &MergeGroups<VertexId>,
) -> Result<KeyedGroups<EdgeId, EndpointKey>, MeshError> {
    let mut merged = KeyedGroups::new();
    for edge in store.edges().ids() {
        merged.add(edge, edge_key(store, vertices, edge)?)?;
    }
    Ok(merged)
}

/// Groups the vertices of a UV store by equal UV coordinate, restricted to
/// vertices that are already coincident in 3D.
///
/// Every resulting group is a subset of one group of `geometry_vertices`.
///
/// # Errors
///
/// Returns a lookup error if a UV vertex has no 3D group.
pub fn merge_vertices_by_uv(
    uv_store: &SubobjectStore,
    geometry_vertices: &MergeGroups<VertexId>,
) -> Result<KeyedGroups<VertexId, UvKey>, MeshError> {
    let mut merged = KeyedGroups::new();
    for vertex in uv_store.vertices().iter() {
        let [u, _, v] = position_key(&vertex.pos());
        let rep = geometry_vertices.representative(vertex.id())?;
        merged.add(vertex.id(), (rep, [u, v]))?;
    }
    Ok(merged)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn signed_zero_shares_a_key() {
        assert_eq!(
            position_key(&Point3::new(-0.0, 1.0, 0.0)),
            position_key(&Point3::new(0.0, 1.0, -0.0))
        );
        assert_ne!(
            position_key(&Point3::new(0.0, 1.0, 0.0)),
            position_key(&Point3::new(0.0, 1.0 + f64::EPSILON, 0.0))
        );
    }

    #[test]
    fn endpoint_key_is_unordered() {
        let a = VertexId::from_raw(4);
        let b = VertexId::from_raw(9);
        assert_eq!(endpoint_key(a, b), endpoint_key(b, a));
    }

    #[test]
    fn keyed_groups_forget_dissolved_keys() {
        let mut groups: KeyedGroups<VertexId, u8> = KeyedGroups::new();
        let a = groups.add(VertexId::from_raw(1), 7).unwrap();
        assert_eq!(groups.add(VertexId::from_raw(2), 7).unwrap(), a);
        groups.remove(VertexId::from_raw(1)).unwrap();
        groups.remove(VertexId::from_raw(2)).unwrap();
        let b = groups.add(VertexId::from_raw(3), 7).unwrap();
        assert_eq!(groups.groups().group_of(VertexId::from_raw(3)).unwrap().len(), 1);
        assert!(groups.groups().group(b).is_some());
    }

    #[test]
    fn reindex_follows_new_representatives() {
        let mut groups: KeyedGroups<VertexId, u64> = KeyedGroups::new();
        groups.add(VertexId::from_raw(1), 1).unwrap();
        groups.add(VertexId::from_raw(2), 1).unwrap();
        groups.remove(VertexId::from_raw(1)).unwrap();
        groups.reindex(|rep| Ok(rep.raw() * 10)).unwrap();
        let joined = groups.add(VertexId::from_raw(3), 20).unwrap();
        assert_eq!(groups.groups().group_key(VertexId::from_raw(2)).unwrap(), joined);
    }
}
