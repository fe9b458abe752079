//! Merge groups: equivalence classes of coincident elements.
//!
//! Groups live in an arena and are addressed by [`GroupKey`]. Every member
//! maps to the key of its group, so all members share one group record, and
//! membership changes always go through [`MergeGroups`].

pub mod build;

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::{LookupError, MeshError, TopologyError};
use crate::topology::ElementKey;

slotmap::new_key_type! {
    /// Handle of a merge group within one [`MergeGroups`] arena.
    pub struct GroupKey;
}

/// A non-empty set of coincident elements of one kind.
///
/// The first member is the representative: it stays fixed while members are
/// added, which keeps lookups keyed by it stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup<K> {
    members: Vec<K>,
}

impl<K: ElementKey> MergeGroup<K> {
    /// Creates a detached group from a list of members.
    ///
    /// Detached groups are not registered with any arena; they are used to
    /// pass ad hoc element sets through group-based paths such as selection.
    #[must_use]
    pub fn from_members(members: Vec<K>) -> Self {
        Self { members }
    }

    /// The representative member, or `None` for an empty detached group.
    #[must_use]
    pub fn representative(&self) -> Option<K> {
        self.members.first().copied()
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.members.contains(&id)
    }

    #[must_use]
    pub fn members(&self) -> &[K] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.members.iter().copied()
    }
}

/// Arena of merge groups partitioning the elements of one kind in one space.
#[derive(Debug)]
pub struct MergeGroups<K: ElementKey> {
    groups: SlotMap<GroupKey, MergeGroup<K>>,
    membership: HashMap<K, GroupKey>,
}

impl<K: ElementKey> MergeGroups<K> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: SlotMap::with_key(),
            membership: HashMap::new(),
        }
    }

    /// Creates a new group holding only `id`.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicateMember` if `id` already belongs to a group.
    pub fn create_group(&mut self, id: K) -> Result<GroupKey, MeshError> {
        self.ensure_ungrouped(id)?;
        let key = self.groups.insert(MergeGroup { members: vec![id] });
        self.membership.insert(id, key);
        Ok(key)
    }

    /// Adds `id` to an existing group.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::GroupNotFound` if `group` does not exist, or
    /// `TopologyError::DuplicateMember` if `id` already belongs to a group.
    pub fn insert(&mut self, group: GroupKey, id: K) -> Result<(), MeshError> {
        self.ensure_ungrouped(id)?;
        self.groups
            .get_mut(group)
            .ok_or(LookupError::GroupNotFound)?
            .members
            .push(id);
        self.membership.insert(id, group);
        Ok(())
    }

    /// Moves every member of `absorbed` into `kept` and drops `absorbed`.
    ///
    /// Returns the surviving key.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::GroupNotFound` if either group does not exist.
    pub fn union(&mut self, kept: GroupKey, absorbed: GroupKey) -> Result<GroupKey, MeshError> {
        if kept == absorbed {
            return Ok(kept);
        }
        if !self.groups.contains_key(kept) {
            return Err(LookupError::GroupNotFound.into());
        }
        let moved = self.groups.remove(absorbed).ok_or(LookupError::GroupNotFound)?;
        for &id in &moved.members {
            self.membership.insert(id, kept);
        }
        if let Some(group) = self.groups.get_mut(kept) {
            group.members.extend(moved.members);
        }
        Ok(kept)
    }

    /// Detaches `id` from its group, dissolving the group if it becomes empty.
    ///
    /// Returns the key of the group `id` was removed from, or `None` if the
    /// group was dissolved.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotGrouped` if `id` is not a member of any group.
    pub fn remove(&mut self, id: K) -> Result<Option<GroupKey>, MeshError> {
        let key = self.membership.remove(&id).ok_or_else(|| not_grouped(id))?;
        let Some(group) = self.groups.get_mut(key) else {
            return Err(LookupError::GroupNotFound.into());
        };
        group.members.retain(|&m| m != id);
        if group.members.is_empty() {
            self.groups.remove(key);
            return Ok(None);
        }
        Ok(Some(key))
    }

    /// Key of the group containing `id`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotGrouped` if `id` is not a member of any group.
    pub fn group_key(&self, id: K) -> Result<GroupKey, LookupError> {
        self.membership.get(&id).copied().ok_or_else(|| not_grouped(id))
    }

    /// The group containing `id`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotGrouped` if `id` is not a member of any group.
    pub fn group_of(&self, id: K) -> Result<&MergeGroup<K>, LookupError> {
        let key = self.group_key(id)?;
        self.groups.get(key).ok_or(LookupError::GroupNotFound)
    }

    /// Representative of the group containing `id`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotGrouped` if `id` is not a member of any group.
    pub fn representative(&self, id: K) -> Result<K, LookupError> {
        self.group_of(id)?.representative().ok_or_else(|| not_grouped(id))
    }

    /// Returns `true` if `a` and `b` belong to the same group.
    #[must_use]
    pub fn are_merged(&self, a: K, b: K) -> bool {
        match (self.membership.get(&a), self.membership.get(&b)) {
            (Some(ka), Some(kb)) => ka == kb,
            _ => false,
        }
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.membership.contains_key(&id)
    }

    #[must_use]
    pub fn group(&self, key: GroupKey) -> Option<&MergeGroup<K>> {
        self.groups.get(key)
    }

    /// Iterates over all groups.
    pub fn groups(&self) -> impl Iterator<Item = (GroupKey, &MergeGroup<K>)> {
        self.groups.iter()
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of grouped elements.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.membership.len()
    }

    /// Returns `true` if the groups partition exactly the given IDs: every ID
    /// is in one group and no group holds anything else.
    pub fn partitions(&self, ids: impl IntoIterator<Item = K>) -> bool {
        let mut count = 0;
        for id in ids {
            let Some(&key) = self.membership.get(&id) else {
                return false;
            };
            if !self.groups.get(key).is_some_and(|g| g.contains(id)) {
                return false;
            }
            count += 1;
        }
        let grouped: usize = self.groups.values().map(MergeGroup::len).sum();
        count == self.membership.len() && grouped == count
    }

    /// Deep-copies the arena into freshly allocated groups.
    ///
    /// Returns the copy and a table mapping each original key to the key of
    /// its copy. Groups are copied exactly once, in arena order, and every
    /// member of the copy refers to the copied group.
    #[must_use]
    pub fn clone_remapped(&self) -> (Self, HashMap<GroupKey, GroupKey>) {
        let mut copy = Self::new();
        let mut remap = HashMap::with_capacity(self.groups.len());
        for (key, group) in &self.groups {
            let new_key = copy.groups.insert(group.clone());
            remap.insert(key, new_key);
        }
        for (&id, key) in &self.membership {
            if let Some(&new_key) = remap.get(key) {
                copy.membership.insert(id, new_key);
            }
        }
        (copy, remap)
    }

    fn ensure_ungrouped(&self, id: K) -> Result<(), MeshError> {
        if self.membership.contains_key(&id) {
            return Err(TopologyError::DuplicateMember(id.to_string()).into());
        }
        Ok(())
    }
}

impl<K: ElementKey> Default for MergeGroups<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ElementKey> Clone for MergeGroups<K> {
    fn clone(&self) -> Self {
        self.clone_remapped().0
    }
}

fn not_grouped<K: ElementKey>(id: K) -> LookupError {
    LookupError::NotGrouped {
        category: K::CATEGORY,
        id: id.raw(),
    }
}
