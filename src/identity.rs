use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::config::PickingConfig;
use crate::error::{IdentityError, Result};
use crate::topology::{Category, ElementKey, ObjectId, PerCategory};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique geometry object ID.
pub(crate) fn next_object_id() -> ObjectId {
    ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Picking IDs of one category: everything in `1..=high` is issued except
/// the IDs in `released`.
#[derive(Debug, Clone, Default)]
struct PickingIdPool {
    high: u32,
    released: BTreeSet<u32>,
}

impl PickingIdPool {
    fn available(&self, limit: u32) -> usize {
        (limit - self.high) as usize + self.released.len()
    }

    fn take(&mut self) -> u32 {
        if let Some(id) = self.released.pop_first() {
            return id;
        }
        self.high += 1;
        self.high
    }

    fn give_back(&mut self, id: u32) -> bool {
        if id == 0 || id > self.high || !self.released.insert(id) {
            return false;
        }
        while self.high > 0 && self.released.remove(&self.high) {
            self.high -= 1;
        }
        true
    }
}

/// Allocates element IDs and per-category picking IDs for one geometry object.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    config: PickingConfig,
    last_element: u64,
    picking: PerCategory<PickingIdPool>,
}

impl IdentityRegistry {
    /// Creates a registry with the given picking configuration.
    #[must_use]
    pub fn new(config: PickingConfig) -> Self {
        Self {
            config,
            last_element: 0,
            picking: PerCategory::default(),
        }
    }

    /// Returns the picking configuration.
    #[must_use]
    pub fn config(&self) -> &PickingConfig {
        &self.config
    }

    /// Returns a fresh element ID. IDs increase monotonically and are never reused.
    pub fn next_element_id<K: ElementKey>(&mut self) -> K {
        self.last_element += 1;
        K::from_raw(self.last_element)
    }

    /// Returns the smallest picking ID not currently in use for `category`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::PickingIdsExhausted`] if every ID representable
    /// by the configured color width is in use.
    pub fn next_picking_id(&mut self, category: Category) -> Result<u32> {
        Ok(self.next_picking_ids(category, 1)?[0])
    }

    /// Allocates `count` picking IDs at once, or none at all.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::PickingIdsExhausted`] if fewer than `count`
    /// IDs are left for `category`.
    pub fn next_picking_ids(&mut self, category: Category, count: usize) -> Result<Vec<u32>> {
        let limit = self.config.id_limit();
        let pool = &mut self.picking[category];
        if pool.available(limit) < count {
            return Err(IdentityError::PickingIdsExhausted { category, limit }.into());
        }
        Ok((0..count).map(|_| pool.take()).collect())
    }

    /// Returns a picking ID to the pool once its element has been destroyed.
    ///
    /// Returns `false` if the ID was not in use.
    pub fn release_picking_id(&mut self, category: Category, id: u32) -> bool {
        let released = self.picking[category].give_back(id);
        if !released {
            warn!(%category, id, "released picking id that was not in use");
        }
        released
    }

    /// Returns the number of picking IDs currently in use for `category`.
    #[must_use]
    pub fn live_picking_ids(&self, category: Category) -> usize {
        let pool = &self.picking[category];
        pool.high as usize - pool.released.len()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new(PickingConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::topology::{EdgeId, VertexId};

    #[test]
    fn element_ids_are_monotonic_across_categories() {
        let mut registry = IdentityRegistry::default();
        let a: VertexId = registry.next_element_id();
        let b: EdgeId = registry.next_element_id();
        let c: VertexId = registry.next_element_id();
        assert!(a.raw() < b.raw());
        assert!(b.raw() < c.raw());
    }

    #[test]
    fn picking_ids_are_per_category() {
        let mut registry = IdentityRegistry::default();
        assert_eq!(registry.next_picking_id(Category::Vertex).unwrap(), 1);
        assert_eq!(registry.next_picking_id(Category::Vertex).unwrap(), 2);
        assert_eq!(registry.next_picking_id(Category::Edge).unwrap(), 1);
    }

    #[test]
    fn released_ids_are_reused_smallest_first() {
        let mut registry = IdentityRegistry::default();
        let ids = registry.next_picking_ids(Category::Polygon, 5).unwrap();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(registry.release_picking_id(Category::Polygon, 4));
        assert!(registry.release_picking_id(Category::Polygon, 2));
        assert_eq!(registry.next_picking_id(Category::Polygon).unwrap(), 2);
        assert_eq!(registry.next_picking_id(Category::Polygon).unwrap(), 4);
        assert_eq!(registry.next_picking_id(Category::Polygon).unwrap(), 6);
    }

    #[test]
    fn releasing_the_highest_id_shrinks_the_pool() {
        let mut registry = IdentityRegistry::default();
        registry.next_picking_ids(Category::Edge, 3).unwrap();
        assert!(registry.release_picking_id(Category::Edge, 2));
        assert!(registry.release_picking_id(Category::Edge, 3));
        assert_eq!(registry.live_picking_ids(Category::Edge), 1);
        assert_eq!(registry.next_picking_id(Category::Edge).unwrap(), 2);
    }

    #[test]
    fn double_release_is_rejected() {
        let mut registry = IdentityRegistry::default();
        let id = registry.next_picking_id(Category::Vertex).unwrap();
        assert!(registry.release_picking_id(Category::Vertex, id));
        assert!(!registry.release_picking_id(Category::Vertex, id));
        assert!(!registry.release_picking_id(Category::Vertex, 0));
    }

    #[test]
    fn exhaustion_is_an_error_not_a_wraparound() {
        let mut registry = IdentityRegistry::new(PickingConfig::new(2).unwrap());
        registry.next_picking_ids(Category::Vertex, 3).unwrap();
        let err = registry.next_picking_id(Category::Vertex).unwrap_err();
        assert!(matches!(
            err,
            MeshError::Identity(IdentityError::PickingIdsExhausted { limit: 3, .. })
        ));
    }

    #[test]
    fn batch_allocation_is_all_or_nothing() {
        let mut registry = IdentityRegistry::new(PickingConfig::new(2).unwrap());
        registry.next_picking_id(Category::Edge).unwrap();
        assert!(registry.next_picking_ids(Category::Edge, 3).is_err());
        assert_eq!(registry.live_picking_ids(Category::Edge), 1);
    }
}
