use std::collections::{HashMap, HashSet};

use crate::merge::MergeGroup;
use crate::topology::{Category, EdgeId, ElementKey, PerCategory};

/// Whether an element is part of the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionBucket {
    Selected,
    Unselected,
}

/// How an edge is drawn: as a seam or as an ordinary edge, in either
/// selection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeHighlight {
    Plain(SelectionBucket),
    Seam(SelectionBucket),
}

/// Per-category selection of a UV data object.
///
/// Selection changes take merge groups, so picking one element of a group
/// selects everything coincident with it.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: PerCategory<Vec<u64>>,
    lookup: PerCategory<HashSet<u64>>,
    edge_highlights: HashMap<EdgeId, EdgeHighlight>,
}

impl Selection {
    /// Raw IDs of the selected elements of `category`, in selection order.
    #[must_use]
    pub fn selected_ids(&self, category: Category) -> &[u64] {
        &self.selected[category]
    }

    /// Typed IDs of the selected elements of `K`'s category.
    #[must_use]
    pub fn selected<K: ElementKey>(&self) -> Vec<K> {
        self.selected[K::CATEGORY].iter().map(|&raw| K::from_raw(raw)).collect()
    }

    #[must_use]
    pub fn bucket<K: ElementKey>(&self, id: K) -> SelectionBucket {
        if self.lookup[K::CATEGORY].contains(&id.raw()) {
            SelectionBucket::Selected
        } else {
            SelectionBucket::Unselected
        }
    }

    /// How an edge is currently drawn.
    #[must_use]
    pub fn edge_highlight(&self, id: EdgeId) -> EdgeHighlight {
        self.edge_highlights
            .get(&id)
            .copied()
            .unwrap_or(EdgeHighlight::Plain(self.bucket(id)))
    }

    /// Selects every member of `to_select` and deselects every member of
    /// `to_deselect`, redrawing affected edges as seams or plain edges
    /// according to `seams`.
    pub(crate) fn update<K: ElementKey>(
        &mut self,
        to_select: &[&MergeGroup<K>],
        to_deselect: &[&MergeGroup<K>],
        seams: &HashSet<EdgeId>,
    ) {
        let category = K::CATEGORY;
        for id in to_select.iter().flat_map(|g| g.iter()) {
            if self.lookup[category].insert(id.raw()) {
                self.selected[category].push(id.raw());
            }
        }
        let deselected: HashSet<u64> = to_deselect
            .iter()
            .flat_map(|g| g.iter())
            .map(ElementKey::raw)
            .filter(|raw| self.lookup[category].remove(raw))
            .collect();
        if !deselected.is_empty() {
            self.selected[category].retain(|raw| !deselected.contains(raw));
        }

        if category == Category::Edge {
            let touched = to_select
                .iter()
                .chain(to_deselect)
                .flat_map(|g| g.iter())
                .map(|id| EdgeId::from_raw(id.raw()));
            for edge in touched.collect::<Vec<_>>() {
                let bucket = self.bucket(edge);
                let highlight = if seams.contains(&edge) {
                    EdgeHighlight::Seam(bucket)
                } else {
                    EdgeHighlight::Plain(bucket)
                };
                self.edge_highlights.insert(edge, highlight);
            }
        }
    }

    /// Redraws `edges` as seams, keeping their selection state.
    pub(crate) fn highlight_seams(&mut self, edges: &[EdgeId]) {
        for &edge in edges {
            let bucket = self.bucket(edge);
            self.edge_highlights.insert(edge, EdgeHighlight::Seam(bucket));
        }
    }

    /// Deselects everything in `category`.
    pub(crate) fn clear(&mut self, category: Category, seams: &HashSet<EdgeId>) {
        let cleared = std::mem::take(&mut self.selected[category]);
        self.lookup[category].clear();
        if category == Category::Edge {
            for raw in cleared {
                let edge = EdgeId::from_raw(raw);
                let highlight = if seams.contains(&edge) {
                    EdgeHighlight::Seam(SelectionBucket::Unselected)
                } else {
                    EdgeHighlight::Plain(SelectionBucket::Unselected)
                };
                self.edge_highlights.insert(edge, highlight);
            }
        }
    }
}
