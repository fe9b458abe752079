use std::collections::{HashMap, HashSet};

use crate::error::LookupError;
use crate::topology::{EdgeId, SubobjectStore};

/// One seam line: an edge and the render rows of its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeamSegment {
    pub edge: EdgeId,
    pub rows: [usize; 2],
}

/// Line segments drawn for the seam edges of a UV data object.
///
/// Each batch of added seams is appended in the order its edges occupy in
/// the edge line primitive, so the segments can be copied straight out of
/// the edge buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeamBuffer {
    segments: Vec<SeamSegment>,
}

impl SeamBuffer {
    #[must_use]
    pub fn segments(&self) -> &[SeamSegment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments for `edges`, sorted by their position in the edge primitive.
    pub(crate) fn segments_for(
        store: &SubobjectStore,
        primitive_order: &HashMap<EdgeId, usize>,
        edges: &[EdgeId],
    ) -> Result<Vec<SeamSegment>, LookupError> {
        let mut ordered = Vec::with_capacity(edges.len());
        for &edge in edges {
            let position = primitive_order
                .get(&edge)
                .copied()
                .ok_or_else(|| LookupError::missing(edge))?;
            let rows = store.edge_rows(edge)?;
            ordered.push((position, SeamSegment { edge, rows }));
        }
        ordered.sort_by_key(|&(position, _)| position);
        Ok(ordered.into_iter().map(|(_, segment)| segment).collect())
    }

    pub(crate) fn append(&mut self, segments: Vec<SeamSegment>) {
        self.segments.extend(segments);
    }

    pub(crate) fn replace(&mut self, segments: Vec<SeamSegment>) {
        self.segments = segments;
    }

    pub(crate) fn remove(&mut self, edges: &HashSet<EdgeId>) {
        self.segments.retain(|s| !edges.contains(&s.edge));
    }
}
