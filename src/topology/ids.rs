use std::fmt;
use std::hash::Hash;

use super::category::Category;

/// Common behavior of the typed element identifiers.
///
/// All three ID types draw from one counter per geometry object, so the raw
/// value is unique across categories, and a category-tagged `u64` can always
/// be converted back into the typed ID.
pub trait ElementKey: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {
    /// The category this ID identifies.
    const CATEGORY: Category;

    /// Wraps a raw identifier.
    fn from_raw(raw: u64) -> Self;

    /// Returns the raw identifier.
    fn raw(self) -> u64;
}

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident => $category:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u64);

        impl ElementKey for $name {
            const CATEGORY: Category = $category;

            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $category.name(), self.0)
            }
        }
    };
}

element_id! {
    /// Unique identifier for a vertex within a geometry object.
    VertexId => Category::Vertex
}

element_id! {
    /// Unique identifier for an edge within a geometry object.
    EdgeId => Category::Edge
}

element_id! {
    /// Unique identifier for a polygon within a geometry object.
    PolygonId => Category::Polygon
}

/// Process-unique identifier of a geometry object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    /// Returns the raw identifier.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The topological space a subobject record lives in.
///
/// Records hold this instead of a reference to their owner; the owner is
/// resolved by whoever holds the geometry or UV data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// The 3D geometry of an object.
    Geometry(ObjectId),
    /// A UV projection of an object's geometry, for the given channel.
    /// Detached copies carry no channel.
    Uv(ObjectId, Option<usize>),
}

impl Space {
    /// The geometry object this space belongs to.
    #[must_use]
    pub fn object(self) -> ObjectId {
        match self {
            Space::Geometry(object) | Space::Uv(object, _) => object,
        }
    }
}
