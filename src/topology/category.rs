use std::fmt;
use std::ops::{Index, IndexMut};

/// The kind of a subobject element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// A vertex.
    Vertex,
    /// An edge.
    Edge,
    /// A polygon.
    Polygon,
}

impl Category {
    /// All categories, in table order.
    pub const ALL: [Category; 3] = [Category::Vertex, Category::Edge, Category::Polygon];

    /// Position of this category in a [`PerCategory`] table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Category::Vertex => 0,
            Category::Edge => 1,
            Category::Polygon => 2,
        }
    }

    /// Short name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Category::Vertex => "vert",
            Category::Edge => "edge",
            Category::Polygon => "poly",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-size table holding one value per [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerCategory<T>([T; 3]);

impl<T> PerCategory<T> {
    /// Builds a table by evaluating `f` once per category.
    pub fn from_fn(f: impl FnMut(Category) -> T) -> Self {
        Self(Category::ALL.map(f))
    }

    /// Iterates over `(category, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Category> for PerCategory<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.0[category.index()]
    }
}

impl<T> IndexMut<Category> for PerCategory<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.0[category.index()]
    }
}
