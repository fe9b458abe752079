use thiserror::Error;

use crate::topology::Category;

/// Top-level error type for the mesh topology core.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised when topology data is inconsistent or an edit would corrupt it.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("malformed triangulation: {0}")]
    MalformedTriangulation(String),

    #[error("polygon boundary does not close into a single loop")]
    WindingNotClosed,

    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("{0} is already a member of a merge group")]
    DuplicateMember(String),

    #[error("edge {0} is already a seam edge")]
    SeamAlreadyPresent(String),

    #[error("edge {0} is not a seam edge")]
    SeamNotPresent(String),

    #[error("uv channel {0} is already bound to this uv data")]
    ChannelInUse(usize),
}

/// Errors raised by the identity registry.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("picking ids for category {category} exhausted (limit {limit})")]
    PickingIdsExhausted { category: Category, limit: u32 },

    #[error("invalid identity configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised when an ID passed to the core is unknown to it.
///
/// Every ID handed to an operation must have been produced by this crate,
/// so a miss indicates a caller bug rather than a user-facing condition.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{category} {id} not found")]
    NotFound { category: Category, id: u64 },

    #[error("{category} {id} does not belong to any merge group")]
    NotGrouped { category: Category, id: u64 },

    #[error("merge group not found")]
    GroupNotFound,
}

impl LookupError {
    /// Builds a [`LookupError::NotFound`] for a typed element ID.
    #[must_use]
    pub fn missing<K: crate::topology::ElementKey>(id: K) -> Self {
        Self::NotFound {
            category: K::CATEGORY,
            id: id.raw(),
        }
    }
}

/// Convenience type alias for results using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;
