pub mod config;
pub mod error;
pub mod geom;
pub mod identity;
pub mod math;
pub mod merge;
pub mod operations;
pub mod tessellation;
pub mod topology;
pub mod uv;

pub use config::PickingConfig;
pub use error::{MeshError, Result};
pub use geom::{GeomData, TexSeamRegistry};
pub use uv::{SeamSnapshot, UvData};
