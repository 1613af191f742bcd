//! Scene graph: the entities a viewer draws and the camera it draws them through.
//!
//! # Invariants
//! - Entities are owned by exactly one `Scene` and addressed by a stable `EntityId`.
//! - Iteration order is deterministic (BTreeMap).
//! - Geometry is generated on the CPU; backends only upload it.

pub mod camera;
pub mod geometry;
pub mod scene;

pub use camera::PerspectiveCamera;
pub use geometry::{AxesHelper, Geometry, GridHelper, LineVertex, MeshData, MeshVertex};
pub use scene::{Entity, EntityKind, Material, Scene};
