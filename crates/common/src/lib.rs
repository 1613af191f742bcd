//! Shared value types: entity ids, transforms, colors and viewport sizes.

mod types;

pub use types::{Color, EntityId, Transform, Viewport};
