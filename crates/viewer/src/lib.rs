//! Scene renderer: owns a scene, a camera and a graphics device, and keeps them
//! in step with the host it is mounted in.
//!
//! # Lifecycle
//! `Uninitialized -> Initialized -> Running -> Destroyed`. `start` performs the
//! first two transitions at once; `stop` performs the last. There is no way back
//! from `Destroyed`.
//!
//! # Invariants
//! - One cube per renderer; its id never changes while the renderer runs.
//! - At most one frame is pending, and it is canceled exactly once at teardown.
//! - Frames and resize notifications delivered after teardown are ignored.

pub mod config;
pub mod renderer;
pub mod setup;

pub use config::{CameraConfig, ConfigError, CubeConfig, GridConfig, GroundConfig, ViewerConfig};
pub use renderer::{RendererState, SceneRenderer, ViewerError};
pub use setup::{DemoScene, build_camera, build_scene};
