//! wgpu graphics device.
//!
//! Draws mesh entities (basic and normal-shaded materials) and line helpers
//! (grid, axes) into a window surface, with optional 4x multisampling.
//!
//! # Invariants
//! - The device never mutates the scene.
//! - GPU geometry is uploaded once per entity and dropped with it.
//! - After `dispose` every GPU object is released and drawing fails with
//!   `RenderError::Disposed`.

mod device;
mod gpu;
mod shaders;

pub use device::{DeviceInitError, DrawableExtent, WgpuDevice};
