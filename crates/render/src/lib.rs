//! Graphics device interface.
//!
//! # Invariants
//! - A device never mutates the scene it draws.
//! - `dispose` releases the device's resources once; a disposed device refuses to draw.
//!
//! The headless device records what it was asked to draw instead of touching a
//! GPU, for command-line runs and tests.

mod device;
mod headless;

pub use device::{DeviceOptions, GraphicsDevice, RenderError};
pub use headless::{
    DeviceLog, DrawFault, FaultSwitch, FrameRecord, HeadlessDevice, SharedDeviceLog, describe_frame,
};
