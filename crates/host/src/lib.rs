//! Host surface: the environment a viewer is embedded in.
//!
//! # Invariants
//! - At most one frame is pending per host; requesting another replaces it.
//! - A canceled frame handle is never delivered.
//! - Hosts are passed to the viewer explicitly, never looked up globally.

pub mod manual;
pub mod surface;

pub use manual::{HeadlessMount, HeadlessMountError, ManualHost};
pub use surface::{FrameHandle, HostDispatch, HostSurface, ListenerId, MountPoint};
