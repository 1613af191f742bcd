use cubescene_common::Viewport;
use cubescene_scene::{PerspectiveCamera, Scene};

/// Errors a device can report while drawing.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("device has been disposed")]
    Disposed,
    #[error("drawable surface lost; it will be reconfigured on the next frame")]
    SurfaceLost,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Creation options for a device bound to a mount point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceOptions {
    /// Multisample the color target.
    pub antialias: bool,
    /// Let the host composite through the cleared background.
    pub transparent: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            transparent: true,
        }
    }
}

/// A rendering context bound to a drawable surface.
///
/// Sizes are in logical pixels; the drawable itself is `size * pixel_ratio`.
pub trait GraphicsDevice {
    fn set_pixel_ratio(&mut self, ratio: f64);

    fn pixel_ratio(&self) -> f64;

    /// Resize the drawable and its viewport.
    fn set_size(&mut self, size: Viewport);

    fn size(&self) -> Viewport;

    /// Draw one frame of `scene` as seen through `camera`.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Release the underlying resources.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}
