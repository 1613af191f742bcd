use cubescene_common::Viewport;
use cubescene_render::{DeviceOptions, GraphicsDevice};

/// Opaque handle to a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Opaque handle to a registered resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Capabilities a viewer needs from its host environment.
pub trait HostSurface {
    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64;

    fn add_resize_listener(&mut self) -> ListenerId;

    fn remove_resize_listener(&mut self, id: ListenerId);

    /// Ask for one frame callback on the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Delivery side of a host: what is due to be handed to the viewer.
pub trait HostDispatch {
    /// Take the pending frame if it is due. Taking it consumes it.
    fn take_due_frame(&mut self) -> Option<FrameHandle>;

    /// Listeners to notify when the viewport changes.
    fn resize_listeners(&self) -> Vec<ListenerId>;
}

/// The element a drawable surface is inserted into.
pub trait MountPoint {
    type Device: GraphicsDevice;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current client size in logical pixels.
    fn client_size(&self) -> Viewport;

    /// Create a device whose drawable lives inside this mount point.
    fn bind_device(&mut self, options: DeviceOptions) -> Result<Self::Device, Self::Error>;
}
