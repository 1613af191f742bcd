use cubescene_common::Viewport;
use cubescene_host::{FrameHandle, HostDispatch, HostSurface, ListenerId, MountPoint};
use cubescene_render::DeviceOptions;
use cubescene_render_wgpu::{DeviceInitError, WgpuDevice};
use std::collections::BTreeSet;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Host backed by a winit window.
///
/// A frame request becomes `request_redraw`; the matching `RedrawRequested`
/// event hands the pending handle back through [`HostDispatch`].
pub struct WindowHost {
    window: Arc<Window>,
    listeners: BTreeSet<ListenerId>,
    pending: Option<FrameHandle>,
    next_id: u64,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            listeners: BTreeSet::new(),
            pending: None,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl HostSurface for WindowHost {
    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // winit cannot retract a redraw request; dropping the handle is enough.
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

impl HostDispatch for WindowHost {
    fn take_due_frame(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    fn resize_listeners(&self) -> Vec<ListenerId> {
        self.listeners.iter().copied().collect()
    }
}

/// The window's client area, as a place to put a wgpu surface.
pub struct WindowMount {
    window: Arc<Window>,
    instance: wgpu::Instance,
}

impl WindowMount {
    pub fn new(window: Arc<Window>) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Self { window, instance }
    }
}

impl MountPoint for WindowMount {
    type Device = WgpuDevice;
    type Error = DeviceInitError;

    fn client_size(&self) -> Viewport {
        logical_size(self.window.inner_size(), self.window.scale_factor())
    }

    fn bind_device(&mut self, options: DeviceOptions) -> Result<WgpuDevice, DeviceInitError> {
        let device = pollster::block_on(WgpuDevice::new(
            &self.instance,
            self.window.clone(),
            self.client_size(),
            self.window.scale_factor(),
            options,
        ))?;
        let window = self.window.clone();
        Ok(device.with_drawable_extent(move || drawable_size(window.inner_size())))
    }
}

/// Client area in whole logical pixels.
fn logical_size(inner: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical = inner.to_logical::<u32>(scale_factor);
    Viewport::new(logical.width, logical.height)
}

/// Client area in physical pixels, exactly as the platform reports it.
fn drawable_size(inner: PhysicalSize<u32>) -> Viewport {
    Viewport::new(inner.width, inner.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawable_matches_window_at_fractional_scale() {
        let inner = PhysicalSize::new(1000, 700);
        assert_eq!(logical_size(inner, 1.5), Viewport::new(667, 467));
        assert_eq!(drawable_size(inner), Viewport::new(1000, 700));
        // Scaling the rounded logical size back overshoots the window.
        assert_ne!(logical_size(inner, 1.5).physical(1.5), drawable_size(inner));
    }

    #[test]
    fn integer_scale_round_trips() {
        let inner = PhysicalSize::new(2560, 1440);
        assert_eq!(logical_size(inner, 2.0), Viewport::new(1280, 720));
        assert_eq!(logical_size(inner, 2.0).physical(2.0), drawable_size(inner));
    }
}
