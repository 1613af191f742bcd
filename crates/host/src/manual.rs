use crate::surface::{FrameHandle, HostDispatch, HostSurface, ListenerId, MountPoint};
use cubescene_common::Viewport;
use cubescene_render::{DeviceOptions, DrawFault, FaultSwitch, HeadlessDevice, SharedDeviceLog};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Deterministic host driven by explicit calls instead of a display.
///
/// A frame requested through [`HostSurface::request_frame`] becomes due
/// immediately; the caller decides when to deliver it.
#[derive(Debug)]
pub struct ManualHost {
    pixel_ratio: f64,
    next_id: u64,
    listeners: BTreeSet<ListenerId>,
    pending: Option<FrameHandle>,
    requested: u64,
    canceled: Vec<FrameHandle>,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ManualHost {
    pub fn new(pixel_ratio: f64) -> Self {
        Self {
            pixel_ratio,
            next_id: 0,
            listeners: BTreeSet::new(),
            pending: None,
            requested: 0,
            canceled: Vec::new(),
        }
    }

    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total frames requested over the host's lifetime.
    pub fn requested_frames(&self) -> u64 {
        self.requested
    }

    /// Handles that were canceled while still pending.
    pub fn canceled_frames(&self) -> &[FrameHandle] {
        &self.canceled
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl HostSurface for ManualHost {
    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        if !self.listeners.remove(&id) {
            tracing::warn!(listener = id.0, "removing unknown resize listener");
        }
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        if let Some(previous) = self.pending.replace(handle) {
            tracing::warn!(previous = previous.0, "frame requested while another was pending");
        }
        self.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.canceled.push(handle);
        }
    }
}

impl HostDispatch for ManualHost {
    fn take_due_frame(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    fn resize_listeners(&self) -> Vec<ListenerId> {
        self.listeners.iter().copied().collect()
    }
}

/// Errors from binding a device to a headless mount.
#[derive(Debug, thiserror::Error)]
pub enum HeadlessMountError {
    #[error("mount point refused to bind a device")]
    Refused,
}

/// In-memory mount point that binds [`HeadlessDevice`]s.
///
/// Clones share the same size and device log, so a caller can keep a clone to
/// resize the mount or inspect draws after handing the original to a viewer.
#[derive(Debug, Clone)]
pub struct HeadlessMount {
    size: Rc<Cell<Viewport>>,
    log: SharedDeviceLog,
    refuse: Rc<Cell<bool>>,
    fault: FaultSwitch,
}

impl HeadlessMount {
    pub fn new(size: Viewport) -> Self {
        Self {
            size: Rc::new(Cell::new(size)),
            log: SharedDeviceLog::default(),
            refuse: Rc::new(Cell::new(false)),
            fault: FaultSwitch::default(),
        }
    }

    /// Change the client size, as a layout pass would.
    pub fn resize_to(&self, size: Viewport) {
        self.size.set(size);
    }

    /// Make subsequent binds fail.
    pub fn refuse_binding(&self) {
        self.refuse.set(true);
    }

    /// Make every draw on devices bound here fail with `fault`.
    pub fn fail_draws(&self, fault: DrawFault) {
        self.fault.set(Some(fault));
    }

    /// Let draws succeed again.
    pub fn restore_draws(&self) {
        self.fault.set(None);
    }

    /// Log shared with every device this mount has bound.
    pub fn device_log(&self) -> SharedDeviceLog {
        Rc::clone(&self.log)
    }
}

impl MountPoint for HeadlessMount {
    type Device = HeadlessDevice;
    type Error = HeadlessMountError;

    fn client_size(&self) -> Viewport {
        self.size.get()
    }

    fn bind_device(&mut self, options: DeviceOptions) -> Result<HeadlessDevice, HeadlessMountError> {
        if self.refuse.get() {
            return Err(HeadlessMountError::Refused);
        }
        Ok(HeadlessDevice::with_log(options, Rc::clone(&self.log))
            .with_fault_switch(Rc::clone(&self.fault)))
    }
}
