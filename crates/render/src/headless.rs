use crate::device::{DeviceOptions, GraphicsDevice, RenderError};
use cubescene_common::{EntityId, Transform, Viewport};
use cubescene_scene::{PerspectiveCamera, Scene};
use glam::Mat4;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// What a headless device was asked to draw for one frame.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// 1-based frame number.
    pub index: u64,
    /// Drawable size in physical pixels.
    pub physical: Viewport,
    pub view_projection: Mat4,
    pub transforms: BTreeMap<EntityId, Transform>,
    pub text: String,
}

/// Everything a headless device observed over its lifetime.
#[derive(Debug, Clone, Default)]
pub struct DeviceLog {
    pub frames: u64,
    /// Every size the device was set to, in order.
    pub sizes: Vec<Viewport>,
    pub pixel_ratio: f64,
    pub last_frame: Option<FrameRecord>,
    pub disposals: u32,
    /// Options of the most recently bound device.
    pub options: Option<DeviceOptions>,
}

/// Log handle shared between a headless device and whoever created it.
pub type SharedDeviceLog = Rc<RefCell<DeviceLog>>;

/// Failure a headless device can be told to report instead of drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawFault {
    Backend,
    SurfaceLost,
}

/// Switch shared with a headless device; while set, every draw fails.
pub type FaultSwitch = Rc<Cell<Option<DrawFault>>>;

/// Device that records draws instead of rasterizing them.
#[derive(Debug)]
pub struct HeadlessDevice {
    size: Viewport,
    pixel_ratio: f64,
    disposed: bool,
    log: SharedDeviceLog,
    fault: FaultSwitch,
}

impl HeadlessDevice {
    pub fn new(options: DeviceOptions) -> Self {
        Self::with_log(options, SharedDeviceLog::default())
    }

    pub fn with_log(options: DeviceOptions, log: SharedDeviceLog) -> Self {
        log.borrow_mut().options = Some(options);
        Self {
            size: Viewport::default(),
            pixel_ratio: 1.0,
            disposed: false,
            log,
            fault: FaultSwitch::default(),
        }
    }

    /// Share `switch` so the creator can make draws fail later.
    pub fn with_fault_switch(mut self, switch: FaultSwitch) -> Self {
        self.fault = switch;
        self
    }

    pub fn log(&self) -> SharedDeviceLog {
        Rc::clone(&self.log)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.log.borrow_mut().pixel_ratio = ratio;
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, size: Viewport) {
        if self.disposed {
            return;
        }
        self.size = size;
        self.log.borrow_mut().sizes.push(size);
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        match self.fault.get() {
            Some(DrawFault::Backend) => {
                return Err(RenderError::Backend("injected draw failure".into()));
            }
            Some(DrawFault::SurfaceLost) => return Err(RenderError::SurfaceLost),
            None => {}
        }
        let mut log = self.log.borrow_mut();
        log.frames += 1;
        let index = log.frames;
        tracing::trace!(frame = index, size = %self.size, "headless frame");
        log.last_frame = Some(FrameRecord {
            index,
            physical: self.size.physical(self.pixel_ratio),
            view_projection: camera.view_projection(),
            transforms: scene
                .entities()
                .iter()
                .map(|(id, e)| (*id, e.transform))
                .collect(),
            text: describe_frame(scene, camera),
        });
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.log.borrow_mut().disposals += 1;
        tracing::debug!("headless device disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Human-readable dump of a scene and camera.
pub fn describe_frame(scene: &Scene, camera: &PerspectiveCamera) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Scene (background=#{:06x}) ===\n",
        scene.background().to_hex()
    ));
    out.push_str(&format!("Entities: {}\n", scene.len()));
    out.push_str(&format!(
        "Camera: pos=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}\n",
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.target.x,
        camera.target.y,
        camera.target.z,
        camera.fov,
        camera.aspect,
    ));

    for (id, entity) in scene.entities() {
        let p = entity.transform.position;
        let r = entity.transform.rotation;
        out.push_str(&format!(
            "  [{}] {:<6} {:<6} pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2})\n",
            id.short(),
            entity.name,
            entity.kind.label(),
            p.x,
            p.y,
            p.z,
            r.x,
            r.y,
            r.z
        ));
    }

    out
}
