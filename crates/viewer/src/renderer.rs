use crate::config::ViewerConfig;
use crate::setup::{build_camera, build_scene};
use cubescene_common::{EntityId, Viewport};
use cubescene_host::{FrameHandle, HostDispatch, HostSurface, ListenerId, MountPoint};
use cubescene_render::{DeviceOptions, GraphicsDevice, RenderError};
use cubescene_scene::{PerspectiveCamera, Scene};
use glam::Vec3;

/// Where a [`SceneRenderer`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    /// Scene, camera and device exist; no frame scheduled yet.
    Initialized,
    Running,
    Destroyed,
}

/// Errors from starting a renderer.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("mount point has no drawable area ({0})")]
    EmptyMount(Viewport),
    #[error("cannot {operation} a renderer that is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: RendererState,
    },
    #[error("failed to bind graphics device: {0}")]
    Bind(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Resources that exist only between `start` and `stop`.
struct Active<M: MountPoint> {
    mount: M,
    device: M::Device,
    scene: Scene,
    camera: PerspectiveCamera,
    cube: EntityId,
    resize_listener: ListenerId,
    pending_frame: Option<FrameHandle>,
}

/// Drives a spinning-cube scene inside a host surface.
///
/// The host is injected at construction; the mount point arrives with
/// [`start`](Self::start). Frames and resize notifications are delivered back by
/// the host through [`on_frame`](Self::on_frame) and [`on_resize`](Self::on_resize).
pub struct SceneRenderer<H: HostSurface, M: MountPoint> {
    host: H,
    config: ViewerConfig,
    state: RendererState,
    active: Option<Active<M>>,
    frames_drawn: u64,
}

impl<H: HostSurface, M: MountPoint> SceneRenderer<H, M> {
    pub fn new(host: H, config: ViewerConfig) -> Self {
        Self {
            host,
            config,
            state: RendererState::Uninitialized,
            active: None,
            frames_drawn: 0,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Frames successfully drawn over the renderer's lifetime.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.active.as_ref().map(|a| &a.scene)
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.active.as_ref().map(|a| &a.camera)
    }

    pub fn device(&self) -> Option<&M::Device> {
        self.active.as_ref().map(|a| &a.device)
    }

    pub fn mount(&self) -> Option<&M> {
        self.active.as_ref().map(|a| &a.mount)
    }

    pub fn cube_id(&self) -> Option<EntityId> {
        self.active.as_ref().map(|a| a.cube)
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.active.as_ref().and_then(|a| a.pending_frame)
    }

    /// Build the scene inside `mount` and schedule the first frame.
    pub fn start(&mut self, mut mount: M) -> Result<(), ViewerError> {
        if self.state != RendererState::Uninitialized {
            return Err(ViewerError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        let size = mount.client_size();
        if size.is_empty() {
            return Err(ViewerError::EmptyMount(size));
        }

        let options = DeviceOptions {
            antialias: self.config.antialias,
            transparent: self.config.transparent,
        };
        let mut device = mount
            .bind_device(options)
            .map_err(|e| ViewerError::Bind(Box::new(e)))?;
        device.set_size(size);
        device.set_pixel_ratio(self.host.device_pixel_ratio());

        let demo = build_scene(&self.config);
        let camera = build_camera(&self.config, size);
        let resize_listener = self.host.add_resize_listener();

        self.active = Some(Active {
            mount,
            device,
            scene: demo.scene,
            camera,
            cube: demo.cube,
            resize_listener,
            pending_frame: None,
        });
        self.state = RendererState::Initialized;
        tracing::info!(
            %size,
            pixel_ratio = self.host.device_pixel_ratio(),
            cube = %demo.cube.short(),
            "scene initialized"
        );

        self.schedule_first_frame();
        Ok(())
    }

    fn schedule_first_frame(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.pending_frame = Some(self.host.request_frame());
            self.state = RendererState::Running;
        }
    }

    /// Advance the cube and draw one frame.
    ///
    /// Only the currently pending handle is honoured; anything else (a canceled
    /// or superseded handle, or any frame after teardown) is ignored. Returns
    /// whether a frame was drawn.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        let Some(active) = self.active.as_mut() else {
            tracing::debug!(frame = handle.0, state = ?self.state, "frame ignored");
            return false;
        };
        if active.pending_frame != Some(handle) {
            tracing::debug!(frame = handle.0, "stale frame ignored");
            return false;
        }

        // Schedule before drawing so a failed draw does not stop the loop.
        active.pending_frame = Some(self.host.request_frame());

        let [dx, dy] = self.config.cube.spin_per_frame;
        active.scene.rotate(active.cube, Vec3::new(dx, dy, 0.0));

        match active.device.render(&active.scene, &active.camera) {
            Ok(()) => {
                self.frames_drawn += 1;
                true
            }
            Err(RenderError::SurfaceLost) => {
                tracing::debug!("surface lost, frame skipped");
                false
            }
            Err(e) => {
                tracing::error!("draw failed: {e}");
                false
            }
        }
    }

    /// Mirror the mount's current size into the camera and device.
    ///
    /// No-op before `start`, after `stop`, for unknown listeners, and while the
    /// mount has no area. Returns whether anything changed.
    pub fn on_resize(&mut self, listener: ListenerId) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.resize_listener != listener {
            return false;
        }

        let size = active.mount.client_size();
        if size.is_empty() {
            tracing::debug!(%size, "resize to empty mount skipped");
            return false;
        }

        let ratio = self.host.device_pixel_ratio();
        if ratio != active.device.pixel_ratio() {
            active.device.set_pixel_ratio(ratio);
        }
        active.camera.aspect = size.aspect();
        active.camera.update_projection_matrix();
        active.device.set_size(size);
        tracing::debug!(%size, aspect = active.camera.aspect, "viewport resized");
        true
    }

    /// Unregister from the host, cancel the pending frame and release the device.
    ///
    /// Calling it again, or before `start`, does nothing.
    pub fn stop(&mut self) {
        if self.state != RendererState::Running {
            tracing::warn!(state = ?self.state, "stop ignored");
            return;
        }
        let Some(mut active) = self.active.take() else {
            return;
        };

        self.host.remove_resize_listener(active.resize_listener);
        if let Some(handle) = active.pending_frame.take() {
            self.host.cancel_frame(handle);
        }
        active.device.dispose();
        self.state = RendererState::Destroyed;
        tracing::info!(frames = self.frames_drawn, "scene torn down");
    }
}

impl<H: HostSurface + HostDispatch, M: MountPoint> SceneRenderer<H, M> {
    /// Deliver the host's due frame, if there is one.
    pub fn fire_frame(&mut self) -> bool {
        match self.host.take_due_frame() {
            Some(handle) => self.on_frame(handle),
            None => false,
        }
    }

    /// Deliver a resize notification to every registered listener.
    pub fn fire_resize(&mut self) -> bool {
        let mut changed = false;
        for listener in self.host.resize_listeners() {
            changed |= self.on_resize(listener);
        }
        changed
    }

    /// Deliver up to `count` frames; returns how many were drawn.
    pub fn pump(&mut self, count: u64) -> u64 {
        (0..count).filter(|_| self.fire_frame()).count() as u64
    }
}

impl<H: HostSurface, M: MountPoint> Drop for SceneRenderer<H, M> {
    fn drop(&mut self) {
        if self.state == RendererState::Running {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubescene_host::{HeadlessMount, ManualHost};

    type TestRenderer = SceneRenderer<ManualHost, HeadlessMount>;

    fn started(width: u32, height: u32) -> (TestRenderer, HeadlessMount) {
        let mount = HeadlessMount::new(Viewport::new(width, height));
        let mut renderer = SceneRenderer::new(ManualHost::new(2.0), ViewerConfig::default());
        renderer.start(mount.clone()).unwrap();
        (renderer, mount)
    }

    #[test]
    fn start_sets_camera_aspect_and_device_size() {
        let (renderer, mount) = started(800, 600);
        assert_eq!(renderer.state(), RendererState::Running);
        let camera = renderer.camera().unwrap();
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);

        let device = renderer.device().unwrap();
        assert_eq!(device.size(), Viewport::new(800, 600));
        assert_eq!(device.pixel_ratio(), 2.0);
        assert_eq!(mount.device_log().borrow().pixel_ratio, 2.0);
    }

    #[test]
    fn start_schedules_exactly_one_frame_and_one_listener() {
        let (renderer, _) = started(800, 600);
        assert_eq!(renderer.host().requested_frames(), 1);
        assert_eq!(renderer.host().listener_count(), 1);
        assert_eq!(renderer.pending_frame(), renderer.host().pending_frame());
    }

    #[test]
    fn frames_rotate_the_same_cube() {
        let (mut renderer, _) = started(800, 600);
        let cube = renderer.cube_id().unwrap();
        let before: Vec<_> = renderer.scene().unwrap().entities().keys().copied().collect();

        assert_eq!(renderer.pump(100), 100);

        assert_eq!(renderer.cube_id(), Some(cube));
        let scene = renderer.scene().unwrap();
        let after: Vec<_> = scene.entities().keys().copied().collect();
        assert_eq!(before, after);

        let rotation = scene.get(cube).unwrap().transform.rotation;
        assert!((rotation.x - 1.0).abs() < 1e-4);
        assert!((rotation.y - 1.0).abs() < 1e-4);
        assert_eq!(rotation.z, 0.0);
    }

    #[test]
    fn frames_leave_other_entities_untouched() {
        let (mut renderer, _) = started(800, 600);
        let cube = renderer.cube_id().unwrap();
        let initial = renderer.scene().unwrap().clone();
        renderer.pump(10);
        for (id, entity) in renderer.scene().unwrap().entities() {
            if *id != cube {
                assert_eq!(Some(entity), initial.get(*id));
            }
        }
    }

    #[test]
    fn every_frame_draws_and_reschedules() {
        let (mut renderer, mount) = started(640, 480);
        renderer.pump(5);
        assert_eq!(renderer.frames_drawn(), 5);
        assert_eq!(renderer.host().requested_frames(), 6);

        let log = mount.device_log();
        let log = log.borrow();
        assert_eq!(log.frames, 5);
        let frame = log.last_frame.as_ref().unwrap();
        assert_eq!(frame.physical, Viewport::new(1280, 960));
        let cube = renderer.cube_id().unwrap();
        assert!((frame.transforms[&cube].rotation.x - 0.05).abs() < 1e-5);
    }

    #[test]
    fn failed_draw_keeps_the_loop_running() {
        use cubescene_render::DrawFault;

        let (mut renderer, mount) = started(640, 480);
        renderer.pump(2);

        mount.fail_draws(DrawFault::Backend);
        assert!(!renderer.fire_frame());
        assert_eq!(renderer.frames_drawn(), 2);
        assert!(renderer.pending_frame().is_some());
        assert_eq!(renderer.host().pending_frame(), renderer.pending_frame());

        mount.restore_draws();
        assert!(renderer.fire_frame());
        assert_eq!(renderer.frames_drawn(), 3);
        assert_eq!(mount.device_log().borrow().frames, 3);
    }

    #[test]
    fn lost_surface_skips_frames_without_stopping() {
        use cubescene_render::DrawFault;

        let (mut renderer, mount) = started(640, 480);
        mount.fail_draws(DrawFault::SurfaceLost);
        assert_eq!(renderer.pump(3), 0);
        assert_eq!(renderer.state(), RendererState::Running);
        assert!(renderer.pending_frame().is_some());

        mount.restore_draws();
        assert_eq!(renderer.pump(2), 2);
        // Spin advances on every delivered frame, drawn or not.
        let cube = renderer.cube_id().unwrap();
        let rotation = renderer.scene().unwrap().get(cube).unwrap().transform.rotation;
        assert!((rotation.x - 0.05).abs() < 1e-5);
    }

    #[test]
    fn device_receives_configured_options() {
        let mut config = ViewerConfig::default();
        config.antialias = false;
        let mount = HeadlessMount::new(Viewport::new(10, 10));
        let mut renderer: TestRenderer = SceneRenderer::new(ManualHost::default(), config);
        renderer.start(mount.clone()).unwrap();
        assert_eq!(
            mount.device_log().borrow().options,
            Some(DeviceOptions {
                antialias: false,
                transparent: true,
            })
        );
    }

    #[test]
    fn stale_frame_handle_is_ignored() {
        let (mut renderer, _) = started(640, 480);
        let first = renderer.host_mut().take_due_frame().unwrap();
        assert!(renderer.on_frame(first));
        assert!(!renderer.on_frame(first));
        assert_eq!(renderer.frames_drawn(), 1);
    }

    #[test]
    fn resize_updates_camera_and_device() {
        let (mut renderer, mount) = started(800, 600);
        mount.resize_to(Viewport::new(1920, 1080));
        assert!(renderer.fire_resize());

        let camera = renderer.camera().unwrap();
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        let expected = glam::Mat4::perspective_rh(75f32.to_radians(), 1920.0 / 1080.0, 0.1, 1000.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, 1e-6));
        assert_eq!(renderer.device().unwrap().size(), Viewport::new(1920, 1080));
    }

    #[test]
    fn resize_picks_up_pixel_ratio_changes() {
        let (mut renderer, mount) = started(800, 600);
        renderer.host_mut().set_pixel_ratio(1.5);
        renderer.fire_resize();
        assert_eq!(renderer.device().unwrap().pixel_ratio(), 1.5);
        assert_eq!(mount.device_log().borrow().pixel_ratio, 1.5);
    }

    #[test]
    fn resize_before_start_is_a_no_op() {
        let mut renderer: TestRenderer = SceneRenderer::new(ManualHost::default(), ViewerConfig::default());
        assert!(!renderer.on_resize(ListenerId(1)));
        assert!(!renderer.fire_resize());
        assert_eq!(renderer.state(), RendererState::Uninitialized);
    }

    #[test]
    fn resize_to_empty_mount_keeps_previous_viewport() {
        let (mut renderer, mount) = started(800, 600);
        mount.resize_to(Viewport::new(0, 600));
        assert!(!renderer.fire_resize());
        assert_eq!(renderer.device().unwrap().size(), Viewport::new(800, 600));
        assert!((renderer.camera().unwrap().aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn resize_from_unknown_listener_is_ignored() {
        let (mut renderer, mount) = started(800, 600);
        mount.resize_to(Viewport::new(100, 100));
        assert!(!renderer.on_resize(ListenerId(999)));
        assert_eq!(renderer.device().unwrap().size(), Viewport::new(800, 600));
    }

    #[test]
    fn stop_cancels_frame_removes_listener_and_disposes() {
        let (mut renderer, mount) = started(800, 600);
        renderer.pump(3);
        let pending = renderer.pending_frame().unwrap();

        renderer.stop();

        assert_eq!(renderer.state(), RendererState::Destroyed);
        assert_eq!(renderer.host().canceled_frames(), &[pending]);
        assert_eq!(renderer.host().listener_count(), 0);
        assert_eq!(renderer.host().pending_frame(), None);
        assert_eq!(mount.device_log().borrow().disposals, 1);
        assert!(renderer.scene().is_none());
    }

    #[test]
    fn nothing_draws_after_stop() {
        let (mut renderer, mount) = started(800, 600);
        renderer.pump(2);
        let pending = renderer.pending_frame().unwrap();
        renderer.stop();

        assert!(!renderer.on_frame(pending));
        assert_eq!(renderer.pump(10), 0);
        mount.resize_to(Viewport::new(300, 300));
        assert!(!renderer.fire_resize());
        assert!(!renderer.on_resize(ListenerId(1)));

        assert_eq!(renderer.frames_drawn(), 2);
        let log = mount.device_log();
        let log = log.borrow();
        assert_eq!(log.frames, 2);
        assert_eq!(log.sizes, vec![Viewport::new(800, 600)]);
    }

    #[test]
    fn second_stop_is_a_no_op() {
        let (mut renderer, mount) = started(800, 600);
        renderer.stop();
        renderer.stop();
        assert_eq!(mount.device_log().borrow().disposals, 1);
        assert_eq!(renderer.host().canceled_frames().len(), 1);
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let mut renderer: TestRenderer = SceneRenderer::new(ManualHost::default(), ViewerConfig::default());
        renderer.stop();
        assert_eq!(renderer.state(), RendererState::Uninitialized);
    }

    #[test]
    fn second_start_is_rejected_without_duplicates() {
        let (mut renderer, _) = started(800, 600);
        let cube = renderer.cube_id();
        let err = renderer
            .start(HeadlessMount::new(Viewport::new(10, 10)))
            .unwrap_err();
        assert!(matches!(
            err,
            ViewerError::InvalidState {
                operation: "start",
                state: RendererState::Running
            }
        ));
        let scene = renderer.scene().unwrap();
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.count_kind("box"), 1);
        assert_eq!(scene.count_kind("plane"), 1);
        assert_eq!(renderer.cube_id(), cube);
        assert_eq!(renderer.host().listener_count(), 1);
    }

    #[test]
    fn start_after_stop_is_rejected() {
        let (mut renderer, mount) = started(800, 600);
        renderer.stop();
        assert!(matches!(
            renderer.start(mount),
            Err(ViewerError::InvalidState {
                state: RendererState::Destroyed,
                ..
            })
        ));
    }

    #[test]
    fn empty_mount_fails_loudly() {
        let mut renderer: TestRenderer = SceneRenderer::new(ManualHost::default(), ViewerConfig::default());
        let err = renderer
            .start(HeadlessMount::new(Viewport::new(0, 0)))
            .unwrap_err();
        assert!(matches!(err, ViewerError::EmptyMount(_)));
        assert_eq!(renderer.state(), RendererState::Uninitialized);
        assert_eq!(renderer.host().requested_frames(), 0);
    }

    #[test]
    fn bind_failure_leaves_renderer_uninitialized() {
        let mount = HeadlessMount::new(Viewport::new(800, 600));
        mount.refuse_binding();
        let mut renderer: TestRenderer = SceneRenderer::new(ManualHost::default(), ViewerConfig::default());
        let err = renderer.start(mount).unwrap_err();
        assert!(matches!(err, ViewerError::Bind(_)));
        assert!(err.to_string().contains("refused"));
        assert_eq!(renderer.state(), RendererState::Uninitialized);
        assert_eq!(renderer.host().listener_count(), 0);
    }

    #[test]
    fn dropping_a_running_renderer_releases_the_device() {
        let (renderer, mount) = started(800, 600);
        drop(renderer);
        assert_eq!(mount.device_log().borrow().disposals, 1);
    }

    #[test]
    fn configured_spin_is_applied_per_frame() {
        let mut config = ViewerConfig::default();
        config.cube.spin_per_frame = [0.1, -0.2];
        let mount = HeadlessMount::new(Viewport::new(100, 100));
        let mut renderer = SceneRenderer::new(ManualHost::default(), config);
        renderer.start(mount).unwrap();
        renderer.pump(3);
        let cube = renderer.cube_id().unwrap();
        let rotation = renderer.scene().unwrap().get(cube).unwrap().transform.rotation;
        assert!((rotation.x - 0.3).abs() < 1e-5);
        assert!((rotation.y + 0.6).abs() < 1e-5);
    }
}
