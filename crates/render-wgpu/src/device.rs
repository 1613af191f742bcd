use crate::gpu::ScenePipelines;
use cubescene_common::Viewport;
use cubescene_render::{DeviceOptions, GraphicsDevice, RenderError};
use cubescene_scene::{PerspectiveCamera, Scene};
use tracing::{debug, info};

const MSAA_SAMPLES: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum DeviceInitError {
    #[error("no compatible graphics adapter")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipelines: ScenePipelines,
}

/// Reports the drawable's exact extent in physical pixels.
pub type DrawableExtent = Box<dyn Fn() -> Viewport>;

/// [`GraphicsDevice`] drawing into a wgpu surface.
///
/// Without a [`DrawableExtent`] the surface is sized `size * pixel_ratio`.
pub struct WgpuDevice {
    gpu: Option<GpuContext>,
    size: Viewport,
    pixel_ratio: f64,
    drawable: Option<DrawableExtent>,
}

impl WgpuDevice {
    /// Create a device and configure `target` at `size * pixel_ratio`.
    pub async fn new(
        instance: &wgpu::Instance,
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: Viewport,
        pixel_ratio: f64,
        options: DeviceOptions,
    ) -> Result<Self, DeviceInitError> {
        let surface = instance.create_surface(target)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DeviceInitError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("cubescene_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = choose_alpha_mode(&caps.alpha_modes, options.transparent);
        let msaa_supported = adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(MSAA_SAMPLES);
        let sample_count = choose_sample_count(options.antialias, msaa_supported);

        let physical = size.physical(pixel_ratio);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical.width,
            height: physical.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipelines =
            ScenePipelines::new(&device, format, sample_count, physical.width, physical.height);

        info!(
            adapter = %adapter.get_info().name,
            ?format,
            ?alpha_mode,
            sample_count,
            %physical,
            "wgpu device ready"
        );

        Ok(Self {
            gpu: Some(GpuContext {
                surface,
                device,
                queue,
                config,
                pipelines,
            }),
            size,
            pixel_ratio,
            drawable: None,
        })
    }

    /// Size the surface from `extent` from now on.
    pub fn with_drawable_extent(mut self, extent: impl Fn() -> Viewport + 'static) -> Self {
        self.drawable = Some(Box::new(extent));
        self.reconfigure();
        self
    }

    fn reconfigure(&mut self) {
        let physical = surface_extent(
            self.size,
            self.pixel_ratio,
            self.drawable.as_ref().map(|extent| extent()),
        );
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.config.width == physical.width && gpu.config.height == physical.height {
            return;
        }
        debug!(%physical, "reconfiguring surface");
        gpu.config.width = physical.width;
        gpu.config.height = physical.height;
        gpu.surface.configure(&gpu.device, &gpu.config);
        gpu.pipelines
            .resize(&gpu.device, physical.width, physical.height);
    }
}

impl GraphicsDevice for WgpuDevice {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.reconfigure();
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, size: Viewport) {
        self.size = size;
        self.reconfigure();
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let gpu = self.gpu.as_mut().ok_or(RenderError::Disposed)?;

        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated, reconfiguring");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Err(RenderError::SurfaceLost);
            }
            Err(e) => return Err(RenderError::Backend(e.to_string())),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        gpu.pipelines
            .render(&gpu.device, &gpu.queue, &view, scene, camera);
        output.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if self.gpu.take().is_some() {
            info!("wgpu device disposed");
        }
    }

    fn is_disposed(&self) -> bool {
        self.gpu.is_none()
    }
}

/// Premultiplied compositing when a transparent canvas is wanted and offered;
/// otherwise whatever the surface lists first.
fn choose_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    if transparent {
        for preferred in [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ] {
            if modes.contains(&preferred) {
                return preferred;
            }
        }
    }
    modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Physical surface size: the reported drawable extent when known, else the
/// logical size scaled by the pixel ratio. Never smaller than 1x1.
fn surface_extent(size: Viewport, pixel_ratio: f64, drawable: Option<Viewport>) -> Viewport {
    match drawable {
        Some(extent) => Viewport::new(extent.width.max(1), extent.height.max(1)),
        None => size.physical(pixel_ratio),
    }
}

fn choose_sample_count(antialias: bool, supported: bool) -> u32 {
    if antialias && supported {
        MSAA_SAMPLES
    } else {
        1
    }
}
