mod host;

use anyhow::Result;
use clap::Parser;
use cubescene_viewer::{RendererState, SceneRenderer, ViewerConfig};
use host::{WindowHost, WindowMount};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "cubescene-desktop", about = "Spinning cube in a desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial window width in logical pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// Window title
    #[arg(long, default_value = "Cube Scene")]
    title: String,
}

struct App {
    config: ViewerConfig,
    title: String,
    size: LogicalSize<u32>,
    window: Option<Arc<Window>>,
    renderer: Option<SceneRenderer<WindowHost, WindowMount>>,
}

impl App {
    fn new(cli: Cli, config: ViewerConfig) -> Self {
        Self {
            config,
            title: cli.title,
            size: LogicalSize::new(cli.width, cli.height),
            window: None,
            renderer: None,
        }
    }

    fn shutdown(&mut self) {
        if let Some(renderer) = &mut self.renderer {
            if renderer.state() == RendererState::Running {
                renderer.stop();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_transparent(self.config.transparent)
            .with_inner_size(self.size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut renderer =
            SceneRenderer::new(WindowHost::new(window.clone()), self.config.clone());
        if let Err(e) = renderer.start(WindowMount::new(window.clone())) {
            tracing::error!("failed to start renderer: {e}");
            event_loop.exit();
            return;
        }

        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                renderer.fire_resize();
            }
            WindowEvent::RedrawRequested => {
                renderer.fire_frame();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    tracing::info!("cubescene-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(cli, config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
