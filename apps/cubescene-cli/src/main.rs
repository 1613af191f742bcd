use clap::{Parser, Subcommand};
use cubescene_common::Viewport;
use cubescene_host::{HeadlessMount, ManualHost, MountPoint};
use cubescene_viewer::{SceneRenderer, ViewerConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubescene-cli", about = "Headless runner for the cube scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the scene that would be built
    Info,
    /// Drive the renderer against a headless device for a number of frames
    Run {
        /// Number of frames to deliver
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Mount width in logical pixels
        #[arg(long, default_value = "800")]
        width: u32,
        /// Mount height in logical pixels
        #[arg(long, default_value = "600")]
        height: u32,
        /// Device pixel ratio reported by the host
        #[arg(long, default_value = "1.0")]
        pixel_ratio: f64,
        /// Resize the mount to WxH halfway through the run
        #[arg(long, value_parser = parse_viewport)]
        resize: Option<Viewport>,
        /// Print a JSON report instead of the last frame
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// Summary of a headless run.
#[derive(Debug, Serialize)]
struct RunReport {
    frames_drawn: u64,
    viewport: Viewport,
    physical: Viewport,
    aspect: f32,
    cube_rotation: [f32; 3],
}

fn parse_viewport(text: &str) -> Result<Viewport, String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {text:?}"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok(Viewport::new(width, height))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("cubescene-cli v{}", env!("CARGO_PKG_VERSION"));
            let demo = cubescene_viewer::build_scene(&config);
            println!(
                "scene: {} entities, background #{:06x}",
                demo.scene.len(),
                config.background
            );
            for entity in demo.scene.entities().values() {
                println!("  {:<6} {}", entity.name, entity.kind.label());
            }
            let cam = &config.camera;
            println!(
                "camera: fov={} near={} far={} position={:?} target={:?}",
                cam.fov, cam.near, cam.far, cam.position, cam.target
            );
        }
        Commands::Run {
            frames,
            width,
            height,
            pixel_ratio,
            resize,
            json,
        } => {
            let mount = HeadlessMount::new(Viewport::new(width, height));
            let log = mount.device_log();
            let mut renderer = SceneRenderer::new(ManualHost::new(pixel_ratio), config);
            renderer.start(mount.clone())?;
            tracing::info!(frames, width, height, pixel_ratio, "headless run");

            match resize {
                Some(size) => {
                    let first = frames / 2;
                    renderer.pump(first);
                    mount.resize_to(size);
                    renderer.fire_resize();
                    renderer.pump(frames - first);
                }
                None => {
                    renderer.pump(frames);
                }
            }

            tracing::info!(drawn = renderer.frames_drawn(), "headless run finished");

            let report = RunReport {
                frames_drawn: renderer.frames_drawn(),
                viewport: mount.client_size(),
                physical: log
                    .borrow()
                    .sizes
                    .last()
                    .map(|v| v.physical(pixel_ratio))
                    .unwrap_or_default(),
                aspect: renderer.camera().map(|c| c.aspect).unwrap_or_default(),
                cube_rotation: renderer
                    .cube_id()
                    .and_then(|id| renderer.scene().and_then(|s| s.get(id)))
                    .map(|cube| cube.transform.rotation.to_array())
                    .unwrap_or_default(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match &log.borrow().last_frame {
                    Some(frame) => print!("{}", frame.text),
                    None => println!("no frames drawn"),
                }
                println!(
                    "drawn={} viewport={} physical={} aspect={:.3}",
                    report.frames_drawn, report.viewport, report.physical, report.aspect
                );
            }

            renderer.stop();
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
