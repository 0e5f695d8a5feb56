use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use overlayrs::{config, frame, render, TransformState};

#[derive(Parser)]
#[command(name = "overlayrs")]
#[command(
    version,
    about = "Detection overlay renderer - maps image-space annotations onto a display surface"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a frame's detections onto a surface and save it as an image
    Render {
        /// Frame annotations (JSON) from the detection pipeline
        #[arg(short, long)]
        frame: PathBuf,
        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
        /// Surface width in pixels
        #[arg(long, default_value_t = 1080)]
        width: u32,
        /// Surface height in pixels
        #[arg(long, default_value_t = 1920)]
        height: u32,
        /// Image to draw the overlay on (defaults to transparent)
        #[arg(short, long)]
        background: Option<PathBuf>,
        /// Force mirroring regardless of the frame file
        #[arg(long)]
        mirror: bool,
    },
    /// Print the scale factor, crop offsets and matrix for a source/surface pair
    Inspect {
        /// Source image size, e.g. 640x480
        #[arg(long, value_parser = parse_size)]
        source: (u32, u32),
        /// Surface size, e.g. 1080x1920
        #[arg(long, value_parser = parse_size)]
        surface: (u32, u32),
        #[arg(long)]
        mirror: bool,
    },
    /// Open config file in editor
    Config,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok((w, h))
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            frame,
            output,
            width,
            height,
            background,
            mirror,
        } => {
            let cfg = config::load_config(None)?;
            render_cmd(&cfg, &frame, &output, width, height, background, mirror)
        }
        Commands::Inspect {
            source,
            surface,
            mirror,
        } => inspect(source, surface, mirror),
        Commands::Config => open_config(),
    }
}

fn render_cmd(
    cfg: &config::Config,
    frame_path: &Path,
    output: &Path,
    width: u32,
    height: u32,
    background: Option<PathBuf>,
    mirror: bool,
) -> Result<()> {
    let mut annotations = frame::load_frame(frame_path).context("Failed to load frame")?;
    annotations.mirrored |= mirror;
    info!(
        "Frame {}x{} with {} detection(s){}",
        annotations.source_width,
        annotations.source_height,
        annotations.detections.len(),
        if annotations.mirrored { ", mirrored" } else { "" }
    );

    let background = match background {
        Some(path) => Some(
            image::open(&path)
                .with_context(|| format!("Failed to open background {}", path.display()))?,
        ),
        None => None,
    };

    let img = render::render_frame(cfg, &annotations, width, height, background.as_ref())?;
    img.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("✓ Overlay written to {}", output.display());
    Ok(())
}

fn inspect(source: (u32, u32), surface: (u32, u32), mirror: bool) -> Result<()> {
    let mut state = TransformState::new();
    state.set_source_info(source.0, source.1, mirror);
    state.refresh_if_needed(surface.0, surface.1);
    state.status().context("Cannot compute transform")?;

    let (source_w, source_h) = state.source_size();
    let p = state.projection();
    let m = p.matrix();
    info!(
        "Source {}x{} on surface {}x{}{}",
        source_w,
        source_h,
        surface.0,
        surface.1,
        if state.is_mirrored() { ", mirrored" } else { "" }
    );
    info!("Scale factor: {:.4}", p.scale_factor());
    info!(
        "Crop offsets: width {:.2}, height {:.2}",
        p.width_crop_offset(),
        p.height_crop_offset()
    );
    info!("Matrix: [{:.4} {:.4} {:.2}]", m.a, m.b, m.tx);
    info!("        [{:.4} {:.4} {:.2}]", m.c, m.d, m.ty);
    info!(
        "Source center ({}, {}) -> surface ({:.1}, {:.1})",
        source_w as f32 / 2.0,
        source_h as f32 / 2.0,
        p.map_x(source_w as f32 / 2.0),
        p.map_y(source_h as f32 / 2.0)
    );
    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    if !config::CONFIG_PATH.exists() {
        config::save_config(&config::Config::default(), None)
            .context("Failed to write default config")?;
    }

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
