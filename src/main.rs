// src/main.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use padeltrack::replay::{PerceptionLog, ReplayBallDetector, ReplayPersonDetector};
use padeltrack::{analyze, Config, Point};

/// Reconstruct per-frame player and ball trajectories in court
/// coordinates from a recorded perception log.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Perception log (JSONL) to analyze.
    input: PathBuf,

    /// Court corners in the input video, as 8 comma-separated values:
    /// x1,y1,x2,y2,x3,y3,x4,y4 (any corner order).
    #[arg(long, value_delimiter = ',', num_args = 8, allow_hyphen_values = true)]
    corners: Vec<f64>,

    /// Size of the preview the corners were clicked on, as WIDTHxHEIGHT.
    /// Omit when corners are already in source pixels.
    #[arg(long)]
    display_size: Option<String>,

    /// Optional YAML config; defaults are the tuned production values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the match result JSON.
    #[arg(long, default_value = "match.json")]
    output: PathBuf,
}

fn parse_display_size(s: &str) -> Result<(f64, f64)> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("display size must look like 640x360, got {s:?}"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("padeltrack={}", config.logging.level))
        .init();
    info!("✓ Configuration loaded");

    if args.corners.len() != 8 {
        bail!("expected 8 corner values, got {}", args.corners.len());
    }
    let mut corners: Vec<Point> = args
        .corners
        .chunks(2)
        .map(|c| Point::new(c[0], c[1]))
        .collect();

    let log = PerceptionLog::load(&args.input)?;
    let (meta, source, mut bounces) = log.into_parts();
    info!("✓ Perception log loaded");

    if let Some(size) = &args.display_size {
        let (dw, dh) = parse_display_size(size)?;
        for corner in &mut corners {
            corner.x *= meta.width / dw;
            corner.y *= meta.height / dh;
        }
    }

    let result = analyze(
        source,
        &meta,
        &corners,
        &config,
        &mut ReplayPersonDetector,
        &mut ReplayBallDetector,
        &mut bounces,
    )?;

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;
    info!(
        frames = result.frames.len(),
        output = %args.output.display(),
        "✓ Match result written"
    );

    Ok(())
}
