mod config;
mod session;

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use sculpt_runtime::{RecordingGpu, RenderMode};

use crate::config::{SculptConfig, load_config_from_path};
use crate::session::Session;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    SurfaceNet,
    PointCloud,
}

impl From<ModeArg> for RenderMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::SurfaceNet => RenderMode::SurfaceNet,
            ModeArg::PointCloud => RenderMode::PointCloud,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sculpt", about = "Headless voxel sculpting session")]
struct Args {
    /// TOML config; missing files fall back to defaults
    #[arg(long, default_value = "sculpt.toml")]
    config: PathBuf,
    /// Grid edge length in voxels
    #[arg(long)]
    size: Option<usize>,
    #[arg(long)]
    frames: Option<u32>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Switch render mode every N frames
    #[arg(long)]
    toggle_every: Option<u32>,
}

impl Args {
    fn apply(&self, cfg: &mut SculptConfig) {
        if let Some(size) = self.size {
            cfg.grid.size = size;
        }
        if let Some(frames) = self.frames {
            cfg.session.frames = frames;
        }
        if self.workers.is_some() {
            cfg.pipeline.workers = self.workers;
        }
        if let Some(chunk_size) = self.chunk_size {
            cfg.pipeline.chunk_size = chunk_size;
        }
        if let Some(seed) = self.seed {
            cfg.session.seed = seed;
        }
        if let Some(mode) = self.mode {
            cfg.session.start_mode = mode.into();
        }
        if self.toggle_every.is_some() {
            cfg.session.toggle_every = self.toggle_every;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = if args.config.exists() {
        load_config_from_path(&args.config)?
    } else {
        log::info!("{} not found, using defaults", args.config.display());
        SculptConfig::default()
    };
    args.apply(&mut cfg);
    cfg.pipeline.validate()?;

    log::info!(
        "sculpt: {}³ grid, chunk {}, {} workers, {} frames",
        cfg.grid.size,
        cfg.pipeline.chunk_size,
        cfg.pipeline.worker_count(),
        cfg.session.frames
    );
    let mut session = Session::new(&cfg)?;
    let mut gpu = RecordingGpu::new();
    let start = Instant::now();
    let (mut carved, mut uploaded, mut vertices, mut draws) = (0usize, 0usize, 0usize, 0usize);
    for frame in 0..cfg.session.frames {
        let stats = session.frame(&mut gpu);
        carved += stats.carved;
        uploaded += stats.drain.uploaded;
        vertices += stats.drain.vertices;
        draws += stats.draws;
        log::debug!("frame {frame}: {:?}", stats);
        gpu.take_draws();
    }
    let elapsed = start.elapsed();
    let pipeline = session.modes().active_pipeline();
    log::info!(
        "{} frames in {:.2?}: {carved} voxels carved, {uploaded} chunk uploads ({vertices} vertices), {draws} draws",
        cfg.session.frames,
        elapsed
    );
    log::info!(
        "{:?} mode: {} visible chunks, {} solid voxels, {:?}",
        session.modes().active(),
        pipeline.visible_chunks().len(),
        session.grid().solid_voxels(),
        pipeline.stats()
    );
    session.shutdown();
    Ok(())
}
