use std::sync::Arc;

use sculpt_geom::IVec3;
use sculpt_grid::{CubeGenerator, SphereGenerator, Voxel, VoxelGrid};
use sculpt_runtime::{DrainStats, GpuBackend, PipelineError, RenderMode, RenderModes};

use crate::config::{SculptConfig, SessionConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub carved: usize,
    pub drain: DrainStats,
    pub draws: usize,
}

/// Headless sculpting loop: a clay block that gets carved by random
/// spheres while the active render mode keeps its chunk meshes current.
pub struct Session {
    grid: Arc<VoxelGrid>,
    modes: RenderModes,
    rng: fastrand::Rng,
    cfg: SessionConfig,
    frame: u32,
}

impl Session {
    pub fn new(cfg: &SculptConfig) -> Result<Self, PipelineError> {
        let grid = Arc::new(VoxelGrid::cube(cfg.grid.size));
        let modes = RenderModes::new(&grid, &cfg.pipeline, cfg.session.start_mode)?;
        let session = Self {
            grid,
            modes,
            rng: fastrand::Rng::with_seed(cfg.session.seed),
            cfg: cfg.session.clone(),
            frame: 0,
        };
        session.reset_model();
        Ok(session)
    }

    pub fn grid(&self) -> &Arc<VoxelGrid> {
        &self.grid
    }

    pub fn modes(&self) -> &RenderModes {
        &self.modes
    }

    /// Empties the grid and fills a clay cube two voxels in from each face.
    pub fn reset_model(&self) {
        let size = self.grid.width() as i32;
        let _batch = self.grid.edit_batch();
        self.grid.clear();
        let half = (size / 2 - 2).max(0);
        self.grid.insert_shape(&CubeGenerator::new(
            Voxel::Clay,
            IVec3::splat(size / 2),
            half,
        ));
        log::info!(
            "model reset: {} solid voxels",
            self.grid.solid_voxels()
        );
    }

    /// Removes an air sphere at a random in-grid centre. Returns the number
    /// of voxels written.
    pub fn carve_random_sphere(&mut self) -> usize {
        let dims = self.grid.dims();
        let center = IVec3::new(
            self.rng.i32(0..dims.x),
            self.rng.i32(0..dims.y),
            self.rng.i32(0..dims.z),
        );
        let radius = self.rng.u32(1..self.cfg.max_carve_radius.max(2)) as f32;
        log::trace!("carve at {:?} r={}", center, radius);
        self.grid
            .insert_shape(&SphereGenerator::new(Voxel::Air, center, radius))
    }

    pub fn toggle_render_mode(&mut self) -> RenderMode {
        let mode = self.modes.toggle();
        log::info!("render mode -> {:?}", mode);
        mode
    }

    /// Carves, then uploads what the workers finished within the drain
    /// budget and draws the visible chunks.
    pub fn frame(&mut self, gpu: &mut dyn GpuBackend) -> FrameStats {
        self.frame += 1;
        if let Some(every) = self.cfg.toggle_every.filter(|&n| n > 0) {
            if self.frame % every == 0 {
                self.toggle_render_mode();
            }
        }
        let carved = {
            let grid = Arc::clone(&self.grid);
            let _batch = grid.edit_batch();
            (0..self.cfg.carves_per_frame)
                .map(|_| self.carve_random_sphere())
                .sum()
        };
        let drain = self.modes.drain(gpu);
        let draws = self.modes.draw(gpu);
        self.modes.active_pipeline().reap_worker_exits();
        FrameStats {
            carved,
            drain,
            draws,
        }
    }

    pub fn shutdown(&self) {
        self.modes.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sculpt_runtime::{PipelineConfig, RecordingGpu};
    use std::time::{Duration, Instant};

    fn small(seed: u64) -> SculptConfig {
        let mut cfg = SculptConfig::default();
        cfg.grid.size = 16;
        cfg.pipeline = PipelineConfig {
            chunk_size: 8,
            workers: Some(2),
            drain_budget_ms: 2.0,
            ..Default::default()
        };
        cfg.session.seed = seed;
        cfg.session.max_carve_radius = 5;
        cfg
    }

    #[test]
    fn reset_builds_a_centred_cube() {
        let session = Session::new(&small(1)).unwrap();
        // half extent 6 around 8: voxels 3..=13 on each axis
        assert_eq!(session.grid().solid_voxels(), 11 * 11 * 11);
        assert!(session.grid().get_voxel(3, 3, 3).is_solid());
        assert!(!session.grid().get_voxel(2, 8, 8).is_solid());
        session.shutdown();
    }

    #[test]
    fn carving_only_removes_clay_and_is_seeded() {
        let mut a = Session::new(&small(7)).unwrap();
        let mut b = Session::new(&small(7)).unwrap();
        let full = a.grid().solid_voxels();
        for _ in 0..5 {
            a.carve_random_sphere();
            b.carve_random_sphere();
        }
        assert!(a.grid().solid_voxels() <= full);
        assert_eq!(a.grid().solid_voxels(), b.grid().solid_voxels());
        a.shutdown();
        b.shutdown();
    }

    #[test]
    fn frames_draw_the_model_and_toggle_modes() {
        let mut cfg = small(3);
        cfg.session.toggle_every = Some(3);
        let mut session = Session::new(&cfg).unwrap();
        let mut gpu = RecordingGpu::new();
        assert_eq!(session.modes().active(), RenderMode::SurfaceNet);

        let mut drew = false;
        for _ in 0..2 {
            drew |= session.frame(&mut gpu).draws > 0;
        }
        let deadline = Instant::now() + Duration::from_secs(10);
        while !drew && Instant::now() < deadline {
            session.modes().drain(&mut gpu);
            drew = session.modes().draw(&mut gpu) > 0;
        }
        assert!(drew);

        session.frame(&mut gpu);
        assert_eq!(session.modes().active(), RenderMode::PointCloud);
        session.shutdown();
    }
}
