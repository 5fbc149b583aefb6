use std::sync::Arc;

use sculpt_grid::VoxelGrid;
use sculpt_mesh::{PointCloudTessellator, SurfaceNetTessellator};
use serde::{Deserialize, Serialize};

use crate::{ChunkMeshPipeline, DrainStats, GpuBackend, PipelineConfig, PipelineError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    #[default]
    SurfaceNet,
    PointCloud,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::SurfaceNet => RenderMode::PointCloud,
            RenderMode::PointCloud => RenderMode::SurfaceNet,
        }
    }
}

/// A surface-net and a point-cloud pipeline over the same grid, with one
/// of them receiving voxel marks at a time.
pub struct RenderModes {
    grid: Arc<VoxelGrid>,
    surface_net: Arc<ChunkMeshPipeline>,
    surface_net_index: usize,
    point_cloud: Arc<ChunkMeshPipeline>,
    point_cloud_index: usize,
    active: RenderMode,
}

impl RenderModes {
    /// Spawns both pipelines, registers them with `grid` and selects
    /// `start`, which schedules a full rebuild.
    pub fn new(
        grid: &Arc<VoxelGrid>,
        cfg: &PipelineConfig,
        start: RenderMode,
    ) -> Result<Self, PipelineError> {
        let surface_net = ChunkMeshPipeline::spawn(grid, Arc::new(SurfaceNetTessellator::new()), cfg)?;
        let point_cloud = match ChunkMeshPipeline::spawn(grid, Arc::new(PointCloudTessellator), cfg) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                surface_net.shutdown();
                return Err(err);
            }
        };
        let surface_net_index = grid.register_strategy(surface_net.clone());
        let point_cloud_index = grid.register_strategy(point_cloud.clone());
        let mut modes = Self {
            grid: Arc::clone(grid),
            surface_net,
            surface_net_index,
            point_cloud,
            point_cloud_index,
            active: start,
        };
        modes.select_mode(start);
        Ok(modes)
    }

    pub fn active(&self) -> RenderMode {
        self.active
    }

    pub fn pipeline(&self, mode: RenderMode) -> &Arc<ChunkMeshPipeline> {
        match mode {
            RenderMode::SurfaceNet => &self.surface_net,
            RenderMode::PointCloud => &self.point_cloud,
        }
    }

    pub fn active_pipeline(&self) -> &Arc<ChunkMeshPipeline> {
        self.pipeline(self.active)
    }

    /// Makes `mode` the marked pipeline and rebuilds it from the grid.
    pub fn select_mode(&mut self, mode: RenderMode) -> bool {
        let index = match mode {
            RenderMode::SurfaceNet => self.surface_net_index,
            RenderMode::PointCloud => self.point_cloud_index,
        };
        if !self.grid.select_strategy(index) {
            log::warn!("render strategy #{index} for {:?} is not registered", mode);
            return false;
        }
        self.active = mode;
        true
    }

    pub fn toggle(&mut self) -> RenderMode {
        self.select_mode(self.active.toggled());
        self.active
    }

    pub fn drain(&self, gpu: &mut dyn GpuBackend) -> DrainStats {
        self.active_pipeline().drain(gpu)
    }

    pub fn draw(&self, gpu: &mut dyn GpuBackend) -> usize {
        self.active_pipeline().draw(gpu)
    }

    pub fn shutdown(&self) {
        self.surface_net.shutdown();
        self.point_cloud.shutdown();
    }
}

impl Drop for RenderModes {
    fn drop(&mut self) {
        self.shutdown();
    }
}
