use std::error::Error;
use std::fs;
use std::path::Path;

use sculpt_runtime::{PipelineConfig, RenderMode};
use serde::{Deserialize, Serialize};

fn default_grid_size() -> usize {
    200
}

fn default_frames() -> u32 {
    300
}

fn default_carves_per_frame() -> u32 {
    1
}

fn default_max_carve_radius() -> u32 {
    30
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GridConfig {
    /// Edge length of the cubic grid, in voxels.
    #[serde(default = "default_grid_size")]
    pub size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default = "default_carves_per_frame")]
    pub carves_per_frame: u32,
    /// Carve radii are drawn from `1..max_carve_radius`.
    #[serde(default = "default_max_carve_radius")]
    pub max_carve_radius: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub start_mode: RenderMode,
    /// Switch render mode every N frames; unset keeps the start mode.
    #[serde(default)]
    pub toggle_every: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            carves_per_frame: default_carves_per_frame(),
            max_carve_radius: default_max_carve_radius(),
            seed: 0,
            start_mode: RenderMode::default(),
            toggle_every: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SculptConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

pub fn load_config_from_path(path: &Path) -> Result<SculptConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: SculptConfig = toml::from_str(&s)?;
    cfg.pipeline.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fill_in_defaults() {
        let cfg: SculptConfig = toml::from_str(
            r#"
            [grid]
            size = 64

            [pipeline]
            chunk_size = 16
            workers = 2

            [session]
            start_mode = "point-cloud"
            toggle_every = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.grid.size, 64);
        assert_eq!(cfg.pipeline.chunk_size, 16);
        assert_eq!(cfg.pipeline.workers, Some(2));
        assert_eq!(cfg.pipeline.seam_margin, 3);
        assert_eq!(cfg.session.start_mode, RenderMode::PointCloud);
        assert_eq!(cfg.session.toggle_every, Some(10));
        assert_eq!(cfg.session.max_carve_radius, 30);
    }

    #[test]
    fn empty_file_is_the_default_session() {
        let cfg: SculptConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, SculptConfig::default());
        assert_eq!(cfg.grid.size, 200);
    }

    #[test]
    fn loading_rejects_invalid_pipelines() {
        let dir = std::env::temp_dir().join(format!("sculpt-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        fs::write(&path, "[pipeline]\nchunk_size = 12\n").unwrap();
        assert!(load_config_from_path(&path).is_err());
        fs::write(&path, "[session]\nframes = 5\n").unwrap();
        assert_eq!(load_config_from_path(&path).unwrap().session.frames, 5);
        assert!(load_config_from_path(&dir.join("missing.toml")).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
