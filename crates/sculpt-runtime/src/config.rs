use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

fn default_chunk_size() -> usize {
    32
}

fn default_drain_budget_ms() -> f32 {
    10.0
}

fn default_seam_margin() -> u32 {
    3
}

/// Tunables for a [`crate::ChunkMeshPipeline`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Chunk edge length in voxels; must be a power of two.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Worker threads per pipeline; `None` uses the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Per-frame upload budget in milliseconds.
    #[serde(default = "default_drain_budget_ms")]
    pub drain_budget_ms: f32,
    /// Voxels from a chunk face within which an edit also dirties the
    /// neighbouring chunk. Zero marks only the owning chunk.
    #[serde(default = "default_seam_margin")]
    pub seam_margin: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            workers: None,
            drain_budget_ms: default_drain_budget_ms(),
            seam_margin: default_seam_margin(),
        }
    }
}

impl PipelineConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn drain_budget(&self) -> Result<Duration, PipelineError> {
        let ms = self.drain_budget_ms;
        if !ms.is_finite() || ms < 0.0 {
            return Err(PipelineError::InvalidDrainBudget(ms));
        }
        Ok(Duration::from_nanos((f64::from(ms) * 1e6).round() as u64))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.chunk_size.is_power_of_two() {
            return Err(PipelineError::ChunkSizeNotPowerOfTwo(self.chunk_size));
        }
        if self.worker_count() == 0 {
            return Err(PipelineError::ZeroWorkers);
        }
        self.drain_budget()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.drain_budget().unwrap(), Duration::from_millis(10));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = PipelineConfig {
            chunk_size: 24,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::ChunkSizeNotPowerOfTwo(24))
        ));
        cfg.chunk_size = 16;
        cfg.workers = Some(0);
        assert!(matches!(cfg.validate(), Err(PipelineError::ZeroWorkers)));
        cfg.workers = Some(2);
        cfg.drain_budget_ms = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::InvalidDrainBudget(_))
        ));
        cfg.drain_budget_ms = 4.0;
        assert!(cfg.validate().is_ok());
    }
}
