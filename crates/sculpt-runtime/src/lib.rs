//! Chunked re-tessellation of a live voxel grid: dirty tracking, a worker
//! pool with pooled scratch buffers, and a frame-budgeted GPU hand-off.
#![forbid(unsafe_code)]

mod blocking_set;
mod config;
mod error;
mod gpu;
mod marking;
mod modes;
mod partition;
mod pipeline;
mod pool;
mod worker;

pub use blocking_set::BlockingSet;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use gpu::{BufferHandle, DrawCall, GpuBackend, RecordingGpu};
pub use modes::{RenderMode, RenderModes};
pub use partition::{ChunkCoord, ChunkId, ChunkPartition};
pub use pipeline::{ChunkMeshPipeline, DrainStats, PipelineStats};
pub use pool::{ScratchCensus, ScratchPool};
pub use worker::WorkerExit;
