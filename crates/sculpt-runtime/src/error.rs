use std::io;

#[derive(Debug)]
pub enum PipelineError {
    ChunkSizeNotPowerOfTwo(usize),
    EmptyGrid,
    ZeroWorkers,
    InvalidDrainBudget(f32),
    WorkerSpawn(io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::ChunkSizeNotPowerOfTwo(size) => {
                write!(f, "chunk size {} is not a power of two", size)
            }
            PipelineError::EmptyGrid => write!(f, "grid has a zero dimension"),
            PipelineError::ZeroWorkers => write!(f, "worker count must be at least 1"),
            PipelineError::InvalidDrainBudget(ms) => {
                write!(f, "drain budget {} ms is not a finite non-negative value", ms)
            }
            PipelineError::WorkerSpawn(err) => write!(f, "failed to spawn mesh worker: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::WorkerSpawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::WorkerSpawn(err)
    }
}
