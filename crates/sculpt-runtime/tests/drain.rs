use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sculpt_geom::IVec3;
use sculpt_grid::{SphereGenerator, Voxel, VoxelGrid};
use sculpt_mesh::SurfaceNetTessellator;
use sculpt_runtime::{ChunkMeshPipeline, PipelineConfig, RecordingGpu};

const WORKERS: usize = 4;

/// A sphere spread over a 4×4×4 chunk grid, with every scratch buffer staged.
fn saturated_pipeline() -> (Arc<VoxelGrid>, Arc<ChunkMeshPipeline>) {
    let grid = Arc::new(VoxelGrid::cube(16));
    let cfg = PipelineConfig {
        chunk_size: 4,
        workers: Some(WORKERS),
        seam_margin: 0,
        ..Default::default()
    };
    let pipeline = ChunkMeshPipeline::spawn(&grid, Arc::new(SurfaceNetTessellator::new()), &cfg).unwrap();
    grid.register_strategy(pipeline.clone());
    grid.insert_shape(&SphereGenerator::new(Voxel::Clay, IVec3::splat(8), 7.0));

    let deadline = Instant::now() + Duration::from_secs(10);
    while pipeline.ready_chunks() < WORKERS && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(pipeline.ready_chunks(), WORKERS);
    assert_eq!(pipeline.census().pending_upload, WORKERS);
    (grid, pipeline)
}

#[test]
fn drain_stops_at_the_deadline_and_leaves_the_rest_queued() {
    let (_grid, pipeline) = saturated_pipeline();
    let upload = Duration::from_millis(15);
    let budget = Duration::from_millis(20);
    let mut gpu = RecordingGpu::with_upload_delay(upload);

    let stats = pipeline.drain_completed(&mut gpu, budget);
    assert!((1..=2).contains(&stats.uploaded), "{stats:?}");
    // One upload may start just before the deadline.
    assert!(stats.elapsed < budget + upload + Duration::from_millis(50));
    assert!(pipeline.ready_chunks() > 0);
    assert_eq!(gpu.uploads(), stats.uploaded);
    pipeline.shutdown();
}

#[test]
fn zero_budget_uploads_nothing() {
    let (_grid, pipeline) = saturated_pipeline();
    let mut gpu = RecordingGpu::new();
    let stats = pipeline.drain_completed(&mut gpu, Duration::ZERO);
    assert_eq!(stats.uploaded, 0);
    assert_eq!(pipeline.ready_chunks(), WORKERS);
    assert_eq!(gpu.buffer_count(), 0);
    pipeline.shutdown();
}

#[test]
fn later_frames_finish_the_backlog() {
    let (_grid, pipeline) = saturated_pipeline();
    let mut gpu = RecordingGpu::new();
    let flushed = pipeline.stats().flushed;
    assert!(flushed > WORKERS as u64);
    let deadline = Instant::now() + Duration::from_secs(10);
    while pipeline.stats().uploaded < flushed && Instant::now() < deadline {
        pipeline.drain_completed(&mut gpu, Duration::from_millis(2));
    }
    assert_eq!(pipeline.stats().uploaded, flushed);
    assert_eq!(pipeline.census().free, WORKERS);
    // Only chunks that produced geometry get a buffer.
    assert_eq!(gpu.buffer_count(), pipeline.visible_chunks().len());
    pipeline.shutdown();
}

#[test]
fn idle_drain_waits_out_its_budget() {
    let grid = Arc::new(VoxelGrid::cube(8));
    let cfg = PipelineConfig {
        chunk_size: 4,
        workers: Some(1),
        ..Default::default()
    };
    let pipeline = ChunkMeshPipeline::spawn(&grid, Arc::new(SurfaceNetTessellator::new()), &cfg).unwrap();
    let mut gpu = RecordingGpu::new();
    let stats = pipeline.drain_completed(&mut gpu, Duration::from_millis(15));
    assert_eq!(stats.uploaded, 0);
    assert!(stats.elapsed >= Duration::from_millis(15));
    pipeline.shutdown();
}
