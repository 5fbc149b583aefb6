use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, unbounded};
use hashbrown::HashSet;
use sculpt_grid::{RenderStrategy, VoxelGrid};
use sculpt_mesh::{ChunkData, Tessellator, Topology};

use crate::marking::BatchLock;
use crate::worker::{WorkerExit, run_worker};
use crate::{
    BlockingSet, BufferHandle, ChunkCoord, ChunkId, ChunkPartition, GpuBackend, PipelineConfig,
    PipelineError, ScratchCensus, ScratchPool,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct StagedMesh {
    pass: u64,
    data: ChunkData,
}

#[derive(Default)]
struct UploadSlot {
    staged: Option<StagedMesh>,
    uploaded_pass: u64,
}

#[derive(Default)]
struct ChunkState {
    dirty: AtomicBool,
    next_pass: AtomicU64,
    slot: Mutex<UploadSlot>,
}

/// State shared between the pipeline handle and its workers.
pub(crate) struct Shared {
    pub(crate) partition: ChunkPartition,
    pub(crate) tessellator: Arc<dyn Tessellator>,
    seam_margin: u32,
    chunks: Box<[ChunkState]>,
    pending: Mutex<Vec<ChunkId>>,
    pub(crate) work: BlockingSet<ChunkId>,
    completed: BlockingSet<ChunkId>,
    pub(crate) pool: ScratchPool,
    pub(crate) live_workers: AtomicUsize,
    flushed: AtomicU64,
    pub(crate) tessellated: AtomicU64,
    published: AtomicU64,
    superseded: AtomicU64,
}

impl Shared {
    fn mark(&self, id: ChunkId) {
        if !self.chunks[id.0].dirty.swap(true, Ordering::AcqRel) {
            lock(&self.pending).push(id);
        }
    }

    fn flush(&self) -> usize {
        let ids = mem::take(&mut *lock(&self.pending));
        if ids.is_empty() {
            return 0;
        }
        for id in &ids {
            self.chunks[id.0].dirty.store(false, Ordering::Release);
        }
        let count = ids.len();
        let queued = self.work.add_all(ids);
        self.flushed.fetch_add(count as u64, Ordering::Relaxed);
        log::debug!(
            "{}: flushed {count} dirty chunks, {queued} newly queued",
            self.tessellator.name()
        );
        count
    }

    pub(crate) fn stamp(&self, id: ChunkId) -> u64 {
        self.chunks[id.0].next_pass.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Stages `data` as the chunk's next upload unless a newer pass got
    /// there first. The loser goes straight back to the pool.
    pub(crate) fn publish(&self, id: ChunkId, pass: u64, data: ChunkData) {
        let mut slot = lock(&self.chunks[id.0].slot);
        let newest = slot
            .staged
            .as_ref()
            .map_or(slot.uploaded_pass, |s| s.pass.max(slot.uploaded_pass));
        if pass <= newest {
            drop(slot);
            self.superseded.fetch_add(1, Ordering::Relaxed);
            self.pool.release_from_worker(data);
            return;
        }
        self.pool.mark_staged(&data);
        let replaced = slot.staged.replace(StagedMesh { pass, data });
        drop(slot);
        if let Some(old) = replaced {
            self.superseded.fetch_add(1, Ordering::Relaxed);
            self.pool.release_staged(old.data);
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        self.completed.add(id);
    }

    fn take_staged(&self, id: ChunkId) -> Option<StagedMesh> {
        let mut slot = lock(&self.chunks[id.0].slot);
        let staged = slot.staged.take()?;
        if staged.pass <= slot.uploaded_pass {
            drop(slot);
            self.pool.release_staged(staged.data);
            return None;
        }
        slot.uploaded_pass = staged.pass;
        Some(staged)
    }

    fn close(&self) {
        self.work.close();
        self.completed.close();
        self.pool.close();
    }
}

struct RenderState {
    buffers: Vec<Option<BufferHandle>>,
    vertex_counts: Vec<usize>,
    visible: HashSet<ChunkId>,
    uploads: u64,
}

/// Outcome of one [`ChunkMeshPipeline::drain_completed`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub uploaded: usize,
    /// Completed entries whose mesh had already been consumed.
    pub skipped: usize,
    pub vertices: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub flushed: u64,
    pub tessellated: u64,
    pub published: u64,
    pub superseded: u64,
    pub uploaded: u64,
}

/// Keeps one tessellation of a [`VoxelGrid`] current, chunk by chunk.
///
/// Voxel marks collect in a pending list and reach the workers when the
/// outermost edit batch ends. Workers rebuild chunks into pooled scratch
/// buffers; the render thread picks the results up with
/// [`ChunkMeshPipeline::drain_completed`] and draws the visible set.
///
/// Workers hold the grid, so call [`ChunkMeshPipeline::shutdown`] (or drop
/// the owning [`crate::RenderModes`]) to release it.
pub struct ChunkMeshPipeline {
    name: String,
    shared: Arc<Shared>,
    batch: BatchLock,
    render: Mutex<RenderState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    exits: Receiver<WorkerExit>,
    drain_budget: Duration,
}

impl ChunkMeshPipeline {
    /// Partitions `grid` and starts the worker threads. The pipeline is not
    /// registered with the grid; pass it to
    /// [`VoxelGrid::register_strategy`] to receive marks.
    pub fn spawn(
        grid: &Arc<VoxelGrid>,
        tessellator: Arc<dyn Tessellator>,
        cfg: &PipelineConfig,
    ) -> Result<Arc<Self>, PipelineError> {
        cfg.validate()?;
        let partition = ChunkPartition::new(grid.dims(), cfg.chunk_size)?;
        let worker_count = cfg.worker_count();
        let drain_budget = cfg.drain_budget()?;
        let chunk_count = partition.len();
        let name = tessellator.name().to_string();

        let shared = Arc::new(Shared {
            pool: ScratchPool::new(worker_count, cfg.chunk_size),
            chunks: (0..chunk_count).map(|_| ChunkState::default()).collect(),
            partition,
            tessellator,
            seam_margin: cfg.seam_margin,
            pending: Mutex::new(Vec::new()),
            work: BlockingSet::new(),
            completed: BlockingSet::new(),
            live_workers: AtomicUsize::new(0),
            flushed: AtomicU64::new(0),
            tessellated: AtomicU64::new(0),
            published: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
        });

        let (exit_tx, exit_rx) = unbounded();
        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let worker_shared = Arc::clone(&shared);
            let worker_grid = Arc::clone(grid);
            let exits = exit_tx.clone();
            shared.live_workers.fetch_add(1, Ordering::AcqRel);
            let spawned = thread::Builder::new()
                .name(format!("sculpt-mesh-{index}"))
                .spawn(move || run_worker(index, &worker_shared, &worker_grid, exits));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    shared.live_workers.fetch_sub(1, Ordering::AcqRel);
                    shared.close();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PipelineError::WorkerSpawn(err));
                }
            }
        }
        log::info!(
            "{name} pipeline: {chunk_count} chunks of {}, {worker_count} workers",
            cfg.chunk_size
        );

        Ok(Arc::new(Self {
            name,
            shared,
            batch: BatchLock::default(),
            render: Mutex::new(RenderState {
                buffers: vec![None; chunk_count],
                vertex_counts: vec![0; chunk_count],
                visible: HashSet::new(),
                uploads: 0,
            }),
            workers: Mutex::new(handles),
            worker_count,
            exits: exit_rx,
            drain_budget,
        }))
    }

    pub fn partition(&self) -> &ChunkPartition {
        &self.shared.partition
    }

    pub fn topology(&self) -> Topology {
        self.shared.tessellator.topology()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn live_workers(&self) -> usize {
        self.shared.live_workers.load(Ordering::Acquire)
    }

    pub fn drain_budget(&self) -> Duration {
        self.drain_budget
    }

    /// Chunks marked dirty since the last flush, in marking order.
    pub fn pending_chunks(&self) -> Vec<ChunkCoord> {
        lock(&self.shared.pending)
            .iter()
            .map(|&id| self.shared.partition.coord(id))
            .collect()
    }

    /// Chunks flushed but not yet taken by a worker.
    pub fn queued_chunks(&self) -> usize {
        self.shared.work.len()
    }

    /// Chunks whose mesh is staged for the next drain.
    pub fn ready_chunks(&self) -> usize {
        self.shared.completed.len()
    }

    pub fn census(&self) -> ScratchCensus {
        self.shared.pool.census()
    }

    pub fn stats(&self) -> PipelineStats {
        let s = &self.shared;
        PipelineStats {
            flushed: s.flushed.load(Ordering::Relaxed),
            tessellated: s.tessellated.load(Ordering::Relaxed),
            published: s.published.load(Ordering::Relaxed),
            superseded: s.superseded.load(Ordering::Relaxed),
            uploaded: lock(&self.render).uploads,
        }
    }

    pub fn visible_chunks(&self) -> Vec<ChunkCoord> {
        let render = lock(&self.render);
        let mut coords: Vec<_> = render
            .visible
            .iter()
            .map(|&id| self.shared.partition.coord(id))
            .collect();
        coords.sort_unstable();
        coords
    }

    /// Vertices last uploaded for `coord`; zero for chunks outside the grid.
    pub fn vertex_count(&self, coord: ChunkCoord) -> usize {
        match self.shared.partition.id(coord) {
            Some(id) => lock(&self.render).vertex_counts[id.0],
            None => 0,
        }
    }

    pub fn drain(&self, gpu: &mut dyn GpuBackend) -> DrainStats {
        self.drain_completed(gpu, self.drain_budget)
    }

    /// Uploads completed chunks until the completed set stays empty or
    /// `budget` runs out. Chunks left over wait for a later call.
    ///
    /// The deadline is checked before each poll, so an upload that starts
    /// just before it can finish after it. The overshoot is at most one
    /// chunk upload.
    pub fn drain_completed(&self, gpu: &mut dyn GpuBackend, budget: Duration) -> DrainStats {
        let start = Instant::now();
        let deadline = start.checked_add(budget);
        let mut stats = DrainStats::default();
        let mut render = lock(&self.render);
        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => Duration::MAX,
            };
            if remaining.is_zero() {
                break;
            }
            let Some(id) = self.shared.completed.poll(remaining) else {
                break;
            };
            let Some(staged) = self.shared.take_staged(id) else {
                stats.skipped += 1;
                continue;
            };
            let count = staged.data.vertex_count();
            if count == 0 {
                render.visible.remove(&id);
            } else {
                render.visible.insert(id);
            }
            let existing = render.buffers[id.0];
            let handle = match existing {
                Some(handle) => Some(handle),
                None if count > 0 => {
                    let handle = gpu.create_buffer();
                    render.buffers[id.0] = Some(handle);
                    Some(handle)
                }
                None => None,
            };
            if let Some(handle) = handle {
                gpu.upload(handle, staged.data.vertex_bytes(), count);
            }
            render.vertex_counts[id.0] = count;
            render.uploads += 1;
            stats.uploaded += 1;
            stats.vertices += count;
            self.shared.pool.release_staged(staged.data);
        }
        stats.elapsed = start.elapsed();
        if stats.uploaded > 0 {
            log::debug!(
                "{}: uploaded {} chunks ({} vertices) in {:?}",
                self.name,
                stats.uploaded,
                stats.vertices,
                stats.elapsed
            );
        }
        stats
    }

    /// Issues one draw per visible chunk. Returns the number of draws.
    pub fn draw(&self, gpu: &mut dyn GpuBackend) -> usize {
        let render = lock(&self.render);
        let topology = self.topology();
        let mut draws = 0;
        for &id in &render.visible {
            if let Some(handle) = render.buffers[id.0] {
                gpu.draw(handle, topology, render.vertex_counts[id.0]);
                draws += 1;
            }
        }
        draws
    }

    /// Collects exit reports sent since the last call.
    pub fn reap_worker_exits(&self) -> Vec<WorkerExit> {
        let exits: Vec<_> = self.exits.try_iter().collect();
        for exit in &exits {
            if exit.panicked {
                log::warn!(
                    "{} worker {} panicked; {} of {} workers left",
                    self.name,
                    exit.index,
                    self.live_workers(),
                    self.worker_count
                );
            } else {
                log::debug!("{} worker {} exited", self.name, exit.index);
            }
        }
        exits
    }

    /// Closes the queues and joins the workers. Safe to call repeatedly.
    pub fn shutdown(&self) {
        let handles = mem::take(&mut *lock(&self.workers));
        if handles.is_empty() && self.shared.work.is_closed() {
            return;
        }
        self.shared.close();
        // The last grid reference can drop on a worker, which drops us there.
        let me = thread::current().id();
        for handle in handles {
            if handle.thread().id() == me {
                continue;
            }
            let _ = handle.join();
        }
        self.reap_worker_exits();
        log::info!("{} pipeline shut down", self.name);
    }
}

impl RenderStrategy for ChunkMeshPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark_voxel_dirty(&self, x: i32, y: i32, z: i32) {
        let shared = &self.shared;
        shared
            .partition
            .for_each_affected(x, y, z, shared.seam_margin, |id| shared.mark(id));
    }

    fn begin_voxel_marking(&self) {
        self.batch.enter();
    }

    fn end_voxel_marking(&self) {
        self.batch.exit(|| {
            self.shared.flush();
        });
    }

    fn refresh(&self) {
        self.batch.enter();
        for id in self.shared.partition.ids() {
            self.shared.mark(id);
        }
        self.batch.exit(|| {
            self.shared.flush();
        });
    }
}

impl Drop for ChunkMeshPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
