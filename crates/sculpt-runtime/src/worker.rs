use std::sync::atomic::Ordering;
use std::thread;

use crossbeam_channel::Sender;
use sculpt_grid::VoxelGrid;

use crate::pipeline::Shared;

/// Sent once by every worker thread as it exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerExit {
    pub index: usize,
    pub panicked: bool,
}

struct ExitGuard<'a> {
    index: usize,
    shared: &'a Shared,
    exits: Sender<WorkerExit>,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let _ = self.exits.send(WorkerExit {
            index: self.index,
            panicked: thread::panicking(),
        });
        self.shared.live_workers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Worker loop: take a dirty chunk, check out a workspace, stamp a pass,
/// tessellate against the live grid, publish. Returns when the work set
/// or the scratch pool is closed.
pub(crate) fn run_worker(index: usize, shared: &Shared, grid: &VoxelGrid, exits: Sender<WorkerExit>) {
    let _guard = ExitGuard {
        index,
        shared,
        exits,
    };
    log::debug!("{} worker {index} started", shared.tessellator.name());
    while let Some(id) = shared.work.take() {
        let Some(mut scratch) = shared.pool.acquire() else {
            break;
        };
        let pass = shared.stamp(id);
        let bounds = shared.partition.bounds(id);
        let stats = shared.tessellator.tessellate(grid, bounds, &mut scratch);
        log::trace!(
            "chunk {:?} pass {pass}: {} cells, {} primitives",
            shared.partition.coord(id),
            stats.cells_visited,
            stats.primitives
        );
        shared.tessellated.fetch_add(1, Ordering::Relaxed);
        shared.publish(id, pass, scratch);
    }
    log::debug!("{} worker {index} stopping", shared.tessellator.name());
}
