use std::sync::{Mutex, MutexGuard, PoisonError};

use sculpt_mesh::ChunkData;

use crate::BlockingSet;

/// Where the pool's scratch buffers are right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchCensus {
    pub free: usize,
    pub in_workers: usize,
    pub pending_upload: usize,
}

impl ScratchCensus {
    pub fn total(&self) -> usize {
        self.free + self.in_workers + self.pending_upload
    }
}

/// Fixed set of `ChunkData` workspaces shared by the workers of one
/// pipeline. Buffers cycle free -> worker -> pending upload -> free; a
/// worker that cannot acquire one blocks until the render thread drains.
pub struct ScratchPool {
    free: BlockingSet<usize>,
    slots: Box<[Mutex<Option<ChunkData>>]>,
    census: Mutex<ScratchCensus>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScratchPool {
    pub fn new(capacity: usize, chunk_size: usize) -> Self {
        let slots = (0..capacity)
            .map(|slot| Mutex::new(Some(ChunkData::new(slot, chunk_size))))
            .collect();
        let free = BlockingSet::new();
        free.add_all(0..capacity);
        Self {
            free,
            slots,
            census: Mutex::new(ScratchCensus {
                free: capacity,
                ..Default::default()
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn census(&self) -> ScratchCensus {
        *lock(&self.census)
    }

    /// Checks out a free workspace for a worker, blocking until one is
    /// returned. `None` once the pool is closed.
    pub fn acquire(&self) -> Option<ChunkData> {
        let slot = self.free.take()?;
        let data = lock(&self.slots[slot]).take();
        if data.is_none() {
            log::error!("scratch slot {slot} was queued free but is checked out");
            return None;
        }
        let mut census = lock(&self.census);
        census.free -= 1;
        census.in_workers += 1;
        data
    }

    /// Records that a worker handed `data` to the upload path.
    pub(crate) fn mark_staged(&self, data: &ChunkData) {
        debug_assert!(data.slot() < self.capacity());
        let mut census = lock(&self.census);
        census.in_workers -= 1;
        census.pending_upload += 1;
    }

    /// Returns a workspace the worker did not publish.
    pub fn release_from_worker(&self, data: ChunkData) {
        self.check_in(data, |census| census.in_workers -= 1);
    }

    /// Returns a workspace that was staged for upload.
    pub fn release_staged(&self, data: ChunkData) {
        self.check_in(data, |census| census.pending_upload -= 1);
    }

    fn check_in(&self, data: ChunkData, leave: impl FnOnce(&mut ScratchCensus)) {
        let slot = data.slot();
        *lock(&self.slots[slot]) = Some(data);
        {
            let mut census = lock(&self.census);
            leave(&mut census);
            census.free += 1;
        }
        self.free.add(slot);
    }

    /// Wakes every blocked `acquire` with `None`.
    pub fn close(&self) {
        self.free.close();
    }

    pub fn is_closed(&self) -> bool {
        self.free.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn buffers_cycle_and_census_stays_balanced() {
        let pool = ScratchPool::new(2, 4);
        assert_eq!(pool.census().free, 2);

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_ne!(a.slot(), b.slot());
        assert_eq!(pool.census(), ScratchCensus { free: 0, in_workers: 2, pending_upload: 0 });

        pool.mark_staged(&a);
        assert_eq!(pool.census(), ScratchCensus { free: 0, in_workers: 1, pending_upload: 1 });
        pool.release_staged(a);
        pool.release_from_worker(b);
        let census = pool.census();
        assert_eq!(census.free, 2);
        assert_eq!(census.total(), 2);
    }

    #[test]
    fn acquire_blocks_until_a_buffer_returns() {
        let pool = Arc::new(ScratchPool::new(1, 4));
        let held = pool.acquire().unwrap();
        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().map(|d| d.slot()))
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(pool.census().in_workers, 1);
        pool.release_from_worker(held);
        assert_eq!(waiter.join().unwrap(), Some(0));
    }

    #[test]
    fn close_wakes_blocked_acquirers() {
        let pool = Arc::new(ScratchPool::new(1, 4));
        let _held = pool.acquire().unwrap();
        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().is_none())
        };
        thread::sleep(Duration::from_millis(10));
        pool.close();
        assert!(waiter.join().unwrap());
        assert!(pool.is_closed());
    }
}
