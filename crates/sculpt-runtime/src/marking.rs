use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Default)]
struct BatchState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// Exclusive marking lock held from batch begin to batch end.
///
/// Reentrant for the owning thread so nested batches (an `insert_shape`
/// inside a caller's batch) flush once, when the outermost batch ends.
#[derive(Default)]
pub(crate) struct BatchLock {
    state: Mutex<BatchState>,
    released: Condvar,
}

impl BatchLock {
    fn lock(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn enter(&self) {
        let me = thread::current().id();
        let mut state = self.lock();
        while state.owner.is_some_and(|owner| owner != me) {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.owner = Some(me);
        state.depth += 1;
    }

    /// Leaves one level. `flush` runs while the lock is still held when the
    /// outermost level ends, or immediately for an unmatched exit.
    pub(crate) fn exit(&self, flush: impl FnOnce()) {
        let me = thread::current().id();
        let mut state = self.lock();
        if state.owner != Some(me) {
            drop(state);
            log::warn!("marking batch ended on a thread that did not begin it");
            flush();
            return;
        }
        state.depth -= 1;
        if state.depth == 0 {
            flush();
            state.owner = None;
            drop(state);
            self.released.notify_one();
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.lock().depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn nested_batches_flush_once() {
        let lock = BatchLock::default();
        let flushes = AtomicUsize::new(0);
        lock.enter();
        lock.enter();
        lock.exit(|| {
            flushes.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(flushes.load(Ordering::SeqCst), 0);
        assert_eq!(lock.depth(), 1);
        lock.exit(|| {
            flushes.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
        assert_eq!(lock.depth(), 0);
    }

    #[test]
    fn other_threads_wait_for_the_batch() {
        let lock = Arc::new(BatchLock::default());
        let order = Arc::new(Mutex::new(Vec::new()));
        lock.enter();
        let other = {
            let lock = lock.clone();
            let order = order.clone();
            thread::spawn(move || {
                lock.enter();
                order.lock().unwrap().push("other");
                lock.exit(|| {});
            })
        };
        thread::sleep(Duration::from_millis(20));
        order.lock().unwrap().push("owner");
        lock.exit(|| {});
        other.join().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["owner", "other"]);
    }

    #[test]
    fn unmatched_exit_still_flushes() {
        let lock = BatchLock::default();
        let mut flushed = false;
        lock.exit(|| flushed = true);
        assert!(flushed);
        assert_eq!(lock.depth(), 0);
    }
}
