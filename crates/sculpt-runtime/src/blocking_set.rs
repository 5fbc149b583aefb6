use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use hashbrown::HashSet;

struct SetState<T> {
    order: VecDeque<T>,
    members: HashSet<T>,
    closed: bool,
}

impl<T: Eq + Hash + Clone> SetState<T> {
    fn pop(&mut self) -> Option<T> {
        let item = self.order.pop_front()?;
        self.members.remove(&item);
        Some(item)
    }
}

/// Thread-safe coalescing queue: adding a value that is already queued is
/// a no-op. Removal is FIFO, so every queued value is eventually taken.
///
/// After [`BlockingSet::close`] the set is empty for good: blocked and
/// future removals return `None` and adds are dropped.
pub struct BlockingSet<T> {
    state: Mutex<SetState<T>>,
    ready: Condvar,
}

impl<T: Eq + Hash + Clone> Default for BlockingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> BlockingSet<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SetState {
                order: VecDeque::new(),
                members: HashSet::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SetState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `item` unless already present; wakes one waiter.
    /// Returns whether the item was inserted.
    pub fn add(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.closed || !state.members.insert(item.clone()) {
            return false;
        }
        state.order.push_back(item);
        drop(state);
        self.ready.notify_one();
        true
    }

    /// Queues every new item; wakes all waiters. Returns how many were new.
    pub fn add_all<I: IntoIterator<Item = T>>(&self, items: I) -> usize {
        let mut state = self.lock();
        if state.closed {
            return 0;
        }
        let mut added = 0;
        for item in items {
            if state.members.insert(item.clone()) {
                state.order.push_back(item);
                added += 1;
            }
        }
        drop(state);
        if added > 0 {
            self.ready.notify_all();
        }
        added
    }

    /// Removes the oldest member, waiting up to `timeout` for one to arrive.
    pub fn poll(&self, timeout: Duration) -> Option<T> {
        let start = Instant::now();
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.pop() {
                return Some(item);
            }
            let waited = start.elapsed();
            if waited >= timeout {
                return None;
            }
            let (guard, _) = self
                .ready
                .wait_timeout(state, timeout - waited)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Removes the oldest member, blocking until one arrives. Returns `None`
    /// only once the set is closed.
    pub fn take(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.pop() {
                return Some(item);
            }
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn try_take(&self) -> Option<T> {
        let mut state = self.lock();
        if state.closed { None } else { state.pop() }
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &T) -> bool {
        self.lock().members.contains(item)
    }

    /// Discards all members and releases every waiter.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.order.clear();
        state.members.clear();
        drop(state);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn duplicates_coalesce() {
        let set = BlockingSet::new();
        assert!(set.add(3));
        assert!(!set.add(3));
        assert_eq!(set.add_all([3, 4, 4, 5]), 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.try_take(), Some(3));
        assert!(set.add(3));
        assert_eq!(set.try_take(), Some(4));
        assert_eq!(set.try_take(), Some(5));
        assert_eq!(set.try_take(), Some(3));
        assert!(set.is_empty());
    }

    #[test]
    fn poll_times_out_empty() {
        let set: BlockingSet<u32> = BlockingSet::new();
        let t0 = Instant::now();
        assert_eq!(set.poll(Duration::from_millis(20)), None);
        assert!(t0.elapsed() >= Duration::from_millis(20));
        assert_eq!(set.poll(Duration::ZERO), None);
    }

    #[test]
    fn take_wakes_on_add_from_another_thread() {
        let set = Arc::new(BlockingSet::new());
        let taker = {
            let set = set.clone();
            thread::spawn(move || set.take())
        };
        thread::sleep(Duration::from_millis(10));
        set.add(42u32);
        assert_eq!(taker.join().unwrap(), Some(42));
    }

    #[test]
    fn add_all_wakes_every_waiter() {
        let set = Arc::new(BlockingSet::new());
        let takers: Vec<_> = (0..4)
            .map(|_| {
                let set = set.clone();
                thread::spawn(move || set.poll(Duration::from_secs(5)))
            })
            .collect();
        thread::sleep(Duration::from_millis(10));
        set.add_all(0..4u32);
        let mut got: Vec<_> = takers
            .into_iter()
            .map(|t| t.join().unwrap().unwrap())
            .collect();
        got.sort();
        assert_eq!(got, vec![0, 1, 2, 3]);
    }

    #[test]
    fn close_releases_blocked_takers_and_drops_members() {
        let set = Arc::new(BlockingSet::<u32>::new());
        let taker = {
            let set = set.clone();
            thread::spawn(move || set.take())
        };
        thread::sleep(Duration::from_millis(10));
        set.close();
        assert_eq!(taker.join().unwrap(), None);
        assert!(set.is_closed());
        assert!(!set.add(1));
        assert_eq!(set.add_all([1, 2]), 0);
        assert_eq!(set.poll(Duration::from_millis(5)), None);
        assert!(!set.contains(&1));
    }
}
