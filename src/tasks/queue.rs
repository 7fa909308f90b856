//! Unbounded FIFO of pending work with a completion barrier.

use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};

/// Thread-safe work queue shared between one producer and many workers.
///
/// Every item handed out by [`WorkQueue::claim`] must be marked done exactly
/// once; the returned [`Claimed`] guard does this when dropped. [`join`]
/// blocks until every item that was [`put`] has been marked done.
/// [`close`] wakes idle workers so they can exit; it never discards items
/// that are already queued.
///
/// [`join`]: WorkQueue::join
/// [`put`]: WorkQueue::put
/// [`close`]: WorkQueue::close
#[derive(Debug)]
pub struct WorkQueue<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
    pending: Mutex<usize>,
    drained: Condvar,
}

/// Returned by [`WorkQueue::put`] once the queue has been closed.
#[derive(Debug, PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            pending: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    /// Enqueue an item. Never blocks.
    pub fn put(&self, item: T) -> Result<(), Closed<T>> {
        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            return Err(Closed(item));
        };

        *lock(&self.pending) += 1;
        sender.send(item).map_err(|e| {
            self.mark_done();
            Closed(e.into_inner())
        })
    }

    /// Block until an item is available.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn get(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Like [`get`](WorkQueue::get), but marks the item done when the
    /// returned guard is dropped, whatever happens while it is held.
    pub fn claim(&self) -> Option<Claimed<'_, T>> {
        self.get().map(|item| Claimed { item, queue: self })
    }

    /// Record that one previously dequeued item has been fully processed.
    pub fn mark_done(&self) {
        let mut pending = lock(&self.pending);
        debug_assert!(*pending > 0, "mark_done called more often than put");
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until every enqueued item has been marked done.
    pub fn join(&self) {
        let mut pending = lock(&self.pending);
        while *pending > 0 {
            pending = self
                .drained
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stop accepting items. Workers drain what is left, then see `None`.
    pub fn close(&self) {
        lock(&self.sender).take();
    }

    /// Items put but not yet marked done.
    pub fn pending(&self) -> usize {
        *lock(&self.pending)
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A dequeued item that is marked done when dropped.
#[derive(Debug)]
pub struct Claimed<'a, T> {
    item: T,
    queue: &'a WorkQueue<T>,
}

impl<T> Deref for Claimed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> Drop for Claimed<'_, T> {
    fn drop(&mut self) {
        self.queue.mark_done();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        for i in 0..3 {
            queue.put(i).unwrap();
        }
        assert_eq!(queue.get(), Some(0));
        assert_eq!(queue.get(), Some(1));
        assert_eq!(queue.get(), Some(2));
    }

    #[test]
    fn test_join_on_empty_queue_returns() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        queue.join();
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_claim_marks_done_on_drop() {
        let queue = WorkQueue::new();
        queue.put("a").unwrap();
        assert_eq!(queue.pending(), 1);

        {
            let claimed = queue.claim().unwrap();
            assert_eq!(*claimed, "a");
            assert_eq!(queue.pending(), 1);
        }
        assert_eq!(queue.pending(), 0);
        queue.join();
    }

    #[test]
    fn test_close_drains_remaining_items() {
        let queue = WorkQueue::new();
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        queue.close();

        assert_eq!(queue.put(3), Err(Closed(3)));
        assert_eq!(queue.get(), Some(1));
        assert_eq!(queue.get(), Some(2));
        assert_eq!(queue.get(), None);
    }

    #[test]
    fn test_close_wakes_blocked_workers() {
        let queue: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new());
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.get())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.close();

        for worker in workers {
            assert_eq!(worker.join().unwrap(), None);
        }
    }

    #[test]
    fn test_join_waits_for_mark_done() {
        let queue = Arc::new(WorkQueue::new());
        queue.put(7).unwrap();

        let worker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let claimed = queue.claim().unwrap();
                thread::sleep(Duration::from_millis(30));
                *claimed
            })
        };

        queue.join();
        assert_eq!(queue.pending(), 0);
        assert_eq!(worker.join().unwrap(), 7);
    }
}
