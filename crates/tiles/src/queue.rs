use runtime::work_queue::{WorkId, WorkQueue, WorkQueueFull};

use foundation::tile::TileId;

/// A queued fetch: one tile against one registered source.
pub type FetchKey = (TileId, usize);

/// Deterministic fetch queue with backpressure.
///
/// Thin wrapper over `runtime::WorkQueue` so the tile pipeline owns its
/// scheduling policy without duplicating queue logic. Priority is supplied
/// by the manager (distance from the view center); ties launch in
/// submission order.
#[derive(Debug)]
pub struct FetchQueue {
    inner: WorkQueue<FetchKey>,
}

impl FetchQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            inner: WorkQueue::new(max_pending),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn try_submit(&mut self, priority: i32, key: FetchKey) -> Result<WorkId, WorkQueueFull> {
        self.inner.try_push(priority, key)
    }

    /// Cancel a queued fetch that has not launched yet.
    pub fn cancel(&mut self, id: WorkId) -> bool {
        self.inner.cancel(id)
    }

    pub fn pop_next(&mut self) -> Option<(WorkId, FetchKey)> {
        self.inner.pop_next()
    }
}

#[cfg(test)]
mod tests {
    use super::FetchQueue;
    use foundation::tile::TileId;

    #[test]
    fn closer_tiles_launch_first() {
        let mut q = FetchQueue::new(8);
        let far = (TileId::new(4, 9, 9), 0);
        let near = (TileId::new(4, 5, 5), 0);
        q.try_submit(10, far).unwrap();
        q.try_submit(1, near).unwrap();

        assert_eq!(q.pop_next().unwrap().1, near);
        assert_eq!(q.pop_next().unwrap().1, far);
    }

    #[test]
    fn canceled_fetches_never_launch() {
        let mut q = FetchQueue::new(8);
        let id = q.try_submit(0, (TileId::new(2, 0, 0), 0)).unwrap();
        q.try_submit(0, (TileId::new(2, 1, 1), 0)).unwrap();
        assert!(q.cancel(id));
        assert_eq!(q.pop_next().unwrap().1, (TileId::new(2, 1, 1), 0));
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn backpressure_caps_pending_fetches() {
        let mut q = FetchQueue::new(1);
        q.try_submit(0, (TileId::new(1, 0, 0), 0)).unwrap();
        assert!(q.try_submit(0, (TileId::new(1, 1, 0), 0)).is_err());
    }
}
