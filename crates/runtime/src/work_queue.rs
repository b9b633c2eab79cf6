/// Deterministic work queue backing the tile fetch pipeline.
///
/// Ordering is total on `(priority, id)`: lower priority values run first,
/// ties resolve in insertion order. Cancellation does not perturb the order
/// of remaining items, and a maximum pending length gives backpressure.
///
/// Vec-backed on purpose; queues here are tens of entries, and determinism
/// matters more than asymptotics.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WorkQueueFull {
    pub max_len: usize,
}

impl std::fmt::Display for WorkQueueFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "work queue full (max {})", self.max_len)
    }
}

impl std::error::Error for WorkQueueFull {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    priority: i32,
    id: WorkId,
}

#[derive(Debug)]
struct Item<T> {
    key: Key,
    payload: T,
    canceled: bool,
}

#[derive(Debug)]
pub struct WorkQueue<T> {
    next_id: u64,
    items: Vec<Item<T>>,
    max_len: usize,
}

impl<T> WorkQueue<T> {
    pub fn new(max_len: usize) -> Self {
        Self {
            next_id: 0,
            items: Vec::new(),
            max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| !i.canceled).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn try_push(&mut self, priority: i32, payload: T) -> Result<WorkId, WorkQueueFull> {
        if self.len() >= self.max_len {
            return Err(WorkQueueFull {
                max_len: self.max_len,
            });
        }

        let id = WorkId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push(Item {
            key: Key { priority, id },
            payload,
            canceled: false,
        });
        Ok(id)
    }

    pub fn cancel(&mut self, id: WorkId) -> bool {
        if let Some(item) = self.items.iter_mut().find(|i| i.key.id == id) {
            item.canceled = true;
            return true;
        }
        false
    }

    fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, item) in self.items.iter().enumerate() {
            if item.canceled {
                continue;
            }
            match best {
                None => best = Some(idx),
                Some(b) => {
                    if item.key < self.items[b].key {
                        best = Some(idx);
                    }
                }
            }
        }
        best
    }

    /// Pops the next (lowest priority value, then oldest) item.
    pub fn pop_next(&mut self) -> Option<(WorkId, T)> {
        let idx = self.best_index()?;
        let item = self.items.swap_remove(idx);
        Some((item.key.id, item.payload))
    }

}

#[cfg(test)]
mod tests {
    use super::{WorkQueue, WorkQueueFull};

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut q = WorkQueue::new(8);
        q.try_push(0, "a").unwrap();
        q.try_push(0, "b").unwrap();
        q.try_push(-5, "first").unwrap();

        assert_eq!(q.pop_next().unwrap().1, "first");
        assert_eq!(q.pop_next().unwrap().1, "a");
        assert_eq!(q.pop_next().unwrap().1, "b");
    }

    #[test]
    fn canceled_items_are_skipped_and_uncounted() {
        let mut q = WorkQueue::new(8);
        let a = q.try_push(0, "a").unwrap();
        q.try_push(0, "b").unwrap();
        assert!(q.cancel(a));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_next().unwrap().1, "b");
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn rejects_when_full() {
        let mut q = WorkQueue::new(1);
        q.try_push(0, "a").unwrap();
        assert_eq!(
            q.try_push(0, "b").unwrap_err(),
            WorkQueueFull { max_len: 1 }
        );
    }
}
