//! Lock-free shard queue for distributing shards across a fixed worker set

use std::sync::atomic::{AtomicUsize, Ordering};

/// Queue of shards claimed one at a time by workers.
///
/// Each shard is handed out exactly once, so no two workers ever touch the
/// same shard file. Claims carry the shard's position in the queue.
pub struct ShardQueue<S> {
    items: Vec<S>,
    cursor: AtomicUsize,
}

impl<S> ShardQueue<S> {
    pub fn new(items: Vec<S>) -> Self {
        log::debug!("{} shards queued", items.len());
        Self {
            items,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim the next shard, or `None` once drained
    pub fn claim(&self) -> Option<(usize, &S)> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.items.get(i).map(|s| (i, s))
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    #[test]
    fn claims_in_order() {
        let q = ShardQueue::new(vec!["a", "b"]);
        assert_eq!(q.total(), 2);
        assert_eq!(q.claim(), Some((0, &"a")));
        assert_eq!(q.claim(), Some((1, &"b")));
        assert_eq!(q.claim(), None);
        assert_eq!(q.claim(), None);
    }

    #[test]
    fn empty_queue() {
        let q: ShardQueue<i32> = ShardQueue::new(vec![]);
        assert_eq!(q.total(), 0);
        assert_eq!(q.claim(), None);
    }

    #[test]
    fn concurrent_claims_are_unique() {
        let q = ShardQueue::new((0..100).collect::<Vec<_>>());
        let seen = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while let Some((_, v)) = q.claim() {
                        seen.lock().unwrap().push(*v);
                    }
                });
            }
        });
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 100);
        assert_eq!(seen.into_iter().collect::<BTreeSet<_>>().len(), 100);
    }
}
