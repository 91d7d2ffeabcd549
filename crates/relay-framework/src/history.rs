//! Bounded, most-recent-first history of received items.

use std::collections::VecDeque;
use std::sync::RwLock;

/// Default capacity of a receiver's history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A bounded buffer kept in most-recent-first order.
///
/// Insertion and eviction happen under one write lock, so readers never observe a buffer
/// longer than its capacity or an element being evicted.
pub struct HistoryBuffer<E> {
    items: RwLock<VecDeque<E>>,
    capacity: usize,
}

impl<E: Clone> HistoryBuffer<E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts `item` at the head, evicting the oldest items beyond capacity.
    pub fn push(&self, item: E) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.push_front(item);
        items.truncate(self.capacity);
    }

    /// Copies the current contents, most recent first.
    pub fn snapshot(&self) -> Vec<E> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone> Default for HistoryBuffer<E> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_most_recent_first() {
        let buffer = HistoryBuffer::new(3);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.snapshot(), vec![2, 1]);
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let buffer = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY);
        for id in 1..=51 {
            buffer.push(id);
        }
        let expected: Vec<u32> = (2..=51).rev().collect();
        assert_eq!(buffer.snapshot(), expected);
        assert_eq!(buffer.len(), buffer.capacity());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let buffer = HistoryBuffer::new(5);
        buffer.push("same");
        buffer.push("same");
        assert_eq!(buffer.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_and_readers_respect_capacity() {
        let buffer = Arc::new(HistoryBuffer::new(10));
        let mut handles = Vec::new();

        for writer in 0..8u32 {
            let buffer = buffer.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100u32 {
                    buffer.push(writer * 1000 + i);
                }
            }));
        }
        for _ in 0..4 {
            let buffer = buffer.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    assert!(buffer.snapshot().len() <= 10);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(buffer.len(), 10);
    }
}
