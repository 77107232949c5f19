//! Fixed-capacity ring buffer
//!
//! Every history field in the dashboard (price ticks, candles, logs,
//! alerts) is bounded. The bound lives in the type so call sites never
//! repeat their own trimming logic.

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Bounded sequence that discards from the opposite end when full
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from an iterator in chronological order, keeping the last `capacity` items
    pub fn from_iter_back<I: IntoIterator<Item = T>>(capacity: usize, iter: I) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.extend_back(iter);
        buffer
    }

    /// Append at the back; evicts the front element when full
    pub fn push_back(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Insert at index 0; evicts the back element when full
    pub fn push_front(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_back()
        } else {
            None
        };
        self.items.push_front(item);
        evicted
    }

    pub fn extend_back<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for RingBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_back_keeps_most_recent_in_order() {
        let mut buffer = RingBuffer::new(3);
        for i in 0..5 {
            buffer.push_back(i);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_push_front_keeps_newest_at_index_zero() {
        let mut buffer = RingBuffer::new(3);
        for i in 0..5 {
            buffer.push_front(i);
        }
        assert_eq!(buffer.to_vec(), vec![4, 3, 2]);
        assert_eq!(buffer.front(), Some(&4));
    }

    #[test]
    fn test_eviction_reports_dropped_item() {
        let mut buffer = RingBuffer::new(2);
        assert_eq!(buffer.push_back('a'), None);
        assert_eq!(buffer.push_back('b'), None);
        assert!(buffer.is_full());
        assert_eq!(buffer.push_back('c'), Some('a'));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        buffer.push_back(1);
        buffer.push_back(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.to_vec(), vec![2]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = RingBuffer::from_iter_back(10, 0..7);
        for k in 0..50 {
            buffer.push_back(k);
            assert!(buffer.len() <= 10);
        }
        assert_eq!(buffer.to_vec(), (40..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_serializes_as_array() {
        let buffer = RingBuffer::from_iter_back(2, vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&buffer).unwrap(), "[2,3]");
    }
}
