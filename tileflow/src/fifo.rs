//! Bounded synchronous FIFO.

use std::collections::VecDeque;

use thiserror::Error;

/// Error returned when enqueueing into a full FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fifo full: capacity {capacity}")]
pub struct FifoFullError {
    /// Capacity of the rejecting FIFO, in slots.
    pub capacity: usize,
}

/// A bounded FIFO with at most one enqueue and one dequeue per cycle.
///
/// Slots are drained in enqueue order. The FIFO never silently drops: enqueueing into a full
/// FIFO is an error surfaced to the producer.
#[derive(Debug, Clone)]
pub struct Fifo<V> {
    slots: VecDeque<V>,
    capacity: usize,
}

impl<V> Fifo<V> {
    /// Creates an empty FIFO with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self { slots: VecDeque::with_capacity(capacity), capacity }
    }

    /// Enqueues a value, rejecting it when the FIFO is full.
    pub fn enqueue(&mut self, value: V) -> Result<(), FifoFullError> {
        if self.slots.len() == self.capacity {
            return Err(FifoFullError { capacity: self.capacity });
        }
        self.slots.push_back(value);
        Ok(())
    }

    /// Dequeues the oldest value, if any.
    pub fn dequeue(&mut self) -> Option<V> {
        self.slots.pop_front()
    }

    /// Peeks at the oldest value without dequeueing it.
    pub fn peek(&self) -> Option<&V> {
        self.slots.front()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` when every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Capacity in slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discards all occupied slots.
    pub fn flush(&mut self) {
        self.slots.clear();
    }
}
