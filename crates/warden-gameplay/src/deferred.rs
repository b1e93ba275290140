//! End-of-tick deferred work.
//!
//! Work scheduled here runs after every per-tick update has finished, never
//! inline with the call that scheduled it. The queue is drained exactly once
//! per tick and is empty afterwards.

use std::collections::VecDeque;

/// FIFO queue of records to process in the end-of-tick phase.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    /// Pending records in scheduling order
    pending: VecDeque<T>,
    /// Total records ever scheduled
    scheduled: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            scheduled: 0,
        }
    }

    /// Schedules a record for the end of the current tick.
    pub fn schedule(&mut self, record: T) {
        self.pending.push_back(record);
        self.scheduled += 1;
    }

    /// Returns the number of records waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the number of records scheduled over the queue's lifetime.
    #[must_use]
    pub fn total_scheduled(&self) -> u64 {
        self.scheduled
    }

    /// Takes every pending record, leaving the queue empty.
    ///
    /// Records scheduled while the caller processes the returned batch land
    /// in the queue again and wait for the next drain.
    pub fn drain(&mut self) -> Vec<T> {
        self.pending.drain(..).collect()
    }

    /// Drops every pending record for which `keep` returns false.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.pending.retain(keep);
    }

    /// Drains the queue and hands each record to `f` in scheduling order.
    pub fn run(&mut self, mut f: impl FnMut(T)) -> usize {
        let batch = self.drain();
        let count = batch.len();
        for record in batch {
            f(record);
        }
        count
    }
}
