//! Deadline index
//!
//! Ordered map from wake time to the threads sleeping until exactly that
//! time. Deadlines live once in a min-heap; threads sharing a deadline are
//! coalesced into one FIFO bucket.
//!
//! Invariants:
//! - a deadline is in the heap iff it keys a non-empty bucket
//! - a thread sits in at most one bucket
//! - the heap holds no duplicate deadline
//!
//! The index itself is not synchronized: callers mutate it with interrupts
//! disabled (see `AlarmService`).

use alloc::collections::{BTreeSet, BinaryHeap, VecDeque};
use core::cmp::Reverse;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use super::clock::Tick;
use super::error::{AlarmError, AlarmResult};
use crate::scheduler::{ThreadHandle, ThreadId};

/// Threads waiting for one deadline, in insertion order
pub type Bucket<T> = VecDeque<T>;

pub struct DeadlineIndex<T> {
    /// Distinct deadlines, earliest on top
    order: BinaryHeap<Reverse<Tick>>,
    buckets: HashMap<Tick, Bucket<T>>,
    /// Reverse map used to reject a second sleep of the same thread
    sleepers: HashMap<ThreadId, Tick>,
}

impl<T: ThreadHandle> DeadlineIndex<T> {
    pub fn new() -> Self {
        Self {
            order: BinaryHeap::new(),
            buckets: HashMap::new(),
            sleepers: HashMap::new(),
        }
    }

    /// File `thread` under `deadline`
    ///
    /// Past deadlines are accepted; they simply drain on the next tick.
    /// A thread that is already filed is rejected and the index is left
    /// untouched.
    pub fn insert(&mut self, deadline: Tick, thread: T) -> AlarmResult<()> {
        let id = thread.id();
        if let Some(&existing) = self.sleepers.get(&id) {
            return Err(AlarmError::AlreadySleeping { thread_id: id, deadline: existing });
        }

        match self.buckets.entry(deadline) {
            Entry::Occupied(mut bucket) => bucket.get_mut().push_back(thread),
            Entry::Vacant(slot) => {
                let mut bucket = VecDeque::with_capacity(1);
                bucket.push_back(thread);
                slot.insert(bucket);
                self.order.push(Reverse(deadline));
            }
        }
        self.sleepers.insert(id, deadline);
        Ok(())
    }

    /// Earliest deadline, if any
    #[inline]
    pub fn peek_min(&self) -> Option<Tick> {
        self.order.peek().map(|&Reverse(deadline)| deadline)
    }

    /// Remove the earliest deadline together with its whole bucket
    pub fn pop_min_bucket(&mut self) -> AlarmResult<(Tick, Bucket<T>)> {
        let Reverse(deadline) = self.order.pop().ok_or(AlarmError::EmptyIndex)?;
        let bucket = self.buckets.remove(&deadline).ok_or(AlarmError::IndexCorrupted {
            reason: "heap deadline without bucket",
        })?;
        for thread in bucket.iter() {
            self.sleepers.remove(&thread.id());
        }
        Ok((deadline, bucket))
    }

    /// Number of distinct deadlines
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Number of sleeping threads across all buckets
    pub fn thread_count(&self) -> usize {
        self.sleepers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains_thread(&self, id: ThreadId) -> bool {
        self.sleepers.contains_key(&id)
    }

    /// Deadline a thread is filed under
    pub fn deadline_of(&self, id: ThreadId) -> Option<Tick> {
        self.sleepers.get(&id).copied()
    }

    /// Full consistency check of heap, buckets and reverse map
    pub fn check_invariants(&self) -> AlarmResult<()> {
        let distinct: BTreeSet<Tick> = self.order.iter().map(|&Reverse(d)| d).collect();
        if distinct.len() != self.order.len() {
            return Err(AlarmError::IndexCorrupted { reason: "duplicate deadline in heap" });
        }
        if distinct.len() != self.buckets.len() {
            return Err(AlarmError::IndexCorrupted { reason: "heap and bucket map sizes differ" });
        }

        let mut filed = 0;
        for (&deadline, bucket) in self.buckets.iter() {
            if bucket.is_empty() {
                return Err(AlarmError::IndexCorrupted { reason: "empty bucket" });
            }
            if !distinct.contains(&deadline) {
                return Err(AlarmError::IndexCorrupted { reason: "bucket without heap deadline" });
            }
            for thread in bucket.iter() {
                if self.sleepers.get(&thread.id()) != Some(&deadline) {
                    return Err(AlarmError::IndexCorrupted { reason: "thread filed twice" });
                }
                filed += 1;
            }
        }
        if filed != self.sleepers.len() {
            return Err(AlarmError::IndexCorrupted { reason: "stale sleeper entry" });
        }
        Ok(())
    }
}

#[cfg(test)]
impl<T: ThreadHandle> DeadlineIndex<T> {
    /// Drop a bucket but leave its deadline in the heap
    pub(super) fn forget_bucket(&mut self, deadline: Tick) {
        self.buckets.remove(&deadline);
    }
}

impl<T: ThreadHandle> Default for DeadlineIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
