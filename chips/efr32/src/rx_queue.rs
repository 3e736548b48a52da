// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Single producer, single consumer queue for received frames.
//!
//! The radio interrupt handler is the only producer and the main loop the
//! only consumer. `head` is written only by the consumer and `tail` only by
//! the producer; both are free running counters, so the queue holds `N`
//! entries. When the queue is full new entries are refused and the queued
//! ones are left untouched.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Number of received frames buffered between interrupt and main loop.
pub const RX_QUEUE_SIZE: usize = 16;

pub struct RxQueue<T: Copy, const N: usize> {
    ring: UnsafeCell<[T; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// Slots between `head` and `tail` are owned by the consumer, the others by
// the producer, so no slot is ever accessed from both sides at once.
unsafe impl<T: Copy, const N: usize> Sync for RxQueue<T, N> {}

impl<T: Copy, const N: usize> RxQueue<T, N> {
    pub const fn new(empty: T) -> RxQueue<T, N> {
        RxQueue {
            ring: UnsafeCell::new([empty; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    pub fn has_elements(&self) -> bool {
        self.len() != 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Fills the next free slot in place. The entry is published only if
    /// `fill` returns true. Returns false if the queue was full or the
    /// entry was discarded.
    pub fn enqueue_with<F: FnOnce(&mut T) -> bool>(&self, fill: F) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail.wrapping_sub(self.head.load(Ordering::Acquire)) >= N {
            return false;
        }
        // SAFETY: the slot at `tail` is not visible to the consumer until
        // `tail` is advanced below.
        let slot = unsafe { &mut (*self.ring.get())[tail % N] };
        if !fill(slot) {
            return false;
        }
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    pub fn enqueue(&self, value: T) -> bool {
        self.enqueue_with(|slot| {
            *slot = value;
            true
        })
    }

    pub fn dequeue(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        if self.tail.load(Ordering::Acquire) == head {
            return None;
        }
        // SAFETY: the producer does not touch the slot at `head` until
        // `head` is advanced below.
        let value = unsafe { (*self.ring.get())[head % N] };
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_dequeue() {
        let queue: RxQueue<u32, 4> = RxQueue::new(0);
        for i in 0..10 {
            assert!(queue.enqueue(i));
            assert_eq!(queue.len(), 1);
            assert!(queue.has_elements());
            assert_eq!(queue.dequeue(), Some(i));
            assert!(!queue.has_elements());
        }
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn overflow_keeps_oldest() {
        let queue: RxQueue<u32, 4> = RxQueue::new(0);
        for i in 0..4 {
            assert!(queue.enqueue(i));
        }
        assert!(queue.is_full());
        assert!(!queue.enqueue(99));
        for i in 0..4 {
            assert_eq!(queue.dequeue(), Some(i));
        }
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn discarded_fill_is_not_published() {
        let queue: RxQueue<u32, 2> = RxQueue::new(0);
        assert!(!queue.enqueue_with(|slot| {
            *slot = 7;
            false
        }));
        assert!(!queue.has_elements());
        assert!(queue.enqueue(8));
        assert_eq!(queue.dequeue(), Some(8));
    }
}
