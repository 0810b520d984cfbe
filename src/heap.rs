//! # Indexed Binary Heaps
//!
//! Array-backed binary heaps over the dense keys `0..capacity` of one
//! attribute. Every key has a slot in `positions` and `priorities`, so a
//! priority can be located and changed in O(1) + O(log n) without hashing.

/**
 * File: /src/heap.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Tuesday, 3rd March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-02		Zihan	Indexed min/max heaps for attribute value masses
 */

use std::marker::PhantomData;

/// Comparison direction of an [`IndexedHeap`]
pub trait HeapOrder {
    /// `true` if priority `a` belongs closer to the root than `b`
    fn precedes(a: f64, b: f64) -> bool;
}

/// Smallest priority at the root
#[derive(Debug, Clone, Copy, Default)]
pub struct MinOrder;

/// Largest priority at the root
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxOrder;

impl HeapOrder for MinOrder {
    #[inline]
    fn precedes(a: f64, b: f64) -> bool {
        a < b
    }
}

impl HeapOrder for MaxOrder {
    #[inline]
    fn precedes(a: f64, b: f64) -> bool {
        a > b
    }
}

pub type MinHeap = IndexedHeap<MinOrder>;
pub type MaxHeap = IndexedHeap<MaxOrder>;

/// Binary heap keyed by dense integers with priority updates
///
/// # Example
/// ```
/// use fast_denseblock::heap::MinHeap;
///
/// let mut heap = MinHeap::new(3);
/// heap.insert(0, 5.0);
/// heap.insert(1, 2.0);
/// heap.insert(2, 9.0);
/// heap.update_priority(2, 1.0);
/// assert_eq!(heap.poll(), Some((2, 1.0)));
/// assert_eq!(heap.peek(), Some((1, 2.0)));
/// ```
#[derive(Debug, Clone)]
pub struct IndexedHeap<O: HeapOrder> {
    /// position -> key
    heap: Vec<usize>,
    /// key -> position, `None` when the key is absent
    positions: Vec<Option<usize>>,
    /// key -> priority
    priorities: Vec<f64>,
    _order: PhantomData<O>,
}

impl<O: HeapOrder> IndexedHeap<O> {
    /// Create an empty heap accepting the keys `0..capacity`
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
            priorities: vec![0.0; capacity],
            _order: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn contains(&self, key: usize) -> bool {
        self.positions.get(key).map_or(false, |p| p.is_some())
    }

    /// Insert `key` with `priority`.
    ///
    /// Returns `false` without touching the heap if it is already full.
    pub fn insert(&mut self, key: usize, priority: f64) -> bool {
        if self.heap.len() >= self.capacity() {
            return false;
        }
        debug_assert!(!self.contains(key), "key {} is already in the heap", key);

        let pos = self.heap.len();
        self.heap.push(key);
        self.positions[key] = Some(pos);
        self.priorities[key] = priority;
        self.sift_up(pos);
        true
    }

    /// Root key and its priority
    pub fn peek(&self) -> Option<(usize, f64)> {
        self.heap.first().map(|&key| (key, self.priorities[key]))
    }

    /// Remove and return the root key and its priority
    pub fn poll(&mut self) -> Option<(usize, f64)> {
        let top = self.peek()?;
        self.positions[top.0] = None;

        let last = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.positions[last] = Some(0);
            self.sift_down(0);
        }
        Some(top)
    }

    /// Overwrite the priority of `key` and restore heap order.
    ///
    /// Absent keys only get their stored priority updated.
    pub fn update_priority(&mut self, key: usize, priority: f64) {
        self.priorities[key] = priority;
        if let Some(pos) = self.positions[key] {
            if !self.sift_down(pos) {
                self.sift_up(pos);
            }
        }
    }

    /// Current priority of `key`
    #[inline]
    pub fn priority(&self, key: usize) -> f64 {
        self.priorities[key]
    }

    /// Present keys with their priorities, in heap-array order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.heap.iter().map(move |&key| (key, self.priorities[key]))
    }

    /// Sum of the priorities of all present keys
    pub fn total_priority(&self) -> f64 {
        self.iter().map(|(_, p)| p).sum()
    }

    /// Check the position index and the heap order over every present key
    pub fn is_heap_ordered(&self) -> bool {
        for (pos, &key) in self.heap.iter().enumerate() {
            if self.positions[key] != Some(pos) {
                return false;
            }
            for child in [2 * pos + 1, 2 * pos + 2] {
                if child < self.heap.len()
                    && O::precedes(self.priorities[self.heap[child]], self.priorities[key])
                {
                    return false;
                }
            }
        }
        self.positions.iter().filter(|p| p.is_some()).count() == self.heap.len()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = Some(a);
        self.positions[self.heap[b]] = Some(b);
    }

    /// Returns whether the key at `pos` moved
    fn sift_down(&mut self, mut pos: usize) -> bool {
        let size = self.heap.len();
        let start = pos;
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut best = pos;

            if left < size
                && O::precedes(self.priorities[self.heap[left]], self.priorities[self.heap[best]])
            {
                best = left;
            }
            if right < size
                && O::precedes(self.priorities[self.heap[right]], self.priorities[self.heap[best]])
            {
                best = right;
            }
            if best == pos {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
        pos != start
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if O::precedes(self.priorities[self.heap[pos]], self.priorities[self.heap[parent]]) {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }
}
