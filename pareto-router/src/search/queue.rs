//! Bucketed monotone priority queue.
//!
//! Keys are bounded non-negative integers. The cursor only moves forward,
//! so each pop is amortized O(1). A key below the cursor is clamped to it.

use std::cmp::Ordering;

#[derive(Debug)]
pub struct BucketQueue<T> {
    buckets: Vec<Vec<T>>,
    cursor: usize,
    len: usize,
    sorted: bool,
}

impl<T> BucketQueue<T> {
    /// Creates a queue for keys `0..=max_bucket`. Larger keys are clamped.
    ///
    /// With `sorted`, each bucket is kept in comparator order and equal
    /// items pop first-in first-out.
    pub fn new(max_bucket: usize, sorted: bool) -> Self {
        let mut buckets = Vec::new();
        buckets.resize_with(max_bucket + 1, Vec::new);
        Self {
            buckets,
            cursor: 0,
            len: 0,
            sorted,
        }
    }

    pub fn max_bucket(&self) -> usize {
        self.buckets.len() - 1
    }

    /// Inserts `item` under `key`, ordering within the bucket by `cmp`
    /// (smallest pops first).
    pub fn push_by(&mut self, key: usize, item: T, cmp: impl Fn(&T, &T) -> Ordering) {
        let key = key.clamp(self.cursor, self.max_bucket());
        let bucket = &mut self.buckets[key];
        if self.sorted {
            // Descending, so the smallest item sits at the end. New items go
            // in front of their equals.
            let at = bucket.partition_point(|e| cmp(e, &item) == Ordering::Greater);
            bucket.insert(at, item);
        } else {
            bucket.push(item);
        }
        self.len += 1;
    }

    fn advance(&mut self) {
        while self.cursor < self.max_bucket() && self.buckets[self.cursor].is_empty() {
            self.cursor += 1;
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.advance();
        let item = self.buckets[self.cursor].pop()?;
        self.len -= 1;
        Some(item)
    }

    pub fn peek(&mut self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.advance();
        self.buckets[self.cursor].last()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Empties the queue and rewinds the cursor.
    ///
    /// Resizes if `max_bucket` changed.
    pub fn reset(&mut self, max_bucket: usize, sorted: bool) {
        for b in &mut self.buckets {
            b.clear();
        }
        self.buckets.resize_with(max_bucket + 1, Vec::new);
        self.cursor = 0;
        self.len = 0;
        self.sorted = sorted;
    }

    pub fn clear(&mut self) {
        let max = self.max_bucket();
        self.reset(max, self.sorted);
    }
}
