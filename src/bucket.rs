//! Bucket arena for sieving primes.
//!
//! Buckets are fixed-capacity runs of [`WheelPrime`]s carved out of one slab
//! that grows `buckets_per_alloc` buckets at a time. Buckets are referenced
//! by [`BucketId`], chain through `next` and go back to a free list once
//! drained, so a tier never reallocates a monolithic array of primes.

use crate::wheel::{WHEEL_PRIME_BYTES, WheelPrime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketId(u32);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    /// First slot of this bucket in the slab.
    offset: usize,
    len: usize,
    next: Option<BucketId>,
}

#[derive(Debug)]
pub struct BucketPool {
    slab: Vec<WheelPrime>,
    buckets: Vec<Bucket>,
    free: Vec<BucketId>,
    capacity: usize,
    buckets_per_alloc: usize,
}

impl BucketPool {
    /// Pool of buckets holding `capacity` primes each, growing by
    /// `buckets_per_alloc` buckets whenever the free list runs dry.
    pub fn new(capacity: usize, buckets_per_alloc: usize) -> Self {
        assert!(capacity > 0, "bucket capacity must be non-zero");
        Self {
            slab: Vec::new(),
            buckets: Vec::new(),
            free: Vec::new(),
            capacity,
            buckets_per_alloc: buckets_per_alloc.max(1),
        }
    }

    /// Pool whose growth step is bounded by a memory budget in bytes.
    pub fn with_memory_per_alloc(capacity: usize, bytes: usize) -> Self {
        let per_alloc = bytes / (capacity * WHEEL_PRIME_BYTES);
        Self::new(capacity, per_alloc)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buckets ever allocated (in use plus free).
    pub fn allocated(&self) -> usize {
        self.buckets.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    fn grow(&mut self) {
        let first = self.buckets.len();
        self.slab
            .resize(self.slab.len() + self.capacity * self.buckets_per_alloc, WheelPrime::default());
        for i in 0..self.buckets_per_alloc {
            self.buckets.push(Bucket {
                offset: (first + i) * self.capacity,
                len: 0,
                next: None,
            });
        }
        // Pop order hands out the lowest ids first.
        self.free
            .extend((first..first + self.buckets_per_alloc).rev().map(|i| BucketId(i as u32)));
    }

    /// Takes an empty bucket chained in front of `next`.
    pub fn allocate(&mut self, next: Option<BucketId>) -> BucketId {
        if self.free.is_empty() {
            self.grow();
        }
        let id = self.free.pop().unwrap_or_else(|| unreachable!("pool grew"));
        let bucket = &mut self.buckets[id.0 as usize];
        bucket.len = 0;
        bucket.next = next;
        id
    }

    /// Returns a drained bucket to the free list.
    pub fn release(&mut self, id: BucketId) {
        let bucket = &mut self.buckets[id.0 as usize];
        bucket.len = 0;
        bucket.next = None;
        self.free.push(id);
    }

    /// Appends to `id`, `false` if the bucket is full.
    #[inline]
    pub fn push(&mut self, id: BucketId, prime: WheelPrime) -> bool {
        let bucket = &mut self.buckets[id.0 as usize];
        if bucket.len == self.capacity {
            return false;
        }
        self.slab[bucket.offset + bucket.len] = prime;
        bucket.len += 1;
        true
    }

    /// Appends to the chain headed by `head`, allocating a new head when the
    /// current one is full. Returns the (possibly new) head.
    #[inline]
    pub fn push_front(&mut self, head: Option<BucketId>, prime: WheelPrime) -> BucketId {
        if let Some(id) = head {
            if self.push(id, prime) {
                return id;
            }
        }
        let id = self.allocate(head);
        self.push(id, prime);
        id
    }

    #[inline]
    pub fn len(&self, id: BucketId) -> usize {
        self.buckets[id.0 as usize].len
    }

    #[inline]
    pub fn next(&self, id: BucketId) -> Option<BucketId> {
        self.buckets[id.0 as usize].next
    }

    #[inline]
    pub fn get(&self, id: BucketId, i: usize) -> WheelPrime {
        let bucket = &self.buckets[id.0 as usize];
        debug_assert!(i < bucket.len);
        self.slab[bucket.offset + i]
    }

    #[inline]
    pub fn entries_mut(&mut self, id: BucketId) -> &mut [WheelPrime] {
        let bucket = self.buckets[id.0 as usize];
        &mut self.slab[bucket.offset..bucket.offset + bucket.len]
    }

    /// Total primes stored in the chain starting at `head`.
    pub fn chain_len(&self, head: Option<BucketId>) -> usize {
        let mut total = 0;
        let mut id = head;
        while let Some(bucket) = id {
            total += self.len(bucket);
            id = self.next(bucket);
        }
        total
    }
}
