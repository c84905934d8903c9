//! Fixed-capacity SPMC ring with a two-snapshot read protocol

use crossbeam::utils::CachePadded;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering, fence};
use thiserror::Error;

/// Ring construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity must be a non-zero power of two so indices can be masked
    #[error("Ring capacity must be a non-zero power of two, got {capacity}")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
    },
}

/// Window of items returned by [`RingBuffer::read`]
///
/// `items[i]` is the item written at absolute index `range_start + i`, and the
/// last item sits at `range_end`. An empty batch carries no meaningful
/// `range_end`; its `range_start` is the cursor, or the first index not lost
/// if the writer lapped every slot while they were being copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBatch<T> {
    /// Copied items in write order
    pub items: Vec<T>,
    /// Absolute index of the first item
    pub range_start: usize,
    /// Absolute index of the last item (inclusive)
    pub range_end: usize,
    cursor: usize,
}

impl<T> ReadBatch<T> {
    const fn empty(cursor: usize) -> Self {
        Self {
            items: Vec::new(),
            range_start: cursor,
            range_end: cursor,
            cursor,
        }
    }

    /// True if nothing new was available
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items copied
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items the reader lost because it fell more than `capacity` behind
    #[must_use]
    pub const fn missed(&self) -> usize {
        self.range_start.saturating_sub(self.cursor)
    }

    /// True if [`Self::missed`] is non-zero
    #[must_use]
    pub const fn overflowed(&self) -> bool {
        self.range_start > self.cursor
    }

    /// Cursor the reader should pass to its next read
    ///
    /// Lost items are skipped even when nothing was copied, so they are
    /// reported by one read only.
    #[must_use]
    pub fn next_cursor(&self) -> usize {
        if self.items.is_empty() {
            self.range_start.max(self.cursor)
        } else {
            self.range_end + 1
        }
    }
}

/// Item that can live in a [`RingBuffer`] slot
///
/// A slot is a fixed run of `AtomicU64` words, so every item must convert
/// to and from a fixed-size word array without loss.
pub trait RingItem: Copy + Default {
    /// Word array the item packs into, e.g. `[u64; 5]`
    type Words: AsRef<[u64]> + AsMut<[u64]> + Copy + Default;

    /// Pack into words
    fn to_words(&self) -> Self::Words;

    /// Unpack from words produced by [`RingItem::to_words`]
    fn from_words(words: &Self::Words) -> Self;
}

macro_rules! ring_item_for_int {
    ($($ty:ty),*) => {
        $(
            impl RingItem for $ty {
                type Words = [u64; 1];

                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_possible_wrap,
                    clippy::cast_lossless,
                    clippy::unnecessary_cast
                )]
                fn to_words(&self) -> Self::Words {
                    [*self as u64]
                }

                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_possible_wrap,
                    clippy::cast_lossless,
                    clippy::unnecessary_cast
                )]
                fn from_words(words: &Self::Words) -> Self {
                    words[0] as Self
                }
            }
        )*
    };
}

ring_item_for_int!(u8, u16, u32, u64, usize, i32, i64);

/// Slot stamp while index `index` is being written
const fn writing_stamp(index: usize) -> usize {
    index.wrapping_mul(2).wrapping_add(1)
}

/// Slot stamp once index `index` is complete
const fn written_stamp(index: usize) -> usize {
    index.wrapping_mul(2).wrapping_add(2)
}

/// Broadcast ring: one writer, many independent readers
///
/// Each slot is a stamp plus the item's words, all plain atomics, so neither
/// side ever takes a lock. The writer marks a slot odd while rewriting it and
/// even once done; a reader keeps a copied item only if the stamp matched the
/// index it wanted both before and after copying the words. Overwritten or
/// half-written slots are reported as missed, never returned.
pub struct RingBuffer<T: RingItem> {
    stamps: Box<[AtomicUsize]>,
    words: Box<[AtomicU64]>,
    stride: usize,
    mask: usize,
    written: CachePadded<AtomicUsize>,
    _item: PhantomData<T>,
}

impl<T: RingItem> RingBuffer<T> {
    /// Validate a capacity before any ring is built with it
    ///
    /// # Errors
    /// Returns [`RingError::InvalidCapacity`] unless `capacity` is a non-zero
    /// power of two.
    pub const fn check_capacity(capacity: usize) -> Result<(), RingError> {
        if capacity.is_power_of_two() {
            Ok(())
        } else {
            Err(RingError::InvalidCapacity { capacity })
        }
    }

    /// Create a ring with the given capacity
    ///
    /// # Errors
    /// Returns [`RingError::InvalidCapacity`] unless `capacity` is a non-zero
    /// power of two.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Self::check_capacity(capacity)?;
        Ok(Self::with_capacity_log2(capacity.trailing_zeros()))
    }

    /// Create a ring holding `2^log2` items
    #[must_use]
    pub fn with_capacity_log2(log2: u32) -> Self {
        let capacity = 1usize << log2;
        let empty = T::default().to_words();
        let stride = empty.as_ref().len();
        // Stamp 0 never matches a written index, so fresh slots read as empty
        let stamps = (0..capacity).map(|_| AtomicUsize::new(0)).collect();
        let words = (0..capacity)
            .flat_map(|_| empty.as_ref().iter().map(|w| AtomicU64::new(*w)))
            .collect();
        Self {
            stamps,
            words,
            stride,
            mask: capacity - 1,
            written: CachePadded::new(AtomicUsize::new(0)),
            _item: PhantomData,
        }
    }

    /// Fixed capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.stamps.len()
    }

    /// Total number of items ever pushed
    #[must_use]
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Acquire)
    }

    fn slot_words(&self, slot: usize) -> &[AtomicU64] {
        &self.words[slot * self.stride..(slot + 1) * self.stride]
    }

    /// Append an item, overwriting the oldest slot once the ring is full
    ///
    /// Must only be called from the single writer thread. Never waits.
    #[inline]
    pub fn push(&self, item: T) {
        let index = self.written.load(Ordering::Relaxed);
        let slot = index & self.mask;
        let stamp = &self.stamps[slot];

        stamp.store(writing_stamp(index), Ordering::Relaxed);
        fence(Ordering::Release);
        for (cell, word) in self.slot_words(slot).iter().zip(item.to_words().as_ref()) {
            cell.store(*word, Ordering::Relaxed);
        }
        stamp.store(written_stamp(index), Ordering::Release);
        self.written.store(index + 1, Ordering::Release);
    }

    /// Copy the item written at `index`, or `None` if its slot has moved on
    #[inline]
    fn load(&self, index: usize) -> Option<T> {
        let slot = index & self.mask;
        let stamp = &self.stamps[slot];
        let expected = written_stamp(index);

        if stamp.load(Ordering::Acquire) != expected {
            return None;
        }
        let mut words = T::Words::default();
        for (word, cell) in words.as_mut().iter_mut().zip(self.slot_words(slot)) {
            *word = cell.load(Ordering::Relaxed);
        }
        fence(Ordering::Acquire);
        (stamp.load(Ordering::Relaxed) == expected).then(|| T::from_words(&words))
    }

    /// Copy everything from `cursor` onwards that is still in the ring
    #[inline]
    #[must_use]
    pub fn read(&self, cursor: usize) -> ReadBatch<T> {
        self.read_with_hook(cursor, || {})
    }

    /// [`Self::read`] with `between` run after the first counter snapshot and
    /// before any slot is copied
    ///
    /// Lets callers interleave writes with a read deterministically.
    #[must_use]
    pub fn read_with_hook<F: FnOnce()>(&self, cursor: usize, between: F) -> ReadBatch<T> {
        let capacity = self.capacity();
        let first = self.written.load(Ordering::Acquire);

        between();

        if cursor >= first {
            return ReadBatch::empty(cursor);
        }

        let mut lower = cursor.max(first.saturating_sub(capacity));
        let mut items = Vec::with_capacity(first - lower);
        self.copy_range(lower..first, &mut lower, &mut items);

        // Anything below the new lower bound may have been overwritten while
        // it was being copied.
        let second = self.written.load(Ordering::Acquire);
        let lower_second = cursor.max(second.saturating_sub(capacity));
        if lower_second > lower {
            let stale = (lower_second - lower).min(items.len());
            items.drain(..stale);
            lower = lower_second;
        }
        self.copy_range(first.max(lower)..second, &mut lower, &mut items);

        // Every copied slot can still be lapped before it is loaded, which
        // leaves an empty batch that nonetheless lost items
        let range_end = (lower + items.len()).saturating_sub(1).max(lower);
        ReadBatch {
            items,
            range_start: lower,
            range_end,
            cursor,
        }
    }

    /// Append the items at `indices`; a slot that has moved on invalidates
    /// everything before it, since the writer overwrites in index order
    fn copy_range(&self, indices: Range<usize>, lower: &mut usize, items: &mut Vec<T>) {
        for index in indices {
            match self.load(index) {
                Some(item) => items.push(item),
                None => {
                    items.clear();
                    *lower = index + 1;
                }
            }
        }
    }
}

impl<T: RingItem> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("written", &self.written.load(Ordering::Relaxed))
            .finish()
    }
}
