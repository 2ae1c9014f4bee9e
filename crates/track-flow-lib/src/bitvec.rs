//! Word-packed bit set over non-negative integers
//!
//! [`BitVector`] is the set primitive the whole pipeline is built on: simplified index
//! sets, segment masks, the per-frame in-view set and their differences are all
//! bit vectors. Algebra either mutates `self` in place, writes into a caller-supplied
//! result (`*_into`), or allocates (`new_*`), so the per-frame path never allocates
//! unless it asks to.

use crate::{DataError, Result};
use std::fmt;

type Word = u32;

const WORD_BITS: usize = Word::BITS as usize;

#[inline(always)]
fn words_for(capacity: usize) -> usize {
    capacity.div_ceil(WORD_BITS)
}

#[inline(always)]
fn split(index: usize) -> (usize, Word) {
    (index / WORD_BITS, 1 << (index % WORD_BITS))
}

/// Position of the `rank`-th set bit (0-based) inside a single word
#[inline]
fn select_in_word(mut word: Word, rank: u32) -> u32 {
    for _ in 0..rank {
        word &= word - 1;
    }
    word.trailing_zeros()
}

/// A resizable set of integers in `[0, capacity)`
///
/// Bits at or above `capacity` are always zero.
#[derive(Clone, Default)]
pub struct BitVector {
    words: Vec<Word>,
    capacity: usize,
}

impl BitVector {
    /// Create an empty set able to hold `[0, capacity)` without reallocating
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; words_for(capacity)],
            capacity,
        }
    }

    /// Create the set `[start, end)` with capacity `end`
    pub fn from_range(start: usize, end: usize) -> Self {
        let mut bits = Self::new(end);
        bits.add_range(start, end);
        bits
    }

    /// Create a set from arbitrary indices, sized to the largest one
    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let mut bits = Self::default();
        bits.extend(indices);
        bits
    }

    /// Logical capacity (exclusive upper bound of the domain)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow the domain to at least `capacity`. Never shrinks.
    pub fn resize(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        self.words.resize(words_for(capacity), 0);
        self.capacity = capacity;
    }

    /// Shrink the domain to `max() + 1` (or zero when empty) and release spare words
    pub fn trim(&mut self) {
        let capacity = self.max().map_or(0, |m| m + 1);
        self.words.truncate(words_for(capacity));
        self.words.shrink_to_fit();
        self.capacity = capacity;
    }

    /// Add `index`, growing the domain if needed
    #[inline]
    pub fn add(&mut self, index: usize) {
        if index >= self.capacity {
            self.resize(index + 1);
        }
        let (w, mask) = split(index);
        self.words[w] |= mask;
    }

    /// Remove `index`
    #[inline]
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        let (w, mask) = split(index);
        self.words[w] &= !mask;
        Ok(())
    }

    /// Toggle `index`, returning whether it is now a member
    #[inline]
    pub fn flip(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        let (w, mask) = split(index);
        self.words[w] ^= mask;
        Ok(self.words[w] & mask != 0)
    }

    /// Membership test. Indices outside the domain are simply absent.
    #[inline]
    pub fn has(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let (w, mask) = split(index);
        self.words[w] & mask != 0
    }

    #[inline]
    fn check(&self, index: usize) -> Result<()> {
        if index >= self.capacity {
            return Err(DataError::IndexOutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Add every index in `[start, end)`, growing if needed
    pub fn add_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.resize(end);
        for_each_word_mask(start, end, |w, mask| self.words[w] |= mask);
    }

    /// Remove every index in `[start, end)`
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        self.check(end - 1)?;
        for_each_word_mask(start, end, |w, mask| self.words[w] &= !mask);
        Ok(())
    }

    /// Add every index in the domain
    pub fn fill(&mut self) {
        self.words.fill(Word::MAX);
        self.mask_tail();
    }

    /// Remove every member, keeping the domain
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    fn mask_tail(&mut self) {
        let rem = self.capacity % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1 << rem) - 1;
            }
        }
    }

    /// Population count
    pub fn size(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Lowest member
    pub fn min(&self) -> Option<usize> {
        self.words
            .iter()
            .position(|&w| w != 0)
            .map(|i| i * WORD_BITS + self.words[i].trailing_zeros() as usize)
    }

    /// Highest member
    pub fn max(&self) -> Option<usize> {
        self.words.iter().rposition(|&w| w != 0).map(|i| {
            i * WORD_BITS + (WORD_BITS - 1 - self.words[i].leading_zeros() as usize)
        })
    }

    // ------------------------------------------------------------------
    // Set algebra
    // ------------------------------------------------------------------

    /// `self = self ∪ other`
    pub fn union(&mut self, other: &BitVector) -> &mut Self {
        self.resize(other.capacity);
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
        self
    }

    /// `self = self ∩ other`
    pub fn intersection(&mut self, other: &BitVector) -> &mut Self {
        for (i, a) in self.words.iter_mut().enumerate() {
            *a &= other.words.get(i).copied().unwrap_or(0);
        }
        self
    }

    /// `self = self \ other`
    pub fn difference(&mut self, other: &BitVector) -> &mut Self {
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
        self
    }

    /// `self = self △ other`
    pub fn symmetric_difference(&mut self, other: &BitVector) -> &mut Self {
        self.resize(other.capacity);
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a ^= b;
        }
        self
    }

    /// Write `self ∪ other` into `result`, reusing its allocation
    pub fn union_into(&self, other: &BitVector, result: &mut BitVector) {
        self.binary_into(other, result, self.capacity.max(other.capacity), |a, b| {
            a | b
        });
    }

    /// Write `self ∩ other` into `result`, reusing its allocation
    pub fn intersection_into(&self, other: &BitVector, result: &mut BitVector) {
        self.binary_into(other, result, self.capacity, |a, b| a & b);
    }

    /// Write `self \ other` into `result`, reusing its allocation
    pub fn difference_into(&self, other: &BitVector, result: &mut BitVector) {
        self.binary_into(other, result, self.capacity, |a, b| a & !b);
    }

    /// Write `self △ other` into `result`, reusing its allocation
    pub fn symmetric_difference_into(&self, other: &BitVector, result: &mut BitVector) {
        self.binary_into(other, result, self.capacity.max(other.capacity), |a, b| {
            a ^ b
        });
    }

    fn binary_into(
        &self,
        other: &BitVector,
        result: &mut BitVector,
        capacity: usize,
        op: impl Fn(Word, Word) -> Word,
    ) {
        let n = words_for(capacity);
        result.words.clear();
        result.words.extend((0..n).map(|i| {
            op(
                self.words.get(i).copied().unwrap_or(0),
                other.words.get(i).copied().unwrap_or(0),
            )
        }));
        result.capacity = capacity;
        result.mask_tail();
    }

    /// Allocate `self ∪ other`
    pub fn new_union(&self, other: &BitVector) -> BitVector {
        let mut result = BitVector::default();
        self.union_into(other, &mut result);
        result
    }

    /// Allocate `self ∩ other`
    pub fn new_intersection(&self, other: &BitVector) -> BitVector {
        let mut result = BitVector::default();
        self.intersection_into(other, &mut result);
        result
    }

    /// Allocate `self \ other`
    pub fn new_difference(&self, other: &BitVector) -> BitVector {
        let mut result = BitVector::default();
        self.difference_into(other, &mut result);
        result
    }

    /// Allocate `self △ other`
    pub fn new_symmetric_difference(&self, other: &BitVector) -> BitVector {
        let mut result = BitVector::default();
        self.symmetric_difference_into(other, &mut result);
        result
    }

    /// Replace the contents of `self` with those of `other`, reusing the allocation
    pub fn copy_from(&mut self, other: &BitVector) {
        self.words.clear();
        self.words.extend_from_slice(&other.words);
        self.capacity = other.capacity;
    }

    /// Whether every member of `self` is a member of `other`
    pub fn is_subset(&self, other: &BitVector) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, &a)| a & !other.words.get(i).copied().unwrap_or(0) == 0)
    }

    /// Same members, regardless of capacity
    pub fn equals(&self, other: &BitVector) -> bool {
        let n = self.words.len().max(other.words.len());
        (0..n).all(|i| {
            self.words.get(i).copied().unwrap_or(0) == other.words.get(i).copied().unwrap_or(0)
        })
    }

    // ------------------------------------------------------------------
    // Iteration and order statistics
    // ------------------------------------------------------------------

    /// Visit every member in ascending order
    pub fn for_each(&self, mut f: impl FnMut(usize)) {
        for (i, &word) in self.words.iter().enumerate() {
            let mut w = word;
            while w != 0 {
                f(i * WORD_BITS + w.trailing_zeros() as usize);
                w &= w - 1;
            }
        }
    }

    /// Lazy ascending iterator over members. Each call starts from the beginning.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// The `k`-th member in ascending order (0-based), O(words)
    pub fn nth_member(&self, k: usize) -> Option<usize> {
        NthCursor::new().nth(self, k)
    }

    /// Members as a sorted `Vec`
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Index-of-index-set composition: `{ self.nth_member(i) | i ∈ positions }`
    ///
    /// `positions` holds ranks into `self`; the result lives in `self`'s domain.
    pub fn compose(&self, positions: &BitVector) -> BitVector {
        let mut result = BitVector::new(self.capacity);
        let mut cursor = NthCursor::new();
        for k in positions.iter() {
            match cursor.nth(self, k) {
                Some(index) => result.add(index),
                None => break,
            }
        }
        result
    }
}

/// Call `f(word_index, mask)` for every word overlapped by `[start, end)`
fn for_each_word_mask(start: usize, end: usize, mut f: impl FnMut(usize, Word)) {
    let (first, last) = (start / WORD_BITS, (end - 1) / WORD_BITS);
    for w in first..=last {
        let lo = if w == first { start % WORD_BITS } else { 0 };
        let hi = if w == last {
            (end - 1) % WORD_BITS + 1
        } else {
            WORD_BITS
        };
        let mask = if hi - lo == WORD_BITS {
            Word::MAX
        } else {
            ((1 << (hi - lo)) - 1) << lo
        };
        f(w, mask);
    }
}

/// Stateful order-statistic cursor over a [`BitVector`]
///
/// Consecutive queries with non-decreasing `k` resume from the word where the previous
/// answer was found, so walking all members by rank costs O(1) amortized per query.
/// A smaller `k` than the last one restarts the scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NthCursor {
    word: usize,
    /// Number of members in words before `word`
    base: usize,
}

impl NthCursor {
    /// A cursor positioned at the start
    pub fn new() -> Self {
        Self::default()
    }

    /// The `k`-th member of `bits`
    pub fn nth(&mut self, bits: &BitVector, k: usize) -> Option<usize> {
        if k < self.base {
            *self = Self::default();
        }
        while let Some(&w) = bits.words.get(self.word) {
            let count = w.count_ones() as usize;
            if k < self.base + count {
                let bit = select_in_word(w, (k - self.base) as u32) as usize;
                return Some(self.word * WORD_BITS + bit);
            }
            self.base += count;
            self.word += 1;
        }
        None
    }
}

/// Ascending iterator over the members of a [`BitVector`]
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    words: &'a [Word],
    index: usize,
    current: Word,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.index * WORD_BITS + bit)
    }
}

impl<'a> IntoIterator for &'a BitVector {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<usize> for BitVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_indices(iter)
    }
}

impl Extend<usize> for BitVector {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.add(index);
        }
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for BitVector {}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
