//! Reference Slot Scanning
//!
//! Walks an object's payload in machine-word strides, yielding the address
//! of every word the shape's reference mask marks as a traceable pointer.
//! Arrays repeat the per-element mask across every element. Shapes whose
//! hint bit says "no pointers" produce an empty iterator without touching
//! the mask at all.

use std::iter::FusedIterator;

use crate::object::header::{ObjectView, WORD_SIZE};
use crate::object::ty::{TypeDescriptor, MASK_WORD_BITS};

/// Lazy iterator over the traceable pointer slots of one object.
///
/// Yields absolute slot addresses in ascending order. `size_hint` is exact,
/// so `len()` via [`ExactSizeIterator`] reports the slots not yet yielded.
#[derive(Debug, Clone)]
pub struct RefSlotIter {
    /// Data pointer of the object being scanned.
    base: usize,
    /// Mask words covering one instance or element.
    mask: *const usize,
    /// Payload words per instance or element.
    unit_words: usize,
    /// Payload words across the whole object.
    total_words: usize,
    /// Next word index to test.
    word: usize,
    /// Marked slots not yet yielded.
    remaining: usize,
}

impl RefSlotIter {
    /// Iterator with nothing to yield.
    fn empty() -> Self {
        Self {
            base: 0,
            mask: std::ptr::null(),
            unit_words: 0,
            total_words: 0,
            word: 0,
            remaining: 0,
        }
    }

    /// Scanner for a classified object.
    ///
    /// # Safety
    ///
    /// The view must have been produced by `ObjectView::classify` over a
    /// live object whose descriptor and mask are still valid.
    pub(crate) unsafe fn over(view: &ObjectView) -> RefSlotIter {
        match view {
            ObjectView::String(_) => Self::empty(),
            ObjectView::Class(v) => Self::typed(v.object(), v.ty(), 1),
            ObjectView::Array(v) => Self::typed(v.object(), v.ty(), v.len()),
        }
    }

    unsafe fn typed(obj: usize, ty: &'static TypeDescriptor, units: usize) -> RefSlotIter {
        if !ty.has_refs() || units == 0 {
            return Self::empty();
        }
        debug_assert!(
            ty.user_byte_size % WORD_SIZE == 0,
            "shapes with traceable slots are word-granular"
        );

        let unit_words = ty.unit_words();
        if unit_words == 0 {
            return Self::empty();
        }

        RefSlotIter {
            base: obj,
            mask: ty.ref_mask,
            unit_words,
            total_words: unit_words * units,
            word: 0,
            remaining: Self::unit_bit_count(ty) * units,
        }
    }

    /// Set bits across one instance/element of the mask, ignoring bits the
    /// shape's word count does not cover.
    unsafe fn unit_bit_count(ty: &TypeDescriptor) -> usize {
        let unit_words = ty.unit_words();
        let mut bits = 0;
        for index in 0..ty.mask_word_count() {
            let covered = unit_words - index * MASK_WORD_BITS;
            let keep = if covered >= MASK_WORD_BITS {
                usize::MAX
            } else {
                (1usize << covered) - 1
            };
            bits += (ty.mask_word(index) & keep).count_ones() as usize;
        }
        bits
    }
}

impl Iterator for RefSlotIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.word < self.total_words {
            let word = self.word;
            self.word += 1;

            let unit_bit = word % self.unit_words;
            let mask_word = unsafe { *self.mask.add(unit_bit / MASK_WORD_BITS) };
            if mask_word & (1usize << (unit_bit % MASK_WORD_BITS)) != 0 {
                self.remaining -= 1;
                return Some(self.base + word * WORD_SIZE);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RefSlotIter {}

impl FusedIterator for RefSlotIter {}
