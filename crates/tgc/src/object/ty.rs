//! Type Descriptors - Static Shape Metadata
//!
//! Every class and array object carries a pointer to one of these in the
//! word immediately before its data pointer. Descriptors are emitted once
//! per concrete shape, shared globally, and never freed.
//!
//! The reference mask is a bit-per-word array covering one instance (class)
//! or one element (array); bit *i* set means word *i* of the payload holds a
//! traceable pointer. Its length in words is implied by `user_byte_size`,
//! so it is carried as a raw pointer rather than a sized slice.

use crate::object::header::WORD_SIZE;

/// Kind tag for a single fixed-shape instance.
pub const KIND_CLASS: u32 = 0;

/// Kind tag for repeated fixed-size elements with an adjacent element count.
pub const KIND_ARRAY: u32 = 1;

/// Bit 0 of `refs_hint_mask`: instances may contain traceable pointers.
pub const HINT_HAS_REFS: u32 = 1;

/// Bits per reference-mask word.
pub const MASK_WORD_BITS: usize = usize::BITS as usize;

/// Decoded object shape kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Single instance of `user_byte_size` bytes.
    Class,
    /// Run of elements, each `user_byte_size` bytes, with a 32-bit count
    /// stored in the object header.
    Array,
}

impl ObjectKind {
    /// Decode a raw kind tag. `None` for anything but the two known tags.
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            KIND_CLASS => Some(ObjectKind::Class),
            KIND_ARRAY => Some(ObjectKind::Array),
            _ => None,
        }
    }
}

/// Static shape metadata for class and array objects.
#[repr(C)]
#[derive(Debug)]
pub struct TypeDescriptor {
    /// Raw kind tag: `KIND_CLASS` or `KIND_ARRAY`.
    pub kind: u32,

    /// Bit 0 set when instances may hold traceable pointers; shapes with
    /// the bit clear skip reference scanning entirely.
    pub refs_hint_mask: u32,

    /// Byte size of one instance (class) or one element (array).
    pub user_byte_size: usize,

    /// Bytes of per-instance metadata preceding the data pointer, the
    /// descriptor word included. One word for classes, two for arrays.
    pub uninterned_metadata_byte_size: usize,

    /// Reference mask words; `mask_word_count()` entries.
    pub ref_mask: *const usize,
}

// Descriptors are immutable shared statics; the mask pointer targets
// immutable words with the same lifetime.
unsafe impl Send for TypeDescriptor {}
unsafe impl Sync for TypeDescriptor {}

impl TypeDescriptor {
    /// Build a descriptor over a mask that outlives it.
    pub fn new(
        kind: u32,
        refs_hint_mask: u32,
        user_byte_size: usize,
        uninterned_metadata_byte_size: usize,
        ref_mask: &'static [usize],
    ) -> Self {
        Self {
            kind,
            refs_hint_mask,
            user_byte_size,
            uninterned_metadata_byte_size,
            ref_mask: ref_mask.as_ptr(),
        }
    }

    /// Decoded kind tag; `None` for a corrupt descriptor.
    #[inline]
    pub const fn object_kind(&self) -> Option<ObjectKind> {
        ObjectKind::from_raw(self.kind)
    }

    /// True when instances may contain traceable pointers.
    #[inline]
    pub const fn has_refs(&self) -> bool {
        self.refs_hint_mask & HINT_HAS_REFS != 0
    }

    /// Payload words of one instance or element.
    #[inline]
    pub const fn unit_words(&self) -> usize {
        self.user_byte_size / WORD_SIZE
    }

    /// Number of mask words covering one instance or element.
    #[inline]
    pub const fn mask_word_count(&self) -> usize {
        self.unit_words().div_ceil(MASK_WORD_BITS)
    }

    /// Read mask word `index`.
    ///
    /// # Safety
    ///
    /// `index` must be below `mask_word_count()` and `ref_mask` must point
    /// at that many readable words.
    #[inline]
    pub unsafe fn mask_word(&self, index: usize) -> usize {
        debug_assert!(index < self.mask_word_count());
        *self.ref_mask.add(index)
    }
}
