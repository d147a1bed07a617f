//! Object Headers - Layout Constants and Typed Views
//!
//! Every live object pointer points at its data; bookkeeping lives in the
//! bytes immediately in front of it:
//!
//! ```text
//! Class:  | count      | descriptor      | data ...
//! Array:  | count      | pad,len (u32x2) | descriptor | data ...
//! String: | count      | len,flags(u32x2)| data ...
//! ```
//!
//! The reference count always occupies the word at
//! `object - metadata - word`, where metadata is the shape's
//! `uninterned_metadata_byte_size` (strings: eight bytes on every target).
//! Strings are recognized by the top bit of the 32-bit word just before the
//! data pointer: for strings that word is the flags field with the bit
//! always set; for class/array objects it overlaps the descriptor pointer,
//! whose valid addresses never set it.
//!
//! All raw accessors are `unsafe`: they trust the caller to hand them a
//! pointer that really carries this layout. The typed views make that trust
//! explicit — construct one with [`ObjectView::classify`] and the layout
//! arithmetic stays in this module.

use crate::object::ty::{ObjectKind, TypeDescriptor};

/// Machine word size in bytes; headers and reference masks are
/// word-granular.
pub const WORD_SIZE: usize = std::mem::size_of::<usize>();

/// Size of the reference count word.
pub const COUNT_WORD_SIZE: usize = WORD_SIZE;

/// String metadata: a 32-bit length plus a 32-bit flags word, on every
/// target.
pub const STRING_METADATA_SIZE: usize = 8;

/// Class metadata: the descriptor word.
pub const CLASS_METADATA_SIZE: usize = WORD_SIZE;

/// Array metadata: the element-count word plus the descriptor word.
pub const ARRAY_METADATA_SIZE: usize = 2 * WORD_SIZE;

/// Top bit of the 32-bit word preceding the data pointer; set for strings.
pub const STRING_FLAG_BIT: u32 = 0x8000_0000;

/// Read the string discriminator of a live object.
///
/// # Safety
///
/// `obj` must point at the data of a live object laid out per this module.
#[inline]
pub unsafe fn is_string(obj: usize) -> bool {
    let tail = *((obj - 4) as *const u32);
    tail & STRING_FLAG_BIT != 0
}

/// Descriptor of a live class or array object.
///
/// # Safety
///
/// `obj` must point at the data of a live non-string object; the word
/// before it must hold a valid descriptor pointer.
#[inline]
pub unsafe fn descriptor(obj: usize) -> &'static TypeDescriptor {
    &**((obj - WORD_SIZE) as *const *const TypeDescriptor)
}

/// Header view of a string object.
#[derive(Debug, Clone, Copy)]
pub struct StringView {
    obj: usize,
}

impl StringView {
    /// Data pointer.
    #[inline]
    pub fn object(&self) -> usize {
        self.obj
    }

    /// Stored byte length.
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { *((self.obj - STRING_METADATA_SIZE) as *const u32) as usize }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strings below one machine word cannot carry a forwarding identity
    /// and are copied per reference during interning.
    #[inline]
    pub fn is_tiny(&self) -> bool {
        self.len() < WORD_SIZE
    }

    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn metadata_bytes(&self) -> usize {
        STRING_METADATA_SIZE
    }

    /// Address of the reference count word.
    #[inline]
    pub fn count_address(&self) -> usize {
        self.obj - STRING_METADATA_SIZE - COUNT_WORD_SIZE
    }
}

/// Header view of a class object.
#[derive(Debug, Clone, Copy)]
pub struct ClassView {
    obj: usize,
    ty: &'static TypeDescriptor,
}

impl ClassView {
    #[inline]
    pub fn object(&self) -> usize {
        self.obj
    }

    #[inline]
    pub fn ty(&self) -> &'static TypeDescriptor {
        self.ty
    }

    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.ty.user_byte_size
    }

    #[inline]
    pub fn metadata_bytes(&self) -> usize {
        self.ty.uninterned_metadata_byte_size
    }

    /// Address of the reference count word, two words before the object.
    #[inline]
    pub fn count_address(&self) -> usize {
        self.obj - self.metadata_bytes() - COUNT_WORD_SIZE
    }
}

/// Header view of an array object.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView {
    obj: usize,
    ty: &'static TypeDescriptor,
}

impl ArrayView {
    #[inline]
    pub fn object(&self) -> usize {
        self.obj
    }

    #[inline]
    pub fn ty(&self) -> &'static TypeDescriptor {
        self.ty
    }

    /// Element count, stored in the 32-bit field before the descriptor
    /// word.
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { *((self.obj - WORD_SIZE - 4) as *const u32) as usize }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.ty.user_byte_size * self.len()
    }

    #[inline]
    pub fn metadata_bytes(&self) -> usize {
        self.ty.uninterned_metadata_byte_size
    }

    /// Address of the reference count word, three words before the object.
    #[inline]
    pub fn count_address(&self) -> usize {
        self.obj - self.metadata_bytes() - COUNT_WORD_SIZE
    }
}

/// A classified object pointer with its header shape decoded.
#[derive(Debug, Clone, Copy)]
pub enum ObjectView {
    String(StringView),
    Class(ClassView),
    Array(ArrayView),
}

impl ObjectView {
    /// Decode the header shape of a live object.
    ///
    /// Aborts the process when the descriptor carries an unrecognized kind
    /// tag; that is a layout contract violation, not a recoverable error.
    ///
    /// # Safety
    ///
    /// `obj` must point at the data of a live object laid out per this
    /// module, with enough header bytes in front of it for its shape.
    pub unsafe fn classify(obj: usize) -> ObjectView {
        debug_assert!(obj != 0, "null object pointer");
        debug_assert!(obj % WORD_SIZE == 0, "unaligned object pointer {:#x}", obj);

        if is_string(obj) {
            return ObjectView::String(StringView { obj });
        }

        let ty = descriptor(obj);
        match ty.object_kind() {
            Some(ObjectKind::Class) => {
                debug_assert_eq!(ty.uninterned_metadata_byte_size, CLASS_METADATA_SIZE);
                ObjectView::Class(ClassView { obj, ty })
            }
            Some(ObjectKind::Array) => {
                debug_assert_eq!(ty.uninterned_metadata_byte_size, ARRAY_METADATA_SIZE);
                ObjectView::Array(ArrayView { obj, ty })
            }
            None => crate::error::fatal_layout(ty.kind),
        }
    }

    /// Data pointer of the viewed object.
    #[inline]
    pub fn object(&self) -> usize {
        match self {
            ObjectView::String(v) => v.object(),
            ObjectView::Class(v) => v.object(),
            ObjectView::Array(v) => v.object(),
        }
    }

    /// Address of the reference count word.
    #[inline]
    pub fn count_address(&self) -> usize {
        match self {
            ObjectView::String(v) => v.count_address(),
            ObjectView::Class(v) => v.count_address(),
            ObjectView::Array(v) => v.count_address(),
        }
    }

    /// Bytes of metadata between the count word and the data pointer.
    #[inline]
    pub fn metadata_bytes(&self) -> usize {
        match self {
            ObjectView::String(v) => v.metadata_bytes(),
            ObjectView::Class(v) => v.metadata_bytes(),
            ObjectView::Array(v) => v.metadata_bytes(),
        }
    }

    /// Bytes of user-visible payload.
    #[inline]
    pub fn payload_bytes(&self) -> usize {
        match self {
            ObjectView::String(v) => v.payload_bytes(),
            ObjectView::Class(v) => v.payload_bytes(),
            ObjectView::Array(v) => v.payload_bytes(),
        }
    }

    /// First byte of the allocation: the count word.
    #[inline]
    pub fn base_address(&self) -> usize {
        self.count_address()
    }

    /// Total allocation size: count word, metadata, payload.
    #[inline]
    pub fn span_bytes(&self) -> usize {
        COUNT_WORD_SIZE + self.metadata_bytes() + self.payload_bytes()
    }

    /// Whether the payload may contain traceable pointers.
    #[inline]
    pub fn has_refs(&self) -> bool {
        match self {
            ObjectView::String(_) => false,
            ObjectView::Class(v) => v.ty().has_refs(),
            ObjectView::Array(v) => v.ty().has_refs(),
        }
    }

    /// Lazy iterator over the addresses of traceable pointer slots.
    #[inline]
    pub fn ref_slots(&self) -> crate::object::scan::RefSlotIter {
        unsafe { crate::object::scan::RefSlotIter::over(self) }
    }
}
