//! Object Model
//!
//! Raw-layout side of the crate: shape descriptors, header views over
//! unmanaged object pointers, and the reference-slot scanner driven by a
//! shape's pointer mask.

pub mod header;
pub mod scan;
pub mod ty;

pub use header::{
    descriptor, is_string, ArrayView, ClassView, ObjectView, StringView, ARRAY_METADATA_SIZE,
    CLASS_METADATA_SIZE, COUNT_WORD_SIZE, STRING_FLAG_BIT, STRING_METADATA_SIZE, WORD_SIZE,
};
pub use scan::RefSlotIter;
pub use ty::{
    ObjectKind, TypeDescriptor, HINT_HAS_REFS, KIND_ARRAY, KIND_CLASS, MASK_WORD_BITS,
};
