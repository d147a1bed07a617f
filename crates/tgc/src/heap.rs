//! Shared Heap Seam
//!
//! Interning copies objects into storage that outlives the arena. Where
//! those bytes come from is the host's business; the passes only need
//! word-aligned allocate and sized free.

use std::alloc::Layout;

use crate::object::header::WORD_SIZE;

/// Destination storage for promoted objects.
///
/// Allocations are word aligned. A null return means the heap is
/// exhausted; the interning pass treats that as fatal.
pub trait SharedHeap: Send + Sync {
    /// Allocate `size` bytes. Null on exhaustion.
    fn allocate(&self, size: usize) -> *mut u8;

    /// Return an allocation to the heap.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this same heap with this same
    /// `size`, and must not be used afterwards.
    unsafe fn free_sized(&self, ptr: *mut u8, size: usize);
}

/// [`SharedHeap`] backed by the process allocator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHeap;

impl SharedHeap for SystemHeap {
    fn allocate(&self, size: usize) -> *mut u8 {
        // Zero-size spans cannot happen for real objects, but Layout
        // forbids them, so round up.
        let layout = match Layout::from_size_align(size.max(1), WORD_SIZE) {
            Ok(layout) => layout,
            Err(_) => return std::ptr::null_mut(),
        };
        unsafe { std::alloc::alloc(layout) }
    }

    unsafe fn free_sized(&self, ptr: *mut u8, size: usize) {
        if ptr.is_null() {
            return;
        }
        let layout = match Layout::from_size_align(size.max(1), WORD_SIZE) {
            Ok(layout) => layout,
            Err(_) => return,
        };
        std::alloc::dealloc(ptr, layout);
    }
}
