//! Shared fixtures for the lifetime pass integration tests.
//!
//! Objects here are built the way the compiler would build them: raw
//! spans with hand-written headers, either bump-allocated in a scratch
//! arena (interning sources) or placed on a tracking heap (shared
//! objects). The tracking heap panics on double frees and span
//! mismatches, so every test doubles as a memory-safety check.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use tgc::object::{
    ObjectView, TypeDescriptor, ARRAY_METADATA_SIZE, CLASS_METADATA_SIZE, COUNT_WORD_SIZE,
    HINT_HAS_REFS, KIND_ARRAY, KIND_CLASS, MASK_WORD_BITS, STRING_FLAG_BIT, STRING_METADATA_SIZE,
    WORD_SIZE,
};
use tgc::{
    refcount, ArenaOracle, NonAtomicCount, ObjectRuntime, PageCell, RuntimeConfig, SharedHeap,
    SystemHeap,
};

/// ============================================================
/// TrackingHeap - shared heap that audits every allocation
/// ============================================================
///
/// Delegates real memory to [`SystemHeap`] and keeps a ledger of live
/// allocations. Freeing an address it does not know, or freeing with the
/// wrong span, panics immediately with the address in the message.
pub struct TrackingHeap {
    live: Mutex<HashMap<usize, usize>>,
    total_allocated: AtomicU64,
    total_freed: AtomicU64,
    free_calls: AtomicU64,
}

impl TrackingHeap {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(HashMap::new()),
            total_allocated: AtomicU64::new(0),
            total_freed: AtomicU64::new(0),
            free_calls: AtomicU64::new(0),
        }
    }

    /// Allocations not yet freed.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Bytes in allocations not yet freed.
    pub fn live_bytes(&self) -> u64 {
        self.live.lock().values().map(|&size| size as u64).sum()
    }

    pub fn allocated_bytes(&self) -> u64 {
        self.total_allocated.load(Ordering::Relaxed)
    }

    pub fn freed_bytes(&self) -> u64 {
        self.total_freed.load(Ordering::Relaxed)
    }

    pub fn free_call_count(&self) -> u64 {
        self.free_calls.load(Ordering::Relaxed)
    }
}

impl Default for TrackingHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedHeap for TrackingHeap {
    fn allocate(&self, size: usize) -> *mut u8 {
        let ptr = SystemHeap.allocate(size);
        if !ptr.is_null() {
            self.live.lock().insert(ptr as usize, size);
            self.total_allocated.fetch_add(size as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn free_sized(&self, ptr: *mut u8, size: usize) {
        let addr = ptr as usize;
        match self.live.lock().remove(&addr) {
            Some(recorded) => assert_eq!(
                recorded, size,
                "span mismatch freeing {:#x}: allocated {} bytes, freed {}",
                addr, recorded, size
            ),
            None => panic!("DOUBLE-FREE or free of unknown allocation at {:#x}", addr),
        }
        self.total_freed.fetch_add(size as u64, Ordering::Relaxed);
        self.free_calls.fetch_add(1, Ordering::Relaxed);
        SystemHeap.free_sized(ptr, size);
    }
}

/// ============================================================
/// ScratchArena - one-page bump arena with an oracle
/// ============================================================
///
/// A single leaked, word-aligned buffer serving as the transient arena
/// interning sources live in. Also implements [`ArenaOracle`]: one page,
/// optionally flagged large, plus the registered immortal ranges.
pub struct ScratchArena {
    base: usize,
    limit: usize,
    cursor: AtomicUsize,
    large: bool,
    statics: Mutex<Vec<(usize, usize)>>,
}

impl ScratchArena {
    pub fn new(capacity_bytes: usize) -> Self {
        Self::build(capacity_bytes, false)
    }

    /// Arena whose single page reports as a large-object page.
    pub fn new_large(capacity_bytes: usize) -> Self {
        Self::build(capacity_bytes, true)
    }

    fn build(capacity_bytes: usize, large: bool) -> Self {
        let words = capacity_bytes.div_ceil(WORD_SIZE);
        let base = Box::leak(vec![0usize; words].into_boxed_slice()).as_mut_ptr() as usize;
        Self {
            base,
            limit: base + words * WORD_SIZE,
            cursor: AtomicUsize::new(0),
            large,
            statics: Mutex::new(Vec::new()),
        }
    }

    /// Bump-allocate a word-aligned span; panics when the page is full.
    pub fn alloc(&self, bytes: usize) -> usize {
        let rounded = bytes.div_ceil(WORD_SIZE) * WORD_SIZE;
        let offset = self.cursor.fetch_add(rounded, Ordering::Relaxed);
        let start = self.base + offset;
        assert!(
            start + rounded <= self.limit,
            "scratch arena exhausted allocating {} bytes",
            bytes
        );
        start
    }

    /// Declare `base..limit` immortal for this oracle.
    pub fn mark_static(&self, base: usize, limit: usize) {
        self.statics.lock().push((base, limit));
    }

    pub fn page_base(&self) -> usize {
        self.base
    }
}

impl ArenaOracle for ScratchArena {
    fn page_count(&self) -> usize {
        1
    }

    fn snapshot_pages(&self) -> Vec<PageCell> {
        vec![PageCell::new(self.base, self.limit)]
    }

    fn is_large_object_page(&self, page_key: usize) -> bool {
        self.large && page_key == self.base
    }

    fn is_static(&self, ptr: usize) -> bool {
        self.statics
            .lock()
            .iter()
            .any(|&(base, limit)| base <= ptr && ptr < limit)
    }
}

/// ============================================================
/// Descriptor and object builders
/// ============================================================

/// Leak a descriptor whose mask sets the given unit-relative word bits.
pub fn leak_descriptor(
    kind: u32,
    unit_words: usize,
    metadata: usize,
    ref_bits: &[usize],
) -> &'static TypeDescriptor {
    let mask_words = unit_words.div_ceil(MASK_WORD_BITS).max(1);
    let mut mask = vec![0usize; mask_words];
    for &bit in ref_bits {
        mask[bit / MASK_WORD_BITS] |= 1usize << (bit % MASK_WORD_BITS);
    }
    let hint = if ref_bits.is_empty() { 0 } else { HINT_HAS_REFS };
    let mask: &'static [usize] = Box::leak(mask.into_boxed_slice());
    Box::leak(Box::new(TypeDescriptor::new(
        kind,
        hint,
        unit_words * WORD_SIZE,
        metadata,
        mask,
    )))
}

pub fn class_descriptor(field_words: usize, ref_bits: &[usize]) -> &'static TypeDescriptor {
    leak_descriptor(KIND_CLASS, field_words, CLASS_METADATA_SIZE, ref_bits)
}

pub fn array_descriptor(elem_words: usize, ref_bits: &[usize]) -> &'static TypeDescriptor {
    leak_descriptor(KIND_ARRAY, elem_words, ARRAY_METADATA_SIZE, ref_bits)
}

pub fn class_span(ty: &TypeDescriptor) -> usize {
    COUNT_WORD_SIZE + CLASS_METADATA_SIZE + ty.user_byte_size
}

pub fn array_span(ty: &TypeDescriptor, len: usize) -> usize {
    COUNT_WORD_SIZE + ARRAY_METADATA_SIZE + ty.user_byte_size * len
}

pub fn string_span(len: usize) -> usize {
    COUNT_WORD_SIZE + STRING_METADATA_SIZE + len
}

/// Write a class object into a span starting at `base`; returns the data
/// pointer.
///
/// # Safety
///
/// `base` must have room for `class_span(ty)` bytes and be word aligned.
pub unsafe fn write_class(
    base: usize,
    ty: &'static TypeDescriptor,
    count: usize,
    fields: &[usize],
) -> usize {
    debug_assert_eq!(fields.len() * WORD_SIZE, ty.user_byte_size);
    let obj = base + COUNT_WORD_SIZE + CLASS_METADATA_SIZE;
    *(base as *mut usize) = count;
    *((obj - WORD_SIZE) as *mut *const TypeDescriptor) = ty;
    for (index, &value) in fields.iter().enumerate() {
        *((obj + index * WORD_SIZE) as *mut usize) = value;
    }
    obj
}

/// Write an array object; element count is `elems.len()` divided by the
/// shape's words per element.
///
/// # Safety
///
/// `base` must have room for the array span and be word aligned.
pub unsafe fn write_array(
    base: usize,
    ty: &'static TypeDescriptor,
    count: usize,
    elems: &[usize],
) -> usize {
    let unit_words = ty.unit_words();
    debug_assert!(unit_words > 0 && elems.len() % unit_words == 0);
    let len = elems.len() / unit_words;

    let obj = base + COUNT_WORD_SIZE + ARRAY_METADATA_SIZE;
    *(base as *mut usize) = count;
    // The pad half of the length word is cleared before the length lands.
    *((obj - 2 * WORD_SIZE) as *mut usize) = 0;
    *((obj - WORD_SIZE - 4) as *mut u32) = len as u32;
    *((obj - WORD_SIZE) as *mut *const TypeDescriptor) = ty;
    for (index, &value) in elems.iter().enumerate() {
        *((obj + index * WORD_SIZE) as *mut usize) = value;
    }
    obj
}

/// Write a string object; returns the data pointer.
///
/// # Safety
///
/// `base` must have room for `string_span(bytes.len())` bytes and be word
/// aligned.
pub unsafe fn write_string(base: usize, count: usize, bytes: &[u8]) -> usize {
    let obj = base + COUNT_WORD_SIZE + STRING_METADATA_SIZE;
    *(base as *mut usize) = count;
    *((obj - STRING_METADATA_SIZE) as *mut u32) = bytes.len() as u32;
    *((obj - 4) as *mut u32) = STRING_FLAG_BIT;
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), obj as *mut u8, bytes.len());
    obj
}

/// # Safety
///
/// `obj` must be a live object pointer.
pub unsafe fn set_count(obj: usize, count: usize) {
    *(ObjectView::classify(obj).count_address() as *mut usize) = count;
}

/// ============================================================
/// Fixture - heap, arena, and runtime wired together
/// ============================================================
pub struct Fixture {
    pub heap: Arc<TrackingHeap>,
    pub arena: Arc<ScratchArena>,
    pub rt: ObjectRuntime,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_arena(ScratchArena::new(1 << 20))
    }

    pub fn with_arena(arena: ScratchArena) -> Self {
        let heap = Arc::new(TrackingHeap::new());
        let arena = Arc::new(arena);
        let rt = ObjectRuntime::new(RuntimeConfig::default(), heap.clone(), arena.clone())
            .expect("default configuration is valid");
        Self { heap, arena, rt }
    }

    /// Class in the arena with one reference.
    pub fn arena_class(&self, ty: &'static TypeDescriptor, fields: &[usize]) -> usize {
        let base = self.arena.alloc(class_span(ty));
        unsafe { write_class(base, ty, 1, fields) }
    }

    /// Array in the arena with one reference.
    pub fn arena_array(&self, ty: &'static TypeDescriptor, elems: &[usize]) -> usize {
        let unit_words = ty.unit_words();
        let base = self.arena.alloc(array_span(ty, elems.len() / unit_words));
        unsafe { write_array(base, ty, 1, elems) }
    }

    /// String in the arena with one reference.
    pub fn arena_string(&self, text: &str) -> usize {
        let base = self.arena.alloc(string_span(text.len()));
        unsafe { write_string(base, 1, text.as_bytes()) }
    }

    /// Class on the tracking heap with one reference.
    pub fn shared_class(&self, ty: &'static TypeDescriptor, fields: &[usize]) -> usize {
        let base = self.heap.allocate(class_span(ty)) as usize;
        assert!(base != 0, "tracking heap allocation failed");
        unsafe { write_class(base, ty, 1, fields) }
    }

    /// Array on the tracking heap with one reference.
    pub fn shared_array(&self, ty: &'static TypeDescriptor, elems: &[usize]) -> usize {
        let unit_words = ty.unit_words();
        let base = self.heap.allocate(array_span(ty, elems.len() / unit_words)) as usize;
        assert!(base != 0, "tracking heap allocation failed");
        unsafe { write_array(base, ty, 1, elems) }
    }

    /// String on the tracking heap with one reference.
    pub fn shared_string(&self, text: &str) -> usize {
        let base = self.heap.allocate(string_span(text.len())) as usize;
        assert!(base != 0, "tracking heap allocation failed");
        unsafe { write_string(base, 1, text.as_bytes()) }
    }

    /// Immortal string outside the arena, registered with the oracle.
    pub fn static_string(&self, text: &str) -> usize {
        let span = string_span(text.len());
        let words = span.div_ceil(WORD_SIZE);
        let base = Box::leak(vec![0usize; words].into_boxed_slice()).as_mut_ptr() as usize;
        self.arena.mark_static(base, base + words * WORD_SIZE);
        unsafe { write_string(base, 1, text.as_bytes()) }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// ============================================================
/// Readers and assertions
/// ============================================================

/// # Safety
///
/// `obj` must be a live object pointer.
pub unsafe fn count_of(obj: usize) -> usize {
    refcount::count::<NonAtomicCount>(obj)
}

/// # Safety
///
/// `obj` must be a live object with at least `index + 1` payload words.
pub unsafe fn field(obj: usize, index: usize) -> usize {
    *((obj + index * WORD_SIZE) as *const usize)
}

/// # Safety
///
/// `obj` must be a live string object.
pub unsafe fn string_bytes(obj: usize) -> Vec<u8> {
    let len = *((obj - STRING_METADATA_SIZE) as *const u32) as usize;
    std::slice::from_raw_parts(obj as *const u8, len).to_vec()
}

/// Byte-for-byte copy of an object's full span, headers included.
///
/// # Safety
///
/// `obj` must be a live object pointer.
pub unsafe fn span_snapshot(obj: usize) -> Vec<u8> {
    let view = ObjectView::classify(obj);
    std::slice::from_raw_parts(view.base_address() as *const u8, view.span_bytes()).to_vec()
}

#[track_caller]
pub fn assert_live_objects(heap: &TrackingHeap, expected: usize) {
    assert_eq!(
        heap.live_count(),
        expected,
        "live allocation count mismatch"
    );
}

#[track_caller]
pub fn assert_reclaimed_bytes(heap: &TrackingHeap, expected: u64) {
    assert_eq!(heap.freed_bytes(), expected, "reclaimed byte count mismatch");
}
