//! Graph Interning Pass
//!
//! Promotes the graph reachable from a root out of the host's transient
//! arena into shared storage, preserving shape: shared subobjects stay
//! shared, cycles stay cycles. A per-pass promotion table maps each arena
//! source to its one copy; pointers already outside the arena are reused
//! in place with their count raised. Sources are never written, so the
//! arena remains intact after the pass.
//!
//! Tiny strings are the one exception to identity preservation: below one
//! machine word there is no room to justify a table entry, so every
//! reference gets a fresh copy.

use rustc_hash::FxHashMap;

use crate::arena::ArenaOracle;
use crate::error::fatal_alloc;
use crate::heap::SharedHeap;
use crate::logging::{log_event, PassEvent};
use crate::object::header::{ObjectView, COUNT_WORD_SIZE};
use crate::refcount::{self, CountPolicy};
use crate::worklist::WorkStack;

/// Result and counters of one interning pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternOutcome {
    /// Shared-storage counterpart of the root passed in.
    pub root: usize,
    /// Arena objects copied into shared storage.
    pub copied: u64,
    /// References resolved without a copy: promotion-table hits plus
    /// pointers that were already shared or immortal.
    pub reused: u64,
    /// Per-reference tiny string copies.
    pub tiny_copies: u64,
    /// Bytes allocated in shared storage, headers included.
    pub bytes_promoted: u64,
    /// Distinct large-object pages the traversal touched.
    pub large_pages: u64,
}

/// A destination slot and the source value read from it.
type Pending = (usize, usize);

/// Intern the graph reachable from `root`; returns its shared counterpart.
///
/// A null `root` is a no-op returning null. The page table is snapshotted
/// once; every classification in the pass uses that snapshot.
///
/// # Safety
///
/// `root` must be null or point at the data of a live object whose
/// reachable graph is laid out per [`crate::object::header`]. Arena pages
/// reported by the oracle must stay mapped and unmutated for the duration
/// of the pass.
pub unsafe fn run<P: CountPolicy>(
    heap: &dyn SharedHeap,
    oracle: &dyn ArenaOracle,
    worklist_capacity: usize,
    table_capacity: usize,
    root: usize,
) -> InternOutcome {
    let mut outcome = InternOutcome::default();
    if root == 0 {
        return outcome;
    }

    let mut pages = oracle.snapshot_pages();
    let mut promoted: FxHashMap<usize, usize> =
        FxHashMap::with_capacity_and_hasher(table_capacity, Default::default());
    let mut pending: WorkStack<Pending> = WorkStack::with_capacity(worklist_capacity);

    let mut interned_root: usize = 0;
    pending.push((&mut interned_root as *mut usize as usize, root));

    while let Some((slot, src)) = pending.pop() {
        let slot = slot as *mut usize;

        let page = oracle.classify(src, &pages);
        if page == pages.len() {
            // Already outside the arena: shared or immortal, reuse in
            // place. Immortals never have their count touched.
            if !oracle.is_static(src) {
                refcount::increment::<P>(src);
            }
            outcome.reused += 1;
            *slot = src;
            continue;
        }

        if pages[page].mark == 0 && oracle.is_large_object_page(pages[page].key) {
            let key = pages[page].key;
            pages[page].mark = key;
            outcome.large_pages += 1;
            log_event(PassEvent::LargePage { page_key: key });
        }

        let view = ObjectView::classify(src);
        let dst = match view {
            ObjectView::String(s) if s.is_tiny() => {
                // Below table granularity; every reference gets its own
                // copy.
                outcome.tiny_copies += 1;
                copy_object(heap, &view, &mut outcome)
            }
            _ => match promoted.get(&src) {
                Some(&copy) => {
                    refcount::increment::<P>(copy);
                    outcome.reused += 1;
                    *slot = copy;
                    continue;
                }
                None => {
                    let copy = copy_object(heap, &view, &mut outcome);
                    // The table entry lands before children are scanned,
                    // so back edges and cycles resolve to this same copy.
                    promoted.insert(src, copy);
                    outcome.copied += 1;

                    // Children are read from the source but their slots
                    // are filled in the copy.
                    for src_slot in view.ref_slots() {
                        let child = *(src_slot as *const usize);
                        if child != 0 {
                            pending.push((copy + (src_slot - src), child));
                        }
                    }
                    copy
                }
            },
        };

        *slot = dst;
    }

    outcome.root = interned_root;
    outcome
}

/// Copy one object span into shared storage. The copy starts with one
/// reference; metadata and payload are taken verbatim from the source.
unsafe fn copy_object(
    heap: &dyn SharedHeap,
    view: &ObjectView,
    outcome: &mut InternOutcome,
) -> usize {
    let span = view.span_bytes();
    let base = heap.allocate(span);
    if base.is_null() {
        fatal_alloc(span);
    }

    let metadata = view.metadata_bytes();
    *(base as *mut usize) = 1;
    std::ptr::copy_nonoverlapping(
        (view.object() - metadata) as *const u8,
        base.add(COUNT_WORD_SIZE),
        metadata + view.payload_bytes(),
    );

    outcome.bytes_promoted += span as u64;
    base as usize + COUNT_WORD_SIZE + metadata
}
