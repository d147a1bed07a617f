//! Cascading Free Pass
//!
//! Dropping the last reference to a graph root reclaims the root and every
//! object that becomes unreferenced because of it, in one iterative pass.
//! Each popped object loses one reference; only objects that hit zero are
//! scanned and released, so shared subgraphs survive until their true last
//! owner lets go.

use crate::arena::ArenaOracle;
use crate::heap::SharedHeap;
use crate::object::header::ObjectView;
use crate::refcount::CountPolicy;
use crate::worklist::WorkStack;

/// Counters for one freeing pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeOutcome {
    /// Objects released.
    pub freed: u64,
    /// Total bytes returned to the heap, headers included.
    pub bytes_reclaimed: u64,
}

/// Drop one reference from `root`, releasing everything that reaches zero.
///
/// Immortal objects and null pointers are skipped without touching their
/// memory. A null `root` is a no-op.
///
/// # Safety
///
/// `root` must be null or point at the data of a live object whose
/// reachable graph is laid out per [`crate::object::header`], with counts
/// this pass is allowed to adjust. No other thread may free or mutate the
/// graph during the pass.
pub unsafe fn run<P: CountPolicy>(
    heap: &dyn SharedHeap,
    oracle: &dyn ArenaOracle,
    worklist_capacity: usize,
    root: usize,
) -> FreeOutcome {
    let mut outcome = FreeOutcome::default();
    if root == 0 {
        return outcome;
    }

    let mut pending: WorkStack<usize> = WorkStack::with_capacity(worklist_capacity);
    pending.push(root);

    while let Some(obj) = pending.pop() {
        // Child slots are pushed unchecked; null and immortal entries drop
        // here, before any header read.
        if obj == 0 {
            continue;
        }
        if oracle.is_static(obj) {
            continue;
        }

        let view = ObjectView::classify(obj);
        if P::decrement(view.count_address()) != 0 {
            continue;
        }

        // Slot values are read before the span goes back to the heap.
        for slot in view.ref_slots() {
            pending.push(*(slot as *const usize));
        }
        release(heap, &view, &mut outcome);
    }

    outcome
}

unsafe fn release(heap: &dyn SharedHeap, view: &ObjectView, outcome: &mut FreeOutcome) {
    let bytes = view.span_bytes();
    heap.free_sized(view.base_address() as *mut u8, bytes);
    outcome.freed += 1;
    outcome.bytes_reclaimed += bytes as u64;
}
