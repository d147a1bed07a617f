//! Arena Boundary Oracle
//!
//! Interning must decide, for every reachable pointer, whether it lies in
//! the host's transient arena (and needs promotion) or already outside it
//! (and is reused in place). The host answers through [`ArenaOracle`]; a
//! pass snapshots the page table once up front and classifies against that
//! snapshot, so a pass sees one consistent view even if the host grows the
//! arena concurrently.

/// One arena page in a pass's snapshot.
///
/// Pages are half-open address ranges `key..limit`. The `mark` field is
/// scratch space owned by the running pass; it starts zero in every
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCell {
    /// First address of the page; doubles as its identity.
    pub key: usize,
    /// One past the last address of the page.
    pub limit: usize,
    /// Pass-local scratch word, zero in a fresh snapshot.
    pub mark: usize,
}

impl PageCell {
    pub fn new(key: usize, limit: usize) -> Self {
        Self {
            key,
            limit,
            mark: 0,
        }
    }

    #[inline]
    pub fn contains(&self, ptr: usize) -> bool {
        self.key <= ptr && ptr < self.limit
    }
}

/// Host-side knowledge of arena pages and immortal objects.
///
/// `snapshot_pages` must return pages sorted by `key` and pairwise
/// disjoint; the default `classify` relies on that order.
pub trait ArenaOracle: Send + Sync {
    /// Number of pages a snapshot would currently contain.
    fn page_count(&self) -> usize;

    /// Copy of the current page table, sorted by `key`.
    fn snapshot_pages(&self) -> Vec<PageCell>;

    /// Index of the snapshot page containing `ptr`, or `pages.len()` when
    /// `ptr` lies outside every page.
    fn classify(&self, ptr: usize, pages: &[PageCell]) -> usize {
        let mut lo = 0;
        let mut hi = pages.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let page = &pages[mid];
            if page.limit <= ptr {
                lo = mid + 1;
            } else if page.key > ptr {
                hi = mid;
            } else {
                return mid;
            }
        }
        pages.len()
    }

    /// Whether the page at `page_key` holds a single large object.
    fn is_large_object_page(&self, page_key: usize) -> bool;

    /// Whether `ptr` is an immortal object whose count is never adjusted.
    fn is_static(&self, ptr: usize) -> bool;
}

/// Oracle for hosts with no arena: every pointer is already shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArena;

impl ArenaOracle for NoArena {
    fn page_count(&self) -> usize {
        0
    }

    fn snapshot_pages(&self) -> Vec<PageCell> {
        Vec::new()
    }

    fn is_large_object_page(&self, _page_key: usize) -> bool {
        false
    }

    fn is_static(&self, _ptr: usize) -> bool {
        false
    }
}
