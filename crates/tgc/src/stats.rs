//! Runtime Statistics
//!
//! Monotonic counters accumulated across passes. All counters are relaxed
//! atomics so recording never contends with the passes themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for one runtime instance.
#[derive(Debug)]
pub struct RuntimeStats {
    intern_passes: AtomicU64,
    objects_copied: AtomicU64,
    objects_reused: AtomicU64,
    tiny_string_copies: AtomicU64,
    bytes_promoted: AtomicU64,
    large_pages_seen: AtomicU64,
    free_passes: AtomicU64,
    objects_freed: AtomicU64,
    bytes_reclaimed: AtomicU64,
    start_time: Instant,
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self {
            intern_passes: AtomicU64::new(0),
            objects_copied: AtomicU64::new(0),
            objects_reused: AtomicU64::new(0),
            tiny_string_copies: AtomicU64::new(0),
            bytes_promoted: AtomicU64::new(0),
            large_pages_seen: AtomicU64::new(0),
            free_passes: AtomicU64::new(0),
            objects_freed: AtomicU64::new(0),
            bytes_reclaimed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Fold one finished interning pass into the counters.
    pub fn record_intern_pass(
        &self,
        copied: u64,
        reused: u64,
        tiny_copies: u64,
        bytes_promoted: u64,
        large_pages: u64,
    ) {
        self.intern_passes.fetch_add(1, Ordering::Relaxed);
        self.objects_copied.fetch_add(copied, Ordering::Relaxed);
        self.objects_reused.fetch_add(reused, Ordering::Relaxed);
        self.tiny_string_copies
            .fetch_add(tiny_copies, Ordering::Relaxed);
        self.bytes_promoted
            .fetch_add(bytes_promoted, Ordering::Relaxed);
        self.large_pages_seen
            .fetch_add(large_pages, Ordering::Relaxed);
    }

    /// Fold one finished freeing pass into the counters.
    pub fn record_free_pass(&self, freed: u64, bytes_reclaimed: u64) {
        self.free_passes.fetch_add(1, Ordering::Relaxed);
        self.objects_freed.fetch_add(freed, Ordering::Relaxed);
        self.bytes_reclaimed
            .fetch_add(bytes_reclaimed, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            intern_passes: self.intern_passes.load(Ordering::Relaxed),
            objects_copied: self.objects_copied.load(Ordering::Relaxed),
            objects_reused: self.objects_reused.load(Ordering::Relaxed),
            tiny_string_copies: self.tiny_string_copies.load(Ordering::Relaxed),
            bytes_promoted: self.bytes_promoted.load(Ordering::Relaxed),
            large_pages_seen: self.large_pages_seen.load(Ordering::Relaxed),
            free_passes: self.free_passes.load(Ordering::Relaxed),
            objects_freed: self.objects_freed.load(Ordering::Relaxed),
            bytes_reclaimed: self.bytes_reclaimed.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }

    /// Zero every counter; the start time is unchanged.
    pub fn reset(&self) {
        self.intern_passes.store(0, Ordering::Relaxed);
        self.objects_copied.store(0, Ordering::Relaxed);
        self.objects_reused.store(0, Ordering::Relaxed);
        self.tiny_string_copies.store(0, Ordering::Relaxed);
        self.bytes_promoted.store(0, Ordering::Relaxed);
        self.large_pages_seen.store(0, Ordering::Relaxed);
        self.free_passes.store(0, Ordering::Relaxed);
        self.objects_freed.store(0, Ordering::Relaxed);
        self.bytes_reclaimed.store(0, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain-value snapshot of [`RuntimeStats`].
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub intern_passes: u64,
    pub objects_copied: u64,
    pub objects_reused: u64,
    pub tiny_string_copies: u64,
    pub bytes_promoted: u64,
    pub large_pages_seen: u64,
    pub free_passes: u64,
    pub objects_freed: u64,
    pub bytes_reclaimed: u64,
    pub uptime: Duration,
}
