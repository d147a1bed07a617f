//! Runtime Facade
//!
//! [`ObjectRuntime`] ties a configuration, a shared heap, and an arena
//! oracle together and exposes the two lifetime operations. It owns the
//! statistics and emits pass events around each run; the engines in
//! [`crate::free`] and [`crate::intern`] stay free of both.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use crate::arena::ArenaOracle;
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::heap::SharedHeap;
use crate::logging::{configure_logger, log_event, LogLevel, PassEvent, PassLoggerConfig};
use crate::refcount::{CountPolicy, NonAtomicCount};
use crate::stats::RuntimeStats;
use crate::{free, intern};

/// Entry point for object lifetime management.
///
/// Generic over the count policy; defaults to plain single-threaded
/// counts. The runtime itself is `Send + Sync`, but the safety contracts
/// of the lifetime operations still require exclusive access to the
/// graphs they walk.
pub struct ObjectRuntime<P: CountPolicy = NonAtomicCount> {
    config: RuntimeConfig,
    heap: Arc<dyn SharedHeap>,
    oracle: Arc<dyn ArenaOracle>,
    stats: RuntimeStats,
    _policy: PhantomData<P>,
}

impl ObjectRuntime<NonAtomicCount> {
    /// Runtime with the default count policy.
    pub fn new(
        config: RuntimeConfig,
        heap: Arc<dyn SharedHeap>,
        oracle: Arc<dyn ArenaOracle>,
    ) -> Result<Self> {
        Self::with_policy(config, heap, oracle)
    }
}

impl<P: CountPolicy> ObjectRuntime<P> {
    /// Runtime with an explicit count policy.
    ///
    /// Validates the configuration up front; a verbose configuration also
    /// switches the process-wide logger to console output.
    pub fn with_policy(
        config: RuntimeConfig,
        heap: Arc<dyn SharedHeap>,
        oracle: Arc<dyn ArenaOracle>,
    ) -> Result<Self> {
        config.validate()?;

        if config.verbose {
            configure_logger(PassLoggerConfig {
                level: LogLevel::Debug,
                console: true,
                ..Default::default()
            });
        }

        Ok(Self {
            config,
            heap,
            oracle,
            stats: RuntimeStats::new(),
            _policy: PhantomData,
        })
    }

    /// Drop one reference from `root`, cascading through everything that
    /// reaches zero. Null is a no-op.
    ///
    /// # Safety
    ///
    /// Same contract as [`free::run`]: `root` must be null or a live
    /// object pointer, and no other thread may touch the reachable graph
    /// during the pass.
    pub unsafe fn free_root(&self, root: usize) {
        if root == 0 {
            return;
        }

        log_event(PassEvent::FreeStart { root });
        let started = Instant::now();

        let outcome = free::run::<P>(
            self.heap.as_ref(),
            self.oracle.as_ref(),
            self.config.worklist_capacity,
            root,
        );

        if self.config.track_stats {
            self.stats
                .record_free_pass(outcome.freed, outcome.bytes_reclaimed);
        }
        log_event(PassEvent::FreeEnd {
            freed: outcome.freed,
            bytes_reclaimed: outcome.bytes_reclaimed,
            duration_us: started.elapsed().as_micros() as u64,
        });
    }

    /// Intern the graph reachable from `root` into shared storage and
    /// return its shared counterpart. Null interns to null.
    ///
    /// # Safety
    ///
    /// Same contract as [`intern::run`]: `root` must be null or a live
    /// object pointer, and arena pages must stay mapped and unmutated for
    /// the duration of the pass.
    pub unsafe fn intern_shared(&self, root: usize) -> usize {
        if root == 0 {
            return 0;
        }

        log_event(PassEvent::InternStart { root });
        let started = Instant::now();

        let outcome = intern::run::<P>(
            self.heap.as_ref(),
            self.oracle.as_ref(),
            self.config.worklist_capacity,
            self.config.promotion_table_capacity,
            root,
        );

        if self.config.track_stats {
            self.stats.record_intern_pass(
                outcome.copied,
                outcome.reused,
                outcome.tiny_copies,
                outcome.bytes_promoted,
                outcome.large_pages,
            );
        }
        log_event(PassEvent::InternEnd {
            copied: outcome.copied,
            reused: outcome.reused,
            tiny_copies: outcome.tiny_copies,
            bytes_promoted: outcome.bytes_promoted,
            duration_us: started.elapsed().as_micros() as u64,
        });

        outcome.root
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn heap(&self) -> &Arc<dyn SharedHeap> {
        &self.heap
    }

    pub fn oracle(&self) -> &Arc<dyn ArenaOracle> {
        &self.oracle
    }
}
