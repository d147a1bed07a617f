//! Process-wide runtime host and its C entry points.
//!
//! Compiled programs call these functions directly, so every entry point
//! is null-safe and total: bad input is rejected with a logged warning
//! rather than propagated. The runtime is installed once per process;
//! calls before installation are no-ops that preserve their argument.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use tgc::{ArenaOracle, ObjectRuntime, PageCell, Result, RuntimeConfig, SystemHeap, TgcError};

/// One registered arena region.
#[derive(Debug, Clone, Copy)]
struct Region {
    base: usize,
    limit: usize,
    large: bool,
}

/// Arena oracle over regions the host registers at run time.
///
/// The region table stays sorted by base and pairwise disjoint, which is
/// what the pass-side classification relies on. Immortal ranges are kept
/// separately and only answer [`ArenaOracle::is_static`].
pub struct HostArena {
    regions: RwLock<Vec<Region>>,
    statics: RwLock<Vec<(usize, usize)>>,
}

impl HostArena {
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(Vec::new()),
            statics: RwLock::new(Vec::new()),
        }
    }

    /// Add the region `base..base + len`, keeping the table sorted.
    pub fn register_region(&self, base: usize, len: usize, large: bool) -> Result<()> {
        let limit = base + len;
        let mut regions = self.regions.write();

        let index = regions.partition_point(|region| region.limit <= base);
        if index < regions.len() && regions[index].base < limit {
            return Err(TgcError::RegionOverlap { base, limit });
        }
        regions.insert(index, Region { base, limit, large });
        Ok(())
    }

    /// Remove the region starting at `base`.
    pub fn unregister_region(&self, base: usize) -> Result<()> {
        let mut regions = self.regions.write();
        match regions.iter().position(|region| region.base == base) {
            Some(index) => {
                regions.remove(index);
                Ok(())
            }
            None => Err(TgcError::RegionNotFound { base }),
        }
    }

    /// Declare `base..base + len` immortal.
    pub fn register_static_range(&self, base: usize, len: usize) {
        self.statics.write().push((base, base + len));
    }

    pub fn region_count(&self) -> usize {
        self.regions.read().len()
    }
}

impl Default for HostArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaOracle for HostArena {
    fn page_count(&self) -> usize {
        self.regions.read().len()
    }

    fn snapshot_pages(&self) -> Vec<PageCell> {
        self.regions
            .read()
            .iter()
            .map(|region| PageCell::new(region.base, region.limit))
            .collect()
    }

    fn is_large_object_page(&self, page_key: usize) -> bool {
        self.regions
            .read()
            .iter()
            .any(|region| region.base == page_key && region.large)
    }

    fn is_static(&self, ptr: usize) -> bool {
        self.statics
            .read()
            .iter()
            .any(|&(base, limit)| base <= ptr && ptr < limit)
    }
}

struct Host {
    arena: Arc<HostArena>,
    runtime: ObjectRuntime,
}

static HOST: OnceLock<Host> = OnceLock::new();
static INITIALIZED: AtomicBool = AtomicBool::new(false);

fn install() -> Result<()> {
    let arena = Arc::new(HostArena::new());
    let runtime = ObjectRuntime::new(
        RuntimeConfig::from_env(),
        Arc::new(SystemHeap),
        arena.clone(),
    )?;

    HOST.set(Host { arena, runtime })
        .map_err(|_| TgcError::AlreadyInstalled)?;
    INITIALIZED.store(true, Ordering::SeqCst);
    Ok(())
}

/// Install the process-wide runtime, configured from `TGC_*` environment
/// variables. Returns false on a second call or a bad configuration.
#[no_mangle]
pub extern "C" fn tarn_rt_init() -> bool {
    match install() {
        Ok(()) => true,
        Err(err) => {
            eprintln!("tarn-runtime: initialization failed: {}", err);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn tarn_rt_is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

/// Register `base..base + len` as an arena region; `large` marks it a
/// large-object region.
#[no_mangle]
pub extern "C" fn tarn_rt_register_arena(base: *mut u8, len: usize, large: bool) -> bool {
    let host = match HOST.get() {
        Some(host) => host,
        None => {
            log::warn!("arena region registered before initialization");
            return false;
        }
    };
    if base.is_null() || len == 0 {
        log::warn!("rejected arena region: null base or zero length");
        return false;
    }

    match host.arena.register_region(base as usize, len, large) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("rejected arena region at {:p}: {}", base, err);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn tarn_rt_unregister_arena(base: *mut u8) -> bool {
    let host = match HOST.get() {
        Some(host) => host,
        None => return false,
    };

    match host.arena.unregister_region(base as usize) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("arena region not unregistered: {}", err);
            false
        }
    }
}

/// Declare `base..base + len` immortal: objects inside are reused
/// without count adjustment and never freed.
#[no_mangle]
pub extern "C" fn tarn_rt_register_statics(base: *const u8, len: usize) {
    if base.is_null() || len == 0 {
        return;
    }
    if let Some(host) = HOST.get() {
        host.arena.register_static_range(base as usize, len);
    }
}

#[no_mangle]
pub extern "C" fn tarn_rt_arena_region_count() -> usize {
    match HOST.get() {
        Some(host) => host.arena.region_count(),
        None => 0,
    }
}

/// Drop one reference from `root`, cascading through everything that
/// reaches zero. Null is a no-op.
#[no_mangle]
pub extern "C" fn tarn_rt_free_root(root: *mut u8) {
    if root.is_null() {
        return;
    }
    if let Some(host) = HOST.get() {
        // The compiler only passes pointers it laid out itself.
        unsafe { host.runtime.free_root(root as usize) }
    }
}

/// Intern the graph reachable from `root` into shared storage; returns
/// the shared counterpart. Null interns to null; before installation the
/// root comes back unchanged.
#[no_mangle]
pub extern "C" fn tarn_rt_intern_shared(root: *mut u8) -> *mut u8 {
    if root.is_null() {
        return std::ptr::null_mut();
    }
    match HOST.get() {
        Some(host) => unsafe { host.runtime.intern_shared(root as usize) as *mut u8 },
        None => {
            log::warn!("intern requested before initialization");
            root
        }
    }
}

#[no_mangle]
pub extern "C" fn tarn_rt_objects_freed() -> u64 {
    match HOST.get() {
        Some(host) => host.runtime.stats().summary().objects_freed,
        None => 0,
    }
}

#[no_mangle]
pub extern "C" fn tarn_rt_objects_copied() -> u64 {
    match HOST.get() {
        Some(host) => host.runtime.stats().summary().objects_copied,
        None => 0,
    }
}

#[no_mangle]
pub extern "C" fn tarn_rt_bytes_promoted() -> u64 {
    match HOST.get() {
        Some(host) => host.runtime.stats().summary().bytes_promoted,
        None => 0,
    }
}
