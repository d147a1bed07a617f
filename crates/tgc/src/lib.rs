//! # TGC - Tarn Object Lifetime Runtime
//!
//! Reference-counted object lifetime management for the Tarn runtime:
//! cascading release of object graphs, and interning of arena-allocated
//! graphs into immutable shared storage with identity preserved.
//!
//! Objects are raw memory laid out by the Tarn compiler; this crate
//! manipulates them through typed header views rather than Rust types.
//! The two operations a host calls are:
//!
//! - **free**: drop one reference from a root and release everything that
//!   transitively reaches a count of zero.
//! - **intern**: copy the graph reachable from a root out of a transient
//!   arena into shared storage, collapsing each source object to exactly
//!   one copy so shared structure and cycles survive.
//!
//! ## Architecture
//!
//! ```text
//!   host program
//!       |  free_root / intern_shared
//!       v
//!  +-----------------------------------------------+
//!  | ObjectRuntime     config / stats / pass events|
//!  +-----------------------+-----------------------+
//!  | free pass             | intern pass           |
//!  |   decrement, cascade, |   classify, copy or   |
//!  |   release spans       |   reuse, fill slots   |
//!  +-----------------------+-----------------------+
//!  | object model: headers, descriptors, ref masks |
//!  +-----------------------------------------------+
//!  | host seams: SharedHeap       /  ArenaOracle   |
//!  |             (promoted bytes)    (page table)  |
//!  +-----------------------------------------------+
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use tgc::{NoArena, ObjectRuntime, RuntimeConfig, SystemHeap};
//!
//! let runtime = ObjectRuntime::new(
//!     RuntimeConfig::default(),
//!     Arc::new(SystemHeap),
//!     Arc::new(NoArena),
//! )
//! .expect("default configuration is valid");
//!
//! // Null roots are no-ops for both operations.
//! unsafe {
//!     runtime.free_root(0);
//!     assert_eq!(runtime.intern_shared(0), 0);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`object`]: header layouts, shape descriptors, reference-slot
//!   scanning
//! - [`refcount`]: count word access policies
//! - [`free`] / [`intern`]: the two lifetime passes
//! - [`runtime`]: the facade hosts hold on to
//! - [`arena`] / [`heap`]: seams the host implements
//! - [`config`] / [`error`] / [`logging`] / [`stats`]: support
//!
//! ## Safety
//!
//! The lifetime operations are `unsafe`: they trust the host to pass
//! roots that really carry the documented layout and to keep other
//! threads away from the graphs being walked. Counts themselves may be
//! atomic ([`AtomicCount`]) when the host adjusts them concurrently, but
//! a pass still requires exclusive ownership of the graph it traverses.

// Object model and layout
pub mod object;

// Count primitives and traversal
pub mod refcount;
pub mod worklist;

// Host seams
pub mod arena;
pub mod heap;

// Lifetime passes
pub mod free;
pub mod intern;
pub mod runtime;

// Support
pub mod config;
pub mod error;
pub mod logging;
pub mod stats;

pub use arena::{ArenaOracle, NoArena, PageCell};
pub use config::{ConfigError, RuntimeConfig};
pub use error::{Result, TgcError};
pub use free::FreeOutcome;
pub use heap::{SharedHeap, SystemHeap};
pub use intern::InternOutcome;
pub use logging::{LogLevel, PassEvent, PassLogger, PassLoggerConfig};
pub use object::{ObjectKind, ObjectView, TypeDescriptor};
pub use refcount::{AtomicCount, CountPolicy, NonAtomicCount};
pub use runtime::ObjectRuntime;
pub use stats::{RuntimeStats, StatsSummary};
pub use worklist::WorkStack;

/// Crate version, from the build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
