//! Pass Event Logging
//!
//! Structured events emitted by the lifetime passes. Events are always
//! recorded in memory with a timestamp; console echo (human-readable or
//! JSON) is opt-in. A process-wide logger backs the free functions; tests
//! construct their own [`PassLogger`] instances.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use lazy_static::lazy_static;
use serde::Serialize;

/// Severity levels, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

/// One event in the life of a pass.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum PassEvent {
    /// An interning pass began at the given root.
    InternStart { root: usize },
    /// An interning pass finished.
    InternEnd {
        copied: u64,
        reused: u64,
        tiny_copies: u64,
        bytes_promoted: u64,
        duration_us: u64,
    },
    /// A freeing pass began at the given root.
    FreeStart { root: usize },
    /// A freeing pass finished.
    FreeEnd {
        freed: u64,
        bytes_reclaimed: u64,
        duration_us: u64,
    },
    /// Interning visited an object on a large-object page.
    LargePage { page_key: usize },
    /// The shared heap returned null mid-pass; the process aborts after
    /// this event.
    AllocationFailure { size: usize },
    /// An object descriptor carried an unrecognized kind tag; the process
    /// aborts after this event.
    LayoutViolation { kind: u32 },
}

/// Console and filtering options for a [`PassLogger`].
#[derive(Debug, Clone)]
pub struct PassLoggerConfig {
    /// Most verbose level that is recorded and echoed.
    pub level: LogLevel,
    /// Echo events to stdout.
    pub console: bool,
    /// Echo as single-line JSON instead of human-readable text.
    pub json: bool,
    /// Prefix console lines with a wall-clock timestamp.
    pub timestamps: bool,
}

impl Default for PassLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: false,
            json: false,
            timestamps: true,
        }
    }
}

/// In-memory event recorder with optional console echo.
pub struct PassLogger {
    config: PassLoggerConfig,
    events: Mutex<Vec<(Instant, PassEvent)>>,
    enabled: AtomicBool,
}

impl PassLogger {
    pub fn new(config: PassLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record one event, echoing it if the configuration says so.
    pub fn log(&self, event: PassEvent) {
        if !self.is_enabled() {
            return;
        }
        if Self::event_level(&event) > self.config.level {
            return;
        }

        if let Ok(mut events) = self.events.lock() {
            events.push((Instant::now(), event.clone()));
        }

        if self.config.console {
            self.output_console(&event);
        }
    }

    /// Severity of an event.
    fn event_level(event: &PassEvent) -> LogLevel {
        match event {
            PassEvent::InternStart { .. } | PassEvent::FreeStart { .. } => LogLevel::Debug,
            PassEvent::InternEnd { .. } | PassEvent::FreeEnd { .. } => LogLevel::Info,
            PassEvent::LargePage { .. } => LogLevel::Trace,
            PassEvent::AllocationFailure { .. } | PassEvent::LayoutViolation { .. } => {
                LogLevel::Error
            }
        }
    }

    fn output_console(&self, event: &PassEvent) {
        if self.config.timestamps {
            print!("{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"));
        }
        if self.config.json {
            self.output_json(event);
        } else {
            self.output_human(event);
        }
    }

    fn output_human(&self, event: &PassEvent) {
        match event {
            PassEvent::InternStart { root } => {
                println!("[TGC] intern start: root={:#x}", root);
            }
            PassEvent::InternEnd {
                copied,
                reused,
                tiny_copies,
                bytes_promoted,
                duration_us,
            } => {
                println!(
                    "[TGC] intern end: copied={} reused={} tiny={} bytes={} in {}us",
                    copied, reused, tiny_copies, bytes_promoted, duration_us
                );
            }
            PassEvent::FreeStart { root } => {
                println!("[TGC] free start: root={:#x}", root);
            }
            PassEvent::FreeEnd {
                freed,
                bytes_reclaimed,
                duration_us,
            } => {
                println!(
                    "[TGC] free end: freed={} bytes={} in {}us",
                    freed, bytes_reclaimed, duration_us
                );
            }
            PassEvent::LargePage { page_key } => {
                println!("[TGC] large page visited: key={:#x}", page_key);
            }
            PassEvent::AllocationFailure { size } => {
                println!("[TGC] allocation failure: {} bytes", size);
            }
            PassEvent::LayoutViolation { kind } => {
                println!("[TGC] layout violation: kind tag {}", kind);
            }
        }
    }

    fn output_json(&self, event: &PassEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{}", json);
        }
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<(Instant, PassEvent)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    pub fn event_count(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(_) => 0,
        }
    }
}

lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<PassLogger> =
        Mutex::new(PassLogger::new(PassLoggerConfig::default()));
}

/// Record an event on the process-wide logger.
pub fn log_event(event: PassEvent) {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.log(event);
    }
}

/// Replace the process-wide logger's configuration, dropping recorded
/// events.
pub fn configure_logger(config: PassLoggerConfig) {
    if let Ok(mut logger) = GLOBAL_LOGGER.lock() {
        *logger = PassLogger::new(config);
    }
}

/// Events recorded on the process-wide logger so far.
pub fn logged_event_count() -> usize {
    match GLOBAL_LOGGER.lock() {
        Ok(logger) => logger.event_count(),
        Err(_) => 0,
    }
}
