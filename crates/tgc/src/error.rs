//! Error Types
//!
//! Fallible operations return [`TgcError`]. Layout and allocation
//! violations inside a pass are not errors in this sense: once a traversal
//! holds raw pointers into half-freed or half-copied graphs there is no
//! state to unwind to, so those paths report and abort instead.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::{log_event, PassEvent};

/// Errors surfaced by runtime construction and arena registration.
#[derive(Debug, Error)]
pub enum TgcError {
    /// A configuration value failed validation.
    ///
    /// **When returned:** During runtime construction, before any pass
    /// state is created.
    ///
    /// **Recovery strategy:** Fix the offending value and construct again.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A registered arena region intersects one already registered.
    ///
    /// **When returned:** From region registration, before the region table
    /// is modified.
    ///
    /// **Recovery strategy:** Unregister the old region first, or correct
    /// the bounds being registered.
    #[error("arena region {base:#x}..{limit:#x} overlaps an existing region")]
    RegionOverlap { base: usize, limit: usize },

    /// No registered region starts at the given base.
    ///
    /// **When returned:** From region unregistration.
    ///
    /// **Recovery strategy:** None required; the region table is unchanged.
    /// Usually indicates the caller unregistered twice.
    #[error("no arena region registered at base {base:#x}")]
    RegionNotFound { base: usize },

    /// The process-wide runtime was installed twice.
    ///
    /// **When returned:** From host installation.
    ///
    /// **Recovery strategy:** None; installation is once per process. The
    /// first installation remains in effect.
    #[error("runtime already installed for this process")]
    AlreadyInstalled,

    /// An operation needed the process-wide runtime before installation.
    ///
    /// **When returned:** From host entry points called before
    /// installation.
    ///
    /// **Recovery strategy:** Install the runtime first.
    #[error("runtime not installed")]
    NotInstalled,
}

impl TgcError {
    /// Whether the caller can correct the input and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TgcError::InvalidConfig(_)
                | TgcError::RegionOverlap { .. }
                | TgcError::RegionNotFound { .. }
        )
    }

    /// Whether the error indicates a host integration bug rather than bad
    /// input.
    pub fn is_bug(&self) -> bool {
        matches!(self, TgcError::AlreadyInstalled | TgcError::NotInstalled)
    }
}

/// Convenience alias for fallible runtime operations.
pub type Result<T> = std::result::Result<T, TgcError>;

/// Abort on an object whose descriptor carries an unrecognized kind tag.
///
/// Reaching this means the heap contract is already broken; continuing
/// would traverse garbage as pointers.
#[cold]
#[inline(never)]
pub fn fatal_layout(kind: u32) -> ! {
    log_event(PassEvent::LayoutViolation { kind });
    log::error!("unrecognized object kind tag {}; aborting", kind);
    std::process::abort()
}

/// Abort on shared-heap exhaustion mid-pass.
///
/// Interning has already published table entries pointing at partially
/// built copies; there is no consistent state to return to.
#[cold]
#[inline(never)]
pub fn fatal_alloc(size: usize) -> ! {
    log_event(PassEvent::AllocationFailure { size });
    log::error!("shared heap exhausted allocating {} bytes; aborting", size);
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TgcError::RegionOverlap {
            base: 0x1000,
            limit: 0x2000,
        };
        assert_eq!(
            err.to_string(),
            "arena region 0x1000..0x2000 overlaps an existing region"
        );

        let err = TgcError::RegionNotFound { base: 0x4000 };
        assert_eq!(err.to_string(), "no arena region registered at base 0x4000");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(TgcError::RegionOverlap { base: 0, limit: 8 }.is_recoverable());
        assert!(TgcError::RegionNotFound { base: 0 }.is_recoverable());
        assert!(!TgcError::AlreadyInstalled.is_recoverable());
        assert!(!TgcError::NotInstalled.is_recoverable());
    }

    #[test]
    fn test_bug_classification() {
        assert!(TgcError::AlreadyInstalled.is_bug());
        assert!(TgcError::NotInstalled.is_bug());
        assert!(!TgcError::RegionOverlap { base: 0, limit: 8 }.is_bug());
    }

    #[test]
    fn test_config_error_converts() {
        let err: TgcError = ConfigError::Worklist("must be greater than zero".into()).into();
        assert!(matches!(err, TgcError::InvalidConfig(_)));
        assert!(err.is_recoverable());
        assert!(err.to_string().starts_with("invalid configuration:"));
    }
}
