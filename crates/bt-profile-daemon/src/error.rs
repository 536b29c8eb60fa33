//! Daemon error type.

use bt_classic::avdtp::{ErrorCode, ServiceCategory};

/// The daemon's single error type. Fallible entry points return
/// `Result<T, DaemonError>`; internal invariants are `debug_assert!`s,
/// not panics on the hot path.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DaemonError {
    /// IPC message shorter than its declared length.
    #[error("invalid command: {0}")]
    InvalidCommand(&'static str),

    /// HID connect for an address already in the table, or a stream
    /// request that found no eligible SEP.
    #[error("already present")]
    AlreadyPresent,

    /// L2CAP connect failure, or a channel hangup/error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-zero error in an AVDTP confirmation or a rejected indication.
    #[error("AVDTP signalling error {code:?} (category {category:?})")]
    AvdtpSignalling {
        code: ErrorCode,
        category: ServiceCategory,
    },

    /// Codec Selector found an empty intersection between local and
    /// remote capabilities.
    #[error("no common codec capability")]
    NoCommonCapability,

    /// A remote `set_configuration` was rejected for an out-of-range
    /// bitpool.
    #[error("unsupported configuration")]
    UnsupportedConfiguration,

    /// A coordinator or driver operation was attempted against a SEP in
    /// a state that doesn't support it.
    #[error("invalid SEP state: {0}")]
    InvalidState(&'static str),

    /// The daemon configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
