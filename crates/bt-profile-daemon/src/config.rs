//! Daemon configuration.

use std::time::Duration;

use crate::error::DaemonError;

/// Daemon-wide configuration, validated with the same `Default` +
/// `validate()` shape used for the wire-layer capability ranges,
/// extended here to cover SEP counts and the idle-suspend timeout.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Bluetooth device name, used in SDP service names and logging spans.
    pub device_name: String,
    /// Number of local SOURCE SEPs to register at init.
    pub source_seps: u8,
    /// Number of local SINK SEPs to register at init.
    pub sink_seps: u8,
    /// Idle-suspend timeout, armed on `start_ind` (spec default 5000 ms).
    pub idle_suspend_timeout: Duration,
    /// Service name advertised in the A2DP Source SDP record.
    pub source_service_name: &'static str,
    /// Service name advertised in the A2DP Sink SDP record.
    pub sink_service_name: &'static str,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            device_name: "Bluetooth Audio/HID Daemon".to_string(),
            source_seps: 1,
            sink_seps: 0,
            idle_suspend_timeout: Duration::from_millis(5000),
            source_service_name: "Audio Source",
            sink_service_name: "Audio Sink",
        }
    }
}

impl DaemonConfig {
    /// Validate configuration. An endpoint count of zero for both roles,
    /// an empty device name, or a degenerate timeout are all rejected —
    /// the daemon would otherwise come up with nothing to do.
    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.device_name.is_empty() {
            return Err(DaemonError::InvalidConfig("device name cannot be empty"));
        }

        if self.source_seps == 0 && self.sink_seps == 0 {
            return Err(DaemonError::InvalidConfig(
                "at least one source or sink SEP must be configured",
            ));
        }

        if (self.source_seps as u16 + self.sink_seps as u16) > 62 {
            return Err(DaemonError::InvalidConfig(
                "SEP identifiers are limited to the range 1..=62",
            ));
        }

        if self.idle_suspend_timeout < Duration::from_millis(100)
            || self.idle_suspend_timeout > Duration::from_secs(60)
        {
            return Err(DaemonError::InvalidConfig(
                "idle-suspend timeout must be between 100ms and 60s",
            ));
        }

        Ok(())
    }
}
