//! Error types.
//!
//! None of these are fatal to the [`Manager`](crate::manager::Manager): every
//! failure degrades to "this one device or control is unavailable". The polling
//! API never returns them; they surface from event intake and configuration
//! loading, and otherwise only as `tracing` diagnostics.

use crate::metadata::DeviceHandle;
use thiserror::Error;

/// Failure reported by a platform primitive (enumeration, capability query,
/// report extraction).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// A platform call returned a failure status.
    #[error("{call} failed with status {code:#010x}")]
    Status { call: &'static str, code: i32 },

    /// The queried handle, usage or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform returned data that could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Why a device was kept out of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Capability query failed for a device that is not vendor-specific.
    CapabilitiesUnavailable,
    /// Axis count met or exceeded the touch-surface threshold.
    TooManyAxes { count: usize, limit: usize },
    /// Button count met or exceeded the touch-surface threshold.
    TooManyButtons { count: usize, limit: usize },
    /// Every vendor-adapter slot is taken.
    NoVendorSlot,
}

impl RejectReason {
    /// Whether the verdict follows from the device's layout alone, so asking the
    /// same device again cannot change it.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::TooManyAxes { .. } | Self::TooManyButtons { .. })
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapabilitiesUnavailable => f.write_str("capabilities unavailable"),
            Self::TooManyAxes { count, limit } => {
                write!(f, "{count} axes (limit {limit}), likely a touch surface")
            }
            Self::TooManyButtons { count, limit } => {
                write!(f, "{count} buttons (limit {limit}), likely a touch surface")
            }
            Self::NoVendorSlot => f.write_str("no free vendor adapter slot"),
        }
    }
}

/// Control shapes the decoder does not handle.
///
/// These never fail a device: the control is skipped with a diagnostic and the
/// rest of the device stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlShape {
    /// A value capability covering a usage range.
    RangedAxis { usage_min: u16, usage_max: u16 },
    /// A hat switch whose logical maximum is not 3, 7 or 8.
    HatLogicalMax(i32),
}

impl std::fmt::Display for ControlShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RangedAxis {
                usage_min,
                usage_max,
            } => write!(f, "ranged value collection {usage_min:#06x}..={usage_max:#06x}"),
            Self::HatLogicalMax(max) => write!(f, "hat switch with logical max {max}"),
        }
    }
}

/// Errors raised while discovering devices or decoding raw input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JoystickError {
    #[error("capability query failed: {0}")]
    CapabilityQueryFailed(#[from] PlatformError),

    #[error("unknown device {0:?}")]
    UnknownDevice(DeviceHandle),

    #[error("device {handle:?} rejected: {reason}")]
    DeviceRejected {
        handle: DeviceHandle,
        reason: RejectReason,
    },
}

/// Errors raised while loading a [`ManagerConfig`](crate::config::ManagerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_status_formats_as_hex() {
        let err = PlatformError::Status {
            call: "HidP_GetCaps",
            code: 0x0011_0001,
        };
        assert_eq!(err.to_string(), "HidP_GetCaps failed with status 0x00110001");
    }

    #[test]
    fn rejected_device_names_reason() {
        let err = JoystickError::DeviceRejected {
            handle: DeviceHandle(7),
            reason: RejectReason::TooManyButtons {
                count: 80,
                limit: 64,
            },
        };
        let text = err.to_string();
        assert!(text.contains("80 buttons"), "{text}");
        assert!(text.contains("touch surface"), "{text}");
    }

    #[test]
    fn only_threshold_rejections_are_structural() {
        assert!(RejectReason::TooManyAxes { count: 9, limit: 8 }.is_structural());
        assert!(!RejectReason::CapabilitiesUnavailable.is_structural());
        assert!(!RejectReason::NoVendorSlot.is_structural());
    }
}
