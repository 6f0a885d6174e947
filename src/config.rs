//! Manager configuration.
//!
//! [`ManagerConfig`] is plain serde data so hosts can keep it in a TOML file
//! next to their other settings. Every key is optional; missing keys take the
//! defaults below.
//!
//! ```toml
//! max_axes = 64
//! max_buttons = 64
//! vendor_slots = 4
//! vendor_marker = "IG_"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default axis count at which a device is treated as a touch surface.
pub const DEFAULT_MAX_AXES: usize = 64;
/// Default button count at which a device is treated as a touch surface.
pub const DEFAULT_MAX_BUTTONS: usize = 64;
/// XInput exposes four user slots.
pub const DEFAULT_VENDOR_SLOTS: u32 = 4;
/// Interface-path marker of XInput HID compatibility endpoints.
pub const DEFAULT_VENDOR_MARKER: &str = "IG_";

/// Tunables for discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Devices with this many axes or more are rejected.
    pub max_axes: usize,

    /// Devices with this many buttons or more are rejected.
    pub max_buttons: usize,

    /// Number of slots the vendor adapter exposes.
    pub vendor_slots: u32,

    /// Substring of the device interface path that marks a vendor-specific
    /// (XInput-class) controller. Matching is case-insensitive.
    pub vendor_marker: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_axes: DEFAULT_MAX_AXES,
            max_buttons: DEFAULT_MAX_BUTTONS,
            vendor_slots: DEFAULT_VENDOR_SLOTS,
            vendor_marker: DEFAULT_VENDOR_MARKER.to_string(),
        }
    }
}

impl ManagerConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the document is not valid TOML or a
    /// key has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Whether a device interface path marks the vendor-specific class.
    pub fn is_vendor_path(&self, path: &str) -> bool {
        !self.vendor_marker.is_empty()
            && path
                .to_ascii_uppercase()
                .contains(&self.vendor_marker.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ManagerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ManagerConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let cfg = ManagerConfig::from_toml_str("max_buttons = 128\n").unwrap();
        assert_eq!(cfg.max_buttons, 128);
        assert_eq!(cfg.max_axes, DEFAULT_MAX_AXES);
        assert_eq!(cfg.vendor_marker, "IG_");
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = ManagerConfig::from_toml_str("max_axes = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ManagerConfig::load("/definitely/not/here/rawstick.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn vendor_marker_matches_case_insensitively() {
        let cfg = ManagerConfig::default();
        assert!(cfg.is_vendor_path(r"\\?\HID#VID_045E&PID_028E&IG_00#7&1a2b"));
        assert!(cfg.is_vendor_path(r"\\?\hid#vid_045e&pid_028e&ig_00#7&1a2b"));
        assert!(!cfg.is_vendor_path(r"\\?\HID#VID_044F&PID_B10A#7&3c4d"));
    }
}
