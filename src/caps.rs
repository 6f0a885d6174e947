//! Typed HID capability records.
//!
//! The platform hands us an opaque "preparsed data" blob per device. This module
//! never looks inside it: [`parse`] passes it to the platform's capability-query
//! primitives and gets back [`ValueCap`] / [`ButtonCap`] records. Everything
//! downstream (classification, slot allocation, decoding) works on these records.

use crate::backends::HidPlatform;
use crate::error::JoystickError;
use serde::{Deserialize, Serialize};

/// Usage of a capability: one usage, or an inclusive usage range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapUsage {
    Single(u16),
    Range { min: u16, max: u16 },
}

impl CapUsage {
    #[inline]
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }

    /// First usage covered (the usage itself for `Single`).
    #[inline]
    pub fn first(&self) -> u16 {
        match *self {
            Self::Single(u) => u,
            Self::Range { min, .. } => min,
        }
    }

    /// Every usage covered, ascending. An inverted range covers nothing.
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        let (lo, hi) = match *self {
            Self::Single(u) => (u, u),
            Self::Range { min, max } => (min, max),
        };
        lo..=hi
    }
}

/// A value (axis or hat) capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCap {
    pub report_id: u8,
    pub usage_page: u16,
    pub usage: CapUsage,
    pub link_collection: u16,
    pub logical_min: i32,
    pub logical_max: i32,
    pub bit_size: u16,
    /// This record is an alias of another control.
    pub is_alias: bool,
}

/// A button capability (a single usage or a usage range).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonCap {
    pub report_id: u8,
    pub usage_page: u16,
    pub usage: CapUsage,
    pub link_collection: u16,
    pub is_alias: bool,
}

/// The capability lists of one device's input report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidCapabilities {
    pub values: Vec<ValueCap>,
    pub buttons: Vec<ButtonCap>,
}

/// Extract the value and button capability lists from a preparsed blob.
///
/// Empty lists are valid (a device may have no axes or no buttons).
///
/// # Errors
/// [`JoystickError::CapabilityQueryFailed`] if either platform query fails.
pub fn parse(
    platform: &dyn HidPlatform,
    preparsed: &[u8],
) -> Result<HidCapabilities, JoystickError> {
    let values = platform.value_caps(preparsed)?;
    let buttons = platform.button_caps(preparsed)?;
    Ok(HidCapabilities { values, buttons })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_iterates_inclusively() {
        let r = CapUsage::Range { min: 1, max: 4 };
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(r.is_range());
        assert_eq!(r.first(), 1);
    }

    #[test]
    fn inverted_range_is_empty() {
        let r = CapUsage::Range { min: 9, max: 3 };
        assert_eq!(r.iter().count(), 0);
    }

    #[test]
    fn range_reaching_u16_max_terminates() {
        let r = CapUsage::Range {
            min: u16::MAX - 1,
            max: u16::MAX,
        };
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![u16::MAX - 1, u16::MAX]);
    }

    #[test]
    fn single_iterates_once() {
        assert_eq!(CapUsage::Single(0x30).iter().collect::<Vec<_>>(), vec![0x30]);
    }
}
