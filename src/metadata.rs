//! Device identity and metadata.
//!
//! Three kinds of identity show up in this crate:
//! - [`DeviceHandle`]: the platform's handle for a device. Cheap and unique while the
//!   device is plugged in, but a replugged device comes back under a new handle.
//! - [`DeviceGuid`]: a fingerprint built from vendor id, product id and device class.
//!   It survives replug, so it is what the registry uses to recognise a returning device.
//!   Two identical controllers share a GUID; it is not a serial number.
//! - Dense enumeration indices (`0, 1, 2, ...`) handed to consumers by the
//!   [`Manager`](crate::manager::Manager). Those are positions, not identities.
//!
//! ## GUID layout
//! The 16 bytes follow the layout SDL uses for joystick GUIDs so the strings can be
//! matched against existing controller-mapping databases:
//!
//! | bytes  | content                                      |
//! |--------|----------------------------------------------|
//! | 0..2   | bus type, little endian (`0x0003` = USB)     |
//! | 2..4   | CRC, unused (zero)                           |
//! | 4..6   | vendor id, little endian                     |
//! | 6..8   | zero                                         |
//! | 8..10  | product id, little endian                    |
//! | 10..12 | zero                                         |
//! | 12..14 | version, unused (zero)                       |
//! | 14     | driver signature (`b'x'` for XInput class)   |
//! | 15     | zero                                         |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform handle of a raw input device (`HANDLE` on Windows).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceHandle(pub isize);

/// Platform handle of one raw input event (`HRAWINPUT`, the `WM_INPUT` lparam).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RawEvent(pub isize);

const BUS_USB: u16 = 0x0003;
const XINPUT_SIGNATURE: u8 = b'x';

/// Reconnect-survivable device fingerprint.
///
/// `DeviceGuid::default()` (all zero) is returned for indices that do not name a device.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceGuid(pub [u8; 16]);

impl DeviceGuid {
    /// Build the GUID for a device. `vendor_specific` marks the XInput class.
    pub fn from_ids(vendor_id: u16, product_id: u16, vendor_specific: bool) -> Self {
        let mut b = [0u8; 16];
        b[0..2].copy_from_slice(&BUS_USB.to_le_bytes());
        b[4..6].copy_from_slice(&vendor_id.to_le_bytes());
        b[8..10].copy_from_slice(&product_id.to_le_bytes());
        if vendor_specific {
            b[14] = XINPUT_SIGNATURE;
        }
        Self(b)
    }

    /// Identity of an XInput slot whose vendor/product ids are not known.
    pub fn xinput_slot(slot: u32) -> Self {
        let mut guid = Self::from_ids(0x045e, 0x0000, true);
        guid.0[15] = slot as u8;
        guid
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 16]
    }

    pub fn vendor_id(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    pub fn product_id(&self) -> u16 {
        u16::from_le_bytes([self.0[8], self.0[9]])
    }

    pub fn is_vendor_specific(&self) -> bool {
        self.0[14] == XINPUT_SIGNATURE
    }

    /// Parse the 32-digit hex form produced by `Display`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.len() != 32 || !text.is_ascii() {
            return None;
        }
        let mut b = [0u8; 16];
        for (i, byte) in b.iter_mut().enumerate() {
            let pair = text.get(i * 2..i * 2 + 2)?;
            *byte = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self(b))
    }
}

impl fmt::Display for DeviceGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceGuid({self})")
    }
}

impl Serialize for DeviceGuid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceGuid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid device guid `{text}`")))
    }
}

/// HID identification reported by the platform for one device.
///
/// `usage_page`/`usage` are the device's top-level collection (e.g. `0x01`/`0x04`
/// for a Generic Desktop joystick).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u32,
    pub usage_page: u16,
    pub usage: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_layout_matches_sdl() {
        let guid = DeviceGuid::from_ids(0x044f, 0xb10a, false);
        assert_eq!(guid.to_string(), "030000004f0400000ab1000000000000");
        assert_eq!(guid.vendor_id(), 0x044f);
        assert_eq!(guid.product_id(), 0xb10a);
        assert!(!guid.is_vendor_specific());
    }

    #[test]
    fn vendor_class_changes_guid() {
        let plain = DeviceGuid::from_ids(0x045e, 0x028e, false);
        let xinput = DeviceGuid::from_ids(0x045e, 0x028e, true);
        assert_ne!(plain, xinput);
        assert!(xinput.is_vendor_specific());
        assert_eq!(xinput.to_string(), "030000005e0400008e02000000007800");
    }

    #[test]
    fn guid_parses_its_display_form() {
        let guid = DeviceGuid::from_ids(0x231d, 0x011f, false);
        assert_eq!(DeviceGuid::parse(&guid.to_string()), Some(guid));
        assert_eq!(DeviceGuid::parse("nope"), None);
        assert_eq!(DeviceGuid::parse("zz000000000000000000000000000000"), None);
    }

    #[test]
    fn default_guid_is_zero() {
        assert!(DeviceGuid::default().is_zero());
        assert_eq!(DeviceGuid::default().to_string(), "0".repeat(32));
    }
}
