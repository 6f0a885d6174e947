//! Platform seams.
//!
//! [`HidPlatform`] is the single boundary between this crate and the OS raw input /
//! HID parser APIs. Everything that depends on a platform byte layout (raw input
//! headers, preparsed capability data, report bit packing) lives behind it; the rest
//! of the crate only sees typed records.
//!
//! [`VendorAdapter`] is the state source for vendor-specific controllers (XInput
//! class) whose raw reports are not decoded here.
//!
//! # Implementations
//! - [`mock`]: in-memory platform and adapter for tests and replay tooling.
//! - `windows` (Windows + **`hid`** feature): Raw Input, HIDP and XInput.

use crate::caps::{ButtonCap, ValueCap};
use crate::error::PlatformError;
use crate::metadata::{DeviceGuid, DeviceHandle, HidDeviceInfo, RawEvent};
use crate::snapshot::{JoystickCapabilities, JoystickState};
use std::ops::Range;

pub mod mock;

#[cfg(all(feature = "hid", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
pub mod windows;

/// Coarse kind of a raw input device or event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    Hid,
}

/// One entry of the platform device list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawDeviceEntry {
    pub handle: DeviceHandle,
    pub kind: DeviceKind,
}

/// Header of a raw input event copied into a caller buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventHeader {
    pub device: DeviceHandle,
    pub kind: DeviceKind,
    /// Byte span of the HID report inside the buffer passed to
    /// [`HidPlatform::read_event`]. Empty for non-HID events.
    pub report: Range<usize>,
}

/// Raw HID primitives of one platform.
///
/// Buffer-filling methods follow the two-call pattern: ask for the size, grow the
/// caller's buffer if needed (never shrink it), then copy.
pub trait HidPlatform: Send + Sync {
    /// Currently present devices.
    fn enumerate(&self) -> Result<Vec<RawDeviceEntry>, PlatformError>;

    /// Vendor/product ids and top-level usage.
    fn device_info(&self, handle: DeviceHandle) -> Result<HidDeviceInfo, PlatformError>;

    /// Device interface path.
    fn device_name(&self, handle: DeviceHandle) -> Result<String, PlatformError>;

    /// Human-readable product string, if the device provides one.
    fn product_name(&self, handle: DeviceHandle) -> Option<String>;

    /// Copy the device's preparsed capability blob into `buf`; returns its length.
    fn preparsed_data(
        &self,
        handle: DeviceHandle,
        buf: &mut Vec<u8>,
    ) -> Result<usize, PlatformError>;

    /// Input value capabilities described by a preparsed blob.
    fn value_caps(&self, preparsed: &[u8]) -> Result<Vec<ValueCap>, PlatformError>;

    /// Input button capabilities described by a preparsed blob.
    fn button_caps(&self, preparsed: &[u8]) -> Result<Vec<ButtonCap>, PlatformError>;

    /// Copy a raw input event into `buf` and interpret its header.
    fn read_event(&self, event: RawEvent, buf: &mut Vec<u8>) -> Result<EventHeader, PlatformError>;

    /// Raw (unscaled) value of one usage in a report.
    fn usage_value(
        &self,
        preparsed: &[u8],
        usage_page: u16,
        link_collection: u16,
        usage: u16,
        report: &[u8],
    ) -> Result<u32, PlatformError>;

    /// Usages of `usage_page` that are active ("on") in a report. `out` is cleared first.
    fn usages(
        &self,
        preparsed: &[u8],
        usage_page: u16,
        link_collection: u16,
        report: &[u8],
        out: &mut Vec<u16>,
    ) -> Result<(), PlatformError>;
}

/// State source for vendor-specific controllers, keyed by the adapter's own slot index.
pub trait VendorAdapter: Send + Sync {
    fn state(&self, slot: u32) -> JoystickState;
    fn capabilities(&self, slot: u32) -> JoystickCapabilities;
    fn identity(&self, slot: u32) -> DeviceGuid;
}

/// Adapter used when no vendor driver is available: every slot is disconnected.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledVendorAdapter;

impl VendorAdapter for DisabledVendorAdapter {
    fn state(&self, _slot: u32) -> JoystickState {
        JoystickState::default()
    }

    fn capabilities(&self, _slot: u32) -> JoystickCapabilities {
        JoystickCapabilities::default()
    }

    fn identity(&self, _slot: u32) -> DeviceGuid {
        DeviceGuid::default()
    }
}
