//! In-memory platform for tests and offline replay.
//!
//! [`MockPlatform`] is a cheap `Clone` handle to shared state, so a test can give
//! one clone to the [`Manager`](crate::manager::Manager) and keep another to plug
//! and unplug devices or queue reports while the manager runs.
//!
//! ## Blob and report formats
//! The mock does not imitate any OS layout:
//! - a preparsed blob is `b"MOCK"` + the device handle (`i64` LE) + optional padding;
//! - a report is a list of records built with [`MockReport`]:
//!   `0, page u16, usage u16, value u32` for a value and `1, page u16, usage u16`
//!   for an active button (all little endian).
//!
//! ```
//! use rawstick::backends::mock::{MockDevice, MockPlatform, MockReport};
//! use rawstick::classify::{PAGE_GENERIC_DESKTOP, USAGE_GD_X};
//! use rawstick::DeviceHandle;
//!
//! let platform = MockPlatform::new();
//! platform.plug(MockDevice::joystick(DeviceHandle(1), 0x044f, 0xb10a)
//!     .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0, 255)
//!     .with_buttons(4));
//! let _event = platform.push_report(DeviceHandle(1), &MockReport::new()
//!     .value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 128)
//!     .press(rawstick::classify::PAGE_BUTTON, 2));
//! ```

use super::{DeviceKind, EventHeader, HidPlatform, RawDeviceEntry, VendorAdapter};
use crate::caps::{ButtonCap, CapUsage, HidCapabilities, ValueCap};
use crate::classify::{
    PAGE_BUTTON, PAGE_GENERIC_DESKTOP, USAGE_GD_GAMEPAD, USAGE_GD_HATSWITCH, USAGE_GD_JOYSTICK,
};
use crate::error::PlatformError;
use crate::metadata::{DeviceGuid, DeviceHandle, HidDeviceInfo, RawEvent};
use crate::snapshot::{JoystickCapabilities, JoystickState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const BLOB_MAGIC: &[u8; 4] = b"MOCK";
const EVENT_HEADER_LEN: usize = 9;
const TAG_VALUE: u8 = 0;
const TAG_PRESSED: u8 = 1;

/// A scripted device.
#[derive(Clone, Debug)]
pub struct MockDevice {
    pub handle: DeviceHandle,
    pub kind: DeviceKind,
    pub info: HidDeviceInfo,
    /// Interface path; include `IG_` to mark the XInput class.
    pub name: String,
    pub product: Option<String>,
    pub caps: HidCapabilities,
    /// Make capability queries on this device's blob fail.
    pub caps_fail: bool,
    /// Extra bytes appended to the preparsed blob.
    pub blob_padding: usize,
}

impl MockDevice {
    /// A Generic Desktop joystick with no controls yet.
    pub fn joystick(handle: DeviceHandle, vendor_id: u16, product_id: u16) -> Self {
        Self {
            handle,
            kind: DeviceKind::Hid,
            info: HidDeviceInfo {
                vendor_id,
                product_id,
                version: 0x0100,
                usage_page: PAGE_GENERIC_DESKTOP,
                usage: USAGE_GD_JOYSTICK,
            },
            name: format!(r"\\?\HID#VID_{vendor_id:04X}&PID_{product_id:04X}#{:x}", handle.0),
            product: Some(format!("Mock Stick {vendor_id:04x}:{product_id:04x}")),
            caps: HidCapabilities::default(),
            caps_fail: false,
            blob_padding: 0,
        }
    }

    /// An XInput-class gamepad endpoint.
    pub fn vendor_gamepad(handle: DeviceHandle, vendor_id: u16, product_id: u16) -> Self {
        let mut dev = Self::joystick(handle, vendor_id, product_id);
        dev.info.usage = USAGE_GD_GAMEPAD;
        dev.name = format!(
            r"\\?\HID#VID_{vendor_id:04X}&PID_{product_id:04X}&IG_00#{:x}",
            handle.0
        );
        dev
    }

    /// Add a single-usage value capability.
    pub fn with_axis(
        mut self,
        usage_page: u16,
        usage: u16,
        logical_min: i32,
        logical_max: i32,
    ) -> Self {
        self.caps.values.push(ValueCap {
            report_id: 0,
            usage_page,
            usage: CapUsage::Single(usage),
            link_collection: 0,
            logical_min,
            logical_max,
            bit_size: 16,
            is_alias: false,
        });
        self
    }

    /// Add a Hat Switch with logical range `0..=logical_max`.
    pub fn with_hat(self, logical_max: i32) -> Self {
        self.with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_HATSWITCH, 0, logical_max)
    }

    /// Add a raw value capability as-is.
    pub fn with_value_cap(mut self, cap: ValueCap) -> Self {
        self.caps.values.push(cap);
        self
    }

    /// Add Button-page usages `1..=count` as one ranged capability.
    pub fn with_buttons(mut self, count: u16) -> Self {
        if count > 0 {
            self.caps.buttons.push(ButtonCap {
                report_id: 0,
                usage_page: PAGE_BUTTON,
                usage: CapUsage::Range { min: 1, max: count },
                link_collection: 0,
                is_alias: false,
            });
        }
        self
    }

    pub fn with_caps_failure(mut self) -> Self {
        self.caps_fail = true;
        self
    }
}

/// Builder for mock report bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockReport {
    values: Vec<(u16, u16, u32)>,
    pressed: Vec<(u16, u16)>,
}

impl MockReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, usage_page: u16, usage: u16, raw: u32) -> Self {
        self.values.push((usage_page, usage, raw));
        self
    }

    pub fn press(mut self, usage_page: u16, usage: u16) -> Self {
        self.pressed.push((usage_page, usage));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.values.len() * 9 + self.pressed.len() * 5);
        for &(page, usage, raw) in &self.values {
            out.push(TAG_VALUE);
            out.extend_from_slice(&page.to_le_bytes());
            out.extend_from_slice(&usage.to_le_bytes());
            out.extend_from_slice(&raw.to_le_bytes());
        }
        for &(page, usage) in &self.pressed {
            out.push(TAG_PRESSED);
            out.extend_from_slice(&page.to_le_bytes());
            out.extend_from_slice(&usage.to_le_bytes());
        }
        out
    }

    /// Decode report bytes. Trailing garbage ends the record list.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut report = Self::default();
        let mut rest = bytes;
        loop {
            match rest {
                [TAG_VALUE, p0, p1, u0, u1, v0, v1, v2, v3, tail @ ..] => {
                    report.values.push((
                        u16::from_le_bytes([*p0, *p1]),
                        u16::from_le_bytes([*u0, *u1]),
                        u32::from_le_bytes([*v0, *v1, *v2, *v3]),
                    ));
                    rest = tail;
                }
                [TAG_PRESSED, p0, p1, u0, u1, tail @ ..] => {
                    report
                        .pressed
                        .push((u16::from_le_bytes([*p0, *p1]), u16::from_le_bytes([*u0, *u1])));
                    rest = tail;
                }
                _ => break,
            }
        }
        report
    }
}

#[derive(Default)]
struct Inner {
    devices: Vec<MockDevice>,
    events: HashMap<isize, (DeviceHandle, DeviceKind, Vec<u8>)>,
    next_event: isize,
    enumerate_calls: usize,
    enumerate_fail: bool,
    preparsed_calls: HashMap<DeviceHandle, usize>,
}

impl Inner {
    fn device(&self, handle: DeviceHandle) -> Result<&MockDevice, PlatformError> {
        self.devices
            .iter()
            .find(|d| d.handle == handle)
            .ok_or_else(|| PlatformError::NotFound(format!("device {:#x}", handle.0)))
    }
}

/// Shared, scriptable [`HidPlatform`].
#[derive(Clone, Default)]
pub struct MockPlatform {
    inner: Arc<Mutex<Inner>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device (replacing any device with the same handle).
    pub fn plug(&self, device: MockDevice) {
        let mut inner = self.inner.lock();
        inner.devices.retain(|d| d.handle != device.handle);
        inner.devices.push(device);
    }

    /// Detach a device. Returns it if it was present.
    pub fn unplug(&self, handle: DeviceHandle) -> Option<MockDevice> {
        let mut inner = self.inner.lock();
        let pos = inner.devices.iter().position(|d| d.handle == handle)?;
        Some(inner.devices.remove(pos))
    }

    pub fn set_caps_fail(&self, handle: DeviceHandle, fail: bool) {
        if let Some(d) = self.inner.lock().devices.iter_mut().find(|d| d.handle == handle) {
            d.caps_fail = fail;
        }
    }

    pub fn set_blob_padding(&self, handle: DeviceHandle, padding: usize) {
        if let Some(d) = self.inner.lock().devices.iter_mut().find(|d| d.handle == handle) {
            d.blob_padding = padding;
        }
    }

    pub fn set_enumerate_fail(&self, fail: bool) {
        self.inner.lock().enumerate_fail = fail;
    }

    /// How many times [`HidPlatform::enumerate`] ran.
    pub fn enumerate_calls(&self) -> usize {
        self.inner.lock().enumerate_calls
    }

    /// How many times a device's preparsed blob was requested.
    pub fn preparsed_calls(&self, handle: DeviceHandle) -> usize {
        self.inner.lock().preparsed_calls.get(&handle).copied().unwrap_or(0)
    }

    /// Queue a HID report from `device`; the returned event can be fed to the manager.
    pub fn push_report(&self, device: DeviceHandle, report: &MockReport) -> RawEvent {
        self.push_event(device, DeviceKind::Hid, report.to_bytes())
    }

    /// Queue a non-HID event (mouse or keyboard).
    pub fn push_event_of_kind(&self, device: DeviceHandle, kind: DeviceKind) -> RawEvent {
        self.push_event(device, kind, Vec::new())
    }

    fn push_event(&self, device: DeviceHandle, kind: DeviceKind, payload: Vec<u8>) -> RawEvent {
        let mut inner = self.inner.lock();
        inner.next_event += 1;
        let id = inner.next_event;
        inner.events.insert(id, (device, kind, payload));
        RawEvent(id)
    }
}

fn blob_handle(preparsed: &[u8]) -> Result<DeviceHandle, PlatformError> {
    match preparsed {
        [m0, m1, m2, m3, h @ ..] if [*m0, *m1, *m2, *m3] == *BLOB_MAGIC && h.len() >= 8 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&h[..8]);
            Ok(DeviceHandle(i64::from_le_bytes(raw) as isize))
        }
        _ => Err(PlatformError::InvalidData("not a mock preparsed blob".into())),
    }
}

fn kind_byte(kind: DeviceKind) -> u8 {
    match kind {
        DeviceKind::Mouse => 0,
        DeviceKind::Keyboard => 1,
        DeviceKind::Hid => 2,
    }
}

fn grow(buf: &mut Vec<u8>, need: usize) {
    if buf.len() < need {
        buf.resize(need, 0);
    }
}

impl HidPlatform for MockPlatform {
    fn enumerate(&self) -> Result<Vec<RawDeviceEntry>, PlatformError> {
        let mut inner = self.inner.lock();
        inner.enumerate_calls += 1;
        if inner.enumerate_fail {
            return Err(PlatformError::Status {
                call: "GetRawInputDeviceList",
                code: -1,
            });
        }
        Ok(inner
            .devices
            .iter()
            .map(|d| RawDeviceEntry {
                handle: d.handle,
                kind: d.kind,
            })
            .collect())
    }

    fn device_info(&self, handle: DeviceHandle) -> Result<HidDeviceInfo, PlatformError> {
        Ok(self.inner.lock().device(handle)?.info.clone())
    }

    fn device_name(&self, handle: DeviceHandle) -> Result<String, PlatformError> {
        Ok(self.inner.lock().device(handle)?.name.clone())
    }

    fn product_name(&self, handle: DeviceHandle) -> Option<String> {
        self.inner.lock().device(handle).ok()?.product.clone()
    }

    fn preparsed_data(
        &self,
        handle: DeviceHandle,
        buf: &mut Vec<u8>,
    ) -> Result<usize, PlatformError> {
        let mut inner = self.inner.lock();
        *inner.preparsed_calls.entry(handle).or_default() += 1;
        let dev = inner.device(handle)?;
        let len = BLOB_MAGIC.len() + 8 + dev.blob_padding;
        grow(buf, len);
        buf[..4].copy_from_slice(BLOB_MAGIC);
        buf[4..12].copy_from_slice(&(handle.0 as i64).to_le_bytes());
        buf[12..len].iter_mut().for_each(|b| *b = 0);
        Ok(len)
    }

    fn value_caps(&self, preparsed: &[u8]) -> Result<Vec<ValueCap>, PlatformError> {
        let handle = blob_handle(preparsed)?;
        let inner = self.inner.lock();
        let dev = inner.device(handle)?;
        if dev.caps_fail {
            return Err(PlatformError::Status {
                call: "HidP_GetValueCaps",
                code: 0xC011_0001_u32 as i32,
            });
        }
        Ok(dev.caps.values.clone())
    }

    fn button_caps(&self, preparsed: &[u8]) -> Result<Vec<ButtonCap>, PlatformError> {
        let handle = blob_handle(preparsed)?;
        let inner = self.inner.lock();
        let dev = inner.device(handle)?;
        if dev.caps_fail {
            return Err(PlatformError::Status {
                call: "HidP_GetButtonCaps",
                code: 0xC011_0001_u32 as i32,
            });
        }
        Ok(dev.caps.buttons.clone())
    }

    fn read_event(&self, event: RawEvent, buf: &mut Vec<u8>) -> Result<EventHeader, PlatformError> {
        let inner = self.inner.lock();
        let (device, kind, payload) = inner
            .events
            .get(&event.0)
            .ok_or_else(|| PlatformError::NotFound(format!("event {}", event.0)))?;

        let need = EVENT_HEADER_LEN + payload.len();
        grow(buf, need);
        buf[..8].copy_from_slice(&(device.0 as i64).to_le_bytes());
        buf[8] = kind_byte(*kind);
        buf[EVENT_HEADER_LEN..need].copy_from_slice(payload);

        let report = if *kind == DeviceKind::Hid {
            EVENT_HEADER_LEN..need
        } else {
            0..0
        };
        Ok(EventHeader {
            device: *device,
            kind: *kind,
            report,
        })
    }

    fn usage_value(
        &self,
        preparsed: &[u8],
        usage_page: u16,
        _link_collection: u16,
        usage: u16,
        report: &[u8],
    ) -> Result<u32, PlatformError> {
        blob_handle(preparsed)?;
        MockReport::from_bytes(report)
            .values
            .iter()
            .find(|&&(p, u, _)| p == usage_page && u == usage)
            .map(|&(_, _, v)| v)
            .ok_or_else(|| PlatformError::NotFound(format!("usage {usage_page:#06x}:{usage:#06x}")))
    }

    fn usages(
        &self,
        preparsed: &[u8],
        usage_page: u16,
        _link_collection: u16,
        report: &[u8],
        out: &mut Vec<u16>,
    ) -> Result<(), PlatformError> {
        blob_handle(preparsed)?;
        out.clear();
        out.extend(
            MockReport::from_bytes(report)
                .pressed
                .iter()
                .filter(|&&(p, _)| p == usage_page)
                .map(|&(_, u)| u),
        );
        Ok(())
    }
}

/// Scriptable [`VendorAdapter`]: slots without a stored state are disconnected.
#[derive(Clone, Default)]
pub struct MockVendorAdapter {
    states: Arc<Mutex<HashMap<u32, JoystickState>>>,
}

impl MockVendorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, slot: u32, state: JoystickState) {
        self.states.lock().insert(slot, state);
    }

    pub fn clear(&self, slot: u32) {
        self.states.lock().remove(&slot);
    }
}

impl VendorAdapter for MockVendorAdapter {
    fn state(&self, slot: u32) -> JoystickState {
        self.states.lock().get(&slot).cloned().unwrap_or_default()
    }

    fn capabilities(&self, slot: u32) -> JoystickCapabilities {
        self.states
            .lock()
            .get(&slot)
            .map(JoystickCapabilities::of)
            .unwrap_or_default()
    }

    fn identity(&self, slot: u32) -> DeviceGuid {
        if self.states.lock().contains_key(&slot) {
            DeviceGuid::xinput_slot(slot)
        } else {
            DeviceGuid::default()
        }
    }
}
