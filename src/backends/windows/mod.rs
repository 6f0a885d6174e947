//! Windows backend: Raw Input, the HID parser and XInput.
//!
//! [`WindowsPlatform`] implements [`HidPlatform`] on top of the Raw Input device
//! list and `WM_INPUT` payloads, with HIDP reading capabilities and report values.
//! [`XInputAdapter`] serves the XInput-class controllers that the manager does not
//! decode itself.
//!
//! The host owns the message loop. It registers a window with
//! [`register_joystick_input`], then forwards the `lParam` of each `WM_INPUT` to
//! [`Manager::process_event`](crate::manager::Manager::process_event) as a
//! [`RawEvent`], and calls [`Manager::refresh`](crate::manager::Manager::refresh) on
//! `WM_INPUT_DEVICE_CHANGE`.

#![cfg(target_os = "windows")]

mod hidp;
mod raw_input;
mod xinput;

pub use raw_input::register_joystick_input;
pub use xinput::XInputAdapter;

use crate::backends::{EventHeader, HidPlatform, RawDeviceEntry};
use crate::caps::{ButtonCap, ValueCap};
use crate::error::PlatformError;
use crate::metadata::{DeviceHandle, HidDeviceInfo, RawEvent};
use windows_sys::Win32::Foundation::{GetLastError, HANDLE, NTSTATUS};

#[inline]
pub(crate) fn handle_of(handle: DeviceHandle) -> HANDLE {
    handle.0 as HANDLE
}

/// Error for a failed Win32 call, carrying `GetLastError`.
pub(crate) fn status(call: &'static str) -> PlatformError {
    PlatformError::Status {
        call,
        code: unsafe { GetLastError() } as i32,
    }
}

/// Error for a failed HIDP call, carrying its `NTSTATUS`.
pub(crate) fn status_code(call: &'static str, code: NTSTATUS) -> PlatformError {
    PlatformError::Status { call, code }
}

/// Raw Input + HIDP implementation of [`HidPlatform`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl HidPlatform for WindowsPlatform {
    fn enumerate(&self) -> Result<Vec<RawDeviceEntry>, PlatformError> {
        raw_input::enumerate()
    }

    fn device_info(&self, handle: DeviceHandle) -> Result<HidDeviceInfo, PlatformError> {
        raw_input::device_info(handle)
    }

    fn device_name(&self, handle: DeviceHandle) -> Result<String, PlatformError> {
        raw_input::device_name(handle)
    }

    fn product_name(&self, handle: DeviceHandle) -> Option<String> {
        let path = raw_input::device_name(handle).ok()?;
        hidp::product_string(&path)
    }

    fn preparsed_data(
        &self,
        handle: DeviceHandle,
        buf: &mut Vec<u8>,
    ) -> Result<usize, PlatformError> {
        raw_input::preparsed_data(handle, buf)
    }

    fn value_caps(&self, preparsed: &[u8]) -> Result<Vec<ValueCap>, PlatformError> {
        hidp::value_caps(preparsed)
    }

    fn button_caps(&self, preparsed: &[u8]) -> Result<Vec<ButtonCap>, PlatformError> {
        hidp::button_caps(preparsed)
    }

    fn read_event(&self, event: RawEvent, buf: &mut Vec<u8>) -> Result<EventHeader, PlatformError> {
        raw_input::read_event(event, buf)
    }

    fn usage_value(
        &self,
        preparsed: &[u8],
        usage_page: u16,
        link_collection: u16,
        usage: u16,
        report: &[u8],
    ) -> Result<u32, PlatformError> {
        hidp::usage_value(preparsed, usage_page, link_collection, usage, report)
    }

    fn usages(
        &self,
        preparsed: &[u8],
        usage_page: u16,
        link_collection: u16,
        report: &[u8],
        out: &mut Vec<u16>,
    ) -> Result<(), PlatformError> {
        hidp::usages(preparsed, usage_page, link_collection, report, out)
    }
}
