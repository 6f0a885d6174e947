//! Raw Input device list, device info and event intake.
//!
//! Every call here follows the Raw Input two-call pattern: pass a null buffer to
//! learn the size, grow the caller's buffer if it is too small, then call again.
//! Buffers are only ever grown.

use super::{handle_of, status};
use crate::backends::{DeviceKind, EventHeader, RawDeviceEntry};
use crate::error::PlatformError;
use crate::metadata::{DeviceHandle, HidDeviceInfo, RawEvent};
use core::ffi::c_void;
use core::mem::size_of;
use windows_sys::Win32::Foundation::HWND;
use windows_sys::Win32::UI::Input::*;

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_JOYSTICK: u16 = 0x04;
const HID_USAGE_GENERIC_GAMEPAD: u16 = 0x05;

/// `u32::MAX` is how every Raw Input call reports failure.
const RAW_INPUT_ERROR: u32 = u32::MAX;

fn kind_of(ty: u32) -> DeviceKind {
    match ty {
        RIM_TYPEMOUSE => DeviceKind::Mouse,
        RIM_TYPEKEYBOARD => DeviceKind::Keyboard,
        _ => DeviceKind::Hid,
    }
}

fn grow<T: Clone + Default>(buf: &mut Vec<T>, need: usize) {
    if buf.len() < need {
        buf.resize(need, T::default());
    }
}

pub(super) fn enumerate() -> Result<Vec<RawDeviceEntry>, PlatformError> {
    let entry_size = size_of::<RAWINPUTDEVICELIST>() as u32;
    loop {
        let mut count: u32 = 0;
        let r0 = unsafe { GetRawInputDeviceList(core::ptr::null_mut(), &mut count, entry_size) };
        if r0 == RAW_INPUT_ERROR {
            return Err(status("GetRawInputDeviceList"));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut list: Vec<RAWINPUTDEVICELIST> =
            vec![unsafe { core::mem::zeroed() }; count as usize];
        let r1 = unsafe { GetRawInputDeviceList(list.as_mut_ptr(), &mut count, entry_size) };
        if r1 == RAW_INPUT_ERROR {
            // A device arrived between the two calls; ask again.
            continue;
        }
        list.truncate(r1 as usize);
        return Ok(list
            .iter()
            .map(|d| RawDeviceEntry {
                handle: DeviceHandle(d.hDevice as isize),
                kind: kind_of(d.dwType),
            })
            .collect());
    }
}

pub(super) fn device_info(handle: DeviceHandle) -> Result<HidDeviceInfo, PlatformError> {
    let mut info: RID_DEVICE_INFO = unsafe { core::mem::zeroed() };
    info.cbSize = size_of::<RID_DEVICE_INFO>() as u32;
    let mut size = info.cbSize;
    let r = unsafe {
        GetRawInputDeviceInfoW(
            handle_of(handle),
            RIDI_DEVICEINFO,
            &mut info as *mut RID_DEVICE_INFO as *mut c_void,
            &mut size,
        )
    };
    if r == RAW_INPUT_ERROR {
        return Err(status("GetRawInputDeviceInfoW(RIDI_DEVICEINFO)"));
    }
    if info.dwType != RIM_TYPEHID {
        return Err(PlatformError::InvalidData(format!(
            "device {:#x} is not a HID device",
            handle.0
        )));
    }
    let hid = unsafe { info.Anonymous.hid };
    Ok(HidDeviceInfo {
        vendor_id: hid.dwVendorId as u16,
        product_id: hid.dwProductId as u16,
        version: hid.dwVersionNumber,
        usage_page: hid.usUsagePage,
        usage: hid.usUsage,
    })
}

pub(super) fn device_name(handle: DeviceHandle) -> Result<String, PlatformError> {
    // Size is in WCHARs, including the terminator.
    let mut size: u32 = 0;
    let r0 = unsafe {
        GetRawInputDeviceInfoW(
            handle_of(handle),
            RIDI_DEVICENAME,
            core::ptr::null_mut(),
            &mut size,
        )
    };
    if r0 == RAW_INPUT_ERROR || size == 0 {
        return Err(status("GetRawInputDeviceInfoW(RIDI_DEVICENAME)"));
    }

    let mut wide: Vec<u16> = vec![0u16; size as usize];
    let r1 = unsafe {
        GetRawInputDeviceInfoW(
            handle_of(handle),
            RIDI_DEVICENAME,
            wide.as_mut_ptr() as *mut c_void,
            &mut size,
        )
    };
    if r1 == RAW_INPUT_ERROR {
        return Err(status("GetRawInputDeviceInfoW(RIDI_DEVICENAME)"));
    }
    while wide.last() == Some(&0) {
        wide.pop();
    }
    Ok(String::from_utf16_lossy(&wide))
}

pub(super) fn preparsed_data(
    handle: DeviceHandle,
    buf: &mut Vec<u8>,
) -> Result<usize, PlatformError> {
    let mut size: u32 = 0;
    let r0 = unsafe {
        GetRawInputDeviceInfoW(
            handle_of(handle),
            RIDI_PREPARSEDDATA,
            core::ptr::null_mut(),
            &mut size,
        )
    };
    if r0 == RAW_INPUT_ERROR || size == 0 {
        return Err(status("GetRawInputDeviceInfoW(RIDI_PREPARSEDDATA)"));
    }
    grow(buf, size as usize);
    let r1 = unsafe {
        GetRawInputDeviceInfoW(
            handle_of(handle),
            RIDI_PREPARSEDDATA,
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
        )
    };
    if r1 == RAW_INPUT_ERROR {
        return Err(status("GetRawInputDeviceInfoW(RIDI_PREPARSEDDATA)"));
    }
    Ok(r1 as usize)
}

/// Copy a `WM_INPUT` payload into `buf` and locate its HID report.
///
/// Only the first report of a `RAWHID` block is exposed; devices that batch
/// several reports per message get the rest on the next message.
pub(super) fn read_event(event: RawEvent, buf: &mut Vec<u8>) -> Result<EventHeader, PlatformError> {
    let header_size = size_of::<RAWINPUTHEADER>();
    let mut size: u32 = 0;
    let r0 = unsafe {
        GetRawInputData(
            event.0 as HRAWINPUT,
            RID_INPUT,
            core::ptr::null_mut(),
            &mut size,
            header_size as u32,
        )
    };
    if r0 == RAW_INPUT_ERROR || size == 0 {
        return Err(status("GetRawInputData"));
    }
    grow(buf, size as usize);
    let r1 = unsafe {
        GetRawInputData(
            event.0 as HRAWINPUT,
            RID_INPUT,
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
            header_size as u32,
        )
    };
    if r1 == RAW_INPUT_ERROR {
        return Err(status("GetRawInputData"));
    }
    let len = (r1 as usize).min(buf.len());
    if len < header_size {
        return Err(PlatformError::InvalidData("raw input shorter than its header".into()));
    }

    let hdr: RAWINPUTHEADER =
        unsafe { core::ptr::read_unaligned(buf.as_ptr() as *const RAWINPUTHEADER) };
    let kind = kind_of(hdr.dwType);
    let mut report = 0..0;
    if kind == DeviceKind::Hid {
        // RAWHID: dwSizeHid, dwCount, then the report bytes.
        let counts = header_size..header_size + 8;
        let Some(fields) = buf.get(counts) else {
            return Err(PlatformError::InvalidData("truncated RAWHID block".into()));
        };
        let size_hid = u32::from_le_bytes([fields[0], fields[1], fields[2], fields[3]]) as usize;
        let start = header_size + 8;
        report = start..(start + size_hid).min(len);
    }
    Ok(EventHeader {
        device: DeviceHandle(hdr.hDevice as isize),
        kind,
        report,
    })
}

/// Subscribe `hwnd` to joystick and gamepad raw input, including arrival and
/// removal notifications (`WM_INPUT_DEVICE_CHANGE`).
///
/// # Errors
/// [`PlatformError::Status`] if `RegisterRawInputDevices` fails.
pub fn register_joystick_input(hwnd: HWND) -> Result<(), PlatformError> {
    let devices =
        [HID_USAGE_GENERIC_JOYSTICK, HID_USAGE_GENERIC_GAMEPAD].map(|usage| RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: usage,
            dwFlags: RIDEV_INPUTSINK | RIDEV_DEVNOTIFY,
            hwndTarget: hwnd,
        });
    let ok = unsafe {
        RegisterRawInputDevices(
            devices.as_ptr(),
            devices.len() as u32,
            size_of::<RAWINPUTDEVICE>() as u32,
        )
    };
    if ok == 0 {
        return Err(status("RegisterRawInputDevices"));
    }
    Ok(())
}
