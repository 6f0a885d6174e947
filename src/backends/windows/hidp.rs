//! HID parser (HIDP) calls over a preparsed blob.
//!
//! The blob is the byte copy returned by `RIDI_PREPARSEDDATA`; HIDP takes it as an
//! opaque `PHIDP_PREPARSED_DATA`, so it is passed by address and never interpreted
//! here.

use super::status_code;
use crate::caps::{ButtonCap, CapUsage, ValueCap};
use crate::error::PlatformError;
use core::mem::MaybeUninit;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, HANDLE, INVALID_HANDLE_VALUE, NTSTATUS,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

/// Upper bound on active usages per report and collection.
const MAX_ACTIVE_USAGES: usize = 256;
/// `HidD_GetProductString` limit, in bytes.
const PRODUCT_STRING_BYTES: usize = 254;

#[inline]
fn ppd(preparsed: &[u8]) -> PHIDP_PREPARSED_DATA {
    preparsed.as_ptr() as PHIDP_PREPARSED_DATA
}

fn check(call: &'static str, code: NTSTATUS) -> Result<(), PlatformError> {
    if code == HIDP_STATUS_SUCCESS {
        Ok(())
    } else {
        Err(status_code(call, code))
    }
}

fn caps(preparsed: &[u8]) -> Result<HIDP_CAPS, PlatformError> {
    if preparsed.is_empty() {
        return Err(PlatformError::InvalidData("empty preparsed data".into()));
    }
    let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
    check("HidP_GetCaps", unsafe { HidP_GetCaps(ppd(preparsed), caps.as_mut_ptr()) })?;
    Ok(unsafe { caps.assume_init() })
}

pub(super) fn value_caps(preparsed: &[u8]) -> Result<Vec<ValueCap>, PlatformError> {
    let count = caps(preparsed)?.NumberInputValueCaps;
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut raw: Vec<HIDP_VALUE_CAPS> = vec![unsafe { core::mem::zeroed() }; count as usize];
    let mut len = count;
    check("HidP_GetValueCaps", unsafe {
        HidP_GetValueCaps(HidP_Input, raw.as_mut_ptr(), &mut len, ppd(preparsed))
    })?;
    raw.truncate(len as usize);

    Ok(raw
        .iter()
        .map(|c| {
            let usage = unsafe {
                if c.IsRange != 0 {
                    CapUsage::Range {
                        min: c.Anonymous.Range.UsageMin,
                        max: c.Anonymous.Range.UsageMax,
                    }
                } else {
                    CapUsage::Single(c.Anonymous.NotRange.Usage)
                }
            };
            ValueCap {
                report_id: c.ReportID,
                usage_page: c.UsagePage,
                usage,
                link_collection: c.LinkCollection,
                logical_min: c.LogicalMin,
                logical_max: c.LogicalMax,
                bit_size: c.BitSize,
                is_alias: c.IsAlias != 0,
            }
        })
        .collect())
}

pub(super) fn button_caps(preparsed: &[u8]) -> Result<Vec<ButtonCap>, PlatformError> {
    let count = caps(preparsed)?.NumberInputButtonCaps;
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut raw: Vec<HIDP_BUTTON_CAPS> = vec![unsafe { core::mem::zeroed() }; count as usize];
    let mut len = count;
    check("HidP_GetButtonCaps", unsafe {
        HidP_GetButtonCaps(HidP_Input, raw.as_mut_ptr(), &mut len, ppd(preparsed))
    })?;
    raw.truncate(len as usize);

    Ok(raw
        .iter()
        .map(|c| {
            let usage = unsafe {
                if c.IsRange != 0 {
                    CapUsage::Range {
                        min: c.Anonymous.Range.UsageMin,
                        max: c.Anonymous.Range.UsageMax,
                    }
                } else {
                    CapUsage::Single(c.Anonymous.NotRange.Usage)
                }
            };
            ButtonCap {
                report_id: c.ReportID,
                usage_page: c.UsagePage,
                usage,
                link_collection: c.LinkCollection,
                is_alias: c.IsAlias != 0,
            }
        })
        .collect())
}

pub(super) fn usage_value(
    preparsed: &[u8],
    usage_page: u16,
    link_collection: u16,
    usage: u16,
    report: &[u8],
) -> Result<u32, PlatformError> {
    let mut value: u32 = 0;
    check("HidP_GetUsageValue", unsafe {
        HidP_GetUsageValue(
            HidP_Input,
            usage_page,
            link_collection,
            usage,
            &mut value,
            ppd(preparsed),
            report.as_ptr(),
            report.len() as u32,
        )
    })?;
    Ok(value)
}

thread_local! {
    // HidP_GetUsages wants a mutable report pointer.
    static REPORT_COPY: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

pub(super) fn usages(
    preparsed: &[u8],
    usage_page: u16,
    link_collection: u16,
    report: &[u8],
    out: &mut Vec<u16>,
) -> Result<(), PlatformError> {
    out.clear();
    out.resize(MAX_ACTIVE_USAGES, 0);
    let mut len = MAX_ACTIVE_USAGES as u32;

    let mut call = |copy: &mut Vec<u8>| {
        copy.clear();
        copy.extend_from_slice(report);
        unsafe {
            HidP_GetUsages(
                HidP_Input,
                usage_page,
                link_collection,
                out.as_mut_ptr(),
                &mut len,
                ppd(preparsed),
                copy.as_mut_ptr(),
                copy.len() as u32,
            )
        }
    };
    let code = REPORT_COPY.with(|cell| match cell.try_borrow_mut() {
        Ok(mut copy) => call(&mut copy),
        Err(_) => call(&mut Vec::new()),
    });

    if let Err(e) = check("HidP_GetUsages", code) {
        out.clear();
        return Err(e);
    }
    out.truncate(len as usize);
    Ok(())
}

/// Open an interface path for attribute queries only.
fn open_for_query(path: &str) -> Result<HANDLE, u32> {
    let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(std::iter::once(0)).collect();

    let try_open = |access: u32| unsafe {
        CreateFileW(
            wide.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            core::ptr::null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            core::ptr::null_mut(),
        )
    };

    // Zero access is enough for HidD_* string queries and works on devices the
    // system holds exclusively (keyboards, some pads).
    let mut handle = try_open(0);
    if handle == INVALID_HANDLE_VALUE {
        handle = try_open(GENERIC_READ);
    }
    if handle == INVALID_HANDLE_VALUE {
        Err(unsafe { GetLastError() })
    } else {
        Ok(handle)
    }
}

/// Product string of the device at an interface path.
pub(super) fn product_string(path: &str) -> Option<String> {
    let handle = open_for_query(path).ok()?;
    let mut wide = [0u16; PRODUCT_STRING_BYTES / 2];
    let ok = unsafe {
        HidD_GetProductString(
            handle,
            wide.as_mut_ptr() as *mut core::ffi::c_void,
            PRODUCT_STRING_BYTES as u32,
        )
    };
    unsafe { CloseHandle(handle) };
    if ok == 0 {
        return None;
    }
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    let name = String::from_utf16_lossy(&wide[..end]).trim().to_string();
    (!name.is_empty()).then_some(name)
}
