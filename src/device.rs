//! Registered devices.
//!
//! A [`Device`] is either an ordinary HID controller, whose reports are decoded
//! against its [`ControlLayout`], or a vendor-specific controller whose state lives
//! in the [`VendorAdapter`](crate::backends::VendorAdapter). The class is decided
//! once, at discovery.
//!
//! The layout is immutable and shared through an `Arc`: the decoder clones the `Arc`
//! under the registry lock, decodes without the lock, and writes back only if the
//! device still holds the same layout. Re-querying capabilities builds a new layout
//! instead of editing the old one.

use crate::backends::HidPlatform;
use crate::caps::{self, HidCapabilities};
use crate::classify::{self, usage_name};
use crate::error::JoystickError;
use crate::event::{ControlDesc, ControlKind};
use crate::metadata::{DeviceGuid, DeviceHandle, HidDeviceInfo};
use crate::slots::{self, SlotTable};
use crate::snapshot::{JoystickCapabilities, JoystickState};
use serde::Serialize;
use std::sync::Arc;

/// How a device's state is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    /// Decoded locally from raw HID reports.
    Hid,
    /// Forwarded to the vendor adapter at this slot.
    Vendor { slot: u32 },
}

/// Everything needed to decode one device's reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlLayout {
    /// Preparsed blob the capabilities were read from.
    pub preparsed: Vec<u8>,
    pub caps: HidCapabilities,
    pub axes: SlotTable,
    pub hats: SlotTable,
    pub buttons: SlotTable,
}

impl ControlLayout {
    /// Query, classify and allocate a device's controls.
    ///
    /// # Errors
    /// [`JoystickError::CapabilityQueryFailed`] if the preparsed blob or the
    /// capability lists cannot be obtained.
    pub fn query(platform: &dyn HidPlatform, handle: DeviceHandle) -> Result<Self, JoystickError> {
        let mut preparsed = Vec::new();
        let len = platform.preparsed_data(handle, &mut preparsed)?;
        preparsed.truncate(len);
        let caps = caps::parse(platform, &preparsed)?;
        Ok(Self::from_caps(preparsed, caps))
    }

    /// Build a layout from capability lists already in hand.
    pub fn from_caps(preparsed: Vec<u8>, caps: HidCapabilities) -> Self {
        let classified = classify::classify(&caps);
        Self {
            preparsed,
            axes: slots::allocate(classified.axes),
            hats: slots::allocate(classified.hats),
            buttons: slots::allocate(classified.buttons),
            caps,
        }
    }

    /// Control descriptions in logical order: axes, then hats, then buttons.
    pub fn describe(&self) -> Vec<ControlDesc> {
        let mut out = Vec::with_capacity(self.axes.len() + self.hats.len() + self.buttons.len());
        for (kind, table) in [(ControlKind::Axis, &self.axes), (ControlKind::Hat, &self.hats)] {
            for (index, d) in table.iter().enumerate() {
                let Some(cap) = self.caps.values.get(d.key.cap_position()) else {
                    continue;
                };
                out.push(ControlDesc {
                    kind,
                    index,
                    name: usage_name(d.usage_page, d.key.usage()),
                    logical_min: cap.logical_min,
                    logical_max: cap.logical_max,
                    usage_page: d.usage_page,
                    usage: d.key.usage(),
                });
            }
        }
        for (index, d) in self.buttons.iter().enumerate() {
            out.push(ControlDesc {
                kind: ControlKind::Button,
                index,
                name: usage_name(d.usage_page, d.key.usage()),
                logical_min: 0,
                logical_max: 1,
                usage_page: d.usage_page,
                usage: d.key.usage(),
            });
        }
        out
    }
}

/// One physical or vendor-specific controller.
#[derive(Clone, Debug)]
pub struct Device {
    pub handle: DeviceHandle,
    pub guid: DeviceGuid,
    pub info: HidDeviceInfo,
    /// Product string, falling back to the interface path.
    pub name: String,
    pub class: DeviceClass,
    pub layout: Arc<ControlLayout>,
    pub state: JoystickState,
}

impl Device {
    pub fn new(
        handle: DeviceHandle,
        guid: DeviceGuid,
        info: HidDeviceInfo,
        name: String,
        class: DeviceClass,
        layout: ControlLayout,
    ) -> Self {
        let mut state = JoystickState::with_counts(
            layout.axes.len(),
            layout.buttons.len(),
            layout.hats.len(),
        );
        state.connected = true;
        Self {
            handle,
            guid,
            info,
            name,
            class,
            layout: Arc::new(layout),
            state,
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.state.connected = connected;
        if !connected {
            self.state.reset();
        }
    }

    #[inline]
    pub fn vendor_slot(&self) -> Option<u32> {
        match self.class {
            DeviceClass::Vendor { slot } => Some(slot),
            DeviceClass::Hid => None,
        }
    }

    pub fn capabilities(&self) -> JoystickCapabilities {
        JoystickCapabilities::of(&self.state)
    }

    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            handle: self.handle.0,
            guid: self.guid,
            name: self.name.clone(),
            vendor_slot: self.vendor_slot(),
            capabilities: self.capabilities(),
        }
    }
}

/// Serializable one-line view of a device for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub handle: isize,
    pub guid: DeviceGuid,
    pub name: String,
    pub vendor_slot: Option<u32>,
    pub capabilities: JoystickCapabilities,
}
