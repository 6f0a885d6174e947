//! Device registry.
//!
//! Owns every [`Device`] the manager knows about. Devices live in a `Vec` whose
//! order is the dense index exposed to consumers; a handle map points into it.
//!
//! ## Index stability
//! Removing a device (a replugged controller evicting its old, disconnected entry)
//! shifts every later index down by one. Indices are only meaningful until the next
//! [`DeviceRegistry::refresh`]; consumers should re-read
//! [`Manager::device_count`](crate::manager::Manager::device_count) and re-resolve by
//! index rather than caching what an index meant.

use crate::backends::{DeviceKind, HidPlatform};
use crate::config::ManagerConfig;
use crate::device::{ControlLayout, Device, DeviceClass};
use crate::error::{JoystickError, PlatformError, RejectReason};
use crate::metadata::{DeviceGuid, DeviceHandle, HidDeviceInfo};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// What one [`DeviceRegistry::refresh`] changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Newly registered devices.
    pub added: Vec<DeviceHandle>,
    /// Known devices that were disconnected and are present again.
    pub reconnected: Vec<DeviceHandle>,
    /// Known devices that are no longer present.
    pub disconnected: Vec<DeviceHandle>,
    /// Disconnected entries replaced by the same device under a new handle.
    pub evicted: Vec<DeviceHandle>,
    /// Devices that were not registered, and why.
    pub rejected: Vec<(DeviceHandle, RejectReason)>,
}

impl RefreshSummary {
    /// Whether the refresh changed anything.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.reconnected.is_empty()
            && self.disconnected.is_empty()
            && self.evicted.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    index_by_handle: HashMap<DeviceHandle, usize>,
    /// Last rejection of each present device that is not registered.
    rejected: HashMap<DeviceHandle, RejectReason>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    #[inline]
    pub fn contains(&self, handle: DeviceHandle) -> bool {
        self.index_by_handle.contains_key(&handle)
    }

    pub fn by_index(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn get(&self, handle: DeviceHandle) -> Option<&Device> {
        self.index_by_handle.get(&handle).and_then(|&i| self.devices.get(i))
    }

    pub fn get_mut(&mut self, handle: DeviceHandle) -> Option<&mut Device> {
        let index = *self.index_by_handle.get(&handle)?;
        self.devices.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Why a present, unregistered device was turned away by the last refresh.
    pub fn rejection(&self, handle: DeviceHandle) -> Option<RejectReason> {
        self.rejected.get(&handle).copied()
    }

    /// Look a handle up, rescanning once if it is unknown.
    ///
    /// # Errors
    /// [`JoystickError::DeviceRejected`] if the rescan turned the device away,
    /// [`JoystickError::UnknownDevice`] if it still is not listed.
    pub fn resolve(
        &mut self,
        handle: DeviceHandle,
        platform: &dyn HidPlatform,
        config: &ManagerConfig,
    ) -> Result<&mut Device, JoystickError> {
        if !self.contains(handle) {
            debug!(handle = handle.0, "unknown device handle, rescanning");
            if let Err(e) = self.refresh(platform, config) {
                warn!("rescan for unknown device failed: {e}");
            }
        }
        if let Some(reason) = self.rejection(handle) {
            return Err(JoystickError::DeviceRejected { handle, reason });
        }
        self.get_mut(handle).ok_or(JoystickError::UnknownDevice(handle))
    }

    /// Reconcile the registry with the platform device list.
    ///
    /// Devices missing from the list are marked disconnected but kept, so a later
    /// refresh can recognise them by identity. New devices are queried, classified
    /// and allocated before they are inserted.
    ///
    /// # Errors
    /// Fails only if the device list itself cannot be read; the registry is left
    /// untouched in that case. Per-device failures end up in
    /// [`RefreshSummary::rejected`] or the log.
    pub fn refresh(
        &mut self,
        platform: &dyn HidPlatform,
        config: &ManagerConfig,
    ) -> Result<RefreshSummary, JoystickError> {
        let entries = platform.enumerate()?;
        let present: HashSet<DeviceHandle> = entries
            .iter()
            .filter(|e| e.kind == DeviceKind::Hid)
            .map(|e| e.handle)
            .collect();

        self.rejected.retain(|h, _| present.contains(h));

        let mut summary = RefreshSummary::default();
        for device in &mut self.devices {
            if device.is_connected() && !present.contains(&device.handle) {
                device.set_connected(false);
                summary.disconnected.push(device.handle);
            }
        }

        for entry in entries.iter().filter(|e| e.kind == DeviceKind::Hid) {
            let handle = entry.handle;
            if let Some(device) = self.get_mut(handle) {
                if !device.is_connected() {
                    device.set_connected(true);
                    summary.reconnected.push(handle);
                }
                continue;
            }
            // Layout-based verdicts do not change while the device stays plugged in.
            if self.rejected.get(&handle).is_some_and(RejectReason::is_structural) {
                continue;
            }
            match self.admit(platform, config, handle, &mut summary) {
                Ok(()) => {
                    self.rejected.remove(&handle);
                    summary.added.push(handle);
                }
                Err(reason) => {
                    info!(handle = handle.0, "device rejected: {reason}");
                    self.rejected.insert(handle, reason);
                    summary.rejected.push((handle, reason));
                }
            }
        }

        if !summary.is_empty() {
            debug!(
                added = summary.added.len(),
                reconnected = summary.reconnected.len(),
                disconnected = summary.disconnected.len(),
                evicted = summary.evicted.len(),
                total = self.devices.len(),
                "registry refreshed"
            );
        }
        Ok(summary)
    }

    fn admit(
        &mut self,
        platform: &dyn HidPlatform,
        config: &ManagerConfig,
        handle: DeviceHandle,
        summary: &mut RefreshSummary,
    ) -> Result<(), RejectReason> {
        let (info, path) = match describe_entry(platform, handle) {
            Ok(found) => found,
            Err(e) => {
                debug!(handle = handle.0, "device identification failed: {e}");
                return Err(RejectReason::CapabilitiesUnavailable);
            }
        };
        let vendor = config.is_vendor_path(&path);
        let guid = DeviceGuid::from_ids(info.vendor_id, info.product_id, vendor);

        let layout = match ControlLayout::query(platform, handle) {
            Ok(layout) => layout,
            Err(e) if vendor => {
                debug!(handle = handle.0, "vendor device without capabilities: {e}");
                ControlLayout::default()
            }
            Err(e) => {
                debug!(handle = handle.0, "{e}");
                return Err(RejectReason::CapabilitiesUnavailable);
            }
        };

        if layout.axes.len() >= config.max_axes {
            return Err(RejectReason::TooManyAxes {
                count: layout.axes.len(),
                limit: config.max_axes,
            });
        }
        if layout.buttons.len() >= config.max_buttons {
            return Err(RejectReason::TooManyButtons {
                count: layout.buttons.len(),
                limit: config.max_buttons,
            });
        }

        if let Some(stale) = self
            .devices
            .iter()
            .position(|d| !d.is_connected() && d.guid == guid)
        {
            let old = self.devices.remove(stale);
            self.reindex();
            info!(
                old = old.handle.0,
                new = handle.0,
                %guid,
                "replugged device replaces its old entry"
            );
            summary.evicted.push(old.handle);
        }

        let class = if vendor {
            let slot = self
                .free_vendor_slot(config.vendor_slots)
                .ok_or(RejectReason::NoVendorSlot)?;
            DeviceClass::Vendor { slot }
        } else {
            DeviceClass::Hid
        };

        let name = platform.product_name(handle).unwrap_or(path);
        info!(
            handle = handle.0,
            %guid,
            axes = layout.axes.len(),
            buttons = layout.buttons.len(),
            hats = layout.hats.len(),
            "registered {name}"
        );
        self.index_by_handle.insert(handle, self.devices.len());
        self.devices.push(Device::new(handle, guid, info, name, class, layout));
        Ok(())
    }

    fn free_vendor_slot(&self, slots: u32) -> Option<u32> {
        let taken: HashSet<u32> = self.devices.iter().filter_map(Device::vendor_slot).collect();
        (0..slots).find(|s| !taken.contains(s))
    }

    fn reindex(&mut self) {
        self.index_by_handle = self
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| (d.handle, i))
            .collect();
    }
}

fn describe_entry(
    platform: &dyn HidPlatform,
    handle: DeviceHandle,
) -> Result<(HidDeviceInfo, String), PlatformError> {
    Ok((platform.device_info(handle)?, platform.device_name(handle)?))
}
