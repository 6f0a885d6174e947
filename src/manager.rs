//! The polling surface.
//!
//! [`Manager`] ties a [`HidPlatform`], a [`VendorAdapter`] and the
//! [`DeviceRegistry`] together. Two kinds of callers use it at once:
//!
//! - the thread that receives raw input notifications calls
//!   [`process_event`](Manager::process_event) for each one;
//! - application threads poll [`state`](Manager::state),
//!   [`capabilities`](Manager::capabilities) and friends by dense index.
//!
//! One `parking_lot::Mutex` guards the registry. Event intake holds it to resolve
//! the device and again to apply the decoded update; the platform calls that read
//! the report happen between the two with the lock released. A poller therefore
//! sees a device's state either before or after a report, never in between.
//!
//! Every index-addressed read returns a neutral value for an index that does not
//! exist. See [`registry`](crate::registry) for how indices move when devices are
//! replaced.

use crate::backends::{DeviceKind, DisabledVendorAdapter, HidPlatform, VendorAdapter};
use crate::config::ManagerConfig;
use crate::decode::{self, DecodeScratch};
use crate::device::{Device, DeviceClass, DeviceSummary};
use crate::error::JoystickError;
use crate::event::{ControlDesc, EventOutcome};
use crate::metadata::{DeviceGuid, RawEvent};
use crate::registry::{DeviceRegistry, RefreshSummary};
use crate::snapshot::{JoystickCapabilities, JoystickState};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Where a device's polled values come from.
enum Source {
    Local(JoystickState),
    Vendor(u32),
}

pub struct Manager {
    platform: Box<dyn HidPlatform>,
    vendor: Box<dyn VendorAdapter>,
    config: ManagerConfig,
    registry: Mutex<DeviceRegistry>,
}

impl Manager {
    /// Build a manager and run the first device scan.
    pub fn new(
        platform: impl HidPlatform + 'static,
        vendor: impl VendorAdapter + 'static,
        config: ManagerConfig,
    ) -> Self {
        let manager = Self {
            platform: Box::new(platform),
            vendor: Box::new(vendor),
            config,
            registry: Mutex::new(DeviceRegistry::new()),
        };
        if let Err(e) = manager.refresh() {
            warn!("initial device scan failed: {e}");
        }
        manager
    }

    /// A manager with no vendor adapter; vendor-class devices report as disconnected.
    pub fn without_vendor(platform: impl HidPlatform + 'static, config: ManagerConfig) -> Self {
        Self::new(platform, DisabledVendorAdapter, config)
    }

    /// Raw Input + HIDP + XInput.
    ///
    /// Raw input still has to be registered for a window (see
    /// [`register_joystick_input`](crate::backends::windows::register_joystick_input))
    /// before events arrive.
    #[cfg(all(feature = "hid", target_os = "windows"))]
    #[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
    pub fn windows(config: ManagerConfig) -> Self {
        use crate::backends::windows::{WindowsPlatform, XInputAdapter};
        Self::new(WindowsPlatform::new(), XInputAdapter::new(), config)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Rescan the platform device list.
    ///
    /// # Errors
    /// [`JoystickError::CapabilityQueryFailed`] if the device list cannot be read.
    pub fn refresh(&self) -> Result<RefreshSummary, JoystickError> {
        self.registry.lock().refresh(&*self.platform, &self.config)
    }

    /// Handle one raw input notification.
    ///
    /// Unknown handles trigger one rescan. Events from vendor-class devices are not
    /// decoded ([`EventOutcome::Forwarded`]); mouse and keyboard events are
    /// [`EventOutcome::Ignored`].
    ///
    /// # Errors
    /// - [`JoystickError::CapabilityQueryFailed`] if the event cannot be read.
    /// - [`JoystickError::UnknownDevice`] if the device is still unknown after the rescan.
    /// - [`JoystickError::DeviceRejected`] if the device is present but was turned away.
    pub fn process_event(&self, event: RawEvent) -> Result<EventOutcome, JoystickError> {
        decode::with_scratch(|scratch| self.process_with(event, scratch))
    }

    fn process_with(
        &self,
        event: RawEvent,
        scratch: &mut DecodeScratch,
    ) -> Result<EventOutcome, JoystickError> {
        let header = self.platform.read_event(event, &mut scratch.event)?;
        if header.kind != DeviceKind::Hid {
            return Ok(EventOutcome::Ignored);
        }
        let handle = header.device;

        let layout = {
            let mut registry = self.registry.lock();
            let device = match registry.resolve(handle, &*self.platform, &self.config) {
                Ok(device) => device,
                Err(e) => {
                    debug!(handle = handle.0, "dropping event: {e}");
                    return Err(e);
                }
            };
            if let DeviceClass::Vendor { .. } = device.class {
                return Ok(EventOutcome::Forwarded);
            }
            Arc::clone(&device.layout)
        };

        let preparsed: &[u8] = match self.platform.preparsed_data(handle, &mut scratch.preparsed) {
            Ok(len) if len <= scratch.preparsed.len() => &scratch.preparsed[..len],
            Ok(len) => {
                debug!(
                    handle = handle.0,
                    len, "preparsed length exceeds buffer, using cached blob"
                );
                &layout.preparsed[..]
            }
            Err(e) => {
                debug!(handle = handle.0, "preparsed data unavailable, using cached blob: {e}");
                &layout.preparsed[..]
            }
        };
        let report = scratch.event.get(header.report.clone()).unwrap_or_default();
        let update = decode::decode_report(
            &*self.platform,
            &layout,
            preparsed,
            report,
            &mut scratch.usages,
        );

        let mut registry = self.registry.lock();
        match registry.get_mut(handle) {
            Some(device) if Arc::ptr_eq(&device.layout, &layout) => {
                device.state.apply(&update);
                trace!(handle = handle.0, ?update, "report applied");
                Ok(EventOutcome::Decoded)
            }
            _ => {
                debug!(handle = handle.0, "device re-enumerated during decode, update dropped");
                Ok(EventOutcome::Stale)
            }
        }
    }

    /// Number of registered devices, connected or not.
    pub fn device_count(&self) -> usize {
        self.registry.lock().len()
    }

    fn source(&self, index: usize) -> Option<Source> {
        let registry = self.registry.lock();
        let device = registry.by_index(index)?;
        Some(match device.class {
            DeviceClass::Vendor { slot } if device.is_connected() => Source::Vendor(slot),
            // The adapter slot may already serve another pad.
            DeviceClass::Vendor { .. } => Source::Local(JoystickState::default()),
            DeviceClass::Hid => Source::Local(device.state.clone()),
        })
    }

    fn with_device<R: Default>(&self, index: usize, f: impl FnOnce(&Device) -> R) -> R {
        self.registry.lock().by_index(index).map(f).unwrap_or_default()
    }

    /// Current values of the device at `index`.
    pub fn state(&self, index: usize) -> JoystickState {
        match self.source(index) {
            Some(Source::Local(state)) => state,
            Some(Source::Vendor(slot)) => self.vendor.state(slot),
            None => JoystickState::default(),
        }
    }

    /// Control counts and connection flag of the device at `index`.
    pub fn capabilities(&self, index: usize) -> JoystickCapabilities {
        match self.source(index) {
            Some(Source::Local(state)) => JoystickCapabilities::of(&state),
            Some(Source::Vendor(slot)) => self.vendor.capabilities(slot),
            None => JoystickCapabilities::default(),
        }
    }

    /// Stable identity of the device at `index`; all zeros if there is none.
    pub fn identity(&self, index: usize) -> DeviceGuid {
        let (guid, slot) = {
            let registry = self.registry.lock();
            match registry.by_index(index) {
                Some(device) => (
                    device.guid,
                    device.vendor_slot().filter(|_| device.is_connected()),
                ),
                None => return DeviceGuid::default(),
            }
        };
        match slot {
            Some(slot) => self.vendor.identity(slot),
            None => guid,
        }
    }

    /// Force feedback is not supported; always returns `false`.
    pub fn set_vibration(&self, index: usize, left: f32, right: f32) -> bool {
        trace!(index, left, right, "vibration not supported");
        false
    }

    /// Product name (or interface path) of the device at `index`.
    pub fn name(&self, index: usize) -> String {
        self.with_device(index, |d| d.name.clone())
    }

    /// Allocated controls of the device at `index`, in logical order.
    ///
    /// Empty for vendor-class devices.
    pub fn describe(&self, index: usize) -> Vec<ControlDesc> {
        self.with_device(index, |d| match d.class {
            DeviceClass::Hid => d.layout.describe(),
            DeviceClass::Vendor { .. } => Vec::new(),
        })
    }

    /// One summary per registered device, in index order.
    pub fn devices(&self) -> Vec<DeviceSummary> {
        self.registry.lock().iter().map(Device::summary).collect()
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config)
            .field("devices", &self.device_count())
            .finish_non_exhaustive()
    }
}
