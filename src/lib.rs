//! Joystick and gamepad input from the raw HID channel.
//!
//! Discovers game controllers, reads each one's capability report, classifies its
//! controls into axes, hats and buttons, and packs them onto dense logical indices
//! that an application polls through [`Manager`].
//!
//! ```no_run
//! use rawstick::{Manager, ManagerConfig};
//! # use rawstick::backends::mock::MockPlatform;
//! # let platform = MockPlatform::new();
//!
//! let manager = Manager::without_vendor(platform, ManagerConfig::default());
//! for index in 0..manager.device_count() {
//!     let state = manager.state(index);
//!     println!("{} x={} fire={}", manager.name(index), state.axis(0), state.button(0));
//! }
//! ```
//!
//! Platform access goes through [`backends::HidPlatform`]; the Windows
//! implementation is enabled with the default **`hid`** feature.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod caps;
pub mod classify;
pub mod config;
pub mod decode;
pub mod device;
pub mod error;
pub mod event;
pub mod manager;
pub mod metadata;
pub mod registry;
pub mod slots;
pub mod snapshot;

pub use config::ManagerConfig;
pub use device::DeviceSummary;
pub use error::{ConfigError, JoystickError, PlatformError, RejectReason};
pub use event::{ControlDesc, ControlKind, EventOutcome, HatPosition};
pub use manager::Manager;
pub use metadata::{DeviceGuid, DeviceHandle, RawEvent};
pub use registry::RefreshSummary;
pub use snapshot::{JoystickCapabilities, JoystickState};
