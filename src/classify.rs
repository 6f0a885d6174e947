//! Control classification.
//!
//! Maps capability records to roles:
//! - Generic Desktop X/Y/Z/Rx/Ry/Rz/Slider/Dial/Wheel and Simulation Rudder/Throttle
//!   become **axes** at a fixed offset (see [`axis_offset`]).
//! - Generic Desktop Hat Switch becomes a **hat**, offset = hats found so far.
//! - Every button usage (ranges expanded) becomes a **button**, offset = buttons found so far.
//!
//! The axis order follows the Generic Desktop usage order, which is also the order
//! SDL's mapping database assumes for raw HID joysticks. Aliased records are dropped.
//! Ranged value records are not supported and skipped; other usages are ignored.
//! None of these skips is an error: the rest of the device stays usable.

use crate::caps::{ButtonCap, CapUsage, HidCapabilities, ValueCap};
use crate::error::ControlShape;
use crate::slots::{ControlDescriptor, RawKey};
use tracing::debug;

pub const PAGE_GENERIC_DESKTOP: u16 = 0x01;
pub const PAGE_SIMULATION: u16 = 0x02;
pub const PAGE_BUTTON: u16 = 0x09;

pub const USAGE_GD_JOYSTICK: u16 = 0x04;
pub const USAGE_GD_GAMEPAD: u16 = 0x05;
pub const USAGE_GD_X: u16 = 0x30;
pub const USAGE_GD_Y: u16 = 0x31;
pub const USAGE_GD_Z: u16 = 0x32;
pub const USAGE_GD_RX: u16 = 0x33;
pub const USAGE_GD_RY: u16 = 0x34;
pub const USAGE_GD_RZ: u16 = 0x35;
pub const USAGE_GD_SLIDER: u16 = 0x36;
pub const USAGE_GD_DIAL: u16 = 0x37;
pub const USAGE_GD_WHEEL: u16 = 0x38;
pub const USAGE_GD_HATSWITCH: u16 = 0x39;

pub const USAGE_SIM_RUDDER: u16 = 0xBA;
pub const USAGE_SIM_THROTTLE: u16 = 0xBB;

/// Semantic role of a value capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Axis { offset: u32 },
    Hat,
}

/// Canonical placement of a well-known axis usage.
pub fn axis_offset(usage_page: u16, usage: u16) -> Option<u32> {
    match (usage_page, usage) {
        (PAGE_GENERIC_DESKTOP, USAGE_GD_X) => Some(0),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_Y) => Some(1),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_Z) => Some(2),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_RX) => Some(3),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_RY) => Some(4),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_RZ) => Some(5),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_SLIDER) => Some(6),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_DIAL) => Some(7),
        (PAGE_GENERIC_DESKTOP, USAGE_GD_WHEEL) => Some(8),
        (PAGE_SIMULATION, USAGE_SIM_RUDDER) => Some(9),
        (PAGE_SIMULATION, USAGE_SIM_THROTTLE) => Some(10),
        _ => None,
    }
}

#[inline]
pub fn is_hat_usage(usage_page: u16, usage: u16) -> bool {
    usage_page == PAGE_GENERIC_DESKTOP && usage == USAGE_GD_HATSWITCH
}

/// Role of a single (page, usage) value control, or `None` if ignored.
pub fn role_of(usage_page: u16, usage: u16) -> Option<Role> {
    if is_hat_usage(usage_page, usage) {
        return Some(Role::Hat);
    }
    axis_offset(usage_page, usage).map(|offset| Role::Axis { offset })
}

/// Unsorted controls of one device, grouped by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classified {
    pub axes: Vec<ControlDescriptor>,
    pub hats: Vec<ControlDescriptor>,
    pub buttons: Vec<ControlDescriptor>,
}

/// Classify every capability of a device.
pub fn classify(caps: &HidCapabilities) -> Classified {
    let mut out = Classified::default();
    classify_values(&caps.values, &mut out);
    classify_buttons(&caps.buttons, &mut out);
    out
}

fn classify_values(values: &[ValueCap], out: &mut Classified) {
    for (position, cap) in values.iter().enumerate() {
        if cap.is_alias {
            continue;
        }
        let usage = match cap.usage {
            CapUsage::Single(u) => u,
            CapUsage::Range { min, max } => {
                debug!(
                    position,
                    usage_page = cap.usage_page,
                    "skipping {}",
                    ControlShape::RangedAxis {
                        usage_min: min,
                        usage_max: max
                    }
                );
                continue;
            }
        };

        let key = RawKey::new(position, usage);
        match role_of(cap.usage_page, usage) {
            Some(Role::Axis { offset }) => {
                out.axes.push(ControlDescriptor::new(key, cap.usage_page, offset));
            }
            Some(Role::Hat) => {
                let offset = out.hats.len() as u32;
                out.hats.push(ControlDescriptor::new(key, cap.usage_page, offset));
            }
            None => {
                debug!(
                    position,
                    "ignoring value usage {} ({:#06x}:{:#06x})",
                    usage_name(cap.usage_page, usage),
                    cap.usage_page,
                    usage
                );
            }
        }
    }
}

fn classify_buttons(buttons: &[ButtonCap], out: &mut Classified) {
    for (position, cap) in buttons.iter().enumerate() {
        if cap.is_alias {
            continue;
        }
        for usage in cap.usage.iter() {
            let offset = out.buttons.len() as u32;
            out.buttons.push(ControlDescriptor::new(
                RawKey::new(position, usage),
                cap.usage_page,
                offset,
            ));
        }
    }
}

/// Friendly names for common usages (X/Y/Z/Rx/Ry/Rz, simulation controls, buttons).
pub fn usage_name(usage_page: u16, usage: u16) -> String {
    match usage_page {
        PAGE_GENERIC_DESKTOP => {
            let s = match usage {
                USAGE_GD_X => "X",
                USAGE_GD_Y => "Y",
                USAGE_GD_Z => "Z",
                USAGE_GD_RX => "Rx",
                USAGE_GD_RY => "Ry",
                USAGE_GD_RZ => "Rz",
                USAGE_GD_SLIDER => "Slider",
                USAGE_GD_DIAL => "Dial",
                USAGE_GD_WHEEL => "Wheel",
                USAGE_GD_HATSWITCH => "Hat",
                _ => return format!("GD_{usage:#04x}"),
            };
            s.to_string()
        }
        PAGE_SIMULATION => {
            let s = match usage {
                0xB0 => "Aileron",
                0xB1 => "AileronTrim",
                0xB2 => "AntiTorque",
                USAGE_SIM_RUDDER => "Rudder",
                USAGE_SIM_THROTTLE => "Throttle",
                0xC4 => "Accelerator",
                0xC5 => "Brake",
                0xC6 => "Clutch",
                _ => return format!("Sim_{usage:#04x}"),
            };
            s.to_string()
        }
        PAGE_BUTTON => format!("Button {usage}"),
        p if (p & 0xFF00) == 0xFF00 => "Vendor".to_string(),
        _ => format!("UP_{usage_page:04x}_U_{usage:04x}"),
    }
}
