//! Hat positions, control descriptions and event-intake outcomes.
//!
//! ## Value conventions
//! - **Axes:** signed 16-bit, `i16::MIN..=i16::MAX`, scaled from the device's logical range.
//! - **Buttons:** `true` while the current report lists the button as active.
//! - **Hats:** a [`HatPosition`]; ordinals `0..=8` with `0` = centered and `1..=8` the
//!   compass points clockwise from Up.

use serde::{Deserialize, Serialize};

/// Position of a hat switch (POV / D-pad).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HatPosition {
    #[default]
    Centered = 0,
    Up = 1,
    UpRight = 2,
    Right = 3,
    DownRight = 4,
    Down = 5,
    DownLeft = 6,
    Left = 7,
    UpLeft = 8,
}

impl HatPosition {
    /// Map an ordinal `0..=8` to a position; anything else is `None`.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Some(match ordinal {
            0 => Self::Centered,
            1 => Self::Up,
            2 => Self::UpRight,
            3 => Self::Right,
            4 => Self::DownRight,
            5 => Self::Down,
            6 => Self::DownLeft,
            7 => Self::Left,
            8 => Self::UpLeft,
            _ => return None,
        })
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_centered(self) -> bool {
        self == Self::Centered
    }
}

/// Category of a control on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    Axis,
    Button,
    Hat,
}

/// Describes one allocated control of a device, in logical-index order.
///
/// Built from the device's capability records; intended for UIs and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDesc {
    pub kind: ControlKind,
    /// Logical index (matches the position in [`JoystickState`](crate::snapshot::JoystickState)).
    pub index: usize,
    /// Friendly usage name (e.g. `"X"`, `"Rz"`, `"Throttle"`, `"Button 3"`).
    pub name: String,
    /// Descriptor logical range. Buttons report `0..=1`.
    pub logical_min: i32,
    pub logical_max: i32,
    pub usage_page: u16,
    pub usage: u16,
}

/// What [`Manager::process_event`](crate::manager::Manager::process_event) did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// The report was decoded into the device's state.
    Decoded,
    /// The device belongs to the vendor adapter; nothing decoded locally.
    Forwarded,
    /// Not a HID event (mouse/keyboard raw input).
    Ignored,
    /// The device was re-enumerated while the report was being decoded; the
    /// update was discarded.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_round_trip_through_from_ordinal() {
        for ordinal in 0..=8u32 {
            let hat = HatPosition::from_ordinal(ordinal).unwrap();
            assert_eq!(u32::from(hat.ordinal()), ordinal);
        }
        assert_eq!(HatPosition::from_ordinal(9), None);
    }

    #[test]
    fn default_hat_is_centered() {
        assert!(HatPosition::default().is_centered());
    }
}
