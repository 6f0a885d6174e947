//! XInput state for XInput-class controllers.
//!
//! Xbox-style pads show up twice: as a HID endpoint whose interface path carries
//! `IG_`, and as an XInput user slot. The HID side of those pads merges the
//! triggers into one axis, so the manager registers the endpoint but reads its
//! state here.
//!
//! ## Layout
//! - axes (6): LX, LY, RX, RY, LT, RT. Stick Y is inverted so that up is negative,
//!   matching HID sticks; triggers span the full `i16` range from released to pressed.
//! - buttons (10): A, B, X, Y, LB, RB, Back, Start, LThumb, RThumb
//! - hat (1): the D-pad

use crate::backends::VendorAdapter;
use crate::decode::scale_value;
use crate::event::HatPosition;
use crate::metadata::DeviceGuid;
use crate::snapshot::{JoystickCapabilities, JoystickState};
use windows_sys::Win32::UI::Input::XboxController::*;

const AXES: usize = 6;
const HATS: usize = 1;

const BUTTON_MAP: [u16; 10] = [
    XINPUT_GAMEPAD_A,
    XINPUT_GAMEPAD_B,
    XINPUT_GAMEPAD_X,
    XINPUT_GAMEPAD_Y,
    XINPUT_GAMEPAD_LEFT_SHOULDER,
    XINPUT_GAMEPAD_RIGHT_SHOULDER,
    XINPUT_GAMEPAD_BACK,
    XINPUT_GAMEPAD_START,
    XINPUT_GAMEPAD_LEFT_THUMB,
    XINPUT_GAMEPAD_RIGHT_THUMB,
];

/// [`VendorAdapter`] over `XInputGetState` / `XInputGetCapabilities`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XInputAdapter;

impl XInputAdapter {
    pub fn new() -> Self {
        Self
    }

    fn gamepad(slot: u32) -> Option<XINPUT_GAMEPAD> {
        let mut state: XINPUT_STATE = unsafe { core::mem::zeroed() };
        // Returns ERROR_SUCCESS (0) when a controller is present.
        let res = unsafe { XInputGetState(slot, &mut state) };
        (res == 0).then_some(state.Gamepad)
    }
}

fn trigger(v: u8) -> i16 {
    scale_value(i64::from(v), 0, 255, i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

fn dpad(buttons: u16) -> HatPosition {
    let up = buttons & XINPUT_GAMEPAD_DPAD_UP != 0;
    let down = buttons & XINPUT_GAMEPAD_DPAD_DOWN != 0;
    let left = buttons & XINPUT_GAMEPAD_DPAD_LEFT != 0;
    let right = buttons & XINPUT_GAMEPAD_DPAD_RIGHT != 0;

    match (up, down, left, right) {
        (true, false, false, false) => HatPosition::Up,
        (true, false, false, true) => HatPosition::UpRight,
        (false, false, false, true) => HatPosition::Right,
        (false, true, false, true) => HatPosition::DownRight,
        (false, true, false, false) => HatPosition::Down,
        (false, true, true, false) => HatPosition::DownLeft,
        (false, false, true, false) => HatPosition::Left,
        (true, false, true, false) => HatPosition::UpLeft,
        // Nothing held, or opposing directions.
        _ => HatPosition::Centered,
    }
}

fn state_of(pad: &XINPUT_GAMEPAD) -> JoystickState {
    JoystickState {
        axes: vec![
            pad.sThumbLX,
            pad.sThumbLY.saturating_neg(),
            pad.sThumbRX,
            pad.sThumbRY.saturating_neg(),
            trigger(pad.bLeftTrigger),
            trigger(pad.bRightTrigger),
        ],
        buttons: BUTTON_MAP.iter().map(|&mask| pad.wButtons & mask != 0).collect(),
        hats: vec![dpad(pad.wButtons)],
        connected: true,
    }
}

impl VendorAdapter for XInputAdapter {
    fn state(&self, slot: u32) -> JoystickState {
        Self::gamepad(slot).map(|pad| state_of(&pad)).unwrap_or_default()
    }

    fn capabilities(&self, slot: u32) -> JoystickCapabilities {
        let mut caps: XINPUT_CAPABILITIES = unsafe { core::mem::zeroed() };
        let res = unsafe { XInputGetCapabilities(slot, XINPUT_FLAG_GAMEPAD, &mut caps) };
        if res != 0 {
            return JoystickCapabilities::default();
        }
        JoystickCapabilities {
            axis_count: AXES,
            button_count: BUTTON_MAP.len(),
            hat_count: HATS,
            connected: true,
        }
    }

    fn identity(&self, slot: u32) -> DeviceGuid {
        if Self::gamepad(slot).is_some() {
            DeviceGuid::xinput_slot(slot)
        } else {
            DeviceGuid::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_diagonals_and_conflicts() {
        assert_eq!(dpad(XINPUT_GAMEPAD_DPAD_UP | XINPUT_GAMEPAD_DPAD_RIGHT), HatPosition::UpRight);
        assert_eq!(dpad(XINPUT_GAMEPAD_DPAD_UP | XINPUT_GAMEPAD_DPAD_DOWN), HatPosition::Centered);
        assert_eq!(dpad(0), HatPosition::Centered);
    }

    #[test]
    fn gamepad_maps_to_state() {
        let mut pad: XINPUT_GAMEPAD = unsafe { core::mem::zeroed() };
        pad.sThumbLY = i16::MIN;
        pad.bRightTrigger = 255;
        pad.wButtons = XINPUT_GAMEPAD_B | XINPUT_GAMEPAD_DPAD_LEFT;

        let state = state_of(&pad);
        assert_eq!(state.axis(1), i16::MAX);
        assert_eq!(state.axis(4), i16::MIN);
        assert_eq!(state.axis(5), i16::MAX);
        assert!(state.button(1));
        assert!(!state.button(0));
        assert_eq!(state.hat(0), HatPosition::Left);
    }
}
