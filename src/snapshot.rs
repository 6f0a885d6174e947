//! Per-device live state.
//!
//! [`JoystickState`] is what consumers poll: one `i16` per axis, one `bool` per button
//! and one [`HatPosition`] per hat, indexed by logical index. It is an owned copy;
//! the manager hands out clones taken under its lock, so a poller sees either the
//! state before a report or after it, never a mix.
//!
//! Getters are index-safe: reading past the end returns the neutral value.
//!
//! ```
//! use rawstick::JoystickState;
//!
//! let state = JoystickState::default();
//! assert_eq!(state.axis(3), 0);
//! assert!(!state.button(10));
//! assert!(state.hat(0).is_centered());
//! ```

use crate::event::HatPosition;
use serde::{Deserialize, Serialize};

/// Current values of every control on one device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickState {
    pub axes: Vec<i16>,
    pub buttons: Vec<bool>,
    pub hats: Vec<HatPosition>,
    pub connected: bool,
}

impl JoystickState {
    /// Neutral state sized for a device.
    pub fn with_counts(axes: usize, buttons: usize, hats: usize) -> Self {
        Self {
            axes: vec![0; axes],
            buttons: vec![false; buttons],
            hats: vec![HatPosition::Centered; hats],
            connected: false,
        }
    }

    #[inline]
    pub fn axis(&self, index: usize) -> i16 {
        self.axes.get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    #[inline]
    pub fn hat(&self, index: usize) -> HatPosition {
        self.hats.get(index).copied().unwrap_or_default()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply one decoded report.
    ///
    /// Values named in the update are overwritten in order, so a button listed as
    /// released and then as pressed ends up pressed.
    pub fn apply(&mut self, update: &StateUpdate) {
        for &(index, value) in &update.axes {
            if let Some(slot) = self.axes.get_mut(index) {
                *slot = value;
            }
        }
        for &(index, position) in &update.hats {
            if let Some(slot) = self.hats.get_mut(index) {
                *slot = position;
            }
        }
        for &(index, pressed) in &update.buttons {
            if let Some(slot) = self.buttons.get_mut(index) {
                *slot = pressed;
            }
        }
    }

    /// Return every control to neutral, keeping sizes.
    pub fn reset(&mut self) {
        self.axes.iter_mut().for_each(|a| *a = 0);
        self.buttons.iter_mut().for_each(|b| *b = false);
        self.hats.iter_mut().for_each(|h| *h = HatPosition::Centered);
    }
}

/// Values decoded from one report, by logical index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub axes: Vec<(usize, i16)>,
    pub hats: Vec<(usize, HatPosition)>,
    /// Every button of each collection the report carried, released first and
    /// then the active ones pressed. Buttons of collections that could not be
    /// read do not appear.
    pub buttons: Vec<(usize, bool)>,
}

/// Control counts of one device plus its connection flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickCapabilities {
    pub axis_count: usize,
    pub button_count: usize,
    pub hat_count: usize,
    pub connected: bool,
}

impl JoystickCapabilities {
    pub fn of(state: &JoystickState) -> Self {
        Self {
            axis_count: state.axes.len(),
            button_count: state.buttons.len(),
            hat_count: state.hats.len(),
            connected: state.connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_are_cleared_then_reasserted() {
        let mut state = JoystickState::with_counts(0, 3, 0);
        state.buttons = vec![true, true, false];

        state.apply(&StateUpdate {
            buttons: vec![(0, false), (1, false), (2, false), (2, true)],
            ..StateUpdate::default()
        });
        assert_eq!(state.buttons, vec![false, false, true]);
    }

    #[test]
    fn unlisted_buttons_are_left_alone() {
        let mut state = JoystickState::with_counts(1, 2, 0);
        state.buttons = vec![true, false];
        state.apply(&StateUpdate {
            axes: vec![(0, -5)],
            ..StateUpdate::default()
        });
        assert_eq!(state.buttons, vec![true, false]);
        assert_eq!(state.axis(0), -5);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut state = JoystickState::with_counts(1, 1, 1);
        state.apply(&StateUpdate {
            axes: vec![(4, 100)],
            hats: vec![(2, HatPosition::Up)],
            buttons: vec![(9, true)],
        });
        assert_eq!(state, JoystickState::with_counts(1, 1, 1));
        assert_eq!(state.axis(4), 0);
        assert_eq!(state.hat(2), HatPosition::Centered);
    }

    #[test]
    fn capabilities_follow_state_shape() {
        let mut state = JoystickState::with_counts(4, 12, 1);
        state.connected = true;
        let caps = JoystickCapabilities::of(&state);
        assert_eq!(
            caps,
            JoystickCapabilities {
                axis_count: 4,
                button_count: 12,
                hat_count: 1,
                connected: true
            }
        );
    }
}
