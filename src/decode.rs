//! Report decoding.
//!
//! Turns one raw HID report into a [`StateUpdate`] using a device's
//! [`ControlLayout`]. Decoding reads nothing but the layout, the report and the
//! platform primitives, so it runs without the registry lock; the manager applies
//! the update afterwards.
//!
//! ## Axes
//! The raw field value is scaled from the declared logical range onto
//! `i16::MIN..=i16::MAX`. Devices with a positive minimum report values relative to
//! it, so the minimum is added back first. Devices with a negative minimum must not
//! get that treatment (it would invert the axis); their field is sign-extended from
//! its bit size instead.
//!
//! ## Hats
//! See [`hat_position`].
//!
//! ## Buttons
//! A report lists the buttons that are on. Anything not listed is off, so for every
//! button collection the report carries, the update releases all of that
//! collection's buttons and then presses the listed ones. Collections that live in
//! other numbered reports are left alone.
//!
//! ## Failures
//! A failed platform call skips that one control (or button collection) with a
//! `debug!` diagnostic; the rest of the report is still decoded.

use crate::backends::HidPlatform;
use crate::caps::{CapUsage, ValueCap};
use crate::classify::is_hat_usage;
use crate::device::ControlLayout;
use crate::error::{ControlShape, PlatformError};
use crate::event::HatPosition;
use crate::slots::RawKey;
use crate::snapshot::StateUpdate;
use std::cell::RefCell;
use tracing::{debug, trace};

/// Scale `value` from `[src_min, src_max]` onto `[dst_min, dst_max]`, clamped.
///
/// A degenerate source range maps to the destination midpoint.
pub fn scale_value(value: i64, src_min: i64, src_max: i64, dst_min: i64, dst_max: i64) -> i64 {
    if src_max <= src_min {
        return (dst_min + dst_max) / 2;
    }
    let scaled = (value - src_min) * (dst_max - dst_min) / (src_max - src_min) + dst_min;
    scaled.clamp(dst_min, dst_max)
}

/// Scale a raw axis field into the canonical signed 16-bit range.
pub fn scale_axis(raw: u32, logical_min: i32, logical_max: i32, bit_size: u16) -> i16 {
    let value = if logical_min > 0 {
        i64::from(raw) + i64::from(logical_min)
    } else if logical_min < 0 {
        sign_extend(raw, bit_size)
    } else {
        i64::from(raw)
    };
    let scaled = scale_value(
        value,
        i64::from(logical_min),
        i64::from(logical_max),
        i64::from(i16::MIN),
        i64::from(i16::MAX),
    );
    scaled as i16
}

fn sign_extend(raw: u32, bit_size: u16) -> i64 {
    match bit_size {
        1..=31 => {
            let shift = 32 - u32::from(bit_size);
            i64::from(((raw << shift) as i32) >> shift)
        }
        32 => i64::from(raw as i32),
        _ => i64::from(raw),
    }
}

/// Whether [`hat_position`] understands a hat with this logical maximum.
#[inline]
pub fn hat_supported(logical_max: i32) -> bool {
    matches!(logical_max, 3 | 7 | 8)
}

/// Decode a hat switch value.
///
/// - `raw > logical_max`: out-of-range (the usual "null" state) -> `Centered`
/// - max 3: four-way, `0..=3` -> Left, Up, Right, Down
/// - max 8: the value is the [`HatPosition`] ordinal (`0` = centered)
/// - max 7: eight-way with 0 = Up; `(raw + 1) % 9` gives the ordinal
/// - any other max: unsupported -> `Centered`
pub fn hat_position(raw: u32, logical_max: i32) -> HatPosition {
    if i64::from(raw) > i64::from(logical_max) {
        return HatPosition::Centered;
    }
    match logical_max {
        3 => match raw {
            0 => HatPosition::Left,
            1 => HatPosition::Up,
            2 => HatPosition::Right,
            3 => HatPosition::Down,
            _ => HatPosition::Centered,
        },
        8 => HatPosition::from_ordinal(raw).unwrap_or_default(),
        7 => HatPosition::from_ordinal((raw + 1) % 9).unwrap_or_default(),
        _ => HatPosition::Centered,
    }
}

/// Grow-only buffers reused across decode calls on one thread.
#[derive(Debug, Default)]
pub struct DecodeScratch {
    pub event: Vec<u8>,
    pub preparsed: Vec<u8>,
    pub usages: Vec<u16>,
}

thread_local! {
    static SCRATCH: RefCell<DecodeScratch> = RefCell::new(DecodeScratch::default());
}

/// Run `f` with this thread's scratch buffers.
///
/// A nested call gets fresh buffers instead of the shared ones.
pub fn with_scratch<R>(f: impl FnOnce(&mut DecodeScratch) -> R) -> R {
    SCRATCH.with(|cell| match cell.try_borrow_mut() {
        Ok(mut scratch) => f(&mut scratch),
        Err(_) => f(&mut DecodeScratch::default()),
    })
}

fn read_value(
    platform: &dyn HidPlatform,
    preparsed: &[u8],
    cap: &ValueCap,
    usage: u16,
    report: &[u8],
) -> Result<u32, PlatformError> {
    match platform.usage_value(preparsed, cap.usage_page, cap.link_collection, usage, report) {
        Err(_) if cap.link_collection != 0 => {
            // Some stacks only resolve values through the top-level collection.
            platform.usage_value(preparsed, cap.usage_page, 0, usage, report)
        }
        other => other,
    }
}

/// Whether a capability tagged with `report_id` can appear in `report`.
///
/// Report id 0 means the device uses a single unnumbered report.
#[inline]
fn in_report(report_id: u8, report: &[u8]) -> bool {
    report_id == 0 || report.first() == Some(&report_id)
}

/// Decode one report against a layout.
///
/// Controls missing from the layout's slot tables are ignored, so a layout whose
/// tables were never allocated decodes to an empty update.
pub fn decode_report(
    platform: &dyn HidPlatform,
    layout: &ControlLayout,
    preparsed: &[u8],
    report: &[u8],
    usages: &mut Vec<u16>,
) -> StateUpdate {
    let mut update = StateUpdate::default();

    for (position, cap) in layout.caps.values.iter().enumerate() {
        if cap.is_alias || !in_report(cap.report_id, report) {
            continue;
        }
        let usage = match cap.usage {
            CapUsage::Single(u) => u,
            CapUsage::Range { min, max } => {
                trace!(
                    position,
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
        let hat = is_hat_usage(cap.usage_page, usage);
        let slot = if hat {
            layout.hats.index_of(key)
        } else {
            layout.axes.index_of(key)
        };
        let Some(index) = slot else {
            continue;
        };

        let raw = match read_value(platform, preparsed, cap, usage, report) {
            Ok(v) => v,
            Err(e) => {
                debug!(position, usage, "usage value unavailable: {e}");
                continue;
            }
        };

        if hat {
            if !hat_supported(cap.logical_max) {
                debug!(index, "{}", ControlShape::HatLogicalMax(cap.logical_max));
            }
            update.hats.push((index, hat_position(raw, cap.logical_max)));
        } else {
            update
                .axes
                .push((index, scale_axis(raw, cap.logical_min, cap.logical_max, cap.bit_size)));
        }
    }

    for (position, cap) in layout.caps.buttons.iter().enumerate() {
        if cap.is_alias || !in_report(cap.report_id, report) {
            continue;
        }
        let read = platform.usages(preparsed, cap.usage_page, cap.link_collection, report, usages);
        if let Err(e) = read {
            debug!(position, usage_page = cap.usage_page, "button usages unavailable: {e}");
            continue;
        }
        update.buttons.extend(
            layout
                .buttons
                .iter()
                .enumerate()
                .filter(|(_, d)| d.key.cap_position() == position)
                .map(|(index, _)| (index, false)),
        );
        update.buttons.extend(
            usages
                .iter()
                .filter_map(|&u| layout.buttons.index_of(RawKey::new(position, u)))
                .map(|index| (index, true)),
        );
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_axis_spans_full_range() {
        assert_eq!(scale_axis(0, 0, 255, 8), i16::MIN);
        assert_eq!(scale_axis(255, 0, 255, 8), i16::MAX);
        let mid = scale_axis(128, 0, 255, 8);
        assert!(mid.abs() < 200, "{mid}");
    }

    #[test]
    fn negative_minimum_is_not_added_back() {
        // Adding -128 first would push raw 0 to the bottom of the range.
        let centre = scale_axis(0, -128, 127, 8);
        assert!(centre.abs() < 256, "{centre}");
        assert_ne!(centre, i16::MIN);
    }

    #[test]
    fn negative_minimum_sign_extends_field() {
        // 0x80 in an 8-bit field is -128, the bottom of the range.
        assert_eq!(scale_axis(0x80, -128, 127, 8), i16::MIN);
        assert_eq!(scale_axis(0x7F, -128, 127, 8), i16::MAX);
        assert!(scale_axis(0xFF, -128, 127, 8) < 0);
    }

    #[test]
    fn positive_minimum_is_added_back() {
        // Field values count from the minimum.
        assert_eq!(scale_axis(0, 1, 256, 8), i16::MIN);
        assert_eq!(scale_axis(255, 1, 256, 8), i16::MAX);
    }

    #[test]
    fn degenerate_range_centres() {
        assert_eq!(scale_axis(5, 10, 10, 8), 0);
    }

    #[test]
    fn four_way_hat() {
        let got: Vec<HatPosition> = (0..=3).map(|v| hat_position(v, 3)).collect();
        assert_eq!(
            got,
            vec![HatPosition::Left, HatPosition::Up, HatPosition::Right, HatPosition::Down]
        );
    }

    #[test]
    fn eight_way_hat_with_ordinal_values() {
        for v in 0..=8u32 {
            assert_eq!(u32::from(hat_position(v, 8).ordinal()), v);
        }
    }

    #[test]
    fn eight_way_hat_zero_based() {
        assert_eq!(hat_position(0, 7), HatPosition::Up);
        assert_eq!(hat_position(0, 7).ordinal(), 1);
        assert_eq!(hat_position(7, 7).ordinal(), 8);
        assert_eq!(hat_position(7, 7), HatPosition::UpLeft);
    }

    #[test]
    fn out_of_range_hat_is_centred() {
        for max in [3, 7, 8, 15] {
            assert_eq!(hat_position(max as u32 + 1, max), HatPosition::Centered);
        }
        assert_eq!(hat_position(0xFF, 7), HatPosition::Centered);
    }

    #[test]
    fn unsupported_hat_max_is_centred() {
        assert!(!hat_supported(359));
        assert_eq!(hat_position(90, 359), HatPosition::Centered);
    }

    mod reports {
        use super::super::*;
        use crate::backends::mock::{MockDevice, MockPlatform, MockReport};
        use crate::classify::{
            PAGE_BUTTON, PAGE_GENERIC_DESKTOP, USAGE_GD_HATSWITCH, USAGE_GD_X, USAGE_GD_Y,
        };
        use crate::metadata::DeviceHandle;

        fn setup() -> (MockPlatform, ControlLayout) {
            let platform = MockPlatform::new();
            platform.plug(
                MockDevice::joystick(DeviceHandle(7), 0x044f, 0xb10a)
                    .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 0, 255)
                    .with_hat(7)
                    .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0, 255)
                    .with_buttons(3),
            );
            let layout = ControlLayout::query(&platform, DeviceHandle(7)).unwrap();
            (platform, layout)
        }

        fn decode(
            platform: &MockPlatform,
            layout: &ControlLayout,
            report: MockReport,
        ) -> StateUpdate {
            let mut usages = Vec::new();
            decode_report(platform, layout, &layout.preparsed, &report.to_bytes(), &mut usages)
        }

        #[test]
        fn values_land_on_logical_indices() {
            let (platform, layout) = setup();
            let update = decode(
                &platform,
                &layout,
                MockReport::new()
                    .value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 255)
                    .value(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 0)
                    .value(PAGE_GENERIC_DESKTOP, USAGE_GD_HATSWITCH, 2)
                    .press(PAGE_BUTTON, 3),
            );
            let mut axes = update.axes.clone();
            axes.sort();
            // X sorts before Y regardless of capability order.
            assert_eq!(axes, vec![(0, i16::MAX), (1, i16::MIN)]);
            assert_eq!(update.hats, vec![(0, HatPosition::Right)]);
            assert_eq!(update.buttons, vec![(0, false), (1, false), (2, false), (2, true)]);
        }

        #[test]
        fn missing_value_skips_only_that_control() {
            let (platform, layout) = setup();
            let report = MockReport::new().value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0);
            let update = decode(&platform, &layout, report);
            assert_eq!(update.axes, vec![(0, i16::MIN)]);
            assert!(update.hats.is_empty());
            assert_eq!(update.buttons, vec![(0, false), (1, false), (2, false)]);
        }

        #[test]
        fn unallocated_layout_decodes_nothing() {
            let (platform, layout) = setup();
            let empty = ControlLayout {
                preparsed: layout.preparsed.clone(),
                caps: layout.caps.clone(),
                ..ControlLayout::default()
            };
            let update = decode(
                &platform,
                &empty,
                MockReport::new()
                    .value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 10)
                    .press(PAGE_BUTTON, 1),
            );
            assert!(update.axes.is_empty());
            assert!(update.hats.is_empty());
            assert!(update.buttons.is_empty());
        }

        #[test]
        fn unreadable_blob_leaves_buttons_untouched() {
            let (platform, layout) = setup();
            let mut usages = Vec::new();
            let report = MockReport::new().press(PAGE_BUTTON, 1).to_bytes();
            let update = decode_report(&platform, &layout, b"junk", &report, &mut usages);
            assert_eq!(update, StateUpdate::default());
        }
    }

    #[test]
    fn nested_scratch_gets_fresh_buffers() {
        with_scratch(|outer| {
            outer.event.resize(16, 1);
            with_scratch(|inner| assert!(inner.event.is_empty()));
        });
        with_scratch(|again| assert_eq!(again.event.len(), 16));
    }
}
