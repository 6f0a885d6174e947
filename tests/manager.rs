//! End-to-end behaviour of `Manager` over the in-memory platform.

use rawstick::backends::mock::{MockDevice, MockPlatform, MockReport, MockVendorAdapter};
use rawstick::caps::{CapUsage, ValueCap};
use rawstick::classify::{
    PAGE_BUTTON, PAGE_GENERIC_DESKTOP, PAGE_SIMULATION, USAGE_GD_HATSWITCH, USAGE_GD_X,
    USAGE_GD_Y, USAGE_GD_Z, USAGE_SIM_THROTTLE,
};
use rawstick::{
    ControlKind, DeviceGuid, DeviceHandle, EventOutcome, HatPosition, JoystickCapabilities,
    JoystickError, JoystickState, Manager, ManagerConfig, RejectReason,
};

fn flight_stick(handle: isize) -> MockDevice {
    MockDevice::joystick(DeviceHandle(handle), 0x044f, 0xb10a)
        .with_axis(PAGE_SIMULATION, USAGE_SIM_THROTTLE, 0, 255)
        .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 0, 1023)
        .with_hat(7)
        .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0, 1023)
        .with_buttons(3)
}

fn setup(devices: Vec<MockDevice>) -> (MockPlatform, Manager) {
    let platform = MockPlatform::new();
    for d in devices {
        platform.plug(d);
    }
    let manager = Manager::without_vendor(platform.clone(), ManagerConfig::default());
    (platform, manager)
}

#[test]
fn well_known_axes_take_fixed_order() {
    let (_platform, manager) = setup(vec![flight_stick(1)]);
    let controls: Vec<(ControlKind, usize, String)> = manager
        .describe(0)
        .into_iter()
        .map(|c| (c.kind, c.index, c.name))
        .collect();
    assert_eq!(
        &controls[..4],
        &[
            (ControlKind::Axis, 0, "X".to_string()),
            (ControlKind::Axis, 1, "Y".to_string()),
            (ControlKind::Axis, 2, "Throttle".to_string()),
            (ControlKind::Hat, 0, "Hat".to_string()),
        ]
    );
    assert_eq!(
        manager.capabilities(0),
        JoystickCapabilities {
            axis_count: 3,
            button_count: 3,
            hat_count: 1,
            connected: true
        }
    );
}

#[test]
fn buttons_follow_the_latest_report_only() {
    let (platform, manager) = setup(vec![flight_stick(1)]);

    let first = platform.push_report(
        DeviceHandle(1),
        &MockReport::new().press(PAGE_BUTTON, 1).press(PAGE_BUTTON, 2),
    );
    assert_eq!(manager.process_event(first), Ok(EventOutcome::Decoded));
    assert_eq!(manager.state(0).buttons, vec![true, true, false]);

    let second = platform.push_report(DeviceHandle(1), &MockReport::new().press(PAGE_BUTTON, 3));
    assert_eq!(manager.process_event(second), Ok(EventOutcome::Decoded));
    assert_eq!(manager.state(0).buttons, vec![false, false, true]);
}

#[test]
fn axes_and_hats_decode_into_state() {
    let (platform, manager) = setup(vec![flight_stick(1)]);
    let event = platform.push_report(
        DeviceHandle(1),
        &MockReport::new()
            .value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0)
            .value(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 1023)
            .value(PAGE_SIMULATION, USAGE_SIM_THROTTLE, 255)
            .value(PAGE_GENERIC_DESKTOP, USAGE_GD_HATSWITCH, 4),
    );
    assert_eq!(manager.process_event(event), Ok(EventOutcome::Decoded));

    let state = manager.state(0);
    assert_eq!(state.axes, vec![i16::MIN, i16::MAX, i16::MAX]);
    // Zero-based eight-way hat: 4 is Down.
    assert_eq!(state.hat(0), HatPosition::Down);

    // Null hat value (outside 0..=7).
    let event = platform.push_report(
        DeviceHandle(1),
        &MockReport::new().value(PAGE_GENERIC_DESKTOP, USAGE_GD_HATSWITCH, 15),
    );
    manager.process_event(event).unwrap();
    assert_eq!(manager.state(0).hat(0), HatPosition::Centered);
    // Axes missing from that report keep their values.
    assert_eq!(manager.state(0).axis(0), i16::MIN);
}

#[test]
fn replugged_device_replaces_its_old_entry() {
    let (platform, manager) = setup(vec![flight_stick(1)]);
    let guid = manager.identity(0);
    assert!(!guid.is_zero());

    platform.unplug(DeviceHandle(1));
    let summary = manager.refresh().unwrap();
    assert_eq!(summary.disconnected, vec![DeviceHandle(1)]);
    assert_eq!(manager.device_count(), 1);
    assert!(!manager.state(0).connected);

    platform.plug(flight_stick(2));
    let summary = manager.refresh().unwrap();
    assert_eq!(summary.evicted, vec![DeviceHandle(1)]);
    assert_eq!(summary.added, vec![DeviceHandle(2)]);
    assert_eq!(manager.device_count(), 1);
    assert_eq!(manager.identity(0), guid);
    assert!(manager.state(0).connected);

    // Repeating the cycle does not accumulate entries.
    platform.unplug(DeviceHandle(2));
    manager.refresh().unwrap();
    platform.plug(flight_stick(3));
    manager.refresh().unwrap();
    assert_eq!(manager.device_count(), 1);
    assert_eq!(manager.devices()[0].handle, 3);
}

#[test]
fn same_handle_coming_back_is_reconnected() {
    let (platform, manager) = setup(vec![flight_stick(1)]);
    let device = platform.unplug(DeviceHandle(1)).unwrap();
    manager.refresh().unwrap();
    platform.plug(device);
    let summary = manager.refresh().unwrap();
    assert_eq!(summary.reconnected, vec![DeviceHandle(1)]);
    assert!(summary.added.is_empty());
    assert!(manager.capabilities(0).connected);
}

#[test]
fn unknown_device_triggers_exactly_one_refresh() {
    let (platform, manager) = setup(vec![]);
    let scans = platform.enumerate_calls();

    let event = platform.push_report(DeviceHandle(5), &MockReport::new().press(PAGE_BUTTON, 1));
    assert_eq!(
        manager.process_event(event),
        Err(JoystickError::UnknownDevice(DeviceHandle(5)))
    );
    assert_eq!(platform.enumerate_calls(), scans + 1);

    platform.plug(flight_stick(5));
    let event = platform.push_report(DeviceHandle(5), &MockReport::new().press(PAGE_BUTTON, 1));
    assert_eq!(manager.process_event(event), Ok(EventOutcome::Decoded));
    assert_eq!(platform.enumerate_calls(), scans + 2);
    assert!(manager.state(0).button(0));

    // Known now: no further scans.
    let event = platform.push_report(DeviceHandle(5), &MockReport::new());
    manager.process_event(event).unwrap();
    assert_eq!(platform.enumerate_calls(), scans + 2);
}

#[test]
fn out_of_range_index_returns_defaults() {
    let (_platform, manager) = setup(vec![flight_stick(1)]);
    for index in [1, 7, usize::MAX] {
        assert_eq!(manager.state(index), JoystickState::default());
        assert_eq!(manager.capabilities(index), JoystickCapabilities::default());
        assert_eq!(manager.identity(index), DeviceGuid::default());
        assert_eq!(manager.name(index), "");
        assert!(manager.describe(index).is_empty());
        assert!(!manager.set_vibration(index, 0.5, 0.5));
    }
}

#[test]
fn touch_surfaces_are_rejected() {
    let platform = MockPlatform::new();
    platform.plug(MockDevice::joystick(DeviceHandle(1), 0x1111, 0x2222).with_buttons(64));
    platform.plug(MockDevice::joystick(DeviceHandle(2), 0x1111, 0x3333).with_buttons(63));
    let manager = Manager::without_vendor(platform.clone(), ManagerConfig::default());
    assert_eq!(manager.device_count(), 1);
    assert_eq!(manager.devices()[0].handle, 2);

    // The threshold is configurable.
    let strict = ManagerConfig {
        max_buttons: 16,
        ..ManagerConfig::default()
    };
    let manager = Manager::without_vendor(platform, strict);
    assert_eq!(manager.device_count(), 0);
}

#[test]
fn capability_failure_rejects_only_plain_hid_devices() {
    let platform = MockPlatform::new();
    platform.plug(flight_stick(1).with_caps_failure());
    platform.plug(MockDevice::vendor_gamepad(DeviceHandle(2), 0x045e, 0x028e).with_caps_failure());
    let manager = Manager::new(
        platform.clone(),
        MockVendorAdapter::new(),
        ManagerConfig::default(),
    );

    assert_eq!(manager.device_count(), 1);
    let summary = &manager.devices()[0];
    assert_eq!(summary.handle, 2);
    assert_eq!(summary.vendor_slot, Some(0));
    assert!(summary.guid.is_vendor_specific());

    // Asked again on rescan; still failing.
    let again = manager.refresh().unwrap();
    assert_eq!(
        again.rejected,
        vec![(DeviceHandle(1), RejectReason::CapabilitiesUnavailable)]
    );
}

#[test]
fn device_recovers_once_capabilities_become_readable() {
    let (platform, manager) = setup(vec![flight_stick(1).with_caps_failure()]);
    assert_eq!(manager.device_count(), 0);

    let event = platform.push_report(DeviceHandle(1), &MockReport::new().press(PAGE_BUTTON, 1));
    assert_eq!(
        manager.process_event(event),
        Err(JoystickError::DeviceRejected {
            handle: DeviceHandle(1),
            reason: RejectReason::CapabilitiesUnavailable,
        })
    );

    platform.set_caps_fail(DeviceHandle(1), false);
    let summary = manager.refresh().unwrap();
    assert_eq!(summary.added, vec![DeviceHandle(1)]);
    assert_eq!(manager.device_count(), 1);

    let event = platform.push_report(DeviceHandle(1), &MockReport::new().press(PAGE_BUTTON, 1));
    assert_eq!(manager.process_event(event), Ok(EventOutcome::Decoded));
    assert!(manager.state(0).button(0));
}

#[test]
fn ranged_value_collection_is_skipped() {
    let ranged = ValueCap {
        report_id: 0,
        usage_page: PAGE_GENERIC_DESKTOP,
        usage: CapUsage::Range {
            min: USAGE_GD_Y,
            max: USAGE_GD_Z,
        },
        link_collection: 0,
        logical_min: 0,
        logical_max: 255,
        bit_size: 8,
        is_alias: false,
    };
    let (platform, manager) = setup(vec![MockDevice::joystick(DeviceHandle(1), 1, 2)
        .with_value_cap(ranged)
        .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0, 255)]);

    assert_eq!(manager.capabilities(0).axis_count, 1);
    let event = platform.push_report(
        DeviceHandle(1),
        &MockReport::new()
            .value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 255)
            .value(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 0),
    );
    assert_eq!(manager.process_event(event), Ok(EventOutcome::Decoded));
    assert_eq!(manager.state(0).axes, vec![i16::MAX]);
}

#[test]
fn rejection_reasons_are_reported() {
    let platform = MockPlatform::new();
    let wide = (0..8).fold(MockDevice::joystick(DeviceHandle(1), 1, 1), |d, i| {
        d.with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_X + i, 0, 255)
    });
    platform.plug(wide);
    let manager = Manager::without_vendor(
        platform.clone(),
        ManagerConfig {
            max_axes: 8,
            ..ManagerConfig::default()
        },
    );
    assert_eq!(manager.device_count(), 0);

    platform.plug(flight_stick(9).with_caps_failure());
    let summary = manager.refresh().unwrap();
    assert_eq!(
        summary.rejected,
        vec![(DeviceHandle(9), RejectReason::CapabilitiesUnavailable)]
    );
}

#[test]
fn grown_preparsed_blob_is_still_decoded() {
    let (platform, manager) = setup(vec![MockDevice::joystick(DeviceHandle(1), 1, 2)
        .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_Z, 0, 255)]);
    platform.set_blob_padding(DeviceHandle(1), 4096);
    let report = MockReport::new().value(PAGE_GENERIC_DESKTOP, USAGE_GD_Z, 255);
    let event = platform.push_report(DeviceHandle(1), &report);
    assert_eq!(manager.process_event(event), Ok(EventOutcome::Decoded));
    assert_eq!(manager.state(0).axis(0), i16::MAX);
}

#[test]
fn polling_from_another_thread_sees_whole_updates() {
    let (platform, manager) = setup(vec![flight_stick(1)]);
    let manager = std::sync::Arc::new(manager);

    let poller = {
        let manager = manager.clone();
        std::thread::spawn(move || {
            for _ in 0..500 {
                let buttons = manager.state(0).buttons;
                // Reports alternate between "1 and 2" and "3 only".
                let ok = buttons == [false, false, false]
                    || buttons == [true, true, false]
                    || buttons == [false, false, true];
                assert!(ok, "torn state: {buttons:?}");
            }
        })
    };

    for i in 0..500 {
        let report = if i % 2 == 0 {
            MockReport::new().press(PAGE_BUTTON, 1).press(PAGE_BUTTON, 2)
        } else {
            MockReport::new().press(PAGE_BUTTON, 3)
        };
        let event = platform.push_report(DeviceHandle(1), &report);
        manager.process_event(event).unwrap();
    }
    poller.join().unwrap();
}
