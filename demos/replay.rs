//! Replay a scripted session against the in-memory platform and print each
//! decoded state. Handy for checking classification and scaling rules without
//! hardware.
//!
//! ```text
//! RUST_LOG=rawstick=trace cargo run --example replay
//! ```

use rawstick::backends::mock::{MockDevice, MockPlatform, MockReport};
use rawstick::classify::{
    PAGE_BUTTON, PAGE_GENERIC_DESKTOP, PAGE_SIMULATION, USAGE_GD_HATSWITCH, USAGE_GD_RZ,
    USAGE_GD_X, USAGE_GD_Y, USAGE_SIM_RUDDER,
};
use rawstick::{DeviceHandle, Manager, ManagerConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rawstick=debug")),
        )
        .init();

    let stick = DeviceHandle(0x10);
    let pedals = DeviceHandle(0x20);

    let platform = MockPlatform::new();
    platform.plug(
        MockDevice::joystick(stick, 0x044f, 0xb10a)
            .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 0, 1023)
            .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 0, 1023)
            .with_axis(PAGE_GENERIC_DESKTOP, USAGE_GD_RZ, -128, 127)
            .with_hat(7)
            .with_buttons(12),
    );

    let manager = Manager::without_vendor(platform.clone(), ManagerConfig::default());

    let script = [
        (
            stick,
            MockReport::new()
                .value(PAGE_GENERIC_DESKTOP, USAGE_GD_X, 512)
                .value(PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 512),
        ),
        (
            stick,
            MockReport::new()
                .value(PAGE_GENERIC_DESKTOP, USAGE_GD_RZ, 0x80)
                .press(PAGE_BUTTON, 1),
        ),
        (
            stick,
            MockReport::new()
                .value(PAGE_GENERIC_DESKTOP, USAGE_GD_HATSWITCH, 2)
                .press(PAGE_BUTTON, 12),
        ),
        // Unknown until the rescan triggered by its first report.
        (pedals, MockReport::new().value(PAGE_SIMULATION, USAGE_SIM_RUDDER, 255)),
    ];

    for (step, (device, report)) in script.into_iter().enumerate() {
        if device == pedals {
            platform.plug(
                MockDevice::joystick(pedals, 0x231d, 0x011f)
                    .with_axis(PAGE_SIMULATION, USAGE_SIM_RUDDER, 0, 255),
            );
        }
        let event = platform.push_report(device, &report);
        let outcome = manager.process_event(event);
        println!("step {step}: {:#x} -> {outcome:?}", device.0);
        for index in 0..manager.device_count() {
            let state = manager.state(index);
            let pressed: Vec<usize> =
                (0..state.buttons.len()).filter(|&b| state.button(b)).collect();
            println!(
                "  [{index}] {:<28} axes={:?} hats={:?} pressed={pressed:?}",
                manager.name(index),
                state.axes,
                state.hats,
            );
        }
    }
}
