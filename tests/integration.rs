//! Drives the pure controller core through boot/press/lighting scenarios end
//! to end over simulated time, the way the firmware's control cycle does.

use pico_arcade_controller_lib::config::{
    DEBOUNCE_WINDOW_US, LED_COUNT, REACTIVE_TIMEOUT_US, SW_KEYCODE, SWITCH_COUNT,
};
use pico_arcade_controller_lib::lights::Lights;
use pico_arcade_controller_lib::mode::Mode;
use pico_arcade_controller_lib::report::{
    GamepadReport, NkroReport, Report, MAX_REPORT_BYTES, REPORT_ID_KEYBOARD,
};
use pico_arcade_controller_lib::scan::Switches;

/// Cadence the firmware samples at.
const CYCLE_US: u64 = 250;

fn levels(pressed: &[usize]) -> [bool; SWITCH_COUNT] {
    let mut raw = [true; SWITCH_COUNT]; // pull-ups idle high
    for &i in pressed {
        raw[i] = false;
    }
    raw
}

#[test]
fn gamepad_press_and_early_release_scenario() {
    // Switch 0 reads high at boot, so the strap selects gamepad mode.
    let mode = Mode::from_strap(false);
    assert_eq!(mode, Mode::Gamepad);

    let mut switches = Switches::new();
    let mut now = 0u64;

    // Held for 5000µs: bit 3 must appear exactly once the window elapses.
    let press_start = now;
    let mut seen_bit3 = false;
    while now < press_start + 5_000 {
        switches.sample(levels(&[3]), now);
        let report = GamepadReport::encode(switches.debounced());
        if report.buttons & (1 << 3) != 0 {
            assert!(now - press_start >= DEBOUNCE_WINDOW_US);
            seen_bit3 = true;
        }
        now += CYCLE_US;
    }
    assert!(seen_bit3);

    // Released, then pressed again but let go before the window elapses:
    // bit 3 must never set.
    switches.sample(levels(&[]), now);
    now += CYCLE_US;
    let press_start = now;
    while now < press_start + 3_750 {
        switches.sample(levels(&[3]), now);
        let report = GamepadReport::encode(switches.debounced());
        assert_eq!(report.buttons & (1 << 3), 0);
        now += CYCLE_US;
    }
    switches.sample(levels(&[]), now);
    assert_eq!(GamepadReport::encode(switches.debounced()).buttons, 0);
}

#[test]
fn keyboard_mode_scenario() {
    // Switch 0 held at boot straps us into keyboard mode.
    let mode = Mode::from_strap(true);
    assert_eq!(mode, Mode::Keyboard);

    let mut switches = Switches::new();
    switches.sample(levels(&[0]), 0);
    switches.sample(levels(&[0]), DEBOUNCE_WINDOW_US);

    let outgoing = Report::Keyboard(NkroReport::encode(switches.debounced(), &SW_KEYCODE));
    let mut buf = [0u8; MAX_REPORT_BYTES];
    let len = outgoing.serialize(&mut buf);
    assert_eq!(len, MAX_REPORT_BYTES);
    assert_eq!(buf[0], REPORT_ID_KEYBOARD);

    // Switch 0 types "d" (usage 0x07): bitmap byte 1, bit 7.
    assert_eq!(buf[1 + 0x07 / 8 + 1], 1 << (0x07 % 8));
    let ones: u32 = buf[1..].iter().map(|b| b.count_ones()).sum();
    assert_eq!(ones, 1);
}

#[test]
fn lighting_command_then_reactive_fallback_scenario() {
    let mut switches = Switches::new();
    let mut lights = Lights::new(0);

    let mut frame = [0u8; LED_COUNT];
    frame[0] = 1;
    lights.receive(&frame, 10_000);

    // Indicator 0 lit, others off, for as long as the frame stays fresh.
    let shown = lights.refresh(switches.debounced(), 10_250);
    assert!(shown[0]);
    assert!(shown[1..].iter().all(|&l| !l));
    let shown = lights.refresh(switches.debounced(), 10_000 + REACTIVE_TIMEOUT_US - 1);
    assert!(shown[0]);

    // Host goes quiet with switch 0 physically held: indicator 0 stays lit
    // through the reactive fallback, the rest follow their own switches.
    switches.sample(levels(&[0]), 500_000);
    switches.sample(levels(&[0]), 1_010_000);
    let shown = lights.refresh(switches.debounced(), 10_000 + REACTIVE_TIMEOUT_US);
    assert!(shown[0]);
    assert!(shown[1..].iter().all(|&l| !l));
}
