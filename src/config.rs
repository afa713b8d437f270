//! Static configuration for the controller build: switch/LED counts, timing
//! windows and the switch-to-keycode table. Pin assignment lives with the
//! hardware setup in `main`, as two parallel arrays matching these counts.

/// How many switches the board has
pub const SWITCH_COUNT: usize = 9;
/// How many indicator LEDs the board has
pub const LED_COUNT: usize = 9;

/// Hold-off after a switch press edge before its level is trusted, in µs.
pub const DEBOUNCE_WINDOW_US: u64 = 4_000;

/// How long host lighting data stays authoritative before the LEDs fall back
/// to mirroring the switches, in µs.
pub const REACTIVE_TIMEOUT_US: u64 = 1_000_000;

// HID keyboard usage IDs for the keys this board can emit.
const KEY_A: u8 = 0x04;
const KEY_B: u8 = 0x05;
const KEY_C: u8 = 0x06;
const KEY_D: u8 = 0x07;
const KEY_F: u8 = 0x09;
const KEY_J: u8 = 0x0d;
const KEY_K: u8 = 0x0e;
const KEY_M: u8 = 0x10;
const KEY_1: u8 = 0x1e;

/// What each switch types in keyboard mode, by switch index.
pub const SW_KEYCODE: [u8; SWITCH_COUNT] = [
    KEY_D, KEY_F, KEY_J, KEY_K, KEY_C, KEY_M, KEY_A, KEY_B, KEY_1,
];

// Reactive lighting pairs LED i with switch i, so the counts must agree.
const _: () = assert!(LED_COUNT == SWITCH_COUNT);
