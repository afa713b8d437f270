//! Builds the outgoing HID reports from the debounced switch state. Two
//! flavours exist, selected once at boot by [crate::mode::Mode]: a gamepad
//! report with one button bit per switch, and an NKRO keyboard report that
//! packs one bit per possible keycode. Encoding is pure; actually handing
//! the bytes to the USB writer is [crate::usb]'s problem.

use crate::config::SWITCH_COUNT;

pub const REPORT_ID_JOYSTICK: u8 = 1;
pub const REPORT_ID_LIGHTS: u8 = 2;
pub const REPORT_ID_KEYBOARD: u8 = 3;

/// Size of the NKRO bitmap: byte 0 holds the modifiers, bytes 1..=31 cover
/// keycodes 0..=247 one bit each.
pub const NKRO_BYTES: usize = 32;

/// HID usage range for the modifier keys, which live in byte 0 rather than
/// the bitmap proper.
const MODIFIER_MIN: u8 = 240;
const MODIFIER_MAX: u8 = 247;

/// Largest serialized report: report id + NKRO bitmap.
pub const MAX_REPORT_BYTES: usize = 1 + NKRO_BYTES;

/// Gamepad flavour: a button bitmask plus two axis bytes we always report
/// as zero (the descriptor advertises X/Y, the hardware has none).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GamepadReport {
    pub buttons: u16,
    pub joy0: u8,
    pub joy1: u8,
}

impl GamepadReport {
    /// Walks the switches from the highest index down while left-shifting,
    /// which lands switch 0 in bit 0. The host-side button mapping depends
    /// on exactly this ordering, so don't tidy it.
    pub fn encode(pressed: &[bool; SWITCH_COUNT]) -> Self {
        let mut buttons: u16 = 0;
        for &down in pressed.iter().rev() {
            buttons = (buttons << 1) | down as u16;
        }
        GamepadReport {
            buttons,
            joy0: 0,
            joy1: 0,
        }
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        let [lo, hi] = self.buttons.to_le_bytes();
        [lo, hi, self.joy0, self.joy1]
    }
}

/// Keyboard flavour: bit-packed array addressed by keycode value, so any
/// combination of keys is representable (n-key roll-over).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NkroReport([u8; NKRO_BYTES]);

impl NkroReport {
    /// `keycodes` maps switch index to HID usage. Modifier usages set their
    /// bit in byte 0; anything whose computed byte falls outside the bitmap
    /// contributes nothing rather than failing.
    pub fn encode(pressed: &[bool; SWITCH_COUNT], keycodes: &[u8; SWITCH_COUNT]) -> Self {
        let mut bytes = [0u8; NKRO_BYTES];
        for (&down, &code) in pressed.iter().zip(keycodes) {
            if !down {
                continue;
            }
            let bit = 1 << (code % 8);
            if (MODIFIER_MIN..=MODIFIER_MAX).contains(&code) {
                bytes[0] |= bit;
            } else {
                let byte = code as usize / 8 + 1;
                if (1..NKRO_BYTES).contains(&byte) {
                    bytes[byte] |= bit;
                }
            }
        }
        NkroReport(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NKRO_BYTES] {
        &self.0
    }
}

/// One cycle's outgoing report, whichever mode produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Report {
    Gamepad(GamepadReport),
    Keyboard(NkroReport),
}

impl Report {
    pub fn report_id(&self) -> u8 {
        match self {
            Report::Gamepad(_) => REPORT_ID_JOYSTICK,
            Report::Keyboard(_) => REPORT_ID_KEYBOARD,
        }
    }

    /// Writes report id + payload into `buf` and returns the byte count.
    pub fn serialize(&self, buf: &mut [u8; MAX_REPORT_BYTES]) -> usize {
        buf[0] = self.report_id();
        match self {
            Report::Gamepad(r) => {
                buf[1..5].copy_from_slice(&r.as_bytes());
                5
            }
            Report::Keyboard(r) => {
                buf[1..1 + NKRO_BYTES].copy_from_slice(r.as_bytes());
                1 + NKRO_BYTES
            }
        }
    }
}
