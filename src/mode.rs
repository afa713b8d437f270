//! Boot-time choice between the two report flavours the controller can
//! present. Switch 0 doubles as a strap pin: held down while plugging in
//! selects keyboard mode, left alone gives gamepad mode. The value is
//! latched once in `main` and never changes until the next power cycle.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Gamepad,
    Keyboard,
}

impl Mode {
    /// `pressed` is the raw level of switch 0 at startup, already inverted to
    /// pressed semantics. Straps bypass debounce; there is nothing to bounce
    /// against this early.
    pub fn from_strap(pressed: bool) -> Self {
        if pressed {
            Mode::Keyboard
        } else {
            Mode::Gamepad
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_strap_selects_gamepad() {
        assert_eq!(Mode::from_strap(false), Mode::Gamepad);
    }

    #[test]
    fn held_strap_selects_keyboard() {
        assert_eq!(Mode::from_strap(true), Mode::Keyboard);
    }
}
