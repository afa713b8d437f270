//! Firmware for a 9-switch arcade controller based on the Raspberry Pi Pico,
//! using the [embassy_rp] framework. Presents itself over USB as either a
//! gamepad or an NKRO keyboard depending on a boot-time strap, and drives the
//! per-switch LEDs from host lighting data with a reactive fallback.

#![no_main]
#![no_std]

mod config;
mod lights;
mod mode;
mod report;
mod scan;
mod usb;

use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_sync::{channel::Channel, signal::Signal};
use embassy_time::{Duration, Instant, Ticker};

use defmt_rtt as _;
use panic_reset as _;

use crate::lights::Lights;
use crate::mode::Mode;
use crate::report::{GamepadReport, NkroReport, Report};
use crate::scan::Switches;

macro_rules! switch_pins {
    ($dev:ident; $($pin:ident),*) => {[ $(Input::new($dev.$pin, Pull::Up)),* ]}
}
macro_rules! led_pins {
    ($dev:ident; $($pin:ident),*) => {[ $(Output::new($dev.$pin, Level::Low)),* ]}
}

/// Channel for the control cycle to hand reports to [usb], and ultimately to
/// the host. Capacity 1 plus `try_send` is the back-pressure contract: a
/// cycle that finds the transport still busy drops its report, never queues.
pub(crate) static REPORT_CHANNEL: Channel<RawMutex, Report, 1> = Channel::new();

/// Single-slot mailbox for host lighting frames going the other way, each
/// stamped with its arrival time. The latest fully-written frame wins; the
/// control cycle only ever observes whole frames.
pub(crate) static LIGHTS_MAILBOX: Signal<RawMutex, LightsFrame> = Signal::new();

type RawMutex = embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
/// A host lighting frame plus its arrival time in µs.
pub(crate) type LightsFrame = ([u8; config::LED_COUNT], u64);

/// How often the control cycle runs.
const CYCLE_PERIOD: Duration = Duration::from_micros(250);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    // On-board LED signals power/ready once we get this far.
    let onboard_led = Output::new(p.PIN_25, Level::High);

    let switch_pins: [Input; config::SWITCH_COUNT] = switch_pins!(p;
        PIN_16, PIN_17, PIN_27, PIN_20, PIN_19, PIN_18, PIN_21, PIN_26, PIN_22
    );
    let led_pins: [Output; config::LED_COUNT] = led_pins!(p;
        PIN_8, PIN_7, PIN_6, PIN_9, PIN_5, PIN_4, PIN_3, PIN_2, PIN_10
    );

    // Switch 0 doubles as a boot strap: held while plugging in selects
    // keyboard mode. Raw level on purpose, there is nothing to debounce yet.
    let mode = Mode::from_strap(switch_pins[0].is_low());
    info!("controller up, {} mode", mode);

    spawner
        .spawn(run_controller(mode, switch_pins, led_pins, onboard_led))
        .expect("spawn controller");

    let usb_driver = embassy_rp::usb::Driver::new(p.USB, usb::Irqs);
    let (usb_device, hid) = usb::get_device(usb_driver);
    spawner.spawn(usb::run(usb_device, hid)).expect("spawn usb");
}

/// The control cycle: sample switches, encode a report for the latched mode,
/// offer it to the transport, then bring the LEDs up to date. Strictly
/// sequential; the USB task is the only other actor and talks to us through
/// [REPORT_CHANNEL] and [LIGHTS_MAILBOX] alone.
#[embassy_executor::task]
async fn run_controller(
    mode: Mode,
    switch_pins: [Input<'static>; config::SWITCH_COUNT],
    mut led_pins: [Output<'static>; config::LED_COUNT],
    _onboard_led: Output<'static>,
) {
    let mut switches = Switches::new();
    let mut lights = Lights::new(Instant::now().as_micros());
    let mut ticker = Ticker::every(CYCLE_PERIOD);

    loop {
        let now = Instant::now().as_micros();

        let mut raw = [false; config::SWITCH_COUNT];
        for (level, pin) in raw.iter_mut().zip(&switch_pins) {
            *level = pin.is_high();
        }
        switches.sample(raw, now);

        let outgoing = match mode {
            Mode::Gamepad => Report::Gamepad(GamepadReport::encode(switches.debounced())),
            Mode::Keyboard => {
                Report::Keyboard(NkroReport::encode(switches.debounced(), &config::SW_KEYCODE))
            }
        };
        // Transport busy means this cycle's report is skipped, not queued.
        let _ = REPORT_CHANNEL.try_send(outgoing);

        if let Some((frame, arrived_at)) = LIGHTS_MAILBOX.try_take() {
            lights.receive(&frame, arrived_at);
        }
        for (pin, lit) in led_pins
            .iter_mut()
            .zip(lights.refresh(switches.debounced(), now))
        {
            if lit {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }

        ticker.next().await;
    }
}
