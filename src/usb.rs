//! Implements the USB device and tasks for transporting HID reports in both
//! directions: outgoing gamepad/keyboard reports from the control cycle, and
//! incoming lighting frames from the host. Mostly lifted from [embassy_usb]
//! examples.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::LED_COUNT;
use crate::report::{
    MAX_REPORT_BYTES, REPORT_ID_JOYSTICK, REPORT_ID_KEYBOARD, REPORT_ID_LIGHTS,
};
use crate::{LIGHTS_MAILBOX, REPORT_CHANNEL};

use defmt::{info, warn};
use embassy_futures::join::join;
use embassy_rp::{
    bind_interrupts,
    peripherals::USB,
    usb::{Driver, InterruptHandler},
};
use embassy_time::Instant;
use embassy_usb::{
    class::hid::{HidReaderWriter, ReportId, RequestHandler, State as HidState},
    control::OutResponse,
    Builder, Handler, UsbDevice,
};

use static_cell::StaticCell;

/// Lighting frames arrive as report id + one byte per LED.
const LIGHTS_FRAME_BYTES: usize = 1 + LED_COUNT;

type MyDriver = Driver<'static, USB>;
type MyUsbDevice = UsbDevice<'static, MyDriver>;
type MyHidReaderWriter = HidReaderWriter<'static, MyDriver, LIGHTS_FRAME_BYTES, MAX_REPORT_BYTES>;

bind_interrupts!(pub(crate) struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

/// HID report descriptor covering all three numbered reports. The device
/// always advertises the whole set; the mode latched at boot just decides
/// which input report actually gets sent.
#[rustfmt::skip]
const REPORT_DESCRIPTOR: &[u8] = &[
    // Gamepad: 16 button bits and two axes we always report as zero, plus
    // the LED output frame the host writes back.
    0x05, 0x01,                  // Usage Page (Generic Desktop)
    0x09, 0x05,                  // Usage (Gamepad)
    0xA1, 0x01,                  // Collection (Application)
    0x85, REPORT_ID_JOYSTICK,    //   Report ID (1)
    0x05, 0x09,                  //   Usage Page (Button)
    0x19, 0x01,                  //   Usage Minimum (Button 1)
    0x29, 0x10,                  //   Usage Maximum (Button 16)
    0x15, 0x00,                  //   Logical Minimum (0)
    0x25, 0x01,                  //   Logical Maximum (1)
    0x95, 0x10,                  //   Report Count (16)
    0x75, 0x01,                  //   Report Size (1)
    0x81, 0x02,                  //   Input (Data,Var,Abs)
    0x05, 0x01,                  //   Usage Page (Generic Desktop)
    0x09, 0x30,                  //   Usage (X)
    0x09, 0x31,                  //   Usage (Y)
    0x15, 0x00,                  //   Logical Minimum (0)
    0x26, 0xFF, 0x00,            //   Logical Maximum (255)
    0x95, 0x02,                  //   Report Count (2)
    0x75, 0x08,                  //   Report Size (8)
    0x81, 0x02,                  //   Input (Data,Var,Abs)
    0x85, REPORT_ID_LIGHTS,      //   Report ID (2)
    0x05, 0x08,                  //   Usage Page (LEDs)
    0x19, 0x01,                  //   Usage Minimum (1)
    0x29, LED_COUNT as u8,       //   Usage Maximum (one per LED)
    0x15, 0x00,                  //   Logical Minimum (0)
    0x25, 0x01,                  //   Logical Maximum (1)
    0x95, LED_COUNT as u8,       //   Report Count (one byte per LED)
    0x75, 0x08,                  //   Report Size (8)
    0x91, 0x02,                  //   Output (Data,Var,Abs)
    0xC0,                        // End Collection

    // NKRO keyboard: modifier byte, then one bit per usage 0x00..=0xF7.
    0x05, 0x01,                  // Usage Page (Generic Desktop)
    0x09, 0x06,                  // Usage (Keyboard)
    0xA1, 0x01,                  // Collection (Application)
    0x85, REPORT_ID_KEYBOARD,    //   Report ID (3)
    0x05, 0x07,                  //   Usage Page (Kbrd/Keypad)
    0x19, 0xE0,                  //   Usage Minimum (Left Control)
    0x29, 0xE7,                  //   Usage Maximum (Right GUI)
    0x15, 0x00,                  //   Logical Minimum (0)
    0x25, 0x01,                  //   Logical Maximum (1)
    0x95, 0x08,                  //   Report Count (8)
    0x75, 0x01,                  //   Report Size (1)
    0x81, 0x02,                  //   Input (Data,Var,Abs)
    0x05, 0x07,                  //   Usage Page (Kbrd/Keypad)
    0x19, 0x00,                  //   Usage Minimum (0)
    0x29, 0xF7,                  //   Usage Maximum (247)
    0x15, 0x00,                  //   Logical Minimum (0)
    0x25, 0x01,                  //   Logical Maximum (1)
    0x96, 0xF8, 0x00,            //   Report Count (248)
    0x75, 0x01,                  //   Report Size (1)
    0x81, 0x02,                  //   Input (Data,Var,Abs)
    0xC0,                        // End Collection
];

pub fn get_device(driver: MyDriver) -> (MyUsbDevice, MyHidReaderWriter) {
    let mut config = embassy_usb::Config::new(0xcafe, 0x4005);
    config.manufacturer = Some("Homebrew");
    config.product = Some("Pico Arcade Controller");
    config.serial_number = Some("001");
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    static DEVICE_HANDLER: StaticCell<MyDeviceHandler> = StaticCell::new();

    // Create embassy-usb DeviceBuilder using the driver and config.
    static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
    let mut builder = Builder::new(
        driver,
        config,
        &mut CONFIG_DESC.init([0; 256])[..],
        &mut BOS_DESC.init([0; 256])[..],
        &mut [], // no msos descriptors
        &mut CONTROL_BUF.init([0; 128])[..],
    );

    static STATE: StaticCell<HidState> = StaticCell::new();

    builder.handler(DEVICE_HANDLER.init(MyDeviceHandler::new()));

    // Create the HID class on the builder.
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: 64,
    };
    let hid = MyHidReaderWriter::new(&mut builder, STATE.init(HidState::new()), config);

    (builder.build(), hid)
}

#[embassy_executor::task]
pub async fn run(mut usb: MyUsbDevice, hid: MyHidReaderWriter) {
    // Run the USB device.
    let usb_fut = usb.run();

    let (reader, mut writer) = hid.split();

    // Drain the report channel into the interrupt IN endpoint. The channel
    // holds at most one report, so a slow host simply makes the control
    // cycle skip emissions rather than pile them up.
    let in_fut = async {
        let mut buf = [0u8; MAX_REPORT_BYTES];
        loop {
            let report = REPORT_CHANNEL.receive().await;
            let len = report.serialize(&mut buf);
            if let Err(e) = writer.write(&buf[..len]).await {
                warn!("failed to send report: {:?}", e);
            }
        }
    };

    let out_fut = async {
        static REQUEST_HANDLER: StaticCell<LightsRequestHandler> = StaticCell::new();
        reader
            .run(true, REQUEST_HANDLER.init(LightsRequestHandler {}))
            .await;
    };

    // Run everything concurrently.
    join(usb_fut, join(in_fut, out_fut)).await;
}

struct LightsRequestHandler;

impl RequestHandler for LightsRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        if let ReportId::Out(REPORT_ID_LIGHTS) = id {
            // Interrupt OUT transfers still carry the report id up front;
            // control-pipe writes arrive without it.
            let payload = match data.split_first() {
                Some((&REPORT_ID_LIGHTS, rest)) => rest,
                _ => data,
            };
            if payload.len() >= LED_COUNT {
                let mut frame = [0u8; LED_COUNT];
                frame.copy_from_slice(&payload[..LED_COUNT]);
                LIGHTS_MAILBOX.signal((frame, Instant::now().as_micros()));
            }
        }
        // Anything else (wrong id, short frame) is ignored, not an error.
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _dur: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

struct MyDeviceHandler {
    configured: AtomicBool,
}

impl MyDeviceHandler {
    fn new() -> Self {
        MyDeviceHandler {
            configured: AtomicBool::new(false),
        }
    }
}

impl Handler for MyDeviceHandler {
    fn enabled(&mut self, enabled: bool) {
        self.configured.store(false, Ordering::Relaxed);
        info!("device enabled: {}", enabled);
    }

    fn reset(&mut self) {
        self.configured.store(false, Ordering::Relaxed);
        info!("bus reset");
    }

    fn addressed(&mut self, addr: u8) {
        self.configured.store(false, Ordering::Relaxed);
        info!("usb address set to {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        self.configured.store(configured, Ordering::Relaxed);
        info!("device configured: {}", configured);
    }
}
