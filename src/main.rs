use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::runtime;
use tokio::time::sleep;

use simplisafe_rf::devices::components::SensorSetting;
use simplisafe_rf::devices::keypad::{KeypadView, Page};
use simplisafe_rf::devices::{
    AlertKind, BaseStation, ComponentConfig, ComponentSetting, DeviceType, EntrySensor, Keypad,
    KeypadHooks, StationConfig, StationHooks,
};
use simplisafe_rf::protocol::{AddComponentKind, Pin, SerialNumber, StationSerial};
use simplisafe_rf::radio::medium::{Medium, Radio};
use simplisafe_rf::radio::{Transceiver, TransceiverConfig};

// Pin assignments as wired on the reference receiver/transmitter boards.
const STATION_RX_433MHZ_GPIO: u8 = 27;
const STATION_TX_315MHZ_GPIO: u8 = 16;
const KEYPAD_RX_315MHZ_GPIO: u8 = 22;
const KEYPAD_TX_433MHZ_GPIO: u8 = 20;
const SENSOR_TX_433MHZ_GPIO: u8 = 17;

const STATION_SN: &str = "123456";
const KEYPAD_SN: &str = "167JC";
const DOOR_SN: &str = "1R9CL";

struct ConsoleStation;

impl StationHooks for ConsoleStation {
    fn alarm(&self) {
        warn!("station: ALARM");
    }

    fn alert(&self, kind: AlertKind, subject: Option<&SerialNumber>) {
        match subject {
            Some(sn) => warn!("station alert: {} ({})", kind, sn),
            None => warn!("station alert: {}", kind),
        }
    }

    fn arm_away(&self) {
        info!("station: armed away");
    }

    fn arm_home(&self) {
        info!("station: armed home");
    }

    fn disarm(&self) {
        info!("station: disarmed");
    }

    fn door_chime(&self) {
        info!("station: door chime");
    }

    fn start_siren(&self) {
        warn!("station: siren on");
    }

    fn stop_siren(&self) {
        info!("station: siren off");
    }
}

struct ConsoleKeypad;

impl KeypadHooks for ConsoleKeypad {
    fn display(&self, view: &KeypadView) {
        let line = match view.page {
            Page::Boot => "Welcome to SimpliSafe".to_string(),
            Page::AlarmStatus => match view.menu {
                Some(item) => format!("Menu: {:?}", item),
                None if view.time_left > 0 => {
                    format!("Alarm {:?} in {}s", view.mode, view.time_left)
                }
                None => format!(
                    "Alarm {:?}  {}",
                    view.mode,
                    chrono::Local::now().format("%a %_d %b %H:%M")
                ),
            },
            Page::EnterDisarmPin | Page::EnterMenuPin => {
                format!("Enter Pin:{:_<4}", "*".repeat(view.entry_buffer.len()))
            }
            Page::SensorError => match &view.sensor_error {
                Some(sn) => format!("Error:Sensor {}", sn),
                None => "Error:Sensor".to_string(),
            },
        };
        info!("keypad display: {}", line);
    }

    fn backlight(&self, on: bool) {
        debug!("keypad backlight {}", if on { "on" } else { "off" });
    }

    fn button_beep(&self) {
        debug!("keypad: beep");
    }

    fn warning_beep(&self) {
        debug!("keypad: warning beep");
    }
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rt = runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .thread_name_fn(|| {
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
            format!("simplisafe-worker-{}", id)
        })
        .build()
        .expect("unable to build tokio runtime");

    rt.block_on(demo())
}

/// Walks a base station, a keypad and a door sensor through an arm, trip,
/// alarm, disarm and enrollment cycle over an in-process pair of bands.
/// With real radio hardware, the `Radio` endpoints are replaced by a
/// `RawIo` implementation over the GPIO driver.
async fn demo() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Components transmit at 433 MHz; the station answers at 315 MHz.
    let uplink = Medium::new();
    let downlink = Medium::new();

    let station_txr = Transceiver::new(
        Arc::new(Radio::new(Some(uplink.clone()), Some(downlink.clone()))?),
        TransceiverConfig {
            rx_pin: Some(STATION_RX_433MHZ_GPIO),
            tx_pin: Some(STATION_TX_315MHZ_GPIO),
        },
    )?;

    let mut config = StationConfig::new(StationSerial::new(STATION_SN)?, Pin::new("1234")?);
    config.duress_pin = Some(Pin::new("9999")?);
    config.components = vec![
        ComponentConfig {
            name: "Master Bedroom".into(),
            device_type: DeviceType::Keypad,
            sn: SerialNumber::new(KEYPAD_SN)?,
            setting: None,
            instant_trip: None,
        },
        ComponentConfig {
            name: "Garage Door".into(),
            device_type: DeviceType::EntrySensor,
            sn: SerialNumber::new(DOOR_SN)?,
            setting: Some(ComponentSetting::EntrySensor(SensorSetting::AlarmHomeAndAway)),
            instant_trip: None,
        },
    ];
    let mut station = BaseStation::new(station_txr, config, Arc::new(ConsoleStation))?;
    tokio::spawn(async move {
        if let Err(e) = station.run().await {
            warn!("station stopped: {}", e);
        }
    });

    let keypad_txr = Transceiver::new(
        Arc::new(Radio::new(Some(downlink), Some(uplink.clone()))?),
        TransceiverConfig {
            rx_pin: Some(KEYPAD_RX_315MHZ_GPIO),
            tx_pin: Some(KEYPAD_TX_433MHZ_GPIO),
        },
    )?;
    let (mut keypad, buttons) = Keypad::new(
        keypad_txr,
        SerialNumber::new(KEYPAD_SN)?,
        Arc::new(ConsoleKeypad),
    );
    tokio::spawn(async move {
        if let Err(e) = keypad.run().await {
            warn!("keypad stopped: {}", e);
        }
    });

    let door_txr = Transceiver::new(
        Arc::new(Radio::new(None, Some(uplink))?),
        TransceiverConfig {
            rx_pin: None,
            tx_pin: Some(SENSOR_TX_433MHZ_GPIO),
        },
    )?;
    let mut door = EntrySensor::new(door_txr, SerialNumber::new(DOOR_SN)?);

    sleep(Duration::from_secs(2)).await;
    info!("--- arming home from the keypad");
    buttons.home();

    sleep(Duration::from_secs(2)).await;
    info!("--- opening the garage door (1 second entry delay in home mode)");
    door.open();

    sleep(Duration::from_secs(4)).await;
    info!("--- disarming with the master PIN");
    for digit in [1, 2, 3, 4] {
        buttons.numpad(digit);
    }

    sleep(Duration::from_secs(2)).await;
    info!("--- enrolling a motion sensor through the menu");
    buttons.menu();
    sleep(Duration::from_secs(1)).await;
    for digit in [1, 2, 3, 4] {
        buttons.numpad(digit);
    }
    sleep(Duration::from_secs(1)).await;
    buttons.enroll_component(AddComponentKind::MotionSensor, SerialNumber::new("1C3BH")?);

    sleep(Duration::from_secs(3)).await;
    door.close();
    sleep(Duration::from_secs(5)).await;
    info!("demo finished");
    Ok(())
}
