use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::protocol::{
    ArmedStatus, ComponentType, EntrySensorStatus, KeypadEvent, KeypadMessage, Message, Pin,
    SerialNumber, StationEvent,
};
use crate::protocol::AddComponentKind;
use crate::radio::{DriverError, Transceiver};

use super::timer::{Scheduler, TimerHandle};

/// Backlight stays on this long after a button press or status change.
const BACKLIGHT_TIMEOUT: Duration = Duration::from_secs(20);

/// Idle window for PIN entry after the station opens the menu.
const MENU_PIN_TIMEOUT: Duration = Duration::from_secs(5);

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

const PIN_LENGTH: usize = 4;

/// Host integration points for keypad UI; all default to no-ops.
pub trait KeypadHooks: Send + Sync {
    fn backlight(&self, _on: bool) {}
    fn display(&self, _view: &KeypadView) {}
    fn button_beep(&self) {}
    fn warning_beep(&self) {}
}

impl KeypadHooks for () {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Boot,
    AlarmStatus,
    EnterDisarmPin,
    EnterMenuPin,
    SensorError,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Off,
    Away,
    Home,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    ChangePin,
    DialingPrefix,
    AddComponent,
    RemoveComponent,
    Test,
    ExitMenu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddComponentPage {
    EntrySensor,
    MotionSensor,
    PanicButton,
    Keypad,
    KeychainRemote,
    GlassbreakSensor,
    CoDetector,
    SmokeDetector,
    WaterSensor,
    FreezeSensor,
}

impl AddComponentPage {
    fn next(self) -> Option<AddComponentPage> {
        use AddComponentPage::*;
        match self {
            EntrySensor => Some(MotionSensor),
            MotionSensor => Some(PanicButton),
            PanicButton => Some(Keypad),
            Keypad => Some(KeychainRemote),
            KeychainRemote => Some(GlassbreakSensor),
            GlassbreakSensor => Some(CoDetector),
            CoDetector => Some(SmokeDetector),
            SmokeDetector => Some(WaterSensor),
            WaterSensor => Some(FreezeSensor),
            FreezeSensor => None,
        }
    }

    fn prev(self) -> Option<AddComponentPage> {
        use AddComponentPage::*;
        match self {
            EntrySensor => None,
            MotionSensor => Some(EntrySensor),
            PanicButton => Some(MotionSensor),
            Keypad => Some(PanicButton),
            KeychainRemote => Some(Keypad),
            GlassbreakSensor => Some(KeychainRemote),
            CoDetector => Some(GlassbreakSensor),
            SmokeDetector => Some(CoDetector),
            WaterSensor => Some(SmokeDetector),
            FreezeSensor => Some(WaterSensor),
        }
    }

    fn component_type(self) -> ComponentType {
        use AddComponentPage::*;
        match self {
            EntrySensor => ComponentType::EntrySensor,
            MotionSensor => ComponentType::MotionSensor,
            PanicButton => ComponentType::PanicButton,
            Keypad => ComponentType::Keypad,
            KeychainRemote => ComponentType::KeychainRemote,
            GlassbreakSensor => ComponentType::GlassbreakSensor,
            CoDetector => ComponentType::CoDetector,
            SmokeDetector => ComponentType::SmokeDetector,
            WaterSensor => ComponentType::WaterSensor,
            FreezeSensor => ComponentType::FreezeSensor,
        }
    }
}

/// Snapshot handed to the display hook after every change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeypadView {
    pub page: Page,
    pub menu: Option<MenuItem>,
    pub add_component: Option<AddComponentPage>,
    pub scroll_serial: Option<SerialNumber>,
    pub sensor_error: Option<SerialNumber>,
    pub entry_buffer: String,
    pub mode: Mode,
    pub entry_sensor: Option<EntrySensorStatus>,
    pub time_left: u16,
    pub error_flags: u8,
}

#[derive(Clone, Debug)]
enum Command {
    Away,
    Off,
    Home,
    Menu,
    Panic,
    Delete,
    Digit(u8),
    EnrollComponent {
        kind: AddComponentKind,
        serial: SerialNumber,
    },
}

/// Cloneable button interface into a running keypad.
#[derive(Clone)]
pub struct KeypadHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl KeypadHandle {
    pub fn away(&self) {
        let _ = self.commands.send(Command::Away);
    }

    pub fn off(&self) {
        let _ = self.commands.send(Command::Off);
    }

    pub fn home(&self) {
        let _ = self.commands.send(Command::Home);
    }

    pub fn menu(&self) {
        let _ = self.commands.send(Command::Menu);
    }

    pub fn panic(&self) {
        let _ = self.commands.send(Command::Panic);
    }

    pub fn delete(&self) {
        let _ = self.commands.send(Command::Delete);
    }

    pub fn numpad(&self, digit: u8) {
        let _ = self.commands.send(Command::Digit(digit));
    }

    /// Programmatic stand-in for the serial-entry screen of the stock
    /// keypad's add-component flow.
    pub fn enroll_component(&self, kind: AddComponentKind, serial: SerialNumber) {
        let _ = self.commands.send(Command::EnrollComponent { kind, serial });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeypadTimer {
    BacklightOff,
    MenuPinIdle,
    CountdownTick,
}

enum Input {
    Radio(Message),
    Button(Command),
    Timer(KeypadTimer),
}

/// The keypad state machine: mirrors station status, accumulates PIN entry
/// and walks the settings menu. All state lives in the `run` task.
pub struct Keypad {
    txr: Transceiver,
    scheduler: Scheduler,
    hooks: Arc<dyn KeypadHooks>,
    sn: SerialNumber,
    sequence: u8,
    page: Page,
    menu: Option<MenuItem>,
    add_component: Option<AddComponentPage>,
    remove_scroll: Option<(u8, Option<SerialNumber>)>,
    entry_buffer: String,
    armed: Option<ArmedStatus>,
    error_flags: u8,
    entry_sensor: Option<EntrySensorStatus>,
    time_left: u16,
    sensor_error: Option<SerialNumber>,
    backlight_timer: Option<TimerHandle>,
    menu_pin_timer: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
    timer_tx: mpsc::UnboundedSender<KeypadTimer>,
    timer_rx: mpsc::UnboundedReceiver<KeypadTimer>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Keypad {
    pub fn new(
        txr: Transceiver,
        sn: SerialNumber,
        hooks: Arc<dyn KeypadHooks>,
    ) -> (Keypad, KeypadHandle) {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let keypad = Keypad {
            txr,
            scheduler: Scheduler::new(),
            hooks,
            sn,
            sequence: 0,
            page: Page::Boot,
            menu: None,
            add_component: None,
            remove_scroll: None,
            entry_buffer: String::new(),
            armed: None,
            error_flags: 0,
            entry_sensor: None,
            time_left: 0,
            sensor_error: None,
            backlight_timer: None,
            menu_pin_timer: None,
            countdown: None,
            timer_tx,
            timer_rx,
            commands,
        };
        (keypad, KeypadHandle { commands: command_tx })
    }

    pub async fn run(&mut self) -> Result<(), DriverError> {
        self.hooks.display(&self.view());
        self.send(KeypadEvent::ExtendedStatusRequest)?;
        loop {
            let input = tokio::select! {
                msg = self.txr.recv() => Input::Radio(msg?),
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => Input::Button(cmd),
                    None => continue,
                },
                ev = self.timer_rx.recv() => {
                    Input::Timer(ev.expect("timer channel held open by the keypad"))
                }
            };
            match input {
                Input::Radio(msg) => self.process_msg(msg)?,
                Input::Button(cmd) => self.process_command(cmd)?,
                Input::Timer(ev) => self.process_timer(ev)?,
            }
        }
    }

    fn process_msg(&mut self, msg: Message) -> Result<(), DriverError> {
        let Message::BaseStation(msg) = msg else {
            return Ok(());
        };
        if msg.keypad_sn != self.sn {
            debug!("frame for keypad {}, not us", msg.keypad_sn);
            return Ok(());
        }
        debug!("{}", msg);
        match msg.event {
            StationEvent::ExtendedStatusResponse(body)
            | StationEvent::ExtendedStatusUpdate(body)
            | StationEvent::ExtendedStatusRemoteUpdate(body) => {
                self.armed = Some(body.armed);
                self.error_flags = body.flags;
                self.entry_sensor = Some(body.entry_sensor);
                self.time_left = body.time_left;
                if self.page == Page::Boot {
                    self.page = Page::AlarmStatus;
                }
                self.sync_countdown();
            }
            StationEvent::StatusUpdate { flags, .. } => {
                self.error_flags = flags;
            }
            StationEvent::DisarmPinResponse { valid, .. } => {
                self.entry_buffer.clear();
                if valid {
                    self.page = Page::AlarmStatus;
                } else {
                    warn!("station rejected disarm PIN");
                }
            }
            StationEvent::MenuPinResponse { valid } => {
                self.cancel_menu_pin_timer();
                self.entry_buffer.clear();
                if valid {
                    self.menu = Some(MenuItem::ChangePin);
                    self.page = Page::AlarmStatus;
                } else {
                    warn!("station rejected menu PIN");
                    self.page = Page::EnterMenuPin;
                    self.start_menu_pin_timer();
                }
            }
            StationEvent::EnterMenuResponse => {
                self.entry_buffer.clear();
                self.page = Page::EnterMenuPin;
                self.start_menu_pin_timer();
            }
            StationEvent::RemoveScrollResponse { serial, .. } => {
                if let Some((index, shown)) = &mut self.remove_scroll {
                    debug!("scroll slot {} shows {}", index, serial);
                    *shown = Some(serial);
                }
            }
            StationEvent::SensorErrorUpdate { serial, .. } => {
                self.sensor_error = Some(serial);
                self.page = Page::SensorError;
            }
            StationEvent::ClearSensorErrorUpdate { .. } => {
                self.sensor_error = None;
                if self.page == Page::SensorError {
                    self.page = Page::AlarmStatus;
                }
            }
            StationEvent::EntrySensorUpdate { open, .. } => {
                self.entry_sensor = Some(if open {
                    EntrySensorStatus::Open
                } else {
                    EntrySensorStatus::Closed
                });
            }
            StationEvent::ExitMenuResponse => {
                self.leave_menu();
            }
            _ => {
                // Remaining responses carry no keypad-visible state beyond
                // what the next status update brings.
            }
        }
        self.touch();
        Ok(())
    }

    fn process_command(&mut self, cmd: Command) -> Result<(), DriverError> {
        self.hooks.button_beep();
        match cmd {
            Command::Away => {
                if self.in_menu() {
                    self.menu_select()?;
                } else {
                    self.send(KeypadEvent::Away)?;
                }
            }
            Command::Off => {
                if self.in_menu() {
                    self.menu_prev()?;
                } else {
                    self.send(KeypadEvent::Off)?;
                }
            }
            Command::Home => {
                if self.in_menu() {
                    self.menu_next()?;
                } else {
                    self.send(KeypadEvent::Home)?;
                }
            }
            Command::Menu => {
                if self.in_menu() {
                    self.leave_menu();
                    self.send(KeypadEvent::ExitMenu)?;
                } else {
                    self.send(KeypadEvent::EnterMenu)?;
                }
            }
            Command::Panic => {
                self.send(KeypadEvent::Panic)?;
            }
            Command::Delete => {
                if self.is_editing() {
                    self.entry_buffer.pop();
                } else if self.in_menu() {
                    self.menu_prev()?;
                }
            }
            Command::Digit(digit) => {
                if digit > 9 {
                    warn!("ignoring out-of-range digit {}", digit);
                } else {
                    self.push_digit(digit)?;
                }
            }
            Command::EnrollComponent { kind, serial } => {
                self.send(KeypadEvent::AddComponentSerial { kind, serial })?;
            }
        }
        self.touch();
        Ok(())
    }

    fn process_timer(&mut self, ev: KeypadTimer) -> Result<(), DriverError> {
        match ev {
            KeypadTimer::BacklightOff => {
                self.backlight_timer = None;
                self.hooks.backlight(false);
            }
            KeypadTimer::MenuPinIdle => {
                info!("menu PIN entry timed out");
                self.menu_pin_timer = None;
                self.entry_buffer.clear();
                self.page = Page::AlarmStatus;
                self.hooks.display(&self.view());
            }
            KeypadTimer::CountdownTick => {
                if self.time_left > 0 {
                    self.time_left -= 1;
                    self.hooks.warning_beep();
                    self.hooks.display(&self.view());
                }
                if self.time_left > 0 {
                    self.schedule_countdown_tick();
                } else {
                    self.countdown = None;
                }
            }
        }
        Ok(())
    }

    fn push_digit(&mut self, digit: u8) -> Result<(), DriverError> {
        match self.page {
            Page::AlarmStatus | Page::SensorError => {
                self.entry_buffer = digit.to_string();
                self.page = Page::EnterDisarmPin;
            }
            Page::EnterDisarmPin | Page::EnterMenuPin => {
                self.entry_buffer.push((b'0' + digit) as char);
            }
            Page::Boot => return Ok(()),
        }
        if self.entry_buffer.len() == PIN_LENGTH {
            let pin = Pin::new(&self.entry_buffer).expect("buffer holds exactly four digits");
            match self.page {
                Page::EnterDisarmPin => self.send(KeypadEvent::DisarmPin(pin))?,
                Page::EnterMenuPin => {
                    self.start_menu_pin_timer();
                    self.send(KeypadEvent::MenuPin(pin))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn menu_next(&mut self) -> Result<(), DriverError> {
        match self.menu {
            Some(MenuItem::ChangePin) => self.menu = Some(MenuItem::DialingPrefix),
            Some(MenuItem::DialingPrefix) => self.menu = Some(MenuItem::AddComponent),
            Some(MenuItem::AddComponent) => match self.add_component {
                None => self.menu = Some(MenuItem::RemoveComponent),
                Some(page) => {
                    if let Some(next) = page.next() {
                        self.add_component = Some(next);
                        if next == AddComponentPage::FreezeSensor {
                            // The stock keypad announces the end of the type
                            // list three times.
                            for _ in 0..3 {
                                self.send(KeypadEvent::AddComponentLastTypeMenu)?;
                            }
                        }
                    }
                }
            },
            Some(MenuItem::RemoveComponent) => match &self.remove_scroll {
                None => self.menu = Some(MenuItem::Test),
                Some((index, _)) => {
                    let next = index + 1;
                    self.remove_scroll = Some((next, None));
                    self.send(KeypadEvent::RemoveComponentScroll { index: next })?;
                }
            },
            Some(MenuItem::Test) => self.menu = Some(MenuItem::ExitMenu),
            Some(MenuItem::ExitMenu) | None => {}
        }
        Ok(())
    }

    fn menu_prev(&mut self) -> Result<(), DriverError> {
        match self.menu {
            Some(MenuItem::DialingPrefix) => self.menu = Some(MenuItem::ChangePin),
            Some(MenuItem::AddComponent) => match self.add_component {
                None => self.menu = Some(MenuItem::DialingPrefix),
                Some(page) => match page.prev() {
                    Some(prev) => self.add_component = Some(prev),
                    None => self.add_component = None,
                },
            },
            Some(MenuItem::RemoveComponent) => match &self.remove_scroll {
                None => self.menu = Some(MenuItem::AddComponent),
                Some((0, _)) => self.remove_scroll = None,
                Some((index, _)) => {
                    let prev = index - 1;
                    self.remove_scroll = Some((prev, None));
                    self.send(KeypadEvent::RemoveComponentScroll { index: prev })?;
                }
            },
            Some(MenuItem::Test) => self.menu = Some(MenuItem::RemoveComponent),
            Some(MenuItem::ExitMenu) => self.menu = Some(MenuItem::Test),
            Some(MenuItem::ChangePin) | None => {}
        }
        Ok(())
    }

    fn menu_select(&mut self) -> Result<(), DriverError> {
        match self.menu {
            Some(MenuItem::ChangePin) => self.send(KeypadEvent::ChangePinMenu),
            Some(MenuItem::DialingPrefix) => self.send(KeypadEvent::ChangePrefixMenu),
            Some(MenuItem::AddComponent) => match self.add_component {
                None => {
                    self.add_component = Some(AddComponentPage::EntrySensor);
                    self.send(KeypadEvent::AddComponentMenu)
                }
                Some(page) => {
                    self.send(KeypadEvent::AddComponentType(page.component_type()))
                }
            },
            Some(MenuItem::RemoveComponent) => match &self.remove_scroll {
                None => {
                    self.remove_scroll = Some((0, None));
                    self.send(KeypadEvent::RemoveComponentMenu)
                }
                Some((_, Some(serial))) => {
                    let serial = serial.clone();
                    self.send(KeypadEvent::RemoveComponentConfirm(serial))
                }
                Some((_, None)) => Ok(()),
            },
            Some(MenuItem::Test) => self.send(KeypadEvent::TestModeOn),
            Some(MenuItem::ExitMenu) => {
                self.leave_menu();
                self.send(KeypadEvent::ExitMenu)
            }
            None => Ok(()),
        }
    }

    fn leave_menu(&mut self) {
        self.menu = None;
        self.add_component = None;
        self.remove_scroll = None;
        self.entry_buffer.clear();
        self.page = Page::AlarmStatus;
    }

    fn in_menu(&self) -> bool {
        self.menu.is_some()
    }

    fn is_editing(&self) -> bool {
        matches!(self.page, Page::EnterDisarmPin | Page::EnterMenuPin)
    }

    fn mode(&self) -> Mode {
        match self.armed {
            Some(ArmedStatus::ArmingAway) | Some(ArmedStatus::ArmedAway) => Mode::Away,
            Some(ArmedStatus::ArmingHome) | Some(ArmedStatus::ArmedHome) => Mode::Home,
            _ => Mode::Off,
        }
    }

    fn view(&self) -> KeypadView {
        KeypadView {
            page: self.page,
            menu: self.menu,
            add_component: self.add_component,
            scroll_serial: self
                .remove_scroll
                .as_ref()
                .and_then(|(_, serial)| serial.clone()),
            sensor_error: self.sensor_error.clone(),
            entry_buffer: self.entry_buffer.clone(),
            mode: self.mode(),
            entry_sensor: self.entry_sensor,
            time_left: self.time_left,
            error_flags: self.error_flags,
        }
    }

    /// Backlight and display refresh after any button or state change.
    fn touch(&mut self) {
        if let Some(handle) = self.backlight_timer.take() {
            handle.cancel();
        }
        self.hooks.backlight(true);
        let tx = self.timer_tx.clone();
        self.backlight_timer = Some(self.scheduler.schedule(BACKLIGHT_TIMEOUT, move || {
            let _ = tx.send(KeypadTimer::BacklightOff);
        }));
        self.hooks.display(&self.view());
    }

    fn sync_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.cancel();
        }
        if self.time_left > 0 && self.mode() != Mode::Off {
            self.schedule_countdown_tick();
        }
    }

    fn schedule_countdown_tick(&mut self) {
        let tx = self.timer_tx.clone();
        self.countdown = Some(self.scheduler.schedule(COUNTDOWN_TICK, move || {
            let _ = tx.send(KeypadTimer::CountdownTick);
        }));
    }

    fn start_menu_pin_timer(&mut self) {
        self.cancel_menu_pin_timer();
        let tx = self.timer_tx.clone();
        self.menu_pin_timer = Some(self.scheduler.schedule(MENU_PIN_TIMEOUT, move || {
            let _ = tx.send(KeypadTimer::MenuPinIdle);
        }));
    }

    fn cancel_menu_pin_timer(&mut self) {
        if let Some(handle) = self.menu_pin_timer.take() {
            handle.cancel();
        }
    }

    fn send(&mut self, event: KeypadEvent) -> Result<(), DriverError> {
        let msg = Message::Keypad(KeypadMessage {
            sn: self.sn.clone(),
            sequence: self.sequence,
            event,
        });
        debug!("{}", msg);
        self.txr.send(&msg)?;
        // Keypads step their sequence by four.
        self.sequence = (self.sequence + 4) & 0xF;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use tokio::time::{advance, timeout};

    use crate::protocol::{BaseStationMessage, StationSerial, StatusBody};
    use crate::radio::medium::{Medium, Radio};
    use crate::radio::TransceiverConfig;

    const KP_SN: &str = "167JC";

    #[derive(Debug, PartialEq, Eq, Clone)]
    enum Hook {
        Backlight(bool),
        Display(Page, Option<MenuItem>),
        ButtonBeep,
        WarningBeep,
    }

    #[derive(Default)]
    struct Recorder {
        hooks: Mutex<Vec<Hook>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Hook> {
            std::mem::take(&mut *self.hooks.lock().unwrap())
        }
    }

    impl KeypadHooks for Recorder {
        fn backlight(&self, on: bool) {
            self.hooks.lock().unwrap().push(Hook::Backlight(on));
        }
        fn display(&self, view: &KeypadView) {
            self.hooks
                .lock()
                .unwrap()
                .push(Hook::Display(view.page, view.menu));
        }
        fn button_beep(&self) {
            self.hooks.lock().unwrap().push(Hook::ButtonBeep);
        }
        fn warning_beep(&self) {
            self.hooks.lock().unwrap().push(Hook::WarningBeep);
        }
    }

    struct Harness {
        hooks: Arc<Recorder>,
        handle: KeypadHandle,
        /// The station's side of both bands.
        station: Transceiver,
        sequence: u8,
    }

    impl Harness {
        fn send_station(&mut self, event: StationEvent) {
            let msg = Message::BaseStation(BaseStationMessage {
                keypad_sn: SerialNumber::new(KP_SN).unwrap(),
                sequence: self.sequence,
                event,
            });
            self.sequence = (self.sequence + 1) & 0xF;
            self.station.send(&msg).unwrap();
        }

        async fn drain(&mut self) -> Vec<KeypadMessage> {
            let mut out = Vec::new();
            while let Ok(Ok(msg)) =
                timeout(Duration::from_millis(1), self.station.recv()).await
            {
                match msg {
                    Message::Keypad(m) => out.push(m),
                    other => panic!("unexpected frame on uplink: {}", other),
                }
            }
            out
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn status(armed: ArmedStatus, time_left: u16) -> StationEvent {
        StationEvent::ExtendedStatusResponse(StatusBody {
            station: StationSerial::new("123456").unwrap(),
            flags: 0,
            armed,
            entry_sensor: EntrySensorStatus::Closed,
            time_left,
        })
    }

    async fn start() -> Harness {
        let uplink = Medium::new();
        let downlink = Medium::new();

        let keypad_radio = Radio::new(Some(downlink.clone()), Some(uplink.clone())).unwrap();
        let keypad_txr = Transceiver::new(
            Arc::new(keypad_radio),
            TransceiverConfig {
                rx_pin: Some(27),
                tx_pin: Some(20),
            },
        )
        .unwrap();

        let station_radio = Radio::new(Some(uplink), Some(downlink)).unwrap();
        let station = Transceiver::new(
            Arc::new(station_radio),
            TransceiverConfig {
                rx_pin: Some(27),
                tx_pin: Some(16),
            },
        )
        .unwrap();

        let hooks = Arc::new(Recorder::default());
        let (mut keypad, handle) = Keypad::new(
            keypad_txr,
            SerialNumber::new(KP_SN).unwrap(),
            hooks.clone(),
        );
        tokio::spawn(async move {
            let _ = keypad.run().await;
        });
        settle().await;

        Harness {
            hooks,
            handle,
            station,
            sequence: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_requests_status_and_shows_alarm_page() {
        let mut h = start().await;
        let msgs = h.drain().await;
        assert!(msgs
            .iter()
            .any(|m| m.event == KeypadEvent::ExtendedStatusRequest));

        h.hooks.take();
        h.send_station(status(ArmedStatus::Off, 0));
        settle().await;
        let hooks = h.hooks.take();
        assert!(hooks.contains(&Hook::Display(Page::AlarmStatus, None)));
        assert!(hooks.contains(&Hook::Backlight(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_digits_send_disarm_pin() {
        let mut h = start().await;
        h.send_station(status(ArmedStatus::ArmedAway, 0));
        settle().await;
        h.drain().await;

        for d in [1, 2, 3, 4] {
            h.handle.numpad(d);
        }
        settle().await;
        let msgs = h.drain().await;
        assert!(msgs
            .iter()
            .any(|m| m.event == KeypadEvent::DisarmPin(Pin::new("1234").unwrap())));

        h.send_station(StationEvent::DisarmPinResponse {
            station: StationSerial::new("123456").unwrap(),
            valid: true,
        });
        settle().await;
        let hooks = h.hooks.take();
        assert!(hooks.contains(&Hook::Display(Page::AlarmStatus, None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_edits_pin_entry() {
        let mut h = start().await;
        h.send_station(status(ArmedStatus::Off, 0));
        settle().await;
        h.drain().await;

        h.handle.numpad(1);
        h.handle.numpad(9);
        h.handle.delete();
        for d in [2, 3, 4] {
            h.handle.numpad(d);
        }
        settle().await;
        let msgs = h.drain().await;
        assert!(msgs
            .iter()
            .any(|m| m.event == KeypadEvent::DisarmPin(Pin::new("1234").unwrap())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_menu_walk_and_select() {
        let mut h = start().await;
        h.send_station(status(ArmedStatus::Off, 0));
        settle().await;
        h.drain().await;

        h.handle.menu();
        settle().await;
        assert!(h
            .drain()
            .await
            .iter()
            .any(|m| m.event == KeypadEvent::EnterMenu));

        h.send_station(StationEvent::EnterMenuResponse);
        settle().await;
        for d in [1, 2, 3, 4] {
            h.handle.numpad(d);
        }
        settle().await;
        assert!(h
            .drain()
            .await
            .iter()
            .any(|m| m.event == KeypadEvent::MenuPin(Pin::new("1234").unwrap())));

        h.send_station(StationEvent::MenuPinResponse { valid: true });
        settle().await;
        assert!(h
            .hooks
            .take()
            .contains(&Hook::Display(Page::AlarmStatus, Some(MenuItem::ChangePin))));

        // home advances to the dialing prefix item; away selects it.
        h.handle.home();
        h.handle.away();
        settle().await;
        let msgs = h.drain().await;
        assert!(msgs
            .iter()
            .any(|m| m.event == KeypadEvent::ChangePrefixMenu));

        // Next twice lands on remove-component; selecting asks for slot 0.
        h.handle.home();
        h.handle.home();
        h.handle.away();
        settle().await;
        assert!(h
            .drain()
            .await
            .iter()
            .any(|m| m.event == KeypadEvent::RemoveComponentMenu));

        // The scroll answer enables confirm on select.
        h.send_station(StationEvent::RemoveScrollResponse {
            component: crate::protocol::ScrollComponent::MotionSensor,
            serial: SerialNumber::new("1C3J9").unwrap(),
            left_arrow: false,
            right_arrow: false,
        });
        settle().await;
        h.handle.away();
        settle().await;
        assert!(h.drain().await.iter().any(|m| m.event
            == KeypadEvent::RemoveComponentConfirm(SerialNumber::new("1C3J9").unwrap())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_menu_pin_entry_times_out() {
        let mut h = start().await;
        h.send_station(status(ArmedStatus::Off, 0));
        settle().await;
        h.send_station(StationEvent::EnterMenuResponse);
        settle().await;
        h.hooks.take();

        advance(Duration::from_secs(6)).await;
        settle().await;
        assert!(h
            .hooks
            .take()
            .contains(&Hook::Display(Page::AlarmStatus, None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backlight_turns_off_after_timeout() {
        let mut h = start().await;
        h.send_station(status(ArmedStatus::Off, 0));
        settle().await;
        h.hooks.take();

        advance(Duration::from_secs(21)).await;
        settle().await;
        assert!(h.hooks.take().contains(&Hook::Backlight(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_mirror_beeps() {
        let mut h = start().await;
        h.send_station(status(ArmedStatus::ArmingAway, 10));
        settle().await;
        h.hooks.take();

        for _ in 0..3 {
            advance(Duration::from_secs(1)).await;
            settle().await;
        }
        let beeps = h
            .hooks
            .take()
            .iter()
            .filter(|hk| **hk == Hook::WarningBeep)
            .count();
        assert_eq!(beeps, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enroll_component_sends_serial() {
        let mut h = start().await;
        h.handle.enroll_component(
            AddComponentKind::MotionSensor,
            SerialNumber::new("1C3J9").unwrap(),
        );
        settle().await;
        let msgs = h.drain().await;
        assert!(msgs.iter().any(|m| m.event
            == KeypadEvent::AddComponentSerial {
                kind: AddComponentKind::MotionSensor,
                serial: SerialNumber::new("1C3J9").unwrap(),
            }));
    }
}
