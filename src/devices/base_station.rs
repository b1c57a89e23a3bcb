use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::protocol::{
    ArmedStatus, BaseStationMessage, EntrySensorStatus, KeychainEvent, KeypadEvent, KeypadMessage,
    Message, MotionEvent, Pin, SensorEvent, SensorMessage, SerialNumber, StationEvent,
    StationSerial, StatusBody,
};
use crate::protocol::{EntryEvent, SensorErrorSlot};
use crate::radio::{DriverError, Transceiver};

use super::components::{
    Component, ComponentRegistry, ComponentSetting, DeviceType, KeychainRemoteSetting,
    KeypadSetting, SensorSetting,
};
use super::config::{ConfigError, Settings, StationConfig};
use super::timer::{Scheduler, TimerHandle};

/// A component that stays silent longer than this is reported as not
/// responding by the daily supervision sweep.
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(24 * 3600);
const HEARTBEAT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// An enrollment/menu session ends after this much inactivity.
const MENU_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ArmedState {
    Off,
    ArmingAway,
    ArmedAway,
    ArmedHome,
}

impl From<ArmedState> for ArmedStatus {
    fn from(value: ArmedState) -> Self {
        match value {
            ArmedState::Off => ArmedStatus::Off,
            ArmedState::ArmingAway => ArmedStatus::ArmingAway,
            ArmedState::ArmedAway => ArmedStatus::ArmedAway,
            ArmedState::ArmedHome => ArmedStatus::ArmedHome,
        }
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum AlertKind {
    #[display(fmt = "Alarm off")]
    AlarmOff,
    #[display(fmt = "Sensor not responding")]
    SensorNotResponding,
    #[display(fmt = "No link to dispatcher")]
    NoLinkToDispatcher,
    #[display(fmt = "Your settings have been synchronized")]
    SettingsSynchronized,
    #[display(fmt = "Sensor activity")]
    SensorTripped,
}

/// Host integration points. Every hook defaults to a no-op so embedders
/// implement only what they care about.
pub trait StationHooks: Send + Sync {
    fn alarm(&self) {}
    fn alert(&self, _kind: AlertKind, _subject: Option<&SerialNumber>) {}
    fn arm_away(&self) {}
    fn arm_home(&self) {}
    fn disarm(&self) {}
    fn door_chime(&self) {}
    fn start_siren(&self) {}
    fn stop_siren(&self) {}
}

impl StationHooks for () {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StationTimer {
    CountdownTick,
    SirenExpired,
    HeartbeatSweep,
    MenuIdle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuStage {
    /// Session opened; waiting for the master PIN.
    Pending,
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TripOutcome {
    Alarm,
    Alert,
}

enum Input {
    Radio(Message),
    Timer(StationTimer),
}

/// The base-station state machine. All state is owned by the `run` task;
/// timers deliver their firings through a channel into the same task, so
/// message handling and timer handling never race.
pub struct BaseStation {
    txr: Transceiver,
    scheduler: Scheduler,
    hooks: Arc<dyn StationHooks>,
    serial: StationSerial,
    master_pin: Pin,
    duress_pin: Option<Pin>,
    additional_pins: Vec<Pin>,
    settings: Settings,
    components: ComponentRegistry,
    sequence: u8,
    armed: ArmedState,
    error_flags: u8,
    entry_sensor: EntrySensorStatus,
    time_left: u16,
    pending_trip: Option<(TripOutcome, SerialNumber)>,
    countdown: Option<TimerHandle>,
    siren_active: bool,
    siren_timer: Option<TimerHandle>,
    menu_stage: Option<MenuStage>,
    menu_idle: Option<TimerHandle>,
    test_mode: bool,
    timer_tx: mpsc::UnboundedSender<StationTimer>,
    timer_rx: mpsc::UnboundedReceiver<StationTimer>,
}

impl BaseStation {
    pub fn new(
        txr: Transceiver,
        config: StationConfig,
        hooks: Arc<dyn StationHooks>,
    ) -> Result<BaseStation, ConfigError> {
        config.settings.validate()?;
        let mut components = ComponentRegistry::new();
        for c in &config.components {
            let component =
                Component::new(c.sn.clone(), &c.name, c.device_type, c.setting, c.instant_trip)?;
            if !components.insert(component) {
                return Err(ConfigError::DuplicateComponent(c.sn.clone()));
            }
        }
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Ok(BaseStation {
            txr,
            scheduler: Scheduler::new(),
            hooks,
            serial: config.serial,
            master_pin: config.master_pin,
            duress_pin: config.duress_pin,
            additional_pins: config.additional_pins,
            settings: config.settings,
            components,
            sequence: 0,
            armed: ArmedState::Off,
            error_flags: 0,
            entry_sensor: EntrySensorStatus::Closed,
            time_left: 0,
            pending_trip: None,
            countdown: None,
            siren_active: false,
            siren_timer: None,
            menu_stage: None,
            menu_idle: None,
            test_mode: false,
            timer_tx,
            timer_rx,
        })
    }

    pub fn armed_state(&self) -> ArmedState {
        self.armed
    }

    /// Receives and reacts until the transceiver dies.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        self.schedule_heartbeat_sweep();
        self.power_on_sync()?;
        loop {
            let input = tokio::select! {
                msg = self.txr.recv() => Input::Radio(msg?),
                ev = self.timer_rx.recv() => {
                    Input::Timer(ev.expect("timer channel held open by the station"))
                }
            };
            match input {
                Input::Radio(msg) => self.process_msg(msg)?,
                Input::Timer(ev) => self.process_timer(ev)?,
            }
        }
    }

    /// Boot-time keypad sync: clear any stale sensor-error slots and push
    /// the initial status.
    fn power_on_sync(&mut self) -> Result<(), DriverError> {
        let keypads: Vec<SerialNumber> = self.components.keypads().map(|c| c.sn.clone()).collect();
        for kp in keypads {
            for slot in [
                SensorErrorSlot::First,
                SensorErrorSlot::Second,
                SensorErrorSlot::Third,
                SensorErrorSlot::Fourth,
            ] {
                self.send_to(
                    &kp,
                    StationEvent::ClearSensorErrorUpdate {
                        station: self.serial.clone(),
                        slot,
                    },
                )?;
            }
            let body = self.status_body();
            self.send_to(&kp, StationEvent::ExtendedStatusUpdate(body))?;
        }
        Ok(())
    }

    fn process_msg(&mut self, msg: Message) -> Result<(), DriverError> {
        match msg {
            Message::BaseStation(m) => {
                debug!("ignoring station-originated frame: {}", m);
                Ok(())
            }
            Message::Keypad(m) => {
                let Some(component) = self.components.get(&m.sn) else {
                    debug!("dropping frame from unknown component {}", m.sn);
                    return Ok(());
                };
                if component.device_type != DeviceType::Keypad {
                    warn!("keypad frame from non-keypad component {}", m.sn);
                    return Ok(());
                }
                let setting = component.setting;
                self.process_keypad(m, setting)
            }
            Message::Sensor(m) => {
                let Some(component) = self.components.get(&m.sn) else {
                    debug!("dropping frame from unknown component {}", m.sn);
                    return Ok(());
                };
                let setting = component.setting;
                let instant = component.instant_trip.unwrap_or(false);
                self.process_sensor(m, setting, instant)
            }
        }
    }

    fn process_keypad(
        &mut self,
        msg: KeypadMessage,
        setting: ComponentSetting,
    ) -> Result<(), DriverError> {
        let kp = msg.sn.clone();
        debug!("{}", msg);
        match msg.event {
            KeypadEvent::ExtendedStatusRequest => {
                let body = self.status_body();
                self.send_to(&kp, StationEvent::ExtendedStatusResponse(body))
            }
            KeypadEvent::TestModeOn => {
                self.test_mode = true;
                info!("test mode on");
                let station = self.serial.clone();
                self.send_to(&kp, StationEvent::TestModeOnResponse { station })
            }
            KeypadEvent::TestModeOff => {
                self.test_mode = false;
                info!("test mode off");
                let station = self.serial.clone();
                self.send_to(&kp, StationEvent::TestModeOffResponse { station })
            }
            KeypadEvent::Home => {
                self.arm_home();
                let station = self.serial.clone();
                self.send_to(&kp, StationEvent::HomeResponse { station })
            }
            KeypadEvent::Away => {
                self.begin_arming_away();
                let station = self.serial.clone();
                self.send_to(&kp, StationEvent::AwayResponse { station })
            }
            KeypadEvent::Off => {
                self.disarm();
                let station = self.serial.clone();
                self.send_to(&kp, StationEvent::OffResponse { station })
            }
            KeypadEvent::Panic => {
                if setting == ComponentSetting::Keypad(KeypadSetting::PanicEnabled) {
                    self.raise_alarm(false);
                } else {
                    debug!("panic request from {} suppressed by setting", kp);
                }
                Ok(())
            }
            KeypadEvent::DisarmPin(pin) => {
                let station = self.serial.clone();
                if self.pin_accepted(&pin) {
                    let duress = self.duress_pin.as_ref() == Some(&pin);
                    self.send_to(&kp, StationEvent::DisarmPinResponse { station, valid: true })?;
                    self.disarm();
                    if duress {
                        warn!("duress PIN entered at {}", kp);
                        self.raise_alarm(true);
                    }
                    Ok(())
                } else {
                    warn!("invalid disarm PIN from {}", kp);
                    self.send_to(&kp, StationEvent::DisarmPinResponse { station, valid: false })
                }
            }
            KeypadEvent::MenuPin(pin) => {
                if self.menu_stage.is_none() {
                    debug!("menu PIN with no open session");
                    return Ok(());
                }
                self.touch_menu_idle();
                if pin == self.master_pin {
                    self.menu_stage = Some(MenuStage::Active);
                    self.send_to(&kp, StationEvent::MenuPinResponse { valid: true })
                } else {
                    warn!("invalid menu PIN from {}", kp);
                    self.send_to(&kp, StationEvent::MenuPinResponse { valid: false })
                }
            }
            KeypadEvent::NewPin(pin) => {
                if !self.require_menu_session("new PIN") {
                    return Ok(());
                }
                info!("master PIN changed");
                self.master_pin = pin;
                Ok(())
            }
            KeypadEvent::EnterMenu => {
                self.menu_stage = Some(MenuStage::Pending);
                self.touch_menu_idle();
                self.send_to(&kp, StationEvent::EnterMenuResponse)
            }
            KeypadEvent::ExitMenu => {
                self.end_menu_session();
                self.send_to(&kp, StationEvent::ExitMenuResponse)
            }
            KeypadEvent::ChangePinMenu => {
                if !self.require_menu_session("change PIN menu") {
                    return Ok(());
                }
                self.send_to(&kp, StationEvent::ChangePinMenuResponse)
            }
            KeypadEvent::ChangePinConfirmMenu => {
                if !self.require_menu_session("change PIN confirm") {
                    return Ok(());
                }
                self.send_to(&kp, StationEvent::ChangePinConfirmMenuResponse)
            }
            KeypadEvent::ChangePrefixMenu => {
                if !self.require_menu_session("change prefix menu") {
                    return Ok(());
                }
                self.send_to(&kp, StationEvent::ChangePrefixMenuResponse)
            }
            KeypadEvent::NewPrefix(prefix) => {
                if !self.require_menu_session("new prefix") {
                    return Ok(());
                }
                info!("dialing prefix set to {:?}", prefix);
                self.settings.dialing_prefix = prefix;
                self.send_to(&kp, StationEvent::NewPrefixResponse)
            }
            KeypadEvent::AddComponentMenu => {
                if !self.require_menu_session("add component menu") {
                    return Ok(());
                }
                self.send_to(&kp, StationEvent::AddComponentMenuResponse)
            }
            KeypadEvent::AddComponentType(_) => {
                if !self.require_menu_session("add component type") {
                    return Ok(());
                }
                self.send_to(&kp, StationEvent::AddComponentTypeMenuResponse)
            }
            KeypadEvent::AddComponentLastTypeMenu => {
                // Sent three times by keypads when the type submenu wraps;
                // nothing to answer.
                debug!("add-component last-type marker from {}", kp);
                Ok(())
            }
            KeypadEvent::AddComponentSerial { kind, serial } => {
                if !self.require_menu_session("component enrollment") {
                    return Ok(());
                }
                if self.components.contains(&serial) {
                    info!("component {} already enrolled", serial);
                    return self.send_to(
                        &kp,
                        StationEvent::AddSerialResponse {
                            kind,
                            already_added: true,
                        },
                    );
                }
                match Component::new(serial.clone(), "", DeviceType::from(kind), None, None) {
                    Ok(component) => {
                        self.components.insert(component);
                        info!("enrolled {} {}", DeviceType::from(kind), serial);
                        self.send_to(
                            &kp,
                            StationEvent::AddSerialResponse {
                                kind,
                                already_added: false,
                            },
                        )
                    }
                    Err(e) => {
                        warn!("cannot enroll {}: {}", serial, e);
                        Ok(())
                    }
                }
            }
            KeypadEvent::RemoveComponentSelectMenu => {
                if !self.require_menu_session("remove component select") {
                    return Ok(());
                }
                self.send_to(&kp, StationEvent::RemoveComponentSelectResponse)
            }
            KeypadEvent::RemoveComponentMenu => {
                if !self.require_menu_session("remove component scroll") {
                    return Ok(());
                }
                self.send_scroll(&kp, 0)
            }
            KeypadEvent::RemoveComponentScroll { index } => {
                if !self.require_menu_session("remove component scroll") {
                    return Ok(());
                }
                self.send_scroll(&kp, index)
            }
            KeypadEvent::RemoveComponentConfirm(serial) => {
                if !self.require_menu_session("component removal") {
                    return Ok(());
                }
                self.components.remove(&serial);
                info!("removed component {}", serial);
                self.send_to(&kp, StationEvent::RemoveComponentConfirmResponse)
            }
        }
    }

    fn process_sensor(
        &mut self,
        msg: SensorMessage,
        setting: ComponentSetting,
        instant: bool,
    ) -> Result<(), DriverError> {
        debug!("{}", msg);
        let sn = msg.sn.clone();
        match msg.event {
            SensorEvent::Keychain(event) => {
                let ComponentSetting::KeychainRemote(setting) = setting else {
                    warn!("keychain frame from {} with mismatched setting", sn);
                    return Ok(());
                };
                if setting == KeychainRemoteSetting::Disabled {
                    debug!("keychain {} is disabled", sn);
                    return Ok(());
                }
                match event {
                    KeychainEvent::Panic => {
                        if setting != KeychainRemoteSetting::PanicDisabled {
                            info!("panic from keychain {}", sn);
                            self.raise_alarm(false);
                        }
                        Ok(())
                    }
                    KeychainEvent::Away => {
                        info!("away request from keychain {}", sn);
                        self.begin_arming_away();
                        Ok(())
                    }
                    KeychainEvent::Off => {
                        info!("off request from keychain {}", sn);
                        self.disarm();
                        let station = self.serial.clone();
                        self.broadcast(StationEvent::OffRemoteUpdate { station })
                    }
                }
            }
            SensorEvent::Motion(MotionEvent::Heartbeat) => {
                if let Some(component) = self.components.get_mut(&sn) {
                    component.last_heartbeat = Some(Instant::now());
                }
                Ok(())
            }
            SensorEvent::Motion(MotionEvent::Motion) => {
                if let Some(component) = self.components.get_mut(&sn) {
                    component.last_heartbeat = Some(Instant::now());
                }
                let ComponentSetting::MotionSensor(setting) = setting else {
                    warn!("motion frame from {} with mismatched setting", sn);
                    return Ok(());
                };
                self.sensor_trip(&sn, setting, instant)
            }
            SensorEvent::Entry(event) => {
                let ComponentSetting::EntrySensor(setting) = setting else {
                    warn!("entry frame from {} with mismatched setting", sn);
                    return Ok(());
                };
                let open = event == EntryEvent::Open;
                self.entry_sensor = if open {
                    EntrySensorStatus::Open
                } else {
                    EntrySensorStatus::Closed
                };
                let station = self.serial.clone();
                self.broadcast(StationEvent::EntrySensorUpdate { station, open })?;
                if !open {
                    return Ok(());
                }
                if self.armed == ArmedState::Off {
                    if self.settings.door_chime == super::config::DoorChime::On {
                        self.hooks.door_chime();
                    }
                    return Ok(());
                }
                self.sensor_trip(&sn, setting, instant)
            }
        }
    }

    fn process_timer(&mut self, ev: StationTimer) -> Result<(), DriverError> {
        match ev {
            StationTimer::CountdownTick => self.countdown_tick(),
            StationTimer::SirenExpired => {
                info!("siren duration elapsed");
                self.siren_active = false;
                self.siren_timer = None;
                self.hooks.stop_siren();
                Ok(())
            }
            StationTimer::HeartbeatSweep => {
                self.heartbeat_sweep();
                Ok(())
            }
            StationTimer::MenuIdle => {
                info!("menu session timed out");
                self.menu_stage = None;
                self.menu_idle = None;
                Ok(())
            }
        }
    }

    fn countdown_tick(&mut self) -> Result<(), DriverError> {
        match self.armed {
            ArmedState::ArmingAway => {
                self.time_left = self.time_left.saturating_sub(1);
                if self.time_left == 0 {
                    self.countdown = None;
                    self.armed = ArmedState::ArmedAway;
                    info!("armed away");
                    self.hooks.arm_away();
                    self.broadcast_status()
                } else {
                    debug!("{} seconds until armed", self.time_left);
                    self.broadcast_status()?;
                    self.schedule_countdown_tick();
                    Ok(())
                }
            }
            ArmedState::ArmedAway | ArmedState::ArmedHome if self.pending_trip.is_some() => {
                self.time_left = self.time_left.saturating_sub(1);
                if self.time_left == 0 {
                    self.countdown = None;
                    if let Some((outcome, sn)) = self.pending_trip.take() {
                        self.fire_trip(outcome, &sn);
                    }
                    self.broadcast_status()
                } else {
                    debug!("{} seconds until alarm", self.time_left);
                    self.broadcast_status()?;
                    self.schedule_countdown_tick();
                    Ok(())
                }
            }
            _ => {
                self.cancel_countdown();
                Ok(())
            }
        }
    }

    fn heartbeat_sweep(&mut self) {
        let now = Instant::now();
        let stale: Vec<SerialNumber> = self
            .components
            .iter()
            .filter(|c| matches!(c.last_heartbeat, Some(at) if now - at > HEARTBEAT_TIMEOUT))
            .map(|c| c.sn.clone())
            .collect();
        for sn in stale {
            warn!("component {} has stopped responding", sn);
            self.hooks.alert(AlertKind::SensorNotResponding, Some(&sn));
        }
        self.schedule_heartbeat_sweep();
    }

    fn sensor_trip(
        &mut self,
        sn: &SerialNumber,
        setting: SensorSetting,
        instant: bool,
    ) -> Result<(), DriverError> {
        let outcome = match setting {
            SensorSetting::Disabled => return Ok(()),
            SensorSetting::AlarmHomeAndAway if self.is_armed() => TripOutcome::Alarm,
            SensorSetting::AlarmAwayOnly if self.armed == ArmedState::ArmedAway => {
                TripOutcome::Alarm
            }
            SensorSetting::NoAlarmAlertOnly if self.is_armed() => TripOutcome::Alert,
            _ => return Ok(()),
        };
        if self.test_mode {
            // Walk tests report activity without arming the siren.
            info!("test mode: {} tripped", sn);
            self.hooks.alert(AlertKind::SensorTripped, Some(sn));
            return Ok(());
        }
        if instant {
            info!("instant trip by {}", sn);
            self.fire_trip(outcome, sn);
            return Ok(());
        }
        if self.time_left != 0 {
            // Already counting down; a second trip does not restart it.
            return Ok(());
        }
        self.time_left = match self.armed {
            ArmedState::ArmedAway => self.settings.entry_delay_away,
            ArmedState::ArmedHome => self.settings.entry_delay_home,
            _ => return Ok(()),
        };
        self.pending_trip = Some((outcome, sn.clone()));
        info!("tripped by {}; {} seconds to disarm", sn, self.time_left);
        self.broadcast_status()?;
        self.schedule_countdown_tick();
        Ok(())
    }

    fn fire_trip(&mut self, outcome: TripOutcome, sn: &SerialNumber) {
        match outcome {
            TripOutcome::Alarm => self.raise_alarm(false),
            TripOutcome::Alert => self.hooks.alert(AlertKind::SensorTripped, Some(sn)),
        }
    }

    fn begin_arming_away(&mut self) {
        self.cancel_countdown();
        self.armed = ArmedState::ArmingAway;
        self.time_left = self.settings.exit_delay;
        info!("arming away, {} second exit delay", self.time_left);
        self.schedule_countdown_tick();
    }

    fn arm_home(&mut self) {
        self.cancel_countdown();
        self.armed = ArmedState::ArmedHome;
        info!("armed home");
        self.hooks.arm_home();
    }

    fn disarm(&mut self) {
        self.armed = ArmedState::Off;
        self.cancel_countdown();
        if let Some(handle) = self.siren_timer.take() {
            handle.cancel();
        }
        self.siren_active = false;
        info!("disarmed");
        self.hooks.stop_siren();
        self.hooks.disarm();
    }

    fn raise_alarm(&mut self, silent: bool) {
        self.cancel_countdown();
        if silent {
            warn!("silent alarm raised");
        } else if self.siren_active {
            debug!("alarm raised while siren already running");
        } else {
            warn!("alarm raised");
            self.hooks.start_siren();
            self.siren_active = true;
            let tx = self.timer_tx.clone();
            self.siren_timer = Some(self.scheduler.schedule(
                Duration::from_secs(60 * u64::from(self.settings.siren_duration)),
                move || {
                    let _ = tx.send(StationTimer::SirenExpired);
                },
            ));
        }
        self.hooks.alarm();
    }

    fn pin_accepted(&self, pin: &Pin) -> bool {
        pin == &self.master_pin
            || self.duress_pin.as_ref() == Some(pin)
            || self.additional_pins.contains(pin)
    }

    fn is_armed(&self) -> bool {
        matches!(self.armed, ArmedState::ArmedAway | ArmedState::ArmedHome)
    }

    fn require_menu_session(&mut self, what: &str) -> bool {
        if self.menu_stage != Some(MenuStage::Active) {
            debug!("{} request outside an active menu session", what);
            return false;
        }
        self.touch_menu_idle();
        true
    }

    fn touch_menu_idle(&mut self) {
        if let Some(handle) = self.menu_idle.take() {
            handle.cancel();
        }
        let tx = self.timer_tx.clone();
        self.menu_idle = Some(self.scheduler.schedule(MENU_IDLE_TIMEOUT, move || {
            let _ = tx.send(StationTimer::MenuIdle);
        }));
    }

    fn end_menu_session(&mut self) {
        self.menu_stage = None;
        if let Some(handle) = self.menu_idle.take() {
            handle.cancel();
        }
    }

    fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.cancel();
        }
        self.time_left = 0;
        self.pending_trip = None;
    }

    fn schedule_countdown_tick(&mut self) {
        let tx = self.timer_tx.clone();
        self.countdown = Some(self.scheduler.schedule(COUNTDOWN_TICK, move || {
            let _ = tx.send(StationTimer::CountdownTick);
        }));
    }

    fn schedule_heartbeat_sweep(&mut self) {
        let tx = self.timer_tx.clone();
        self.scheduler.schedule(HEARTBEAT_SWEEP_INTERVAL, move || {
            let _ = tx.send(StationTimer::HeartbeatSweep);
        });
    }

    fn send_scroll(&mut self, kp: &SerialNumber, index: u8) -> Result<(), DriverError> {
        let Some(component) = self.components.get_index(usize::from(index)) else {
            debug!("remove scroll index {} out of range", index);
            return Ok(());
        };
        let Some(scroll) = component.device_type.scroll_component() else {
            return Ok(());
        };
        let serial = component.sn.clone();
        let event = StationEvent::RemoveScrollResponse {
            component: scroll,
            serial,
            left_arrow: index != 0,
            right_arrow: usize::from(index) != self.components.len() - 1,
        };
        self.send_to(kp, event)
    }

    fn status_body(&self) -> StatusBody {
        StatusBody {
            station: self.serial.clone(),
            flags: self.error_flags,
            armed: self.armed.into(),
            entry_sensor: self.entry_sensor,
            time_left: self.time_left,
        }
    }

    fn broadcast_status(&mut self) -> Result<(), DriverError> {
        let body = self.status_body();
        self.broadcast(StationEvent::ExtendedStatusUpdate(body))
    }

    fn broadcast(&mut self, event: StationEvent) -> Result<(), DriverError> {
        let keypads: Vec<SerialNumber> = self.components.keypads().map(|c| c.sn.clone()).collect();
        for kp in keypads {
            self.send_to(&kp, event.clone())?;
        }
        Ok(())
    }

    fn send_to(&mut self, keypad: &SerialNumber, event: StationEvent) -> Result<(), DriverError> {
        let msg = Message::BaseStation(BaseStationMessage {
            keypad_sn: keypad.clone(),
            sequence: self.sequence,
            event,
        });
        debug!("{}", msg);
        self.txr.send(&msg)?;
        self.sequence = (self.sequence + 1) & 0xF;
        Ok(())
    }
}
