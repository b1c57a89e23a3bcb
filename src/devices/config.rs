use derive_more::Display;
use thiserror::Error;

use crate::protocol::{Pin, SerialNumber, StationSerial};

use super::components::{ComponentSetting, DeviceType};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("voice/door chime volume must be in range 0-100, got {0}")]
    VoiceVolume(u8),
    #[error("alarm siren volume must be in range 0-100, got {0}")]
    SirenVolume(u8),
    #[error("entry delay (away mode) must be in range 30-250 seconds, got {0}")]
    EntryDelayAway(u16),
    #[error("entry delay (home mode) must be in range 1-250 seconds, got {0}")]
    EntryDelayHome(u16),
    #[error("exit delay must be in range 45-120 seconds, got {0}")]
    ExitDelay(u16),
    #[error("dialing prefix must be a single digit, got {0}")]
    DialingPrefix(u8),
    #[error("a base station is not a component")]
    NotAComponent,
    #[error("setting does not apply to a {0}")]
    SettingMismatch(DeviceType),
    #[error("duplicate component serial {0}")]
    DuplicateComponent(SerialNumber),
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Light {
    Off,
    On,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum VoicePrompts {
    Off,
    On,
    ErrorOnly,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum DoorChime {
    Off,
    On,
}

/// Station-wide settings. Ranges follow the stock firmware menus; values
/// outside them are rejected at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub light: Light,
    pub voice_prompts: VoicePrompts,
    pub door_chime: DoorChime,
    pub voice_volume: u8,
    pub siren_volume: u8,
    /// Minutes the siren runs per alarm.
    pub siren_duration: u16,
    /// Seconds of entry delay when armed away / armed home.
    pub entry_delay_away: u16,
    pub entry_delay_home: u16,
    /// Seconds between an away request and the armed state.
    pub exit_delay: u16,
    pub dialing_prefix: Option<u8>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            light: Light::On,
            voice_prompts: VoicePrompts::On,
            door_chime: DoorChime::On,
            voice_volume: 35,
            siren_volume: 100,
            siren_duration: 5,
            entry_delay_away: 30,
            entry_delay_home: 1,
            exit_delay: 45,
            dialing_prefix: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voice_volume > 100 {
            return Err(ConfigError::VoiceVolume(self.voice_volume));
        }
        if self.siren_volume > 100 {
            return Err(ConfigError::SirenVolume(self.siren_volume));
        }
        if !(30..=250).contains(&self.entry_delay_away) {
            return Err(ConfigError::EntryDelayAway(self.entry_delay_away));
        }
        if !(1..=250).contains(&self.entry_delay_home) {
            return Err(ConfigError::EntryDelayHome(self.entry_delay_home));
        }
        if !(45..=120).contains(&self.exit_delay) {
            return Err(ConfigError::ExitDelay(self.exit_delay));
        }
        if let Some(prefix) = self.dialing_prefix {
            if prefix > 9 {
                return Err(ConfigError::DialingPrefix(prefix));
            }
        }
        Ok(())
    }
}

/// One pre-enrolled component.
#[derive(Clone, Debug)]
pub struct ComponentConfig {
    pub name: String,
    pub device_type: DeviceType,
    pub sn: SerialNumber,
    pub setting: Option<ComponentSetting>,
    pub instant_trip: Option<bool>,
}

/// Everything a base station needs at construction. Validation is fatal:
/// a station never starts with out-of-range settings.
#[derive(Clone, Debug)]
pub struct StationConfig {
    pub serial: StationSerial,
    pub master_pin: Pin,
    pub duress_pin: Option<Pin>,
    pub additional_pins: Vec<Pin>,
    pub settings: Settings,
    pub components: Vec<ComponentConfig>,
}

impl StationConfig {
    pub fn new(serial: StationSerial, master_pin: Pin) -> StationConfig {
        StationConfig {
            serial,
            master_pin,
            duress_pin: None,
            additional_pins: Vec::new(),
            settings: Settings::default(),
            components: Vec::new(),
        }
    }
}
