// Device-level state machines: the base station, keypads and the
// transmit-only sensor endpoints, plus the timer scheduler and typed
// configuration they share.
pub mod base_station;
pub mod components;
pub mod config;
pub mod keypad;
pub mod sensor;
pub mod timer;

pub use base_station::{AlertKind, ArmedState, BaseStation, StationHooks};
pub use components::{Component, ComponentRegistry, ComponentSetting, DeviceType};
pub use config::{ComponentConfig, ConfigError, Settings, StationConfig};
pub use keypad::{Keypad, KeypadHandle, KeypadHooks, KeypadView};
pub use sensor::{EntrySensor, KeychainRemote, MotionSensor};
pub use timer::{Scheduler, TimerHandle};
