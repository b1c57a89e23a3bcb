use derive_more::Display;
use tokio::time::Instant;

use crate::protocol::base_station::ScrollComponent;
use crate::protocol::AddComponentKind;
use crate::protocol::SerialNumber;

use super::config::ConfigError;

/// Maximum length of a component's display name.
const NAME_MAX: usize = 22;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum DeviceType {
    BaseStation,
    Keypad,
    KeychainRemote,
    PanicButton,
    MotionSensor,
    EntrySensor,
    GlassbreakSensor,
    CoDetector,
    SmokeDetector,
    WaterSensor,
    FreezeSensor,
}

impl DeviceType {
    pub fn scroll_component(self) -> Option<ScrollComponent> {
        match self {
            DeviceType::BaseStation => None,
            DeviceType::Keypad => Some(ScrollComponent::Keypad),
            DeviceType::KeychainRemote => Some(ScrollComponent::KeychainRemote),
            DeviceType::PanicButton => Some(ScrollComponent::PanicButton),
            DeviceType::MotionSensor => Some(ScrollComponent::MotionSensor),
            DeviceType::EntrySensor => Some(ScrollComponent::EntrySensor),
            DeviceType::GlassbreakSensor => Some(ScrollComponent::GlassbreakSensor),
            DeviceType::CoDetector => Some(ScrollComponent::CoDetector),
            DeviceType::SmokeDetector => Some(ScrollComponent::SmokeDetector),
            DeviceType::WaterSensor => Some(ScrollComponent::WaterSensor),
            DeviceType::FreezeSensor => Some(ScrollComponent::FreezeSensor),
        }
    }

    /// Whether the entry-delay bypass flag applies to this device type.
    fn supports_instant_trip(self) -> bool {
        matches!(
            self,
            DeviceType::EntrySensor | DeviceType::MotionSensor | DeviceType::GlassbreakSensor
        )
    }

    /// Device types that transmit periodic heartbeats and are therefore
    /// subject to not-responding supervision.
    pub fn emits_heartbeats(self) -> bool {
        matches!(
            self,
            DeviceType::MotionSensor | DeviceType::GlassbreakSensor | DeviceType::SmokeDetector
        )
    }
}

impl From<AddComponentKind> for DeviceType {
    fn from(value: AddComponentKind) -> Self {
        match value {
            AddComponentKind::EntrySensor => DeviceType::EntrySensor,
            AddComponentKind::MotionSensor => DeviceType::MotionSensor,
            AddComponentKind::PanicButton => DeviceType::PanicButton,
            AddComponentKind::KeychainRemote => DeviceType::KeychainRemote,
            AddComponentKind::GlassbreakSensor => DeviceType::GlassbreakSensor,
            AddComponentKind::SmokeDetector => DeviceType::SmokeDetector,
            AddComponentKind::CoDetector => DeviceType::CoDetector,
            AddComponentKind::FreezeSensor => DeviceType::FreezeSensor,
            AddComponentKind::WaterSensor => DeviceType::WaterSensor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeypadSetting {
    PanicEnabled,
    PanicDisabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeychainRemoteSetting {
    Disabled,
    Enabled,
    PanicDisabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanicButtonSetting {
    AudibleAlarm,
    SilentAlarm,
}

/// Shared by motion and entry sensors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorSetting {
    Disabled,
    AlarmHomeAndAway,
    AlarmAwayOnly,
    NoAlarmAlertOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlassbreakSetting {
    Disabled,
    AlarmHomeAndAway,
    AlarmAwayOnly,
}

/// Per-component behavior, typed by the component's device class. Smoke,
/// CO and water detectors are always on; freeze sensors ship disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentSetting {
    Keypad(KeypadSetting),
    KeychainRemote(KeychainRemoteSetting),
    PanicButton(PanicButtonSetting),
    MotionSensor(SensorSetting),
    EntrySensor(SensorSetting),
    GlassbreakSensor(GlassbreakSetting),
    AlwaysOn,
    Disabled,
}

impl ComponentSetting {
    pub fn default_for(device_type: DeviceType) -> Option<ComponentSetting> {
        match device_type {
            DeviceType::BaseStation => None,
            DeviceType::Keypad => Some(ComponentSetting::Keypad(KeypadSetting::PanicEnabled)),
            DeviceType::KeychainRemote => Some(ComponentSetting::KeychainRemote(
                KeychainRemoteSetting::Enabled,
            )),
            DeviceType::PanicButton => Some(ComponentSetting::PanicButton(
                PanicButtonSetting::AudibleAlarm,
            )),
            DeviceType::MotionSensor => Some(ComponentSetting::MotionSensor(
                SensorSetting::AlarmHomeAndAway,
            )),
            DeviceType::EntrySensor => Some(ComponentSetting::EntrySensor(
                SensorSetting::AlarmHomeAndAway,
            )),
            DeviceType::GlassbreakSensor => Some(ComponentSetting::GlassbreakSensor(
                GlassbreakSetting::AlarmHomeAndAway,
            )),
            DeviceType::CoDetector | DeviceType::SmokeDetector | DeviceType::WaterSensor => {
                Some(ComponentSetting::AlwaysOn)
            }
            DeviceType::FreezeSensor => Some(ComponentSetting::Disabled),
        }
    }

    fn matches(self, device_type: DeviceType) -> bool {
        matches!(
            (self, device_type),
            (ComponentSetting::Keypad(_), DeviceType::Keypad)
                | (ComponentSetting::KeychainRemote(_), DeviceType::KeychainRemote)
                | (ComponentSetting::PanicButton(_), DeviceType::PanicButton)
                | (ComponentSetting::MotionSensor(_), DeviceType::MotionSensor)
                | (ComponentSetting::EntrySensor(_), DeviceType::EntrySensor)
                | (ComponentSetting::GlassbreakSensor(_), DeviceType::GlassbreakSensor)
                | (ComponentSetting::AlwaysOn, DeviceType::CoDetector)
                | (ComponentSetting::AlwaysOn, DeviceType::SmokeDetector)
                | (ComponentSetting::AlwaysOn, DeviceType::WaterSensor)
                | (ComponentSetting::Disabled, DeviceType::FreezeSensor)
        )
    }
}

/// An enrolled component as the base station tracks it.
#[derive(Clone, Debug)]
pub struct Component {
    pub sn: SerialNumber,
    pub name: String,
    pub device_type: DeviceType,
    pub setting: ComponentSetting,
    pub instant_trip: Option<bool>,
    pub last_heartbeat: Option<Instant>,
}

impl Component {
    pub fn new(
        sn: SerialNumber,
        name: &str,
        device_type: DeviceType,
        setting: Option<ComponentSetting>,
        instant_trip: Option<bool>,
    ) -> Result<Component, ConfigError> {
        if device_type == DeviceType::BaseStation {
            return Err(ConfigError::NotAComponent);
        }
        let setting = match setting {
            Some(s) if s.matches(device_type) => s,
            Some(_) => return Err(ConfigError::SettingMismatch(device_type)),
            None => {
                ComponentSetting::default_for(device_type).ok_or(ConfigError::NotAComponent)?
            }
        };
        let instant_trip = if device_type.supports_instant_trip() {
            Some(instant_trip.unwrap_or(false))
        } else {
            None
        };
        let last_heartbeat = device_type.emits_heartbeats().then(Instant::now);
        Ok(Component {
            sn,
            name: name.chars().take(NAME_MAX).collect(),
            device_type,
            setting,
            instant_trip,
            last_heartbeat,
        })
    }
}

/// Insertion-ordered component map. Order is what the remove-component
/// scroll menu walks; lookups are by serial.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: Vec<Component>,
}

impl ComponentRegistry {
    pub fn new() -> ComponentRegistry {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, sn: &SerialNumber) -> bool {
        self.get(sn).is_some()
    }

    pub fn get(&self, sn: &SerialNumber) -> Option<&Component> {
        self.entries.iter().find(|c| &c.sn == sn)
    }

    pub fn get_mut(&mut self, sn: &SerialNumber) -> Option<&mut Component> {
        self.entries.iter_mut().find(|c| &c.sn == sn)
    }

    pub fn get_index(&self, index: usize) -> Option<&Component> {
        self.entries.get(index)
    }

    /// Adds a component. Returns false without replacing anything when the
    /// serial is already enrolled.
    pub fn insert(&mut self, component: Component) -> bool {
        if self.contains(&component.sn) {
            return false;
        }
        self.entries.push(component);
        true
    }

    /// Removes by serial; removing an absent serial is a no-op.
    pub fn remove(&mut self, sn: &SerialNumber) {
        self.entries.retain(|c| &c.sn != sn);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        self.entries.iter_mut()
    }

    pub fn keypads(&self) -> impl Iterator<Item = &Component> {
        self.entries
            .iter()
            .filter(|c| c.device_type == DeviceType::Keypad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sn(s: &str) -> SerialNumber {
        SerialNumber::new(s).unwrap()
    }

    fn motion(serial: &str) -> Component {
        Component::new(sn(serial), "Den", DeviceType::MotionSensor, None, None).unwrap()
    }

    #[test]
    fn test_add_remove_keeps_invariant() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.insert(motion("1C3J9")));
        assert!(registry.insert(motion("1C3BL")));
        assert!(!registry.insert(motion("1C3J9")));
        assert_eq!(registry.len(), 2);

        registry.remove(&sn("1C3J9"));
        registry.remove(&sn("1C3J9"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&sn("1C3J9")));
        assert!(registry.contains(&sn("1C3BL")));

        assert!(registry.insert(motion("1C3J9")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut registry = ComponentRegistry::new();
        for serial in ["1C3J9", "1C3BL", "1C3BH"] {
            registry.insert(motion(serial));
        }
        registry.remove(&sn("1C3BL"));
        registry.insert(motion("1C3BL"));
        let order: Vec<&str> = registry.iter().map(|c| c.sn.as_str()).collect();
        assert_eq!(order, vec!["1C3J9", "1C3BH", "1C3BL"]);
        assert_eq!(registry.get_index(1).unwrap().sn.as_str(), "1C3BH");
    }

    #[test]
    fn test_component_validation() {
        assert!(matches!(
            Component::new(sn("1C3J9"), "", DeviceType::BaseStation, None, None),
            Err(ConfigError::NotAComponent)
        ));
        assert!(matches!(
            Component::new(
                sn("1C3J9"),
                "",
                DeviceType::MotionSensor,
                Some(ComponentSetting::Keypad(KeypadSetting::PanicEnabled)),
                None,
            ),
            Err(ConfigError::SettingMismatch(DeviceType::MotionSensor))
        ));
    }

    #[test]
    fn test_instant_trip_only_on_delay_sensors() {
        let c = Component::new(sn("1C3J9"), "", DeviceType::MotionSensor, None, Some(true)).unwrap();
        assert_eq!(c.instant_trip, Some(true));
        let c = Component::new(sn("1A174"), "", DeviceType::KeychainRemote, None, Some(true)).unwrap();
        assert_eq!(c.instant_trip, None);
    }

    #[test]
    fn test_name_truncated() {
        let c = Component::new(
            sn("1C3J9"),
            "A very long component name indeed",
            DeviceType::MotionSensor,
            None,
            None,
        )
        .unwrap();
        assert_eq!(c.name.len(), 22);
    }
}
