use std::fmt;

use super::frame::RawFrame;
use super::keypad::AddComponentKind;
use super::serial::{ascii_4b5c, hex_5b6c, SerialNumber, StationSerial};
use super::{OriginType, ParseError};

const MSG_TYPE_RESPONSE: u8 = 0x01;
const MSG_TYPE_UPDATE: u8 = 0x05;

const INFO_TYPE_STATUS: u8 = 0x2;
const INFO_TYPE_MENU: u8 = 0x6;

/// Menu-traffic frames carry no station serial; the footer body is all ones.
const MENU_FOOTER_BODY: [u8; 5] = [0xFF; 5];

const DISARM_PIN_VALID: u8 = 0x4E;
const DISARM_PIN_INVALID: u8 = 0x01;

/// Armed state as reported to keypads. The wire knows an arming-home state
/// even though the base station never passes through it (home arms
/// instantly).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmedStatus {
    Off,
    ArmedAway,
    ArmedHome,
    ArmingAway,
    ArmingHome,
}

impl From<ArmedStatus> for u8 {
    fn from(value: ArmedStatus) -> Self {
        match value {
            ArmedStatus::Off => 0x0,
            ArmedStatus::ArmedAway => 0x1,
            ArmedStatus::ArmedHome => 0x2,
            ArmedStatus::ArmingAway => 0x3,
            ArmedStatus::ArmingHome => 0x4,
        }
    }
}

impl TryFrom<u8> for ArmedStatus {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Off),
            0x1 => Ok(Self::ArmedAway),
            0x2 => Ok(Self::ArmedHome),
            0x3 => Ok(Self::ArmingAway),
            0x4 => Ok(Self::ArmingHome),
            x => Err(ParseError::BadSubfield {
                field: "armed status",
                value: x,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntrySensorStatus {
    Closed,
    Open,
}

impl From<EntrySensorStatus> for u8 {
    fn from(value: EntrySensorStatus) -> Self {
        match value {
            EntrySensorStatus::Closed => 0xF0,
            EntrySensorStatus::Open => 0xF1,
        }
    }
}

impl TryFrom<u8> for EntrySensorStatus {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xF0 => Ok(Self::Closed),
            0xF1 => Ok(Self::Open),
            x => Err(ParseError::BadSubfield {
                field: "entry sensor status",
                value: x,
            }),
        }
    }
}

/// Error flag bits carried in the high nibble of extended-status frames.
pub mod error_flags {
    pub const POWER_OUTAGE: u8 = 1 << 0;
    pub const ENTRY_SENSOR: u8 = 1 << 1;
    pub const UNKNOWN: u8 = 1 << 2;
    pub const NO_LINK_TO_DISPATCHER: u8 = 1 << 3;
}

/// Body of the extended-status family: error flags, armed state, entry
/// sensor roll-up and the countdown timer (12 bits, seconds). The final
/// body nibble is a fixed 0xC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBody {
    pub station: StationSerial,
    pub flags: u8,
    pub armed: ArmedStatus,
    pub entry_sensor: EntrySensorStatus,
    pub time_left: u16,
}

impl StatusBody {
    fn body(&self) -> [u8; 4] {
        [
            (self.flags << 4) | u8::from(self.armed),
            u8::from(self.entry_sensor),
            (self.time_left >> 4) as u8,
            (((self.time_left & 0xF) as u8) << 4) | 0xC,
        ]
    }

    fn from_wire(body: &[u8], station: StationSerial) -> Result<StatusBody, ParseError> {
        if body[3] & 0x0F != 0xC {
            return Err(ParseError::BadSubfield {
                field: "status body trailer",
                value: body[3] & 0x0F,
            });
        }
        Ok(StatusBody {
            station,
            flags: body[0] >> 4,
            armed: ArmedStatus::try_from(body[0] & 0x0F)?,
            entry_sensor: EntrySensorStatus::try_from(body[1])?,
            time_left: (u16::from(body[2]) << 4) | u16::from(body[3] >> 4),
        })
    }
}

/// Component kinds enumerated by the remove-component scroll responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollComponent {
    EntrySensor,
    MotionSensor,
    PanicButton,
    Keypad,
    KeychainRemote,
    GlassbreakSensor,
    SmokeDetector,
    CoDetector,
    FreezeSensor,
    WaterSensor,
}

impl ScrollComponent {
    fn event_code(self) -> u8 {
        match self {
            ScrollComponent::EntrySensor => 0x47,
            ScrollComponent::MotionSensor => 0x48,
            ScrollComponent::PanicButton => 0x49,
            ScrollComponent::Keypad => 0x4A,
            ScrollComponent::KeychainRemote => 0x4B,
            ScrollComponent::GlassbreakSensor => 0x4C,
            ScrollComponent::SmokeDetector => 0x4D,
            ScrollComponent::CoDetector => 0x4E,
            ScrollComponent::FreezeSensor => 0x4F,
            ScrollComponent::WaterSensor => 0x50,
        }
    }

    fn from_event_code(value: u8) -> Option<ScrollComponent> {
        match value {
            0x47 => Some(Self::EntrySensor),
            0x48 => Some(Self::MotionSensor),
            0x49 => Some(Self::PanicButton),
            0x4A => Some(Self::Keypad),
            0x4B => Some(Self::KeychainRemote),
            0x4C => Some(Self::GlassbreakSensor),
            0x4D => Some(Self::SmokeDetector),
            0x4E => Some(Self::CoDetector),
            0x4F => Some(Self::FreezeSensor),
            0x50 => Some(Self::WaterSensor),
            _ => None,
        }
    }
}

/// Sensor-error display slot; the keypad can show four.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorErrorSlot {
    First,
    Second,
    Third,
    Fourth,
}

impl SensorErrorSlot {
    fn event_code(self) -> u8 {
        match self {
            SensorErrorSlot::First => 0x32,
            SensorErrorSlot::Second => 0x35,
            SensorErrorSlot::Third => 0x36,
            SensorErrorSlot::Fourth => 0x37,
        }
    }

    fn from_event_code(value: u8) -> Option<SensorErrorSlot> {
        match value {
            0x32 => Some(Self::First),
            0x35 => Some(Self::Second),
            0x36 => Some(Self::Third),
            0x37 => Some(Self::Fourth),
            _ => None,
        }
    }
}

/// Everything the base station sends to a keypad. Response/update and
/// status/menu discriminators, the PLC and the footer shape are all derived
/// from the variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StationEvent {
    ExtendedStatusResponse(StatusBody),
    ExtendedStatusUpdate(StatusBody),
    ExtendedStatusRemoteUpdate(StatusBody),
    StatusUpdate {
        station: StationSerial,
        flags: u8,
    },
    DisarmPinResponse {
        station: StationSerial,
        valid: bool,
    },
    MenuPinResponse {
        valid: bool,
    },
    HomeResponse {
        station: StationSerial,
    },
    AwayResponse {
        station: StationSerial,
    },
    OffResponse {
        station: StationSerial,
    },
    OffRemoteUpdate {
        station: StationSerial,
    },
    TestModeOnResponse {
        station: StationSerial,
    },
    TestModeOffResponse {
        station: StationSerial,
    },
    EntrySensorUpdate {
        station: StationSerial,
        open: bool,
    },
    SensorErrorUpdate {
        station: StationSerial,
        slot: SensorErrorSlot,
        serial: SerialNumber,
    },
    ClearSensorErrorUpdate {
        station: StationSerial,
        slot: SensorErrorSlot,
    },
    EnterMenuResponse,
    ExitMenuResponse,
    ChangePinMenuResponse,
    ChangePinConfirmMenuResponse,
    ChangePrefixMenuResponse,
    NewPrefixResponse,
    AddComponentMenuResponse,
    AddComponentTypeMenuResponse,
    AddSerialResponse {
        kind: AddComponentKind,
        already_added: bool,
    },
    RemoveComponentSelectResponse,
    RemoveComponentConfirmResponse,
    RemoveScrollResponse {
        component: ScrollComponent,
        serial: SerialNumber,
        left_arrow: bool,
        right_arrow: bool,
    },
}

impl StationEvent {
    fn plc(&self) -> u8 {
        use StationEvent::*;
        match self {
            ExtendedStatusResponse(_)
            | ExtendedStatusUpdate(_)
            | ExtendedStatusRemoteUpdate(_)
            | SensorErrorUpdate { .. }
            | RemoveScrollResponse { .. } => 0x66,
            OffResponse { .. }
            | TestModeOnResponse { .. }
            | TestModeOffResponse { .. }
            | ClearSensorErrorUpdate { .. }
            | ExitMenuResponse
            | ChangePinMenuResponse
            | ChangePinConfirmMenuResponse
            | ChangePrefixMenuResponse
            | AddComponentMenuResponse
            | AddComponentTypeMenuResponse => 0x22,
            _ => 0x33,
        }
    }

    fn is_update(&self) -> bool {
        use StationEvent::*;
        matches!(
            self,
            ExtendedStatusUpdate(_)
                | ExtendedStatusRemoteUpdate(_)
                | StatusUpdate { .. }
                | OffRemoteUpdate { .. }
                | EntrySensorUpdate { .. }
                | SensorErrorUpdate { .. }
                | ClearSensorErrorUpdate { .. }
        )
    }

    fn is_menu(&self) -> bool {
        use StationEvent::*;
        matches!(
            self,
            MenuPinResponse { .. }
                | EnterMenuResponse
                | ExitMenuResponse
                | ChangePinMenuResponse
                | ChangePinConfirmMenuResponse
                | ChangePrefixMenuResponse
                | NewPrefixResponse
                | AddComponentMenuResponse
                | AddComponentTypeMenuResponse
                | AddSerialResponse { .. }
                | RemoveComponentSelectResponse
                | RemoveComponentConfirmResponse
                | RemoveScrollResponse { .. }
        )
    }

    fn event_code(&self) -> u8 {
        use StationEvent::*;
        match self {
            ExtendedStatusResponse(_) => 0x11,
            ExtendedStatusUpdate(_) => 0x28,
            ExtendedStatusRemoteUpdate(_) => 0x14,
            StatusUpdate { .. } => 0x31,
            DisarmPinResponse { .. } => 0x51,
            MenuPinResponse { .. } => 0x66,
            HomeResponse { .. } => 0x53,
            AwayResponse { .. } => 0x56,
            OffResponse { .. } => 0x5C,
            OffRemoteUpdate { .. } => 0x57,
            TestModeOnResponse { .. } => 0x13,
            TestModeOffResponse { .. } => 0x5E,
            EntrySensorUpdate { .. } => 0x27,
            SensorErrorUpdate { slot, .. } | ClearSensorErrorUpdate { slot, .. } => {
                slot.event_code()
            }
            EnterMenuResponse => 0x61,
            ExitMenuResponse => 0x64,
            ChangePinMenuResponse => 0x71,
            ChangePinConfirmMenuResponse => 0x72,
            ChangePrefixMenuResponse => 0x73,
            NewPrefixResponse => 0x63,
            AddComponentMenuResponse => 0x74,
            AddComponentTypeMenuResponse => 0x75,
            AddSerialResponse { kind, .. } => kind.event_code(),
            RemoveComponentSelectResponse => 0x76,
            RemoveComponentConfirmResponse => 0x67,
            RemoveScrollResponse { component, .. } => component.event_code(),
        }
    }

    fn body(&self) -> Vec<u8> {
        use StationEvent::*;
        match self {
            ExtendedStatusResponse(b) | ExtendedStatusUpdate(b) | ExtendedStatusRemoteUpdate(b) => {
                b.body().to_vec()
            }
            StatusUpdate { flags, .. } => vec![*flags],
            DisarmPinResponse { valid, .. } => {
                vec![if *valid { DISARM_PIN_VALID } else { DISARM_PIN_INVALID }]
            }
            MenuPinResponse { valid } => vec![u8::from(!*valid)],
            HomeResponse { .. } => vec![0x00],
            AwayResponse { .. } => vec![0x78],
            OffRemoteUpdate { .. } => vec![0xFF],
            EntrySensorUpdate { open, .. } => vec![u8::from(*open)],
            SensorErrorUpdate { serial, .. } => {
                ascii_4b5c::pack(serial.as_str(), false, false).to_vec()
            }
            EnterMenuResponse => vec![0x01],
            NewPrefixResponse | RemoveComponentSelectResponse | RemoveComponentConfirmResponse => {
                vec![0x00]
            }
            AddSerialResponse { already_added, .. } => vec![u8::from(*already_added)],
            RemoveScrollResponse {
                serial,
                left_arrow,
                right_arrow,
                ..
            } => ascii_4b5c::pack(serial.as_str(), *left_arrow, *right_arrow).to_vec(),
            _ => vec![],
        }
    }

    /// Station serial carried in the footer of status-class frames.
    fn station(&self) -> Option<&StationSerial> {
        use StationEvent::*;
        match self {
            ExtendedStatusResponse(b) | ExtendedStatusUpdate(b) | ExtendedStatusRemoteUpdate(b) => {
                Some(&b.station)
            }
            StatusUpdate { station, .. }
            | DisarmPinResponse { station, .. }
            | HomeResponse { station }
            | AwayResponse { station }
            | OffResponse { station }
            | OffRemoteUpdate { station }
            | TestModeOnResponse { station }
            | TestModeOffResponse { station }
            | EntrySensorUpdate { station, .. }
            | SensorErrorUpdate { station, .. }
            | ClearSensorErrorUpdate { station, .. } => Some(station),
            _ => None,
        }
    }
}

/// A base-station frame addressed to a keypad. The header serial is the
/// recipient keypad's; the station's own identity rides in the footer.
/// The 4-bit sequence and the info type share the final footer byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseStationMessage {
    pub keypad_sn: SerialNumber,
    pub sequence: u8,
    pub event: StationEvent,
}

impl BaseStationMessage {
    pub(super) fn from_frame(frame: &RawFrame) -> Result<BaseStationMessage, ParseError> {
        if !matches!(frame.plc, 0x22 | 0x33 | 0x66) {
            return Err(ParseError::BadPlc(frame.plc));
        }
        if frame.payload[0] != OriginType::BaseStation as u8 {
            return Err(ParseError::BadOrigin(frame.payload[0]));
        }
        if frame.footer.len() != 6 {
            return Err(ParseError::BadSubfield {
                field: "station footer length",
                value: frame.footer.len() as u8,
            });
        }
        let msg_type = frame.payload[1];
        if msg_type != MSG_TYPE_RESPONSE && msg_type != MSG_TYPE_UPDATE {
            return Err(ParseError::BadSubfield {
                field: "message type",
                value: msg_type,
            });
        }
        let sequence = frame.footer[5] >> 4;
        let info_type = frame.footer[5] & 0x0F;
        if info_type != INFO_TYPE_STATUS && info_type != INFO_TYPE_MENU {
            return Err(ParseError::BadSubfield {
                field: "info type",
                value: info_type,
            });
        }
        let body = &frame.payload[2..frame.payload.len() - 1];
        let code = frame.payload[frame.payload.len() - 1];

        let station = || {
            let mut buf = [0u8; 5];
            buf.copy_from_slice(&frame.footer[..5]);
            hex_5b6c::unpack(&buf)
        };
        let menu_footer = || -> Result<(), ParseError> {
            if frame.footer[..5] != MENU_FOOTER_BODY {
                return Err(ParseError::BadSubfield {
                    field: "menu footer body",
                    value: frame.footer[0],
                });
            }
            Ok(())
        };
        let fixed_body = |expect: u8| -> Result<(), ParseError> {
            if body != [expect] {
                return Err(ParseError::BadSubfield {
                    field: "constant body",
                    value: body[0],
                });
            }
            Ok(())
        };
        let unrecognized = || ParseError::Unrecognized {
            plc: frame.plc,
            origin: OriginType::BaseStation as u8,
            msg_type: Some(msg_type),
            info_type: Some(info_type),
            event_type: code,
        };

        let update = msg_type == MSG_TYPE_UPDATE;
        let menu = info_type == INFO_TYPE_MENU;

        use StationEvent::*;
        let event = match (frame.plc, update, menu, code) {
            (0x66, false, false, 0x11) => {
                ExtendedStatusResponse(StatusBody::from_wire(body, station())?)
            }
            (0x66, true, false, 0x28) => {
                ExtendedStatusUpdate(StatusBody::from_wire(body, station())?)
            }
            (0x66, true, false, 0x14) => {
                ExtendedStatusRemoteUpdate(StatusBody::from_wire(body, station())?)
            }
            (0x33, true, false, 0x31) => StatusUpdate {
                station: station(),
                flags: body[0],
            },
            (0x33, false, false, 0x51) => DisarmPinResponse {
                station: station(),
                valid: match body[0] {
                    DISARM_PIN_VALID => true,
                    DISARM_PIN_INVALID => false,
                    x => {
                        return Err(ParseError::BadSubfield {
                            field: "disarm pin response",
                            value: x,
                        })
                    }
                },
            },
            (0x33, false, true, 0x66) => {
                menu_footer()?;
                MenuPinResponse {
                    valid: match body[0] {
                        0x00 => true,
                        0x01 => false,
                        x => {
                            return Err(ParseError::BadSubfield {
                                field: "menu pin response",
                                value: x,
                            })
                        }
                    },
                }
            }
            (0x33, false, false, 0x53) => {
                fixed_body(0x00)?;
                HomeResponse { station: station() }
            }
            (0x33, false, false, 0x56) => {
                fixed_body(0x78)?;
                AwayResponse { station: station() }
            }
            (0x33, true, false, 0x57) => {
                fixed_body(0xFF)?;
                OffRemoteUpdate { station: station() }
            }
            (0x33, true, false, 0x27) => EntrySensorUpdate {
                station: station(),
                open: match body[0] {
                    0x00 => false,
                    0x01 => true,
                    x => {
                        return Err(ParseError::BadSubfield {
                            field: "entry sensor update",
                            value: x,
                        })
                    }
                },
            },
            (0x33, false, true, 0x61) => {
                menu_footer()?;
                fixed_body(0x01)?;
                EnterMenuResponse
            }
            (0x33, false, true, 0x63) => {
                menu_footer()?;
                fixed_body(0x00)?;
                NewPrefixResponse
            }
            (0x33, false, true, 0x76) => {
                menu_footer()?;
                fixed_body(0x00)?;
                RemoveComponentSelectResponse
            }
            (0x33, false, true, 0x67) => {
                menu_footer()?;
                fixed_body(0x00)?;
                RemoveComponentConfirmResponse
            }
            (0x33, false, true, _) => match AddComponentKind::from_event_code(code) {
                Some(kind) => {
                    menu_footer()?;
                    AddSerialResponse {
                        kind,
                        already_added: match body[0] {
                            0x00 => false,
                            0x01 => true,
                            x => {
                                return Err(ParseError::BadSubfield {
                                    field: "add serial response",
                                    value: x,
                                })
                            }
                        },
                    }
                }
                None => return Err(unrecognized()),
            },
            (0x22, false, false, 0x13) => TestModeOnResponse { station: station() },
            (0x22, false, false, 0x5E) => TestModeOffResponse { station: station() },
            (0x22, false, false, 0x5C) => OffResponse { station: station() },
            (0x22, true, false, _) => match SensorErrorSlot::from_event_code(code) {
                Some(slot) => ClearSensorErrorUpdate {
                    station: station(),
                    slot,
                },
                None => return Err(unrecognized()),
            },
            (0x22, false, true, 0x64) => {
                menu_footer()?;
                ExitMenuResponse
            }
            (0x22, false, true, 0x71) => {
                menu_footer()?;
                ChangePinMenuResponse
            }
            (0x22, false, true, 0x72) => {
                menu_footer()?;
                ChangePinConfirmMenuResponse
            }
            (0x22, false, true, 0x73) => {
                menu_footer()?;
                ChangePrefixMenuResponse
            }
            (0x22, false, true, 0x74) => {
                menu_footer()?;
                AddComponentMenuResponse
            }
            (0x22, false, true, 0x75) => {
                menu_footer()?;
                AddComponentTypeMenuResponse
            }
            (0x66, true, false, _) => match SensorErrorSlot::from_event_code(code) {
                Some(slot) => {
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(body);
                    let (sn, _, _) = ascii_4b5c::unpack(&buf);
                    SensorErrorUpdate {
                        station: station(),
                        slot,
                        serial: SerialNumber::new(&sn)?,
                    }
                }
                None => return Err(unrecognized()),
            },
            (0x66, false, true, _) => match ScrollComponent::from_event_code(code) {
                Some(component) => {
                    menu_footer()?;
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(body);
                    let (sn, left_arrow, right_arrow) = ascii_4b5c::unpack(&buf);
                    RemoveScrollResponse {
                        component,
                        serial: SerialNumber::new(&sn)?,
                        left_arrow,
                        right_arrow,
                    }
                }
                None => return Err(unrecognized()),
            },
            _ => return Err(unrecognized()),
        };
        Ok(BaseStationMessage {
            keypad_sn: frame.sn.clone(),
            sequence,
            event,
        })
    }

    pub(super) fn to_frame(&self) -> RawFrame {
        let msg_type = if self.event.is_update() {
            MSG_TYPE_UPDATE
        } else {
            MSG_TYPE_RESPONSE
        };
        let info_type = if self.event.is_menu() {
            INFO_TYPE_MENU
        } else {
            INFO_TYPE_STATUS
        };
        let mut payload = vec![OriginType::BaseStation as u8, msg_type];
        payload.extend_from_slice(&self.event.body());
        payload.push(self.event.event_code());

        let mut footer = match self.event.station() {
            Some(station) => hex_5b6c::pack(station).to_vec(),
            None => MENU_FOOTER_BODY.to_vec(),
        };
        footer.push((self.sequence << 4) | info_type);

        RawFrame {
            plc: self.event.plc(),
            sn: self.keypad_sn.clone(),
            payload,
            footer,
        }
    }
}

impl fmt::Display for BaseStationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} to keypad {} (seq {:X})",
            self.event, self.keypad_sn, self.sequence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp() -> SerialNumber {
        SerialNumber::new("167JC").unwrap()
    }

    fn bs() -> StationSerial {
        StationSerial::new("123456").unwrap()
    }

    fn msg(sequence: u8, event: StationEvent) -> BaseStationMessage {
        BaseStationMessage {
            keypad_sn: kp(),
            sequence,
            event,
        }
    }

    fn status_body(armed: ArmedStatus, time_left: u16) -> StatusBody {
        StatusBody {
            station: bs(),
            flags: 0,
            armed,
            entry_sensor: EntrySensorStatus::Closed,
            time_left,
        }
    }

    #[test]
    fn test_extended_status_frame_layout() {
        let frame = msg(
            0x1,
            StationEvent::ExtendedStatusResponse(status_body(ArmedStatus::ArmingAway, 45)),
        )
        .to_frame();
        assert_eq!(frame.plc, 0x66);
        // 45 = 0x02D: high eight bits 0x02, low nibble 0xD over the fixed 0xC.
        assert_eq!(frame.payload, vec![0x00, 0x01, 0x03, 0xF0, 0x02, 0xDC, 0x11]);
        assert_eq!(frame.footer, vec![0x01, 0x02, 0x03, 0x64, 0x05, 0x12]);
    }

    #[test]
    fn test_menu_footer_layout() {
        let frame = msg(0x3, StationEvent::EnterMenuResponse).to_frame();
        assert_eq!(frame.plc, 0x33);
        assert_eq!(frame.payload, vec![0x00, 0x01, 0x01, 0x61]);
        assert_eq!(frame.footer, vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x36]);
    }

    #[test]
    fn test_round_trip_catalog() {
        use StationEvent::*;
        let events = vec![
            ExtendedStatusResponse(status_body(ArmedStatus::Off, 0)),
            ExtendedStatusUpdate(status_body(ArmedStatus::ArmingAway, 44)),
            ExtendedStatusRemoteUpdate(status_body(ArmedStatus::ArmedHome, 0)),
            StatusUpdate {
                station: bs(),
                flags: 0x05,
            },
            DisarmPinResponse {
                station: bs(),
                valid: true,
            },
            DisarmPinResponse {
                station: bs(),
                valid: false,
            },
            MenuPinResponse { valid: true },
            MenuPinResponse { valid: false },
            HomeResponse { station: bs() },
            AwayResponse { station: bs() },
            OffResponse { station: bs() },
            OffRemoteUpdate { station: bs() },
            TestModeOnResponse { station: bs() },
            TestModeOffResponse { station: bs() },
            EntrySensorUpdate {
                station: bs(),
                open: true,
            },
            SensorErrorUpdate {
                station: bs(),
                slot: SensorErrorSlot::Second,
                serial: SerialNumber::new("1C3J9").unwrap(),
            },
            ClearSensorErrorUpdate {
                station: bs(),
                slot: SensorErrorSlot::Fourth,
            },
            EnterMenuResponse,
            ExitMenuResponse,
            ChangePinMenuResponse,
            ChangePinConfirmMenuResponse,
            ChangePrefixMenuResponse,
            NewPrefixResponse,
            AddComponentMenuResponse,
            AddComponentTypeMenuResponse,
            AddSerialResponse {
                kind: AddComponentKind::MotionSensor,
                already_added: false,
            },
            AddSerialResponse {
                kind: AddComponentKind::EntrySensor,
                already_added: true,
            },
            RemoveComponentSelectResponse,
            RemoveComponentConfirmResponse,
            RemoveScrollResponse {
                component: ScrollComponent::KeychainRemote,
                serial: SerialNumber::new("1A174").unwrap(),
                left_arrow: true,
                right_arrow: false,
            },
        ];
        for (i, event) in events.into_iter().enumerate() {
            let original = msg((i as u8) & 0xF, event);
            let parsed = BaseStationMessage::from_frame(&original.to_frame()).unwrap();
            assert_eq!(parsed, original);
        }
    }

    #[test]
    fn test_constant_body_enforced() {
        let mut frame = msg(0, StationEvent::AwayResponse { station: bs() }).to_frame();
        frame.payload[2] = 0x77;
        assert!(matches!(
            BaseStationMessage::from_frame(&frame),
            Err(ParseError::BadSubfield {
                field: "constant body",
                ..
            })
        ));
    }

    #[test]
    fn test_menu_footer_enforced() {
        let mut frame = msg(0, StationEvent::EnterMenuResponse).to_frame();
        frame.footer[2] = 0x00;
        assert!(matches!(
            BaseStationMessage::from_frame(&frame),
            Err(ParseError::BadSubfield {
                field: "menu footer body",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_message_type() {
        let mut frame = msg(0, StationEvent::EnterMenuResponse).to_frame();
        frame.payload[1] = 0x02;
        assert!(matches!(
            BaseStationMessage::from_frame(&frame),
            Err(ParseError::BadSubfield {
                field: "message type",
                ..
            })
        ));
    }

    #[test]
    fn test_status_body_trailer_enforced() {
        let mut frame = msg(
            0,
            StationEvent::ExtendedStatusUpdate(status_body(ArmedStatus::ArmedAway, 30)),
        )
        .to_frame();
        frame.payload[5] = (frame.payload[5] & 0xF0) | 0x0A;
        assert!(matches!(
            BaseStationMessage::from_frame(&frame),
            Err(ParseError::BadSubfield {
                field: "status body trailer",
                ..
            })
        ));
    }

    #[test]
    fn test_time_left_packing() {
        for tl in [0u16, 1, 44, 45, 250, 0xFFF] {
            let original = msg(0, StationEvent::ExtendedStatusUpdate(status_body(ArmedStatus::ArmingAway, tl)));
            let parsed = BaseStationMessage::from_frame(&original.to_frame()).unwrap();
            assert_eq!(parsed, original);
        }
    }
}
