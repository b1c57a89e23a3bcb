use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::frame::RawFrame;
use super::serial::{ascii_4b5c, SerialNumber};
use super::{OriginType, ParseError};

/// Two PIN digits per byte, low digit first, then this fixed suffix.
const PIN_BODY_SUFFIX: [u8; 2] = [0x0F, 0xF0];

/// Dialing-prefix body suffix; an absent prefix is all ones.
const PREFIX_BODY_SUFFIX: [u8; 3] = [0xFF, 0xCF, 0xFF];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PinError {
    #[error("PIN must be numeric")]
    NotNumeric,
    #[error("PIN must be 4 digits, got {0}")]
    BadLength(usize),
}

/// A four-digit PIN, compared as its ASCII form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn new(s: &str) -> Result<Pin, PinError> {
        if s.len() != 4 {
            return Err(PinError::BadLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PinError::NotNumeric);
        }
        Ok(Pin(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digits(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (i, b) in self.0.bytes().enumerate() {
            out[i] = b - b'0';
        }
        out
    }

    fn body(&self) -> [u8; 4] {
        let d = self.digits();
        [
            (d[1] << 4) | d[0],
            (d[3] << 4) | d[2],
            PIN_BODY_SUFFIX[0],
            PIN_BODY_SUFFIX[1],
        ]
    }

    fn from_body(body: &[u8]) -> Result<Pin, ParseError> {
        if body[2..4] != PIN_BODY_SUFFIX {
            return Err(ParseError::BadSubfield {
                field: "pin body suffix",
                value: body[2],
            });
        }
        let nibbles = [body[0] & 0x0F, body[0] >> 4, body[1] & 0x0F, body[1] >> 4];
        let mut pin = String::with_capacity(4);
        for n in nibbles {
            if n > 9 {
                return Err(ParseError::BadSubfield {
                    field: "pin digit",
                    value: n,
                });
            }
            pin.push((b'0' + n) as char);
        }
        Ok(Pin(pin))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pin {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pin::new(s)
    }
}

/// Component type code used by the add-component type submenu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
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

impl From<ComponentType> for u8 {
    fn from(value: ComponentType) -> Self {
        match value {
            ComponentType::EntrySensor => 0x00,
            ComponentType::MotionSensor => 0x01,
            ComponentType::PanicButton => 0x02,
            ComponentType::Keypad => 0x03,
            ComponentType::KeychainRemote => 0x04,
            ComponentType::GlassbreakSensor => 0x05,
            ComponentType::CoDetector => 0x06,
            ComponentType::SmokeDetector => 0x07,
            ComponentType::WaterSensor => 0x08,
            ComponentType::FreezeSensor => 0x09,
        }
    }
}

impl TryFrom<u8> for ComponentType {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::EntrySensor),
            0x01 => Ok(Self::MotionSensor),
            0x02 => Ok(Self::PanicButton),
            0x03 => Ok(Self::Keypad),
            0x04 => Ok(Self::KeychainRemote),
            0x05 => Ok(Self::GlassbreakSensor),
            0x06 => Ok(Self::CoDetector),
            0x07 => Ok(Self::SmokeDetector),
            0x08 => Ok(Self::WaterSensor),
            0x09 => Ok(Self::FreezeSensor),
            x => Err(ParseError::BadSubfield {
                field: "component type",
                value: x,
            }),
        }
    }
}

/// Component kinds that can be enrolled by serial over the air. There is no
/// event code for adding a keypad this way.
///
/// Glassbreak sensors and smoke detectors share event code 0x6E on the wire;
/// parsing resolves 0x6E to the glassbreak variant. The collision is in the
/// protocol itself, not an artifact of this catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddComponentKind {
    EntrySensor,
    MotionSensor,
    PanicButton,
    KeychainRemote,
    GlassbreakSensor,
    SmokeDetector,
    CoDetector,
    FreezeSensor,
    WaterSensor,
}

impl AddComponentKind {
    pub(super) fn event_code(self) -> u8 {
        match self {
            AddComponentKind::EntrySensor => 0x69,
            AddComponentKind::MotionSensor => 0x6A,
            AddComponentKind::PanicButton => 0x6B,
            AddComponentKind::KeychainRemote => 0x6D,
            AddComponentKind::GlassbreakSensor => 0x6E,
            AddComponentKind::SmokeDetector => 0x6E,
            AddComponentKind::CoDetector => 0x78,
            AddComponentKind::FreezeSensor => 0x79,
            AddComponentKind::WaterSensor => 0x7A,
        }
    }

    pub(super) fn from_event_code(value: u8) -> Option<AddComponentKind> {
        match value {
            0x69 => Some(Self::EntrySensor),
            0x6A => Some(Self::MotionSensor),
            0x6B => Some(Self::PanicButton),
            0x6D => Some(Self::KeychainRemote),
            0x6E => Some(Self::GlassbreakSensor),
            0x78 => Some(Self::CoDetector),
            0x79 => Some(Self::FreezeSensor),
            0x7A => Some(Self::WaterSensor),
            _ => None,
        }
    }
}

/// Everything a keypad can transmit. Variants without data ride in the
/// three-byte payload (PLC 0x22); one-byte bodies use PLC 0x33 and four-byte
/// bodies PLC 0x66.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeypadEvent {
    ExtendedStatusRequest,
    TestModeOn,
    TestModeOff,
    RemoveComponentMenu,
    Home,
    Panic,
    Away,
    Off,
    EnterMenu,
    ExitMenu,
    ChangePinMenu,
    ChangePinConfirmMenu,
    ChangePrefixMenu,
    AddComponentMenu,
    RemoveComponentSelectMenu,
    AddComponentLastTypeMenu,
    RemoveComponentScroll { index: u8 },
    AddComponentType(ComponentType),
    DisarmPin(Pin),
    NewPin(Pin),
    MenuPin(Pin),
    NewPrefix(Option<u8>),
    RemoveComponentConfirm(SerialNumber),
    AddComponentSerial {
        kind: AddComponentKind,
        serial: SerialNumber,
    },
}

impl KeypadEvent {
    fn plc(&self) -> u8 {
        match self {
            KeypadEvent::RemoveComponentScroll { .. } | KeypadEvent::AddComponentType(_) => 0x33,
            KeypadEvent::DisarmPin(_)
            | KeypadEvent::NewPin(_)
            | KeypadEvent::MenuPin(_)
            | KeypadEvent::NewPrefix(_)
            | KeypadEvent::RemoveComponentConfirm(_)
            | KeypadEvent::AddComponentSerial { .. } => 0x66,
            _ => 0x22,
        }
    }

    fn event_code(&self) -> u8 {
        match self {
            KeypadEvent::ExtendedStatusRequest => 0x11,
            KeypadEvent::TestModeOn => 0x13,
            KeypadEvent::TestModeOff => 0x5E,
            KeypadEvent::RemoveComponentMenu => 0x44,
            KeypadEvent::Home => 0x53,
            KeypadEvent::Panic => 0x54,
            KeypadEvent::Away => 0x56,
            KeypadEvent::Off => 0x5C,
            KeypadEvent::EnterMenu => 0x61,
            KeypadEvent::ExitMenu => 0x64,
            KeypadEvent::ChangePinMenu => 0x71,
            KeypadEvent::ChangePinConfirmMenu => 0x72,
            KeypadEvent::ChangePrefixMenu => 0x73,
            KeypadEvent::AddComponentMenu => 0x74,
            KeypadEvent::RemoveComponentSelectMenu => 0x76,
            KeypadEvent::AddComponentLastTypeMenu => 0x77,
            KeypadEvent::RemoveComponentScroll { .. } => 0x45,
            KeypadEvent::AddComponentType(_) => 0x75,
            KeypadEvent::DisarmPin(_) => 0x51,
            KeypadEvent::NewPin(_) => 0x62,
            KeypadEvent::MenuPin(_) => 0x66,
            KeypadEvent::NewPrefix(_) => 0x63,
            KeypadEvent::RemoveComponentConfirm(_) => 0x67,
            KeypadEvent::AddComponentSerial { kind, .. } => kind.event_code(),
        }
    }

    fn body(&self) -> Vec<u8> {
        match self {
            KeypadEvent::RemoveComponentScroll { index } => vec![*index],
            KeypadEvent::AddComponentType(t) => vec![u8::from(*t)],
            KeypadEvent::DisarmPin(pin) | KeypadEvent::NewPin(pin) | KeypadEvent::MenuPin(pin) => {
                pin.body().to_vec()
            }
            KeypadEvent::NewPrefix(prefix) => match prefix {
                None => vec![0xFF; 4],
                Some(p) => vec![
                    0xF0 | (p & 0x0F),
                    PREFIX_BODY_SUFFIX[0],
                    PREFIX_BODY_SUFFIX[1],
                    PREFIX_BODY_SUFFIX[2],
                ],
            },
            KeypadEvent::RemoveComponentConfirm(serial)
            | KeypadEvent::AddComponentSerial { serial, .. } => {
                ascii_4b5c::pack(serial.as_str(), false, false).to_vec()
            }
            _ => vec![],
        }
    }
}

/// A keypad-originated request or update. Payload byte 1 carries the 4-bit
/// sequence above a fixed 0x4 marker nibble.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeypadMessage {
    pub sn: SerialNumber,
    pub sequence: u8,
    pub event: KeypadEvent,
}

impl KeypadMessage {
    pub(super) fn from_frame(frame: &RawFrame) -> Result<KeypadMessage, ParseError> {
        if !matches!(frame.plc, 0x22 | 0x33 | 0x66) {
            return Err(ParseError::BadPlc(frame.plc));
        }
        if frame.payload[0] != OriginType::Keypad as u8 {
            return Err(ParseError::BadOrigin(frame.payload[0]));
        }
        if !frame.footer.is_empty() {
            return Err(ParseError::BadSubfield {
                field: "keypad footer",
                value: frame.footer[0],
            });
        }
        if frame.payload[1] & 0x0F != 0x4 {
            return Err(ParseError::BadSubfield {
                field: "keypad sequence marker",
                value: frame.payload[1] & 0x0F,
            });
        }
        let sequence = frame.payload[1] >> 4;
        let body = &frame.payload[2..frame.payload.len() - 1];
        let code = frame.payload[frame.payload.len() - 1];

        let unrecognized = || ParseError::unrecognized(frame.plc, OriginType::Keypad as u8, code);
        let event = match (frame.plc, code) {
            (0x22, 0x11) => KeypadEvent::ExtendedStatusRequest,
            (0x22, 0x13) => KeypadEvent::TestModeOn,
            (0x22, 0x5E) => KeypadEvent::TestModeOff,
            (0x22, 0x44) => KeypadEvent::RemoveComponentMenu,
            (0x22, 0x53) => KeypadEvent::Home,
            (0x22, 0x54) => KeypadEvent::Panic,
            (0x22, 0x56) => KeypadEvent::Away,
            (0x22, 0x5C) => KeypadEvent::Off,
            (0x22, 0x61) => KeypadEvent::EnterMenu,
            (0x22, 0x64) => KeypadEvent::ExitMenu,
            (0x22, 0x71) => KeypadEvent::ChangePinMenu,
            (0x22, 0x72) => KeypadEvent::ChangePinConfirmMenu,
            (0x22, 0x73) => KeypadEvent::ChangePrefixMenu,
            (0x22, 0x74) => KeypadEvent::AddComponentMenu,
            (0x22, 0x76) => KeypadEvent::RemoveComponentSelectMenu,
            (0x22, 0x77) => KeypadEvent::AddComponentLastTypeMenu,
            (0x33, 0x45) => KeypadEvent::RemoveComponentScroll { index: body[0] },
            (0x33, 0x75) => KeypadEvent::AddComponentType(ComponentType::try_from(body[0])?),
            (0x66, 0x51) => KeypadEvent::DisarmPin(Pin::from_body(body)?),
            (0x66, 0x62) => KeypadEvent::NewPin(Pin::from_body(body)?),
            (0x66, 0x66) => KeypadEvent::MenuPin(Pin::from_body(body)?),
            (0x66, 0x63) => KeypadEvent::NewPrefix(parse_prefix_body(body)?),
            (0x66, 0x67) => {
                KeypadEvent::RemoveComponentConfirm(parse_component_serial(body)?)
            }
            (0x66, _) => match AddComponentKind::from_event_code(code) {
                Some(kind) => KeypadEvent::AddComponentSerial {
                    kind,
                    serial: parse_component_serial(body)?,
                },
                None => return Err(unrecognized()),
            },
            _ => return Err(unrecognized()),
        };
        Ok(KeypadMessage {
            sn: frame.sn.clone(),
            sequence,
            event,
        })
    }

    pub(super) fn to_frame(&self) -> RawFrame {
        let mut payload = vec![
            OriginType::Keypad as u8,
            (self.sequence << 4) | 0x4,
        ];
        payload.extend_from_slice(&self.event.body());
        payload.push(self.event.event_code());
        RawFrame {
            plc: self.event.plc(),
            sn: self.sn.clone(),
            payload,
            footer: vec![],
        }
    }
}

impl fmt::Display for KeypadMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} from keypad {} (seq {:X})",
            self.event, self.sn, self.sequence
        )
    }
}

fn parse_prefix_body(body: &[u8]) -> Result<Option<u8>, ParseError> {
    if body == [0xFF; 4] {
        return Ok(None);
    }
    if body[0] >> 4 != 0xF || body[1..4] != PREFIX_BODY_SUFFIX {
        return Err(ParseError::BadSubfield {
            field: "prefix body",
            value: body[0],
        });
    }
    let prefix = body[0] & 0x0F;
    if prefix > 9 {
        return Err(ParseError::BadSubfield {
            field: "prefix digit",
            value: prefix,
        });
    }
    Ok(Some(prefix))
}

fn parse_component_serial(body: &[u8]) -> Result<SerialNumber, ParseError> {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(body);
    let (sn, _, _) = ascii_4b5c::unpack(&buf);
    Ok(SerialNumber::new(&sn)?)
}
