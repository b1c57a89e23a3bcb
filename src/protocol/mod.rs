// Message model for the SimpliSafe RF protocol: frame layout, the serial
// number packings and the full catalog of sensor, keypad and base-station
// frames. Parsing is table-driven on the wire discriminators; encoding is
// the deterministic inverse.
pub mod base_station;
pub mod frame;
pub mod keypad;
pub mod sensor;
pub mod serial;

use std::fmt;

use thiserror::Error;

pub use base_station::{
    ArmedStatus, BaseStationMessage, EntrySensorStatus, ScrollComponent, SensorErrorSlot,
    StationEvent, StatusBody,
};
pub use frame::RawFrame;
pub use keypad::{AddComponentKind, ComponentType, KeypadEvent, KeypadMessage, Pin, PinError};
pub use sensor::{EntryEvent, KeychainEvent, MotionEvent, SensorEvent, SensorMessage};
pub use serial::{SerialError, SerialNumber, StationSerial};

/// Device class carried in the first payload byte (low nibble for sensor
/// frames, the full byte otherwise).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OriginType {
    BaseStation = 0x0,
    Keypad = 0x1,
    KeychainRemote = 0x2,
    MotionSensor = 0x4,
    EntrySensor = 0x5,
}

impl TryFrom<u8> for OriginType {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::BaseStation),
            0x1 => Ok(Self::Keypad),
            0x2 => Ok(Self::KeychainRemote),
            0x4 => Ok(Self::MotionSensor),
            0x5 => Ok(Self::EntrySensor),
            x => Err(ParseError::BadOrigin(x)),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("message too short: {0} bytes")]
    TooShort(usize),
    #[error("invalid vendor code 0x{0:04X}")]
    BadVendorCode(u16),
    #[error("unknown payload length code 0x{0:02X}")]
    BadPlc(u8),
    #[error("checksum mismatch: calculated 0x{expected:02X}, received 0x{got:02X}")]
    BadChecksum { expected: u8, got: u8 },
    #[error("invalid origin type 0x{0:02X}")]
    BadOrigin(u8),
    #[error("invalid serial number: {0}")]
    BadSerial(#[from] SerialError),
    #[error("invalid {field}: 0x{value:02X}")]
    BadSubfield { field: &'static str, value: u8 },
    #[error("no variant for plc 0x{plc:02X} origin 0x{origin:02X} msg {msg_type:02X?} info {info_type:02X?} event 0x{event_type:02X}")]
    Unrecognized {
        plc: u8,
        origin: u8,
        msg_type: Option<u8>,
        info_type: Option<u8>,
        event_type: u8,
    },
}

impl ParseError {
    pub(crate) fn unrecognized(plc: u8, origin: u8, event_type: u8) -> ParseError {
        ParseError::Unrecognized {
            plc,
            origin,
            msg_type: None,
            info_type: None,
            event_type,
        }
    }
}

/// Any frame this protocol knows how to speak, discriminated by origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Sensor(SensorMessage),
    Keypad(KeypadMessage),
    BaseStation(BaseStationMessage),
}

impl Message {
    /// Parses a complete frame. Structural validation (vendor code, PLC,
    /// checksum, serial) happens first; the payload is then dispatched on
    /// its discriminators to exactly one leaf variant.
    pub fn parse(bytes: &[u8]) -> Result<Message, ParseError> {
        let frame = RawFrame::parse(bytes)?;
        Message::from_frame(&frame)
    }

    pub fn from_frame(frame: &RawFrame) -> Result<Message, ParseError> {
        match frame.payload[0] {
            0x00 => Ok(Message::BaseStation(BaseStationMessage::from_frame(frame)?)),
            0x01 => Ok(Message::Keypad(KeypadMessage::from_frame(frame)?)),
            _ => Ok(Message::Sensor(SensorMessage::from_frame(frame)?)),
        }
    }

    pub fn to_frame(&self) -> RawFrame {
        match self {
            Message::Sensor(m) => m.to_frame(),
            Message::Keypad(m) => m.to_frame(),
            Message::BaseStation(m) => m.to_frame(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_frame().to_bytes()
    }

    /// Serial number in the frame header: the sender for sensor and keypad
    /// frames, the recipient keypad for base-station frames.
    pub fn header_sn(&self) -> &SerialNumber {
        match self {
            Message::Sensor(m) => &m.sn,
            Message::Keypad(m) => &m.sn,
            Message::BaseStation(m) => &m.keypad_sn,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Sensor(m) => m.fmt(f),
            Message::Keypad(m) => m.fmt(f),
            Message::BaseStation(m) => m.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion_message() -> Message {
        Message::Sensor(SensorMessage {
            sn: SerialNumber::new("1C3J9").unwrap(),
            sequence: 1,
            event: SensorEvent::Motion(MotionEvent::Motion),
        })
    }

    #[test]
    fn test_parse_encode_round_trip() {
        let msg = motion_message();
        let bytes = msg.encode();
        assert_eq!(Message::parse(&bytes).unwrap(), msg);
        assert_eq!(Message::parse(&bytes).unwrap().encode(), bytes);
    }

    #[test]
    fn test_motion_sensor_wire_bytes() {
        // PLC 0x11, serial "1C3J9", sequence 1, motion event.
        let bytes = motion_message().encode();
        assert_eq!(
            bytes,
            vec![0xCC, 0x05, 0x11, 0x31, 0x43, 0x33, 0x4A, 0x39, 0x14, 0x02, 0x16]
        );
    }

    #[test]
    fn test_single_bit_flips_fail_parse() {
        // Flipping any payload or header bit must break parsing; footer
        // sequence bits are not covered by the checksum and are exempt.
        let msg = Message::Keypad(KeypadMessage {
            sn: SerialNumber::new("167JC").unwrap(),
            sequence: 0,
            event: KeypadEvent::DisarmPin(Pin::new("1234").unwrap()),
        });
        let bytes = msg.encode();
        for byte in 0..bytes.len() {
            for bit in 0..8 {
                let mut corrupted = bytes.clone();
                corrupted[byte] ^= 1 << bit;
                let result = Message::parse(&corrupted);
                assert!(
                    result.is_err() || result.as_ref().unwrap() != &msg,
                    "flip of byte {} bit {} went unnoticed",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_cross_family_dispatch() {
        let keypad = Message::Keypad(KeypadMessage {
            sn: SerialNumber::new("167JC").unwrap(),
            sequence: 4,
            event: KeypadEvent::Away,
        });
        assert!(matches!(
            Message::parse(&keypad.encode()),
            Ok(Message::Keypad(_))
        ));

        let station = Message::BaseStation(BaseStationMessage {
            keypad_sn: SerialNumber::new("167JC").unwrap(),
            sequence: 2,
            event: StationEvent::AwayResponse {
                station: StationSerial::new("123456").unwrap(),
            },
        });
        assert!(matches!(
            Message::parse(&station.encode()),
            Ok(Message::BaseStation(_))
        ));
    }
}
