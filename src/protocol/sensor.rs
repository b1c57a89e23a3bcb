use std::fmt;

use super::frame::RawFrame;
use super::serial::SerialNumber;
use super::{OriginType, ParseError};

/// Payload length code shared by every sensor-originated frame.
pub const SENSOR_PLC: u8 = 0x11;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeychainEvent {
    Panic,
    Away,
    Off,
}

impl From<KeychainEvent> for u8 {
    fn from(value: KeychainEvent) -> Self {
        match value {
            KeychainEvent::Panic => 0x01,
            KeychainEvent::Away => 0x02,
            KeychainEvent::Off => 0x03,
        }
    }
}

impl TryFrom<u8> for KeychainEvent {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Panic),
            0x02 => Ok(Self::Away),
            0x03 => Ok(Self::Off),
            x => Err(ParseError::unrecognized(SENSOR_PLC, OriginType::KeychainRemote as u8, x)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionEvent {
    Heartbeat,
    Motion,
}

impl From<MotionEvent> for u8 {
    fn from(value: MotionEvent) -> Self {
        match value {
            MotionEvent::Heartbeat => 0x00,
            MotionEvent::Motion => 0x02,
        }
    }
}

impl TryFrom<u8> for MotionEvent {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Heartbeat),
            0x02 => Ok(Self::Motion),
            x => Err(ParseError::unrecognized(SENSOR_PLC, OriginType::MotionSensor as u8, x)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryEvent {
    Open,
    Closed,
}

impl From<EntryEvent> for u8 {
    fn from(value: EntryEvent) -> Self {
        match value {
            EntryEvent::Open => 0x01,
            EntryEvent::Closed => 0x02,
        }
    }
}

impl TryFrom<u8> for EntryEvent {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Open),
            0x02 => Ok(Self::Closed),
            x => Err(ParseError::unrecognized(SENSOR_PLC, OriginType::EntrySensor as u8, x)),
        }
    }
}

/// Event reported by a sensor-class component, tagged with the origin that
/// produced it. The origin and event codes share the two payload bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorEvent {
    Keychain(KeychainEvent),
    Motion(MotionEvent),
    Entry(EntryEvent),
}

impl SensorEvent {
    pub fn origin(&self) -> OriginType {
        match self {
            SensorEvent::Keychain(_) => OriginType::KeychainRemote,
            SensorEvent::Motion(_) => OriginType::MotionSensor,
            SensorEvent::Entry(_) => OriginType::EntrySensor,
        }
    }

    fn event_code(&self) -> u8 {
        match self {
            SensorEvent::Keychain(e) => u8::from(*e),
            SensorEvent::Motion(e) => u8::from(*e),
            SensorEvent::Entry(e) => u8::from(*e),
        }
    }
}

/// A two-byte broadcast from a keychain remote, motion sensor or entry
/// sensor. No footer; retransmitted at the device layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorMessage {
    pub sn: SerialNumber,
    pub sequence: u8,
    pub event: SensorEvent,
}

impl SensorMessage {
    pub(super) fn from_frame(frame: &RawFrame) -> Result<SensorMessage, ParseError> {
        if frame.plc != SENSOR_PLC {
            return Err(ParseError::BadPlc(frame.plc));
        }
        if !frame.footer.is_empty() {
            return Err(ParseError::BadSubfield {
                field: "sensor footer",
                value: frame.footer[0],
            });
        }
        let origin = frame.payload[0] & 0x0F;
        let sequence = frame.payload[0] >> 4;
        let code = frame.payload[1];
        let event = match OriginType::try_from(origin)? {
            OriginType::KeychainRemote => SensorEvent::Keychain(KeychainEvent::try_from(code)?),
            OriginType::MotionSensor => SensorEvent::Motion(MotionEvent::try_from(code)?),
            OriginType::EntrySensor => SensorEvent::Entry(EntryEvent::try_from(code)?),
            _ => return Err(ParseError::BadOrigin(origin)),
        };
        Ok(SensorMessage {
            sn: frame.sn.clone(),
            sequence,
            event,
        })
    }

    pub(super) fn to_frame(&self) -> RawFrame {
        RawFrame {
            plc: SENSOR_PLC,
            sn: self.sn.clone(),
            payload: vec![
                (self.sequence << 4) | self.event.origin() as u8,
                self.event.event_code(),
            ],
            footer: vec![],
        }
    }
}

impl fmt::Display for SensorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} from {} (seq {:X})",
            self.event, self.sn, self.sequence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(sequence: u8) -> SensorMessage {
        SensorMessage {
            sn: SerialNumber::new("1C3J9").unwrap(),
            sequence,
            event: SensorEvent::Motion(MotionEvent::Motion),
        }
    }

    #[test]
    fn test_motion_frame_layout() {
        let frame = motion(0x3).to_frame();
        assert_eq!(frame.plc, 0x11);
        assert_eq!(frame.payload, vec![0x34, 0x02]);
        assert!(frame.footer.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let messages = [
            motion(0x0),
            SensorMessage {
                sn: SerialNumber::new("1A174").unwrap(),
                sequence: 0xF,
                event: SensorEvent::Keychain(KeychainEvent::Off),
            },
            SensorMessage {
                sn: SerialNumber::new("1R9CL").unwrap(),
                sequence: 0x7,
                event: SensorEvent::Entry(EntryEvent::Open),
            },
        ];
        for msg in messages {
            let parsed = SensorMessage::from_frame(&msg.to_frame()).unwrap();
            assert_eq!(parsed, msg);
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        let mut frame = motion(0).to_frame();
        frame.payload[1] = 0x07;
        assert!(matches!(
            SensorMessage::from_frame(&frame),
            Err(ParseError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_keypad_origin_rejected() {
        let mut frame = motion(0).to_frame();
        frame.payload[0] = 0x01;
        assert!(matches!(
            SensorMessage::from_frame(&frame),
            Err(ParseError::BadOrigin(0x01))
        ));
    }
}
