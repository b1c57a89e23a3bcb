use super::serial::SerialNumber;
use super::ParseError;

/// First two bytes of every frame, big-endian.
pub const VENDOR_CODE: u16 = 0xCC05;

/// Maps a payload length code to the number of payload bytes that follow the
/// serial number.
pub fn payload_length(plc: u8) -> Option<usize> {
    match plc {
        0x00 => Some(7),
        0x11 => Some(2),
        0x22 => Some(3),
        0x33 => Some(4),
        0x66 => Some(7),
        _ => None,
    }
}

/// A structurally validated frame: vendor code and PLC checked, payload
/// sliced to the coded length, checksum verified. Carries no knowledge of
/// what the payload means.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub plc: u8,
    pub sn: SerialNumber,
    pub payload: Vec<u8>,
    pub footer: Vec<u8>,
}

impl RawFrame {
    /// Sum of the payload bytes, modulo 256. The footer is not covered.
    pub fn checksum(&self) -> u8 {
        self.payload
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9 + self.payload.len() + self.footer.len());
        out.extend_from_slice(&VENDOR_CODE.to_be_bytes());
        out.push(self.plc);
        out.extend_from_slice(&self.sn.header_bytes());
        out.extend_from_slice(&self.payload);
        out.push(self.checksum());
        out.extend_from_slice(&self.footer);
        out
    }

    pub fn parse(bytes: &[u8]) -> Result<RawFrame, ParseError> {
        if bytes.len() < 9 {
            return Err(ParseError::TooShort(bytes.len()));
        }
        let vendor = u16::from_be_bytes([bytes[0], bytes[1]]);
        if vendor != VENDOR_CODE {
            return Err(ParseError::BadVendorCode(vendor));
        }
        let plc = bytes[2];
        let pl = payload_length(plc).ok_or(ParseError::BadPlc(plc))?;
        let sn = SerialNumber::from_header(&bytes[3..8])?;
        if bytes.len() < 8 + pl + 1 {
            return Err(ParseError::TooShort(bytes.len()));
        }
        let payload = bytes[8..8 + pl].to_vec();
        let footer = bytes[8 + pl + 1..].to_vec();
        let frame = RawFrame {
            plc,
            sn,
            payload,
            footer,
        };
        let got = bytes[8 + pl];
        let expected = frame.checksum();
        if got != expected {
            return Err(ParseError::BadChecksum { expected, got });
        }
        Ok(frame)
    }
}
