use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Value packed in place of a character when a serial shorter than five
/// characters is encoded; terminates the string on unpack.
const BLANK: u8 = 0x3F;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SerialError {
    #[error("serial number must be exactly 5 characters, got {0}")]
    BadLength(usize),
    #[error("serial number byte 0x{0:02X} is outside the printable range")]
    BadChar(u8),
    #[error("station serial must be exactly 6 hex digits")]
    BadStationSerial,
}

/// Identity of a component (keypad, remote, sensor): five printable ASCII
/// characters, sent verbatim in the frame header and bit-packed in several
/// payload bodies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialNumber(String);

impl SerialNumber {
    pub fn new(s: &str) -> Result<SerialNumber, SerialError> {
        if s.len() != 5 {
            return Err(SerialError::BadLength(s.len()));
        }
        for &b in s.as_bytes() {
            if !(0x30..0x7F).contains(&b) {
                return Err(SerialError::BadChar(b));
            }
        }
        Ok(SerialNumber(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn header_bytes(&self) -> [u8; 5] {
        let mut out = [0u8; 5];
        out.copy_from_slice(self.0.as_bytes());
        out
    }

    pub(crate) fn from_header(bytes: &[u8]) -> Result<SerialNumber, SerialError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|_| SerialError::BadChar(bytes.iter().copied().find(|b| *b >= 0x80).unwrap_or(0)))?;
        SerialNumber::new(s)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SerialNumber {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SerialNumber::new(s)
    }
}

/// Identity of a base station: six hex digits, packed into the footer of
/// every station-originated status frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StationSerial(String);

impl StationSerial {
    pub fn new(s: &str) -> Result<StationSerial, SerialError> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SerialError::BadStationSerial);
        }
        Ok(StationSerial(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digits(&self) -> [u8; 6] {
        let mut out = [0u8; 6];
        for (i, b) in self.0.bytes().enumerate() {
            out[i] = match b {
                b'0'..=b'9' => b - b'0',
                b'A'..=b'F' => b - b'A' + 10,
                _ => unreachable!("validated at construction"),
            };
        }
        out
    }
}

impl fmt::Display for StationSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StationSerial {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StationSerial::new(s)
    }
}

/// Five 6-bit characters plus two flag bits scattered over four bytes.
///
/// Each character is carried as `ord - 0x30`. The low halves live in the
/// nibbles of bytes 0-2; the 2-bit high halves are spread across bytes 2-3
/// together with the flags in the top bits of byte 3.
pub mod ascii_4b5c {
    use super::BLANK;

    pub fn pack(sn: &str, hb: bool, lb: bool) -> [u8; 4] {
        let mut c = [BLANK; 5];
        for (i, b) in sn.bytes().take(5).enumerate() {
            c[i] = b.wrapping_sub(0x30);
        }
        [
            ((c[1] & 0x0F) << 4) | (c[0] & 0x0F),
            ((c[3] & 0x0F) << 4) | (c[2] & 0x0F),
            ((c[1] & 0x30) << 2) | (c[0] & 0x30) | (c[4] & 0x0F),
            (u8::from(hb) << 7)
                | (u8::from(lb) << 6)
                | (c[4] & 0x30)
                | ((c[3] & 0x30) >> 2)
                | ((c[2] & 0x30) >> 4),
        ]
    }

    pub fn unpack(buf: &[u8; 4]) -> (String, bool, bool) {
        let c = [
            (buf[2] & 0x30) | (buf[0] & 0x0F),
            ((buf[2] >> 2) & 0x30) | (buf[0] >> 4),
            ((buf[3] << 4) & 0x30) | (buf[1] & 0x0F),
            ((buf[3] << 2) & 0x30) | (buf[1] >> 4),
            (buf[3] & 0x30) | (buf[2] & 0x0F),
        ];
        let mut sn = String::with_capacity(5);
        for &ch in &c {
            if ch == BLANK {
                break;
            }
            sn.push((ch + 0x30) as char);
        }
        (sn, buf[3] & 0x80 != 0, buf[3] & 0x40 != 0)
    }
}

/// Six hex digits in five bytes; the sixth digit rides in the high nibble of
/// byte 3, all other high nibbles are zero.
pub mod hex_5b6c {
    use super::StationSerial;

    pub fn pack(sn: &StationSerial) -> [u8; 5] {
        let d = sn.digits();
        [d[0], d[1], d[2], (d[5] << 4) | d[3], d[4]]
    }

    pub fn unpack(buf: &[u8; 5]) -> StationSerial {
        let digits = [
            buf[0] & 0x0F,
            buf[1] & 0x0F,
            buf[2] & 0x0F,
            buf[3] & 0x0F,
            buf[4] & 0x0F,
            buf[3] >> 4,
        ];
        let s: String = digits.iter().map(|d| format!("{:X}", d)).collect();
        StationSerial(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_number_validation() {
        assert!(SerialNumber::new("167JC").is_ok());
        assert_eq!(SerialNumber::new("167J").err(), Some(SerialError::BadLength(4)));
        assert_eq!(SerialNumber::new("167JCX").err(), Some(SerialError::BadLength(6)));
        assert_eq!(SerialNumber::new("1\x1f7JC").err(), Some(SerialError::BadChar(0x1F)));
    }

    #[test]
    fn test_ascii_4b5c_round_trip() {
        for sn in ["1C3J9", "167JC", "1R9CL", "00000"] {
            let packed = ascii_4b5c::pack(sn, false, false);
            assert_eq!(ascii_4b5c::unpack(&packed), (sn.to_string(), false, false));
        }
    }

    #[test]
    fn test_ascii_4b5c_flags() {
        let packed = ascii_4b5c::pack("1C3J9", true, false);
        assert_eq!(ascii_4b5c::unpack(&packed), ("1C3J9".to_string(), true, false));
        let packed = ascii_4b5c::pack("1C3J9", true, true);
        assert_eq!(ascii_4b5c::unpack(&packed), ("1C3J9".to_string(), true, true));
    }

    #[test]
    fn test_ascii_4b5c_short_serial_blank_terminates() {
        let packed = ascii_4b5c::pack("1C3", false, false);
        let (sn, _, _) = ascii_4b5c::unpack(&packed);
        assert_eq!(sn, "1C3");
    }

    #[test]
    fn test_ascii_4b5c_layout() {
        // "04" with the remaining characters blank: c0 = 0x30 - 0x30 = 0x00,
        // c1 = 0x34 - 0x30 = 0x04, c2..c4 = 0x3F.
        let packed = ascii_4b5c::pack("04", false, false);
        assert_eq!(packed[0], 0x40);
        assert_eq!(packed[1], 0xFF);
        assert_eq!(packed[2] & 0x0F, 0x0F);
    }

    #[test]
    fn test_hex_5b6c_round_trip() {
        for sn in ["123456", "ABCDEF", "00F01A"] {
            let serial = StationSerial::new(sn).unwrap();
            assert_eq!(hex_5b6c::unpack(&hex_5b6c::pack(&serial)), serial);
        }
    }

    #[test]
    fn test_hex_5b6c_layout() {
        let serial = StationSerial::new("123456").unwrap();
        assert_eq!(hex_5b6c::pack(&serial), [0x01, 0x02, 0x03, 0x64, 0x05]);
    }

    #[test]
    fn test_station_serial_validation() {
        assert!(StationSerial::new("123456").is_ok());
        assert!(StationSerial::new("12345").is_err());
        assert!(StationSerial::new("12345G").is_err());
        assert_eq!(StationSerial::new("abcdef").unwrap().as_str(), "ABCDEF");
    }
}
