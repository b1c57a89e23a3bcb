use thiserror::Error;

use super::pulse::Symbol;

/// Nibble index of the origin type in the decoded hex stream: the low
/// nibble of the first payload byte, before the swap.
const ORIGIN_NIBBLE: usize = 16;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bad pulse width in {0} bit(s)")]
    BadPulseWidth(usize),
    #[error("not enough bits: {0}")]
    TooShort(usize),
    #[error("odd nibble count: {0}")]
    OddLength(usize),
}

/// Reassembles frame bytes from demodulated symbols.
///
/// Bits group into 4-bit little-endian nibbles; adjacent nibbles form a byte
/// with the pair swapped. Base-station frames end with a two-nibble end
/// delimiter; everything else is trimmed at the repeat marker (a lone `F`
/// followed by the first four nibbles again) or, when only the final repeat
/// was captured, at the tail's trailing `F`.
pub fn decode(bits: &[Symbol]) -> Result<Vec<u8>, DecodeError> {
    if bits.len() <= 4 {
        return Err(DecodeError::TooShort(bits.len()));
    }
    let invalid = bits.iter().filter(|s| **s == Symbol::Invalid).count();
    if invalid != 0 {
        return Err(DecodeError::BadPulseWidth(invalid));
    }

    let nibbles: Vec<u8> = bits
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |n, (i, s)| n | (u8::from(*s == Symbol::One) << i))
        })
        .collect();
    if nibbles.len() <= ORIGIN_NIBBLE {
        return Err(DecodeError::TooShort(bits.len()));
    }

    let trimmed = if nibbles[ORIGIN_NIBBLE] == 0x0 {
        // Base-station frame: strip the end delimiter.
        &nibbles[..nibbles.len() - 2]
    } else {
        match find_repeat_marker(&nibbles) {
            Some(at) => &nibbles[..at],
            None => &nibbles[..nibbles.len() - 1],
        }
    };
    if trimmed.len() % 2 == 1 {
        return Err(DecodeError::OddLength(trimmed.len()));
    }

    Ok(trimmed
        .chunks(2)
        .map(|pair| (pair[1] << 4) | pair[0])
        .collect())
}

fn find_repeat_marker(nibbles: &[u8]) -> Option<usize> {
    if nibbles.len() < 5 {
        return None;
    }
    (0..nibbles.len() - 4)
        .find(|&i| nibbles[i] == 0xF && nibbles[i + 1..i + 5] == nibbles[0..4])
}
