use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u32};

use crate::error::ProtocolError;

macro_rules! write_integer {
    ($name:ident, $type:ty) => {
        pub(super) fn $name(out: &mut Vec<u8>, n: $type) -> usize {
            let bytes = n.to_le_bytes();
            out.extend_from_slice(&bytes[..]);
            bytes.len()
        }
    };
}
write_integer!(write_u16, u16);
write_integer!(write_u32, u32);

/// Truncation error for a fixed-size read of `needed` bytes at `at`.
fn truncated(input: &[u8], at: usize, needed: usize) -> ProtocolError {
    ProtocolError::Truncated {
        needed: at + needed,
        available: input.len(),
    }
}

/// Reads a little-endian `u16` at an absolute offset of a message.
pub(super) fn u16_at(input: &[u8], at: usize) -> Result<u16, ProtocolError> {
    input
        .get(at..)
        .and_then(|i| le_u16::<_, ()>(i).ok())
        .map(|(_, n)| n)
        .ok_or_else(|| truncated(input, at, 2))
}

/// Reads a little-endian `u32` at an absolute offset of a message.
pub(super) fn u32_at(input: &[u8], at: usize) -> Result<u32, ProtocolError> {
    input
        .get(at..)
        .and_then(|i| le_u32::<_, ()>(i).ok())
        .map(|(_, n)| n)
        .ok_or_else(|| truncated(input, at, 4))
}

/// Reads `N` raw bytes at an absolute offset of a message.
pub(super) fn bytes_at<const N: usize>(input: &[u8], at: usize) -> Result<[u8; N], ProtocolError> {
    let (_, data) = input
        .get(at..)
        .and_then(|i| take::<_, _, ()>(N)(i).ok())
        .ok_or_else(|| truncated(input, at, N))?;
    let mut out = [0u8; N];
    out.copy_from_slice(data);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(u16_at(&data, 0), Ok(0x0201));
        assert_eq!(u32_at(&data, 1), Ok(0x0504_0302));
        assert_eq!(bytes_at::<2>(&data, 3), Ok([0x04, 0x05]));
    }

    #[test]
    fn writes_append_little_endian() {
        let mut out = vec![0xff];
        assert_eq!(write_u16(&mut out, 0x0201), 2);
        assert_eq!(write_u32(&mut out, 0x0605_0403), 4);
        assert_eq!(out, vec![0xff, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn short_reads_are_truncation_errors() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(
            u32_at(&data, 0),
            Err(ProtocolError::Truncated {
                needed: 4,
                available: 3
            })
        );
        assert_eq!(
            u16_at(&data, 8),
            Err(ProtocolError::Truncated {
                needed: 10,
                available: 3
            })
        );
    }
}
