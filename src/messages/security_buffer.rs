use std::ops::Range;

use nom::error::context;
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;

use crate::error::{CredentialError, ProtocolError};
use crate::messages::{
    utils::{u16_at, u32_at, write_u16, write_u32},
    NomError, Wire,
};

/// No legitimate payload starts before this offset.
pub(super) const MIN_PAYLOAD_OFFSET: u32 = 32;

/// `{ length, allocated, offset }` pointer from a fixed header into the payload.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityBuffer {
    pub len: u16,
    pub max_len: u16,
    pub offset: u32,
}

impl<'a> Wire<'a> for SecurityBuffer {
    fn serialize_into(&self, out: &mut Vec<u8>) -> usize {
        let mut written = 0;
        written += write_u16(out, self.len);
        written += write_u16(out, self.max_len);
        written += write_u32(out, self.offset);
        written
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let (rest, (len, max_len, offset)) =
            context("SecurityBuffer", tuple((le_u16, le_u16, le_u32)))(input)?;

        Ok((
            rest,
            Self {
                len,
                max_len,
                offset,
            },
        ))
    }
}

impl SecurityBuffer {
    pub const fn zeroed() -> Self {
        Self {
            len: 0,
            max_len: 0,
            offset: 0,
        }
    }

    /// Reads the descriptor stored at `at` in `message`. The allocated size is not trusted.
    pub(super) fn read_at(message: &[u8], at: usize) -> Result<Self, ProtocolError> {
        Ok(Self {
            len: u16_at(message, at)?,
            max_len: u16_at(message, at + 2)?,
            offset: u32_at(message, at + 4)?,
        })
    }

    pub(crate) fn get_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        let end = start + self.len as usize;
        start..end
    }

    /// The bytes this buffer points at, after checking it lies inside `message` and past the
    /// fixed header.
    pub(super) fn slice<'a>(
        &self,
        field: &'static str,
        message: &'a [u8],
    ) -> Result<&'a [u8], ProtocolError> {
        let range = self.get_range();
        if self.offset < MIN_PAYLOAD_OFFSET || range.end > message.len() {
            return Err(ProtocolError::MalformedSecurityBuffer {
                field,
                offset: self.offset,
                length: self.len,
                available: message.len(),
            });
        }
        Ok(&message[range])
    }

    /// Appends `value` to `payload` and writes the descriptor pointing at it into `header`.
    /// The offset is the payload length before the append, even for an empty value.
    pub(super) fn append(
        field: &'static str,
        value: &[u8],
        payload: &mut Vec<u8>,
        header: &mut Vec<u8>,
    ) -> Result<usize, CredentialError> {
        let offset: u32 = payload
            .len()
            .try_into()
            .map_err(|_| CredentialError::TooLong { field })?;
        let len: u16 = value
            .len()
            .try_into()
            .map_err(|_| CredentialError::TooLong { field })?;
        payload.extend_from_slice(value);
        Ok(Self {
            len,
            max_len: len,
            offset,
        }
        .serialize_into(header))
    }

    /// Like [`append`](Self::append), but an empty value gets an all-zero descriptor.
    pub(super) fn append_optional(
        field: &'static str,
        value: &[u8],
        payload: &mut Vec<u8>,
        header: &mut Vec<u8>,
    ) -> Result<usize, CredentialError> {
        if value.is_empty() {
            Ok(Self::zeroed().serialize_into(header))
        } else {
            Self::append(field, value, payload, header)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_layout() {
        let buffer = SecurityBuffer {
            len: 0x10,
            max_len: 0x12,
            offset: 0x30,
        };
        pretty_assertions::assert_eq!(
            buffer.serialize(),
            vec![0x10, 0x00, 0x12, 0x00, 0x30, 0x00, 0x00, 0x00]
        );
        let bytes = buffer.serialize();
        let (rest, decoded) = SecurityBuffer::deserialize::<()>(&bytes[..]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn slice_checks_bounds() {
        let message = [0u8; 40];
        let ok = SecurityBuffer {
            len: 8,
            max_len: 8,
            offset: 32,
        };
        assert_eq!(ok.slice("target name", &message).unwrap().len(), 8);

        let before_payload = SecurityBuffer {
            len: 4,
            max_len: 4,
            offset: 31,
        };
        assert_eq!(
            before_payload.slice("target name", &message),
            Err(ProtocolError::MalformedSecurityBuffer {
                field: "target name",
                offset: 31,
                length: 4,
                available: 40,
            })
        );

        let past_end = SecurityBuffer {
            len: 9,
            max_len: 9,
            offset: 32,
        };
        assert!(matches!(
            past_end.slice("target info", &message),
            Err(ProtocolError::MalformedSecurityBuffer { .. })
        ));
    }

    #[test]
    fn append_tracks_offsets() {
        let mut payload = vec![0u8; 32];
        let mut header = Vec::new();
        SecurityBuffer::append("domain", b"DOM", &mut payload, &mut header).unwrap();
        SecurityBuffer::append("user", b"", &mut payload, &mut header).unwrap();
        SecurityBuffer::append_optional("workstation", b"", &mut payload, &mut header).unwrap();
        pretty_assertions::assert_eq!(
            header,
            vec![
                3, 0, 3, 0, 32, 0, 0, 0, //
                0, 0, 0, 0, 35, 0, 0, 0, //
                0, 0, 0, 0, 0, 0, 0, 0,
            ]
        );
        assert_eq!(&payload[32..], b"DOM");
    }

    #[test]
    fn append_writes_after_existing_header() {
        let mut payload = vec![0u8; 40];
        let mut header = b"NTLMSSP\0".to_vec();
        assert_eq!(
            SecurityBuffer::append("user", b"bob", &mut payload, &mut header),
            Ok(8)
        );
        assert_eq!(
            SecurityBuffer::append_optional("domain", b"", &mut payload, &mut header),
            Ok(8)
        );
        assert_eq!(header.len(), 24);
        assert_eq!(&header[8..16], &[3, 0, 3, 0, 40, 0, 0, 0][..]);
        assert_eq!(&header[16..], &[0u8; 8][..]);
    }

    #[test]
    fn append_rejects_oversized_values() {
        let mut payload = Vec::new();
        let mut header = Vec::new();
        let huge = vec![0u8; usize::from(u16::MAX) + 1];
        assert_eq!(
            SecurityBuffer::append("user", &huge, &mut payload, &mut header),
            Err(CredentialError::TooLong { field: "user" })
        );
    }
}
