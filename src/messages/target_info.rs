use std::collections::BTreeMap;
use std::fmt;

use nom::multi::length_data;
use nom::number::complete::le_u16;
use nom::sequence::tuple;

use crate::error::ProtocolError;
use crate::messages::encoding::from_utf16le;

/// Sub-block types of the target information block this crate gives names to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum TargetInfoKind {
    /// NetBIOS computer name.
    Server = 0x0001,
    /// NetBIOS domain name.
    Domain = 0x0002,
    /// DNS computer name.
    Fqdn = 0x0003,
    /// DNS domain name.
    Dns = 0x0004,
    /// DNS forest name.
    ParentDns = 0x0005,
}

impl TargetInfoKind {
    pub fn from_u16(kind: u16) -> Option<Self> {
        match kind {
            0x0001 => Some(Self::Server),
            0x0002 => Some(Self::Domain),
            0x0003 => Some(Self::Fqdn),
            0x0004 => Some(Self::Dns),
            0x0005 => Some(Self::ParentDns),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Server => "SERVER",
            Self::Domain => "DOMAIN",
            Self::Fqdn => "FQDN",
            Self::Dns => "DNS",
            Self::ParentDns => "PARENT_DNS",
        }
    }
}

impl fmt::Display for TargetInfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const EOL: u16 = 0x0000;

/// Payload length a sub-block header claims, or what is left if the header itself is cut short.
fn declared_len(block: &[u8]) -> u16 {
    match block {
        [_, _, lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
        _ => block.len() as u16,
    }
}

/// Target information block of a Type 2 message.
///
/// `raw` is the block exactly as the server sent it and is what goes into the NTLMv2 blob;
/// `entries` is only a convenience view and never serialized back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetInfo {
    pub entries: BTreeMap<TargetInfoKind, String>,
    pub raw: Vec<u8>,
}

impl TargetInfo {
    /// Walks `type(u16) length(u16) payload` sub-blocks until the terminator or the end of
    /// `raw`. Unknown types are skipped.
    pub fn parse(raw: &[u8]) -> Result<Self, ProtocolError> {
        Self::parse_at(raw, 0, raw.len())
    }

    /// Parses a block stored at `offset` of a message of `message_len` bytes. A malformed
    /// sub-block is reported at its position in the message, with its declared length.
    pub(crate) fn parse_at(
        raw: &[u8],
        offset: u32,
        message_len: usize,
    ) -> Result<Self, ProtocolError> {
        let mut entries = BTreeMap::new();
        let mut rest = raw;

        while !rest.is_empty() {
            let (next, (kind, value)) = tuple((le_u16::<_, ()>, length_data(le_u16)))(rest)
                .map_err(|_| ProtocolError::MalformedSecurityBuffer {
                    field: "target info",
                    offset: offset + (raw.len() - rest.len()) as u32,
                    length: declared_len(rest),
                    available: message_len,
                })?;
            if kind == EOL {
                break;
            }
            match TargetInfoKind::from_u16(kind) {
                Some(kind) => {
                    entries.insert(kind, from_utf16le(value));
                }
                None => log::trace!("skipping target info sub-block {:#06x}", kind),
            }
            rest = next;
        }

        Ok(Self {
            entries,
            raw: raw.to_vec(),
        })
    }

    pub fn get(&self, kind: TargetInfoKind) -> Option<&str> {
        self.entries.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
