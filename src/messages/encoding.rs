use crate::error::CredentialError;

/// Character set of the strings carried in Type 2 and Type 3 messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// OEM code page; only ASCII is sent.
    Ascii,
    Utf16Le,
}

impl Encoding {
    pub fn encode(self, field: &'static str, s: &str) -> Result<Vec<u8>, CredentialError> {
        match self {
            Self::Ascii if s.is_ascii() => Ok(s.as_bytes().to_vec()),
            Self::Ascii => Err(CredentialError::NotOem { field }),
            Self::Utf16Le => Ok(utf16le(s)),
        }
    }

    /// Decodes server-supplied text. Invalid sequences are replaced rather than rejected.
    pub fn decode(self, data: &[u8]) -> String {
        match self {
            Self::Ascii => data.iter().map(|b| char::from(*b)).collect(),
            Self::Utf16Le => from_utf16le(data),
        }
    }
}

pub fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// A trailing odd byte is ignored.
pub fn from_utf16le(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
