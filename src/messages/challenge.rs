use std::fmt;

use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};

use crate::error::ProtocolError;
use crate::messages::{
    flags::{self, Flags},
    utils::{bytes_at, u32_at},
    Encoding, SecurityBuffer, TargetInfo, SCHEME, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x00000002;

const TARGET_NAME_FIELD: usize = 12;
const FLAGS_FIELD: usize = 20;
const CHALLENGE_FIELD: usize = 24;
const TARGET_INFO_FIELD: usize = 40;

/// Which response family a challenge is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NtlmVersion {
    /// LM and NTLM responses.
    V1,
    /// LMv2 and NTLMv2 responses, chosen when the server sets `NEGOTIATE_NTLM2_KEY`.
    V2,
}

/// Decoded Type 2 message.
#[derive(Clone, PartialEq, Eq)]
pub struct Challenge {
    pub negotiate_flags: Flags,
    pub encoding: Encoding,
    pub version: NtlmVersion,
    pub server_challenge: [u8; 8],
    pub target_name: String,
    /// Present only when the server set `NEGOTIATE_TARGET_INFO`.
    pub target_info: Option<TargetInfo>,
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenge")
            .field("negotiate_flags", &self.negotiate_flags)
            .field("encoding", &self.encoding)
            .field("version", &self.version)
            .field("server_challenge", &hex::encode(self.server_challenge))
            .field("target_name", &self.target_name)
            .field("target_info", &self.target_info.as_ref().map(|ti| &ti.entries))
            .finish()
    }
}

impl Challenge {
    pub fn decode(input: &[u8]) -> Result<Self, ProtocolError> {
        match input.get(..SIGNATURE.len()) {
            Some(signature) if signature == &SIGNATURE[..] => {}
            _ => return Err(ProtocolError::InvalidSignature),
        }
        let message_type = u32_at(input, SIGNATURE.len())?;
        if message_type != MESSAGE_TYPE {
            return Err(ProtocolError::UnexpectedMessageType {
                expected: MESSAGE_TYPE,
                found: message_type,
            });
        }

        let negotiate_flags = Flags(u32_at(input, FLAGS_FIELD)?);
        let encoding = if negotiate_flags.has_flag(flags::NEGOTIATE_OEM) {
            Encoding::Ascii
        } else {
            Encoding::Utf16Le
        };
        let version = if negotiate_flags.has_flag(flags::NEGOTIATE_NTLM2_KEY) {
            NtlmVersion::V2
        } else {
            NtlmVersion::V1
        };
        let server_challenge = bytes_at::<8>(input, CHALLENGE_FIELD)?;

        let target_name_field = SecurityBuffer::read_at(input, TARGET_NAME_FIELD)?;
        let target_name = if target_name_field.len == 0 {
            String::new()
        } else {
            encoding.decode(target_name_field.slice("target name", input)?)
        };

        let target_info = if negotiate_flags.has_flag(flags::NEGOTIATE_TARGET_INFO) {
            let target_info_field = SecurityBuffer::read_at(input, TARGET_INFO_FIELD)?;
            if target_info_field.len == 0 {
                log::warn!("challenge advertises target info but the block is empty");
                Some(TargetInfo::default())
            } else {
                let raw = target_info_field.slice("target info", input)?;
                Some(TargetInfo::parse_at(raw, target_info_field.offset, input.len())?)
            }
        } else {
            None
        };

        let challenge = Self {
            negotiate_flags,
            encoding,
            version,
            server_challenge,
            target_name,
            target_info,
        };
        log::trace!("decoded type 2: {:?}", challenge);
        Ok(challenge)
    }

    /// Decodes a base64 token, with or without its `NTLM ` prefix.
    pub fn from_header(value: &str) -> Result<Self, ProtocolError> {
        let token = extract_token(value);
        if token.is_empty() {
            return Err(ProtocolError::MissingToken);
        }
        let message = base64::decode(token).map_err(|_| ProtocolError::InvalidBase64)?;
        Self::decode(&message)
    }

    /// Decodes the first NTLM token among the response's `WWW-Authenticate` values.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ProtocolError> {
        let token = headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .find(|segment| segment.starts_with(SCHEME) && !extract_token(segment).is_empty())
            .ok_or(ProtocolError::MissingToken)?;
        Self::from_header(token)
    }

    /// The raw target information bytes to echo in an NTLMv2 response (empty if none).
    pub fn target_info_raw(&self) -> &[u8] {
        self.target_info
            .as_ref()
            .map(|ti| ti.raw.as_slice())
            .unwrap_or_default()
    }
}

impl TryFrom<&str> for Challenge {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_header(value)
    }
}

impl TryFrom<&HeaderMap> for Challenge {
    type Error = ProtocolError;

    fn try_from(headers: &HeaderMap) -> Result<Self, Self::Error> {
        Self::from_headers(headers)
    }
}

/// The base64 part of `NTLM <token>[, other schemes]`; a value without the prefix is taken as a
/// bare token.
fn extract_token(value: &str) -> &str {
    let value = value.trim();
    match value.strip_prefix(SCHEME) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest
            .trim_start()
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or_default(),
        Some("") => "",
        _ => value,
    }
}

/// Decodes a Type 2 message from an `NTLM <base64>` header value or a bare token.
pub fn decode_type2(header: &str) -> Result<Challenge, ProtocolError> {
    Challenge::from_header(header)
}
