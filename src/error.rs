//! Error types for the NTLM codec and the negotiating HTTP client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A challenge (or any other inbound NTLM token) that cannot be trusted.
///
/// Decoding stops at the first violation; a corrupted challenge is never answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid NTLM message signature")]
    InvalidSignature,

    #[error("unexpected NTLM message type {found} (expected {expected})")]
    UnexpectedMessageType { expected: u32, found: u32 },

    #[error(
        "malformed {field} security buffer: {length} bytes at offset {offset} in a {available} byte message"
    )]
    MalformedSecurityBuffer {
        field: &'static str,
        offset: u32,
        length: u16,
        available: usize,
    },

    #[error("NTLM message truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("NTLM token is not valid base64")]
    InvalidBase64,

    #[error("no NTLM token found in authenticate header")]
    MissingToken,
}

/// Input the encoder refuses to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("{field} contains characters that cannot be sent as OEM text")]
    NotOem { field: &'static str },

    #[error("{field} is too long for an NTLM security buffer")]
    TooLong { field: &'static str },

    #[error("client nonce must be exactly 16 hexadecimal characters")]
    InvalidNonce,
}

/// Main error type for [`NegotiationClient`](crate::client::NegotiationClient).
#[derive(Debug, Error)]
pub enum Error {
    #[error("NTLM protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("cannot build NTLM message: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("request body cannot be replayed for NTLM authentication")]
    RequestNotReplayable,

    #[error("invalid Authorization header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// The server answered the final handshake message with another `401`.
    #[error("server rejected NTLM authentication ({})", .response.status())]
    Rejected { response: Box<reqwest::Response> },
}

impl Error {
    /// The final response of a rejected handshake, if that is what this error is.
    pub fn into_response(self) -> Option<reqwest::Response> {
        match self {
            Self::Rejected { response } => Some(*response),
            _ => None,
        }
    }
}
