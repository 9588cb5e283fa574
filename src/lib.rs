//! NTLM authentication for HTTP clients.
//!
//! [`messages`] encodes the Type 1 and Type 3 messages and decodes Type 2 challenges,
//! [`crypto`] holds the LM, NTLM and NTLMv2 response computations, and [`client`] wraps a
//! `reqwest` client so that `401` NTLM challenges are answered transparently.

pub mod client;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod messages;

pub use client::{ClientBuilder, NegotiationClient};
pub use credentials::Credentials;
pub use error::{CredentialError, Error, ProtocolError, Result};
pub use messages::{create_type1, create_type3, decode_type2};
