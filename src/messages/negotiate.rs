use crate::error::CredentialError;
use crate::messages::{
    default_workstation,
    flags::{self, Flags},
    to_header,
    utils::write_u32,
    SecurityBuffer, Wire, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x00000001;
const PAYLOAD_OFFSET: usize = 32;

/// Type 1 message. Produced by the client, never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiate {
    pub negotiate_flags: Flags,
    domain_name: String,
    workstation: String,
}

impl Negotiate {
    pub fn new(workstation: impl Into<String>, domain_name: impl Into<String>) -> Self {
        Self {
            negotiate_flags: Self::default_flags(),
            domain_name: domain_name.into(),
            workstation: workstation.into(),
        }
    }

    /// OEM, REQUEST_TARGET, NTLM_KEY, NTLM2_KEY and ALWAYS_SIGN.
    pub fn default_flags() -> Flags {
        Flags::from_bits(&[
            flags::NEGOTIATE_OEM,
            flags::REQUEST_TARGET,
            flags::NEGOTIATE_NTLM_KEY,
            flags::NEGOTIATE_NTLM2_KEY,
            flags::NEGOTIATE_ALWAYS_SIGN,
        ])
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn workstation(&self) -> &str {
        &self.workstation
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CredentialError> {
        let domain = Self::oem("domain", &self.domain_name)?;
        let workstation = Self::oem("workstation", &self.workstation)?;

        let mut payload = vec![0u8; PAYLOAD_OFFSET];
        let mut header = Vec::with_capacity(PAYLOAD_OFFSET + domain.len() + workstation.len());
        header.extend_from_slice(&SIGNATURE[..]);
        write_u32(&mut header, MESSAGE_TYPE);
        self.negotiate_flags.serialize_into(&mut header);
        SecurityBuffer::append_optional("domain", domain, &mut payload, &mut header)?;
        SecurityBuffer::append_optional("workstation", workstation, &mut payload, &mut header)?;
        debug_assert_eq!(header.len(), PAYLOAD_OFFSET);

        header.extend_from_slice(&payload[PAYLOAD_OFFSET..]);
        Ok(header)
    }

    /// `NTLM <base64>`, ready for an `Authorization` header.
    pub fn to_header(&self) -> Result<String, CredentialError> {
        self.to_bytes().map(|bytes| to_header(&bytes))
    }

    // Type 1 strings are always OEM.
    fn oem<'s>(field: &'static str, s: &'s str) -> Result<&'s [u8], CredentialError> {
        if s.is_ascii() {
            Ok(s.as_bytes())
        } else {
            Err(CredentialError::NotOem { field })
        }
    }
}

/// Builds the `NTLM <base64>` negotiate token. A missing workstation defaults to the local host
/// name, a missing domain to none.
pub fn create_type1(
    workstation: Option<&str>,
    domain: Option<&str>,
) -> Result<String, CredentialError> {
    let workstation = workstation.map_or_else(default_workstation, str::to_owned);
    let message = Negotiate::new(workstation, domain.unwrap_or_default());
    log::trace!(
        "type 1: flags={:?} domain={:?} workstation={:?}",
        message.negotiate_flags,
        message.domain_name,
        message.workstation
    );
    message.to_header()
}
