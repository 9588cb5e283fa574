use crate::crypto::{
    lm_hash, lm_response, lmv2_response, ntlm_hash, ntlm_response, ntlmv2_hash, ntlmv2_response,
    ClientNonce, FileTime, NonceSource,
};
use crate::error::CredentialError;
use crate::messages::{
    default_workstation, to_header, utils::write_u32, Challenge, Encoding, Flags, NtlmVersion,
    SecurityBuffer, Wire, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x00000003;
const V1_PAYLOAD_OFFSET: usize = 52;
const V2_PAYLOAD_OFFSET: usize = 64;

/// Type 3 message, answering one [`Challenge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticate {
    pub version: NtlmVersion,
    pub encoding: Encoding,
    /// Echoed from the challenge; only written in NTLMv2 messages.
    pub negotiate_flags: Flags,
    pub lm_response: Vec<u8>,
    pub nt_response: Vec<u8>,
    pub target_name: String,
    pub user_name: String,
    pub workstation: String,
}

impl Authenticate {
    /// Computes the responses to `challenge`. `nonce` and `timestamp` only matter for NTLMv2.
    pub fn respond(
        challenge: &Challenge,
        username: &str,
        password: &str,
        workstation: &str,
        target_name: &str,
        nonce: &ClientNonce,
        timestamp: FileTime,
    ) -> Self {
        let nt_hash = ntlm_hash(password);
        let (lm_response, nt_response) = match challenge.version {
            NtlmVersion::V1 => (
                lm_response(&challenge.server_challenge, &lm_hash(password)).to_vec(),
                ntlm_response(&challenge.server_challenge, &nt_hash).to_vec(),
            ),
            NtlmVersion::V2 => {
                let v2_hash = ntlmv2_hash(&nt_hash, username, target_name);
                (
                    lmv2_response(&challenge.server_challenge, &v2_hash, nonce).to_vec(),
                    ntlmv2_response(
                        &challenge.server_challenge,
                        &v2_hash,
                        nonce,
                        timestamp,
                        challenge.target_info_raw(),
                    ),
                )
            }
        };

        Self {
            version: challenge.version,
            encoding: challenge.encoding,
            negotiate_flags: challenge.negotiate_flags,
            lm_response,
            nt_response,
            target_name: target_name.to_owned(),
            user_name: username.to_owned(),
            workstation: workstation.to_owned(),
        }
    }

    fn payload_offset(&self) -> usize {
        match self.version {
            NtlmVersion::V1 => V1_PAYLOAD_OFFSET,
            NtlmVersion::V2 => V2_PAYLOAD_OFFSET,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CredentialError> {
        let target_name = self.encoding.encode("target name", &self.target_name)?;
        let user_name = self.encoding.encode("user name", &self.user_name)?;
        let workstation = self.encoding.encode("workstation", &self.workstation)?;

        let payload_offset = self.payload_offset();
        let mut payload = vec![0u8; payload_offset];
        let mut header = Vec::with_capacity(
            payload_offset
                + self.lm_response.len()
                + self.nt_response.len()
                + target_name.len()
                + user_name.len()
                + workstation.len(),
        );
        header.extend_from_slice(&SIGNATURE[..]);
        write_u32(&mut header, MESSAGE_TYPE);
        SecurityBuffer::append("lm response", &self.lm_response, &mut payload, &mut header)?;
        SecurityBuffer::append("nt response", &self.nt_response, &mut payload, &mut header)?;
        SecurityBuffer::append("target name", &target_name, &mut payload, &mut header)?;
        SecurityBuffer::append("user name", &user_name, &mut payload, &mut header)?;
        SecurityBuffer::append("workstation", &workstation, &mut payload, &mut header)?;
        if self.version == NtlmVersion::V2 {
            // No session key.
            SecurityBuffer::zeroed().serialize_into(&mut header);
            self.negotiate_flags.serialize_into(&mut header);
        }
        debug_assert_eq!(header.len(), payload_offset);

        header.extend_from_slice(&payload[payload_offset..]);
        Ok(header)
    }

    /// `NTLM <base64>`, ready for an `Authorization` header.
    pub fn to_header(&self) -> Result<String, CredentialError> {
        self.to_bytes().map(|bytes| to_header(&bytes))
    }
}

/// Builds the `NTLM <base64>` authenticate token answering `challenge`.
///
/// A missing workstation defaults to the local host name and a missing target to the challenge's
/// target name. The NTLMv2 client nonce is drawn from `nonces`.
pub fn create_type3(
    challenge: &Challenge,
    username: &str,
    password: &str,
    workstation: Option<&str>,
    target: Option<&str>,
    nonces: &dyn NonceSource,
) -> Result<String, CredentialError> {
    let workstation = workstation.map_or_else(default_workstation, str::to_owned);
    let target = target.unwrap_or(&challenge.target_name);
    let nonce = match challenge.version {
        NtlmVersion::V1 => ClientNonce::from([0u8; 8]),
        NtlmVersion::V2 => nonces.client_nonce()?,
    };

    let message = Authenticate::respond(
        challenge,
        username,
        password,
        &workstation,
        target,
        &nonce,
        FileTime::now(),
    );
    log::trace!(
        "type 3: {:?} {:?} lm={}B nt={}B target={:?} user={:?} workstation={:?}",
        message.version,
        message.encoding,
        message.lm_response.len(),
        message.nt_response.len(),
        message.target_name,
        message.user_name,
        message.workstation
    );
    message.to_header()
}
