//! Codecs for the three NTLM handshake messages.
//!
//! Outbound messages (Type 1 and Type 3) are assembled into a growable buffer, each security
//! buffer taking its offset from the payload length at the time it is appended. The inbound
//! Type 2 message is validated field by field before anything is read from its payload.

pub mod authenticate;
pub mod challenge;
pub mod encoding;
pub mod flags;
pub mod negotiate;
mod security_buffer;
pub mod target_info;
mod utils;

pub use authenticate::{create_type3, Authenticate};
pub use challenge::{decode_type2, Challenge, NtlmVersion};
pub use encoding::Encoding;
pub use flags::Flags;
pub use negotiate::{create_type1, Negotiate};
pub use security_buffer::SecurityBuffer;
pub use target_info::{TargetInfo, TargetInfoKind};

trait NomError<'a>: nom::error::ContextError<&'a [u8]> + nom::error::ParseError<&'a [u8]> {}

impl<'a, E> NomError<'a> for E where
    E: nom::error::ParseError<&'a [u8]> + nom::error::ContextError<&'a [u8]>
{
}

/// Messages are only ever assembled in memory, so encoding cannot fail.
trait Wire<'a>: Sized {
    /// Appends the encoding to `out`, returning the number of bytes written.
    fn serialize_into(&self, out: &mut Vec<u8>) -> usize;

    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.serialize_into(&mut data);
        data
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>;
}

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

/// Scheme prefix of NTLM `Authorization` / `WWW-Authenticate` header values.
pub const SCHEME: &str = "NTLM";

fn to_header(message: &[u8]) -> String {
    format!("{} {}", SCHEME, base64::encode(message))
}

/// Name the local machine reports as its workstation when none is configured. Empty if the
/// host name cannot be read.
pub fn default_workstation() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            log::warn!("cannot read host name, sending no workstation: {}", e);
            String::new()
        }
    }
}
