use std::fmt;

use crate::messages::{utils::write_u32, NomError, Wire};

use nom::combinator::map;
use nom::error::context;
use nom::number::complete::le_u32;

// Each constant is the bit index of the flag inside the 32-bit negotiate flags field.

/// Indicates that Unicode strings are supported for use in security buffer data.
pub const NEGOTIATE_UNICODE: u32 = 0;

/// Indicates that OEM strings are supported for use in security buffer data. A challenge with
/// this bit set is answered with OEM (ASCII) strings.
pub const NEGOTIATE_OEM: u32 = 1;

/// Requests that the server's authentication realm be included in the Type 2 message.
pub const REQUEST_TARGET: u32 = 2;

/// Unused bit.
pub const UNKNOWN_3: u32 = 3;

/// Requests that authenticated traffic carry a digital signature.
pub const NEGOTIATE_SIGN: u32 = 4;

/// Requests that authenticated traffic be encrypted.
pub const NEGOTIATE_SEAL: u32 = 5;

/// Indicates that datagram authentication is being used.
pub const NEGOTIATE_DATAGRAM_STYLE: u32 = 6;

/// Requests the LAN Manager session key for signing and sealing.
pub const NEGOTIATE_LM_KEY: u32 = 7;

/// Netware authentication, unused in practice.
pub const NEGOTIATE_NETWARE: u32 = 8;

/// Indicates that NTLM authentication is being used.
pub const NEGOTIATE_NTLM_KEY: u32 = 9;

/// Unused bit.
pub const UNKNOWN_10: u32 = 10;

/// Sent in the Type 3 message when an anonymous context has been established.
pub const NEGOTIATE_ANONYMOUS: u32 = 11;

/// Sent in the Type 1 message when a domain is included.
pub const NEGOTIATE_DOMAIN_SUPPLIED: u32 = 12;

/// Sent in the Type 1 message when a workstation name is included.
pub const NEGOTIATE_WORKSTATION_SUPPLIED: u32 = 13;

/// Sent by the server when client and server are on the same machine.
pub const NEGOTIATE_LOCAL_CALL: u32 = 14;

/// Requests a "dummy" signature on authenticated traffic.
pub const NEGOTIATE_ALWAYS_SIGN: u32 = 15;

/// The target name of the Type 2 message is a domain.
pub const TARGET_TYPE_DOMAIN: u32 = 16;

/// The target name of the Type 2 message is a server.
pub const TARGET_TYPE_SERVER: u32 = 17;

/// The target name of the Type 2 message is a share.
pub const TARGET_TYPE_SHARE: u32 = 18;

/// NTLM2 (extended session security) scheme. A challenge with this bit set is answered with
/// LMv2/NTLMv2 responses.
pub const NEGOTIATE_NTLM2_KEY: u32 = 19;

/// Identify-level token, unused by this client.
pub const REQUEST_INIT_RESPONSE: u32 = 20;

/// Unused by this client.
pub const REQUEST_ACCEPT_RESPONSE: u32 = 21;

/// Requests the LM session key.
pub const REQUEST_NON_NT_SESSION_KEY: u32 = 22;

/// The Type 2 message carries a target information block.
pub const NEGOTIATE_TARGET_INFO: u32 = 23;

/// Unused bit.
pub const UNKNOWN_24: u32 = 24;

/// The message carries an OS version structure.
pub const NEGOTIATE_VERSION: u32 = 25;

/// Unused bit.
pub const UNKNOWN_26: u32 = 26;

/// Unused bit.
pub const UNKNOWN_27: u32 = 27;

/// Unused bit.
pub const UNKNOWN_28: u32 = 28;

/// 128-bit encryption is supported.
pub const NEGOTIATE_128: u32 = 29;

/// The client provides an encrypted master key in the Type 3 session key field.
pub const NEGOTIATE_KEY_EXCHANGE: u32 = 30;

/// 56-bit encryption is supported.
pub const NEGOTIATE_56: u32 = 31;

const NAMES: [(u32, &str); 26] = [
    (NEGOTIATE_UNICODE, "NEGOTIATE_UNICODE"),
    (NEGOTIATE_OEM, "NEGOTIATE_OEM"),
    (REQUEST_TARGET, "REQUEST_TARGET"),
    (NEGOTIATE_SIGN, "NEGOTIATE_SIGN"),
    (NEGOTIATE_SEAL, "NEGOTIATE_SEAL"),
    (NEGOTIATE_DATAGRAM_STYLE, "NEGOTIATE_DATAGRAM_STYLE"),
    (NEGOTIATE_LM_KEY, "NEGOTIATE_LM_KEY"),
    (NEGOTIATE_NETWARE, "NEGOTIATE_NETWARE"),
    (NEGOTIATE_NTLM_KEY, "NEGOTIATE_NTLM_KEY"),
    (NEGOTIATE_ANONYMOUS, "NEGOTIATE_ANONYMOUS"),
    (NEGOTIATE_DOMAIN_SUPPLIED, "NEGOTIATE_DOMAIN_SUPPLIED"),
    (NEGOTIATE_WORKSTATION_SUPPLIED, "NEGOTIATE_WORKSTATION_SUPPLIED"),
    (NEGOTIATE_LOCAL_CALL, "NEGOTIATE_LOCAL_CALL"),
    (NEGOTIATE_ALWAYS_SIGN, "NEGOTIATE_ALWAYS_SIGN"),
    (TARGET_TYPE_DOMAIN, "TARGET_TYPE_DOMAIN"),
    (TARGET_TYPE_SERVER, "TARGET_TYPE_SERVER"),
    (TARGET_TYPE_SHARE, "TARGET_TYPE_SHARE"),
    (NEGOTIATE_NTLM2_KEY, "NEGOTIATE_NTLM2_KEY"),
    (REQUEST_INIT_RESPONSE, "REQUEST_INIT_RESPONSE"),
    (REQUEST_ACCEPT_RESPONSE, "REQUEST_ACCEPT_RESPONSE"),
    (REQUEST_NON_NT_SESSION_KEY, "REQUEST_NON_NT_SESSION_KEY"),
    (NEGOTIATE_TARGET_INFO, "NEGOTIATE_TARGET_INFO"),
    (NEGOTIATE_VERSION, "NEGOTIATE_VERSION"),
    (NEGOTIATE_128, "NEGOTIATE_128"),
    (NEGOTIATE_KEY_EXCHANGE, "NEGOTIATE_KEY_EXCHANGE"),
    (NEGOTIATE_56, "NEGOTIATE_56"),
];

/// The raw negotiate flags field. Bits this crate has no name for are kept as received.
#[derive(PartialEq, Eq, Copy, Clone, Default)]
#[repr(transparent)]
pub struct Flags(pub u32);

impl<'a> Wire<'a> for Flags {
    fn serialize_into(&self, out: &mut Vec<u8>) -> usize {
        write_u32(out, self.0)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        context("Flags", map(le_u32, Self))(input)
    }
}

impl Flags {
    pub fn from_bits(bits: &[u32]) -> Self {
        let mut flags = Self(0);
        for bit in bits {
            flags.set_flag(*bit);
        }
        flags
    }

    pub fn has_flag(&self, bit: u32) -> bool {
        debug_assert!(bit <= 31);
        self.0 & (1 << bit) != 0
    }

    pub fn set_flag(&mut self, bit: u32) {
        debug_assert!(bit <= 31);
        self.0 |= 1 << bit;
    }

    pub fn clear_flag(&mut self, bit: u32) {
        debug_assert!(bit <= 31);
        self.0 &= !(1 << bit);
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.has_flag(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                rest &= !(1 << bit);
                first = false;
            }
        }
        if rest != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{:#010x}", rest)?;
        } else if first {
            f.write_str("(empty)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions() {
        assert_eq!(1 << NEGOTIATE_UNICODE, 0x0000_0001);
        assert_eq!(1 << NEGOTIATE_OEM, 0x0000_0002);
        assert_eq!(1 << REQUEST_TARGET, 0x0000_0004);
        assert_eq!(1 << NEGOTIATE_NTLM_KEY, 0x0000_0200);
        assert_eq!(1 << NEGOTIATE_ALWAYS_SIGN, 0x0000_8000);
        assert_eq!(1 << NEGOTIATE_NTLM2_KEY, 0x0008_0000);
        assert_eq!(1 << NEGOTIATE_TARGET_INFO, 0x0080_0000);
        assert_eq!(1 << NEGOTIATE_128, 0x2000_0000);
        assert_eq!(1u32 << NEGOTIATE_56, 0x8000_0000);
    }

    #[test]
    fn set_and_clear() {
        let mut flags = Flags::from_bits(&[NEGOTIATE_OEM, REQUEST_TARGET]);
        assert_eq!(flags.0, 0x6);
        flags.set_flag(NEGOTIATE_NTLM2_KEY);
        assert!(flags.has_flag(NEGOTIATE_NTLM2_KEY));
        flags.clear_flag(NEGOTIATE_OEM);
        assert!(!flags.has_flag(NEGOTIATE_OEM));
        assert_eq!(flags.0, 0x0008_0004);
    }

    #[test]
    fn debug_names_known_and_unknown_bits() {
        let flags = Flags((1 << NEGOTIATE_UNICODE) | (1 << UNKNOWN_27));
        assert_eq!(format!("{:?}", flags), "NEGOTIATE_UNICODE|0x08000000");
        assert_eq!(format!("{:?}", Flags(0)), "(empty)");
    }

    #[test]
    fn wire_keeps_every_bit() {
        let flags = Flags(0xa289_8205 | (1 << UNKNOWN_3));
        let bytes = flags.serialize();
        let (rest, decoded) = Flags::deserialize::<()>(&bytes[..]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, flags);
    }
}
