//! Client nonces for NTLMv2 responses.
//!
//! A nonce travels as 16 lowercase hex characters and is decoded to 8 raw bytes before it is
//! mixed into a response. Where those characters come from is a [`NonceSource`], so a caller
//! can trade the default generator for the OS CSPRNG, or pin the value in tests.

use rand::{rngs::OsRng, Rng};

use crate::error::CredentialError;

/// Hex characters in a client nonce.
pub const NONCE_HEX_LEN: usize = 16;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// `len` lowercase hex characters, one uniform draw in `0..16` per character.
pub fn pseudo_random_hex<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect()
}

/// The 8-byte client challenge of an NTLMv2 response.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ClientNonce([u8; 8]);

impl ClientNonce {
    pub fn from_hex(hex_nonce: &str) -> Result<Self, CredentialError> {
        if hex_nonce.len() != NONCE_HEX_LEN {
            return Err(CredentialError::InvalidNonce);
        }
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(hex_nonce, &mut bytes).map_err(|_| CredentialError::InvalidNonce)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<[u8; 8]> for ClientNonce {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for ClientNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClientNonce")
            .field(&hex::encode(self.0))
            .finish()
    }
}

/// Supplies the hex client nonce for each Type 3 message.
pub trait NonceSource: Send + Sync {
    fn client_nonce_hex(&self) -> String;

    fn client_nonce(&self) -> Result<ClientNonce, CredentialError> {
        ClientNonce::from_hex(&self.client_nonce_hex())
    }
}

/// Thread-local generator. Not a CSPRNG guarantee; see [`OsRngNonce`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PseudoRandomNonce;

impl NonceSource for PseudoRandomNonce {
    fn client_nonce_hex(&self) -> String {
        pseudo_random_hex(&mut rand::thread_rng(), NONCE_HEX_LEN)
    }
}

/// Draws from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngNonce;

impl NonceSource for OsRngNonce {
    fn client_nonce_hex(&self) -> String {
        pseudo_random_hex(&mut OsRng, NONCE_HEX_LEN)
    }
}

/// Always the same nonce.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixedNonce(pub String);

impl NonceSource for FixedNonce {
    fn client_nonce_hex(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn is_lower_hex(s: &str) -> bool {
        s.bytes().all(|b| HEX_DIGITS.contains(&b))
    }

    #[test]
    fn hex_shape() {
        let mut rng = rand::thread_rng();
        for len in [0, 1, 7, 16, 64] {
            let value = pseudo_random_hex(&mut rng, len);
            assert_eq!(value.len(), len);
            assert!(is_lower_hex(&value), "{:?}", value);
        }
        assert_eq!(pseudo_random_hex(&mut rng, 0), "");
    }

    #[test]
    fn draws_differ() {
        let draws: Vec<_> = (0..10).map(|_| PseudoRandomNonce.client_nonce_hex()).collect();
        assert!(draws.iter().any(|d| d != &draws[0]));

        let draws: Vec<_> = (0..10).map(|_| OsRngNonce.client_nonce_hex()).collect();
        assert!(draws.iter().any(|d| d != &draws[0]));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let a = pseudo_random_hex(&mut StdRng::seed_from_u64(7), NONCE_HEX_LEN);
        let b = pseudo_random_hex(&mut StdRng::seed_from_u64(7), NONCE_HEX_LEN);
        assert_eq!(a, b);
    }

    #[test]
    fn from_hex() {
        let nonce = FixedNonce("0123456789abcdef".into()).client_nonce().unwrap();
        assert_eq!(
            nonce.as_bytes(),
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]
        );
        assert_eq!(format!("{:?}", nonce), "ClientNonce(\"0123456789abcdef\")");

        for bad in ["", "0123", "0123456789abcdef00", "0123456789abcdeg"] {
            assert_eq!(
                ClientNonce::from_hex(bad),
                Err(CredentialError::InvalidNonce),
                "{:?}",
                bad
            );
        }
    }
}
