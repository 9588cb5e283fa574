//! LM, NTLM and NTLMv2 hashing and challenge responses.
//!
//! Everything here is a pure function of its inputs; the only randomness (the client nonce)
//! comes in through [`nonce::NonceSource`].

use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;

pub mod des;
pub mod lm;
pub mod nonce;
pub mod nt;
pub mod ntlmv2;

pub use lm::{lm_hash, lm_response, LmHash};
pub use nonce::{pseudo_random_hex, ClientNonce, NonceSource};
pub use nt::{ntlm_hash, ntlm_response, ntlmv2_hash, NtHash};
pub use ntlmv2::{lmv2_response, ntlmv2_response, FileTime};

pub fn md4(input: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md4::digest(input)[..]);
    out
}

pub fn hmac_md5(key: &[u8], input: &[&[u8]]) -> [u8; 16] {
    // HMAC accepts keys of any length.
    let mut mac = match <Hmac<Md5>>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC keys have no length limit"),
    };
    for part in input {
        mac.update(part);
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&mac.finalize().into_bytes()[..]);
    out
}

/// Zero-pads a 16-byte hash to 21 bytes and DES-enciphers the challenge under each 7-byte third.
pub fn compute_response(server_challenge: &[u8; 8], hash: &[u8; 16]) -> [u8; 24] {
    let mut extended_hash = [0u8; 21];
    extended_hash[..hash.len()].copy_from_slice(hash);
    let mut response = [0u8; 24];

    for (key, out) in extended_hash.chunks_exact(7).zip(response.chunks_exact_mut(8)) {
        let mut key7 = [0u8; 7];
        key7.copy_from_slice(key);
        out.copy_from_slice(&des::des_encipher(&key7, server_challenge));
    }

    response
}
