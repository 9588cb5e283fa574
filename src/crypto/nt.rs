use super::{compute_response, hmac_md5, md4};
use crate::messages::encoding::utf16le;

pub type NtHash = [u8; 16];

/// MD4 of the UTF-16LE password.
pub fn ntlm_hash(password: &str) -> NtHash {
    md4(&utf16le(password))
}

pub fn ntlm_response(server_challenge: &[u8; 8], nt_hash: &NtHash) -> [u8; 24] {
    compute_response(server_challenge, nt_hash)
}

/// HMAC-MD5 keyed by the NTLM hash over UTF-16LE of `uppercase(username) + target_name`.
pub fn ntlmv2_hash(nt_hash: &NtHash, username: &str, target_name: &str) -> NtHash {
    let identity = format!("{}{}", username.to_uppercase(), target_name);
    hmac_md5(&nt_hash[..], &[&utf16le(&identity)[..]])
}
