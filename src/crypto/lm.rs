use super::{compute_response, des::des_encipher};

pub type LmHash = [u8; 16];

const MAGIC: &[u8; 8] = b"KGS!@#$%";
const MAX_PASSWORD_LEN: usize = 14;

/// Uppercased, written one byte per UTF-16 unit and null-padded to 14 bytes.
fn prepare_password(password: &str) -> [u8; MAX_PASSWORD_LEN] {
    let mut out = [0u8; MAX_PASSWORD_LEN];
    for (slot, unit) in out
        .iter_mut()
        .zip(password.to_uppercase().encode_utf16())
    {
        *slot = unit as u8;
    }
    out
}

/// LM hash. Passwords longer than 14 characters have no LM hash; they get 16 zero bytes.
pub fn lm_hash(password: &str) -> LmHash {
    let mut lm_hash = LmHash::default();
    if password.encode_utf16().count() > MAX_PASSWORD_LEN {
        return lm_hash;
    }

    let password = prepare_password(password);
    let mut key1 = [0u8; 7];
    let mut key2 = [0u8; 7];
    key1.copy_from_slice(&password[..7]);
    key2.copy_from_slice(&password[7..]);

    lm_hash[..8].copy_from_slice(&des_encipher(&key1, MAGIC));
    lm_hash[8..].copy_from_slice(&des_encipher(&key2, MAGIC));

    lm_hash
}

pub fn lm_response(server_challenge: &[u8; 8], lm_hash: &LmHash) -> [u8; 24] {
    compute_response(server_challenge, lm_hash)
}
