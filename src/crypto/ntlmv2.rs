use std::time::{SystemTime, UNIX_EPOCH};

use super::{hmac_md5, nonce::ClientNonce, nt::NtHash};

/// Milliseconds between 1601-01-01 and 1970-01-01.
const EPOCH_DELTA_MILLIS: u64 = 11_644_473_600_000;
const TICKS_PER_MILLI: u64 = 10_000;

const BLOB_SIGNATURE: [u8; 4] = [0x01, 0x01, 0x00, 0x00];
const RESERVED: [u8; 4] = [0; 4];

/// Windows FILETIME: 100ns ticks since 1601-01-01 UTC.
///
/// Timestamps built from the system clock only carry millisecond precision.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct FileTime {
    pub low: u32,
    pub high: u32,
}

impl FileTime {
    pub fn from_unix_millis(millis: u64) -> Self {
        let ticks = millis
            .saturating_add(EPOCH_DELTA_MILLIS)
            .saturating_mul(TICKS_PER_MILLI);
        Self {
            high: (ticks >> 32) as u32,
            low: (ticks & 0xffff_ffff) as u32,
        }
    }

    pub fn now() -> Self {
        // A clock set before 1970 is treated as the Unix epoch.
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::from_unix_millis(millis)
    }

    pub fn as_u64(&self) -> u64 {
        ((self.high as u64) << 32) | (self.low as u64)
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.as_u64().to_le_bytes()
    }
}

/// HMAC of both challenges keyed by the NTLMv2 hash, followed by the client nonce.
pub fn lmv2_response(
    server_challenge: &[u8; 8],
    ntlmv2_hash: &NtHash,
    client_nonce: &ClientNonce,
) -> [u8; 24] {
    let proof = hmac_md5(
        &ntlmv2_hash[..],
        &[&server_challenge[..], &client_nonce.as_bytes()[..]],
    );
    let mut response = [0u8; 24];
    response[..16].copy_from_slice(&proof);
    response[16..].copy_from_slice(client_nonce.as_bytes());
    response
}

fn blob(client_nonce: &ClientNonce, timestamp: FileTime, target_info: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(32 + target_info.len());
    blob.extend_from_slice(&BLOB_SIGNATURE);
    blob.extend_from_slice(&RESERVED);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_nonce.as_bytes());
    blob.extend_from_slice(&RESERVED);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&RESERVED);
    blob
}

/// NTProofStr (16 bytes) followed by the client blob; `48 + target_info.len()` bytes in total.
///
/// `target_info` is the server's target information block exactly as received.
pub fn ntlmv2_response(
    server_challenge: &[u8; 8],
    ntlmv2_hash: &NtHash,
    client_nonce: &ClientNonce,
    timestamp: FileTime,
    target_info: &[u8],
) -> Vec<u8> {
    let blob = blob(client_nonce, timestamp, target_info);
    let proof = hmac_md5(&ntlmv2_hash[..], &[&server_challenge[..], &blob[..]]);

    let mut response = Vec::with_capacity(proof.len() + blob.len());
    response.extend_from_slice(&proof);
    response.extend_from_slice(&blob);
    response
}
