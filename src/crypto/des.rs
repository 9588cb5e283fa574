use des::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use des::Des;

/// Spreads 56 key bits over the top 7 bits of 8 bytes and sets each low bit to odd parity.
pub fn des_56bits_to_64bits(key7: &[u8; 7]) -> [u8; 8] {
    let mut key8 = [0u8; 8];
    for b in 0..8 {
        let mut v = if b == 0 {
            key7[0]
        } else if b == 7 {
            key7[6] << 1
        } else {
            let a = key7[b - 1] << (8 - b);
            let b = key7[b] >> b;
            a | b
        };
        v &= !1;

        // Set the last bit if the number of set bits are even
        if v.count_ones() % 2 == 0 {
            v |= 1;
        }
        key8[b] = v;
    }

    key8
}

/// Single-block DES-ECB of `message` under the expanded `key7`. No padding, no IV.
pub fn des_encipher(key7: &[u8; 7], message: &[u8; 8]) -> [u8; 8] {
    let key8 = des_56bits_to_64bits(key7);
    let cipher = Des::new(GenericArray::from_slice(&key8));
    let mut block = GenericArray::clone_from_slice(message);
    cipher.encrypt_block(&mut block);
    let mut out = [0u8; 8];
    out.copy_from_slice(block.as_slice());
    out
}
