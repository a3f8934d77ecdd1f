//! BLAKE3 helpers: the index-tweaked hash that strips the algebraic
//! correlation from extended OT rows, and the counter-indexed stream used to
//! stretch a short key over an arbitrary-length message.

use crate::bitvec::BitVector;

/// Hashes `index ‖ row` to a fixed 256-bit digest.
///
/// Used on the surviving rows of a random-OT extension; without the index
/// tweak, equal rows would hash to equal messages across instances.
pub(crate) fn index_hash(index: usize, row: &BitVector) -> BitVector {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(index as u64).to_be_bytes());
    hasher.update(row.as_bytes());
    BitVector::from_bytes(hasher.finalize().as_bytes().to_vec())
}

/// The first `n` bytes of the counter-indexed hash stream of `key`.
fn stretch(key: &[u8], n: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n);
    let mut counter = 0u64;
    while out.len() < n {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&counter.to_be_bytes());
        hasher.update(key);
        out.extend_from_slice(hasher.finalize().as_bytes());
        counter += 1;
    }
    out.truncate(n);
    out
}

/// Truncates or stretches `key` to exactly `bits` bits.
///
/// # Panics
/// If `bits` is not a multiple of 8.
pub(crate) fn adjust_key(key: &BitVector, bits: usize) -> BitVector {
    assert_eq!(0, bits % 8, "bit length must be a multiple of 8");
    if key.len() >= bits {
        key.truncated(bits)
    } else {
        BitVector::from_bytes(stretch(key.as_bytes(), bits / 8))
    }
}

/// Masks `msg` with `key`: XOR with the key bytes if the key is long enough,
/// otherwise with the counter-indexed stretch of the key.
///
/// Masking is symmetric; applying it twice with the same key yields `msg`.
pub(crate) fn mask(msg: &[u8], key: &BitVector) -> Vec<u8> {
    let key_bytes = key.as_bytes();
    if key_bytes.len() >= msg.len() {
        msg.iter().zip(key_bytes).map(|(m, k)| m ^ k).collect()
    } else {
        let stream = stretch(key_bytes, msg.len());
        msg.iter().zip(stream).map(|(m, k)| m ^ k).collect()
    }
}
