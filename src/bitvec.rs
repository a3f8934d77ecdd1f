//! A fixed-length, byte-aligned bit vector.
//!
//! [`BitVector`] is the wire-level data type of the whole protocol stack: base
//! OT messages, PRG expansions, challenges and masks are all bit vectors whose
//! length is a multiple of 8. Bit `0` of a vector is the most significant bit
//! of byte `0`, so a vector serializes to its backing bytes without any
//! further framing.

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by [`BitVector`] operations.
///
/// These are programmer errors (wrong dimensions, out-of-range indices), not
/// protocol failures; they are never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitVectorError {
    /// Two vectors were combined that do not have the same length.
    #[error("dimension mismatch: expected {expected} bits, got {actual} bits")]
    DimensionMismatch {
        /// Bit length of the left-hand side.
        expected: usize,
        /// Bit length of the right-hand side.
        actual: usize,
    },
    /// A bit index beyond the end of the vector was accessed.
    #[error("bit index {index} out of range for vector of {len} bits")]
    OutOfRange {
        /// The accessed index.
        index: usize,
        /// Bit length of the vector.
        len: usize,
    },
}

/// A fixed-length bit vector backed by a byte buffer.
///
/// The length in bits is always `8 * bytes`. Equality and hashing are
/// structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitVector {
    bytes: Vec<u8>,
}

impl BitVector {
    /// The all-zero vector of the given bit length.
    ///
    /// # Panics
    /// If `bits` is not a multiple of 8.
    pub fn zeros(bits: usize) -> Self {
        assert_eq!(0, bits % 8, "bit length must be a multiple of 8");
        Self {
            bytes: vec![0; bits / 8],
        }
    }

    /// A uniformly random vector of the given bit length.
    ///
    /// # Panics
    /// If `bits` is not a multiple of 8.
    pub fn random<R: CryptoRng + Rng>(bits: usize, rng: &mut R) -> Self {
        assert_eq!(0, bits % 8, "bit length must be a multiple of 8");
        let mut bytes = vec![0; bits / 8];
        rng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wraps the given bytes as a bit vector of `8 * bytes.len()` bits.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The backing bytes, most significant bit first within each byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the vector and returns its backing bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Whether the vector has zero bits.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bit at `index`, where bit 0 is the MSB of byte 0.
    pub fn bit(&self, index: usize) -> Result<bool, BitVectorError> {
        if index >= self.len() {
            return Err(BitVectorError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// Sets the bit at `index` to `value`.
    pub fn set_bit(&mut self, index: usize, value: bool) -> Result<(), BitVectorError> {
        if index >= self.len() {
            return Err(BitVectorError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        let mask = 0x80 >> (index % 8);
        if value {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
        Ok(())
    }

    /// Iterator over the bits of the vector, from bit 0 upwards.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |i| byte & (0x80 >> i) != 0))
    }

    /// XORs `other` into `self`.
    pub fn xor_in_place(&mut self, other: &BitVector) -> Result<(), BitVectorError> {
        if self.len() != other.len() {
            return Err(BitVectorError::DimensionMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a ^= b;
        }
        Ok(())
    }

    /// Concatenation of the given vectors, in order.
    pub fn concat(parts: &[BitVector]) -> Self {
        let mut bytes = Vec::with_capacity(parts.iter().map(|p| p.bytes.len()).sum());
        for part in parts {
            bytes.extend_from_slice(&part.bytes);
        }
        Self { bytes }
    }

    /// The first `bits` bits of the vector as a fresh vector.
    ///
    /// # Panics
    /// If `bits` is not a multiple of 8 or exceeds the length.
    pub fn truncated(&self, bits: usize) -> Self {
        assert_eq!(0, bits % 8, "bit length must be a multiple of 8");
        assert!(bits <= self.len(), "cannot truncate {} to {bits}", self.len());
        Self {
            bytes: self.bytes[..bits / 8].to_vec(),
        }
    }

    /// A byte-aligned sub-vector of `bits` bits starting at `start`.
    ///
    /// # Panics
    /// If `start` or `bits` is not a multiple of 8, or the range exceeds the
    /// vector.
    pub fn slice(&self, start: usize, bits: usize) -> Self {
        assert_eq!(0, start % 8, "slice start must be byte aligned");
        assert_eq!(0, bits % 8, "slice length must be a multiple of 8");
        assert!(start + bits <= self.len(), "slice out of range");
        Self {
            bytes: self.bytes[start / 8..(start + bits) / 8].to_vec(),
        }
    }

    /// Carry-less (GF(2)[x]) product of `self` and `other`, without modular
    /// reduction. The result has `self.len() + other.len()` bits; callers XOR
    /// several such products together to evaluate linear combinations over a
    /// binary extension field.
    pub fn carryless_mul(&self, other: &BitVector) -> BitVector {
        let mut product = BitVector::zeros(self.len() + other.len());
        for (i, bit) in self.bits().enumerate() {
            if !bit {
                continue;
            }
            // XOR `other`, shifted down by i bits, into the product. Bit j of
            // `other` lands at bit i + j.
            let byte_shift = i / 8;
            let bit_shift = i % 8;
            for (k, &b) in other.bytes.iter().enumerate() {
                product.bytes[byte_shift + k] ^= b >> bit_shift;
                if bit_shift > 0 {
                    product.bytes[byte_shift + k + 1] ^= b << (8 - bit_shift);
                }
            }
        }
        product
    }
}

/// XOR of `rows[j]` over all `j` where bit `j` of `bits` is set.
///
/// All rows must have the same length and there must be one row per bit.
pub fn bit_linear_combination(
    bits: &BitVector,
    rows: &[BitVector],
) -> Result<BitVector, BitVectorError> {
    if bits.len() != rows.len() {
        return Err(BitVectorError::DimensionMismatch {
            expected: bits.len(),
            actual: rows.len(),
        });
    }
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut acc = BitVector::zeros(width);
    for (bit, row) in bits.bits().zip(rows) {
        if bit {
            acc.xor_in_place(row)?;
        }
    }
    Ok(acc)
}

impl std::ops::BitXor<&BitVector> for &BitVector {
    type Output = BitVector;

    /// # Panics
    /// If the lengths differ; use [`BitVector::xor_in_place`] for checked XOR.
    fn bitxor(self, rhs: &BitVector) -> BitVector {
        let mut out = self.clone();
        out.xor_in_place(rhs)
            .expect("XORed bit vectors of unequal length");
        out
    }
}

impl std::ops::BitXorAssign<&BitVector> for BitVector {
    /// # Panics
    /// If the lengths differ; use [`BitVector::xor_in_place`] for checked XOR.
    fn bitxor_assign(&mut self, rhs: &BitVector) {
        self.xor_in_place(rhs)
            .expect("XORed bit vectors of unequal length");
    }
}
