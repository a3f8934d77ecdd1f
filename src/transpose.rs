//! Bit-matrix transposition via Eklundh's algorithm.
//!
//! The matrix is given as equal-length bit rows. Each 8×8-bit block is
//! transposed in place with a 64-bit shift/mask kernel, then Eklundh's
//! doubling pass swaps ever larger off-diagonal byte blocks until every block
//! sits at its transposed position. Both dimensions must be 8 times a power
//! of two; the OT extension layers only ever pass square κ×κ chunks.

use thiserror::Error;

use crate::bitvec::BitVector;

/// The input matrix cannot be transposed by Eklundh's algorithm.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidShape {
    /// The number of rows is not 8 times a power of two.
    #[error("row count {rows} must be 8 * 2^x for an integer x >= 0")]
    RowCount {
        /// The offending row count.
        rows: usize,
    },
    /// The number of columns is not 8 times a power of two.
    #[error("column count {bits} must be 8 * 2^y for an integer y >= 0")]
    ColumnCount {
        /// The offending column count in bits.
        bits: usize,
    },
    /// Not all rows have the same length.
    #[error("all rows must have {expected} bits, found a row with {actual} bits")]
    RaggedRows {
        /// Bit length of the first row.
        expected: usize,
        /// Bit length of the offending row.
        actual: usize,
    },
}

fn valid_dimension(bits: usize) -> bool {
    bits % 8 == 0 && (bits / 8).is_power_of_two()
}

/// Transposes a matrix of `m` rows of `c` bits each into `c` rows of `m` bits.
///
/// Requires `m = 8 * 2^x` and `c = 8 * 2^y`; `transpose(transpose(M)) == M`.
pub fn transpose(rows: &[BitVector]) -> Result<Vec<BitVector>, InvalidShape> {
    let m = rows.len();
    if !valid_dimension(m) {
        return Err(InvalidShape::RowCount { rows: m });
    }
    let c = rows[0].len();
    if !valid_dimension(c) {
        return Err(InvalidShape::ColumnCount { bits: c });
    }
    for row in rows {
        if row.len() != c {
            return Err(InvalidShape::RaggedRows {
                expected: c,
                actual: row.len(),
            });
        }
    }

    if m == c {
        let mut grid = flatten(rows, 0, c);
        transpose_square(&mut grid, m);
        Ok(unflatten(&grid, c, m))
    } else if c > m {
        // Wide matrix: transpose each m×m vertical slice and stack the
        // results, top to bottom.
        let mut out = Vec::with_capacity(c);
        for chunk in 0..c / m {
            let mut grid = flatten(rows, chunk * m, m);
            transpose_square(&mut grid, m);
            out.extend(unflatten(&grid, m, m));
        }
        Ok(out)
    } else {
        // Tall matrix: transpose each c×c horizontal slice and concatenate
        // the resulting rows, left to right.
        let chunks: Vec<Vec<BitVector>> = (0..m / c)
            .map(|chunk| {
                let mut grid = flatten(&rows[chunk * c..(chunk + 1) * c], 0, c);
                transpose_square(&mut grid, c);
                unflatten(&grid, c, c)
            })
            .collect();
        Ok((0..c)
            .map(|j| {
                BitVector::concat(&chunks.iter().map(|ch| ch[j].clone()).collect::<Vec<_>>())
            })
            .collect())
    }
}

/// Copies `cols` bits of each row, starting at bit `col_offset`, into a flat
/// row-major byte grid.
fn flatten(rows: &[BitVector], col_offset: usize, cols: usize) -> Vec<u8> {
    let w = cols / 8;
    let start = col_offset / 8;
    let mut grid = Vec::with_capacity(rows.len() * w);
    for row in rows {
        grid.extend_from_slice(&row.as_bytes()[start..start + w]);
    }
    grid
}

fn unflatten(grid: &[u8], rows: usize, cols: usize) -> Vec<BitVector> {
    let w = cols / 8;
    (0..rows)
        .map(|r| BitVector::from_bytes(grid[r * w..(r + 1) * w].to_vec()))
        .collect()
}

/// In-place transpose of an n×n bit matrix stored as a row-major byte grid.
fn transpose_square(grid: &mut [u8], n: usize) {
    let w = n / 8;

    // Pass 1: transpose every 8×8 bit block in place.
    for block_row in 0..w {
        for block_col in 0..w {
            let mut x = 0u64;
            for k in 0..8 {
                x = x << 8 | grid[(block_row * 8 + k) * w + block_col] as u64;
            }
            x = transpose_8x8(x);
            for k in 0..8 {
                grid[(block_row * 8 + k) * w + block_col] = (x >> (8 * (7 - k))) as u8;
            }
        }
    }

    // Pass 2: Eklundh's doubling. With block size s doubling from one byte up
    // to w/2 bytes, swap the off-diagonal s×s block groups, which are 8*s bit
    // rows (and s bytes) apart.
    let mut s = 1;
    while s < w {
        for block_row in (0..w).step_by(2 * s) {
            for block_col in (0..w).step_by(2 * s) {
                for i in 0..s {
                    for j in 0..s {
                        swap_block(
                            grid,
                            w,
                            block_row + i,
                            block_col + s + j,
                            block_row + s + i,
                            block_col + j,
                        );
                    }
                }
            }
        }
        s *= 2;
    }
}

/// Swaps the 8×8 bit blocks at byte-grid cells (r1, c1) and (r2, c2).
fn swap_block(grid: &mut [u8], w: usize, r1: usize, c1: usize, r2: usize, c2: usize) {
    for k in 0..8 {
        grid.swap((r1 * 8 + k) * w + c1, (r2 * 8 + k) * w + c2);
    }
}

/// Transposes an 8×8 bit matrix packed into a `u64` with row 0 in the most
/// significant byte and bit 0 of each row in the most significant bit.
fn transpose_8x8(mut x: u64) -> u64 {
    let mut t = (x ^ (x >> 7)) & 0x00AA00AA00AA00AA;
    x = x ^ t ^ (t << 7);
    t = (x ^ (x >> 14)) & 0x0000CCCC0000CCCC;
    x = x ^ t ^ (t << 14);
    t = (x ^ (x >> 28)) & 0x00000000F0F0F0F0;
    x ^ t ^ (t << 28)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn naive_transpose(rows: &[BitVector]) -> Vec<BitVector> {
        let m = rows.len();
        let c = rows[0].len();
        let mut out = vec![BitVector::zeros(m); c];
        for (i, row) in rows.iter().enumerate() {
            for (j, bit) in row.bits().enumerate() {
                out[j].set_bit(i, bit).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_single_block_pattern() {
        // Transposing the rows [0xFF, 0, 0, 0x01, 0, 0, 0, 0xFF] yields 0x81
        // in the first seven rows and 0x91 in the last.
        let rows: Vec<BitVector> = [0xFF, 0, 0, 0x01, 0, 0, 0, 0xFF]
            .into_iter()
            .map(|b| BitVector::from_bytes(vec![b]))
            .collect();
        let t = transpose(&rows).unwrap();
        for row in &t[..7] {
            assert_eq!(&[0x81], row.as_bytes());
        }
        assert_eq!(&[0x91], t[7].as_bytes());
    }

    #[test]
    fn test_16x16_pattern() {
        // Rows 0 and 7 all ones, everything else zero: every transposed row
        // holds exactly the bits 0 and 7.
        let mut rows = vec![BitVector::zeros(16); 16];
        rows[0] = BitVector::from_bytes(vec![0xFF, 0xFF]);
        rows[7] = BitVector::from_bytes(vec![0xFF, 0xFF]);
        let t = transpose(&rows).unwrap();
        for row in &t {
            assert_eq!(&[0b1000_0001, 0x00], row.as_bytes());
        }
        assert_eq!(naive_transpose(&rows), t);
    }

    #[test]
    fn test_rectangular_shapes() {
        let mut rng = StdRng::seed_from_u64(11);
        for (m, c) in [(8, 32), (32, 8), (16, 64), (64, 16)] {
            let rows: Vec<BitVector> = (0..m).map(|_| BitVector::random(c, &mut rng)).collect();
            let t = transpose(&rows).unwrap();
            assert_eq!(c, t.len());
            assert_eq!(m, t[0].len());
            assert_eq!(naive_transpose(&rows), t);
            assert_eq!(rows, transpose(&t).unwrap());
        }
    }

    #[test]
    fn test_invalid_shapes() {
        let rows = vec![BitVector::zeros(16); 24];
        assert_eq!(Err(InvalidShape::RowCount { rows: 24 }), transpose(&rows));

        let rows = vec![BitVector::zeros(24); 16];
        assert_eq!(Err(InvalidShape::ColumnCount { bits: 24 }), transpose(&rows));

        let mut rows = vec![BitVector::zeros(16); 16];
        rows[3] = BitVector::zeros(32);
        assert_eq!(
            Err(InvalidShape::RaggedRows {
                expected: 16,
                actual: 32
            }),
            transpose(&rows)
        );
    }

    proptest! {
        #[test]
        fn prop_involution(seed in any::<u64>(), log_m in 0usize..5, log_c in 0usize..5) {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = 8 << log_m;
            let c = 8 << log_c;
            let rows: Vec<BitVector> = (0..m).map(|_| BitVector::random(c, &mut rng)).collect();
            let t = transpose(&rows).unwrap();
            prop_assert_eq!(&naive_transpose(&rows), &t);
            prop_assert_eq!(rows, transpose(&t).unwrap());
        }
    }
}
