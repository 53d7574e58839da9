//! Bit-matrix operations over GF(2).
//!
//! A matrix is a slice of `u64` words, one word per row, bit `j` of a row
//! being the coefficient of unknown `x_j`. Vectors use the same encoding.
//! Everything here is exact integer arithmetic; the seed search depends on
//! these results being bit-perfect.

use super::rng::{Xoroshiro128Plus, XOROSHIRO_CONST};

/// Result of Gauss-Jordan elimination with the accumulated row transform.
pub struct RowReduction {
    /// The matrix in reduced row-echelon form.
    pub reduced: Vec<u64>,
    /// Row-operation accumulator `E` such that `reduced = E * original`.
    /// Row `i` encodes which original rows were XORed into reduced row `i`.
    pub transform: Vec<u64>,
    /// `(row, column)` of each pivot, in elimination order.
    pub pivots: Vec<(usize, usize)>,
}

/// An affine system `M * x = rhs` prepared for repeated solving against
/// many right-hand sides.
pub struct LinearSystem {
    /// One row per unknown: `x_i = parity(solve_rows[i] & rhs)`.
    pub solve_rows: Vec<u64>,
    /// Basis of the null space of `M`. The full solution set for a
    /// consistent rhs is the particular solution XOR any basis combination.
    pub null_basis: Vec<u64>,
    /// Consistency rows: the system is solvable iff `parity(row & rhs)` is
    /// zero for every row here. Empty when `M` has full row rank.
    pub checks: Vec<u64>,
}

impl LinearSystem {
    /// Particular solution for `rhs`, or None when the system is
    /// inconsistent for it.
    pub fn solve(&self, rhs: u64) -> Option<u64> {
        if self.checks.iter().any(|row| (row & rhs).count_ones() & 1 == 1) {
            return None;
        }
        Some(mat_vec(&self.solve_rows, rhs))
    }
}

/// Multiplies a bit matrix by a bit vector: bit `i` of the result is the
/// parity of `rows[i] & v`.
pub fn mat_vec(rows: &[u64], v: u64) -> u64 {
    rows.iter()
        .enumerate()
        .fold(0u64, |acc, (i, row)| acc | ((((row & v).count_ones() & 1) as u64) << i))
}

/// Encodes a bit vector (LSB first) as a single word.
pub fn vec_to_int(bits: impl IntoIterator<Item = bool>) -> u64 {
    bits.into_iter()
        .enumerate()
        .fold(0u64, |acc, (i, bit)| acc | ((bit as u64) << i))
}

/// Gauss-Jordan elimination over GF(2), tracking the row transform so
/// callers can derive particular solutions and consistency checks.
/// Supports up to 64 rows and 64 columns.
pub fn row_reduce(rows: &[u64], cols: u32) -> RowReduction {
    assert!(rows.len() <= 64 && cols <= 64);
    let mut reduced = rows.to_vec();
    let mut transform: Vec<u64> = (0..rows.len() as u64).map(|i| 1 << i).collect();
    let mut pivots = Vec::new();

    let mut rank = 0;
    for col in 0..cols as usize {
        let Some(pivot_row) = (rank..reduced.len()).find(|&r| reduced[r] >> col & 1 == 1) else {
            continue;
        };
        reduced.swap(rank, pivot_row);
        transform.swap(rank, pivot_row);
        for r in 0..reduced.len() {
            if r != rank && reduced[r] >> col & 1 == 1 {
                reduced[r] ^= reduced[rank];
                transform[r] ^= transform[rank];
            }
        }
        pivots.push((rank, col));
        rank += 1;
    }

    RowReduction { reduced, transform, pivots }
}

/// Generalized (pseudo) inverse: a `cols`-row matrix `G` such that for any
/// consistent rhs, `G * rhs` solves `M * x = rhs`. Free unknowns are zero.
pub fn generalized_inverse(rows: &[u64], cols: u32) -> Vec<u64> {
    let reduction = row_reduce(rows, cols);
    let mut inverse = vec![0u64; cols as usize];
    for &(row, col) in &reduction.pivots {
        inverse[col] = reduction.transform[row];
    }
    inverse
}

/// Basis of the null space of `M`, one vector per free column.
pub fn nullspace(rows: &[u64], cols: u32) -> Vec<u64> {
    let reduction = row_reduce(rows, cols);
    let mut basis = Vec::with_capacity(cols as usize - reduction.pivots.len());
    for free_col in 0..cols as usize {
        if reduction.pivots.iter().any(|&(_, col)| col == free_col) {
            continue;
        }
        let mut vector = 1u64 << free_col;
        for &(row, pivot_col) in &reduction.pivots {
            if reduction.reduced[row] >> free_col & 1 == 1 {
                vector |= 1 << pivot_col;
            }
        }
        basis.push(vector);
    }
    basis
}

/// Prepares `M * x = rhs` for repeated solving: generalized inverse, null
/// space, and rhs-consistency rows all in one reduction.
pub fn solve_affine(rows: &[u64], cols: u32) -> LinearSystem {
    let reduction = row_reduce(rows, cols);

    let mut solve_rows = vec![0u64; cols as usize];
    for &(row, col) in &reduction.pivots {
        solve_rows[col] = reduction.transform[row];
    }

    let checks = reduction
        .reduced
        .iter()
        .zip(&reduction.transform)
        .filter(|(reduced_row, _)| **reduced_row == 0)
        .map(|(_, transform_row)| *transform_row)
        .collect();

    let mut null_basis = Vec::new();
    for free_col in 0..cols as usize {
        if reduction.pivots.iter().any(|&(_, col)| col == free_col) {
            continue;
        }
        let mut vector = 1u64 << free_col;
        for &(row, pivot_col) in &reduction.pivots {
            if reduction.reduced[row] >> free_col & 1 == 1 {
                vector |= 1 << pivot_col;
            }
        }
        null_basis.push(vector);
    }

    LinearSystem { solve_rows, null_basis, checks }
}

/// The IV observation system for a fixed seed.
///
/// After re-seeding, the fixed RNG consumes `2 + shiny_rolls` outputs (EC,
/// TSV, PID rolls) and then draws the six IVs with `next_rand(32)`. Each IV
/// is `(lo5(s0) + lo5(s1)) mod 32` at its draw point, and both state words
/// evolve linearly from the seed, so guessing the six `lo5(s0)` words pins
/// the six `lo5(s1)` words and yields 60 linear equations in the 64 seed
/// bits. Row layout: rows `10t..10t+5` are `lo5(s0)` of draw `t`, rows
/// `10t+5..10t+10` are `lo5(s1)`.
pub struct IvSystem {
    pub matrix: Vec<u64>,
    /// Contribution of the constant `s1 = XOROSHIRO_CONST` initialization,
    /// in the same 60-bit row layout.
    pub constant: u64,
    pub system: LinearSystem,
}

pub fn iv_system(shiny_rolls: u32) -> IvSystem {
    let prefix = 2 + shiny_rolls;

    let mut matrix = vec![0u64; 60];
    for seed_bit in 0..64 {
        collect_draw_bits(1 << seed_bit, 0, prefix, |row, set| {
            if set {
                matrix[row] |= 1 << seed_bit;
            }
        });
    }

    let mut constant = 0u64;
    collect_draw_bits(0, XOROSHIRO_CONST, prefix, |row, set| {
        if set {
            constant |= 1 << row;
        }
    });

    let system = solve_affine(&matrix, 64);
    IvSystem { matrix, constant, system }
}

fn collect_draw_bits(s0: u64, s1: u64, prefix: u32, mut sink: impl FnMut(usize, bool)) {
    let mut rng = Xoroshiro128Plus::from_state(s0, s1);
    rng.advance(prefix);
    for draw in 0..6 {
        let (s0, s1) = rng.state();
        for bit in 0..5 {
            sink(draw * 10 + bit, s0 >> bit & 1 == 1);
            sink(draw * 10 + 5 + bit, s1 >> bit & 1 == 1);
        }
        rng.advance(1);
    }
}
