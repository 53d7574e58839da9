//! Generator-seed stage.
//!
//! A fixed seed is the generator RNG's second output after re-seeding, so
//! inverting it means finding every `g` with
//! `F = s0' + s1'` where, with `t = g ^ CONST` and `w = rotl(t, 37)`,
//! `s1' = w` and `s0'` is a GF(2)-linear image of `w` plus a constant.
//! Enumerating the low 32 bits of `w` makes the low half of `F - w` known,
//! which pins the high bits of `w` through a precomputed 32x32 linear
//! solve; each reconstructed candidate is then verified with the real RNG.
//! The domain is organized as 256 slices of 2^24 candidates.

use log::info;
use once_cell::sync::Lazy;
use rayon::prelude::*;

use crate::{
    errors::SeedripperError,
    pla_math::{matrix::solve_affine, Xoroshiro128Plus, XOROSHIRO_CONST},
    search::SearchControl,
};

pub const SLICE_COUNT: u32 = 256;
const SLICE_SIZE: u32 = 1 << 24;

/// `s0'` as a function of `w`, with the constant contribution split off.
fn linear_part(w: u64) -> u64 {
    w.rotate_right(13) ^ w.rotate_right(37) ^ (w.rotate_right(37) << 16)
}

const AFFINE_CONST: u64 = XOROSHIRO_CONST.rotate_left(24);

struct GeneratorSystem {
    /// Byte-sliced tables of the low-output columns for `w_lo`.
    low_tables: [[u32; 256]; 4],
    /// Byte-sliced tables of the high-bit solver.
    solve_tables: [[u32; 256]; 4],
    checks: Vec<u32>,
    null_basis: Vec<u32>,
    affine_lo: u32,
}

static SYSTEM: Lazy<GeneratorSystem> = Lazy::new(build_system);

fn build_system() -> GeneratorSystem {
    let mut low_cols = [0u32; 32];
    let mut high_cols = [0u32; 32];
    for j in 0..32 {
        low_cols[j] = linear_part(1u64 << j) as u32;
        high_cols[j] = linear_part(1u64 << (j + 32)) as u32;
    }

    // The 32x32 system mapping the high bits of w to the low outputs.
    let mut rows = [0u64; 32];
    for (j, col) in high_cols.iter().enumerate() {
        for i in 0..32 {
            if col >> i & 1 == 1 {
                rows[i] |= 1 << j;
            }
        }
    }
    let system = solve_affine(&rows, 32);

    // Column form of the solver so it byte-slices like the matrix itself.
    let mut solve_cols = [0u32; 32];
    for (i, row) in system.solve_rows.iter().enumerate() {
        for (j, col) in solve_cols.iter_mut().enumerate() {
            if row >> j & 1 == 1 {
                *col |= 1 << i;
            }
        }
    }

    GeneratorSystem {
        low_tables: byte_tables(&low_cols),
        solve_tables: byte_tables(&solve_cols),
        checks: system.checks.iter().map(|&c| c as u32).collect(),
        null_basis: system.null_basis.iter().map(|&v| v as u32).collect(),
        affine_lo: AFFINE_CONST as u32,
    }
}

fn byte_tables(cols: &[u32; 32]) -> [[u32; 256]; 4] {
    let mut tables = [[0u32; 256]; 4];
    for (byte, table) in tables.iter_mut().enumerate() {
        for (value, entry) in table.iter_mut().enumerate() {
            let mut acc = 0u32;
            for bit in 0..8 {
                if value >> bit & 1 == 1 {
                    acc ^= cols[byte * 8 + bit];
                }
            }
            *entry = acc;
        }
    }
    tables
}

#[inline]
fn apply_tables(tables: &[[u32; 256]; 4], x: u32) -> u32 {
    tables[0][(x & 0xFF) as usize]
        ^ tables[1][(x >> 8 & 0xFF) as usize]
        ^ tables[2][(x >> 16 & 0xFF) as usize]
        ^ tables[3][(x >> 24) as usize]
}

/// The fixed seed a generator seed emits: its second output, right after
/// the slot draw.
pub fn fixed_seed_of(generator_seed: u64) -> u64 {
    let mut rng = Xoroshiro128Plus::new(generator_seed);
    rng.next();
    rng.next()
}

/// Every generator seed producing any of `fixed_seeds`, bounded by a buffer
/// sized at 1.5x the fixed-seed count. `steps` is the number of slices per
/// parallel batch (up to 256), with cancellation checked between batches.
pub fn find_generator_seeds(
    fixed_seeds: &[u64],
    steps: u32,
    control: &SearchControl,
) -> Result<Vec<u64>, SeedripperError> {
    let steps = steps.clamp(1, SLICE_COUNT);
    let capacity = ((fixed_seeds.len() as f64 * 1.5).ceil() as usize).max(16);
    let mut results = Vec::new();

    'seeds: for (i, &fixed_seed) in fixed_seeds.iter().enumerate() {
        let mut slice = 0;
        while slice < SLICE_COUNT {
            if control.is_cancelled() {
                break 'seeds;
            }
            let end = (slice + steps).min(SLICE_COUNT);
            let mut batch: Vec<u64> = (slice..end)
                .into_par_iter()
                .flat_map_iter(|s| search_slice(fixed_seed, s))
                .collect();
            results.append(&mut batch);
            control.tick((end - slice) as u64);
            slice = end;
        }
        if results.len() > capacity {
            return Err(SeedripperError::BufferOverflow);
        }
        if (i + 1) % 16 == 0 {
            info!("{}/{} fixed seeds inverted", i + 1, fixed_seeds.len());
        }
    }

    info!("{} generator seeds found", results.len());
    Ok(results)
}

/// One launch slice: 2^24 candidates for the low word of `w`.
pub(crate) fn search_slice(fixed_seed: u64, slice: u32) -> Vec<u64> {
    let system = &*SYSTEM;
    let f_lo = fixed_seed as u32;
    let base = slice << 24;
    let mut found = Vec::new();

    for low in 0..SLICE_SIZE {
        let w_lo = base | low;
        // Low half of F - w, exact because borrows out of bit 31 only
        // affect the half we solve for anyway.
        let u_lo = f_lo.wrapping_sub(w_lo);
        let rhs = u_lo ^ system.affine_lo ^ apply_tables(&system.low_tables, w_lo);
        if system.checks.iter().any(|&check| (check & rhs).count_ones() & 1 == 1) {
            continue;
        }
        let particular = apply_tables(&system.solve_tables, rhs);
        for combo in 0..1u32 << system.null_basis.len() {
            let mut w_hi = particular;
            for (i, vector) in system.null_basis.iter().enumerate() {
                if combo >> i & 1 == 1 {
                    w_hi ^= vector;
                }
            }
            let w = (w_hi as u64) << 32 | w_lo as u64;
            let generator_seed = w.rotate_right(37) ^ XOROSHIRO_CONST;
            if fixed_seed_of(generator_seed) == fixed_seed {
                found.push(generator_seed);
            }
        }
    }
    found
}

/// Decomposes a known generator seed into its slice coordinates. Lets
/// callers aim a single slice at a seed they planted.
pub(crate) fn slice_of(generator_seed: u64) -> u32 {
    let w = (generator_seed ^ XOROSHIRO_CONST).rotate_left(37);
    (w as u32) >> 24
}
