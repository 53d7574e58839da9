//! Group-seed stage.
//!
//! A generator seed is the group RNG's first output, so each candidate
//! pins a group seed directly: `S = g1 - CONST`. What remains is checking
//! that the next spawn in the walk produces one of specimen 2's fixed
//! seeds. Single spawners re-seed the group RNG between the two KOs;
//! multi-spawners emit both specimens inside one cycle, which changes only
//! whether the third output is re-seeded or used as-is.

use rayon::prelude::*;

use super::generator_seed::fixed_seed_of;
use crate::pla_math::{advance_seed, XOROSHIRO_CONST};

/// Searches for the group seed explaining both specimens. The fixed-seed
/// set is sorted once and binary-searched per candidate. Returns the first
/// match in input order.
pub fn find_group_seed(
    generator_seeds: &[u64],
    fixed_seeds_2: &[u64],
    multi_spawner: bool,
) -> Option<u64> {
    let mut sorted = fixed_seeds_2.to_vec();
    sorted.sort_unstable();

    generator_seeds
        .par_iter()
        .find_map_first(|&generator_seed| {
            let group_seed = generator_seed.wrapping_sub(XOROSHIRO_CONST);
            let next_generator = if multi_spawner {
                // Second spawn of the same cycle: third output, unseeded.
                advance_seed(group_seed, 1)
            } else {
                // KO in between: the third output re-seeds the group RNG
                // and the next cycle's first output is the generator seed.
                advance_seed(group_seed, 1).wrapping_add(XOROSHIRO_CONST)
            };
            sorted
                .binary_search(&fixed_seed_of(next_generator))
                .ok()
                .map(|_| group_seed)
        })
}
