//! Fixed-seed stage.
//!
//! Enumerates every 64-bit fixed seed whose attribute draws reproduce the
//! observed IVs, ability, gender, nature, and one of the candidate size
//! pairs. The guess domain is the six 5-bit `lo5(s0)` words at the IV draw
//! points (2^30 work items); each guess pins a small affine coset of seeds
//! through the GF(2) system, and the coset members are replayed through the
//! real RNG for the non-linear rejections.

use std::collections::HashSet;

use log::{info, warn};
use rayon::prelude::*;

use super::{odds, SpecimenObservation, BASCULIN};
use crate::{
    assets::{GameData, Gender},
    errors::SeedripperError,
    pla_math::matrix::{iv_system, IvSystem},
    pla_math::Xoroshiro128Plus,
    search::SearchControl,
    size,
};

/// Total guesses: six independent 5-bit state words.
pub const GUESS_DOMAIN: u64 = 1 << 30;

/// The constants a fixed-seed search is compiled against, the in-process
/// equivalent of the original kernel's text-substituted defines.
pub struct FixedSeedConstants {
    pub shiny_rolls: u32,
    pub ivs: [u8; 6],
    pub two_abilities: bool,
    pub ability: u8,
    pub gender_ratio: u8,
    pub gender: Gender,
    pub nature: u8,
    pub sizes: HashSet<(u8, u8)>,
    pub iv_system: IvSystem,
}

impl FixedSeedConstants {
    pub fn new(
        data: &GameData,
        obs: &SpecimenObservation,
        forced_gender: Option<Gender>,
    ) -> Result<FixedSeedConstants, SeedripperError> {
        let personal = data.personal_info(obs.species, obs.form)?;
        let gender_ratio = match forced_gender {
            // A forced-gender table collapses the ratio to all-male or
            // all-female, but only Basculin appears forced in practice.
            Some(Gender::Male) if (obs.species, obs.form) == BASCULIN => 0,
            Some(Gender::Female) if (obs.species, obs.form) == BASCULIN => 254,
            _ => personal.gender_ratio,
        };
        // A forced ratio draws no gender at all, so a contradictory
        // observation would sail through the kernel while the analytic
        // sizing expects zero seeds. Reject it at the boundary instead.
        if Gender::from_ratio(gender_ratio).map_or(false, |forced| forced != obs.gender) {
            return Err(SeedripperError::InvalidObservation);
        }

        // Measurements may come from evolved specimens, but only within the
        // observed species' line do they constrain the same size bytes.
        let evo_line = data.find_evo_line(obs.species, obs.form);
        if obs
            .measurements
            .iter()
            .any(|measurement| !evo_line.contains(&(measurement.species, measurement.form)))
        {
            return Err(SeedripperError::InvalidObservation);
        }

        info!("Computing possible sizes");
        let sizes = size::intersect_measurements(data, &obs.measurements)?;
        info!("{} possible sizes", sizes.len());
        if sizes.is_empty() {
            warn!("No size pair reproduces the measurements; the search cannot succeed");
        }

        Ok(FixedSeedConstants {
            shiny_rolls: obs.shiny_rolls,
            ivs: obs.ivs,
            two_abilities: personal.has_two_abilities(),
            ability: obs.ability,
            gender_ratio,
            gender: obs.gender,
            nature: obs.nature,
            sizes,
            iv_system: iv_system(obs.shiny_rolls),
        })
    }
}

/// Exhaustive fixed-seed search. `steps` splits the guess domain into
/// sequential batches (power of two, up to 1024) with a cancellation check
/// between batches; each batch runs data-parallel.
pub fn find_fixed_seeds(
    constants: &FixedSeedConstants,
    steps: u32,
    control: &SearchControl,
) -> Result<Vec<u64>, SeedripperError> {
    let steps = steps.clamp(1, 1024).next_power_of_two() as u64;
    let expected = odds::expected_fixed_seeds(
        constants.two_abilities,
        constants.gender,
        constants.gender_ratio,
        &constants.sizes,
    );
    let capacity = odds::buffer_capacity(expected);
    info!("{expected:.0} expected fixed seeds");

    let chunk = GUESS_DOMAIN / steps;
    let mut results = Vec::new();
    for step in 0..steps {
        if control.is_cancelled() {
            break;
        }
        let start = step * chunk;
        let mut batch: Vec<u64> = (start..start + chunk)
            .into_par_iter()
            .flat_map_iter(|guess| search_guess(constants, guess))
            .collect();
        results.append(&mut batch);
        control.tick(chunk);
        if results.len() > capacity {
            return Err(SeedripperError::BufferOverflow);
        }
    }

    info!("{} fixed seeds found, verifying", results.len());
    for &seed in &results {
        verify_fixed_seed(constants, seed)?;
    }
    Ok(results)
}

/// One work item: all seeds consistent with a single 30-bit guess of the
/// six `lo5(s0)` words.
pub(crate) fn search_guess(constants: &FixedSeedConstants, guess: u64) -> Vec<u64> {
    let mut rhs = 0u64;
    for draw in 0..6 {
        let s0_lo = guess >> (5 * draw) & 31;
        let s1_lo = (constants.ivs[draw] as u64).wrapping_sub(s0_lo) & 31;
        rhs |= s0_lo << (10 * draw) | s1_lo << (10 * draw + 5);
    }

    let target = rhs ^ constants.iv_system.constant;
    let Some(particular) = constants.iv_system.system.solve(target) else {
        return Vec::new();
    };

    let basis = &constants.iv_system.system.null_basis;
    let mut found = Vec::new();
    for combo in 0..1u64 << basis.len() {
        let mut seed = particular;
        for (i, vector) in basis.iter().enumerate() {
            if combo >> i & 1 == 1 {
                seed ^= vector;
            }
        }
        if replay_matches(constants, seed) {
            found.push(seed);
        }
    }
    found
}

/// Replays a candidate's full attribute sequence and applies every
/// observation rejection. The IV comparison must hold by construction and
/// doubles as the self-check of the linear solve.
fn replay_matches(constants: &FixedSeedConstants, seed: u64) -> bool {
    let mut rng = Xoroshiro128Plus::new(seed);
    // EC, TSV, and the PID rolls. Their rejection re-draws have probability
    // 2^-32 each and are not modelled; host verification catches them.
    rng.advance(2 + constants.shiny_rolls);

    for draw in 0..6 {
        if rng.next_rand(32) != constants.ivs[draw] as u64 {
            return false;
        }
    }

    let ability = rng.next_rand(2) as u8;
    if constants.two_abilities && ability != constants.ability {
        return false;
    }

    if (1..=253).contains(&constants.gender_ratio) {
        let female = rng.next_rand(253) + 1 < constants.gender_ratio as u64;
        if female != (constants.gender == Gender::Female) {
            return false;
        }
    }

    if rng.next_rand(25) != constants.nature as u64 {
        return false;
    }

    let height = (rng.next_rand(0x81) + rng.next_rand(0x80)) as u8;
    let weight = (rng.next_rand(0x81) + rng.next_rand(0x80)) as u8;
    constants.sizes.contains(&(height, weight))
}

/// Host-side re-verification of a found seed. A mismatch here means the
/// matrix or the kernel mis-solved and the whole pipeline must stop.
pub fn verify_fixed_seed(constants: &FixedSeedConstants, seed: u64) -> Result<(), SeedripperError> {
    if replay_matches(constants, seed) {
        Ok(())
    } else {
        Err(SeedripperError::VerificationError(seed))
    }
}
