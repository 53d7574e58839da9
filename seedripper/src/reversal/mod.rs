//! The seed-inversion pipeline.
//!
//! Reverses one or two observed specimens back to the spawner's group seed
//! in three stages: fixed seeds consistent with the visible attributes,
//! generator seeds that produce those fixed seeds, and finally the group
//! seed that explains both specimens in consecutive spawn cycles.

mod fixed_seed;
mod generator_seed;
mod group_seed;
pub mod odds;

#[cfg(test)]
mod test;

use log::info;
use serde::{Deserialize, Serialize};

pub use fixed_seed::{find_fixed_seeds, verify_fixed_seed, FixedSeedConstants};
pub use generator_seed::{find_generator_seeds, fixed_seed_of};
pub use group_seed::find_group_seed;

use crate::{
    assets::{GameData, Gender},
    encounter::Spawner,
    errors::SeedripperError,
    search::SearchControl,
    size::Measurement,
};

/// The only species/form the forced-gender encounter tables contain.
const BASCULIN: (u16, u8) = (550, 2);

/// Everything the player can read off one observed specimen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecimenObservation {
    pub species: u16,
    #[serde(default)]
    pub form: u8,
    /// PID roll count from research progress and the shiny charm (1..=7).
    pub shiny_rolls: u32,
    pub ivs: [u8; 6],
    /// Ability slot; only meaningful for species with two abilities.
    #[serde(default)]
    pub ability: u8,
    pub nature: u8,
    pub gender: Gender,
    /// Size readings, possibly taken after evolving the specimen.
    pub measurements: Vec<Measurement>,
}

impl SpecimenObservation {
    pub fn validate(&self) -> Result<(), SeedripperError> {
        let in_range = self.ivs.iter().all(|&iv| iv <= 31)
            && self.nature <= 24
            && self.ability <= 1
            && (1..=7).contains(&self.shiny_rolls)
            && !self.measurements.is_empty();
        if in_range {
            Ok(())
        } else {
            Err(SeedripperError::InvalidObservation)
        }
    }
}

/// The three stage calls the orchestrator chains. A trait seam so the retry
/// logic can be exercised without multi-minute kernel runs.
pub trait SeedStages {
    fn fixed_seeds(&self, obs: &SpecimenObservation) -> Result<Vec<u64>, SeedripperError>;
    fn generator_seeds(&self, fixed_seeds: &[u64]) -> Result<Vec<u64>, SeedripperError>;
    fn group_seed(&self, generator_seeds: &[u64], fixed_seeds_2: &[u64], multi_spawner: bool) -> Option<u64>;
}

/// Real stage implementations running on the data-parallel CPU backend.
pub struct DeviceStages<'a> {
    pub data: &'a GameData,
    pub control: &'a SearchControl,
    /// Gender forced by the spawner's encounter table, if any.
    pub forced_gender: Option<Gender>,
    /// Chunking factor for the fixed-seed guess domain (power of two, <=1024).
    pub fixed_steps: u32,
    /// Slices per batch in the generator-seed search (<=256).
    pub generator_steps: u32,
}

impl SeedStages for DeviceStages<'_> {
    fn fixed_seeds(&self, obs: &SpecimenObservation) -> Result<Vec<u64>, SeedripperError> {
        obs.validate()?;
        let constants = FixedSeedConstants::new(self.data, obs, self.forced_gender)?;
        find_fixed_seeds(&constants, self.fixed_steps, self.control)
    }

    fn generator_seeds(&self, fixed_seeds: &[u64]) -> Result<Vec<u64>, SeedripperError> {
        find_generator_seeds(fixed_seeds, self.generator_steps, self.control)
    }

    fn group_seed(&self, generator_seeds: &[u64], fixed_seeds_2: &[u64], multi_spawner: bool) -> Option<u64> {
        find_group_seed(generator_seeds, fixed_seeds_2, multi_spawner)
    }
}

/// Runs the full pipeline for two observed specimens of one spawner.
///
/// For variable-count spawners the order the player caught the specimens in
/// is not always the order the group RNG produced them in, so a failed
/// search swaps the two observations and tries once more.
pub fn recover_group_seed(
    stages: &impl SeedStages,
    observation_1: &SpecimenObservation,
    observation_2: &SpecimenObservation,
    spawner: &Spawner,
) -> Result<u64, SeedripperError> {
    let multi = spawner.is_multi_spawner();

    info!("Starting fixed seed search for specimen 1");
    let fixed_1 = stages.fixed_seeds(observation_1)?;
    if fixed_1.is_empty() {
        return Err(SeedripperError::Unsuccessful);
    }
    info!("Starting fixed seed search for specimen 2");
    let fixed_2 = stages.fixed_seeds(observation_2)?;
    if fixed_2.is_empty() {
        return Err(SeedripperError::Unsuccessful);
    }

    info!("Starting generator seed search");
    let generator_1 = stages.generator_seeds(&fixed_1)?;
    info!("Starting group seed search");
    if let Some(seed) = stages.group_seed(&generator_1, &fixed_2, multi) {
        info!("Group seed found: {seed:016X}");
        return Ok(seed);
    }

    if spawner.is_variable() {
        info!("Group seed search unsuccessful, testing the other specimen order");
        let generator_2 = stages.generator_seeds(&fixed_2)?;
        if let Some(seed) = stages.group_seed(&generator_2, &fixed_1, multi) {
            info!("Group seed found: {seed:016X}");
            return Ok(seed);
        }
    }

    Err(SeedripperError::Unsuccessful)
}
