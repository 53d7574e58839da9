//! Forward generation: materializing the specimens a spawner will emit and
//! enumerating every KO path that reaches them.

mod outbreak;
mod standard;
mod variable;


use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

pub use outbreak::OutbreakEngine;
pub use standard::StandardEngine;
pub use variable::VariableEngine;

use crate::{
    assets::{GameData, Gender},
    encounter::{EncounterTable, Slot, TimeOfDay, Weather, U64_TO_UNIT},
    errors::SeedripperError,
    pla_math::Xoroshiro128Plus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShinyGrade {
    None,
    Star,
    Square,
}

impl ShinyGrade {
    /// Bit value used by shiny filter masks (star = 1, square = 2).
    pub fn mask_bit(&self) -> u8 {
        match self {
            ShinyGrade::None => 0,
            ShinyGrade::Star => 1,
            ShinyGrade::Square => 2,
        }
    }
}

impl std::fmt::Display for ShinyGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShinyGrade::None => write!(f, "No"),
            ShinyGrade::Star => write!(f, "Star"),
            ShinyGrade::Square => write!(f, "Square"),
        }
    }
}

/// One fully materialized emitted creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specimen {
    pub species: u16,
    pub form: u8,
    pub alpha: bool,
    pub ec: u32,
    pub pid: u32,
    pub ivs: [u8; 6],
    pub ability: u8,
    pub gender: Gender,
    pub nature: u8,
    pub shiny: ShinyGrade,
    pub height: u8,
    pub weight: u8,
}

/// A specimen together with the branch that reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedSpawn {
    pub advance: u32,
    pub path: Vec<u8>,
    pub specimen: Specimen,
}

/// Per-species generation parameters, keyed by `(species, form)`.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesConfig {
    pub gender_ratio: u8,
    pub shiny_rolls: u32,
    /// Whether the species passes the species filter. Spawns of excluded
    /// species still consume their group RNG pair.
    pub include: bool,
}

/// Builds the species map for a table, resolving forced-gender slots and
/// applying the species filter.
pub fn build_species_info(
    data: &GameData,
    table: &EncounterTable,
    shiny_rolls: u32,
    species_filter: Option<&HashSet<(u16, u8)>>,
) -> Result<HashMap<(u16, u8), SpeciesConfig>, SeedripperError> {
    let mut info = HashMap::new();
    for slot in &table.slots {
        let personal = data.personal_info(slot.species, slot.form)?;
        let gender_ratio = match slot.gender {
            Some(Gender::Male) => 0,
            Some(Gender::Female) => 254,
            Some(Gender::Genderless) => 255,
            None => personal.gender_ratio,
        };
        let include = species_filter.map_or(true, |wanted| wanted.contains(&(slot.species, slot.form)));
        info.insert(
            (slot.species, slot.form),
            SpeciesConfig { gender_ratio, shiny_rolls, include },
        );
    }
    Ok(info)
}

/// Result filters applied during materialization. `None` fields are
/// pass-everything; filtering never changes RNG consumption, only which
/// rows get emitted.
#[derive(Debug, Clone, Default)]
pub struct SpawnFilter {
    pub genders: Option<Vec<Gender>>,
    pub natures: Option<Vec<u8>>,
    /// Bitmask of acceptable shiny grades; `None` accepts all.
    pub shiny_mask: Option<u8>,
    pub alpha_only: bool,
    /// Acceptable height bytes, e.g. `[0, 255]` for the XXXS/XXXL hunt.
    pub heights: Option<Vec<u8>>,
    pub iv_ranges: Option<[(u8, u8); 6]>,
}

impl SpawnFilter {
    fn shiny_passes(&self, shiny: ShinyGrade) -> bool {
        self.shiny_mask.map_or(true, |mask| mask & shiny.mask_bit() != 0)
    }

    fn ivs_pass(&self, ivs: &[u8; 6]) -> bool {
        self.iv_ranges.map_or(true, |ranges| {
            ivs.iter().zip(ranges).all(|(&iv, (min, max))| min <= iv && iv <= max)
        })
    }

    fn gender_passes(&self, gender: Gender) -> bool {
        self.genders.as_ref().map_or(true, |wanted| wanted.contains(&gender))
    }

    fn nature_passes(&self, nature: u8) -> bool {
        self.natures.as_ref().map_or(true, |wanted| wanted.contains(&nature))
    }

    fn height_passes(&self, height: u8) -> bool {
        self.heights.as_ref().map_or(true, |wanted| wanted.contains(&height))
    }
}

/// Materializes one wave of `spawn_count` spawns from a group seed,
/// reproducing the game's PRNG consumption order exactly: each spawn takes
/// two group outputs (generator seed plus one unused), the generator RNG
/// supplies the slot draw and the fixed seed, and the fixed RNG produces
/// the attributes.
#[allow(clippy::too_many_arguments)]
pub(crate) fn materialize_spawns(
    group_seed: u64,
    spawn_count: u32,
    advance: u32,
    path: &[u8],
    table: &EncounterTable,
    time: TimeOfDay,
    weather: Weather,
    species_info: &HashMap<(u16, u8), SpeciesConfig>,
    filter: &SpawnFilter,
    out: &mut Vec<PredictedSpawn>,
) {
    let mut group_rng = Xoroshiro128Plus::new(group_seed);
    let mut generator_rng = Xoroshiro128Plus::new(0);
    let mut fixed_rng = Xoroshiro128Plus::new(0);

    for _ in 0..spawn_count {
        generator_rng.re_init(group_rng.next());
        let slot_draw = generator_rng.next() as f64 * U64_TO_UNIT;
        if let Some(slot) = table.calc_slot(slot_draw, time, weather) {
            match species_info.get(&(slot.species, slot.form)) {
                Some(config) => {
                    if (!filter.alpha_only || slot.is_alpha) && config.include {
                        fixed_rng.re_init(generator_rng.next());
                        if let Some(specimen) = materialize_specimen(&mut fixed_rng, slot, config, filter) {
                            out.push(PredictedSpawn {
                                advance,
                                path: path.to_vec(),
                                specimen,
                            });
                        }
                    }
                }
                None => debug!(
                    "No species config for {}-{}, skipping spawn",
                    slot.species, slot.form
                ),
            }
        }
        group_rng.next();
    }
}

/// The fixed RNG's attribute sequence with the filter rejections applied at
/// the same points the original generator short-circuits.
fn materialize_specimen(
    rng: &mut Xoroshiro128Plus,
    slot: &Slot,
    config: &SpeciesConfig,
    filter: &SpawnFilter,
) -> Option<Specimen> {
    let ec = rng.next_rand(0xFFFFFFFF) as u32;
    let sidtid = rng.next_rand(0xFFFFFFFF);

    let mut pid = 0;
    let mut shiny = ShinyGrade::None;
    for _ in 0..config.shiny_rolls {
        pid = rng.next_rand(0xFFFFFFFF);
        let xor = (pid >> 16) ^ (sidtid >> 16) ^ (pid & 0xFFFF) ^ (sidtid & 0xFFFF);
        shiny = if xor == 0 {
            ShinyGrade::Square
        } else if xor < 16 {
            ShinyGrade::Star
        } else {
            ShinyGrade::None
        };
        if shiny != ShinyGrade::None {
            break;
        }
    }
    if !filter.shiny_passes(shiny) {
        return None;
    }

    let mut ivs = [0u8; 6];
    for _ in 0..slot.guaranteed_ivs {
        let mut index = rng.next_rand(6) as usize;
        while ivs[index] != 0 {
            index = rng.next_rand(6) as usize;
        }
        ivs[index] = 31;
    }
    for iv in ivs.iter_mut() {
        if *iv == 0 {
            *iv = rng.next_rand(32) as u8;
        }
    }
    if !filter.ivs_pass(&ivs) {
        return None;
    }

    let ability = rng.next_rand(2) as u8;

    let gender = match Gender::from_ratio(config.gender_ratio) {
        Some(forced) => forced,
        None => {
            if rng.next_rand(253) + 1 < config.gender_ratio as u64 {
                Gender::Female
            } else {
                Gender::Male
            }
        }
    };
    if !filter.gender_passes(gender) {
        return None;
    }

    let nature = rng.next_rand(25) as u8;
    if !filter.nature_passes(nature) {
        return None;
    }

    // Alphas are pinned to maximum size and skip the size draws entirely.
    let (height, weight) = if slot.is_alpha {
        (255, 255)
    } else {
        (
            (rng.next_rand(0x81) + rng.next_rand(0x80)) as u8,
            (rng.next_rand(0x81) + rng.next_rand(0x80)) as u8,
        )
    };
    if !filter.height_passes(height) {
        return None;
    }

    Some(Specimen {
        species: slot.species,
        form: slot.form,
        alpha: slot.is_alpha,
        ec,
        pid: pid as u32,
        ivs,
        ability,
        gender,
        nature,
        shiny,
        height,
        weight,
    })
}

/// Renders a path with the original tool's labels, e.g.
/// `1->2->Ghost 2->Clear Wave->1`.
pub fn path_to_string(path: &[u8]) -> String {
    path.iter()
        .map(|&action| match action {
            255 => "Clear Wave".to_string(),
            11..=19 => format!("Ghost {}", action - 10),
            action if action < 10 => action.to_string(),
            _ => "Invalid".to_string(),
        })
        .join("->")
}

pub fn string_to_path(text: &str) -> Result<Vec<u8>, SeedripperError> {
    text.split("->")
        .map(|part| {
            let part = part.trim();
            if part == "Clear Wave" {
                Ok(255)
            } else if let Some(n) = part.strip_prefix("Ghost ") {
                n.parse::<u8>()
                    .map(|n| n + 10)
                    .map_err(|_| SeedripperError::SeedError)
            } else {
                part.parse::<u8>().map_err(|_| SeedripperError::SeedError)
            }
        })
        .collect()
}

/// Total node count of a standard enumeration, used for progress totals.
pub fn compute_result_count(max_spawn_count: u32, max_path_length: u32) -> u64 {
    if max_spawn_count <= 1 {
        return max_path_length as u64;
    }
    if max_path_length > 40 {
        return u64::MAX;
    }
    let initial: u128 = if max_spawn_count == 3 { 2 } else { 1 };
    let m = max_spawn_count as u128;
    let total = initial * (m.pow(max_path_length) - 1) / (m - 1);
    total.min(u64::MAX as u128) as u64
}

/// Shortest-path deduplication: keeps only the first-seen row for each
/// `(species, form, ec, pid)`, collapsing branches that differ only in
/// early KOs.
pub struct ShortestPathDedup<I> {
    inner: I,
    seen: HashSet<(u16, u8, u32, u32)>,
}

impl<I: Iterator<Item = PredictedSpawn>> Iterator for ShortestPathDedup<I> {
    type Item = PredictedSpawn;

    fn next(&mut self) -> Option<PredictedSpawn> {
        loop {
            let row = self.inner.next()?;
            let key = (row.specimen.species, row.specimen.form, row.specimen.ec, row.specimen.pid);
            if self.seen.insert(key) {
                return Some(row);
            }
        }
    }
}

pub fn dedup_shortest_path<I: Iterator<Item = PredictedSpawn>>(inner: I) -> ShortestPathDedup<I> {
    ShortestPathDedup { inner, seen: HashSet::new() }
}
