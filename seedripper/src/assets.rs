//! Read-only game data: personal info, name tables, evolution lines, and
//! the per-area encounter tables and spawner lists.
//!
//! Everything here is loaded once from a data directory of JSON files and
//! never mutated afterwards. The tables themselves are extracted from the
//! game and are not part of this crate; `GameData::load` expects
//! `personal.json`, `names.json`, `evo_lines.json` and `areas.json`.

use std::{collections::HashMap, fs::read_to_string, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    encounter::{EncounterTable, Spawner},
    errors::SeedripperError,
};

pub const NATURES_EN: [&str; 25] = [
    "Hardy", "Lonely", "Brave", "Adamant", "Naughty", "Bold", "Docile", "Relaxed", "Impish",
    "Lax", "Timid", "Hasty", "Serious", "Jolly", "Naive", "Modest", "Mild", "Quiet", "Bashful",
    "Rash", "Calm", "Gentle", "Sassy", "Careful", "Quirky",
];

/// Gender of an emitted specimen. The numeric values match the game's
/// encoding (0 male, 1 female, 2 genderless).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Gender {
    Male,
    Female,
    Genderless,
}

impl Gender {
    /// The gender a ratio byte forces, if it forces one. Ratios 1..=253 are
    /// resolved by an RNG draw instead: `rand(253) + 1 < ratio` is female.
    pub fn from_ratio(gender_ratio: u8) -> Option<Gender> {
        match gender_ratio {
            0 => Some(Gender::Male),
            254 => Some(Gender::Female),
            255 => Some(Gender::Genderless),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Gender::Male => "♂",
            Gender::Female => "♀",
            Gender::Genderless => "○",
        }
    }
}

/// One entry of the personal info table, keyed by personal index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub gender_ratio: u8,
    pub ability_1: u16,
    pub ability_2: u16,
    pub base_stats: [u16; 6],
    pub form_stats_index: u16,
    /// Species base display size, consumed by the size module.
    pub height_m: f32,
    pub weight_kg: f32,
}

impl PersonalInfo {
    pub fn has_two_abilities(&self) -> bool {
        self.ability_1 != self.ability_2
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaData {
    pub encounter_tables: HashMap<u64, EncounterTable>,
    pub spawners: Vec<Spawner>,
    #[serde(default)]
    pub table_names: HashMap<u64, String>,
    #[serde(default)]
    pub spawner_names: HashMap<u64, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct NameTables {
    species: Vec<String>,
    abilities: Vec<String>,
}

/// The static data facade. Loaded once at startup, read-only afterwards.
pub struct GameData {
    personal: Vec<PersonalInfo>,
    species_names: Vec<String>,
    ability_names: Vec<String>,
    evo_lines: Vec<Vec<(u16, u8)>>,
    areas: HashMap<String, AreaData>,
}

impl GameData {
    /// Loads every table from a data directory.
    pub fn load(data_dir: &Path) -> Result<GameData, SeedripperError> {
        let personal = load_json(&data_dir.join("personal.json"))?;
        let names: NameTables = load_json(&data_dir.join("names.json"))?;
        let evo_lines = load_json(&data_dir.join("evo_lines.json"))?;
        let areas: HashMap<String, AreaData> = load_json(&data_dir.join("areas.json"))?;
        info!(
            "Loaded game data from {}: {} areas",
            data_dir.display(),
            areas.len()
        );
        Ok(GameData::from_parts(personal, names.species, names.abilities, evo_lines, areas))
    }

    /// Builds a facade from already-materialized tables. Primarily used by
    /// tests and embedders that carry their own extracts.
    pub fn from_parts(
        personal: Vec<PersonalInfo>,
        species_names: Vec<String>,
        ability_names: Vec<String>,
        evo_lines: Vec<Vec<(u16, u8)>>,
        areas: HashMap<String, AreaData>,
    ) -> GameData {
        GameData {
            personal,
            species_names,
            ability_names,
            evo_lines,
            areas,
        }
    }

    /// Index into the personal table for a species/form pair. Form 0 is the
    /// species' own row; other forms live at `form_stats_index + form - 1`.
    pub fn personal_index(&self, species: u16, form: u8) -> Result<usize, SeedripperError> {
        let base = self
            .personal
            .get(species as usize)
            .ok_or(SeedripperError::UnrecognizedSpecies)?;
        if form == 0 {
            return Ok(species as usize);
        }
        let index = base.form_stats_index as usize + form as usize - 1;
        if index < self.personal.len() {
            Ok(index)
        } else {
            Err(SeedripperError::UnrecognizedSpecies)
        }
    }

    pub fn personal_info(&self, species: u16, form: u8) -> Result<&PersonalInfo, SeedripperError> {
        Ok(&self.personal[self.personal_index(species, form)?])
    }

    pub fn species_name(&self, species: u16) -> &str {
        self.species_names
            .get(species as usize)
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn ability_name(&self, ability: u16) -> &str {
        self.ability_names
            .get(ability as usize)
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn nature_name(nature: u8) -> &'static str {
        NATURES_EN.get(nature as usize).copied().unwrap_or("?")
    }

    /// Display name in the same shape the original tool used, e.g.
    /// "Alpha Basculin-2".
    pub fn display_name(&self, species: u16, form: u8, is_alpha: bool) -> String {
        let alpha = if is_alpha { "Alpha " } else { "" };
        if form != 0 {
            format!("{}{}-{}", alpha, self.species_name(species), form)
        } else {
            format!("{}{}", alpha, self.species_name(species))
        }
    }

    /// The evolutionary line containing a species/form, falling back to a
    /// singleton line for species without one on record. Size measurements
    /// taken after evolving still constrain the same underlying bytes.
    pub fn find_evo_line(&self, species: u16, form: u8) -> Vec<(u16, u8)> {
        self.evo_lines
            .iter()
            .find(|line| line.contains(&(species, form)))
            .cloned()
            .unwrap_or_else(|| vec![(species, form)])
    }

    pub fn area(&self, name: &str) -> Result<&AreaData, SeedripperError> {
        self.areas.get(name).ok_or(SeedripperError::UnrecognizedArea)
    }

    pub fn encounter_table(&self, area: &str, table_id: u64) -> Result<&EncounterTable, SeedripperError> {
        self.area(area)?
            .encounter_tables
            .get(&table_id)
            .ok_or(SeedripperError::UnrecognizedTable)
    }

    pub fn spawner(&self, area: &str, spawner_id: u64) -> Result<&Spawner, SeedripperError> {
        self.area(area)?
            .spawners
            .iter()
            .find(|spawner| spawner.id == spawner_id)
            .ok_or(SeedripperError::UnrecognizedSpawner)
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SeedripperError> {
    let text = read_to_string(path).map_err(|e| {
        log::error!("Couldn't read {}: {e}", path.display());
        SeedripperError::DataLoadingError
    })?;
    serde_json::from_str(&text).map_err(|e| {
        log::error!("Couldn't parse {}: {e}", path.display());
        SeedripperError::DataLoadingError
    })
}
