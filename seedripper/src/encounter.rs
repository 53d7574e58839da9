//! Encounter tables and spawner descriptors.

use serde::{Deserialize, Serialize};

use crate::assets::Gender;

/// Multiplier converting a raw 64-bit output into a `[0, 1)` draw, matching
/// the game's slot-selection arithmetic.
pub const U64_TO_UNIT: f64 = 5.421010862427522e-20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum TimeOfDay {
    Morning,
    Midday,
    Evening,
    Midnight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Weather {
    None,
    Sunny,
    Cloudy,
    Rain,
    Snow,
    Drought,
    Fog,
    Rainstorm,
    Snowstorm,
}

/// One entry of an encounter table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub species: u16,
    #[serde(default)]
    pub form: u8,
    #[serde(default)]
    pub is_alpha: bool,
    pub min_level: u8,
    pub max_level: u8,
    #[serde(default)]
    pub guaranteed_ivs: u8,
    /// Forced gender for the handful of tables that override the species
    /// ratio (the Basculin spawners).
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Selection weight among the slots applicable at draw time.
    pub rate: u64,
    /// Times of day this slot applies to; empty means always.
    #[serde(default)]
    pub times: Vec<TimeOfDay>,
    /// Weathers this slot applies to; empty means always.
    #[serde(default)]
    pub weathers: Vec<Weather>,
}

impl Slot {
    pub fn applies(&self, time: TimeOfDay, weather: Weather) -> bool {
        (self.times.is_empty() || self.times.contains(&time))
            && (self.weathers.is_empty() || self.weathers.contains(&weather))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterTable {
    pub id: u64,
    pub slots: Vec<Slot>,
}

impl EncounterTable {
    /// Deterministic slot selection: walk the cumulative rates of the slots
    /// applicable under `time`/`weather` until the scaled `[0, 1)` draw
    /// falls inside one.
    pub fn calc_slot(&self, u01: f64, time: TimeOfDay, weather: Weather) -> Option<&Slot> {
        let applicable: Vec<&Slot> = self.slots.iter().filter(|s| s.applies(time, weather)).collect();
        let total: u64 = applicable.iter().map(|s| s.rate).sum();
        if total == 0 {
            return None;
        }
        let target = u01 * total as f64;
        let mut cumulative = 0.0;
        for slot in &applicable {
            cumulative += slot.rate as f64;
            if target < cumulative {
                return Some(slot);
            }
        }
        applicable.last().copied()
    }

    /// Unique species/form pairs in the table, alphas excluded the way the
    /// seed finder excludes them.
    pub fn species_forms(&self, include_alpha: bool) -> Vec<(u16, u8)> {
        let mut seen = Vec::new();
        for slot in &self.slots {
            if slot.is_alpha && !include_alpha {
                continue;
            }
            if !seen.contains(&(slot.species, slot.form)) {
                seen.push((slot.species, slot.form));
            }
        }
        seen
    }
}

/// Descriptor of one spawner placed in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub id: u64,
    pub encounter_table: u64,
    pub min_spawn_count: u32,
    pub max_spawn_count: u32,
    #[serde(default)]
    pub is_mass_outbreak: bool,
    #[serde(default)]
    pub coordinates: [f32; 3],
}

impl Spawner {
    /// Multi-spawners share one group cycle across their spawns, which
    /// changes the group-seed search shape. Mass outbreaks are excluded
    /// because their opening KOs are singles.
    pub fn is_multi_spawner(&self) -> bool {
        self.min_spawn_count > 1 && !self.is_mass_outbreak
    }

    pub fn is_variable(&self) -> bool {
        self.min_spawn_count != self.max_spawn_count
    }
}

/// The two encounter tables with forced-gender entries. The only forced
/// mons in them are Basculin, and they are always forced, so the species
/// gender ratio collapses to all-male/all-female when one of these tables
/// is in play.
pub const FORCED_GENDER_TABLES: [(u64, Gender); 2] = [
    (0xFD9CA9CA1D5681CB, Gender::Male),
    (0xFD999DCA1D543790, Gender::Female),
];

pub fn forced_gender(encounter_table_id: u64) -> Option<Gender> {
    FORCED_GENDER_TABLES
        .iter()
        .find(|(id, _)| *id == encounter_table_id)
        .map(|(_, gender)| *gender)
}

#[cfg(test)]
mod test {
    use super::*;

    fn slot(species: u16, rate: u64) -> Slot {
        Slot {
            species,
            form: 0,
            is_alpha: false,
            min_level: 10,
            max_level: 12,
            guaranteed_ivs: 0,
            gender: None,
            rate,
            times: Vec::new(),
            weathers: Vec::new(),
        }
    }

    #[test]
    fn test_calc_slot_boundaries() {
        let table = EncounterTable {
            id: 1,
            slots: vec![slot(10, 30), slot(20, 70)],
        };
        let first = table.calc_slot(0.0, TimeOfDay::Midday, Weather::Sunny).unwrap();
        assert_eq!(first.species, 10);
        // 0.3 of the total weight is exactly the start of the second slot.
        let second = table.calc_slot(0.3, TimeOfDay::Midday, Weather::Sunny).unwrap();
        assert_eq!(second.species, 20);
        let last = table.calc_slot(0.999999, TimeOfDay::Midday, Weather::Sunny).unwrap();
        assert_eq!(last.species, 20);
    }

    #[test]
    fn test_calc_slot_applicability() {
        let mut night_only = slot(30, 100);
        night_only.times = vec![TimeOfDay::Midnight];
        let table = EncounterTable {
            id: 2,
            slots: vec![night_only, slot(40, 1)],
        };
        // At midday the night slot is skipped no matter the draw.
        let chosen = table.calc_slot(0.01, TimeOfDay::Midday, Weather::Rain).unwrap();
        assert_eq!(chosen.species, 40);
        let chosen = table.calc_slot(0.01, TimeOfDay::Midnight, Weather::Rain).unwrap();
        assert_eq!(chosen.species, 30);
    }

    #[test]
    fn test_empty_table_has_no_slot() {
        let table = EncounterTable { id: 3, slots: Vec::new() };
        assert!(table.calc_slot(0.5, TimeOfDay::Morning, Weather::None).is_none());
    }
}
