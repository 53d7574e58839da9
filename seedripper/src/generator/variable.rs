//! Path enumeration for variable-count multi spawners.
//!
//! These spawners top their population back up to a minimum after each
//! action instead of refilling completely, so the number of mons a node
//! materializes depends on the KO history, not just the spawner.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    encounter::{EncounterTable, TimeOfDay, Weather},
    pla_math::advance_seed,
    search::SearchControl,
};

use super::{materialize_spawns, PredictedSpawn, SpawnFilter, SpeciesConfig};

struct Node {
    path: Vec<u8>,
    seed: u64,
    population: u32,
}

pub struct VariableEngine {
    table: EncounterTable,
    time: TimeOfDay,
    weather: Weather,
    species_info: HashMap<(u16, u8), SpeciesConfig>,
    filter: SpawnFilter,
    control: Arc<SearchControl>,
    min_count: u32,
    min_adv: u32,
    max_adv: u32,
    initial_len: usize,
    stack: Vec<Node>,
    pending: VecDeque<PredictedSpawn>,
}

impl VariableEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seed: u64,
        starting_path: &[u8],
        min_adv: u32,
        max_adv: u32,
        min_count: u32,
        max_count: u32,
        table: EncounterTable,
        weather: Weather,
        time: TimeOfDay,
        species_info: HashMap<(u16, u8), SpeciesConfig>,
        filter: SpawnFilter,
        control: Arc<SearchControl>,
    ) -> VariableEngine {
        // Walk the starting actions against a full spawner: each KO batch
        // advances the seed and clamps the population to the minimum.
        let mut population = max_count;
        let mut node_seed = seed;
        for &action in starting_path {
            population = population.saturating_sub(action as u32).max(min_count);
            node_seed = advance_seed(node_seed, action as u32);
        }

        VariableEngine {
            table,
            time,
            weather,
            species_info,
            filter,
            control,
            min_count,
            min_adv,
            max_adv,
            initial_len: starting_path.len(),
            stack: vec![Node {
                path: starting_path.to_vec(),
                seed: node_seed,
                population,
            }],
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for VariableEngine {
    type Item = PredictedSpawn;

    fn next(&mut self) -> Option<PredictedSpawn> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(row);
            }
            let node = self.stack.pop()?;
            if self.control.is_cancelled() {
                self.stack.clear();
                return None;
            }
            self.control.tick(1);

            let advance = (node.path.len() - self.initial_len) as u32;
            if advance >= self.min_adv {
                let mut rows = Vec::new();
                materialize_spawns(
                    node.seed,
                    node.population,
                    advance,
                    &node.path,
                    &self.table,
                    self.time,
                    self.weather,
                    &self.species_info,
                    &self.filter,
                    &mut rows,
                );
                self.pending.extend(rows);
            }

            if advance + 1 < self.max_adv {
                for kos in 1..=node.population {
                    let mut path = node.path.clone();
                    path.push(kos as u8);
                    self.stack.push(Node {
                        path,
                        seed: advance_seed(node.seed, kos),
                        population: node.population.saturating_sub(kos).max(self.min_count),
                    });
                }
            }
        }
    }
}
