//! Path enumeration for single and fixed-count multi spawners.

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
}

/// Depth-first enumeration of every `(advance, path, specimen)` tuple a
/// standard spawner can reach within the advance bounds.
///
/// Single spawners open with two consecutive single KOs (the two specimens
/// the seed finder consumed), doubles and triples with clearing the mons
/// initially present, so the roots already carry those advances.
pub struct StandardEngine {
    table: EncounterTable,
    time: TimeOfDay,
    weather: Weather,
    species_info: HashMap<(u16, u8), SpeciesConfig>,
    filter: SpawnFilter,
    control: Arc<SearchControl>,
    spawn_count: u32,
    min_adv: u32,
    max_adv: u32,
    initial_len: usize,
    stack: Vec<Node>,
    pending: VecDeque<PredictedSpawn>,
}

impl StandardEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seed: u64,
        min_adv: u32,
        max_adv: u32,
        spawn_count: u32,
        table: EncounterTable,
        weather: Weather,
        time: TimeOfDay,
        species_info: HashMap<(u16, u8), SpeciesConfig>,
        filter: SpawnFilter,
        control: Arc<SearchControl>,
    ) -> StandardEngine {
        let mut stack = Vec::new();
        if spawn_count == 1 {
            // Two single KOs back to back, re-seeding in between.
            stack.push(Node {
                path: vec![1, 1],
                seed: advance_seed(advance_seed(seed, 1), 1),
            });
        } else if spawn_count > 1 {
            stack.push(Node {
                path: vec![2],
                seed: advance_seed(seed, 2),
            });
        }
        if spawn_count == 3 {
            // Triples can also open by catching the third mon.
            stack.push(Node {
                path: vec![3],
                seed: advance_seed(seed, 3),
            });
        }
        let initial_len = stack.first().map(|node| node.path.len()).unwrap_or(0);

        StandardEngine {
            table,
            time,
            weather,
            species_info,
            filter,
            control,
            spawn_count,
            min_adv,
            max_adv,
            initial_len,
            stack,
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for StandardEngine {
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
                    self.spawn_count,
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
                for kos in 1..=self.spawn_count {
                    let mut path = node.path.clone();
                    path.push(kos as u8);
                    self.stack.push(Node {
                        path,
                        seed: advance_seed(node.seed, kos),
                    });
                }
            }
        }
    }
}
