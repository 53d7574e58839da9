//! Path enumeration for mass outbreaks.
//!
//! Outbreaks run in two waves over two encounter tables. Every branch
//! opens with three single KOs into the first wave; once the first wave's
//! spawn budget drains, the player may resolve up to three lingering
//! "ghost" spawns (which consume RNG and second-wave slots but materialize
//! nothing) before clearing the wave, which brings in four second-wave
//! spawns and switches tables. The wave budgets bound the tree, so the
//! engine needs no advance limits.

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

pub const CLEAR_WAVE: u8 = 255;
/// Mons on the field at once during an outbreak.
const FIELD_SIZE: u32 = 4;
/// The opening protocol: three single KOs, the first two folded into seed
/// pre-advances of the root node.
const OPENING_KOS: u32 = 3;

struct Node {
    path: Vec<u8>,
    seed: u64,
    /// Spawns this node materializes (0 for ghost resolutions).
    spawn_count: u32,
    first_remaining: u32,
    second_remaining: u32,
    second_wave: bool,
}

impl Node {
    fn is_ghost(&self) -> bool {
        matches!(self.path.last(), Some(11..=13))
    }
}

pub struct OutbreakEngine {
    first_table: EncounterTable,
    second_table: EncounterTable,
    time: TimeOfDay,
    weather: Weather,
    first_species_info: HashMap<(u16, u8), SpeciesConfig>,
    second_species_info: HashMap<(u16, u8), SpeciesConfig>,
    filter: SpawnFilter,
    control: Arc<SearchControl>,
    stack: Vec<Node>,
    pending: VecDeque<PredictedSpawn>,
}

impl OutbreakEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seed: u64,
        first_wave_count: u32,
        second_wave_count: u32,
        first_table: EncounterTable,
        second_table: EncounterTable,
        first_species_info: HashMap<(u16, u8), SpeciesConfig>,
        second_species_info: HashMap<(u16, u8), SpeciesConfig>,
        filter: SpawnFilter,
        control: Arc<SearchControl>,
    ) -> OutbreakEngine {
        // The root is the third opening KO; the first two are the
        // pre-advances, re-seeded between like any single KO.
        let root_seed = advance_seed(advance_seed(seed, 1), 1);
        let first_remaining = first_wave_count.saturating_sub(FIELD_SIZE + OPENING_KOS);

        OutbreakEngine {
            first_table,
            second_table,
            time: TimeOfDay::Midday,
            weather: Weather::None,
            first_species_info,
            second_species_info,
            filter,
            control,
            stack: vec![Node {
                path: vec![1],
                seed: root_seed,
                spawn_count: 1,
                first_remaining,
                second_remaining: second_wave_count,
                second_wave: false,
            }],
            pending: VecDeque::new(),
        }
    }

    fn expand(&mut self, node: &Node) {
        if node.second_wave {
            for kos in 1..=FIELD_SIZE.min(node.second_remaining) {
                self.stack.push(Node {
                    path: push_action(&node.path, kos as u8),
                    seed: advance_seed(node.seed, kos),
                    spawn_count: kos,
                    first_remaining: 0,
                    second_remaining: node.second_remaining - kos,
                    second_wave: true,
                });
            }
            return;
        }

        if node.first_remaining > 0 {
            for kos in 1..=FIELD_SIZE.min(node.first_remaining) {
                self.stack.push(Node {
                    path: push_action(&node.path, kos as u8),
                    seed: advance_seed(node.seed, kos),
                    spawn_count: kos,
                    first_remaining: node.first_remaining - kos,
                    second_remaining: node.second_remaining,
                    second_wave: false,
                });
            }
            return;
        }

        // First wave drained: clear immediately, or resolve ghosts first.
        self.push_clear_wave(node);
        if !node.is_ghost() {
            for ghosts in 1..=3u32.min(node.second_remaining) {
                self.stack.push(Node {
                    path: push_action(&node.path, 10 + ghosts as u8),
                    seed: advance_seed(node.seed, ghosts),
                    spawn_count: 0,
                    first_remaining: 0,
                    // Ghost resolutions consume second-wave slots in the
                    // amount resolved.
                    second_remaining: node.second_remaining - ghosts,
                    second_wave: false,
                });
            }
        }
    }

    fn push_clear_wave(&mut self, node: &Node) {
        let spawned = FIELD_SIZE.min(node.second_remaining);
        if spawned == 0 {
            return;
        }
        self.stack.push(Node {
            path: push_action(&node.path, CLEAR_WAVE),
            seed: advance_seed(node.seed, spawned),
            spawn_count: spawned,
            first_remaining: 0,
            second_remaining: node.second_remaining - spawned,
            second_wave: true,
        });
    }
}

fn push_action(path: &[u8], action: u8) -> Vec<u8> {
    let mut next = path.to_vec();
    next.push(action);
    next
}

impl Iterator for OutbreakEngine {
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

            if node.spawn_count > 0 {
                let (table, species_info) = if node.second_wave {
                    (&self.second_table, &self.second_species_info)
                } else {
                    (&self.first_table, &self.first_species_info)
                };
                let advance = (node.path.len() - 1) as u32;
                let mut rows = Vec::new();
                materialize_spawns(
                    node.seed,
                    node.spawn_count,
                    advance,
                    &node.path,
                    table,
                    self.time,
                    self.weather,
                    species_info,
                    &self.filter,
                    &mut rows,
                );
                self.pending.extend(rows);
            }

            self.expand(&node);
        }
    }
}
