use std::{collections::HashMap, sync::Arc};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use seedripper::{
    assets::{AreaData, GameData, PersonalInfo},
    encounter::{EncounterTable, Slot, TimeOfDay, Weather},
    generator::{build_species_info, SpawnFilter, StandardEngine},
    pla_math::advance_seed,
    search::SearchControl,
};

fn bench_data() -> (GameData, EncounterTable) {
    let personal = vec![
        PersonalInfo {
            gender_ratio: 127,
            ability_1: 7,
            ability_2: 13,
            base_stats: [50; 6],
            form_stats_index: 0,
            height_m: 0.7,
            weight_kg: 6.0,
        };
        64
    ];
    let data = GameData::from_parts(
        personal,
        (0..64).map(|i| format!("Species{i}")).collect(),
        (0..32).map(|i| format!("Ability{i}")).collect(),
        Vec::new(),
        HashMap::<String, AreaData>::new(),
    );
    let table = EncounterTable {
        id: 1,
        slots: vec![
            Slot {
                species: 10,
                form: 0,
                is_alpha: false,
                min_level: 10,
                max_level: 12,
                guaranteed_ivs: 0,
                gender: None,
                rate: 90,
                times: Vec::new(),
                weathers: Vec::new(),
            },
            Slot {
                species: 20,
                form: 0,
                is_alpha: true,
                min_level: 14,
                max_level: 16,
                guaranteed_ivs: 3,
                gender: None,
                rate: 10,
                times: Vec::new(),
                weathers: Vec::new(),
            },
        ],
    };
    (data, table)
}

pub fn benchmark_path_enumeration(c: &mut Criterion) {
    let (data, table) = bench_data();
    let species_info = build_species_info(&data, &table, 1, None).unwrap();
    let mut rng: SmallRng = SeedableRng::seed_from_u64(0x12345678);

    c.bench_function("triple spawner enumeration, bound 8", |b| {
        b.iter(|| {
            let seed = rng.gen();
            let engine = StandardEngine::new(
                seed,
                0,
                8,
                3,
                table.clone(),
                Weather::Sunny,
                TimeOfDay::Midday,
                species_info.clone(),
                SpawnFilter::default(),
                Arc::new(SearchControl::new()),
            );
            black_box(engine.count());
        })
    });
}

pub fn benchmark_seed_advance(c: &mut Criterion) {
    let mut rng: SmallRng = SeedableRng::seed_from_u64(0x12345678);
    c.bench_function("seed advance x1000", |b| {
        b.iter(|| {
            let mut seed: u64 = rng.gen();
            for _ in 0..1000 {
                seed = advance_seed(seed, 1);
            }
            black_box(seed);
        })
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(100);
    targets = benchmark_path_enumeration, benchmark_seed_advance
);
criterion_main!(benches);
