mod cli;

use std::{fs::read_to_string, sync::Arc, thread, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use atty::Stream;
use clap::Parser;
use cli::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use seedripper::{
    assets::{GameData, NATURES_EN},
    encounter::forced_gender,
    errors::SeedripperError,
    generator::{
        build_species_info, compute_result_count, dedup_shortest_path, path_to_string,
        OutbreakEngine, PredictedSpawn, SpawnFilter, StandardEngine, VariableEngine,
    },
    iv_calc,
    pla_math::advance_seed,
    reversal::{recover_group_seed, DeviceStages, SpecimenObservation},
    search::{run_worker, SearchControl},
    size::{all_possible_sizes, calc_display_size, SizeObservation},
};
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    let args = Cli::parse();
    match args.verbosity {
        1 => SimpleLogger::new().with_level(log::LevelFilter::Warn).init()?,
        2 => SimpleLogger::new().with_level(log::LevelFilter::Info).init()?,
        3 => SimpleLogger::new().with_level(log::LevelFilter::max()).init()?,
        _ => { /* No higher log levels */ }
    }

    match args.subcommand {
        Commands::Spawners { area } => {
            let data = GameData::load(&args.data_dir)?;
            let area_data = data.area(&area)?;
            for spawner in &area_data.spawners {
                let name = area_data
                    .spawner_names
                    .get(&spawner.id)
                    .map(String::as_str)
                    .unwrap_or("");
                let species = area_data
                    .encounter_tables
                    .get(&spawner.encounter_table)
                    .map(|table| {
                        table
                            .species_forms(true)
                            .into_iter()
                            .map(|(species, form)| data.display_name(species, form, false))
                            .collect::<Vec<String>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                println!(
                    "{:016X}  spawns {}-{}{}  table {:016X}  ({:.1}, {:.1}, {:.1})  {}  [{}]",
                    spawner.id,
                    spawner.min_spawn_count,
                    spawner.max_spawn_count,
                    if spawner.is_mass_outbreak { "  outbreak" } else { "" },
                    spawner.encounter_table,
                    spawner.coordinates[0],
                    spawner.coordinates[1],
                    spawner.coordinates[2],
                    name,
                    species,
                );
            }
        }

        Commands::FindSeed { area, spawner, observations, fixed_steps, generator_steps } => {
            let data = GameData::load(&args.data_dir)?;
            let spawner = data.spawner(&area, spawner)?.clone();

            let text = read_to_string(&observations)
                .with_context(|| format!("couldn't read {}", observations.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            let observation_1: SpecimenObservation =
                serde_json::from_value(value["pokemon_1"].clone()).context("bad pokemon_1")?;
            let observation_2: SpecimenObservation =
                serde_json::from_value(value["pokemon_2"].clone()).context("bad pokemon_2")?;
            observation_1.validate()?;
            observation_2.validate()?;

            let control = SearchControl::new();
            let progress_bar = ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {elapsed_precise} [{pos} work units]")
                    .unwrap(),
            );
            progress_bar.enable_steady_tick(Duration::from_secs(2));
            if !atty::is(Stream::Stdout) {
                progress_bar.finish_and_clear();
            }

            let result = thread::scope(|s| {
                let worker = s.spawn(|| {
                    let stages = DeviceStages {
                        data: &data,
                        control: &control,
                        forced_gender: forced_gender(spawner.encounter_table),
                        fixed_steps,
                        generator_steps,
                    };
                    recover_group_seed(&stages, &observation_1, &observation_2, &spawner)
                });
                while !worker.is_finished() {
                    progress_bar.set_position(control.progress());
                    thread::sleep(Duration::from_millis(500));
                }
                worker.join().map_err(|_| anyhow!("seed search worker panicked"))
            })?;
            progress_bar.finish_and_clear();

            match result {
                Ok(seed) => println!("Group Seed Found: {seed:016X} | {seed}"),
                Err(SeedripperError::Unsuccessful) => {
                    eprintln!("Seed search unsuccessful.");
                    std::process::exit(1);
                }
                Err(error) => return Err(error.into()),
            }
        }

        Commands::Generate {
            area,
            spawner,
            seed,
            weather,
            time,
            min_advance,
            max_advance,
            shiny_rolls,
            alpha_only,
            shiny,
            natures,
            ivs,
            dedup,
        } => {
            let data = GameData::load(&args.data_dir)?;
            let spawner = data.spawner(&area, spawner)?.clone();
            if spawner.is_mass_outbreak {
                bail!("this is a mass outbreak spawner, use the outbreak subcommand");
            }
            let table = data.encounter_table(&area, spawner.encounter_table)?.clone();
            let species_info = build_species_info(&data, &table, shiny_rolls, None)?;

            let filter = SpawnFilter {
                alpha_only,
                shiny_mask: shiny.as_deref().map(parse_shiny_filter).transpose()?,
                natures: natures
                    .iter()
                    .map(|name| parse_nature(name))
                    .collect::<Result<Vec<u8>>>()
                    .map(|parsed| if parsed.is_empty() { None } else { Some(parsed) })?,
                iv_ranges: ivs.as_deref().map(parse_iv_ranges).transpose()?,
                ..Default::default()
            };

            let control = Arc::new(SearchControl::new());
            let receiver = if spawner.is_variable() {
                info!(
                    "Variable spawner: population {}-{}",
                    spawner.min_spawn_count, spawner.max_spawn_count
                );
                run_worker(
                    VariableEngine::new(
                        seed,
                        &[2],
                        min_advance,
                        max_advance,
                        spawner.min_spawn_count,
                        spawner.max_spawn_count,
                        table,
                        weather,
                        time,
                        species_info,
                        filter,
                        control.clone(),
                    ),
                    512,
                )
            } else {
                run_worker(
                    StandardEngine::new(
                        seed,
                        min_advance,
                        max_advance,
                        spawner.max_spawn_count,
                        table,
                        weather,
                        time,
                        species_info,
                        filter,
                        control.clone(),
                    ),
                    512,
                )
            };

            let total = if spawner.is_variable() {
                None
            } else {
                Some(compute_result_count(spawner.max_spawn_count, max_advance))
            };
            consume_results(&data, receiver, &control, total, dedup)?;
        }

        Commands::Outbreak {
            area,
            seed,
            first_table,
            second_table,
            first_count,
            second_count,
            shiny_rolls,
            alpha_only,
        } => {
            let data = GameData::load(&args.data_dir)?;
            let first = data.encounter_table(&area, first_table)?.clone();
            let second = data.encounter_table(&area, second_table)?.clone();
            let first_info = build_species_info(&data, &first, shiny_rolls, None)?;
            let second_info = build_species_info(&data, &second, shiny_rolls, None)?;

            let filter = SpawnFilter { alpha_only, ..Default::default() };
            let control = Arc::new(SearchControl::new());
            let receiver = run_worker(
                OutbreakEngine::new(
                    seed,
                    first_count,
                    second_count,
                    first,
                    second,
                    first_info,
                    second_info,
                    filter,
                    control.clone(),
                ),
                512,
            );
            consume_results(&data, receiver, &control, None, false)?;
        }

        Commands::Advance { seed, count } => {
            println!("{:016X}", advance_seed(seed, count));
        }

        Commands::Ivs { species, form, nature, rows } => {
            let data = GameData::load(&args.data_dir)?;
            let base_stats = data.personal_info(species, form)?.base_stats;
            let nature = parse_nature(&nature)?;

            let mut ranges = iv_calc::FULL_RANGES;
            for row in &rows {
                let (level, stats) = parse_stat_row(row)?;
                ranges = iv_calc::intersect_ranges(
                    ranges,
                    iv_calc::calc_iv_ranges(&base_stats, &stats, level, nature),
                );
            }

            for (stat, (min, max)) in ["HP", "Atk", "Def", "SpA", "SpD", "Spe"].iter().zip(ranges) {
                if min > max {
                    println!("{stat}: Invalid");
                } else if min == max {
                    println!("{stat}: {min}");
                } else {
                    println!("{stat}: {min}-{max}");
                }
            }
            if !iv_calc::is_exact(&ranges) {
                eprintln!("IVs not pinned down; add more stat rows from other levels.");
            }
        }

        Commands::Sizes { species, form, height_m, weight_kg, feet, inches, weight_lbs } => {
            let data = GameData::load(&args.data_dir)?;
            let info = data.personal_info(species, form)?;
            let observation = match (height_m, weight_kg, feet, inches, weight_lbs) {
                (Some(height_m), Some(weight_kg), None, None, None) => {
                    SizeObservation::Metric { height_m, weight_kg }
                }
                (None, None, Some(feet), Some(inches), Some(weight_lbs)) => {
                    SizeObservation::Imperial { feet, inches, weight_lbs }
                }
                _ => bail!("pass either --height-m with --weight-kg, or --feet, --inches and --lbs"),
            };
            let mut pairs: Vec<(u8, u8)> = all_possible_sizes(info, &observation).into_iter().collect();
            pairs.sort_unstable();
            println!("{} possible sizes.", pairs.len());
            for (height, weight) in pairs {
                println!("height {height:>3}  weight {weight:>3}");
            }
        }
    }

    Ok(())
}

/// Streams worker batches to stdout behind a progress bar.
fn consume_results(
    data: &GameData,
    receiver: crossbeam::channel::Receiver<Vec<PredictedSpawn>>,
    control: &SearchControl,
    total: Option<u64>,
    dedup: bool,
) -> Result<()> {
    let progress_bar = match total {
        Some(total) => ProgressBar::new(total).with_style(
            ProgressStyle::default_bar()
                .template("{bar:40} {pos}/{len} ({percent}%) ETA {eta_precise}")
                .unwrap(),
        ),
        None => ProgressBar::new_spinner(),
    };
    if !atty::is(Stream::Stdout) {
        progress_bar.finish_and_clear();
    }

    print_header();
    let incoming = receiver.into_iter().flatten();
    let rows: Box<dyn Iterator<Item = PredictedSpawn>> = if dedup {
        Box::new(dedup_shortest_path(incoming))
    } else {
        Box::new(incoming)
    };
    let mut count = 0usize;
    for row in rows {
        progress_bar.set_position(control.progress());
        progress_bar.suspend(|| print_row(data, &row));
        count += 1;
    }
    progress_bar.finish_and_clear();

    if atty::is(Stream::Stdout) {
        eprintln!("{count} results.");
    }
    Ok(())
}

fn print_header() {
    println!(
        "{:<8} {:<26} {:<20} {:<7} {:<6} {:<8} {:<14} {:<18} {:<12} {:<3} {:<16} {:<16}",
        "Advance", "Path", "Species", "Shiny", "Alpha", "Nature", "Ability", "IVs", "Efforts", "G", "Height",
        "Weight",
    );
}

fn print_row(data: &GameData, row: &PredictedSpawn) {
    let specimen = &row.specimen;
    let ivs = specimen
        .ivs
        .iter()
        .map(u8::to_string)
        .collect::<Vec<String>>()
        .join("/");
    let efforts = specimen
        .ivs
        .iter()
        .map(|&iv| iv_calc::calc_effort_level(iv).to_string())
        .collect::<Vec<String>>()
        .join("/");
    let (ability, height, weight) = match data.personal_info(specimen.species, specimen.form) {
        Ok(info) => {
            let ability_id = if specimen.ability == 1 { info.ability_2 } else { info.ability_1 };
            let display = calc_display_size(info, specimen.height, specimen.weight);
            (
                data.ability_name(ability_id).to_string(),
                format!("{:.02} m ({})", display.height_m, specimen.height),
                format!("{:.02} kg ({})", display.weight_kg, specimen.weight),
            )
        }
        Err(_) => (
            "?".to_string(),
            format!("({})", specimen.height),
            format!("({})", specimen.weight),
        ),
    };
    println!(
        "{:<8} {:<26} {:<20} {:<7} {:<6} {:<8} {:<14} {:<18} {:<12} {:<3} {:<16} {:<16}",
        row.advance,
        path_to_string(&row.path),
        data.display_name(specimen.species, specimen.form, specimen.alpha),
        specimen.shiny.to_string(),
        if specimen.alpha { "Yes" } else { "No" },
        GameData::nature_name(specimen.nature),
        ability,
        ivs,
        efforts,
        specimen.gender.symbol(),
        height,
        weight,
    );
}

fn parse_nature(name: &str) -> Result<u8> {
    NATURES_EN
        .iter()
        .position(|nature| nature.eq_ignore_ascii_case(name.trim()))
        .map(|index| index as u8)
        .ok_or_else(|| anyhow!("unrecognized nature '{name}'"))
}

fn parse_shiny_filter(text: &str) -> Result<u8> {
    match text.to_ascii_lowercase().as_str() {
        "star" => Ok(1),
        "square" => Ok(2),
        "any" => Ok(1 | 2),
        _ => bail!("shiny filter must be star, square or any"),
    }
}

/// Parses six comma-separated IV entries, each a value or a min-max range.
fn parse_iv_ranges(text: &str) -> Result<[(u8, u8); 6]> {
    let entries = text
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            let (min, max) = match entry.split_once('-') {
                Some((min, max)) => (min.trim().parse()?, max.trim().parse()?),
                None => {
                    let exact: u8 = entry.parse()?;
                    (exact, exact)
                }
            };
            if min > max || max > 31 {
                bail!("bad IV range '{entry}'");
            }
            Ok((min, max))
        })
        .collect::<Result<Vec<(u8, u8)>>>()?;
    entries
        .try_into()
        .map_err(|_| anyhow!("exactly six IV entries are required"))
}

fn parse_stat_row(row: &str) -> Result<(u8, [u16; 6])> {
    let (level, stats) = row
        .split_once(':')
        .ok_or_else(|| anyhow!("stat row must look like level:hp,atk,def,spa,spd,spe"))?;
    let level: u8 = level.trim().parse().context("bad level")?;
    let values = stats
        .split(',')
        .map(|stat| stat.trim().parse::<u16>().context("bad stat value"))
        .collect::<Result<Vec<u16>>>()?;
    let stats: [u16; 6] = values
        .try_into()
        .map_err(|_| anyhow!("exactly six stat values are required"))?;
    Ok((level, stats))
}
