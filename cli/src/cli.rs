use std::path::PathBuf;

use clap::{Parser, Subcommand};
use seedripper::{
    encounter::{TimeOfDay, Weather},
    parse_seed,
};

#[derive(Parser, Debug)]
#[clap(name="seedripper", author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub subcommand: Commands,

    #[clap(
        global = true,
        short = 'v',
        action = clap::ArgAction::Count,
        help = VERBOSE_HELP,
    )]
    pub verbosity: u8,

    #[clap(
        global = true,
        long = "data",
        default_value = "data",
        help = "Directory containing the extracted game data tables"
    )]
    pub data_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the spawners of an area.
    #[clap(arg_required_else_help = true)]
    Spawners {
        #[clap(help = AREA_HELP)]
        area: String,
    },

    /// Recover a spawner's group seed from two observed specimens.
    #[clap(arg_required_else_help = true)]
    FindSeed {
        #[clap(help = AREA_HELP)]
        area: String,

        #[clap(
            value_parser = parse_u64_id,
            help = "Spawner id, hex"
        )]
        spawner: u64,

        #[clap(help = OBSERVATIONS_HELP)]
        observations: PathBuf,

        #[clap(
            default_value_t = 16,
            long = "fixed-steps",
            help = "Batches for the fixed seed search (power of two, up to 1024)"
        )]
        fixed_steps: u32,

        #[clap(
            default_value_t = 128,
            long = "generator-steps",
            help = "Slices per batch in the generator seed search (up to 256)"
        )]
        generator_steps: u32,
    },

    /// Predict every spawn a spawner emits from a known group seed.
    #[clap(arg_required_else_help = true)]
    Generate {
        #[clap(help = AREA_HELP)]
        area: String,

        #[clap(
            value_parser = parse_u64_id,
            help = "Spawner id, hex"
        )]
        spawner: u64,

        #[clap(
            value_parser = |s: &str| parse_seed(s).map_err(|e| format!("{e:#?}")),
            help = SEED_HELP,
        )]
        seed: u64,

        #[clap(long = "weather", value_enum, default_value_t = Weather::Sunny)]
        weather: Weather,

        #[clap(long = "time", value_enum, default_value_t = TimeOfDay::Midday)]
        time: TimeOfDay,

        #[clap(default_value_t = 0, long = "min-advance")]
        min_advance: u32,

        #[clap(default_value_t = 10, long = "max-advance")]
        max_advance: u32,

        #[clap(default_value_t = 1, long = "shiny-rolls", help = SHINY_ROLLS_HELP)]
        shiny_rolls: u32,

        #[clap(long = "alpha", help = "Only emit alpha specimens")]
        alpha_only: bool,

        #[clap(long = "shiny", help = "Only emit shinies: star, square or any")]
        shiny: Option<String>,

        #[clap(long = "nature", help = "Only emit these natures, by name")]
        natures: Vec<String>,

        #[clap(
            long = "ivs",
            help = "IV ranges as hp,atk,def,spa,spd,spe with min-max entries, e.g. 31,0-31,0-31,0-31,0-31,31"
        )]
        ivs: Option<String>,

        #[clap(
            long = "shortest-path",
            help = "Keep only the first path reaching each specimen"
        )]
        dedup: bool,
    },

    /// Predict a mass outbreak across both of its waves.
    #[clap(arg_required_else_help = true)]
    Outbreak {
        #[clap(help = AREA_HELP)]
        area: String,

        #[clap(
            value_parser = |s: &str| parse_seed(s).map_err(|e| format!("{e:#?}")),
            help = SEED_HELP,
        )]
        seed: u64,

        #[clap(value_parser = parse_u64_id, long = "first-table", help = "First wave encounter table id, hex")]
        first_table: u64,

        #[clap(value_parser = parse_u64_id, long = "second-table", help = "Second wave encounter table id, hex")]
        second_table: u64,

        #[clap(default_value_t = 10, long = "first-count", help = "Total first wave spawns")]
        first_count: u32,

        #[clap(default_value_t = 6, long = "second-count", help = "Total second wave spawns")]
        second_count: u32,

        #[clap(default_value_t = 1, long = "shiny-rolls", help = SHINY_ROLLS_HELP)]
        shiny_rolls: u32,

        #[clap(long = "alpha", help = "Only emit alpha specimens")]
        alpha_only: bool,
    },

    /// Advance a group seed by a number of KO cycles.
    #[clap(arg_required_else_help = true)]
    Advance {
        #[clap(
            value_parser = |s: &str| parse_seed(s).map_err(|e| format!("{e:#?}")),
            help = SEED_HELP,
        )]
        seed: u64,

        #[clap(default_value_t = 1, help = "Number of KO cycles")]
        count: u32,
    },

    /// Recover IV ranges from observed stats.
    #[clap(arg_required_else_help = true)]
    Ivs {
        #[clap(help = "National dex number of the observed species")]
        species: u16,

        #[clap(default_value_t = 0, long = "form")]
        form: u8,

        #[clap(help = "Nature of the specimen, by name")]
        nature: String,

        #[clap(
            help = "Observed stat rows as level:hp,atk,def,spa,spd,spe. Repeat for each reading",
            required = true
        )]
        rows: Vec<String>,
    },

    /// List the size byte pairs matching a displayed height/weight.
    #[clap(arg_required_else_help = true)]
    Sizes {
        #[clap(help = "National dex number of the measured species")]
        species: u16,

        #[clap(default_value_t = 0, long = "form")]
        form: u8,

        #[clap(long = "height-m", help = "Displayed metric height")]
        height_m: Option<f64>,

        #[clap(long = "weight-kg", help = "Displayed metric weight")]
        weight_kg: Option<f64>,

        #[clap(long = "feet", help = "Displayed imperial height, feet part")]
        feet: Option<u32>,

        #[clap(long = "inches", help = "Displayed imperial height, inches part")]
        inches: Option<u32>,

        #[clap(long = "lbs", help = "Displayed imperial weight")]
        weight_lbs: Option<f64>,
    },
}

fn parse_u64_id(s: &str) -> Result<u64, String> {
    parse_seed(s).map_err(|e| format!("{e:#?}"))
}

const VERBOSE_HELP: &str = "Verbosity: -v warnings, -vv info, -vvv everything";

const AREA_HELP: &str = "Area name as listed in the game data, e.g. obsidianfieldlands";

const SEED_HELP: &str = "Group seed as up to 16 hex digits, or 'random'";

const SHINY_ROLLS_HELP: &str =
    "PID rolls per spawn: 1 base, 2 at research level 10, 4 perfect research, +3 with the shiny charm";

const OBSERVATIONS_HELP: &str = "\
JSON file with the two observed specimens: {\"pokemon_1\": {...}, \"pokemon_2\": {...}}, each carrying \
species, form, shiny_rolls, ivs, ability, nature, gender and size measurements";
