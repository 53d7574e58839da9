//! Display-size arithmetic and its inverse.
//!
//! The game derives a specimen's displayed height and weight from two bytes
//! via a species-specific scale factor. The seed finder needs the inverse:
//! every byte pair that renders to the measurements the player can read off
//! the screen. The forward arithmetic is done in f32 like the game; the
//! inverse compares at display precision.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    assets::{GameData, PersonalInfo},
    errors::SeedripperError,
};

const LBS_PER_KG: f32 = 2.204_622_6;

/// Scale factor for one size byte: 0.8 at byte 0, 1.2 at byte 255.
pub fn size_ratio(byte: u8) -> f32 {
    byte as f32 / 255.0 * 0.4 + 0.8
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub height_m: f32,
    pub weight_kg: f32,
}

/// The displayed metric size of a specimen. Weight scales with both bytes
/// because heavier specimens are also taller.
pub fn calc_display_size(info: &PersonalInfo, height: u8, weight: u8) -> DisplaySize {
    let height_scale = size_ratio(height);
    let weight_scale = size_ratio(weight);
    DisplaySize {
        height_m: info.height_m * height_scale,
        weight_kg: info.weight_kg * weight_scale * height_scale,
    }
}

/// Feet and whole inches the way the status screen renders them.
pub fn imperial_height(height_m: f32) -> (u32, u32) {
    let total_inches = height_m / 0.0254;
    let feet = (total_inches / 12.0) as u32;
    let inches = (total_inches - feet as f32 * 12.0).round() as u32;
    (feet, inches)
}

pub fn imperial_weight_lbs(weight_kg: f32) -> f32 {
    weight_kg * LBS_PER_KG
}

/// A size reading as the player reported it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeObservation {
    Metric { height_m: f64, weight_kg: f64 },
    Imperial { feet: u32, inches: u32, weight_lbs: f64 },
}

/// One measured specimen. Measurements may come from evolved members of the
/// same line; the underlying bytes are preserved through evolution, so each
/// measurement constrains the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub species: u16,
    #[serde(default)]
    pub form: u8,
    #[serde(flatten)]
    pub size: SizeObservation,
}

fn display_centi(value: f32) -> i64 {
    (value * 100.0).round() as i64
}

fn display_deci(value: f32) -> i64 {
    (value * 10.0).round() as i64
}

/// Whether a byte pair renders to the observed measurement for a species.
pub fn matches_observation(info: &PersonalInfo, height: u8, weight: u8, obs: &SizeObservation) -> bool {
    let display = calc_display_size(info, height, weight);
    match *obs {
        SizeObservation::Metric { height_m, weight_kg } => {
            display_centi(display.height_m) == display_centi(height_m as f32)
                && display_centi(display.weight_kg) == display_centi(weight_kg as f32)
        }
        SizeObservation::Imperial { feet, inches, weight_lbs } => {
            imperial_height(display.height_m) == (feet, inches)
                && display_deci(imperial_weight_lbs(display.weight_kg)) == display_deci(weight_lbs as f32)
        }
    }
}

/// All byte pairs that could produce an observed display size. Brute-forces
/// the full 256x256 space; the display math is cheap enough that nothing
/// smarter is warranted.
pub fn all_possible_sizes(info: &PersonalInfo, obs: &SizeObservation) -> HashSet<(u8, u8)> {
    (0..=255u8)
        .cartesian_product(0..=255u8)
        .filter(|&(height, weight)| matches_observation(info, height, weight, obs))
        .collect()
}

/// Candidate byte pairs consistent with every measurement. Multiple
/// measurements of the same line intersect; the set can shrink to a handful
/// of pairs with two or three readings.
pub fn intersect_measurements(
    data: &GameData,
    measurements: &[Measurement],
) -> Result<HashSet<(u8, u8)>, SeedripperError> {
    let mut iter = measurements.iter();
    let first = iter.next().ok_or(SeedripperError::InvalidObservation)?;
    let mut sizes = all_possible_sizes(data.personal_info(first.species, first.form)?, &first.size);
    for measurement in iter {
        let candidates =
            all_possible_sizes(data.personal_info(measurement.species, measurement.form)?, &measurement.size);
        sizes.retain(|pair| candidates.contains(pair));
    }
    Ok(sizes)
}

/// Flattens a candidate set into a deterministic `(h, w)` pair table, the
/// layout the search kernels consume.
pub fn build_sizes_table(sizes: &HashSet<(u8, u8)>) -> Vec<u8> {
    sizes
        .iter()
        .sorted()
        .flat_map(|&(height, weight)| [height, weight])
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn info(height_m: f32, weight_kg: f32) -> PersonalInfo {
        PersonalInfo {
            gender_ratio: 127,
            ability_1: 1,
            ability_2: 2,
            base_stats: [50; 6],
            form_stats_index: 0,
            height_m,
            weight_kg,
        }
    }

    #[test]
    fn test_ratio_range() {
        assert_eq!(size_ratio(0), 0.8);
        assert!((size_ratio(255) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_inversion_contains_true_pair() {
        let info = info(0.7, 6.0);
        for &(height, weight) in &[(0u8, 0u8), (37, 200), (255, 255), (128, 1)] {
            let display = calc_display_size(&info, height, weight);
            let obs = SizeObservation::Metric {
                height_m: display.height_m as f64,
                weight_kg: display.weight_kg as f64,
            };
            assert!(all_possible_sizes(&info, &obs).contains(&(height, weight)));
        }
    }

    #[test]
    fn test_imperial_inversion_contains_true_pair() {
        let info = info(1.5, 35.0);
        let (height, weight) = (90u8, 17u8);
        let display = calc_display_size(&info, height, weight);
        let (feet, inches) = imperial_height(display.height_m);
        let obs = SizeObservation::Imperial {
            feet,
            inches,
            weight_lbs: imperial_weight_lbs(display.weight_kg) as f64,
        };
        assert!(all_possible_sizes(&info, &obs).contains(&(height, weight)));
    }

    #[test]
    fn test_imperial_is_coarser_than_metric() {
        // Whole-inch rounding keeps more candidates alive than centimetre
        // display does for small species.
        let info = info(0.4, 4.0);
        let display = calc_display_size(&info, 120, 120);
        let metric = all_possible_sizes(
            &info,
            &SizeObservation::Metric {
                height_m: display.height_m as f64,
                weight_kg: display.weight_kg as f64,
            },
        );
        let (feet, inches) = imperial_height(display.height_m);
        let imperial = all_possible_sizes(
            &info,
            &SizeObservation::Imperial {
                feet,
                inches,
                weight_lbs: imperial_weight_lbs(display.weight_kg) as f64,
            },
        );
        assert!(metric.len() <= imperial.len());
        assert!(metric.contains(&(120, 120)));
    }

    #[test]
    fn test_sizes_table_layout() {
        let sizes: HashSet<(u8, u8)> = [(3, 4), (1, 2)].into_iter().collect();
        assert_eq!(build_sizes_table(&sizes), vec![1, 2, 3, 4]);
    }
}
