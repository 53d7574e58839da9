//! Analytic sizing of the fixed-seed result buffer.
//!
//! The IV constraint leaves 2^34 of the 2^64 seeds alive; the remaining
//! observation rejections thin that out by exactly computable odds, which
//! is what lets the stage allocate its result buffer up front and treat
//! overflow as an invariant violation.

use std::collections::HashSet;

use crate::assets::Gender;

/// Seeds consistent with a 30-bit IV observation.
const IV_CONSISTENT_SEEDS: f64 = (1u64 << 34) as f64;

/// Probability that one size draw (`rand(0x81) + rand(0x80)`) lands on a
/// byte value. The sum is triangular over [0, 255].
pub fn size_byte_probability(value: u8) -> f64 {
    let v = value as i32;
    let count = v.min(128) - (v - 127).max(0) + 1;
    count as f64 / (129.0 * 128.0)
}

fn gender_probability(gender: Gender, gender_ratio: u8) -> f64 {
    match Gender::from_ratio(gender_ratio) {
        // A forced ratio either matches the observation or rules every
        // seed out.
        Some(forced) => {
            if forced == gender {
                1.0
            } else {
                0.0
            }
        }
        None => {
            let female = (gender_ratio - 1) as f64 / 253.0;
            if gender == Gender::Female {
                female
            } else {
                1.0 - female
            }
        }
    }
}

/// Expected number of fixed seeds surviving every observation rejection.
pub fn expected_fixed_seeds(
    two_abilities: bool,
    gender: Gender,
    gender_ratio: u8,
    sizes: &HashSet<(u8, u8)>,
) -> f64 {
    let ability = if two_abilities { 0.5 } else { 1.0 };
    let nature = 1.0 / 25.0;
    let size: f64 = sizes
        .iter()
        .map(|&(height, weight)| size_byte_probability(height) * size_byte_probability(weight))
        .sum();
    IV_CONSISTENT_SEEDS * ability * gender_probability(gender, gender_ratio) * nature * size
}

/// Buffer size at 1.5x the expectation, floored so sparse searches still
/// have room for ordinary fluctuation.
pub fn buffer_capacity(expected: f64) -> usize {
    ((expected * 1.5).ceil() as usize).max(16)
}
