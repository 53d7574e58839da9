//! Stat-based IV recovery.
//!
//! Players can't read IVs off the screen, but they can read stats. This
//! inverts the stat formula into per-stat IV ranges and intersects rows
//! from different levels or evolution-line members until the ranges pin
//! down to single values.

/// Which nature axis each non-HP stat sits on: Atk, Def, Spe, SpA, SpD.
const NATURE_AXIS: [i8; 6] = [-1, 0, 1, 3, 4, 2];

/// The game's stat formula, including the truncating 10% nature modifier.
pub fn calc_stat(stat_index: usize, base_stat: u16, iv: u8, level: u8, nature: u8) -> u16 {
    let mut stat = ((2 * base_stat as u32 + iv as u32) * level as u32 / 100) as u16;
    if stat_index == 0 {
        return stat + level as u16 + 10;
    }
    stat += 5;
    let boosted = nature / 5;
    let reduced = nature % 5;
    if boosted != reduced {
        if NATURE_AXIS[stat_index] == boosted as i8 {
            stat = (stat as f32 * 1.1) as u16;
        } else if NATURE_AXIS[stat_index] == reduced as i8 {
            stat = (stat as f32 * 0.9) as u16;
        }
    }
    stat
}

/// Inclusive IV range per stat; `(1, 0)` style inverted bounds mean no IV
/// reproduces the observed stat.
pub type IvRanges = [(u8, u8); 6];

pub const FULL_RANGES: IvRanges = [(0, 31); 6];

/// IV ranges consistent with one observed stat row.
pub fn calc_iv_ranges(base_stats: &[u16; 6], stats: &[u16; 6], level: u8, nature: u8) -> IvRanges {
    let mut ranges = [(31u8, 0u8); 6];
    for stat_index in 0..6 {
        for iv in 0..=31u8 {
            if calc_stat(stat_index, base_stats[stat_index], iv, level, nature) == stats[stat_index] {
                let (min, max) = &mut ranges[stat_index];
                *min = (*min).min(iv);
                *max = (*max).max(iv);
            }
        }
    }
    ranges
}

/// Narrows `current` by another observed row.
pub fn intersect_ranges(current: IvRanges, other: IvRanges) -> IvRanges {
    let mut result = current;
    for i in 0..6 {
        result[i].0 = result[i].0.max(other[i].0);
        result[i].1 = result[i].1.min(other[i].1);
    }
    result
}

pub fn is_exact(ranges: &IvRanges) -> bool {
    ranges.iter().all(|(min, max)| min == max)
}

/// Initial effort level granted for an IV, as shown on the status screen.
pub fn calc_effort_level(iv: u8) -> u8 {
    match iv {
        31.. => 3,
        26.. => 2,
        20.. => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const BASE: [u16; 6] = [55, 65, 45, 45, 45, 70];

    #[test]
    fn test_hp_formula() {
        // HP ignores nature and adds level + 10.
        assert_eq!(calc_stat(0, 55, 31, 50, 0), (141 * 50 / 100 + 60) as u16);
    }

    #[test]
    fn test_nature_modifier_truncates() {
        let neutral = calc_stat(1, 65, 31, 50, 0);
        let adamant = calc_stat(1, 65, 31, 50, 3);
        assert_eq!(adamant, (neutral as f32 * 1.1) as u16);
    }

    #[test]
    fn test_ranges_contain_true_iv() {
        for level in [15u8, 32, 50, 68] {
            for nature in [0u8, 3, 10, 24] {
                let ivs = [7u8, 31, 0, 19, 25, 12];
                let mut stats = [0u16; 6];
                for i in 0..6 {
                    stats[i] = calc_stat(i, BASE[i], ivs[i], level, nature);
                }
                let ranges = calc_iv_ranges(&BASE, &stats, level, nature);
                for i in 0..6 {
                    assert!(ranges[i].0 <= ivs[i] && ivs[i] <= ranges[i].1);
                }
            }
        }
    }

    #[test]
    fn test_intersection_narrows_to_exact() {
        let ivs = [7u8, 31, 0, 19, 25, 12];
        let nature = 3;
        let mut ranges = FULL_RANGES;
        // Low levels give coarse ranges; stacking many levels pins them.
        for level in 1..=100u8 {
            let mut stats = [0u16; 6];
            for i in 0..6 {
                stats[i] = calc_stat(i, BASE[i], ivs[i], level, nature);
            }
            ranges = intersect_ranges(ranges, calc_iv_ranges(&BASE, &stats, level, nature));
        }
        assert!(is_exact(&ranges));
        for i in 0..6 {
            assert_eq!(ranges[i].0, ivs[i]);
        }
    }

    #[test]
    fn test_effort_levels() {
        assert_eq!(calc_effort_level(31), 3);
        assert_eq!(calc_effort_level(26), 2);
        assert_eq!(calc_effort_level(25), 1);
        assert_eq!(calc_effort_level(20), 1);
        assert_eq!(calc_effort_level(19), 0);
        assert_eq!(calc_effort_level(0), 0);
    }
}
