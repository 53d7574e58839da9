use rand::random;

pub mod assets;
pub mod encounter;
pub mod errors;
pub mod generator;
pub mod iv_calc;
pub mod pla_math;
pub mod reversal;
pub mod search;
pub mod size;

use errors::SeedripperError;

/// Parses a 64-bit seed from user input: up to 16 hex digits, an optional
/// `0x` prefix, or the literal `random`.
pub fn parse_seed(src: &str) -> Result<u64, SeedripperError> {
    if src.eq_ignore_ascii_case("random") {
        return Ok(random());
    }

    let trimmed = src.strip_prefix("0x").unwrap_or(src);
    if trimmed.is_empty() || trimmed.len() > 16 {
        Err(SeedripperError::SeedError)
    } else {
        u64::from_str_radix(trimmed, 16).map_err(|_| SeedripperError::SeedError)
    }
}

#[cfg(test)]
mod test {
    use super::parse_seed;

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("0x1234567890ABCDEF").unwrap(), 0x1234567890ABCDEF);
        assert_eq!(parse_seed("ff").unwrap(), 0xFF);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("12345678901234567").is_err());
        assert!(parse_seed("0xZZ").is_err());
    }
}
