pub mod engine;
pub mod scorer;
pub mod types;

/// Round half away from zero to `places` decimals
pub fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(72.349, 1), 72.3);
        assert_eq!(round_dp(0.4567, 3), 0.457);
        assert_eq!(round_dp(3.0, 2), 3.0);
        assert_eq!(round_dp(2.0 + 0.95 * 3.0, 1), 4.9);
    }
}
