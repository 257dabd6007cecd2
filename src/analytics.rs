use rand::Rng;

use crate::risk::round_dp;

/// Platform analytics snapshot. Every figure is drawn fresh per call.
pub fn platform_analytics<R: Rng + ?Sized>(rng: &mut R) -> serde_json::Value {
    serde_json::json!({
        "total_markets": rng.gen_range(150..=300),
        "active_markets": rng.gen_range(20..=50),
        "total_volume": round_dp(rng.gen_range(50_000.0..100_000.0), 2),
        "unique_users": rng.gen_range(500..=1500),
        "accuracy_rate": round_dp(rng.gen_range(0.75..0.85), 3),
        "avg_resolution_time": format!("{} minutes", rng.gen_range(15..=25)),
        "top_categories": [
            { "type": "delivery", "volume": rng.gen_range(30..=50) },
            { "type": "transit", "volume": rng.gen_range(25..=40) },
            { "type": "flight", "volume": rng.gen_range(15..=30) },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ranges() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let a = platform_analytics(&mut rng);
            let total = a["total_markets"].as_i64().unwrap();
            assert!((150..=300).contains(&total));
            let accuracy = a["accuracy_rate"].as_f64().unwrap();
            assert!((0.75..=0.85).contains(&accuracy));
            assert!(a["avg_resolution_time"].as_str().unwrap().ends_with(" minutes"));
            let top = a["top_categories"].as_array().unwrap();
            assert_eq!(top.len(), 3);
            assert_eq!(top[2]["type"], "flight");
        }
    }
}
