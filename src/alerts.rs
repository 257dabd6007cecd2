use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::risk::round_dp;
use crate::risk::scorer::DisruptionScorer;
use crate::risk::types::{DisruptionCategory, RiskTier, ScoreInput};

/// Disruption alert feed
///
/// Three fixed scenarios, each re-scored on every request with a random
/// weather context. Probability and confidence are shown on a 0-100 scale
/// and the risk level is read off that displayed value.
struct AlertTemplate {
    category: DisruptionCategory,
    title: &'static str,
    description: &'static str,
    location: &'static [(&'static str, &'static str)],
}

const TEMPLATES: [AlertTemplate; 3] = [
    AlertTemplate {
        category: DisruptionCategory::Delivery,
        title: "DoorDash Peak Hour Delays",
        description: "High probability of 15+ min delays in downtown",
        location: &[("city", "San Francisco"), ("area", "downtown")],
    },
    AlertTemplate {
        category: DisruptionCategory::Transit,
        title: "Subway System Delays",
        description: "Signal issues affecting multiple lines",
        location: &[("city", "New York"), ("system", "MTA")],
    },
    AlertTemplate {
        category: DisruptionCategory::Flight,
        title: "Airport Weather Delays",
        description: "Storm system approaching major airports",
        location: &[("airport", "LAX"), ("city", "Los Angeles")],
    },
];

const ALERT_WEATHER: [&str; 3] = ["clear", "rain", "storm"];

#[derive(Debug, Clone, Serialize)]
pub struct DisruptionAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub category: DisruptionCategory,
    pub title: String,
    pub description: String,
    /// Percent, one decimal
    pub probability: f64,
    /// Percent, one decimal
    pub confidence: f64,
    /// Minutes
    pub time_to_resolution: u32,
    pub potential_payout: f64,
    pub risk_level: RiskTier,
    pub location: Map<String, Value>,
}

/// Display percent (one decimal) and the tier shown next to it.
/// The tier follows the rounded percent, so p in [0.7995, 0.8) shows as
/// 80.0 / critical and p in [0.6495, 0.65) as 65.0 / high, one tier above
/// `RiskTier::from_probability`.
pub fn display_probability(probability: f64) -> (f64, RiskTier) {
    let pct = round_dp(probability * 100.0, 1);
    (pct, RiskTier::from_percent(pct))
}

/// Build up to `limit` alerts, in template order
pub fn build_alerts<R: Rng + ?Sized>(
    scorer: &DisruptionScorer,
    hour: u32,
    unix_now: i64,
    limit: usize,
    rng: &mut R,
) -> Vec<DisruptionAlert> {
    TEMPLATES
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, template)| {
            let weather = ALERT_WEATHER.choose(rng).copied().unwrap_or("clear");
            let mut input = ScoreInput::new(template.category).with_weather(weather);
            input.location = template_location(template);

            let prediction = scorer.score(&input, hour, rng);
            let (probability_pct, risk_level) = display_probability(prediction.probability);

            DisruptionAlert {
                id: format!("alert_{}_{}", i + 1, unix_now),
                category: template.category,
                title: template.title.to_string(),
                description: template.description.to_string(),
                probability: probability_pct,
                confidence: round_dp(prediction.confidence * 100.0, 1),
                time_to_resolution: rng.gen_range(15..=30),
                potential_payout: round_dp(2.0 + prediction.probability * 3.0, 1),
                risk_level,
                location: input.location,
            }
        })
        .collect()
}

fn template_location(template: &AlertTemplate) -> Map<String, Value> {
    template
        .location
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::config::ScorerConfig;

    fn scorer() -> DisruptionScorer {
        DisruptionScorer::new(&ScorerConfig::default())
    }

    #[test]
    fn test_limit_caps_templates() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(build_alerts(&scorer(), 12, 0, 0, &mut rng).len(), 0);
        assert_eq!(build_alerts(&scorer(), 12, 0, 2, &mut rng).len(), 2);
        assert_eq!(build_alerts(&scorer(), 12, 0, 10, &mut rng).len(), 3);
    }

    #[test]
    fn test_alert_fields() {
        let mut rng = StdRng::seed_from_u64(11);
        let alerts = build_alerts(&scorer(), 8, 1_717_200_000, 3, &mut rng);

        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["alert_1_1717200000", "alert_2_1717200000", "alert_3_1717200000"]);
        assert_eq!(alerts[0].category, DisruptionCategory::Delivery);
        assert_eq!(alerts[1].location["system"], "MTA");
        assert_eq!(alerts[2].location["airport"], "LAX");

        for alert in &alerts {
            assert!((0.0..=95.0).contains(&alert.probability));
            assert!((75.0..=95.0).contains(&alert.confidence));
            assert!((15..=30).contains(&alert.time_to_resolution));
            assert!((2.0..=4.9).contains(&alert.potential_payout));
            // one decimal place on the display values
            assert!(((alert.probability * 10.0).round() - alert.probability * 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_risk_level_matches_displayed_probability() {
        let mut rng = StdRng::seed_from_u64(5);
        for hour in 0..24 {
            for alert in build_alerts(&scorer(), hour, 0, 3, &mut rng) {
                assert_eq!(alert.risk_level, RiskTier::from_percent(alert.probability));
            }
        }
    }

    #[test]
    fn test_display_tier_follows_rounding() {
        assert_eq!(display_probability(0.7997), (80.0, RiskTier::Critical));
        assert_eq!(RiskTier::from_probability(0.7997), RiskTier::High);

        assert_eq!(display_probability(0.6496), (65.0, RiskTier::High));
        assert_eq!(RiskTier::from_probability(0.6496), RiskTier::Medium);

        assert_eq!(display_probability(0.7994), (79.9, RiskTier::High));
        assert_eq!(display_probability(0.3996), (40.0, RiskTier::Medium));
    }

    #[test]
    fn test_serialized_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let alerts = build_alerts(&scorer(), 12, 0, 1, &mut rng);
        let json = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(json["type"], "delivery");
        assert_eq!(json["location"]["city"], "San Francisco");
        assert!(json["risk_level"].is_string());
    }
}
