use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Class of service disruption being priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisruptionCategory {
    Delivery,
    Transit,
    Flight,
    /// Anything else a caller sends. Scored at the base probability.
    #[serde(other)]
    Other,
}

impl DisruptionCategory {
    pub const ALL: [DisruptionCategory; 3] = [Self::Delivery, Self::Transit, Self::Flight];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Transit => "transit",
            Self::Flight => "flight",
            Self::Other => "other",
        }
    }
}

/// Four-level label derived from a disruption probability.
/// Variants are declared in order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Classify a probability on the 0-1 scale
    pub fn from_probability(probability: f64) -> Self {
        match probability {
            p if p >= 0.8 => Self::Critical,
            p if p >= 0.65 => Self::High,
            p if p >= 0.4 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Classify a probability already scaled to 0-100 for display
    pub fn from_percent(percent: f64) -> Self {
        match percent {
            p if p >= 80.0 => Self::Critical,
            p if p >= 65.0 => Self::High,
            p if p >= 40.0 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Request body for a single prediction
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreInput {
    #[serde(rename = "disruption_type")]
    pub category: DisruptionCategory,
    #[serde(default)]
    pub location: Map<String, Value>,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

impl ScoreInput {
    pub fn new(category: DisruptionCategory) -> Self {
        Self {
            category,
            location: Map::new(),
            context: None,
        }
    }

    pub fn with_weather(mut self, weather: &str) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert("weather".to_string(), Value::String(weather.to_string()));
        self
    }

    /// `context.weather` when it is a string
    pub fn weather(&self) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.get("weather"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoricalPattern {
    Normal,
    Elevated,
    High,
}

impl HistoricalPattern {
    pub const ALL: [HistoricalPattern; 3] = [Self::Normal, Self::Elevated, Self::High];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factors {
    pub time_of_day: u32,
    pub weather_impact: String,
    pub historical_pattern: HistoricalPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub probability: f64,
    pub confidence: f64,
    #[serde(rename = "estimated_delay")]
    pub estimated_delay_minutes: u32,
    pub factors: Factors,
}

impl ScoreResult {
    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::from_probability(self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_probability(0.8), RiskTier::Critical);
        assert_eq!(RiskTier::from_probability(0.7999), RiskTier::High);
        assert_eq!(RiskTier::from_probability(0.65), RiskTier::High);
        assert_eq!(RiskTier::from_probability(0.6499), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(0.4), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(0.3999), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.95), RiskTier::Critical);
    }

    #[test]
    fn test_tier_monotonic() {
        let mut last = RiskTier::Low;
        for i in 0..=1000 {
            let tier = RiskTier::from_probability(i as f64 / 1000.0);
            assert!(tier >= last, "tier dropped at p={}", i as f64 / 1000.0);
            last = tier;
        }
        assert_eq!(last, RiskTier::Critical);
    }

    #[test]
    fn test_percent_scale_matches_unit_scale() {
        for p in [0.0, 0.3999, 0.4, 0.55, 0.6499, 0.65, 0.7999, 0.8, 0.95] {
            assert_eq!(RiskTier::from_percent(p * 100.0), RiskTier::from_probability(p), "p={}", p);
        }
    }

    #[test]
    fn test_category_deserialize() {
        let input: ScoreInput = serde_json::from_str(
            r#"{"disruption_type": "flight", "location": {"airport": "LAX"}, "context": {"weather": "fog"}}"#,
        )
        .unwrap();
        assert_eq!(input.category, DisruptionCategory::Flight);
        assert_eq!(input.weather(), Some("fog"));
        assert_eq!(input.location["airport"], "LAX");
    }

    #[test]
    fn test_unknown_category_and_missing_fields() {
        let input: ScoreInput = serde_json::from_str(r#"{"disruption_type": "ferry"}"#).unwrap();
        assert_eq!(input.category, DisruptionCategory::Other);
        assert!(input.location.is_empty());
        assert_eq!(input.weather(), None);
    }

    #[test]
    fn test_non_string_weather_ignored() {
        let input: ScoreInput =
            serde_json::from_str(r#"{"disruption_type": "delivery", "context": {"weather": 3}}"#).unwrap();
        assert_eq!(input.weather(), None);
    }

    #[test]
    fn test_result_wire_names() {
        let result = ScoreResult {
            probability: 0.5,
            confidence: 0.8,
            estimated_delay_minutes: 20,
            factors: Factors {
                time_of_day: 12,
                weather_impact: "rain".to_string(),
                historical_pattern: HistoricalPattern::Elevated,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["estimated_delay"], 20);
        assert_eq!(json["factors"]["historical_pattern"], "elevated");
        assert_eq!(serde_json::to_value(RiskTier::Critical).unwrap(), "critical");
    }
}
