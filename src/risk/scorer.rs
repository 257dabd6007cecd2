use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ScorerConfig;
use crate::risk::types::{DisruptionCategory, Factors, HistoricalPattern, ScoreInput, ScoreResult};

pub const BASE_PROBABILITY: f64 = 0.30;
pub const MAX_PROBABILITY: f64 = 0.95;

const DELIVERY_PEAK_BUMP: f64 = 0.25;
const DELIVERY_RAIN_BUMP: f64 = 0.15;
const TRANSIT_RUSH_BUMP: f64 = 0.35;
const TRANSIT_MAINTENANCE_BUMP: f64 = 0.40;
const FLIGHT_SEVERE_WEATHER_BUMP: f64 = 0.45;
const FLIGHT_RAIN_BUMP: f64 = 0.20;

/// Perturbation range added to every prediction: U(-0.10, 0.15)
const PERTURBATION_LOW: f64 = -0.10;
const PERTURBATION_HIGH: f64 = 0.15;

const CONFIDENCE_FLOOR: f64 = 0.75;
const CONFIDENCE_SPREAD: f64 = 0.20;

const DEFAULT_WEATHER: &str = "clear";

/// Disruption Scorer
///
/// Heuristic, not a model: a base probability of 0.30 gets fixed bumps for
/// time of day and weather per category, then a random perturbation.
///
///   delivery: +0.25 at lunch/dinner peaks (11-14h, 18-21h), +0.15 in rain
///   transit:  +0.35 at rush hour (7-9h, 17-19h), +0.40 on a maintenance roll
///   flight:   +0.45 for storm/snow/fog, +0.20 for rain
///
///   probability = clamp(base + U(-0.10, 0.15), 0, 0.95)
pub struct DisruptionScorer {
    maintenance_probability: f64,
}

impl DisruptionScorer {
    pub fn new(config: &ScorerConfig) -> Self {
        Self {
            maintenance_probability: config.maintenance_probability.clamp(0.0, 1.0),
        }
    }

    /// Score one input at the given local hour. Never fails.
    pub fn score<R: Rng + ?Sized>(&self, input: &ScoreInput, hour: u32, rng: &mut R) -> ScoreResult {
        let weather = input.weather();

        let maintenance = input.category == DisruptionCategory::Transit
            && rng.gen::<f64>() < self.maintenance_probability;

        let base = adjusted_base(input.category, hour, weather, maintenance);
        let perturbation = rng.gen_range(PERTURBATION_LOW..PERTURBATION_HIGH);
        let probability = finalize_probability(base, perturbation);

        let confidence = CONFIDENCE_FLOOR + rng.gen_range(0.0..CONFIDENCE_SPREAD);
        let estimated_delay_minutes = rng.gen_range(10..=45);
        let historical_pattern = HistoricalPattern::ALL
            .choose(rng)
            .copied()
            .unwrap_or(HistoricalPattern::Normal);

        ScoreResult {
            probability,
            confidence,
            estimated_delay_minutes,
            factors: Factors {
                time_of_day: hour,
                weather_impact: weather.unwrap_or(DEFAULT_WEATHER).to_string(),
                historical_pattern,
            },
        }
    }
}

/// Deterministic part of the score: base plus category bumps, before any perturbation
pub fn adjusted_base(
    category: DisruptionCategory,
    hour: u32,
    weather: Option<&str>,
    maintenance: bool,
) -> f64 {
    let mut base = BASE_PROBABILITY;

    match category {
        DisruptionCategory::Delivery => {
            if is_delivery_peak(hour) {
                base += DELIVERY_PEAK_BUMP;
            }
            if weather == Some("rain") {
                base += DELIVERY_RAIN_BUMP;
            }
        }
        DisruptionCategory::Transit => {
            if is_transit_rush(hour) {
                base += TRANSIT_RUSH_BUMP;
            }
            if maintenance {
                base += TRANSIT_MAINTENANCE_BUMP;
            }
        }
        DisruptionCategory::Flight => match weather.unwrap_or(DEFAULT_WEATHER) {
            "storm" | "snow" | "fog" => base += FLIGHT_SEVERE_WEATHER_BUMP,
            "rain" => base += FLIGHT_RAIN_BUMP,
            _ => {}
        },
        DisruptionCategory::Other => {}
    }

    base
}

pub fn finalize_probability(base: f64, perturbation: f64) -> f64 {
    (base + perturbation).clamp(0.0, MAX_PROBABILITY)
}

fn is_delivery_peak(hour: u32) -> bool {
    (11..=14).contains(&hour) || (18..=21).contains(&hour)
}

fn is_transit_rush(hour: u32) -> bool {
    (7..=9).contains(&hour) || (17..=19).contains(&hour)
}
