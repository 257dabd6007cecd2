use std::sync::Arc;

use chrono::Timelike;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::alerts::{self, DisruptionAlert};
use crate::clock::{isoformat, Clock};
use crate::config::Config;
use crate::markets::{DraftError, MarketDesk, MarketDraft, MarketRequest};
use crate::metrics::MetricsCounters;
use crate::payment::{PaymentError, PaymentGate};
use crate::risk::scorer::DisruptionScorer;
use crate::risk::types::{ScoreInput, ScoreResult};

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub prediction: ScoreResult,
    pub cost: String,
    pub timestamp: String,
    pub model_version: String,
}

/// Reply to `POST /markets`: the scored crisis plus the market, if one was listed
#[derive(Debug, Clone, Serialize)]
pub struct CrisisResponse {
    pub success: bool,
    pub crisis_data: ScoreResult,
    pub market_id: Option<String>,
    pub market: Option<MarketDraft>,
    pub message: String,
}

/// Core risk engine - everything a request handler needs, built once at startup
pub struct RiskEngine {
    pub config: Arc<Config>,
    pub scorer: DisruptionScorer,
    pub payment: PaymentGate,
    pub desk: MarketDesk,
    pub metrics: MetricsCounters,
    clock: Arc<dyn Clock>,
}

impl RiskEngine {
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        let scorer = DisruptionScorer::new(&config.scorer);
        let payment = PaymentGate::new(&config.payment);
        info!(
            "💳 x402 gate: {} wei to {} via '{}' header",
            config.payment.rate_wei, config.payment.address, config.payment.header_name
        );

        Self {
            config,
            scorer,
            payment,
            desk: MarketDesk::new(),
            metrics: MetricsCounters::new(),
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Paid prediction: check the x402 header, then score
    pub fn predict<R: Rng + ?Sized>(
        &self,
        payment_header: Option<&str>,
        input: &ScoreInput,
        rng: &mut R,
    ) -> Result<PredictionResponse, PaymentError> {
        let proof = self.payment.check(payment_header).map_err(|e| {
            debug!("Payment rejected: {}", e);
            e
        })?;

        let now = self.clock.now();
        let prediction = self.scorer.score(input, now.hour(), rng);
        self.metrics.inc_prediction(input.category);
        debug!(
            "Prediction {} p={:.3} (raw tier {}) paid {:?} wei to {} for '{}'",
            input.category.name(),
            prediction.probability,
            prediction.risk_tier().name(),
            proof.amount_wei,
            proof.recipient,
            proof.purpose
        );

        Ok(PredictionResponse {
            prediction,
            cost: format!("{} wei", self.payment.rate_wei()),
            timestamp: isoformat(now),
            model_version: self.config.scorer.model_version.clone(),
        })
    }

    /// Score a crisis and list a market for it when the probability clears
    /// the category's listing threshold. Payment is checked by the caller.
    pub fn crisis_market<R: Rng + ?Sized>(
        &self,
        request: &MarketRequest,
        rng: &mut R,
    ) -> Result<CrisisResponse, DraftError> {
        let mut input = ScoreInput::new(request.category);
        if let Some(weather) = &request.weather {
            input = input.with_weather(weather);
        }

        let now = self.clock.now();
        let mut crisis_data = self.scorer.score(&input, now.hour(), rng);
        if let Some(p) = request.probability {
            crisis_data.probability = p.clamp(0.0, 1.0);
        }
        let delay = request
            .predicted_delay
            .unwrap_or(crisis_data.estimated_delay_minutes);

        let market = self.desk.draft(
            request,
            crisis_data.probability,
            delay,
            now.and_utc().timestamp(),
        )?;

        let message = match &market {
            Some(draft) => format!("Crisis market {} created", draft.market_id),
            None => format!(
                "Crisis data recorded; {} disruption at p={:.3} did not warrant a market",
                request.category.name(),
                crisis_data.probability
            ),
        };

        Ok(CrisisResponse {
            success: true,
            crisis_data,
            market_id: market.as_ref().map(|m| m.market_id.clone()),
            market,
            message,
        })
    }

    /// Alert feed, capped at `limit` (or the configured default)
    pub fn disruption_alerts<R: Rng + ?Sized>(&self, limit: Option<usize>, rng: &mut R) -> Vec<DisruptionAlert> {
        let limit = limit.unwrap_or(self.config.alerts.default_limit);
        let alerts = alerts::build_alerts(
            &self.scorer,
            self.clock.hour(),
            self.clock.unix_timestamp(),
            limit,
            rng,
        );
        for alert in &alerts {
            self.metrics.inc_alert(alert.risk_level);
        }
        alerts
    }

    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "payments_accepted": self.payment.accepted_count(),
            "payments_rejected": self.payment.rejected_count(),
            "markets_drafted": self.desk.market_count(),
            "model_version": self.config.scorer.model_version,
        })
    }

    pub fn health(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "healthy",
            "timestamp": isoformat(self.clock.now()),
            "service": "snapstake API",
            "market_count": self.desk.market_count(),
            "features": {
                "crisis_detection": true,
                "market_creation": true,
                "payment_middleware": true,
            },
            "config": {
                "payment_address": self.config.payment.address,
                "rate_wei": self.config.payment.rate_wei,
                "port": self.config.listen.port,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::clock::{Clock, FixedClock};
    use crate::risk::types::DisruptionCategory;

    const HEADER: &str = "10000000000000000 0x742d35Cc6634C0532925a3b8d49D1dFA1aCdE9fE test";

    fn engine(hour: u32) -> RiskEngine {
        RiskEngine::new(Arc::new(Config::default()), Arc::new(FixedClock::at_hour(hour)))
    }

    #[test]
    fn test_predict_requires_payment() {
        let engine = engine(12);
        let input = ScoreInput::new(DisruptionCategory::Delivery);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(engine.predict(None, &input, &mut rng).unwrap_err(), PaymentError::Missing);
        assert_eq!(engine.metrics.predictions(DisruptionCategory::Delivery), 0);
        assert_eq!(engine.payment.rejected_count(), 1);
    }

    #[test]
    fn test_predict_response() {
        let engine = engine(12);
        let input = ScoreInput::new(DisruptionCategory::Delivery).with_weather("rain");
        let mut rng = StdRng::seed_from_u64(1);

        let response = engine.predict(Some(HEADER), &input, &mut rng).unwrap();
        assert_eq!(response.cost, "10000000000000000 wei");
        assert_eq!(response.timestamp, "2024-06-01T12:00:00.000000");
        assert_eq!(response.model_version, "1.0.0");
        assert_eq!(response.prediction.factors.time_of_day, 12);
        assert!(response.prediction.probability >= 0.60 - 1e-9);
        assert!(response.prediction.probability <= 0.85 + 1e-9);
        assert_eq!(engine.metrics.predictions(DisruptionCategory::Delivery), 1);
    }

    #[test]
    fn test_alerts_default_limit_and_counters() {
        let engine = engine(18);
        let mut rng = StdRng::seed_from_u64(9);
        let alerts = engine.disruption_alerts(None, &mut rng);
        assert_eq!(alerts.len(), 3);

        let counted: u64 = crate::risk::types::RiskTier::ALL
            .iter()
            .map(|t| engine.metrics.alerts(*t))
            .sum();
        assert_eq!(counted, 3);

        assert_eq!(engine.disruption_alerts(Some(2), &mut rng).len(), 2);
    }

    fn transit_request(probability: Option<f64>) -> MarketRequest {
        MarketRequest {
            category: DisruptionCategory::Transit,
            predicted_delay: None,
            probability,
            weather: None,
            carrier: None,
            tracking_number: None,
            system: Some("mta".to_string()),
            line: Some("L".to_string()),
        }
    }

    #[test]
    fn test_crisis_market_listed_above_threshold() {
        let engine = engine(8);
        let mut rng = StdRng::seed_from_u64(3);

        let response = engine.crisis_market(&transit_request(Some(0.7)), &mut rng).unwrap();
        assert!(response.success);
        assert_eq!(response.market_id.as_deref(), Some("1"));
        assert_eq!(response.crisis_data.probability, 0.7);

        let market = response.market.unwrap();
        let delay = response.crisis_data.estimated_delay_minutes;
        assert_eq!(market.description, format!("MTA L delayed >{}min", delay));
        assert_eq!(market.resolution_time, FixedClock::at_hour(8).unix_timestamp() + 4 * 3600);
    }

    #[test]
    fn test_crisis_market_below_threshold() {
        let engine = engine(12);
        let mut rng = StdRng::seed_from_u64(3);

        let response = engine.crisis_market(&transit_request(Some(0.35)), &mut rng).unwrap();
        assert!(response.success);
        assert_eq!(response.market_id, None);
        assert!(response.market.is_none());
        assert_eq!(engine.desk.market_count(), 0);
    }

    #[test]
    fn test_crisis_market_scores_when_probability_absent() {
        // Rainy lunch-peak delivery scores at least 0.60, well above 0.3
        let engine = engine(12);
        let mut rng = StdRng::seed_from_u64(5);

        let request = MarketRequest {
            category: DisruptionCategory::Delivery,
            predicted_delay: Some(30),
            probability: None,
            weather: Some("rain".to_string()),
            carrier: Some("ups".to_string()),
            tracking_number: Some("1Z999".to_string()),
            system: None,
            line: None,
        };
        let response = engine.crisis_market(&request, &mut rng).unwrap();
        assert!(response.crisis_data.probability >= 0.60 - 1e-9);
        assert_eq!(response.crisis_data.factors.weather_impact, "rain");
        assert_eq!(response.market.unwrap().description, "UPS package 1Z999 delayed >30min");
    }

    #[test]
    fn test_health() {
        let engine = engine(12);
        let health = engine.health();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["timestamp"], "2024-06-01T12:00:00.000000");
        assert_eq!(health["market_count"], 0);
        assert_eq!(health["features"]["payment_middleware"], true);
        assert_eq!(health["config"]["port"], 8000);
    }
}
