use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::clock::isoformat;
use crate::risk::round_dp;
use crate::risk::types::DisruptionCategory;

/// A mock market row for /markets/active
#[derive(Debug, Clone, Serialize)]
pub struct ActiveMarket {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: DisruptionCategory,
    pub created_at: String,
    pub resolution_time: String,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: f64,
    pub participants: u32,
}

/// Five markets opened 5-25 minutes ago and resolving 5-25 minutes from now
pub fn active_markets<R: Rng + ?Sized>(now: NaiveDateTime, rng: &mut R) -> Vec<ActiveMarket> {
    (1..=5)
        .map(|i| ActiveMarket {
            id: format!("market_{}", i),
            description: format!("Delivery delay in zone {}", i),
            category: DisruptionCategory::ALL
                .choose(rng)
                .copied()
                .unwrap_or(DisruptionCategory::Delivery),
            created_at: isoformat(now - Duration::minutes(rng.gen_range(5..=25))),
            resolution_time: isoformat(now + Duration::minutes(rng.gen_range(5..=25))),
            yes_price: round_dp(rng.gen_range(0.3..0.7), 3),
            no_price: round_dp(rng.gen_range(0.3..0.7), 3),
            volume: round_dp(rng.gen_range(100.0..1000.0), 2),
            participants: rng.gen_range(5..=50),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeParams {
    pub prediction: bool,
    pub amount: f64,
    pub user_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeReceipt {
    pub trade_id: String,
    pub market_id: String,
    pub prediction: bool,
    pub amount: f64,
    pub user_address: String,
    pub executed_at: String,
    pub estimated_payout: f64,
    pub status: &'static str,
}

/// Simulated trade. Nothing is matched or settled.
pub fn execute_trade<R: Rng + ?Sized>(
    market_id: &str,
    params: TradeParams,
    now: NaiveDateTime,
    unix_now: i64,
    rng: &mut R,
) -> TradeReceipt {
    let trade_id = format!("trade_{}_{}", unix_now, rng.gen_range(1000..=9999));
    let estimated_payout = round_dp(params.amount * rng.gen_range(1.5..3.0), 2);

    TradeReceipt {
        trade_id,
        market_id: market_id.to_string(),
        prediction: params.prediction,
        amount: params.amount,
        user_address: params.user_address,
        executed_at: isoformat(now),
        estimated_payout,
        status: "executed",
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("'{0}' is required for {1} markets")]
    MissingField(&'static str, &'static str),
    #[error("no market template for disruption type '{0}'")]
    UnsupportedCategory(&'static str),
}

/// Crisis data a market is drafted from
#[derive(Debug, Clone, Deserialize)]
pub struct MarketRequest {
    #[serde(rename = "type")]
    pub category: DisruptionCategory,
    /// Minutes. Defaults to the scorer's estimate.
    #[serde(default)]
    pub predicted_delay: Option<u32>,
    /// Caller-supplied disruption probability. Scored when absent.
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketDraft {
    pub market_id: String,
    pub description: String,
    /// Unix seconds
    pub resolution_time: i64,
    pub initial_liquidity: u32,
}

/// Probability a disruption must exceed before the desk lists a market.
/// Flights have no listing threshold: they are reported, never listed.
pub fn listing_threshold(category: DisruptionCategory) -> Option<f64> {
    match category {
        DisruptionCategory::Delivery => Some(0.3),
        DisruptionCategory::Transit => Some(0.4),
        DisruptionCategory::Flight | DisruptionCategory::Other => None,
    }
}

/// Market Desk - drafts crisis markets from a predicted disruption
///
/// Each listed category has its own resolution window and seed liquidity:
///   delivery 8h / 1000 (p > 0.3), transit 4h / 800 (p > 0.4)
/// Ids are sequential and live only as long as the process.
pub struct MarketDesk {
    market_count: AtomicU64,
}

impl MarketDesk {
    pub fn new() -> Self {
        Self {
            market_count: AtomicU64::new(0),
        }
    }

    /// Draft a market when `probability` clears the category threshold.
    /// Required fields are checked first, so a weak prediction with a bad
    /// request is still an error.
    pub fn draft(
        &self,
        request: &MarketRequest,
        probability: f64,
        predicted_delay: u32,
        unix_now: i64,
    ) -> Result<Option<MarketDraft>, DraftError> {
        let (description, window_hours, initial_liquidity) = match request.category {
            DisruptionCategory::Delivery => {
                let carrier = required(&request.carrier, "carrier", "delivery")?;
                let tracking = required(&request.tracking_number, "tracking_number", "delivery")?;
                (
                    format!(
                        "{} package {} delayed >{}min",
                        carrier.to_uppercase(),
                        tracking,
                        predicted_delay
                    ),
                    8,
                    1000,
                )
            }
            DisruptionCategory::Transit => {
                let system = required(&request.system, "system", "transit")?;
                let line = required(&request.line, "line", "transit")?;
                (
                    format!(
                        "{} {} delayed >{}min",
                        system.to_uppercase(),
                        line,
                        predicted_delay
                    ),
                    4,
                    800,
                )
            }
            DisruptionCategory::Flight => return Ok(None),
            DisruptionCategory::Other => {
                return Err(DraftError::UnsupportedCategory(request.category.name()));
            }
        };

        match listing_threshold(request.category) {
            Some(threshold) if probability > threshold => {}
            _ => {
                debug!(
                    "No market for {} at p={:.3}: below listing threshold",
                    request.category.name(),
                    probability
                );
                return Ok(None);
            }
        }

        let market_id = (self.market_count.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        info!("Drafted market {}: {}", market_id, description);

        Ok(Some(MarketDraft {
            market_id,
            description,
            resolution_time: unix_now + window_hours * 60 * 60,
            initial_liquidity,
        }))
    }

    pub fn market_count(&self) -> u64 {
        self.market_count.load(Ordering::Relaxed)
    }
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
    category: &'static str,
) -> Result<&'a str, DraftError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(DraftError::MissingField(field, category))
}
