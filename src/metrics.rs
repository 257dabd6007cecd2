//! Prometheus-compatible metrics exporter for snapstake
//!
//! Endpoint: GET /metrics (on the API port, default 8000)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::risk::engine::RiskEngine;
use crate::risk::types::{DisruptionCategory, RiskTier};

/// Counters atomically updated from request handling
pub struct MetricsCounters {
    pub predictions_delivery: AtomicU64,
    pub predictions_transit: AtomicU64,
    pub predictions_flight: AtomicU64,
    pub predictions_other: AtomicU64,
    /// Alerts served, by risk tier
    pub alerts_low: AtomicU64,
    pub alerts_medium: AtomicU64,
    pub alerts_high: AtomicU64,
    pub alerts_critical: AtomicU64,
    pub trades_total: AtomicU64,
    pub start_time: Instant,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            predictions_delivery: AtomicU64::new(0),
            predictions_transit: AtomicU64::new(0),
            predictions_flight: AtomicU64::new(0),
            predictions_other: AtomicU64::new(0),
            alerts_low: AtomicU64::new(0),
            alerts_medium: AtomicU64::new(0),
            alerts_high: AtomicU64::new(0),
            alerts_critical: AtomicU64::new(0),
            trades_total: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn inc_prediction(&self, category: DisruptionCategory) {
        self.prediction_counter(category).fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_alert(&self, tier: RiskTier) {
        self.alert_counter(tier).fetch_add(1, Ordering::Relaxed);
    }

    pub fn predictions(&self, category: DisruptionCategory) -> u64 {
        self.prediction_counter(category).load(Ordering::Relaxed)
    }

    pub fn alerts(&self, tier: RiskTier) -> u64 {
        self.alert_counter(tier).load(Ordering::Relaxed)
    }

    fn prediction_counter(&self, category: DisruptionCategory) -> &AtomicU64 {
        match category {
            DisruptionCategory::Delivery => &self.predictions_delivery,
            DisruptionCategory::Transit => &self.predictions_transit,
            DisruptionCategory::Flight => &self.predictions_flight,
            DisruptionCategory::Other => &self.predictions_other,
        }
    }

    fn alert_counter(&self, tier: RiskTier) -> &AtomicU64 {
        match tier {
            RiskTier::Low => &self.alerts_low,
            RiskTier::Medium => &self.alerts_medium,
            RiskTier::High => &self.alerts_high,
            RiskTier::Critical => &self.alerts_critical,
        }
    }
}

/// Generate Prometheus-format metrics text
pub fn render_metrics(engine: &RiskEngine) -> String {
    let mut out = String::with_capacity(4096);
    let c = &engine.metrics;

    // ──────────────────────────────────────────────
    // Server info
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "snapstake_up", "Whether the API server is up.", "gauge");
    writeln!(out, "snapstake_up 1").ok();

    let uptime = c.start_time.elapsed().as_secs_f64();
    write_help_type(&mut out, "snapstake_time_up_seconds_total", "Uptime since server boot in seconds.", "counter");
    writeln!(out, "snapstake_time_up_seconds_total {:.3}", uptime).ok();

    // ──────────────────────────────────────────────
    // Paid predictions by category
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "snapstake_predictions_total", "Total paid predictions served, by disruption category.", "counter");
    for category in DisruptionCategory::ALL {
        writeln!(out, "snapstake_predictions_total{{category=\"{}\"}} {}", category.name(), c.predictions(category)).ok();
    }
    write_counter_if_nonzero(&mut out, "snapstake_predictions_total", "category", "other", c.predictions(DisruptionCategory::Other));

    // ──────────────────────────────────────────────
    // x402 payment gate
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "snapstake_payments_total", "Total x402 headers checked, by outcome.", "counter");
    writeln!(out, "snapstake_payments_total{{outcome=\"accepted\"}} {}", engine.payment.accepted_count()).ok();
    writeln!(out, "snapstake_payments_total{{outcome=\"rejected\"}} {}", engine.payment.rejected_count()).ok();

    // ──────────────────────────────────────────────
    // Alerts by risk level
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "snapstake_alerts_total", "Total disruption alerts served, by risk level.", "counter");
    for tier in RiskTier::ALL {
        writeln!(out, "snapstake_alerts_total{{risk_level=\"{}\"}} {}", tier.name(), c.alerts(tier)).ok();
    }

    // ──────────────────────────────────────────────
    // Markets
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "snapstake_trades_total", "Total simulated trades executed.", "counter");
    writeln!(out, "snapstake_trades_total {}", c.trades_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "snapstake_markets_drafted_total", "Total crisis markets drafted.", "counter");
    writeln!(out, "snapstake_markets_drafted_total {}", engine.desk.market_count()).ok();

    // ──────────────────────────────────────────────
    // Build info
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "snapstake_build_info", "snapstake build information.", "gauge");
    writeln!(
        out,
        "snapstake_build_info{{version=\"{}\",model_version=\"{}\"}} 1",
        env!("CARGO_PKG_VERSION"),
        engine.config.scorer.model_version
    )
    .ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}

fn write_counter_if_nonzero(out: &mut String, name: &str, label: &str, value: &str, count: u64) {
    if count > 0 {
        writeln!(out, "{}{{{}=\"{}\"}} {}", name, label, value, count).ok();
    }
}
