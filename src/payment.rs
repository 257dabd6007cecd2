use std::num::IntErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::config::PaymentConfig;

/// Why an x402 header was refused. Callers only ever see a 402;
/// the reason goes to the log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("x402 header missing")]
    Missing,
    #[error("expected 3 space-separated tokens, got {0}")]
    Malformed(usize),
    #[error("amount '{0}' is not a non-negative integer")]
    InvalidAmount(String),
    #[error("amount {amount} below rate {rate}")]
    Insufficient { amount: u128, rate: u64 },
    #[error("recipient '{0}' does not match payment address")]
    WrongRecipient(String),
}

/// A header that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    /// `None` when the amount overflows u128 (it still covers the rate)
    pub amount_wei: Option<u128>,
    pub recipient: String,
    pub purpose: String,
}

/// Payment gate for the x402 micropayment header
///
/// Header format: "<amount> <recipient-address> <purpose>"
/// - exactly three tokens separated by single spaces
/// - amount is an integer in wei, at least the configured rate
/// - recipient equals the configured address, ignoring case
///
/// Nothing is settled. This is a shape check, not a payment verifier.
pub struct PaymentGate {
    config: PaymentConfig,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl PaymentGate {
    pub fn new(config: &PaymentConfig) -> Self {
        let mut config = config.clone();
        // header lookups are case-insensitive but HeaderMap keys are lowercase
        config.header_name = config.header_name.to_ascii_lowercase();
        Self {
            config,
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn header_name(&self) -> &str {
        &self.config.header_name
    }

    pub fn rate_wei(&self) -> u64 {
        self.config.rate_wei
    }

    /// Validate a raw header value and count the outcome
    pub fn check(&self, header: Option<&str>) -> Result<PaymentProof, PaymentError> {
        let result = self.validate(header);
        match result {
            Ok(_) => self.accepted.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.rejected.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    pub fn validate(&self, header: Option<&str>) -> Result<PaymentProof, PaymentError> {
        let header = header.filter(|h| !h.is_empty()).ok_or(PaymentError::Missing)?;

        let parts: Vec<&str> = header.split(' ').collect();
        let [amount, recipient, purpose] = parts[..] else {
            return Err(PaymentError::Malformed(parts.len()));
        };

        let amount_wei = match amount.parse::<u128>() {
            Ok(v) => {
                if v < self.config.rate_wei as u128 {
                    return Err(PaymentError::Insufficient {
                        amount: v,
                        rate: self.config.rate_wei,
                    });
                }
                Some(v)
            }
            // More wei than u128 can hold is still more than the rate
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => None,
            Err(_) => return Err(PaymentError::InvalidAmount(amount.to_string())),
        };

        if !recipient.eq_ignore_ascii_case(&self.config.address) {
            return Err(PaymentError::WrongRecipient(recipient.to_string()));
        }

        Ok(PaymentProof {
            amount_wei,
            recipient: recipient.to_string(),
            purpose: purpose.to_string(),
        })
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
