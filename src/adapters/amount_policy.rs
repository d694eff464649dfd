//! Amount-threshold moderation policy.
//!
//! Donations whose notified amount exceeds the configured limit are routed
//! through human review before confirmation. Richer policy (word lists,
//! donor history) plugs in behind the same trait.

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::domain::Donation;
use crate::ports::{ModerationPolicy, TransactionData};

pub struct AmountThresholdPolicy {
    limit: BigDecimal,
}

impl AmountThresholdPolicy {
    pub fn new(limit: BigDecimal) -> Self {
        Self { limit }
    }
}

impl ModerationPolicy for AmountThresholdPolicy {
    fn needs_moderation(&self, _donation: &Donation, data: &TransactionData) -> bool {
        let Some(raw) = data.get("amount") else {
            return false;
        };

        let amount = match raw {
            serde_json::Value::String(s) => BigDecimal::from_str(s).ok(),
            serde_json::Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
            _ => None,
        };

        match amount {
            Some(amount) => amount > self.limit,
            None => false,
        }
    }
}
