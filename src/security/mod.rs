//! Fraud alert and security pause checkpoints

use crate::models::{
    ContactCard, FlaggedTransaction, FraudAlert, FraudDecision, PauseDecision, RiskLevel,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCenter {
    pub fraud_alert: FraudAlert,
    pub pause_subject: FlaggedTransaction,
    pub pause_contact: ContactCard,
    pub last_fraud_decision: Option<FraudDecision>,
    pub last_pause_decision: Option<PauseDecision>,
    /// Round-the-clock monitoring banner on the alerts screen
    pub monitoring_active: bool,
}

impl SecurityCenter {
    pub fn seeded() -> Self {
        Self {
            fraud_alert: FraudAlert {
                merchant: "Compra Internacional - Amazon.com".to_string(),
                amount: 154_300,
                occurred_at: "Hoy, 03:15 AM".to_string(),
            },
            pause_subject: FlaggedTransaction {
                kind: "Transferencia Internacional".to_string(),
                amount: 154_300,
                recipient: "Amazon.com".to_string(),
                risk_level: RiskLevel::High,
            },
            pause_contact: ContactCard {
                name: "Javier Astudillo".to_string(),
                relationship: "Hijo".to_string(),
                phone: "+56 9 8765 4321".to_string(),
            },
            last_fraud_decision: None,
            last_pause_decision: None,
            monitoring_active: true,
        }
    }

    pub fn record_fraud_decision(&mut self, decision: FraudDecision) {
        info!(
            ?decision,
            merchant = %self.fraud_alert.merchant,
            amount = self.fraud_alert.amount,
            "Fraud alert resolved"
        );
        self.last_fraud_decision = Some(decision);
    }

    pub fn record_pause_decision(&mut self, decision: PauseDecision) {
        info!(
            ?decision,
            recipient = %self.pause_subject.recipient,
            amount = self.pause_subject.amount,
            "Security pause resolved"
        );
        self.last_pause_decision = Some(decision);
    }
}

impl Default for SecurityCenter {
    fn default() -> Self {
        Self::seeded()
    }
}

impl PauseDecision {
    /// Whether resolving this decision leaves the pause screen right away
    pub fn returns_immediately(&self) -> bool {
        !matches!(self, PauseDecision::CallTrusted)
    }
}
