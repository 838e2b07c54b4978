//! Risk gate: ordered fraud/compliance predicate chain
//!
//! Rules are evaluated in a fixed order and short-circuit on the first
//! match; the matching rule's reason is what the caller sees. A denial is
//! terminal for the saga and happens before any balance mutation.
//!
//! The deposit-then-withdraw rule also pushes a status update to the
//! identity collaborator without awaiting it. That update is not part of
//! the saga's atomicity unit and may race with the decision being returned.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use tracing::warn;

use crate::clients::{ClientError, HistoryClient, UserClient};
use crate::config::Settings;
use crate::models::{Account, BanAction, TransactionType};
use crate::utils::DenialReason;

lazy_static! {
    /// Fallback region set used when settings carry an empty list.
    static ref DEFAULT_HIGH_RISK_REGIONS: HashSet<String> =
        ["KP", "IR", "SY", "CU", "SD"].iter().map(|s| s.to_string()).collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskDecision {
    Allow,
    Deny(DenialReason),
}

pub struct RiskGate {
    settings: Arc<Settings>,
    users: Arc<dyn UserClient>,
    history: Arc<dyn HistoryClient>,
}

impl RiskGate {
    pub fn new(
        settings: Arc<Settings>,
        users: Arc<dyn UserClient>,
        history: Arc<dyn HistoryClient>,
    ) -> Self {
        Self {
            settings,
            users,
            history,
        }
    }

    pub async fn evaluate(
        &self,
        account: &Account,
        region: &str,
        amount: Decimal,
    ) -> Result<RiskDecision, ClientError> {
        if account.locked {
            return Ok(RiskDecision::Deny(DenialReason::AccountLocked));
        }
        if account.blocked {
            return Ok(RiskDecision::Deny(DenialReason::AccountBlocked));
        }

        let now = Utc::now();
        let window_start = now - Duration::seconds(self.settings.risk_window_secs);
        let recent = self.history.records_since(account.id, window_start).await?;

        let volume: Decimal = recent.iter().map(|r| r.amount.abs()).sum();
        if recent.len() >= self.settings.max_transfers_per_window
            || volume > self.settings.high_volume_threshold
        {
            return Ok(RiskDecision::Deny(DenialReason::HighVolume));
        }

        if self.is_high_risk_region(region) {
            return Ok(RiskDecision::Deny(DenialReason::HighRiskRegion));
        }

        if account.age_hours(now) < self.settings.new_account_age_hours
            && amount > self.settings.new_account_amount_limit
        {
            return Ok(RiskDecision::Deny(DenialReason::NewAccountHighRisk));
        }

        // Needs a few prior debits to say anything about "usual" behavior.
        let debits: Vec<Decimal> = recent
            .iter()
            .filter(|r| r.record_type == TransactionType::Debited)
            .map(|r| r.amount.abs())
            .collect();
        if debits.len() >= 3 {
            let average: Decimal = debits.iter().sum::<Decimal>() / Decimal::from(debits.len());
            if amount > average * self.settings.inconsistent_multiplier {
                return Ok(RiskDecision::Deny(DenialReason::InconsistentBehavior));
            }
        }

        if account.flagged_fraudulent {
            return Ok(RiskDecision::Deny(DenialReason::FlaggedFraudulent));
        }

        let minute_ago = now - Duration::minutes(1);
        let deposit_just_landed = recent
            .iter()
            .any(|r| r.record_type == TransactionType::Deposit && r.timestamp > minute_ago);
        if deposit_just_landed {
            // Status update is deliberately not awaited; the denial below
            // does not depend on it landing.
            let users = Arc::clone(&self.users);
            let account_id = account.id;
            tokio::spawn(async move {
                if let Err(e) = users
                    .update_account_status(account_id, BanAction::SuspiciousActivity)
                    .await
                {
                    warn!(account_id, "Failed to update account status: {}", e);
                }
            });
            return Ok(RiskDecision::Deny(DenialReason::DepositThenWithdraw));
        }

        Ok(RiskDecision::Allow)
    }

    fn is_high_risk_region(&self, region: &str) -> bool {
        let regions = if self.settings.high_risk_regions.is_empty() {
            &*DEFAULT_HIGH_RISK_REGIONS
        } else {
            &self.settings.high_risk_regions
        };
        regions.contains(&region.trim().to_uppercase())
    }
}
