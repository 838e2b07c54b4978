//! Platform revenue accrual
//!
//! Singleton aggregate: one set of per-currency fee balances plus an
//! append-only log entry per accrual event. Appends need no mutual exclusion
//! beyond the ledger's own write lock.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::clients::{ClientError, RevenueClient};
use crate::models::{CurrencyBalance, CurrencyType, Revenue, RevenueEntry, TransactionType};

#[derive(Default)]
pub struct RevenueService {
    ledger: RwLock<Revenue>,
    log: RwLock<Vec<RevenueEntry>>,
}

impl RevenueService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn balance_of(&self, currency: CurrencyType) -> Option<Decimal> {
        self.ledger.read().await.balance_of(currency)
    }

    pub async fn entries(&self) -> Vec<RevenueEntry> {
        self.log.read().await.clone()
    }
}

#[async_trait]
impl RevenueClient for RevenueService {
    async fn accrue(&self, amount: Decimal, currency: CurrencyType) -> Result<(), ClientError> {
        {
            let mut ledger = self.ledger.write().await;
            match ledger
                .balances
                .iter_mut()
                .find(|b| b.currency_code == currency)
            {
                Some(balance) => balance.balance += amount,
                None => ledger.balances.push(CurrencyBalance::new(currency, amount)),
            }
        }
        self.log.write().await.push(RevenueEntry {
            id: Uuid::new_v4().to_string(),
            currency,
            amount,
            entry_type: TransactionType::Credited,
            timestamp: Utc::now(),
        });
        debug!(%currency, %amount, "Revenue accrued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[tokio::test]
    async fn accruals_sum_per_currency_and_log_each_event() {
        let svc = RevenueService::new();
        svc.accrue(dec!(0.25), CurrencyType::USD).await.unwrap();
        svc.accrue(dec!(0.50), CurrencyType::USD).await.unwrap();
        svc.accrue(dec!(1.00), CurrencyType::NGN).await.unwrap();

        assert_eq!(svc.balance_of(CurrencyType::USD).await, Some(dec!(0.75)));
        assert_eq!(svc.balance_of(CurrencyType::NGN).await, Some(dec!(1.00)));
        assert_eq!(svc.balance_of(CurrencyType::EUR).await, None);

        let entries = svc.entries().await;
        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .all(|e| e.entry_type == TransactionType::Credited));
    }
}
