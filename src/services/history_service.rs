//! Append-only ledger history
//!
//! Records are write-once; the only queries are per-user scans, which is all
//! the risk gate's trailing windows and the session snapshot need.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clients::{ClientError, HistoryClient};
use crate::models::{AccountId, HistoryRecord, NewHistoryRecord};

#[derive(Default)]
pub struct HistoryService {
    records: RwLock<Vec<HistoryRecord>>,
}

impl HistoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records_for(&self, user_id: AccountId) -> Vec<HistoryRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryClient for HistoryService {
    async fn append(&self, record: NewHistoryRecord) -> Result<HistoryRecord, ClientError> {
        let stored = HistoryRecord {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id,
            counterpart: record.counterpart,
            amount: record.amount,
            currency: record.currency,
            record_type: record.record_type,
            description: record.description,
            wallet_id: record.wallet_id,
            timestamp: Utc::now(),
        };
        self.records.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn records_since(
        &self,
        user_id: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>, ClientError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp > since)
            .cloned()
            .collect())
    }

    async fn count_for(&self, user_id: AccountId) -> Result<u64, ClientError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrencyType, TransactionType};
    use chrono::Duration;
    use rust_decimal::dec;

    fn record(user_id: AccountId, amount: rust_decimal::Decimal) -> NewHistoryRecord {
        NewHistoryRecord {
            user_id,
            counterpart: "bob".into(),
            amount,
            currency: CurrencyType::USD,
            record_type: TransactionType::Debited,
            description: "test".into(),
            wallet_id: 1,
        }
    }

    #[tokio::test]
    async fn trailing_window_only_sees_recent_records() {
        let svc = HistoryService::new();
        svc.append(record(1, dec!(-5))).await.unwrap();
        svc.append(record(2, dec!(-7))).await.unwrap();

        let recent = svc
            .records_since(1, Utc::now() - Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].amount, dec!(-5));

        let none = svc
            .records_since(1, Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn count_is_per_user() {
        let svc = HistoryService::new();
        svc.append(record(1, dec!(-1))).await.unwrap();
        svc.append(record(1, dec!(-2))).await.unwrap();
        svc.append(record(2, dec!(-3))).await.unwrap();
        assert_eq!(svc.count_for(1).await.unwrap(), 2);
    }
}
