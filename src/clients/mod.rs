//! Collaborator interfaces consumed by the saga
//!
//! The coordinator only ever talks to these traits; the in-process services
//! implement them, and tests substitute failing decorators to exercise the
//! partial-failure paths. Wallet mutations return the typed `WalletError`
//! so the saga can tell insufficient funds from a dead endpoint.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    Account, AccountId, BanAction, CurrencyType, HistoryRecord, NewHistoryRecord, Wallet,
};
use crate::utils::WalletError;

/// Transport-level failure of a collaborator call.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ClientError(pub String);

#[async_trait]
pub trait UserClient: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, ClientError>;
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, ClientError>;
    /// Moderation hook; fired-and-forgotten by the risk gate.
    async fn update_account_status(
        &self,
        id: AccountId,
        action: BanAction,
    ) -> Result<(), ClientError>;
    async fn validate_token(&self, token: &str) -> bool;
    async fn identity_from_token(&self, token: &str) -> Option<AccountId>;
}

#[async_trait]
pub trait WalletClient: Send + Sync {
    async fn get_wallet(&self, user_id: AccountId) -> Result<Option<Wallet>, ClientError>;
    /// Idempotent: returns the existing wallet when one is already there.
    async fn provision_wallet(&self, user_id: AccountId) -> Result<Wallet, ClientError>;
    /// One atomic local mutation: `balance -= amount`. Must be called with
    /// the pair lock held.
    async fn debit(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError>;
    /// One atomic local mutation: `balance += amount`, provisioning the
    /// wallet and the currency entry as needed. Pair lock required.
    async fn credit(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError>;
    async fn balance_of(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
    ) -> Result<Decimal, WalletError>;
}

#[async_trait]
pub trait HistoryClient: Send + Sync {
    async fn append(&self, record: NewHistoryRecord) -> Result<HistoryRecord, ClientError>;
    async fn records_since(
        &self,
        user_id: AccountId,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<HistoryRecord>, ClientError>;
    async fn count_for(&self, user_id: AccountId) -> Result<u64, ClientError>;
}

#[async_trait]
pub trait RevenueClient: Send + Sync {
    async fn accrue(&self, amount: Decimal, currency: CurrencyType) -> Result<(), ClientError>;
}

/// Debit-leg alert to the sender.
#[derive(Debug, Clone)]
pub struct DebitAlert {
    pub email: String,
    pub username: String,
    pub counterpart_full_name: String,
    pub amount: Decimal,
    pub currency: CurrencyType,
    pub fee: Decimal,
    pub new_balance: Decimal,
}

/// Credit-leg alert to the recipient.
#[derive(Debug, Clone)]
pub struct CreditAlert {
    pub email: String,
    pub username: String,
    pub sender_username: String,
    pub amount: Decimal,
    pub currency: CurrencyType,
    pub new_balance: Decimal,
}

#[async_trait]
pub trait NotificationClient: Send + Sync {
    async fn send_debit_alert(&self, alert: DebitAlert) -> Result<(), ClientError>;
    async fn send_credit_alert(&self, alert: CreditAlert) -> Result<(), ClientError>;
}
