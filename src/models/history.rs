//! Immutable ledger history records
//!
//! One record per leg of a transfer: negative amount for the debited party,
//! positive for the credited party. Records are never mutated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::currency::CurrencyType;
use super::wallet::WalletId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Transfer,
    Credited,
    Debited,
    Send,
    Receive,
    ServiceAction,
    Swap,
    Maintenance,
}

/// Record as submitted by a collaborator; the history service assigns the
/// id and timestamp on append.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub user_id: AccountId,
    pub counterpart: String,
    pub amount: Decimal,
    pub currency: CurrencyType,
    pub record_type: TransactionType,
    pub description: String,
    pub wallet_id: WalletId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub user_id: AccountId,
    /// Username of the other party of this leg.
    pub counterpart: String,
    /// Signed: negative for a debit, positive for a credit.
    pub amount: Decimal,
    pub currency: CurrencyType,
    pub record_type: TransactionType,
    pub description: String,
    pub wallet_id: WalletId,
    pub timestamp: DateTime<Utc>,
}
