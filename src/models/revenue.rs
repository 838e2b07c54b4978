//! Platform revenue aggregate
//!
//! A single shared ledger of per-currency fee balances plus an append-only
//! log entry per accrual event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::CurrencyType;
use super::history::TransactionType;
use super::wallet::CurrencyBalance;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Revenue {
    pub balances: Vec<CurrencyBalance>,
}

impl Revenue {
    pub fn balance_of(&self, currency: CurrencyType) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|b| b.currency_code == currency)
            .map(|b| b.balance)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEntry {
    pub id: String,
    pub currency: CurrencyType,
    pub amount: Decimal,
    pub entry_type: TransactionType,
    pub timestamp: DateTime<Utc>,
}
