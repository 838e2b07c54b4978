//! Wallet and per-currency balances
//!
//! A wallet belongs to exactly one account and a currency code appears at
//! most once per wallet. Balances are exact decimals; mutation happens only
//! inside the wallet service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::currency::CurrencyType;

pub type WalletId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub currency_code: CurrencyType,
    pub currency_symbol: String,
    pub balance: Decimal,
}

impl CurrencyBalance {
    pub fn new(currency: CurrencyType, balance: Decimal) -> Self {
        Self {
            currency_code: currency,
            currency_symbol: currency.symbol().to_string(),
            balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: AccountId,
    pub balances: Vec<CurrencyBalance>,
    /// Salted hash of the transfer PIN, never the PIN itself.
    pub pin_hash: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Wallet {
    pub fn balance_of(&self, currency: CurrencyType) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|b| b.currency_code == currency)
            .map(|b| b.balance)
    }

    pub fn balance_entry_mut(&mut self, currency: CurrencyType) -> Option<&mut CurrencyBalance> {
        self.balances
            .iter_mut()
            .find(|b| b.currency_code == currency)
    }
}
