//! Session snapshot cache
//!
//! Fast-read mirror of a user's account and wallet state, built when a
//! connection says hello and consulted by `balance_view`. The contract is
//! invalidate-on-write: the wallet service drops a user's entry on every
//! committed balance mutation, and readers repopulate on miss. The cache is
//! never read-modify-written with balance deltas.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Account, AccountId, Wallet, WalletId};
use crate::utils::format_amount;

#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub currency_code: String,
    pub symbol: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub session_date: DateTime<Utc>,
    pub user_id: AccountId,
    pub username: String,
    pub email: String,
    pub wallet_id: WalletId,
    pub balances: Vec<BalanceView>,
    pub history_count: u64,
}

impl SessionSnapshot {
    pub fn build(account: &Account, wallet: &Wallet, history_count: u64) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            session_date: Utc::now(),
            user_id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            wallet_id: wallet.id,
            balances: wallet
                .balances
                .iter()
                .map(|b| BalanceView {
                    currency_code: b.currency_code.code().to_string(),
                    symbol: b.currency_symbol.clone(),
                    balance: format_amount(b.balance),
                })
                .collect(),
            history_count,
        }
    }
}

#[derive(Default)]
pub struct SessionCache {
    entries: RwLock<HashMap<AccountId, SessionSnapshot>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: AccountId) -> Option<SessionSnapshot> {
        self.entries.read().await.get(&user_id).cloned()
    }

    pub async fn put(&self, snapshot: SessionSnapshot) {
        self.entries
            .write()
            .await
            .insert(snapshot.user_id, snapshot);
    }

    pub async fn invalidate(&self, user_id: AccountId) {
        self.entries.write().await.remove(&user_id);
    }
}
