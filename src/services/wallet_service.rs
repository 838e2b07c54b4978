//! Wallet RPC endpoint: the only place balances are mutated
//!
//! Debit preconditions: wallet exists, currency entry exists, balance covers
//! the amount; a committed mutation never leaves a negative balance. Credit
//! provisions a wallet (and the currency entry) on demand. Callers moving
//! money between two wallets must hold the pair lock across the
//! debit-then-credit sequence; each single mutation here is atomic on its
//! own. Every committed mutation invalidates the owner's session snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::cache::SessionCache;
use crate::clients::{ClientError, WalletClient};
use crate::models::{AccountId, CurrencyBalance, CurrencyType, Wallet};
use crate::utils::{hash_pin, WalletError};

pub struct WalletService {
    wallets: RwLock<HashMap<AccountId, Wallet>>,
    cache: Arc<SessionCache>,
    next_wallet_id: AtomicI64,
}

impl WalletService {
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
            cache,
            next_wallet_id: AtomicI64::new(5001),
        }
    }

    /// Open a wallet with a chosen transfer PIN. Used by account onboarding;
    /// saga-side provisioning goes through `provision_wallet`.
    pub async fn create_wallet(&self, user_id: AccountId, transfer_pin: &str) -> Wallet {
        let wallet = self
            .insert_wallet(user_id, hash_pin(transfer_pin))
            .await;
        debug!(user_id, wallet_id = wallet.id, "Wallet created");
        wallet
    }

    /// Seed a currency balance directly. Deposit flows are outside this
    /// repository; tests and bootstrap use this.
    pub async fn seed_balance(&self, user_id: AccountId, currency: CurrencyType, amount: Decimal) {
        let mut wallets = self.wallets.write().await;
        if let Some(wallet) = wallets.get_mut(&user_id) {
            match wallet.balance_entry_mut(currency) {
                Some(entry) => entry.balance = amount,
                None => wallet.balances.push(CurrencyBalance::new(currency, amount)),
            }
        }
        drop(wallets);
        self.cache.invalidate(user_id).await;
    }

    async fn insert_wallet(&self, user_id: AccountId, pin_hash: String) -> Wallet {
        let mut wallets = self.wallets.write().await;
        if let Some(existing) = wallets.get(&user_id) {
            return existing.clone();
        }
        let now = Utc::now();
        let wallet = Wallet {
            id: self.next_wallet_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            balances: Vec::new(),
            pin_hash,
            created_on: now,
            updated_on: now,
        };
        wallets.insert(user_id, wallet.clone());
        wallet
    }
}

#[async_trait]
impl WalletClient for WalletService {
    async fn get_wallet(&self, user_id: AccountId) -> Result<Option<Wallet>, ClientError> {
        Ok(self.wallets.read().await.get(&user_id).cloned())
    }

    async fn provision_wallet(&self, user_id: AccountId) -> Result<Wallet, ClientError> {
        // The owner sets a real PIN later through the wallet UI; until then
        // the wallet carries an unguessable placeholder.
        let wallet = self
            .insert_wallet(user_id, hash_pin(&Uuid::new_v4().to_string()))
            .await;
        debug!(user_id, wallet_id = wallet.id, "Wallet provisioned");
        Ok(wallet)
    }

    async fn debit(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        let new_balance = {
            let mut wallets = self.wallets.write().await;
            let wallet = wallets.get_mut(&user_id).ok_or(WalletError::WalletNotFound)?;
            let entry = wallet
                .balance_entry_mut(currency)
                .ok_or(WalletError::CurrencyNotFound(currency))?;
            if entry.balance < amount {
                return Err(WalletError::InsufficientFunds);
            }
            entry.balance -= amount;
            let new_balance = entry.balance;
            wallet.updated_on = Utc::now();
            new_balance
        };
        self.cache.invalidate(user_id).await;
        debug!(user_id, %currency, %amount, %new_balance, "Debit committed");
        Ok(new_balance)
    }

    async fn credit(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        if self.wallets.read().await.get(&user_id).is_none() {
            self.provision_wallet(user_id)
                .await
                .map_err(|e| WalletError::Unavailable(e.to_string()))?;
        }
        let new_balance = {
            let mut wallets = self.wallets.write().await;
            let wallet = wallets.get_mut(&user_id).ok_or(WalletError::WalletNotFound)?;
            let new_balance = match wallet.balance_entry_mut(currency) {
                Some(entry) => {
                    entry.balance += amount;
                    entry.balance
                }
                None => {
                    wallet.balances.push(CurrencyBalance::new(currency, amount));
                    amount
                }
            };
            wallet.updated_on = Utc::now();
            new_balance
        };
        self.cache.invalidate(user_id).await;
        debug!(user_id, %currency, %amount, %new_balance, "Credit committed");
        Ok(new_balance)
    }

    async fn balance_of(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
    ) -> Result<Decimal, WalletError> {
        let wallets = self.wallets.read().await;
        let wallet = wallets.get(&user_id).ok_or(WalletError::WalletNotFound)?;
        wallet
            .balance_of(currency)
            .ok_or(WalletError::CurrencyNotFound(currency))
    }
}
