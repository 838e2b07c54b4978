//! Mutual exclusion keyed by an unordered pair of account ids
//!
//! A transfer A→B and a concurrent B→A resolve to the same token, so their
//! read-check-mutate sequences are strictly serialized in acquisition order.
//! Transfers sharing no account proceed fully in parallel. The guard must
//! cover exactly the balance mutations on both wallets and never be held
//! across history or notification calls.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::AccountId;

/// Canonical key: sorted, so (a, b) and (b, a) collide.
fn pair_key(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Default)]
pub struct TransferLockManager {
    locks: Mutex<HashMap<(AccountId, AccountId), Arc<Mutex<()>>>>,
}

impl TransferLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the pair token for `(a, b)`. The registry lock is released
    /// before waiting on the pair token, so unrelated pairs never contend.
    pub async fn acquire(&self, a: AccountId, b: AccountId) -> OwnedMutexGuard<()> {
        let token = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(pair_key(a, b)).or_default())
        };
        token.lock_owned().await
    }
}
