//! Identity collaborator: account directory and bearer tokens
//!
//! Login, OTP and registration flows live outside this repository; the saga
//! only needs lookup, status updates and token checks, so tokens are issued
//! programmatically and validated against a session table with a TTL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::clients::{ClientError, UserClient};
use crate::models::{Account, AccountId, BanAction};

struct TokenEntry {
    account_id: AccountId,
    expires_at: DateTime<Utc>,
}

pub struct UserDirectory {
    accounts: RwLock<HashMap<AccountId, Account>>,
    tokens: RwLock<HashMap<String, TokenEntry>>,
    token_ttl: Duration,
    next_id: AtomicI64,
}

impl UserDirectory {
    pub fn new(token_ttl_secs: i64) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            token_ttl: Duration::seconds(token_ttl_secs),
            next_id: AtomicI64::new(1001),
        }
    }

    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Account {
        let account = Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            locked: false,
            blocked: false,
            flagged_fraudulent: false,
            created_at: Utc::now(),
        };
        self.accounts
            .write()
            .await
            .insert(account.id, account.clone());
        account
    }

    /// Direct flag mutation for moderation tooling (and tests).
    pub async fn set_flags(&self, id: AccountId, locked: bool, blocked: bool, flagged: bool) {
        if let Some(account) = self.accounts.write().await.get_mut(&id) {
            account.locked = locked;
            account.blocked = blocked;
            account.flagged_fraudulent = flagged;
        }
    }

    /// Backdate an account's creation time (tests for the new-account rule).
    pub async fn backdate_account(&self, id: AccountId, created_at: DateTime<Utc>) {
        if let Some(account) = self.accounts.write().await.get_mut(&id) {
            account.created_at = created_at;
        }
    }

    /// Issue a fresh bearer token for an account.
    pub async fn issue_token(&self, account_id: AccountId) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.write().await.insert(
            token.clone(),
            TokenEntry {
                account_id,
                expires_at: Utc::now() + self.token_ttl,
            },
        );
        token
    }
}

#[async_trait]
impl UserClient for UserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, ClientError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, ClientError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn update_account_status(
        &self,
        id: AccountId,
        action: BanAction,
    ) -> Result<(), ClientError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| ClientError(format!("No account with id {}", id)))?;
        match action {
            BanAction::SuspiciousActivity => account.locked = true,
            BanAction::FraudulentActivity => account.flagged_fraudulent = true,
            BanAction::Unban => {
                account.locked = false;
                account.blocked = false;
                account.flagged_fraudulent = false;
            }
        }
        info!(account_id = id, ?action, "Account status updated");
        Ok(())
    }

    async fn validate_token(&self, token: &str) -> bool {
        match self.tokens.read().await.get(token) {
            Some(entry) => entry.expires_at > Utc::now(),
            None => false,
        }
    }

    async fn identity_from_token(&self, token: &str) -> Option<AccountId> {
        let tokens = self.tokens.read().await;
        let entry = tokens.get(token)?;
        (entry.expires_at > Utc::now()).then_some(entry.account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_resolve_to_their_account_until_expiry() {
        let dir = UserDirectory::new(3600);
        let account = dir.create_account("alice", "a@x.io", "Alice", "Doe").await;
        let token = dir.issue_token(account.id).await;

        assert!(dir.validate_token(&token).await);
        assert_eq!(dir.identity_from_token(&token).await, Some(account.id));
        assert!(!dir.validate_token("no-such-token").await);
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let dir = UserDirectory::new(-1);
        let account = dir.create_account("bob", "b@x.io", "Bob", "Roe").await;
        let token = dir.issue_token(account.id).await;

        assert!(!dir.validate_token(&token).await);
        assert_eq!(dir.identity_from_token(&token).await, None);
    }

    #[tokio::test]
    async fn suspicious_activity_locks_the_account() {
        let dir = UserDirectory::new(3600);
        let account = dir.create_account("carol", "c@x.io", "Carol", "Poe").await;

        dir.update_account_status(account.id, BanAction::SuspiciousActivity)
            .await
            .unwrap();
        let updated = dir.find_by_id(account.id).await.unwrap().unwrap();
        assert!(updated.locked);

        dir.update_account_status(account.id, BanAction::Unban)
            .await
            .unwrap();
        let updated = dir.find_by_id(account.id).await.unwrap().unwrap();
        assert!(!updated.locked);
    }
}
