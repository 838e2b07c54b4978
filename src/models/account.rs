//! Account model owned by the identity collaborator
//!
//! The saga only ever reads accounts; status changes go through
//! `UserClient::update_account_status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type AccountId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub locked: bool,
    pub blocked: bool,
    pub flagged_fraudulent: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Account age in whole hours, used by the new-account risk rule.
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_hours()
    }
}

/// Moderation actions applied to an account by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BanAction {
    SuspiciousActivity,
    FraudulentActivity,
    Unban,
}
