//! Runtime settings loaded from the environment
//!
//! Every knob has a default so the daemon starts with a bare `.env`. Risk
//! thresholds are deliberately configurable; the shipped defaults are
//! documented in DESIGN.md.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::{dec, Decimal};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the broker listens on.
    pub bind_addr: String,
    /// Upper bound for every outbound collaborator call.
    pub rpc_timeout: Duration,
    /// Bearer token lifetime.
    pub token_ttl_secs: i64,
    /// Trailing window for the activity-based risk rules.
    pub risk_window_secs: i64,
    /// Transfers inside the window at or above this count are high volume.
    pub max_transfers_per_window: usize,
    /// Summed notional inside the window above this is high volume.
    pub high_volume_threshold: Decimal,
    /// Accounts younger than this many hours get the new-account rule.
    pub new_account_age_hours: i64,
    /// Largest amount a new account may move in one transfer.
    pub new_account_amount_limit: Decimal,
    /// Amount more than this multiple of the recent average is inconsistent.
    pub inconsistent_multiplier: Decimal,
    /// Uppercased ISO region codes considered high risk.
    pub high_risk_regions: HashSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7450".to_string(),
            rpc_timeout: Duration::from_millis(5000),
            token_ttl_secs: 3600,
            risk_window_secs: 60,
            max_transfers_per_window: 10,
            high_volume_threshold: dec!(100000),
            new_account_age_hours: 24,
            new_account_amount_limit: dec!(1000),
            inconsistent_multiplier: dec!(10),
            high_risk_regions: ["KP", "IR", "SY", "CU", "SD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Settings {
            bind_addr: std::env::var("REMITD_BIND").unwrap_or(defaults.bind_addr),
            rpc_timeout: Duration::from_millis(env_or("REMITD_RPC_TIMEOUT_MS", 5000u64)),
            token_ttl_secs: env_or("REMITD_TOKEN_TTL_SECS", defaults.token_ttl_secs),
            risk_window_secs: env_or("REMITD_RISK_WINDOW_SECS", defaults.risk_window_secs),
            max_transfers_per_window: env_or(
                "REMITD_MAX_TRANSFERS_PER_WINDOW",
                defaults.max_transfers_per_window,
            ),
            high_volume_threshold: env_or(
                "REMITD_HIGH_VOLUME_THRESHOLD",
                defaults.high_volume_threshold,
            ),
            new_account_age_hours: env_or(
                "REMITD_NEW_ACCOUNT_AGE_HOURS",
                defaults.new_account_age_hours,
            ),
            new_account_amount_limit: env_or(
                "REMITD_NEW_ACCOUNT_AMOUNT_LIMIT",
                defaults.new_account_amount_limit,
            ),
            inconsistent_multiplier: env_or(
                "REMITD_INCONSISTENT_MULTIPLIER",
                defaults.inconsistent_multiplier,
            ),
            high_risk_regions: std::env::var("REMITD_HIGH_RISK_REGIONS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_uppercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.high_risk_regions),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Ignoring unparseable value for {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
