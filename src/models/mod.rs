//! Domain models shared across the remitd services
//!
//! Accounts and wallets are long-lived and mutated only by their owning
//! service; transfer requests and fee quotes live for a single saga
//! invocation; history and revenue entries are write-once.

pub mod account;
pub mod currency;
pub mod history;
pub mod revenue;
pub mod transfer;
pub mod wallet;

pub use account::{Account, AccountId, BanAction};
pub use currency::CurrencyType;
pub use history::{HistoryRecord, NewHistoryRecord, TransactionType};
pub use revenue::{Revenue, RevenueEntry};
pub use transfer::{FeeQuote, RawTransfer, TransferRequest};
pub use wallet::{CurrencyBalance, Wallet, WalletId};
